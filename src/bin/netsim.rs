use clap::Parser;
use netsim_rs::net;
use netsim_rs::sim::Simulator;
use netsim_rs::telemetry;
use netsim_rs::topo;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

#[derive(Debug, Parser)]
#[command(
    name = "netsim",
    about = "Discrete-event simulator for packet-switched networks"
)]
struct Args {
    /// XML file describing the topology and flows
    topology: PathBuf,

    /// Log level used when RUST_LOG is not set (trace/debug/info/warn/error)
    #[arg(short, long, default_value = "info")]
    log: String,

    /// Do not persist telemetry at the end of the simulation
    #[arg(short = 'G', long = "no-graph", conflicts_with = "output")]
    no_graph: bool,

    /// Folder to write telemetry files to
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log)),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let mut world = match topo::load_file(&args.topology) {
        Ok(world) => world,
        Err(err) => {
            eprintln!("netsim: {err}");
            std::process::exit(1);
        }
    };

    let mut sim = Simulator::default();
    let stop = AtomicBool::new(false);
    net::run(&mut world, &mut sim, &stop);

    for (flow, delivered, total) in world.net.flow_summaries() {
        println!(
            "flow {flow}: {delivered}/{total} packets acknowledged ({})",
            if delivered >= total { "done" } else { "incomplete" }
        );
    }

    let samples = sim.take_telemetry();
    if !args.no_graph {
        if let Some(dir) = &args.output {
            if let Err(err) = telemetry::write_reports(&samples, dir) {
                eprintln!("netsim: failed to write telemetry: {err}");
                std::process::exit(1);
            }
            if let Err(err) = telemetry::write_samples_json(&samples, &dir.join("samples.json")) {
                eprintln!("netsim: failed to write samples.json: {err}");
                std::process::exit(1);
            }
        }
    }
    println!("collected {} telemetry samples", samples.len());
}
