pub mod cc;
pub mod net;
pub mod queue;
pub mod sim;
pub mod telemetry;
pub mod topo;

#[cfg(test)]
mod test;
