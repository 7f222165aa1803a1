mod link;
mod network_integration;
mod routing;
mod telemetry;
