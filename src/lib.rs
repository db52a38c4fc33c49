pub mod config;
pub mod controller;
pub mod metrics;
pub mod net;
pub mod proto;
pub mod queue;
pub mod sim;
pub mod topo;

#[cfg(test)]
mod test;
