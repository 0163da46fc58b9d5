//! A deterministic simulation host plus message-loss injection.

mod failure_config;
mod sim;
mod testing;

#[rustfmt::skip]
pub use {
  failure_config::FailureConfig,
  failure_config::FailureConfigMap,
  sim::Simulation,
  testing::PACKET_DROP,
};
