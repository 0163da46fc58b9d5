use crate::core::ProcessId;
use serde::{Deserialize, Serialize};

/// Dictates how messages toward one destination should be dropped.
/// Delivery delay is not injected here; the protocol's own delay model
/// (`sync` / `message_max_delay`) covers it.
#[derive(Default, Serialize, Deserialize, Clone, Copy, Debug)]
pub struct FailureConfig {
  pub drop_prob: f64,
}

/// Drop probabilities for the whole deployment, with per-destination
/// overrides.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct FailureConfigMap {
  pub cluster_wide: FailureConfig,
  pub node_wide: im::HashMap<ProcessId, FailureConfig>,
}
impl FailureConfigMap {
  /// The profile for messages toward `pid`, override or cluster-wide.
  pub fn get(&self, pid: &ProcessId) -> &FailureConfig {
    self.node_wide.get(pid).unwrap_or(&self.cluster_wide)
  }
}
