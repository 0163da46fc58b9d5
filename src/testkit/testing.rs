use once_cell::sync::Lazy;
use std::env::var;

/// Cluster-wide drop probability picked up by [`crate::testkit::Simulation`]
/// unless a test supplies its own failure map.
pub static PACKET_DROP: Lazy<f64> = Lazy::new(|| {
  var("LPBCAST_DROP_PROB")
    .map(|x| x.parse().ok())
    .ok()
    .flatten()
    .unwrap_or(0.0)
});
