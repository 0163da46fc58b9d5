use crate::core::Tick;

/// Tuning knobs of the broadcast protocol. The defaults are small on
/// purpose: they exercise every purging policy even in tiny deployments.
#[derive(Clone, Debug)]
pub struct ProtocolConfig {
  /// Cap on the partial membership view.
  pub view_max: usize,
  /// Cap on the subscription buffer.
  pub subs_max: usize,
  /// Cap on the unsubscription buffer.
  pub unsubs_max: usize,
  /// Cap on events held since the last outgoing gossip.
  pub events_max: usize,
  /// Cap on the delivered-id log.
  pub event_ids_max: usize,
  /// Cap on the retransmission archive.
  pub archived_max: usize,
  /// Ticks after which an unsubscription entry expires.
  pub unsubs_validity: Tick,
  /// Hop-age gap beyond which an event is stale next to a fresher sibling
  /// from the same origin.
  pub long_ago: u64,
  /// Frequency-purging multiplier, `0 <= k < 1`.
  pub k: f64,
  /// Gossip fanout.
  pub fanout: usize,
  /// Ticks before a missing event becomes eligible for a request.
  pub k_recovery: Tick,
  /// Ticks before a pending retransmission request advances a stage.
  pub recovery_timeout: Tick,
  /// Upper bound on random message delay, in ticks.
  pub message_max_delay: Tick,
  /// Deterministic one-tick delivery instead of random delays.
  pub sync: bool,
  /// Purge the event buffer by hop age instead of uniformly at random.
  pub age_based_message_purging: bool,
  /// Evict well-disseminated peers from view/subs first.
  pub frequency_based_membership_purging: bool,
}
impl Default for ProtocolConfig {
  fn default() -> Self {
    ProtocolConfig {
      view_max: 5,
      subs_max: 5,
      unsubs_max: 5,
      events_max: 5,
      event_ids_max: 5,
      archived_max: 10,
      unsubs_validity: 100,
      long_ago: 100,
      k: 0.5,
      fanout: 3,
      k_recovery: 20,
      recovery_timeout: 20,
      message_max_delay: 1,
      sync: true,
      age_based_message_purging: true,
      frequency_based_membership_purging: true,
    }
  }
}
impl ProtocolConfig {
  /// Panics on nonsensical tuning. Called once at process construction.
  pub fn validate(&self) {
    assert!(self.view_max >= 1, "view_max must be at least 1");
    assert!(self.subs_max >= 1, "subs_max must be at least 1");
    assert!(self.unsubs_max >= 1, "unsubs_max must be at least 1");
    assert!(self.events_max >= 1, "events_max must be at least 1");
    assert!(self.event_ids_max >= 1, "event_ids_max must be at least 1");
    assert!(self.archived_max >= 1, "archived_max must be at least 1");
    assert!(self.fanout >= 1, "fanout must be at least 1");
    assert!(
      self.k >= 0.0 && self.k < 1.0,
      "k must be in [0, 1), got {}",
      self.k
    );
    assert!(
      self.message_max_delay >= 1,
      "message_max_delay must be at least 1"
    );
  }
}

#[test]
fn default_config_is_valid() {
  ProtocolConfig::default().validate();
}

#[test]
#[should_panic]
fn rejects_k_of_one() {
  let cfg = ProtocolConfig {
    k: 1.0,
    ..ProtocolConfig::default()
  };
  cfg.validate();
}
