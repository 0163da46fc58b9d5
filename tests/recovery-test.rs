use lpbcast::core::EventId;
use lpbcast::gossip::{Gossip, Message, ProtocolConfig, RetrieveStage};
use lpbcast::testkit::{FailureConfig, FailureConfigMap, Simulation};
use maplit::hashmap;
use std::collections::{HashMap, HashSet};

// P1 broadcasts and archives an event without ever gossiping it (empty
// view); P2 learns of the id through a forged advertisement only.
fn lost_event_setup(failures: FailureConfigMap) -> (Simulation, EventId) {
  let mut sim =
    Simulation::with_failures(31, ProtocolConfig::default(), failures);
  sim.add_process(1, HashMap::new());
  sim.add_process(2, hashmap! { 1 => 0 });
  let id = sim.broadcast(1);
  sim.inject(
    2,
    Message::Gossip(Gossip {
      sender: 1,
      events: vec![],
      subs: HashSet::new(),
      unsubs: HashSet::new(),
      event_ids: [id].into_iter().collect(),
    }),
  );
  (sim, id)
}

#[test]
fn recovery_from_the_advertising_sender() {
  let (mut sim, id) = lost_event_setup(FailureConfigMap::default());
  sim.run(1);
  assert_eq!(sim.process(2).pending_retrieves().len(), 1);
  assert!(sim.process(1).events().is_archived(&id));

  // nothing happens until the grace period elapses
  sim.run(20);
  assert!(sim.delivered(2).is_empty());

  // request to the advertiser, reply from the archive, delivery
  sim.run(4);
  assert_eq!(sim.delivered(2).len(), 1);
  assert_eq!(sim.delivered(2)[0].id, id);
  assert!(sim.process(2).active_requests().is_empty());

  // the id stays advertised but never re-delivers, and the gap noted in
  // the meantime is discarded once its grace period elapses
  sim.run(20);
  assert_eq!(sim.delivered(2).len(), 1);
  assert!(sim.process(2).pending_retrieves().is_empty());
  assert!(sim.process(2).active_requests().is_empty());
}

#[test]
fn staged_retransmission_until_give_up() {
  let mut failures = FailureConfigMap::default();
  // everything toward P2 vanishes, so every reply is lost
  failures.node_wide.insert(2, FailureConfig { drop_prob: 1.0 });
  let (mut sim, id) = lost_event_setup(failures);

  sim.run(41);
  let active = sim.process(2).active_requests();
  assert_eq!(active.len(), 1);
  assert_eq!(active[0].event_id, id);
  assert_eq!(active[0].stage, RetrieveStage::Sender);

  sim.run(2);
  assert_eq!(
    sim.process(2).active_requests()[0].stage,
    RetrieveStage::Random
  );

  sim.run(20);
  assert_eq!(
    sim.process(2).active_requests()[0].stage,
    RetrieveStage::Originator
  );

  sim.run(20);
  assert!(sim.process(2).active_requests().is_empty());
  assert!(sim.delivered(2).is_empty());
}
