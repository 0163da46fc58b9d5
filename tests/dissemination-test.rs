use lpbcast::core::{Event, EventId, ProcessId};
use lpbcast::gossip::{Gossip, Message, ProtocolConfig};
use lpbcast::testkit::Simulation;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

fn clique(sim: &mut Simulation, pids: &[ProcessId]) {
  for pid in pids {
    let view = pids
      .iter()
      .filter(|p| *p != pid)
      .map(|p| (*p, 0))
      .collect::<HashMap<_, _>>();
    sim.add_process(*pid, view);
  }
}

#[test]
fn three_process_dissemination() {
  let mut sim = Simulation::new(17, ProtocolConfig::default());
  clique(&mut sim, &[1, 2, 3]);
  let id = sim.broadcast(1);
  sim.run(4);
  for pid in [2u64, 3] {
    let events = sim.delivered(pid);
    assert_eq!(events.len(), 1, "p{} must deliver exactly once", pid);
    assert_eq!(events[0].id, id);
  }
  // the origin records the id but does not upcall for its own event
  assert!(sim.delivered(1).is_empty());
  assert!(sim.process(1).delivered_ids().contains(&id));

  // further rounds re-advertise the id without re-delivering
  sim.run(10);
  for pid in [2u64, 3] {
    assert_eq!(sim.delivered(pid).len(), 1);
  }
}

#[test]
fn empty_view_round_still_rotates() {
  let mut sim = Simulation::new(7, ProtocolConfig::default());
  sim.add_process(1, HashMap::new());
  let id = sim.broadcast(1);
  sim.run(3);
  assert_eq!(sim.messages_sent(), 0);
  let p = sim.process(1);
  assert_eq!(p.events().live_len(), 0);
  assert!(p.events().is_archived(&id));
}

fn stale_gossip(events: Vec<Event>, event_ids: HashSet<EventId>) -> Message {
  Message::Gossip(Gossip {
    sender: 9,
    events: events,
    subs: HashSet::new(),
    unsubs: HashSet::new(),
    event_ids: event_ids,
  })
}

// A peer with a stale partial view joins the exchange late and keeps
// re-sending an event after its id has fallen off the bounded delivered
// log. The event is still in the archive, so the copy must be recognized
// there instead of delivered again.
#[test]
fn archived_event_is_not_redelivered_after_log_eviction() {
  let mut sim = Simulation::new(13, ProtocolConfig::default());
  sim.add_process(1, HashMap::new());
  let evicted = Event {
    id: EventId::new(Uuid::from_u128(100), 9),
    age: 1,
  };

  sim.inject(1, stale_gossip(vec![evicted.clone()], HashSet::new()));
  sim.run(1);
  assert_eq!(sim.delivered(1).len(), 1);

  // five fresh events push the first id off the delivered log while the
  // event itself stays archived
  let fresh = (101..106u128)
    .map(|uid| Event {
      id: EventId::new(Uuid::from_u128(uid), 9),
      age: 1,
    })
    .collect::<Vec<_>>();
  sim.inject(1, stale_gossip(fresh, HashSet::new()));
  sim.run(1);
  let p = sim.process(1);
  assert!(!p.delivered_ids().contains(&evicted.id));
  assert!(p.events().is_archived(&evicted.id));

  // the stale peer re-sends the event and re-advertises its id
  sim.inject(
    1,
    stale_gossip(
      vec![evicted.clone()],
      [evicted.id].into_iter().collect(),
    ),
  );
  sim.run(1);

  let p = sim.process(1);
  let copies = sim
    .delivered(1)
    .iter()
    .filter(|e| e.id == evicted.id)
    .count();
  assert_eq!(copies, 1, "archived event delivered twice");
  assert_eq!(sim.delivered(1).len(), 6);
  // recognized from the archive: no gap recorded, no live/archive overlap
  assert!(p.pending_retrieves().is_empty());
  assert!(!p.events().is_live(&evicted.id));
  assert!(p.events().is_archived(&evicted.id));
}

#[test]
fn duplicate_gossip_is_idempotent() {
  let mut sim = Simulation::new(3, ProtocolConfig::default());
  sim.add_process(1, HashMap::new());
  let delivered_id = EventId::new(Uuid::from_u128(42), 9);
  let advertised_id = EventId::new(Uuid::from_u128(43), 9);
  let gossip = Gossip {
    sender: 9,
    events: vec![Event {
      id: delivered_id,
      age: 1,
    }],
    subs: [9u64, 8, 7].into_iter().collect(),
    unsubs: [7u64].into_iter().collect(),
    event_ids: [advertised_id].into_iter().collect::<HashSet<_>>(),
  };
  sim.inject(1, Message::Gossip(gossip.clone()));
  sim.inject(1, Message::Gossip(gossip));
  sim.run(1);

  let p = sim.process(1);
  assert_eq!(sim.delivered(1).len(), 1);
  assert_eq!(sim.delivered(1)[0].id, delivered_id);
  // the second copy only bumps frequencies
  assert!(p.view().contains(&9) && p.view().contains(&8));
  assert_eq!(p.view().frequency(&9), Some(2));
  assert_eq!(p.subs().frequency(&8), Some(2));
  // the unsubscribed peer stayed out even though it was also in subs
  assert!(p.unsubs().contains_key(&7));
  assert!(!p.view().contains(&7));
  assert!(!p.subs().contains(&7));
  // one gap per advertised id, not one per copy
  assert_eq!(p.pending_retrieves().len(), 1);
  assert_eq!(p.pending_retrieves()[0].event_id, advertised_id);
}
