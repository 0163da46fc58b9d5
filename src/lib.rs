#![warn(missing_docs)]

//! [`lpbcast`](crate) implements lightweight probabilistic broadcast: gossip-based event
//! dissemination in which every process knows only a bounded random sample of the
//! membership, yet events reach the whole deployment with high probability. Per-node
//! state is hard-capped, membership changes ride the same gossip as events, and missed
//! events are recovered through staged retransmission. There is no global membership
//! authority and no coordinator.
//!
//! # How It Works
//! Each process keeps a bounded **view** of peers and, once per tick, sends a digest of
//! its recent state to `F` random view members: the events it received since its last
//! round, the subscriptions and unsubscriptions it has heard about, and the identifiers
//! of everything it has delivered. Receivers merge the digest, deliver events they have
//! not seen, and note identifiers they are missing. Every buffer backing this exchange
//! is trimmed by a purging policy that prefers to forget what the rest of the system
//! already knows well: frequently-propagated peers are evicted before rare ones, and
//! events that have aged far past a fresher sibling from the same origin are dropped.
//! A missing event is first requested from the peer that advertised it, then from a
//! random peer, then from its originator, then abandoned.
//!
//! # Modules
//! - [`gossip`](crate::gossip): the protocol engine. [`Process`](crate::gossip::Process)
//!   is the per-participant state machine; [`Host`](crate::gossip::Host) is the small
//!   bundle of upcalls (clock, RNG, routing, delivery) a deployment injects.
//! - [`core`](crate::core): vocabulary types and plumbing shared by everything above.
//! - [`testkit`](crate::testkit): a deterministic simulation host with message-loss
//!   injection, used by the integration tests.
//!
//! The protocol follows the design of Eugster, Guerraoui, Handurukande, Kouznetsov and
//! Kermarrec, ["Lightweight Probabilistic Broadcast"][lpbcast]. Delivery is best-effort
//! and unordered; the crate makes no attempt at causal or total order, authentication,
//! or exactly-once semantics.
//!
//! [lpbcast]: https://dl.acm.org/doi/10.1145/945506.945507

pub mod core;
pub mod gossip;
pub mod testkit;
