//! The protocol engine: the per-process state machine, the wire shapes it
//! exchanges, its bounded buffers, and the host abstraction that drives it.

mod events;
mod host;
mod membership;
mod messages;
mod process;
mod recovery;
mod utils;

#[rustfmt::skip]
pub use {
  events::Archived,
  events::DeliveredLog,
  events::EventStore,
  host::Host,
  host::ProcessHandle,
  membership::FrequencyBuffer,
  messages::Envelope,
  messages::Gossip,
  messages::Message,
  messages::RetrieveReply,
  messages::RetrieveRequest,
  process::Process,
  recovery::ActiveRetrieveRequest,
  recovery::MissingEvent,
  recovery::RetrieveStage,
  utils::ProtocolConfig,
};
