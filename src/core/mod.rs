//! Vocabulary types and plumbing with no protocol knowledge: identifiers,
//! events, the inbound queue, and the logging ladder.

mod event;
mod logging;
mod mailbox;

#[rustfmt::skip]
pub use {
  event::Event,
  event::EventId,
  event::ProcessId,
  event::Tick,
  logging::log,
  logging::LogLevel,
  mailbox::Mailbox,
  mailbox::MailboxRef,
};
