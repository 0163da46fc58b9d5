use crate::core::ProcessId;

/// Verbosity ladder. A site logs when its level is at or above the
/// module's threshold; `Off` silences a module entirely.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
  Trace,
  Debug,
  Info,
  Warn,
  Error,
  Fatal,
  Off,
}
impl LogLevel {
  pub const MIN: LogLevel = LogLevel::Trace;
}

/// Prints a process-prefixed line when `level` clears `threshold`. The
/// log macros route here; call sites do not use this directly.
pub fn log<S: ToString>(
  level: LogLevel,
  threshold: LogLevel,
  pid: ProcessId,
  msg: S,
) {
  if threshold != LogLevel::Off && level >= threshold {
    println!("p{}: {}", pid, msg.to_string());
  }
}

/// Logs at trace level against a module threshold.
#[macro_export]
macro_rules! trace {
  ($threshold:expr, $pid:expr, $msg:expr) => {
    $crate::core::log($crate::core::LogLevel::Trace, $threshold, $pid, $msg)
  };
}

/// Logs at debug level against a module threshold.
#[macro_export]
macro_rules! debug {
  ($threshold:expr, $pid:expr, $msg:expr) => {
    $crate::core::log($crate::core::LogLevel::Debug, $threshold, $pid, $msg)
  };
}

/// Logs at info level against a module threshold.
#[macro_export]
macro_rules! info {
  ($threshold:expr, $pid:expr, $msg:expr) => {
    $crate::core::log($crate::core::LogLevel::Info, $threshold, $pid, $msg)
  };
}

/// Logs at warn level against a module threshold.
#[macro_export]
macro_rules! warn {
  ($threshold:expr, $pid:expr, $msg:expr) => {
    $crate::core::log($crate::core::LogLevel::Warn, $threshold, $pid, $msg)
  };
}

/// Logs at error level against a module threshold.
#[macro_export]
macro_rules! error {
  ($threshold:expr, $pid:expr, $msg:expr) => {
    $crate::core::log($crate::core::LogLevel::Error, $threshold, $pid, $msg)
  };
}
