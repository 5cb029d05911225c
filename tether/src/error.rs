//! Result codes published in completion events and the host-facing error types.

use std::fmt;

/// Negative result codes with a fixed meaning across all channels.
///
/// Everything else negative is a transport error defined by the channel
/// implementation and surfaced verbatim, unless the cancel override applies.
pub mod code {
  /// An auxiliary step failed independent of the channel call, e.g. staging
  /// a data-object range that is out of bounds.
  pub const GENERIC: i32 = -2;

  /// The record was closing when the channel call returned an error. Always
  /// takes precedence over the literal transport error.
  pub const CANCELED: i32 = -6;

  /// The channel does not implement the requested operation.
  pub const UNSUPPORTED: i32 = -7;
}

/// Why a submission was rejected. A rejected submission produces no event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
  /// No record is registered under the handle.
  NotFound,
  /// The opcode is not legal for the record's kind, e.g. accept on a stream.
  WrongKind,
  /// An operation of the same kind is already in flight on this record.
  /// This is a host contract violation, never queued.
  AlreadyPending,
  /// The record's close sequence has begun.
  Closing,
  /// The data object is already lent to another in-flight operation.
  DataBusy,
}

impl std::error::Error for SubmitError {}

impl fmt::Display for SubmitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::NotFound => f.write_str("no connection with this handle"),
      Self::WrongKind => f.write_str("operation not legal for this connection kind"),
      Self::AlreadyPending => {
        f.write_str("an operation of this kind is already pending")
      }
      Self::Closing => f.write_str("connection is closing"),
      Self::DataBusy => f.write_str("data object is lent to another operation"),
    }
  }
}

/// Why a close request failed before starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseError {
  /// No record is registered under the handle.
  NotFound,
}

impl std::error::Error for CloseError {}

impl fmt::Display for CloseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::NotFound => f.write_str("no connection with this handle"),
    }
  }
}
