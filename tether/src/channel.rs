//! Transport interface consumed by the engine.
//!
//! Channels are external collaborators: the engine never performs I/O
//! itself, it only dispatches blocking calls against these traits and turns
//! the returned codes into completion events. Implementations return a
//! non-negative success payload or a negative error code of their own
//! taxonomy; the fixed codes in [`crate::error::code`] are reserved.
//!
//! `abort` is the cooperative cancellation hook: it must be able to unblock
//! a call currently blocked on another thread (e.g. by shutting down the
//! underlying descriptor). Failure to do so within bounded time is a
//! channel defect, not something the engine can recover from.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::code;
use crate::sync::Mutex;

/// Peer address of a datagram, in whichever family the channel speaks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PeerAddr {
  Inet(SocketAddr),
  /// RFCOMM-style device address: MAC plus channel number.
  Device { mac: [u8; 6], port: u8 },
}

/// A connected (or connectable) byte channel.
///
/// Only `connect`, `read`, `write` and `abort` are required; the datagram
/// and protocol-finish entry points default to [`code::UNSUPPORTED`] for
/// channels without those notions.
pub trait StreamChannel: Send + Sync {
  /// Establishes the connection. Blocking.
  fn connect(&self) -> i32;

  /// Reads up to `buf.len()` bytes. Blocking. Returns bytes read, 0 at end
  /// of stream, or a negative error.
  fn read(&self, buf: &mut [u8]) -> i32;

  /// Writes `buf`. Blocking. Returns bytes written or a negative error.
  fn write(&self, buf: &[u8]) -> i32;

  /// Receives one datagram, reporting its source address.
  fn read_from(&self, buf: &mut [u8]) -> (i32, Option<PeerAddr>) {
    let _ = buf;
    (code::UNSUPPORTED, None)
  }

  /// Sends one datagram to `addr`.
  fn write_to(&self, buf: &[u8], addr: &PeerAddr) -> i32 {
    let _ = (buf, addr);
    code::UNSUPPORTED
  }

  /// Completes a protocol-level exchange, e.g. finishing an HTTP request.
  /// Opaque to the engine: one blocking call, one result code.
  fn finish(&self) -> i32 {
    code::UNSUPPORTED
  }

  /// Requests the channel to abort, unblocking any in-progress call on
  /// another thread. Called at most once per channel, and never again after
  /// the engine releases its reference.
  fn abort(&self);
}

/// A channel accepting incoming connections.
pub trait ListenerChannel: Send + Sync {
  /// Waits for one incoming connection. Blocking.
  fn accept(&self) -> Result<Arc<dyn StreamChannel>, i32>;

  /// Same contract as [`StreamChannel::abort`].
  fn abort(&self);
}

/// The transport resource owned by a connection record.
#[derive(Clone)]
pub(crate) enum Channel {
  Stream(Arc<dyn StreamChannel>),
  Listener(Arc<dyn ListenerChannel>),
}

impl Channel {
  pub(crate) fn abort(&self) {
    match self {
      Self::Stream(chan) => chan.abort(),
      Self::Listener(chan) => chan.abort(),
    }
  }
}

/// Shared out-parameter for the datagram source address.
///
/// The host keeps a clone when submitting a `read_from`; the slot is written
/// before the completion event publishes, so it is stable for inspection
/// once the event is observed.
#[derive(Clone)]
pub struct AddrSlot(Arc<Mutex<Option<PeerAddr>>>);

impl Default for AddrSlot {
  fn default() -> Self {
    Self::new()
  }
}

impl AddrSlot {
  pub fn new() -> Self {
    Self(Arc::new(Mutex::new(None)))
  }

  /// Takes the stored address, leaving the slot empty.
  pub fn take(&self) -> Option<PeerAddr> {
    self.0.lock().take()
  }

  pub(crate) fn store(&self, addr: Option<PeerAddr>) {
    *self.0.lock() = addr;
  }
}
