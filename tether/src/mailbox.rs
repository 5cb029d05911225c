//! A ready-made [`EventSink`] the host can drain like a queue.

use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use crate::event::{ConnEvent, EventSink};

/// Unbounded completion queue backed by a channel.
///
/// The engine pushes from worker threads; the host drains with
/// [`try_recv`](Mailbox::try_recv) each iteration of its run loop, or blocks
/// in [`recv`](Mailbox::recv) when it has nothing else to do.
pub struct Mailbox {
  tx: Sender<ConnEvent>,
  rx: Receiver<ConnEvent>,
}

impl Mailbox {
  pub fn new() -> Self {
    let (tx, rx) = crossbeam_channel::unbounded();
    Self { tx, rx }
  }

  /// Pops one event without blocking.
  pub fn try_recv(&self) -> Option<ConnEvent> {
    self.rx.try_recv().ok()
  }

  /// Blocks until an event is available.
  pub fn recv(&self) -> ConnEvent {
    self.rx.recv().expect("mailbox sender lives as long as the mailbox")
  }

  /// Blocks until an event is available or the timeout expires.
  pub fn recv_timeout(&self, timeout: Duration) -> Option<ConnEvent> {
    self.rx.recv_timeout(timeout).ok()
  }

  /// Number of events currently queued.
  pub fn len(&self) -> usize {
    self.rx.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rx.is_empty()
  }
}

impl Default for Mailbox {
  fn default() -> Self {
    Self::new()
  }
}

impl EventSink for Mailbox {
  fn push(&self, event: ConnEvent) {
    // The mailbox owns its receiver, so the channel cannot be disconnected
    // while the sink is reachable.
    let _ = self.tx.send(event);
  }
}
