//! The connection-operation engine: dispatch, completion, close.
//!
//! One mutex guards the registry, every record's pending/cancel state, and
//! the push side of the event sink; one condvar wakes close-waiters each
//! time a completion publishes. Workers only take the lock briefly at the
//! edges of an operation; the blocking transport call itself always runs
//! outside the lock.

use std::sync::Arc;

use crate::buf::IoBuf;
use crate::channel::{AddrSlot, Channel, ListenerChannel, PeerAddr, StreamChannel};
use crate::data::DataObject;
use crate::error::{CloseError, SubmitError, code};
use crate::event::{ConnEvent, EventSink, Opcode};
use crate::op::{self, ConnOp};
use crate::pool::{Job, WorkerPool};
use crate::registry::{ConnKind, Handle, Registry};
use crate::sync::{Condvar, Mutex};

pub struct Engine {
  registry: Mutex<Registry>,
  /// Notified on every published completion; close waits on it.
  op_done: Condvar,
  pool: Arc<dyn WorkerPool>,
  sink: Arc<dyn EventSink>,
}

impl Engine {
  pub fn new(pool: Arc<dyn WorkerPool>, sink: Arc<dyn EventSink>) -> Arc<Self> {
    Arc::new(Self {
      registry: Mutex::new(Registry::new()),
      op_done: Condvar::new(),
      pool,
      sink,
    })
  }

  /// Registers a stream connection and returns its handle.
  pub fn create_stream(&self, chan: Arc<dyn StreamChannel>) -> Handle {
    let handle =
      self.registry.lock().create(ConnKind::Stream, Channel::Stream(chan));
    tracing::debug!(handle, "stream connection registered");
    handle
  }

  /// Registers a listener and returns its handle.
  pub fn create_listener(&self, chan: Arc<dyn ListenerChannel>) -> Handle {
    let handle =
      self.registry.lock().create(ConnKind::Listener, Channel::Listener(chan));
    tracing::debug!(handle, "listener registered");
    handle
  }

  /// Looks up the kind of a live record, or None once it has been closed.
  pub fn kind(&self, handle: Handle) -> Option<ConnKind> {
    self.registry.lock().get(handle).map(|rec| rec.kind)
  }

  /// Number of live records.
  pub fn live(&self) -> usize {
    self.registry.lock().len()
  }

  pub fn connect(self: &Arc<Self>, handle: Handle) -> Result<(), SubmitError> {
    self.enqueue(
      handle,
      ConnKind::Stream,
      Opcode::Connect,
      op::Connect { handle },
      None,
    )
  }

  /// Reads up to `buf.len()` bytes into the shared buffer.
  pub fn read(self: &Arc<Self>, handle: Handle, buf: IoBuf) -> Result<(), SubmitError> {
    self.enqueue(handle, ConnKind::Stream, Opcode::Read, op::Read { handle, buf }, None)
  }

  pub fn write(
    self: &Arc<Self>,
    handle: Handle,
    bytes: Vec<u8>,
  ) -> Result<(), SubmitError> {
    self.enqueue(
      handle,
      ConnKind::Stream,
      Opcode::Write,
      op::Write { handle, bytes },
      None,
    )
  }

  /// Receives one datagram; the source address lands in `addr`.
  pub fn read_from(
    self: &Arc<Self>,
    handle: Handle,
    buf: IoBuf,
    addr: AddrSlot,
  ) -> Result<(), SubmitError> {
    self.enqueue(
      handle,
      ConnKind::Stream,
      Opcode::Read,
      op::ReadFrom { handle, buf, addr },
      None,
    )
  }

  /// Sends one datagram to `addr`.
  pub fn write_to(
    self: &Arc<Self>,
    handle: Handle,
    bytes: Vec<u8>,
    addr: PeerAddr,
  ) -> Result<(), SubmitError> {
    self.enqueue(
      handle,
      ConnKind::Stream,
      Opcode::Write,
      op::WriteTo { handle, bytes, addr },
      None,
    )
  }

  /// Reads into `data[offset..offset + len]`, lending the object until the
  /// completion event publishes.
  pub fn read_to_data(
    self: &Arc<Self>,
    handle: Handle,
    data: Arc<DataObject>,
    offset: usize,
    len: usize,
  ) -> Result<(), SubmitError> {
    let op = op::ReadToData { handle, data: Arc::clone(&data), offset, len };
    self.enqueue(handle, ConnKind::Stream, Opcode::Read, op, Some(&data))
  }

  /// Writes `data[offset..offset + len]`, lending the object until the
  /// completion event publishes.
  pub fn write_from_data(
    self: &Arc<Self>,
    handle: Handle,
    data: Arc<DataObject>,
    offset: usize,
    len: usize,
  ) -> Result<(), SubmitError> {
    let op = op::WriteFromData { handle, data: Arc::clone(&data), offset, len };
    self.enqueue(handle, ConnKind::Stream, Opcode::Write, op, Some(&data))
  }

  pub fn accept(self: &Arc<Self>, handle: Handle) -> Result<(), SubmitError> {
    self.enqueue(
      handle,
      ConnKind::Listener,
      Opcode::Accept,
      op::Accept { handle },
      None,
    )
  }

  pub fn finish(self: &Arc<Self>, handle: Handle) -> Result<(), SubmitError> {
    self.enqueue(
      handle,
      ConnKind::Stream,
      Opcode::Finish,
      op::Finish { handle },
      None,
    )
  }

  /// Validates the submission, marks the opcode pending, then hands the
  /// operation to the pool. The bit is set before the hand-off so a close
  /// that starts immediately after observes a non-idle record.
  fn enqueue(
    self: &Arc<Self>,
    handle: Handle,
    kind: ConnKind,
    opcode: Opcode,
    op: impl ConnOp,
    lend: Option<&DataObject>,
  ) -> Result<(), SubmitError> {
    {
      let mut registry = self.registry.lock();
      let rec = registry.get_mut(handle).ok_or(SubmitError::NotFound)?;

      if rec.kind != kind {
        return Err(SubmitError::WrongKind);
      }
      if rec.canceling || rec.channel.is_none() {
        return Err(SubmitError::Closing);
      }
      if rec.pending.contains(opcode) {
        return Err(SubmitError::AlreadyPending);
      }
      if let Some(data) = lend {
        if !data.lend() {
          return Err(SubmitError::DataBusy);
        }
      }

      rec.pending.set(opcode);
    }

    let engine = Arc::clone(self);
    let job: Job = Box::new(move || Box::new(op).run(&engine));
    self.pool.submit(job);

    tracing::trace!(handle, ?opcode, "operation submitted");
    Ok(())
  }

  /// Tears the record down: cancel, abort, wait for pending operations to
  /// drain, remove. Blocks until every operation that was in flight when the
  /// call was made has reported completion.
  ///
  /// A concurrent second close of the same handle issues no second abort; it
  /// joins the same drain and returns once the record is gone.
  pub fn close(&self, handle: Handle) -> Result<(), CloseError> {
    let chan = {
      let mut registry = self.registry.lock();
      let rec = registry.get_mut(handle).ok_or(CloseError::NotFound)?;
      rec.canceling = true;
      // Ownership of the channel leaves the record here; in-flight
      // operations keep their own references.
      rec.channel.take()
    };

    // The abort request runs outside the lock: it may itself block briefly,
    // and the operation it unblocks needs the lock to report.
    if let Some(chan) = chan {
      tracing::debug!(handle, "closing, aborting channel");
      chan.abort();
    }

    let mut registry = self.registry.lock();
    loop {
      self.sink.process_pending();
      // A record that is already gone was removed by a concurrent close.
      let idle =
        registry.get(handle).is_none_or(|rec| rec.pending.is_idle());
      if idle {
        break;
      }
      registry = self.op_done.wait(registry);
    }
    registry.remove(handle);
    drop(registry);

    tracing::debug!(handle, "closed");
    Ok(())
  }

  /// Closes every live record, in unspecified order. Used at host teardown
  /// and reset.
  pub fn close_all(&self) {
    let handles = self.registry.lock().handles();
    for handle in handles {
      // A handle may already be gone if the host closed it concurrently.
      let _ = self.close(handle);
    }
  }

  /// The record's stream channel, or None if the record is gone or closing.
  /// Callers seeing None abandon their blocking call and report
  /// cancellation.
  pub(crate) fn stream_channel(
    &self,
    handle: Handle,
  ) -> Option<Arc<dyn StreamChannel>> {
    match self.registry.lock().get(handle)?.channel.as_ref()? {
      Channel::Stream(chan) => Some(Arc::clone(chan)),
      Channel::Listener(_) => None,
    }
  }

  pub(crate) fn listener_channel(
    &self,
    handle: Handle,
  ) -> Option<Arc<dyn ListenerChannel>> {
    match self.registry.lock().get(handle)?.channel.as_ref()? {
      Channel::Listener(chan) => Some(Arc::clone(chan)),
      Channel::Stream(_) => None,
    }
  }

  /// Publishes one completion: clears the opcode bit, applies the cancel
  /// override, pushes the event and wakes close-waiters, all under one lock
  /// acquisition.
  pub(crate) fn publish(&self, handle: Handle, opcode: Opcode, raw: i32) {
    let mut registry = self.registry.lock();
    self.finish_locked(&mut registry, handle, opcode, raw);
  }

  /// Like [`publish`](Self::publish), but first settles the data object so
  /// its storage is stable before the event becomes observable.
  pub(crate) fn publish_settled(
    &self,
    handle: Handle,
    opcode: Opcode,
    raw: i32,
    data: &DataObject,
  ) {
    let mut registry = self.registry.lock();
    data.settle();
    self.finish_locked(&mut registry, handle, opcode, raw);
  }

  /// Publishes an accept success: registers the new stream record and
  /// reports its handle, in the same critical section.
  pub(crate) fn publish_accepted(
    &self,
    listener: Handle,
    conn: Arc<dyn StreamChannel>,
  ) {
    let mut registry = self.registry.lock();
    let handle = registry.create(ConnKind::Stream, Channel::Stream(conn));
    tracing::debug!(listener, handle, "accepted connection registered");
    self.finish_locked(&mut registry, listener, Opcode::Accept, handle);
  }

  fn finish_locked(
    &self,
    registry: &mut Registry,
    handle: Handle,
    opcode: Opcode,
    raw: i32,
  ) {
    let Some(rec) = registry.get_mut(handle) else {
      debug_assert!(false, "completion for unknown handle {handle}");
      return;
    };
    debug_assert!(
      rec.pending.contains(opcode),
      "completion for idle opcode {opcode:?} on handle {handle}"
    );

    // Cancellation intent beats the literal transport error: a failure
    // produced by the forced shutdown is not a meaningful one.
    let result =
      if raw < 0 && rec.canceling { code::CANCELED } else { raw };

    rec.pending.clear(opcode);
    self.sink.push(ConnEvent { handle, opcode, result });
    self.op_done.notify_all();

    tracing::trace!(handle, ?opcode, result, "operation completed");
  }
}
