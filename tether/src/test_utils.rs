//! Test doubles for driving the engine without real sockets.
//!
//! Fake channels script their results up front; the blocking variants park
//! the calling worker until the test releases them or the close protocol
//! aborts. Only intended for this crate's tests and integration tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};

use crate::channel::{ListenerChannel, PeerAddr, StreamChannel};
use crate::error::code;
use crate::pool::{Job, WorkerPool};
use crate::sync::Mutex;

/// Runs every job on the submitting thread, immediately. Deterministic:
/// by the time `submit` returns, the completion event has been published.
#[doc(hidden)]
pub struct InlinePool;

impl WorkerPool for InlinePool {
  fn submit(&self, job: Job) {
    job();
  }
}

/// A channel-fed pool of plain threads.
#[doc(hidden)]
pub struct FixedPool {
  tx: Sender<Job>,
  _workers: Vec<JoinHandle<()>>,
}

impl FixedPool {
  pub fn new(workers: usize) -> Self {
    let (tx, rx) = crossbeam_channel::unbounded::<Job>();

    let workers = (0..workers)
      .map(|id| {
        let rx: Receiver<Job> = rx.clone();
        thread::Builder::new()
          .name(format!("tether-worker-{id}"))
          .spawn(move || {
            while let Ok(job) = rx.recv() {
              job();
            }
          })
          .expect("failed to spawn worker thread")
      })
      .collect();

    Self { tx, _workers: workers }
  }
}

impl WorkerPool for FixedPool {
  fn submit(&self, job: Job) {
    self.tx.send(job).expect("worker pool disconnected");
  }
}

enum ReadScript {
  Data(Vec<u8>, Option<PeerAddr>),
  Err(i32),
}

/// Stream channel answering from pre-loaded scripts.
///
/// Empty scripts fall back to neutral defaults: connect succeeds, read
/// reports end of stream, write reports the full length.
#[doc(hidden)]
pub struct ScriptedStream {
  connects: Mutex<VecDeque<i32>>,
  reads: Mutex<VecDeque<ReadScript>>,
  writes: Mutex<VecDeque<i32>>,
  finishes: Mutex<VecDeque<i32>>,
  written: Mutex<Vec<Vec<u8>>>,
  sent: Mutex<Vec<(Vec<u8>, PeerAddr)>>,
  aborts: AtomicUsize,
}

impl ScriptedStream {
  pub fn new() -> Arc<Self> {
    Arc::new(Self {
      connects: Mutex::new(VecDeque::new()),
      reads: Mutex::new(VecDeque::new()),
      writes: Mutex::new(VecDeque::new()),
      finishes: Mutex::new(VecDeque::new()),
      written: Mutex::new(Vec::new()),
      sent: Mutex::new(Vec::new()),
      aborts: AtomicUsize::new(0),
    })
  }

  pub fn push_connect(&self, result: i32) {
    self.connects.lock().push_back(result);
  }

  pub fn push_read(&self, bytes: &[u8]) {
    self.reads.lock().push_back(ReadScript::Data(bytes.to_vec(), None));
  }

  pub fn push_read_err(&self, result: i32) {
    self.reads.lock().push_back(ReadScript::Err(result));
  }

  pub fn push_datagram(&self, bytes: &[u8], peer: PeerAddr) {
    self.reads.lock().push_back(ReadScript::Data(bytes.to_vec(), Some(peer)));
  }

  pub fn push_write(&self, result: i32) {
    self.writes.lock().push_back(result);
  }

  pub fn push_finish(&self, result: i32) {
    self.finishes.lock().push_back(result);
  }

  /// Every payload passed to `write`/`write_to`, in order.
  pub fn written(&self) -> Vec<Vec<u8>> {
    self.written.lock().clone()
  }

  pub fn sent(&self) -> Vec<(Vec<u8>, PeerAddr)> {
    self.sent.lock().clone()
  }

  pub fn aborts(&self) -> usize {
    self.aborts.load(Ordering::Acquire)
  }

  fn next_read(&self, buf: &mut [u8]) -> (i32, Option<PeerAddr>) {
    match self.reads.lock().pop_front() {
      Some(ReadScript::Data(bytes, peer)) => {
        let len = bytes.len().min(buf.len());
        buf[..len].copy_from_slice(&bytes[..len]);
        (len as i32, peer)
      }
      Some(ReadScript::Err(result)) => (result, None),
      None => (0, None),
    }
  }
}

impl StreamChannel for ScriptedStream {
  fn connect(&self) -> i32 {
    self.connects.lock().pop_front().unwrap_or(0)
  }

  fn read(&self, buf: &mut [u8]) -> i32 {
    self.next_read(buf).0
  }

  fn write(&self, buf: &[u8]) -> i32 {
    self.written.lock().push(buf.to_vec());
    self.writes.lock().pop_front().unwrap_or(buf.len() as i32)
  }

  fn read_from(&self, buf: &mut [u8]) -> (i32, Option<PeerAddr>) {
    self.next_read(buf)
  }

  fn write_to(&self, buf: &[u8], addr: &PeerAddr) -> i32 {
    self.sent.lock().push((buf.to_vec(), addr.clone()));
    self.writes.lock().pop_front().unwrap_or(buf.len() as i32)
  }

  fn finish(&self) -> i32 {
    self.finishes.lock().pop_front().unwrap_or(code::UNSUPPORTED)
  }

  fn abort(&self) {
    self.aborts.fetch_add(1, Ordering::AcqRel);
  }
}

/// Stream channel whose calls park until the test releases them or the
/// close protocol aborts. Used to pin an operation mid-flight.
#[doc(hidden)]
pub struct BlockingStream {
  entered_tx: Sender<()>,
  entered_rx: Receiver<()>,
  release_tx: Sender<i32>,
  release_rx: Receiver<i32>,
  parked: AtomicUsize,
  aborts: AtomicUsize,
  abort_releases: bool,
}

impl BlockingStream {
  pub fn new() -> Arc<Self> {
    Self::build(true)
  }

  /// A variant whose abort is recorded but does not unpark the blocked
  /// call, pinning the record in its draining state until `release`.
  pub fn new_abortless() -> Arc<Self> {
    Self::build(false)
  }

  fn build(abort_releases: bool) -> Arc<Self> {
    let (entered_tx, entered_rx) = crossbeam_channel::unbounded();
    let (release_tx, release_rx) = crossbeam_channel::unbounded();
    Arc::new(Self {
      entered_tx,
      entered_rx,
      release_tx,
      release_rx,
      parked: AtomicUsize::new(0),
      aborts: AtomicUsize::new(0),
      abort_releases,
    })
  }

  /// Blocks until a channel call has entered its blocking section.
  pub fn wait_entered(&self) {
    self.entered_rx.recv().expect("blocking stream disconnected");
  }

  /// Unparks one blocked call with the given result.
  pub fn release(&self, result: i32) {
    let _ = self.release_tx.send(result);
  }

  pub fn aborts(&self) -> usize {
    self.aborts.load(Ordering::Acquire)
  }

  fn park(&self) -> i32 {
    // Calls made after an effective abort fail fast, like a closed socket.
    if self.abort_releases && self.aborts.load(Ordering::Acquire) > 0 {
      return -1;
    }
    self.parked.fetch_add(1, Ordering::AcqRel);
    let _ = self.entered_tx.send(());
    let result = self.release_rx.recv().unwrap_or(-1);
    self.parked.fetch_sub(1, Ordering::AcqRel);
    result
  }
}

impl StreamChannel for BlockingStream {
  fn connect(&self) -> i32 {
    self.park()
  }

  fn read(&self, _buf: &mut [u8]) -> i32 {
    self.park()
  }

  fn write(&self, _buf: &[u8]) -> i32 {
    self.park()
  }

  fn abort(&self) {
    self.aborts.fetch_add(1, Ordering::AcqRel);
    // Unblocks every parked call with a raw transport error; the engine's
    // cancel override turns it into CANCELED.
    if self.abort_releases {
      for _ in 0..self.parked.load(Ordering::Acquire) {
        let _ = self.release_tx.send(-1);
      }
    }
  }
}

/// Listener answering from a pre-loaded script; empty scripts fail.
#[doc(hidden)]
pub struct ScriptedListener {
  accepts: Mutex<VecDeque<Result<Arc<dyn StreamChannel>, i32>>>,
  aborts: AtomicUsize,
}

impl ScriptedListener {
  pub fn new() -> Arc<Self> {
    Arc::new(Self {
      accepts: Mutex::new(VecDeque::new()),
      aborts: AtomicUsize::new(0),
    })
  }

  pub fn push_conn(&self, conn: Arc<dyn StreamChannel>) {
    self.accepts.lock().push_back(Ok(conn));
  }

  pub fn push_err(&self, result: i32) {
    self.accepts.lock().push_back(Err(result));
  }

  pub fn aborts(&self) -> usize {
    self.aborts.load(Ordering::Acquire)
  }
}

impl ListenerChannel for ScriptedListener {
  fn accept(&self) -> Result<Arc<dyn StreamChannel>, i32> {
    self.accepts.lock().pop_front().unwrap_or(Err(code::GENERIC))
  }

  fn abort(&self) {
    self.aborts.fetch_add(1, Ordering::AcqRel);
  }
}
