mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use tether::error::code;
use tether::test_utils::{BlockingStream, FixedPool, ScriptedListener, ScriptedStream};
use tether::{CloseError, ConnEvent, Engine, EventSink, IoBuf, Mailbox, Opcode, StreamChannel};

use common::{inline_engine, threaded_engine};

#[test]
fn close_cancels_blocked_read() {
  let (engine, mailbox) = threaded_engine(2);

  let chan = BlockingStream::new();
  let conn = engine.create_stream(Arc::clone(&chan) as Arc<dyn StreamChannel>);

  engine.read(conn, IoBuf::zeroed(10)).unwrap();
  chan.wait_entered();

  // Blocks until the aborted read reports its completion.
  engine.close(conn).unwrap();

  assert_eq!(chan.aborts(), 1);
  let event = mailbox.try_recv().expect("canceled read event");
  assert_eq!(
    event,
    ConnEvent { handle: conn, opcode: Opcode::Read, result: code::CANCELED },
    "cancellation overrides the raw transport error"
  );
  assert_eq!(engine.kind(conn), None);
}

#[test]
fn no_events_after_close_returns() {
  let (engine, mailbox) = threaded_engine(2);

  let chan = BlockingStream::new();
  let conn = engine.create_stream(Arc::clone(&chan) as Arc<dyn StreamChannel>);

  engine.read(conn, IoBuf::zeroed(4)).unwrap();
  chan.wait_entered();
  engine.write(conn, b"w".to_vec()).unwrap();
  chan.wait_entered();

  engine.close(conn).unwrap();

  let mut seen = 0;
  while mailbox.try_recv().is_some() {
    seen += 1;
  }
  assert_eq!(seen, 2, "both in-flight operations reported before close returned");

  thread::sleep(Duration::from_millis(50));
  assert!(mailbox.is_empty(), "nothing referencing the handle after close");
}

#[test]
fn close_idle_record_returns_immediately() {
  let (engine, mailbox) = inline_engine();

  let conn = engine.create_stream(ScriptedStream::new());
  engine.close(conn).unwrap();

  assert_eq!(engine.kind(conn), None);
  assert!(mailbox.is_empty());
}

#[test]
fn close_unknown_handle_is_not_found() {
  let (engine, _mailbox) = inline_engine();
  assert_eq!(engine.close(7), Err(CloseError::NotFound));
}

#[test]
fn concurrent_double_close_aborts_once() {
  let (engine, mailbox) = threaded_engine(2);

  let chan = BlockingStream::new();
  let conn = engine.create_stream(Arc::clone(&chan) as Arc<dyn StreamChannel>);

  engine.read(conn, IoBuf::zeroed(4)).unwrap();
  chan.wait_entered();

  let closers: Vec<_> = (0..2)
    .map(|_| {
      let engine = Arc::clone(&engine);
      thread::spawn(move || engine.close(conn))
    })
    .collect();

  for closer in closers {
    let result = closer.join().unwrap();
    // The slower closer may find the record already removed.
    assert!(matches!(result, Ok(()) | Err(CloseError::NotFound)));
  }

  assert_eq!(chan.aborts(), 1, "the channel is aborted exactly once");
  assert_eq!(engine.kind(conn), None);
  assert_eq!(mailbox.try_recv().map(|ev| ev.result), Some(code::CANCELED));
}

#[test]
fn close_listener_cancels_blocked_accept() {
  let (engine, mailbox) = threaded_engine(2);

  // An empty scripted listener fails fast, so park the accept by hand: the
  // listener waits for a release that never comes until abort.
  struct ParkedListener {
    inner: Arc<BlockingStream>,
  }

  impl tether::ListenerChannel for ParkedListener {
    fn accept(&self) -> Result<Arc<dyn tether::StreamChannel>, i32> {
      Err(self.inner.connect())
    }

    fn abort(&self) {
      tether::StreamChannel::abort(&*self.inner);
    }
  }

  let parked = BlockingStream::new();
  let listener =
    engine.create_listener(Arc::new(ParkedListener { inner: Arc::clone(&parked) }));

  engine.accept(listener).unwrap();
  parked.wait_entered();

  engine.close(listener).unwrap();

  let event = mailbox.try_recv().expect("canceled accept event");
  assert_eq!((event.opcode, event.result), (Opcode::Accept, code::CANCELED));
}

#[test]
fn close_all_empties_the_registry() {
  let (engine, mailbox) = inline_engine();

  engine.create_stream(ScriptedStream::new());
  engine.create_listener(ScriptedListener::new());
  engine.create_stream(ScriptedStream::new());
  assert_eq!(engine.live(), 3);

  engine.close_all();

  assert_eq!(engine.live(), 0);
  assert!(mailbox.is_empty());
}

#[test]
fn close_wait_services_the_sink() {
  struct CountingSink {
    inner: Mailbox,
    processed: AtomicUsize,
  }

  impl EventSink for CountingSink {
    fn push(&self, event: ConnEvent) {
      self.inner.push(event);
    }

    fn process_pending(&self) {
      self.processed.fetch_add(1, Ordering::AcqRel);
    }
  }

  let sink = Arc::new(CountingSink {
    inner: Mailbox::new(),
    processed: AtomicUsize::new(0),
  });
  let engine = Engine::new(Arc::new(FixedPool::new(2)), Arc::clone(&sink) as Arc<dyn EventSink>);

  let chan = BlockingStream::new();
  let conn = engine.create_stream(Arc::clone(&chan) as Arc<dyn StreamChannel>);

  engine.read(conn, IoBuf::zeroed(4)).unwrap();
  chan.wait_entered();
  engine.close(conn).unwrap();

  assert!(
    sink.processed.load(Ordering::Acquire) >= 1,
    "the close loop lets the sink process queued events"
  );
  assert_eq!(sink.inner.try_recv().map(|ev| ev.result), Some(code::CANCELED));
}

#[test]
fn churn_under_random_interleavings() {
  let (engine, mailbox) = threaded_engine(4);

  let mut accepted = 0usize;
  for _ in 0..50 {
    let chan = ScriptedStream::new();
    for _ in 0..fastrand::usize(0..3) {
      chan.push_read(b"data");
    }
    let conn = engine.create_stream(Arc::clone(&chan) as Arc<dyn StreamChannel>);

    if fastrand::bool() && engine.read(conn, IoBuf::zeroed(8)).is_ok() {
      accepted += 1;
    }
    if fastrand::bool() && engine.write(conn, b"w".to_vec()).is_ok() {
      accepted += 1;
    }

    engine.close(conn).unwrap();
  }

  assert_eq!(engine.live(), 0);

  let mut events = 0;
  while mailbox.try_recv().is_some() {
    events += 1;
  }
  assert_eq!(events, accepted, "exactly one event per accepted submission");
}
