#![allow(dead_code)]

use std::sync::Arc;

use tether::test_utils::{FixedPool, InlinePool};
use tether::{Engine, EventSink, Mailbox};

/// Engine whose pool runs operations on the submitting thread: by the time
/// a submit call returns, its completion event is in the mailbox.
pub fn inline_engine() -> (Arc<Engine>, Arc<Mailbox>) {
  let mailbox = Arc::new(Mailbox::new());
  let engine = Engine::new(Arc::new(InlinePool), Arc::clone(&mailbox) as Arc<dyn EventSink>);
  (engine, mailbox)
}

/// Engine backed by real worker threads.
pub fn threaded_engine(workers: usize) -> (Arc<Engine>, Arc<Mailbox>) {
  let mailbox = Arc::new(Mailbox::new());
  let engine = Engine::new(Arc::new(FixedPool::new(workers)), Arc::clone(&mailbox) as Arc<dyn EventSink>);
  (engine, mailbox)
}
