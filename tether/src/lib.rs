//! # Tether - asynchronous connection-operation engine
//!
//! Tether lets a single-threaded host issue non-blocking-looking network
//! operations (connect, read, write, datagram read/write, accept, and
//! protocol-finish) while the actual blocking calls execute on a worker
//! pool. Completions come back as discrete [`ConnEvent`]s through the host's
//! event queue, never as callbacks into host code.
//!
//! The engine is a dispatch and lifecycle layer, not a protocol codec: the
//! transports ([`StreamChannel`] / [`ListenerChannel`]), the worker pool
//! ([`WorkerPool`]) and the event queue ([`EventSink`]) are all supplied by
//! the embedder.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tether::{Engine, EventSink, Job, Mailbox, StreamChannel, WorkerPool};
//!
//! // The pool is an external collaborator; one thread per job will do here.
//! struct Spawn;
//!
//! impl WorkerPool for Spawn {
//!   fn submit(&self, job: Job) {
//!     std::thread::spawn(job);
//!   }
//! }
//!
//! struct Loopback;
//!
//! impl StreamChannel for Loopback {
//!   fn connect(&self) -> i32 { 0 }
//!   fn read(&self, _buf: &mut [u8]) -> i32 { 0 }
//!   fn write(&self, buf: &[u8]) -> i32 { buf.len() as i32 }
//!   fn abort(&self) {}
//! }
//!
//! let mailbox = Arc::new(Mailbox::new());
//! let engine = Engine::new(Arc::new(Spawn), Arc::clone(&mailbox) as Arc<dyn EventSink>);
//!
//! let conn = engine.create_stream(Arc::new(Loopback));
//! engine.connect(conn).unwrap();
//!
//! let event = mailbox.recv();
//! assert_eq!((event.handle, event.result), (conn, 0));
//!
//! engine.close(conn).unwrap();
//! ```
//!
//! ## Threading
//!
//! - Submit methods never block; the opcode's pending bit is set before the
//!   operation reaches the pool.
//! - At most one operation per opcode may be in flight on a connection;
//!   a second submission of the same kind is rejected, never queued.
//! - [`Engine::close`] blocks until every in-flight operation on the handle
//!   has reported, relying on the channel's `abort` to unblock them.
//!   Blocked calls unblocked by an abort complete with
//!   [`code::CANCELED`](error::code::CANCELED) instead of their raw error.

mod buf;
mod channel;
mod data;
mod engine;
pub mod error;
mod event;
mod mailbox;
mod op;
mod pool;
mod registry;
mod sync;

#[doc(hidden)]
pub mod test_utils;

pub use buf::IoBuf;
pub use channel::{AddrSlot, ListenerChannel, PeerAddr, StreamChannel};
pub use data::DataObject;
pub use engine::Engine;
pub use error::{CloseError, SubmitError};
pub use event::{ConnEvent, EventSink, Opcode};
pub use mailbox::Mailbox;
pub use pool::{Job, WorkerPool};
pub use registry::{ConnKind, Handle};
