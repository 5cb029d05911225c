//! Drives the engine against a channel backed by a real pipe, so the close
//! protocol has to unblock a read that is genuinely parked in the kernel.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tether::error::code;
use tether::{ConnEvent, IoBuf, Opcode, StreamChannel};

use common::threaded_engine;

/// `read` blocks in the kernel until data arrives or abort closes the write
/// end; the end-of-stream produced by the forced shutdown is reported as a
/// transport error, the way a real socket reports an aborted connection.
struct PipeStream {
  read_fd: i32,
  write_fd: i32,
  aborted: AtomicBool,
}

impl PipeStream {
  fn new() -> Arc<Self> {
    let mut fds = [0i32; 2];
    let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };
    assert_eq!(rc, 0, "pipe() failed");
    Arc::new(Self {
      read_fd: fds[0],
      write_fd: fds[1],
      aborted: AtomicBool::new(false),
    })
  }

  fn feed(&self, bytes: &[u8]) {
    let n = unsafe {
      libc::write(
        self.write_fd,
        bytes.as_ptr() as *const libc::c_void,
        bytes.len(),
      )
    };
    assert_eq!(n, bytes.len() as isize);
  }
}

impl StreamChannel for PipeStream {
  fn connect(&self) -> i32 {
    0
  }

  fn read(&self, buf: &mut [u8]) -> i32 {
    let n = unsafe {
      libc::read(self.read_fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len())
    };
    if n < 0 {
      return -std::io::Error::last_os_error()
        .raw_os_error()
        .unwrap_or(libc::EIO);
    }
    if n == 0 && self.aborted.load(Ordering::Acquire) {
      return -libc::ECONNABORTED;
    }
    n as i32
  }

  fn write(&self, buf: &[u8]) -> i32 {
    buf.len() as i32
  }

  fn abort(&self) {
    self.aborted.store(true, Ordering::Release);
    unsafe { libc::close(self.write_fd) };
  }
}

impl Drop for PipeStream {
  fn drop(&mut self) {
    unsafe {
      libc::close(self.read_fd);
      if !self.aborted.load(Ordering::Acquire) {
        libc::close(self.write_fd);
      }
    }
  }
}

#[test]
fn read_delivers_pipe_data() {
  let (engine, mailbox) = threaded_engine(1);

  let pipe = PipeStream::new();
  pipe.feed(b"hello");
  let conn = engine.create_stream(Arc::clone(&pipe) as Arc<dyn StreamChannel>);

  let buf = IoBuf::zeroed(16);
  engine.read(conn, buf.clone()).unwrap();

  let event = mailbox.recv();
  assert_eq!(event, ConnEvent { handle: conn, opcode: Opcode::Read, result: 5 });
  assert_eq!(&buf.to_vec()[..5], b"hello");

  engine.close(conn).unwrap();
}

#[test]
fn close_cancels_read_blocked_in_the_kernel() {
  let (engine, mailbox) = threaded_engine(1);

  let pipe = PipeStream::new();
  let conn = engine.create_stream(Arc::clone(&pipe) as Arc<dyn StreamChannel>);

  // Nothing in the pipe: the worker parks inside read(2).
  engine.read(conn, IoBuf::zeroed(16)).unwrap();
  thread::sleep(Duration::from_millis(50));

  engine.close(conn).unwrap();

  let event = mailbox.try_recv().expect("canceled read event");
  assert_eq!(
    (event.handle, event.opcode, event.result),
    (conn, Opcode::Read, code::CANCELED)
  );
  assert_eq!(engine.kind(conn), None);
}
