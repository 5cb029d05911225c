//! Shared byte buffers handed to in-flight read operations.

use std::sync::Arc;

use bytes::BytesMut;

use crate::sync::Mutex;

/// A cheaply clonable byte buffer used as the destination of `read` and
/// `read_from` submissions.
///
/// The host keeps one clone and hands another to the engine. While the
/// operation is in flight the contents are unspecified; once the completion
/// event is observed the first `result` bytes are stable for inspection.
#[derive(Clone)]
pub struct IoBuf(Arc<Mutex<BytesMut>>);

impl IoBuf {
  /// A zero-filled buffer of `len` bytes.
  pub fn zeroed(len: usize) -> Self {
    Self(Arc::new(Mutex::new(BytesMut::zeroed(len))))
  }

  pub fn from_vec(contents: Vec<u8>) -> Self {
    Self(Arc::new(Mutex::new(BytesMut::from(&contents[..]))))
  }

  pub fn len(&self) -> usize {
    self.0.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.lock().is_empty()
  }

  /// Copies the current contents out.
  pub fn to_vec(&self) -> Vec<u8> {
    self.0.lock().to_vec()
  }

  pub(crate) fn with_mut<R>(&self, f: impl FnOnce(&mut BytesMut) -> R) -> R {
    f(&mut self.0.lock())
  }
}

impl std::fmt::Debug for IoBuf {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "IoBuf({} bytes)", self.len())
  }
}
