//! Host-registered binary objects for the zero-staging read/write variants.

use std::sync::atomic::{AtomicBool, Ordering};

use bytes::BytesMut;

use crate::sync::Mutex;

/// A binary object whose storage is temporarily lent to an in-flight
/// operation.
///
/// Submitting `read_to_data`/`write_from_data` marks the object lent; the
/// completion publisher settles it again, under the engine lock, before the
/// event becomes observable. A settled object's contents are stable for
/// inspection; a lent object must not be handed to a second operation.
pub struct DataObject {
  bytes: Mutex<BytesMut>,
  lent: AtomicBool,
}

impl DataObject {
  /// A zero-filled object of `len` bytes.
  pub fn zeroed(len: usize) -> Self {
    Self { bytes: Mutex::new(BytesMut::zeroed(len)), lent: AtomicBool::new(false) }
  }

  pub fn from_vec(contents: Vec<u8>) -> Self {
    Self {
      bytes: Mutex::new(BytesMut::from(&contents[..])),
      lent: AtomicBool::new(false),
    }
  }

  pub fn len(&self) -> usize {
    self.bytes.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.bytes.lock().is_empty()
  }

  /// Whether an in-flight operation currently holds the object.
  pub fn is_lent(&self) -> bool {
    self.lent.load(Ordering::Acquire)
  }

  /// Copies the current contents out.
  pub fn to_vec(&self) -> Vec<u8> {
    self.bytes.lock().to_vec()
  }

  /// Marks the object lent. Returns false if it already was.
  pub(crate) fn lend(&self) -> bool {
    !self.lent.swap(true, Ordering::AcqRel)
  }

  /// Returns the object to its owner: storage is stable again.
  pub(crate) fn settle(&self) {
    self.lent.store(false, Ordering::Release);
  }

  pub(crate) fn with_mut<R>(&self, f: impl FnOnce(&mut BytesMut) -> R) -> R {
    f(&mut self.bytes.lock())
  }

  /// Copies `len` bytes starting at `offset` into a staging buffer, or None
  /// if the range is out of bounds.
  pub(crate) fn stage(&self, offset: usize, len: usize) -> Option<Vec<u8>> {
    let bytes = self.bytes.lock();
    let end = offset.checked_add(len)?;
    if end > bytes.len() {
      return None;
    }
    Some(bytes[offset..end].to_vec())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lend_is_exclusive_until_settled() {
    let data = DataObject::zeroed(8);

    assert!(data.lend());
    assert!(data.is_lent());
    assert!(!data.lend());

    data.settle();
    assert!(!data.is_lent());
    assert!(data.lend());
  }

  #[test]
  fn stage_respects_bounds() {
    let data = DataObject::from_vec(vec![1, 2, 3, 4]);

    assert_eq!(data.stage(1, 2), Some(vec![2, 3]));
    assert_eq!(data.stage(0, 4), Some(vec![1, 2, 3, 4]));
    assert_eq!(data.stage(3, 2), None);
    assert_eq!(data.stage(usize::MAX, 1), None);
  }
}
