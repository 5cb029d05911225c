use std::sync::Arc;

use crate::data::DataObject;
use crate::engine::Engine;
use crate::error::code;
use crate::event::Opcode;
use crate::op::ConnOp;
use crate::registry::Handle;

/// Reads directly into a range of a lent data object. Reports under the
/// `Read` opcode bit; the object is settled by the publisher, under the
/// engine lock, before the event is observable.
pub(crate) struct ReadToData {
  pub handle: Handle,
  pub data: Arc<DataObject>,
  pub offset: usize,
  pub len: usize,
}

impl ConnOp for ReadToData {
  fn run(self: Box<Self>, engine: &Engine) {
    let Some(chan) = engine.stream_channel(self.handle) else {
      engine.publish_settled(self.handle, Opcode::Read, code::CANCELED, &self.data);
      return;
    };

    let result = self.data.with_mut(|bytes| {
      let end = match self.offset.checked_add(self.len) {
        Some(end) if end <= bytes.len() => end,
        _ => return code::GENERIC,
      };
      chan.read(&mut bytes[self.offset..end])
    });

    engine.publish_settled(self.handle, Opcode::Read, result, &self.data);
  }
}
