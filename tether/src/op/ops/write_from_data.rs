use std::sync::Arc;

use crate::data::DataObject;
use crate::engine::Engine;
use crate::error::code;
use crate::event::Opcode;
use crate::op::ConnOp;
use crate::registry::Handle;

/// Writes a range of a lent data object. The range is staged into an
/// intermediate buffer first; a staging failure reports `GENERIC` without
/// touching the channel. Reports under the `Write` opcode bit.
pub(crate) struct WriteFromData {
  pub handle: Handle,
  pub data: Arc<DataObject>,
  pub offset: usize,
  pub len: usize,
}

impl ConnOp for WriteFromData {
  fn run(self: Box<Self>, engine: &Engine) {
    let Some(chan) = engine.stream_channel(self.handle) else {
      engine.publish_settled(self.handle, Opcode::Write, code::CANCELED, &self.data);
      return;
    };

    let result = match self.data.stage(self.offset, self.len) {
      Some(staged) => chan.write(&staged),
      None => code::GENERIC,
    };

    engine.publish_settled(self.handle, Opcode::Write, result, &self.data);
  }
}
