use crate::engine::Engine;
use crate::error::code;
use crate::event::Opcode;
use crate::op::ConnOp;
use crate::registry::Handle;

pub(crate) struct Write {
  pub handle: Handle,
  pub bytes: Vec<u8>,
}

impl ConnOp for Write {
  fn run(self: Box<Self>, engine: &Engine) {
    let Some(chan) = engine.stream_channel(self.handle) else {
      engine.publish(self.handle, Opcode::Write, code::CANCELED);
      return;
    };

    let result = chan.write(&self.bytes);
    engine.publish(self.handle, Opcode::Write, result);
  }
}
