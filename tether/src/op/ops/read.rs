use crate::buf::IoBuf;
use crate::engine::Engine;
use crate::error::code;
use crate::event::Opcode;
use crate::op::ConnOp;
use crate::registry::Handle;

pub(crate) struct Read {
  pub handle: Handle,
  pub buf: IoBuf,
}

impl ConnOp for Read {
  fn run(self: Box<Self>, engine: &Engine) {
    let Some(chan) = engine.stream_channel(self.handle) else {
      engine.publish(self.handle, Opcode::Read, code::CANCELED);
      return;
    };

    let result = self.buf.with_mut(|bytes| chan.read(bytes));
    engine.publish(self.handle, Opcode::Read, result);
  }
}
