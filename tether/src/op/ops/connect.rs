use crate::engine::Engine;
use crate::error::code;
use crate::event::Opcode;
use crate::op::ConnOp;
use crate::registry::Handle;

pub(crate) struct Connect {
  pub handle: Handle,
}

impl ConnOp for Connect {
  fn run(self: Box<Self>, engine: &Engine) {
    let Some(chan) = engine.stream_channel(self.handle) else {
      engine.publish(self.handle, Opcode::Connect, code::CANCELED);
      return;
    };

    let result = chan.connect();
    engine.publish(self.handle, Opcode::Connect, result);
  }
}
