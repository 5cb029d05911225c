use crate::engine::Engine;
use crate::error::code;
use crate::event::Opcode;
use crate::op::ConnOp;
use crate::registry::Handle;

/// Opaque protocol-finish, e.g. completing an HTTP exchange. One blocking
/// call, one result code; nothing is parsed here.
pub(crate) struct Finish {
  pub handle: Handle,
}

impl ConnOp for Finish {
  fn run(self: Box<Self>, engine: &Engine) {
    let Some(chan) = engine.stream_channel(self.handle) else {
      engine.publish(self.handle, Opcode::Finish, code::CANCELED);
      return;
    };

    let result = chan.finish();
    engine.publish(self.handle, Opcode::Finish, result);
  }
}
