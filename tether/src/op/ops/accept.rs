use crate::engine::Engine;
use crate::error::code;
use crate::event::Opcode;
use crate::op::ConnOp;
use crate::registry::Handle;

/// Waits for an incoming connection. On success a brand-new stream record
/// is registered and the reported result is its handle, not a byte count.
pub(crate) struct Accept {
  pub handle: Handle,
}

impl ConnOp for Accept {
  fn run(self: Box<Self>, engine: &Engine) {
    let Some(chan) = engine.listener_channel(self.handle) else {
      engine.publish(self.handle, Opcode::Accept, code::CANCELED);
      return;
    };

    match chan.accept() {
      Err(result) => engine.publish(self.handle, Opcode::Accept, result),
      Ok(conn) => engine.publish_accepted(self.handle, conn),
    }
  }
}
