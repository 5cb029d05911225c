use crate::channel::PeerAddr;
use crate::engine::Engine;
use crate::error::code;
use crate::event::Opcode;
use crate::op::ConnOp;
use crate::registry::Handle;

/// Datagram send. Reports under the `Write` opcode bit.
pub(crate) struct WriteTo {
  pub handle: Handle,
  pub bytes: Vec<u8>,
  pub addr: PeerAddr,
}

impl ConnOp for WriteTo {
  fn run(self: Box<Self>, engine: &Engine) {
    let Some(chan) = engine.stream_channel(self.handle) else {
      engine.publish(self.handle, Opcode::Write, code::CANCELED);
      return;
    };

    let result = chan.write_to(&self.bytes, &self.addr);
    engine.publish(self.handle, Opcode::Write, result);
  }
}
