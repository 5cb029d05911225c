use crate::buf::IoBuf;
use crate::channel::AddrSlot;
use crate::engine::Engine;
use crate::error::code;
use crate::event::Opcode;
use crate::op::ConnOp;
use crate::registry::Handle;

/// Datagram receive. Reports under the `Read` opcode bit; the source
/// address lands in the host's slot before the event publishes.
pub(crate) struct ReadFrom {
  pub handle: Handle,
  pub buf: IoBuf,
  pub addr: AddrSlot,
}

impl ConnOp for ReadFrom {
  fn run(self: Box<Self>, engine: &Engine) {
    let Some(chan) = engine.stream_channel(self.handle) else {
      engine.publish(self.handle, Opcode::Read, code::CANCELED);
      return;
    };

    let (result, peer) = self.buf.with_mut(|bytes| chan.read_from(bytes));
    self.addr.store(peer);
    engine.publish(self.handle, Opcode::Read, result);
  }
}
