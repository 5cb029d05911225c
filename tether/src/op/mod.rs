//! Operation variants: one blocking call, one completion event.
//!
//! Each opcode is a small struct implementing [`ConnOp`]. An operation is
//! created by a submit call, runs exactly once on a worker thread, and is
//! discarded; the engine guarantees it never outlives the record it names.

mod ops;

pub(crate) use ops::*;

use crate::engine::Engine;

/// The shared contract: perform the one blocking call appropriate to this
/// opcode against the owning record's channel, then report completion
/// through the engine.
///
/// Implementations that find the record already closing (no channel left)
/// skip the blocking call and report cancellation instead.
pub(crate) trait ConnOp: Send + 'static {
  fn run(self: Box<Self>, engine: &Engine);
}
