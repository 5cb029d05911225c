//! The worker pool, seen from the engine side.

/// One unit of work: runs an operation's blocking call and reports its
/// completion. Monomorphized per operation at the submit site.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// External facility executing submitted jobs off the host thread.
///
/// Fire-and-forget: the engine observes no return value and assumes no
/// ordering across jobs. Every submitted job must eventually run; a pool
/// that drops jobs strands pending-operation bits and deadlocks close.
pub trait WorkerPool: Send + Sync {
  fn submit(&self, job: Job);
}
