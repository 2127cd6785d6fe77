// [apps/scheduler/src/lib.rs]
pub mod jobs;
pub mod kernel;
pub mod state;

pub mod prelude {
    pub use crate::kernel::SchedulerKernel;
    pub use crate::state::SchedulerState;
}
