// [apps/worker/src/lib.rs]
pub mod kernel;
pub mod services;
pub mod state;

pub mod prelude {
    pub use crate::kernel::WorkerKernel;
    pub use crate::state::WorkerState;
}
