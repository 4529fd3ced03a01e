// src/cook/mod.rs

//! Cook orchestration: the task contract, the stage driver, the parallel
//! dispatcher and the atomic-output helpers tasks write through

pub mod atomic;
pub mod batch;
mod context;
mod cooker;
pub mod lock;
pub mod parallel;
pub mod priority;
pub mod process;
mod task;

pub use atomic::{AtomicOutput, atomic_move_final_output, atomic_write_final_output};
pub use context::CookContext;
pub use cooker::{Cooker, CookerBuilder, CookerState, StaleEntry};
pub use lock::CookerLock;
pub use parallel::{BatchOutcome, ParallelCook};
pub use task::CookTask;
