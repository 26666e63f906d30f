//! Running programs and turning the run into a cycle timeline.

pub mod machine;
pub mod trace;

#[cfg(test)]
mod tests;

pub use machine::{Execution, Machine, Visit, interpret};
pub use trace::{CycleTrace, build_trace};
