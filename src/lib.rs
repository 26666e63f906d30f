//! Run tabular programs and animate which instruction is active each cycle.
//!
//! A program file lists one instruction per row: its text, how many cycles it
//! lasts, an expression giving the next `pc` and an effect on the variable
//! environment. [`vm`] runs the program and expands the visited instructions
//! into a per-cycle trace, and [`render`] turns that trace into a looping GIF.

pub mod config;
pub mod error;
pub mod lang;
pub mod logger;
pub mod pipeline;
pub mod program;
pub mod render;
pub mod vm;

pub use error::Error;
pub use logger::{LogMessage, Severity};
pub use pipeline::{Pipeline, PipelineOptions, Summary};
