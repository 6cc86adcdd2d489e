//! Batch grader for C submissions
//!
//! Compiles each submission folder's single source file, runs it on a
//! reference input under a time limit, and grades the output against a
//! reference output with a whitespace and case tolerant comparison.

pub mod checker;
pub mod comparator;
pub mod compiler;
pub mod config;
pub mod core;
pub mod error;
pub mod grader;
pub mod report;
pub mod runner;

pub use comparator::{compare, compare_files, Classification};
pub use config::{GradingTask, Settings};
pub use error::GraderError;
pub use grader::{Grader, GradingSummary};
