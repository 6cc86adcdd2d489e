pub mod grade;
pub mod utils;

pub use grade::{FailureReason, Grade, GradeRecord};
