use std::fmt;

use crate::comparator::Classification;

/// Why a submission could not be graded on its output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    NoSourceFile,
    CompilationError,
    Timeout,
}

/// Grade bucket of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Grade {
    Excellent,
    Similar,
    Wrong,
    NoSource,
    CompilationError,
    Timeout,
}

impl Grade {
    pub const ALL: [Grade; 6] = [
        Grade::Excellent,
        Grade::Similar,
        Grade::Wrong,
        Grade::NoSource,
        Grade::CompilationError,
        Grade::Timeout,
    ];

    pub fn score(self) -> u32 {
        match self {
            Grade::Excellent => 100,
            Grade::Similar => 75,
            Grade::Wrong => 50,
            Grade::NoSource => 0,
            Grade::CompilationError => 10,
            Grade::Timeout => 20,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Grade::Excellent => "excellent",
            Grade::Similar => "similar",
            Grade::Wrong => "wrong",
            Grade::NoSource => "no source",
            Grade::CompilationError => "compilation error",
            Grade::Timeout => "timeout",
        }
    }
}

impl From<Classification> for Grade {
    fn from(classification: Classification) -> Self {
        match classification {
            Classification::Identical => Grade::Excellent,
            Classification::Similar => Grade::Similar,
            Classification::Different => Grade::Wrong,
        }
    }
}

impl From<FailureReason> for Grade {
    fn from(reason: FailureReason) -> Self {
        match reason {
            FailureReason::NoSourceFile => Grade::NoSource,
            FailureReason::CompilationError => Grade::CompilationError,
            FailureReason::Timeout => Grade::Timeout,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// One row of the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeRecord {
    pub name: String,
    pub grade: Grade,
}

impl GradeRecord {
    pub fn new(name: impl Into<String>, grade: impl Into<Grade>) -> Self {
        Self {
            name: name.into(),
            grade: grade.into(),
        }
    }

    pub fn score(&self) -> u32 {
        self.grade.score()
    }

    pub fn reason(&self) -> &'static str {
        self.grade.reason()
    }
}
