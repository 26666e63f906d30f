use std::{error, fmt};

use super::Pc;

/// A program that is well formed on disk but cannot be run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramError {
    /// Control reached a `pc` with no instruction. `from` is the instruction
    /// that handed control over, `None` for the entry point.
    MissingInstruction { pc: Pc, from: Option<Pc> },
    UnknownEffect { pc: Pc, descriptor: String },
    InvalidAssignment { pc: Pc, descriptor: String },
    /// Instruction at `index` breaks the dense `pc` sequence.
    NonContiguous { index: usize, expected: Pc, found: Pc },
    ZeroCycleCost { pc: Pc },
    StepLimitExceeded { limit: usize, pc: Pc },
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramError::MissingInstruction { pc, from: Some(from) } => {
                write!(f, "pc {} jumps to pc {}, which does not exist", from, pc)
            }
            ProgramError::MissingInstruction { pc, from: None } => {
                write!(f, "entry point pc {} does not exist", pc)
            }
            ProgramError::UnknownEffect { pc, descriptor } => {
                write!(f, "unknown `meta` contents for pc {}: \"{}\"", pc, descriptor)
            }
            ProgramError::InvalidAssignment { pc, descriptor } => write!(
                f,
                "malformed assignment for pc {}: \"{}\" (expected `assign <name>=<expr>`)",
                pc, descriptor
            ),
            ProgramError::NonContiguous { index, expected, found } => write!(
                f,
                "instruction {} has pc {}, expected {}",
                index, found, expected
            ),
            ProgramError::ZeroCycleCost { pc } => {
                write!(f, "instruction at pc {} must last at least one cycle", pc)
            }
            ProgramError::StepLimitExceeded { limit, pc } => write!(
                f,
                "program did not terminate within {} steps (stopped at pc {})",
                limit, pc
            ),
        }
    }
}

impl error::Error for ProgramError {}

/// Why a row of a program file was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatIssueKind {
    MissingHeader,
    BadHeader { found: Vec<String> },
    WrongArity { found: usize },
    InvalidPc { field: String },
    InvalidCycleCount { field: String },
    NonContiguousPc { expected: Pc, found: Pc },
}

impl fmt::Display for FormatIssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatIssueKind::MissingHeader => write!(f, "missing header line"),
            FormatIssueKind::BadHeader { found } => write!(
                f,
                "header should be `pc@code@cyclecount@nextpc@meta`, found {:?}",
                found
            ),
            FormatIssueKind::WrongArity { found } => {
                write!(f, "expected 5 `@`-separated fields, found {}", found)
            }
            FormatIssueKind::InvalidPc { field } => {
                write!(f, "pc `{}` is not an integer", field.trim())
            }
            FormatIssueKind::InvalidCycleCount { field } => {
                write!(f, "cyclecount `{}` is not a positive integer", field.trim())
            }
            FormatIssueKind::NonContiguousPc { expected, found } => write!(
                f,
                "PCs should increment by 1 each line: expected {}, found {}",
                expected, found
            ),
        }
    }
}

/// One rejected line of a program file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatIssue {
    /// Index of the row after the header; `None` for the header itself.
    pub row: Option<usize>,
    /// 1-based line number in the file.
    pub line: usize,
    pub raw: String,
    pub kind: FormatIssueKind,
}

impl fmt::Display for FormatIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(f, "row {} (line {}): {}", row, self.line, self.kind)?,
            None => write!(f, "header (line {}): {}", self.line, self.kind)?,
        }
        write!(f, "\n  \"{}\"", self.raw)
    }
}

/// Every problem found while reading a program file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFormatError {
    pub issues: Vec<FormatIssue>,
}

impl fmt::Display for FileFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s) while parsing the program file", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n{}", issue)?;
        }
        Ok(())
    }
}

impl error::Error for FileFormatError {}
