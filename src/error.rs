use std::{error, fmt, io, path::PathBuf};

use crate::lang::ExpressionError;
use crate::program::{FileFormatError, Pc, ProgramError};
use crate::render::RenderError;

/// Anything that stops a run. Every variant is fatal.
#[derive(Debug)]
pub enum Error {
    FileFormat(FileFormatError),
    /// An expression of the instruction at `pc` failed to parse or evaluate.
    Expression {
        pc: Pc,
        /// `nextpc` or `assign <name>`.
        field: String,
        text: String,
        source: ExpressionError,
    },
    Program(ProgramError),
    Render(RenderError),
    Io { path: PathBuf, source: io::Error },
}

impl Error {
    /// Short category name used as a prefix in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::FileFormat(_) => "FileFormatError",
            Error::Expression { .. } => "ExpressionError",
            Error::Program(_) => "ProgramError",
            Error::Render(_) => "RenderError",
            Error::Io { .. } => "IoError",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::FileFormat(e) => write!(f, "{}", e),
            Error::Expression { pc, field, text, source } => {
                write!(f, "pc {}: {} expression `{}`: {}", pc, field, text, source)
            }
            Error::Program(e) => write!(f, "{}", e),
            Error::Render(e) => write!(f, "{}", e),
            Error::Io { path, source } => write!(f, "{}: {}", path.display(), source),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::FileFormat(e) => Some(e),
            Error::Expression { source, .. } => Some(source),
            Error::Program(e) => Some(e),
            Error::Render(e) => Some(e),
            Error::Io { source, .. } => Some(source),
        }
    }
}

impl From<FileFormatError> for Error {
    fn from(e: FileFormatError) -> Self {
        Error::FileFormat(e)
    }
}

impl From<ProgramError> for Error {
    fn from(e: ProgramError) -> Self {
        Error::Program(e)
    }
}

impl From<RenderError> for Error {
    fn from(e: RenderError) -> Self {
        Error::Render(e)
    }
}
