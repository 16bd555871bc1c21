//! Error types for compilation and execution.

use std::fmt;
use std::io;

use crate::span::Span;
use thiserror::Error;

/// Compilation errors.
///
/// None of these ever leave a partially built program behind: the compiler
/// either returns a fully resolved buffer or one of these.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Out of memory allocating {requested} bytes of program code")]
    OutOfMemory { requested: usize },

    #[error("Unmatched ']' at {0}")]
    UnmatchedLoopEnd(Span),

    #[error("Unmatched '[' at {0}")]
    UnmatchedLoopStart(Span),

    #[error("Loop nesting exceeds the limit of {limit} at {span}")]
    NestingLimitExceeded { limit: usize, span: Span },

    #[error("Internal error: compiled {actual} bytes, expected {expected}")]
    InternalConsistency { expected: usize, actual: usize },
}

impl CompileError {
    pub fn out_of_memory(requested: usize) -> Self {
        Self::OutOfMemory { requested }
    }

    pub fn nesting_limit_exceeded(limit: usize, span: Span) -> Self {
        Self::NestingLimitExceeded { limit, span }
    }

    /// Whether this is an unbalanced-bracket error.
    pub fn is_syntax_error(&self) -> bool {
        matches!(
            self,
            Self::UnmatchedLoopEnd(_) | Self::UnmatchedLoopStart(_)
        )
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UnmatchedLoopEnd(span) => Some(*span),
            Self::UnmatchedLoopStart(span) => Some(*span),
            Self::NestingLimitExceeded { span, .. } => Some(*span),
            Self::OutOfMemory { .. } | Self::InternalConsistency { .. } => None,
        }
    }
}

/// Direction of a tape cursor move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
        }
    }
}

/// Runtime faults raised by a single step.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(
        "Tape bounds fault: cannot move {direction} from cell {position} (tape length {tape_len}) at code offset {code_position}"
    )]
    TapeOutOfBounds {
        direction: Direction,
        position: usize,
        tape_len: usize,
        code_position: usize,
    },

    #[error("Tape bounds fault: the tape has no cells (code offset {code_position})")]
    EmptyTape { code_position: usize },

    #[error("I/O error at code offset {code_position}: {source}")]
    Io {
        code_position: usize,
        #[source]
        source: io::Error,
    },

    #[error("Internal error at code offset {code_position}: {message}")]
    InternalConsistency {
        code_position: usize,
        message: String,
    },
}

impl RuntimeError {
    pub fn tape_out_of_bounds(
        direction: Direction,
        position: usize,
        tape_len: usize,
        code_position: usize,
    ) -> Self {
        Self::TapeOutOfBounds {
            direction,
            position,
            tape_len,
            code_position,
        }
    }

    pub fn empty_tape(code_position: usize) -> Self {
        Self::EmptyTape { code_position }
    }

    pub fn io(code_position: usize, source: io::Error) -> Self {
        Self::Io {
            code_position,
            source,
        }
    }

    pub fn internal(code_position: usize, message: impl Into<String>) -> Self {
        Self::InternalConsistency {
            code_position,
            message: message.into(),
        }
    }

    /// Whether the fault came from leaving the supplied tape.
    pub fn is_tape_fault(&self) -> bool {
        matches!(self, Self::TapeOutOfBounds { .. } | Self::EmptyTape { .. })
    }

    /// Code offset of the instruction that faulted.
    pub fn code_position(&self) -> usize {
        match self {
            Self::TapeOutOfBounds { code_position, .. } => *code_position,
            Self::EmptyTape { code_position } => *code_position,
            Self::Io { code_position, .. } => *code_position,
            Self::InternalConsistency { code_position, .. } => *code_position,
        }
    }
}

/// A unified error type for all phases.
#[derive(Debug, Error)]
pub enum TapeVmError {
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
