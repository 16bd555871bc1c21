//! Instruction set definitions.
//!
//! The tag byte of each encoded instruction is the source symbol itself, so
//! the same table decodes both source text and compiled code.

use std::fmt;

/// Width of a jump operand in bytes.
pub const WORD_SIZE: usize = std::mem::size_of::<usize>();

/// Opcodes for the tape machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    /// Add one to the current cell (wrapping)
    Increment = b'+',
    /// Subtract one from the current cell (wrapping)
    Decrement = b'-',
    /// Move the tape cursor one cell right
    MoveRight = b'>',
    /// Move the tape cursor one cell left
    MoveLeft = b'<',
    /// Send the current cell to the output hook
    Output = b'.',
    /// Store a byte from the input hook in the current cell
    Input = b',',
    /// Skip to the matching LOOP_END if the current cell is zero: LOOP_START <target:usize>
    LoopStart = b'[',
    /// Jump back to the matching LOOP_START if the current cell is non-zero: LOOP_END <target:usize>
    LoopEnd = b']',
}

impl OpCode {
    /// Get the number of operand bytes for this opcode.
    pub fn operand_size(self) -> usize {
        match self {
            OpCode::Increment
            | OpCode::Decrement
            | OpCode::MoveRight
            | OpCode::MoveLeft
            | OpCode::Output
            | OpCode::Input => 0,

            OpCode::LoopStart | OpCode::LoopEnd => WORD_SIZE,
        }
    }

    /// Total encoded size: tag byte plus operand.
    #[inline]
    pub fn encoded_size(self) -> usize {
        1 + self.operand_size()
    }

    /// Convert from u8 to OpCode.
    pub fn from_u8(byte: u8) -> Option<OpCode> {
        match byte {
            b'+' => Some(OpCode::Increment),
            b'-' => Some(OpCode::Decrement),
            b'>' => Some(OpCode::MoveRight),
            b'<' => Some(OpCode::MoveLeft),
            b'.' => Some(OpCode::Output),
            b',' => Some(OpCode::Input),
            b'[' => Some(OpCode::LoopStart),
            b']' => Some(OpCode::LoopEnd),
            _ => None,
        }
    }

    /// Encoded size contributed by a source byte (0 for comments).
    #[inline]
    pub fn source_size(byte: u8) -> usize {
        Self::from_u8(byte).map_or(0, OpCode::encoded_size)
    }

    pub fn symbol(self) -> char {
        self as u8 as char
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> u8 {
        op as u8
    }
}

/// A decoded instruction with its resolved operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Increment,
    Decrement,
    MoveRight,
    MoveLeft,
    Output,
    Input,
    /// `end` is the offset of the matching LoopEnd.
    LoopStart { end: usize },
    /// `start` is the offset of the matching LoopStart.
    LoopEnd { start: usize },
}

impl Instruction {
    pub fn opcode(self) -> OpCode {
        match self {
            Instruction::Increment => OpCode::Increment,
            Instruction::Decrement => OpCode::Decrement,
            Instruction::MoveRight => OpCode::MoveRight,
            Instruction::MoveLeft => OpCode::MoveLeft,
            Instruction::Output => OpCode::Output,
            Instruction::Input => OpCode::Input,
            Instruction::LoopStart { .. } => OpCode::LoopStart,
            Instruction::LoopEnd { .. } => OpCode::LoopEnd,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::LoopStart { end } => write!(f, "{:?} -> {}", self.opcode(), end),
            Instruction::LoopEnd { start } => write!(f, "{:?} -> {}", self.opcode(), start),
            other => write!(f, "{:?}", other.opcode()),
        }
    }
}
