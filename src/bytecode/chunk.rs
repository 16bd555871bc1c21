//! Compiled program buffer.

use crate::bytecode::instruction::{Instruction, OpCode, WORD_SIZE};
use crate::error::CompileError;

/// A compiled program: encoded instructions in one contiguous buffer.
///
/// Loop instructions carry the offset of their partner's tag byte as a
/// native-endian `usize` right after the tag. The buffer is allocated once
/// with the exact size the source needs and never grows afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    code: Vec<u8>,
}

impl Program {
    /// Allocate an empty program able to hold exactly `size` bytes.
    pub(crate) fn with_capacity(size: usize) -> Result<Self, CompileError> {
        let mut code = Vec::new();
        code.try_reserve_exact(size)
            .map_err(|_| CompileError::out_of_memory(size))?;
        Ok(Self { code })
    }

    /// Write an opcode and return its offset.
    pub(crate) fn write_op(&mut self, op: OpCode) -> usize {
        let offset = self.code.len();
        self.code.push(op as u8);
        offset
    }

    /// Write a jump operand (native byte order).
    pub(crate) fn write_word(&mut self, value: usize) {
        self.code.extend_from_slice(&value.to_ne_bytes());
    }

    /// Overwrite the operand of the loop instruction at `offset`.
    pub(crate) fn patch_jump(&mut self, offset: usize, target: usize) {
        let start = offset + 1;
        self.code[start..start + WORD_SIZE].copy_from_slice(&target.to_ne_bytes());
    }

    /// Read a word operand starting at `offset`.
    pub fn read_word(&self, offset: usize) -> Option<usize> {
        let bytes = self.code.get(offset..offset.checked_add(WORD_SIZE)?)?;
        bytes.try_into().ok().map(usize::from_ne_bytes)
    }

    /// Number of encoded bytes.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.code
    }

    /// The opcode whose tag byte sits at `offset`.
    pub fn opcode_at(&self, offset: usize) -> Option<OpCode> {
        self.code.get(offset).copied().and_then(OpCode::from_u8)
    }

    /// The resolved jump target of the loop instruction at `offset`.
    pub fn jump_target_at(&self, offset: usize) -> Option<usize> {
        match self.opcode_at(offset)? {
            OpCode::LoopStart | OpCode::LoopEnd => self.read_word(offset + 1),
            _ => None,
        }
    }

    /// Decode the instruction at `offset`.
    pub fn decode_at(&self, offset: usize) -> Option<Instruction> {
        let op = self.opcode_at(offset)?;
        Some(match op {
            OpCode::Increment => Instruction::Increment,
            OpCode::Decrement => Instruction::Decrement,
            OpCode::MoveRight => Instruction::MoveRight,
            OpCode::MoveLeft => Instruction::MoveLeft,
            OpCode::Output => Instruction::Output,
            OpCode::Input => Instruction::Input,
            OpCode::LoopStart => Instruction::LoopStart {
                end: self.read_word(offset + 1)?,
            },
            OpCode::LoopEnd => Instruction::LoopEnd {
                start: self.read_word(offset + 1)?,
            },
        })
    }

    /// Iterate over `(offset, instruction)` pairs in program order.
    pub fn instructions(&self) -> Instructions<'_> {
        Instructions {
            program: self,
            offset: 0,
        }
    }
}

/// Iterator returned by [`Program::instructions`].
pub struct Instructions<'a> {
    program: &'a Program,
    offset: usize,
}

impl Iterator for Instructions<'_> {
    type Item = (usize, Instruction);

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.offset;
        let instruction = self.program.decode_at(offset)?;
        self.offset += instruction.opcode().encoded_size();
        Some((offset, instruction))
    }
}
