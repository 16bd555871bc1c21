//! Bytecode disassembler for debugging.

use crate::bytecode::chunk::Program;
use crate::bytecode::instruction::{Instruction, WORD_SIZE};
use std::fmt::Write;

/// Disassemble a program into human-readable output.
pub fn disassemble_program(program: &Program) -> String {
    let mut output = String::new();

    writeln!(
        &mut output,
        "== program ({} bytes, word size {}) ==",
        program.len(),
        WORD_SIZE
    )
    .unwrap();

    let mut depth = 0usize;
    let mut decoded = 0;
    for (offset, instruction) in program.instructions() {
        if matches!(instruction, Instruction::LoopEnd { .. }) {
            depth = depth.saturating_sub(1);
        }
        disassemble_instruction(offset, instruction, depth, &mut output);
        if matches!(instruction, Instruction::LoopStart { .. }) {
            depth += 1;
        }
        decoded = offset + instruction.opcode().encoded_size();
    }

    if decoded < program.len() {
        writeln!(&mut output, "{:04} <undecodable>", decoded).unwrap();
    }

    output
}

/// Disassemble a single instruction, indented by loop depth.
pub fn disassemble_instruction(
    offset: usize,
    instruction: Instruction,
    depth: usize,
    output: &mut String,
) {
    write!(output, "{:04} {}", offset, "  ".repeat(depth)).unwrap();
    writeln!(output, "{}", instruction).unwrap();
}

/// Print disassembly to stdout.
pub fn print_disassembly(program: &Program) {
    print!("{}", disassemble_program(program));
}
