//! tapevm: a virtual machine for the 8-instruction tape language.
//!
//! This is the library root that exports all modules.
//!
//! # Execution model
//!
//! Source is compiled once into a [`bytecode::Program`] whose loop
//! instructions carry pre-resolved jump offsets. A
//! [`bytecode::Interpreter`] then steps that program against a byte tape
//! borrowed from the caller:
//!
//! ```
//! use tapevm::bytecode::{Interpreter, InterpreterParams};
//!
//! let mut tape = [0u8; 256];
//! let mut out = Vec::new();
//! {
//!     let params = InterpreterParams::new(&mut tape).with_output(|b: u8| out.push(b));
//!     let mut vm = Interpreter::new("++++++++[>++++++++<-]>+.", params).unwrap();
//!     vm.run().unwrap();
//! }
//! assert_eq!(out, b"A");
//! ```

pub mod bytecode;
pub mod error;
pub mod span;

use bytecode::{Compiler, Interpreter, InterpreterParams};
use error::TapeVmError;

/// Run a program on a zeroed tape of `tape_size` cells using standard I/O.
pub fn run(source: &str, tape_size: usize) -> Result<(), TapeVmError> {
    let mut tape = vec![0u8; tape_size];
    run_with_tape(source, &mut tape)
}

/// Run a program against a caller-supplied tape using standard I/O.
pub fn run_with_tape(source: &str, tape: &mut [u8]) -> Result<(), TapeVmError> {
    let mut interpreter = Interpreter::new(source, InterpreterParams::new(tape))?;
    interpreter.run()?;
    Ok(())
}

/// Compile source code to bytecode without executing.
pub fn compile(source: &str) -> Result<bytecode::Program, TapeVmError> {
    let program = Compiler::new().compile(source)?;
    Ok(program)
}

/// Disassemble compiled bytecode to a string.
pub fn disassemble(program: &bytecode::Program) -> String {
    bytecode::disassemble_program(program)
}
