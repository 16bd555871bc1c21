//! Bytecode module for the tape VM.
//!
//! Source text is compiled into a flat byte buffer whose loop instructions
//! already know where their partner lives, then executed one instruction at
//! a time against a caller-supplied tape.
//!
//! # Architecture
//!
//! - `instruction`: OpCode definitions and encoded sizes
//! - `chunk`: The compiled program buffer
//! - `compiler`: Two-pass compiler with bracket matching
//! - `vm`: Single-step interpreter and run helpers
//! - `io`: Output/input hooks
//! - `disassembler`: Debug output for bytecode inspection

pub mod chunk;
pub mod compiler;
pub mod disassembler;
pub mod instruction;
pub mod io;
pub mod vm;

pub use chunk::Program;
pub use compiler::{Compiler, DEFAULT_MAX_LOOP_DEPTH};
pub use disassembler::{disassemble_program, print_disassembly};
pub use instruction::{Instruction, OpCode};
pub use io::{InputHook, OutputHook, ReadHook, StdinHook, StdoutHook, WriteHook};
pub use vm::{Interpreter, InterpreterParams, Step};
