//! Tape virtual machine: executes a compiled program one instruction at a time.

use std::fmt;

use tracing::debug;

use crate::bytecode::chunk::Program;
use crate::bytecode::compiler::{CompileResult, Compiler, DEFAULT_MAX_LOOP_DEPTH};
use crate::bytecode::instruction::OpCode;
use crate::bytecode::io::{InputHook, OutputHook, StdinHook, StdoutHook};
use crate::error::{Direction, RuntimeError};

/// Result type for VM operations.
pub type VMResult<T> = Result<T, RuntimeError>;

/// Outcome of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// An instruction ran; more may follow.
    Continue,
    /// The code cursor is at the end of the program. Nothing ran.
    Halted,
}

/// Everything an interpreter needs besides the source.
pub struct InterpreterParams<'a> {
    /// Tape memory, borrowed for the interpreter's lifetime
    pub tape: &'a mut [u8],
    /// Receives Output bytes; standard output when `None`
    pub output: Option<Box<dyn OutputHook + 'a>>,
    /// Supplies Input bytes; standard input when `None`
    pub input: Option<Box<dyn InputHook + 'a>>,
    /// Bound on simultaneously open loops during compilation
    pub max_loop_depth: usize,
}

impl<'a> InterpreterParams<'a> {
    pub fn new(tape: &'a mut [u8]) -> Self {
        Self {
            tape,
            output: None,
            input: None,
            max_loop_depth: DEFAULT_MAX_LOOP_DEPTH,
        }
    }

    pub fn with_output(mut self, hook: impl OutputHook + 'a) -> Self {
        self.output = Some(Box::new(hook));
        self
    }

    pub fn with_input(mut self, hook: impl InputHook + 'a) -> Self {
        self.input = Some(Box::new(hook));
        self
    }

    pub fn with_max_loop_depth(mut self, max_loop_depth: usize) -> Self {
        self.max_loop_depth = max_loop_depth;
        self
    }
}

/// The tape interpreter.
///
/// Owns its compiled program and borrows the tape. `step` is resumable: a
/// host can interleave it with other work, cap the number of instructions,
/// or stop calling it at any point.
pub struct Interpreter<'a> {
    /// The compiled instructions
    program: Program,
    /// Offset of the next instruction's tag byte
    code_pos: usize,
    /// Tape memory
    tape: &'a mut [u8],
    /// Index of the current cell
    tape_pos: usize,
    output: Box<dyn OutputHook + 'a>,
    input: Box<dyn InputHook + 'a>,
    /// Number of instructions executed so far
    steps: u64,
}

impl<'a> Interpreter<'a> {
    /// Compile `source` and build an interpreter around it.
    pub fn new(source: &str, params: InterpreterParams<'a>) -> CompileResult<Self> {
        let program = Compiler::new()
            .with_max_loop_depth(params.max_loop_depth)
            .compile(source)?;
        Ok(Self::from_program(program, params))
    }

    /// Build an interpreter around an already compiled program.
    ///
    /// `params.max_loop_depth` is ignored here; the nesting bound only
    /// applies when compiling, as in [`Interpreter::new`].
    pub fn from_program(program: Program, params: InterpreterParams<'a>) -> Self {
        let InterpreterParams {
            tape,
            output,
            input,
            ..
        } = params;

        Self {
            program,
            code_pos: 0,
            tape,
            tape_pos: 0,
            output: output.unwrap_or_else(|| Box::new(StdoutHook)),
            input: input.unwrap_or_else(|| Box::new(StdinHook)),
            steps: 0,
        }
    }

    /// Execute the instruction under the code cursor.
    ///
    /// Returns `Halted` without doing anything once the cursor has reached
    /// the end of the program, however many times it is called. On a fault
    /// the tape and both cursors are left as they were before the call.
    pub fn step(&mut self) -> VMResult<Step> {
        let code_pos = self.code_pos;
        if code_pos >= self.program.len() {
            if code_pos != self.program.len() {
                return Err(RuntimeError::internal(
                    code_pos,
                    format!("code cursor past program end {}", self.program.len()),
                ));
            }
            return Ok(Step::Halted);
        }

        let byte = self.program.as_bytes()[code_pos];
        let opcode = OpCode::from_u8(byte).ok_or_else(|| {
            RuntimeError::internal(code_pos, format!("bad instruction 0x{:02x}", byte))
        })?;

        match opcode {
            OpCode::Increment => {
                let cell = self.cell_mut(code_pos)?;
                *cell = cell.wrapping_add(1);
            }

            OpCode::Decrement => {
                let cell = self.cell_mut(code_pos)?;
                *cell = cell.wrapping_sub(1);
            }

            OpCode::MoveRight => {
                if self.tape_pos + 1 >= self.tape.len() {
                    return Err(RuntimeError::tape_out_of_bounds(
                        Direction::Right,
                        self.tape_pos,
                        self.tape.len(),
                        code_pos,
                    ));
                }
                self.tape_pos += 1;
            }

            OpCode::MoveLeft => {
                if self.tape_pos == 0 {
                    return Err(RuntimeError::tape_out_of_bounds(
                        Direction::Left,
                        self.tape_pos,
                        self.tape.len(),
                        code_pos,
                    ));
                }
                self.tape_pos -= 1;
            }

            OpCode::Output => {
                let value = *self.cell_mut(code_pos)?;
                self.output
                    .put(value)
                    .map_err(|e| RuntimeError::io(code_pos, e))?;
            }

            OpCode::Input => {
                // Fault on a missing cell before consuming any input.
                self.cell_mut(code_pos)?;
                let value = self
                    .input
                    .get()
                    .map_err(|e| RuntimeError::io(code_pos, e))?;
                *self.cell_mut(code_pos)? = value;
            }

            OpCode::LoopStart | OpCode::LoopEnd => {
                let is_zero = *self.cell_mut(code_pos)? == 0;
                // LOOP_START skips on zero, LOOP_END repeats on non-zero.
                if is_zero == (opcode == OpCode::LoopStart) {
                    self.code_pos = self.read_jump(code_pos)?;
                    self.steps += 1;
                    return Ok(Step::Continue);
                }
            }
        }

        self.code_pos = code_pos + opcode.encoded_size();
        self.steps += 1;
        Ok(Step::Continue)
    }

    /// Step until the program halts or faults.
    pub fn run(&mut self) -> VMResult<()> {
        loop {
            match self.step() {
                Ok(Step::Continue) => {}
                Ok(Step::Halted) => {
                    debug!(steps = self.steps, "program halted");
                    return Ok(());
                }
                Err(e) => {
                    debug!(steps = self.steps, error = %e, "program faulted");
                    return Err(e);
                }
            }
        }
    }

    /// Step at most `max_steps` times.
    ///
    /// Returns `Halted` if the program finished within the budget and
    /// `Continue` if it is still running; calling again resumes it.
    pub fn run_for(&mut self, max_steps: u64) -> VMResult<Step> {
        for _ in 0..max_steps {
            if self.step()? == Step::Halted {
                return Ok(Step::Halted);
            }
        }
        if self.is_halted() {
            Ok(Step::Halted)
        } else {
            Ok(Step::Continue)
        }
    }

    pub fn is_halted(&self) -> bool {
        self.code_pos >= self.program.len()
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Offset of the next instruction to execute.
    pub fn code_position(&self) -> usize {
        self.code_pos
    }

    /// Index of the current tape cell.
    pub fn tape_position(&self) -> usize {
        self.tape_pos
    }

    pub fn tape(&self) -> &[u8] {
        self.tape
    }

    /// Number of instructions executed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn cell_mut(&mut self, code_pos: usize) -> VMResult<&mut u8> {
        self.tape
            .get_mut(self.tape_pos)
            .ok_or_else(|| RuntimeError::empty_tape(code_pos))
    }

    fn read_jump(&self, code_pos: usize) -> VMResult<usize> {
        self.program
            .read_word(code_pos + 1)
            .ok_or_else(|| RuntimeError::internal(code_pos, "truncated jump operand"))
    }
}

impl fmt::Debug for Interpreter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("code_pos", &self.code_pos)
            .field("code_size", &self.program.len())
            .field("tape_pos", &self.tape_pos)
            .field("tape_size", &self.tape.len())
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}
