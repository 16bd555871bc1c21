//! Bytecode compiler: transforms source text into a jump-resolved program.
//!
//! Compilation takes two passes over the source. The first sums the encoded
//! size of every recognized symbol so the program buffer is allocated once.
//! The second writes the instructions and matches brackets with a bounded
//! stack, patching both ends of a loop the moment its `]` is seen.

use tracing::{debug, trace};

use crate::bytecode::chunk::Program;
use crate::bytecode::instruction::OpCode;
use crate::error::CompileError;
use crate::span::Span;

/// Result type for compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// Default bound on simultaneously open loops.
pub const DEFAULT_MAX_LOOP_DEPTH: usize = 1024;

/// The bytecode compiler.
#[derive(Debug, Clone, Copy)]
pub struct Compiler {
    /// Maximum number of loops that may be open at once
    max_loop_depth: usize,
}

/// A loop whose `]` has not been seen yet.
#[derive(Debug, Clone, Copy)]
struct OpenLoop {
    /// Offset of the LOOP_START tag byte
    offset: usize,
    /// Where the `[` appears in the source
    span: Span,
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            max_loop_depth: DEFAULT_MAX_LOOP_DEPTH,
        }
    }

    pub fn with_max_loop_depth(mut self, max_loop_depth: usize) -> Self {
        self.max_loop_depth = max_loop_depth;
        self
    }

    pub fn max_loop_depth(&self) -> usize {
        self.max_loop_depth
    }

    /// Compile source text into a program.
    pub fn compile(&self, source: &str) -> CompileResult<Program> {
        let code_size = calculate_code_size(source);
        let mut program = Program::with_capacity(code_size)?;
        self.build_instructions(&mut program, source)?;

        if program.len() != code_size {
            return Err(CompileError::InternalConsistency {
                expected: code_size,
                actual: program.len(),
            });
        }

        trace!(
            source_len = source.len(),
            code_size,
            "compiled program"
        );
        Ok(program)
    }

    fn build_instructions(&self, program: &mut Program, source: &str) -> CompileResult<()> {
        let mut open: Vec<OpenLoop> = Vec::with_capacity(self.max_loop_depth.min(64));
        let mut line = 1;
        let mut column = 1;

        for (index, byte) in source.bytes().enumerate() {
            let span = Span::single(index, line, column);
            if byte == b'\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }

            let Some(op) = OpCode::from_u8(byte) else {
                continue;
            };

            match op {
                OpCode::LoopStart => {
                    if open.len() >= self.max_loop_depth {
                        debug!(limit = self.max_loop_depth, %span, "loop nesting limit exceeded");
                        return Err(CompileError::nesting_limit_exceeded(
                            self.max_loop_depth,
                            span,
                        ));
                    }
                    let offset = program.write_op(op);
                    // Patched when the matching `]` arrives.
                    program.write_word(0);
                    open.push(OpenLoop { offset, span });
                }
                OpCode::LoopEnd => {
                    let Some(start) = open.pop() else {
                        debug!(%span, "unmatched ']'");
                        return Err(CompileError::UnmatchedLoopEnd(span));
                    };
                    let end = program.write_op(op);
                    program.write_word(start.offset);
                    program.patch_jump(start.offset, end);
                }
                _ => {
                    program.write_op(op);
                }
            }
        }

        if let Some(unclosed) = open.pop() {
            debug!(span = %unclosed.span, "unmatched '['");
            return Err(CompileError::UnmatchedLoopStart(unclosed.span));
        }

        Ok(())
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Exact number of bytes the compiled form of `source` occupies.
pub fn calculate_code_size(source: &str) -> usize {
    source.bytes().map(OpCode::source_size).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::instruction::{Instruction, WORD_SIZE};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn compile_source(source: &str) -> CompileResult<Program> {
        Compiler::new().compile(source)
    }

    /// Every loop instruction must point at its partner, and the partner back.
    fn assert_jumps_resolved(program: &Program) {
        for (offset, instruction) in program.instructions() {
            match instruction {
                Instruction::LoopStart { end } => {
                    assert_eq!(program.decode_at(end), Some(Instruction::LoopEnd { start: offset }));
                }
                Instruction::LoopEnd { start } => {
                    assert_eq!(
                        program.decode_at(start),
                        Some(Instruction::LoopStart { end: offset })
                    );
                }
                _ => {}
            }
        }
    }

    #[test]
    fn test_compile_empty() {
        let program = compile_source("").unwrap();
        assert!(program.is_empty());
    }

    #[test]
    fn test_comments_take_no_space() {
        let program = compile_source("hello + world -\n").unwrap();
        assert_eq!(program.as_bytes(), b"+-");
    }

    #[test]
    fn test_code_size_matches_source() {
        let source = "+[->+<]>.";
        let expected = 7 + 2 * OpCode::LoopStart.encoded_size();
        assert_eq!(calculate_code_size(source), expected);
        assert_eq!(compile_source(source).unwrap().len(), expected);
    }

    #[test]
    fn test_simple_loop_is_patched_both_ways() {
        let program = compile_source("[-]").unwrap();
        let end = 1 + WORD_SIZE + 1;
        assert_eq!(program.jump_target_at(0), Some(end));
        assert_eq!(program.jump_target_at(end), Some(0));
    }

    #[test]
    fn test_nested_loops_match_innermost_first() {
        let program = compile_source("[[]][]").unwrap();
        let loop_size = OpCode::LoopStart.encoded_size();
        let inner_start = loop_size;
        let inner_end = 2 * loop_size;
        let outer_end = 3 * loop_size;
        let second_start = 4 * loop_size;
        let second_end = 5 * loop_size;

        assert_eq!(program.jump_target_at(0), Some(outer_end));
        assert_eq!(program.jump_target_at(inner_start), Some(inner_end));
        assert_eq!(program.jump_target_at(inner_end), Some(inner_start));
        assert_eq!(program.jump_target_at(outer_end), Some(0));
        assert_eq!(program.jump_target_at(second_start), Some(second_end));
        assert_jumps_resolved(&program);
    }

    #[test]
    fn test_unmatched_loop_end() {
        let err = compile_source("]").unwrap_err();
        assert!(err.is_syntax_error());
        assert!(matches!(err, CompileError::UnmatchedLoopEnd(span) if span.start == 0));
    }

    #[test]
    fn test_unmatched_loop_end_stops_scanning() {
        // The later `[` would be an error too; the first `]` is reported.
        let err = compile_source("+\n+]  [").unwrap_err();
        match err {
            CompileError::UnmatchedLoopEnd(span) => {
                assert_eq!(span.start, 3);
                assert_eq!(span.line, 2);
                assert_eq!(span.column, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unmatched_loop_start() {
        let err = compile_source("[").unwrap_err();
        assert!(err.is_syntax_error());
        assert!(matches!(err, CompileError::UnmatchedLoopStart(span) if span.start == 0));
    }

    #[test]
    fn test_unmatched_loop_start_reports_innermost() {
        let err = compile_source("[[]  [").unwrap_err();
        assert!(matches!(err, CompileError::UnmatchedLoopStart(span) if span.start == 5));
    }

    #[test]
    fn test_nesting_limit_exceeded() {
        let compiler = Compiler::new().with_max_loop_depth(3);
        assert!(compiler.compile("[[[]]]").is_ok());

        let err = compiler.compile("[[[[]]]]").unwrap_err();
        match err {
            CompileError::NestingLimitExceeded { limit, span } => {
                assert_eq!(limit, 3);
                assert_eq!(span.start, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_default_nesting_limit() {
        let ok = format!(
            "{}{}",
            "[".repeat(DEFAULT_MAX_LOOP_DEPTH),
            "]".repeat(DEFAULT_MAX_LOOP_DEPTH)
        );
        assert!(compile_source(&ok).is_ok());

        let too_deep = format!(
            "{}{}",
            "[".repeat(DEFAULT_MAX_LOOP_DEPTH + 1),
            "]".repeat(DEFAULT_MAX_LOOP_DEPTH + 1)
        );
        assert!(matches!(
            compile_source(&too_deep),
            Err(CompileError::NestingLimitExceeded { limit: DEFAULT_MAX_LOOP_DEPTH, .. })
        ));
    }

    #[test]
    fn test_sequential_loops_do_not_count_towards_depth() {
        let compiler = Compiler::new().with_max_loop_depth(1);
        assert!(compiler.compile(&"[]".repeat(5000)).is_ok());
    }

    /// Balanced source built from nested groups of simple instructions.
    fn balanced_source() -> impl Strategy<Value = String> {
        let leaf = prop::collection::vec(
            prop::sample::select(vec!['+', '-', '>', '<', '.', ',', 'x', ' ', '\n']),
            0..6,
        )
        .prop_map(|chars| chars.into_iter().collect::<String>());

        leaf.prop_recursive(6, 64, 4, |inner| {
            prop::collection::vec(
                (inner, any::<bool>()).prop_map(|(body, wrap)| {
                    if wrap {
                        format!("[{body}]")
                    } else {
                        body
                    }
                }),
                1..4,
            )
            .prop_map(|parts| parts.concat())
        })
    }

    proptest! {
        #[test]
        fn prop_balanced_programs_resolve_both_ways(source in balanced_source()) {
            let program = compile_source(&source).unwrap();
            prop_assert_eq!(program.len(), calculate_code_size(&source));
            assert_jumps_resolved(&program);
        }

        #[test]
        fn prop_extra_closing_bracket_is_rejected(source in balanced_source()) {
            let unbalanced = format!("{source}]");
            let err = compile_source(&unbalanced).unwrap_err();
            prop_assert!(matches!(err, CompileError::UnmatchedLoopEnd(_)));
        }

        #[test]
        fn prop_extra_opening_bracket_is_rejected(source in balanced_source()) {
            let unbalanced = format!("[{source}");
            let err = compile_source(&unbalanced).unwrap_err();
            prop_assert!(matches!(err, CompileError::UnmatchedLoopStart(span) if span.start == 0));
        }
    }
}
