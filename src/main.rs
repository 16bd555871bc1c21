//! tapevm CLI: compile and run tape-language programs.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::process;

use colored::Colorize;
use tracing_subscriber::EnvFilter;

use tapevm::bytecode::{
    print_disassembly, Compiler, Interpreter, InterpreterParams, Step, DEFAULT_MAX_LOOP_DEPTH,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tape length used when `--tape-size` is not given.
const DEFAULT_TAPE_SIZE: usize = 30_000;

/// Where the program text comes from.
enum Source {
    File(String),
    Inline(String),
}

/// CLI options parsed from arguments.
struct Options {
    source: Source,
    tape_size: usize,
    max_steps: Option<u64>,
    max_depth: usize,
    disassemble: bool,
}

fn print_usage() {
    eprintln!("tapevm {} - tape language virtual machine", VERSION);
    eprintln!();
    eprintln!("Usage: tapevm [options] <file>");
    eprintln!("       tapevm [options] -e <code>");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -e <code>         Run code given on the command line");
    eprintln!(
        "  --tape-size N     Tape length in cells (default: {})",
        DEFAULT_TAPE_SIZE
    );
    eprintln!("  --max-steps N     Stop after N instructions (exit code 3 if unfinished)");
    eprintln!(
        "  --max-depth N     Maximum loop nesting depth (default: {})",
        DEFAULT_MAX_LOOP_DEPTH
    );
    eprintln!("  --disassemble     Print the compiled program instead of running it");
    eprintln!("  --help, -h        Show this help message");
    eprintln!();
    eprintln!("Diagnostics are controlled with RUST_LOG (e.g. RUST_LOG=tapevm=debug).");
}

fn usage_error(message: &str) -> ! {
    eprintln!("{} {}", "error:".red().bold(), message);
    print_usage();
    process::exit(64);
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: Option<&String>) -> T {
    let Some(value) = value else {
        usage_error(&format!("{} requires a value", flag));
    };
    value
        .parse()
        .unwrap_or_else(|_| usage_error(&format!("invalid value for {}: {}", flag, value)))
}

fn parse_args() -> Options {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut source = None;
    let mut options = Options {
        source: Source::Inline(String::new()),
        tape_size: DEFAULT_TAPE_SIZE,
        max_steps: None,
        max_depth: DEFAULT_MAX_LOOP_DEPTH,
        disassemble: false,
    };

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        // Accept both `--flag value` and `--flag=value`.
        let (flag, inline_value) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag, Some(value.to_string())),
            _ => (arg, None),
        };
        let take_value = |i: &mut usize| -> Option<String> {
            if inline_value.is_some() {
                return inline_value.clone();
            }
            *i += 1;
            args.get(*i).cloned()
        };

        match flag {
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            "-e" => {
                let code = take_value(&mut i).unwrap_or_else(|| usage_error("-e requires code"));
                source = Some(Source::Inline(code));
            }
            "--tape-size" => {
                options.tape_size = parse_number(flag, take_value(&mut i).as_ref());
            }
            "--max-steps" => {
                options.max_steps = Some(parse_number(flag, take_value(&mut i).as_ref()));
            }
            "--max-depth" => {
                options.max_depth = parse_number(flag, take_value(&mut i).as_ref());
            }
            "--disassemble" => options.disassemble = true,
            other if other.starts_with('-') => {
                usage_error(&format!("unknown option: {}", other));
            }
            path => {
                if source.is_some() {
                    usage_error(&format!("unexpected argument: {}", path));
                }
                source = Some(Source::File(path.to_string()));
            }
        }
        i += 1;
    }

    match source {
        Some(source) => options.source = source,
        None => usage_error("no program given"),
    }
    options
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let options = parse_args();

    let source = match &options.source {
        Source::Inline(code) => code.clone(),
        Source::File(path) => match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("{} cannot read '{}': {}", "error:".red().bold(), path, e);
                process::exit(66);
            }
        },
    };

    let program = match Compiler::new()
        .with_max_loop_depth(options.max_depth)
        .compile(&source)
    {
        Ok(program) => program,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            process::exit(65);
        }
    };

    if options.disassemble {
        print_disassembly(&program);
        return;
    }

    let mut tape = vec![0u8; options.tape_size];
    let mut interpreter = Interpreter::from_program(program, InterpreterParams::new(&mut tape));

    let result = match options.max_steps {
        Some(limit) => interpreter.run_for(limit),
        None => interpreter.run().map(|()| Step::Halted),
    };
    if let Err(e) = io::stdout().flush() {
        eprintln!("{} cannot flush output: {}", "error:".red().bold(), e);
        process::exit(70);
    }

    match result {
        Ok(Step::Halted) => {}
        Ok(Step::Continue) => {
            eprintln!(
                "{} step limit of {} reached before the program finished",
                "warning:".yellow().bold(),
                interpreter.steps()
            );
            process::exit(3);
        }
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            process::exit(70);
        }
    }
}
