//! Benchmarks for compilation and execution of tape programs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tapevm::bytecode::{Compiler, Interpreter, InterpreterParams};

const HELLO_WORLD: &str = "+[-[<<[+[--->]-[<<<]]]>>>-]>-.---.>..>.<<<<-.<+.>>>>>.>.<<.<-.";

/// Nested countdown: roughly `n * 255` inner iterations.
fn nested_countdown(n: u8) -> String {
    format!("{}[>-[-]<-]", "+".repeat(n as usize))
}

/// Run a program to completion, discarding output.
fn run_silent(source: &str) {
    let mut tape = [0u8; 256];
    let params = InterpreterParams::new(&mut tape)
        .with_output(|b: u8| {
            black_box(b);
        })
        .with_input(|| 0u8);
    let mut vm = Interpreter::new(source, params).expect("compile error");
    vm.run().expect("runtime error");
}

fn compile_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    let compiler = Compiler::new();

    group.bench_function("hello_world", |b| {
        b.iter(|| compiler.compile(black_box(HELLO_WORLD)).expect("compile error"))
    });

    let large = HELLO_WORLD.repeat(1000);
    group.bench_function("hello_world_x1000", |b| {
        b.iter(|| compiler.compile(black_box(&large)).expect("compile error"))
    });

    group.finish();
}

fn run_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("run");

    group.bench_function("hello_world", |b| b.iter(|| run_silent(black_box(HELLO_WORLD))));

    for n in [8u8, 64, 255] {
        let source = nested_countdown(n);
        group.bench_with_input(BenchmarkId::new("nested_countdown", n), &source, |b, s| {
            b.iter(|| run_silent(black_box(s)))
        });
    }

    group.finish();
}

fn step_benchmark(c: &mut Criterion) {
    let program = Compiler::new()
        .compile(&nested_countdown(255))
        .expect("compile error");

    c.bench_function("step_budget_10k", |b| {
        b.iter(|| {
            let mut tape = [0u8; 4];
            let params = InterpreterParams::new(&mut tape).with_output(|_: u8| {});
            let mut vm = Interpreter::from_program(program.clone(), params);
            black_box(vm.run_for(10_000).expect("runtime error"))
        })
    });
}

criterion_group!(benches, compile_benchmark, run_benchmark, step_benchmark);
criterion_main!(benches);
