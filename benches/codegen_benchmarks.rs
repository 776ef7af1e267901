//! Performance benchmarks for program generation.
//!
//! Designs are built synthetically so each group stresses one stage:
//! - Netlists: chains of gates and arithmetic devices (declaration drawing,
//!   nexus resolution)
//! - Behavior: many processes with loops and case statements (thread
//!   compilation)
//! - Fan-in: nets with many drivers and wide gates (resolver and functor
//!   trees)
//!
//! ## Profiling with Puffin
//!
//! Run with the `profile-with-puffin` feature to collect stage timings:
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- --profile-time 5
//! ```

#![allow(clippy::collapsible_if)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use vvpgen::graph::{
    BinaryOp, Bits4, CaseItem, CaseKind, CaseQuality, DataType, Design, DesignBuilder, Expr,
    LValue, LogicKind, LpmKind, NetKind, ProcessKind, ScopeKind, Stmt, StmtKind, ValueType,
};
use vvpgen::{CodegenOptions, generate};

#[cfg(feature = "profile-with-puffin")]
use rustc_hash::FxHashMap;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

#[cfg(feature = "profile-with-puffin")]
fn collect_scopes(
    stream: &puffin::Stream,
    scope: &puffin::Scope,
    scope_collection: &puffin::ScopeCollection,
    timings: &mut FxHashMap<String, i64>,
) {
    use puffin::Reader;

    if let Some(details) = scope_collection.fetch_by_id(&scope.id) {
        *timings.entry(details.name().to_string()).or_insert(0) += scope.record.duration_ns;
    }
    if scope.child_begin_position < scope.child_end_position {
        if let Ok(reader) = Reader::with_offset(stream, scope.child_begin_position) {
            if let Ok(children) = reader.read_top_scopes() {
                for child in children {
                    collect_scopes(stream, &child, scope_collection, timings);
                }
            }
        }
    }
}

/// Print the time spent in each profiled scope, averaged over frames.
#[cfg(feature = "profile-with-puffin")]
fn print_profiling_stats() {
    use puffin::Reader;

    let Some(frame_view) = FRAME_VIEW.get() else {
        println!("Profiler not initialized");
        return;
    };
    let view = frame_view.lock();
    let scope_collection = view.scope_collection();

    let mut timings: FxHashMap<String, i64> = FxHashMap::default();
    let mut frames = 0i64;
    for frame in view.recent_frames() {
        frames += 1;
        let Ok(unpacked) = frame.unpacked() else {
            continue;
        };
        for (_thread, stream_info) in unpacked.thread_streams.iter() {
            let reader = Reader::from_start(&stream_info.stream);
            if let Ok(scopes) = reader.read_top_scopes() {
                for scope in scopes {
                    collect_scopes(&stream_info.stream, &scope, scope_collection, &mut timings);
                }
            }
        }
    }

    println!("\n=== Generation profile ({frames} frames) ===");
    let mut entries: Vec<_> = timings.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    for (name, ns) in entries {
        let avg = if frames > 0 { ns / frames } else { ns };
        println!(
            "  {:40} {:>10.2?}",
            name,
            std::time::Duration::from_nanos(avg as u64)
        );
    }
}

#[cfg(not(feature = "profile-with-puffin"))]
fn print_profiling_stats() {}

// =============================================================================
// Synthetic designs
// =============================================================================

/// A chain of `n` stages, each an 8-bit adder feeding an inverter.
fn netlist(n: usize) -> Design {
    let mut b = DesignBuilder::new();
    b.add_file("chain.v");
    let top = b.add_scope("chain", ScopeKind::Module, None);
    let seed = b.add_signal(top, "seed", NetKind::Reg, DataType::Logic, 8);
    let mut prev = b.design().signal(seed).nexus[0];
    for i in 0..n {
        let sum = b.add_signal(top, format!("s{i}"), NetKind::Tri, DataType::Logic, 8);
        let sum_n = b.design().signal(sum).nexus[0];
        b.add_lpm(top, format!("add{i}"), LpmKind::Add, 8, sum_n, &[prev, prev]);
        let inv = b.add_signal(top, format!("n{i}"), NetKind::Tri, DataType::Logic, 8);
        let inv_n = b.design().signal(inv).nexus[0];
        b.add_logic(top, format!("inv{i}"), LogicKind::Not, 8, inv_n, &[sum_n]);
        prev = inv_n;
    }
    b.finish()
}

/// `n` initial processes, each summing in a loop and dispatching on a case.
fn behavior(n: usize) -> Design {
    let mut b = DesignBuilder::new();
    b.add_file("procs.v");
    let top = b.add_scope("procs", ScopeKind::Module, None);
    for p in 0..n {
        let i = b.add_signal(top, format!("i{p}"), NetKind::Reg, DataType::Logic, 16);
        let s = b.add_signal(top, format!("s{p}"), NetKind::Reg, DataType::Logic, 16);
        let read = |sig| Expr::signal(sig, ValueType::Logic, 16, false);
        let set = |sig, e| Stmt::assign(LValue::whole(sig, 16), e);

        let looped = Stmt::new(StmtKind::While {
            cond: Expr::binary(BinaryOp::Lt, read(i), Expr::uint(64, 16), 1),
            body: Box::new(Stmt::block(vec![
                set(s, Expr::binary(BinaryOp::Add, read(s), read(i), 16)),
                set(i, Expr::binary(BinaryOp::Add, read(i), Expr::uint(1, 16), 16)),
            ])),
        });
        let items = (0..8)
            .map(|k| CaseItem {
                guards: vec![Expr::uint(k, 16)],
                body: Some(set(i, Expr::uint(k * 3, 16))),
            })
            .collect();
        let dispatch = Stmt::new(StmtKind::Case {
            kind: CaseKind::Exact,
            quality: CaseQuality::None,
            selector: read(s),
            items,
        });
        b.add_process(
            ProcessKind::Initial,
            top,
            Stmt::block(vec![
                set(i, Expr::uint(0, 16)),
                set(s, Expr::uint(0, 16)),
                looped,
                dispatch,
            ]),
        );
    }
    b.finish()
}

/// `n` nets, each with twelve constant drivers and read by a 12-input gate.
fn fan_in(n: usize) -> Design {
    let mut b = DesignBuilder::new();
    b.add_file("fanin.v");
    let top = b.add_scope("fanin", ScopeKind::Module, None);
    for i in 0..n {
        let w = b.add_signal(top, format!("w{i}"), NetKind::Tri, DataType::Logic, 1);
        let wn = b.design().signal(w).nexus[0];
        for k in 0..12 {
            b.add_const(top, wn, Bits4::from_u64(k % 2, 1));
        }
        let y = b.add_signal(top, format!("y{i}"), NetKind::Tri, DataType::Logic, 1);
        let yn = b.design().signal(y).nexus[0];
        b.add_logic(top, format!("g{i}"), LogicKind::Xor, 1, yn, &[wn; 12]);
    }
    b.finish()
}

// =============================================================================
// Benchmarks
// =============================================================================

fn run_group(c: &mut Criterion, group_name: &str, build: fn(usize) -> Design) {
    let options = CodegenOptions::default();
    let mut group = c.benchmark_group(group_name);
    for size in [10usize, 100, 1000] {
        let design = build(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &design, |b, design| {
            b.iter(|| {
                let output = generate(black_box(design), &options).unwrap();
                end_profiling_frame();
                black_box(output.program.len())
            });
        });
    }
    group.finish();
}

fn netlist_benchmarks(c: &mut Criterion) {
    setup_profiler();
    run_group(c, "codegen/netlist", netlist);
}

fn behavior_benchmarks(c: &mut Criterion) {
    run_group(c, "codegen/behavior", behavior);
}

fn fan_in_benchmarks(c: &mut Criterion) {
    run_group(c, "codegen/fan_in", fan_in);
    print_profiling_stats();
}

criterion_group!(
    benches,
    netlist_benchmarks,
    behavior_benchmarks,
    fan_in_benchmarks
);
criterion_main!(benches);
