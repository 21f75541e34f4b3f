use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use gotypes::model::Module;
use gotypes::{CompilationUnit, ParseTextOptions, parse_text, resolve_references};
use std::fmt::Write as _;
use std::hint::black_box as bb;

// =============================================================================
// Synthetic corpus
// =============================================================================

/// One package per file; every struct refers to its neighbour in the same file, to the
/// first struct of the previous package and to an external type.
fn package_source(pkg: usize, structs: usize) -> String {
    let mut src = String::new();
    let _ = writeln!(src, "package p{pkg}\n");
    let _ = writeln!(src, "import (\n    \"time\"");
    if pkg > 0 {
        let _ = writeln!(src, "    prev \"../p{}\"", pkg - 1);
    }
    let _ = writeln!(src, ")\n");

    for i in 0..structs {
        let _ = writeln!(src, "// T{i} is generated.\n// meta:\"id={i},hot\"");
        let _ = writeln!(src, "type T{i} struct {{");
        let _ = writeln!(src, "    ID    int64             `json:\"id\"`");
        let _ = writeln!(src, "    Name  string            `json:\"name,omitempty\"`");
        let _ = writeln!(src, "    At    time.Time");
        let _ = writeln!(src, "    Tags  map[string][]T{}", (i + 1) % structs);
        if pkg > 0 {
            let _ = writeln!(src, "    Prev  *prev.T0");
        }
        let _ = writeln!(src, "    Hook  func(ctx T{i}) (T{}, error)", (i + 1) % structs);
        let _ = writeln!(src, "}}\n");
    }

    let _ = writeln!(src, "func helper() int {{\n    return 1\n}}");
    src
}

fn corpus(packages: usize, structs: usize) -> Vec<(Module, String)> {
    (0..packages)
        .map(|pkg| {
            (
                Module::new("example.com/bench", format!("p{pkg}")),
                package_source(pkg, structs),
            )
        })
        .collect()
}

fn convert_all(corpus: &[(Module, String)]) -> Vec<CompilationUnit> {
    corpus
        .iter()
        .enumerate()
        .map(|(i, (module, content))| {
            parse_text(ParseTextOptions {
                content: content.clone(),
                filename: format!("p{i}.go"),
                module: module.clone(),
            })
            .unwrap()
        })
        .collect()
}

// =============================================================================
// Benchmark 1: front end + conversion
// =============================================================================

fn bench_convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert");

    for structs in [10usize, 100] {
        let src = package_source(1, structs);
        group.throughput(Throughput::Bytes(src.len() as u64));

        group.bench_with_input(BenchmarkId::new("parse_source", structs), &src, |b, src| {
            b.iter(|| bb(gosyntax::parse_source(bb(src)).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("parse_text", structs), &src, |b, src| {
            b.iter(|| {
                bb(parse_text(ParseTextOptions {
                    content: src.clone(),
                    filename: "p1.go".into(),
                    module: Module::new("example.com/bench", "p1"),
                })
                .unwrap())
            });
        });
    }

    group.finish();
}

// =============================================================================
// Benchmark 2: batch resolution
// Units are rebuilt per iteration: a resolved batch would turn the walk into a no-op.
// =============================================================================

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    for (packages, structs) in [(8usize, 10usize), (64, 20)] {
        let corpus = corpus(packages, structs);
        group.throughput(Throughput::Elements((packages * structs) as u64));

        group.bench_with_input(
            BenchmarkId::new("resolve_references", format!("{packages}x{structs}")),
            &corpus,
            |b, corpus| {
                b.iter_batched(
                    || convert_all(corpus),
                    |units| {
                        bb(resolve_references(&units));
                        units
                    },
                    BatchSize::LargeInput,
                );
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_convert, bench_resolve);
criterion_main!(benches);
