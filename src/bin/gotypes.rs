//! `gotypes <DIR>`: parses a Go tree, resolves references and prints the type model.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use gotypes::model::{ArraySize, ChanDir, Field, TypeShape};
use gotypes::walk::references;
use gotypes::{CompilationUnit, ParseDirectoryOptions, parse_directory, resolve_references};
use tracing_subscriber::EnvFilter;

/// Extract the type declarations of a Go source tree
#[derive(Parser)]
#[command(name = "gotypes")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory to scan recursively
    dir: PathBuf,

    /// Record the enclosing go.mod module on every file
    #[arg(long)]
    resolve_module: bool,

    /// Include `_test.go` files
    #[arg(long)]
    include_tests: bool,

    /// Only list references that could not be resolved
    #[arg(long)]
    unresolved: bool,

    /// Only print exported declarations
    #[arg(long)]
    public: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let units = parse_directory(ParseDirectoryOptions {
        base_dir: cli.dir.clone(),
        resolve_module: cli.resolve_module,
        include_test_files: cli.include_tests,
    })
    .with_context(|| format!("failed to parse {}", cli.dir.display()))?;

    let stats = resolve_references(&units);

    let mut out = String::new();
    if cli.unresolved {
        write_unresolved(&mut out, &units);
    } else {
        for unit in &units {
            write_unit(&mut out, unit, &units, cli.public);
        }
        let _ = writeln!(
            out,
            "{} files, {} references, {} unresolved",
            units.len(),
            stats.references,
            stats.unresolved()
        );
    }
    print!("{out}");

    Ok(())
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("gotypes=debug"),
        _ => EnvFilter::new("gotypes=trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn write_unresolved(out: &mut String, units: &[CompilationUnit]) {
    for unit in units {
        for decl in &unit.declarations {
            for reference in references(decl).into_iter().filter(|r| !r.is_resolved()) {
                let _ = writeln!(out, "{}: {} -> {}", unit.filename, decl.name, reference.name);
            }
        }
    }
}

fn write_unit(out: &mut String, unit: &CompilationUnit, units: &[CompilationUnit], public: bool) {
    let _ = writeln!(
        out,
        "{} (module {:?}, package {})",
        unit.filename,
        unit.module.full_name(),
        unit.package
    );

    for decl in unit
        .declarations
        .iter()
        .filter(|d| !public || d.is_public())
    {
        let _ = write!(out, "  type {} ", decl.name);
        write_shape(out, &decl.ty, units);
        out.push('\n');
        for (key, tag) in decl.tags.iter() {
            let _ = writeln!(out, "    @{key}: {:?}", tag.as_str());
        }
    }
}

fn write_shape(out: &mut String, ty: &TypeShape, units: &[CompilationUnit]) {
    match ty {
        TypeShape::Native(n) => out.push_str(&n.name),
        TypeShape::NonNative(n) => {
            out.push_str(&n.name);
            if let Some(target) = n.target() {
                let _ = write!(out, " -> {}.", units[target.unit].module.full_name());
                if let Some(decl) = target.get(units) {
                    out.push_str(&decl.name);
                }
            }
        }
        TypeShape::Struct(s) => {
            out.push_str("struct {");
            write_fields(out, &s.fields, "; ", units);
            out.push_str(" }");
        }
        TypeShape::Interface(i) => {
            out.push_str("interface {");
            write_fields(out, &i.methods, "; ", units);
            if i.incomplete {
                out.push_str(" ...");
            }
            out.push_str(" }");
        }
        TypeShape::Map(m) => {
            out.push_str("map[");
            write_shape(out, &m.key, units);
            out.push(']');
            write_shape(out, &m.value, units);
        }
        TypeShape::Array(a) => {
            match &a.size {
                ArraySize::Slice => out.push_str("[]"),
                size => {
                    let _ = write!(out, "[{size}]");
                }
            }
            write_shape(out, &a.elem, units);
        }
        TypeShape::Pointer(p) => {
            out.push('*');
            write_shape(out, &p.to, units);
        }
        TypeShape::Channel(c) => {
            out.push_str(match c.dir {
                ChanDir::Both => "chan ",
                ChanDir::Send => "chan<- ",
                ChanDir::Recv => "<-chan ",
            });
            write_shape(out, &c.elem, units);
        }
        TypeShape::Function(f) => {
            out.push_str("func");
            if !f.type_params.is_empty() {
                out.push('[');
                write_fields(out, &f.type_params, ",", units);
                out.push_str(" ]");
            }
            out.push('(');
            write_fields(out, &f.params, ",", units);
            out.push_str(" )");
            if !f.results.is_empty() {
                out.push_str(" (");
                write_fields(out, &f.results, ",", units);
                out.push_str(" )");
            }
        }
    }
}

fn write_fields(out: &mut String, fields: &[Field], sep: &str, units: &[CompilationUnit]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push_str(sep.trim_end());
        }
        out.push(' ');
        if !field.names.is_empty() {
            let _ = write!(out, "{} ", field.names.join(", "));
        }
        write_shape(out, &field.ty, units);
        for (key, tag) in field.tags.iter() {
            let _ = write!(out, " @{key}:{:?}", tag.as_str());
        }
    }
}
