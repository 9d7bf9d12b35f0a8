//! A thin driver over the `solidscript` library: read a script file, run
//! `compile()`, print diagnostics, and optionally render the CSG chain to
//! an ASCII STL file using the bundled reference tessellator/backend.

mod demo_backend;
mod lexer;
mod parser;

use std::env;
use std::fs::{self, File};
use std::io::BufWriter;
use std::process::ExitCode;
use std::time::Instant;

use solidscript::chain::ChainOp;
use solidscript::{compile, render_polyhedron, stl, CompileOptions, Mesh, NeverCancel, NullProgress, PolyhedronBackend, PolyhedronCache, RenderResult, TessellationMode};

use demo_backend::{DemoBackend, DemoPolyhedron, DemoTessellator};
use parser::DemoParser;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let Some(file_path) = args.get(1) else {
        eprintln!("usage: solidscript <script-file> [output.stl]");
        return ExitCode::FAILURE;
    };
    let stl_path = args.get(2);

    let code = match fs::read_to_string(file_path) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error reading {file_path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();
    let compilation = match compile(&code, &DemoParser, &mut NeverCancel) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("compile failed: {err}");
            return ExitCode::FAILURE;
        }
    };
    for d in &compilation.diagnostics {
        eprintln!("{d}");
    }
    let elapsed = start.elapsed();
    eprintln!("compiled in {elapsed:?}");

    let Some(root) = compilation.root_node else {
        eprintln!("no root node produced");
        return ExitCode::FAILURE;
    };

    let tessellator = DemoTessellator;
    let backend = DemoBackend;
    let mut cache: PolyhedronCache<DemoPolyhedron> = PolyhedronCache::default();
    let options = CompileOptions::default();
    let mut progress = NullProgress;

    let render = render_polyhedron(
        &root,
        &tessellator,
        TessellationMode::Preview,
        &backend,
        &mut cache,
        &options,
        &mut NeverCancel,
        &mut progress,
    );
    for d in &render.diagnostics {
        eprintln!("{d}");
    }
    if render.backend_failed {
        eprintln!("warning: backend reported at least one invalid result");
    }
    println!("chain length: {}", render.chain.len());
    for (label, op) in render.chain.labels.iter().zip(&render.chain.operators) {
        println!("  {op:?} {label}");
    }

    if let Some(stl_path) = stl_path {
        if let Err(err) = write_stl(&render, &backend, stl_path) {
            eprintln!("error writing STL: {err}");
            return ExitCode::FAILURE;
        }
        eprintln!("wrote {stl_path}");
    }

    ExitCode::SUCCESS
}

/// Folds the chain's polysets through the backend's boolean operations in
/// chain order, converts the result to a triangle mesh, and writes it as
/// ASCII STL.
fn write_stl(render: &RenderResult, backend: &DemoBackend, path: &str) -> std::io::Result<()> {
    let Some(mut acc) = render.chain.polysets.first().map(|p| backend.from_polyset(p)) else {
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        return stl::export_stl(&Mesh::default(), &mut out);
    };
    for (polyset, op) in render.chain.polysets.iter().zip(&render.chain.operators).skip(1) {
        let rhs = backend.from_polyset(polyset);
        acc = match op {
            ChainOp::Union => backend.union(&acc, &rhs),
            ChainOp::Intersection => backend.intersection(&acc, &rhs),
            ChainOp::Difference => backend.difference(&acc, &rhs),
        };
    }
    let mesh = backend.convert_to_mesh(&acc);
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    stl::export_stl(&mesh, &mut out)
}
