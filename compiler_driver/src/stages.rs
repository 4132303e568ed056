// One function per CLI stage, each running the pipeline up to its point
// and reporting what it saw. The later stages repeat the earlier setup on
// purpose: every stage is a self-contained run over a fresh compilation.

use crate::{bodies, demo, dump, render};
use emitter::RecordingEmitter;
use shared_context::Bump;
use std::error::Error;
use symbol_graph::symbols::{BodyKind, Symbol};
use symbol_graph::{Compilation, instantiator};

pub fn bind_stage() -> Result<(), Box<dyn Error>> {
    let arena = Bump::new();
    let mut comp = Compilation::new(&arena, "demo.acl", demo::SOURCE);
    let (bindings, mut diagnostics) = demo::declare_program(&mut comp);

    comp.finish_body_deferment();

    let mut bound = 0usize;
    for binding in &bindings {
        diagnostics.collect(sema::bind::bind_function_body(
            &mut comp,
            binding.symbol,
            &binding.block,
        ));
        bound += 1;
    }

    render::print_diagnostics(&comp, &diagnostics);
    println!("bound {bound} function bodies");
    Ok(())
}

pub fn check_stage() -> Result<(), Box<dyn Error>> {
    let arena = Bump::new();
    let mut comp = Compilation::new(&arena, "demo.acl", demo::SOURCE);
    let (bindings, mut diagnostics) = demo::declare_program(&mut comp);

    comp.finish_body_deferment();
    diagnostics.collect(sema::validate::validate_trait_impls(&mut comp));

    let mut checked = 0usize;
    for binding in &bindings {
        let function = diagnostics.collect(sema::bind::bind_function_body(
            &mut comp,
            binding.symbol,
            &binding.block,
        ));
        let mut checker = sema::typecheck::TypeChecker::new(&mut comp);
        checker.typecheck_function(&function);
        diagnostics.merge(checker.into_diagnostics());
        checked += 1;
    }

    render::print_diagnostics(&comp, &diagnostics);
    println!("type checked {checked} function bodies");
    Ok(())
}

pub fn lower_stage() -> Result<(), Box<dyn Error>> {
    let arena = Bump::new();
    let mut comp = Compilation::new(&arena, "demo.acl", demo::SOURCE);
    let (bindings, mut declare_diagnostics) = demo::declare_program(&mut comp);

    let (program, diagnostics) =
        sema::analyze(&mut comp, bindings, &bodies::DriverGlueBodies).into_parts();
    declare_diagnostics.merge(diagnostics);
    render::print_diagnostics(&comp, &declare_diagnostics);

    for item in &program.items {
        dump::print_item(&comp, item);
        println!();
    }
    Ok(())
}

pub fn cfa_stage() -> Result<(), Box<dyn Error>> {
    let arena = Bump::new();
    let mut comp = Compilation::new(&arena, "demo.acl", demo::SOURCE);
    let (bindings, mut declare_diagnostics) = demo::declare_program(&mut comp);

    let (program, diagnostics) =
        sema::analyze(&mut comp, bindings, &bodies::DriverGlueBodies).into_parts();
    declare_diagnostics.merge(diagnostics);

    render::print_diagnostics(&comp, &declare_diagnostics);
    println!(
        "analyzed control flow of {} functions",
        program.functions.len()
    );
    Ok(())
}

pub fn emit_stage() -> Result<(), Box<dyn Error>> {
    let arena = Bump::new();
    let mut comp = Compilation::new(&arena, "demo.acl", demo::SOURCE);
    let (bindings, mut declare_diagnostics) = demo::declare_program(&mut comp);

    let (program, diagnostics) =
        sema::analyze(&mut comp, bindings, &bodies::DriverGlueBodies).into_parts();
    declare_diagnostics.merge(diagnostics);
    render::print_diagnostics(&comp, &declare_diagnostics);

    // Emission is gated on the accumulated diagnostics: analysis always
    // runs in full, code generation only on a clean bag.
    if declare_diagnostics.has_errors() {
        return Err("errors reported; skipping emission".into());
    }

    let mut emitter = RecordingEmitter::new();

    for (&symbol, function) in program.functions.iter() {
        if instantiator::is_placeholder_symbol(&comp.graph, symbol) {
            continue;
        }
        emitter.begin_function(symbol);
        sema::emit::emit_function(&comp, function, &mut emitter);
        println!("fn {}:", comp.symbol_signature(symbol));
        print!("{}", emitter.dump());
        println!();
    }

    for (&glue, body) in program.glue.bodies.iter() {
        emitter.begin_function(glue);
        body(&comp, &mut emitter);
        println!("glue {}:", comp.symbol_signature(glue));
        print!("{}", emitter.dump());
        println!();
    }

    // Natives referenced by the emitted code get their contracted bodies.
    let referenced: Vec<_> = emitter
        .function_map()
        .keys()
        .copied()
        .collect();
    for symbol in referenced {
        let Symbol::Function(data) = comp.graph.symbol(comp.graph.unaliased(symbol)) else {
            continue;
        };
        let BodyKind::Native(op) = data.body else {
            continue;
        };
        emitter.begin_function(symbol);
        bodies::emit_native_body(&comp, &mut emitter, symbol, op);
        println!("native {}:", comp.symbol_signature(symbol));
        print!("{}", emitter.dump());
        println!();
    }

    Ok(())
}
