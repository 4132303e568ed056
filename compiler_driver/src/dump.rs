// Debug printing for sema trees, used by the --lower stage.

use sema::nodes::{ExprSema, FunctionSema, ItemSema, StmtSema};
use std::rc::Rc;
use symbol_graph::Compilation;
use symbol_graph::symbols::Symbol;

pub fn print_item(comp: &Compilation<'_>, item: &ItemSema) {
    match item {
        ItemSema::Function(function) => print_function(comp, function),
        ItemSema::Impl(impl_sema) => {
            let target = match comp.graph.symbol(impl_sema.symbol) {
                Symbol::InherentImpl(data) => data.target_type,
                Symbol::TraitImpl(data) => data.target_type,
                _ => impl_sema.symbol,
            };
            println!("impl {} {{", comp.symbol_signature(target));
            for function in &impl_sema.functions {
                print_function(comp, function);
            }
            println!("}}");
        }
        ItemSema::Module(module) => {
            let name = comp.name_text(comp.graph.symbol(module.symbol).get_name());
            println!("mod {name} {{");
            for child in &module.items {
                print_item(comp, child);
            }
            println!("}}");
        }
    }
}

pub fn print_function(comp: &Compilation<'_>, function: &FunctionSema) {
    println!("fn {} {{", comp.symbol_signature(function.symbol));
    print_stmt(comp, &function.body, 1);
    println!("}}");
}

fn print_stmt(comp: &Compilation<'_>, stmt: &Rc<StmtSema>, indent: usize) {
    let pad = "    ".repeat(indent);
    match stmt.as_ref() {
        StmtSema::Block(s) => {
            println!("{pad}{{");
            for child in &s.stmts {
                print_stmt(comp, child, indent + 1);
            }
            println!("{pad}}}");
        }
        StmtSema::Group(s) => {
            for child in &s.stmts {
                print_stmt(comp, child, indent);
            }
        }
        StmtSema::Var(s) => {
            let name = comp.name_text(comp.graph.symbol(s.symbol).get_name());
            match &s.init {
                Some(init) => println!("{pad}let {name} = {};", expr_text(comp, init)),
                None => println!("{pad}let {name};"),
            }
        }
        StmtSema::NormalAssignment(s) => {
            println!(
                "{pad}{} = {};",
                expr_text(comp, &s.lhs),
                expr_text(comp, &s.rhs)
            );
        }
        StmtSema::CompoundAssignment(s) => {
            println!(
                "{pad}{} op= {};",
                expr_text(comp, &s.lhs),
                expr_text(comp, &s.rhs)
            );
        }
        StmtSema::If(s) => {
            for branch in &s.branches {
                println!("{pad}if {} :", expr_text(comp, &branch.condition));
                print_stmt(comp, &branch.body, indent + 1);
            }
            if let Some(else_body) = &s.else_body {
                println!("{pad}else:");
                print_stmt(comp, else_body, indent + 1);
            }
        }
        StmtSema::While(s) => {
            println!("{pad}while {} :", expr_text(comp, &s.condition));
            print_stmt(comp, &s.body, indent + 1);
        }
        StmtSema::Jump(s) => println!("{pad}jump L{};", s.label.0),
        StmtSema::ConditionalJump(s) => {
            println!(
                "{pad}jump_if {} L{};",
                expr_text(comp, &s.condition),
                s.label.0
            );
        }
        StmtSema::Label(s) => println!("{pad}L{}:", s.label.0),
        StmtSema::Return(s) => match &s.value {
            Some(value) => println!("{pad}return {};", expr_text(comp, value)),
            None => println!("{pad}return;"),
        },
        StmtSema::Expr(s) => println!("{pad}{};", expr_text(comp, &s.expr)),
    }
}

fn expr_text(comp: &Compilation<'_>, expr: &Rc<ExprSema>) -> String {
    match expr.as_ref() {
        ExprSema::Literal(e) => e.text.clone(),
        ExprSema::StaticVarRef(e) => comp
            .name_text(comp.graph.symbol(comp.graph.unaliased(e.var)).get_name())
            .to_string(),
        ExprSema::InstanceVarRef(e) => format!(
            "{}.{}",
            expr_text(comp, &e.base),
            comp.name_text(comp.graph.symbol(e.field).get_name())
        ),
        ExprSema::StaticCall(e) => format!(
            "{}({})",
            comp.symbol_signature(e.function),
            args_text(comp, &e.args)
        ),
        ExprSema::InstanceCall(e) => format!(
            "{}.{}({})",
            expr_text(comp, &e.base),
            comp.name_text(comp.graph.symbol(comp.graph.unaliased(e.function)).get_name()),
            args_text(comp, &e.args)
        ),
        ExprSema::UserUnary(e) => format!(
            "{}({})",
            comp.symbol_signature(e.op_symbol),
            expr_text(comp, &e.operand)
        ),
        ExprSema::UserBinary(e) => format!(
            "{}({}, {})",
            comp.symbol_signature(e.op_symbol),
            expr_text(comp, &e.lhs),
            expr_text(comp, &e.rhs)
        ),
        ExprSema::And(e) => format!(
            "({} and {})",
            expr_text(comp, &e.lhs),
            expr_text(comp, &e.rhs)
        ),
        ExprSema::Or(e) => format!(
            "({} or {})",
            expr_text(comp, &e.lhs),
            expr_text(comp, &e.rhs)
        ),
        ExprSema::Not(e) => format!("(not {})", expr_text(comp, &e.operand)),
        ExprSema::AddrOf(e) => format!("&{}", expr_text(comp, &e.operand)),
        ExprSema::Deref(e) => format!("*{}", expr_text(comp, &e.operand)),
        ExprSema::DerefAs(e) => format!(
            "deref_as[{}]({})",
            comp.symbol_signature(e.target_type),
            expr_text(comp, &e.operand)
        ),
        ExprSema::Ref(e) => format!("ref {}", expr_text(comp, &e.operand)),
        ExprSema::Box_(e) => format!("box {}", expr_text(comp, &e.operand)),
        ExprSema::Unbox(e) => format!("unbox {}", expr_text(comp, &e.operand)),
        ExprSema::StructConstruction(e) => {
            let fields: Vec<String> = e
                .args
                .iter()
                .map(|arg| {
                    format!(
                        "{}: {}",
                        comp.name_text(comp.graph.symbol(arg.field).get_name()),
                        expr_text(comp, &arg.value)
                    )
                })
                .collect();
            format!(
                "{} {{ {} }}",
                comp.symbol_signature(e.struct_type),
                fields.join(", ")
            )
        }
        ExprSema::SizeOf(e) => format!("size_of[{}]", comp.symbol_signature(e.target_type)),
        ExprSema::ConversionPlaceholder(_) => "<error>".to_string(),
        ExprSema::Expr(e) => format!("({})", expr_text(comp, &e.inner)),
    }
}

fn args_text(comp: &Compilation<'_>, args: &[Rc<ExprSema>]) -> String {
    args.iter()
        .map(|arg| expr_text(comp, arg))
        .collect::<Vec<String>>()
        .join(", ")
}
