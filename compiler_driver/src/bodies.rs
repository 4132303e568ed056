// The external body emitters the core contracts out: glue bodies for
// copy/drop, and the bodies of the native functions. A real backend lowers
// these onto LLVM; here they drive the same emitter contract the sema
// emit pass uses, so the recorded IR shows the complete program.

use emitter::{Emitter, IrBinaryOp, IrConstant};
use sema::glue::{GlueBody, GlueBodyProvider};
use std::rc::Rc;
use symbol_graph::natives::NativeOp;
use symbol_graph::symbols::Symbol;
use symbol_graph::{Compilation, SymbolId};

pub struct DriverGlueBodies;

impl GlueBodyProvider for DriverGlueBodies {
    fn create_copy_glue_body(
        &self,
        _comp: &Compilation<'_>,
        ty: SymbolId,
        _glue: SymbolId,
    ) -> GlueBody {
        Rc::new(move |comp, em| emit_copy_glue(comp, em, ty))
    }

    fn create_drop_glue_body(
        &self,
        _comp: &Compilation<'_>,
        ty: SymbolId,
        _glue: SymbolId,
    ) -> GlueBody {
        Rc::new(move |comp, em| emit_drop_glue(comp, em, ty))
    }
}

/// copy(self: &T, other: &T): trivially copyable types move as one load
/// and store; everything else copies field by field through the fields'
/// own glue.
fn emit_copy_glue(comp: &Compilation<'_>, em: &mut dyn Emitter, ty: SymbolId) {
    let ir_ty = em.get_type(ty);
    let self_ptr = em.emit_load_arg(0, ir_ty);
    let other_ptr = em.emit_load_arg(1, ir_ty);

    if sema::glue::is_trivially_copyable(comp, ty) {
        let value = em.load(ir_ty, other_ptr);
        em.store(value, self_ptr);
    } else {
        for (index, field) in comp.struct_fields(ty).into_iter().enumerate() {
            let field_ty = comp
                .graph
                .symbol(field)
                .get_var_type()
                .expect("field has a type");
            let dst = em.struct_gep(ir_ty, self_ptr, index as u32);
            let src = em.struct_gep(ir_ty, other_ptr, index as u32);
            em.emit_copy(dst, src, field_ty);
        }
    }
    em.create_ret_void();
}

/// drop(self: &T): nothing for trivially droppable types, otherwise each
/// field's drop glue in declaration order.
fn emit_drop_glue(comp: &Compilation<'_>, em: &mut dyn Emitter, ty: SymbolId) {
    let ir_ty = em.get_type(ty);
    let self_ptr = em.emit_load_arg(0, ir_ty);

    for (index, field) in comp.struct_fields(ty).into_iter().enumerate() {
        let field_ty = comp
            .graph
            .symbol(field)
            .get_var_type()
            .expect("field has a type");
        let drop_glue = match comp.graph.symbol(comp.graph.unaliased(field_ty)) {
            Symbol::Struct(data) if !data.trivially_droppable => data.drop_glue,
            _ => None,
        };
        if let Some(glue) = drop_glue {
            let addr = em.struct_gep(ir_ty, self_ptr, index as u32);
            let ir_fn = em.function_ir(glue);
            em.create_call(ir_fn, &[addr]);
        }
    }
    em.create_ret_void();
}

/// Emits the body of a native function. The real backend maps these onto
/// LLVM intrinsics and the runtime; the recording build keeps the same
/// shapes.
pub fn emit_native_body(
    comp: &Compilation<'_>,
    em: &mut dyn Emitter,
    function: SymbolId,
    op: NativeOp,
) {
    let return_type = comp
        .graph
        .symbol(comp.graph.unaliased(function))
        .callable_return_type()
        .unwrap_or_else(|| comp.error_type());
    let ret_ir = em.get_type(return_type);

    match op {
        NativeOp::Add
        | NativeOp::Sub
        | NativeOp::Mul
        | NativeOp::Div
        | NativeOp::Rem
        | NativeOp::Eq
        | NativeOp::NotEq
        | NativeOp::Less
        | NativeOp::LessEq
        | NativeOp::Greater
        | NativeOp::GreaterEq => {
            let a = em.emit_load_arg(0, ret_ir);
            let b = em.emit_load_arg(1, ret_ir);
            let result = em.binary_op(binary_ir_op(op), a, b);
            em.create_ret(result);
        }
        NativeOp::Neg => {
            let a = em.emit_load_arg(0, ret_ir);
            let result = em.neg(a);
            em.create_ret(result);
        }
        NativeOp::Convert => {
            let value = em.emit_load_arg(0, ret_ir);
            let converted = em.convert(value, ret_ir);
            em.create_ret(converted);
        }
        NativeOp::Alloc => {
            // the runtime allocator provides the real pointer
            let null = em.const_value(ret_ir, IrConstant::Int(0));
            em.create_ret(null);
        }
        NativeOp::PrintInt | NativeOp::PrintPtr | NativeOp::Dealloc | NativeOp::MemCopy => {
            em.create_ret_void();
        }
        NativeOp::StrongPtrNew => {
            let value = em.emit_load_arg(0, ret_ir);
            let slot = em.alloca(ret_ir);
            em.store(value, slot);
            let loaded = em.load(ret_ir, slot);
            em.create_ret(loaded);
        }
        NativeOp::StrongPtrValue
        | NativeOp::WeakPtrFrom
        | NativeOp::WeakPtrLock
        | NativeOp::DynFromStrong => {
            let value = em.emit_load_arg(0, ret_ir);
            em.create_ret(value);
        }
    }
}

fn binary_ir_op(op: NativeOp) -> IrBinaryOp {
    match op {
        NativeOp::Add => IrBinaryOp::Add,
        NativeOp::Sub => IrBinaryOp::Sub,
        NativeOp::Mul => IrBinaryOp::Mul,
        NativeOp::Div => IrBinaryOp::Div,
        NativeOp::Rem => IrBinaryOp::Rem,
        NativeOp::Eq => IrBinaryOp::Eq,
        NativeOp::NotEq => IrBinaryOp::Ne,
        NativeOp::Less => IrBinaryOp::Lt,
        NativeOp::LessEq => IrBinaryOp::Le,
        NativeOp::Greater => IrBinaryOp::Gt,
        NativeOp::GreaterEq => IrBinaryOp::Ge,
        _ => IrBinaryOp::Add,
    }
}
