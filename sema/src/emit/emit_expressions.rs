use crate::emit::FunctionEmitter;
use crate::nodes::ExprSema;
use emitter::{ExprDropInfo, ExprEmitResult, IrConstant, IrValueId};
use std::rc::Rc;
use symbol_graph::SymbolId;
use symbol_graph::symbols::Symbol;
use syntax::LiteralKind;

impl FunctionEmitter<'_, '_, '_> {
    /// Emits one expression; the result value is the address the value
    /// lives at. Lvalues hand out the underlying storage, rvalues a fresh
    /// stack slot.
    pub(crate) fn emit_expr(&mut self, expr: &Rc<ExprSema>) -> ExprEmitResult {
        match expr.as_ref() {
            ExprSema::Literal(e) => {
                let ir_type = self.emitter.get_type(e.ty);
                let constant = literal_constant(e.kind, &e.text);
                let value = self.emitter.const_value(ir_type, constant);
                let slot = self.emitter.alloca(ir_type);
                self.emitter.store(value, slot);
                ExprEmitResult::new(slot, Vec::new())
            }

            ExprSema::StaticVarRef(e) => {
                let ir_type = self.emitter.get_type(e.ty);
                let slot = self.emitter.local_ptr(self.comp.graph.unaliased(e.var), ir_type);
                ExprEmitResult::new(slot, Vec::new())
            }

            ExprSema::InstanceVarRef(e) => {
                let base = self.emit_expr(&e.base);
                let mut tmps = base.tmps;
                let Some(mut base_addr) = base.value else {
                    return ExprEmitResult {
                        value: None,
                        tmps,
                    };
                };

                let base_type = e.base.type_info(self.comp).symbol;
                let struct_type = self.comp.deref_for_access(base_type);
                let ir_struct = self.emitter.get_type(struct_type);

                // Through a reference or strong pointer, the struct
                // address is the loaded pointer value.
                if self.comp.pointee_type(base_type).is_some() {
                    let ir_base = self.emitter.get_type(base_type);
                    base_addr = self.emitter.load(ir_base, base_addr);
                }

                let index = field_index(self.comp, e.field);
                let addr = self.emitter.struct_gep(ir_struct, base_addr, index);
                ExprEmitResult {
                    value: Some(addr),
                    tmps,
                }
            }

            ExprSema::StaticCall(e) => self.emit_call(e.function, None, &e.args),

            ExprSema::InstanceCall(e) => self.emit_call(e.function, Some(&e.base), &e.args),

            // Unlowered operator nodes emit as the call they lower to.
            ExprSema::UserUnary(e) => {
                let operands = [e.operand.clone()];
                self.emit_call(e.op_symbol, None, &operands)
            }
            ExprSema::UserBinary(e) => {
                let operands = [e.lhs.clone(), e.rhs.clone()];
                self.emit_call(e.op_symbol, None, &operands)
            }

            ExprSema::And(e) => {
                let bool_ir = self.emitter.get_type(e.bool_type);
                let mut tmps = Vec::new();

                // result <- false; evaluate lhs; only a true lhs reaches
                // the rhs, whose value becomes the result.
                let result = self.emitter.alloca(bool_ir);
                let zero = self.emitter.const_value(bool_ir, IrConstant::Bool(false));
                self.emitter.store(zero, result);

                let lhs = self.emit_expr(&e.lhs);
                tmps.extend(lhs.tmps.iter().copied());
                let lhs_value = lhs.value.map(|addr| self.emitter.load(bool_ir, addr));

                let true_block = self.emitter.create_block();
                let end_block = self.emitter.create_block();
                if let Some(cond) = lhs_value {
                    self.emitter.create_cond_br(cond, true_block, end_block);
                }

                self.emitter.set_block(true_block);
                let rhs = self.emit_expr(&e.rhs);
                tmps.extend(rhs.tmps.iter().copied());
                if let Some(addr) = rhs.value {
                    let loaded = self.emitter.load(bool_ir, addr);
                    self.emitter.store(loaded, result);
                }
                self.emitter.create_br(end_block);
                self.emitter.set_block(end_block);

                ExprEmitResult::new(result, tmps)
            }

            ExprSema::Or(e) => {
                let bool_ir = self.emitter.get_type(e.bool_type);
                let mut tmps = Vec::new();

                // result <- true; only a false lhs evaluates the rhs.
                let result = self.emitter.alloca(bool_ir);
                let one = self.emitter.const_value(bool_ir, IrConstant::Bool(true));
                self.emitter.store(one, result);

                let lhs = self.emit_expr(&e.lhs);
                tmps.extend(lhs.tmps.iter().copied());
                let lhs_value = lhs.value.map(|addr| self.emitter.load(bool_ir, addr));

                let false_block = self.emitter.create_block();
                let end_block = self.emitter.create_block();
                if let Some(cond) = lhs_value {
                    self.emitter.create_cond_br(cond, end_block, false_block);
                }

                self.emitter.set_block(false_block);
                let rhs = self.emit_expr(&e.rhs);
                tmps.extend(rhs.tmps.iter().copied());
                if let Some(addr) = rhs.value {
                    let loaded = self.emitter.load(bool_ir, addr);
                    self.emitter.store(loaded, result);
                }
                self.emitter.create_br(end_block);
                self.emitter.set_block(end_block);

                ExprEmitResult::new(result, tmps)
            }

            ExprSema::Not(e) => {
                let bool_ir = self.emitter.get_type(e.bool_type);
                let operand = self.emit_expr(&e.operand);
                let tmps = operand.tmps.clone();

                let result = self.emitter.alloca(bool_ir);
                if let Some(addr) = operand.value {
                    let loaded = self.emitter.load(bool_ir, addr);
                    let falsy = self.emitter.const_value(bool_ir, IrConstant::Bool(false));
                    let negated = self
                        .emitter
                        .binary_op(emitter::IrBinaryOp::Eq, loaded, falsy);
                    self.emitter.store(negated, result);
                }
                ExprEmitResult::new(result, tmps)
            }

            ExprSema::AddrOf(e) => {
                let operand = self.emit_expr(&e.operand);
                let tmps = operand.tmps.clone();
                let ptr_ir = self.emitter.get_type(e.ptr_type);
                let slot = self.emitter.alloca(ptr_ir);
                if let Some(addr) = operand.value {
                    self.emitter.store(addr, slot);
                }
                ExprEmitResult::new(slot, tmps)
            }

            ExprSema::Ref(e) => {
                let operand = self.emit_expr(&e.operand);
                let tmps = operand.tmps.clone();
                let ref_ir = self.emitter.get_type(e.ref_type);
                let slot = self.emitter.alloca(ref_ir);
                if let Some(addr) = operand.value {
                    self.emitter.store(addr, slot);
                }
                ExprEmitResult::new(slot, tmps)
            }

            ExprSema::Deref(e) => {
                let operand_type = e.operand.type_info(self.comp).symbol;
                let operand = self.emit_expr(&e.operand);
                let tmps = operand.tmps.clone();
                let ir_type = self.emitter.get_type(operand_type);
                let value = operand.value.map(|addr| self.emitter.load(ir_type, addr));
                ExprEmitResult { value, tmps }
            }

            ExprSema::DerefAs(e) => {
                let operand_type = e.operand.type_info(self.comp).symbol;
                let operand = self.emit_expr(&e.operand);
                let tmps = operand.tmps.clone();
                let ir_type = self.emitter.get_type(operand_type);
                let value = operand.value.map(|addr| self.emitter.load(ir_type, addr));
                ExprEmitResult { value, tmps }
            }

            ExprSema::StructConstruction(e) => {
                let ir_struct = self.emitter.get_type(e.struct_type);
                let slot = self.emitter.alloca(ir_struct);
                let mut tmps = Vec::new();

                for arg in &e.args {
                    let result = self.emit_expr(&arg.value);
                    tmps.extend(result.tmps.iter().copied());
                    let field_type = self
                        .comp
                        .graph
                        .symbol(arg.field)
                        .get_var_type()
                        .expect("field has a type");
                    let index = field_index(self.comp, arg.field);
                    let addr = self.emitter.struct_gep(ir_struct, slot, index);
                    if let Some(value) = result.value {
                        self.emitter.emit_copy(addr, value, field_type);
                    }
                }

                ExprEmitResult::new(slot, tmps)
            }

            ExprSema::SizeOf(e) => {
                let target_ir = self.emitter.get_type(e.target_type);
                let int_ir = self.emitter.get_type(e.int_type);
                let size = self.emitter.size_of(target_ir);
                let slot = self.emitter.alloca(int_ir);
                self.emitter.store(size, slot);
                ExprEmitResult::new(slot, Vec::new())
            }

            ExprSema::Box_(e) => {
                debug_assert!(false, "box survived lowering");
                self.emit_expr(&e.operand)
            }

            ExprSema::Unbox(e) => {
                debug_assert!(false, "unbox survived lowering");
                self.emit_expr(&e.operand)
            }

            ExprSema::ConversionPlaceholder(e) => {
                // never reached from an error-free tree; surface a slot so
                // emission stays total
                debug_assert!(false, "conversion placeholder reached emission");
                let ir_type = self.emitter.get_type(e.info.symbol);
                let slot = self.emitter.alloca(ir_type);
                ExprEmitResult::new(slot, Vec::new())
            }

            ExprSema::Expr(e) => self.emit_expr(&e.inner),
        }
    }

    /// Calls load their arguments by value; results land in a fresh slot.
    /// A non-trivially-droppable result is registered as a statement
    /// temporary.
    fn emit_call(
        &mut self,
        function: SymbolId,
        base: Option<&Rc<ExprSema>>,
        args: &[Rc<ExprSema>],
    ) -> ExprEmitResult {
        let unaliased = self.comp.graph.unaliased(function);
        let mut tmps: Vec<ExprDropInfo> = Vec::new();
        let mut values: Vec<IrValueId> = Vec::new();

        if let Some(base) = base {
            if let Some(value) = self.emit_arg(base, &mut tmps) {
                values.push(value);
            }
        }
        for arg in args {
            if let Some(value) = self.emit_arg(arg, &mut tmps) {
                values.push(value);
            }
        }

        let ir_function = self.emitter.function_ir(unaliased);
        let call_value = self.emitter.create_call(ir_function, &values);

        let return_type = self
            .comp
            .graph
            .symbol(unaliased)
            .callable_return_type()
            .unwrap_or_else(|| self.comp.error_type());
        if self.comp.graph.unaliased(return_type) == self.comp.graph.unaliased(self.comp.natives.void)
        {
            return ExprEmitResult { value: None, tmps };
        }

        let ir_return = self.emitter.get_type(return_type);
        let slot = self.emitter.alloca(ir_return);
        self.emitter.store(call_value, slot);

        if needs_drop(self.comp, return_type) {
            tmps.push(ExprDropInfo {
                value: slot,
                ty: return_type,
            });
        }

        ExprEmitResult::new(slot, tmps)
    }

    fn emit_arg(&mut self, arg: &Rc<ExprSema>, tmps: &mut Vec<ExprDropInfo>) -> Option<IrValueId> {
        let arg_type = arg.type_info(self.comp).symbol;
        let result = self.emit_expr(arg);
        tmps.extend(result.tmps.iter().copied());
        let addr = result.value?;
        let ir_type = self.emitter.get_type(arg_type);
        Some(self.emitter.load(ir_type, addr))
    }
}

fn field_index(comp: &symbol_graph::Compilation<'_>, field: SymbolId) -> u32 {
    match comp.graph.symbol(comp.graph.unaliased(field)) {
        Symbol::Field(data) => data.index as u32,
        _ => 0,
    }
}

fn needs_drop(comp: &symbol_graph::Compilation<'_>, ty: SymbolId) -> bool {
    match comp.graph.symbol(comp.graph.unaliased(ty)) {
        Symbol::Struct(data) => !data.trivially_droppable,
        _ => false,
    }
}

/// Turns literal text into the constant the backend materializes. The
/// lexer guaranteed the text parses; malformed text degrades to zero.
fn literal_constant(kind: LiteralKind, text: &str) -> IrConstant {
    if kind.intersects(LiteralKind::TRUE) {
        IrConstant::Bool(true)
    } else if kind.intersects(LiteralKind::FALSE) {
        IrConstant::Bool(false)
    } else if kind.contains(LiteralKind::STRING) {
        IrConstant::Str(text.to_string())
    } else if kind.intersects(LiteralKind::FLOAT) {
        IrConstant::Float(text.parse().unwrap_or(0.0))
    } else if kind.intersects(LiteralKind::UNSIGNED_INT) {
        IrConstant::Uint(text.parse().unwrap_or(0))
    } else {
        IrConstant::Int(text.parse().unwrap_or(0))
    }
}
