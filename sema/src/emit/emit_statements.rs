use crate::emit::FunctionEmitter;
use crate::nodes::StmtSema;
use std::rc::Rc;

impl FunctionEmitter<'_, '_, '_> {
    pub(crate) fn emit_stmt(&mut self, stmt: &Rc<StmtSema>) {
        match stmt.as_ref() {
            StmtSema::Block(s) => {
                for child in &s.stmts {
                    self.emit_stmt(child);
                }
            }

            StmtSema::Group(s) => {
                for child in &s.stmts {
                    self.emit_stmt(child);
                }
            }

            StmtSema::Var(s) => {
                let Some(init) = &s.init else {
                    return;
                };
                let var_type = self
                    .comp
                    .graph
                    .symbol(s.symbol)
                    .get_var_type()
                    .expect("local has a type");
                let ir_type = self.emitter.get_type(var_type);
                let result = self.emit_expr(init);
                let slot = self.emitter.local_ptr(s.symbol, ir_type);
                if let Some(value) = result.value {
                    self.emitter.emit_copy(slot, value, var_type);
                }
                self.emitter.emit_drop_tmps(&result.tmps);
            }

            StmtSema::NormalAssignment(s) => {
                let lhs_type = s.lhs.type_info(self.comp).symbol;
                let lhs = self.emit_expr(&s.lhs);
                let rhs = self.emit_expr(&s.rhs);
                if let (Some(dst), Some(src)) = (lhs.value, rhs.value) {
                    self.emitter.emit_copy(dst, src, lhs_type);
                }
                let mut tmps = lhs.tmps;
                tmps.extend(rhs.tmps);
                self.emitter.emit_drop_tmps(&tmps);
            }

            StmtSema::Label(s) => {
                let block = self.labels[&s.label];
                self.emitter.create_br(block);
                self.emitter.set_block(block);
            }

            StmtSema::Jump(s) => {
                self.emitter.create_br(self.labels[&s.label]);
                // nothing may flow into the dead space behind a jump
                let next = self.emitter.create_block();
                self.emitter.set_block(next);
            }

            StmtSema::ConditionalJump(s) => {
                let bool_type = self.emitter.get_type(self.comp.natives.bool_);
                let result = self.emit_expr(&s.condition);
                let next = self.emitter.create_block();
                if let Some(addr) = result.value {
                    let loaded = self.emitter.load(bool_type, addr);
                    self.emitter
                        .create_cond_br(loaded, self.labels[&s.label], next);
                }
                self.emitter.set_block(next);
                self.emitter.emit_drop_tmps(&result.tmps);
            }

            StmtSema::Return(s) => {
                match &s.value {
                    Some(value) => {
                        let value_type = value.type_info(self.comp).symbol;
                        let ir_type = self.emitter.get_type(value_type);
                        let result = self.emit_expr(value);
                        if let Some(addr) = result.value {
                            let loaded = self.emitter.load(ir_type, addr);
                            self.emitter.create_ret(loaded);
                        } else {
                            self.emitter.create_ret_void();
                        }
                    }
                    None => self.emitter.create_ret_void(),
                }
                let next = self.emitter.create_block();
                self.emitter.set_block(next);
            }

            StmtSema::Expr(s) => {
                let result = self.emit_expr(&s.expr);
                self.emitter.emit_drop_tmps(&result.tmps);
            }

            StmtSema::If(_) | StmtSema::While(_) | StmtSema::CompoundAssignment(_) => {
                // lowering removes these; reaching one here is a pass
                // ordering bug
                debug_assert!(false, "structured statement survived lowering");
            }
        }
    }
}
