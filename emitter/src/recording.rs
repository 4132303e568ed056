use crate::{
    Emitter, ExprDropInfo, IrBinaryOp, IrBlockId, IrConstant, IrFunctionId, IrTypeId, IrValueId,
};
use indexmap::IndexMap;
use std::fmt;
use symbol_graph::SymbolId;

/// One recorded builder operation. The layout mirrors the contract calls
/// one to one so tests can assert on exactly what the backend would build.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Alloca {
        ty: IrTypeId,
        dst: IrValueId,
    },
    Load {
        ptr: IrValueId,
        dst: IrValueId,
    },
    Store {
        value: IrValueId,
        ptr: IrValueId,
    },
    Gep {
        ptr: IrValueId,
        index: u32,
        dst: IrValueId,
    },
    StructGep {
        ptr: IrValueId,
        field: u32,
        dst: IrValueId,
    },
    Const {
        constant: IrConstant,
        dst: IrValueId,
    },
    Binary {
        op: IrBinaryOp,
        lhs: IrValueId,
        rhs: IrValueId,
        dst: IrValueId,
    },
    Neg {
        value: IrValueId,
        dst: IrValueId,
    },
    Convert {
        value: IrValueId,
        to: IrTypeId,
        dst: IrValueId,
    },
    Call {
        function: IrFunctionId,
        args: Vec<IrValueId>,
        dst: IrValueId,
    },
    CondBr {
        cond: IrValueId,
        then_block: IrBlockId,
        else_block: IrBlockId,
    },
    Br {
        block: IrBlockId,
    },
    Ret {
        value: IrValueId,
    },
    RetVoid,
    LoadArg {
        index: usize,
        dst: IrValueId,
    },
    Copy {
        dst: IrValueId,
        src: IrValueId,
        ty: SymbolId,
    },
    DropTmp {
        value: IrValueId,
        ty: SymbolId,
    },
    SizeOf {
        ty: IrTypeId,
        dst: IrValueId,
    },
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Alloca { ty, dst } => write!(f, "v{} = alloca t{}", dst.0, ty.0),
            Instruction::Load { ptr, dst } => write!(f, "v{} = load v{}", dst.0, ptr.0),
            Instruction::Store { value, ptr } => write!(f, "store v{} -> v{}", value.0, ptr.0),
            Instruction::Gep { ptr, index, dst } => {
                write!(f, "v{} = gep v{}[{}]", dst.0, ptr.0, index)
            }
            Instruction::StructGep { ptr, field, dst } => {
                write!(f, "v{} = field v{}.{}", dst.0, ptr.0, field)
            }
            Instruction::Const { constant, dst } => write!(f, "v{} = const {constant:?}", dst.0),
            Instruction::Binary { op, lhs, rhs, dst } => {
                write!(f, "v{} = {op:?}(v{}, v{})", dst.0, lhs.0, rhs.0)
            }
            Instruction::Neg { value, dst } => write!(f, "v{} = neg v{}", dst.0, value.0),
            Instruction::Convert { value, to, dst } => {
                write!(f, "v{} = convert v{} to t{}", dst.0, value.0, to.0)
            }
            Instruction::Call { function, args, dst } => {
                write!(f, "v{} = call f{}(", dst.0, function.0)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "v{}", arg.0)?;
                }
                write!(f, ")")
            }
            Instruction::CondBr {
                cond,
                then_block,
                else_block,
            } => write!(f, "condbr v{} b{} b{}", cond.0, then_block.0, else_block.0),
            Instruction::Br { block } => write!(f, "br b{}", block.0),
            Instruction::Ret { value } => write!(f, "ret v{}", value.0),
            Instruction::RetVoid => write!(f, "ret void"),
            Instruction::LoadArg { index, dst } => write!(f, "v{} = arg {}", dst.0, index),
            Instruction::Copy { dst, src, .. } => write!(f, "copy v{} <- v{}", dst.0, src.0),
            Instruction::DropTmp { value, .. } => write!(f, "drop v{}", value.0),
            Instruction::SizeOf { ty, dst } => write!(f, "v{} = size_of t{}", dst.0, ty.0),
        }
    }
}

/// An `Emitter` over an in-memory log: values and blocks are counters, the
/// function map is an insertion-ordered table, and every builder call is
/// appended to the current block.
#[derive(Debug, Default)]
pub struct RecordingEmitter {
    blocks: Vec<Vec<Instruction>>,
    current: usize,
    next_value: u32,
    next_type: u32,
    types: IndexMap<SymbolId, IrTypeId>,
    functions: IndexMap<SymbolId, IrFunctionId>,
    locals: IndexMap<SymbolId, IrValueId>,
    current_function: IrFunctionId,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        let mut emitter = Self::default();
        let entry = emitter.create_block();
        emitter.set_block(entry);
        emitter
    }

    /// Starts emitting another function: fresh blocks and locals, keeping
    /// the type and function maps.
    pub fn begin_function(&mut self, function: SymbolId) {
        let ir = self.function_ir(function);
        self.current_function = ir;
        self.blocks.clear();
        self.locals.clear();
        let entry = self.create_block();
        self.set_block(entry);
    }

    fn fresh_value(&mut self) -> IrValueId {
        let id = IrValueId(self.next_value);
        self.next_value += 1;
        id
    }

    fn push(&mut self, instruction: Instruction) {
        self.blocks[self.current].push(instruction);
    }

    /// Every recorded instruction in block order.
    pub fn instructions(&self) -> Vec<Instruction> {
        self.blocks.iter().flatten().cloned().collect()
    }

    /// The log rendered one instruction per line, for dumps and snapshot
    /// style assertions.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (index, block) in self.blocks.iter().enumerate() {
            out.push_str(&format!("b{index}:\n"));
            for instruction in block {
                out.push_str(&format!("  {instruction}\n"));
            }
        }
        out
    }

    pub fn function_map(&self) -> &IndexMap<SymbolId, IrFunctionId> {
        &self.functions
    }
}

impl Emitter for RecordingEmitter {
    fn get_type(&mut self, ty: SymbolId) -> IrTypeId {
        if let Some(&existing) = self.types.get(&ty) {
            return existing;
        }
        let id = IrTypeId(self.next_type);
        self.next_type += 1;
        self.types.insert(ty, id);
        id
    }

    fn function_ir(&mut self, function: SymbolId) -> IrFunctionId {
        if let Some(&existing) = self.functions.get(&function) {
            return existing;
        }
        let id = IrFunctionId(self.functions.len() as u32);
        self.functions.insert(function, id);
        id
    }

    fn get_function(&self) -> IrFunctionId {
        self.current_function
    }

    fn create_block(&mut self) -> IrBlockId {
        let id = IrBlockId(self.blocks.len() as u32);
        self.blocks.push(Vec::new());
        id
    }

    fn set_block(&mut self, block: IrBlockId) {
        self.current = block.0 as usize;
    }

    fn current_block(&self) -> IrBlockId {
        IrBlockId(self.current as u32)
    }

    fn alloca(&mut self, ty: IrTypeId) -> IrValueId {
        let dst = self.fresh_value();
        self.push(Instruction::Alloca { ty, dst });
        dst
    }

    fn load(&mut self, _ty: IrTypeId, ptr: IrValueId) -> IrValueId {
        let dst = self.fresh_value();
        self.push(Instruction::Load { ptr, dst });
        dst
    }

    fn store(&mut self, value: IrValueId, ptr: IrValueId) {
        self.push(Instruction::Store { value, ptr });
    }

    fn gep(&mut self, _ty: IrTypeId, ptr: IrValueId, index: u32) -> IrValueId {
        let dst = self.fresh_value();
        self.push(Instruction::Gep { ptr, index, dst });
        dst
    }

    fn struct_gep(&mut self, _ty: IrTypeId, ptr: IrValueId, field: u32) -> IrValueId {
        let dst = self.fresh_value();
        self.push(Instruction::StructGep { ptr, field, dst });
        dst
    }

    fn const_value(&mut self, _ty: IrTypeId, constant: IrConstant) -> IrValueId {
        let dst = self.fresh_value();
        self.push(Instruction::Const { constant, dst });
        dst
    }

    fn binary_op(&mut self, op: IrBinaryOp, lhs: IrValueId, rhs: IrValueId) -> IrValueId {
        let dst = self.fresh_value();
        self.push(Instruction::Binary { op, lhs, rhs, dst });
        dst
    }

    fn neg(&mut self, value: IrValueId) -> IrValueId {
        let dst = self.fresh_value();
        self.push(Instruction::Neg { value, dst });
        dst
    }

    fn convert(&mut self, value: IrValueId, to: IrTypeId) -> IrValueId {
        let dst = self.fresh_value();
        self.push(Instruction::Convert { value, to, dst });
        dst
    }

    fn create_call(&mut self, function: IrFunctionId, args: &[IrValueId]) -> IrValueId {
        let dst = self.fresh_value();
        self.push(Instruction::Call {
            function,
            args: args.to_vec(),
            dst,
        });
        dst
    }

    fn create_cond_br(&mut self, cond: IrValueId, then_block: IrBlockId, else_block: IrBlockId) {
        self.push(Instruction::CondBr {
            cond,
            then_block,
            else_block,
        });
    }

    fn create_br(&mut self, block: IrBlockId) {
        self.push(Instruction::Br { block });
    }

    fn create_ret(&mut self, value: IrValueId) {
        self.push(Instruction::Ret { value });
    }

    fn create_ret_void(&mut self) {
        self.push(Instruction::RetVoid);
    }

    fn emit_load_arg(&mut self, index: usize, _ty: IrTypeId) -> IrValueId {
        let dst = self.fresh_value();
        self.push(Instruction::LoadArg { index, dst });
        dst
    }

    fn emit_copy(&mut self, dst: IrValueId, src: IrValueId, ty: SymbolId) {
        self.push(Instruction::Copy { dst, src, ty });
    }

    fn emit_drop_tmps(&mut self, tmps: &[ExprDropInfo]) {
        for tmp in tmps {
            self.push(Instruction::DropTmp {
                value: tmp.value,
                ty: tmp.ty,
            });
        }
    }

    fn local_ptr(&mut self, local: SymbolId, ty: IrTypeId) -> IrValueId {
        if let Some(&existing) = self.locals.get(&local) {
            return existing;
        }
        let slot = self.alloca(ty);
        self.locals.insert(local, slot);
        slot
    }

    fn size_of(&mut self, ty: IrTypeId) -> IrValueId {
        let dst = self.fresh_value();
        self.push(Instruction::SizeOf { ty, dst });
        dst
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_slots_are_allocated_once() {
        let mut emitter = RecordingEmitter::new();
        let ty = emitter.get_type(dummy_symbol());
        let a = emitter.local_ptr(dummy_symbol(), ty);
        let b = emitter.local_ptr(dummy_symbol(), ty);
        assert_eq!(a, b);
    }

    #[test]
    fn function_map_is_stable() {
        let mut emitter = RecordingEmitter::new();
        let first = emitter.function_ir(dummy_symbol());
        let again = emitter.function_ir(dummy_symbol());
        assert_eq!(first, again);
    }

    fn dummy_symbol() -> SymbolId {
        use shared_context::Bump;
        // ids are opaque to the emitter; grab one from a tiny compilation
        let arena = Bump::new();
        let comp = symbol_graph::Compilation::new(&arena, "t", "");
        comp.natives.int32
    }
}
