use crate::scope::{ScopeKind, SymbolGraph};
use crate::symbols::{
    AliasSymbol, BodyKind, ErrorTypeSymbol, FunctionSymbol, ParamVarSymbol, StructSymbol, Symbol,
};
use crate::{AccessModifier, ScopeId, SymbolCategory, SymbolId};
use shared_context::interner::Interner;
use shared_context::{Ident, Span};
use std::collections::{HashMap, HashSet};
use syntax::LiteralKind;

/// The well-known names the glue generator declares synthesized functions
/// under. `$` keeps them out of the user namespace.
pub const COPY_GLUE_NAME: &str = "$copy_glue";
pub const DROP_GLUE_NAME: &str = "$drop_glue";

/// The built-in operation behind a native function symbol. The core never
/// interprets these; the emitter side supplies a body for each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Neg,
    Convert,
    PrintInt,
    PrintPtr,
    Alloc,
    Dealloc,
    MemCopy,
    StrongPtrNew,
    StrongPtrValue,
    WeakPtrFrom,
    WeakPtrLock,
    DynFromStrong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumericFamily {
    Signed,
    Unsigned,
    Float,
}

/// The native-symbol table: ids of every built-in type and function, plus
/// the native conversion-operator maps the conversion rules consult.
/// Installed once per compilation, before user code is resolved.
#[derive(Debug)]
pub struct Natives {
    pub int8: SymbolId,
    pub int16: SymbolId,
    pub int32: SymbolId,
    pub int64: SymbolId,
    pub uint8: SymbolId,
    pub uint16: SymbolId,
    pub uint32: SymbolId,
    pub uint64: SymbolId,
    pub int: SymbolId,
    pub float32: SymbolId,
    pub float64: SymbolId,
    pub bool_: SymbolId,
    pub void: SymbolId,
    pub string: SymbolId,
    pub ptr: SymbolId,

    pub error_type: SymbolId,
    pub error_function: SymbolId,

    pub ref_root: SymbolId,
    pub strong_ptr_root: SymbolId,
    pub weak_ptr_root: SymbolId,
    pub dyn_strong_ptr_root: SymbolId,

    pub strong_ptr_new: SymbolId,
    pub strong_ptr_value: SymbolId,

    pub print_int: SymbolId,
    pub print_ptr: SymbolId,
    pub alloc: SymbolId,
    pub dealloc: SymbolId,
    pub mem_copy: SymbolId,

    /// target type -> source type -> conversion operator.
    pub implicit_from_ops: HashMap<SymbolId, HashMap<SymbolId, SymbolId>>,
    pub explicit_from_ops: HashMap<SymbolId, HashMap<SymbolId, SymbolId>>,

    /// Generic roots (and their member functions) exempt from the
    /// sized-type-argument requirement: references and the pointer family.
    special_generics: HashSet<SymbolId>,
}

impl Natives {
    pub fn install(graph: &mut SymbolGraph, interner: &mut Interner<'_>) -> Self {
        Installer { graph, interner }.run()
    }

    pub fn is_special_generic(&self, id: SymbolId) -> bool {
        self.special_generics.contains(&id)
    }

    /// The built-in type a literal of `kind` has.
    pub fn literal_type(&self, kind: LiteralKind) -> SymbolId {
        if kind.intersects(LiteralKind::BOOL) {
            self.bool_
        } else if kind.contains(LiteralKind::STRING) {
            self.string
        } else if kind.contains(LiteralKind::INT8) {
            self.int8
        } else if kind.contains(LiteralKind::INT16) {
            self.int16
        } else if kind.contains(LiteralKind::INT32) {
            self.int32
        } else if kind.contains(LiteralKind::INT64) {
            self.int64
        } else if kind.contains(LiteralKind::UINT8) {
            self.uint8
        } else if kind.contains(LiteralKind::UINT16) {
            self.uint16
        } else if kind.contains(LiteralKind::UINT32) {
            self.uint32
        } else if kind.contains(LiteralKind::UINT64) {
            self.uint64
        } else if kind.contains(LiteralKind::FLOAT32) {
            self.float32
        } else if kind.contains(LiteralKind::FLOAT64) {
            self.float64
        } else {
            self.int
        }
    }

    /// Every numeric built-in, for tests and the driver's dumps.
    pub fn numeric_types(&self) -> [SymbolId; 11] {
        [
            self.int8,
            self.int16,
            self.int32,
            self.int64,
            self.int,
            self.uint8,
            self.uint16,
            self.uint32,
            self.uint64,
            self.float32,
            self.float64,
        ]
    }
}

struct Installer<'g, 'i, 'a> {
    graph: &'g mut SymbolGraph,
    interner: &'i mut Interner<'a>,
}

impl Installer<'_, '_, '_> {
    fn run(mut self) -> Natives {
        let global = self.graph.global_scope();

        let error_type_name = self.ident("");
        let error_type = self.graph.declare_symbol_unchecked(Symbol::ErrorType(ErrorTypeSymbol {
            scope: global,
            name: error_type_name,
        }));

        // Primitive value types.
        let int8 = self.primitive("Int8");
        let int16 = self.primitive("Int16");
        let int32 = self.primitive("Int32");
        let int64 = self.primitive("Int64");
        let uint8 = self.primitive("UInt8");
        let uint16 = self.primitive("UInt16");
        let uint32 = self.primitive("UInt32");
        let uint64 = self.primitive("UInt64");
        let int = self.primitive("Int");
        let float32 = self.primitive("Float32");
        let float64 = self.primitive("Float64");
        let bool_ = self.primitive("Bool");
        let void = self.primitive("Void");
        let string = self.primitive("String");
        let ptr = self.primitive("Ptr");

        let error_function = self.function(global, "$error", &[], error_type, BodyKind::Unbound);

        // The numeric ladder: (type, short name, bit width, family).
        let ladder: [(SymbolId, &str, u32, NumericFamily); 11] = [
            (int8, "i8", 8, NumericFamily::Signed),
            (int16, "i16", 16, NumericFamily::Signed),
            (int32, "i32", 32, NumericFamily::Signed),
            (int64, "i64", 64, NumericFamily::Signed),
            (int, "int", 64, NumericFamily::Signed),
            (uint8, "u8", 8, NumericFamily::Unsigned),
            (uint16, "u16", 16, NumericFamily::Unsigned),
            (uint32, "u32", 32, NumericFamily::Unsigned),
            (uint64, "u64", 64, NumericFamily::Unsigned),
            (float32, "f32", 32, NumericFamily::Float),
            (float64, "f64", 64, NumericFamily::Float),
        ];

        // Arithmetic, comparison and negation operators on the numerics.
        for &(ty, _, _, family) in &ladder {
            let body = self.body_scope_of(ty);
            for (name, op) in [
                ("op_add", NativeOp::Add),
                ("op_sub", NativeOp::Sub),
                ("op_mul", NativeOp::Mul),
                ("op_div", NativeOp::Div),
                ("op_rem", NativeOp::Rem),
            ] {
                self.function(
                    body,
                    name,
                    &[("a", ty), ("b", ty)],
                    ty,
                    BodyKind::Native(op),
                );
            }
            for (name, op) in [
                ("op_eq", NativeOp::Eq),
                ("op_not_eq", NativeOp::NotEq),
                ("op_less", NativeOp::Less),
                ("op_less_eq", NativeOp::LessEq),
                ("op_greater", NativeOp::Greater),
                ("op_greater_eq", NativeOp::GreaterEq),
            ] {
                self.function(
                    body,
                    name,
                    &[("a", ty), ("b", ty)],
                    bool_,
                    BodyKind::Native(op),
                );
            }
            if family != NumericFamily::Unsigned {
                self.function(body, "op_neg", &[("a", ty)], ty, BodyKind::Native(NativeOp::Neg));
            }
        }

        let bool_body = self.body_scope_of(bool_);
        for (name, op) in [("op_eq", NativeOp::Eq), ("op_not_eq", NativeOp::NotEq)] {
            self.function(
                bool_body,
                name,
                &[("a", bool_), ("b", bool_)],
                bool_,
                BodyKind::Native(op),
            );
        }

        // Pairwise conversion operators. Widening within one family is
        // implicit; everything else needs an explicit cast.
        let mut implicit_from_ops: HashMap<SymbolId, HashMap<SymbolId, SymbolId>> = HashMap::new();
        let mut explicit_from_ops: HashMap<SymbolId, HashMap<SymbolId, SymbolId>> = HashMap::new();

        for &(target, _, target_width, target_family) in &ladder {
            let target_body = self.body_scope_of(target);
            for &(source, source_short, source_width, source_family) in &ladder {
                if source == target {
                    continue;
                }
                let name = format!("from_{source_short}");
                let op = self.function(
                    target_body,
                    &name,
                    &[("value", source)],
                    target,
                    BodyKind::Native(NativeOp::Convert),
                );
                let widening = source_family == target_family && source_width <= target_width;
                let map = if widening {
                    &mut implicit_from_ops
                } else {
                    &mut explicit_from_ops
                };
                map.entry(target).or_default().insert(source, op);
            }
        }

        // Reference and pointer generics. Their copy and drop semantics are
        // native, so none of them is trivially copyable except Ref.
        let (ref_root, _) = self.generic_root("Ref", true);
        let (strong_ptr_root, strong_param) = self.generic_root("StrongPtr", false);
        let (weak_ptr_root, weak_param) = self.generic_root("WeakPtr", false);
        let (dyn_strong_ptr_root, dyn_param) = self.generic_root("DynStrongPtr", false);

        let strong_body = self.body_scope_of(strong_ptr_root);
        let strong_ptr_new = self.function(
            strong_body,
            "new",
            &[("value", strong_param)],
            strong_ptr_root,
            BodyKind::Native(NativeOp::StrongPtrNew),
        );
        let strong_ptr_value = self.function(
            strong_body,
            "value",
            &[("ptr", strong_ptr_root)],
            strong_param,
            BodyKind::Native(NativeOp::StrongPtrValue),
        );

        let weak_body = self.body_scope_of(weak_ptr_root);
        let strong_of_weak = self.pointer_instance(strong_ptr_root, weak_param);
        let weak_from = self.function(
            weak_body,
            "from",
            &[("ptr", strong_of_weak)],
            weak_ptr_root,
            BodyKind::Native(NativeOp::WeakPtrFrom),
        );
        let weak_lock = self.function(
            weak_body,
            "lock",
            &[("ptr", weak_ptr_root)],
            strong_of_weak,
            BodyKind::Native(NativeOp::WeakPtrLock),
        );

        let dyn_body = self.body_scope_of(dyn_strong_ptr_root);
        let strong_of_dyn = self.pointer_instance(strong_ptr_root, dyn_param);
        let dyn_from_strong = self.function(
            dyn_body,
            "from_strong",
            &[("ptr", strong_of_dyn)],
            dyn_strong_ptr_root,
            BodyKind::Native(NativeOp::DynFromStrong),
        );

        // Free native functions.
        let print_int = self.function(
            global,
            "print_int",
            &[("value", int)],
            void,
            BodyKind::Native(NativeOp::PrintInt),
        );
        let print_ptr = self.function(
            global,
            "print_ptr",
            &[("ptr", ptr)],
            void,
            BodyKind::Native(NativeOp::PrintPtr),
        );
        let alloc = self.function(
            global,
            "alloc",
            &[("size", int)],
            ptr,
            BodyKind::Native(NativeOp::Alloc),
        );
        let dealloc = self.function(
            global,
            "dealloc",
            &[("ptr", ptr)],
            void,
            BodyKind::Native(NativeOp::Dealloc),
        );
        let mem_copy = self.function(
            global,
            "copy",
            &[("dst", ptr), ("src", ptr), ("size", int)],
            void,
            BodyKind::Native(NativeOp::MemCopy),
        );

        let special_generics = HashSet::from([
            ref_root,
            weak_ptr_root,
            dyn_strong_ptr_root,
            weak_from,
            weak_lock,
            dyn_from_strong,
        ]);

        Natives {
            int8,
            int16,
            int32,
            int64,
            uint8,
            uint16,
            uint32,
            uint64,
            int,
            float32,
            float64,
            bool_,
            void,
            string,
            ptr,
            error_type,
            error_function,
            ref_root,
            strong_ptr_root,
            weak_ptr_root,
            dyn_strong_ptr_root,
            strong_ptr_new,
            strong_ptr_value,
            print_int,
            print_ptr,
            alloc,
            dealloc,
            mem_copy,
            implicit_from_ops,
            explicit_from_ops,
            special_generics,
        }
    }

    fn ident(&mut self, name: &str) -> Ident {
        Ident::new(self.interner.intern(name), Span::default())
    }

    fn body_scope_of(&self, ty: SymbolId) -> ScopeId {
        self.graph
            .symbol(ty)
            .get_body_scope()
            .expect("native type has a body scope")
    }

    /// A primitively emittable, trivially copyable value type.
    fn primitive(&mut self, name: &str) -> SymbolId {
        let global = self.graph.global_scope();
        let ident = self.ident(name);
        let body = self
            .graph
            .create_scope(global, ScopeKind::TypeBody, Some(ident.get_name()));

        let mut data = StructSymbol::new(
            global,
            body,
            ident,
            AccessModifier::Public,
            Vec::new(),
            Vec::new(),
        );
        data.primitively_emittable = true;
        data.size_state = crate::symbols::SizeState::Sized;
        data.trivially_copyable = true;
        data.trivially_droppable = true;
        self.graph.declare_symbol_unchecked(Symbol::Struct(data))
    }

    /// A generic root with one type parameter `T`, emitted as a pointer.
    fn generic_root(&mut self, name: &str, trivial: bool) -> (SymbolId, SymbolId) {
        let global = self.graph.global_scope();
        let ident = self.ident(name);
        let body = self
            .graph
            .create_scope(global, ScopeKind::TypeBody, Some(ident.get_name()));

        let param_ident = self.ident("T");
        let param = self
            .graph
            .declare_symbol_unchecked(Symbol::TypeParam(crate::symbols::TypeParamSymbol {
                scope: body,
                name: param_ident,
                index: 0,
            }));

        let mut data = StructSymbol::new(
            global,
            body,
            ident,
            AccessModifier::Public,
            vec![param],
            vec![param],
        );
        data.primitively_emittable = true;
        data.size_state = crate::symbols::SizeState::Sized;
        data.trivially_copyable = trivial;
        data.trivially_droppable = trivial;
        (self.graph.declare_symbol_unchecked(Symbol::Struct(data)), param)
    }

    /// A placeholder instance of a pointer generic, used while wiring the
    /// pointer family's own member signatures (`WeakPtr[T]::from` takes a
    /// `StrongPtr[T]`).
    fn pointer_instance(&mut self, root: SymbolId, arg: SymbolId) -> SymbolId {
        let (root_scope, name, params, trivial) = match self.graph.symbol(root) {
            Symbol::Struct(data) => (
                data.scope,
                data.name,
                data.type_params.clone(),
                data.trivially_copyable,
            ),
            _ => unreachable!("pointer roots are structs"),
        };

        let body = self
            .graph
            .create_scope(root_scope, ScopeKind::TypeBody, Some(name.get_name()));
        for &param in &params {
            let param_name = self.graph.symbol(param).get_name();
            self.graph.declare_symbol_unchecked(Symbol::Alias(AliasSymbol {
                scope: body,
                name: param_name,
                access: AccessModifier::Public,
                target: arg,
            }));
        }

        let mut data = StructSymbol::new(
            root_scope,
            body,
            name,
            AccessModifier::Public,
            params,
            vec![arg],
        );
        data.primitively_emittable = true;
        data.size_state = crate::symbols::SizeState::Sized;
        data.trivially_copyable = trivial;
        data.trivially_droppable = trivial;
        data.generic_root = Some(root);
        self.graph.declare_symbol_unchecked(Symbol::Struct(data))
    }

    fn function(
        &mut self,
        scope: ScopeId,
        name: &str,
        params: &[(&str, SymbolId)],
        return_type: SymbolId,
        body: BodyKind,
    ) -> SymbolId {
        let fn_body = self.graph.create_scope(scope, ScopeKind::FunctionBody, None);

        let mut param_ids = Vec::with_capacity(params.len());
        for (index, &(param_name, param_type)) in params.iter().enumerate() {
            let ident = self.ident(param_name);
            param_ids.push(self.graph.declare_symbol_unchecked(Symbol::Param(
                ParamVarSymbol {
                    scope: fn_body,
                    name: ident,
                    var_type: param_type,
                    index,
                },
            )));
        }

        let ident = self.ident(name);
        let mut data = FunctionSymbol::new(
            scope,
            fn_body,
            ident,
            AccessModifier::Public,
            SymbolCategory::Static,
            return_type,
            param_ids,
            None,
        );
        data.body = body;
        self.graph.declare_symbol_unchecked(Symbol::Function(data))
    }
}
