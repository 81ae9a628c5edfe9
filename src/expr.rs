//! Typed expression AST with structural sharing.
//!
//! Expressions live in an [`ExprArena`]. The arena interns every
//! `(kind, type)` pair, so building the same sub-expression twice yields the
//! same [`NodeId`]. Analyses key their memo tables on node identity, which
//! this sharing makes sound.
//!
//! Construction goes through typed builder methods on the arena, in the
//! manager-centric style of a BDD manager: preconditions on operand types
//! are checked with assertions (they are programmer errors, not analysis
//! errors).

use std::collections::HashMap;
use std::fmt;

use log::debug;
use num_bigint::BigInt;
use num_rational::BigRational;

use crate::types::Type;
use crate::var::VarId;

/// Identity of an expression node within its arena.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Identity of a function argument slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ArgId(u32);

impl fmt::Display for ArgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "arg{}", self.0)
    }
}

/// A typed constant value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    Bool(bool),
    Byte(u8),
    Char(char),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Long(i64),
    ULong(u64),
    BigInt(BigInt),
    Real(BigRational),
    Str(String),
    /// Value of a fixed-width integer, together with its width.
    Fixed { width: u32, value: BigInt },
}

impl Constant {
    /// The type descriptor of this constant.
    pub fn ty(&self) -> Type {
        match self {
            Constant::Bool(_) => Type::Bool,
            Constant::Byte(_) => Type::Byte,
            Constant::Char(_) => Type::Char,
            Constant::Short(_) => Type::Short,
            Constant::UShort(_) => Type::UShort,
            Constant::Int(_) => Type::Int,
            Constant::UInt(_) => Type::UInt,
            Constant::Long(_) => Type::Long,
            Constant::ULong(_) => Type::ULong,
            Constant::BigInt(_) => Type::BigInt,
            Constant::Real(_) => Type::Real,
            Constant::Str(_) => Type::Str,
            Constant::Fixed { width, .. } => Type::Fixed(*width),
        }
    }
}

/// Binary arithmetic operators.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Comparison and equality operators.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

/// One expression node. Children are arena ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExprKind {
    Const(Constant),
    /// A symbolic variable (an *arbitrary*). Never record-typed: record
    /// arbitraries expand into `MakeRecord` over field arbitraries.
    Arbitrary(VarId),
    /// Reference to a function argument, resolved through [`Bindings`].
    Arg(ArgId),

    Not(NodeId),
    And(NodeId, NodeId),
    Or(NodeId, NodeId),

    Arith(ArithOp, NodeId, NodeId),
    Cmp(CmpOp, NodeId, NodeId),

    BitAnd(NodeId, NodeId),
    BitOr(NodeId, NodeId),
    BitXor(NodeId, NodeId),
    BitNot(NodeId),

    /// Record construction; fields sorted by name.
    MakeRecord(Vec<(String, NodeId)>),
    GetField(NodeId, String),
    WithField {
        record: NodeId,
        field: String,
        value: NodeId,
    },

    Ite(NodeId, NodeId, NodeId),
    /// Numeric conversion; the target type is the node's type.
    Cast(NodeId),

    ListEmpty,
    /// `(element, list)`: prepends an element to a sequence.
    ListCons(NodeId, NodeId),
    /// Sequence destructuring. The cons branch is built over fresh, unbound
    /// head/tail argument nodes and is opaque to the heuristic.
    ListCase {
        list: NodeId,
        empty: NodeId,
        cons: NodeId,
    },
    EmptySet,

    // Operators the BDD backend rejects.
    EmptyMap,
    MapGet(NodeId, NodeId),
    MapSet(NodeId, NodeId, NodeId),
    ConstMapGet(NodeId, NodeId),
    SeqConcat(NodeId, NodeId),
    RegexMatch(NodeId),
}

impl ExprKind {
    /// A short operator name, used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            ExprKind::Const(_) => "constant",
            ExprKind::Arbitrary(_) => "arbitrary",
            ExprKind::Arg(_) => "argument",
            ExprKind::Not(_) => "not",
            ExprKind::And(..) => "and",
            ExprKind::Or(..) => "or",
            ExprKind::Arith(ArithOp::Add, ..) => "add",
            ExprKind::Arith(ArithOp::Sub, ..) => "sub",
            ExprKind::Arith(ArithOp::Mul, ..) => "mul",
            ExprKind::Arith(ArithOp::Div, ..) => "div",
            ExprKind::Arith(ArithOp::Mod, ..) => "mod",
            ExprKind::Cmp(CmpOp::Lt, ..) => "lt",
            ExprKind::Cmp(CmpOp::Le, ..) => "le",
            ExprKind::Cmp(CmpOp::Gt, ..) => "gt",
            ExprKind::Cmp(CmpOp::Ge, ..) => "ge",
            ExprKind::Cmp(CmpOp::Eq, ..) => "eq",
            ExprKind::Cmp(CmpOp::Ne, ..) => "ne",
            ExprKind::BitAnd(..) => "bitwise-and",
            ExprKind::BitOr(..) => "bitwise-or",
            ExprKind::BitXor(..) => "bitwise-xor",
            ExprKind::BitNot(_) => "bitwise-not",
            ExprKind::MakeRecord(_) => "make-record",
            ExprKind::GetField(..) => "get-field",
            ExprKind::WithField { .. } => "with-field",
            ExprKind::Ite(..) => "if-then-else",
            ExprKind::Cast(_) => "cast",
            ExprKind::ListEmpty => "list-empty",
            ExprKind::ListCons(..) => "list-cons",
            ExprKind::ListCase { .. } => "list-case",
            ExprKind::EmptySet => "empty-set",
            ExprKind::EmptyMap => "empty-map",
            ExprKind::MapGet(..) => "map-get",
            ExprKind::MapSet(..) => "map-set",
            ExprKind::ConstMapGet(..) => "const-map-get",
            ExprKind::SeqConcat(..) => "seq-concat",
            ExprKind::RegexMatch(_) => "regex-match",
        }
    }
}

/// An expression node together with its static type.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: ExprKind,
    pub ty: Type,
}

/// Mapping from argument ids to the expressions bound to them.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    map: HashMap<ArgId, NodeId>,
}

impl Bindings {
    pub fn new() -> Self {
        Bindings { map: HashMap::new() }
    }

    pub fn bind(&mut self, arg: ArgId, node: NodeId) {
        self.map.insert(arg, node);
    }

    pub fn get(&self, arg: ArgId) -> Option<NodeId> {
        self.map.get(&arg).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Arena of hash-consed expression nodes.
///
/// The arena owns the type of every symbolic variable it allocates; variable
/// handles themselves carry no payload.
#[derive(Debug, Default)]
pub struct ExprArena {
    nodes: Vec<Node>,
    interned: HashMap<(ExprKind, Type), NodeId>,
    var_types: Vec<Type>,
    next_arg: u32,
}

impl ExprArena {
    pub fn new() -> Self {
        ExprArena::default()
    }

    /// Number of nodes allocated so far.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of symbolic variables allocated so far.
    pub fn num_vars(&self) -> usize {
        self.var_types.len()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &ExprKind {
        &self.node(id).kind
    }

    pub fn ty(&self, id: NodeId) -> &Type {
        &self.node(id).ty
    }

    /// The type of a symbolic variable allocated by this arena.
    pub fn var_type(&self, var: VarId) -> &Type {
        &self.var_types[var.index() as usize]
    }

    /// The variable behind an `Arbitrary` node, if it is one.
    pub fn var_of(&self, id: NodeId) -> Option<VarId> {
        match &self.node(id).kind {
            ExprKind::Arbitrary(var) => Some(*var),
            _ => None,
        }
    }

    fn mk_node(&mut self, kind: ExprKind, ty: Type) -> NodeId {
        let key = (kind, ty);
        if let Some(&id) = self.interned.get(&key) {
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        debug!("mk {} {} : {}", id, key.0.name(), key.1);
        self.interned.insert(key.clone(), id);
        let (kind, ty) = key;
        self.nodes.push(Node { kind, ty });
        id
    }

    // ─── Leaves ───

    pub fn constant(&mut self, value: Constant) -> NodeId {
        let ty = value.ty();
        self.mk_node(ExprKind::Const(value), ty)
    }

    pub fn lit_bool(&mut self, value: bool) -> NodeId {
        self.constant(Constant::Bool(value))
    }

    pub fn lit_int(&mut self, value: i32) -> NodeId {
        self.constant(Constant::Int(value))
    }

    pub fn lit_uint(&mut self, value: u32) -> NodeId {
        self.constant(Constant::UInt(value))
    }

    /// Allocates a fresh symbolic variable of the given type.
    ///
    /// Record types expand into a `MakeRecord` over fresh field arbitraries,
    /// recursively, so a raw `Arbitrary` leaf is never record-typed.
    pub fn arbitrary(&mut self, ty: Type) -> NodeId {
        if let Type::Record { fields, .. } = &ty {
            let fields = fields.clone();
            let entries: Vec<(String, NodeId)> = fields
                .into_iter()
                .map(|(name, field_ty)| {
                    let node = self.arbitrary(field_ty);
                    (name, node)
                })
                .collect();
            return self.mk_node(ExprKind::MakeRecord(entries), ty);
        }
        let var = VarId::new(self.var_types.len() as u32);
        self.var_types.push(ty.clone());
        self.mk_node(ExprKind::Arbitrary(var), ty)
    }

    /// Allocates a fresh argument slot and its reference node.
    pub fn argument(&mut self, ty: Type) -> (ArgId, NodeId) {
        let arg = ArgId(self.next_arg);
        self.next_arg += 1;
        let node = self.mk_node(ExprKind::Arg(arg), ty);
        (arg, node)
    }

    // ─── Logical operators ───

    pub fn not(&mut self, operand: NodeId) -> NodeId {
        assert!(self.ty(operand).is_bool(), "`not` needs a boolean operand");
        self.mk_node(ExprKind::Not(operand), Type::Bool)
    }

    pub fn and(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        assert!(self.ty(lhs).is_bool(), "`and` needs boolean operands");
        assert!(self.ty(rhs).is_bool(), "`and` needs boolean operands");
        self.mk_node(ExprKind::And(lhs, rhs), Type::Bool)
    }

    pub fn or(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        assert!(self.ty(lhs).is_bool(), "`or` needs boolean operands");
        assert!(self.ty(rhs).is_bool(), "`or` needs boolean operands");
        self.mk_node(ExprKind::Or(lhs, rhs), Type::Bool)
    }

    // ─── Arithmetic and comparisons ───

    pub fn arith(&mut self, op: ArithOp, lhs: NodeId, rhs: NodeId) -> NodeId {
        let ty = self.ty(lhs).clone();
        assert!(ty.is_numeric(), "arithmetic needs numeric operands, got {}", ty);
        assert_eq!(&ty, self.ty(rhs), "arithmetic operands must share a type");
        self.mk_node(ExprKind::Arith(op, lhs, rhs), ty)
    }

    pub fn add(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.arith(ArithOp::Add, lhs, rhs)
    }

    pub fn sub(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.arith(ArithOp::Sub, lhs, rhs)
    }

    pub fn mul(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.arith(ArithOp::Mul, lhs, rhs)
    }

    pub fn div(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.arith(ArithOp::Div, lhs, rhs)
    }

    pub fn modulo(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.arith(ArithOp::Mod, lhs, rhs)
    }

    fn ordering(&mut self, op: CmpOp, lhs: NodeId, rhs: NodeId) -> NodeId {
        let ty = self.ty(lhs).clone();
        assert!(ty.is_orderable(), "comparison needs orderable operands, got {}", ty);
        assert_eq!(&ty, self.ty(rhs), "comparison operands must share a type");
        self.mk_node(ExprKind::Cmp(op, lhs, rhs), Type::Bool)
    }

    pub fn lt(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.ordering(CmpOp::Lt, lhs, rhs)
    }

    pub fn le(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.ordering(CmpOp::Le, lhs, rhs)
    }

    pub fn gt(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.ordering(CmpOp::Gt, lhs, rhs)
    }

    pub fn ge(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.ordering(CmpOp::Ge, lhs, rhs)
    }

    /// Equality. Record-typed operands decompose structurally into a
    /// conjunction of field equalities, so coupling stays field-wise.
    pub fn eq(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        assert_eq!(self.ty(lhs), self.ty(rhs), "equality operands must share a type");
        if let Type::Record { fields, .. } = self.ty(lhs) {
            let names: Vec<String> = fields.iter().map(|(name, _)| name.clone()).collect();
            let mut conj: Option<NodeId> = None;
            for name in &names {
                let lf = self.get_field(lhs, name);
                let rf = self.get_field(rhs, name);
                let field_eq = self.eq(lf, rf);
                conj = Some(match conj {
                    None => field_eq,
                    Some(acc) => self.and(acc, field_eq),
                });
            }
            return match conj {
                Some(node) => node,
                None => self.lit_bool(true),
            };
        }
        self.mk_node(ExprKind::Cmp(CmpOp::Eq, lhs, rhs), Type::Bool)
    }

    /// Disequality; `not(eq)` for records.
    pub fn ne(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        assert_eq!(self.ty(lhs), self.ty(rhs), "disequality operands must share a type");
        if self.ty(lhs).is_record() {
            let equal = self.eq(lhs, rhs);
            return self.not(equal);
        }
        self.mk_node(ExprKind::Cmp(CmpOp::Ne, lhs, rhs), Type::Bool)
    }

    // ─── Bitwise operators ───

    fn bitwise_ty(&self, lhs: NodeId, rhs: NodeId) -> Type {
        let ty = self.ty(lhs).clone();
        assert!(ty.supports_bitwise(), "bitwise ops need fixed-width operands, got {}", ty);
        assert_eq!(&ty, self.ty(rhs), "bitwise operands must share a type");
        ty
    }

    pub fn bit_and(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        let ty = self.bitwise_ty(lhs, rhs);
        self.mk_node(ExprKind::BitAnd(lhs, rhs), ty)
    }

    pub fn bit_or(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        let ty = self.bitwise_ty(lhs, rhs);
        self.mk_node(ExprKind::BitOr(lhs, rhs), ty)
    }

    pub fn bit_xor(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        let ty = self.bitwise_ty(lhs, rhs);
        self.mk_node(ExprKind::BitXor(lhs, rhs), ty)
    }

    pub fn bit_not(&mut self, operand: NodeId) -> NodeId {
        let ty = self.ty(operand).clone();
        assert!(ty.supports_bitwise(), "bitwise ops need fixed-width operands, got {}", ty);
        self.mk_node(ExprKind::BitNot(operand), ty)
    }

    // ─── Records ───

    /// Builds a record value. Fields are sorted by name.
    pub fn record(&mut self, name: impl Into<String>, fields: Vec<(String, NodeId)>) -> NodeId {
        let field_types = fields
            .iter()
            .map(|(field, node)| (field.clone(), self.ty(*node).clone()))
            .collect();
        let ty = Type::record(name, field_types);
        let mut fields = fields;
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        self.mk_node(ExprKind::MakeRecord(fields), ty)
    }

    pub fn get_field(&mut self, record: NodeId, field: &str) -> NodeId {
        let Type::Record { fields, .. } = self.ty(record) else {
            panic!("get_field on non-record type {}", self.ty(record));
        };
        let field_ty = fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, ty)| ty.clone())
            .unwrap_or_else(|| panic!("record {} has no field `{}`", self.ty(record), field));
        self.mk_node(ExprKind::GetField(record, field.to_owned()), field_ty)
    }

    pub fn with_field(&mut self, record: NodeId, field: &str, value: NodeId) -> NodeId {
        let ty = self.ty(record).clone();
        let Type::Record { fields, .. } = &ty else {
            panic!("with_field on non-record type {}", ty);
        };
        let field_ty = fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, field_ty)| field_ty)
            .unwrap_or_else(|| panic!("record {} has no field `{}`", ty, field));
        assert_eq!(field_ty, self.ty(value), "with_field value must match the field type");
        self.mk_node(
            ExprKind::WithField { record, field: field.to_owned(), value },
            ty,
        )
    }

    // ─── Control ───

    pub fn ite(&mut self, cond: NodeId, then: NodeId, otherwise: NodeId) -> NodeId {
        assert!(self.ty(cond).is_bool(), "`ite` condition must be boolean");
        let ty = self.ty(then).clone();
        assert_eq!(&ty, self.ty(otherwise), "`ite` branches must share a type");
        self.mk_node(ExprKind::Ite(cond, then, otherwise), ty)
    }

    pub fn cast(&mut self, operand: NodeId, to: Type) -> NodeId {
        assert!(
            self.ty(operand).is_numeric() && to.is_numeric(),
            "cast is defined between numeric types only"
        );
        self.mk_node(ExprKind::Cast(operand), to)
    }

    // ─── Sequences ───

    pub fn list_empty(&mut self, elem: Type) -> NodeId {
        self.mk_node(ExprKind::ListEmpty, Type::seq(elem))
    }

    pub fn cons(&mut self, head: NodeId, tail: NodeId) -> NodeId {
        let ty = self.ty(tail).clone();
        let Type::Seq(elem) = &ty else {
            panic!("cons tail must be a sequence, got {}", ty);
        };
        assert_eq!(elem.as_ref(), self.ty(head), "cons head must match the element type");
        self.mk_node(ExprKind::ListCons(head, tail), ty)
    }

    /// Destructures a sequence. The cons branch is built by the callback
    /// over fresh head/tail argument nodes; those arguments receive no
    /// binding, so the branch has no identity outside the case.
    pub fn list_case<F>(&mut self, list: NodeId, empty: NodeId, cons: F) -> NodeId
    where
        F: FnOnce(&mut ExprArena, NodeId, NodeId) -> NodeId,
    {
        let ty = self.ty(list).clone();
        let Type::Seq(elem) = ty else {
            panic!("list_case needs a sequence, got {}", self.ty(list));
        };
        let (_, head) = self.argument((*elem).clone());
        let (_, tail) = self.argument(Type::Seq(elem));
        let cons = cons(self, head, tail);
        let result_ty = self.ty(empty).clone();
        assert_eq!(&result_ty, self.ty(cons), "list_case branches must share a type");
        self.mk_node(ExprKind::ListCase { list, empty, cons }, result_ty)
    }

    pub fn empty_set(&mut self, elem: Type) -> NodeId {
        self.mk_node(ExprKind::EmptySet, Type::set(elem))
    }

    // ─── Operators the BDD backend rejects ───

    pub fn empty_map(&mut self, key: Type, value: Type) -> NodeId {
        self.mk_node(ExprKind::EmptyMap, Type::map(key, value))
    }

    pub fn map_get(&mut self, map: NodeId, key: NodeId) -> NodeId {
        let Type::Map(key_ty, value_ty) = self.ty(map) else {
            panic!("map_get on non-map type {}", self.ty(map));
        };
        assert_eq!(key_ty.as_ref(), self.ty(key), "map_get key must match the key type");
        let value_ty = value_ty.as_ref().clone();
        self.mk_node(ExprKind::MapGet(map, key), value_ty)
    }

    pub fn map_set(&mut self, map: NodeId, key: NodeId, value: NodeId) -> NodeId {
        let ty = self.ty(map).clone();
        let Type::Map(key_ty, value_ty) = &ty else {
            panic!("map_set on non-map type {}", ty);
        };
        assert_eq!(key_ty.as_ref(), self.ty(key), "map_set key must match the key type");
        assert_eq!(value_ty.as_ref(), self.ty(value), "map_set value must match the value type");
        self.mk_node(ExprKind::MapSet(map, key, value), ty)
    }

    pub fn const_map_get(&mut self, map: NodeId, key: NodeId) -> NodeId {
        let Type::ConstMap(key_ty, value_ty) = self.ty(map) else {
            panic!("const_map_get on non-const-map type {}", self.ty(map));
        };
        assert_eq!(key_ty.as_ref(), self.ty(key), "const_map_get key must match the key type");
        let value_ty = value_ty.as_ref().clone();
        self.mk_node(ExprKind::ConstMapGet(map, key), value_ty)
    }

    pub fn seq_concat(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        let ty = self.ty(lhs).clone();
        assert!(matches!(ty, Type::Seq(_)), "seq_concat needs sequences, got {}", ty);
        assert_eq!(&ty, self.ty(rhs), "seq_concat operands must share a type");
        self.mk_node(ExprKind::SeqConcat(lhs, rhs), ty)
    }

    pub fn regex_match(&mut self, subject: NodeId) -> NodeId {
        assert_eq!(self.ty(subject), &Type::Str, "regex_match subject must be a string");
        self.mk_node(ExprKind::RegexMatch(subject), Type::Bool)
    }
}
