//! Flat node arena contents.
//!
//! Following `tsz_parser::NodeArena`'s design, the AST is not a tree of
//! pointers but a flat arena of `Node`s addressed by `ExprId`; a `Node`'s
//! `kind` tag determines which variant of `NodeKind` is live, and
//! `semacore-check`'s dispatcher matches on it the way
//! `tsz_checker::dispatch::ExpressionDispatcher` matches on `SyntaxKind`.
//! Statements and items share the same arena as expressions; a statement
//! body is "just another node" referenced by id, which keeps cyclic
//! references (recursive generic instantiation, self-referential types)
//! expressible as plain integer equality rather than an ownership hazard.

use crate::attr::Attr;
use crate::type_node::TypeNodeId;
use semacore_common::{ExprId, Span, StringId, SymbolId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Ref,
    RefMut,
    Deref,
    Neg,
    Pos,
    Not,
    Own,
    Await,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    RemAssign,
    Is,
    Heir,
}

impl BinaryOp {
    /// The base operator a compound assignment (`+=`) dispatches to (`+`).
    #[must_use]
    pub fn compound_base(self) -> Option<BinaryOp> {
        use BinaryOp::*;
        match self {
            AddAssign => Some(Add),
            SubAssign => Some(Sub),
            MulAssign => Some(Mul),
            DivAssign => Some(Div),
            RemAssign => Some(Rem),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_compound_assign(self) -> bool {
        self.compound_base().is_some()
    }

    #[must_use]
    pub fn magic_name(self) -> Option<&'static str> {
        use BinaryOp::*;
        match self {
            Add => Some("__add"),
            Sub => Some("__sub"),
            Mul => Some("__mul"),
            Div => Some("__div"),
            Rem => Some("__rem"),
            Eq => Some("__eq"),
            Lt => Some("__lt"),
            Le => Some("__le"),
            Gt => Some("__gt"),
            Ge => Some("__ge"),
            _ => None,
        }
    }
}

/// One arm of a `compare` expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompareArm {
    /// Pattern expression: a type name, tagged-union pattern, literal, or wildcard identifier.
    pub pattern: ExprId,
    pub guard: Option<ExprId>,
    pub body: ExprId,
}

/// One arm of a `select`/`race` expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectArm {
    /// `.await()` / `.recv()` / `.send(v)` / `timeout(task, d)` / `await(task)` call expression.
    pub awaitable: ExprId,
    pub body: ExprId,
}

/// A struct-literal field initializer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldInit {
    pub name: StringId,
    pub value: ExprId,
}

/// A function/contract-method parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub name: StringId,
    pub ty: Option<TypeNodeId>,
    pub symbol: SymbolId,
}

/// A declared type parameter (`T`, `const N`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeParamDecl {
    pub name: StringId,
    pub is_const: bool,
    pub const_type: Option<TypeNodeId>,
    pub bounds: Vec<TypeNodeId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    // ---- Literals ----
    LiteralInt(i64),
    LiteralUint(u64),
    LiteralFloat(u64), // bits, for Eq/Hash
    LiteralString(StringId),
    LiteralBool(bool),
    LiteralNothing,

    // ---- Expressions ----
    Identifier(StringId),
    Group(ExprId),
    Unary { op: UnaryOp, operand: ExprId },
    Binary { op: BinaryOp, left: ExprId, right: ExprId },
    Ternary { cond: ExprId, then_branch: ExprId, else_branch: ExprId },
    Call { callee: ExprId, args: Vec<ExprId>, explicit_type_args: Vec<TypeNodeId> },
    ArrayLiteral(Vec<ExprId>),
    MapLiteral(Vec<(ExprId, ExprId)>),
    RangeLiteral { start: ExprId, end: ExprId },
    TupleLiteral(Vec<ExprId>),
    Index { base: ExprId, index: ExprId },
    Member { base: ExprId, name: StringId },
    TupleIndex { base: ExprId, index: u32 },
    Cast { base: ExprId, target: TypeNodeId },
    Compare { subject: ExprId, arms: Vec<CompareArm> },
    Select { is_race: bool, arms: Vec<SelectArm>, default: Option<ExprId> },
    AsyncBlock { body: ExprId },
    BlockingBlock { body: ExprId },
    Spawn { body: ExprId, is_local: bool },
    StructLiteral { ty: TypeNodeId, fields: Vec<FieldInit> },
    Block { stmts: Vec<ExprId>, tail: Option<ExprId> },
    TypeNodeExpr(TypeNodeId),

    // ---- Statements ----
    LetStmt { symbol: SymbolId, ty: Option<TypeNodeId>, init: Option<ExprId>, attrs: Vec<Attr> },
    ConstStmt { symbol: SymbolId, ty: Option<TypeNodeId>, init: ExprId, attrs: Vec<Attr> },
    ExprStmt(ExprId),
    ReturnStmt(Option<ExprId>),
    DropStmt(ExprId),
    IfStmt { cond: ExprId, then_branch: ExprId, else_branch: Option<ExprId> },
    WhileStmt { cond: ExprId, body: ExprId },
    ForStmt { init: Option<ExprId>, cond: Option<ExprId>, step: Option<ExprId>, body: ExprId },
    ForInStmt { binding: SymbolId, iterable: ExprId, body: ExprId },

    // ---- Items ----
    FunctionItem {
        symbol: SymbolId,
        params: Vec<Param>,
        ret: Option<TypeNodeId>,
        type_params: Vec<TypeParamDecl>,
        body: Option<ExprId>,
        is_async: bool,
        is_entrypoint: bool,
        attrs: Vec<Attr>,
    },
    StructItem {
        symbol: SymbolId,
        fields: Vec<(StringId, TypeNodeId)>,
        type_params: Vec<TypeParamDecl>,
    },
    AliasItem { symbol: SymbolId, target: TypeNodeId, type_params: Vec<TypeParamDecl> },
    UnionItem {
        symbol: SymbolId,
        members: Vec<(StringId, Vec<TypeNodeId>)>,
        type_params: Vec<TypeParamDecl>,
    },
    ContractItem {
        symbol: SymbolId,
        fields: Vec<(StringId, TypeNodeId)>,
        methods: Vec<ContractMethod>,
        type_params: Vec<TypeParamDecl>,
    },
    ExternItem { symbol: SymbolId, members: Vec<SymbolId> },
    ModuleItem { symbol: SymbolId, items: Vec<ExprId> },
    ImportItem { symbol: SymbolId },
}

/// A method signature declared inside a `contract`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractMethod {
    pub name: StringId,
    pub params: Vec<TypeNodeId>,
    pub result: TypeNodeId,
    pub is_overload_group: bool,
}

/// A node in the flat arena: a tag plus its source span.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}
