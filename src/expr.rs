use crate::literal::Literal;
use crate::stmt::Stmt;
use crate::token::Token;

/// Identifies an individual variable-use AST node (`Variable`, `Assign`,
/// `This`, `Super`) so the resolver's depth table can be keyed by something
/// other than structural equality, which would conflate two distinct uses of
/// the same name at different points in the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

#[derive(Debug, Clone)]
pub struct BinaryData {
    pub left: Box<Expr>,
    pub operator: Token,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct GroupingData {
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct UnaryData {
    pub operator: Token,
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct VariableData {
    pub id: NodeId,
    pub name: Token,
}

#[derive(Debug, Clone)]
pub struct AssignData {
    pub id: NodeId,
    pub name: Token,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct LogicalData {
    pub left: Box<Expr>,
    pub operator: Token,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct CallData {
    pub callee: Box<Expr>,
    pub paren: Token,
    pub arguments: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct GetData {
    pub object: Box<Expr>,
    pub name: Token,
}

#[derive(Debug, Clone)]
pub struct SetData {
    pub object: Box<Expr>,
    pub name: Token,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct ThisData {
    pub id: NodeId,
    pub keyword: Token,
}

#[derive(Debug, Clone)]
pub struct SuperData {
    pub id: NodeId,
    pub keyword: Token,
    pub method: Token,
}

/// An anonymous function: `fun (params) { body }` used as an expression
/// rather than bound to a name by a `fun` declaration. Captures its
/// defining environment as a closure, same as a named function.
#[derive(Debug, Clone)]
pub struct FunctionData {
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

/// A tagged sum of every expression shape the parser produces. Exhaustive
/// matching over this enum replaces a visitor-trait dispatch surface.
#[derive(Debug, Clone)]
pub enum Expr {
    Binary(BinaryData),
    Grouping(GroupingData),
    Literal(Literal),
    Unary(UnaryData),
    Variable(VariableData),
    Assign(AssignData),
    Logical(LogicalData),
    Call(CallData),
    Get(GetData),
    Set(SetData),
    This(ThisData),
    Super(SuperData),
    Function(FunctionData),
}
