// Expression tree produced by the infix and prefix front-ends.

use std::sync::Arc;

use crate::error::CompileError;
use crate::executable::Step;
use crate::operators::{BinaryOperator, Operator, OperatorDictionary, UnaryOperator};
use crate::tokenizer::SourcePos;
use crate::value::TypedValue;

use super::CompileContext;

#[derive(Debug, Clone)]
pub struct SymbolNode {
    pub name: String,
    pub args: Vec<Node>,
    /// Written with call brackets, e.g. `f()` as opposed to `f`.
    pub bracketed: bool,
    pub explicit_args: Option<usize>,
    pub rets: Option<usize>,
    pub pos: SourcePos,
}

impl SymbolNode {
    pub fn new(name: &str, pos: SourcePos) -> Self {
        Self {
            name: name.to_string(),
            args: Vec::new(),
            bracketed: false,
            explicit_args: None,
            rets: None,
            pos,
        }
    }

    /// A plain reference such as `x`: no brackets, arguments or counts.
    pub fn is_bare(&self) -> bool {
        !self.bracketed && self.args.is_empty() && self.explicit_args.is_none() && self.rets.is_none()
    }

    fn flatten(&self, ctx: &CompileContext<'_>, out: &mut Vec<Step>) -> Result<(), CompileError> {
        let entry = ctx
            .environment
            .get(&self.name)
            .ok_or_else(|| CompileError::UnknownSymbol(self.name.clone()))?;

        let supplied = self.args.len();
        let declared = [self.explicit_args, entry.definition.fixed_args()];
        if let Some(expected) = declared.into_iter().flatten().find(|n| *n != supplied) {
            return Err(CompileError::Arity {
                name: self.name.clone(),
                expected,
                actual: supplied,
            });
        }

        for arg in &self.args {
            arg.flatten(ctx, out)?;
        }
        out.push(Step::Call {
            name: Arc::from(self.name.as_str()),
            symbol: Arc::clone(&entry.definition),
            args: Some(supplied),
            rets: self.rets,
        });
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Value(TypedValue),
    Symbol(SymbolNode),
    Unary {
        op: Arc<UnaryOperator>,
        operand: Box<Node>,
    },
    Binary {
        op: Arc<BinaryOperator>,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// `object.member`. A bare symbol on the right names the member.
    MemberAccess {
        op: Arc<BinaryOperator>,
        object: Box<Node>,
        member: Box<Node>,
    },
    /// Already-compiled steps, e.g. from a postfix group.
    Fragment(Vec<Step>),
}

impl Node {
    pub fn binary(operators: &OperatorDictionary, op: Arc<BinaryOperator>, left: Node, right: Node) -> Node {
        if operators.is_member_access(&op) {
            Node::MemberAccess {
                op,
                object: Box::new(left),
                member: Box::new(right),
            }
        } else {
            Node::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            }
        }
    }

    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Value(_) | Node::Fragment(_) => Vec::new(),
            Node::Symbol(symbol) => symbol.args.iter().collect(),
            Node::Unary { operand, .. } => vec![operand.as_ref()],
            Node::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Node::MemberAccess { object, member, .. } => vec![object.as_ref(), member.as_ref()],
        }
    }

    /// Appends this subtree's steps in postfix order, resolving symbols.
    pub fn flatten(&self, ctx: &CompileContext<'_>, out: &mut Vec<Step>) -> Result<(), CompileError> {
        match self {
            Node::Value(value) => out.push(Step::Push(value.clone())),
            Node::Symbol(symbol) => symbol.flatten(ctx, out)?,
            Node::Unary { op, operand } => {
                operand.flatten(ctx, out)?;
                out.push(Step::Apply(Operator::Unary(Arc::clone(op))));
            }
            Node::Binary { op, left, right } => {
                left.flatten(ctx, out)?;
                right.flatten(ctx, out)?;
                out.push(Step::Apply(Operator::Binary(Arc::clone(op))));
            }
            Node::MemberAccess { op, object, member } => {
                object.flatten(ctx, out)?;
                match member.as_ref() {
                    Node::Symbol(symbol) if symbol.is_bare() => {
                        let name = ctx
                            .domain
                            .create(symbol.name.clone())
                            .map_err(CompileError::Literal)?;
                        out.push(Step::Push(name));
                    }
                    other => other.flatten(ctx, out)?,
                }
                out.push(Step::Apply(Operator::Binary(Arc::clone(op))));
            }
            Node::Fragment(steps) => out.extend(steps.iter().cloned()),
        }
        Ok(())
    }
}
