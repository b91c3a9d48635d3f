// Operators: named dispatch tables with a precedence, plus the dictionary the
// tokenizer and front-ends consult.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::dispatch::{BinaryDispatch, BinaryDispatchBuilder, UnaryDispatch, UnaryDispatchBuilder};
use crate::domain::TypeDomain;
use crate::error::{RuntimeError, SetupError};
use crate::value::TypedValue;

// Precedence levels, loosest first
pub const PRECEDENCE_LOGIC: u32 = 0;
pub const PRECEDENCE_EQUALS: u32 = 1;
pub const PRECEDENCE_SPACESHIP: u32 = 2;
pub const PRECEDENCE_COMPARE: u32 = 3;
pub const PRECEDENCE_BITWISE: u32 = 4;
pub const PRECEDENCE_SHIFT: u32 = 5;
pub const PRECEDENCE_ADD: u32 = 6;
pub const PRECEDENCE_MULTIPLY: u32 = 7;
pub const PRECEDENCE_EXP: u32 = 8;
pub const PRECEDENCE_CONS: u32 = 9;
pub const PRECEDENCE_DOT: u32 = 10;

/// Unary operators bind tighter than any binary operator below exponentiation.
pub const PRECEDENCE_UNARY: u32 = PRECEDENCE_EXP;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

#[derive(Debug)]
pub struct BinaryOperator {
    pub id: String,
    pub precedence: u32,
    pub associativity: Associativity,
    dispatch: BinaryDispatch,
}

impl BinaryOperator {
    pub fn builder(id: &str, precedence: u32) -> BinaryOperatorBuilder {
        BinaryOperatorBuilder {
            id: id.to_string(),
            precedence,
            associativity: Associativity::Left,
            dispatch: BinaryDispatch::builder(id),
        }
    }

    pub fn apply(&self, left: &TypedValue, right: &TypedValue) -> Result<TypedValue, RuntimeError> {
        self.dispatch.apply(left, right)
    }
}

pub struct BinaryOperatorBuilder {
    id: String,
    precedence: u32,
    associativity: Associativity,
    dispatch: BinaryDispatchBuilder,
}

impl BinaryOperatorBuilder {
    pub fn right_associative(mut self) -> Self {
        self.associativity = Associativity::Right;
        self
    }

    /// Adds variants to the underlying dispatch table.
    pub fn dispatch(mut self, configure: impl FnOnce(BinaryDispatchBuilder) -> BinaryDispatchBuilder) -> Self {
        self.dispatch = configure(self.dispatch);
        self
    }

    pub fn build(self, domain: &Arc<TypeDomain>) -> Result<BinaryOperator, SetupError> {
        Ok(BinaryOperator {
            id: self.id,
            precedence: self.precedence,
            associativity: self.associativity,
            dispatch: self.dispatch.build(domain)?,
        })
    }
}

#[derive(Debug)]
pub struct UnaryOperator {
    pub id: String,
    pub precedence: u32,
    dispatch: UnaryDispatch,
}

impl UnaryOperator {
    pub fn builder(id: &str) -> UnaryOperatorBuilder {
        UnaryOperatorBuilder {
            id: id.to_string(),
            precedence: PRECEDENCE_UNARY,
            dispatch: UnaryDispatch::builder(id),
        }
    }

    pub fn apply(&self, operand: &TypedValue) -> Result<TypedValue, RuntimeError> {
        self.dispatch.apply(operand)
    }
}

pub struct UnaryOperatorBuilder {
    id: String,
    precedence: u32,
    dispatch: UnaryDispatchBuilder,
}

impl UnaryOperatorBuilder {
    pub fn dispatch(mut self, configure: impl FnOnce(UnaryDispatchBuilder) -> UnaryDispatchBuilder) -> Self {
        self.dispatch = configure(self.dispatch);
        self
    }

    pub fn build(self, domain: &Arc<TypeDomain>) -> Result<UnaryOperator, SetupError> {
        Ok(UnaryOperator {
            id: self.id,
            precedence: self.precedence,
            dispatch: self.dispatch.build(domain)?,
        })
    }
}

/// An operator resolved at compile time, ready to be applied to the stack.
#[derive(Debug, Clone)]
pub enum Operator {
    Binary(Arc<BinaryOperator>),
    Unary(Arc<UnaryOperator>),
}

impl Operator {
    pub fn id(&self) -> &str {
        match self {
            Operator::Binary(op) => &op.id,
            Operator::Unary(op) => &op.id,
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Operator::Binary(_) => 2,
            Operator::Unary(_) => 1,
        }
    }

    /// `operands` holds exactly [`Operator::arity`] values, deepest first.
    pub fn apply(&self, operands: &[TypedValue]) -> Result<TypedValue, RuntimeError> {
        match (self, operands) {
            (Operator::Binary(op), [left, right]) => op.apply(left, right),
            (Operator::Unary(op), [operand]) => op.apply(operand),
            _ => Err(RuntimeError::StackValidation(format!(
                "operator '{}' takes {} operand(s), got {}",
                self.id(),
                self.arity(),
                operands.len()
            ))),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Binary(op) => write!(f, "{}", op.id),
            // Unary variants share ids with binary ones, so mark the arity
            Operator::Unary(op) => write!(f, "{}@1", op.id),
        }
    }
}

pub struct OperatorDictionaryBuilder {
    domain: Arc<TypeDomain>,
    binary: HashMap<String, Arc<BinaryOperator>>,
    unary: HashMap<String, Arc<UnaryOperator>>,
    member_access: Option<String>,
    default_binary: Option<String>,
}

impl OperatorDictionaryBuilder {
    pub fn new(domain: &Arc<TypeDomain>) -> Self {
        Self {
            domain: Arc::clone(domain),
            binary: HashMap::new(),
            unary: HashMap::new(),
            member_access: None,
            default_binary: None,
        }
    }

    pub fn domain(&self) -> &Arc<TypeDomain> {
        &self.domain
    }

    pub fn register_binary(&mut self, op: BinaryOperatorBuilder) -> Result<Arc<BinaryOperator>, SetupError> {
        let op = Arc::new(op.build(&self.domain)?);
        if self.binary.contains_key(&op.id) {
            return Err(SetupError::DuplicateOperator(op.id.clone()));
        }
        self.binary.insert(op.id.clone(), Arc::clone(&op));
        Ok(op)
    }

    pub fn register_unary(&mut self, op: UnaryOperatorBuilder) -> Result<Arc<UnaryOperator>, SetupError> {
        let op = Arc::new(op.build(&self.domain)?);
        if self.unary.contains_key(&op.id) {
            return Err(SetupError::DuplicateOperator(op.id.clone()));
        }
        self.unary.insert(op.id.clone(), Arc::clone(&op));
        Ok(op)
    }

    /// The binary operator whose bare-symbol right operand names a member.
    pub fn set_member_access(&mut self, id: &str) -> &mut Self {
        self.member_access = Some(id.to_string());
        self
    }

    /// The binary operator implied by juxtaposition in infix, e.g. `2 x`.
    pub fn set_default_operator(&mut self, id: &str) -> &mut Self {
        self.default_binary = Some(id.to_string());
        self
    }

    pub fn build(self) -> Result<OperatorDictionary, SetupError> {
        let lookup = |id: Option<String>| -> Result<Option<Arc<BinaryOperator>>, SetupError> {
            match id {
                Some(id) => self
                    .binary
                    .get(&id)
                    .cloned()
                    .map(Some)
                    .ok_or(SetupError::UnknownOperator(id)),
                None => Ok(None),
            }
        };
        let member_access = lookup(self.member_access.clone())?;
        let default_binary = lookup(self.default_binary.clone())?;
        Ok(OperatorDictionary {
            domain: self.domain,
            binary: self.binary,
            unary: self.unary,
            member_access,
            default_binary,
        })
    }
}

#[derive(Debug)]
pub struct OperatorDictionary {
    domain: Arc<TypeDomain>,
    binary: HashMap<String, Arc<BinaryOperator>>,
    unary: HashMap<String, Arc<UnaryOperator>>,
    member_access: Option<Arc<BinaryOperator>>,
    default_binary: Option<Arc<BinaryOperator>>,
}

impl OperatorDictionary {
    pub fn builder(domain: &Arc<TypeDomain>) -> OperatorDictionaryBuilder {
        OperatorDictionaryBuilder::new(domain)
    }

    pub fn domain(&self) -> &Arc<TypeDomain> {
        &self.domain
    }

    pub fn binary(&self, id: &str) -> Option<&Arc<BinaryOperator>> {
        self.binary.get(id)
    }

    pub fn unary(&self, id: &str) -> Option<&Arc<UnaryOperator>> {
        self.unary.get(id)
    }

    pub fn is_member_access(&self, op: &BinaryOperator) -> bool {
        self.member_access
            .as_ref()
            .is_some_and(|member| std::ptr::eq(member.as_ref(), op))
    }

    pub fn default_operator(&self) -> Option<&Arc<BinaryOperator>> {
        self.default_binary.as_ref()
    }

    /// Every operator spelling, binary and unary.
    pub fn ids(&self) -> BTreeSet<&str> {
        self.binary
            .keys()
            .chain(self.unary.keys())
            .map(String::as_str)
            .collect()
    }
}
