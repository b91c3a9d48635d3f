// Error types for every phase: setup, compilation and execution.

use thiserror::Error;

use crate::tokenizer::SourcePos;
use crate::value::TypeTag;

/// Raised while assembling domains, operator tables and environments.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("type {0} registered twice")]
    DuplicateType(TypeTag),
    #[error("type {0} is not registered in the domain")]
    UnregisteredType(TypeTag),
    #[error("coercion rule {left} -> {right} has no converter")]
    MissingConverter { left: TypeTag, right: TypeTag },
    #[error("operator '{0}' registered twice")]
    DuplicateOperator(String),
    #[error("operator '{0}' is not registered")]
    UnknownOperator(String),
    #[error("'{name}' already has a variant for ({left}, {right})")]
    DuplicateVariant {
        name: String,
        left: TypeTag,
        right: TypeTag,
    },
    #[error("component belongs to a different type domain")]
    DomainMismatch,
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("unrecognized input at {pos}: '{remainder}'")]
    Tokenize { pos: SourcePos, remainder: String },
    #[error("unexpected token '{token}' at {pos}")]
    UnexpectedToken { token: String, pos: SourcePos },
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unbalanced brackets at {pos}")]
    UnbalancedBrackets { pos: SourcePos },
    #[error("unknown symbol '{0}'")]
    UnknownSymbol(String),
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),
    #[error("'{name}' expects {expected} argument(s), got {actual}")]
    Arity {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("invalid literal '{text}': {reason}")]
    InvalidLiteral { text: String, reason: String },
    #[error("cannot quote '{token}' at {pos}")]
    InvalidQuote { token: String, pos: SourcePos },
    #[error("literal cannot be represented in this domain")]
    Literal(#[source] RuntimeError),
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("no variant of '{operator}' accepts ({left}, {right})")]
    Dispatch {
        operator: String,
        left: TypeTag,
        right: TypeTag,
    },
    #[error("no variant of '{operator}' accepts {operand}")]
    UnaryDispatch { operator: String, operand: TypeTag },
    #[error("precondition failed: {0}")]
    Precondition(String),
    #[error("stack validation failed: {0}")]
    StackValidation(String),
    #[error("stack underflow: {context} needs {needed} value(s), stack has {available}")]
    StackUnderflow {
        context: String,
        needed: usize,
        available: usize,
    },
    #[error("failed to convert {from} to {to}")]
    Conversion {
        from: TypeTag,
        to: TypeTag,
        #[source]
        source: Box<RuntimeError>,
    },
    #[error("no converter from {from} to {to}")]
    NoConverter { from: TypeTag, to: TypeTag },
    #[error("values from different type domains cannot be combined")]
    DomainMismatch,
    #[error("type {0} is not registered in this domain")]
    UnknownType(TypeTag),
    #[error("type error: {0}")]
    Type(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("arithmetic error: {0}")]
    Arithmetic(String),
    #[error("no member '{member}' on {object}")]
    NoMember { object: String, member: String },
    #[error("error while executing '{name}'")]
    Symbol {
        name: String,
        #[source]
        source: Box<RuntimeError>,
    },
    #[error("calculator is faulted; reset before executing again")]
    Faulted,
}

/// Umbrella for callers that compile and execute in one go.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl RuntimeError {
    /// Walks `Symbol` and `Conversion` wrappers down to the innermost cause.
    pub fn root_cause(&self) -> &RuntimeError {
        match self {
            RuntimeError::Symbol { source, .. } | RuntimeError::Conversion { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_cause_chain() {
        let err = RuntimeError::Symbol {
            name: "sqrt".into(),
            source: Box::new(RuntimeError::Conversion {
                from: TypeTag::Str,
                to: TypeTag::Float,
                source: Box::new(RuntimeError::Type("not a number".into())),
            }),
        };
        assert_eq!(err.to_string(), "error while executing 'sqrt'");
        let cause = err.source().map(|e| e.to_string());
        assert_eq!(cause.as_deref(), Some("failed to convert str to float"));
        assert!(matches!(err.root_cause(), RuntimeError::Type(_)));
    }

    #[test]
    fn test_display_messages() {
        let err = RuntimeError::Dispatch {
            operator: "*".into(),
            left: TypeTag::Str,
            right: TypeTag::Float,
        };
        assert_eq!(err.to_string(), "no variant of '*' accepts (str, float)");
    }
}
