// Primitives module - operators and builtin functions of the standard calculator

// Operators
pub mod arithmetic;
pub mod bitwise;
pub mod comparison;
pub mod logic;
pub mod structure;

// Functions
pub mod aggregate;
pub mod conversion;
pub mod lists;
pub mod math;
pub mod record;
pub mod stack;

// Trigonometry, hyperbolic functions and logarithms (feature-gated)
#[cfg(feature = "advanced_math")]
pub mod trig;

use num_bigint::BigInt;

pub(crate) fn bool_to_int(value: bool) -> BigInt {
    BigInt::from(value as u8)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::builtins::standard_engine;
    use crate::calculator::Calculator;
    use crate::error::Error;
    use crate::parser::Notation;
    use crate::value::TypedValue;

    pub fn calculator() -> Calculator {
        Calculator::new(Arc::new(standard_engine().unwrap()))
    }

    pub fn eval(source: &str) -> Result<TypedValue, Error> {
        calculator().evaluate(source, Notation::Infix)
    }

    /// Printed form of an infix expression's result.
    pub fn show(source: &str) -> String {
        match eval(source) {
            Ok(value) => value.to_string(),
            Err(err) => panic!("'{}' failed: {}", source, err),
        }
    }

    /// Runtime error of a failing infix expression.
    pub fn fails(source: &str) -> crate::error::RuntimeError {
        match eval(source) {
            Ok(value) => panic!("'{}' produced {}", source, value),
            Err(Error::Runtime(err)) => err,
            Err(err) => panic!("'{}' failed outside execution: {}", source, err),
        }
    }
}
