// Arithmetic operators - numeric arithmetic plus string concatenation and repetition
//
// Mixed operands are widened by the domain's coercion rules before dispatch,
// so `1 + 2.5` reaches the float variant and `true + 1` the integer one.

use std::sync::Arc;

use num_bigint::BigInt;
use num_complex::Complex64;
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::builtins::NUMBER_TYPES;
use crate::dispatch::UnaryDispatchBuilder;
use crate::error::{RuntimeError, SetupError};
use crate::operators::{
    BinaryOperator, BinaryOperatorBuilder, OperatorDictionaryBuilder, UnaryOperator, UnaryOperatorBuilder,
    PRECEDENCE_ADD, PRECEDENCE_EXP, PRECEDENCE_MULTIPLY,
};
use crate::value::Value;

use super::bool_to_int;

pub const DEFAULT_OPERATOR: &str = "*";

pub fn register(ops: &mut OperatorDictionaryBuilder) -> Result<(), SetupError> {
    ops.register_binary(add())?;
    ops.register_binary(subtract())?;
    ops.register_binary(multiply())?;
    ops.register_binary(divide())?;
    ops.register_binary(modulo())?;
    ops.register_binary(floor_divide())?;
    ops.register_binary(power())?;

    ops.register_unary(plus())?;
    ops.register_unary(negate("-"))?;
    ops.register_unary(negate("neg"))?;

    ops.set_default_operator(DEFAULT_OPERATOR);
    Ok(())
}

pub(crate) fn to_float(value: &BigInt) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

fn bool_to_float(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

fn nonzero(divisor: &BigInt) -> Result<&BigInt, RuntimeError> {
    if divisor.is_zero() {
        Err(RuntimeError::DivisionByZero)
    } else {
        Ok(divisor)
    }
}

// Addition: ( a b -- a+b )
fn add() -> BinaryOperatorBuilder {
    BinaryOperator::builder("+", PRECEDENCE_ADD).dispatch(|d| {
        d.operation(|l: &BigInt, r: &BigInt| l + r)
            .operation(|l: &f64, r: &f64| l + r)
            .operation(|l: &Complex64, r: &Complex64| l + r)
            .operation(|l: &Arc<str>, r: &Arc<str>| format!("{}{}", l, r))
            .operation(|l: &bool, r: &bool| bool_to_int(*l) + bool_to_int(*r))
    })
}

// Subtraction: ( a b -- a-b )
fn subtract() -> BinaryOperatorBuilder {
    BinaryOperator::builder("-", PRECEDENCE_ADD).dispatch(|d| {
        d.operation(|l: &BigInt, r: &BigInt| l - r)
            .operation(|l: &f64, r: &f64| l - r)
            .operation(|l: &Complex64, r: &Complex64| l - r)
            .operation(|l: &bool, r: &bool| bool_to_int(*l) - bool_to_int(*r))
    })
}

// Multiplication: ( a b -- a*b ), also ( str n -- str repeated n times )
fn multiply() -> BinaryOperatorBuilder {
    BinaryOperator::builder("*", PRECEDENCE_MULTIPLY).dispatch(|d| {
        d.operation(|l: &BigInt, r: &BigInt| l * r)
            .operation(|l: &f64, r: &f64| l * r)
            .operation(|l: &Complex64, r: &Complex64| l * r)
            .operation(|l: &bool, r: &bool| bool_to_int(*l && *r))
            .try_operation(repeat)
    })
}

/// Longest string `*` will build, in bytes.
pub const MAX_STRING_LEN: usize = 1 << 24;

/// Largest integer `**` will build, in bits.
pub const MAX_RESULT_BITS: u64 = 1 << 20;

fn repeat(text: &Arc<str>, count: &BigInt) -> Result<String, RuntimeError> {
    if count.is_negative() {
        return Ok(String::new());
    }
    count
        .to_usize()
        .filter(|n| text.len().checked_mul(*n).is_some_and(|len| len <= MAX_STRING_LEN))
        .map(|n| text.repeat(n))
        .ok_or_else(|| RuntimeError::Arithmetic(format!("cannot repeat a string {} times", count)))
}

// Division: ( a b -- a/b ), always fractional
fn divide() -> BinaryOperatorBuilder {
    BinaryOperator::builder("/", PRECEDENCE_MULTIPLY).dispatch(|d| {
        d.operation(|l: &f64, r: &f64| l / r)
            .operation(|l: &BigInt, r: &BigInt| to_float(l) / to_float(r))
            .operation(|l: &Complex64, r: &Complex64| l / r)
            .operation(|l: &bool, r: &bool| bool_to_float(*l) / bool_to_float(*r))
    })
}

// Modulo: ( a b -- a%b ), result takes the sign of the divisor for integers
fn modulo() -> BinaryOperatorBuilder {
    BinaryOperator::builder("%", PRECEDENCE_MULTIPLY).dispatch(|d| {
        d.try_operation(|l: &BigInt, r: &BigInt| Ok(l.mod_floor(nonzero(r)?)))
            .operation(|l: &f64, r: &f64| l % r)
            .try_operation(|_: &bool, r: &bool| {
                if *r {
                    Ok(BigInt::zero())
                } else {
                    Err(RuntimeError::DivisionByZero)
                }
            })
    })
}

// Floor division: ( a b -- floor(a/b) )
fn floor_divide() -> BinaryOperatorBuilder {
    BinaryOperator::builder("//", PRECEDENCE_MULTIPLY).dispatch(|d| {
        d.try_operation(|l: &BigInt, r: &BigInt| Ok(l.div_floor(nonzero(r)?)))
            .operation(|l: &f64, r: &f64| (l / r).floor())
            .try_operation(|l: &bool, r: &bool| {
                if *r {
                    Ok(bool_to_int(*l))
                } else {
                    Err(RuntimeError::DivisionByZero)
                }
            })
    })
}

// Exponentiation: ( a b -- a**b ), left-associative
fn power() -> BinaryOperatorBuilder {
    BinaryOperator::builder("**", PRECEDENCE_EXP).dispatch(|d| {
        d.try_operation(int_power)
            .operation(|l: &f64, r: &f64| l.powf(*r))
            .operation(|l: &Complex64, r: &Complex64| l.powc(*r))
            .operation(|l: &bool, r: &bool| bool_to_int(*l || !*r))
    })
}

fn int_power(base: &BigInt, exponent: &BigInt) -> Result<Value, RuntimeError> {
    if exponent.is_negative() {
        return Ok(Value::Float(to_float(base).powf(to_float(exponent))));
    }
    let too_large = || RuntimeError::Arithmetic(format!("exponent {} is too large", exponent));
    let power = exponent.to_u32().ok_or_else(too_large)?;
    // 0, 1 and -1 stay small for any exponent
    if base.bits().saturating_sub(1).saturating_mul(u64::from(power)) > MAX_RESULT_BITS {
        return Err(too_large());
    }
    Ok(Value::Int(base.pow(power)))
}

// Unary plus: ( n -- n ), numbers only
fn plus() -> UnaryOperatorBuilder {
    UnaryOperator::builder("+").dispatch(|d| {
        d.default_operation(|domain, operand| {
            if NUMBER_TYPES.contains(&operand.tag()) {
                Ok(operand.clone())
            } else {
                Err(RuntimeError::Precondition(format!(
                    "'+' expects a number, got {}",
                    domain.name(operand.tag())
                )))
            }
        })
    })
}

fn negation(d: UnaryDispatchBuilder) -> UnaryDispatchBuilder {
    d.operation(|v: &BigInt| -v)
        .operation(|v: &bool| -bool_to_int(*v))
        .operation(|v: &f64| -v)
        .operation(|v: &Complex64| -v)
}

// Negation: ( n -- -n )
fn negate(id: &str) -> UnaryOperatorBuilder {
    UnaryOperator::builder(id).dispatch(negation)
}

#[cfg(test)]
mod tests {
    use crate::error::RuntimeError;
    use crate::primitives::test_support::{fails, show};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(show("1 + 2 * 3"), "7");
        assert_eq!(show("10 - 4 - 3"), "3");
        assert_eq!(show("2 ** 100"), "1267650600228229401496703205376");
        assert_eq!(show("2 ** 3 ** 2"), "64");
        assert_eq!(show("2 ** (3 ** 2)"), "512");
    }

    #[test]
    fn test_floor_semantics() {
        assert_eq!(show("7 // 2"), "3");
        assert_eq!(show("-7 // 2"), "-4");
        assert_eq!(show("-7 % 3"), "2");
        assert_eq!(show("7.5 % 2"), "1.5");
        assert_eq!(show("7.5 // 2"), "3.0");
    }

    #[test]
    fn test_division_is_fractional() {
        assert_eq!(show("7 / 2"), "3.5");
        assert_eq!(show("1 / 0"), "inf");
        assert_eq!(show("2 ** -1"), "0.5");
    }

    #[test]
    fn test_mixed_types_are_widened() {
        assert_eq!(show("1 + 2.5"), "3.5");
        assert_eq!(show("true + 1"), "2");
        assert_eq!(show("true + true"), "2");
        assert_eq!(show("false * true"), "0");
        assert_eq!(show("1 + I"), "1.0+1.0I");
        assert_eq!(show("I * I"), "-1.0+0.0I");
    }

    #[test]
    fn test_strings() {
        assert_eq!(show("\"ab\" + \"cd\""), "\"abcd\"");
        assert_eq!(show("\"ab\" * 3"), "\"ababab\"");
        assert_eq!(show("\"ab\" * -1"), "\"\"");
        assert!(matches!(fails("\"ab\" * 1.5"), RuntimeError::Dispatch { .. }));
        assert!(matches!(fails("\"ab\" - \"b\""), RuntimeError::Dispatch { .. }));
    }

    #[test]
    fn test_unary() {
        assert_eq!(show("-5"), "-5");
        assert_eq!(show("-true"), "-1");
        assert_eq!(show("neg(2.5)"), "-2.5");
        assert_eq!(show("+3"), "3");
        assert!(matches!(fails("+\"a\""), RuntimeError::Precondition(_)));
        assert!(matches!(fails("-\"a\""), RuntimeError::UnaryDispatch { .. }));
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(fails("1 // 0"), RuntimeError::DivisionByZero));
        assert!(matches!(fails("1 % 0"), RuntimeError::DivisionByZero));
        assert!(matches!(fails("true % false"), RuntimeError::DivisionByZero));
    }

    #[test]
    fn test_result_size_limits() {
        assert!(matches!(fails("2 ** 4000000000"), RuntimeError::Arithmetic(_)));
        assert!(matches!(fails("10 ** 1000000"), RuntimeError::Arithmetic(_)));
        assert!(matches!(fails("\"ab\" * 1000000000000"), RuntimeError::Arithmetic(_)));
        assert_eq!(show("1 ** 4000000000"), "1");
        assert_eq!(show("(0 - 1) ** 4000000001"), "-1");
        assert_eq!(show("2 ** 1000000 > 0"), "true");
    }
}
