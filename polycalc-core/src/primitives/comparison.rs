// Comparison operators
//
// Ordering is defined for ints, floats, strings and bools (false < true);
// mixed numeric operands are widened first. Equality never widens: values of
// different types are unequal, so `1 == 1.0` is false.

use std::cmp::Ordering;
use std::sync::Arc;

use num_bigint::BigInt;

use crate::dispatch::BinaryDispatchBuilder;
use crate::error::SetupError;
use crate::operators::{
    BinaryOperator, BinaryOperatorBuilder, OperatorDictionaryBuilder, PRECEDENCE_COMPARE, PRECEDENCE_EQUALS,
    PRECEDENCE_SPACESHIP,
};

pub fn register(ops: &mut OperatorDictionaryBuilder) -> Result<(), SetupError> {
    ops.register_binary(compare("<", Ordering::is_lt))?;
    ops.register_binary(compare(">", Ordering::is_gt))?;
    ops.register_binary(compare("<=", Ordering::is_le))?;
    ops.register_binary(compare(">=", Ordering::is_ge))?;
    ops.register_binary(spaceship())?;
    ops.register_binary(equality("==", true))?;
    ops.register_binary(equality("!=", false))?;
    Ok(())
}

// RUST CONCEPT: One ordering, many operators
// Every comparison maps the same per-type Ordering through a different test.
fn ordered<O, F>(d: BinaryDispatchBuilder, result: F) -> BinaryDispatchBuilder
where
    O: crate::value::IntoValue,
    F: Fn(Ordering) -> O + Copy + Send + Sync + 'static,
{
    d.operation(move |l: &BigInt, r: &BigInt| result(l.cmp(r)))
        .operation(move |l: &f64, r: &f64| result(l.total_cmp(r)))
        .operation(move |l: &Arc<str>, r: &Arc<str>| result(l.cmp(r)))
        .operation(move |l: &bool, r: &bool| result(l.cmp(r)))
}

// Comparison: ( a b -- bool )
fn compare(id: &str, test: fn(Ordering) -> bool) -> BinaryOperatorBuilder {
    BinaryOperator::builder(id, PRECEDENCE_COMPARE).dispatch(|d| ordered(d, test))
}

// Three-way comparison: ( a b -- -1|0|1 )
fn spaceship() -> BinaryOperatorBuilder {
    BinaryOperator::builder("<=>", PRECEDENCE_SPACESHIP)
        .dispatch(|d| ordered(d, |ordering| BigInt::from(ordering as i8)))
}

// Equality: ( a b -- bool ), exact type and value
fn equality(id: &str, equal: bool) -> BinaryOperatorBuilder {
    BinaryOperator::builder(id, PRECEDENCE_EQUALS)
        .dispatch(|d| d.default_operation(move |domain, left, right| domain.create((left == right) == equal)))
}

#[cfg(test)]
mod tests {
    use crate::error::RuntimeError;
    use crate::primitives::test_support::{fails, show};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ordering() {
        assert_eq!(show("1 < 2"), "true");
        assert_eq!(show("2 <= 2"), "true");
        assert_eq!(show("1.5 > 2"), "false");
        assert_eq!(show("\"abc\" < \"abd\""), "true");
        assert_eq!(show("false < true"), "true");
        assert_eq!(show("true >= 1"), "true");
    }

    #[test]
    fn test_spaceship() {
        assert_eq!(show("1 <=> 2"), "-1");
        assert_eq!(show("2 <=> 2"), "0");
        assert_eq!(show("\"b\" <=> \"a\""), "1");
        assert_eq!(show("2.5 <=> 2"), "1");
    }

    #[test]
    fn test_equality_is_exact() {
        assert_eq!(show("1 == 1"), "true");
        assert_eq!(show("1 == 1.0"), "false");
        assert_eq!(show("1 != 1.0"), "true");
        assert_eq!(show("\"a\" == \"a\""), "true");
        assert_eq!(show("(1 : 2 : null) == (1 : 2 : null)"), "true");
        assert_eq!(show("'a == 'a"), "true");
        assert_eq!(show("null == null"), "true");
    }

    #[test]
    fn test_incomparable() {
        assert!(matches!(fails("\"a\" < 1"), RuntimeError::Dispatch { .. }));
        assert!(matches!(fails("I < 1"), RuntimeError::Dispatch { .. }));
    }
}
