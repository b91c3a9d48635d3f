// Bitwise operators on arbitrary precision integers (two's complement semantics)

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive};

use crate::error::{RuntimeError, SetupError};
use crate::operators::{
    BinaryOperator, BinaryOperatorBuilder, OperatorDictionaryBuilder, UnaryOperator, UnaryOperatorBuilder,
    PRECEDENCE_BITWISE, PRECEDENCE_SHIFT,
};

use super::bool_to_int;

/// Largest shift distance accepted by `<<` and `>>`.
pub const MAX_SHIFT: usize = 1 << 20;

pub fn register(ops: &mut OperatorDictionaryBuilder) -> Result<(), SetupError> {
    ops.register_unary(complement())?;
    ops.register_binary(bitwise("&", |l, r| l & r))?;
    ops.register_binary(bitwise("|", |l, r| l | r))?;
    ops.register_binary(bitwise("^", |l, r| l ^ r))?;
    ops.register_binary(shift("<<", Direction::Left))?;
    ops.register_binary(shift(">>", Direction::Right))?;
    Ok(())
}

// Bitwise not: ( n -- ~n )
fn complement() -> UnaryOperatorBuilder {
    UnaryOperator::builder("~").dispatch(|d| {
        d.operation(|v: &bool| bool_to_int(!*v))
            .operation(|v: &BigInt| !v)
    })
}

// Binary bitwise operation: ( a b -- a op b ), bools count as 0/1
fn bitwise(id: &str, op: fn(&BigInt, &BigInt) -> BigInt) -> BinaryOperatorBuilder {
    BinaryOperator::builder(id, PRECEDENCE_BITWISE).dispatch(|d| {
        d.operation(move |l: &BigInt, r: &BigInt| op(l, r))
            .operation(move |l: &bool, r: &bool| op(&bool_to_int(*l), &bool_to_int(*r)))
    })
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Left,
    Right,
}

fn shift_by(value: &BigInt, distance: &BigInt, direction: Direction) -> Result<BigInt, RuntimeError> {
    let amount = distance
        .abs()
        .to_usize()
        .filter(|n| *n <= MAX_SHIFT)
        .ok_or_else(|| RuntimeError::Arithmetic(format!("shift distance {} is too large", distance)))?;
    // A negative distance shifts the other way
    let left = matches!(direction, Direction::Left) != distance.is_negative();
    Ok(if left { value << amount } else { value >> amount })
}

// Shift: ( n distance -- shifted )
fn shift(id: &str, direction: Direction) -> BinaryOperatorBuilder {
    BinaryOperator::builder(id, PRECEDENCE_SHIFT).dispatch(|d| {
        d.try_operation(move |l: &BigInt, r: &BigInt| shift_by(l, r, direction))
            .try_operation(move |l: &bool, r: &bool| shift_by(&bool_to_int(*l), &bool_to_int(*r), direction))
    })
}

#[cfg(test)]
mod tests {
    use crate::error::RuntimeError;
    use crate::primitives::test_support::{fails, show};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bitwise_ops() {
        assert_eq!(show("12 & 10"), "8");
        assert_eq!(show("12 | 10"), "14");
        assert_eq!(show("12 ^ 10"), "6");
        assert_eq!(show("-1 & 255"), "255");
        assert_eq!(show("true | false"), "1");
    }

    #[test]
    fn test_complement() {
        assert_eq!(show("~0"), "-1");
        assert_eq!(show("~5"), "-6");
        assert_eq!(show("~true"), "0");
        assert_eq!(show("~false"), "1");
    }

    #[test]
    fn test_shifts() {
        assert_eq!(show("1 << 100"), "1267650600228229401496703205376");
        assert_eq!(show("256 >> 4"), "16");
        assert_eq!(show("-16 >> 2"), "-4");
        assert_eq!(show("1 << -1"), "0");
        assert!(matches!(fails("1 << 10000000000"), RuntimeError::Arithmetic(_)));
    }

    #[test]
    fn test_floats_rejected() {
        assert!(matches!(fails("1.5 & 1"), RuntimeError::Dispatch { .. }));
        assert!(matches!(fails("~1.5"), RuntimeError::UnaryDispatch { .. }));
    }
}
