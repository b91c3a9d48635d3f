// Logical operators - truthiness based, work on every type with a truth rule
//
// `&&` and `||` return one of their operands rather than a bool, so
// `0 || "default"` is `"default"`.

use crate::error::SetupError;
use crate::operators::{
    BinaryOperator, BinaryOperatorBuilder, OperatorDictionaryBuilder, UnaryOperator, UnaryOperatorBuilder,
    PRECEDENCE_LOGIC,
};

pub fn register(ops: &mut OperatorDictionaryBuilder) -> Result<(), SetupError> {
    ops.register_unary(not())?;
    ops.register_binary(and())?;
    ops.register_binary(or())?;
    ops.register_binary(xor())?;
    Ok(())
}

// Logical not: ( a -- !truthy(a) )
fn not() -> UnaryOperatorBuilder {
    UnaryOperator::builder("!")
        .dispatch(|d| d.default_operation(|domain, operand| domain.create(!domain.truth(operand)?)))
}

// Logical and: ( a b -- b if a is truthy, else a )
fn and() -> BinaryOperatorBuilder {
    BinaryOperator::builder("&&", PRECEDENCE_LOGIC).dispatch(|d| {
        d.default_operation(|domain, left, right| {
            Ok(if domain.truth(left)? { right.clone() } else { left.clone() })
        })
    })
}

// Logical or: ( a b -- a if a is truthy, else b )
fn or() -> BinaryOperatorBuilder {
    BinaryOperator::builder("||", PRECEDENCE_LOGIC).dispatch(|d| {
        d.default_operation(|domain, left, right| {
            Ok(if domain.truth(left)? { left.clone() } else { right.clone() })
        })
    })
}

// Logical xor: ( a b -- truthy(a) != truthy(b) )
fn xor() -> BinaryOperatorBuilder {
    BinaryOperator::builder("^^", PRECEDENCE_LOGIC).dispatch(|d| {
        d.default_operation(|domain, left, right| domain.create(domain.truth(left)? != domain.truth(right)?))
    })
}

#[cfg(test)]
mod tests {
    use crate::error::RuntimeError;
    use crate::primitives::test_support::{fails, show};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_not() {
        assert_eq!(show("!0"), "true");
        assert_eq!(show("!\"x\""), "false");
        assert_eq!(show("!null"), "true");
        assert_eq!(show("!!2.5"), "true");
    }

    #[test]
    fn test_and_or_return_operands() {
        assert_eq!(show("0 || \"default\""), "\"default\"");
        assert_eq!(show("3 || \"default\""), "3");
        assert_eq!(show("0 && 5"), "0");
        assert_eq!(show("1 && 5"), "5");
        assert_eq!(show("(1 : null) && 2"), "2");
    }

    #[test]
    fn test_xor() {
        assert_eq!(show("true ^^ 0"), "true");
        assert_eq!(show("1 ^^ \"a\""), "false");
    }

    #[test]
    fn test_undetermined_truth() {
        assert!(matches!(fails("!'foo"), RuntimeError::Precondition(_)));
        assert!(matches!(fails("'foo && 1"), RuntimeError::Precondition(_)));
    }
}
