// Accumulating functions over any number of arguments
//
// These are built on the operator table, so whatever `<`, `>`, `+` and `/`
// accept (including mixed types via coercion) works here too. Without a call
// site count they take two arguments; with zero arguments they return null.

use std::sync::Arc;

use num_bigint::BigInt;

use crate::builtins::add_builtin;
use crate::domain::TypeDomain;
use crate::environment::{EnvironmentBuilder, SymbolDef};
use crate::error::{RuntimeError, SetupError};
use crate::operators::{BinaryOperator, OperatorDictionary};
use crate::value::TypedValue;

pub const DEFAULT_ARGS: usize = 2;

fn operator(operators: &OperatorDictionary, id: &str) -> Result<Arc<BinaryOperator>, SetupError> {
    operators
        .binary(id)
        .cloned()
        .ok_or_else(|| SetupError::UnknownOperator(id.to_string()))
}

/// Left fold of `step` over the arguments; null when there are none.
fn accumulate<F>(domain: &TypeDomain, args: &[TypedValue], step: F) -> Result<TypedValue, RuntimeError>
where
    F: Fn(TypedValue, &TypedValue) -> Result<TypedValue, RuntimeError>,
{
    match args.split_first() {
        None => domain.unit(),
        Some((first, rest)) => rest.iter().try_fold(first.clone(), step),
    }
}

// Keeps the running result while `test(result, value)` holds
fn selector(test: Arc<BinaryOperator>) -> SymbolDef {
    SymbolDef::variadic(DEFAULT_ARGS, move |domain, args| {
        accumulate(domain, args, |result, value| {
            let keep = domain.truth(&test.apply(&result, value)?)?;
            Ok(if keep { result } else { value.clone() })
        })
    })
}

pub fn register(env: &mut EnvironmentBuilder, operators: &OperatorDictionary) -> Result<(), SetupError> {
    let less = operator(operators, "<")?;
    let greater = operator(operators, ">")?;
    let add = operator(operators, "+")?;
    let divide = operator(operators, "/")?;

    add_builtin(
        env,
        "min",
        selector(less),
        "Smallest argument.\nUsage: min(a, b, ...)\nExample: min(3, 1, 2) => 1",
    )?;
    add_builtin(
        env,
        "max",
        selector(greater),
        "Largest argument.\nUsage: max(a, b, ...)\nExample: max(3, 1, 2) => 3",
    )?;

    let sum_add = Arc::clone(&add);
    add_builtin(
        env,
        "sum",
        SymbolDef::variadic(DEFAULT_ARGS, move |domain, args| {
            accumulate(domain, args, |total, value| sum_add.apply(&total, value))
        }),
        "Sum of the arguments; also concatenates strings.\nUsage: sum(a, b, ...)",
    )?;

    add_builtin(
        env,
        "avg",
        SymbolDef::variadic(DEFAULT_ARGS, move |domain, args| {
            let total = accumulate(domain, args, |total, value| add.apply(&total, value))?;
            if args.is_empty() {
                return Ok(total);
            }
            divide.apply(&total, &domain.create(BigInt::from(args.len()))?)
        }),
        "Arithmetic mean of the arguments.\nUsage: avg(a, b, ...)\nExample: avg(1, 2) => 1.5",
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::error::RuntimeError;
    use crate::parser::Notation;
    use crate::primitives::test_support::{calculator, fails, show};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_min_max() {
        assert_eq!(show("min(3, 1, 2)"), "1");
        assert_eq!(show("max(3, 1, 2)"), "3");
        assert_eq!(show("max(1, 2.5)"), "2.5");
        assert_eq!(show("min(\"b\", \"a\")"), "\"a\"");
        assert_eq!(show("max(7)"), "7");
    }

    #[test]
    fn test_sum_avg() {
        assert_eq!(show("sum(1, 2, 3)"), "6");
        assert_eq!(show("sum(\"a\", \"b\")"), "\"ab\"");
        assert_eq!(show("avg(1, 2)"), "1.5");
        assert_eq!(show("avg(2, 4, 6)"), "4.0");
    }

    #[test]
    fn test_no_arguments_is_null() {
        assert_eq!(show("sum()"), "null");
        assert_eq!(show("avg()"), "null");
    }

    #[test]
    fn test_default_count_in_postfix() {
        let mut calc = calculator();
        let result = calc.evaluate("1 5 3 max", Notation::Postfix);
        // Two arguments by default: max(5, 3) leaves 1 below it
        assert!(matches!(result, Err(crate::error::Error::Runtime(RuntimeError::StackValidation(_)))));
        assert_eq!(calc.stack_size(), 2);
    }

    #[test]
    fn test_incomparable_arguments() {
        assert!(matches!(fails("max(1, \"a\")").root_cause(), RuntimeError::Dispatch { .. }));
    }
}
