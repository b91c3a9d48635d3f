// The standard calculator: type domain, operator table and global symbols.

use std::sync::Arc;

use num_bigint::BigInt;
use num_complex::Complex64;
use num_traits::{ToPrimitive, Zero};

use crate::domain::{Coercion, TypeDomain};
use crate::engine::Engine;
use crate::environment::{Environment, EnvironmentBuilder, SymbolDef};
use crate::error::{RuntimeError, SetupError};
use crate::operators::OperatorDictionary;
use crate::primitives;
use crate::value::{IntoValue, TypeTag, Unit};

pub const SYMBOL_NULL: &str = "null";
pub const SYMBOL_TRUE: &str = "true";
pub const SYMBOL_FALSE: &str = "false";

/// Types that count as numbers for `isnumber` and unary `+`.
pub const NUMBER_TYPES: [TypeTag; 4] = [TypeTag::Bool, TypeTag::Int, TypeTag::Float, TypeTag::Complex];

// Helper to add a builtin with its documentation
pub(crate) fn add_builtin(
    env: &mut EnvironmentBuilder,
    name: &str,
    definition: SymbolDef,
    doc: &str,
) -> Result<(), SetupError> {
    env.define(name, definition, Some(doc))?;
    Ok(())
}

fn int_to_float(value: &BigInt) -> f64 {
    value.to_f64().unwrap_or(if value.is_zero() { 0.0 } else { f64::NAN })
}

pub fn standard_domain() -> Result<TypeDomain, SetupError> {
    let mut domain = TypeDomain::builder();

    domain
        .register_type(TypeTag::Unit, "<null>")
        .register_type(TypeTag::Int, "int")
        .register_type(TypeTag::Float, "float")
        .register_type(TypeTag::Bool, "bool")
        .register_type(TypeTag::Str, "str")
        .register_type(TypeTag::Complex, "complex")
        .register_type(TypeTag::Object, "object")
        .register_type(TypeTag::Pair, "pair")
        .register_type(TypeTag::Symbol, "symbol");

    // Widening conversions: bool -> int -> float -> complex
    domain
        .register_converter::<bool, BigInt, _>(|b| BigInt::from(*b as u8))
        .register_converter::<bool, f64, _>(|b| if *b { 1.0 } else { 0.0 })
        .register_converter::<bool, Complex64, _>(|b| Complex64::new(if *b { 1.0 } else { 0.0 }, 0.0))
        .register_converter::<BigInt, f64, _>(int_to_float)
        .register_converter::<BigInt, Complex64, _>(|i| Complex64::new(int_to_float(i), 0.0))
        .register_converter::<f64, Complex64, _>(|f| Complex64::new(*f, 0.0));

    domain
        .register_symmetric_coercion_rule(TypeTag::Bool, TypeTag::Int, Coercion::ToRight)
        .register_symmetric_coercion_rule(TypeTag::Bool, TypeTag::Float, Coercion::ToRight)
        .register_symmetric_coercion_rule(TypeTag::Bool, TypeTag::Complex, Coercion::ToRight)
        .register_symmetric_coercion_rule(TypeTag::Int, TypeTag::Float, Coercion::ToRight)
        .register_symmetric_coercion_rule(TypeTag::Int, TypeTag::Complex, Coercion::ToRight)
        .register_symmetric_coercion_rule(TypeTag::Float, TypeTag::Complex, Coercion::ToRight);

    domain
        .register_truth_evaluator::<bool, _>(|b| *b)
        .register_truth_evaluator::<BigInt, _>(|i| !i.is_zero())
        .register_truth_evaluator::<f64, _>(|f| *f != 0.0)
        .register_truth_evaluator::<Complex64, _>(|c| !c.is_zero())
        .register_truth_evaluator::<Arc<str>, _>(|s| !s.is_empty())
        .register_always_false(TypeTag::Unit)
        .register_always_true(TypeTag::Object)
        .register_always_true(TypeTag::Pair);

    domain.build()
}

pub fn standard_operators(domain: &Arc<TypeDomain>) -> Result<OperatorDictionary, SetupError> {
    let mut ops = OperatorDictionary::builder(domain);
    primitives::arithmetic::register(&mut ops)?;
    primitives::logic::register(&mut ops)?;
    primitives::bitwise::register(&mut ops)?;
    primitives::comparison::register(&mut ops)?;
    primitives::structure::register(&mut ops)?;
    ops.build()
}

fn add_constant(
    env: &mut EnvironmentBuilder,
    name: &str,
    value: impl IntoValue,
    doc: &str,
) -> Result<(), SetupError> {
    let value = env.domain().create(value).map_err(|err| match err {
        RuntimeError::UnknownType(tag) => SetupError::UnregisteredType(tag),
        _ => SetupError::DomainMismatch,
    })?;
    add_builtin(env, name, SymbolDef::constant(value), doc)
}

fn register_constants(env: &mut EnvironmentBuilder) -> Result<(), SetupError> {
    add_constant(env, SYMBOL_NULL, Unit, "The unit value; also the empty list.")?;
    add_constant(env, SYMBOL_TRUE, true, "Boolean true.")?;
    add_constant(env, SYMBOL_FALSE, false, "Boolean false.")?;
    add_constant(env, "E", std::f64::consts::E, "Euler's number.")?;
    add_constant(env, "PI", std::f64::consts::PI, "Ratio of a circle's circumference to its diameter.")?;
    add_constant(env, "NAN", f64::NAN, "Floating point not-a-number.")?;
    add_constant(env, "INF", f64::INFINITY, "Positive floating point infinity.")?;
    add_constant(env, "I", Complex64::new(0.0, 1.0), "The imaginary unit.")?;
    Ok(())
}

pub fn standard_environment(
    domain: &Arc<TypeDomain>,
    operators: &OperatorDictionary,
) -> Result<Environment, SetupError> {
    let mut env = Environment::builder(domain);
    register_constants(&mut env)?;
    primitives::conversion::register(&mut env)?;
    primitives::math::register(&mut env)?;
    #[cfg(feature = "advanced_math")]
    primitives::trig::register(&mut env)?;
    primitives::aggregate::register(&mut env, operators)?;
    primitives::lists::register(&mut env)?;
    primitives::record::register(&mut env)?;
    primitives::stack::register(&mut env)?;
    Ok(env.build())
}

/// Everything wired together: the calculator most callers want.
pub fn standard_engine() -> Result<Engine, SetupError> {
    let domain = Arc::new(standard_domain()?);
    let operators = standard_operators(&domain)?;
    let environment = standard_environment(&domain, &operators)?;
    Engine::new(domain, Arc::new(operators), Arc::new(environment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Symbol, Value};

    #[test]
    fn test_standard_domain_names() {
        let domain = standard_domain().unwrap();
        assert_eq!(domain.name(TypeTag::Unit), "<null>");
        assert_eq!(domain.name(TypeTag::Pair), "pair");
        assert_eq!(domain.tags().count(), 9);
    }

    #[test]
    fn test_coercions_widen() {
        let domain = standard_domain().unwrap();
        assert_eq!(domain.coercion_target(TypeTag::Bool, TypeTag::Int), Some(TypeTag::Int));
        assert_eq!(domain.coercion_target(TypeTag::Float, TypeTag::Int), Some(TypeTag::Float));
        assert_eq!(domain.coercion_target(TypeTag::Complex, TypeTag::Bool), Some(TypeTag::Complex));
        assert_eq!(domain.coercion_target(TypeTag::Str, TypeTag::Int), None);
    }

    #[test]
    fn test_truth_rules() {
        let domain = standard_domain().unwrap();
        let truthy = |value: Value| domain.is_truthy(&domain.create(value).unwrap());
        assert_eq!(truthy(Value::Unit), Some(false));
        assert_eq!(truthy(Value::Str("".into())), Some(false));
        assert_eq!(truthy(Value::Float(0.5)), Some(true));
        assert_eq!(truthy(Value::Complex(Complex64::new(0.0, 0.0))), Some(false));
        assert_eq!(truthy(Value::Symbol(Symbol::new("x"))), None);
    }

    #[test]
    fn test_standard_engine_builds() {
        let engine = standard_engine().unwrap();
        let env = engine.environment();
        for name in ["null", "true", "false", "PI", "sqrt", "list", "record", "dup"] {
            assert!(env.get(name).is_some(), "missing {}", name);
        }
        assert!(engine.operators().binary("**").is_some());
        assert!(engine.operators().unary("neg").is_some());
    }
}
