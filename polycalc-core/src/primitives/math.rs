// Numeric functions: rounding, roots, exponentials, integer number theory and
// complex number parts
//
// Most of these have a single float variant; ints and bools reach it through
// the domain's converters.

use num_bigint::BigInt;
use num_complex::Complex64;
use num_integer::Integer;
use num_traits::{Signed, Zero};

use crate::builtins::add_builtin;
use crate::dispatch::{BinaryDispatch, UnaryDispatch};
use crate::environment::{EnvironmentBuilder, SymbolDef};
use crate::error::{RuntimeError, SetupError};
use crate::value::TypeTag;

/// Single-argument function over floats.
pub(crate) fn float_function(
    env: &EnvironmentBuilder,
    name: &str,
    f: fn(f64) -> f64,
) -> Result<SymbolDef, SetupError> {
    let dispatch = UnaryDispatch::builder(name)
        .operation(move |v: &f64| f(*v))
        .build(env.domain())?;
    Ok(SymbolDef::unary(dispatch))
}

// Like f64::signum, but zero and NaN map to themselves
fn float_sign(value: f64) -> f64 {
    if value == 0.0 || value.is_nan() {
        value
    } else {
        value.signum()
    }
}

pub fn register(env: &mut EnvironmentBuilder) -> Result<(), SetupError> {
    let domain = std::sync::Arc::clone(env.domain());

    add_builtin(
        env,
        "isnan",
        SymbolDef::unary(UnaryDispatch::builder("isnan").operation(|v: &f64| v.is_nan()).build(&domain)?),
        "True if x is not a number.\nUsage: isnan(x)",
    )?;

    add_builtin(
        env,
        "isinf",
        SymbolDef::unary(UnaryDispatch::builder("isinf").operation(|v: &f64| v.is_infinite()).build(&domain)?),
        "True if x is positive or negative infinity.\nUsage: isinf(x)",
    )?;

    let abs = UnaryDispatch::builder("abs")
        .raw_operation(TypeTag::Bool, |_, v| Ok(v.clone()))
        .operation(|v: &BigInt| v.abs())
        .operation(|v: &f64| v.abs())
        .operation(|v: &Complex64| v.norm())
        .build(&domain)?;
    add_builtin(
        env,
        "abs",
        SymbolDef::unary(abs),
        "Absolute value; the magnitude for complex numbers.\nUsage: abs(x)\nExample: abs(3 + 4 * I) => 5.0",
    )?;

    let sqrt = float_function(env, "sqrt", f64::sqrt)?;
    add_builtin(env, "sqrt", sqrt, "Square root.\nUsage: sqrt(x)\nExample: sqrt(16) => 4.0")?;

    for (name, round, doc) in [
        ("floor", f64::floor as fn(f64) -> f64, "Largest integer not greater than x.\nUsage: floor(x)"),
        ("ceil", f64::ceil, "Smallest integer not less than x.\nUsage: ceil(x)"),
    ] {
        let dispatch = UnaryDispatch::builder(name)
            .raw_operation(TypeTag::Int, |_, v| Ok(v.clone()))
            .raw_operation(TypeTag::Bool, |_, v| Ok(v.clone()))
            .operation(move |v: &f64| round(*v))
            .build(&domain)?;
        add_builtin(env, name, SymbolDef::unary(dispatch), doc)?;
    }

    let exp = UnaryDispatch::builder("exp")
        .operation(|v: &f64| v.exp())
        .operation(|v: &Complex64| v.exp())
        .build(&domain)?;
    add_builtin(env, "exp", SymbolDef::unary(exp), "e raised to the power x.\nUsage: exp(x)")?;

    let ln = UnaryDispatch::builder("ln")
        .operation(|v: &f64| v.ln())
        .operation(|v: &Complex64| v.ln())
        .build(&domain)?;
    add_builtin(env, "ln", SymbolDef::unary(ln), "Natural logarithm.\nUsage: ln(x)")?;

    let sgn = UnaryDispatch::builder("sgn")
        .operation(|v: &BigInt| v.signum())
        .operation(|v: &f64| float_sign(*v))
        .build(&domain)?;
    add_builtin(env, "sgn", SymbolDef::unary(sgn), "Sign of x: -1, 0 or 1.\nUsage: sgn(x)")?;

    add_builtin(
        env,
        "modpow",
        SymbolDef::function(3, 1, |domain, args| {
            let base = domain.extract::<BigInt>(&args[0])?;
            let exponent = domain.extract::<BigInt>(&args[1])?;
            let modulus = domain.extract::<BigInt>(&args[2])?;
            if exponent.is_negative() {
                return Err(RuntimeError::Arithmetic("modpow exponent must not be negative".to_string()));
            }
            if modulus.is_zero() {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok(vec![domain.create(base.modpow(&exponent, &modulus))?])
        }),
        "Modular exponentiation.\nUsage: modpow(base, exponent, modulus)\nExample: modpow(4, 13, 497) => 445",
    )?;

    let gcd = BinaryDispatch::builder("gcd")
        .operation(|l: &BigInt, r: &BigInt| l.gcd(r))
        .build(&domain)?;
    add_builtin(
        env,
        "gcd",
        SymbolDef::binary(gcd),
        "Greatest common divisor.\nUsage: gcd(a, b)\nExample: gcd(12, 18) => 6",
    )?;

    register_complex_parts(env)
}

fn register_complex_parts(env: &mut EnvironmentBuilder) -> Result<(), SetupError> {
    let domain = std::sync::Arc::clone(env.domain());

    let re = UnaryDispatch::builder("re")
        .operation(|v: &f64| *v)
        .operation(|v: &Complex64| v.re)
        .build(&domain)?;
    add_builtin(env, "re", SymbolDef::unary(re), "Real part.\nUsage: re(z)")?;

    let im = UnaryDispatch::builder("im")
        .operation(|_: &f64| 0.0)
        .operation(|v: &Complex64| v.im)
        .build(&domain)?;
    add_builtin(env, "im", SymbolDef::unary(im), "Imaginary part.\nUsage: im(z)")?;

    let phase = UnaryDispatch::builder("phase")
        .operation(|v: &f64| Complex64::new(*v, 0.0).arg())
        .operation(|v: &Complex64| v.arg())
        .build(&domain)?;
    add_builtin(env, "phase", SymbolDef::unary(phase), "Argument (angle) of z in radians.\nUsage: phase(z)")?;

    let conj = UnaryDispatch::builder("conj")
        .operation(|v: &f64| Complex64::new(*v, 0.0))
        .operation(|v: &Complex64| v.conj())
        .build(&domain)?;
    add_builtin(env, "conj", SymbolDef::unary(conj), "Complex conjugate.\nUsage: conj(z)")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::error::RuntimeError;
    use crate::primitives::test_support::{fails, show};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_float_predicates() {
        assert_eq!(show("isnan(NAN)"), "true");
        assert_eq!(show("isnan(1)"), "false");
        assert_eq!(show("isinf(-INF)"), "true");
    }

    #[test]
    fn test_abs() {
        assert_eq!(show("abs(-5)"), "5");
        assert_eq!(show("abs(-2.5)"), "2.5");
        assert_eq!(show("abs(3 + 4 * I)"), "5.0");
        assert_eq!(show("abs(true)"), "true");
    }

    #[test]
    fn test_roots_and_rounding() {
        assert_eq!(show("sqrt(16)"), "4.0");
        assert_eq!(show("floor(2.7)"), "2.0");
        assert_eq!(show("ceil(2.1)"), "3.0");
        assert_eq!(show("floor(7)"), "7");
        assert!(matches!(fails("sqrt(\"x\")").root_cause(), RuntimeError::UnaryDispatch { .. }));
    }

    #[test]
    fn test_exp_ln() {
        assert_eq!(show("exp(0)"), "1.0");
        assert_eq!(show("ln(1)"), "0.0");
        assert_eq!(show("exp(0 * I)"), "1.0+0.0I");
    }

    #[test]
    fn test_sign() {
        assert_eq!(show("sgn(-12)"), "-1");
        assert_eq!(show("sgn(0)"), "0");
        assert_eq!(show("sgn(2.5)"), "1.0");
        assert_eq!(show("sgn(0.0)"), "0.0");
        assert_eq!(show("sgn(true)"), "1");
    }

    #[test]
    fn test_number_theory() {
        assert_eq!(show("modpow(4, 13, 497)"), "445");
        assert_eq!(show("gcd(12, 18)"), "6");
        assert!(matches!(fails("modpow(2, 3, 0)").root_cause(), RuntimeError::DivisionByZero));
        assert!(matches!(fails("modpow(2, -1, 5)").root_cause(), RuntimeError::Arithmetic(_)));
        assert!(matches!(fails("gcd(1.5, 3)").root_cause(), RuntimeError::Dispatch { .. }));
    }

    #[test]
    fn test_complex_parts() {
        assert_eq!(show("re(1 + 2 * I)"), "1.0");
        assert_eq!(show("im(1 + 2 * I)"), "2.0");
        assert_eq!(show("im(3)"), "0.0");
        assert_eq!(show("conj(1 + 2 * I)"), "1.0-2.0I");
        assert_eq!(show("phase(1)"), "0.0");
        assert_eq!(show("phase(I)"), format!("{:?}", std::f64::consts::FRAC_PI_2));
    }
}
