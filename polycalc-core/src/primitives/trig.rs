// Trigonometric and hyperbolic functions, angle conversion and logarithms
// in an arbitrary base. Only built with the advanced_math feature.

use crate::builtins::add_builtin;
use crate::environment::{EnvironmentBuilder, SymbolDef};
use crate::error::{RuntimeError, SetupError};

use super::math::float_function;

const FUNCTIONS: [(&str, fn(f64) -> f64, &str); 14] = [
    ("sin", f64::sin, "Sine of an angle in radians.\nUsage: sin(x)"),
    ("cos", f64::cos, "Cosine of an angle in radians.\nUsage: cos(x)"),
    ("tan", f64::tan, "Tangent of an angle in radians.\nUsage: tan(x)"),
    ("asin", f64::asin, "Arc sine, in radians.\nUsage: asin(x)"),
    ("acos", f64::acos, "Arc cosine, in radians.\nUsage: acos(x)"),
    ("atan", f64::atan, "Arc tangent, in radians.\nUsage: atan(x)"),
    ("sinh", f64::sinh, "Hyperbolic sine.\nUsage: sinh(x)"),
    ("cosh", f64::cosh, "Hyperbolic cosine.\nUsage: cosh(x)"),
    ("tanh", f64::tanh, "Hyperbolic tangent.\nUsage: tanh(x)"),
    ("asinh", f64::asinh, "Inverse hyperbolic sine.\nUsage: asinh(x)"),
    ("acosh", f64::acosh, "Inverse hyperbolic cosine.\nUsage: acosh(x)"),
    ("atanh", f64::atanh, "Inverse hyperbolic tangent.\nUsage: atanh(x)"),
    ("rad", f64::to_radians, "Degrees to radians.\nUsage: rad(x)\nExample: rad(180) => 3.141592653589793"),
    ("deg", f64::to_degrees, "Radians to degrees.\nUsage: deg(x)\nExample: deg(PI) => 180.0"),
];

pub fn register(env: &mut EnvironmentBuilder) -> Result<(), SetupError> {
    for (name, f, doc) in FUNCTIONS {
        let definition = float_function(env, name, f)?;
        add_builtin(env, name, definition, doc)?;
    }

    add_builtin(
        env,
        "atan2",
        SymbolDef::function(2, 1, |domain, args| {
            let y = domain.extract::<f64>(&args[0])?;
            let x = domain.extract::<f64>(&args[1])?;
            Ok(vec![domain.create(y.atan2(x))?])
        }),
        "Angle of the point (x, y) in radians.\nUsage: atan2(y, x)",
    )?;

    add_builtin(
        env,
        "log",
        SymbolDef::variadic(1, |domain, args| {
            let logarithm = match args {
                [value] => domain.extract::<f64>(value)?.log10(),
                [value, base] => domain.extract::<f64>(value)?.ln() / domain.extract::<f64>(base)?.ln(),
                _ => {
                    return Err(RuntimeError::StackValidation(format!(
                        "expected 1 or 2 arguments, got {}",
                        args.len()
                    )));
                }
            };
            domain.create(logarithm)
        }),
        "Logarithm, base 10 unless a base is given.\nUsage: log(x) or log(x, base)\nExample: log(8, 2) => 3.0",
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::error::RuntimeError;
    use crate::primitives::test_support::{fails, show};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_trig() {
        assert_eq!(show("sin(0)"), "0.0");
        assert_eq!(show("cos(0)"), "1.0");
        assert_eq!(show("atan2(1, 0) == PI / 2"), "true");
        assert_eq!(show("tanh(0)"), "0.0");
    }

    #[test]
    fn test_angle_conversion() {
        assert_eq!(show("abs(deg(PI) - 180) < 0.000001"), "true");
        assert_eq!(show("abs(rad(180) - PI) < 0.000001"), "true");
    }

    #[test]
    fn test_log() {
        assert_eq!(show("log(1000)"), "3.0");
        assert_eq!(show("log(8, 2)"), "3.0");
        assert!(matches!(fails("log(1, 2, 3)").root_cause(), RuntimeError::StackValidation(_)));
    }
}
