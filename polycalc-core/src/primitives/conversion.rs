// Type predicates and conversions between value types

use std::sync::Arc;

use num_bigint::BigInt;
use num_complex::Complex64;
use num_traits::{FromPrimitive, ToPrimitive};

use crate::builtins::{add_builtin, NUMBER_TYPES};
use crate::dispatch::UnaryDispatch;
use crate::domain::TypeDomain;
use crate::environment::{EnvironmentBuilder, SymbolDef};
use crate::error::{RuntimeError, SetupError};
use crate::tokenizer::Tokenizer;
use crate::value::{Symbol, TypeTag, TypedValue, Value};
use crate::value_parser::{self, merge_number_parts, parse_number};

use super::bool_to_int;

pub fn register(env: &mut EnvironmentBuilder) -> Result<(), SetupError> {
    let domain = Arc::clone(env.domain());

    let predicates = [
        ("isnull", TypeTag::Unit),
        ("isint", TypeTag::Int),
        ("isfloat", TypeTag::Float),
        ("isbool", TypeTag::Bool),
        ("isstr", TypeTag::Str),
        ("iscomplex", TypeTag::Complex),
        ("isobject", TypeTag::Object),
        ("iscons", TypeTag::Pair),
        ("issymbol", TypeTag::Symbol),
    ];
    for (name, tag) in predicates {
        let doc = format!("True if the value is exactly of type {}.\nUsage: {}(x)", tag, name);
        add_builtin(env, name, is_type(tag), &doc)?;
    }

    add_builtin(
        env,
        "isnumber",
        SymbolDef::function(1, 1, |domain, args| {
            Ok(vec![domain.create(NUMBER_TYPES.contains(&args[0].tag()))?])
        }),
        "True for bools, ints, floats and complex numbers.\nUsage: isnumber(x)",
    )?;

    add_builtin(
        env,
        "type",
        SymbolDef::function(1, 1, |domain, args| {
            Ok(vec![domain.create(domain.name(args[0].tag()).to_string())?])
        }),
        "Name of the value's type.\nUsage: type(x)\nExample: type(1.5) => \"float\"",
    )?;

    add_builtin(
        env,
        "bool",
        SymbolDef::function(1, 1, |domain, args| Ok(vec![domain.create(domain.truth(&args[0])?)?])),
        "Truth value of x. Fails for types without a truth rule.\nUsage: bool(x)",
    )?;

    add_builtin(
        env,
        "str",
        SymbolDef::function(1, 1, |domain, args| Ok(vec![to_str(domain, &args[0])?])),
        "String form of x: strings are unchanged, symbols give their name.\nUsage: str(x)",
    )?;

    add_builtin(
        env,
        "int",
        SymbolDef::variadic(1, to_int),
        "Integer from a number (truncating) or a string in an optional radix.\nUsage: int(x) or int(\"ff\", 16)",
    )?;

    add_builtin(
        env,
        "float",
        SymbolDef::variadic(1, to_float),
        "Float from a number or a string in an optional radix.\nUsage: float(x) or float(\"0.1\", 2)",
    )?;

    add_builtin(
        env,
        "number",
        SymbolDef::variadic(1, to_number),
        "Int or float parsed from a string (optional radix); numbers pass through.\nUsage: number(\"12.5\")",
    )?;

    add_builtin(
        env,
        "complex",
        SymbolDef::function(2, 1, |domain, args| {
            let re = domain.extract::<f64>(&args[0])?;
            let im = domain.extract::<f64>(&args[1])?;
            Ok(vec![domain.create(Complex64::new(re, im))?])
        }),
        "Complex number from real and imaginary parts.\nUsage: complex(re, im)",
    )?;

    add_builtin(
        env,
        "polar",
        SymbolDef::function(2, 1, |domain, args| {
            let r = domain.extract::<f64>(&args[0])?;
            let phase = domain.extract::<f64>(&args[1])?;
            Ok(vec![domain.create(Complex64::from_polar(r, phase))?])
        }),
        "Complex number from magnitude and phase.\nUsage: polar(r, phase)",
    )?;

    add_builtin(
        env,
        "symbol",
        SymbolDef::unary(
            UnaryDispatch::builder("symbol")
                .operation(|text: &Arc<str>| Symbol::new(Arc::clone(text)))
                .build(&domain)?,
        ),
        "Symbol named by a string.\nUsage: symbol(\"foo\") => 'foo",
    )?;

    let tokenizer = Tokenizer::new();
    add_builtin(
        env,
        "parse",
        SymbolDef::unary(
            UnaryDispatch::builder("parse")
                .raw_operation(TypeTag::Str, move |domain, value| parse(domain, &tokenizer, value))
                .build(&domain)?,
        ),
        "Value of a single literal written as a string.\nUsage: parse(\"0x1F\") => 31",
    )?;

    Ok(())
}

fn is_type(tag: TypeTag) -> SymbolDef {
    SymbolDef::function(1, 1, move |domain, args| Ok(vec![domain.create(args[0].is(tag))?]))
}

fn to_str(domain: &TypeDomain, value: &TypedValue) -> Result<TypedValue, RuntimeError> {
    match value.value() {
        Value::Str(_) => Ok(value.clone()),
        Value::Symbol(symbol) => domain.create(symbol.as_str().to_string()),
        other => domain.create(other.to_string()),
    }
}

/// The value argument plus the radix, which only applies to strings.
fn split_radix<'a>(domain: &TypeDomain, args: &'a [TypedValue]) -> Result<(&'a TypedValue, u32), RuntimeError> {
    match args {
        [value] => Ok((value, 10)),
        [value, radix] if value.is(TypeTag::Str) => {
            let radix = domain.extract::<BigInt>(radix)?;
            let radix = radix
                .to_u32()
                .filter(|r| (2..=36).contains(r))
                .ok_or_else(|| RuntimeError::Precondition(format!("radix {} is outside 2..=36", radix)))?;
            Ok((value, radix))
        }
        [_, _] => Err(RuntimeError::Precondition("a radix is only accepted with a string".to_string())),
        _ => Err(RuntimeError::StackValidation(format!(
            "expected 1 or 2 arguments, got {}",
            args.len()
        ))),
    }
}

fn parse_str(value: &TypedValue, radix: u32) -> Result<value_parser::NumberParts, RuntimeError> {
    let text = value
        .payload::<Arc<str>>()
        .ok_or_else(|| RuntimeError::Type(format!("expected str, got {}", value.tag())))?;
    parse_number(text.trim(), radix).map_err(RuntimeError::Precondition)
}

fn not_convertible(name: &str, value: &TypedValue) -> RuntimeError {
    RuntimeError::UnaryDispatch {
        operator: name.to_string(),
        operand: value.tag(),
    }
}

fn to_int(domain: &TypeDomain, args: &[TypedValue]) -> Result<TypedValue, RuntimeError> {
    let (value, radix) = split_radix(domain, args)?;
    match value.value() {
        Value::Int(_) => Ok(value.clone()),
        Value::Bool(b) => domain.create(bool_to_int(*b)),
        Value::Float(f) => {
            let truncated = BigInt::from_f64(f.trunc())
                .ok_or_else(|| RuntimeError::Arithmetic(format!("{:?} has no integer value", f)))?;
            domain.create(truncated)
        }
        Value::Str(_) => match parse_str(value, radix)? {
            (int_value, None) => domain.create(int_value),
            (_, Some(_)) => Err(RuntimeError::Precondition(format!(
                "{} has a fractional part",
                value
            ))),
        },
        _ => Err(not_convertible("int", value)),
    }
}

fn to_float(domain: &TypeDomain, args: &[TypedValue]) -> Result<TypedValue, RuntimeError> {
    let (value, radix) = split_radix(domain, args)?;
    match value.value() {
        Value::Float(_) => Ok(value.clone()),
        Value::Int(_) | Value::Bool(_) => domain.convert(value, TypeTag::Float),
        Value::Str(_) => {
            let (int_value, fraction) = parse_str(value, radix)?;
            let whole = int_value.to_f64().unwrap_or(f64::NAN);
            domain.create(whole + fraction.unwrap_or(0.0))
        }
        _ => Err(not_convertible("float", value)),
    }
}

fn to_number(domain: &TypeDomain, args: &[TypedValue]) -> Result<TypedValue, RuntimeError> {
    let (value, radix) = split_radix(domain, args)?;
    match value.value() {
        Value::Str(_) => merge_number_parts(domain, parse_str(value, radix)?),
        _ if NUMBER_TYPES.contains(&value.tag()) => Ok(value.clone()),
        _ => Err(not_convertible("number", value)),
    }
}

fn parse(domain: &TypeDomain, tokenizer: &Tokenizer, value: &TypedValue) -> Result<TypedValue, RuntimeError> {
    let text = value
        .payload::<Arc<str>>()
        .ok_or_else(|| RuntimeError::Type(format!("expected str, got {}", value.tag())))?;
    let failed = |reason: String| RuntimeError::Precondition(format!("cannot parse {}: {}", value, reason));

    let tokens = tokenizer
        .tokenize(text)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| failed(err.to_string()))?;
    match tokens.as_slice() {
        [token] if token.kind.is_value() => {
            value_parser::parse_token(domain, token).map_err(|err| failed(err.to_string()))
        }
        _ => Err(failed("expected a single literal".to_string())),
    }
}
