// Converts literal tokens into typed values.
//
// Number bodies are split into an integer part (arbitrary precision) and an
// optional fractional part. A literal without a fraction is an int, anything
// with a `.` is a float.

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

use crate::domain::TypeDomain;
use crate::error::{CompileError, RuntimeError};
use crate::tokenizer::{Token, TokenKind};
use crate::value::TypedValue;

/// Integer part plus optional fractional part of a parsed number.
pub type NumberParts = (BigInt, Option<f64>);

// `'` and `"` may be used as digit group separators in quoted numbers
fn is_separator(ch: char) -> bool {
    ch == '\'' || ch == '"'
}

/// Parses `[-]digits[.digits]` in the given radix.
pub fn parse_number(text: &str, radix: u32) -> Result<NumberParts, String> {
    if !(2..=36).contains(&radix) {
        return Err(format!("radix {} is outside 2..=36", radix));
    }

    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (int_part, frac_part) = match body.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (body, None),
    };

    let int_digits: String = int_part.chars().filter(|c| !is_separator(*c)).collect();
    if int_digits.is_empty() {
        return Err(format!("no digits in '{}'", text));
    }
    let mut int_value = BigInt::parse_bytes(int_digits.as_bytes(), radix)
        .ok_or_else(|| format!("'{}' is not a base {} number", text, radix))?;

    let mut fraction = None;
    if let Some(frac_part) = frac_part {
        let mut value = 0.0;
        let mut scale = 1.0;
        for ch in frac_part.chars().filter(|c| !is_separator(*c)) {
            let digit = ch
                .to_digit(radix)
                .ok_or_else(|| format!("'{}' is not a base {} digit", ch, radix))?;
            scale /= radix as f64;
            value += digit as f64 * scale;
        }
        fraction = Some(if negative { -value } else { value });
    }

    if negative {
        int_value = -int_value;
    }
    Ok((int_value, fraction))
}

/// Int when there is no fractional part, float otherwise.
pub fn merge_number_parts(domain: &TypeDomain, parts: NumberParts) -> Result<TypedValue, RuntimeError> {
    match parts {
        (int_value, None) => domain.create(int_value),
        (int_value, Some(fraction)) => {
            let whole = if int_value.is_zero() {
                0.0
            } else {
                int_value.to_f64().unwrap_or(f64::INFINITY)
            };
            domain.create(whole + fraction)
        }
    }
}

/// Parses a `radix#digits` body.
fn parse_quoted(text: &str) -> Result<NumberParts, String> {
    let (radix, digits) = text
        .split_once('#')
        .ok_or_else(|| format!("missing '#' in '{}'", text))?;
    let radix: u32 = radix
        .parse()
        .map_err(|_| format!("invalid radix '{}'", radix))?;
    parse_number(digits, radix)
}

pub fn parse_token(domain: &TypeDomain, token: &Token) -> Result<TypedValue, CompileError> {
    let parts = match token.kind {
        TokenKind::String => {
            return domain
                .create(token.text.clone())
                .map_err(CompileError::Literal);
        }
        TokenKind::DecNumber => parse_number(&token.text, 10),
        TokenKind::HexNumber => parse_number(&token.text, 16),
        TokenKind::OctNumber => parse_number(&token.text, 8),
        TokenKind::BinNumber => parse_number(&token.text, 2),
        TokenKind::QuotedNumber => parse_quoted(&token.text),
        _ => {
            return Err(CompileError::UnexpectedToken {
                token: token.to_string(),
                pos: token.pos,
            });
        }
    };

    let parts = parts.map_err(|reason| CompileError::InvalidLiteral {
        text: token.to_string(),
        reason,
    })?;
    merge_number_parts(domain, parts).map_err(CompileError::Literal)
}
