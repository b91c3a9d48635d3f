// Infix front-end: precedence climbing over the operator dictionary.
//
// Unary operators take their operand at the unary precedence, so `-2 ** 2`
// is `-(2 ** 2)` and `-2 * 3` is `(-2) * 3`. Two operands written next to
// each other are joined with the dictionary's default operator.

use std::sync::Arc;

use crate::error::CompileError;
use crate::operators::Associativity;
use crate::tokenizer::TokenKind;
use crate::value_parser;

use super::node::Node;
use super::{CompileContext, Notation, TokenStream, at_unit_end, parse_quoted, parse_symbol, unexpected};

pub(crate) fn parse_unit(ctx: &CompileContext<'_>, stream: &mut TokenStream<'_>) -> Result<Node, CompileError> {
    if at_unit_end(stream)? {
        return Ok(Node::Fragment(Vec::new()));
    }
    parse_expression(ctx, stream, 0)
}

fn starts_operand(kind: TokenKind) -> bool {
    kind.is_value()
        || matches!(
            kind,
            TokenKind::Symbol | TokenKind::SymbolWithArgs | TokenKind::LeftBracket | TokenKind::Modifier
        )
}

fn parse_argument(ctx: &CompileContext<'_>, stream: &mut TokenStream<'_>) -> Result<Node, CompileError> {
    parse_expression(ctx, stream, 0)
}

fn parse_expression(
    ctx: &CompileContext<'_>,
    stream: &mut TokenStream<'_>,
    min_precedence: u32,
) -> Result<Node, CompileError> {
    let mut left = parse_operand(ctx, stream)?;

    loop {
        let (kind, text) = match stream.peek()? {
            Some(token) => (token.kind, token.text.clone()),
            None => break,
        };

        let op = match kind {
            TokenKind::Operator => ctx.operators.binary(&text),
            kind if starts_operand(kind) => ctx.operators.default_operator(),
            _ => break,
        };
        let Some(op) = op.map(Arc::clone) else {
            let token = stream.expect()?;
            return Err(unexpected(&token));
        };

        if op.precedence < min_precedence {
            break;
        }
        if kind == TokenKind::Operator {
            stream.next()?;
        }

        let next_min = match op.associativity {
            Associativity::Left => op.precedence + 1,
            Associativity::Right => op.precedence,
        };
        let right = parse_expression(ctx, stream, next_min)?;
        left = Node::binary(ctx.operators, op, left, right);
    }

    Ok(left)
}

fn parse_operand(ctx: &CompileContext<'_>, stream: &mut TokenStream<'_>) -> Result<Node, CompileError> {
    let token = stream.expect()?;
    match token.kind {
        kind if kind.is_value() => Ok(Node::Value(value_parser::parse_token(ctx.domain, &token)?)),
        TokenKind::Operator => {
            let op = ctx
                .operators
                .unary(&token.text)
                .map(Arc::clone)
                .ok_or_else(|| unexpected(&token))?;
            let operand = parse_expression(ctx, stream, op.precedence)?;
            Ok(Node::Unary {
                op,
                operand: Box::new(operand),
            })
        }
        TokenKind::Modifier => parse_quoted(ctx, stream),
        TokenKind::LeftBracket => {
            let inner = parse_expression(ctx, stream, 0)?;
            stream.expect_right_bracket(&token)?;
            Ok(inner)
        }
        TokenKind::Symbol | TokenKind::SymbolWithArgs => {
            parse_symbol(ctx, stream, token, Notation::Infix, parse_argument)
        }
        _ => Err(unexpected(&token)),
    }
}

#[cfg(test)]
mod tests {
    use crate::builtins::standard_engine;
    use crate::error::CompileError;
    use crate::parser::Notation;

    fn compiled(source: &str) -> String {
        let engine = standard_engine().unwrap();
        engine.compile(source, Notation::Infix).unwrap().to_string()
    }

    fn error(source: &str) -> CompileError {
        let engine = standard_engine().unwrap();
        engine.compile(source, Notation::Infix).unwrap_err()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(compiled("1 + 2 * 3"), "1 2 3 * +");
        assert_eq!(compiled("(1 + 2) * 3"), "1 2 + 3 *");
        assert_eq!(compiled("1 < 2 && 3 != 4"), "1 2 < 3 4 != &&");
        assert_eq!(compiled("1 | 2 << 3"), "1 2 3 << |");
    }

    #[test]
    fn test_associativity() {
        assert_eq!(compiled("1 - 2 - 3"), "1 2 - 3 -");
        assert_eq!(compiled("1 : 2 : null"), "1 2 null : :");
        assert_eq!(compiled("2 ** 3 ** 2"), "2 3 ** 2 **");
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(compiled("-2 ** 2"), "2 2 ** -@1");
        assert_eq!(compiled("-2 * 3"), "2 -@1 3 *");
        assert_eq!(compiled("1 - -2"), "1 2 -@1 -");
        assert_eq!(compiled("!true"), "true !@1");
    }

    #[test]
    fn test_calls() {
        assert_eq!(compiled("max(1, 2, 3)"), "1 2 3 max@3");
        assert_eq!(compiled("sqrt(4) + PI"), "4 sqrt PI +");
        assert_eq!(compiled("list()"), "list@0");
    }

    #[test]
    fn test_juxtaposition_uses_default_operator() {
        assert_eq!(compiled("2 PI"), "2 PI *");
        assert_eq!(compiled("2 (3 + 4)"), "2 3 4 + *");
    }

    #[test]
    fn test_member_access_uses_name() {
        assert_eq!(compiled("record(\"a\", 1).a"), "\"a\" 1 record@2 \"a\" .");
    }

    #[test]
    fn test_errors() {
        assert!(matches!(error("(1 + 2"), CompileError::UnbalancedBrackets { .. }));
        assert!(matches!(error("1 + 2)"), CompileError::UnbalancedBrackets { .. }));
        assert!(matches!(error("1 +"), CompileError::UnexpectedEnd));
        assert!(matches!(error("* 2"), CompileError::UnexpectedToken { .. }));
        assert!(matches!(error("max(1,)"), CompileError::UnexpectedToken { .. }));
        assert!(matches!(error("nosuch(1)"), CompileError::UnknownSymbol(_)));
        assert!(matches!(
            error("sqrt(1, 2)"),
            CompileError::Arity { expected: 1, actual: 2, .. }
        ));
    }
}
