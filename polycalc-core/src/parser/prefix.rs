// Prefix front-end: `op a b`, `(op a b c ...)` and `(f a b ...)`.
//
// Inside brackets a binary operator folds over any number of operands, left
// to right (or right to left for right-associative operators); a single
// operand selects the unary variant.

use std::sync::Arc;

use crate::error::CompileError;
use crate::operators::{Associativity, BinaryOperator};
use crate::tokenizer::{Token, TokenKind};
use crate::value_parser;

use super::node::Node;
use super::{CompileContext, Notation, TokenStream, at_unit_end, parse_quoted, parse_symbol, unexpected};

pub(crate) fn parse_unit(ctx: &CompileContext<'_>, stream: &mut TokenStream<'_>) -> Result<Node, CompileError> {
    if at_unit_end(stream)? {
        return Ok(Node::Fragment(Vec::new()));
    }
    parse_expression(ctx, stream)
}

fn parse_expression(ctx: &CompileContext<'_>, stream: &mut TokenStream<'_>) -> Result<Node, CompileError> {
    let token = stream.expect()?;
    match token.kind {
        kind if kind.is_value() => Ok(Node::Value(value_parser::parse_token(ctx.domain, &token)?)),
        TokenKind::Modifier => parse_quoted(ctx, stream),
        TokenKind::Symbol | TokenKind::SymbolWithArgs => {
            parse_symbol(ctx, stream, token, Notation::Prefix, parse_expression)
        }
        TokenKind::Operator => {
            if let Some(op) = ctx.operators.binary(&token.text).map(Arc::clone) {
                let left = parse_expression(ctx, stream)?;
                let right = parse_expression(ctx, stream)?;
                Ok(Node::binary(ctx.operators, op, left, right))
            } else if let Some(op) = ctx.operators.unary(&token.text).map(Arc::clone) {
                let operand = parse_expression(ctx, stream)?;
                Ok(Node::Unary {
                    op,
                    operand: Box::new(operand),
                })
            } else {
                Err(CompileError::UnknownOperator(token.text))
            }
        }
        TokenKind::LeftBracket => parse_bracket(ctx, stream, &token),
        _ => Err(unexpected(&token)),
    }
}

/// Operands up to the closing bracket; separators between them are optional.
fn parse_operands(
    ctx: &CompileContext<'_>,
    stream: &mut TokenStream<'_>,
    open: &Token,
) -> Result<Vec<Node>, CompileError> {
    let mut operands = Vec::new();
    loop {
        match stream.peek_kind()? {
            None => return Err(CompileError::UnbalancedBrackets { pos: open.pos }),
            Some(TokenKind::RightBracket) => {
                stream.next()?;
                return Ok(operands);
            }
            Some(TokenKind::Separator) => {
                stream.next()?;
            }
            Some(_) => operands.push(parse_expression(ctx, stream)?),
        }
    }
}

fn parse_bracket(ctx: &CompileContext<'_>, stream: &mut TokenStream<'_>, open: &Token) -> Result<Node, CompileError> {
    if stream.peek_kind()? == Some(TokenKind::Operator) {
        let op_token = stream.expect()?;
        let mut operands = parse_operands(ctx, stream, open)?;
        return apply_operator(ctx, &op_token, &mut operands);
    }

    let mut inner = parse_expression(ctx, stream)?;
    // `(f a b)`: a bare symbol at the head takes the rest of the group
    if let Node::Symbol(symbol) = &mut inner {
        if symbol.is_bare() {
            symbol.args = parse_operands(ctx, stream, open)?;
            return Ok(inner);
        }
    }
    stream.expect_right_bracket(open)?;
    Ok(inner)
}

fn apply_operator(ctx: &CompileContext<'_>, op_token: &Token, operands: &mut Vec<Node>) -> Result<Node, CompileError> {
    let binary = ctx.operators.binary(&op_token.text).map(Arc::clone);
    let unary = ctx.operators.unary(&op_token.text).map(Arc::clone);

    if operands.len() == 1 {
        if let Some(op) = unary {
            let operand = operands.remove(0);
            return Ok(Node::Unary {
                op,
                operand: Box::new(operand),
            });
        }
    }
    if operands.len() >= 2 {
        if let Some(op) = binary {
            return fold(ctx, op, std::mem::take(operands));
        }
    }

    let expected = match (&binary, &unary) {
        (Some(_), _) => 2,
        (None, Some(_)) => 1,
        (None, None) => return Err(CompileError::UnknownOperator(op_token.text.clone())),
    };
    Err(CompileError::Arity {
        name: op_token.text.clone(),
        expected,
        actual: operands.len(),
    })
}

fn fold(ctx: &CompileContext<'_>, op: Arc<BinaryOperator>, operands: Vec<Node>) -> Result<Node, CompileError> {
    let folded = match op.associativity {
        Associativity::Left => operands
            .into_iter()
            .reduce(|acc, next| Node::binary(ctx.operators, Arc::clone(&op), acc, next)),
        Associativity::Right => operands
            .into_iter()
            .rev()
            .reduce(|acc, prev| Node::binary(ctx.operators, Arc::clone(&op), prev, acc)),
    };
    folded.ok_or(CompileError::UnexpectedEnd)
}
