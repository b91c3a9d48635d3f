// Postfix front-end: every token becomes a step as soon as it is read.
//
// Brackets only group visually and must balance. A bare symbol leaves its
// argument count to the definition; `f@a,r` pins it. An operator token uses
// the binary variant when one exists, so unary variants need their own
// spelling (e.g. `neg`).

use std::sync::Arc;

use crate::error::CompileError;
use crate::executable::Step;
use crate::operators::Operator;
use crate::tokenizer::{Token, TokenKind, split_symbol_args};
use crate::value_parser;

use super::{CompileContext, Notation, TokenStream, compile_switched, quoted_atom, unexpected};

pub(crate) fn compile_unit(
    ctx: &CompileContext<'_>,
    stream: &mut TokenStream<'_>,
    nested: bool,
) -> Result<Vec<Step>, CompileError> {
    let mut steps = Vec::new();
    let mut open = Vec::new();

    while let Some(kind) = stream.peek_kind()? {
        if kind == TokenKind::RightBracket && open.is_empty() {
            if nested {
                break;
            }
            let token = stream.expect()?;
            return Err(CompileError::UnbalancedBrackets { pos: token.pos });
        }

        let token = stream.expect()?;
        match token.kind {
            TokenKind::LeftBracket => open.push(token.pos),
            TokenKind::RightBracket => {
                open.pop();
            }
            TokenKind::Separator => {
                if open.is_empty() && !nested {
                    return Err(unexpected(&token));
                }
            }
            TokenKind::Modifier => {
                let quoted = stream.expect()?;
                if matches!(
                    quoted.kind,
                    TokenKind::LeftBracket | TokenKind::RightBracket | TokenKind::Separator
                ) {
                    return Err(CompileError::InvalidQuote {
                        token: quoted.to_string(),
                        pos: quoted.pos,
                    });
                }
                steps.push(Step::Push(quoted_atom(ctx, &quoted)?));
            }
            TokenKind::Operator => steps.push(Step::Apply(resolve_operator(ctx, &token)?)),
            TokenKind::Symbol | TokenKind::SymbolWithArgs => {
                let target = Notation::Postfix.switch_target(&token.text);
                let bracket_follows = stream.peek_kind()? == Some(TokenKind::LeftBracket);
                match target {
                    Some(target) if token.kind == TokenKind::Symbol && bracket_follows => {
                        let node = compile_switched(ctx, stream, target)?;
                        node.flatten(ctx, &mut steps)?;
                    }
                    _ => steps.push(resolve_call(ctx, &token)?),
                }
            }
            _ => steps.push(Step::Push(value_parser::parse_token(ctx.domain, &token)?)),
        }
    }

    if let Some(pos) = open.last() {
        return Err(CompileError::UnbalancedBrackets { pos: *pos });
    }
    Ok(steps)
}

fn resolve_operator(ctx: &CompileContext<'_>, token: &Token) -> Result<Operator, CompileError> {
    if let Some(op) = ctx.operators.binary(&token.text) {
        return Ok(Operator::Binary(Arc::clone(op)));
    }
    ctx.operators
        .unary(&token.text)
        .map(|op| Operator::Unary(Arc::clone(op)))
        .ok_or_else(|| CompileError::UnknownOperator(token.text.clone()))
}

fn resolve_call(ctx: &CompileContext<'_>, token: &Token) -> Result<Step, CompileError> {
    let (name, args, rets) = split_symbol_args(&token.text);
    let entry = ctx
        .environment
        .get(name)
        .ok_or_else(|| CompileError::UnknownSymbol(name.to_string()))?;

    if let (Some(requested), Some(fixed)) = (args, entry.definition.fixed_args()) {
        if requested != fixed {
            return Err(CompileError::Arity {
                name: name.to_string(),
                expected: fixed,
                actual: requested,
            });
        }
    }

    Ok(Step::Call {
        name: Arc::from(name),
        symbol: Arc::clone(&entry.definition),
        args,
        rets,
    })
}

#[cfg(test)]
mod tests {
    use crate::builtins::standard_engine;
    use crate::error::CompileError;
    use crate::parser::Notation;

    fn compiled(source: &str) -> String {
        let engine = standard_engine().unwrap();
        engine.compile(source, Notation::Postfix).unwrap().to_string()
    }

    fn error(source: &str) -> CompileError {
        let engine = standard_engine().unwrap();
        engine.compile(source, Notation::Postfix).unwrap_err()
    }

    #[test]
    fn test_steps_in_source_order() {
        assert_eq!(compiled("1 2 3 * +"), "1 2 3 * +");
        assert_eq!(compiled("(1 2 +) 3 *"), "1 2 + 3 *");
        assert_eq!(compiled("5 neg"), "5 neg@1");
        assert_eq!(compiled(""), "");
    }

    #[test]
    fn test_symbol_counts() {
        assert_eq!(compiled("1 2 3 max@3"), "1 2 3 max@3");
        assert_eq!(compiled("1 2 list@2,1"), "1 2 list@2,1");
        assert_eq!(compiled("4 sqrt"), "4 sqrt");
    }

    #[test]
    fn test_quotes() {
        assert_eq!(compiled("'foo '+ '1"), "'foo '+ 1");
    }

    #[test]
    fn test_mode_switches() {
        assert_eq!(compiled("infix(1 + 2) 3 *"), "1 2 + 3 *");
        assert_eq!(compiled("prefix(+ 1 2)"), "1 2 +");
        assert_eq!(compiled("postfix(1 2 +)"), "1 2 +");
        assert_eq!(compiled("1 infix(max(2, prefix(* 3 4)))"), "1 2 3 4 * max@2");
    }

    #[test]
    fn test_errors() {
        assert!(matches!(error("1 2 +)"), CompileError::UnbalancedBrackets { .. }));
        assert!(matches!(error("(1 2 +"), CompileError::UnbalancedBrackets { .. }));
        assert!(matches!(error("1, 2"), CompileError::UnexpectedToken { .. }));
        assert!(matches!(error("'(a b)"), CompileError::InvalidQuote { .. }));
        assert!(matches!(error("1 sqrt@2"), CompileError::Arity { .. }));
        assert!(matches!(error("1 frobnicate"), CompileError::UnknownSymbol(_)));
    }
}
