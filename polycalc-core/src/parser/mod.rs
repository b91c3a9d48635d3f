// Front-ends: infix, prefix and postfix compilers over one token stream.
//
// Infix and prefix build an expression tree that is flattened into steps;
// postfix emits steps directly. A bracketed group introduced by a notation
// name (`prefix(...)`, `infix(...)`, `postfix(...)`) is compiled by that
// notation's front-end, so the notations can be nested within one input.

pub mod infix;
pub mod node;
pub mod postfix;
pub mod prefix;

use std::fmt;
use std::str::FromStr;

use crate::domain::TypeDomain;
use crate::engine::SymbolInterner;
use crate::environment::Environment;
use crate::error::CompileError;
use crate::executable::Step;
use crate::operators::OperatorDictionary;
use crate::tokenizer::{Token, TokenKind, Tokens, split_symbol_args};
use crate::value::TypedValue;
use crate::value_parser;

use node::{Node, SymbolNode};

/// Symbol that quotes a bracketed group in the tree notations: `quote(a b)`.
pub const QUOTE_SYMBOL: &str = "quote";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notation {
    Infix,
    Prefix,
    Postfix,
}

impl Notation {
    pub const ALL: [Notation; 3] = [Notation::Infix, Notation::Prefix, Notation::Postfix];

    /// The symbol that switches into this notation for one bracketed group.
    pub fn switch_symbol(self) -> &'static str {
        match self {
            Notation::Infix => "infix",
            Notation::Prefix => "prefix",
            Notation::Postfix => "postfix",
        }
    }

    /// Target of a switch symbol, as recognized inside `self`.
    ///
    /// The tree notations switch between each other; postfix can switch to
    /// either tree notation and into a postfix group.
    fn switch_target(self, name: &str) -> Option<Notation> {
        let target = Notation::ALL
            .into_iter()
            .find(|notation| notation.switch_symbol() == name)?;
        if self == Notation::Postfix || target != Notation::Postfix {
            Some(target)
        } else {
            None
        }
    }
}

impl fmt::Display for Notation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.switch_symbol())
    }
}

impl FromStr for Notation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Notation::ALL
            .into_iter()
            .find(|notation| notation.switch_symbol().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown notation '{}'", s))
    }
}

/// What a front-end needs to resolve literals, operators and symbols.
pub struct CompileContext<'a> {
    pub domain: &'a TypeDomain,
    pub operators: &'a OperatorDictionary,
    pub environment: &'a Environment,
    pub symbols: &'a SymbolInterner,
}

/// Token iterator with one token of lookahead.
pub struct TokenStream<'a> {
    tokens: Tokens<'a>,
    lookahead: Option<Token>,
}

impl<'a> TokenStream<'a> {
    pub fn new(tokens: Tokens<'a>) -> Self {
        Self {
            tokens,
            lookahead: None,
        }
    }

    pub fn peek(&mut self) -> Result<Option<&Token>, CompileError> {
        if self.lookahead.is_none() {
            self.lookahead = self.tokens.next().transpose()?;
        }
        Ok(self.lookahead.as_ref())
    }

    pub fn peek_kind(&mut self) -> Result<Option<TokenKind>, CompileError> {
        Ok(self.peek()?.map(|token| token.kind))
    }

    pub fn next(&mut self) -> Result<Option<Token>, CompileError> {
        match self.lookahead.take() {
            Some(token) => Ok(Some(token)),
            None => self.tokens.next().transpose(),
        }
    }

    pub fn expect(&mut self) -> Result<Token, CompileError> {
        self.next()?.ok_or(CompileError::UnexpectedEnd)
    }

    pub fn expect_right_bracket(&mut self, open: &Token) -> Result<(), CompileError> {
        match self.next()? {
            Some(token) if token.kind == TokenKind::RightBracket => Ok(()),
            Some(token) => Err(unexpected(&token)),
            None => Err(CompileError::UnbalancedBrackets { pos: open.pos }),
        }
    }
}

pub(crate) fn unexpected(token: &Token) -> CompileError {
    CompileError::UnexpectedToken {
        token: token.to_string(),
        pos: token.pos,
    }
}

/// Compiles a whole input. Trailing tokens are an error.
pub(crate) fn compile(
    ctx: &CompileContext<'_>,
    stream: &mut TokenStream<'_>,
    notation: Notation,
) -> Result<Vec<Step>, CompileError> {
    let node = compile_unit(ctx, stream, notation, false)?;
    if let Some(token) = stream.next()? {
        return Err(match token.kind {
            TokenKind::RightBracket => CompileError::UnbalancedBrackets { pos: token.pos },
            _ => unexpected(&token),
        });
    }
    let mut steps = Vec::new();
    node.flatten(ctx, &mut steps)?;
    Ok(steps)
}

/// Compiles up to the end of input or an unmatched `)`, which is left in the
/// stream. `nested` is set inside a mode-switch group.
pub(crate) fn compile_unit(
    ctx: &CompileContext<'_>,
    stream: &mut TokenStream<'_>,
    notation: Notation,
    nested: bool,
) -> Result<Node, CompileError> {
    match notation {
        Notation::Infix => infix::parse_unit(ctx, stream),
        Notation::Prefix => prefix::parse_unit(ctx, stream),
        Notation::Postfix => postfix::compile_unit(ctx, stream, nested).map(Node::Fragment),
    }
}

/// Compiles `( ... )` with the target notation. The switch symbol has been
/// consumed, the `(` has not.
pub(crate) fn compile_switched(
    ctx: &CompileContext<'_>,
    stream: &mut TokenStream<'_>,
    target: Notation,
) -> Result<Node, CompileError> {
    let open = stream.expect()?;
    let node = compile_unit(ctx, stream, target, true)?;
    stream.expect_right_bracket(&open)?;
    Ok(node)
}

/// True when a tree front-end has nothing to parse before the unit ends.
pub(crate) fn at_unit_end(stream: &mut TokenStream<'_>) -> Result<bool, CompileError> {
    Ok(matches!(stream.peek_kind()?, None | Some(TokenKind::RightBracket)))
}

/// A single quoted token: literals stay literals, everything else becomes a
/// symbol with the token's spelling.
pub(crate) fn quoted_atom(ctx: &CompileContext<'_>, token: &Token) -> Result<TypedValue, CompileError> {
    match token.kind {
        kind if kind.is_value() => value_parser::parse_token(ctx.domain, token),
        TokenKind::Symbol | TokenKind::SymbolWithArgs | TokenKind::Operator | TokenKind::Modifier => ctx
            .domain
            .create(ctx.symbols.intern(&token.text))
            .map_err(CompileError::Literal),
        _ => Err(CompileError::InvalidQuote {
            token: token.to_string(),
            pos: token.pos,
        }),
    }
}

/// The contents of a quoted group as a cons list; nested groups become
/// nested lists and separators are skipped.
pub(crate) fn quoted_list(
    ctx: &CompileContext<'_>,
    stream: &mut TokenStream<'_>,
    open: &Token,
) -> Result<TypedValue, CompileError> {
    let mut items = Vec::new();
    loop {
        let token = stream
            .next()?
            .ok_or(CompileError::UnbalancedBrackets { pos: open.pos })?;
        match token.kind {
            TokenKind::RightBracket => break,
            TokenKind::Separator => continue,
            TokenKind::LeftBracket => items.push(quoted_list(ctx, stream, &token)?),
            _ => items.push(quoted_atom(ctx, &token)?),
        }
    }
    ctx.domain.list(items).map_err(CompileError::Literal)
}

/// The quote modifier in the tree notations: `'x`, `'1` or `'(a b)`.
pub(crate) fn parse_quoted(ctx: &CompileContext<'_>, stream: &mut TokenStream<'_>) -> Result<Node, CompileError> {
    let token = stream.expect()?;
    let value = match token.kind {
        TokenKind::LeftBracket => quoted_list(ctx, stream, &token)?,
        _ => quoted_atom(ctx, &token)?,
    };
    Ok(Node::Value(value))
}

pub(crate) type ArgumentParser =
    fn(&CompileContext<'_>, &mut TokenStream<'_>) -> Result<Node, CompileError>;

/// Symbol handling shared by the tree notations: mode switches, `quote(...)`,
/// call syntax `f(a, b)` and, in prefix, `f@n a1 .. an`.
pub(crate) fn parse_symbol(
    ctx: &CompileContext<'_>,
    stream: &mut TokenStream<'_>,
    token: Token,
    from: Notation,
    parse_argument: ArgumentParser,
) -> Result<Node, CompileError> {
    let (name, explicit_args, rets) = split_symbol_args(&token.text);
    let bracket_follows = stream.peek_kind()? == Some(TokenKind::LeftBracket);

    if token.kind == TokenKind::Symbol && bracket_follows {
        if let Some(target) = from.switch_target(name) {
            return compile_switched(ctx, stream, target);
        }
        if name == QUOTE_SYMBOL {
            let open = stream.expect()?;
            return quoted_list(ctx, stream, &open).map(Node::Value);
        }
    }

    let mut symbol = SymbolNode::new(name, token.pos);
    symbol.explicit_args = explicit_args;
    symbol.rets = rets;

    if bracket_follows {
        let open = stream.expect()?;
        let commas_required = from == Notation::Infix;
        symbol.args = parse_call_arguments(ctx, stream, &open, parse_argument, commas_required)?;
        symbol.bracketed = true;
    } else if from == Notation::Prefix {
        for _ in 0..explicit_args.unwrap_or(0) {
            symbol.args.push(parse_argument(ctx, stream)?);
        }
    }
    Ok(Node::Symbol(symbol))
}

fn parse_call_arguments(
    ctx: &CompileContext<'_>,
    stream: &mut TokenStream<'_>,
    open: &Token,
    parse_argument: ArgumentParser,
    commas_required: bool,
) -> Result<Vec<Node>, CompileError> {
    let mut args = Vec::new();
    let mut after_separator = false;
    loop {
        let kind = stream
            .peek_kind()?
            .ok_or(CompileError::UnbalancedBrackets { pos: open.pos })?;
        match kind {
            TokenKind::RightBracket if !(commas_required && after_separator) => {
                stream.next()?;
                return Ok(args);
            }
            TokenKind::Separator if !commas_required || (!args.is_empty() && !after_separator) => {
                stream.next()?;
                after_separator = true;
            }
            TokenKind::RightBracket | TokenKind::Separator => {
                let token = stream.expect()?;
                return Err(unexpected(&token));
            }
            _ => {
                if commas_required && !args.is_empty() && !after_separator {
                    let token = stream.expect()?;
                    return Err(unexpected(&token));
                }
                args.push(parse_argument(ctx, stream)?);
                after_separator = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notation_names() {
        assert_eq!("Prefix".parse::<Notation>(), Ok(Notation::Prefix));
        assert!("rpn".parse::<Notation>().is_err());
        assert_eq!(Notation::Postfix.to_string(), "postfix");
    }

    #[test]
    fn test_switch_targets() {
        assert_eq!(Notation::Infix.switch_target("prefix"), Some(Notation::Prefix));
        assert_eq!(Notation::Prefix.switch_target("infix"), Some(Notation::Infix));
        assert_eq!(Notation::Infix.switch_target("postfix"), None);
        assert_eq!(Notation::Postfix.switch_target("postfix"), Some(Notation::Postfix));
        assert_eq!(Notation::Postfix.switch_target("sqrt"), None);
    }
}
