// Lazy tokenizer shared by all three notations.
//
// Numbers are recognized by anchored regular expressions that capture the
// numeric body; the value parser converts bodies later. Operators come from
// the operator dictionary and are tried longest first, so an operator spelled
// with letters (e.g. `neg`) wins over an identifier of the same or shorter
// length. A number may not run straight into identifier characters: `2PI` is
// an invalid literal, juxtaposition needs a space (`2 PI`).

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::CompileError;

// RUST CONCEPT: Source position for rich error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourcePos {
    pub line: usize,
    pub column: usize,
    pub offset: usize, // Byte offset from start of input
}

impl SourcePos {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LeftBracket,
    RightBracket,
    Separator,
    Operator,
    Symbol,
    SymbolWithArgs,
    Modifier,
    String,
    DecNumber,
    HexNumber,
    OctNumber,
    BinNumber,
    QuotedNumber,
}

impl TokenKind {
    pub fn is_value(self) -> bool {
        matches!(
            self,
            TokenKind::String
                | TokenKind::DecNumber
                | TokenKind::HexNumber
                | TokenKind::OctNumber
                | TokenKind::BinNumber
                | TokenKind::QuotedNumber
        )
    }
}

// RUST CONCEPT: Token with embedded source position
// `text` is the numeric body for number tokens (no `0x` prefix), the unescaped
// contents for strings, and the source spelling for everything else.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub pos: SourcePos,
    pub end_pos: SourcePos,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, pos: SourcePos, end_pos: SourcePos) -> Self {
        Self {
            kind,
            text: text.into(),
            pos,
            end_pos,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::String => write!(f, "\"{}\"", self.text),
            TokenKind::HexNumber => write!(f, "0x{}", self.text),
            TokenKind::OctNumber => write!(f, "0{}", self.text),
            TokenKind::BinNumber => write!(f, "0b{}", self.text),
            _ => write!(f, "{}", self.text),
        }
    }
}

static QUOTED_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^([0-9]+#[0-9A-Za-z'"]+(?:\.[0-9A-Za-z'"]+)?)"#).unwrap());
static HEX_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x([0-9A-Fa-f]+(?:\.[0-9A-Fa-f]+)?)").unwrap());
static BIN_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0b([01]+(?:\.[01]+)?)").unwrap());
static OCT_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0([0-7]+(?:\.[0-7]+)?)").unwrap());
static DEC_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]+(?:\.[0-9]+)?)").unwrap());
static SYMBOL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[_A-Za-z$][_0-9A-Za-z$]*").unwrap());
static SYMBOL_ARGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^@[0-9]*(?:,[0-9]*)?").unwrap());
static IDENTIFIER_CHAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[_0-9A-Za-z$]+").unwrap());

// Order matters: prefixed forms before plain decimals
static NUMBER_PATTERNS: Lazy<[(TokenKind, &'static Regex); 5]> = Lazy::new(|| {
    [
        (TokenKind::QuotedNumber, &*QUOTED_NUMBER),
        (TokenKind::HexNumber, &*HEX_NUMBER),
        (TokenKind::BinNumber, &*BIN_NUMBER),
        (TokenKind::OctNumber, &*OCT_NUMBER),
        (TokenKind::DecNumber, &*DEC_NUMBER),
    ]
});

/// Splits `name@args,rets` into its parts. Empty counts are `None`.
pub fn split_symbol_args(text: &str) -> (&str, Option<usize>, Option<usize>) {
    let Some((name, counts)) = text.split_once('@') else {
        return (text, None, None);
    };
    let (args, rets) = counts.split_once(',').unwrap_or((counts, ""));
    (name, args.parse().ok(), rets.parse().ok())
}

#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    // Sorted longest first, then lexicographically
    operators: Vec<String>,
    modifiers: Vec<String>,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_operator(&mut self, op: &str) {
        if op.is_empty() || self.operators.iter().any(|known| known == op) {
            return;
        }
        self.operators.push(op.to_string());
        self.operators
            .sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    }

    pub fn add_modifier(&mut self, modifier: &str) {
        if !self.modifiers.iter().any(|known| known == modifier) {
            self.modifiers.push(modifier.to_string());
        }
    }

    pub fn operators(&self) -> &[String] {
        &self.operators
    }

    pub fn tokenize<'a>(&'a self, input: &'a str) -> Tokens<'a> {
        Tokens {
            tokenizer: self,
            input,
            pos: SourcePos::new(1, 1, 0),
            failed: false,
        }
    }
}

/// Iterator over the tokens of one input. Stops after the first error.
pub struct Tokens<'a> {
    tokenizer: &'a Tokenizer,
    input: &'a str,
    pos: SourcePos,
    failed: bool,
}

impl<'a> Tokens<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos.offset..]
    }

    // Helper function to advance position tracking
    fn advance(&mut self, bytes: usize) {
        let consumed = &self.input[self.pos.offset..self.pos.offset + bytes];
        for ch in consumed.chars() {
            if ch == '\n' {
                self.pos.line += 1;
                self.pos.column = 1;
            } else {
                self.pos.column += 1;
            }
        }
        self.pos.offset += bytes;
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.advance(rest.len() - trimmed.len());
    }

    fn emit(&mut self, kind: TokenKind, text: impl Into<String>, len: usize) -> Token {
        let start = self.pos;
        self.advance(len);
        Token::new(kind, text, start, self.pos)
    }

    fn string_literal(&mut self) -> Result<Token, CompileError> {
        let start = self.pos;
        let mut string = String::new();
        let mut escaped = false;
        let mut chars = self.rest().char_indices().skip(1);

        for (index, ch) in chars.by_ref() {
            if escaped {
                match ch {
                    'n' => string.push('\n'),
                    't' => string.push('\t'),
                    '\\' => string.push('\\'),
                    '"' => string.push('"'),
                    _ => {
                        string.push('\\');
                        string.push(ch);
                    }
                }
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                self.advance(index + 1);
                return Ok(Token::new(TokenKind::String, string, start, self.pos));
            } else {
                string.push(ch);
            }
        }

        Err(CompileError::Tokenize {
            pos: start,
            remainder: self.rest().to_string(),
        })
    }

    fn number(&mut self) -> Option<Result<Token, CompileError>> {
        let rest = self.rest();
        let (kind, captures) = NUMBER_PATTERNS
            .iter()
            .find_map(|(kind, regex)| regex.captures(rest).map(|caps| (*kind, caps)))?;
        let whole = captures.get(0)?.as_str();
        let body = captures.get(1)?.as_str();

        // `0xGG` or `12abc`: digits run straight into an identifier
        if let Some(trailing) = IDENTIFIER_CHAR.find(&rest[whole.len()..]) {
            return Some(Err(CompileError::InvalidLiteral {
                text: format!("{}{}", whole, trailing.as_str()),
                reason: "number runs into identifier characters".to_string(),
            }));
        }
        Some(Ok(self.emit(kind, body, whole.len())))
    }

    fn next_token(&mut self) -> Result<Token, CompileError> {
        let rest = self.rest();
        let tokenizer = self.tokenizer;

        match rest.chars().next() {
            Some('(') => return Ok(self.emit(TokenKind::LeftBracket, "(", 1)),
            Some(')') => return Ok(self.emit(TokenKind::RightBracket, ")", 1)),
            Some(',') => return Ok(self.emit(TokenKind::Separator, ",", 1)),
            Some('"') => return self.string_literal(),
            _ => {}
        }

        if let Some(modifier) = tokenizer.modifiers.iter().find(|m| rest.starts_with(m.as_str())) {
            return Ok(self.emit(TokenKind::Modifier, modifier.as_str(), modifier.len()));
        }

        if let Some(number) = self.number() {
            return number;
        }

        let symbol_len = SYMBOL.find(rest).map_or(0, |m| m.end());
        let operator = tokenizer
            .operators
            .iter()
            .find(|op| rest.starts_with(op.as_str()));

        match operator {
            Some(op) if op.len() >= symbol_len => Ok(self.emit(TokenKind::Operator, op.as_str(), op.len())),
            _ if symbol_len > 0 => {
                let args_len = SYMBOL_ARGS
                    .find(&rest[symbol_len..])
                    .map_or(0, |m| m.end());
                let len = symbol_len + args_len;
                let kind = if args_len > 0 {
                    TokenKind::SymbolWithArgs
                } else {
                    TokenKind::Symbol
                };
                Ok(self.emit(kind, &rest[..len], len))
            }
            _ => Err(CompileError::Tokenize {
                pos: self.pos,
                remainder: rest.to_string(),
            }),
        }
    }
}

impl Iterator for Tokens<'_> {
    type Item = Result<Token, CompileError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.skip_whitespace();
        if self.rest().is_empty() {
            return None;
        }
        let result = self.next_token();
        self.failed = result.is_err();
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer() -> Tokenizer {
        let mut tokenizer = Tokenizer::new();
        for op in ["+", "-", "*", "**", "<", "<=", "<=>", ".", ":", "neg", "!"] {
            tokenizer.add_operator(op);
        }
        tokenizer.add_modifier("'");
        tokenizer
    }

    fn kinds(input: &str) -> Vec<(TokenKind, String)> {
        let tokenizer = tokenizer();
        tokenizer
            .tokenize(input)
            .map(|t| t.map(|t| (t.kind, t.text)))
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_operator_ordering() {
        let tokenizer = tokenizer();
        assert_eq!(&tokenizer.operators()[..3], ["<=>", "neg", "**"]);
    }

    #[test]
    fn test_tokenize_numbers() {
        assert_eq!(
            kinds("42 3.14 0x1F 0b101 017 16#FF.8"),
            vec![
                (TokenKind::DecNumber, "42".to_string()),
                (TokenKind::DecNumber, "3.14".to_string()),
                (TokenKind::HexNumber, "1F".to_string()),
                (TokenKind::BinNumber, "101".to_string()),
                (TokenKind::OctNumber, "17".to_string()),
                (TokenKind::QuotedNumber, "16#FF.8".to_string()),
            ]
        );
    }

    #[test]
    fn test_longest_operator_wins() {
        assert_eq!(
            kinds("1<=>2**3"),
            vec![
                (TokenKind::DecNumber, "1".to_string()),
                (TokenKind::Operator, "<=>".to_string()),
                (TokenKind::DecNumber, "2".to_string()),
                (TokenKind::Operator, "**".to_string()),
                (TokenKind::DecNumber, "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_word_operators_and_symbols() {
        let tokens = kinds("neg negate x1 $y");
        assert_eq!(tokens[0], (TokenKind::Operator, "neg".to_string()));
        assert_eq!(tokens[1], (TokenKind::Symbol, "negate".to_string()));
        assert_eq!(tokens[2], (TokenKind::Symbol, "x1".to_string()));
        assert_eq!(tokens[3], (TokenKind::Symbol, "$y".to_string()));
    }

    #[test]
    fn test_symbol_with_args() {
        let tokens = kinds("sum@3 dup@1,2 f@,1");
        assert!(tokens.iter().all(|(kind, _)| *kind == TokenKind::SymbolWithArgs));
        assert_eq!(split_symbol_args(&tokens[0].1), ("sum", Some(3), None));
        assert_eq!(split_symbol_args(&tokens[1].1), ("dup", Some(1), Some(2)));
        assert_eq!(split_symbol_args(&tokens[2].1), ("f", None, Some(1)));
    }

    #[test]
    fn test_tokenize_strings() {
        let tokens = kinds(r#""hello \"world\"\n""#);
        assert_eq!(tokens, vec![(TokenKind::String, "hello \"world\"\n".to_string())]);
    }

    #[test]
    fn test_brackets_separators_modifiers() {
        let tokens = kinds("'(a, 1)");
        let kinds: Vec<TokenKind> = tokens.into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Modifier,
                TokenKind::LeftBracket,
                TokenKind::Symbol,
                TokenKind::Separator,
                TokenKind::DecNumber,
                TokenKind::RightBracket,
            ]
        );
    }

    #[test]
    fn test_tokenize_position_tracking() {
        let tokenizer = tokenizer();
        let tokens: Vec<Token> = tokenizer
            .tokenize("hello\n  world")
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(tokens[0].pos, SourcePos::new(1, 1, 0));
        assert_eq!(tokens[1].pos, SourcePos::new(2, 3, 8));
    }

    #[test]
    fn test_malformed_input() {
        let tokenizer = tokenizer();
        let errors: Vec<_> = tokenizer.tokenize("0xGG").collect();
        assert!(matches!(errors.as_slice(), [Err(CompileError::InvalidLiteral { .. })]));

        let errors: Vec<_> = tokenizer.tokenize("2PI").collect();
        assert!(matches!(errors.as_slice(), [Err(CompileError::InvalidLiteral { text, .. })] if text == "2PI"));
        assert_eq!(
            kinds("2 PI"),
            vec![(TokenKind::DecNumber, "2".to_string()), (TokenKind::Symbol, "PI".to_string())]
        );

        let mut tokens = tokenizer.tokenize("1 # 2");
        assert!(matches!(tokens.next(), Some(Ok(_))));
        assert!(matches!(tokens.next(), Some(Err(CompileError::Tokenize { .. }))));
        assert!(tokens.next().is_none());

        let unterminated: Vec<_> = tokenizer.tokenize("\"abc").collect();
        assert!(matches!(unterminated.as_slice(), [Err(CompileError::Tokenize { .. })]));
    }
}
