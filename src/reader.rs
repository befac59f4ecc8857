use indexmap::IndexMap;

use crate::{
    diagnostics::{Diagnostic, DiagnosticKind, Result},
    lexer::{Lexer, Token, TokenKind},
    value::{MapKey, Value},
};

/// Reads the first form from `source`. Trailing forms are ignored; callers
/// that want a whole file evaluate it as one `(do ...)` composition.
pub fn read_str(source: &str) -> Result<Value> {
    let tokens = Lexer::new(source).tokenize()?;
    Reader::new(tokens).read_form()
}

struct Reader {
    tokens: Vec<Token>,
    current: usize,
}

impl Reader {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    fn peek(&self) -> &Token {
        // The lexer always terminates the stream with an Eof token.
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.current < self.tokens.len() - 1 {
            self.current += 1;
        }
        token
    }

    fn read_form(&mut self) -> Result<Value> {
        match self.peek().kind {
            TokenKind::LParen => {
                self.advance();
                let items = self.read_until(TokenKind::RParen)?;
                Ok(Value::list(items))
            }
            TokenKind::LBracket => {
                self.advance();
                let items = self.read_until(TokenKind::RBracket)?;
                Ok(Value::vector(items))
            }
            TokenKind::LBrace => {
                self.advance();
                self.read_hashmap()
            }
            TokenKind::Quote => self.read_wrapped("quote"),
            TokenKind::Quasiquote => self.read_wrapped("quasiquote"),
            TokenKind::Unquote => self.read_wrapped("unquote"),
            TokenKind::SpliceUnquote => self.read_wrapped("splice-unquote"),
            TokenKind::Deref => self.read_wrapped("deref"),
            TokenKind::Caret => {
                self.advance();
                let meta = self.read_form()?;
                let form = self.read_form()?;
                Ok(Value::list(vec![Value::symbol("with-meta"), form, meta]))
            }
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                let token = self.advance();
                Err(Diagnostic::new(
                    DiagnosticKind::UnbalancedDelimiter,
                    format!("unexpected `{}`", token.lexeme),
                )
                .with_span(token.span)
                .into())
            }
            TokenKind::Eof => {
                let token = self.advance();
                Err(Diagnostic::new(
                    DiagnosticKind::UnbalancedDelimiter,
                    "unexpected end of input",
                )
                .with_span(token.span)
                .into())
            }
            _ => self.read_atom(),
        }
    }

    fn read_until(&mut self, close: TokenKind) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        loop {
            if self.peek().kind == close {
                self.advance();
                return Ok(items);
            }
            if self.peek().kind == TokenKind::Eof {
                let token = self.advance();
                return Err(Diagnostic::new(
                    DiagnosticKind::UnbalancedDelimiter,
                    "missing closing delimiter",
                )
                .with_span(token.span)
                .into());
            }
            items.push(self.read_form()?);
        }
    }

    fn read_hashmap(&mut self) -> Result<Value> {
        let forms = self.read_until(TokenKind::RBrace)?;
        if forms.len() % 2 != 0 {
            return Err(Diagnostic::new(
                DiagnosticKind::MalformedHashMap,
                "hashmap literal needs an even number of forms",
            )
            .into());
        }
        let mut entries = IndexMap::new();
        for pair in forms.chunks(2) {
            let key = MapKey::from_value(&pair[0]).map_err(|_| {
                Diagnostic::new(
                    DiagnosticKind::MalformedHashMap,
                    format!("{} cannot be used as a hashmap key", pair[0].type_name()),
                )
            })?;
            entries.insert(key, pair[1].clone());
        }
        Ok(Value::map(entries))
    }

    fn read_wrapped(&mut self, symbol: &str) -> Result<Value> {
        self.advance();
        let form = self.read_form()?;
        Ok(Value::list(vec![Value::symbol(symbol), form]))
    }

    fn read_atom(&mut self) -> Result<Value> {
        let token = self.advance();
        match token.kind {
            TokenKind::Number => {
                let number: f64 = token.lexeme.parse().map_err(|_| {
                    Diagnostic::new(
                        DiagnosticKind::LexError,
                        format!("unparsable number `{}`", token.lexeme),
                    )
                    .with_span(token.span)
                })?;
                Ok(Value::number(number))
            }
            TokenKind::String => Ok(Value::string(token.lexeme)),
            TokenKind::True => Ok(Value::bool(true)),
            TokenKind::False => Ok(Value::bool(false)),
            TokenKind::Nil => Ok(Value::nil()),
            TokenKind::Symbol => match parse_decimal(&token.lexeme) {
                Some(number) => Ok(Value::number(number)),
                None => Ok(Value::symbol(token.lexeme)),
            },
            other => Err(Diagnostic::new(
                DiagnosticKind::LexError,
                format!("unexpected token {other:?}"),
            )
            .with_span(token.span)
            .into()),
        }
    }
}

/// A symbol spelling a signed decimal is a number, not a symbol.
fn parse_decimal(lexeme: &str) -> Option<f64> {
    let digits = lexeme.strip_prefix(['+', '-']).unwrap_or(lexeme);
    if digits.is_empty() {
        return None;
    }
    let mut parts = digits.splitn(2, '.');
    let whole = parts.next()?;
    if whole.is_empty() || !whole.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    if let Some(frac) = parts.next() {
        if frac.is_empty() || !frac.chars().all(|ch| ch.is_ascii_digit()) {
            return None;
        }
    }
    lexeme.parse().ok()
}
