use crate::diagnostics::{Diagnostic, DiagnosticKind, SourceSpan};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Quote,
    Quasiquote,
    Unquote,
    SpliceUnquote,
    Deref,
    Caret,
    String,
    Number,
    Symbol,
    True,
    False,
    Nil,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    /// For string tokens this is the decoded value, otherwise the raw text.
    pub lexeme: String,
    pub span: SourceSpan,
}

/// Characters that terminate a symbol and carry their own token rules.
fn is_special(ch: char) -> bool {
    matches!(
        ch,
        '(' | ')' | '[' | ']' | '{' | '}' | '\'' | '`' | '~' | '^' | '@' | ',' | ';' | '"'
    )
}

/// Commas count as whitespace in the surface syntax.
fn is_separator(ch: char) -> bool {
    ch.is_whitespace() || ch == ','
}

fn is_symbol_char(ch: char) -> bool {
    !is_special(ch) && !is_separator(ch) && !ch.is_control()
}

pub struct Lexer<'a> {
    source: &'a str,
    chars: std::str::CharIndices<'a>,
    current: usize,
    peeked: Option<(usize, char)>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices(),
            current: 0,
            peeked: None,
        }
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let next = if let Some((idx, ch)) = self.peeked.take() {
            Some((idx, ch))
        } else {
            self.chars.next()
        };
        if let Some((idx, ch)) = next {
            self.current = idx + ch.len_utf8();
            Some((idx, ch))
        } else {
            None
        }
    }

    fn peek(&mut self) -> Option<(usize, char)> {
        if self.peeked.is_none() {
            self.peeked = self.chars.next();
        }
        self.peeked
    }

    fn match_next(&mut self, expected: char) -> bool {
        if let Some((idx, ch)) = self.peek() {
            if ch == expected {
                self.peeked = None;
                self.current = idx + ch.len_utf8();
                true
            } else {
                false
            }
        } else {
            false
        }
    }

    fn skip_separators_and_comments(&mut self) {
        loop {
            let mut progressed = false;

            while let Some((_, ch)) = self.peek() {
                if is_separator(ch) {
                    self.bump();
                    progressed = true;
                } else {
                    break;
                }
            }

            if let Some((_, ';')) = self.peek() {
                while let Some((_, ch)) = self.peek() {
                    if ch == '\n' {
                        break;
                    }
                    self.bump();
                }
                progressed = true;
            }

            if !progressed {
                break;
            }
        }
    }

    fn simple_token(&mut self, start: usize, kind: TokenKind) -> Token {
        let end = self.current;
        Token {
            kind,
            lexeme: self.source[start..end].to_string(),
            span: SourceSpan { start, end },
        }
    }

    fn string_literal(&mut self, start: usize) -> Result<Token, Diagnostic> {
        let mut end = self.current;
        let mut value = String::new();
        while let Some((idx, ch)) = self.bump() {
            end = idx + ch.len_utf8();
            match ch {
                '"' => {
                    return Ok(Token {
                        kind: TokenKind::String,
                        lexeme: value,
                        span: SourceSpan { start, end },
                    });
                }
                '\\' => {
                    if let Some((esc_idx, esc)) = self.bump() {
                        end = esc_idx + esc.len_utf8();
                        match esc {
                            'n' => value.push('\n'),
                            '"' => value.push('"'),
                            '\\' => value.push('\\'),
                            other => {
                                value.push('\\');
                                value.push(other);
                            }
                        }
                    } else {
                        break;
                    }
                }
                _ => value.push(ch),
            }
        }
        Err(
            Diagnostic::new(DiagnosticKind::UnterminatedString, "unterminated string literal")
                .with_span(SourceSpan { start, end }),
        )
    }

    fn number_literal(&mut self, start: usize) -> Token {
        let mut end = self.current;
        while let Some((idx, ch)) = self.peek() {
            if ch.is_ascii_digit() {
                self.bump();
                end = idx + ch.len_utf8();
            } else {
                break;
            }
        }
        if let Some((dot_idx, '.')) = self.peek() {
            let mut lookahead = self.chars.clone();
            if matches!(lookahead.next(), Some((_, ch)) if ch.is_ascii_digit()) {
                self.bump();
                end = dot_idx + 1;
                while let Some((idx, ch)) = self.peek() {
                    if ch.is_ascii_digit() {
                        self.bump();
                        end = idx + ch.len_utf8();
                    } else {
                        break;
                    }
                }
            }
        }
        Token {
            kind: TokenKind::Number,
            lexeme: self.source[start..end].to_string(),
            span: SourceSpan { start, end },
        }
    }

    fn symbol_or_literal(&mut self, start: usize) -> Token {
        let mut end = self.current;
        while let Some((idx, ch)) = self.peek() {
            if is_symbol_char(ch) {
                self.bump();
                end = idx + ch.len_utf8();
            } else {
                break;
            }
        }
        let lexeme = self.source[start..end].to_string();
        let kind = match lexeme.as_str() {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "nil" => TokenKind::Nil,
            _ => TokenKind::Symbol,
        };
        Token {
            kind,
            lexeme,
            span: SourceSpan { start, end },
        }
    }

    fn next_is_digit(&mut self) -> bool {
        matches!(self.peek(), Some((_, ch)) if ch.is_ascii_digit())
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, Diagnostic> {
        let mut tokens = Vec::new();
        loop {
            self.skip_separators_and_comments();
            let (start, ch) = match self.bump() {
                Some(pair) => pair,
                None => {
                    tokens.push(Token {
                        kind: TokenKind::Eof,
                        lexeme: String::new(),
                        span: SourceSpan {
                            start: self.current,
                            end: self.current,
                        },
                    });
                    break;
                }
            };

            let token = match ch {
                '(' => self.simple_token(start, TokenKind::LParen),
                ')' => self.simple_token(start, TokenKind::RParen),
                '[' => self.simple_token(start, TokenKind::LBracket),
                ']' => self.simple_token(start, TokenKind::RBracket),
                '{' => self.simple_token(start, TokenKind::LBrace),
                '}' => self.simple_token(start, TokenKind::RBrace),
                '\'' => self.simple_token(start, TokenKind::Quote),
                '`' => self.simple_token(start, TokenKind::Quasiquote),
                '~' => {
                    if self.match_next('@') {
                        self.simple_token(start, TokenKind::SpliceUnquote)
                    } else {
                        self.simple_token(start, TokenKind::Unquote)
                    }
                }
                '@' => self.simple_token(start, TokenKind::Deref),
                '^' => self.simple_token(start, TokenKind::Caret),
                '"' => self.string_literal(start)?,
                '0'..='9' => self.number_literal(start),
                '-' if self.next_is_digit() => self.number_literal(start),
                _ if is_symbol_char(ch) => self.symbol_or_literal(start),
                other => {
                    return Err(Diagnostic::new(
                        DiagnosticKind::LexError,
                        format!("unexpected character `{}`", other.escape_default()),
                    )
                    .with_span(SourceSpan {
                        start,
                        end: self.current,
                    }));
                }
            };
            tokens.push(token);
        }
        Ok(tokens)
    }
}
