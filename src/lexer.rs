use crate::diagnostics::SourceSpan;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    LParen,
    RParen,
    Atom,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: SourceSpan,
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

    fn skip_whitespace(&mut self) {
        while let Some((_, ch)) = self.peek() {
            if ch.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn paren(&mut self, start: usize, kind: TokenKind) -> Token {
        let end = self.current;
        Token {
            kind,
            lexeme: self.source[start..end].to_string(),
            span: SourceSpan { start, end },
        }
    }

    // An atom runs until whitespace or a parenthesis; parens act as
    // separators even with no whitespace around them.
    fn atom(&mut self, start: usize) -> Token {
        let mut end = self.current;
        while let Some((idx, ch)) = self.peek() {
            if ch.is_whitespace() || ch == '(' || ch == ')' {
                break;
            }
            self.bump();
            end = idx + ch.len_utf8();
        }
        Token {
            kind: TokenKind::Atom,
            lexeme: self.source[start..end].to_string(),
            span: SourceSpan { start, end },
        }
    }

    /// Tokenizes the buffer, wrapping the stream in one synthetic outer
    /// `(` … `)` pair so that every top-level form parses as a child of a
    /// single list. Never fails; malformed parenthesization surfaces at
    /// parsing.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = vec![Token {
            kind: TokenKind::LParen,
            lexeme: String::new(),
            span: SourceSpan { start: 0, end: 0 },
        }];
        loop {
            self.skip_whitespace();
            let (start, ch) = match self.bump() {
                Some(pair) => pair,
                None => break,
            };
            let token = match ch {
                '(' => self.paren(start, TokenKind::LParen),
                ')' => self.paren(start, TokenKind::RParen),
                _ => self.atom(start),
            };
            tokens.push(token);
        }
        let end = self.source.len();
        tokens.push(Token {
            kind: TokenKind::RParen,
            lexeme: String::new(),
            span: SourceSpan { start: end, end },
        });
        tokens.push(Token {
            kind: TokenKind::Eof,
            lexeme: String::new(),
            span: SourceSpan { start: end, end },
        });
        tokens
    }
}
