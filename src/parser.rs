use crate::{
    ast::{Expr, ExprKind},
    diagnostics::{Diagnostic, DiagnosticKind, SourceSpan},
    lexer::{Lexer, Token, TokenKind},
};

/// Parses a source buffer into its ordered sequence of top-level forms.
///
/// The lexer wraps the buffer in one synthetic outer list, so parsing a
/// single expression yields a list whose children are the program's
/// top-level forms.
pub fn parse_program(source: &str) -> Result<Vec<Expr>, Diagnostic> {
    let tokens = Lexer::new(source).tokenize();
    let program = Parser::new(tokens).parse_expr()?;
    match program.kind {
        ExprKind::List(items) => Ok(items),
        _ => unreachable!("synthetic outer list is always a list"),
    }
}

struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn advance(&mut self) -> &Token {
        let token = &self.tokens[self.current];
        if token.kind != TokenKind::Eof {
            self.current += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn error_eof(&self) -> Diagnostic {
        Diagnostic::new(DiagnosticKind::Parse, "unexpected end of input")
            .with_span(self.peek().span)
    }

    fn parse_expr(&mut self) -> Result<Expr, Diagnostic> {
        let token = self.advance().clone();
        match token.kind {
            TokenKind::LParen => self.parse_list(token.span),
            TokenKind::Atom => Ok(atom(&token)),
            TokenKind::RParen => Err(Diagnostic::new(
                DiagnosticKind::Parse,
                "unexpected `)`",
            )
            .with_span(token.span)),
            TokenKind::Eof => Err(self.error_eof()),
        }
    }

    fn parse_list(&mut self, open: SourceSpan) -> Result<Expr, Diagnostic> {
        let mut items = Vec::new();
        while !self.check(TokenKind::RParen) {
            if self.check(TokenKind::Eof) {
                return Err(self.error_eof());
            }
            items.push(self.parse_expr()?);
        }
        let close = self.advance().span;
        Ok(Expr {
            kind: ExprKind::List(items),
            span: SourceSpan {
                start: open.start,
                end: close.end,
            },
        })
    }
}

fn atom(token: &Token) -> Expr {
    let kind = match token.lexeme.parse::<i64>() {
        Ok(value) => ExprKind::Int(value),
        Err(_) => ExprKind::Symbol(token.lexeme.clone()),
    };
    Expr {
        kind,
        span: token.span,
    }
}
