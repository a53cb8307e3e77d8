use chumsky::prelude::*;
use std::rc::Rc;

use crate::diagnostic::LineIndex;
use crate::error::{EmberError, Result};
use crate::token::{Literal, Token, TokenKind};

/// Raw scanner output before positions are resolved and newlines collapsed.
#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    Number(f64, bool), // (value, is_float)
    Str(String),
    Word(String),
    Symbol(TokenKind),
    Newline,
    Unterminated,
    Unexpected(char),
}

/// Scanner over the whole source. Every character is consumed by some branch,
/// so malformed input comes back as `Unterminated`/`Unexpected` lexemes rather
/// than as a parse failure.
fn lexer<'a>() -> impl Parser<'a, &'a str, Vec<(Lexeme, SimpleSpan)>, extra::Err<Simple<'a, char>>> {
    let number = text::digits(10)
        .then(just('.').then(text::digits(10)).or_not())
        .to_slice()
        .map(|s: &str| Lexeme::Number(s.parse().unwrap_or_default(), s.contains('.')));

    let escape = just('\\').ignore_then(choice((
        just('n').to("\n".to_string()),
        just('t').to("\t".to_string()),
        just('\\').to("\\".to_string()),
        just('"').to("\"".to_string()),
        any().map(|c: char| format!("\\{}", c)),
    )));

    let string = just('"')
        .ignore_then(
            none_of("\\\"")
                .map(|c: char| c.to_string())
                .or(escape)
                .repeated()
                .collect::<Vec<String>>(),
        )
        .then(just('"').or_not())
        .map(|(parts, closing)| match closing {
            Some(_) => Lexeme::Str(parts.concat()),
            None => Lexeme::Unterminated,
        });

    let word = text::ascii::ident().map(|s: &str| Lexeme::Word(s.to_string()));

    let op_double = choice((
        just("==").to(TokenKind::EqualEqual),
        just("!=").to(TokenKind::BangEqual),
        just("<=").to(TokenKind::LessEqual),
        just(">=").to(TokenKind::GreaterEqual),
    ));

    let op_single = choice((
        just('+').to(TokenKind::Plus),
        just('-').to(TokenKind::Minus),
        just('*').to(TokenKind::Star),
        just('/').to(TokenKind::Slash),
        just('%').to(TokenKind::Percent),
        just('=').to(TokenKind::Equal),
        just('<').to(TokenKind::Less),
        just('>').to(TokenKind::Greater),
        just('(').to(TokenKind::LParen),
        just(')').to(TokenKind::RParen),
        just('[').to(TokenKind::LBracket),
        just(']').to(TokenKind::RBracket),
        just(',').to(TokenKind::Comma),
    ));

    let symbol = op_double.or(op_single).map(Lexeme::Symbol);

    let newline = just('\n').to(Lexeme::Newline);
    let unexpected = any().map(Lexeme::Unexpected);

    let comment = just('#').then(none_of("\n").repeated()).ignored();
    let trivia = one_of(" \t\r").ignored().or(comment).repeated();

    let token = choice((number, string, word, symbol, newline, unexpected))
        .map_with(|lexeme, e| (lexeme, e.span()));

    trivia
        .clone()
        .ignore_then(token.then_ignore(trivia).repeated().collect())
        .then_ignore(end())
}

/// Turns source text into tokens, terminated by a single NEWLINE (unless the
/// stream already ends in one) and a single EOF.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let index = LineIndex::new(source);
    let lexemes = lexer().parse(source).into_result().map_err(|errors| {
        let offset = errors.first().map_or(0, |error| error.span().start);
        EmberError::syntax("Unexpected input", index.position(offset))
    })?;

    let mut tokens: Vec<Token> = Vec::with_capacity(lexemes.len() + 2);
    for (lexeme, span) in lexemes {
        let position = index.position(span.start);
        let text = source.get(span.start..span.end).unwrap_or_default();

        let token = match lexeme {
            Lexeme::Newline => {
                // Blank lines collapse, and a leading newline is never emitted.
                match tokens.last() {
                    Some(last) if !last.is(TokenKind::Newline) => {
                        Token::new(TokenKind::Newline, "\\n", position)
                    }
                    _ => continue,
                }
            }
            Lexeme::Number(value, is_float) => Token::new(TokenKind::Number, text, position)
                .with_literal(Literal::Number(value, is_float)),
            Lexeme::Str(value) => Token::new(TokenKind::String, text, position)
                .with_literal(Literal::String(Rc::from(value))),
            Lexeme::Word(word) => {
                let kind = TokenKind::keyword(&word).unwrap_or(TokenKind::Identifier);
                let token = Token::new(kind, word, position);
                match kind {
                    TokenKind::True => token.with_literal(Literal::Bool(true)),
                    TokenKind::False => token.with_literal(Literal::Bool(false)),
                    _ => token,
                }
            }
            Lexeme::Symbol(kind) => Token::new(kind, text, position),
            Lexeme::Unterminated => {
                return Err(EmberError::syntax("Unterminated string", position));
            }
            Lexeme::Unexpected(c) => {
                return Err(EmberError::syntax(
                    format!("Unexpected character '{}'", c),
                    position,
                ));
            }
        };
        tokens.push(token);
    }

    let end = index.position(source.len());
    if tokens.last().is_some_and(|last| !last.is(TokenKind::Newline)) {
        tokens.push(Token::new(TokenKind::Newline, "\\n", end));
    }
    tokens.push(Token::new(TokenKind::Eof, "", end));

    log::trace!("lexed {} tokens from {} bytes", tokens.len(), source.len());
    Ok(tokens)
}
