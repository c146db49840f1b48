//! Pattern lexer.
//!
//! Splits textual patterns like `java.util.Map.put(Object, Object) Object` into tokens,
//! keeping the byte position of each token for error reporting.

use std::{iter::Peekable, str::CharIndices};

use crate::{PatternError, mode::is_identifier_part};

/// A token of the pattern syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// An identifier, possibly containing `*` and `?` wildcards.
    Word(String),
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `<`
    LAngle,
    /// `>`
    RAngle,
    /// `[]`
    Dims,
    /// `...`
    Ellipsis,
}

/// A token with the byte position it starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    /// The token.
    pub token: Token,
    /// Byte offset in the input.
    pub position: usize,
}

/// Tokenizes a pattern string.
struct Lexer<'a> {
    /// The original input.
    input: &'a str,
    /// Characters with their byte offsets.
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over `input`.
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    /// Tokenizes the whole input.
    fn tokenize(mut self) -> Result<Vec<Spanned>, PatternError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Returns the next token, or `None` at the end of input.
    fn next_token(&mut self) -> Result<Option<Spanned>, PatternError> {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}

        let Some(&(position, ch)) = self.chars.peek() else {
            return Ok(None);
        };

        let token = match ch {
            '.' => return self.read_dots(position).map(Some),
            '[' => {
                self.chars.next();
                if self.chars.next_if(|(_, c)| *c == ']').is_none() {
                    return Err(PatternError::syntax("expected ']'", position, self.input));
                }
                Token::Dims
            }
            ',' => self.single(Token::Comma),
            '(' => self.single(Token::LParen),
            ')' => self.single(Token::RParen),
            '<' => self.single(Token::LAngle),
            '>' => self.single(Token::RAngle),
            c if is_word_char(c) => {
                let mut word = String::new();
                while let Some((_, c)) = self.chars.next_if(|(_, c)| is_word_char(*c)) {
                    word.push(c);
                }
                Token::Word(word)
            }
            other => {
                return Err(PatternError::syntax(
                    format!("unexpected character '{other}'"),
                    position,
                    self.input,
                ));
            }
        };

        Ok(Some(Spanned { token, position }))
    }

    /// Consumes one character and returns `token`.
    fn single(&mut self, token: Token) -> Token {
        self.chars.next();
        token
    }

    /// Reads `.` or `...`.
    fn read_dots(&mut self, position: usize) -> Result<Spanned, PatternError> {
        let mut dots = 0;
        while self.chars.next_if(|(_, c)| *c == '.').is_some() {
            dots += 1;
        }
        let token = match dots {
            1 => Token::Dot,
            3 => Token::Ellipsis,
            _ => return Err(PatternError::syntax("unexpected '.'", position, self.input)),
        };
        Ok(Spanned { token, position })
    }
}

/// Characters allowed inside a word.
fn is_word_char(ch: char) -> bool {
    is_identifier_part(ch) || ch == '*' || ch == '?'
}

/// Tokenizes a pattern string.
pub fn tokenize(input: &str) -> Result<Vec<Spanned>, PatternError> {
    Lexer::new(input).tokenize()
}
