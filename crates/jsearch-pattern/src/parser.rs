//! Pattern parser.
//!
//! Parses textual patterns with recursive descent and hands the parts to
//! [`PatternBuilder`].
//!
//! # Grammar
//!
//! ```text
//! type        → qualified type_args?
//! package     → qualified
//! constructor → qualified type_args? parameters?
//! method      → qualified parameters? type_ref?
//! field       → qualified type_ref?
//! parameters  → "(" (type_ref ("," type_ref)*)? ")"
//! type_ref    → qualified type_args? "[]"* "..."?
//! type_args   → "<" type_arg ("," type_arg)* ">"
//! type_arg    → type_ref (("extends" | "super") type_ref)?
//! qualified   → WORD ("." WORD)*
//! ```
//!
//! Type arguments are erased from parameter, return and field types. For type
//! declarations, qualification segments from the first capitalized one onward name
//! enclosing types. Regular expression patterns skip the grammar: the whole text is the
//! primary name.

use crate::{
    LimitTo, MatchMode, MatchRule, Pattern, PatternBuilder, PatternError, SearchFor,
    lexer::{Spanned, Token, tokenize},
    pattern::SuperTypeFilter,
};

/// A parsed type reference.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TypeRef {
    /// Erased name with array dimensions (`java.util.List[]`).
    erased: String,
    /// Name as written, type arguments included.
    full: String,
    /// Whether the reference ended with `...`.
    varargs: bool,
}

/// Recursive descent parser over a token stream.
struct Parser<'a> {
    /// Tokens to parse.
    tokens: Vec<Spanned>,
    /// Index of the current token.
    position: usize,
    /// Original input, for error rendering.
    input: &'a str,
}

impl<'a> Parser<'a> {
    /// Creates a parser over `input`.
    fn new(input: &'a str) -> Result<Self, PatternError> {
        Ok(Self {
            tokens: tokenize(input)?,
            position: 0,
            input,
        })
    }

    /// Returns the current token.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|s| &s.token)
    }

    /// Byte offset of the current token, or the input length at the end.
    fn offset(&self) -> usize {
        self.tokens
            .get(self.position)
            .map_or(self.input.len(), |s| s.position)
    }

    /// Consumes the current token if it equals `token`.
    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// Creates a syntax error at the current token.
    fn error(&self, message: impl Into<String>) -> PatternError {
        PatternError::syntax(message, self.offset(), self.input)
    }

    /// Consumes `token` or fails with `message`.
    fn expect(&mut self, token: &Token, message: &str) -> Result<(), PatternError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    /// Fails unless all tokens were consumed.
    fn finish(&self) -> Result<(), PatternError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(self.error(format!("unexpected {token:?}"))),
        }
    }

    /// Parses: qualified → WORD ("." WORD)*
    fn parse_qualified(&mut self) -> Result<String, PatternError> {
        let mut name = self.parse_word()?;
        while self.eat(&Token::Dot) {
            name.push('.');
            name.push_str(&self.parse_word()?);
        }
        Ok(name)
    }

    /// Parses a single word.
    fn parse_word(&mut self) -> Result<String, PatternError> {
        match self.peek() {
            Some(Token::Word(word)) => {
                let word = word.clone();
                self.position += 1;
                Ok(word)
            }
            _ => Err(self.error("expected a name")),
        }
    }

    /// Parses: type_args → "<" type_arg ("," type_arg)* ">", returning each argument
    /// as written. Returns an empty list when no `<` follows.
    fn parse_type_args(&mut self) -> Result<Vec<String>, PatternError> {
        if !self.eat(&Token::LAngle) {
            return Ok(Vec::new());
        }
        let mut args = vec![self.parse_type_arg()?];
        while self.eat(&Token::Comma) {
            args.push(self.parse_type_arg()?);
        }
        self.expect(&Token::RAngle, "expected '>'")?;
        Ok(args)
    }

    /// Parses: type_arg → type_ref (("extends" | "super") type_ref)?
    fn parse_type_arg(&mut self) -> Result<String, PatternError> {
        let mut arg = self.parse_type_ref()?.full;
        if let Some(Token::Word(word)) = self.peek()
            && (word == "extends" || word == "super")
        {
            let bound = word.clone();
            self.position += 1;
            let bounded = self.parse_type_ref()?;
            arg = format!("{arg} {bound} {}", bounded.full);
        }
        Ok(arg)
    }

    /// Parses: type_ref → qualified type_args? "[]"* "..."?
    fn parse_type_ref(&mut self) -> Result<TypeRef, PatternError> {
        let name = self.parse_qualified()?;
        let args = self.parse_type_args()?;
        let mut dims = String::new();
        while self.eat(&Token::Dims) {
            dims.push_str("[]");
        }
        let varargs = self.eat(&Token::Ellipsis);

        let mut full = name.clone();
        if !args.is_empty() {
            full = format!("{full}<{}>", args.join(", "));
        }
        full.push_str(&dims);
        let mut erased = name;
        erased.push_str(&dims);
        if varargs {
            full.push_str("...");
            erased.push_str("[]");
        }

        Ok(TypeRef {
            erased,
            full,
            varargs,
        })
    }

    /// Parses: parameters → "(" (type_ref ("," type_ref)*)? ")"
    ///
    /// Returns `None` when no parameter list is present.
    fn parse_parameters(&mut self) -> Result<Option<Vec<TypeRef>>, PatternError> {
        if !self.eat(&Token::LParen) {
            return Ok(None);
        }
        let mut params = Vec::new();
        if !self.eat(&Token::RParen) {
            params.push(self.parse_type_ref()?);
            while self.eat(&Token::Comma) {
                params.push(self.parse_type_ref()?);
            }
            self.expect(&Token::RParen, "expected ',' or ')'")?;
        }
        if let Some(pos) = params.iter().position(|p| p.varargs)
            && pos + 1 != params.len()
        {
            return Err(PatternError::syntax(
                "only the last parameter may be variable-arity",
                self.offset(),
                self.input,
            ));
        }
        Ok(Some(params))
    }

    /// Parses an optional trailing type (method return or field type).
    fn parse_trailing_type(&mut self) -> Result<Option<TypeRef>, PatternError> {
        if matches!(self.peek(), Some(Token::Word(_))) {
            self.parse_type_ref().map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Splits a dotted name at its last segment.
fn split_last(name: &str) -> (Option<&str>, &str) {
    match name.rfind('.') {
        Some(i) => (Some(&name[..i]), &name[i + 1..]),
        None => (None, name),
    }
}

/// Splits a type declaration qualification into package and enclosing type names.
fn split_package(qualification: &str) -> (Option<&str>, Option<&str>) {
    let mut offset = 0;
    for segment in qualification.split('.') {
        if segment.starts_with(char::is_uppercase) {
            let package = (offset > 0).then(|| &qualification[..offset - 1]);
            return (package, Some(&qualification[offset..]));
        }
        offset += segment.len() + 1;
    }
    (Some(qualification), None)
}

/// Borrows the erased names of parsed parameters.
fn erased_names(params: &[TypeRef]) -> Vec<&str> {
    params.iter().map(|p| p.erased.as_str()).collect()
}

/// Parses a textual pattern for the given element kind.
pub fn parse_pattern(
    text: &str,
    search_for: SearchFor,
    limit: LimitTo,
    rule: MatchRule,
) -> Result<Pattern, PatternError> {
    let builder = PatternBuilder::new(limit).rule(rule);
    if rule.mode == MatchMode::Regex {
        return parse_regex(text.trim(), search_for, builder);
    }

    let mut parser = Parser::new(text)?;
    match search_for {
        SearchFor::Type | SearchFor::TypeDeclaration | SearchFor::SuperTypeReference => {
            let name = parser.parse_qualified()?;
            parser.parse_type_args()?;
            parser.finish()?;
            match search_for {
                SearchFor::TypeDeclaration => {
                    let (qualification, simple) = split_last(&name);
                    let (package, enclosing) = qualification.map_or((None, None), split_package);
                    builder.type_declaration(package, enclosing, simple, None)
                }
                SearchFor::SuperTypeReference => {
                    builder.super_type_reference(&name, SuperTypeFilter::All)
                }
                _ => builder.type_pattern(&name),
            }
        }
        SearchFor::Package => {
            let name = parser.parse_qualified()?;
            parser.finish()?;
            builder.package(&name)
        }
        SearchFor::Constructor => {
            let name = parser.parse_qualified()?;
            let type_arguments = parser.parse_type_args()?;
            let params = parser.parse_parameters()?;
            parser.finish()?;
            let names = params.as_deref().map(erased_names);
            let varargs = params.iter().flatten().any(|p| p.varargs);
            builder.constructor(&name, type_arguments, names.as_deref(), varargs)
        }
        SearchFor::Method => {
            let name = parser.parse_qualified()?;
            let params = parser.parse_parameters()?;
            let return_type = parser.parse_trailing_type()?;
            parser.finish()?;
            let (declaring, selector) = split_last(&name);
            let names = params.as_deref().map(erased_names);
            let varargs = params.iter().flatten().any(|p| p.varargs);
            builder.method(
                declaring,
                selector,
                names.as_deref(),
                return_type.as_ref().map(|t| t.erased.as_str()),
                varargs,
            )
        }
        SearchFor::Field => {
            let name = parser.parse_qualified()?;
            let field_type = parser.parse_trailing_type()?;
            parser.finish()?;
            let (declaring, field) = split_last(&name);
            builder.field(
                declaring,
                field,
                field_type.as_ref().map(|t| t.erased.as_str()),
            )
        }
    }
}

/// Builds a regular-expression pattern whose primary name is the whole text.
fn parse_regex(
    text: &str,
    search_for: SearchFor,
    builder: PatternBuilder,
) -> Result<Pattern, PatternError> {
    if text.is_empty() {
        return Err(PatternError::syntax("expected a name", 0, text));
    }
    match search_for {
        SearchFor::Type => builder.type_pattern(text),
        SearchFor::TypeDeclaration => builder.type_declaration(None, None, text, None),
        SearchFor::SuperTypeReference => builder.super_type_reference(text, SuperTypeFilter::All),
        SearchFor::Method => builder.method(None, text, None, None, false),
        SearchFor::Constructor => builder.constructor(text, Vec::new(), None, false),
        SearchFor::Field => builder.field(None, text, None),
        SearchFor::Package => builder.package(text),
    }
}
