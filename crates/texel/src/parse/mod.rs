//! Parsing of TeX grammar elements from token streams.
//!
//! The central type is the [Parsable] trait. A Rust type that
//! corresponds to a TeX grammar element implements the trait, and the
//! implementation knows how to scan that element off the front of an
//! input stream.
//!
//! Tuples of parsable types are themselves parsable, element by element.
//! A grammar production like `<integer><relation><integer>` is parsed
//! with one [Parsable::parse] call on `(i32, parse::Ordering, i32)`.
//!
//! Marker types such as [OptionalEquals] and [OptionalBy] stand for the
//! optional filler in TeX's grammar; parsing them consumes the filler if
//! present and returns nothing of interest. A few free functions handle
//! cases that do not fit the trait, like token lists.

#[macro_use]
mod helpers;

mod dimen;
mod filelocation;
mod glue;
mod keyword;
mod number;
mod relation;
#[cfg(test)]
mod testing;

pub use filelocation::FileLocation;
pub use keyword::parse_keyword;
pub use keyword::OptionalBy;
pub use keyword::To;
pub use number::Uint;
pub use relation::Ordering;

use crate::error;
use crate::token;
use crate::traits::*;
use crate::vm;

/// A TeX grammar element that can be scanned off a token stream.
pub trait Parsable<S: TexelState>: Sized {
    /// Parses a value from an input stream.
    ///
    /// Delegates to [Parsable::parse_impl].
    #[inline]
    fn parse<I>(input: &mut I) -> Result<Self, Box<error::Error>>
    where
        I: AsMut<vm::ExpandedStream<S>>,
    {
        Parsable::parse_impl(input.as_mut())
    }

    /// Parses a value from the [vm::ExpandedStream].
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> Result<Self, Box<error::Error>>;
}

/// A failure to parse a specific element of the TeX grammar.
///
/// The error message has the shape "expected X, instead Y". The `Y`
/// part is derived from the offending token, unless overridden.
#[derive(Debug)]
pub struct Error {
    pub expected: String,
    pub got: Option<token::Token>,
    pub got_override: String,
    pub annotation_override: String,
    pub guidance: String,
}

impl Error {
    pub fn new<T: Into<String>, R: Into<String>>(
        expected: T,
        got: Option<token::Token>,
        guidance: R,
    ) -> Self {
        Error {
            expected: expected.into(),
            got,
            got_override: "".into(),
            annotation_override: "".into(),
            guidance: guidance.into(),
        }
    }

    pub fn with_got_override<T: Into<String>>(mut self, got_override: T) -> Self {
        self.got_override = got_override.into();
        self
    }

    pub fn with_annotation_override<T: Into<String>>(mut self, annotation_override: T) -> Self {
        self.annotation_override = annotation_override.into();
        self
    }

    fn describe_got(&self) -> String {
        if !self.got_override.is_empty() {
            return self.got_override.clone();
        }
        let token = match self.got {
            None => return "the input ended".to_string(),
            Some(token) => token,
        };
        match token.value() {
            token::Value::Letter(c) => format!["found the letter {c}"],
            token::Value::Other(c) => format!["found a non-letter character {c}"],
            token::Value::CommandRef(_) => {
                "found a control sequence or active character".to_string()
            }
            _ => match (token.char(), token.cat_code()) {
                (Some(c), Some(code)) => {
                    format!["found a token with value {c} and category code {code}"]
                }
                _ => "found an unexpected token".to_string(),
            },
        }
    }
}

impl error::TexError for Error {
    fn kind(&self) -> error::Kind {
        match self.got {
            None => error::Kind::EndOfInput,
            Some(token) => error::Kind::Token(token),
        }
    }

    fn title(&self) -> String {
        format!["expected {}, instead {}", self.expected, self.describe_got()]
    }

    fn notes(&self) -> Vec<error::display::Note> {
        match self.guidance.is_empty() {
            true => vec![],
            false => vec![self.guidance.clone().into()],
        }
    }

    fn source_annotation(&self) -> String {
        if !self.annotation_override.is_empty() {
            return self.annotation_override.clone();
        }
        match self.got {
            Some(t) => match (t.char(), t.cat_code()) {
                (Some(c), Some(code)) => {
                    format!["character token with value {c} and category code {code}"]
                }
                _ => "control sequence".to_string(),
            },
            None => "input ended here".into(),
        }
    }
}

macro_rules! tuple_parsable_impls {
    ( $first: ident ) => {};
    ( $first: ident, $( $name: ident ),+ ) => {
        tuple_parsable_impls![ $( $name ),+];

        impl<S: TexelState, $first : Parsable<S>, $( $name : Parsable<S> ),+> Parsable<S> for ($first, $( $name ),+) {
            fn parse_impl(input: &mut vm::ExpandedStream<S>) -> Result<Self, Box<error::Error>> {
                Ok(($first::parse(input)?, $( $name::parse(input)? ),+))
            }
        }
    };
}

tuple_parsable_impls![T1, T2, T3, T4, T5];

impl<S: TexelState> Parsable<S> for token::CommandRef {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> Result<Self, Box<error::Error>> {
        skip_spaces(input.unexpanded())?;
        Ok(get_required_element![
            input.unexpanded(),
            "a control sequence or active character",
            "a command must be a control sequence or an active character",
            token::Value::CommandRef(command_ref) => command_ref,
        ])
    }
}

fn skip_spaces<S: TexelState, I: TokenStream<S = S>>(
    input: &mut I,
) -> Result<(), Box<error::Error>> {
    loop {
        let skipped = get_optional_element![
            input,
            token::Value::Space(_) => (),
        ];
        if skipped.is_none() {
            return Ok(());
        }
    }
}

/// When parsed, consumes an optional equals sign and surrounding spaces.
pub struct OptionalEquals;

impl<S: TexelState> Parsable<S> for OptionalEquals {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> Result<Self, Box<error::Error>> {
        parse_optional_equals(input)?;
        Ok(OptionalEquals {})
    }
}

/// Like [OptionalEquals], but scanned without expansion.
pub struct OptionalEqualsUnexpanded;

impl<S: TexelState> Parsable<S> for OptionalEqualsUnexpanded {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> Result<Self, Box<error::Error>> {
        parse_optional_equals(input.unexpanded())?;
        Ok(OptionalEqualsUnexpanded {})
    }
}

// TeX.2021.405 (scan_optional_equals): skip spaces, then at most one
// equals sign, then spaces again.
fn parse_optional_equals<S: TexelState, I: TokenStream<S = S>>(
    input: &mut I,
) -> Result<(), Box<error::Error>> {
    loop {
        match get_optional_element![
            input,
            token::Value::Other('=') => true,
            token::Value::Space(_) => false,
        ] {
            Some(true) | None => break,
            Some(false) => continue,
        }
    }
    skip_spaces(input)
}

/// When parsed, consumes an optional space from the token stream.
pub struct OptionalSpace;

impl<S: TexelState> Parsable<S> for OptionalSpace {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> Result<Self, Box<error::Error>> {
        // Probed without expansion: the space is optional, and a following
        // expandable command must not run before the current value is stored.
        get_optional_element![
            input.unexpanded(),
            token::Value::Space(_) => (),
        ];
        Ok(OptionalSpace {})
    }
}

/// Reads tokens until the end of the current group.
///
/// Begin and end group tokens inside the balanced text are kept; the
/// final end group token is consumed but not kept. Returns false if the
/// input ended before the group closed.
pub fn parse_balanced_tokens<S: vm::TokenStream>(
    stream: &mut S,
    result: &mut Vec<token::Token>,
) -> Result<bool, Box<error::Error>> {
    let mut scope_depth = 0;
    while let Some(token) = stream.next()? {
        match token.value() {
            token::Value::BeginGroup(_) => {
                scope_depth += 1;
            }
            token::Value::EndGroup(_) => {
                if scope_depth == 0 {
                    return Ok(true);
                }
                scope_depth -= 1;
            }
            _ => (),
        }
        result.push(token);
    }
    Ok(false)
}

/// Parses a token list: a balanced group `{...}`.
///
/// The tokens in the group are not expanded. This is the right hand
/// side grammar of `\toks 0 = {a token list}`.
pub fn parse_token_list<S: TexelState>(
    input: &mut vm::ExpandedStream<S>,
) -> Result<Vec<token::Token>, Box<error::Error>> {
    get_required_element![
        input,
        "the beginning of a token list",
        "a token list is a sequence of tokens surrounded by balanced braces",
        token::Value::BeginGroup(_) => (),
    ];
    let mut result = Vec::new();
    let finished = parse_balanced_tokens(input.unexpanded(), &mut result)?;
    if !finished {
        return Err(input.eof_error(error::SimpleEndOfInputError::new("reading a token list")));
    }
    Ok(result)
}
