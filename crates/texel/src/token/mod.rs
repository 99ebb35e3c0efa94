//! TeX tokens, and the machinery for tracing and writing them.

pub mod lexer;
pub mod trace;

use crate::types::CatCode;
use std::fmt::Display;
use std::num;
use texel_stdext::intern;

/// Interned name of a control sequence.
///
/// Interning makes tokens small `Copy` values. The representation is
/// opaque so that it can change without breaking downstream code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsName(num::NonZeroU32);

impl CsName {
    #[inline]
    pub fn to_usize(self) -> usize {
        self.0.get() as usize
    }
}

/// String interner for control sequence names.
pub type CsNameInterner = intern::Interner<CsName>;

impl intern::Key for CsName {
    fn try_from_index(index: usize) -> Option<Self> {
        num::NonZeroU32::try_from_index(index).map(CsName)
    }

    fn into_index(self) -> usize {
        self.0.into_index()
    }
}

/// The value of a token.
///
/// Character tokens carry their character and category code directly;
/// tokens that refer to a command carry a [CommandRef].
#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    BeginGroup(char),
    EndGroup(char),
    MathShift(char),
    AlignmentTab(char),
    Parameter(char),
    Superscript(char),
    Subscript(char),
    Space(char),
    Letter(char),
    Other(char),
    CommandRef(CommandRef),
}

impl Value {
    pub fn new(c: char, cat_code: CatCode) -> Value {
        match cat_code {
            CatCode::BeginGroup => Value::BeginGroup(c),
            CatCode::EndGroup => Value::EndGroup(c),
            CatCode::MathShift => Value::MathShift(c),
            CatCode::AlignmentTab => Value::AlignmentTab(c),
            CatCode::Parameter => Value::Parameter(c),
            CatCode::Superscript => Value::Superscript(c),
            CatCode::Subscript => Value::Subscript(c),
            CatCode::Space => Value::Space(c),
            CatCode::Letter => Value::Letter(c),
            CatCode::Other => Value::Other(c),
            CatCode::Active => Value::CommandRef(CommandRef::ActiveCharacter(c)),
            _ => panic!("cat code {cat_code} cannot appear on a token"),
        }
    }

    /// The character of the value, if it has one.
    ///
    /// Every value has a character except a control sequence reference.
    pub fn char(&self) -> Option<char> {
        match *self {
            Value::BeginGroup(c)
            | Value::EndGroup(c)
            | Value::MathShift(c)
            | Value::AlignmentTab(c)
            | Value::Parameter(c)
            | Value::Superscript(c)
            | Value::Subscript(c)
            | Value::Space(c)
            | Value::Letter(c)
            | Value::Other(c)
            | Value::CommandRef(CommandRef::ActiveCharacter(c)) => Some(c),
            Value::CommandRef(CommandRef::ControlSequence(_)) => None,
        }
    }

    /// The category code of the value, if it has one.
    pub fn cat_code(&self) -> Option<CatCode> {
        let code = match self {
            Value::BeginGroup(_) => CatCode::BeginGroup,
            Value::EndGroup(_) => CatCode::EndGroup,
            Value::MathShift(_) => CatCode::MathShift,
            Value::AlignmentTab(_) => CatCode::AlignmentTab,
            Value::Parameter(_) => CatCode::Parameter,
            Value::Superscript(_) => CatCode::Superscript,
            Value::Subscript(_) => CatCode::Subscript,
            Value::Space(_) => CatCode::Space,
            Value::Letter(_) => CatCode::Letter,
            Value::Other(_) => CatCode::Other,
            Value::CommandRef(CommandRef::ActiveCharacter(_)) => CatCode::Active,
            Value::CommandRef(CommandRef::ControlSequence(_)) => return None,
        };
        Some(code)
    }
}

/// The value of a token that references a command.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandRef {
    ControlSequence(CsName),
    ActiveCharacter(char),
}

impl CommandRef {
    pub fn to_string(self, interner: &CsNameInterner) -> String {
        match self {
            CommandRef::ControlSequence(cs_name) => match interner.resolve(cs_name) {
                Some(name) => format!("\\{name}"),
                None => "\\?".into(),
            },
            CommandRef::ActiveCharacter(c) => format!("{c}"),
        }
    }
}

/// A TeX token: a [Value] plus a trace key recording where the token
/// came from.
///
/// Equality and hashing ignore the trace key.
#[derive(Debug, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    value: Value,
    trace_key: trace::Key,
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl std::hash::Hash for Token {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

macro_rules! character_token_constructors {
    ($( ($name: ident, $value: path), )+) => {
        $(
        pub fn $name(c: char, trace_key: trace::Key) -> Token {
            Token {
                value: $value(c),
                trace_key,
            }
        }
        )+
    };
}

impl Token {
    character_token_constructors![
        (new_begin_group, Value::BeginGroup),
        (new_end_group, Value::EndGroup),
        (new_math_shift, Value::MathShift),
        (new_alignment_tab, Value::AlignmentTab),
        (new_parameter, Value::Parameter),
        (new_superscript, Value::Superscript),
        (new_subscript, Value::Subscript),
        (new_space, Value::Space),
        (new_letter, Value::Letter),
        (new_other, Value::Other),
    ];

    pub fn new_active_character(c: char, trace_key: trace::Key) -> Token {
        Token {
            value: Value::CommandRef(CommandRef::ActiveCharacter(c)),
            trace_key,
        }
    }

    pub fn new_control_sequence(name: CsName, trace_key: trace::Key) -> Token {
        Token {
            value: Value::CommandRef(CommandRef::ControlSequence(name)),
            trace_key,
        }
    }

    pub fn new_from_value(value: Value, trace_key: trace::Key) -> Token {
        Token { value, trace_key }
    }

    #[inline]
    pub fn value(&self) -> Value {
        self.value
    }

    #[inline]
    pub fn trace_key(&self) -> trace::Key {
        self.trace_key
    }

    /// The character of the token, if the token has one.
    pub fn char(&self) -> Option<char> {
        self.value.char()
    }

    /// The category code of the token, if the token has one.
    pub fn cat_code(&self) -> Option<CatCode> {
        self.value.cat_code()
    }
}

// Whitespace seen but not yet written. Leading and trailing whitespace
// is dropped entirely; interior whitespace collapses to one space, or
// to the seen number of newlines.
enum PendingWhitespace {
    NotStarted,
    None,
    Space,
    Newlines(usize),
}

impl PendingWhitespace {
    fn start(&mut self) {
        *self = PendingWhitespace::None;
    }

    fn add_space(&mut self) {
        if let PendingWhitespace::None = self {
            *self = PendingWhitespace::Space;
        }
    }

    fn add_newline(&mut self) {
        match self {
            PendingWhitespace::NotStarted => (),
            PendingWhitespace::None | PendingWhitespace::Space => {
                *self = PendingWhitespace::Newlines(1)
            }
            PendingWhitespace::Newlines(n) => *n += 1,
        }
    }
}

impl Display for PendingWhitespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PendingWhitespace::NotStarted | PendingWhitespace::None => Ok(()),
            PendingWhitespace::Space => write!(f, " "),
            PendingWhitespace::Newlines(n) => {
                for _ in 0..*n {
                    writeln!(f)?;
                }
                Ok(())
            }
        }
    }
}

/// Writes tokens to an IO writer, normalizing whitespace.
pub struct Writer<I> {
    io_writer: I,
    pending_whitespace: PendingWhitespace,
}

impl<I: Default> Default for Writer<I> {
    fn default() -> Self {
        Self::new(Default::default())
    }
}

impl<I> Writer<I> {
    /// Create a new writer over the provided IO writer.
    pub fn new(io_writer: I) -> Self {
        Self {
            io_writer,
            pending_whitespace: PendingWhitespace::NotStarted,
        }
    }

    pub fn take_io_writer(self) -> I {
        self.io_writer
    }
}

impl<I: std::io::Write> Writer<I> {
    /// Write a token.
    pub fn write(&mut self, interner: &CsNameInterner, token: Token) -> Result<(), std::io::Error> {
        match &token.value {
            Value::CommandRef(CommandRef::ControlSequence(s)) => {
                write!(
                    self.io_writer,
                    "{}\\{}",
                    self.pending_whitespace,
                    interner.resolve(*s).unwrap_or("?")
                )?;
                self.pending_whitespace.start();
            }
            Value::Space('\n') => self.pending_whitespace.add_newline(),
            Value::Space(_) => self.pending_whitespace.add_space(),
            _ => {
                if let Some(c) = token.char() {
                    write!(self.io_writer, "{}{}", self.pending_whitespace, c)?;
                    self.pending_whitespace.start();
                }
            }
        }
        self.io_writer.flush()
    }
}

/// Write a collection of tokens to a string.
pub fn write_tokens<'a, T>(tokens: T, interner: &CsNameInterner) -> String
where
    T: IntoIterator<Item = &'a Token>,
{
    let mut writer: Writer<Vec<u8>> = Default::default();
    for token in tokens.into_iter() {
        // Writing to a Vec<u8> cannot fail.
        let _ = writer.write(interner, *token);
    }
    let buffer = writer.take_io_writer();
    String::from_utf8_lossy(&buffer).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error;

    enum Input {
        Cs(&'static str),
        Char(char, CatCode),
    }
    use Input::{Char, Cs};

    fn check_write(input: Vec<Input>, want: &str) {
        let mut tokens: Vec<Token> = vec![];
        let mut interner = CsNameInterner::default();
        for t in input {
            tokens.push(match t {
                Cs(name) => {
                    Token::new_control_sequence(interner.get_or_intern(name), trace::Key::dummy())
                }
                Char(c, code) => Token::new_from_value(Value::new(c, code), trace::Key::dummy()),
            });
        }
        assert_eq!(write_tokens(&tokens, &interner), want);
    }

    #[test]
    fn write_nothing() {
        check_write(vec![], "");
    }

    #[test]
    fn leading_whitespace_is_dropped() {
        check_write(
            vec![
                Char('\n', CatCode::Space),
                Char('\n', CatCode::Space),
                Char('H', CatCode::Letter),
            ],
            "H",
        );
    }

    #[test]
    fn trailing_whitespace_is_dropped() {
        check_write(
            vec![
                Char('H', CatCode::Letter),
                Char('\n', CatCode::Space),
                Char(' ', CatCode::Space),
            ],
            "H",
        );
    }

    #[test]
    fn interior_spaces_collapse() {
        check_write(
            vec![
                Char('H', CatCode::Letter),
                Char(' ', CatCode::Space),
                Char(' ', CatCode::Space),
                Char('W', CatCode::Letter),
            ],
            "H W",
        );
    }

    #[test]
    fn interior_newlines_are_kept() {
        check_write(
            vec![
                Char('H', CatCode::Letter),
                Char('\n', CatCode::Space),
                Char(' ', CatCode::Space),
                Char('\n', CatCode::Space),
                Char('W', CatCode::Letter),
            ],
            "H\n\nW",
        );
    }

    #[test]
    fn control_sequence_then_letter() {
        check_write(vec![Cs("hello"), Char('W', CatCode::Letter)], "\\helloW");
    }

    // Tokens are stored and copied constantly, so their size is part of
    // the contract.
    #[test]
    fn token_size() {
        assert_eq!(std::mem::size_of::<Value>(), 8);
        assert_eq!(std::mem::size_of::<Token>(), 12);
        assert_eq!(std::mem::size_of::<Result<Token, ()>>(), 12);
        assert_eq!(std::mem::size_of::<Result<Token, Box<error::Error>>>(), 16);
    }
}
