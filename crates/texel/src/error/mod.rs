//! Error types and error tracing.
//!
//! There are two layers of error types. An individual failure condition
//! is a struct implementing [TexError], or [EndOfInputError] when the
//! failure is that the input ran out. Primitives define their own small
//! error structs so that each message can carry exactly the notes and
//! source references it needs.
//!
//! When such an error is returned towards the main loop it is boxed into
//! the concrete [Error] type. Construction of an [Error] immediately
//! resolves every referenced token to a source code position: the trace
//! data inside the VM keeps changing as interpretation continues, so
//! waiting until display time would produce wrong positions. As the error
//! bubbles up, each operation that forwards it appends a
//! [StackTraceElement].

use std::collections::HashMap;

use crate::token;
use crate::token::trace;
use crate::vm;
use texel_stdext::distance;

pub mod display;

/// Classification of an error, determining how its source is displayed.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Kind {
    /// The error is anchored at a specific token; for example, a letter
    /// appeared where a number was expected.
    Token(token::Token),
    /// The input ended too early; for example, inside a macro definition.
    EndOfInput,
    /// A condition outside the source code failed; for example, a file to
    /// be read does not exist.
    FailedPrecondition,
}

/// A single failure condition in TeX source code.
pub trait TexError: std::fmt::Debug + 'static {
    fn kind(&self) -> Kind;

    fn title(&self) -> String;

    fn notes(&self) -> Vec<display::Note> {
        vec![]
    }

    /// The label printed under the offending source code.
    fn source_annotation(&self) -> String {
        match TexError::kind(self) {
            Kind::Token(t) => match (t.char(), t.cat_code()) {
                (Some(c), Some(code)) => {
                    format!["character token with value {c} and category code {code}"]
                }
                _ => "control sequence".to_string(),
            },
            Kind::EndOfInput => "input ended here".into(),
            Kind::FailedPrecondition => "error occurred while running this command".into(),
        }
    }
}

/// A failure condition where the input ended prematurely.
pub trait EndOfInputError: std::fmt::Debug + 'static {
    /// What the interpreter was doing when the input ran out; e.g.
    /// "scanning the argument of \\def".
    fn doing(&self) -> String;

    fn notes(&self) -> Vec<display::Note> {
        vec![]
    }
}

// Adapter that presents an EndOfInputError as a TexError.
#[derive(Debug)]
pub(crate) struct EofError {
    doing: String,
    notes: Vec<display::Note>,
}

impl EofError {
    pub(crate) fn new<E: EndOfInputError>(err: E) -> Self {
        Self {
            doing: err.doing(),
            notes: err.notes(),
        }
    }
}

impl TexError for EofError {
    fn kind(&self) -> Kind {
        Kind::EndOfInput
    }

    fn title(&self) -> String {
        format!("Unexpected end of input while {}", self.doing)
    }

    fn notes(&self) -> Vec<display::Note> {
        self.notes.clone()
    }
}

/// A boxed error with fully resolved source positions.
///
/// Serializing and deserializing this type erases the underlying error's
/// concrete type; the serialization format is private.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Error {
    #[cfg_attr(
        feature = "serde",
        serde(
            serialize_with = "serialize_boxed_error",
            deserialize_with = "deserialize_boxed_error"
        )
    )]
    pub error: Box<dyn TexError>,
    pub stack_trace: Vec<StackTraceElement>,
    pub token_traces: HashMap<token::Token, trace::Locator>,
    pub end_of_input_trace: Option<trace::Locator>,
}

impl Error {
    pub(crate) fn new(
        error: Box<dyn TexError>,
        tracer: &trace::Tracer,
        cs_name_interner: &token::CsNameInterner,
    ) -> Box<Error> {
        // Collect every token the error message will reference: the
        // anchor token, if any, plus tokens in source code trace notes.
        let (end_of_input_trace, mut referenced) = match error.kind() {
            Kind::Token(token) => (None, vec![token]),
            Kind::EndOfInput => (Some(tracer.locate_end_of_input()), vec![]),
            Kind::FailedPrecondition => (None, vec![]),
        };
        for note in error.notes() {
            if let display::Note::SourceCodeTrace(_, token) = note {
                referenced.push(token);
            }
        }
        let token_traces = referenced
            .into_iter()
            .map(|token| (token, tracer.locate(token, cs_name_interner)))
            .collect();
        Box::new(Error {
            error,
            stack_trace: vec![],
            token_traces,
            end_of_input_trace,
        })
    }

    /// Record that the error passed through the given operation at the
    /// given token.
    pub(crate) fn propagate<S>(
        vm: &vm::VM<S>,
        context: OperationKind,
        token: token::Token,
        mut err: Box<Error>,
    ) -> Box<Error> {
        err.stack_trace.push(StackTraceElement {
            context,
            token,
            trace: vm.trace(token),
        });
        err
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        display::format_error(f, self)
    }
}

/// One hop in the path an error took to the main loop.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StackTraceElement {
    pub context: OperationKind,
    pub token: token::Token,
    pub trace: trace::Locator,
}

/// The operation that was running when an error was propagated.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperationKind {
    Expansion,
    Execution,
    VariableIndex,
    VariableAssignment,
}

impl OperationKind {
    pub(crate) fn action(&self) -> &'static str {
        match self {
            OperationKind::Expansion => "expanding this command",
            OperationKind::Execution => "executing this command",
            OperationKind::VariableIndex => "determining the index of this variable",
            OperationKind::VariableAssignment => "determining the value to assign to this variable",
        }
    }
}

#[cfg(feature = "serde")]
#[allow(clippy::borrowed_box)] // serde requires this exact signature.
fn serialize_boxed_error<S>(value: &Box<dyn TexError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::Serialize;
    TypeErasedError {
        kind: value.kind(),
        title: value.title(),
        notes: value.notes(),
        source_annotation: value.source_annotation(),
    }
    .serialize(serializer)
}

#[cfg(feature = "serde")]
fn deserialize_boxed_error<'de, D>(deserializer: D) -> Result<Box<dyn TexError>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    Ok(Box::new(TypeErasedError::deserialize(deserializer)?))
}

// The serialized form of a TexError: just the answers to all the trait
// methods, with the original type forgotten.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct TypeErasedError {
    kind: Kind,
    title: String,
    notes: Vec<display::Note>,
    source_annotation: String,
}

impl TexError for TypeErasedError {
    fn kind(&self) -> Kind {
        self.kind.clone()
    }
    fn title(&self) -> String {
        self.title.clone()
    }
    fn notes(&self) -> Vec<display::Note> {
        self.notes.clone()
    }
    fn source_annotation(&self) -> String {
        self.source_annotation.clone()
    }
}

/// An error anchored at a token, with a title and nothing else.
#[derive(Debug)]
pub struct SimpleTokenError {
    pub token: token::Token,
    pub title: String,
}

impl SimpleTokenError {
    pub fn new<T: AsRef<str>>(token: token::Token, title: T) -> SimpleTokenError {
        SimpleTokenError {
            token,
            title: title.as_ref().into(),
        }
    }
}

impl TexError for SimpleTokenError {
    fn kind(&self) -> Kind {
        Kind::Token(self.token)
    }

    fn title(&self) -> String {
        self.title.clone()
    }
}

/// An end of input error with a description and nothing else.
#[derive(Debug)]
pub struct SimpleEndOfInputError {
    pub doing: String,
}

impl SimpleEndOfInputError {
    pub fn new<T: AsRef<str>>(doing: T) -> Self {
        Self {
            doing: doing.as_ref().into(),
        }
    }
}

impl EndOfInputError for SimpleEndOfInputError {
    fn doing(&self) -> String {
        self.doing.clone()
    }
}

/// A failed precondition error with a title and optional textual notes.
#[derive(Debug)]
pub struct SimpleFailedPreconditionError {
    pub title: String,
    pub text_notes: Vec<String>,
}

impl SimpleFailedPreconditionError {
    pub fn new<T: AsRef<str>>(title: T) -> Self {
        Self {
            title: title.as_ref().into(),
            text_notes: vec![],
        }
    }

    pub fn with_note<T: Into<String>>(mut self, note: T) -> Self {
        self.text_notes.push(note.into());
        self
    }
}

impl TexError for SimpleFailedPreconditionError {
    fn kind(&self) -> Kind {
        Kind::FailedPrecondition
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn notes(&self) -> Vec<display::Note> {
        self.text_notes.iter().map(display::Note::from).collect()
    }
}

/// The error for a control sequence or active character with no meaning.
///
/// The error searches the commands map for similarly spelled names so
/// that likely typos come with a suggestion.
#[derive(Debug)]
pub struct UndefinedCommandError {
    /// The token that referred to an undefined command.
    pub token: token::Token,
    /// Defined commands whose names are spelled similarly.
    pub close_names: Vec<distance::Suggestion>,
}

impl UndefinedCommandError {
    pub fn new<S>(vm: &vm::VM<S>, token: token::Token) -> UndefinedCommandError {
        let name = match &token.value() {
            token::Value::CommandRef(token::CommandRef::ControlSequence(cs_name)) => {
                match vm.cs_name_interner().resolve(*cs_name) {
                    Some(name) => name.to_string(),
                    None => {
                        return UndefinedCommandError {
                            token,
                            close_names: vec![],
                        }
                    }
                }
            }
            token::Value::CommandRef(token::CommandRef::ActiveCharacter(c)) => c.to_string(),
            _ => panic!("undefined command error does not work for non-command-ref tokens"),
        };
        let defined_names: Vec<&str> = vm
            .context
            .command_refs()
            .filter_map(|command_ref| match command_ref {
                token::CommandRef::ControlSequence(cs_name) => {
                    vm.cs_name_interner().resolve(cs_name)
                }
                token::CommandRef::ActiveCharacter(_) => None,
            })
            .collect();
        let close_names = distance::suggestions(&defined_names, &name)
            .into_iter()
            .filter(|suggestion| suggestion.distance <= 2)
            .collect();
        UndefinedCommandError { token, close_names }
    }
}

impl TexError for UndefinedCommandError {
    fn kind(&self) -> Kind {
        Kind::Token(self.token)
    }

    fn title(&self) -> String {
        "undefined control sequence".into()
    }

    fn notes(&self) -> Vec<display::Note> {
        use texel_stdext::color::Colorize;
        let mut notes: Vec<display::Note> = Default::default();
        if let Some(close_name) = self.close_names.first() {
            notes.push(format!["did you mean \\{}?\n", close_name.word.as_str().bold()].into());
        }
        notes
    }
}
