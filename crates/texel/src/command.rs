//! The command model.
//!
//! Every control sequence (and every active character) that the
//! interpreter understands maps to a [Command]. A command is either a
//! primitive, implemented as a Rust function, or a piece of data created
//! at run time: a user defined macro, a variable reference, or an alias
//! created with `\let` or `\chardef`.
//!
//! Primitives come in two flavors that mirror TeX's split between
//! expandable and unexpandable commands. An expansion primitive like
//! `\the` or `\ifnum` can only consume tokens and push replacement tokens
//! onto the input; it runs even when tokens are merely being expanded,
//! as inside `\edef`. An execution primitive like `\def` or `\kern` runs
//! in the main loop only and is the only kind of command that may mutate
//! the state.

use crate::prelude as tx;
use crate::texmacro;
use crate::token;
use crate::variable;
use crate::vm;
use std::num;
use std::rc;
use std::sync;

/// The signature of expansion primitives.
pub type ExpansionFn<S> =
    fn(token: token::Token, input: &mut vm::ExpansionInput<S>) -> tx::Result<()>;

/// The signature of execution primitives.
pub type ExecutionFn<S> =
    fn(token: token::Token, input: &mut vm::ExecutionInput<S>) -> tx::Result<()>;

/// The meaning of a control sequence or active character.
pub enum Command<S> {
    /// An expansion primitive, like `\the` or `\ifnum`.
    Expansion(ExpansionFn<S>, Option<Tag>),

    /// A macro created at run time with `\def` or one of its variants.
    Macro(rc::Rc<texmacro::Macro>),

    /// An execution primitive, like `\def` or `\kern`.
    Execution(ExecutionFn<S>, Option<Tag>),

    /// A reference to a variable, like `\count` or `\year`.
    Variable(rc::Rc<variable::Command<S>>),

    /// An alias for a character token, created with `\let\cmd = <char>`.
    ///
    /// When the aliased token would be typeset the alias behaves like the
    /// token itself; in number parsing it behaves like an unexpandable
    /// command.
    CharacterTokenAlias(token::Value),

    /// A reference to a character code, created with `\chardef`.
    ///
    /// The referenced character is typeset in the main loop and read as an
    /// integer in number parsing.
    Character(char),
}

impl<S> Command<S> {
    /// The tag attached to this command, if any.
    ///
    /// Only primitives carry tags.
    pub fn tag(&self) -> Option<Tag> {
        match self {
            Command::Expansion(_, tag) | Command::Execution(_, tag) => *tag,
            _ => None,
        }
    }
}

impl<S> std::fmt::Display for Command<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let description = match self {
            Command::Expansion(..) => "an expansion command",
            Command::Macro(_) => "a user-defined macro",
            Command::Execution(..) => "an execution command",
            Command::Variable(_) => "a variable command",
            Command::CharacterTokenAlias(_) => "a character token alias",
            Command::Character(_) => "a character command",
        };
        write!(f, "{description}")
    }
}

// S is a phantom-like parameter here, so the derived Clone bound would be
// too strict.
impl<S> Clone for Command<S> {
    fn clone(&self) -> Self {
        match self {
            Command::Expansion(f, tag) => Command::Expansion(*f, *tag),
            Command::Macro(m) => Command::Macro(m.clone()),
            Command::Execution(f, tag) => Command::Execution(*f, *tag),
            Command::Variable(v) => Command::Variable(v.clone()),
            Command::CharacterTokenAlias(value) => Command::CharacterTokenAlias(*value),
            Command::Character(c) => Command::Character(*c),
        }
    }
}

impl<S> From<rc::Rc<texmacro::Macro>> for Command<S> {
    fn from(tex_macro: rc::Rc<texmacro::Macro>) -> Self {
        Command::Macro(tex_macro)
    }
}

impl<S> From<variable::Command<S>> for Command<S> {
    fn from(cmd: variable::Command<S>) -> Self {
        Command::Variable(rc::Rc::new(cmd))
    }
}

/// A command provided when the VM is built, together with its
/// documentation string.
pub struct BuiltIn<S> {
    cmd: Command<S>,
    doc: Option<&'static str>,
}

impl<S> BuiltIn<S> {
    /// Package an expansion primitive as a built-in command.
    pub fn new_expansion(f: ExpansionFn<S>) -> BuiltIn<S> {
        Command::Expansion(f, None).into()
    }

    /// Package an execution primitive as a built-in command.
    pub fn new_execution(f: ExecutionFn<S>) -> BuiltIn<S> {
        Command::Execution(f, None).into()
    }

    /// Package a variable command as a built-in command.
    pub fn new_variable(cmd: variable::Command<S>) -> BuiltIn<S> {
        Command::from(cmd).into()
    }

    /// Attach a tag to the command.
    ///
    /// Panics if the command is not a primitive, as only primitives carry
    /// tags.
    pub fn with_tag(mut self, tag: Tag) -> BuiltIn<S> {
        match &mut self.cmd {
            Command::Expansion(_, slot) | Command::Execution(_, slot) => *slot = Some(tag),
            _ => panic!("only expansion and execution commands can carry a tag"),
        }
        self
    }

    /// Attach a documentation string to the command.
    pub fn with_doc(mut self, doc: &'static str) -> BuiltIn<S> {
        self.doc = Some(doc);
        self
    }

    pub fn cmd(&self) -> &Command<S> {
        &self.cmd
    }

    pub fn doc(&self) -> Option<&'static str> {
        self.doc
    }
}

impl<S> Clone for BuiltIn<S> {
    fn clone(&self) -> Self {
        Self {
            cmd: self.cmd.clone(),
            doc: self.doc,
        }
    }
}

impl<S> From<Command<S>> for BuiltIn<S> {
    fn from(cmd: Command<S>) -> Self {
        BuiltIn { cmd, doc: None }
    }
}

impl<S> From<variable::Command<S>> for BuiltIn<S> {
    fn from(cmd: variable::Command<S>) -> Self {
        Command::from(cmd).into()
    }
}

/// A small piece of metadata attached to a primitive.
///
/// Some TeX semantics require recognizing specific commands in the token
/// stream without running them. The canonical case is conditional
/// skipping: after `\iffalse`, the interpreter discards tokens until it
/// sees a command that means `\else` or `\fi`, even if the user has
/// renamed those primitives with `\let`. Tags make this possible: the
/// skipping loop compares the tag of each command token against the tags
/// registered by the conditional module.
///
/// A tag may be shared by many commands (every `\if...` variant carries
/// the same tag) but a command has at most one tag.
///
/// Internally a tag is a non-zero 32 bit integer allocated from a global
/// counter, so `Option<Tag>` costs 4 bytes.
#[derive(PartialEq, Eq, Clone, Copy, Debug, PartialOrd, Ord, Hash)]
pub struct Tag(num::NonZeroU32);

static NEXT_TAG: sync::Mutex<u32> = sync::Mutex::new(1);

impl Tag {
    /// Allocate a new, globally unique tag.
    ///
    /// ```
    /// # use texel::command::Tag;
    /// let tag_1 = Tag::new();
    /// let tag_2 = Tag::new();
    /// assert_ne!(tag_1, tag_2);
    /// ```
    // Allocation mutates a global counter, so there is deliberately no
    // Default implementation.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Tag {
        let mut next = NEXT_TAG.lock().unwrap();
        let tag = Tag(num::NonZeroU32::new(*next).unwrap());
        *next = next.checked_add(1).unwrap();
        tag
    }
}

/// A lazily allocated [Tag] that can live in a static variable.
///
/// ```
/// # use texel::command::StaticTag;
/// static TAG: StaticTag = StaticTag::new();
///
/// assert_eq!(TAG.get(), TAG.get());
/// ```
pub struct StaticTag(sync::OnceLock<Tag>);

impl StaticTag {
    pub const fn new() -> StaticTag {
        StaticTag(sync::OnceLock::new())
    }

    /// The tag, allocating it on first use.
    ///
    /// Every call goes through the [sync::OnceLock], so hot code paths
    /// should cache the returned value.
    pub fn get(&self) -> Tag {
        *self.0.get_or_init(Tag::new)
    }
}

impl Default for StaticTag {
    fn default() -> Self {
        StaticTag::new()
    }
}
