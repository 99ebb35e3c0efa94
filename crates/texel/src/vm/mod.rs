//! The Texel virtual machine (VM).
//!
//! The VM owns everything a run needs: the scoped context, the engine
//! specific state, the stack of input sources, and the I/O endpoints.
//! This module defines the VM itself and its main loop; the input
//! streams that commands read tokens through live in [streams].

use crate::command;
use crate::command::BuiltIn;
use crate::command::Command;
use crate::context;
use crate::error;
use crate::texmacro;
use crate::token;
use crate::token::lexer;
use crate::token::trace;
use crate::token::CsNameInterner;
use crate::token::Token;
use crate::token::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

mod streams;
pub use streams::*;

/// The Texel virtual machine.
pub struct VM<S> {
    /// The engine specific state.
    pub state: S,

    /// The scoped context store, which holds the command table, the
    /// register families and the category codes.
    pub context: context::Context<S>,

    /// File system operations.
    ///
    /// Real file system calls by default. Swapped out in unit tests and
    /// in hosts without a file system, such as WASM.
    pub file_system: Box<dyn FileSystem>,

    /// Terminal input, standard in by default.
    pub terminal_in: Rc<RefCell<dyn TerminalIn>>,

    /// Terminal output, standard error by default.
    pub terminal_out: Rc<RefCell<dyn std::io::Write>>,

    /// The log file writer. Defaults to a sink that discards everything.
    pub log_file: Rc<RefCell<dyn std::io::Write>>,

    /// Root for relative file paths.
    ///
    /// [None] when the working directory could not be determined.
    pub working_directory: Option<std::path::PathBuf>,

    inner: Inner,
}

impl<S: Default> VM<S> {
    /// Create a new VM with the provided built-in commands.
    pub fn new(initial_built_ins: HashMap<&str, BuiltIn<S>>) -> Box<VM<S>> {
        let mut inner = Inner::new(Default::default());
        let mut context: context::Context<S> = Default::default();
        for (name, built_in) in initial_built_ins {
            let cs_name = inner.cs_name_interner.get_or_intern(name);
            context.set_command(
                token::CommandRef::ControlSequence(cs_name),
                built_in.cmd().clone(),
                context::Scope::Local,
            );
        }
        Box::new(VM {
            state: Default::default(),
            context,
            inner,
            file_system: Box::new(RealFileSystem {}),
            terminal_in: Rc::new(RefCell::new(RealTerminalIn {})),
            terminal_out: Rc::new(RefCell::new(std::io::stderr())),
            log_file: Rc::new(RefCell::new(std::io::sink())),
            working_directory: match std::env::current_dir() {
                Ok(path_buf) => Some(path_buf),
                Err(err) => {
                    eprintln!("failed to determine the working directory: {err}");
                    None
                }
            },
        })
    }
}

impl<S: TexelState> VM<S> {
    /// Run the VM until its input is exhausted.
    ///
    /// Source code must have been loaded with [VM::push_source] first.
    pub fn run<H: Handlers<S>>(&mut self) -> crate::prelude::Result<()> {
        let input = ExecutionInput::new(self);
        while let Some(token) = input.next()? {
            match token.value() {
                Value::CommandRef(command_ref) => {
                    let command = input.vm().context.command(&command_ref).cloned();
                    match command {
                        Some(Command::Execution(cmd, _)) => {
                            if let Err(err) = cmd(token, input) {
                                return Err(error::Error::propagate(
                                    input.vm(),
                                    error::OperationKind::Execution,
                                    token,
                                    err,
                                ));
                            }
                        }
                        Some(Command::Variable(cmd)) => {
                            let scope = S::variable_assignment_scope_hook(input.state_mut());
                            cmd.set_value_using_input(token, input, scope)?;
                        }
                        Some(Command::CharacterTokenAlias(token_value)) => H::character_handler(
                            Token::new_from_value(token_value, token.trace_key()),
                            input,
                        )?,
                        Some(Command::Expansion(_, _)) | Some(Command::Macro(_)) => {
                            H::unexpanded_expansion_command(token, input)?
                        }
                        Some(Command::Character(c)) => H::character_handler(
                            token::Token::new_other(c, token.trace_key()),
                            input,
                        )?,
                        None => H::undefined_command_handler(token, input)?,
                    }
                }
                Value::BeginGroup(_) => {
                    input.begin_group(context::GroupType::Simple, token);
                }
                Value::EndGroup(_) => {
                    input.end_group(context::GroupType::Simple, token)?;
                }
                Value::MathShift(_)
                | Value::AlignmentTab(_)
                | Value::Parameter(_)
                | Value::Superscript(_)
                | Value::Subscript(_)
                | Value::Space(_)
                | Value::Letter(_)
                | Value::Other(_) => H::character_handler(token, input)?,
            };
        }
        Ok(())
    }

    /// Add source code to the VM.
    ///
    /// Sources form a stack: the most recently pushed source is read
    /// first.
    pub fn push_source<T1: Into<PathBuf>, T2: Into<String>>(
        &mut self,
        file_name: T1,
        source_code: T2,
    ) -> crate::prelude::Result<()> {
        let source_code = self.append_end_line_char(source_code.into());
        self.inner
            .push_source(None, trace::Origin::File(file_name.into()), source_code)
    }

    // Appends the `\endlinechar` character to source code that does not
    // already end in a newline.
    fn append_end_line_char(&self, mut source_code: String) -> String {
        if !source_code.is_empty() && !source_code.ends_with('\n') {
            if let Some(c) = self.context.end_line_char() {
                source_code.push(c);
            }
        }
        source_code
    }
}

impl<S> VM<S> {
    /// Clear all source code from the VM.
    pub fn clear_sources(&mut self) {
        self.inner.clear_sources()
    }

    /// The interner that resolves [token::CsName] values to strings.
    #[inline]
    pub fn cs_name_interner(&self) -> &CsNameInterner {
        &self.inner.cs_name_interner
    }

    /// Build a traced error from the provided error.
    pub fn error<E: error::TexError>(&self, err: E) -> Box<error::Error> {
        error::Error::new(
            Box::new(err),
            &self.inner.tracer,
            &self.inner.cs_name_interner,
        )
    }

    /// Build a traced error from the provided end of input error.
    pub fn eof_error<E: error::EndOfInputError>(&self, err: E) -> Box<error::Error> {
        error::Error::new(
            Box::new(error::EofError::new(err)),
            &self.inner.tracer,
            &self.inner.cs_name_interner,
        )
    }

    fn begin_group(&mut self, group_type: context::GroupType, token: Token) {
        self.context.begin_group(group_type, Some(token));
    }

    fn end_group(
        &mut self,
        group_type: context::GroupType,
        token: Token,
    ) -> crate::prelude::Result<()> {
        if self.context.group_level() == 0 {
            return Err(self.error(NoGroupToEndError { token }));
        }
        if self.context.group_type() != group_type {
            return Err(self.error(GroupTypeMismatchError {
                token,
                group_type: self.context.group_type(),
                group_start: self.context.group_start_token(),
            }));
        }
        let ended = self.context.end_group().unwrap();
        self.inner.push_expansion(&ended.after_group);
        Ok(())
    }

    /// Locate the source position of the provided token.
    pub fn trace(&self, token: Token) -> trace::Locator {
        self.inner.tracer.locate(token, &self.inner.cs_name_interner)
    }

    /// Locate the end of the input as a whole.
    pub fn trace_end_of_input(&self) -> trace::Locator {
        self.inner.tracer.locate_end_of_input()
    }
}

/// Hooks for the token types whose treatment the TeX language leaves open.
///
/// For most tokens the main loop's action is fixed by the language:
/// execution commands run, variable commands trigger an assignment,
/// token aliases are re-dispatched as the aliased token, and begin and
/// end group characters open and close a group. What happens to plain
/// character tokens, to undefined control sequences, and to expansion
/// commands that reach the main loop unexpanded is up to the engine
/// being built, and is specified by implementing this trait.
pub trait Handlers<S: TexelState> {
    /// Invoked for character tokens.
    ///
    /// Not invoked for begin group, end group or active character
    /// tokens; the main loop handles those itself.
    fn character_handler(
        token: token::Token,
        input: &mut ExecutionInput<S>,
    ) -> crate::prelude::Result<()> {
        _ = (token, input);
        Ok(())
    }

    /// Invoked for a control sequence or active character with no defined
    /// command.
    fn undefined_command_handler(
        token: token::Token,
        input: &mut ExecutionInput<S>,
    ) -> crate::prelude::Result<()> {
        Err(input
            .vm()
            .error(error::UndefinedCommandError::new(input.vm(), token)))
    }

    /// Invoked for expansion commands that were not expanded.
    ///
    /// This is how the `\the` in `\noexpand\the` reaches the main loop.
    fn unexpanded_expansion_command(
        token: token::Token,
        input: &mut ExecutionInput<S>,
    ) -> crate::prelude::Result<()> {
        _ = (token, input);
        Ok(())
    }
}

pub struct DefaultHandlers;

impl<S: TexelState> Handlers<S> for DefaultHandlers {}

#[derive(Debug)]
struct NoGroupToEndError {
    token: Token,
}

impl error::TexError for NoGroupToEndError {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.token)
    }

    fn title(&self) -> String {
        "there is no group to end".into()
    }
}

#[derive(Debug)]
struct GroupTypeMismatchError {
    token: Token,
    group_type: context::GroupType,
    group_start: Option<Token>,
}

impl error::TexError for GroupTypeMismatchError {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.token)
    }

    fn title(&self) -> String {
        format!("{} cannot be ended by this token", self.group_type)
    }

    fn notes(&self) -> Vec<error::display::Note> {
        match self.group_start {
            None => vec![],
            Some(token) => vec![error::display::Note::SourceCodeTrace(
                "the group started here:".into(),
                token,
            )],
        }
    }
}

/// Mutable references to different parts of the VM.
///
/// Commands that need to borrow several parts of the VM at once go
/// through this type.
pub struct Parts<'a, S> {
    pub state: &'a mut S,
    pub context: &'a context::Context<S>,
    pub cs_name_interner: &'a mut token::CsNameInterner,
    pub tracer: &'a mut trace::Tracer,
}

/// File system operations that TeX needs to perform.
///
/// A trait so that tests and hosts like WASM can substitute their own
/// implementation.
pub trait FileSystem {
    /// Read the entire contents of a file into a string.
    fn read_to_string(&self, path: &std::path::Path) -> std::io::Result<String>;

    /// Write a slice of bytes to a file.
    fn write_bytes(&self, path: &std::path::Path, contents: &[u8]) -> std::io::Result<()>;
}

struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &std::path::Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
    fn write_bytes(&self, path: &std::path::Path, contents: &[u8]) -> std::io::Result<()> {
        std::fs::write(path, contents)
    }
}

/// Input operations from the terminal.
pub trait TerminalIn {
    /// Read a line from the terminal and append it to the provided buffer.
    fn read_line(&mut self, prompt: Option<&str>, buffer: &mut String) -> std::io::Result<()>;
}

struct RealTerminalIn;

impl TerminalIn for RealTerminalIn {
    fn read_line(&mut self, prompt: Option<&str>, buffer: &mut String) -> std::io::Result<()> {
        if let Some(prompt) = prompt {
            eprint!("\n{prompt}")
        }
        let stdin = std::io::stdin();
        stdin.read_line(buffer)?;
        Ok(())
    }
}

/// Trait for types that can serve as the state of a Texel VM.
///
/// The trait has no required methods, so any type can opt in:
/// ```
/// # use texel::traits::TexelState;
/// struct SomeNewType;
///
/// impl TexelState for SomeNewType {}
/// ```
///
/// The provided methods are hooks that the VM invokes at fixed points of
/// a run. Overriding them customizes the VM's behavior; all of them are
/// dispatched statically.
pub trait TexelState: Sized {
    /// Invoked after a TeX macro is expanded.
    ///
    /// Exists to support the `\tracingmacros` primitive.
    fn post_macro_expansion_hook(
        token: Token,
        input: &ExpansionInput<Self>,
        tex_macro: &texmacro::Macro,
        arguments: &[&[Token]],
        reversed_expansion: &[Token],
    ) {
        _ = (token, input, tex_macro, arguments, reversed_expansion);
    }

    /// Invoked before an expandable token is expanded; a non-[None]
    /// result replaces the expansion, and is not itself expanded.
    ///
    /// Exists to support the `\noexpand` primitive.
    fn expansion_override_hook(
        token: token::Token,
        input: &mut ExpansionInput<Self>,
        tag: Option<command::Tag>,
    ) -> crate::prelude::Result<Option<Token>> {
        _ = (token, input, tag);
        Ok(None)
    }

    /// Determines the scope of the next variable assignment.
    ///
    /// Exists to support the `\global` and `\globaldefs` commands.
    fn variable_assignment_scope_hook(state: &mut Self) -> context::Scope {
        _ = state;
        context::Scope::Local
    }
}

impl TexelState for () {}

/// Parts of the VM that are private.
struct Inner {
    // The top of the sources stack is stored inline; the lexer is read
    // on every token, so the indirection through the vector would cost.
    top_source: Source,
    sources: Vec<Source>,

    cs_name_interner: CsNameInterner,

    tracer: trace::Tracer,

    token_buffers: std::collections::BinaryHeap<TokenBuffer>,
}

// Cap on the depth of the sources stack, to catch infinite \input loops.
const MAX_INPUT_LEVELS: usize = 1000;

impl Inner {
    fn new(cs_name_interner: CsNameInterner) -> Self {
        Inner {
            top_source: Default::default(),
            sources: Default::default(),
            cs_name_interner,
            tracer: Default::default(),
            token_buffers: Default::default(),
        }
    }

    fn push_source(
        &mut self,
        token: Option<Token>,
        origin: trace::Origin,
        source_code: String,
    ) -> crate::prelude::Result<()> {
        if self.sources.len() + 1 >= MAX_INPUT_LEVELS {
            return Err(error::Error::new(
                Box::new(error::SimpleFailedPreconditionError::new(format![
                    "maximum input depth of {MAX_INPUT_LEVELS} exceeded"
                ])),
                &self.tracer,
                &self.cs_name_interner,
            ));
        }
        let trace_key_range = self.tracer.register_source_code(token, origin, &source_code);
        let mut new_source = Source::new(source_code, trace_key_range);
        std::mem::swap(&mut new_source, &mut self.top_source);
        self.sources.push(new_source);
        Ok(())
    }

    fn end_current_file(&mut self) {
        self.top_source.root.end()
    }

    fn clear_sources(&mut self) {
        self.top_source = Default::default();
        self.sources.clear();
    }

    #[inline]
    fn push_expansion(&mut self, expansion: &[Token]) {
        self.top_source.expansions.extend(expansion.iter().rev());
    }

    #[inline]
    fn expansions(&self) -> &Vec<Token> {
        &self.top_source.expansions
    }

    #[inline]
    fn expansions_mut(&mut self) -> &mut Vec<Token> {
        &mut self.top_source.expansions
    }

    fn pop_source(&mut self) -> bool {
        match self.sources.pop() {
            None => false,
            Some(source) => {
                self.top_source = source;
                true
            }
        }
    }
}

// One entry of the sources stack: a lexer over the source code plus the
// stack of tokens that expansions have pushed in front of it.
struct Source {
    expansions: Vec<Token>,
    root: lexer::Lexer,
}

impl Source {
    fn new(source_code: String, trace_key_range: trace::KeyRange) -> Source {
        Source {
            expansions: Vec::with_capacity(32),
            root: lexer::Lexer::new(source_code, trace_key_range),
        }
    }
}

impl Default for Source {
    fn default() -> Self {
        Source::new("".into(), trace::KeyRange::empty())
    }
}

// A returned token vector, kept so its allocation can be reused. The
// heap hands back the largest buffer first.
#[derive(Default)]
struct TokenBuffer(Vec<Token>);

impl PartialEq for TokenBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.0.capacity() == other.0.capacity()
    }
}

impl Eq for TokenBuffer {}

impl PartialOrd for TokenBuffer {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TokenBuffer {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.capacity().cmp(&other.0.capacity())
    }
}

/// Helper trait for the component pattern.
///
/// Stateful commands need somewhere to keep their state; `\ifnum`, for
/// example, keeps a stack of the conditionals currently open. In the
/// component pattern that state lives in a dedicated struct, the
/// _component_, defined in the same module as the commands that use it
/// and private to that module. The command's code is generic over any
/// state type that can hand out a reference to the component, which is
/// exactly what this trait expresses.
///
/// The pattern keeps independently written commands composable: an
/// engine includes the components of the commands it installs as fields
/// of its state type, and no command can touch another's state. It is
/// also Texel's answer to the global mutable state of the original TeX
/// implementations.
///
/// When the component is a direct field of the state struct, the
/// [implement_has_component] macro writes the impl:
///
/// ```
/// # mod mylibrary{
/// #   pub struct Component;
/// # }
/// # use texel::vm::implement_has_component;
/// # use texel::traits::*;
/// #
/// struct MyState {
///     component: mylibrary::Component,
/// }
///
/// impl TexelState for MyState {}
///
/// implement_has_component![MyState, mylibrary::Component, component];
/// ```
///
/// The [TexelState] supertrait is required only to cut down the trait
/// bounds that command implementations have to spell out.
pub trait HasComponent<C>: TexelState {
    /// Return an immutable reference to the component.
    fn component(&self) -> &C;

    /// Return a mutable reference to the component.
    fn component_mut(&mut self) -> &mut C;
}

/// Implements [HasComponent] for a state struct whose component is a
/// direct field.
///
/// One component:
///
/// ```
/// # mod mylibrary{
/// #   pub struct Component;
/// # }
/// # use texel::vm::implement_has_component;
/// # use texel::traits::*;
/// #
/// struct MyState {
///     component: mylibrary::Component,
/// }
///
/// impl TexelState for MyState {}
///
/// implement_has_component![MyState, mylibrary::Component, component];
/// ```
///
/// Several components:
///
/// ```
/// # mod mylibrary1{
/// #   pub struct Component;
/// # }
/// # mod mylibrary2{
/// #   pub struct Component;
/// # }
/// # use texel::vm::implement_has_component;
/// # use texel::traits::*;
/// #
/// struct MyState {
///     component_1: mylibrary1::Component,
///     component_2: mylibrary2::Component,
/// }
///
/// impl TexelState for MyState {}
///
/// implement_has_component![
///     MyState,
///     (mylibrary1::Component, component_1),
///     (mylibrary2::Component, component_2),
/// ];
/// ```
#[macro_export]
macro_rules! implement_has_component {
    ( $type: path, $component: path, $field: ident ) => {
        implement_has_component![$type, ($component, $field),];
    };
    ( $type: path, $(($component: path, $field: ident),)+) => {
        $(
            impl ::texel::vm::HasComponent<$component> for $type {
                #[inline]
                fn component(&self) -> &$component {
                    &self.$field
                }
                #[inline]
                fn component_mut(&mut self) -> &mut $component {
                    &mut self.$field
                }
            }
        )*
    };
}

pub use implement_has_component;
