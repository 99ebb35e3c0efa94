use crate::command::Command;
use crate::context;
use crate::error;
use crate::token;
use crate::token::lexer;
use crate::token::trace;
use crate::token::Token;
use crate::traits::*;
use crate::vm;

/// A stream of TeX tokens generated by the VM.
///
/// There are a handful of implementations of this trait,
///     which differ in whether tokens are expanded or not before being returned.
/// All of the implementations are transparent wrappers around the VM,
///     so the accessor methods like [TokenStream::vm] are free.
pub trait TokenStream {
    type S: TexelState;

    /// Gets the next token in the stream.
    ///
    /// This method is analogous to `Iterator::next`.
    fn next(&mut self) -> crate::prelude::Result<Option<Token>>;

    /// Peeks at the next token in the stream without removing it.
    ///
    /// Peeking is generally an expensive operation as the next token may need to be expanded.
    /// Code that peeks at a token and then consumes it should use [TokenStream::consume]
    ///     to skip the token, as this is cheaper than invoking [TokenStream::next].
    fn peek(&mut self) -> crate::prelude::Result<Option<&Token>>;

    /// Consumes the next token in the stream without returning it.
    ///
    /// This method is mostly to make code self-documenting.
    /// It is typically used in situations where a peeked token is being consumed.
    fn consume(&mut self) -> crate::prelude::Result<()> {
        self.next().map(|_| ())
    }

    /// Returns a token to the front of the stream.
    ///
    /// The token will be the next token returned by [TokenStream::next].
    fn back(&mut self, token: Token);

    /// Returns a reference to the VM.
    fn vm(&self) -> &vm::VM<Self::S>;

    /// Returns a reference to the state.
    #[inline]
    fn state(&self) -> &Self::S {
        &self.vm().state
    }

    /// Returns a reference to the scoped context store.
    #[inline]
    fn context(&self) -> &context::Context<Self::S> {
        &self.vm().context
    }

    /// Locate the source position of the provided token.
    fn trace(&self, token: Token) -> trace::Locator {
        self.vm().trace(token)
    }

    /// Locate the end of the input as a whole.
    fn trace_end_of_input(&self) -> trace::Locator {
        self.vm().trace_end_of_input()
    }

    /// Build a traced error from the provided error.
    fn error<E: error::TexError>(&self, err: E) -> Box<error::Error> {
        self.vm().error(err)
    }

    /// Build a traced error from the provided end of input error.
    fn eof_error<E: error::EndOfInputError>(&self, err: E) -> Box<error::Error> {
        self.vm().eof_error(err)
    }
}

/// A stream that returns input tokens without performing expansion.
///
/// The unexpanded stream is used when reading tokens without performing expansion;
///     e.g., when reading the replacement text of a macro definition.
#[repr(transparent)]
pub struct UnexpandedStream<S>(vm::VM<S>);

impl<S: TexelState> TokenStream for UnexpandedStream<S> {
    type S = S;

    #[inline]
    fn next(&mut self) -> crate::prelude::Result<Option<Token>> {
        stream::next_unexpanded(&mut self.0)
    }

    #[inline]
    fn peek(&mut self) -> crate::prelude::Result<Option<&Token>> {
        stream::peek_unexpanded(&mut self.0)
    }

    #[inline]
    fn back(&mut self, token: Token) {
        self.0.inner.expansions_mut().push(token);
    }

    #[inline]
    fn vm(&self) -> &vm::VM<S> {
        &self.0
    }
}

/// A stream that performs expansion while iterating over input tokens.
///
/// All expandable tokens (macros and expansion primitives) are fully
/// expanded before tokens are returned.
#[repr(transparent)]
pub struct ExpandedStream<S>(UnexpandedStream<S>);

impl<S: TexelState> TokenStream for ExpandedStream<S> {
    type S = S;

    #[inline]
    fn next(&mut self) -> crate::prelude::Result<Option<Token>> {
        stream::next_expanded(&mut self.0 .0)
    }

    #[inline]
    fn peek(&mut self) -> crate::prelude::Result<Option<&Token>> {
        stream::peek_expanded(&mut self.0 .0)
    }

    #[inline]
    fn back(&mut self, token: Token) {
        self.0.back(token);
    }

    #[inline]
    fn vm(&self) -> &vm::VM<S> {
        self.0.vm()
    }
}

impl<S: TexelState> ExpandedStream<S> {
    /// Returns the unexpanded stream that backs this expanded stream.
    #[inline]
    pub fn unexpanded(&mut self) -> &mut UnexpandedStream<S> {
        &mut self.0
    }

    /// Expands the next token in the input, if it is expandable.
    ///
    /// Returns true if the next token was expanded. This method is
    /// used to implement the `\expandafter` primitive.
    pub fn expand_once(&mut self) -> crate::prelude::Result<bool> {
        stream::expand_once(&mut self.0 .0)
    }
}

impl<S: TexelState> AsMut<ExpandedStream<S>> for ExpandedStream<S> {
    fn as_mut(&mut self) -> &mut ExpandedStream<S> {
        self
    }
}

/// Input type for expansion primitives.
///
/// In addition to reading tokens, expansion primitives can add tokens
/// to the front of the input stream.
#[repr(transparent)]
pub struct ExpansionInput<S>(ExpandedStream<S>);

impl<S: TexelState> TokenStream for ExpansionInput<S> {
    type S = S;

    #[inline]
    fn next(&mut self) -> crate::prelude::Result<Option<Token>> {
        self.0.next()
    }

    #[inline]
    fn peek(&mut self) -> crate::prelude::Result<Option<&Token>> {
        self.0.peek()
    }

    #[inline]
    fn back(&mut self, token: Token) {
        self.0.back(token);
    }

    #[inline]
    fn vm(&self) -> &vm::VM<S> {
        self.0.vm()
    }
}

impl<S: TexelState> AsMut<ExpandedStream<S>> for ExpansionInput<S> {
    fn as_mut(&mut self) -> &mut ExpandedStream<S> {
        &mut self.0
    }
}

impl<S: TexelState> ExpansionInput<S> {
    /// Creates an expansion input from the VM.
    ///
    /// This is a zero cost cast; see the documentation on the type.
    #[inline]
    pub(crate) fn new(vm: &mut vm::VM<S>) -> &mut ExpansionInput<S> {
        // Safety: ExpansionInput is a repr(transparent) wrapper around VM.
        unsafe { &mut *(vm as *mut vm::VM<S> as *mut ExpansionInput<S>) }
    }

    #[inline]
    fn vm_mut(&mut self) -> &mut vm::VM<S> {
        &mut self.0 .0 .0
    }

    /// Returns the expanded stream, for use in parsing.
    #[inline]
    pub fn expanded(&mut self) -> &mut ExpandedStream<S> {
        &mut self.0
    }

    /// Returns the unexpanded stream.
    #[inline]
    pub fn unexpanded(&mut self) -> &mut UnexpandedStream<S> {
        self.0.unexpanded()
    }

    /// Expands the next token in the input, if it is expandable.
    pub fn expand_once(&mut self) -> crate::prelude::Result<bool> {
        self.0.expand_once()
    }

    /// Push new source code onto the top of the sources stack.
    ///
    /// This method is used to implement the `\input` primitive.
    pub fn push_source(
        &mut self,
        token: Token,
        file_name: std::path::PathBuf,
        source_code: String,
    ) -> crate::prelude::Result<()> {
        let source_code = self.vm().append_end_line_char(source_code);
        self.vm_mut()
            .inner
            .push_source(Some(token), trace::Origin::File(file_name), source_code)
    }

    /// Stop reading tokens from the current source.
    ///
    /// This method is used to implement the `\endinput` primitive.
    pub fn end_current_file(&mut self) {
        self.vm_mut().inner.end_current_file()
    }

    /// Push tokens to the front of the input stream.
    ///
    /// The first token in the provided slice will be the first token read.
    #[inline]
    pub fn push_expansion(&mut self, expansion: &[Token]) {
        self.vm_mut().inner.push_expansion(expansion)
    }

    /// Push the characters of a string to the front of the input stream.
    ///
    /// Alphabetic characters become letter tokens, spaces become space
    /// tokens and everything else becomes an other token. All tokens take
    /// their trace key from the provided token. This method is used to
    /// implement primitives like `\the` whose expansion is the textual
    /// representation of a value.
    pub fn push_string_tokens(&mut self, token: Token, s: &str) {
        let trace_key = token.trace_key();
        let expansions = self.vm_mut().inner.expansions_mut();
        expansions.reserve(s.len());
        for c in s.chars().rev() {
            let token = if c == ' ' {
                Token::new_space(c, trace_key)
            } else if c.is_alphabetic() {
                Token::new_letter(c, trace_key)
            } else {
                Token::new_other(c, trace_key)
            };
            expansions.push(token);
        }
    }

    /// Returns a reference to the expanded tokens stack for the current source.
    #[inline]
    pub fn expansions(&self) -> &Vec<Token> {
        self.0 .0 .0.inner.expansions()
    }

    /// Returns a mutable reference to the expanded tokens stack for the current source.
    #[inline]
    pub fn expansions_mut(&mut self) -> &mut Vec<Token> {
        self.vm_mut().inner.expansions_mut()
    }

    /// Returns a mutable reference to the state.
    ///
    /// Expansion commands do not change the state in the TeX sense, but
    /// some of them keep bookkeeping data in a component; conditionals
    /// maintain their stack of open branches this way.
    #[inline]
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.vm_mut().state
    }

    /// Returns a mutable reference to the state and a mutable reference
    /// to the expansions stack, simultaneously.
    #[inline]
    pub fn state_and_expansions_mut(&mut self) -> (&mut S, &mut Vec<Token>) {
        let vm = self.vm_mut();
        (&mut vm.state, vm.inner.expansions_mut())
    }

    /// Checks out a token buffer from the VM's pool of buffers.
    ///
    /// Token buffers are used to avoid allocating a new vector every time
    /// a temporary collection of tokens is needed. Return the buffer with
    /// [ExpansionInput::return_token_buffer] when finished with it.
    pub fn checkout_token_buffer(&mut self) -> Vec<Token> {
        self.vm_mut()
            .inner
            .token_buffers
            .pop()
            .unwrap_or_default()
            .0
    }

    /// Returns a token buffer to the VM's pool of buffers.
    pub fn return_token_buffer(&mut self, mut token_buffer: Vec<Token>) {
        token_buffer.clear();
        self.vm_mut()
            .inner
            .token_buffers
            .push(super::TokenBuffer(token_buffer))
    }
}

/// Input type for execution primitives.
///
/// Execution primitives, unlike expansion primitives, can mutate the
/// state and the context.
#[repr(transparent)]
pub struct ExecutionInput<S>(ExpandedStream<S>);

impl<S: TexelState> TokenStream for ExecutionInput<S> {
    type S = S;

    #[inline]
    fn next(&mut self) -> crate::prelude::Result<Option<Token>> {
        self.0.next()
    }

    #[inline]
    fn peek(&mut self) -> crate::prelude::Result<Option<&Token>> {
        self.0.peek()
    }

    #[inline]
    fn back(&mut self, token: Token) {
        self.0.back(token);
    }

    #[inline]
    fn vm(&self) -> &vm::VM<S> {
        self.0.vm()
    }
}

impl<S: TexelState> AsMut<ExpandedStream<S>> for ExecutionInput<S> {
    fn as_mut(&mut self) -> &mut ExpandedStream<S> {
        &mut self.0
    }
}

impl<S: TexelState> ExecutionInput<S> {
    /// Creates an execution input from the VM.
    ///
    /// This is a zero cost cast; see the documentation on the type.
    #[inline]
    pub(crate) fn new(vm: &mut vm::VM<S>) -> &mut ExecutionInput<S> {
        // Safety: ExecutionInput is a repr(transparent) wrapper around VM.
        unsafe { &mut *(vm as *mut vm::VM<S> as *mut ExecutionInput<S>) }
    }

    #[inline]
    fn vm_mut(&mut self) -> &mut vm::VM<S> {
        &mut self.0 .0 .0
    }

    /// Returns the expanded stream, for use in parsing.
    #[inline]
    pub fn expanded(&mut self) -> &mut ExpandedStream<S> {
        &mut self.0
    }

    /// Returns the unexpanded stream.
    #[inline]
    pub fn unexpanded(&mut self) -> &mut UnexpandedStream<S> {
        self.0.unexpanded()
    }

    /// Returns a mutable reference to the state.
    #[inline]
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.vm_mut().state
    }

    /// Returns a mutable reference to the scoped context store.
    #[inline]
    pub fn context_mut(&mut self) -> &mut context::Context<S> {
        &mut self.vm_mut().context
    }

    /// Begin a new group of the provided type.
    pub fn begin_group(&mut self, group_type: context::GroupType, token: Token) {
        self.vm_mut().begin_group(group_type, token)
    }

    /// End the current group.
    ///
    /// Returns an error if there is no group to end, or if the current
    /// group is of a different type than the provided type.
    /// After the group ends, tokens registered with `\aftergroup` are
    /// pushed to the front of the input stream.
    pub fn end_group(
        &mut self,
        group_type: context::GroupType,
        token: Token,
    ) -> crate::prelude::Result<()> {
        self.vm_mut().end_group(group_type, token)
    }

    /// Tokenize a string using the current category codes.
    ///
    /// Unlike regular input, the string is lexed in full immediately, so
    /// category code changes made by the resulting tokens do not affect the
    /// result. This is the semantics of `\read`.
    pub fn tokenize(
        &mut self,
        token: Token,
        source: String,
    ) -> crate::prelude::Result<Vec<Token>> {
        let vm = self.vm_mut();
        let trace_key_range =
            vm.inner
                .tracer
                .register_source_code(Some(token), trace::Origin::Terminal, &source);
        let mut lex = lexer::Lexer::new(source, trace_key_range);
        let mut tokens = Vec::new();
        loop {
            match lex.next(&vm.context, &mut vm.inner.cs_name_interner) {
                Ok(Some(token)) => tokens.push(token),
                Ok(None) => return Ok(tokens),
                Err(err) => return Err(stream::lexer_error(vm, err)),
            }
        }
    }

    /// Returns mutable references to different parts of the VM, simultaneously.
    pub fn vm_parts(&mut self) -> vm::Parts<'_, S> {
        let vm = self.vm_mut();
        vm::Parts {
            state: &mut vm.state,
            context: &vm.context,
            cs_name_interner: &mut vm.inner.cs_name_interner,
            tracer: &mut vm.inner.tracer,
        }
    }
}

/// Extend the lifetime of a token reference.
///
/// This function is used in situations where a token is peeked from the
/// VM and the resulting borrow prevents a subsequent mutable use of the
/// VM that is known not to invalidate the token.
unsafe fn launder<'a, 'b>(token: &'a Token) -> &'b Token {
    &*(token as *const Token)
}

/// The implementations of the next and peek methods for the various streams.
mod stream {
    use super::*;

    pub fn next_unexpanded<S: TexelState>(
        vm: &mut vm::VM<S>,
    ) -> crate::prelude::Result<Option<Token>> {
        loop {
            if let Some(token) = vm.inner.top_source.expansions.pop() {
                return Ok(Some(token));
            }
            match vm
                .inner
                .top_source
                .root
                .next(&vm.context, &mut vm.inner.cs_name_interner)
            {
                Ok(Some(token)) => return Ok(Some(token)),
                Ok(None) => {
                    if !vm.inner.pop_source() {
                        return Ok(None);
                    }
                }
                Err(err) => return Err(lexer_error(vm, err)),
            }
        }
    }

    pub fn peek_unexpanded<S: TexelState>(
        vm: &mut vm::VM<S>,
    ) -> crate::prelude::Result<Option<&Token>> {
        if vm.inner.top_source.expansions.is_empty() {
            match next_unexpanded(vm)? {
                None => return Ok(None),
                Some(token) => vm.inner.expansions_mut().push(token),
            }
        }
        Ok(vm.inner.expansions().last())
    }

    // Removes a token that was just peeked at. Cheaper than calling next.
    #[inline]
    fn consume_peek<S>(vm: &mut vm::VM<S>) {
        vm.inner.top_source.expansions.pop();
    }

    pub fn next_expanded<S: TexelState>(
        vm: &mut vm::VM<S>,
    ) -> crate::prelude::Result<Option<Token>> {
        loop {
            let token = match next_unexpanded(vm)? {
                None => return Ok(None),
                Some(token) => token,
            };
            let command_ref = match token.value() {
                token::Value::CommandRef(command_ref) => command_ref,
                _ => return Ok(Some(token)),
            };
            match vm.context.command(&command_ref) {
                Some(Command::Expansion(cmd, tag)) => {
                    let cmd = *cmd;
                    let tag = *tag;
                    match S::expansion_override_hook(token, ExpansionInput::new(vm), tag)? {
                        Some(override_token) => return Ok(Some(override_token)),
                        None => {
                            if let Err(err) = cmd(token, ExpansionInput::new(vm)) {
                                return Err(propagate_expansion_error(vm, token, err));
                            }
                        }
                    }
                }
                Some(Command::Macro(tex_macro)) => {
                    let tex_macro = tex_macro.clone();
                    if let Err(err) = tex_macro.call(token, ExpansionInput::new(vm)) {
                        return Err(propagate_expansion_error(vm, token, err));
                    }
                }
                _ => return Ok(Some(token)),
            }
        }
    }

    pub fn peek_expanded<S: TexelState>(
        vm: &mut vm::VM<S>,
    ) -> crate::prelude::Result<Option<&Token>> {
        loop {
            // Safety: the laundered reference is either returned right away,
            // in which case its lifetime is tied to the VM borrow again, or
            // it is copied before the VM is mutated.
            let token_ref = match peek_unexpanded(vm)? {
                None => return Ok(None),
                Some(token) => unsafe { launder(token) },
            };
            let command_ref = match token_ref.value() {
                token::Value::CommandRef(command_ref) => command_ref,
                _ => return Ok(Some(token_ref)),
            };
            let token = *token_ref;
            match vm.context.command(&command_ref) {
                Some(Command::Expansion(cmd, tag)) => {
                    let cmd = *cmd;
                    let tag = *tag;
                    consume_peek(vm);
                    match S::expansion_override_hook(token, ExpansionInput::new(vm), tag)? {
                        Some(override_token) => {
                            vm.inner.expansions_mut().push(override_token);
                            return Ok(vm.inner.expansions().last());
                        }
                        None => {
                            if let Err(err) = cmd(token, ExpansionInput::new(vm)) {
                                return Err(propagate_expansion_error(vm, token, err));
                            }
                        }
                    }
                }
                Some(Command::Macro(tex_macro)) => {
                    let tex_macro = tex_macro.clone();
                    consume_peek(vm);
                    if let Err(err) = tex_macro.call(token, ExpansionInput::new(vm)) {
                        return Err(propagate_expansion_error(vm, token, err));
                    }
                }
                _ => return Ok(Some(token_ref)),
            }
        }
    }

    pub fn expand_once<S: TexelState>(vm: &mut vm::VM<S>) -> crate::prelude::Result<bool> {
        let token = match peek_unexpanded(vm)? {
            None => return Ok(false),
            Some(token) => *token,
        };
        let command_ref = match token.value() {
            token::Value::CommandRef(command_ref) => command_ref,
            _ => return Ok(false),
        };
        match vm.context.command(&command_ref) {
            Some(Command::Expansion(cmd, tag)) => {
                let cmd = *cmd;
                let tag = *tag;
                consume_peek(vm);
                match S::expansion_override_hook(token, ExpansionInput::new(vm), tag)? {
                    Some(override_token) => {
                        vm.inner.expansions_mut().push(override_token);
                    }
                    None => {
                        if let Err(err) = cmd(token, ExpansionInput::new(vm)) {
                            return Err(propagate_expansion_error(vm, token, err));
                        }
                    }
                }
                Ok(true)
            }
            Some(Command::Macro(tex_macro)) => {
                let tex_macro = tex_macro.clone();
                consume_peek(vm);
                if let Err(err) = tex_macro.call(token, ExpansionInput::new(vm)) {
                    return Err(propagate_expansion_error(vm, token, err));
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn propagate_expansion_error<S>(
        vm: &vm::VM<S>,
        token: Token,
        err: Box<error::Error>,
    ) -> Box<error::Error> {
        error::Error::propagate(vm, error::OperationKind::Expansion, token, err)
    }

    pub(super) fn lexer_error<S>(vm: &vm::VM<S>, err: lexer::Error) -> Box<error::Error> {
        match err {
            lexer::Error::InvalidCharacter(c, trace_key) => vm.error(InvalidCharacterError {
                token: Token::new_other(c, trace_key),
                c,
            }),
            lexer::Error::EmptyControlSequence(trace_key) => {
                vm.error(EmptyControlSequenceError {
                    token: Token::new_other('\\', trace_key),
                })
            }
        }
    }

    #[derive(Debug)]
    struct InvalidCharacterError {
        token: Token,
        c: char,
    }

    impl error::TexError for InvalidCharacterError {
        fn kind(&self) -> error::Kind {
            error::Kind::Token(self.token)
        }

        fn title(&self) -> String {
            format![
                "input contains the invalid character {} (U+{:04X})",
                self.c, self.c as u32
            ]
        }

        fn notes(&self) -> Vec<error::display::Note> {
            vec!["this character has category code 15 and cannot appear in the input".into()]
        }
    }

    #[derive(Debug)]
    struct EmptyControlSequenceError {
        token: Token,
    }

    impl error::TexError for EmptyControlSequenceError {
        fn kind(&self) -> error::Kind {
            error::Kind::Token(self.token)
        }

        fn title(&self) -> String {
            "the input ends with an escape character".into()
        }
    }
}
