//! The `\global`, `\long` and `\outer` prefix commands
//!
//! The prefix commands work by setting flags in the [Component].
//! Commands that can be prefixed read the flags with the take methods,
//! which reset the flags to false.
//! For the convention to work correctly, every code path in such a command
//! must take the flags it supports, even paths that do not use the result.
//!
//! `\long` and `\outer` may only appear before `\def` and its variants.
//! `\global` may additionally appear before a variable assignment and
//! before the commands that carry the [globally prefixable
//! tag](get_globally_prefixable_tag), like `\advance` and `\let`.

use texel::prelude as tx;
use texel::token::Token;
use texel::token::Value;
use texel::traits::*;
use texel::*;

static GLOBAL_TAG: command::StaticTag = command::StaticTag::new();
static LONG_TAG: command::StaticTag = command::StaticTag::new();
static OUTER_TAG: command::StaticTag = command::StaticTag::new();
static GLOBALLY_PREFIXABLE_TAG: command::StaticTag = command::StaticTag::new();

/// The tag carried by execution commands that may be prefixed with
/// `\global` but not with `\long` or `\outer`.
pub fn get_globally_prefixable_tag() -> command::Tag {
    GLOBALLY_PREFIXABLE_TAG.get()
}

/// Component for the prefix commands.
#[derive(Default)]
pub struct Component {
    global: bool,
    long: bool,
    outer: bool,
}

impl Component {
    /// Get the value of the global flag and reset the flag to false.
    pub fn take_global(&mut self) -> bool {
        let global = self.global;
        self.global = false;
        global
    }

    /// Get the value of the long flag and reset the flag to false.
    pub fn take_long(&mut self) -> bool {
        let long = self.long;
        self.long = false;
        long
    }

    /// Get the value of the outer flag and reset the flag to false.
    pub fn take_outer(&mut self) -> bool {
        let outer = self.outer;
        self.outer = false;
        outer
    }
}

/// The scope of the next assignment, per the global flag.
///
/// This function is also designed to be used as the
/// [variable_assignment_scope_hook](TexelState::variable_assignment_scope_hook)
/// of states that contain the component.
pub fn variable_assignment_scope_hook<S: HasComponent<Component>>(
    state: &mut S,
) -> texel::context::Scope {
    match state.component_mut().take_global() {
        true => texel::context::Scope::Global,
        false => texel::context::Scope::Local,
    }
}

#[derive(Clone, Copy, Debug)]
enum Kind {
    Global,
    Long,
    Outer,
}

impl Kind {
    fn name(self) -> &'static str {
        match self {
            Kind::Global => r"\global",
            Kind::Long => r"\long",
            Kind::Outer => r"\outer",
        }
    }
}

#[derive(Default, Clone, Copy)]
struct Prefix {
    global: Option<Token>,
    long: Option<Token>,
    outer: Option<Token>,
}

impl Prefix {
    fn get_one(&self) -> (Token, Kind) {
        if let Some(global_token) = self.global {
            (global_token, Kind::Global)
        } else if let Some(long_token) = self.long {
            (long_token, Kind::Long)
        } else {
            // At least one prefix token has been seen, or this method is
            // not called.
            (self.outer.unwrap(), Kind::Outer)
        }
    }

    fn get_long_or_outer(&self) -> Option<(Token, Kind)> {
        if let Some(long_token) = self.long {
            Some((long_token, Kind::Long))
        } else {
            self.outer.map(|outer_token| (outer_token, Kind::Outer))
        }
    }
}

fn global_primitive_fn<S: HasComponent<Component>>(
    global_token: Token,
    input: &mut vm::ExecutionInput<S>,
) -> tx::Result<()> {
    process_prefixes(
        Prefix {
            global: Some(global_token),
            ..Default::default()
        },
        input,
    )
}

/// Get the `\global` command.
pub fn get_global<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(global_primitive_fn).with_tag(GLOBAL_TAG.get())
}

fn long_primitive_fn<S: HasComponent<Component>>(
    long_token: Token,
    input: &mut vm::ExecutionInput<S>,
) -> tx::Result<()> {
    process_prefixes(
        Prefix {
            long: Some(long_token),
            ..Default::default()
        },
        input,
    )
}

/// Get the `\long` command.
pub fn get_long<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(long_primitive_fn).with_tag(LONG_TAG.get())
}

fn outer_primitive_fn<S: HasComponent<Component>>(
    outer_token: Token,
    input: &mut vm::ExecutionInput<S>,
) -> tx::Result<()> {
    process_prefixes(
        Prefix {
            outer: Some(outer_token),
            ..Default::default()
        },
        input,
    )
}

/// Get the `\outer` command.
pub fn get_outer<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(outer_primitive_fn).with_tag(OUTER_TAG.get())
}

fn process_prefixes<S: HasComponent<Component>>(
    mut prefix: Prefix,
    input: &mut vm::ExecutionInput<S>,
) -> tx::Result<()> {
    complete_prefix(&mut prefix, input)?;
    let token = match input.peek()? {
        None => {
            let (prefix_token, kind) = prefix.get_one();
            return Err(input.eof_error(EndOfInputAfterPrefixError {
                prefix_token,
                kind,
            }));
        }
        Some(token) => *token,
    };
    let command_ref = match token.value() {
        Value::CommandRef(command_ref) => command_ref,
        _ => {
            let (prefix_token, kind) = prefix.get_one();
            return Err(input.error(CannotBePrefixedError {
                token,
                prefix_token,
                kind,
            }));
        }
    };
    enum Target {
        Definition,
        GloballyPrefixable,
        Variable,
    }
    let target = match input.vm().context.command(&command_ref) {
        Some(command::Command::Variable(_)) => Some(Target::Variable),
        Some(cmd) => {
            if cmd.tag() == Some(crate::def::get_def_tag()) {
                Some(Target::Definition)
            } else if cmd.tag() == Some(GLOBALLY_PREFIXABLE_TAG.get()) {
                Some(Target::GloballyPrefixable)
            } else {
                None
            }
        }
        None => None,
    };
    match target {
        Some(Target::Definition) => {
            let component = input.state_mut().component_mut();
            component.global = prefix.global.is_some();
            component.long = prefix.long.is_some();
            component.outer = prefix.outer.is_some();
            Ok(())
        }
        Some(Target::Variable) | Some(Target::GloballyPrefixable) => {
            if let Some((prefix_token, kind)) = prefix.get_long_or_outer() {
                return Err(input.error(CannotBePrefixedError {
                    token,
                    prefix_token,
                    kind,
                }));
            }
            input.state_mut().component_mut().global = prefix.global.is_some();
            Ok(())
        }
        None => {
            let (prefix_token, kind) = prefix.get_one();
            Err(input.error(CannotBePrefixedError {
                token,
                prefix_token,
                kind,
            }))
        }
    }
}

fn complete_prefix<S: HasComponent<Component>>(
    prefix: &mut Prefix,
    input: &mut vm::ExecutionInput<S>,
) -> tx::Result<()> {
    loop {
        let token = match input.peek()? {
            None => return Ok(()),
            Some(token) => *token,
        };
        let tag = match token.value() {
            Value::CommandRef(command_ref) => input
                .vm()
                .context
                .command(&command_ref)
                .and_then(|cmd| cmd.tag()),
            _ => None,
        };
        if tag == Some(GLOBAL_TAG.get()) {
            prefix.global = Some(token);
        } else if tag == Some(LONG_TAG.get()) {
            prefix.long = Some(token);
        } else if tag == Some(OUTER_TAG.get()) {
            prefix.outer = Some(token);
        } else {
            return Ok(());
        }
        input.consume()?;
    }
}

#[derive(Debug)]
struct CannotBePrefixedError {
    token: Token,
    prefix_token: Token,
    kind: Kind,
}

impl error::TexError for CannotBePrefixedError {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.token)
    }

    fn title(&self) -> String {
        format!("this token cannot be prefixed with {}", self.kind.name())
    }

    fn notes(&self) -> Vec<error::display::Note> {
        vec![
            match self.kind {
                Kind::Global => {
                    r"\global can come before \def and its variants, a variable assignment, and commands like \advance and \let"
                }
                Kind::Long | Kind::Outer => {
                    r"\long and \outer can only come before \def, \gdef, \edef and \xdef"
                }
            }
            .into(),
            error::display::Note::SourceCodeTrace(
                "the prefix appeared here:".into(),
                self.prefix_token,
            ),
        ]
    }
}

#[derive(Debug)]
struct EndOfInputAfterPrefixError {
    prefix_token: Token,
    kind: Kind,
}

impl error::EndOfInputError for EndOfInputAfterPrefixError {
    fn doing(&self) -> String {
        format!("reading the command prefixed by {}", self.kind.name())
    }

    fn notes(&self) -> Vec<error::display::Note> {
        vec![error::display::Note::SourceCodeTrace(
            "the prefix appeared here:".into(),
            self.prefix_token,
        )]
    }
}

/// Get an execution command that errors if any prefix flag is set.
///
/// This command is used in unit tests to verify that prefixable commands
/// take all of the flags on every code path.
pub fn get_assert_flags_are_false<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    fn assert_flags_are_false_fn<S: HasComponent<Component>>(
        token: Token,
        input: &mut vm::ExecutionInput<S>,
    ) -> tx::Result<()> {
        let component = input.state_mut().component_mut();
        let global = component.take_global();
        let long = component.take_long();
        let outer = component.take_outer();
        if global || long || outer {
            return Err(input.error(error::SimpleTokenError::new(
                token,
                "assertion failed: a prefix flag is still set",
            )));
        }
        Ok(())
    }
    command::BuiltIn::new_execution(assert_flags_are_false_fn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias;
    use crate::def;
    use crate::math;
    use crate::registers;
    use crate::the;
    use std::collections::HashMap;
    use texel::vm::implement_has_component;
    use texel_testing::*;

    #[derive(Default)]
    struct State {
        prefix: Component,
        testing: TestingComponent,
    }

    impl TexelState for State {
        fn variable_assignment_scope_hook(state: &mut Self) -> texel::context::Scope {
            variable_assignment_scope_hook(state)
        }
    }

    implement_has_component![State, (Component, prefix), (TestingComponent, testing),];

    fn built_in_commands() -> HashMap<&'static str, command::BuiltIn<State>> {
        HashMap::from([
            ("global", get_global()),
            ("long", get_long()),
            ("outer", get_outer()),
            ("def", def::get_def()),
            ("let", alias::get_let()),
            ("advance", math::get_advance()),
            ("count", registers::get_count()),
            ("the", the::get_the()),
            ("assertFlagsAreFalse", get_assert_flags_are_false()),
        ])
    }

    test_suite![
        expansion_equality_tests(
            (local_assignment, r"\count 0 5{\count 0 8}\the\count 0", "5"),
            (
                local_assignment_nested,
                r"\count 0 5{\count 0 6{\count 0 8 \the\count 0}\the\count 0}\the\count 0",
                "865"
            ),
            (global_assignment, r"\count 0 5{\global\count 0 8}\the\count 0", "8"),
            (
                global_assignment_twice,
                r"\count 0 5{\global\global\count 0 8}\the\count 0",
                "8"
            ),
            (global_def, r"\def\A{a}{\global\def\A{b}}\A", "b"),
            (long_def, r"\long\def\A{Hello}\A", "Hello"),
            (outer_def, r"\outer\def\A{Hello}\A", "Hello"),
            (
                many_prefixes,
                r"\long\outer\global\long\global\outer\def\A{Hello}\A",
                "Hello"
            ),
            (global_advance, r"\count 0 1{\global\advance\count 0 by 2}\the\count 0", "3"),
            (global_let, r"{\global\let\A=a}\A", "a"),
            (def_resets_flags, r"\global\def\A{a}\A\assertFlagsAreFalse", "a"),
            (
                assignment_resets_flags,
                r"\global\count 0 1\assertFlagsAreFalse\the\count 0",
                "1"
            ),
        ),
        failure_tests(
            (global_end_of_input, r"\global"),
            (global_with_character, r"\global a"),
            (global_with_undefined_command, r"\global \undefinedCommand"),
            (global_with_unprefixable_command, r"\global \the\count 0"),
            (long_advance, r"\long\advance\count 0 by 1"),
            (outer_advance, r"\outer\advance\count 0 by 1"),
            (long_assignment, r"\long\count 0 1"),
        ),
    ];
}
