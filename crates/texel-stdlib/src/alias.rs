//! `\let` aliasing command

use texel::parse::OptionalEqualsUnexpanded;
use texel::prelude as tx;
use texel::token;
use texel::token::Token;
use texel::token::Value;
use texel::traits::*;
use texel::*;

pub const LET_DOC: &str = "Assign a command or character to a control sequence";

/// Get the `\let` command.
pub fn get_let<S: TexelState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(let_primitive_fn)
        .with_tag(crate::prefix::get_globally_prefixable_tag())
        .with_doc(LET_DOC)
}

fn let_primitive_fn<S: TexelState>(
    _: Token,
    input: &mut vm::ExecutionInput<S>,
) -> tx::Result<()> {
    let scope = S::variable_assignment_scope_hook(input.state_mut());
    let alias = token::CommandRef::parse(input)?;
    OptionalEqualsUnexpanded::parse(input)?;
    let token = match input.unexpanded().next()? {
        None => {
            return Err(input.eof_error(error::SimpleEndOfInputError::new(
                r"reading the right hand side of a \let assignment",
            )))
        }
        Some(token) => token,
    };
    match token.value() {
        Value::CommandRef(command_ref) => {
            let command = match input.vm().context.command(&command_ref) {
                Some(command) => command.clone(),
                None => {
                    return Err(input
                        .vm()
                        .error(error::UndefinedCommandError::new(input.vm(), token)))
                }
            };
            input.context_mut().set_command(alias, command, scope);
        }
        value => {
            input
                .context_mut()
                .set_command(alias, command::Command::CharacterTokenAlias(value), scope);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def;
    use crate::prefix;
    use std::collections::HashMap;
    use texel::vm::implement_has_component;
    use texel_testing::*;

    #[derive(Default)]
    struct State {
        prefix: prefix::Component,
        testing: TestingComponent,
    }

    impl TexelState for State {
        fn variable_assignment_scope_hook(state: &mut Self) -> texel::context::Scope {
            prefix::variable_assignment_scope_hook(state)
        }
    }

    implement_has_component![
        State,
        (prefix::Component, prefix),
        (TestingComponent, testing),
    ];

    fn built_in_commands() -> HashMap<&'static str, command::BuiltIn<State>> {
        HashMap::from([
            ("def", def::get_def()),
            ("global", prefix::get_global()),
            ("let", get_let()),
        ])
    }

    test_suite![
        expansion_equality_tests(
            (let_for_macro, r"\def\A{abc}\let\B\A\B", "abc"),
            (let_for_macro_equals, r"\def\A{abc}\let\B=\A\B", "abc"),
            (local, r"\def\A{a}\def\B{b}\let\C=\A{\let\C=\B \C}\C", "ba"),
            (
                global,
                r"\def\A{a}\def\B{b}\let\C=\A{\global\let\C=\B \C}\C",
                "bb"
            ),
            (let_character, r"\let\A=a\A", "a"),
            (
                alias_is_independent_of_later_redefinition,
                r"\def\A{old}\let\B=\A\def\A{new}\B\A",
                "oldnew"
            ),
            (let_for_primitive, r"\let\newdef=\def\newdef\A{abc}\A", "abc"),
        ),
        failure_tests(
            (let_unknown_cs_name, r"\let\B=\A"),
            (let_end_of_input, r"\let\B="),
            (let_missing_target, r"\let a"),
        ),
    ];
}
