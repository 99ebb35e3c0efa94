//! The `\chardef` primitive

use texel::parse::OptionalEquals;
use texel::prelude as tx;
use texel::token;
use texel::token::Token;
use texel::traits::*;
use texel::*;

pub const CHARDEF_DOC: &str = "Bind a character code to a control sequence";

/// Get the `\chardef` command.
pub fn get_chardef<S: TexelState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(chardef_fn)
        .with_tag(crate::prefix::get_globally_prefixable_tag())
        .with_doc(CHARDEF_DOC)
}

fn chardef_fn<S: TexelState>(_: Token, input: &mut vm::ExecutionInput<S>) -> tx::Result<()> {
    let scope = S::variable_assignment_scope_hook(input.state_mut());
    let (target, _, c) = <(token::CommandRef, OptionalEquals, char)>::parse(input)?;
    input
        .context_mut()
        .set_command(target, command::Command::Character(c), scope);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefix;
    use crate::the;
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
            ("chardef", get_chardef()),
            ("global", prefix::get_global()),
            ("the", the::get_the()),
        ])
    }

    test_suite![
        expansion_equality_tests(
            // The output of a chardef'd command is a character token with
            // catcode other, so the expected side uses \chardef too.
            (base_case, r"\chardef\A=`Q \A", r"\chardef\B=`Q \B"),
            (without_equals, r"\chardef\A `Q \A", r"\chardef\B=`Q \B"),
            (numeric_code, r"\chardef\A=81 \A", r"\chardef\B=`Q \B"),
            (the_gives_the_code, r"\chardef\A=`Q \the\A", "81"),
            (
                is_scoped,
                r"\chardef\A=`a{\chardef\A=`b \A}\A",
                r"\chardef\A=`b \chardef\B=`a \A\B"
            ),
            (
                global,
                r"\chardef\A=`a{\global\chardef\A=`b \A}\A",
                r"\chardef\A=`b \A\A"
            ),
        ),
        failure_tests(
            (end_of_input, r"\chardef"),
            (missing_target, r"\chardef a"),
            (missing_character, r"\chardef\A="),
            (invalid_character_code, r"\chardef\A=-1"),
        ),
    ];
}
