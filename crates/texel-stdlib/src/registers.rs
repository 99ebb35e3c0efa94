//! Register variables (`\count`, `\countdef` and friends)

use texel::parse;
use texel::parse::OptionalEquals;
use texel::prelude as tx;
use texel::token;
use texel::traits::*;
use texel::variable;
use texel::*;

pub const COUNT_DOC: &str = "Get or set an integer register";
pub const COUNTDEF_DOC: &str = "Bind an integer register to a control sequence";

/// The number of registers in each family.
pub const NUM_REGISTERS: usize = 32768;

/// Get the `\count` command.
pub fn get_count<S: TexelState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_variable(variable::Command::new_registers(
        variable::Family::Count,
        register_index,
    ))
    .with_doc(COUNT_DOC)
}

/// Get the `\dimen` command.
pub fn get_dimen<S: TexelState>() -> command::BuiltIn<S> {
    variable::Command::new_registers(variable::Family::Dimen, register_index).into()
}

/// Get the `\skip` command.
pub fn get_skip<S: TexelState>() -> command::BuiltIn<S> {
    variable::Command::new_registers(variable::Family::Glue, register_index).into()
}

/// Get the `\muskip` command.
pub fn get_muskip<S: TexelState>() -> command::BuiltIn<S> {
    variable::Command::new_registers(variable::Family::MuGlue, register_index).into()
}

/// Get the `\toks` command.
pub fn get_toks<S: TexelState>() -> command::BuiltIn<S> {
    variable::Command::new_registers(variable::Family::Toks, register_index).into()
}

/// Get the `\endlinechar` parameter.
pub fn get_endlinechar<S: TexelState>() -> command::BuiltIn<S> {
    variable::Command::new_parameter(variable::Family::Count, "endlinechar").into()
}

fn register_index<S: TexelState>(
    _: token::Token,
    input: &mut vm::ExpandedStream<S>,
) -> tx::Result<variable::RegisterKey> {
    let index = parse::Uint::<NUM_REGISTERS>::parse(input)?;
    Ok(variable::RegisterKey::Index(index.0 as i32))
}

/// Get the `\countdef` command.
pub fn get_countdef<S: TexelState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(countdef_fn)
        .with_tag(crate::prefix::get_globally_prefixable_tag())
        .with_doc(COUNTDEF_DOC)
}

/// Get the `\dimendef` command.
pub fn get_dimendef<S: TexelState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(dimendef_fn)
        .with_tag(crate::prefix::get_globally_prefixable_tag())
}

/// Get the `\skipdef` command.
pub fn get_skipdef<S: TexelState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(skipdef_fn)
        .with_tag(crate::prefix::get_globally_prefixable_tag())
}

/// Get the `\muskipdef` command.
pub fn get_muskipdef<S: TexelState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(muskipdef_fn)
        .with_tag(crate::prefix::get_globally_prefixable_tag())
}

/// Get the `\toksdef` command.
pub fn get_toksdef<S: TexelState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(toksdef_fn)
        .with_tag(crate::prefix::get_globally_prefixable_tag())
}

fn countdef_fn<S: TexelState>(
    token: token::Token,
    input: &mut vm::ExecutionInput<S>,
) -> tx::Result<()> {
    register_def(token, input, variable::Family::Count)
}

fn dimendef_fn<S: TexelState>(
    token: token::Token,
    input: &mut vm::ExecutionInput<S>,
) -> tx::Result<()> {
    register_def(token, input, variable::Family::Dimen)
}

fn skipdef_fn<S: TexelState>(
    token: token::Token,
    input: &mut vm::ExecutionInput<S>,
) -> tx::Result<()> {
    register_def(token, input, variable::Family::Glue)
}

fn muskipdef_fn<S: TexelState>(
    token: token::Token,
    input: &mut vm::ExecutionInput<S>,
) -> tx::Result<()> {
    register_def(token, input, variable::Family::MuGlue)
}

fn toksdef_fn<S: TexelState>(
    token: token::Token,
    input: &mut vm::ExecutionInput<S>,
) -> tx::Result<()> {
    register_def(token, input, variable::Family::Toks)
}

fn register_def<S: TexelState>(
    _: token::Token,
    input: &mut vm::ExecutionInput<S>,
    family: variable::Family,
) -> tx::Result<()> {
    let scope = S::variable_assignment_scope_hook(input.state_mut());
    let (target, _, index) =
        <(token::CommandRef, OptionalEquals, parse::Uint<NUM_REGISTERS>)>::parse(input)?;
    input.context_mut().set_command(
        target,
        variable::Command::new_static(family, variable::RegisterKey::Index(index.0 as i32)),
        scope,
    );
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
            ("the", the::get_the()),
            ("count", get_count()),
            ("countdef", get_countdef()),
            ("dimen", get_dimen()),
            ("dimendef", get_dimendef()),
            ("skip", get_skip()),
            ("muskip", get_muskip()),
            ("toks", get_toks()),
            ("toksdef", get_toksdef()),
            ("endlinechar", get_endlinechar()),
            ("global", prefix::get_global()),
        ])
    }

    test_suite![
        expansion_equality_tests(
            (unset_register_is_zero, r"\the\count 23", "0"),
            (write_and_read_register, r"\count 23 4 \the\count 23", "4"),
            (write_and_read_register_eq, r"\count 23 = 4 \the\count 23", "4"),
            (
                register_index_from_register,
                r"\count 1=5000 \count 0=-1 \the \count -\count 0",
                "5000"
            ),
            (assignment_is_scoped, r"\count 0 5{\count 0 8}\the\count 0", "5"),
            (
                global_assignment_escapes_group,
                r"\count 0 5{\global\count 0 8}\the\count 0",
                "8"
            ),
            (countdef_base_case, r"\countdef\A 23\A 4 \the\A", "4"),
            (countdef_base_case_eq, r"\countdef\A = 23\A 4 \the\A", "4"),
            (
                countdef_aliases_the_register,
                r"\countdef\A 23\A 4\count 23 5 \the\A",
                "5"
            ),
            (
                countdef_local,
                r"\count 1=1 \count 2=2 \countdef\A 1{\countdef\A 2}\the\A",
                "1"
            ),
            (
                countdef_global,
                r"\count 1=1 \count 2=2 \countdef\A 1{\global\countdef\A 2}\the\A",
                "2"
            ),
            (dimen_write_and_read, r"\dimen 1 = 2.5pt \the\dimen 1", "2.5pt"),
            (dimendef, r"\dimendef\A 1 \A=3pt \the\dimen 1", "3.0pt"),
            (
                skip_write_and_read,
                r"\skip 1 = 1pt plus 2pt minus 3pt \the\skip 1",
                "1.0pt plus 2.0pt minus 3.0pt"
            ),
            (toks_basic, r"\toks 1 = {Hola, Mundo}\the \toks 1", "Hola, Mundo"),
            (
                toksdef_basic,
                r"\toksdef\content 1 \toks 1 = {Hola, Mundo}\the \content",
                "Hola, Mundo"
            ),
            (
                toks_copy,
                r"\toks 1 = {Hola, Mundo}\toks 2 = \toks 1 \the \toks 2",
                "Hola, Mundo"
            ),
            (
                dimen_to_int,
                r"\dimen 1 = 40sp \count 1 = \dimen 1 \the \count 1",
                "40"
            ),
            (
                int_to_dimen,
                r"\count 1 = 40 \dimen 1 = \count 1 pt \the \dimen 1",
                "40.0pt"
            ),
            (endlinechar_parameter, r"\endlinechar=65 \the\endlinechar", "65"),
        ),
        failure_tests(
            (register_index_too_big, r"\count 32768 = 4"),
            (register_index_negative, r"\count -1 = 4"),
            (countdef_index_too_big, r"\countdef\A 32768"),
            (countdef_missing_target, r"\countdef 260"),
            (count_end_of_input, r"\count"),
            (count_value_end_of_input, r"\count 0 ="),
        ),
    ];
}
