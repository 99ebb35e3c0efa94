//! Grouping commands (`\begingroup`, `\endgroup`, `\aftergroup`)

use texel::context::GroupType;
use texel::prelude as tx;
use texel::token::Token;
use texel::traits::*;
use texel::variable;
use texel::*;

/// Get the `\begingroup` command.
pub fn get_begingroup<S: TexelState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(begingroup_fn)
}

fn begingroup_fn<S: TexelState>(token: Token, input: &mut vm::ExecutionInput<S>) -> tx::Result<()> {
    input.begin_group(GroupType::SemiSimple, token);
    Ok(())
}

/// Get the `\endgroup` command.
pub fn get_endgroup<S: TexelState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(endgroup_fn)
}

fn endgroup_fn<S: TexelState>(token: Token, input: &mut vm::ExecutionInput<S>) -> tx::Result<()> {
    input.end_group(GroupType::SemiSimple, token)
}

/// Get the `\aftergroup` command.
pub fn get_aftergroup<S: TexelState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(aftergroup_fn)
}

fn aftergroup_fn<S: TexelState>(_: Token, input: &mut vm::ExecutionInput<S>) -> tx::Result<()> {
    let token = match input.unexpanded().next()? {
        None => {
            return Err(input.eof_error(error::SimpleEndOfInputError::new(
                r"reading the token after \aftergroup",
            )))
        }
        Some(token) => token,
    };
    input.context_mut().add_after_group_token(token);
    Ok(())
}

/// Get the `\currentgrouplevel` command.
pub fn get_currentgrouplevel<S: TexelState>() -> command::BuiltIn<S> {
    variable::Command::new_getter(|vm| vm.context.group_level() as i32).into()
}

/// Get the `\currentgrouptype` command.
pub fn get_currentgrouptype<S: TexelState>() -> command::BuiltIn<S> {
    variable::Command::new_getter(|vm| vm.context.group_type().to_i32()).into()
}
