//! The `\catcode` primitive

use texel::prelude as tx;
use texel::token;
use texel::traits::*;
use texel::variable;
use texel::*;

pub const CATCODE_DOC: &str = "Get or set a category code register";

/// Get the `\catcode` command.
pub fn get_catcode<S: TexelState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_variable(variable::Command::new_registers(
        variable::Family::CatCode,
        character_index,
    ))
    .with_doc(CATCODE_DOC)
}

fn character_index<S: TexelState>(
    _: token::Token,
    input: &mut vm::ExpandedStream<S>,
) -> tx::Result<variable::RegisterKey> {
    let index = i32::parse(input)?;
    Ok(variable::RegisterKey::Index(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::the;
    use std::collections::HashMap;
    use texel_testing::*;

    fn built_in_commands() -> HashMap<&'static str, command::BuiltIn<State>> {
        HashMap::from([("catcode", get_catcode()), ("the", the::get_the())])
    }

    test_suite![
        expansion_equality_tests(
            (default_letter, r"\the\catcode `a", "11"),
            (default_other, r"\the\catcode `5", "12"),
            (default_escape, r"\the\catcode `\\", "0"),
            (set_and_read, r"\catcode `F = 7 \the\catcode `F", "7"),
            (set_and_read_number_index, r"\catcode 70 = 7 \the\catcode 70", "7"),
            (
                set_is_scoped,
                r"\catcode `F = 7 {\catcode `F = 8 \the\catcode `F}\the\catcode `F",
                "87"
            ),
            (
                // Both sides produce a single 'a' token with catcode other.
                make_brackets_groups,
                r"\catcode `[ = 1 \catcode `] = 2 [\catcode `a = 12 a]",
                r"\catcode `a = 12 a"
            ),
        ),
        failure_tests(
            (value_too_large, r"\catcode 0 = 16"),
            (value_negative, r"\catcode 0 = -1"),
            (invalid_character_code, r"\catcode -1 = 11"),
            (end_of_input, r"\catcode"),
        ),
    ];
}
