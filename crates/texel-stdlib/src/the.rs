//! The `\the` expansion primitive

use texel::prelude as tx;
use texel::token;
use texel::token::Token;
use texel::token::Value;
use texel::traits::*;
use texel::variable;
use texel::*;

pub const THE_DOC: &str = "Output text describing some inputted tokens";

/// Get the `\the` expansion primitive.
pub fn get_the<S: TexelState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(the_primitive_fn).with_doc(THE_DOC)
}

fn the_primitive_fn<S: TexelState>(
    the_token: Token,
    input: &mut vm::ExpansionInput<S>,
) -> tx::Result<()> {
    let token = match input.next()? {
        None => {
            return Err(input.eof_error(error::SimpleEndOfInputError::new(
                r"reading the argument of \the",
            )))
        }
        Some(token) => token,
    };
    let command_ref = match token.value() {
        Value::CommandRef(command_ref) => command_ref,
        _ => return Err(input.error(TheError { token })),
    };
    match input.vm().context.command(&command_ref) {
        Some(command::Command::Variable(cmd)) => {
            let cmd = cmd.clone();
            let variable = cmd.resolve(token, input.as_mut())?;
            let value = variable.value(input.vm());
            match value {
                variable::Value::Int(i) => {
                    input.push_string_tokens(the_token, &i.to_string());
                }
                variable::Value::CatCode(code) => {
                    input.push_string_tokens(the_token, &(code as u8).to_string());
                }
                variable::Value::Dimen(d) => {
                    input.push_string_tokens(the_token, &d.to_string());
                }
                variable::Value::Glue(g) | variable::Value::MuGlue(g) => {
                    input.push_string_tokens(the_token, &g.to_string());
                }
                variable::Value::Toks(tokens) => {
                    // The token list is stored in forward order; the
                    // expansions stack pops from the back.
                    let mut reversed: Vec<Token> = (*tokens).clone();
                    reversed.reverse();
                    input.expansions_mut().extend(reversed);
                }
            }
            Ok(())
        }
        Some(command::Command::Character(c)) => {
            let value = *c as i32;
            input.push_string_tokens(the_token, &value.to_string());
            Ok(())
        }
        _ => Err(input.error(TheError { token })),
    }
}

#[derive(Debug)]
struct TheError {
    token: Token,
}

impl error::TexError for TheError {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.token)
    }

    fn title(&self) -> String {
        r"this token cannot be read by \the".into()
    }

    fn notes(&self) -> Vec<error::display::Note> {
        vec![r"\the can read variables like \count 0 and commands defined with \chardef".into()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chardef;
    use crate::registers;
    use std::collections::HashMap;
    use texel_testing::*;

    fn built_in_commands() -> HashMap<&'static str, command::BuiltIn<State>> {
        HashMap::from([
            ("the", get_the()),
            ("count", registers::get_count()),
            ("dimen", registers::get_dimen()),
            ("skip", registers::get_skip()),
            ("toks", registers::get_toks()),
            ("chardef", chardef::get_chardef()),
        ])
    }

    test_suite![
        expansion_equality_tests(
            (count_default, r"\the\count 5", "0"),
            (count_positive, r"\count 5 87 \the\count 5", "87"),
            (count_negative, r"\count 5 -87 \the\count 5", "-87"),
            (dimen, r"\dimen 5 1.5pt \the\dimen 5", "1.5pt"),
            (skip, r"\skip 5 1pt plus 2fil \the\skip 5", "1.0pt plus 2.0fil"),
            (toks, r"\toks 5 {Hello}\the\toks 5", "Hello"),
            (toks_empty, r"\the\toks 5", ""),
            (chardef, r"\chardef\A=`Q \the\A", "81"),
            (
                toks_content_not_expanded_when_stored,
                r"\count 0 7 \toks 0 {\the\count 0}\count 0 8 \the\toks 0",
                "8"
            ),
        ),
        failure_tests(
            (end_of_input, r"\the"),
            (character_argument, r"\the a"),
            (undefined_command_argument, r"\the\undefinedCommand"),
        ),
    ];
}
