//! Commands that alter the expansion process

use texel::prelude as tx;
use texel::token::Token;
use texel::traits::*;
use texel::*;

static NO_EXPAND_TAG: command::StaticTag = command::StaticTag::new();

/// Get the `\noexpand` command.
pub fn get_noexpand<S>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(noexpand_fn).with_tag(NO_EXPAND_TAG.get())
}

fn noexpand_fn<S>(_: Token, _: &mut vm::ExpansionInput<S>) -> tx::Result<()> {
    panic!(
        "the \\noexpand expansion function is never invoked directly; \
         the primitive operates through the expansion override hook, \
         which is a method on the `TexelState` trait. \
         Wire `expansion::noexpand_hook` into the state's hook."
    )
}

/// The expansion override hook that implements `\noexpand`.
///
/// Install this function as the
/// [expansion_override_hook](TexelState::expansion_override_hook) of the
/// state. When the hook sees the `\noexpand` command it returns the
/// following token, which the stream then emits without expanding it.
#[inline]
pub fn noexpand_hook<S: TexelState>(
    token: Token,
    input: &mut vm::ExpansionInput<S>,
    tag: Option<command::Tag>,
) -> tx::Result<Option<Token>> {
    // Fast path: this is not the \noexpand command.
    if tag != Some(NO_EXPAND_TAG.get()) {
        return Ok(None);
    }
    noexpand_hook_finish(token, input)
}

fn noexpand_hook_finish<S: TexelState>(
    _: Token,
    input: &mut vm::ExpansionInput<S>,
) -> tx::Result<Option<Token>> {
    match input.unexpanded().next()? {
        None => Err(input.eof_error(error::SimpleEndOfInputError::new(
            r"reading the token after \noexpand",
        ))),
        Some(token) => Ok(Some(token)),
    }
}

/// Get the `\expandafter` command.
pub fn get_expandafter<S: TexelState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(expandafter_fn)
}

fn expandafter_fn<S: TexelState>(
    expandafter_token: Token,
    input: &mut vm::ExpansionInput<S>,
) -> tx::Result<()> {
    let next = match input.unexpanded().next()? {
        None => {
            return Err(input.eof_error(ExpandAfterEndOfInputError {
                expandafter_token,
                tokens_found: 0,
            }));
        }
        Some(next) => next,
    };
    if input.unexpanded().peek()?.is_none() {
        return Err(input.eof_error(ExpandAfterEndOfInputError {
            expandafter_token,
            tokens_found: 1,
        }));
    }
    input.expanded().expand_once()?;
    input.expansions_mut().push(next);
    Ok(())
}

#[derive(Debug)]
struct ExpandAfterEndOfInputError {
    expandafter_token: Token,
    tokens_found: usize,
}

impl error::EndOfInputError for ExpandAfterEndOfInputError {
    fn doing(&self) -> String {
        r"expanding an \expandafter command".into()
    }

    fn notes(&self) -> Vec<error::display::Note> {
        vec![
            format![
                r"\expandafter must be followed by 2 tokens but {} were found",
                self.tokens_found
            ]
            .into(),
            error::display::Note::SourceCodeTrace(
                r"the \expandafter appeared here:".into(),
                self.expandafter_token,
            ),
        ]
    }
}

/// Get the `\relax` command, which does nothing.
pub fn get_relax<S>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(|_, _| Ok(()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def;
    use crate::prefix;
    use std::collections::HashMap;
    use texel::token;
    use texel::vm::implement_has_component;
    use texel_testing::*;

    #[derive(Default)]
    struct State {
        prefix: prefix::Component,
        testing: TestingComponent,
    }

    impl TexelState for State {
        fn expansion_override_hook(
            token: token::Token,
            input: &mut vm::ExpansionInput<Self>,
            tag: Option<command::Tag>,
        ) -> texel::prelude::Result<Option<token::Token>> {
            noexpand_hook(token, input, tag)
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
            ("noexpand", get_noexpand()),
            ("relax", get_relax()),
            ("xa", get_expandafter()),
        ])
    }

    test_suite![
        options(
            TestOption::BuiltInCommands(built_in_commands),
            TestOption::AllowUndefinedCommands(true),
        ),
        expansion_equality_tests(
            (relax_does_nothing, r"a\relax b", "ab"),
            (noexpand_simple_case, r"\def\a{Hello}\noexpand\a", r"\a"),
            (
                delimited_macro_consumes_nothing,
                r"\def\a#1\b{Hello '#1'}\def\b{World}\a\b",
                "Hello ''"
            ),
            (
                expandafter_expands_delimiter,
                r"\def\a#1\b{Hello '#1'}\def\b{World}\xa\a\b\b",
                "Hello 'World'"
            ),
            (
                expandafter_with_noexpand,
                r"\def\a#1\b{Hello '#1'}\def\b{World}\xa\a\noexpand\b\b",
                "Hello ''World"
            ),
            (
                noexpand_only_shields_once,
                r"\def\A{\B}\def\B{Hello}\xa\noexpand\A",
                r"\B"
            ),
        ),
        failure_tests(
            (noexpand_end_of_input, r"\noexpand"),
            (expandafter_missing_first_token, r"\xa"),
            (expandafter_missing_second_token, r"\xa\relax"),
            (
                expandafter_missing_second_token_nested,
                r"\def\A{}\xa\xa\xa\A\A"
            ),
        ),
    ];

    // Each of \a, \b, \c and \d appends its letter to a list that is
    // printed at the end, so the output records the order in which the
    // macros were expanded.
    static PREFIX: &str = r"\def\mk#1#2{\def#1##1\notes##2\end{##1\notes##2#2\end}}\mk\a a\mk\b b\mk\c c\mk\d d\def\notes#1\end{#1}";
    static POSTFIX: &str = r"\notes\end";

    macro_rules! expansion_order_test {
        ( $( ( $name: ident, $lhs: expr, $rhs: expr ) ),* $(,)? ) => {
            test_suite![
                options(TestOption::BuiltInCommands(built_in_commands)),
                expansion_equality_tests(
                    $(
                        ( $name, format!("{}{}{}", PREFIX, $lhs, POSTFIX), $rhs ),
                    )*
                ),
            ];
        };
    }

    expansion_order_test![
        (texbook_p374_two_tokens, r"\xa\a\b", "ba"),
        (texbook_p374_three_tokens, r"\xa\xa\xa\a\xa\b\c", "cba"),
        (
            texbook_p374_four_tokens,
            r"\xa\xa\xa\xa\xa\xa\xa\a\xa\xa\xa\b\xa\c\d",
            "dcba"
        ),
        (permutation_abcd, r"\a\b\c\d", "abcd"),
        (permutation_abdc, r"\a\b\xa\c\d", "abdc"),
        (permutation_acbd, r"\a\xa\b\c\d", "acbd"),
        (permutation_bacd, r"\xa\a\b\c\d", "bacd"),
        (permutation_badc, r"\xa\a\b\xa\c\d", "badc"),
        (permutation_bcad, r"\xa\xa\xa\a\b\c\d", "bcad"),
        (permutation_cabd, r"\xa\a\xa\b\c\d", "cabd"),
        (permutation_dabc, r"\xa\a\xa\b\xa\c\d", "dabc"),
    ];
}
