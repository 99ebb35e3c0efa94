//! # The Texel standard library
//!
//! This crate contains implementations of TeX primitives for Texel.

extern crate texel;
extern crate texel_stdext;

use std::collections::HashMap;

use texel::command;
use texel::traits::*;
use texel::vm;
use texel::vm::implement_has_component;

pub mod alias;
pub mod catcode;
pub mod chardef;
pub mod conditional;
pub mod def;
pub mod expansion;
pub mod group;
pub mod input;
pub mod io;
pub mod math;
pub mod prefix;
pub mod registers;
pub mod the;
pub mod time;
pub mod tracingmacros;
pub mod typeset;

/// All the primitives in the standard library, keyed by their usual names.
pub fn all_initial_built_ins<S>() -> HashMap<&'static str, command::BuiltIn<S>>
where
    S: TexelState
        + HasComponent<conditional::Component>
        + HasComponent<io::Component>
        + HasComponent<prefix::Component>
        + HasComponent<time::Component>
        + HasComponent<typeset::Component>,
{
    HashMap::from([
        ("advance", math::get_advance()),
        ("aftergroup", group::get_aftergroup()),
        //
        ("begingroup", group::get_begingroup()),
        //
        ("catcode", catcode::get_catcode()),
        ("char", typeset::get_char()),
        ("chardef", chardef::get_chardef()),
        ("closein", io::get_closein()),
        ("count", registers::get_count()),
        ("countdef", registers::get_countdef()),
        ("currentgrouplevel", group::get_currentgrouplevel()),
        ("currentgrouptype", group::get_currentgrouptype()),
        ("currentifbranch", conditional::get_current_if_branch()),
        ("currentiftype", conditional::get_current_if_type()),
        //
        ("day", time::get_day()),
        ("def", def::get_def()),
        ("dimen", registers::get_dimen()),
        ("dimendef", registers::get_dimendef()),
        ("divide", math::get_divide()),
        //
        ("edef", def::get_edef()),
        ("else", conditional::get_else()),
        ("endgroup", group::get_endgroup()),
        ("endinput", input::get_endinput()),
        ("endlinechar", registers::get_endlinechar()),
        ("expandafter", expansion::get_expandafter()),
        //
        ("fi", conditional::get_fi()),
        //
        ("gdef", def::get_gdef()),
        ("global", prefix::get_global()),
        //
        ("if", conditional::get_if()),
        ("ifcase", conditional::get_if_case()),
        ("ifcat", conditional::get_if_cat()),
        ("ifdim", conditional::get_if_dim()),
        ("ifeof", io::get_ifeof()),
        ("iffalse", conditional::get_if_false()),
        ("ifhmode", typeset::get_ifhmode()),
        ("ifinner", typeset::get_ifinner()),
        ("ifmmode", typeset::get_ifmmode()),
        ("ifnum", conditional::get_if_num()),
        ("ifodd", conditional::get_if_odd()),
        ("iftrue", conditional::get_if_true()),
        ("ifvmode", typeset::get_ifvmode()),
        ("ifx", conditional::get_if_x()),
        ("input", input::get_input()),
        //
        ("kern", typeset::get_kern()),
        //
        ("lastkern", typeset::get_lastkern()),
        ("let", alias::get_let()),
        ("long", prefix::get_long()),
        //
        ("month", time::get_month()),
        ("multiply", math::get_multiply()),
        ("muskip", registers::get_muskip()),
        ("muskipdef", registers::get_muskipdef()),
        //
        ("noexpand", expansion::get_noexpand()),
        //
        ("openin", io::get_openin()),
        ("or", conditional::get_or()),
        ("outer", prefix::get_outer()),
        //
        ("par", typeset::get_par()),
        //
        ("read", io::get_read()),
        ("relax", expansion::get_relax()),
        //
        ("skip", registers::get_skip()),
        ("skipdef", registers::get_skipdef()),
        //
        ("the", the::get_the()),
        ("time", time::get_time()),
        ("toks", registers::get_toks()),
        ("toksdef", registers::get_toksdef()),
        ("tracingmacros", tracingmacros::get_tracingmacros()),
        //
        ("unkern", typeset::get_unkern()),
        //
        ("xdef", def::get_xdef()),
        //
        ("year", time::get_year()),
    ])
}

/// A state struct that is compatible with every primitive in the standard
/// library.
#[derive(Default)]
pub struct StdLibState {
    pub conditional: conditional::Component,
    pub io: io::Component,
    pub prefix: prefix::Component,
    pub time: time::Component,
    pub typeset: typeset::Component,
}

impl TexelState for StdLibState {
    #[inline]
    fn post_macro_expansion_hook(
        token: texel::token::Token,
        input: &vm::ExpansionInput<Self>,
        tex_macro: &texel::texmacro::Macro,
        arguments: &[&[texel::token::Token]],
        reversed_expansion: &[texel::token::Token],
    ) {
        tracingmacros::hook(token, input, tex_macro, arguments, reversed_expansion)
    }

    #[inline]
    fn expansion_override_hook(
        token: texel::token::Token,
        input: &mut vm::ExpansionInput<Self>,
        tag: Option<texel::command::Tag>,
    ) -> texel::prelude::Result<Option<texel::token::Token>> {
        expansion::noexpand_hook(token, input, tag)
    }

    #[inline]
    fn variable_assignment_scope_hook(state: &mut Self) -> texel::context::Scope {
        prefix::variable_assignment_scope_hook(state)
    }
}

impl StdLibState {
    pub fn all_initial_built_ins() -> HashMap<&'static str, command::BuiltIn<StdLibState>> {
        all_initial_built_ins()
    }

    /// Create a new VM that uses the standard library's state and all of its
    /// commands.
    pub fn new_vm() -> Box<vm::VM<StdLibState>> {
        vm::VM::<StdLibState>::new(StdLibState::all_initial_built_ins())
    }
}

implement_has_component![
    StdLibState,
    (conditional::Component, conditional),
    (io::Component, io),
    (prefix::Component, prefix),
    (time::Component, time),
    (typeset::Component, typeset),
];

/// A TeX snippet that exercises some error case in the standard library.
pub struct ErrorCase {
    pub description: &'static str,
    pub source_code: &'static str,
}

impl ErrorCase {
    /// Returns a vector of TeX snippets that exercise error paths in the
    /// library.
    pub fn all_error_cases() -> Vec<ErrorCase> {
        let mut cases = vec![];
        for (description, source_code) in vec![
            (r"\toks starts with a letter token", r"\toks 0 = a"),
            (
                r"\toks starts with a non-variable command",
                r"\toks 0 = \def",
            ),
            (
                r"\toks starts with a variable command of the wrong type",
                r"\toks 0 = \count 0",
            ),
            (
                r"end of input while scanning token list",
                r"\toks 0 = {  no closing brace",
            ),
            (r"assign number from \toks", r"\count 0 = \toks 0"),
            (r"end of input right after \toks", r"\toks 0"),
            (r"\count is out of bounds (negative)", r"\count -200"),
            (r"\count is out of bounds (positive)", r"\count 2000000000"),
            ("file does not exist", r"\input doesNotExist"),
            ("end of input after \\global", r"\global"),
            ("can't be prefixed by \\global", r"\global \par"),
            ("can't be prefixed by \\global (character)", r"\global a"),
            ("can't be prefixed by \\long", r"\long \let \a = \def"),
            ("can't be prefixed by \\outer", r"\outer \let \a = \def"),
            ("assignment to read-only variable", r"\year = 2000"),
            ("bad rhs in assignment", r"\count 0 = X"),
            ("invalid variable (undefined)", r"\advance \undefined by 4"),
            (
                "invalid variable (not a variable command)",
                r"\advance \def by 4",
            ),
            ("invalid variable (character token)", r"\advance a by 4"),
            ("invalid variable (eof)", r"\advance"),
            ("invalid relation", r"\ifnum 3 z 4"),
            ("malformed by keyword", r"\advance \count 0 bg"),
            ("undefined control sequence", r"\elephant"),
            ("invalid character", "\u{7F}"),
            ("invalid end of group", r"}"),
            ("invalid start of number", r"\count X"),
            ("invalid start of number (eof)", r"\count"),
            ("invalid start of number (not a variable)", r"\count \def"),
            (
                "cast negative number to positive (from constant)",
                r"\count -1",
            ),
            (
                "cast negative number to positive (from variable)",
                r"\count 0 = 1 \count - \count 0",
            ),
            (
                "read positive number from negative variable value",
                r"\count 0 = -1 \count \count 0",
            ),
            ("invalid character constant", r"\count `\def"),
            ("invalid character constant (eof)", r"\count `"),
            ("invalid octal digit", r"\count '9"),
            ("invalid octal digit (eof)", r"\count '"),
            ("invalid hexadecimal digit", "\\count \"Z"),
            ("invalid hexadecimal digit (eof)", "\\count \""),
            (
                "decimal number too big",
                r"\count 1000000000000000000000",
            ),
            ("octal number too big", r"\count '7777777777777777777777"),
            (
                "hexadecimal number too big",
                "\\count \"AAAAAAAAAAAAAAAAAAAAAA",
            ),
            ("number with letter catcode", r"\catcode `1 = 11 \count 1"),
            ("category code out of bounds", r"\catcode 0 = 17"),
            ("missing dimension unit", r"\dimen 0 = 5"),
            ("invalid command target", r"\let a = \year"),
            ("invalid command target (eof)", r"\let"),
            ("runaway macro argument", r"\def\a#1{#1}\a{"),
            ("par in non-long macro argument", r"\def\a#1{#1}\a{x\par}"),
        ] {
            cases.push(ErrorCase {
                description,
                source_code,
            })
        }
        cases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texel_testing::*;

    #[derive(Default)]
    struct State {
        conditional: conditional::Component,
        io: io::Component,
        prefix: prefix::Component,
        testing: TestingComponent,
        time: time::Component,
        typeset: typeset::Component,
    }

    impl TexelState for State {
        #[inline]
        fn expansion_override_hook(
            token: texel::token::Token,
            input: &mut vm::ExpansionInput<Self>,
            tag: Option<texel::command::Tag>,
        ) -> texel::prelude::Result<Option<texel::token::Token>> {
            expansion::noexpand_hook(token, input, tag)
        }

        #[inline]
        fn variable_assignment_scope_hook(state: &mut Self) -> texel::context::Scope {
            prefix::variable_assignment_scope_hook(state)
        }
    }

    implement_has_component![
        State,
        (conditional::Component, conditional),
        (io::Component, io),
        (prefix::Component, prefix),
        (TestingComponent, testing),
        (time::Component, time),
        (typeset::Component, typeset),
    ];

    fn built_in_commands() -> HashMap<&'static str, command::BuiltIn<State>> {
        all_initial_built_ins()
    }

    test_suite![
        options(TestOption::BuiltInCommands(built_in_commands)),
        expansion_equality_tests(
            (
                overwrite_else,
                r"\def\else{}\ifodd 2 \else should be skipped \fi",
                r""
            ),
            (
                math_and_active_char,
                r"\catcode`\A=13 \countdef A5 \countdef ~6 ~=7 A=8 \advance~byA \the~",
                r"15"
            ),
            (
                conditional_drives_macro_definition,
                r"\ifnum 1<2 \def\a{yes}\else \def\a{no}\fi\a",
                "yes"
            ),
            (
                edef_freezes_register_value,
                r"\count 0 = 5 \edef\a{\the\count 0}\count 0 = 6 \a",
                "5"
            ),
            (
                // The first 'a' has catcode other, the second has catcode
                // letter since the group restored the original code.
                group_restores_catcode,
                r"\catcode `[ = 1 \catcode `] = 2 [\catcode `a = 12 a]a",
                r"{\catcode `a = 12 a}a"
            ),
            (
                // The default typesetter reports vertical mode.
                mode_conditionals_in_default_mode,
                r"\ifvmode V\fi\ifhmode H\fi\ifmmode M\fi\ifinner I\fi",
                "V"
            ),
        ),
    ];

    #[test]
    fn all_error_cases() {
        let options = vec![
            TestOption::BuiltInCommands(built_in_commands),
            TestOption::AllowUndefinedCommands(false),
        ];
        for case in ErrorCase::all_error_cases() {
            println!("CASE {}", case.description);
            run_failure_test::<State>(case.source_code, &options)
        }
    }
}
