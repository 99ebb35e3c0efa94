//! Primitives for creating user-defined macros (`\def` and friends)

use crate::prefix;
use std::rc::Rc;
use texel::error;
use texel::parse;
use texel::prelude as tx;
use texel::texmacro;
use texel::token;
use texel::token::Token;
use texel::token::Value;
use texel::traits::*;
use texel::*;
use texel_stdext::pattern::Pattern;

pub const DEF_DOC: &str = "Define a custom macro";

static DEF_TAG: command::StaticTag = command::StaticTag::new();

/// The tag shared by `\def`, `\gdef`, `\edef` and `\xdef`.
///
/// Commands carrying this tag may be prefixed with `\long` and `\outer`
/// in addition to `\global`.
pub fn get_def_tag() -> command::Tag {
    DEF_TAG.get()
}

/// Get the `\def` command.
pub fn get_def<S: HasComponent<prefix::Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(def_primitive_fn)
        .with_tag(DEF_TAG.get())
        .with_doc(DEF_DOC)
}

/// Get the `\gdef` command.
pub fn get_gdef<S: HasComponent<prefix::Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(gdef_primitive_fn).with_tag(DEF_TAG.get())
}

/// Get the `\edef` command.
pub fn get_edef<S: HasComponent<prefix::Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(edef_primitive_fn).with_tag(DEF_TAG.get())
}

/// Get the `\xdef` command.
pub fn get_xdef<S: HasComponent<prefix::Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(xdef_primitive_fn).with_tag(DEF_TAG.get())
}

fn def_primitive_fn<S: HasComponent<prefix::Component>>(
    def_token: Token,
    input: &mut vm::ExecutionInput<S>,
) -> tx::Result<()> {
    parse_and_set_macro(def_token, input, false, false)
}

fn gdef_primitive_fn<S: HasComponent<prefix::Component>>(
    def_token: Token,
    input: &mut vm::ExecutionInput<S>,
) -> tx::Result<()> {
    parse_and_set_macro(def_token, input, true, false)
}

fn edef_primitive_fn<S: HasComponent<prefix::Component>>(
    def_token: Token,
    input: &mut vm::ExecutionInput<S>,
) -> tx::Result<()> {
    parse_and_set_macro(def_token, input, false, true)
}

fn xdef_primitive_fn<S: HasComponent<prefix::Component>>(
    def_token: Token,
    input: &mut vm::ExecutionInput<S>,
) -> tx::Result<()> {
    parse_and_set_macro(def_token, input, true, true)
}

fn parse_and_set_macro<S: HasComponent<prefix::Component>>(
    def_token: Token,
    input: &mut vm::ExecutionInput<S>,
    set_globally_override: bool,
    expand_replacement_text: bool,
) -> tx::Result<()> {
    let component = input.state_mut().component_mut();
    let global = component.take_global() || set_globally_override;
    let long = component.take_long();
    // TeX's \outer restricts where the macro may be used. These
    // restrictions are not enforced, so the flag is read and dropped.
    let _ = component.take_outer();
    let scope = match global {
        true => context::Scope::Global,
        false => context::Scope::Local,
    };
    let target = token::CommandRef::parse(input)?;
    let (prefix, raw_parameters, replacement_end_token) =
        parse_prefix_and_parameters(def_token, input.unexpanded())?;
    let parameters: Vec<texmacro::Parameter> = raw_parameters
        .into_iter()
        .map(|raw| match raw {
            RawParameter::Undelimited => texmacro::Parameter::Undelimited,
            RawParameter::Delimited(values) => match Pattern::new(values) {
                Some(pattern) => texmacro::Parameter::Delimited(pattern),
                // A delimited parameter has at least one delimiter value.
                None => texmacro::Parameter::Undelimited,
            },
        })
        .collect();
    let mut replacements = match expand_replacement_text {
        false => parse_replacement_text(
            def_token,
            input.unexpanded(),
            replacement_end_token,
            parameters.len(),
        )?,
        true => parse_replacement_text(
            def_token,
            input.expanded(),
            replacement_end_token,
            parameters.len(),
        )?,
    };
    // Token lists in the replacement text are stored in reverse so that
    // expansion can copy them directly onto the expansions stack.
    for replacement in replacements.iter_mut() {
        if let texmacro::Replacement::Tokens(tokens) = replacement {
            tokens.reverse();
        }
    }
    let user_defined_macro = texmacro::Macro::new(prefix, parameters, replacements, long);
    input
        .context_mut()
        .set_command(target, Rc::new(user_defined_macro), scope);
    Ok(())
}

enum RawParameter {
    Undelimited,
    Delimited(Vec<Value>),
}

impl RawParameter {
    fn push(&mut self, value: Value) {
        match self {
            RawParameter::Undelimited => {
                *self = RawParameter::Delimited(vec![value]);
            }
            RawParameter::Delimited(values) => {
                values.push(value);
            }
        }
    }
}

fn char_to_parameter_index(c: char) -> Option<usize> {
    match c {
        '1'..='9' => Some(c as usize - '1' as usize),
        _ => None,
    }
}

fn parse_prefix_and_parameters<I: vm::TokenStream>(
    def_token: Token,
    input: &mut I,
) -> tx::Result<(Vec<Token>, Vec<RawParameter>, Option<Token>)> {
    let mut prefix = Vec::new();
    let mut parameters: Vec<RawParameter> = Vec::new();

    while let Some(token) = input.next()? {
        match token.value() {
            Value::BeginGroup(_) => {
                return Ok((prefix, parameters, None));
            }
            Value::EndGroup(_) => {
                return Err(input.error(error::SimpleTokenError::new(
                    token,
                    "unexpected end group token while reading the parameter text of a macro",
                )));
            }
            Value::Parameter(_) => {
                let parameter_token = match input.next()? {
                    None => {
                        return Err(input.eof_error(AfterParameterTokenError {
                            doing: "the parameter text of a macro",
                            parameter_token: token,
                        }));
                    }
                    Some(token) => token,
                };
                match parameter_token.value() {
                    Value::BeginGroup(_) => {
                        // The special #{ rule: the begin group token both
                        // delimits the last parameter and starts the
                        // replacement text.
                        match parameters.last_mut() {
                            None => prefix.push(parameter_token),
                            Some(parameter) => parameter.push(parameter_token.value()),
                        }
                        return Ok((prefix, parameters, Some(parameter_token)));
                    }
                    Value::CommandRef(_) => {
                        return Err(input.error(ParameterNumberError {
                            token: parameter_token,
                            num_parameters_so_far: parameters.len(),
                        }));
                    }
                    _ => {
                        // The char is not None per the match arms above.
                        let c = parameter_token.char().unwrap();
                        match char_to_parameter_index(c) {
                            Some(index) if index == parameters.len() => {
                                parameters.push(RawParameter::Undelimited);
                            }
                            _ => {
                                return Err(input.error(ParameterNumberError {
                                    token: parameter_token,
                                    num_parameters_so_far: parameters.len(),
                                }));
                            }
                        }
                    }
                }
            }
            _ => match parameters.last_mut() {
                None => prefix.push(token),
                Some(parameter) => parameter.push(token.value()),
            },
        }
    }
    Err(input.eof_error(DefEndOfInputError {
        doing: "the parameter text of a macro",
        def_token,
    }))
}

fn parse_replacement_text<I: vm::TokenStream>(
    def_token: Token,
    input: &mut I,
    opt_final_token: Option<Token>,
    num_parameters: usize,
) -> tx::Result<Vec<texmacro::Replacement>> {
    let mut result: Vec<texmacro::Replacement> = Vec::new();
    let mut scope_depth = 0;
    let push = |result: &mut Vec<texmacro::Replacement>, token| match result.last_mut() {
        Some(texmacro::Replacement::Tokens(tokens)) => {
            tokens.push(token);
        }
        _ => {
            result.push(texmacro::Replacement::Tokens(vec![token]));
        }
    };

    while let Some(token) = input.next()? {
        match token.value() {
            Value::BeginGroup(_) => {
                scope_depth += 1;
            }
            Value::EndGroup(_) => {
                if scope_depth == 0 {
                    if let Some(final_token) = opt_final_token {
                        push(&mut result, final_token);
                    }
                    return Ok(result);
                }
                scope_depth -= 1;
            }
            Value::Parameter(_) => {
                let parameter_token = match input.next()? {
                    None => {
                        return Err(input.eof_error(AfterParameterTokenError {
                            doing: "the replacement text of a macro",
                            parameter_token: token,
                        }));
                    }
                    Some(token) => token,
                };
                match parameter_token.value() {
                    // A doubled parameter token stands for a single one.
                    Value::Parameter(_) => {
                        push(&mut result, parameter_token);
                    }
                    Value::CommandRef(_) => {
                        return Err(input.error(ReplacementParameterNumberError {
                            token: parameter_token,
                            num_parameters,
                        }));
                    }
                    _ => {
                        let index = parameter_token.char().and_then(char_to_parameter_index);
                        match index {
                            Some(index) if index < num_parameters => {
                                result.push(texmacro::Replacement::Parameter(index));
                            }
                            _ => {
                                return Err(input.error(ReplacementParameterNumberError {
                                    token: parameter_token,
                                    num_parameters,
                                }));
                            }
                        }
                    }
                }
                continue;
            }
            _ => {}
        }
        push(&mut result, token);
    }
    Err(input.eof_error(DefEndOfInputError {
        doing: "the replacement text of a macro",
        def_token,
    }))
}

#[derive(Debug)]
struct DefEndOfInputError {
    doing: &'static str,
    def_token: Token,
}

impl error::EndOfInputError for DefEndOfInputError {
    fn doing(&self) -> String {
        format!("reading {}", self.doing)
    }

    fn notes(&self) -> Vec<error::display::Note> {
        vec![error::display::Note::SourceCodeTrace(
            "the macro definition started here:".into(),
            self.def_token,
        )]
    }
}

#[derive(Debug)]
struct AfterParameterTokenError {
    doing: &'static str,
    parameter_token: Token,
}

impl error::EndOfInputError for AfterParameterTokenError {
    fn doing(&self) -> String {
        format!("reading {}", self.doing)
    }

    fn notes(&self) -> Vec<error::display::Note> {
        vec![
            "a parameter token must be followed by a digit 1 through 9, another parameter token, or a begin group token".into(),
            error::display::Note::SourceCodeTrace(
                "the parameter token appeared here:".into(),
                self.parameter_token,
            ),
        ]
    }
}

#[derive(Debug)]
struct ParameterNumberError {
    token: Token,
    num_parameters_so_far: usize,
}

impl error::TexError for ParameterNumberError {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.token)
    }

    fn title(&self) -> String {
        "unexpected token after a parameter token".into()
    }

    fn notes(&self) -> Vec<error::display::Note> {
        vec![format![
            "parameters must be numbered consecutively; this macro has {} parameter(s) so far, so #{} was expected",
            self.num_parameters_so_far,
            self.num_parameters_so_far + 1,
        ]
        .into()]
    }
}

#[derive(Debug)]
struct ReplacementParameterNumberError {
    token: Token,
    num_parameters: usize,
}

impl error::TexError for ReplacementParameterNumberError {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.token)
    }

    fn title(&self) -> String {
        "invalid parameter number in the replacement text of a macro".into()
    }

    fn notes(&self) -> Vec<error::display::Note> {
        vec![match self.num_parameters {
            0 => "this macro has no parameters, so no parameter number can appear".into(),
            1 => "this macro has 1 parameter, so only #1 can appear".into(),
            n => format!["this macro has {n} parameters, so the number must be between 1 and {n} inclusive"].into(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers;
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
            ("def", get_def()),
            ("gdef", get_gdef()),
            ("edef", get_edef()),
            ("xdef", get_xdef()),
            ("global", prefix::get_global()),
            ("long", prefix::get_long()),
            ("count", registers::get_count()),
            ("the", the::get_the()),
            ("assertFlagsAreFalse", prefix::get_assert_flags_are_false()),
        ])
    }

    test_suite![
        options(
            TestOption::BuiltInCommands(built_in_commands),
            TestOption::AllowUndefinedCommands(true)
        ),
        expansion_equality_tests(
            (definition_produces_no_output, r"\def\A{abc}", ""),
            (output_is_correct, r"\def\A{abc}\A", "abc"),
            (output_twice, r"\def\A{abc}\A\A", "abcabc"),
            (parse_one_parameter, r"\def\A#1{a-#1-b}", ""),
            (one_undelimited_parameter, r"\def\A#1{a-#1-b}\A1", "a-1-b"),
            (
                one_undelimited_parameter_multiple_times,
                r"\def\A#1{#1 #1 #1}\A1",
                "1 1 1"
            ),
            (
                one_undelimited_parameter_multiple_tokens,
                r"\def\A#1{a-#1-b}\A{123}",
                "a-123-b"
            ),
            (two_undelimited_parameters, r"\def\A#1#2{#2-#1}\A56", "6-5"),
            (
                two_undelimited_parameters_multiple_token_inputs,
                r"\def\A#1#2{#2-#1}\A{abc}{xyz}",
                "xyz-abc"
            ),
            (arguments_swapped, r"\def\x#1#2{#2#1}\x{ab}{cd}", "cdab"),
            (consume_prefix_correctly, r"\def\A fgh{567}\A fghi", "567i"),
            (
                one_undelimited_parameter_with_prefix,
                r"\def\A abc#1{y#1z}\A abcdefg",
                "ydzefg"
            ),
            (
                one_delimited_parameter,
                r"\def\A #1xxx{y#1z}\A abcxxx",
                "yabcz"
            ),
            (one_delimited_parameter_empty, r"\def\A #1xxx{y#1z}\A xxx", "yz"),
            (
                one_delimited_parameter_with_scope,
                r"\def\A #1xxx{#1}\A abc{123xxx}xxx",
                "abc{123xxx}"
            ),
            (
                one_delimited_parameter_with_prefix,
                r"\def\A a#1c{x#1y}\A abcdef",
                "xbydef"
            ),
            (
                two_delimited_parameters_with_prefix,
                r"\def\A a#1c#2e{x#2y#1z}\A abcdef",
                "xdybzf"
            ),
            (
                two_delimited_parameters_reordered,
                r"\def\a#1,#2.{[#2#1]}\a x,y.",
                "[yx]"
            ),
            (
                one_delimited_parameter_grouped_value,
                r"\def\A #1c{x#1y}\A {Hello}c",
                "xHelloy"
            ),
            (
                parameter_brace_special_case,
                r"\def\A #{Mint says }\A{hello}",
                "Mint says {hello}"
            ),
            (
                grouping,
                r"\def\A{Hello}\A{\def\A{World}\A}\A",
                "HelloWorldHello"
            ),
            (
                grouping_global,
                r"\def\A{Hello}\A{\global\def\A{World}\A}\A",
                "HelloWorldWorld"
            ),
            (gdef, r"\def\A{Hello}\A{\gdef\A{World}\A}\A", "HelloWorldWorld"),
            (
                gdef_with_global_prefix,
                r"\def\A{Hello}\A{\global\gdef\A{World}\A}\A",
                "HelloWorldWorld"
            ),
            (def_takes_global, r"\global\def\A{Hello}\assertFlagsAreFalse", ""),
            (def_takes_long, r"\long\def\A{Hello}\assertFlagsAreFalse", ""),
            (
                edef_expands_replacement,
                r"\count 0 5 \edef\A{\the\count 0}\count 0 6 \A",
                "5"
            ),
            (
                def_does_not_expand_replacement,
                r"\count 0 5 \def\A{\the\count 0}\count 0 6 \A",
                "6"
            ),
            (
                xdef_is_global,
                r"\def\A{a}{\xdef\A{b}}\A",
                "b"
            ),
            (
                edef_is_local,
                r"\def\A{a}{\edef\A{b}}\A",
                "a"
            ),
            (
                long_macro_takes_par,
                "\\long\\def\\A#1{x#1y}\\A{a\n\nb}",
                "xa\\par by"
            ),
            (
                texbook_exercise_20_1,
                r"\def\mustnt{I must not talk in class.}%
                  \def\five{\mustnt\mustnt\mustnt\mustnt\mustnt}%
                  \def\twenty{\five\five\five\five}%
                  \def\punishment{\twenty\twenty\twenty\twenty\twenty}%
                  \punishment",
                "I must not talk in class.".repeat(100)
            ),
            (
                texbook_exercise_20_2,
                r"\def\a{\b}%
                  \def\b{A\def\a{B\def\a{C\def\a{\b}}}}%
                  \def\puzzle{\a\a\a\a\a}%
                  \puzzle",
                "ABCAB"
            ),
            (
                texbook_exercise_20_3_part_1,
                r"\def\row#1{(#1_1,\ldots,#1_n)}\row{\bf x}",
                r"(\bf x_1,\ldots,\bf x_n)"
            ),
            (
                texbook_exercise_20_3_part_2,
                r"\def\row#1{(#1_1,\ldots,#1_n)}\row{{\bf x}}",
                r"({\bf x}_1,\ldots,{\bf x}_n)"
            ),
            (
                texbook_exercise_20_5,
                r"\def\a#1{\def\b##1{##1#1}}\a!\b{Hello}",
                "Hello!"
            ),
            (
                texbook_exercise_20_5_example_below,
                r"\def\a#1#{\hbox to #1}\a3pt{x}",
                r"\hbox to 3pt{x}"
            ),
            (
                texbook_exercise_20_6,
                r"\def\b#1{And #1, World!}\def\a#{\b}\a{Hello}",
                "And Hello, World!"
            ),
        ),
        failure_tests(
            (end_of_input_scanning_target, r"\def"),
            (end_of_input_scanning_parameter_text, r"\def\A"),
            (end_of_input_scanning_replacement, r"\def\A{"),
            (end_of_input_scanning_nested_replacement, r"\def\A{{}"),
            (end_of_input_reading_parameter_number, r"\def\A#"),
            (end_of_input_scanning_argument, r"\def\A#1{} \A"),
            (
                end_of_input_reading_value_for_parameter,
                r"\def\A#1{} \A{this {is parameter 1 but it never ends}"
            ),
            (end_of_input_reading_prefix, r"\def\A abc{} \A ab"),
            (
                end_of_input_reading_delimiter,
                r"\def\A #1abc{} \A {first parameter}ab"
            ),
            (runaway_argument, "\\def\\A#1{x#1y}\\A{a\n\nb}"),
            (
                extra_end_group_in_delimited_argument,
                r"\def\A#1.{x#1y}\A a}b."
            ),
            (unexpected_token_target, r"\def a"),
            (unexpected_token_parameter_text, r"\def\A }"),
            (unexpected_token_parameter_number, r"\def\A #a}"),
            (unexpected_parameter_number_in_parameter_text, r"\def\A #2{}"),
            (control_sequence_after_parameter_token, r"\def\A #\B{}"),
            (unexpected_parameter_token_in_replacement, r"\def\A #1{#a}"),
            (unexpected_parameter_number_in_replacement, r"\def\A {#2}"),
            (unexpected_parameter_number_in_replacement_2, r"\def\A #1{#2}"),
            (unexpected_token_in_prefix, r"\def\A abc{d} \A abd"),
        ),
    ];
}
