//! Conditional primitives (`\ifnum`, `\else`, `\fi`, etc.)

use texel::parse;
use texel::prelude as tx;
use texel::token;
use texel::token::Token;
use texel::token::Value;
use texel::traits::*;
use texel::types;
use texel::*;

static IF_TAG: command::StaticTag = command::StaticTag::new();
static ELSE_TAG: command::StaticTag = command::StaticTag::new();
static OR_TAG: command::StaticTag = command::StaticTag::new();
static FI_TAG: command::StaticTag = command::StaticTag::new();

/// The tag shared by all conditional primitives.
///
/// Conditionals implemented outside of this module (like `\ifeof`) must
/// carry this tag so that the skipping algorithm sees them as openers of
/// nested conditionals.
pub fn if_tag() -> command::Tag {
    IF_TAG.get()
}

// Codes reported by `\currentiftype`, matching e-TeX's numbering.
const IF_CHAR_CODE: i32 = 1;
const IF_CAT_CODE: i32 = 2;
const IF_NUM_CODE: i32 = 3;
const IF_DIM_CODE: i32 = 4;
const IF_ODD_CODE: i32 = 5;
pub(crate) const IF_V_MODE_CODE: i32 = 6;
pub(crate) const IF_H_MODE_CODE: i32 = 7;
pub(crate) const IF_M_MODE_CODE: i32 = 8;
pub(crate) const IF_INNER_CODE: i32 = 9;
const IF_X_CODE: i32 = 13;
pub(crate) const IF_EOF_CODE: i32 = 14;
const IF_TRUE_CODE: i32 = 15;
const IF_FALSE_CODE: i32 = 16;
const IF_CASE_CODE: i32 = 17;

/// Component for conditional commands.
///
/// The component holds the stack of open conditional branches.
#[derive(Default)]
pub struct Component {
    branches: Vec<Branch>,
}

struct Branch {
    kind: BranchKind,
    type_code: i32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum BranchKind {
    /// The true branch of a conditional that evaluated to true.
    True,
    /// The else branch of a conditional that evaluated to false.
    Else,
    /// A case branch of an `\ifcase` statement.
    Switch,
}

/// Take the true branch of a conditional: record the open branch and
/// continue reading the input.
pub(crate) fn true_case<S: HasComponent<Component>>(
    _token: Token,
    input: &mut vm::ExpansionInput<S>,
    type_code: i32,
) -> tx::Result<()> {
    input.state_mut().component_mut().branches.push(Branch {
        kind: BranchKind::True,
        type_code,
    });
    Ok(())
}

/// Take the false branch of a conditional: skip tokens until the matching
/// `\else` or `\fi`.
pub(crate) fn false_case<S: HasComponent<Component>>(
    _token: Token,
    input: &mut vm::ExpansionInput<S>,
    type_code: i32,
) -> tx::Result<()> {
    let mut depth = 0;
    while let Some(found) = input.unexpanded().next()? {
        let tag = token_tag(&found, input);
        if depth == 0 && tag == Some(ELSE_TAG.get()) {
            input.state_mut().component_mut().branches.push(Branch {
                kind: BranchKind::Else,
                type_code,
            });
            return Ok(());
        }
        if tag == Some(IF_TAG.get()) {
            depth += 1;
        }
        if tag == Some(FI_TAG.get()) {
            if depth == 0 {
                return Ok(());
            }
            depth -= 1;
        }
    }
    Err(input.eof_error(error::SimpleEndOfInputError::new(
        "skipping the false branch of a conditional",
    )))
}

fn token_tag<S: TexelState>(token: &Token, input: &vm::ExpansionInput<S>) -> Option<command::Tag> {
    match token.value() {
        Value::CommandRef(command_ref) => input
            .vm()
            .context
            .command(&command_ref)
            .and_then(|command| command.tag()),
        _ => None,
    }
}

fn if_true_fn<S: HasComponent<Component>>(
    token: Token,
    input: &mut vm::ExpansionInput<S>,
) -> tx::Result<()> {
    true_case(token, input, IF_TRUE_CODE)
}

/// Get the `\iftrue` primitive.
pub fn get_if_true<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(if_true_fn).with_tag(IF_TAG.get())
}

fn if_false_fn<S: HasComponent<Component>>(
    token: Token,
    input: &mut vm::ExpansionInput<S>,
) -> tx::Result<()> {
    false_case(token, input, IF_FALSE_CODE)
}

/// Get the `\iffalse` primitive.
pub fn get_if_false<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(if_false_fn).with_tag(IF_TAG.get())
}

fn if_num_fn<S: HasComponent<Component>>(
    token: Token,
    input: &mut vm::ExpansionInput<S>,
) -> tx::Result<()> {
    let (lhs, relation, rhs) = <(i32, parse::Ordering, i32)>::parse(&mut *input)?;
    match lhs.cmp(&rhs) == relation.0 {
        true => true_case(token, input, IF_NUM_CODE),
        false => false_case(token, input, IF_NUM_CODE),
    }
}

/// Get the `\ifnum` primitive.
pub fn get_if_num<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(if_num_fn).with_tag(IF_TAG.get())
}

fn if_odd_fn<S: HasComponent<Component>>(
    token: Token,
    input: &mut vm::ExpansionInput<S>,
) -> tx::Result<()> {
    let n = i32::parse(&mut *input)?;
    match n % 2 != 0 {
        true => true_case(token, input, IF_ODD_CODE),
        false => false_case(token, input, IF_ODD_CODE),
    }
}

/// Get the `\ifodd` primitive.
pub fn get_if_odd<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(if_odd_fn).with_tag(IF_TAG.get())
}

fn if_dim_fn<S: HasComponent<Component>>(
    token: Token,
    input: &mut vm::ExpansionInput<S>,
) -> tx::Result<()> {
    let (lhs, relation, rhs) = <(types::Scaled, parse::Ordering, types::Scaled)>::parse(&mut *input)?;
    match lhs.cmp(&rhs) == relation.0 {
        true => true_case(token, input, IF_DIM_CODE),
        false => false_case(token, input, IF_DIM_CODE),
    }
}

/// Get the `\ifdim` primitive.
pub fn get_if_dim<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(if_dim_fn).with_tag(IF_TAG.get())
}

fn get_operand_token<S: TexelState>(input: &mut vm::ExpansionInput<S>) -> tx::Result<Token> {
    match input.next()? {
        None => Err(input.eof_error(error::SimpleEndOfInputError::new(
            "reading the operands of a conditional",
        ))),
        Some(token) => Ok(token),
    }
}

fn if_char_fn<S: HasComponent<Component>>(
    token: Token,
    input: &mut vm::ExpansionInput<S>,
) -> tx::Result<()> {
    let lhs = get_operand_token(input)?;
    let rhs = get_operand_token(input)?;
    // Unexpandable commands all compare equal to each other, and unequal
    // to any character token.
    let equal = match (lhs.value(), rhs.value()) {
        (Value::CommandRef(_), Value::CommandRef(_)) => true,
        (Value::CommandRef(_), _) | (_, Value::CommandRef(_)) => false,
        _ => lhs.char() == rhs.char(),
    };
    match equal {
        true => true_case(token, input, IF_CHAR_CODE),
        false => false_case(token, input, IF_CHAR_CODE),
    }
}

/// Get the `\if` primitive, which compares the character codes of the
/// next two expanded tokens.
pub fn get_if<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(if_char_fn).with_tag(IF_TAG.get())
}

fn if_cat_fn<S: HasComponent<Component>>(
    token: Token,
    input: &mut vm::ExpansionInput<S>,
) -> tx::Result<()> {
    let lhs = get_operand_token(input)?;
    let rhs = get_operand_token(input)?;
    let equal = match (lhs.value(), rhs.value()) {
        (Value::CommandRef(_), Value::CommandRef(_)) => true,
        (Value::CommandRef(_), _) | (_, Value::CommandRef(_)) => false,
        _ => lhs.cat_code() == rhs.cat_code(),
    };
    match equal {
        true => true_case(token, input, IF_CAT_CODE),
        false => false_case(token, input, IF_CAT_CODE),
    }
}

/// Get the `\ifcat` primitive, which compares the category codes of the
/// next two expanded tokens.
pub fn get_if_cat<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(if_cat_fn).with_tag(IF_TAG.get())
}

fn if_x_fn<S: HasComponent<Component>>(
    token: Token,
    input: &mut vm::ExpansionInput<S>,
) -> tx::Result<()> {
    let lhs = match input.unexpanded().next()? {
        None => {
            return Err(input.eof_error(error::SimpleEndOfInputError::new(
                r"reading the operands of \ifx",
            )))
        }
        Some(token) => token,
    };
    let rhs = match input.unexpanded().next()? {
        None => {
            return Err(input.eof_error(error::SimpleEndOfInputError::new(
                r"reading the operands of \ifx",
            )))
        }
        Some(token) => token,
    };
    match tokens_have_same_meaning(input.vm(), lhs, rhs) {
        true => true_case(token, input, IF_X_CODE),
        false => false_case(token, input, IF_X_CODE),
    }
}

/// Get the `\ifx` primitive, which compares the meanings of the next two
/// unexpanded tokens.
pub fn get_if_x<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(if_x_fn).with_tag(IF_TAG.get())
}

fn tokens_have_same_meaning<S: TexelState>(vm: &vm::VM<S>, lhs: Token, rhs: Token) -> bool {
    let (lhs_ref, rhs_ref) = match (lhs.value(), rhs.value()) {
        (Value::CommandRef(lhs_ref), Value::CommandRef(rhs_ref)) => (lhs_ref, rhs_ref),
        (lhs_value, rhs_value) => return lhs_value == rhs_value,
    };
    match (vm.context.command(&lhs_ref), vm.context.command(&rhs_ref)) {
        // Two undefined command references have the same (lack of) meaning.
        (None, None) => true,
        (Some(lhs_cmd), Some(rhs_cmd)) => commands_equal(lhs_cmd, rhs_cmd),
        _ => false,
    }
}

fn commands_equal<S>(lhs: &command::Command<S>, rhs: &command::Command<S>) -> bool {
    use command::Command::*;
    match (lhs, rhs) {
        (Expansion(lhs_fn, lhs_tag), Expansion(rhs_fn, rhs_tag)) => {
            *lhs_fn as usize == *rhs_fn as usize && lhs_tag == rhs_tag
        }
        (Execution(lhs_fn, lhs_tag), Execution(rhs_fn, rhs_tag)) => {
            *lhs_fn as usize == *rhs_fn as usize && lhs_tag == rhs_tag
        }
        (Macro(lhs_macro), Macro(rhs_macro)) => macros_equal(lhs_macro, rhs_macro),
        (Variable(lhs_cmd), Variable(rhs_cmd)) => lhs_cmd == rhs_cmd,
        (CharacterTokenAlias(lhs_value), CharacterTokenAlias(rhs_value)) => lhs_value == rhs_value,
        (Character(lhs_char), Character(rhs_char)) => lhs_char == rhs_char,
        _ => false,
    }
}

// Macros are equal if they have the same status and the same parameter and
// replacement texts, following the TeXBook's description of `\ifx`.
fn macros_equal(lhs: &texmacro::Macro, rhs: &texmacro::Macro) -> bool {
    if lhs.is_long() != rhs.is_long() {
        return false;
    }
    if lhs.prefix() != rhs.prefix() {
        return false;
    }
    if lhs.parameters().len() != rhs.parameters().len() {
        return false;
    }
    for (lhs_param, rhs_param) in lhs.parameters().iter().zip(rhs.parameters()) {
        use texmacro::Parameter::*;
        let equal = match (lhs_param, rhs_param) {
            (Undelimited, Undelimited) => true,
            (Delimited(lhs_pattern), Delimited(rhs_pattern)) => {
                lhs_pattern.elements() == rhs_pattern.elements()
            }
            _ => false,
        };
        if !equal {
            return false;
        }
    }
    if lhs.replacements().len() != rhs.replacements().len() {
        return false;
    }
    for (lhs_rep, rhs_rep) in lhs.replacements().iter().zip(rhs.replacements()) {
        use texmacro::Replacement::*;
        let equal = match (lhs_rep, rhs_rep) {
            (Tokens(lhs_tokens), Tokens(rhs_tokens)) => lhs_tokens == rhs_tokens,
            (Parameter(lhs_index), Parameter(rhs_index)) => lhs_index == rhs_index,
            _ => false,
        };
        if !equal {
            return false;
        }
    }
    true
}

fn if_case_fn<S: HasComponent<Component>>(
    token: Token,
    input: &mut vm::ExpansionInput<S>,
) -> tx::Result<()> {
    let n = i32::parse(&mut *input)?;
    if n == 0 {
        input.state_mut().component_mut().branches.push(Branch {
            kind: BranchKind::Switch,
            type_code: IF_CASE_CODE,
        });
        return Ok(());
    }
    // Skip n cases. A negative n never hits zero, so the else branch or
    // the end of the conditional is taken, as in Knuth's TeX.
    let mut cases_left = n;
    let mut depth = 0;
    while let Some(found) = input.unexpanded().next()? {
        let tag = token_tag(&found, input);
        if depth == 0 && tag == Some(OR_TAG.get()) {
            cases_left -= 1;
            if cases_left == 0 {
                input.state_mut().component_mut().branches.push(Branch {
                    kind: BranchKind::Switch,
                    type_code: IF_CASE_CODE,
                });
                return Ok(());
            }
        }
        if depth == 0 && tag == Some(ELSE_TAG.get()) {
            input.state_mut().component_mut().branches.push(Branch {
                kind: BranchKind::Else,
                type_code: IF_CASE_CODE,
            });
            return Ok(());
        }
        if tag == Some(IF_TAG.get()) {
            depth += 1;
        }
        if tag == Some(FI_TAG.get()) {
            if depth == 0 {
                return Ok(());
            }
            depth -= 1;
        }
    }
    Err(input.eof_error(error::SimpleEndOfInputError::new(
        r"skipping the cases of an \ifcase statement",
    )))
}

/// Get the `\ifcase` primitive.
pub fn get_if_case<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(if_case_fn).with_tag(IF_TAG.get())
}

fn skip_to_fi<S: HasComponent<Component>>(
    input: &mut vm::ExpansionInput<S>,
    doing: &str,
    else_allowed: bool,
) -> tx::Result<()> {
    let mut depth = 0;
    while let Some(found) = input.unexpanded().next()? {
        let tag = token_tag(&found, input);
        if !else_allowed && depth == 0 && tag == Some(ELSE_TAG.get()) {
            return Err(input.error(error::SimpleTokenError::new(
                found,
                r"there is an extra \else in this conditional",
            )));
        }
        if tag == Some(IF_TAG.get()) {
            depth += 1;
        }
        if tag == Some(FI_TAG.get()) {
            if depth == 0 {
                return Ok(());
            }
            depth -= 1;
        }
    }
    Err(input.eof_error(error::SimpleEndOfInputError::new(doing)))
}

fn else_primitive_fn<S: HasComponent<Component>>(
    token: Token,
    input: &mut vm::ExpansionInput<S>,
) -> tx::Result<()> {
    match input.state_mut().component_mut().branches.pop() {
        Some(Branch {
            kind: BranchKind::True | BranchKind::Switch,
            ..
        }) => (),
        other => {
            // An else branch is never executed directly; it is consumed by
            // the skipping algorithm. Put the popped branch back.
            if let Some(branch) = other {
                input.state_mut().component_mut().branches.push(branch);
            }
            return Err(input.error(error::SimpleTokenError::new(
                token,
                r"there is no open conditional for this \else",
            )));
        }
    }
    // A second \else at this level has no conditional left to close.
    skip_to_fi(input, "skipping the else branch of a conditional", false)
}

/// Get the `\else` primitive.
pub fn get_else<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(else_primitive_fn).with_tag(ELSE_TAG.get())
}

fn or_primitive_fn<S: HasComponent<Component>>(
    token: Token,
    input: &mut vm::ExpansionInput<S>,
) -> tx::Result<()> {
    match input.state_mut().component_mut().branches.pop() {
        Some(Branch {
            kind: BranchKind::Switch,
            ..
        }) => (),
        other => {
            if let Some(branch) = other {
                input.state_mut().component_mut().branches.push(branch);
            }
            return Err(input.error(error::SimpleTokenError::new(
                token,
                r"there is no open \ifcase statement for this \or",
            )));
        }
    }
    // The remaining cases may legitimately contain the \ifcase's \else.
    skip_to_fi(
        input,
        r"skipping the remaining cases of an \ifcase statement",
        true,
    )
}

/// Get the `\or` primitive.
pub fn get_or<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(or_primitive_fn).with_tag(OR_TAG.get())
}

fn fi_primitive_fn<S: HasComponent<Component>>(
    token: Token,
    input: &mut vm::ExpansionInput<S>,
) -> tx::Result<()> {
    match input.state_mut().component_mut().branches.pop() {
        None => Err(input.error(error::SimpleTokenError::new(
            token,
            r"there is no open conditional for this \fi",
        ))),
        Some(_) => Ok(()),
    }
}

/// Get the `\fi` primitive.
pub fn get_fi<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(fi_primitive_fn).with_tag(FI_TAG.get())
}

/// Get the `\currentiftype` primitive, which reads as the type code of the
/// innermost open conditional, or 0 if no conditional is open.
///
/// The code is negated while the else branch is being read.
pub fn get_current_if_type<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_variable(variable::Command::new_getter(|vm| {
        match vm.state.component().branches.last() {
            None => 0,
            Some(branch) => match branch.kind {
                BranchKind::Else => -branch.type_code,
                _ => branch.type_code,
            },
        }
    }))
}

/// Get the `\currentifbranch` primitive: 1 in a true branch, -1 in an else
/// branch, 0 in an `\ifcase` case or when no conditional is open.
pub fn get_current_if_branch<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_variable(variable::Command::new_getter(|vm| {
        match vm.state.component().branches.last() {
            None => 0,
            Some(branch) => match branch.kind {
                BranchKind::True => 1,
                BranchKind::Else => -1,
                BranchKind::Switch => 0,
            },
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def;
    use crate::prefix;
    use crate::the;
    use std::collections::HashMap;
    use texel::vm::implement_has_component;
    use texel_testing::*;

    #[derive(Default)]
    struct State {
        conditional: Component,
        prefix: prefix::Component,
        testing: TestingComponent,
    }

    impl TexelState for State {}

    implement_has_component![
        State,
        (Component, conditional),
        (prefix::Component, prefix),
        (TestingComponent, testing),
    ];

    fn built_in_commands() -> HashMap<&'static str, command::BuiltIn<State>> {
        HashMap::from([
            ("if", get_if()),
            ("ifcat", get_if_cat()),
            ("ifnum", get_if_num()),
            ("ifdim", get_if_dim()),
            ("ifodd", get_if_odd()),
            ("ifx", get_if_x()),
            ("iftrue", get_if_true()),
            ("iffalse", get_if_false()),
            ("ifcase", get_if_case()),
            ("or", get_or()),
            ("else", get_else()),
            ("fi", get_fi()),
            ("currentiftype", get_current_if_type()),
            ("currentifbranch", get_current_if_branch()),
            ("def", def::get_def()),
            ("the", the::get_the()),
        ])
    }

    test_suite![
        expansion_equality_tests(
            (iftrue_base, r"\iftrue a\fi", "a"),
            (iftrue_with_else, r"\iftrue a\else b\fi", "a"),
            (iffalse_base, r"\iffalse a\fi", ""),
            (iffalse_with_else, r"\iffalse a\else b\fi", "b"),
            (iftrue_nested, r"\iftrue a\iftrue b\else c\fi d\else e\fi", "abd"),
            (iffalse_skips_nested, r"\iffalse a\iftrue b\else c\fi d\else e\fi", "e"),
            (else_skips_nested, r"\iffalse a\else b\iffalse c\else d\fi e\fi", "bde"),
            (ifnum_less_than_true, r"\ifnum 1<2 TRUE\else FALSE\fi", "TRUE"),
            (ifnum_less_than_false, r"\ifnum 2<1 TRUE\else FALSE\fi", "FALSE"),
            (ifnum_equal_true, r"\ifnum 5=5 a\else b\fi", "a"),
            (ifnum_equal_false, r"\ifnum 5=6 a\else b\fi", "b"),
            (ifnum_greater_than_true, r"\ifnum 2>1 a\else b\fi", "a"),
            (ifnum_greater_than_false, r"\ifnum 1>2 a\else b\fi", "b"),
            (ifodd_odd, r"\ifodd 3 odd\else even\fi", "odd"),
            (ifodd_even, r"\ifodd 4 odd\else even\fi", "even"),
            (ifodd_negative, r"\ifodd -5 odd\else even\fi", "odd"),
            (ifdim_greater_than, r"\ifdim 2pt>1pt a\else b\fi", "a"),
            (ifdim_less_than, r"\ifdim 2pt<1pt a\else b\fi", "b"),
            (if_same_letters, r"\if aaT\else F\fi", "T"),
            (if_different_letters, r"\if ab T\else F\fi", "F"),
            (if_same_char_different_cat, r"\if 1\iftrue1\fi T\else F\fi", "T"),
            (if_two_commands, r"\if\A\B T\else F\fi", "T"),
            (ifcat_same_cats, r"\ifcat abT\else F\fi", "T"),
            (ifcat_different_cats, r"\ifcat a1 T\else F\fi", "F"),
            (ifx_both_undefined, r"\ifx\A\B T\else F\fi", "T"),
            (ifx_same_primitive, r"\ifx\ifnum\ifnum T\else F\fi", "T"),
            (ifx_different_primitives, r"\ifx\ifnum\ifodd T\else F\fi", "F"),
            (ifx_equal_macros, r"\def\A{x}\def\B{x}\ifx\A\B T\else F\fi", "T"),
            (ifx_different_macros, r"\def\A{x}\def\B{y}\ifx\A\B T\else F\fi", "F"),
            (
                ifx_different_parameter_texts,
                r"\def\A#1,{x}\def\B#1.{x}\ifx\A\B T\else F\fi",
                "F"
            ),
            (ifcase_zero, r"\ifcase 0 a\or b\or c\else d\fi", "a"),
            (ifcase_one, r"\ifcase 1 a\or b\or c\else d\fi", "b"),
            (ifcase_two, r"\ifcase 2 a\or b\or c\else d\fi", "c"),
            (ifcase_else, r"\ifcase 5 a\or b\or c\else d\fi", "d"),
            (ifcase_no_matching_case, r"\ifcase 5 a\or b\fi x", "x"),
            (ifcase_negative, r"\ifcase -1 a\else b\fi", "b"),
            (ifcase_skips_nested, r"\ifcase 1 a\iftrue x\fi\or b\fi", "b"),
            (currentiftype_no_conditional, r"\the\currentiftype", "0"),
            (currentiftype_iftrue, r"\iftrue\the\currentiftype\fi", "15"),
            (currentiftype_ifnum, r"\ifnum 1<2 \the\currentiftype\fi", "3"),
            (
                currentiftype_negated_in_else,
                r"\iffalse\else\the\currentiftype\fi",
                "-16"
            ),
            (
                currentiftype_ifcase_else,
                r"\ifcase 9 a\else\the\currentiftype\fi",
                "-17"
            ),
            (currentifbranch_true, r"\iftrue\the\currentifbranch\fi", "1"),
            (currentifbranch_else, r"\iffalse\else\the\currentifbranch\fi", "-1"),
            (currentifbranch_case, r"\ifcase 0 \the\currentifbranch\fi", "0"),
        ),
        failure_tests(
            (iffalse_end_of_input, r"\iffalse a"),
            (ifnum_missing_number, r"\ifnum a<2 T\else F\fi"),
            (ifnum_missing_relation, r"\ifnum 1 2 T\else F\fi"),
            (ifcase_end_of_input, r"\ifcase 3 a\or b"),
            (else_no_conditional, r"a\else b"),
            (fi_no_conditional, r"a\fi b"),
            (or_no_conditional, r"a\or b"),
            (or_outside_ifcase, r"\iftrue a\or b\fi"),
            (extra_else_after_true_branch, r"\iftrue a\else b\else c\fi"),
            (extra_else_in_ifcase, r"\ifcase 1 a\or b\else c\else d\fi"),
        ),
    ];
}
