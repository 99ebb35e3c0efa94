//! Arithmetic on variables (`\advance`, `\multiply` and `\divide`)

use texel::parse;
use texel::prelude as tx;
use texel::token;
use texel::token::Token;
use texel::token::Value;
use texel::traits::*;
use texel::types;
use texel::variable;
use texel::*;

pub const ADVANCE_DOC: &str = "Add an integer to a variable";
pub const MULTIPLY_DOC: &str = "Multiply a variable by an integer";
pub const DIVIDE_DOC: &str = "Divide a variable by an integer";

/// Get the `\advance` command.
pub fn get_advance<S: TexelState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(advance_fn)
        .with_tag(crate::prefix::get_globally_prefixable_tag())
        .with_doc(ADVANCE_DOC)
}

/// Get the `\multiply` command.
pub fn get_multiply<S: TexelState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(multiply_fn)
        .with_tag(crate::prefix::get_globally_prefixable_tag())
        .with_doc(MULTIPLY_DOC)
}

/// Get the `\divide` command.
pub fn get_divide<S: TexelState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(divide_fn)
        .with_tag(crate::prefix::get_globally_prefixable_tag())
        .with_doc(DIVIDE_DOC)
}

#[derive(Clone, Copy, Debug)]
enum Op {
    Advance,
    Multiply,
    Divide,
}

impl Op {
    fn name(self) -> &'static str {
        match self {
            Op::Advance => r"\advance",
            Op::Multiply => r"\multiply",
            Op::Divide => r"\divide",
        }
    }
}

fn advance_fn<S: TexelState>(token: Token, input: &mut vm::ExecutionInput<S>) -> tx::Result<()> {
    math_op(token, input, Op::Advance)
}

fn multiply_fn<S: TexelState>(token: Token, input: &mut vm::ExecutionInput<S>) -> tx::Result<()> {
    math_op(token, input, Op::Multiply)
}

fn divide_fn<S: TexelState>(token: Token, input: &mut vm::ExecutionInput<S>) -> tx::Result<()> {
    math_op(token, input, Op::Divide)
}

fn math_op<S: TexelState>(
    op_token: Token,
    input: &mut vm::ExecutionInput<S>,
    op: Op,
) -> tx::Result<()> {
    let scope = S::variable_assignment_scope_hook(input.state_mut());
    let variable_token = match input.next()? {
        None => {
            return Err(input.eof_error(error::SimpleEndOfInputError::new(format![
                "reading the variable to modify with {}",
                op.name()
            ])))
        }
        Some(token) => token,
    };
    let command_ref = match variable_token.value() {
        Value::CommandRef(command_ref) => command_ref,
        _ => return Err(input.error(NotAVariableError { op, token: variable_token })),
    };
    let cmd = match input.vm().context.command(&command_ref) {
        Some(command::Command::Variable(cmd)) => cmd.clone(),
        _ => return Err(input.error(NotAVariableError { op, token: variable_token })),
    };
    let variable = cmd.resolve(variable_token, input.as_mut())?;
    parse::OptionalBy::parse(input)?;
    let (family, key) = match variable {
        variable::Variable::Register(family, key) => (family, key),
        variable::Variable::IntGetter(_) | variable::Variable::DimenGetter(_) => {
            return Err(input.error(error::SimpleTokenError::new(
                variable_token,
                "this quantity is read-only and cannot be modified",
            )))
        }
    };
    match family {
        variable::Family::Count => {
            let lhs = input.vm().context.count(key);
            let result = match op {
                Op::Advance => {
                    let rhs = i32::parse(input)?;
                    lhs.checked_add(rhs)
                }
                Op::Multiply => {
                    let rhs = i32::parse(input)?;
                    lhs.checked_mul(rhs)
                }
                Op::Divide => {
                    let rhs = i32::parse(input)?;
                    lhs.checked_div(rhs)
                }
            };
            let result = checked(result, op_token, input)?;
            input.context_mut().set_count(key, result, scope);
        }
        variable::Family::Dimen => {
            let lhs = input.vm().context.dimen(key);
            let result = match op {
                Op::Advance => {
                    let rhs = types::Scaled::parse(input)?;
                    lhs.0.checked_add(rhs.0)
                }
                Op::Multiply => {
                    let rhs = i32::parse(input)?;
                    lhs.0.checked_mul(rhs)
                }
                Op::Divide => {
                    let rhs = i32::parse(input)?;
                    lhs.0.checked_div(rhs)
                }
            };
            let result = types::Scaled(checked(result, op_token, input)?);
            input.context_mut().set_dimen(key, result, scope);
        }
        variable::Family::Glue | variable::Family::MuGlue => {
            let lhs = match family {
                variable::Family::Glue => input.vm().context.glue(key),
                _ => input.vm().context.mu_glue(key),
            };
            let result = match op {
                Op::Advance => {
                    let rhs = types::Glue::parse(input)?;
                    add_glue(lhs, rhs)
                }
                Op::Multiply => {
                    let rhs = i32::parse(input)?;
                    scale_glue(lhs, |v| v.checked_mul(rhs))
                }
                Op::Divide => {
                    let rhs = i32::parse(input)?;
                    scale_glue(lhs, |v| v.checked_div(rhs))
                }
            };
            let result = checked(result, op_token, input)?;
            match family {
                variable::Family::Glue => input.context_mut().set_glue(key, result, scope),
                _ => input.context_mut().set_mu_glue(key, result, scope),
            }
        }
        variable::Family::Toks | variable::Family::CatCode => {
            return Err(input.error(NotAVariableError { op, token: variable_token }));
        }
    }
    Ok(())
}

fn checked<S: TexelState, T>(
    result: Option<T>,
    op_token: Token,
    input: &mut vm::ExecutionInput<S>,
) -> tx::Result<T> {
    match result {
        Some(value) => Ok(value),
        None => Err(input.error(error::SimpleTokenError::new(op_token, "arithmetic overflow"))),
    }
}

/// Add two glue values. When the stretch or shrink orders differ, the
/// higher order component wins.
fn add_glue(lhs: types::Glue, rhs: types::Glue) -> Option<types::Glue> {
    let (stretch, stretch_order) =
        add_stretch(lhs.stretch, lhs.stretch_order, rhs.stretch, rhs.stretch_order)?;
    let (shrink, shrink_order) =
        add_stretch(lhs.shrink, lhs.shrink_order, rhs.shrink, rhs.shrink_order)?;
    Some(types::Glue {
        width: types::Scaled(lhs.width.0.checked_add(rhs.width.0)?),
        stretch,
        stretch_order,
        shrink,
        shrink_order,
    })
}

fn add_stretch(
    lhs: types::Scaled,
    lhs_order: types::GlueOrder,
    rhs: types::Scaled,
    rhs_order: types::GlueOrder,
) -> Option<(types::Scaled, types::GlueOrder)> {
    match lhs_order.cmp(&rhs_order) {
        std::cmp::Ordering::Equal => {
            Some((types::Scaled(lhs.0.checked_add(rhs.0)?), lhs_order))
        }
        std::cmp::Ordering::Greater => Some((lhs, lhs_order)),
        std::cmp::Ordering::Less => Some((rhs, rhs_order)),
    }
}

fn scale_glue(lhs: types::Glue, f: impl Fn(i32) -> Option<i32>) -> Option<types::Glue> {
    Some(types::Glue {
        width: types::Scaled(f(lhs.width.0)?),
        stretch: types::Scaled(f(lhs.stretch.0)?),
        stretch_order: lhs.stretch_order,
        shrink: types::Scaled(f(lhs.shrink.0)?),
        shrink_order: lhs.shrink_order,
    })
}

#[derive(Debug)]
struct NotAVariableError {
    op: Op,
    token: Token,
}

impl error::TexError for NotAVariableError {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.token)
    }

    fn title(&self) -> String {
        format!("{} requires a numeric variable", self.op.name())
    }

    fn notes(&self) -> Vec<error::display::Note> {
        vec![r"integer, dimension and glue variables like \count 0 can be modified".into()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefix;
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
            ("advance", get_advance()),
            ("multiply", get_multiply()),
            ("divide", get_divide()),
            ("count", registers::get_count()),
            ("dimen", registers::get_dimen()),
            ("skip", registers::get_skip()),
            ("toks", registers::get_toks()),
            ("global", prefix::get_global()),
            ("the", the::get_the()),
        ])
    }

    test_suite![
        expansion_equality_tests(
            (advance_base_case, r"\count 1 5 \advance\count 1 by 4 \the\count 1", "9"),
            (
                advance_without_by,
                r"\count 1 5 \advance\count 1 4 \the\count 1",
                "9"
            ),
            (
                advance_negative,
                r"\count 1 5 \advance\count 1 by -6 \the\count 1",
                "-1"
            ),
            (
                advance_from_register,
                r"\count 1 5 \count 2 3 \advance\count 1 by \count 2 \the\count 1",
                "8"
            ),
            (multiply_base_case, r"\count 1 5 \multiply\count 1 by 4 \the\count 1", "20"),
            (divide_base_case, r"\count 1 20 \divide\count 1 by 4 \the\count 1", "5"),
            (
                divide_truncates_towards_zero,
                r"\count 1 -7 \divide\count 1 by 2 \the\count 1",
                "-3"
            ),
            (
                advance_is_scoped,
                r"\count 1 5{\advance\count 1 by 4}\the\count 1",
                "5"
            ),
            (
                global_advance,
                r"\count 1 5{\global\advance\count 1 by 4}\the\count 1",
                "9"
            ),
            (
                advance_dimen,
                r"\dimen 1 5pt \advance\dimen 1 by 2.5pt \the\dimen 1",
                "7.5pt"
            ),
            (
                multiply_dimen,
                r"\dimen 1 2.5pt \multiply\dimen 1 by 4 \the\dimen 1",
                "10.0pt"
            ),
            (
                divide_dimen,
                r"\dimen 1 10pt \divide\dimen 1 by 4 \the\dimen 1",
                "2.5pt"
            ),
            (
                advance_skip,
                r"\skip 1 1pt plus 2pt \advance\skip 1 by 3pt plus 4pt \the\skip 1",
                "4.0pt plus 6.0pt"
            ),
            (
                advance_skip_infinite_stretch_wins,
                r"\skip 1 1pt plus 2pt \advance\skip 1 by 3pt plus 1fil \the\skip 1",
                "4.0pt plus 1.0fil"
            ),
            (
                multiply_skip,
                r"\skip 1 1pt plus 2pt minus 3pt \multiply\skip 1 by 2 \the\skip 1",
                "2.0pt plus 4.0pt minus 6.0pt"
            ),
        ),
        failure_tests(
            (advance_incorrect_overflow, r"\count 1 2147483647 \advance\count 1 by 1"),
            (multiply_overflow, r"\count 1 2147483647 \multiply\count 1 by 2"),
            (divide_by_zero, r"\count 1 20 \divide\count 1 by 0"),
            (advance_non_variable, r"\advance a by 2"),
            (advance_undefined_command, r"\advance\undefinedCommand by 2"),
            (advance_toks, r"\advance\toks 1 by 2"),
            (advance_end_of_input, r"\advance"),
        ),
    ];
}
