//! Commands that contribute material to the typesetter
//! (`\par`, `\kern`, `\unkern`, `\lastkern`, `\char` and the mode
//! conditionals `\ifvmode`, `\ifhmode`, `\ifmmode` and `\ifinner`)
//!
//! The interpreter does not lay out boxes itself.
//! These commands emit [nodes](Node) to the
//! [Typesetter] stored in the [Component], and query the typesetter for
//! its current [Mode].

use crate::conditional;
use std::cell::RefCell;
use std::rc::Rc;
use texel::prelude as tx;
use texel::token::Token;
use texel::traits::*;
use texel::types;
use texel::variable;
use texel::*;
use texel_common::typesetter::{Mode, Node, NullTypesetter, Typesetter};

/// Component holding the typesetter that the commands emit nodes to.
pub struct Component {
    typesetter: Rc<RefCell<dyn Typesetter>>,
}

impl Default for Component {
    fn default() -> Self {
        Self {
            typesetter: Rc::new(RefCell::new(NullTypesetter)),
        }
    }
}

impl Component {
    /// Replace the typesetter that nodes are emitted to.
    pub fn set_typesetter(&mut self, typesetter: Rc<RefCell<dyn Typesetter>>) {
        self.typesetter = typesetter;
    }
}

/// Get the `\par` command.
///
/// Paragraph breaking is owned by the typesetter, so in this interpreter
/// the command consumes no input and emits no nodes.
pub fn get_par<S>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(|_, _| Ok(()))
}

/// Get the `\kern` command.
pub fn get_kern<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(kern_fn)
}

fn kern_fn<S: HasComponent<Component>>(
    _: Token,
    input: &mut vm::ExecutionInput<S>,
) -> tx::Result<()> {
    let width = types::Scaled::parse(input)?;
    let typesetter = input.state().component().typesetter.clone();
    typesetter.borrow_mut().add(Node::Kern(width));
    Ok(())
}

/// Get the `\unkern` command.
pub fn get_unkern<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(unkern_fn)
}

fn unkern_fn<S: HasComponent<Component>>(
    _: Token,
    input: &mut vm::ExecutionInput<S>,
) -> tx::Result<()> {
    let typesetter = input.state().component().typesetter.clone();
    let mut typesetter = typesetter.borrow_mut();
    // The command only removes the last node if it is a kern.
    if matches!(typesetter.last_node(), Some(Node::Kern(_))) {
        typesetter.remove_last_node();
    }
    Ok(())
}

/// Get the `\lastkern` command.
///
/// This is a read-only dimension that holds the width of the last node of
/// the current list if that node is a kern, and 0pt otherwise.
pub fn get_lastkern<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_variable(variable::Command::new_dimen_getter(|vm| {
        match vm.state.component().typesetter.borrow().last_node() {
            Some(Node::Kern(width)) => *width,
            _ => types::Scaled::ZERO,
        }
    }))
}

/// Get the `\char` command.
pub fn get_char<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(char_fn)
}

fn char_fn<S: HasComponent<Component>>(
    _: Token,
    input: &mut vm::ExecutionInput<S>,
) -> tx::Result<()> {
    let c = char::parse(input)?;
    let typesetter = input.state().component().typesetter.clone();
    typesetter.borrow_mut().add(Node::Char(c));
    Ok(())
}

fn current_mode<S: HasComponent<Component>>(input: &vm::ExpansionInput<S>) -> Mode {
    HasComponent::<Component>::component(input.state())
        .typesetter
        .borrow()
        .mode()
}

/// Get the `\ifvmode` primitive, which is true in vertical modes.
pub fn get_ifvmode<S: HasComponent<Component> + HasComponent<conditional::Component>>(
) -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(ifvmode_fn).with_tag(conditional::if_tag())
}

fn ifvmode_fn<S: HasComponent<Component> + HasComponent<conditional::Component>>(
    token: Token,
    input: &mut vm::ExpansionInput<S>,
) -> tx::Result<()> {
    match current_mode(input).is_vertical() {
        true => conditional::true_case(token, input, conditional::IF_V_MODE_CODE),
        false => conditional::false_case(token, input, conditional::IF_V_MODE_CODE),
    }
}

/// Get the `\ifhmode` primitive, which is true in horizontal modes.
pub fn get_ifhmode<S: HasComponent<Component> + HasComponent<conditional::Component>>(
) -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(ifhmode_fn).with_tag(conditional::if_tag())
}

fn ifhmode_fn<S: HasComponent<Component> + HasComponent<conditional::Component>>(
    token: Token,
    input: &mut vm::ExpansionInput<S>,
) -> tx::Result<()> {
    match current_mode(input).is_horizontal() {
        true => conditional::true_case(token, input, conditional::IF_H_MODE_CODE),
        false => conditional::false_case(token, input, conditional::IF_H_MODE_CODE),
    }
}

/// Get the `\ifmmode` primitive, which is true in math modes.
pub fn get_ifmmode<S: HasComponent<Component> + HasComponent<conditional::Component>>(
) -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(ifmmode_fn).with_tag(conditional::if_tag())
}

fn ifmmode_fn<S: HasComponent<Component> + HasComponent<conditional::Component>>(
    token: Token,
    input: &mut vm::ExpansionInput<S>,
) -> tx::Result<()> {
    match current_mode(input).is_math() {
        true => conditional::true_case(token, input, conditional::IF_M_MODE_CODE),
        false => conditional::false_case(token, input, conditional::IF_M_MODE_CODE),
    }
}

/// Get the `\ifinner` primitive, which is true in internal modes.
pub fn get_ifinner<S: HasComponent<Component> + HasComponent<conditional::Component>>(
) -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(ifinner_fn).with_tag(conditional::if_tag())
}

fn ifinner_fn<S: HasComponent<Component> + HasComponent<conditional::Component>>(
    token: Token,
    input: &mut vm::ExpansionInput<S>,
) -> tx::Result<()> {
    match current_mode(input).is_inner() {
        true => conditional::true_case(token, input, conditional::IF_INNER_CODE),
        false => conditional::false_case(token, input, conditional::IF_INNER_CODE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefix;
    use std::collections::HashMap;
    use texel::vm::implement_has_component;
    use texel_common::typesetter::ListTypesetter;
    use texel_testing::*;

    #[derive(Default)]
    struct State {
        conditional: conditional::Component,
        prefix: prefix::Component,
        testing: TestingComponent,
        typeset: Component,
    }

    impl TexelState for State {}

    implement_has_component![
        State,
        (conditional::Component, conditional),
        (prefix::Component, prefix),
        (TestingComponent, testing),
        (Component, typeset),
    ];

    fn built_in_commands() -> HashMap<&'static str, command::BuiltIn<State>> {
        HashMap::from([
            ("par", get_par()),
            ("kern", get_kern()),
            ("unkern", get_unkern()),
            ("lastkern", get_lastkern()),
            ("char", get_char()),
            ("ifvmode", get_ifvmode()),
            ("ifhmode", get_ifhmode()),
            ("ifmmode", get_ifmmode()),
            ("ifinner", get_ifinner()),
            ("else", conditional::get_else()),
            ("fi", conditional::get_fi()),
            ("the", crate::the::get_the()),
            ("dimen", crate::registers::get_dimen()),
        ])
    }

    fn install_list_typesetter(vm: &mut vm::VM<State>) {
        HasComponent::<Component>::component_mut(&mut vm.state)
            .set_typesetter(Rc::new(RefCell::new(ListTypesetter::default())));
    }

    test_suite![
        options(
            TestOption::BuiltInCommands(built_in_commands),
            TestOption::CustomVMInitialization(install_list_typesetter),
        ),
        expansion_equality_tests(
            (par_is_a_no_op, r"a\par b", "ab"),
            (lastkern_empty_list, r"\the\lastkern", "0.0pt"),
            (lastkern_after_kern, r"\kern 1.5pt \the\lastkern", "1.5pt"),
            (
                lastkern_from_register,
                r"\dimen 0 = 2pt \kern\dimen 0 \the\lastkern",
                "2.0pt"
            ),
            (
                unkern_removes_kern,
                r"\kern 1pt \kern 2pt \unkern\the\lastkern",
                "1.0pt"
            ),
            (
                unkern_ignores_char,
                r"\kern 3pt \char`a \unkern\the\lastkern",
                "0.0pt"
            ),
            (lastkern_after_char, r"\kern 3pt \char`a \the\lastkern", "0.0pt"),
            (unkern_on_empty_list, r"\unkern\the\lastkern", "0.0pt"),
            // The list typesetter installed above reports the default,
            // vertical mode.
            (ifvmode_in_vertical, r"\ifvmode V\else O\fi", "V"),
            (ifhmode_in_vertical, r"\ifhmode H\else O\fi", "O"),
            (ifmmode_in_vertical, r"\ifmmode M\else O\fi", "O"),
            (ifinner_in_vertical, r"\ifinner I\else O\fi", "O"),
        ),
        failure_tests(
            (kern_missing_unit, r"\kern 5 "),
            (kern_end_of_input, r"\kern"),
            (char_invalid_code, r"\char -1 "),
        ),
    ];

    fn install_restricted_horizontal(vm: &mut vm::VM<State>) {
        HasComponent::<Component>::component_mut(&mut vm.state).set_typesetter(Rc::new(
            RefCell::new(ListTypesetter::new(Mode::RestrictedHorizontal)),
        ));
    }

    test_suite![
        options(
            TestOption::BuiltInCommands(built_in_commands),
            TestOption::CustomVMInitialization(install_restricted_horizontal),
        ),
        expansion_equality_tests(
            (ifvmode_in_horizontal, r"\ifvmode V\else O\fi", "O"),
            (ifhmode_in_horizontal, r"\ifhmode H\else O\fi", "H"),
            (ifinner_in_restricted_horizontal, r"\ifinner I\else O\fi", "I"),
        ),
    ];

    #[test]
    fn nodes_are_emitted_in_order() {
        let typesetter = Rc::new(RefCell::new(ListTypesetter::default()));
        let typesetter_handle = typesetter.clone();
        let options = vec![
            TestOption::BuiltInCommands(built_in_commands),
            TestOption::CustomVMInitializationDyn(Box::new(move |vm: &mut vm::VM<State>| {
                HasComponent::<Component>::component_mut(&mut vm.state)
                    .set_typesetter(typesetter_handle.clone());
            })),
        ];
        run_expansion_equality_test(r"\char`a \kern 1pt \char`b ", "", &options);
        assert_eq!(
            typesetter.borrow().nodes(),
            &[
                Node::Char('a'),
                Node::Kern(types::Scaled::ONE),
                Node::Char('b'),
            ],
        );
    }
}
