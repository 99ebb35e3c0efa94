/*!
Unit testing support for Texel engines.

The tests in the Texel standard library are all built with this crate,
and are the best reference for how to use it.

A test needs a state type for the VM it spins up. Any type works as long
as it implements [`TexelState`] and [`Default`] and contains a
[`TestingComponent`] (that is, implements
[`HasComponent<TestingComponent>`](texel::traits::HasComponent)).
Tests that need nothing else in the state use the [`State`] type defined
here.

Two kinds of test are provided. An expansion equality test
([`run_expansion_equality_test`]) runs two TeX snippets and asserts that
they produce the same tokens; typically the right hand side is a
constant spelling out the expected output, as in

```tex
\def\HelloWorld{Hola Mundo}\HelloWorld - \HelloWorld
```

versus

```tex
Hola Mundo - Hola Mundo
```

Only the output is compared, not the resulting VM states, which
generally differ (above, only the first VM ends up with `\HelloWorld`
defined). A failure test ([`run_failure_test`]) asserts that a snippet
errors.

The run functions can be called directly, but the [`test_suite`] macro
generates the per-case boilerplate and is how suites are normally
written.
*/

use std::collections::HashMap;

use texel::traits::*;
use texel::vm::implement_has_component;
use texel::vm::VM;
use texel::*;

/// Component that collects the output of a test VM.
///
/// Every state type used with this crate must contain one.
#[derive(Default)]
pub struct TestingComponent {
    allow_undefined_command: bool,
    tokens: Vec<token::Token>,
}

impl TestingComponent {
    fn take_tokens(&mut self) -> Vec<token::Token> {
        std::mem::take(&mut self.tokens)
    }

    /// The tokens that have been written to the component so far.
    pub fn tokens(&self) -> &[token::Token] {
        &self.tokens
    }
}

/// Minimal state type for tests with no state of their own.
#[derive(Default)]
pub struct State {
    testing: TestingComponent,
}

impl TexelState for State {}

implement_has_component![State, TestingComponent, testing];

/// Option passed to a test runner.
///
/// Within each pair of variants below, the later option wins when both
/// are given.
pub enum TestOption<'a, S> {
    /// Build the initial command table with the provided function.
    BuiltInCommands(fn() -> HashMap<&'static str, command::BuiltIn<S>>),

    /// Build the initial command table with the provided closure.
    BuiltInCommandsDyn(Box<dyn Fn() -> HashMap<&'static str, command::BuiltIn<S>> + 'a>),

    /// Run the provided function on the VM before execution starts.
    CustomVMInitialization(fn(&mut VM<S>)),

    /// Run the provided closure on the VM before execution starts.
    #[allow(clippy::type_complexity)]
    CustomVMInitializationDyn(Box<dyn Fn(&mut VM<S>) + 'a>),

    /// Whether undefined commands are written to the output rather than
    /// raising an error.
    AllowUndefinedCommands(bool),
}

// The final value of each option after scanning the options slice.
struct ResolvedOptions<'a, S> {
    built_in_commands: &'a dyn Fn() -> HashMap<&'static str, command::BuiltIn<S>>,
    custom_vm_initialization: &'a dyn Fn(&mut VM<S>),
    allow_undefined_commands: bool,
}

impl<'a, S> ResolvedOptions<'a, S> {
    pub fn new(options: &'a [TestOption<S>]) -> Self {
        let mut resolved = Self {
            built_in_commands: &HashMap::new,
            custom_vm_initialization: &|_| {},
            allow_undefined_commands: false,
        };
        for option in options {
            match option {
                TestOption::BuiltInCommands(f) => resolved.built_in_commands = f,
                TestOption::BuiltInCommandsDyn(f) => resolved.built_in_commands = f,
                TestOption::CustomVMInitialization(f) => resolved.custom_vm_initialization = f,
                TestOption::CustomVMInitializationDyn(f) => resolved.custom_vm_initialization = f,
                TestOption::AllowUndefinedCommands(b) => resolved.allow_undefined_commands = *b,
            }
        }
        resolved
    }
}

/// Run an expansion equality test.
///
/// The test passes if the two provided inputs produce the same tokens.
pub fn run_expansion_equality_test<S>(lhs: &str, rhs: &str, options: &[TestOption<S>])
where
    S: Default + HasComponent<TestingComponent>,
{
    let options = ResolvedOptions::new(options);

    let (vm_1, output_1) = run_and_collect(lhs, &options);
    let (vm_2, output_2) = run_and_collect(rhs, &options);
    assert_outputs_equal(output_1, &vm_1, output_2, &vm_2);
}

/// Run a failure test.
///
/// The test passes if execution of the provided input fails.
pub fn run_failure_test<S>(input: &str, options: &[TestOption<S>])
where
    S: Default + HasComponent<TestingComponent>,
{
    let options = ResolvedOptions::new(options);

    let mut vm = new_vm(&options);
    if let Ok(output) = execute_source_code(&mut vm, input, &options) {
        println!("Execution succeeded:");
        println!(
            "{}",
            ::texel::token::write_tokens(&output, vm.cs_name_interner())
        );
        panic!("Failure test did not pass: execution successful");
    }
}

fn new_vm<S: Default>(options: &ResolvedOptions<S>) -> Box<vm::VM<S>> {
    let mut vm = VM::<S>::new((options.built_in_commands)());
    (options.custom_vm_initialization)(&mut vm);
    vm
}

fn run_and_collect<S>(
    source: &str,
    options: &ResolvedOptions<S>,
) -> (Box<vm::VM<S>>, Vec<token::Token>)
where
    S: Default + HasComponent<TestingComponent>,
{
    let mut vm = new_vm(options);
    let output = execute_source_code(&mut vm, source, options)
        .map_err(|err| {
            println!("{err}");
            err
        })
        .unwrap();
    (vm, output)
}

fn execute_source_code<S>(
    vm: &mut vm::VM<S>,
    source: &str,
    options: &ResolvedOptions<S>,
) -> Result<Vec<token::Token>, Box<error::Error>>
where
    S: Default + HasComponent<TestingComponent>,
{
    vm.push_source("testing.tex", source)?;
    vm.state.component_mut().allow_undefined_command = options.allow_undefined_commands;
    vm.run::<Handlers>()?;
    Ok(vm.state.component_mut().take_tokens())
}

fn assert_outputs_equal<S>(
    mut output_1: Vec<token::Token>,
    vm_1: &vm::VM<S>,
    mut output_2: Vec<token::Token>,
    vm_2: &vm::VM<S>,
) {
    // A single trailing space is insignificant; it usually comes from
    // the newline appended to the source code.
    let trim_trailing_space = |v: &mut Vec<token::Token>| {
        if let Some(last) = v.last() {
            if last.cat_code() == Some(types::CatCode::Space) {
                v.pop();
            }
        }
    };
    trim_trailing_space(&mut output_1);
    trim_trailing_space(&mut output_2);

    println!("{output_1:?}");
    println!("{output_2:?}");
    let equal = output_1.len() == output_2.len()
        && output_1
            .iter()
            .zip(output_2.iter())
            .all(|(token_1, token_2)| tokens_equal(token_1, vm_1, token_2, vm_2));
    if !equal {
        if output_1.len() != output_2.len() {
            println!(
                "output lengths do not match: {} != {}",
                output_1.len(),
                output_2.len()
            );
        }
        println!("Expansion output is different:");
        println!("------[lhs]------");
        println!(
            "'{}'",
            ::texel::token::write_tokens(&output_1, vm_1.cs_name_interner())
        );
        println!("------[rhs]------");
        println!(
            "'{}'",
            ::texel::token::write_tokens(&output_2, vm_2.cs_name_interner())
        );
        println!("-----------------");
        panic!("Expansion test failed");
    }
}

// The two tokens come from different VMs, so control sequences must be
// compared by resolved name rather than by interner key.
fn tokens_equal<S>(
    token_1: &token::Token,
    vm_1: &vm::VM<S>,
    token_2: &token::Token,
    vm_2: &vm::VM<S>,
) -> bool {
    use ::texel::token::CommandRef::ControlSequence;
    use ::texel::token::Value::CommandRef;
    match (&token_1.value(), &token_2.value()) {
        (CommandRef(ControlSequence(cs_name_1)), CommandRef(ControlSequence(cs_name_2))) => {
            let name_1 = vm_1.cs_name_interner().resolve(*cs_name_1).unwrap();
            let name_2 = vm_2.cs_name_interner().resolve(*cs_name_2).unwrap();
            name_1 == name_2
        }
        _ => token_1 == token_2,
    }
}

struct Handlers;

impl<S: HasComponent<TestingComponent>> vm::Handlers<S> for Handlers {
    fn character_handler(
        token: token::Token,
        input: &mut vm::ExecutionInput<S>,
    ) -> prelude::Result<()> {
        input.state_mut().component_mut().tokens.push(token);
        Ok(())
    }

    fn undefined_command_handler(
        token: token::Token,
        input: &mut vm::ExecutionInput<S>,
    ) -> prelude::Result<()> {
        if input.state().component().allow_undefined_command {
            input.state_mut().component_mut().tokens.push(token);
            Ok(())
        } else {
            Err(input
                .vm()
                .error(error::UndefinedCommandError::new(input.vm(), token)))
        }
    }

    fn unexpanded_expansion_command(
        token: token::Token,
        input: &mut vm::ExecutionInput<S>,
    ) -> prelude::Result<()> {
        input.state_mut().component_mut().tokens.push(token);
        Ok(())
    }
}

/// Generates a suite of unit tests.
///
/// ```
/// # use texel_testing::*;
/// # use std::collections::HashMap;
/// # fn built_in_commands() -> HashMap<&'static str, texel::command::BuiltIn<State>> {
/// #   HashMap::new()
/// # }
/// test_suite![
///     state(State),
///     options(TestOption::BuiltInCommands(built_in_commands)),
///     expansion_equality_tests(
///         (case_1, "", ""),
///     ),
/// ];
/// ```
///
/// The arguments, in order:
///
/// - `state(State)`: the Rust type to use as the VM state. Optional;
///   defaults to the type named `State` in the current scope.
///
/// - `options(option_1, ..., option_n)`: a list of [TestOption] values
///   for the test runner. Optional; defaults to
///   `options(TestOption::BuiltInCommands(built_in_commands))` where
///   `built_in_commands` is a function in the current scope returning
///   the initial command table.
///
/// - `expansion_equality_tests(cases...)`: cases of the form
///   (name, lhs, rhs), run with [run_expansion_equality_test].
///
/// - `failure_tests(cases...)`: cases of the form (name, input), run
///   with [run_failure_test].
///
/// `state()` and `options()` may each appear at most once and must come
/// first, in that order. The test list arguments may appear any number
/// of times, in any order.
#[macro_export]
macro_rules! test_suite {
    ( state($state: ty), options $options: tt, expansion_equality_tests ( $( ($name: ident, $lhs: expr, $rhs: expr $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let lhs = $lhs;
                let rhs = $rhs;
                let options = vec! $options;
                texel_testing::run_expansion_equality_test::<$state>(&lhs, &rhs, &options);
            }
        )*
    );
    ( state($state: ty), options $options: tt, expansion_equality_tests $test_body: tt $(,)? ) => (
        compile_error!("Invalid test cases for expansion_equality_tests: must be a list of tuples (name, lhs, rhs)");
    );
    ( state($state: ty), options $options: tt, failure_tests ( $( ($name: ident, $input: expr $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let input = $input;
                let options = vec! $options;
                texel_testing::run_failure_test::<$state>(&input, &options);
            }
        )*
    );
    ( state($state: ty), options $options: tt, $test_kind: ident $test_cases: tt $(,)? ) => (
        compile_error!("Invalid keyword: test_suite! only accepts the following keywords: `state`, `options`, `expansion_equality_tests`, `failure_tests`");
    );
    ( state($state: ty), options $options: tt, $( $test_kind: ident $test_cases: tt ),+ $(,)? ) => (
        $(
            texel_testing::test_suite![state($state), options $options, $test_kind $test_cases,];
        )+
    );
    ( options $options: tt, $( $test_kind: ident $test_cases: tt ),+ $(,)? ) => (
        texel_testing::test_suite![state(State), options $options, $( $test_kind $test_cases, )+ ];
    );
    ( $( $test_kind: ident $test_cases: tt ),+ $(,)? ) => (
        texel_testing::test_suite![options (texel_testing::TestOption::BuiltInCommands(built_in_commands)), $( $test_kind $test_cases, )+ ];
    );
}
