//! File input commands (`\input` and `\endinput`)

use texel::parse;
use texel::prelude as tx;
use texel::token::Token;
use texel::traits::*;
use texel::*;

pub const INPUT_DOC: &str = "Input a file";

/// Get the `\input` expansion command.
pub fn get_input<S: TexelState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(input_fn).with_doc(INPUT_DOC)
}

fn input_fn<S: TexelState>(
    input_token: Token,
    input: &mut vm::ExpansionInput<S>,
) -> tx::Result<()> {
    let file_location = parse::FileLocation::parse(input)?;
    let (file_path, source_code) =
        texel_common::read_file_to_string(input.vm(), file_location, "tex")?;
    input.push_source(input_token, file_path, source_code)
}

/// Get the `\endinput` expansion command.
pub fn get_endinput<S: TexelState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(endinput_fn)
}

fn endinput_fn<S: TexelState>(_: Token, input: &mut vm::ExpansionInput<S>) -> tx::Result<()> {
    input.end_current_file();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def;
    use crate::prefix;
    use std::collections::HashMap;
    use texel::vm::implement_has_component;
    use texel_common::InMemoryFileSystem;
    use texel_testing::*;

    #[derive(Default)]
    struct State {
        prefix: prefix::Component,
        testing: TestingComponent,
    }

    impl TexelState for State {}

    implement_has_component![
        State,
        (prefix::Component, prefix),
        (TestingComponent, testing),
    ];

    fn built_in_commands() -> HashMap<&'static str, command::BuiltIn<State>> {
        HashMap::from([
            ("def", def::get_def()),
            ("input", get_input()),
            ("endinput", get_endinput()),
        ])
    }

    fn custom_vm_initialization(vm: &mut vm::VM<State>) {
        let working_directory = vm
            .working_directory
            .clone()
            .unwrap_or_else(|| std::path::PathBuf::from("/"));
        let mut file_system = InMemoryFileSystem::new(&working_directory);
        file_system.add_file("file1.tex", "content1\n");
        file_system.add_file("file2.tex", r"\input nested/file3");
        file_system.add_file("nested/file3.tex", "content3");
        file_system.add_file("with_extension.tex3", "extension3");
        file_system.add_file("ends_early.tex", "start\\endinput\nnever seen");
        vm.file_system = Box::new(file_system);
    }

    test_suite![
        options(
            TestOption::BuiltInCommands(built_in_commands),
            TestOption::CustomVMInitialization(custom_vm_initialization),
            TestOption::AllowUndefinedCommands(true),
        ),
        expansion_equality_tests(
            (basic_case, r"\input file1 hello", "content1 hello"),
            (basic_case_with_extension, r"\input with_extension.tex3", "extension3"),
            (nested, r"\input file2 ", "content3"),
            (
                endinput_skips_rest_of_file,
                r"\input ends_early done",
                "startdone"
            ),
            (
                macro_definition_survives_input,
                r"\input file1 \def\A{defined}\A",
                "content1 defined"
            ),
        ),
        failure_tests(
            (file_does_not_exist, r"\input does_not_exist"),
        ),
    ];
}
