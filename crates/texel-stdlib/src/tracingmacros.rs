//! TeX macro debugging (`\tracingmacros`)
//!
//! When the `\tracingmacros` parameter is positive, every macro expansion
//! is written to the VM's log file.

use std::io::Write;
use texel::texmacro;
use texel::token;
use texel::token::write_tokens;
use texel::traits::*;
use texel::variable;
use texel::*;

/// Get the `\tracingmacros` command.
pub fn get_tracingmacros<S: TexelState>() -> command::BuiltIn<S> {
    variable::Command::new_parameter(variable::Family::Count, "tracingmacros").into()
}

/// The post-macro-expansion hook that implements `\tracingmacros`.
///
/// Install this function as the
/// [post_macro_expansion_hook](TexelState::post_macro_expansion_hook) of the
/// state.
pub fn hook<S: TexelState>(
    token: token::Token,
    input: &vm::ExpansionInput<S>,
    tex_macro: &texmacro::Macro,
    arguments: &[&[token::Token]],
    reversed_expansion: &[token::Token],
) {
    if input
        .vm()
        .context
        .count(variable::RegisterKey::Named("tracingmacros"))
        <= 0
    {
        return;
    }
    let log_file = input.vm().log_file.clone();
    // A trace that cannot be written is dropped silently.
    let _ = write_trace(
        &mut *log_file.borrow_mut(),
        input,
        token,
        tex_macro,
        arguments,
        reversed_expansion,
    );
}

fn write_trace<S: TexelState>(
    w: &mut dyn Write,
    input: &vm::ExpansionInput<S>,
    token: token::Token,
    tex_macro: &texmacro::Macro,
    arguments: &[&[token::Token]],
    reversed_expansion: &[token::Token],
) -> std::io::Result<()> {
    let interner = input.vm().cs_name_interner();
    let trace = input.trace(token);
    writeln!(w, "Macro expansion trace of {}", trace.value)?;
    writeln!(w, "l.{} {}", trace.line_number, trace.line_content.trim_end())?;
    writeln!(w, "                        ┌──")?;
    if arguments.is_empty() {
        writeln!(w, "              arguments │ (none)")?;
    }
    for (i, argument) in arguments.iter().enumerate() {
        let gutter = match i {
            0 => "              arguments",
            _ => "                       ",
        };
        writeln!(
            w,
            "{gutter} │ #{}={}",
            i + 1,
            write_tokens(*argument, interner)
        )?;
    }
    writeln!(w, "                        ├──")?;
    write!(w, " replacement definition │ ")?;
    for replacement in tex_macro.replacements() {
        match replacement {
            texmacro::Replacement::Tokens(tokens) => {
                write!(w, "{}", write_tokens(tokens.iter().rev(), interner))?
            }
            texmacro::Replacement::Parameter(i) => write!(w, "#{}", i + 1)?,
        }
    }
    writeln!(w)?;
    writeln!(w, "                        ├──")?;
    writeln!(
        w,
        "              expansion │ {}",
        write_tokens(reversed_expansion.iter().rev(), interner)
    )?;
    writeln!(w, "                        └──")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def;
    use crate::prefix;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use texel::vm::implement_has_component;
    use texel_testing::*;

    #[derive(Default)]
    struct State {
        prefix: prefix::Component,
        testing: TestingComponent,
    }

    impl TexelState for State {
        fn post_macro_expansion_hook(
            token: token::Token,
            input: &vm::ExpansionInput<Self>,
            tex_macro: &texmacro::Macro,
            arguments: &[&[token::Token]],
            reversed_expansion: &[token::Token],
        ) {
            hook(token, input, tex_macro, arguments, reversed_expansion)
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
            ("tracingmacros", get_tracingmacros()),
        ])
    }

    #[derive(Default, Clone)]
    struct SharedLog(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn run_and_capture_log(source: &str) -> String {
        let log = SharedLog::default();
        let log_handle = log.clone();
        let options = vec![
            TestOption::BuiltInCommands(built_in_commands),
            TestOption::CustomVMInitializationDyn(Box::new(move |vm: &mut vm::VM<State>| {
                vm.log_file = Rc::new(RefCell::new(log_handle.clone()));
            })),
        ];
        run_expansion_equality_test(source, source, &options);
        let bytes = log.0.borrow().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn expansion_is_traced_when_enabled() {
        let log = run_and_capture_log(r"\tracingmacros=1 \def\x#1#2{#2#1}\x{ab}{cd}");
        assert!(log.contains(r"Macro expansion trace of \x"), "{log}");
        assert!(log.contains("#1=ab"), "{log}");
        assert!(log.contains("#2=cd"), "{log}");
        assert!(log.contains("expansion │ cdab"), "{log}");
    }

    #[test]
    fn tracing_is_off_by_default() {
        let log = run_and_capture_log(r"\def\x{y}\x");
        assert_eq!(log, "");
    }

    #[test]
    fn tracing_can_be_disabled_again() {
        let log =
            run_and_capture_log(r"\tracingmacros=1 \tracingmacros=0 \def\x{y}\x");
        assert_eq!(log, "");
    }
}
