//! Variable commands related to time (`\time`, `\day`, `\month`, `\year`)

#[cfg(feature = "time")]
use chrono::prelude::*;
use texel::command;
use texel::variable;
use texel::vm::HasComponent;

/// Component for storing the time the interpreter started.
pub struct Component {
    minutes_since_midnight: i32,
    day: i32,
    month: i32,
    year: i32,
}

impl Component {
    /// Create a new component with the variables initialized to the current time.
    #[cfg(feature = "time")]
    pub fn new() -> Component {
        let now: DateTime<Local> = Local::now();
        Component {
            minutes_since_midnight: 60 * (now.hour() as i32) + (now.minute() as i32),
            day: now.day() as i32,
            month: now.month() as i32,
            year: now.year(),
        }
    }

    #[cfg(not(feature = "time"))]
    pub fn new() -> Component {
        Component {
            minutes_since_midnight: 0,
            day: 0,
            month: 0,
            year: 0,
        }
    }

    /// Create a new component with the variables initialized to the provided
    /// values.
    ///
    /// This is useful in situations where the clock can't be used; e.g., when
    /// the interpreter is compiled to WebAssembly and running in the browser.
    pub fn new_with_values(
        minutes_since_midnight: i32,
        day: i32,
        month: i32,
        year: i32,
    ) -> Component {
        Component {
            minutes_since_midnight,
            day,
            month,
            year,
        }
    }
}

impl Default for Component {
    fn default() -> Self {
        Self::new()
    }
}

/// Get the `\time` command.
pub fn get_time<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_variable(variable::Command::new_getter(|vm| {
        vm.state.component().minutes_since_midnight
    }))
}

/// Get the `\day` command.
pub fn get_day<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_variable(variable::Command::new_getter(|vm| vm.state.component().day))
}

/// Get the `\month` command.
pub fn get_month<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_variable(variable::Command::new_getter(|vm| {
        vm.state.component().month
    }))
}

/// Get the `\year` command.
pub fn get_year<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_variable(variable::Command::new_getter(|vm| vm.state.component().year))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use texel::traits::*;
    use texel::vm::implement_has_component;
    use texel_testing::*;

    #[derive(Default)]
    struct State {
        time: Component,
        testing: TestingComponent,
    }

    impl TexelState for State {}

    implement_has_component![State, (Component, time), (TestingComponent, testing),];

    fn built_in_commands() -> HashMap<&'static str, texel::command::BuiltIn<State>> {
        HashMap::from([
            ("time", get_time()),
            ("day", get_day()),
            ("month", get_month()),
            ("year", get_year()),
            ("the", crate::the::get_the()),
        ])
    }

    fn fixed_clock(vm: &mut texel::vm::VM<State>) {
        vm.state.time = Component::new_with_values(675, 17, 3, 2025);
    }

    test_suite![
        options(
            TestOption::BuiltInCommands(built_in_commands),
            TestOption::CustomVMInitialization(fixed_clock),
        ),
        expansion_equality_tests(
            (the_time, r"\the\time", "675"),
            (the_day, r"\the\day", "17"),
            (the_month, r"\the\month", "3"),
            (the_year, r"\the\year", "2025"),
        ),
        failure_tests(
            (time_is_read_only, r"\time = 100 "),
        ),
    ];
}
