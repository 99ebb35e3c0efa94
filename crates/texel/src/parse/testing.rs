//! Helpers for testing [Parsable](super::Parsable) implementations.

use crate::error;
use crate::traits::*;
use crate::vm;
use std::collections::HashMap;
use std::fmt::Debug;

fn parse_from_source<T: Parsable<()>>(source: &str) -> Result<T, Box<error::Error>> {
    let mut vm = vm::VM::<()>::new(HashMap::new());
    vm.push_source("".to_string(), source.to_string())?;
    T::parse(vm::ExecutionInput::new(&mut vm))
}

pub fn run_parse_success_test<T: Parsable<()> + Debug + PartialEq>(source: &str, want: T) {
    let got = parse_from_source::<T>(source).unwrap();
    assert_eq!(got, want);
}

pub fn run_parse_failure_test<T: Parsable<()> + Debug>(source: &str) {
    if let Ok(value) = parse_from_source::<T>(source) {
        panic![
            "Successfully parsed a value '{value:?}' of type '{}' from invalid input '{source}'",
            std::any::type_name::<T>()
        ];
    }
}

macro_rules! parse_success_tests {
    ($( ($name: ident, $input: expr, $expected: expr $(,)? ) ),+ $(,)? ) => {
        $(
        #[test]
        fn $name() {
            run_parse_success_test(&$input, $expected);
        }
        )+
    };
}

pub(crate) use parse_success_tests;

macro_rules! parse_failure_tests {
    ( $parsable_type: ty, $( ($name: ident, $input: expr), )+) => {
        $(
        #[test]
        fn $name() {
            run_parse_failure_test::<$parsable_type>(&$input);
        }
        )+
    };
}

pub(crate) use parse_failure_tests;
