//! Parsing of the relations `<`, `=` and `>`.
//!
//! TeXBook p209: a relation is a character token with category code 12
//! (other) whose value is one of those three characters.

use crate::prelude as tx;
use crate::token;
use crate::traits::*;
use crate::types;
use crate::vm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering(pub std::cmp::Ordering);

impl<S: TexelState> Parsable<S> for Ordering {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> tx::Result<Self> {
        use std::cmp::Ordering::*;
        Ok(get_required_element![
            input,
            "a relation",
            format![
                "a relation is a token with category code {} and one of the following values: <, =, >",
                types::CatCode::Other
            ],
            token::Value::Other('<') => Ordering(Less),
            token::Value::Other('=') => Ordering(Equal),
            token::Value::Other('>') => Ordering(Greater),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::testing::*;

    parse_success_tests![
        (less_than_sign, r"<a", Ordering(std::cmp::Ordering::Less)),
        (equals_sign, r"=a", Ordering(std::cmp::Ordering::Equal)),
        (greater_than_sign, r">a", Ordering(std::cmp::Ordering::Greater)),
    ];

    parse_failure_tests![
        Ordering,
        (empty_input, ""),
        (letter_is_not_a_relation, "a"),
        (control_sequence_is_not_a_relation, r"\A"),
    ];
}
