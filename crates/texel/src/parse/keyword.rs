//! Keyword scanning.
//!
//! A keyword like `pt` or `plus` is a sequence of letter or other character
//! tokens matching the keyword's characters, compared case insensitively.
//! Keyword scanning is speculative: if the next tokens do not form the
//! keyword, they are returned to the stream.

use crate::parse;
use crate::prelude as tx;
use crate::token;
use crate::token::Value;
use crate::traits::*;
use crate::vm;

/// Scans an optional keyword, returning whether it was present.
///
/// Space tokens before the keyword are skipped.
/// If the next tokens do not match the keyword (case insensitively), all
/// tokens consumed by the scan are returned to the front of the stream.
/// Corresponds to the `scan_keyword` procedure in Knuth's TeX (407).
///
/// The scan itself is unexpanded: a command that follows the value being
/// parsed must not be expanded before the value takes effect.
pub fn parse_keyword<S: TexelState>(
    input: &mut vm::ExpandedStream<S>,
    keyword: &str,
) -> tx::Result<bool> {
    let mut consumed = Vec::with_capacity(keyword.len());
    let mut chars = keyword.chars();
    let mut target = match chars.next() {
        None => return Ok(true),
        Some(c) => c,
    };
    let input = input.unexpanded();
    loop {
        let token = match input.next()? {
            None => break,
            Some(token) => token,
        };
        let c = match token.value() {
            Value::Letter(c) | Value::Other(c) => Some(c),
            Value::Space(_) if consumed.is_empty() => {
                // Spaces before the keyword are dropped, matched or not.
                continue;
            }
            _ => None,
        };
        match c {
            Some(c) if c.eq_ignore_ascii_case(&target) => {
                consumed.push(token);
                match chars.next() {
                    None => return Ok(true),
                    Some(next_target) => target = next_target,
                }
            }
            _ => {
                input.back(token);
                break;
            }
        }
    }
    while let Some(token) = consumed.pop() {
        input.back(token);
    }
    Ok(false)
}

/// When parsed, this type consumes an optional `by` keyword from the input stream.
pub struct OptionalBy;

impl<S: TexelState> Parsable<S> for OptionalBy {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> tx::Result<Self> {
        parse_keyword(input, "by")?;
        Ok(OptionalBy {})
    }
}

/// When parsed, this type consumes a required `to` keyword from the input stream.
pub struct To;

impl<S: TexelState> Parsable<S> for To {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> tx::Result<Self> {
        if !parse_keyword(input, "to")? {
            let got = input.peek()?.copied();
            return Err(input.error(parse::Error::new(
                "the `to` keyword",
                got,
                "the `to` keyword consists of a t or T letter token, then an o or O letter token",
            )));
        }
        Ok(To {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn new_vm(source: &str) -> Box<vm::VM<()>> {
        let mut vm = vm::VM::<()>::new(HashMap::new());
        vm.push_source("", source).unwrap();
        vm
    }

    fn remaining_chars(vm: &mut vm::VM<()>) -> String {
        let input = vm::ExecutionInput::new(vm);
        let mut result = String::new();
        while let Some(token) = input.next().unwrap() {
            match token.value() {
                Value::Space(_) => result.push(' '),
                _ => {
                    if let Some(c) = token.char() {
                        result.push(c);
                    }
                }
            }
        }
        result
    }

    #[test]
    fn match_consumes_tokens() {
        let mut vm = new_vm("ptx");
        let input = vm::ExecutionInput::new(&mut vm);
        assert!(parse_keyword(input.as_mut(), "pt").unwrap());
        assert_eq!(remaining_chars(&mut vm), "x ");
    }

    #[test]
    fn match_is_case_insensitive() {
        let mut vm = new_vm("pT");
        let input = vm::ExecutionInput::new(&mut vm);
        assert!(parse_keyword(input.as_mut(), "Pt").unwrap());
    }

    #[test]
    fn leading_spaces_are_skipped() {
        let mut vm = new_vm("  pt");
        let input = vm::ExecutionInput::new(&mut vm);
        assert!(parse_keyword(input.as_mut(), "pt").unwrap());
    }

    #[test]
    fn failed_match_restores_tokens() {
        let mut vm = new_vm("pq");
        let input = vm::ExecutionInput::new(&mut vm);
        assert!(!parse_keyword(input.as_mut(), "pt").unwrap());
        assert_eq!(remaining_chars(&mut vm), "pq ");
    }

    #[test]
    fn failed_match_on_first_token_restores_it() {
        let mut vm = new_vm("mm");
        let input = vm::ExecutionInput::new(&mut vm);
        assert!(!parse_keyword(input.as_mut(), "pt").unwrap());
        assert_eq!(remaining_chars(&mut vm), "mm ");
    }

    #[test]
    fn empty_input_is_not_a_match() {
        let mut vm = new_vm("");
        let input = vm::ExecutionInput::new(&mut vm);
        assert!(!parse_keyword(input.as_mut(), "pt").unwrap());
    }
}
