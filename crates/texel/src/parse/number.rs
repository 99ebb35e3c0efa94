//! Integer parsing.
//!
//! TeX integers come in more shapes than most languages allow: decimal,
//! octal (prefixed with `'`) and hexadecimal (prefixed with `"`)
//! constants, character constants like `` `A ``, and internal quantities
//! such as `\count 4` whose current value is read directly. Any of these
//! may be preceded by a string of `+` and `-` signs. See page 269 of the
//! TeXBook for the grammar.

use crate::command;
use crate::error;
use crate::parse;
use crate::prelude as tx;
use crate::token;
use crate::token::Value;
use crate::traits::*;
use crate::types;
use crate::variable;
use crate::vm;

impl<S: TexelState> Parsable<S> for i32 {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> tx::Result<Self> {
        parse_integer(input).map(|(_, value)| value)
    }
}

/// A non-negative integer that is strictly less than `N`.
///
/// Register indices and stream numbers parse through this type so that
/// bounds are checked at parse time.
#[derive(Debug, PartialEq, Eq, Default)]
pub struct Uint<const N: usize>(pub usize);

impl<S: TexelState, const N: usize> Parsable<S> for Uint<N> {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> tx::Result<Self> {
        let (first_token, value) = parse_integer(input)?;
        match usize::try_from(value) {
            Ok(value) if value < N => Ok(Uint(value)),
            _ => Err(input.error(UintRangeError::<N> { first_token, value })),
        }
    }
}

#[derive(Debug)]
struct UintRangeError<const N: usize> {
    first_token: token::Token,
    value: i32,
}

impl<const N: usize> error::TexError for UintRangeError<N> {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(self.first_token)
    }

    fn title(&self) -> String {
        format!(
            "expected an integer in the range [0, {}), got {}",
            N, self.value
        )
    }
}

impl<S: TexelState> Parsable<S> for char {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> tx::Result<Self> {
        let (first_token, value) = parse_integer(input)?;
        u32::try_from(value)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| {
                input.error(
                    parse::Error::new("a character code", Some(first_token), "")
                        .with_got_override(format!["got the integer {value}"]),
                )
            })
    }
}

impl<S: TexelState> Parsable<S> for types::CatCode {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> tx::Result<Self> {
        let (first_token, value) = parse_integer(input)?;
        if let Some(cat_code) = u8::try_from(value)
            .ok()
            .and_then(|v| types::CatCode::try_from(v).ok())
        {
            return Ok(cat_code);
        }
        Err(input.error(
            parse::Error::new(
                "a category code number (an integer in the range [0, 15])",
                Some(first_token),
                "",
            )
            .with_got_override(format!["got the integer {value}"])
            .with_annotation_override("this is where the number started"),
        ))
    }
}

const FIRST_TOKEN_GUIDANCE: &str =
    "a number begins with zero or more minus signs followed by one of the following:
- A decimal digit (0-9), which begins a decimal number.
- The character ', which indicates the beginning of an octal number
- The character \", which indicates the beginning of a hexadecimal number
- The character `, followed by a character token. The character is converted into its UTF-8 number.
- A command that references a variable, like \\count 4.
";

/// Parses a signed integer and returns it along with its first token.
///
/// The first token is kept for error reporting in callers that do their
/// own range checking.
pub(super) fn parse_integer<S: TexelState>(
    stream: &mut vm::ExpandedStream<S>,
) -> tx::Result<(token::Token, i32)> {
    let negative = parse_optional_signs(stream)?.is_some();
    let first_token = match stream.next()? {
        None => return Err(stream.eof_error(IntegerEndOfInputError {})),
        Some(token) => token,
    };
    let mut value = first_token.value();
    // `\let\x = 9` makes \x behave exactly like the digit token 9.
    if let Value::CommandRef(command_ref) = value {
        if let Some(command::Command::CharacterTokenAlias(aliased)) =
            stream.vm().context.command(&command_ref)
        {
            value = *aliased;
        }
    }
    let magnitude: i32 = if let Value::CommandRef(command_ref) = value {
        // Internal dimensions and glue are coerced to the number of
        // scaled points in their (width) value.
        match parse_internal_value(stream, first_token, command_ref)? {
            InternalValue::Integer(i) => i,
            InternalValue::Dimen(d) => d.0,
            InternalValue::Glue(g) => g.width.0,
        }
    } else {
        stream.back(token::Token::new_from_value(value, first_token.trace_key()));
        parse_unsigned_constant(stream)?.0
    };
    // The optional trailing space is probed without expansion so that a
    // following expandable command sees the value after it is assigned.
    get_optional_element![
        stream.unexpanded(),
        Value::Space(_) => (),
    ];
    let result = match negative {
        false => magnitude,
        // i32::MIN has no positive counterpart. TeX wraps here, so
        // negating it yields i32::MIN again.
        true => magnitude.wrapping_mul(-1),
    };
    Ok((first_token, result))
}

/// Consumes leading `+` and `-` signs and intervening spaces.
///
/// Returns the token of the last uncanceled `-` sign, or [None] if the
/// combined sign is positive.
pub(super) fn parse_optional_signs<S: TexelState>(
    stream: &mut vm::ExpandedStream<S>,
) -> tx::Result<Option<token::Token>> {
    let mut negative_token = None;
    while let Some((is_positive, token)) = get_optional_element_with_token![
        stream,
        Value::Other('+') => true,
        Value::Other('-') => false,
        Value::Space(_) => true,
    ] {
        if !is_positive {
            negative_token = match negative_token {
                None => Some(token),
                Some(_) => None,
            };
        }
    }
    Ok(negative_token)
}

/// Parses an unsigned integer constant.
///
/// Returns the value along with the radix it was written in, which is
/// [None] for character constants like `` `A ``. The radix is used by
/// dimension parsing, where only a decimal constant may have a fractional
/// part.
pub(super) fn parse_unsigned_constant<S: TexelState>(
    stream: &mut vm::ExpandedStream<S>,
) -> tx::Result<(i32, Option<u8>)> {
    let first_token = match stream.next()? {
        None => return Err(stream.eof_error(IntegerEndOfInputError {})),
        Some(token) => token,
    };
    match first_token.value() {
        Value::Other(c @ '0'..='9') => {
            let value = parse_digits::<S, 10>(stream, (c as i32) - ('0' as i32))?;
            Ok((value, Some(10)))
        }
        Value::Other('\'') => Ok((parse_digits::<S, 8>(stream, 0)?, Some(8))),
        Value::Other('"') => Ok((parse_digits::<S, 16>(stream, 0)?, Some(16))),
        Value::Other('`') => Ok((parse_character_constant(stream)?, None)),
        _ => {
            stream.back(first_token);
            Err(stream.error(parse::Error::new(
                "the beginning of a number",
                Some(first_token),
                FIRST_TOKEN_GUIDANCE,
            )))
        }
    }
}

/// The current value of an internal quantity, like a register.
pub(super) enum InternalValue {
    Integer(i32),
    Dimen(types::Scaled),
    Glue(types::Glue),
}

pub(super) fn parse_internal_value<S: TexelState>(
    input: &mut vm::ExpandedStream<S>,
    first_token: token::Token,
    command_ref: token::CommandRef,
) -> tx::Result<InternalValue> {
    let cmd = input.vm().context.command(&command_ref).cloned();
    match cmd {
        Some(command::Command::Variable(cmd)) => {
            let variable = cmd.resolve(first_token, input)?;
            match variable.value(input.vm()) {
                variable::Value::Int(i) => Ok(InternalValue::Integer(i)),
                variable::Value::CatCode(c) => Ok(InternalValue::Integer(c as i32)),
                variable::Value::Dimen(d) => Ok(InternalValue::Dimen(d)),
                variable::Value::Glue(g) | variable::Value::MuGlue(g) => {
                    Ok(InternalValue::Glue(g))
                }
                variable::Value::Toks(_) => Err(input.error(
                    parse::Error::new(
                        "the beginning of a number",
                        Some(first_token),
                        FIRST_TOKEN_GUIDANCE,
                    )
                    .with_annotation_override("token list variable"),
                )),
            }
        }
        Some(command::Command::Character(c)) => Ok(InternalValue::Integer(c as i32)),
        cmd => Err(input.error(
            parse::Error::new(
                "the beginning of a number",
                Some(first_token),
                FIRST_TOKEN_GUIDANCE,
            )
            .with_annotation_override(match cmd {
                None => "undefined control sequence".to_string(),
                Some(cmd) => format!["control sequence referencing {cmd}"],
            }),
        )),
    }
}

// A character constant is a character token or a single-character control
// sequence like \a. TeX.2021.442.
fn parse_character_constant<S: TexelState>(
    input: &mut vm::ExpandedStream<S>,
) -> tx::Result<i32> {
    let token = match input.unexpanded().next()? {
        None => return Err(input.eof_error(CharacterConstantEndOfInputError {})),
        Some(token) => token,
    };
    if let Value::CommandRef(token::CommandRef::ControlSequence(cs_name)) = token.value() {
        let name = input.vm().cs_name_interner().resolve(cs_name).unwrap();
        let mut chars = name.chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c as i32),
            _ => Err(input.error(parse::Error::new(
                "a character",
                Some(token),
                "a character is a character token or single-character control sequence like \\a",
            ))),
        };
    }
    Ok(token.char().unwrap() as i32)
}

fn parse_digits<S: TexelState, const RADIX: i32>(
    stream: &mut vm::ExpandedStream<S>,
    seed: i32,
) -> tx::Result<i32> {
    // Decimal constants arrive with their first digit already read.
    let mut any_digits = RADIX == 10;
    let mut value = seed;
    while let Some(token) = stream.next()? {
        let digit = match digit_value::<RADIX>(token.value()) {
            None => {
                stream.back(token);
                break;
            }
            Some(digit) => digit,
        };
        any_digits = true;
        value = match value
            .checked_mul(RADIX)
            .and_then(|value| value.checked_add(digit))
        {
            Some(value) => value,
            None => return Err(stream.error(overflow_error::<RADIX>(token, value, digit))),
        };
    }
    if !any_digits {
        let (expected, guidance) = match RADIX {
            8 => (
                "an octal digit",
                "an octal digit is a token with value 0-7 and category other",
            ),
            _ => (
                "a hexadecimal digit",
                "a hexadecimal digit is either:\n- A character token with value 0-9 and category other, or\n- A character token with value A-F and category letter or other",
            ),
        };
        let got = stream.peek()?.copied();
        return Err(stream.error(parse::Error::new(expected, got, guidance)));
    }
    Ok(value)
}

// Hexadecimal digits A-F may have category letter or other; the digits
// 0-9 must have category other.
fn digit_value<const RADIX: i32>(value: Value) -> Option<i32> {
    match value {
        Value::Other(c) => {
            let d = (c as u32).wrapping_sub('0' as u32);
            if d < 10 && (d as i32) < RADIX {
                return Some(d as i32);
            }
            if RADIX == 16 {
                let d = (c as u32).wrapping_sub('A' as u32);
                if d < 6 {
                    return Some(d as i32 + 10);
                }
            }
            None
        }
        Value::Letter(c) if RADIX == 16 => {
            let d = (c as u32).wrapping_sub('A' as u32);
            if d < 6 {
                Some(d as i32 + 10)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn overflow_error<const RADIX: i32>(token: token::Token, value: i32, digit: i32) -> parse::Error {
    let (got, range) = match RADIX {
        8 => (
            format!["got '{value:o}{digit:o}"],
            format!["'{:o}, '{:o}", i32::MIN, i32::MAX],
        ),
        10 => (
            format!["got {value}{digit}"],
            format!["{}, {}", i32::MIN, i32::MAX],
        ),
        _ => (
            format!["got 0x{value:X}{digit:X}"],
            format!["0x{:X}, 0x{:X}", i32::MIN, i32::MAX],
        ),
    };
    parse::Error::new(format!["a number in the range [{range}]"], Some(token), "")
        .with_got_override(got)
        .with_annotation_override("this digit makes the number too big")
}

#[derive(Debug)]
struct IntegerEndOfInputError;

impl error::EndOfInputError for IntegerEndOfInputError {
    fn doing(&self) -> String {
        "parsing a number".into()
    }
    fn notes(&self) -> Vec<error::display::Note> {
        vec![FIRST_TOKEN_GUIDANCE.into()]
    }
}

#[derive(Debug)]
struct CharacterConstantEndOfInputError;

impl error::EndOfInputError for CharacterConstantEndOfInputError {
    fn doing(&self) -> String {
        "parsing a character".into()
    }

    fn notes(&self) -> Vec<error::display::Note> {
        vec![
            r"a character is a character token or single-character control sequence like \a".into(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::testing::*;

    parse_success_tests![
        (decimal_zero, "0", 0),
        (decimal_single_digit, "7", 7),
        (decimal_multiple_digits, "203", 203),
        (decimal_leading_zeros, "00019", 19),
        (decimal_max, "2147483647", 2147483647),
        (decimal_min, "-2147483647", -2147483647),
        (octal_zero, "'0", 0),
        (octal_largest_digit, "'7", 7),
        (octal_two_digits, "'17", 15),
        (octal_three_digits, "'201", 129),
        (octal_max, "'17777777777", 2147483647),
        (octal_min, "-'17777777777", -2147483647),
        (hex_decimal_digit, "\"9", 9),
        (hex_letter_digit, "\"A", 10),
        (hex_largest_digit, "\"F", 15),
        (hex_two_digits, "\"1A", 26),
        (hex_three_digits, "\"201", 513),
        (hex_max, "\"7FFFFFFF", 2147483647),
        (hex_min, "-\"7FFFFFFF", -2147483647),
        (character_constant, "`A", 65),
        (character_constant_control_sequence, r"`\A", 65),
        (character_constant_non_ascii, "`ö", 0x00F6),
        (character_constant_control_sequence_non_ascii, r"`\ö", 0x00F6),
        (explicit_plus_sign, r"+4", 4),
        (single_minus_sign, r"-4", -4),
        (minus_after_plus, r"+-4", -4),
        (two_minus_signs_cancel, r"--4", 4),
        (signs_with_spaces, r"  -  - 4", 4),
    ];

    parse_failure_tests![
        i32,
        (decimal_overflow, "2147483648"),
        (decimal_overflow_large, "500000000000000"),
        (decimal_underflow, "-2147483648"),
        (decimal_underflow_large, "-5000000000000"),
        (octal_overflow, "'177777777770"),
        (octal_no_digits, "'"),
        (hex_overflow, "\"7FFFFFFF0"),
        (hex_no_digits, "\""),
        (letter_is_not_a_number, "A"),
        (multi_character_control_sequence, r"`\BC"),
        (empty_input, ""),
    ];

    parse_failure_tests![
        Uint::<16>,
        (uint_at_bound, "16"),
        (uint_negative, "-1"),
    ];
}
