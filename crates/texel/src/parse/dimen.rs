//! Dimension parsing.
//!
//! A dimension is a decimal constant (possibly with a fractional part)
//! followed by a unit of measurement, or an internal quantity like a dimen
//! register. TeX.2021.448.

use super::keyword::parse_keyword;
use super::number;
use crate::error;
use crate::parse;
use crate::prelude as tx;
use crate::token;
use crate::token::Value;
use crate::traits::*;
use crate::types::{Glue, GlueOrder, Scaled, ScaledUnit};
use crate::vm;

impl<S: TexelState> Parsable<S> for Scaled {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> tx::Result<Self> {
        match parse_scaled(input, None, false)? {
            ScaledOrGlue::Scaled(s) => Ok(s),
            // Unreachable: full_glue was false.
            ScaledOrGlue::Glue(g) => Ok(g.width),
        }
    }
}

pub(super) enum ScaledOrGlue {
    Scaled(Scaled),
    Glue(Glue),
}

/// Parses a dimension.
///
/// If `infinite_order` is provided, the infinite units fil, fill and filll
/// are accepted and the scanned order is written through the reference.
/// If `full_glue` is true and the dimension is given by an internal glue
/// variable, the entire glue value is returned. TeX.2021.449.
pub(super) fn parse_scaled<S: TexelState>(
    input: &mut vm::ExpandedStream<S>,
    mut infinite_order: Option<&mut GlueOrder>,
    full_glue: bool,
) -> tx::Result<ScaledOrGlue> {
    let negative = number::parse_optional_signs(input)?.is_some();
    let first_token = match input.next()? {
        None => return Err(input.eof_error(DimenEndOfInputError {})),
        Some(token) => token,
    };
    let (integer_part, has_fractional_part) = match first_token.value() {
        Value::CommandRef(command_ref) => {
            match number::parse_internal_value(input, first_token, command_ref)? {
                number::InternalValue::Integer(i) => (i, false),
                number::InternalValue::Dimen(d) => {
                    return Ok(ScaledOrGlue::Scaled(if negative { -d } else { d }))
                }
                number::InternalValue::Glue(g) => {
                    return Ok(if full_glue {
                        ScaledOrGlue::Glue(if negative { -g } else { g })
                    } else {
                        ScaledOrGlue::Scaled(if negative { -g.width } else { g.width })
                    })
                }
            }
        }
        Value::Other('.' | ',') => (0, true),
        _ => {
            input.back(first_token);
            let (i, radix) = number::parse_unsigned_constant(input)?;
            // A fractional part may follow a decimal constant only.
            let has_fractional_part = radix == Some(10)
                && get_optional_element![
                    input,
                    Value::Other('.') => (),
                    Value::Other(',') => (),
                ]
                .is_some();
            (i, has_fractional_part)
        }
    };
    let fractional_part = if has_fractional_part {
        parse_decimal_fraction(input)?
    } else {
        Scaled::ZERO
    };
    let (negative, integer_part) = if integer_part < 0 {
        // This can only happen if the integer came from an internal integer.
        // In this case the fractional part is always 0.
        (!negative, -integer_part)
    } else {
        (negative, integer_part)
    };
    let s = apply_units(input, first_token, integer_part, fractional_part, &mut infinite_order)?;
    Ok(ScaledOrGlue::Scaled(if negative { -s } else { s }))
}

/// Scans a unit of measurement and combines it with the integer and
/// fractional parts already scanned. TeX.2021.453.
fn apply_units<S: TexelState>(
    input: &mut vm::ExpandedStream<S>,
    first_token: token::Token,
    integer_part: i32,
    fractional_part: Scaled,
    infinite_order: &mut Option<&mut GlueOrder>,
) -> tx::Result<Scaled> {
    if let Some(order) = infinite_order.as_deref_mut() {
        if parse_keyword(input, "fil")? {
            let mut result = GlueOrder::Fil;
            while parse_keyword(input, "l")? {
                result = match result {
                    GlueOrder::Fil => GlueOrder::Fill,
                    GlueOrder::Fill => GlueOrder::Filll,
                    _ => {
                        return Err(input.error(parse::Error::new(
                            "a unit of measurement",
                            Some(first_token),
                            "the highest order of infinite stretching or shrinking is filll",
                        )))
                    }
                };
            }
            *order = result;
            super::OptionalSpace::parse(input)?;
            let Ok(i) = Scaled::from_integer(integer_part) else {
                return Err(input.error(dimen_too_large_error(first_token)));
            };
            return Ok(i + fractional_part);
        }
    }
    let unit = parse_scaled_unit(input)?;
    super::OptionalSpace::parse(input)?;
    let (integer_part, fractional_part) = match unit {
        // For sp units, the fractional part is silently dropped.
        ScaledUnit::ScaledPoint => {
            let s = Scaled(integer_part);
            return if s > Scaled::MAX_DIMEN {
                Err(input.error(dimen_too_large_error(first_token)))
            } else {
                Ok(s)
            };
        }
        ScaledUnit::Point => (integer_part, fractional_part),
        _ => {
            let (n, d) = unit.conversion_fraction();
            let Ok((i, remainder)) = Scaled(integer_part).xn_over_d(n, d) else {
                return Err(input.error(dimen_too_large_error(first_token)));
            };
            let f = fractional_part
                .nx_plus_y(
                    n,
                    Scaled::from_integer(remainder.0)
                        .expect("remainder<d<=7200<2^13, so a valid scaled number"),
                )
                .expect("fractional_part<2^16 and remainder<2^16*d, so nx_plus_y<2^16(n+d)")
                / d;
            (i.0 + f.integer_part(), f.fractional_part())
        }
    };
    let Ok(integer_part) = Scaled::from_integer(integer_part) else {
        return Err(input.error(dimen_too_large_error(first_token)));
    };
    Ok(integer_part + fractional_part)
}

fn parse_scaled_unit<S: TexelState>(input: &mut vm::ExpandedStream<S>) -> tx::Result<ScaledUnit> {
    for (keyword, unit) in [
        ("pt", ScaledUnit::Point),
        ("in", ScaledUnit::Inch),
        ("pc", ScaledUnit::Pica),
        ("cm", ScaledUnit::Centimeter),
        ("mm", ScaledUnit::Millimeter),
        ("bp", ScaledUnit::BigPoint),
        ("dd", ScaledUnit::DidotPoint),
        ("cc", ScaledUnit::Cicero),
        ("sp", ScaledUnit::ScaledPoint),
    ] {
        if parse_keyword(input, keyword)? {
            return Ok(unit);
        }
    }
    let got = input.peek()?.copied();
    Err(input.error(
        parse::Error::new(
            "a unit of measurement",
            got,
            "dimensions end with a two letter unit like pt, in or sp",
        )
        .with_annotation_override("this is not a unit of measurement"),
    ))
}

fn dimen_too_large_error(first_token: token::Token) -> parse::Error {
    parse::Error::new(
        "a dimension in the range (-2^14pt, 2^14pt)",
        Some(first_token),
        "",
    )
    .with_got_override("got a dimension that is too large")
}

/// TeX.2021.452
fn parse_decimal_fraction<S: TexelState>(
    input: &mut vm::ExpandedStream<S>,
) -> tx::Result<Scaled> {
    // We only get up to 17 digits, because further digits won't affect the result given
    // that the smallest scaled number is 2^(-16). This is very nice because it means
    // we don't need to allocate a vector to store the digits.
    let mut digits = [0_u8; 17];
    let mut i = 0_usize;
    while let Some(token) = input.next()? {
        let d: u8 = match token.value() {
            Value::Other(c @ '0'..='9') => (c as u8) - b'0',
            Value::Space(_) => {
                break;
            }
            _ => {
                input.back(token);
                break;
            }
        };
        if let Some(digit) = digits.get_mut(i) {
            *digit = d;
            i += 1;
        }
    }
    Ok(Scaled::from_decimal_digits(&digits[0..i]))
}

#[derive(Debug)]
struct DimenEndOfInputError;

impl error::EndOfInputError for DimenEndOfInputError {
    fn doing(&self) -> String {
        "parsing a dimension".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::testing::*;

    parse_success_tests![
        (zero_pt, "0pt", Scaled::ZERO),
        (one_pt, "1pt", Scaled::ONE),
        (one_pt_negative, "-1pt", -Scaled::ONE),
        (empty_point, ".pt", Scaled::ZERO), // TeX.2021.452
        (fraction_1, "0.5pt", Scaled::from_decimal_digits(&[5])),
        (fraction_2, "-0.5pt", -Scaled::from_decimal_digits(&[5])),
        (
            fraction_3,
            "1.5pt",
            Scaled::ONE + Scaled::from_decimal_digits(&[5])
        ),
        (
            fraction_4,
            "-1.5pt",
            -Scaled::ONE - Scaled::from_decimal_digits(&[5])
        ),
        (units_in_1, "1in", (Scaled::ONE * 7227) / 100),
        (units_in_2, "1 in", (Scaled::ONE * 7227) / 100),
        (units_pc, "1pc", Scaled::ONE * 12),
        (units_cm, "1cm", (Scaled::ONE * 7227) / 254),
        (units_mm, "1mm", (Scaled::ONE * 7227) / 2540),
        (units_bp, "1bp", (Scaled::ONE * 7227) / 7200),
        (units_dd, "1dd", (Scaled::ONE * 1238) / 1157),
        (units_cc, "1cc", (Scaled::ONE * 14856) / 1157),
        (units_sp_1, "1sp", Scaled(1)),
        (units_sp_2, "1.999999sp", Scaled(1)),
        (nearly_overflow_pt, "16383.99998pt", Scaled::MAX_DIMEN),
        (nearly_overflow_sp, "1073741823sp", Scaled::MAX_DIMEN),
    ];

    parse_failure_tests![
        Scaled,
        (empty_input, ""),
        (invalid_unit, "1xy"),
        (missing_unit, "1"),
        (overflow_pt, "16384pt"),
        (overflow_pt_neg, "-16384pt"),
        (overflow_in_1, "300in"),
        (overflow_in_2, "300000000in"),
        (overflow_sp, "1073741824sp"),
    ];
}
