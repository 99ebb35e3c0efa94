//! Glue parsing.
//!
//! Glue is a dimension optionally followed by `plus <stretch>` and
//! `minus <shrink>` components. TeX.2021.461.

use super::dimen;
use super::keyword::parse_keyword;
use crate::prelude as tx;
use crate::traits::*;
use crate::types::{Glue, GlueOrder, Scaled};
use crate::vm;

impl<S: TexelState> Parsable<S> for Glue {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> tx::Result<Self> {
        let width = match dimen::parse_scaled(input, None, true)? {
            // An internal glue variable provides the entire glue value.
            dimen::ScaledOrGlue::Glue(g) => return Ok(g),
            dimen::ScaledOrGlue::Scaled(s) => s,
        };
        let mut g = Glue {
            width,
            ..Default::default()
        };
        if parse_keyword(input, "plus")? {
            (g.stretch, g.stretch_order) = parse_flexibility(input)?;
        }
        if parse_keyword(input, "minus")? {
            (g.shrink, g.shrink_order) = parse_flexibility(input)?;
        }
        Ok(g)
    }
}

// Parses a stretch or shrink component, which may use fil units.
fn parse_flexibility<S: TexelState>(
    input: &mut vm::ExpandedStream<S>,
) -> tx::Result<(Scaled, GlueOrder)> {
    let mut order = GlueOrder::default();
    let scaled = match dimen::parse_scaled(input, Some(&mut order), false)? {
        dimen::ScaledOrGlue::Scaled(s) => s,
        dimen::ScaledOrGlue::Glue(g) => g.width,
    };
    Ok((scaled, order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::testing::*;

    fn finite(width: i32, stretch: i32, shrink: i32) -> Glue {
        Glue {
            width: Scaled::ONE * width,
            stretch: Scaled::ONE * stretch,
            shrink: Scaled::ONE * shrink,
            ..Default::default()
        }
    }

    fn stretchy(width: i32, stretch: i32, stretch_order: GlueOrder) -> Glue {
        Glue {
            stretch_order,
            ..finite(width, stretch, 0)
        }
    }

    parse_success_tests![
        (zero_width, "0pt", finite(0, 0, 0)),
        (positive_width, "1pt", finite(1, 0, 0)),
        (
            negative_width,
            "-1pt",
            Glue {
                width: -Scaled::ONE,
                ..Default::default()
            }
        ),
        (width_and_stretch, "1pt plus 1pt", finite(1, 1, 0)),
        (
            width_stretch_and_shrink,
            "1pt plus 2pt minus 3pt",
            finite(1, 2, 3)
        ),
        (
            first_order_infinite_stretch,
            "1pt plus 1fil",
            stretchy(1, 1, GlueOrder::Fil)
        ),
        (
            second_order_infinite_stretch,
            "1pt plus 1fill",
            stretchy(1, 1, GlueOrder::Fill)
        ),
        (
            third_order_infinite_stretch,
            "1pt plus 1filll",
            stretchy(1, 1, GlueOrder::Filll)
        ),
    ];

    parse_failure_tests![
        Glue,
        (empty_input, ""),
        (missing_width_unit, "3 plus 1pt"),
        (stretch_overflow, "1pt plus 30000000fil"),
        (too_many_ls_in_fil_unit, "1pt plus 2fillll"),
    ];
}
