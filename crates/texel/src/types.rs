//! Basic TeX types: category codes, scaled numbers and glue.

use std::fmt::Write;

/// Enum representing all 16 category codes in TeX.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CatCode {
    /// Marks the beginning of a control sequence. Example: `\`.
    ///
    /// This category code is never seen outside of the lexer.
    Escape = 0,
    /// Begins a new group. Example: `{`.
    BeginGroup = 1,
    /// Ends an existing group. Example: `}`.
    EndGroup = 2,
    /// Starts or ends math mode. Example: `$`.
    MathShift = 3,
    /// Used in typesetting tables to align cells. Example: `&`.
    AlignmentTab = 4,
    /// Marks a new line in the input. Example: `\n`.
    ///
    /// This code behaves like [CatCode::Space] except that two or more
    /// consecutive new lines (modulo intervening spaces) produce a `\par`
    /// control sequence, and the code terminates comments.
    /// Never seen outside of the lexer.
    EndOfLine = 5,
    /// Marks the beginning of a parameter number. Example: `#`.
    Parameter = 6,
    /// Puts the following character or group in a superscript. Example: `^`.
    Superscript = 7,
    /// Puts the following character or group in a subscript. Example: `_`.
    Subscript = 8,
    /// Character that is ignored by the lexer. Example: ASCII null.
    ///
    /// Never seen outside of the lexer.
    Ignored = 9,
    /// Whitespace. Example: ` `.
    Space = 10,
    /// A character that can be used in a control sequence name.
    /// Examples: `[a-zA-Z]`.
    Letter = 11,
    /// A character that cannot be used in a control sequence name.
    /// Example: `@`.
    #[default]
    Other = 12,
    /// A single character that behaves like a control sequence. Example: `~`.
    Active = 13,
    /// Marks the beginning of a comment; all characters until the next
    /// [CatCode::EndOfLine] are ignored. Example: `%`.
    ///
    /// Never seen outside of the lexer.
    Comment = 14,
    /// An invalid character; the lexer errors when it sees one.
    /// Example: ASCII delete.
    ///
    /// Never seen outside of the lexer.
    Invalid = 15,
}

impl CatCode {
    /// The category code assigned to a character in plain TeX.
    ///
    /// These are the INITEX defaults (TeXBook p343, TeX.2021.232) plus the
    /// assignments made by the plain format: tab and form feed, `#$&^_{}~`,
    /// and the lowercase/uppercase letters which INITEX already has.
    pub fn plain_tex_default(c: char) -> CatCode {
        use CatCode::*;
        match c {
            '\\' => Escape,
            '{' => BeginGroup,
            '}' => EndGroup,
            '$' => MathShift,
            '&' => AlignmentTab,
            '\r' | '\n' => EndOfLine,
            '#' => Parameter,
            '^' => Superscript,
            '_' => Subscript,
            '\u{0}' => Ignored,
            ' ' | '\t' => Space,
            'a'..='z' | 'A'..='Z' => Letter,
            '~' | '\u{c}' => Active,
            '%' => Comment,
            '\u{7f}' => Invalid,
            _ => Other,
        }
    }
}

impl TryFrom<u8> for CatCode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use CatCode::*;
        match value {
            0 => Ok(Escape),
            1 => Ok(BeginGroup),
            2 => Ok(EndGroup),
            3 => Ok(MathShift),
            4 => Ok(AlignmentTab),
            5 => Ok(EndOfLine),
            6 => Ok(Parameter),
            7 => Ok(Superscript),
            8 => Ok(Subscript),
            9 => Ok(Ignored),
            10 => Ok(Space),
            11 => Ok(Letter),
            12 => Ok(Other),
            13 => Ok(Active),
            14 => Ok(Comment),
            15 => Ok(Invalid),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for CatCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} ({})", self, *self as u8)
    }
}

/// Scaled numbers.
///
/// This is the fixed-width numeric type TeX uses for dimensions:
/// 15 bits for the integer part, 16 bits for the fraction, one sign bit.
/// The inner value is the represented number multiplied by 2^16, so the
/// unit of the inner value is the scaled point (sp).
///
/// Defined in part 7 of TeX ("arithmetic with scaled dimensions"),
/// starting at TeX.2021.99.
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scaled(pub i32);

impl Scaled {
    /// Representation of the number 0.
    pub const ZERO: Scaled = Scaled(0);

    /// Representation of the number 1; i.e., one point.
    pub const ONE: Scaled = Scaled(1 << 16);

    /// Maximum possible dimension in TeX, which is (2^30-1)/2^16 points.
    ///
    /// Defined in TeX.2021.421.
    pub const MAX_DIMEN: Scaled = Scaled((1 << 30) - 1);

    /// Create a scaled number from an integer number of points.
    ///
    /// Returns an overflow error if the integer is outside `(-2^14, 2^14)`.
    pub fn from_integer(i: i32) -> Result<Scaled, OverflowError> {
        if i >= (1 << 14) || i <= -(1 << 14) {
            Err(OverflowError)
        } else {
            Ok(Scaled(Scaled::ONE.0 * i))
        }
    }

    /// Create a scaled number from a decimal fraction.
    ///
    /// TeX.2021.102.
    pub fn from_decimal_digits(digits: &[u8]) -> Scaled {
        let mut a = 0;
        for d in digits.iter().rev() {
            a = (a + (*d as i32) * (2 << 16)) / 10
        }
        Scaled((a + 1) / 2)
    }

    /// Calculate _xn_/_d_ and the remainder, where _x_ is this scaled
    /// number and _n_ and _d_ are integers in the range `[0, 2^16]`.
    ///
    /// This function appears in TeX.2021.107. Knuth works with 32-bit
    /// integers and has an intricate exact algorithm; we simply widen to
    /// 64 bits.
    pub fn xn_over_d(self, n: i32, d: i32) -> Result<(Scaled, Scaled), OverflowError> {
        let mut b: i64 = self.0.into();
        b *= n as i64;
        let remainder: i32 = (b % (d as i64)) as i32;
        b /= d as i64;
        if b < -(Scaled::MAX_DIMEN.0 as i64) || b > Scaled::MAX_DIMEN.0 as i64 {
            return Err(OverflowError);
        }
        Ok((Scaled(b as i32), Scaled(remainder)))
    }

    /// Calculate _nx_+_y_ where _x_ is this scaled number, erroring on
    /// overflow.
    ///
    /// TeX.2021.105.
    pub fn nx_plus_y(self, mut n: i32, y: Scaled) -> Result<Scaled, OverflowError> {
        if n == 0 {
            return Ok(y);
        }
        let mut x = self;
        if n < 0 {
            n = -n;
            x = -x;
        }
        if x <= (Scaled::MAX_DIMEN - y) / n && -x <= (Scaled::MAX_DIMEN + y) / n {
            Ok(x * n + y)
        } else {
            Err(OverflowError)
        }
    }

    pub fn integer_part(self) -> i32 {
        self.0 / Scaled::ONE.0
    }

    pub fn fractional_part(self) -> Scaled {
        self % Scaled::ONE.0
    }

    pub fn abs(self) -> Scaled {
        Scaled(self.0.abs())
    }

    pub fn wrapping_add(self, rhs: Scaled) -> Scaled {
        Scaled(self.0.wrapping_add(rhs.0))
    }

    pub fn wrapping_mul(self, rhs: i32) -> Scaled {
        Scaled(self.0.wrapping_mul(rhs))
    }
}

#[derive(Debug)]
pub struct OverflowError;

impl std::fmt::Display for Scaled {
    /// Prints the scaled number as a decimal number of points, with the
    /// shortest fraction that rounds back to the same value.
    ///
    /// TeX.2021.103.
    fn fmt(&self, fm: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = *self;
        if s < Scaled::ZERO {
            write!(fm, "-")?;
        }
        write!(fm, "{}.", s.abs().integer_part())?;
        let mut f = s.abs().fractional_part() * 10 + Scaled(5);
        let mut delta = Scaled(10);
        loop {
            if delta > Scaled::ONE {
                // round the last digit
                f = f + Scaled(0o100000 - 50000);
            }
            let digit = u32::try_from(f.integer_part()).unwrap_or(0);
            fm.write_char(char::from_digit(digit, 10).unwrap_or('0'))?;
            f = f.fractional_part() * 10;
            delta = delta * 10;
            if f <= delta {
                break;
            }
        }
        write!(fm, "pt")
    }
}

impl std::ops::Add<Scaled> for Scaled {
    type Output = Scaled;
    fn add(self, rhs: Scaled) -> Self::Output {
        Scaled(self.0 + rhs.0)
    }
}

impl std::ops::Sub<Scaled> for Scaled {
    type Output = Scaled;
    fn sub(self, rhs: Scaled) -> Self::Output {
        Scaled(self.0 - rhs.0)
    }
}

impl std::ops::Mul<i32> for Scaled {
    type Output = Scaled;
    fn mul(self, rhs: i32) -> Self::Output {
        Scaled(self.0 * rhs)
    }
}

impl std::ops::Div<i32> for Scaled {
    type Output = Scaled;
    fn div(self, rhs: i32) -> Self::Output {
        Scaled(self.0 / rhs)
    }
}

impl std::ops::Rem<i32> for Scaled {
    type Output = Scaled;
    fn rem(self, rhs: i32) -> Self::Output {
        Scaled(self.0 % rhs)
    }
}

impl std::ops::Neg for Scaled {
    type Output = Scaled;
    fn neg(self) -> Self::Output {
        Scaled(-self.0)
    }
}

/// Unit in which a dimension is written, like `pt` or `in`.
///
/// Defined in TeX.2021.458 and chapter 10 of the TeXBook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaledUnit {
    Point,
    Pica,
    Inch,
    BigPoint,
    Centimeter,
    Millimeter,
    DidotPoint,
    Cicero,
    ScaledPoint,
}

impl ScaledUnit {
    /// Parses a unit from its two character abbreviation, e.g. `"pc"`.
    pub fn parse(s: &str) -> Option<Self> {
        use ScaledUnit::*;
        Some(match s {
            "pt" => Point,
            "pc" => Pica,
            "in" => Inch,
            "bp" => BigPoint,
            "cm" => Centimeter,
            "mm" => Millimeter,
            "dd" => DidotPoint,
            "cc" => Cicero,
            "sp" => ScaledPoint,
            _ => return None,
        })
    }

    /// Returns the fraction (_n_, _d_) needed to convert from this unit to
    /// points: _x_ in this unit is _nx_/_d_ points.
    ///
    /// Defined in TeX.2021.458.
    pub fn conversion_fraction(&self) -> (i32, i32) {
        use ScaledUnit::*;
        match self {
            Point => (1, 1),
            Pica => (12, 1),
            Inch => (7227, 100),
            BigPoint => (7227, 7200),
            Centimeter => (7227, 254),
            Millimeter => (7227, 2540),
            DidotPoint => (1238, 1157),
            Cicero => (14856, 1157),
            ScaledPoint => (1, 1 << 16),
        }
    }
}

/// Glue: a dimension that can stretch and shrink.
///
/// Described in TeX.2021.150. The same struct represents math glue, in
/// which case the unit is mu rather than pt.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Glue {
    pub width: Scaled,
    pub stretch: Scaled,
    pub stretch_order: GlueOrder,
    pub shrink: Scaled,
    pub shrink_order: GlueOrder,
}

impl Glue {
    pub fn from_width(width: Scaled) -> Glue {
        Glue {
            width,
            ..Default::default()
        }
    }
}

impl std::ops::Neg for Glue {
    type Output = Glue;

    fn neg(self) -> Glue {
        Glue {
            width: -self.width,
            stretch: -self.stretch,
            stretch_order: self.stretch_order,
            shrink: -self.shrink,
            shrink_order: self.shrink_order,
        }
    }
}

impl std::fmt::Display for Glue {
    /// Prints the glue the way `\the` renders a glue value.
    ///
    /// TeX.2021.177 and TeX.2021.178.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.width)?;
        if self.stretch != Scaled::ZERO {
            write!(f, " plus {}", StretchOrShrink(self.stretch, self.stretch_order))?;
        }
        if self.shrink != Scaled::ZERO {
            write!(f, " minus {}", StretchOrShrink(self.shrink, self.shrink_order))?;
        }
        Ok(())
    }
}

struct StretchOrShrink(Scaled, GlueOrder);

impl std::fmt::Display for StretchOrShrink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.1 {
            GlueOrder::Normal => write!(f, "{}", self.0),
            order => {
                // strip the "pt" suffix and append the infinite unit
                let formatted = format!("{}", self.0);
                let number = formatted.trim_end_matches("pt");
                let unit = match order {
                    GlueOrder::Fil => "fil",
                    GlueOrder::Fill => "fill",
                    _ => "filll",
                };
                write!(f, "{number}{unit}")
            }
        }
    }
}

/// Order of infinity of a glue stretch or shrink.
///
/// When setting a list, glue of the highest order present is the only glue
/// that stretches or shrinks.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GlueOrder {
    #[default]
    Normal,
    Fil,
    Fill,
    Filll,
}

impl GlueOrder {
    /// Parses an infinite glue order from a keyword.
    pub fn parse(s: &str) -> Option<Self> {
        use GlueOrder::*;
        Some(match s {
            "fil" => Fil,
            "fill" => Fill,
            "filll" => Filll,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cat_code_round_trip() {
        for u in 0_u8..16 {
            let cat_code: CatCode = u.try_into().unwrap();
            assert_eq!(cat_code as u8, u);
        }
        assert!(CatCode::try_from(16_u8).is_err());
    }

    #[test]
    fn plain_tex_defaults() {
        assert_eq!(CatCode::plain_tex_default('\\'), CatCode::Escape);
        assert_eq!(CatCode::plain_tex_default('{'), CatCode::BeginGroup);
        assert_eq!(CatCode::plain_tex_default('}'), CatCode::EndGroup);
        assert_eq!(CatCode::plain_tex_default('q'), CatCode::Letter);
        assert_eq!(CatCode::plain_tex_default('Q'), CatCode::Letter);
        assert_eq!(CatCode::plain_tex_default('3'), CatCode::Other);
        assert_eq!(CatCode::plain_tex_default(' '), CatCode::Space);
        assert_eq!(CatCode::plain_tex_default('\n'), CatCode::EndOfLine);
        assert_eq!(CatCode::plain_tex_default('%'), CatCode::Comment);
        assert_eq!(CatCode::plain_tex_default('é'), CatCode::Other);
    }

    #[test]
    fn scaled_display() {
        assert_eq!(Scaled::ZERO.to_string(), "0.0pt");
        assert_eq!(Scaled::ONE.to_string(), "1.0pt");
        assert_eq!((Scaled::ONE / 2).to_string(), "0.5pt");
        assert_eq!((-Scaled::ONE * 3 / 2).to_string(), "-1.5pt");
        assert_eq!(Scaled(0o31).to_string(), "0.00038pt");
    }

    #[test]
    fn scaled_from_integer() {
        assert_eq!(Scaled::from_integer(2).unwrap(), Scaled::ONE * 2);
        assert!(Scaled::from_integer(1 << 14).is_err());
        assert!(Scaled::from_integer(-(1 << 14)).is_err());
    }

    #[test]
    fn scaled_from_decimal_digits() {
        assert_eq!(Scaled::from_decimal_digits(&[5]), Scaled::ONE / 2);
        assert_eq!(Scaled::from_decimal_digits(&[2, 5]), Scaled::ONE / 4);
    }

    #[test]
    fn glue_display() {
        let glue = Glue {
            width: Scaled::ONE * 6,
            stretch: Scaled::ONE * 2,
            stretch_order: GlueOrder::Fil,
            shrink: Scaled::ONE,
            shrink_order: GlueOrder::Normal,
        };
        assert_eq!(glue.to_string(), "6.0pt plus 2.0fil minus 1.0pt");
        assert_eq!(Glue::from_width(Scaled::ONE).to_string(), "1.0pt");
    }
}
