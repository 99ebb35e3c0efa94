//! Terminal coloring
//!
//! Error messages are colored with the
//! [colored crate](https://docs.rs/colored/latest/colored/), gated
//! behind the `color` Cargo feature. The [`Colorize`] trait defined here
//! is what downstream code uses; with the feature on it forwards to the
//! colored crate, and with the feature off every method is a no-op.
//! Either way the call sites look the same:
//!
//! ```
//! use texel_stdext::color::Colorize;
//! println!["{}", "Hello, World".bold().bright_red()];
//! ```

#[cfg(feature = "color")]
pub type ColoredString = colored::ColoredString;

#[cfg(not(feature = "color"))]
pub type ColoredString = String;

macro_rules! colorize {
    ( $( $method: ident, )+ ) => {
        /// Trait that provides coloring methods on strings.
        ///
        /// See the module documentation.
        pub trait Colorize {
            $( fn $method(self) -> ColoredString; )+
        }

        #[cfg(feature = "color")]
        mod forwarding {
            use super::*;
            impl Colorize for ColoredString {
                $( fn $method(self) -> ColoredString { colored::Colorize::$method(self) } )+
            }
            impl Colorize for &str {
                $( fn $method(self) -> ColoredString { colored::Colorize::$method(self) } )+
            }
        }

        #[cfg(not(feature = "color"))]
        mod forwarding {
            use super::*;
            impl Colorize for ColoredString {
                $( fn $method(self) -> ColoredString { self } )+
            }
            impl Colorize for &str {
                $( fn $method(self) -> ColoredString { self.into() } )+
            }
        }
    };
}

colorize!(
    bold,
    bright_cyan,
    bright_blue,
    bright_red,
    bright_yellow,
    italic,
);
