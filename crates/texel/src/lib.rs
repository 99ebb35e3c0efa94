//! # Texel: a TeX language interpreter.
//!
//! This crate implements the core of the Texel TeX language interpreter:
//! the token model and lexer, the scoped context store, the command model,
//! the expansion engine and the user-defined macro engine.
//! TeX primitives built on top of this core live in the `texel-stdlib` crate.

extern crate texel_stdext;

pub mod command;
pub mod context;
pub mod error;
pub mod parse;
pub mod prelude;
pub mod texmacro;
pub mod token;
pub mod types;
pub mod variable;
pub mod vm;

/// Module that re-exports all of the crate's traits.
///
/// This is useful for getting all of the traits in scope in a Rust module:
/// ```
/// use texel::traits::*;
/// ```
pub mod traits {
    pub use super::parse::Parsable;
    pub use super::vm::ExpandedStream;
    pub use super::vm::HasComponent;
    pub use super::vm::TexelState;
    pub use super::vm::TokenStream;
}
