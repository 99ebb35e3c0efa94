//! The Texel prelude.
//!
//! The prelude is typically imported as `use texel::prelude as tx` so that
//! function signatures can concisely refer to types like [`tx::Result`](Result).

/// Result type used throughout Texel.
///
/// Errors are boxed because they are large and rarely constructed.
pub type Result<T> = std::result::Result<T, Box<crate::error::Error>>;
