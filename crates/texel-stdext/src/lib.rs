//! # Texel standard library extensions
//!
//! This crate contains data structures and algorithms that are used in the
//! Texel project but that are not TeX specific.

pub mod color;
pub mod distance;
pub mod intern;
pub mod pattern;
