//! # Core Module
//!
//! Stateless building blocks of cyclic binder design.
//!
//! - **Relative-position offsets** ([`offset`]) - linear offsets from residue indices and the
//!   head-to-tail cyclic block that replaces the binder segment
//! - **Hotspot lists** ([`hotspot`]) - parsing of `"36,37,39-42"` style residue selections
//! - **Seed sequences** ([`sequence`]) - sanitizing a user-supplied starting binder sequence
//! - **Export** ([`io`]) - CSV output of offset matrices
//!
//! Nothing here talks to a structure-prediction engine; see [`crate::engine`] for that.

pub mod hotspot;
pub mod io;
pub mod offset;
pub mod sequence;
