//! # Workflows Module
//!
//! High-level entry points that tie the [`crate::engine`] seam and the [`crate::core`]
//! offset construction together into complete design runs.
//!
//! ## Architecture
//!
//! - **Design Workflow** ([`design`]) - sequential cyclic binder design trials: cached input
//!   preparation, per-trial cyclic offset patch, optimizer plan execution and structure output.
//!
//! Workflows are generic over [`crate::engine::backend::DesignBackend`], so the same loop
//! drives a bridged engine process in production and an in-memory backend in tests.

pub mod design;
