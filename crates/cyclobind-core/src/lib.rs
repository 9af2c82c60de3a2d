//! # cyclobind Core Library
//!
//! Cyclic peptide binder design on top of an external structure-prediction engine.
//!
//! ## Architectural Philosophy
//!
//! The library keeps the same three layers from the bottom up:
//!
//! - **[`core`]: The Foundation.** Stateless building blocks: the pairwise offset matrix and
//!   its cyclic rewrite of the binder block, hotspot and seed sequence parsing, and CSV export.
//!
//! - **[`engine`]: The Logic Core.** Typed design configuration, the
//!   [`engine::backend::DesignBackend`] trait through which the prediction engine is driven,
//!   the JSON-lines process bridge, optimizer plans and the preparation cache.
//!
//! - **[`workflows`]: The Public API.** The trial loop that prepares the target once, patches
//!   the cyclic offset before every optimization and writes one structure per trial.

pub mod core;
pub mod engine;
pub mod workflows;
