//! # Engine Module
//!
//! Everything that talks to the structure-prediction engine, plus the typed configuration
//! it is driven with.
//!
//! ## Overview
//!
//! The engine itself (model weights, forward passes, gradients, sequence optimizers) lives
//! outside this crate and is reached through the [`backend::DesignBackend`] trait. This
//! module defines that seam and the state kept on this side of it:
//!
//! - **Configuration** ([`config`]) - target, binder, model, optimizer and run settings
//! - **Protocol State** ([`protocol`]) - preparation requests and the prepared complex layout
//! - **Strategies** ([`strategy`]) - optimizer kinds expanded into engine design steps
//! - **Preparation Cache** ([`cache`]) - reuse of a prepared model across trials
//! - **Bridge** ([`bridge`]) - a JSON-lines backend for an engine in another process
//! - **Progress Monitoring** ([`progress`]) - progress events for front ends
//! - **Results** ([`state`]) - per-trial outcomes and engine metric logs
//! - **Error Handling** ([`error`]) - engine-level error type

pub mod backend;
pub mod bridge;
pub mod cache;
pub mod config;
pub mod error;
pub mod progress;
pub mod protocol;
pub mod state;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;
