//! Export helpers for offset matrices.

pub mod offset_csv;
