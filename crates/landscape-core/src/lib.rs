//! # Landscape Core
//!
//! Shared, WASM-safe logic for the compute landscape: the static segment
//! catalog, the research data model, the storage abstraction, the research
//! store with its merge rules, category rollups, and the contract for the
//! external intelligence service.
//!
//! This crate contains no tokio, filesystem I/O, or network code. Concrete
//! storage media and the Gemini client live in the `compute-landscape` crate.

pub mod catalog;
pub mod defaults;
pub mod intelligence;
pub mod models;
pub mod research;
pub mod rollup;
pub mod sequence;
pub mod storage;
