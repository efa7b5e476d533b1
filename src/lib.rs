//! # Compute Landscape
//!
//! A research workbench for the AI-compute chip market.
//!
//! Thirteen chip-architecture segments, grouped into five categories, each
//! carry a saved analysis (companies, summary, trends). Analyses persist as a
//! single JSON blob, can be produced from free-form notes by a generative
//! language service, and roll up into a market overview. Everything is
//! available from a CLI and a JSON HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   Catalog    │──▶│ResearchStore │──▶│ FileStorage  │
//! │ 13 segments  │   │ set / merge  │   │  JSON blob   │
//! └──────────────┘   └──────┬───────┘   └──────────────┘
//!                           │
//!        ┌──────────────────┼───────────────────┐
//!        ▼                  ▼                   ▼
//!   ┌──────────┐      ┌──────────┐       ┌──────────────┐
//!   │   CLI    │      │   HTTP   │◀─────▶│ Intelligence │
//!   │landscape │      │  (axum)  │       │   (Gemini)   │
//!   └──────────┘      └──────────┘       └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! landscape segments                          # browse the catalog
//! landscape show si-wafer                     # one segment + its research
//! landscape analyze si-wafer --notes notes.md # extract and save an analysis
//! landscape overview                          # category rollups
//! landscape serve                             # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`storage_fs`] | File-backed blob storage |
//! | [`research_cmd`] | Catalog browsing, editing, import/export |
//! | [`overview`] | Market overview rendering |
//! | [`gemini`] | Gemini intelligence provider |
//! | [`prompts`] | Prompt text and response schemas |
//! | [`analyze`] | Notes and narratives into stored analyses |
//! | [`ask`] | Questions answered by the intelligence service |
//! | [`server`] | JSON HTTP API |
//!
//! The domain model, store, and intelligence contract live in the
//! [`landscape_core`] crate and are re-exported here as [`core`].

pub mod analyze;
pub mod ask;
pub mod config;
pub mod gemini;
pub mod logging;
pub mod overview;
pub mod prompts;
pub mod research_cmd;
pub mod server;
pub mod storage_fs;

pub use landscape_core as core;
