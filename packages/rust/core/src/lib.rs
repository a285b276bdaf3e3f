//! Core pipeline orchestration and domain logic for docpack.
//!
//! This crate ties together source discovery, indexing, compact rendering,
//! snippet merging, and bundle assembly into the end-to-end `build` flow.

pub mod assembler;
pub mod compact;
pub mod index;
pub mod manifest;
pub mod pipeline;
pub mod snippets;

mod output;
