//! Core library for codacy-semgrep
//!
//! This crate implements the **Functional Core** of the codacy-semgrep application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! The project uses a two-crate architecture to enforce separation of concerns:
//!
//! - **`codacy_semgrep_core`** (this crate): Pure transformation functions with zero I/O
//! - **`codacy-semgrep`**: HTTP calls, terminal prompts, file output and orchestration
//!   (the Imperative Shell)
//!
//! Every function here is deterministic and can be tested with plain fixture data.
//! Nothing in this crate talks to the network, the terminal or the filesystem.
//!
//! # Module Organization
//!
//! - [`codacy`]: Codacy API payloads, request paths, pattern filtering and language extraction
//! - [`semgrep`]: Pattern to Semgrep rule transformation and YAML rendering
//! - [`selection`]: Parsing of operator input (numbered choices, language lists)
//! - [`yaml`]: Block YAML emitter that folds long lines at a fixed width
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use codacy_semgrep_core::codacy::{distinct_languages, filter_enabled};
//! use codacy_semgrep_core::semgrep::{build_config, render_config};
//!
//! let enabled = filter_enabled(patterns);
//! let languages = distinct_languages(&enabled);
//! let config = build_config(&enabled, &languages.into_iter().collect());
//! let yaml = render_config(&config)?;
//! ```

pub mod codacy;
pub mod selection;
pub mod semgrep;
pub mod yaml;
