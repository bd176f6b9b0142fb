//! Core library for docquiz
//!
//! This crate implements the **Functional Core** of the docquiz client,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`docquiz_core`** (this crate): Pure transformation functions with zero I/O
//! - **`docquiz`**: HTTP calls, terminal rendering and orchestration (the Imperative Shell)
//!
//! Everything here is deterministic given its inputs. The only source of
//! nondeterminism, the particle seeding in [`confetti`], takes its random
//! number generator as a parameter so callers (and tests) control it.
//!
//! # Module Organization
//!
//! - [`summary`]: Segmenting AI-generated summary text into an executive paragraph and key points
//! - [`quiz`]: Question model, answer normalization, local verdicts and the submit gate
//! - [`reward`]: Reward deltas, celebration thresholds and milestone badges
//! - [`confetti`]: Time-stepped particle physics for the success effect
//! - [`failure`]: Mapping collaborator error bodies to user-facing messages
//! - [`documents`]: Document model, dates and file sizes
//! - [`dashboard`]: Profile, score history and dashboard statistics
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use docquiz_core::summary::segment;
//!
//! let summary = segment("A. B. C. D. E.");
//!
//! assert_eq!(summary.executive, "A. B. C...");
//! assert_eq!(summary.key_points, vec!["D", "E"]);
//! ```

pub mod confetti;
pub mod dashboard;
pub mod documents;
pub mod failure;
pub mod quiz;
pub mod reward;
pub mod summary;
