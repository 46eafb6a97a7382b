//! Shared test utilities for the strata workspace.
//!
//! This crate provides standardised fixtures for tests that need layered
//! source files on disk. It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`layers`]: [`TestLayers`](layers::TestLayers) builder for a default
//!   source, overrides and the job file tying them together

pub mod layers;

pub use layers::TestLayers;
