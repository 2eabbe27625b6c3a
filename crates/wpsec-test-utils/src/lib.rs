//! Shared test utilities for the wp-secure workspace.
//!
//! This crate provides standardised tree fixtures so the core and CLI test
//! suites build live and baseline trees the same way. It is a dev-dependency
//! only and is never published.
//!
//! # Modules
//!
//! - [`tree`]: [`TreeFixture`] builder for a single directory tree
//! - [`site`]: [`SiteFixture`] pairing a live install with its baseline

pub mod site;
pub mod tree;

pub use site::SiteFixture;
pub use tree::TreeFixture;
