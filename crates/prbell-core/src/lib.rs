//! Core types, configuration, and error handling for prbell.
//!
//! This crate provides the shared foundation used by all other prbell crates:
//! - [`PrbellError`]: unified error type using `thiserror`
//! - [`Degradation`]: non-fatal conditions recorded in a run report
//! - [`PrbellConfig`]: configuration loaded from `.prbell.toml`
//! - Shared types: [`PullRequest`], [`ReviewRequirementSet`], [`AggregatedPr`],
//!   [`Provider`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{GithubConfig, NotifyConfig, PrbellConfig, MAX_PER_PAGE};
pub use error::{Degradation, PrbellError};
pub use types::{
    to_json_pretty, AggregatedPr, Label, OutputFormat, Provider, PullRequest, RequestedReviewer,
    RequestedTeam, ReviewRequirementSet,
};

/// A convenience `Result` type for prbell operations.
pub type Result<T> = std::result::Result<T, PrbellError>;
