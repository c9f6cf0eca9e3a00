//! Review reminder orchestration.
//!
//! Provides the GitHub client that fetches open pull requests and the
//! review-required search, the reminder pipeline that drives triage,
//! formatting and delivery, and the run report it produces.

pub mod github;
pub mod pipeline;
pub mod report;
