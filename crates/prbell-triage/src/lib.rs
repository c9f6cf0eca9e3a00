//! Pull request triage: which open pull requests deserve a reminder.
//!
//! [`filter`] narrows the fetched list to pull requests GitHub reports as
//! needing review, that still have someone requested, and that do not carry
//! the ignore label. [`aggregate`] flattens the survivors into the compact
//! records the message formatter consumes.

pub mod aggregate;
pub mod filter;
