//! Core domain models for depbot
//!
//! This module contains the fundamental types used throughout the application:
//! - Four-component package versions with numeric ordering
//! - Dependency details as extracted from project manifests
//! - Records of updates that were applied to manifest files

mod dependency;
mod update_result;
mod version;

pub use dependency::DependencyDetails;
pub use update_result::UpdateResult;
pub use version::{PackageVersion, VersionParseError};
