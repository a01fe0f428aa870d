//! The `engine` module is the kernel of the application: `normalize` cleans
//! members' raw lists into sets, and `compare` calculates how those sets
//! relate. The `tabular` and `export` modules read and write member tables,
//! and the `server` module puts all of it behind HTTP.

#![cfg_attr(debug_assertions, allow(dead_code, unused_imports))]
#![deny(unused_must_use)]
#![warn(clippy::all)]
#![allow(clippy::needless_return)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![deny(missing_docs)]

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub mod args;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod logging;
pub mod server;
mod set;
pub mod tabular;

use crate::engine::{compare, normalize, Comparison};

/// Reads the member table at `path` (CSV, XLSX, or XLS, judged by its
/// extension) and compares its members.
pub fn compare_file(path: &Path) -> Result<Comparison> {
    let contents =
        fs::read(path).with_context(|| format!("Can't read file: {}", path.display()))?;
    let filename = path.file_name().map(|name| name.to_string_lossy()).unwrap_or_default();
    let members = tabular::import(&filename, &contents)
        .with_context(|| format!("Can't import member table: {}", path.display()))?;
    tracing::debug!(members = members.len(), "imported {}", path.display());
    Ok(compare(&normalize(members.into_iter().map(|member| (member.name, member.items)))))
}
