//! Automation hub - a personal workspace for projects, notes and launchers
//!
//! This crate provides the core functionality for the `hub` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`hub`] - The application context every operation goes through
//! - [`model`] - Entity kinds (Project, Spreadsheet, Note, Utility, Command, Reminder, Download)
//! - [`storage`] - SQLite store, generic repository and audit log
//! - [`settings`] - Persisted key/value settings with defaults
//! - [`backup`] - Checksummed backups and validated restore
//! - [`tasks`] - Joinable background work
//! - [`config`] - Store location and default directories
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod files;
pub mod hub;
pub mod model;
pub mod settings;
pub mod storage;
pub mod tasks;

pub use error::{Error, Result};
pub use hub::Hub;
