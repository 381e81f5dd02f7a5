//! apple-notes-to-sqlite - export Apple Notes into SQLite
//!
//! This crate provides the core functionality for the `apple-notes-to-sqlite`
//! CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Data types (Folder, Note)
//! - [`folders`] - Folder hierarchy ordering and `--folder` resolution
//! - [`source`] - Note extraction via `osascript` and `NoteStore.sqlite`
//! - [`storage`] - SQLite output database
//! - [`sync`] - Export, incremental sync and dump
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod folders;
pub mod model;
pub mod source;
pub mod storage;
pub mod sync;

pub use error::{Error, Result};
