//! # CLI Layer
//!
//! One client of the keepfan library. This is the only place that parses
//! arguments, installs the log subscriber, prints to the terminal and decides
//! exit codes.
//!
//! ## Structure
//!
//! - `setup`: clap argument definitions
//! - `commands`: `run()`, called by `main.rs`; merges flags over the config file
//! - `print`: colored run summary

mod commands;
mod print;
mod setup;

pub use commands::run;
