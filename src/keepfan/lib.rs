//! # Keepfan Architecture
//!
//! Keepfan turns a Google Keep takeout archive into several output forms in a
//! single pass. It is a library with a CLI client, and the library never
//! touches stdout/stderr or exit codes except through the console sink it is
//! explicitly asked to build.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Archive Reader (archive.rs)                                 │
//! │  - validates every entry path up front                       │
//! │  - filters, decodes and yields live notes lazily             │
//! └──────────────────────────────────────────────────────────────┘
//!                              │  Result<Record>
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Dispatcher (dispatch.rs)                                    │
//! │  - offers each record to every sink in parallel (rayon)      │
//! │  - collects per-sink failures, flushes at end of stream      │
//! └──────────────────────────────────────────────────────────────┘
//!                              │  &Record
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Sinks (sink/)                                               │
//! │  console │ text / markdown files │ OPML outline │ paged PDF  │
//! │          │  ▲ shared NameAllocator (naming.rs)               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Error Model
//!
//! Archive-level problems (unreadable zip, path traversal, undecodable note)
//! end the run with an `Err`. Anything a single sink trips over is recorded in
//! the [`dispatch::RunReport`] and the run carries on.
//!
//! ## Module Overview
//!
//! - [`model`]: `Record`, `ListItem` and the raw takeout schema
//! - [`archive`]: zip walking, filtering and decoding
//! - [`naming`]: unique output base names
//! - [`render`]: template rendering for every output form
//! - [`sink`]: the `Sink` trait and its four implementations
//! - [`writer`]: file creation primitive
//! - [`dispatch`]: concurrent fan-out and the run report
//! - [`config`]: `ExportConfig`
//! - [`export`]: config to running pipeline
//! - [`error`]: Error types
//! - `cli`: argument parsing, logging setup and report printing for the binary (not part of the lib API)

pub mod archive;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod model;
pub mod naming;
pub mod render;
pub mod sink;
pub mod writer;
