#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(
    missing_docs,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::redundant_pub_crate)]

//! Command-line settings editor for a Stowage instance.
//!
//! Layout:
//! - `cli.rs`: argument parsing, logging/locale bootstrap and command dispatch
//! - `commands/`: command handlers grouped by concern
//! - `client.rs`: shared HTTP client, errors, and problem classification
//! - `remote.rs`: HTTP-backed configuration store and hash service
//! - `console.rs`: terminal notifier and post-commit reloader
//! - `output.rs`: renderers and formatting helpers
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod cli;
pub(crate) mod client;
pub(crate) mod commands;
pub(crate) mod console;
pub(crate) mod output;
pub(crate) mod remote;

pub use cli::run;
