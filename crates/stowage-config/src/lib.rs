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

//! Client-side editing and submission of the Stowage settings document.
//!
//! Layout: `model.rs` (canonical document), `credential.rs` (hashed/pending
//! password state), `draft.rs` (editable copy), `validate.rs` (field rules),
//! `hasher.rs` (deferred hashing), `merge.rs` (document invariants),
//! `session.rs` (commit engine), `store.rs` (file-backed recovery store).

pub mod credential;
pub mod draft;
pub mod error;
pub mod hasher;
pub mod merge;
pub mod model;
pub mod session;
pub mod store;
pub mod validate;

pub use credential::Credential;
pub use draft::{Draft, DraftUser};
pub use error::{ConfigError, ConfigResult, ErrorSurface};
pub use hasher::{Argon2Hasher, CredentialHasher, HashedDraft, hash_pending};
pub use merge::merge;
pub use model::{Auth, Configuration, Passthrough, User};
pub use session::{
    Committed, ConfigBackend, ERROR_DISPLAY, Notifier, RELOAD_DELAY, Reloader, SUCCESS_DISPLAY,
    SessionDeps, SettingsSession, commit,
};
pub use store::{CONFIG_FILE_ENV, FileConfigBackend, default_config_path};
pub use validate::{
    FieldError, FieldErrors, FieldPath, FieldRule, IDENTIFIER_PATTERN, ValidatedDraft,
    ValidatedUser, is_identifier, validate,
};
