//! tinypaste-store — filesystem-backed paste storage.
//!
//! One file per paste, named `<id>.paste`, living in the same directory as
//! the static assets whose names are reserved in the URL namespace.
//!
//! # Writes
//!
//! Content is written to a dot-prefixed temporary file first and then
//! hard-linked into its final name with a create-if-absent primitive. The
//! link either succeeds (the identifier is ours) or fails with
//! `AlreadyExists` (someone else holds it, draw again). Readers therefore
//! never observe a half-written paste.
//!
//! The `PasteStore` is `Send` + `Sync` and is shared across request tasks
//! behind an `Arc`.

pub mod error;
pub mod layout;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::{PasteStore, ResolvedTarget, StaticAsset};
