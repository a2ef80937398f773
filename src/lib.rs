//! An in-memory hierarchical file store over a fixed pool of disk-style
//! blocks.
//!
//! The store keeps a namespace tree of named directories and files, backs
//! every file's content with a chain of fixed-size blocks carved from a
//! single arena, and can export its complete state as one self-describing
//! byte stream. Layers, bottom to top:
//!
//! - [`BlockPool`]: fixed-capacity arena with a presence bitmap; allocation
//!   always picks the lowest free slot.
//! - Block chains: per-file ordered block sequences, keyed by node identity.
//! - [`FileSystem`]: the namespace tree, a current-directory cursor, and
//!   the content operations a shell-style front end drives.
//! - [`write_snapshot`]: the write-only persistence export.
//!
//! Single logical actor: operations run to completion, one at a time.

mod chain;
mod dict;
mod error;
mod fs;
mod ident;
mod node;
mod pool;
mod snapshot;

pub use error::FsError;
pub use fs::{DirEntry, FileSystem, FsConfig};
pub use ident::IdGenerator;
pub use node::NodeKind;
pub use pool::{BlockHandle, BlockPool};
pub use snapshot::{write_snapshot, SNAPSHOT_MAGIC};
