//! Common utilities and shared types for vidtube.
//!
//! This crate provides foundational components used across all vidtube crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Pagination**: Page requests and paged results via [`PageQuery`] and [`Page`]
//! - **Storage**: Media storage backends (local, in-memory, S3-compatible)
//!
//! # Example
//!
//! ```no_run
//! use vidtube_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID for {}: {}", config.server.url, id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod pagination;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::{IdGenerator, ensure_valid_id};
pub use pagination::{Page, PageQuery, SortDirection};
pub use storage::{
    LocalStorage, MediaKind, MemoryStorage, StorageBackend, StorageConfig, StorageOp,
    UploadedFile, build_storage, generate_storage_key,
};
