#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # kubegather
//!
//! A library for gathering kubeconfig contexts from many machines into one
//! local configuration file.
//!
//! Each source is fetched (from local storage or over ssh), its current
//! context is renamed to `<name>@<label>` together with the cluster and user
//! it references, optional endpoint transforms are applied, and the result
//! is merged into the destination document.
//!
//! ## Core Types
//!
//! - [`Document`]: in-memory kubeconfig
//! - [`SourceDefinition`] and [`Catalog`]: where documents come from
//! - [`Fetcher`]: transport seam for retrieving raw bytes
//! - [`MergeOutcome`]: names written by a merge
//! - [`Error`] and [`Result`]: error handling types
//! - [`Logger`] and [`LogLevel`]: logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use kubegather::{merge, Document, SourceDefinition};
//!
//! let source = Document::from_yaml(br#"
//! current-context: prod
//! clusters:
//! - name: c1
//!   cluster: { server: "https://127.0.0.1:6443" }
//! contexts:
//! - name: prod
//!   context: { cluster: c1, user: u1 }
//! users:
//! - name: u1
//!   user: { token: abc }
//! "#).unwrap();
//!
//! let definition = SourceDefinition::new("lab")
//!     .with_autodetect(true)
//!     .with_resolved_host("198.51.100.9");
//!
//! let mut destination = Document::default();
//! merge(&mut destination, &source, &definition, "lab").unwrap();
//! assert_eq!(destination.clusters["c1@lab"].server, "https://198.51.100.9:6443");
//! ```

pub mod catalog;
pub mod document;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod merge;
pub mod operations;
pub mod path;
pub mod reconcile;
pub mod resolver;
pub mod source;

// Re-export key types at crate root for convenience
pub use catalog::{resolve_config_path, Catalog};
pub use document::{read_document, write_document, Document, WriteOptions};
pub use error::{Error, Result};
pub use fetch::{Fetched, Fetcher, LocalFetcher, OriginFetcher, SshFetcher};
pub use logging::{init_logger, LogLevel, Logger};
pub use merge::{merge, translated_name, MergeOutcome};
pub use operations::{default_label, gather, get_source};
pub use reconcile::{delete_context, list, DeleteOutcome, ListEntry};
pub use resolver::AddressResolver;
pub use source::{Origin, SourceDefinition};
