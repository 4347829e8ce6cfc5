//! Loader for the SEMEION handwritten digit dataset.
//!
//! `Semeion::builder(root).build()` makes sure `root/semeion.data` is present
//! and matches its MD5 (downloading it otherwise), parses all 1593 rows into
//! 16×16 images with one-hot labels and serves them by index.

pub mod checksum;
pub mod config;
pub mod dataset;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod parser;

pub use config::{FetchConfig, SemeionConfig, SourceConfig};
pub use dataset::{Dataset, Semeion, SemeionBuilder};
pub use error::{ParseError, Result, SemeionError};
pub use fetch::{ensure_local, CurlTransport, FetchStatus, Transport};
pub use parser::{ImageMatrix, Label, Record};
