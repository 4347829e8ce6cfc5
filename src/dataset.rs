//! The in-memory SEMEION dataset: fetch-if-needed, verify, parse once, then
//! serve `(image, label)` pairs by index with optional access-time transforms.

use image::GrayImage;
use std::fmt;
use std::fs;
use std::ops::Index;
use std::path::{Path, PathBuf};

use crate::checksum;
use crate::config::{FetchConfig, SemeionConfig, SourceConfig};
use crate::error::{Result, SemeionError};
use crate::fetch::{self, CurlTransport, Transport};
use crate::parser::{self, Label, Record};

/// Index-addressable sample source for training loops.
pub trait Dataset {
    type Item;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample at `index`; `IndexOutOfRange` unless `index < len()`.
    fn get(&self, index: usize) -> Result<Self::Item>;
}

type ImageTransform<I> = Box<dyn Fn(GrayImage) -> I + Send + Sync>;
type LabelTransform<L> = Box<dyn Fn(Label) -> L + Send + Sync>;

/// Parsed dataset. Immutable after construction, so shared reads across
/// threads need no locking.
pub struct Semeion<I = GrayImage, L = Label> {
    root: PathBuf,
    file_path: PathBuf,
    records: Vec<Record>,
    transform: ImageTransform<I>,
    target_transform: LabelTransform<L>,
}

impl Semeion {
    /// Start configuring a dataset rooted at `root`. Downloads by default.
    pub fn builder(root: impl AsRef<Path>) -> SemeionBuilder {
        SemeionBuilder {
            root: root.as_ref().to_path_buf(),
            download: true,
            source: SourceConfig::default(),
            fetch: FetchConfig::default(),
            transport: Box::new(CurlTransport),
            transform: Box::new(|img| img),
            target_transform: Box::new(|label| label),
        }
    }

    /// Load without transforms.
    pub fn new(root: impl AsRef<Path>, download: bool) -> Result<Self> {
        Self::builder(root).download(download).build()
    }
}

impl<I, L> Semeion<I, L> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Image as an 8-bit 16×16 `GrayImage` and its label, both passed
    /// through the configured transforms. Stored records are not modified.
    pub fn get(&self, index: usize) -> Result<(I, L)> {
        let record = self
            .records
            .get(index)
            .ok_or(SemeionError::IndexOutOfRange {
                index,
                len: self.records.len(),
            })?;
        Ok(self.sample(record))
    }

    /// All samples in file order.
    pub fn iter(&self) -> impl Iterator<Item = (I, L)> + '_ {
        self.records.iter().map(move |r| self.sample(r))
    }

    /// Untransformed records in file order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Resolved dataset root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the verified data file.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn sample(&self, record: &Record) -> (I, L) {
        let image = (self.transform)(record.image.to_gray_image());
        let label = (self.target_transform)(record.label.clone());
        (image, label)
    }
}

impl<I, L> Dataset for Semeion<I, L> {
    type Item = (I, L);

    fn len(&self) -> usize {
        self.records.len()
    }

    fn get(&self, index: usize) -> Result<(I, L)> {
        Semeion::<I, L>::get(self, index)
    }
}

impl<I, L> Index<usize> for Semeion<I, L> {
    type Output = Record;

    fn index(&self, index: usize) -> &Record {
        &self.records[index]
    }
}

impl<I, L> fmt::Debug for Semeion<I, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Semeion")
            .field("root", &self.root)
            .field("len", &self.records.len())
            .finish_non_exhaustive()
    }
}

/// Construction options for [`Semeion`].
pub struct SemeionBuilder<I = GrayImage, L = Label> {
    root: PathBuf,
    download: bool,
    source: SourceConfig,
    fetch: FetchConfig,
    transport: Box<dyn Transport>,
    transform: ImageTransform<I>,
    target_transform: LabelTransform<L>,
}

impl<I, L> SemeionBuilder<I, L> {
    /// Fetch the file when it is missing or corrupt (default true).
    pub fn download(mut self, download: bool) -> Self {
        self.download = download;
        self
    }

    pub fn source(mut self, source: SourceConfig) -> Self {
        self.source = source;
        self
    }

    pub fn fetch_config(mut self, fetch: FetchConfig) -> Self {
        self.fetch = fetch;
        self
    }

    /// Apply both sections of a loaded config file.
    pub fn config(self, config: SemeionConfig) -> Self {
        self.source(config.source).fetch_config(config.fetch)
    }

    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Box::new(transport);
        self
    }

    /// Function applied to each image at access time.
    pub fn transform<I2>(
        self,
        f: impl Fn(GrayImage) -> I2 + Send + Sync + 'static,
    ) -> SemeionBuilder<I2, L> {
        SemeionBuilder {
            root: self.root,
            download: self.download,
            source: self.source,
            fetch: self.fetch,
            transport: self.transport,
            transform: Box::new(f),
            target_transform: self.target_transform,
        }
    }

    /// Function applied to each label at access time.
    pub fn target_transform<L2>(
        self,
        f: impl Fn(Label) -> L2 + Send + Sync + 'static,
    ) -> SemeionBuilder<I, L2> {
        SemeionBuilder {
            root: self.root,
            download: self.download,
            source: self.source,
            fetch: self.fetch,
            transport: self.transport,
            transform: self.transform,
            target_transform: Box::new(f),
        }
    }

    /// Fetch if enabled, verify, read and parse. Either returns a fully
    /// loaded dataset or an error; there is no partial result.
    pub fn build(self) -> Result<Semeion<I, L>> {
        let root = expand_home(&self.root);
        let file_path = root.join(&self.source.filename);

        if self.download {
            fetch::ensure_local(
                &self.source.url,
                &root,
                &self.source.filename,
                &self.source.checksum,
                &self.fetch,
                self.transport.as_ref(),
            )?;
        }

        // Read once: the bytes that verify are the bytes that get parsed.
        let bytes = match fs::read(&file_path) {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!("cannot read {}: {}", file_path.display(), e);
                return Err(SemeionError::DatasetNotFound { path: file_path });
            }
        };
        if !checksum::verify_bytes(&bytes, &self.source.checksum) {
            return Err(SemeionError::DatasetNotFound { path: file_path });
        }

        let raw = String::from_utf8(bytes).map_err(|e| SemeionError::Io {
            path: file_path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
        let records = parser::parse(&raw)?;
        tracing::info!("loaded {} records from {}", records.len(), file_path.display());

        Ok(Semeion {
            root,
            file_path,
            records,
            transform: self.transform,
            target_transform: self.target_transform,
        })
    }
}

/// Expand a leading `~` to the user's home directory.
fn expand_home(path: &Path) -> PathBuf {
    let home = match std::env::var_os("HOME") {
        Some(h) if !h.is_empty() => PathBuf::from(h),
        _ => return path.to_path_buf(),
    };
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}
