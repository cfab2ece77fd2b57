//! Packaging of the finished output root.
//!
//! Assemblers run once, after every document has been written and the append
//! writer (if any) has closed the file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, instrument};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Errors raised while packaging the output root.
#[derive(Debug, Error)]
pub enum AssembleError {
    /// Copying a file into the output root failed.
    #[error("failed to copy {from} into {to}: {source}")]
    Copy {
        /// Source file.
        from: PathBuf,
        /// Destination path.
        to: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Building the archive failed.
    #[error("failed to write archive {path}: {reason}")]
    Archive {
        /// Archive path.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// The archive would be written inside the directory it packages.
    #[error("archive {path} must not be inside the output root {root}")]
    ArchiveInsideRoot {
        /// Archive path.
        path: PathBuf,
        /// Output root.
        root: PathBuf,
    },
}

/// Post-processing step over a fully written output root.
#[async_trait]
pub trait OutputAssembler: Send + Sync + std::fmt::Debug {
    /// Runs the step against `root`.
    ///
    /// # Errors
    ///
    /// Returns [`AssembleError`] describing the failed step.
    async fn assemble(&self, root: &Path) -> Result<(), AssembleError>;
}

/// Copies a manifest file verbatim into the output root.
#[derive(Debug, Clone)]
pub struct ManifestCopy {
    source: PathBuf,
}

impl ManifestCopy {
    /// Copies `source` into the root under its own file name.
    #[must_use]
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

#[async_trait]
impl OutputAssembler for ManifestCopy {
    #[instrument(skip(self), fields(source = %self.source.display()))]
    async fn assemble(&self, root: &Path) -> Result<(), AssembleError> {
        let name = self.source.file_name().unwrap_or(self.source.as_os_str());
        let to = root.join(name);
        tokio::fs::copy(&self.source, &to)
            .await
            .map_err(|source| AssembleError::Copy {
                from: self.source.clone(),
                to: to.clone(),
                source,
            })?;
        info!(to = %to.display(), "manifest copied");
        Ok(())
    }
}

/// Packages the output root into a zip archive.
#[derive(Debug, Clone)]
pub struct ZipArchive {
    destination: PathBuf,
}

impl ZipArchive {
    /// Writes the archive to `destination`, which must lie outside the root.
    #[must_use]
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
        }
    }

    /// Archive named `charts.zip` next to `root`.
    #[must_use]
    pub fn beside(root: &Path) -> Self {
        let parent = root.parent().unwrap_or_else(|| Path::new("."));
        Self::new(parent.join("charts.zip"))
    }

    /// Where the archive is written.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

#[async_trait]
impl OutputAssembler for ZipArchive {
    #[instrument(skip(self), fields(archive = %self.destination.display()))]
    async fn assemble(&self, root: &Path) -> Result<(), AssembleError> {
        let root = root.to_path_buf();
        let destination = self.destination.clone();
        if is_inside(&destination, &root) {
            return Err(AssembleError::ArchiveInsideRoot {
                path: destination,
                root,
            });
        }

        let path = destination.clone();
        let entries = tokio::task::spawn_blocking(move || write_archive(&root, &destination))
            .await
            .map_err(|e| AssembleError::Archive {
                path: path.clone(),
                reason: e.to_string(),
            })?
            .map_err(|reason| AssembleError::Archive {
                path: path.clone(),
                reason,
            })?;
        info!(entries, "archive written");
        Ok(())
    }
}

fn is_inside(path: &Path, root: &Path) -> bool {
    let absolute = |p: &Path| {
        fs::canonicalize(p)
            .or_else(|_| {
                // The archive usually does not exist yet.
                let parent = p.parent().map(fs::canonicalize).transpose()?;
                Ok::<_, io::Error>(match (parent, p.file_name()) {
                    (Some(parent), Some(name)) => parent.join(name),
                    _ => p.to_path_buf(),
                })
            })
            .unwrap_or_else(|_| p.to_path_buf())
    };
    absolute(path).starts_with(absolute(root))
}

fn write_archive(root: &Path, destination: &Path) -> Result<usize, String> {
    let mut files = Vec::new();
    collect_files(root, &mut files).map_err(|e| e.to_string())?;
    files.sort();

    let file = fs::File::create(destination).map_err(|e| e.to_string())?;
    let mut writer = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in &files {
        let relative = path.strip_prefix(root).map_err(|e| e.to_string())?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        debug!(entry = %name, "archiving");
        writer.start_file(name, options).map_err(|e| e.to_string())?;
        let mut source = fs::File::open(path).map_err(|e| e.to_string())?;
        io::copy(&mut source, &mut writer).map_err(|e| e.to_string())?;
    }
    writer.finish().map_err(|e| e.to_string())?;
    Ok(files.len())
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

/// Runs several assemblers in order, stopping at the first failure.
#[derive(Debug, Default)]
pub struct AssemblerChain {
    steps: Vec<Box<dyn OutputAssembler>>,
}

impl AssemblerChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step.
    #[must_use]
    pub fn then(mut self, step: impl OutputAssembler + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// True when the chain has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[async_trait]
impl OutputAssembler for AssemblerChain {
    async fn assemble(&self, root: &Path) -> Result<(), AssembleError> {
        for step in &self.steps {
            step.assemble(root).await?;
        }
        Ok(())
    }
}
