//! QR artifacts for newly discovered friend codes.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::{ImageFormat, Luma};
use qrcode::QrCode;
use thiserror::Error;

/// Subdirectory under the configured base path that holds the images.
pub const QR_DIR_NAME: &str = "QR POGO CODES";

const FALLBACK_STEM: &str = "Unknown";

#[derive(Debug, Error)]
pub enum QrError {
    #[error("failed to encode QR payload: {reason}")]
    Encode { reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write QR image: {0}")]
    Image(#[from] image::ImageError),
}

/// Turns a payload into a scannable artifact.
pub trait CodeImager: Send + Sync {
    /// Encodes `payload` and stores it under a name derived from
    /// `suggested_name`, returning where it was written.
    ///
    /// # Errors
    ///
    /// Returns [`QrError`] if encoding or writing fails.
    fn emit(&self, payload: &str, suggested_name: &str) -> Result<PathBuf, QrError>;
}

/// Writes PNG QR codes into `<base>/QR POGO CODES/`.
#[derive(Debug, Clone)]
pub struct QrWriter {
    dir: PathBuf,
}

impl QrWriter {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            dir: base_path.as_ref().join(QR_DIR_NAME),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn io_err(path: &Path, source: std::io::Error) -> QrError {
        QrError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Creates `<stem>.png`, or `<stem>_1.png`, `<stem>_2.png`, ... when taken.
    ///
    /// `create_new` claims the name atomically, so two writers never share a file.
    fn claim_file(&self, stem: &str) -> Result<(File, PathBuf), QrError> {
        let mut suffix = 0u32;
        loop {
            let file_name = if suffix == 0 {
                format!("{stem}.png")
            } else {
                format!("{stem}_{suffix}.png")
            };
            let path = self.dir.join(file_name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((file, path)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => suffix += 1,
                Err(e) => return Err(Self::io_err(&path, e)),
            }
        }
    }
}

impl CodeImager for QrWriter {
    fn emit(&self, payload: &str, suggested_name: &str) -> Result<PathBuf, QrError> {
        let code = QrCode::new(payload.as_bytes()).map_err(|e| QrError::Encode {
            reason: e.to_string(),
        })?;
        let img = code.render::<Luma<u8>>().build();

        fs::create_dir_all(&self.dir).map_err(|e| Self::io_err(&self.dir, e))?;
        let (file, path) = self.claim_file(&file_stem(suggested_name))?;

        let mut out = BufWriter::new(file);
        let written = img
            .write_to(&mut out, ImageFormat::Png)
            .map_err(QrError::from)
            .and_then(|()| out.flush().map_err(|e| Self::io_err(&path, e)));
        if let Err(e) = written {
            // Do not leave a truncated image holding the name.
            let _ = fs::remove_file(&path);
            return Err(e);
        }

        tracing::debug!(path = %path.display(), "wrote QR image");
        Ok(path)
    }
}

/// File stem for a trainer name: whitespace runs, path separators and
/// characters Windows rejects in file names become `_`. An empty name falls
/// back to `Unknown`.
#[must_use]
pub fn file_stem(name: &str) -> String {
    let stem = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_");
    if stem.is_empty() || stem.chars().all(|c| c == '.' || c == '_') {
        FALLBACK_STEM.to_owned()
    } else {
        stem
    }
}
