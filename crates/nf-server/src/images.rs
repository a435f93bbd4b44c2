//! Quality-reducing image transform with an on-disk cache.
//!
//! Posters are large and clients request them in bulk when rendering a
//! library grid, so they are re-encoded as lower-quality JPEGs once and then
//! served from the cache directory.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use nf_core::{id_hash, Error, Result};

/// Produces a servable file for an image at a requested quality.
pub trait ImageService: Send + Sync {
    /// Return the path of a file holding `path` re-encoded at `quality`.
    ///
    /// Implementations may return `path` itself when no transform applies.
    /// A missing source file is [`Error::NotFound`].
    fn open_transformed(&self, path: &Path, quality: u8) -> Result<PathBuf>;
}

/// JPEG re-encoder caching its output under `cache_dir`.
///
/// Without a cache directory every request is served from the original.
#[derive(Debug, Clone, Default)]
pub struct JpegImageService {
    cache_dir: Option<PathBuf>,
}

impl JpegImageService {
    pub fn new(cache_dir: Option<PathBuf>) -> Self {
        Self { cache_dir }
    }

    fn cache_path(cache_dir: &Path, path: &Path, metadata: &fs::Metadata, quality: u8) -> PathBuf {
        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let key = id_hash(&format!(
            "{}:{}:{}:{}",
            path.display(),
            metadata.len(),
            mtime,
            quality
        ));
        cache_dir.join(format!("{key}.jpg"))
    }

    fn encode(source: &Path, target: &Path, quality: u8) -> std::result::Result<(), String> {
        let img = image::open(source).map_err(|e| format!("decode failed: {e}"))?;
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

        let tmp = target.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        let write = || -> std::result::Result<(), String> {
            let file = File::create(&tmp).map_err(|e| format!("create failed: {e}"))?;
            let mut writer = BufWriter::new(file);
            let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
            rgb.write_with_encoder(encoder)
                .map_err(|e| format!("encode failed: {e}"))?;
            writer.flush().map_err(|e| format!("flush failed: {e}"))?;
            drop(writer);
            fs::rename(&tmp, target).map_err(|e| format!("rename failed: {e}"))
        };
        let result = write();
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }
}

impl ImageService for JpegImageService {
    fn open_transformed(&self, path: &Path, quality: u8) -> Result<PathBuf> {
        let metadata =
            fs::metadata(path).map_err(|_| Error::not_found("image", path.display()))?;

        let Some(cache_dir) = self.cache_dir.as_deref() else {
            return Ok(path.to_path_buf());
        };
        if !(1..=100).contains(&quality) {
            return Ok(path.to_path_buf());
        }

        let cached = Self::cache_path(cache_dir, path, &metadata, quality);
        if cached.is_file() {
            return Ok(cached);
        }

        if let Err(e) = fs::create_dir_all(cache_dir) {
            tracing::warn!(dir = %cache_dir.display(), "Cannot create image cache: {e}");
            return Ok(path.to_path_buf());
        }

        match Self::encode(path, &cached, quality) {
            Ok(()) => {
                tracing::debug!(source = %path.display(), quality, "Cached transformed image");
                Ok(cached)
            }
            Err(e) => {
                tracing::warn!(source = %path.display(), "Image transform failed, serving original: {e}");
                Ok(path.to_path_buf())
            }
        }
    }
}
