use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// A model file and where to fetch it from when no local copy exists.
#[derive(Clone, Copy, Debug)]
pub struct ModelSpec<'a> {
    pub name: &'a str,
    pub url: &'a str,
}

/// Finds model files on disk, downloading into the cache as a last resort.
///
/// Resolution order:
/// 1. Models directory given by the operator (pre-provisioned deployments)
/// 2. User cache directory
/// 3. Download from the model's URL into the cache
pub struct ModelResolver {
    cache_dir: PathBuf,
    models_dir: Option<PathBuf>,
}

impl ModelResolver {
    pub fn new(models_dir: Option<PathBuf>) -> Result<Self, ModelResolveError> {
        Ok(Self::with_cache_dir(model_cache_dir()?, models_dir))
    }

    pub fn with_cache_dir(cache_dir: PathBuf, models_dir: Option<PathBuf>) -> Self {
        Self {
            cache_dir,
            models_dir,
        }
    }

    pub fn resolve(
        &self,
        model: ModelSpec<'_>,
        progress: Option<ProgressFn>,
    ) -> Result<PathBuf, ModelResolveError> {
        if let Some(path) = self.local_copy(model.name) {
            log::debug!("Using model {}", path.display());
            return Ok(path);
        }

        fs::create_dir_all(&self.cache_dir).map_err(ModelResolveError::CacheDir)?;
        let dest = self.cache_dir.join(model.name);
        log::info!("Downloading {} to {}", model.url, dest.display());
        download(model.url, &dest, progress)?;
        Ok(dest)
    }

    fn local_copy(&self, name: &str) -> Option<PathBuf> {
        self.models_dir
            .iter()
            .chain(std::iter::once(&self.cache_dir))
            .map(|dir| dir.join(name))
            .find(|path| path.is_file())
    }
}

/// Platform cache directory for downloaded models.
///
/// - Linux: `$XDG_CACHE_HOME/FaceStream/models/` or `~/.cache/FaceStream/models/`
/// - macOS: `~/Library/Caches/FaceStream/models/`
/// - Windows: `%LOCALAPPDATA%/FaceStream/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    dirs::cache_dir()
        .map(|d| d.join("FaceStream").join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");

    let result = download_inner(url, dest, &temp_path, progress);

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}

fn download_inner(
    url: &str,
    dest: &Path,
    temp_path: &Path,
    progress: Option<ProgressFn>,
) -> Result<(), ModelResolveError> {
    let write_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ModelResolveError::Write { path, source }
    };

    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|source| ModelResolveError::Download {
            url: url.to_string(),
            source,
        })?;

    let total = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;
    let mut file = fs::File::create(temp_path).map_err(write_err(temp_path))?;

    // Stream in chunks; embedding models are well over 100MB.
    let mut buf = vec![0u8; 1024 * 1024];
    loop {
        let n = response.read(&mut buf).map_err(write_err(temp_path))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(write_err(temp_path))?;
        downloaded += n as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }

    file.flush().map_err(write_err(temp_path))?;
    drop(file);

    fs::rename(temp_path, dest).map_err(write_err(dest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MODEL: ModelSpec<'static> = ModelSpec {
        name: "test_model.onnx",
        url: "http://invalid.nonexistent.example.com/model.onnx",
    };

    #[test]
    fn test_resolve_prefers_models_dir() {
        let tmp = TempDir::new().unwrap();
        let cache = tmp.path().join("cache");
        let models = tmp.path().join("models");
        fs::create_dir_all(&cache).unwrap();
        fs::create_dir_all(&models).unwrap();
        fs::write(cache.join(MODEL.name), b"cached").unwrap();
        fs::write(models.join(MODEL.name), b"provisioned").unwrap();

        let resolver = ModelResolver::with_cache_dir(cache, Some(models.clone()));

        assert_eq!(resolver.resolve(MODEL, None).unwrap(), models.join(MODEL.name));
    }

    #[test]
    fn test_resolve_finds_cached_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(MODEL.name), b"cached").unwrap();

        let resolver = ModelResolver::with_cache_dir(tmp.path().to_path_buf(), None);

        assert_eq!(
            resolver.resolve(MODEL, None).unwrap(),
            tmp.path().join(MODEL.name)
        );
    }

    #[test]
    fn test_resolve_falls_through_missing_models_dir() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(MODEL.name), b"cached").unwrap();

        let resolver = ModelResolver::with_cache_dir(
            tmp.path().to_path_buf(),
            Some(tmp.path().join("does-not-exist")),
        );

        assert!(resolver.resolve(MODEL, None).is_ok());
    }

    #[test]
    fn test_resolve_download_failure_leaves_no_files() {
        let tmp = TempDir::new().unwrap();
        let cache = tmp.path().join("cache");
        let resolver = ModelResolver::with_cache_dir(cache.clone(), None);

        let result = resolver.resolve(MODEL, None);

        assert!(matches!(result, Err(ModelResolveError::Download { .. })));
        assert!(!cache.join(MODEL.name).exists());
        assert!(!cache.join("test_model.part").exists());
    }

    #[test]
    fn test_model_cache_dir_is_namespaced() {
        let path = model_cache_dir().unwrap();
        assert!(path.ends_with("FaceStream/models"));
    }
}
