//! Well-known directories used for runtime artifacts such as the TensorRT
//! engine cache.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "overlap_detect";

#[derive(Debug)]
pub enum FsAccess {
    Cache,
    Current,
}

impl FsAccess {
    /// Base path for the directory type, with the `overlap_detect`
    /// subdirectory appended unless `raw`.
    fn get_path(&self, raw: bool) -> anyhow::Result<PathBuf> {
        let base_path = match self {
            FsAccess::Cache => dirs::cache_dir(),
            FsAccess::Current => std::env::current_dir().ok(),
        };

        let mut path = base_path.ok_or_else(|| {
            anyhow::anyhow!("Unable to resolve the {:?} directory on this platform.", self)
        })?;

        if !raw {
            path.push(APP_DIR);
        }
        Ok(path)
    }

    /// Constructs a path under the `overlap_detect` directory, creating it.
    ///
    /// Example: `~/.cache/overlap_detect/trt-cache`.
    pub fn path_with_subs(&self, subs: &[&str]) -> anyhow::Result<PathBuf> {
        let mut d = self.get_path(false)?;
        for sub in subs {
            d.push(sub);
        }
        Self::create_directory(&d)?;
        Ok(d)
    }

    /// Like [`FsAccess::path_with_subs`] for the cache directory, falling back
    /// to the working directory when no cache directory exists.
    pub fn cache_or_current(subs: &[&str]) -> anyhow::Result<PathBuf> {
        FsAccess::Cache
            .path_with_subs(subs)
            .or_else(|err| {
                log::warn!("{err}, using the working directory");
                FsAccess::Current.path_with_subs(subs)
            })
    }

    fn create_directory(path: &Path) -> anyhow::Result<()> {
        if !path.exists() {
            std::fs::create_dir_all(path)?;
        }
        Ok(())
    }
}
