use std::path::Path;
use std::path::PathBuf;

use tracing::debug;

use super::write_json_document;
use crate::constants::WRAPPER_CACHE_FILE;
use crate::ConcreteSpec;
use crate::Result;
use crate::SystemError;

/// Cache of the concretized tracing-wrapper spec, keyed by a fixed
/// well-known file name under the cache directory. Existence is the
/// cache-hit test; a disabled cache always misses and never stores.
#[derive(Debug)]
pub struct WrapperCache {
    file: Option<PathBuf>,
}

impl WrapperCache {
    pub fn new(
        enabled: bool,
        cache_dir: &Path,
    ) -> Self {
        WrapperCache {
            file: enabled.then(|| cache_dir.join(WRAPPER_CACHE_FILE)),
        }
    }

    pub fn disabled() -> Self {
        WrapperCache { file: None }
    }

    /// Fast path: the previously concretized wrapper, if cached
    pub async fn load(&self) -> Result<Option<ConcreteSpec>> {
        let Some(file) = &self.file else {
            return Ok(None);
        };
        if !file.exists() {
            return Ok(None);
        }
        let bytes = tokio::fs::read(file).await.map_err(|source| {
            SystemError::Io {
                path: file.clone(),
                source,
            }
        })?;
        let spec: ConcreteSpec =
            serde_json::from_slice(&bytes).map_err(SystemError::Serialization)?;
        debug!("wrapper spec loaded from cache at {}", file.display());
        Ok(Some(spec))
    }

    /// Slow-path companion: persist a freshly concretized wrapper
    pub async fn store(
        &self,
        spec: &ConcreteSpec,
    ) -> Result<()> {
        let Some(file) = &self.file else {
            return Ok(());
        };
        write_json_document(file, spec).await?;
        debug!("wrapper spec cached at {}", file.display());
        Ok(())
    }
}
