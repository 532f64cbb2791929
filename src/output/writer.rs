use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;
use tracing::error;
use tracing::info;

use crate::protocol::CompileCommand;
use crate::utils::file_io::create_parent_dir_if_not_exist;
use crate::Result;
use crate::SystemError;

/// Serialize `value` as pretty JSON to `path`, creating parent directories.
pub async fn write_json_document<T>(
    path: &Path,
    value: &T,
) -> Result<()>
where
    T: Serialize + Sync,
{
    create_parent_dir_if_not_exist(path)?;
    let bytes = serde_json::to_vec_pretty(value).map_err(SystemError::Serialization)?;
    tokio::fs::write(path, bytes).await.map_err(|source| {
        SystemError::Io {
            path: path.to_path_buf(),
            source,
        }
    })?;
    Ok(())
}

/// Write one compile-commands document per spec to its designated
/// destination. An I/O failure on one node is reported and does not abort
/// the remaining nodes.
///
/// Returns the number of documents written.
pub async fn write_compile_commands(
    commands_by_spec: &HashMap<String, Vec<CompileCommand>>,
    destinations: &HashMap<String, PathBuf>,
) -> usize {
    let mut written = 0;
    for (routing_key, commands) in commands_by_spec {
        let Some(path) = destinations.get(routing_key) else {
            debug!(
                "no destination designated for spec '{}', {} records dropped",
                routing_key,
                commands.len()
            );
            continue;
        };
        match write_json_document(path, commands).await {
            Ok(()) => {
                info!(
                    "logged {} commands for '{}' to {}",
                    commands.len(),
                    routing_key,
                    path.display()
                );
                written += 1;
            }
            Err(e) => {
                error!(
                    "failed to write compile commands for '{}' to {}: {}",
                    routing_key,
                    path.display(),
                    e
                );
            }
        }
    }
    written
}
