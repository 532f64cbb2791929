use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;
use tracing::info;

use crate::collector::Installer;
use crate::config::DriverConfig;
use crate::ConcreteSpec;
use crate::Environment;
use crate::Result;
use crate::TraceError;

/// Build driver that runs a configured external command as a subprocess.
///
/// The session's queue name reaches the subprocess (and everything it
/// spawns, compiler wrappers included) through a single environment
/// variable, so attaching to the channel needs no other plumbing.
pub struct CommandInstaller {
    config: DriverConfig,
}

impl CommandInstaller {
    pub fn new(config: DriverConfig) -> Self {
        CommandInstaller { config }
    }

    /// Run the configured command to completion with the queue name
    /// exported into its environment.
    pub async fn run(
        &self,
        queue_name: &str,
    ) -> Result<()> {
        let Some((program, args)) = self.config.command.split_first() else {
            return Err(TraceError::DriverStartFailed(
                "driver.command is empty".to_string(),
            )
            .into());
        };

        let mut command = Command::new(program);
        command
            .args(args)
            .env(&self.config.queue_env_var, queue_name);
        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }

        info!(
            "running build driver '{}' with {}={}",
            program, self.config.queue_env_var, queue_name
        );
        let mut child = command.spawn().map_err(|e| {
            TraceError::DriverStartFailed(format!("{}: {}", program, e))
        })?;
        let status = child
            .wait()
            .await
            .map_err(|e| TraceError::DriverFailed(e.to_string()))?;

        if !status.success() {
            return Err(TraceError::DriverFailed(format!(
                "'{}' exited with {}",
                program, status
            ))
            .into());
        }
        debug!("build driver '{}' finished", program);
        Ok(())
    }
}

#[async_trait]
impl Installer for CommandInstaller {
    async fn install_spec(
        &self,
        _spec: Arc<ConcreteSpec>,
        queue_name: String,
    ) -> Result<()> {
        self.run(&queue_name).await
    }

    async fn install_environment(
        &self,
        _env: Arc<Environment>,
        queue_name: String,
    ) -> Result<()> {
        self.run(&queue_name).await
    }

    async fn uninstall_spec(
        &self,
        spec: Arc<ConcreteSpec>,
    ) -> Result<()> {
        // The external command owns its own build tree; nothing to remove.
        debug!("no uninstall step for '{}'", spec.name);
        Ok(())
    }
}
