use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::channel::MessageQueue;
use crate::constants::TERMINAL_PAYLOAD;
use crate::constants::TERMINAL_PRIORITY;
use crate::ChannelError;
use crate::ConcreteSpec;
use crate::Environment;
use crate::Result;

/// The external installer / build driver, consumed at its interface
/// boundary. Its contract: on its own completion — success or failure —
/// the terminal event is sent through a queue opened by the session's
/// well-known name, then the queue view is released. [`run_driver`] is the
/// piece of this system that upholds that contract around every install.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Installer: Send + Sync {
    /// Drive the build of a single concretized spec. `queue_name` is the
    /// session channel the driver (and its compiler wrappers) must attach
    /// to by name.
    async fn install_spec(
        &self,
        spec: Arc<ConcreteSpec>,
        queue_name: String,
    ) -> Result<()>;

    /// Drive the build of a whole environment
    async fn install_environment(
        &self,
        env: Arc<Environment>,
        queue_name: String,
    ) -> Result<()>;

    /// Remove an installed spec; used to discard the instrumented wrapper
    /// node and the wrapped spec after commands are extracted
    async fn uninstall_spec(
        &self,
        spec: Arc<ConcreteSpec>,
    ) -> Result<()>;
}

/// Run an install future and then perform the termination handshake,
/// unconditionally: the terminal event goes out at a priority lower than
/// every data event's, so the kernel delivers it only after all queued
/// data events have been drained.
///
/// An install failure is logged, never propagated — the collector learns
/// the session is over from the terminal event, not from this task's
/// outcome.
pub async fn run_driver<F>(
    install: F,
    queue_name: String,
) where
    F: Future<Output = Result<()>> + Send,
{
    if let Err(e) = install.await {
        error!("build driver failed: {}", e);
    }
    send_terminal_event(&queue_name).await;
}

/// Open the session queue by name and send the terminal sentinel,
/// retrying a full queue: the collector is draining concurrently, so a
/// `WouldBlock` here resolves as soon as data events are consumed.
async fn send_terminal_event(queue_name: &str) {
    let queue = match MessageQueue::open(queue_name) {
        Ok(queue) => queue,
        Err(e) => {
            error!(
                "cannot open queue '{}' for terminal event: {}",
                queue_name, e
            );
            return;
        }
    };
    loop {
        match queue.send(TERMINAL_PAYLOAD.as_bytes(), TERMINAL_PRIORITY) {
            Ok(()) => {
                info!("terminal event sent on '{}'", queue_name);
                return;
            }
            Err(ChannelError::WouldBlock) => {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            Err(e) => {
                warn!("terminal event send on '{}' failed: {}", queue_name, e);
                return;
            }
        }
    }
}
