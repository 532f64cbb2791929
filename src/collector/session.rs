use std::future::Future;
use std::time::Duration;

use nanoid::nanoid;
use tokio::io::unix::AsyncFd;
use tokio::io::Interest;
use tokio::time::sleep_until;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::channel::MessageQueue;
use crate::config::ChannelConfig;
use crate::protocol::is_terminal_payload;
use crate::ChannelError;
use crate::Result;
use crate::TraceError;

/// Lifecycle of one trace session, for log lines and assertions only; the
/// transitions live in [`TraceSession::collect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    ChannelOpen,
    SubprocessRunning,
    Draining,
}

/// One trace session: a freshly created queue under a session-unique name,
/// polled until the terminal event arrives.
///
/// The queue name carries a generated suffix, so concurrent sessions never
/// collide and no caller-side serialization is needed. The name is handed
/// to the build driver (and through it to every short-lived
/// compiler-wrapper process) out of band.
pub struct TraceSession {
    name: String,
    queue: AsyncFd<MessageQueue>,
    grace: Duration,
}

impl TraceSession {
    /// `Idle -> ChannelOpen`: create the queue. A name collision or
    /// resource exhaustion here is fatal before any subprocess starts.
    pub fn create(
        channel: &ChannelConfig,
        grace: Duration,
    ) -> Result<Self> {
        let name = format!("/{}-{}", channel.name_prefix, nanoid!(10));
        let queue = MessageQueue::create(&name, channel.max_message_size, channel.max_depth)?;
        let queue = AsyncFd::with_interest(queue, Interest::READABLE)
            .map_err(ChannelError::Io)?;
        debug!("trace session channel '{}' created", name);
        Ok(TraceSession {
            name,
            queue,
            grace,
        })
    }

    /// The well-known name producers attach to for this session
    pub fn queue_name(&self) -> &str {
        &self.name
    }

    /// Drive the session to completion: spawn the driver future, drain the
    /// queue one event at a time until the terminal event, and return the
    /// collected payloads in receipt order.
    ///
    /// The queue is unlinked on every exit path — terminal received,
    /// driver abandoned, interrupt — including when the driver could not
    /// start at all.
    pub async fn collect<F>(
        self,
        driver: F,
        shutdown: &CancellationToken,
    ) -> Result<Vec<String>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let name = self.name.clone();
        let result = self.drain(driver, shutdown).await;
        if let Err(e) = MessageQueue::unlink(&name) {
            warn!("failed to unlink trace queue '{}': {}", name, e);
        }
        result
    }

    async fn drain<F>(
        &self,
        driver: F,
        shutdown: &CancellationToken,
    ) -> Result<Vec<String>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut state = SessionState::ChannelOpen;
        debug!("session '{}': {:?}", self.name, state);
        let mut driver_handle = tokio::spawn(driver);
        state = SessionState::SubprocessRunning;
        debug!("session '{}': {:?}", self.name, state);

        let mut messages: Vec<String> = Vec::new();
        // Armed once the driver task finishes; the terminal event must
        // arrive before this deadline or the driver abandoned its contract.
        let mut abandon_deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                join = &mut driver_handle, if abandon_deadline.is_none() => {
                    if let Err(e) = join {
                        warn!("driver task aborted: {}", e);
                    }
                    state = SessionState::Draining;
                    debug!("session '{}': {:?}", self.name, state);
                    abandon_deadline = Some(Instant::now() + self.grace);
                }

                _ = sleep_until(abandon_deadline.unwrap_or_else(Instant::now)),
                        if abandon_deadline.is_some() => {
                    warn!(
                        "session '{}': driver finished but no terminal event within {:?}",
                        self.name, self.grace
                    );
                    return Err(TraceError::DriverAbandoned { waited: self.grace }.into());
                }

                guard = self.queue.readable() => {
                    let mut guard = guard.map_err(ChannelError::Io)?;
                    if !guard.ready().is_readable() {
                        warn!(
                            "session '{}': unrecognized readiness {:?}, ignoring",
                            self.name,
                            guard.ready()
                        );
                        guard.clear_ready();
                        continue;
                    }
                    match self.queue.get_ref().recv() {
                        Ok((payload, priority)) => {
                            if is_terminal_payload(&payload) {
                                info!(
                                    "session '{}': terminal event received, {} messages collected",
                                    self.name,
                                    messages.len()
                                );
                                return Ok(messages);
                            }
                            match String::from_utf8(payload) {
                                Ok(text) => {
                                    debug!(
                                        "session '{}': message at priority {}",
                                        self.name, priority
                                    );
                                    messages.push(text);
                                }
                                Err(_) => {
                                    warn!(
                                        "session '{}': non-UTF-8 payload skipped",
                                        self.name
                                    );
                                }
                            }
                        }
                        Err(ChannelError::WouldBlock) => {
                            guard.clear_ready();
                        }
                        Err(e) => return Err(e.into()),
                    }
                }

                _ = shutdown.cancelled() => {
                    warn!("session '{}' interrupted while {:?}", self.name, state);
                    return Err(TraceError::Interrupted.into());
                }
            }
        }
    }
}
