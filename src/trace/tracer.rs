use std::collections::HashMap;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::CommandInstaller;
use crate::collector::run_driver;
use crate::collector::Installer;
use crate::collector::TraceSession;
use crate::config::Settings;
use crate::constants::COMPILE_COMMANDS_FILE;
use crate::constants::RAW_LOG_FILE;
use crate::constants::TRACE_SPEC_FILE;
use crate::constants::TRACING_WRAPPER_NAME;
use crate::output::write_compile_commands;
use crate::output::write_json_document;
use crate::output::WrapperCache;
use crate::protocol::decode_payloads;
use crate::protocol::CompileCommand;
use crate::protocol::DecodePolicy;
use crate::protocol::TraceOutput;
use crate::AbstractSpec;
use crate::ConcreteSpec;
use crate::Concretizer;
use crate::Environment;
use crate::Error;
use crate::RestorePolicy;
use crate::Result;
use crate::SystemError;
use crate::TraceError;
use crate::substitute_wrapper;

/// Orchestrates whole trace attempts: concretize the tracing wrapper,
/// substitute it into each target spec, run one collector session per
/// build, and turn the drained events into compile-command documents.
///
/// Resolution and installation are external collaborators behind
/// [`Concretizer`] and [`Installer`]; this type owns only the sequencing
/// and the cleanup obligations around them.
pub struct Tracer {
    settings: Settings,
    concretizer: Arc<dyn Concretizer>,
    installer: Arc<dyn Installer>,
    shutdown: CancellationToken,
}

impl Tracer {
    pub fn new(
        settings: Settings,
        concretizer: Arc<dyn Concretizer>,
        installer: Arc<dyn Installer>,
        shutdown: CancellationToken,
    ) -> Self {
        Tracer {
            settings,
            concretizer,
            installer,
            shutdown,
        }
    }

    /// The concretized tracing wrapper, from cache when possible. A cache
    /// miss concretizes the wrapper request and stores the result for the
    /// next session.
    pub async fn wrapper_spec(&self) -> Result<Arc<ConcreteSpec>> {
        let cache = WrapperCache::new(
            self.settings.trace.use_cache,
            &self.settings.trace.cache_dir,
        );
        if let Some(cached) = cache.load().await? {
            return Ok(Arc::new(cached));
        }
        info!("concretizing '{}'", TRACING_WRAPPER_NAME);
        let spec = self
            .concretizer
            .concretize_one(&AbstractSpec::new(TRACING_WRAPPER_NAME))?;
        cache.store(&spec).await?;
        Ok(Arc::new(spec))
    }

    /// Trace a list of ad hoc spec requests, one collector session per
    /// spec, and write each spec's compile-command document under its
    /// source directory.
    ///
    /// A spec whose document already exists is skipped. A substitution or
    /// session failure on one spec never aborts the others; an external
    /// interrupt does, after cleanup. Returns the number of specs traced.
    pub async fn trace_specs(
        &self,
        requests: &[AbstractSpec],
    ) -> Result<usize> {
        if requests.is_empty() {
            return Ok(0);
        }
        let wrapper = self.wrapper_spec().await?;
        let pairs = self.resolve_requests(requests).await?;

        let mut traced = 0;
        let mut interrupted = false;
        for (request, concrete) in pairs {
            let destination = self.source_dir(&request).join(COMPILE_COMMANDS_FILE);
            if destination.exists() {
                info!(
                    "'{}' already traced at {}, skipping",
                    request,
                    destination.display()
                );
                continue;
            }

            let wrapped = match substitute_wrapper(&concrete, &wrapper) {
                Ok(spec) => Arc::new(spec),
                Err(e) => {
                    error!("cannot instrument '{}': {}", request, e);
                    continue;
                }
            };

            let result = self.trace_node(Arc::clone(&wrapped), destination).await;
            if let Err(e) = self.installer.uninstall_spec(Arc::clone(&wrapped)).await {
                warn!("failed to uninstall instrumented '{}': {}", wrapped.name, e);
            }
            match result {
                Ok(()) => traced += 1,
                Err(Error::Trace(TraceError::Interrupted)) => {
                    interrupted = true;
                    break;
                }
                Err(e) => error!("trace of '{}' failed: {}", request, e),
            }
        }

        if let Err(e) = self.installer.uninstall_spec(Arc::clone(&wrapper)).await {
            warn!("failed to uninstall '{}': {}", wrapper.name, e);
        }
        if interrupted {
            return Err(TraceError::Interrupted.into());
        }
        Ok(traced)
    }

    /// Trace the develop specs of a persisted environment in one shared
    /// collector session.
    ///
    /// Every develop spec is substituted in place (the resolver is never
    /// re-invoked), the whole environment is built once, and events are
    /// routed back per spec by content hash. The swaps are reversed
    /// afterward when `policy` says so. Returns the number of
    /// compile-command documents written.
    pub async fn trace_environment(
        &self,
        env: &mut Environment,
        policy: RestorePolicy,
    ) -> Result<usize> {
        let develop = env.develop_specs();
        if develop.is_empty() {
            return Err(Error::Fatal(
                "environment has no develop specs to trace".to_string(),
            ));
        }
        let wrapper = self.wrapper_spec().await?;

        let mut swaps = Vec::new();
        let mut wrapped_specs: Vec<Arc<ConcreteSpec>> = Vec::new();
        let mut destinations: HashMap<String, PathBuf> = HashMap::new();
        for (user, concrete) in develop {
            let wrapped = match substitute_wrapper(&concrete, &wrapper) {
                Ok(spec) => Arc::new(spec),
                Err(e) => {
                    error!("cannot instrument '{}': {}", user, e);
                    continue;
                }
            };
            let swap = match env.swap_concrete(&user, Arc::clone(&wrapped)) {
                Ok(swap) => swap,
                Err(e) => {
                    error!("cannot swap '{}' into the environment: {}", user, e);
                    continue;
                }
            };
            if let Some(dev_path) = &wrapped.dev_path {
                destinations.insert(
                    wrapped.dag_hash().to_string(),
                    dev_path.join(COMPILE_COMMANDS_FILE),
                );
            }
            swaps.push(swap);
            wrapped_specs.push(wrapped);
        }
        if wrapped_specs.is_empty() {
            return Err(Error::Fatal(
                "no develop spec could be instrumented".to_string(),
            ));
        }
        // Any concretized member may emit events during the shared build,
        // not just the instrumented ones.
        let known_keys: HashSet<String> =
            env.specs_by_hash().keys().cloned().collect();

        let session = TraceSession::create(
            &self.settings.channel,
            self.settings.trace.driver_grace_timeout(),
        )?;
        let queue_name = session.queue_name().to_string();
        info!(
            "tracing environment: {} instrumented develop specs on '{}'",
            wrapped_specs.len(),
            queue_name
        );
        let installer = Arc::clone(&self.installer);
        let snapshot = Arc::new(env.clone());
        let attach_name = queue_name.clone();
        let driver = run_driver(
            async move { installer.install_environment(snapshot, attach_name).await },
            queue_name,
        );
        let collected = session.collect(driver, &self.shutdown).await;

        let outcome = match collected {
            Ok(payloads) => {
                let messages = decode_payloads(&payloads);
                let by_spec = compile_commands_output(
                    DecodePolicy::CompileCommands { known_keys }.decode(messages),
                );
                let written = write_compile_commands(&by_spec, &destinations).await;
                info!(
                    "environment trace: {} compile-command documents written",
                    written
                );
                Ok(written)
            }
            Err(e) => Err(e),
        };

        for wrapped in &wrapped_specs {
            if let Err(e) = self.installer.uninstall_spec(Arc::clone(wrapped)).await {
                warn!("failed to uninstall instrumented '{}': {}", wrapped.name, e);
            }
        }
        if let Err(e) = self.installer.uninstall_spec(Arc::clone(&wrapper)).await {
            warn!("failed to uninstall '{}': {}", wrapper.name, e);
        }

        match policy {
            RestorePolicy::Restore => {
                for swap in swaps.into_iter().rev() {
                    let user = swap.user_spec().clone();
                    if let Err(e) = env.restore(swap) {
                        error!("failed to restore '{}': {}", user, e);
                    }
                }
            }
            RestorePolicy::Persist => {
                info!("instrumented specs left in the environment by policy");
            }
        }

        outcome
    }

    /// One collector session around one instrumented spec's build, ending
    /// in its compile-command document.
    async fn trace_node(
        &self,
        wrapped: Arc<ConcreteSpec>,
        destination: PathBuf,
    ) -> Result<()> {
        let session = TraceSession::create(
            &self.settings.channel,
            self.settings.trace.driver_grace_timeout(),
        )?;
        let queue_name = session.queue_name().to_string();
        info!("tracing '{}' on '{}'", wrapped.name, queue_name);

        let installer = Arc::clone(&self.installer);
        let spec = Arc::clone(&wrapped);
        let attach_name = queue_name.clone();
        let driver = run_driver(
            async move { installer.install_spec(spec, attach_name).await },
            queue_name,
        );
        let payloads = session.collect(driver, &self.shutdown).await?;

        let messages = decode_payloads(&payloads);
        let routing_key = wrapped.dag_hash().to_string();
        let by_spec = compile_commands_output(
            DecodePolicy::CompileCommands {
                known_keys: HashSet::from([routing_key.clone()]),
            }
            .decode(messages),
        );
        let destinations = HashMap::from([(routing_key, destination)]);
        let written = write_compile_commands(&by_spec, &destinations).await;
        info!(
            "'{}': {} compile-command documents written",
            wrapped.name, written
        );
        Ok(())
    }

    /// Turn abstract requests into concrete specs, reusing a persisted
    /// concretization per spec when one exists under the source root and
    /// persisting fresh ones for the next run. Multiple unresolved
    /// requests are concretized together.
    async fn resolve_requests(
        &self,
        requests: &[AbstractSpec],
    ) -> Result<Vec<(AbstractSpec, Arc<ConcreteSpec>)>> {
        let mut resolved: Vec<Option<Arc<ConcreteSpec>>> =
            Vec::with_capacity(requests.len());
        let mut pending: Vec<AbstractSpec> = Vec::new();
        for request in requests {
            let path = self.trace_spec_path(request);
            if path.exists() {
                let bytes = tokio::fs::read(&path).await.map_err(|source| {
                    SystemError::Io {
                        path: path.clone(),
                        source,
                    }
                })?;
                let spec: ConcreteSpec = serde_json::from_slice(&bytes)
                    .map_err(SystemError::Serialization)?;
                debug!(
                    "reusing persisted concretization for '{}' at {}",
                    request,
                    path.display()
                );
                resolved.push(Some(Arc::new(spec)));
            } else {
                pending.push(request.clone());
                resolved.push(None);
            }
        }

        let fresh = if pending.is_empty() {
            Vec::new()
        } else if pending.len() == 1 {
            vec![self.concretizer.concretize_one(&pending[0])?]
        } else {
            self.concretizer.concretize_together(&pending)?
        };
        let mut fresh = fresh.into_iter();

        let mut pairs = Vec::with_capacity(requests.len());
        for (request, slot) in requests.iter().zip(resolved) {
            let spec = match slot {
                Some(spec) => spec,
                None => {
                    let spec = fresh.next().ok_or_else(|| {
                        Error::Fatal(
                            "resolver returned fewer specs than requested".to_string(),
                        )
                    })?;
                    let path = self.trace_spec_path(request);
                    write_json_document(&path, &spec).await?;
                    Arc::new(spec)
                }
            };
            pairs.push((request.clone(), spec));
        }
        Ok(pairs)
    }

    fn source_dir(
        &self,
        request: &AbstractSpec,
    ) -> PathBuf {
        self.settings
            .trace
            .source_root
            .join(request_dir_name(request))
    }

    fn trace_spec_path(
        &self,
        request: &AbstractSpec,
    ) -> PathBuf {
        self.source_dir(request).join(TRACE_SPEC_FILE)
    }
}

/// Trace an arbitrary external command from the driver configuration,
/// preserving every event as a raw-log entry instead of extracting compile
/// commands. No resolver is involved; this is the binary's standalone
/// mode. Returns the path of the written log.
pub async fn trace_command(
    settings: &Settings,
    shutdown: &CancellationToken,
) -> Result<PathBuf> {
    let session = TraceSession::create(
        &settings.channel,
        settings.trace.driver_grace_timeout(),
    )?;
    let queue_name = session.queue_name().to_string();
    let runner = CommandInstaller::new(settings.driver.clone());
    let attach_name = queue_name.clone();
    let driver = run_driver(
        async move { runner.run(&attach_name).await },
        queue_name,
    );
    let payloads = session.collect(driver, shutdown).await?;

    let messages = decode_payloads(&payloads);
    let entries = match DecodePolicy::RawLog.decode(messages) {
        TraceOutput::RawLog(entries) => entries,
        TraceOutput::CompileCommands(_) => unreachable!(),
    };
    let dir = settings
        .driver
        .working_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let path = dir.join(RAW_LOG_FILE);
    write_json_document(&path, &entries).await?;
    info!(
        "{} raw trace entries written to {}",
        entries.len(),
        path.display()
    );
    Ok(path)
}

/// The package-name portion of a request, used as its directory under the
/// source root. Constraint syntax after the name is not part of the path.
fn request_dir_name(request: &AbstractSpec) -> String {
    request
        .0
        .split(['@', '%', '+', '~', '^', ' '])
        .next()
        .unwrap_or_default()
        .to_string()
}

fn compile_commands_output(output: TraceOutput) -> HashMap<String, Vec<CompileCommand>> {
    match output {
        TraceOutput::CompileCommands(by_spec) => by_spec,
        // A compile-commands policy never yields the raw-log shape.
        TraceOutput::RawLog(_) => unreachable!(),
    }
}
