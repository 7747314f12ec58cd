//! Backend wrapper running the provider as a child process.
//!
//! The child is owned by a supervisor task that forwards its output to the
//! log, reacts to termination and kill commands, and reports the exit back
//! to the wrapper. Requests and the backend's registration travel through
//! the injected [`BackendTransport`].

mod command;
mod config;
mod supervisor;

pub use command::{LaunchCommand, LaunchError, shell_escape, split_command_line};
pub use config::{
    DEFAULT_PLACEHOLDER, DEFAULT_PROVIDER_PATH, DEFAULT_STOP_TIMEOUT_MS, LauncherConfig,
    LauncherConfigError,
};

use crate::backend::{BackendCore, RegistrationOutcome};
use crate::backend::domain::{
    BackendIdentifier, BackendStatus, Capabilities, EndpointId, ErrorKind, OutboundRequest,
    RequestId,
};
use crate::backend::ports::{BackendCallbacks, BackendTransport, ProviderReplies};
use crate::backend::wrapper::BackendWrapper;
use crate::entity::{CompanyNode, Line, Station};
use async_trait::async_trait;
use mockable::Clock;
use std::collections::BTreeMap;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
pub use supervisor::BACKEND_OUTPUT_TARGET;
use supervisor::{Supervisor, SupervisorCommand};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Backend wrapper supervising a provider process.
pub struct ProcessBackend {
    core: BackendCore,
    config: Arc<LauncherConfig>,
    transport: Arc<dyn BackendTransport>,
    endpoint: EndpointId,
    control: Mutex<Option<mpsc::UnboundedSender<SupervisorCommand>>>,
    self_ref: Weak<Self>,
}

impl ProcessBackend {
    /// Creates a stopped process backend.
    #[must_use]
    pub fn new(
        identifier: BackendIdentifier,
        executable: impl Into<String>,
        arguments: BTreeMap<String, String>,
        config: Arc<LauncherConfig>,
        transport: Arc<dyn BackendTransport>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Arc<Self> {
        let endpoint = EndpointId::for_backend(&identifier);
        let core = BackendCore::new(identifier, executable, arguments, clock);
        Arc::new_cyclic(|self_ref| Self {
            core,
            config,
            transport,
            endpoint,
            control: Mutex::new(None),
            self_ref: self_ref.clone(),
        })
    }

    /// Returns the transport endpoint the process registers against.
    #[must_use]
    pub const fn endpoint(&self) -> &EndpointId {
        &self.endpoint
    }

    /// Called by the supervisor once the child has exited on its own.
    fn process_exited(&self, exit: &std::process::ExitStatus) {
        *self.control() = None;
        self.transport.unregister_endpoint(&self.endpoint);

        match self.core.status() {
            BackendStatus::Stopping => {
                info!(backend = %self.core.identifier(), %exit, "backend stopped");
                self.core.set_status(BackendStatus::Stopped);
            }
            BackendStatus::Invalid => {
                debug!(backend = %self.core.identifier(), %exit, "invalid backend exited");
            }
            _ if exit.success() => {
                info!(backend = %self.core.identifier(), %exit, "backend exited");
                self.core.set_status(BackendStatus::Stopped);
            }
            _ => {
                self.core
                    .fail(format!("Backend process exited unexpectedly ({exit})"));
            }
        }
    }

    fn spawn_process(&self) -> Result<(), String> {
        let command = LaunchCommand::build(
            &self.config,
            self.core.executable(),
            self.core.arguments(),
            &self.endpoint,
        )
        .map_err(|err| format!("Cannot build backend command line: {err}"))?;

        info!(
            backend = %self.core.identifier(),
            command = %command,
            "launching backend"
        );

        let mut process = Command::new(command.program());
        process
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(directory) = self.config.working_directory() {
            process.current_dir(directory);
        }

        let child = process
            .spawn()
            .map_err(|err| format!("Cannot start backend process: {err}"))?;

        let (sender, receiver) = mpsc::unbounded_channel();
        *self.control() = Some(sender);
        let supervisor = Supervisor::new(
            self.core.identifier().clone(),
            child,
            receiver,
            self.self_ref.clone(),
        );
        tokio::spawn(supervisor.run());
        Ok(())
    }

    fn control(&self) -> MutexGuard<'_, Option<mpsc::UnboundedSender<SupervisorCommand>>> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl BackendWrapper for ProcessBackend {
    fn core(&self) -> &BackendCore {
        &self.core
    }

    async fn launch(&self) {
        let status = self.core.status();
        if status != BackendStatus::Stopped {
            warn!(
                backend = %self.core.identifier(),
                %status,
                "ignoring launch of a backend that is not stopped"
            );
            return;
        }

        let callbacks: Weak<dyn BackendCallbacks> = self.self_ref.clone();
        if let Err(err) = self.transport.register_endpoint(&self.endpoint, callbacks) {
            self.core
                .fail(format!("Cannot register transport endpoint: {err}"));
            return;
        }

        self.core.set_status(BackendStatus::Launching);
        if let Err(message) = self.spawn_process() {
            self.transport.unregister_endpoint(&self.endpoint);
            self.core.fail(message);
        }
    }

    async fn stop(&self) {
        let status = self.core.status();
        if !status.can_stop() {
            debug!(
                backend = %self.core.identifier(),
                %status,
                "ignoring stop of a backend that is not running"
            );
            return;
        }

        let control = self.control().clone();
        let Some(sender) = control else {
            self.transport.unregister_endpoint(&self.endpoint);
            self.core.set_status(BackendStatus::Stopped);
            return;
        };

        self.core.set_status(BackendStatus::Stopping);
        info!(backend = %self.core.identifier(), "stopping backend");
        if sender.send(SupervisorCommand::Terminate).is_err() {
            debug!(
                backend = %self.core.identifier(),
                "supervisor already finished"
            );
        }
    }

    async fn kill(&self) {
        if self.core.status() == BackendStatus::Stopped {
            return;
        }

        let control = self.control().take();
        if let Some(sender) = control {
            let (acknowledge, acknowledged) = oneshot::channel();
            if sender.send(SupervisorCommand::Kill(acknowledge)).is_ok()
                && acknowledged.await.is_err()
            {
                debug!(
                    backend = %self.core.identifier(),
                    "supervisor finished before acknowledging kill"
                );
            }
        }

        self.transport.unregister_endpoint(&self.endpoint);
        info!(backend = %self.core.identifier(), "backend killed");
        self.core.set_status(BackendStatus::Stopped);
    }

    fn forward(&self, request: OutboundRequest) {
        let request_id = request.request_id();
        let status = self.core.status();
        if !status.accepts_requests() {
            self.core.register_error(
                request_id,
                ErrorKind::Other,
                format!("Backend is not launched (status: {status})"),
            );
            return;
        }

        if let Err(err) = self.transport.send(&self.endpoint, request) {
            warn!(
                backend = %self.core.identifier(),
                request = %request_id,
                error = %err,
                "cannot deliver request"
            );
            self.core.fail(format!("Cannot deliver request: {err}"));
        }
    }
}

impl ProviderReplies for ProcessBackend {
    fn error_retrieved(&self, request: RequestId, kind: ErrorKind, message: String) {
        self.core.register_error(request, kind, message);
    }

    fn suggested_stations_retrieved(&self, request: RequestId, stations: Vec<Station>) {
        self.core.register_suggested_stations(request, stations);
    }

    fn suggested_lines_retrieved(&self, request: RequestId, lines: Vec<Line>) {
        self.core.register_suggested_lines(request, lines);
    }

    fn rides_from_station_retrieved(&self, request: RequestId, companies: Vec<CompanyNode>) {
        self.core.register_rides_from_station(request, companies);
    }
}

#[async_trait]
impl BackendCallbacks for ProcessBackend {
    async fn register_backend(&self, capabilities: Capabilities, copyright: String) {
        match self.core.accept_registration(capabilities, copyright) {
            RegistrationOutcome::Accepted => {
                info!(backend = %self.core.identifier(), "backend launched");
            }
            RegistrationOutcome::Rejected(reason) => {
                self.kill().await;
                self.core.fail(reason);
            }
            RegistrationOutcome::Ignored => {}
        }
    }
}

impl std::fmt::Debug for ProcessBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessBackend")
            .field("core", &self.core)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}
