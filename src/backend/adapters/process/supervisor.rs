//! Task owning a backend child process.

use super::ProcessBackend;
use crate::backend::domain::BackendIdentifier;
use std::sync::Weak;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Log target for lines printed by backend processes.
pub const BACKEND_OUTPUT_TARGET: &str = "transit_hub::backend_output";

/// Instruction sent from a wrapper to its supervisor.
#[derive(Debug)]
pub enum SupervisorCommand {
    /// Ask the process to terminate.
    Terminate,
    /// Kill the process and acknowledge once it has exited.
    Kill(oneshot::Sender<()>),
}

pub struct Supervisor {
    backend: BackendIdentifier,
    child: Child,
    commands: mpsc::UnboundedReceiver<SupervisorCommand>,
    owner: Weak<ProcessBackend>,
}

impl Supervisor {
    pub const fn new(
        backend: BackendIdentifier,
        child: Child,
        commands: mpsc::UnboundedReceiver<SupervisorCommand>,
        owner: Weak<ProcessBackend>,
    ) -> Self {
        Self {
            backend,
            child,
            commands,
            owner,
        }
    }

    pub async fn run(mut self) {
        if let Some(stdout) = self.child.stdout.take() {
            tokio::spawn(forward_output(self.backend.clone(), "stdout", stdout));
        }
        if let Some(stderr) = self.child.stderr.take() {
            tokio::spawn(forward_output(self.backend.clone(), "stderr", stderr));
        }

        loop {
            tokio::select! {
                exit = self.child.wait() => {
                    match exit {
                        Ok(status) => {
                            if let Some(owner) = self.owner.upgrade() {
                                owner.process_exited(&status);
                            }
                        }
                        Err(err) => {
                            warn!(backend = %self.backend, error = %err, "cannot wait for backend process");
                        }
                    }
                    return;
                }
                command = self.commands.recv() => {
                    match command {
                        Some(SupervisorCommand::Terminate) => self.terminate(),
                        Some(SupervisorCommand::Kill(acknowledge)) => {
                            self.kill().await;
                            if acknowledge.send(()).is_err() {
                                debug!(backend = %self.backend, "kill requester went away");
                            }
                            return;
                        }
                        None => {
                            self.kill().await;
                            return;
                        }
                    }
                }
            }
        }
    }

    async fn kill(&mut self) {
        if let Err(err) = self.child.kill().await {
            warn!(backend = %self.backend, error = %err, "cannot kill backend process");
        }
    }

    #[cfg(unix)]
    fn terminate(&mut self) {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        let Some(pid) = self.child.id().and_then(|id| i32::try_from(id).ok()) else {
            debug!(backend = %self.backend, "backend process already exited");
            return;
        };
        if let Err(err) = kill(Pid::from_raw(pid), Signal::SIGTERM) {
            warn!(backend = %self.backend, error = %err, "cannot signal backend process");
        }
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) {
        if let Err(err) = self.child.start_kill() {
            warn!(backend = %self.backend, error = %err, "cannot terminate backend process");
        }
    }
}

async fn forward_output<R>(backend: BackendIdentifier, stream: &'static str, output: R)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(output).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                debug!(target: BACKEND_OUTPUT_TARGET, backend = %backend, stream, "{line}");
            }
            Ok(None) => return,
            Err(err) => {
                debug!(
                    target: BACKEND_OUTPUT_TARGET,
                    backend = %backend,
                    stream,
                    error = %err,
                    "cannot read backend output"
                );
                return;
            }
        }
    }
}
