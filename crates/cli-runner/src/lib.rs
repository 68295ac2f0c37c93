//! Runs a single CLI command on a tokio runtime until it finishes or the user interrupts it.

use std::{future::Future, time::Duration};

use tokio::runtime::{Handle, Runtime};
use tracing::{debug, trace};

/// How long to wait for spawned tasks after the command is done.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Executes CLI commands on a multi-thread tokio runtime.
#[derive(Debug)]
pub struct CliRunner {
    tokio_runtime: Runtime,
}

impl CliRunner {
    pub fn try_default_runtime() -> std::io::Result<Self> {
        Ok(Self {
            tokio_runtime: tokio_runtime()?,
        })
    }

    /// Runs the command until completion, ctrl-c or SIGTERM.
    ///
    /// An interrupted command is not an error.
    pub fn run_command_until_exit<F, E>(self, command: impl FnOnce(CliContext) -> F) -> Result<(), E>
    where
        F: Future<Output = Result<(), E>>,
        E: Send + Sync + From<std::io::Error> + 'static,
    {
        let context = CliContext {
            handle: self.tokio_runtime.handle().clone(),
        };

        let result = self.tokio_runtime.block_on(run_until_ctrl_c(command(context)));

        // The runtime must not be dropped on an async context.
        let tokio_runtime = self.tokio_runtime;
        std::thread::spawn(move || {
            debug!(target: "safe_deleter::cli", "Shutting down tokio runtime");
            tokio_runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
        })
        .join()
        .ok();

        result
    }
}

/// Context handed to every command.
#[derive(Debug, Clone)]
pub struct CliContext {
    handle: Handle,
}

impl CliContext {
    /// Handle of the runtime driving the command.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }
}

pub fn tokio_runtime() -> std::io::Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread().enable_all().build()
}

async fn run_until_ctrl_c<F, E>(fut: F) -> Result<(), E>
where
    F: Future<Output = Result<(), E>>,
    E: Send + Sync + 'static + From<std::io::Error>,
{
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut stream = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        let sigterm = stream.recv();
        tokio::pin!(sigterm, ctrl_c, fut);

        tokio::select! {
            _ = ctrl_c => {
                trace!(target: "safe_deleter::cli", "Received ctrl-c");
            },
            _ = sigterm => {
                trace!(target: "safe_deleter::cli", "Received SIGTERM");
            },
            res = fut => res?,
        }
    }

    #[cfg(not(unix))]
    {
        tokio::pin!(ctrl_c, fut);

        tokio::select! {
            _ = ctrl_c => {
                trace!(target: "safe_deleter::cli", "Received ctrl-c");
            },
            res = fut => res?,
        }
    }

    Ok(())
}
