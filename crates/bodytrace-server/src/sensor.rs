//! Supervision of the remote segmentation sensor process.
//!
//! The sensor runs on an edge board reachable over ssh. It is started once
//! the frames channel is listening, its output is forwarded into the server
//! log, and it is killed on the remote host when the server shuts down so a
//! crashed server never leaves a camera process running.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

use crate::ServerError;

/// Handle on the remote sensor process.
pub struct SensorSupervisor {
    host: String,
    kill_pattern: String,
    child: Child,
}

impl SensorSupervisor {
    /// Launches `command` on `host` over ssh and starts forwarding its
    /// output to the log. `kill_pattern` identifies the remote process for
    /// `pkill -f` at shutdown.
    ///
    /// # Errors
    ///
    /// Fails when the local ssh client cannot be spawned.
    pub fn spawn(host: &str, command: &str, kill_pattern: &str) -> Result<Self, ServerError> {
        let mut child = Command::new("ssh")
            .arg(host)
            .arg(command)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(stdout) = child.stdout.take() {
            forward_lines(stdout, false);
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(stderr, true);
        }

        tracing::info!(host, "sensor process started");
        Ok(Self {
            host: host.to_string(),
            kill_pattern: kill_pattern.to_string(),
            child,
        })
    }

    /// Stops the ssh session and kills the process on the remote host.
    pub async fn shutdown(mut self) {
        if let Err(err) = self.child.kill().await {
            tracing::warn!(error = %err, "failed to stop sensor ssh session");
        }

        // The ssh session dying does not stop the remote process; kill it
        // by its command line on the board itself.
        let result = Command::new("ssh")
            .arg(&self.host)
            .arg(format!("pkill -f '{}'", self.kill_pattern))
            .status()
            .await;

        match result {
            Ok(status) if status.success() => {
                tracing::info!(host = %self.host, "sensor process stopped");
            }
            Ok(status) => {
                tracing::warn!(host = %self.host, %status, "remote sensor kill exited nonzero");
            }
            Err(err) => {
                tracing::warn!(host = %self.host, error = %err, "failed to reach sensor host");
            }
        }
    }
}

/// Forwards one output stream of the sensor process into the log.
fn forward_lines(stream: impl tokio::io::AsyncRead + Unpin + Send + 'static, is_stderr: bool) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if is_stderr {
                tracing::warn!(target: "sensor", "{line}");
            } else {
                tracing::info!(target: "sensor", "{line}");
            }
        }
    });
}
