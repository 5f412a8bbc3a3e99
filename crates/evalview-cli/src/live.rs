use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use evalview_core::api::{DashboardApi, HttpApi};
use evalview_core::config::EvalviewConfig;
use evalview_core::credentials::{CredentialState, CredentialStatus};
use evalview_core::dashboard::{Command, Dashboard, ViewUpdate};
use evalview_core::session::{SessionId, WsChannel};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const COMMAND_QUEUE: usize = 256;

/// A running dashboard attached to the backend, driven from the command line.
pub struct LiveDashboard {
    commands: mpsc::Sender<Command>,
    updates: mpsc::UnboundedReceiver<ViewUpdate>,
    task: JoinHandle<()>,
    pub session_id: SessionId,
}

impl LiveDashboard {
    /// Open the terminal channel, start the event loop and wait until the
    /// server has assigned a session id.
    pub async fn connect(config: &EvalviewConfig) -> Result<Self> {
        let url = config.server.socket_url();
        let api = HttpApi::new(&config.server).context("failed to build HTTP client")?;
        let (channel, channel_events) = WsChannel::connect(&url)
            .await
            .with_context(|| format!("failed to open terminal channel at {url}"))?;

        let (dashboard, updates) = Dashboard::new(
            Arc::new(api) as Arc<dyn DashboardApi>,
            Box::new(channel),
            config,
        );
        let (commands, commands_rx) = mpsc::channel(COMMAND_QUEUE);
        let task = tokio::spawn(dashboard.run(channel_events, commands_rx));

        let mut live = Self {
            commands,
            updates,
            task,
            session_id: SessionId::new(""),
        };
        let update = tokio::time::timeout(
            CONNECT_TIMEOUT,
            live.wait_for(|u| {
                matches!(
                    u,
                    ViewUpdate::SessionConnected(_) | ViewUpdate::SessionDisconnected { .. }
                )
            }),
        )
        .await
        .context("timed out waiting for a session id")??;

        match update {
            ViewUpdate::SessionConnected(session_id) => {
                tracing::info!(session_id = %session_id, "terminal session established");
                live.session_id = session_id;
                Ok(live)
            }
            ViewUpdate::SessionDisconnected { reason } => bail!(
                "terminal channel closed before a session was assigned: {}",
                reason.as_deref().unwrap_or("no reason given")
            ),
            _ => unreachable!("filtered by wait_for"),
        }
    }

    pub async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .context("dashboard loop is no longer running")
    }

    pub async fn next_update(&mut self) -> Option<ViewUpdate> {
        self.updates.recv().await
    }

    /// Skip updates until one matches `pred`.
    pub async fn wait_for<F>(&mut self, pred: F) -> Result<ViewUpdate>
    where
        F: Fn(&ViewUpdate) -> bool,
    {
        while let Some(update) = self.updates.recv().await {
            if pred(&update) {
                return Ok(update);
            }
        }
        bail!("dashboard stopped unexpectedly")
    }

    /// Wait for the credential check started on connect to settle.
    pub async fn credentials(&mut self) -> Result<CredentialStatus> {
        let update = self
            .wait_for(|u| {
                matches!(u, ViewUpdate::Credential(s) if s.state != CredentialState::Checking)
            })
            .await?;
        match update {
            ViewUpdate::Credential(status) => Ok(status),
            _ => unreachable!("filtered by wait_for"),
        }
    }

    /// Stop the loop and wait for it to finish.
    pub async fn shutdown(self) {
        drop(self.commands);
        if let Err(err) = self.task.await {
            tracing::warn!(error = %err, "dashboard task ended abnormally");
        }
    }
}
