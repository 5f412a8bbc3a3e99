//! The event-handling core.
//!
//! [`Dashboard`] is the single writer of [`AppState`]. It multiplexes channel
//! events, operator [`Command`]s and network completions on one task.
//! Requests run on spawned tasks that never touch state; they report back
//! through an internal queue, so a pending request never stalls terminal
//! output. There is no cancellation: when two requests race, whichever
//! answer arrives last is what the operator sees. A detail modal belongs to
//! one job and closes when that job's table is replaced.

mod messages;
mod state;

pub use messages::{Command, ViewUpdate};
pub use state::AppState;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::api::DashboardApi;
use crate::config::EvalviewConfig;
use crate::credentials::{self, ExpectedIdentity};
use crate::detail::{self, DetailModal};
use crate::results::{self, JobId, StatusLine};
use crate::session::{
    BridgeUpdate, ChannelEvent, Session, SessionId, TerminalBridge, TerminalChannel, Viewport,
};

use messages::Completion;

pub struct Dashboard {
    api: Arc<dyn DashboardApi>,
    bridge: TerminalBridge,
    expected: ExpectedIdentity,
    state: AppState,
    updates: mpsc::UnboundedSender<ViewUpdate>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: Option<mpsc::UnboundedReceiver<Completion>>,
}

impl Dashboard {
    /// Build a dashboard around `channel`. The returned receiver carries
    /// every [`ViewUpdate`] for presentation.
    pub fn new(
        api: Arc<dyn DashboardApi>,
        channel: Box<dyn TerminalChannel>,
        config: &EvalviewConfig,
    ) -> (Self, mpsc::UnboundedReceiver<ViewUpdate>) {
        let (updates, updates_rx) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let viewport = Viewport {
            rows: config.terminal.rows,
            cols: config.terminal.cols,
        };

        let dashboard = Self {
            api,
            bridge: TerminalBridge::new(channel, viewport),
            expected: ExpectedIdentity::from(&config.credentials),
            state: AppState::default(),
            updates,
            completions_tx,
            completions_rx: Some(completions_rx),
        };
        (dashboard, updates_rx)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.bridge.session()
    }

    /// Drive the dashboard until the command stream closes.
    ///
    /// The channel event stream may end earlier (the socket went away); the
    /// loop keeps serving commands and completions after that.
    pub async fn run(
        mut self,
        mut channel_events: mpsc::Receiver<ChannelEvent>,
        mut commands: mpsc::Receiver<Command>,
    ) {
        let Some(mut completions) = self.completions_rx.take() else {
            return;
        };
        let mut channel_open = true;

        loop {
            tokio::select! {
                event = channel_events.recv(), if channel_open => match event {
                    Some(event) => self.handle_channel_event(event),
                    None => {
                        debug!("channel event stream ended");
                        channel_open = false;
                    }
                },
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(done) = completions.recv() => self.handle_completion(done),
            }
        }
        debug!("dashboard loop stopped");
    }

    pub fn handle_channel_event(&mut self, event: ChannelEvent) {
        match self.bridge.handle_event(event) {
            BridgeUpdate::Connected(session) => {
                self.publish(ViewUpdate::SessionConnected(session.id.clone()));
                self.start_credential_sync(session.id);
            }
            BridgeUpdate::Output(data) => self.publish(ViewUpdate::TerminalOutput(data)),
            BridgeUpdate::Disconnected { reason } => {
                self.publish(ViewUpdate::SessionDisconnected { reason });
            }
        }
    }

    pub fn handle_command(&mut self, command: Command) {
        match command {
            Command::Keystroke(data) => self.bridge.keystroke(&data),
            Command::Resize(viewport) => self.bridge.resize(viewport),
            Command::RefreshCredentials => match self.bridge.session_id().cloned() {
                Some(session_id) => self.start_credential_sync(session_id),
                None => debug!("credential refresh ignored, no live session"),
            },
            Command::RequestResults(input) => self.request_results(&input),
            Command::RequestDetail(filename) => self.request_detail(filename),
            Command::CloseDetail => self.close_detail(),
            Command::Key(key) => {
                if self.state.detail.handle_key(key) {
                    self.publish(ViewUpdate::Detail(DetailModal::Closed));
                }
            }
            Command::Sort(order) => {
                if self.state.results.sort_by(order) {
                    self.publish(ViewUpdate::Results(self.state.results.panel().clone()));
                }
            }
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Credential(status) => {
                self.state.credential = status.clone();
                self.publish(ViewUpdate::Credential(status));
            }
            Completion::Results { job_id, outcome } => {
                let status = self.state.results.apply(&job_id, outcome);
                self.set_status(status);
                if self
                    .state
                    .detail
                    .close_if_stale(self.state.results.current_job())
                {
                    self.publish(ViewUpdate::Detail(DetailModal::Closed));
                }
                self.publish(ViewUpdate::Results(self.state.results.panel().clone()));
                self.publish(ViewUpdate::Busy(self.state.results.in_flight()));
            }
            Completion::Detail {
                job_id,
                filename,
                outcome,
            } => {
                if self.state.detail.apply(&job_id, &filename, outcome) {
                    self.publish(ViewUpdate::Detail(self.state.detail.modal().clone()));
                }
            }
        }
    }

    fn start_credential_sync(&self, session_id: SessionId) {
        info!(session_id = %session_id, "starting credential synchronization");
        let api = Arc::clone(&self.api);
        let expected = self.expected.clone();
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            credentials::synchronize(api.as_ref(), &session_id, &expected, |status| {
                let _ = tx.send(Completion::Credential(status));
            })
            .await;
        });
    }

    fn request_results(&mut self, input: &str) {
        let job_id = match JobId::parse(input) {
            Ok(job_id) => job_id,
            Err(err) => {
                debug!(input, error = %err, "job id rejected locally");
                self.set_status(StatusLine::error(err.to_string()));
                return;
            }
        };

        let status = self.state.results.begin_fetch(&job_id);
        self.set_status(status);
        self.publish(ViewUpdate::Busy(self.state.results.in_flight()));

        let api = Arc::clone(&self.api);
        let session_id = self.bridge.session_id().cloned();
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let outcome = results::fetch_results(api.as_ref(), &job_id, session_id.as_ref()).await;
            let _ = tx.send(Completion::Results { job_id, outcome });
        });
    }

    fn request_detail(&mut self, filename: String) {
        let job_id = match self
            .state
            .detail
            .open(self.state.results.current_job(), &filename)
        {
            Ok(job_id) => job_id,
            Err(err) => {
                debug!(filename, error = %err, "detail request refused");
                self.set_status(StatusLine::error(err.to_string()));
                return;
            }
        };
        self.publish(ViewUpdate::Detail(self.state.detail.modal().clone()));

        let api = Arc::clone(&self.api);
        let session_id = self.bridge.session_id().cloned();
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let outcome =
                detail::fetch_detail(api.as_ref(), &job_id, &filename, session_id.as_ref()).await;
            let _ = tx.send(Completion::Detail {
                job_id,
                filename,
                outcome,
            });
        });
    }

    fn close_detail(&mut self) {
        if self.state.detail.close() {
            self.publish(ViewUpdate::Detail(DetailModal::Closed));
        }
    }

    fn set_status(&mut self, status: StatusLine) {
        self.state.status = Some(status.clone());
        self.publish(ViewUpdate::Status(status));
    }

    fn publish(&self, update: ViewUpdate) {
        if self.updates.send(update).is_err() {
            debug!("no presenter attached, view update dropped");
        }
    }
}
