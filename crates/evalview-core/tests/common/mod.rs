#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

use evalview_core::api::{
    ApiError, CheckResponse, DashboardApi, DetailResponse, FetchResultsResponse, SyncResponse,
};
use evalview_core::config::EvalviewConfig;
use evalview_core::dashboard::{Command, Dashboard, ViewUpdate};
use evalview_core::results::JobId;
use evalview_core::session::{
    ChannelError, ChannelEvent, OutboundEvent, SessionId, TerminalChannel,
};

pub const EXPECTED_ACCOUNT: &str = "620778743555";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Sync(Option<String>),
    Check(Option<String>),
    Fetch {
        job_id: String,
        session: Option<String>,
    },
    Detail {
        job_id: String,
        filename: String,
        session: Option<String>,
    },
}

/// In-memory backend with optional gates that hold a response until the
/// test releases it.
pub struct FakeApi {
    pub calls: Mutex<Vec<Call>>,
    pub sync_result: Mutex<Result<SyncResponse, ApiError>>,
    pub check_result: Mutex<Result<CheckResponse, ApiError>>,
    pub sync_gate: Mutex<Option<Arc<Notify>>>,
    pub results: Mutex<HashMap<String, Result<FetchResultsResponse, ApiError>>>,
    pub fetch_gates: Mutex<HashMap<String, Arc<Notify>>>,
    pub details: Mutex<HashMap<String, Result<DetailResponse, ApiError>>>,
    pub detail_gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            sync_result: Mutex::new(Ok(SyncResponse {
                success: true,
                count: Some(3),
                error: None,
            })),
            check_result: Mutex::new(Ok(CheckResponse {
                success: true,
                account: Some(EXPECTED_ACCOUNT.to_string()),
                ..Default::default()
            })),
            sync_gate: Mutex::new(None),
            results: Mutex::new(HashMap::new()),
            fetch_gates: Mutex::new(HashMap::new()),
            details: Mutex::new(HashMap::new()),
            detail_gates: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_results(self, job_id: &str, body: &str) -> Self {
        let resp: FetchResultsResponse = serde_json::from_str(body).unwrap();
        self.results
            .lock()
            .unwrap()
            .insert(job_id.to_string(), Ok(resp));
        self
    }

    pub fn with_detail(self, filename: &str, body: &str) -> Self {
        let resp: DetailResponse = serde_json::from_str(body).unwrap();
        self.details
            .lock()
            .unwrap()
            .insert(filename.to_string(), Ok(resp));
        self
    }

    pub fn gate_sync(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.sync_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn gate_fetch(&self, job_id: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.fetch_gates
            .lock()
            .unwrap()
            .insert(job_id.to_string(), Arc::clone(&gate));
        gate
    }

    pub fn gate_detail(&self, filename: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.detail_gates
            .lock()
            .unwrap()
            .insert(filename.to_string(), Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Fetch { .. }))
            .count()
    }
}

fn sid(session_id: Option<&SessionId>) -> Option<String> {
    session_id.map(|s| s.as_str().to_string())
}

#[async_trait]
impl DashboardApi for FakeApi {
    async fn sync_credentials(
        &self,
        session_id: Option<&SessionId>,
    ) -> Result<SyncResponse, ApiError> {
        self.calls.lock().unwrap().push(Call::Sync(sid(session_id)));
        let gate = self.sync_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.sync_result.lock().unwrap().clone()
    }

    async fn check_credentials(
        &self,
        session_id: Option<&SessionId>,
    ) -> Result<CheckResponse, ApiError> {
        self.calls.lock().unwrap().push(Call::Check(sid(session_id)));
        self.check_result.lock().unwrap().clone()
    }

    async fn fetch_results(
        &self,
        job_id: &JobId,
        session_id: Option<&SessionId>,
    ) -> Result<FetchResultsResponse, ApiError> {
        self.calls.lock().unwrap().push(Call::Fetch {
            job_id: job_id.to_string(),
            session: sid(session_id),
        });
        let gate = self.fetch_gates.lock().unwrap().get(job_id.as_str()).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.results
            .lock()
            .unwrap()
            .get(job_id.as_str())
            .cloned()
            .unwrap_or(Err(ApiError::Status { status: 404 }))
    }

    async fn get_result_detail(
        &self,
        job_id: &JobId,
        filename: &str,
        session_id: Option<&SessionId>,
    ) -> Result<DetailResponse, ApiError> {
        self.calls.lock().unwrap().push(Call::Detail {
            job_id: job_id.to_string(),
            filename: filename.to_string(),
            session: sid(session_id),
        });
        let gate = self.detail_gates.lock().unwrap().get(filename).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.details
            .lock()
            .unwrap()
            .get(filename)
            .cloned()
            .unwrap_or(Err(ApiError::Status { status: 404 }))
    }
}

/// Channel that records what the bridge sends.
#[derive(Clone, Default)]
pub struct FakeChannel {
    pub connected: Arc<AtomicBool>,
    pub sent: Arc<Mutex<Vec<OutboundEvent>>>,
}

impl FakeChannel {
    pub fn sent(&self) -> Vec<OutboundEvent> {
        self.sent.lock().unwrap().clone()
    }
}

impl TerminalChannel for FakeChannel {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn send(&self, event: OutboundEvent) -> Result<(), ChannelError> {
        self.sent.lock().unwrap().push(event);
        Ok(())
    }
}

pub struct Harness {
    pub api: Arc<FakeApi>,
    pub channel: FakeChannel,
    pub events: mpsc::Sender<ChannelEvent>,
    pub commands: mpsc::Sender<Command>,
    pub updates: mpsc::UnboundedReceiver<ViewUpdate>,
    pub task: JoinHandle<()>,
}

impl Harness {
    pub fn start(api: FakeApi) -> Self {
        let api = Arc::new(api);
        let channel = FakeChannel::default();
        let (dashboard, updates) = Dashboard::new(
            Arc::clone(&api) as Arc<dyn DashboardApi>,
            Box::new(channel.clone()),
            &EvalviewConfig::default(),
        );
        let (events, events_rx) = mpsc::channel(64);
        let (commands, commands_rx) = mpsc::channel(64);
        let task = tokio::spawn(dashboard.run(events_rx, commands_rx));
        Self {
            api,
            channel,
            events,
            commands,
            updates,
            task,
        }
    }

    pub async fn connect(&mut self, session_id: &str) {
        self.channel.connected.store(true, Ordering::SeqCst);
        self.events
            .send(ChannelEvent::Connected {
                session_id: SessionId::new(session_id),
            })
            .await
            .unwrap();
        self.wait_for(|u| matches!(u, ViewUpdate::SessionConnected(_)))
            .await;
    }

    pub async fn command(&self, command: Command) {
        self.commands.send(command).await.unwrap();
    }

    pub async fn wait_for<F>(&mut self, pred: F) -> ViewUpdate
    where
        F: Fn(&ViewUpdate) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let update = self.updates.recv().await.expect("dashboard stopped");
                if pred(&update) {
                    return update;
                }
            }
        })
        .await
        .expect("timed out waiting for view update")
    }
}

/// Give spawned tasks a chance to run.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
