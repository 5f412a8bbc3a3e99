use crate::credentials::CredentialStatus;
use crate::detail::DetailState;
use crate::results::{ResultsState, StatusLine};

/// Everything the dashboard shows, apart from the session, which the
/// terminal bridge owns. Only the dashboard event loop writes to it.
#[derive(Debug, Default)]
pub struct AppState {
    pub credential: CredentialStatus,
    pub results: ResultsState,
    pub detail: DetailState,
    pub status: Option<StatusLine>,
}
