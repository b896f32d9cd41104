use std::sync::Arc;

use tokio::sync::Mutex;

use common::gateway::VisionGateway;
use common::staging::StagingStore;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Single-writer discipline: `reset` + `stage` is one transition and
    /// analysis snapshots the batch under this same lock.
    pub staging: Arc<Mutex<StagingStore>>,
    /// Built once at startup and injected, so tests substitute a fake
    /// gateway without touching global state.
    pub gateway: Arc<dyn VisionGateway>,
    /// Held (try-lock) for the duration of one analysis call; a second
    /// trigger while it is taken is rejected instead of firing a duplicate
    /// billable request.
    pub analysis_gate: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: AppConfig, gateway: Arc<dyn VisionGateway>) -> Self {
        let staging = StagingStore::new(&config.staging.dir);
        Self {
            config: Arc::new(config),
            staging: Arc::new(Mutex::new(staging)),
            gateway,
            analysis_gate: Arc::new(Mutex::new(())),
        }
    }
}
