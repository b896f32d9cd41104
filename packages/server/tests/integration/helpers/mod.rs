use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use common::gateway::{GatewayConfig, GatewayError, VisionGateway};
use common::pipeline::LoadPolicy;
use common::request::{AnalysisRequest, RequestPart};
use server::config::{AnalysisConfig, AppConfig, CorsConfig, ServerConfig, StagingConfig};
use server::state::AppState;

/// Scripted behavior for the fake gateway.
pub enum Script {
    Succeed { text: String, delay: Duration },
    FailTransport { delay: Duration },
}

/// Fake [`VisionGateway`] that follows a script and records every request.
pub struct ScriptedGateway {
    script: Script,
    pub calls: AtomicUsize,
    /// Shape of each received request: `text:<instruction>` and
    /// `media:<filename>` markers, in order.
    pub requests: Mutex<Vec<Vec<String>>>,
}

impl ScriptedGateway {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionGateway for ScriptedGateway {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<String, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let shape = request
            .parts()
            .iter()
            .map(|p| match p {
                RequestPart::Text(_) => "text".to_string(),
                RequestPart::Media(m) => format!("media:{}", m.filename),
            })
            .collect();
        self.requests.lock().unwrap().push(shape);

        match &self.script {
            Script::Succeed { text, delay } => {
                if !delay.is_zero() {
                    tokio::time::sleep(*delay).await;
                }
                Ok(text.clone())
            }
            Script::FailTransport { delay } => {
                if !delay.is_zero() {
                    tokio::time::sleep(*delay).await;
                }
                Err(GatewayError::Transport("simulated connection failure".into()))
            }
        }
    }
}

pub struct TestApp {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    pub gateway: Arc<ScriptedGateway>,
    staging_dir: PathBuf,
    _tmp: tempfile::TempDir,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// On-disk path of a staged file, for tests that sabotage the staging
    /// area between upload and analysis.
    pub fn staged_path(&self, filename: &str) -> PathBuf {
        self.staging_dir.join(filename)
    }
}

pub async fn spawn_app(script: Script) -> TestApp {
    spawn_app_with_policy(script, LoadPolicy::Strict).await
}

pub async fn spawn_app_with_policy(script: Script, load_policy: LoadPolicy) -> TestApp {
    let tmp = tempfile::tempdir().expect("Failed to create temp dir");
    let staging_dir = tmp.path().join("staging");

    let config = AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            cors: CorsConfig {
                allow_origins: vec!["*".into()],
                max_age: 3600,
            },
        },
        staging: StagingConfig {
            dir: staging_dir.to_string_lossy().into_owned(),
            max_body_bytes: 8 * 1024 * 1024,
        },
        analysis: AnalysisConfig { load_policy },
        gateway: GatewayConfig {
            base_url: "http://127.0.0.1:9".into(),
            api_key: "test-key".into(),
            model: "test-model".into(),
            timeout_secs: 5,
            max_attempts: 1,
            backoff_base_ms: 10,
            backoff_max_ms: 100,
        },
    };

    let gateway = Arc::new(ScriptedGateway::new(script));
    let state = AppState::new(config, gateway.clone());
    {
        let mut staging = state.staging.lock().await;
        staging.reset().await.expect("Failed to reset staging");
    }

    let app = server::build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server crashed");
    });

    TestApp {
        addr,
        client: reqwest::Client::new(),
        gateway,
        staging_dir,
        _tmp: tmp,
    }
}

/// Build a multipart form with one `files` field per entry, in order.
pub fn image_form(files: &[(&str, &[u8])]) -> reqwest::multipart::Form {
    let mut form = reqwest::multipart::Form::new();
    for (name, bytes) in files {
        let part = reqwest::multipart::Part::bytes(bytes.to_vec()).file_name(name.to_string());
        form = form.part("files", part);
    }
    form
}
