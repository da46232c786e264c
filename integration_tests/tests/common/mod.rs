use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tokio::sync::oneshot;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("request body is not json")
    }

    pub fn ndjson(&self) -> Vec<Value> {
        self.body
            .lines()
            .map(|line| serde_json::from_str(line).expect("ndjson line is not json"))
            .collect()
    }
}

#[derive(Clone)]
struct ServerState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    status: StatusCode,
    bulk_errors: bool,
}

async fn record(
    State(state): State<ServerState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let path = uri.path().to_string();
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let response = if path.ends_with("/_bulk") {
        json!({"took": 1, "errors": state.bulk_errors, "items": []})
    } else {
        json!({"result": "created"})
    };

    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path,
        content_type,
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    (state.status, Json(response))
}

/// Stand-in for the Elasticsearch index and bulk endpoints. Runs on its own
/// thread and runtime so the blocking client can be driven from the test.
pub struct MockElasticServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl MockElasticServer {
    pub fn launch() -> Self {
        Self::start(StatusCode::CREATED, false)
    }

    pub fn launch_with_status(status: StatusCode) -> Self {
        Self::start(status, false)
    }

    pub fn launch_with_bulk_errors() -> Self {
        Self::start(StatusCode::OK, true)
    }

    fn start(status: StatusCode, bulk_errors: bool) -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("failed to bind");
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();

        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = ServerState {
            requests: requests.clone(),
            status,
            bulk_errors,
        };
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();

        let handle = std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to build runtime");

            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                let router = Router::new().fallback(record).with_state(state);
                axum::serve(listener, router)
                    .with_graceful_shutdown(async {
                        shutdown_rx.await.ok();
                    })
                    .await
                    .unwrap();
            });
        });

        MockElasticServer {
            addr,
            requests,
            shutdown: Some(shutdown),
            handle: Some(handle),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn host_and_port(&self) -> String {
        self.addr.to_string()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for MockElasticServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
