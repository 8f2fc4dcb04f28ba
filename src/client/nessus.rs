use std::thread;
use std::time::{Duration, Instant};

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::client::{null_as_empty, ExportFormat, HistoryEntry, ScanSummary, ScannerApi};
use crate::error::RemoteError;

/// Longest response body echoed back in an error message
const MAX_ERROR_BODY: usize = 200;

/// Connection settings for [`NessusClient`]
#[derive(Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub access_key: String,
    pub secret_key: String,
    /// Accept self-signed certificates (the Nessus default install uses one)
    pub insecure: bool,
    /// Per-request timeout
    pub timeout: Duration,
    /// Delay between export status checks
    pub poll_interval: Duration,
    /// Give up on an export that is still not ready after this long
    pub export_wait: Duration,
}

/// Blocking client for the Nessus REST API, authenticated with an API key pair.
pub struct NessusClient {
    http: Client,
    base_url: String,
    api_keys: String,
    poll_interval: Duration,
    export_wait: Duration,
}

impl std::fmt::Debug for NessusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NessusClient")
            .field("base_url", &self.base_url)
            .field("poll_interval", &self.poll_interval)
            .field("export_wait", &self.export_wait)
            .finish_non_exhaustive()
    }
}

/// `GET /scans`
#[derive(Debug, Deserialize)]
struct ScanList {
    #[serde(default, deserialize_with = "null_as_empty")]
    scans: Vec<ScanSummary>,
}

/// `GET /scans/{id}`
#[derive(Debug, Deserialize)]
struct ScanDetails {
    #[serde(default, deserialize_with = "null_as_empty")]
    history: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize)]
struct ExportRequest {
    format: ExportFormat,
}

/// `POST /scans/{id}/export`
#[derive(Debug, Deserialize)]
struct ExportTicket {
    file: u64,
}

/// `GET /scans/{id}/export/{file}/status`
#[derive(Debug, Deserialize)]
struct ExportStatus {
    status: String,
}

impl ExportStatus {
    fn is_ready(&self) -> bool {
        self.status == "ready"
    }

    fn is_failed(&self) -> bool {
        self.status == "error"
    }
}

impl NessusClient {
    pub fn new(options: ClientOptions) -> Result<Self, RemoteError> {
        let http = Client::builder()
            .danger_accept_invalid_certs(options.insecure)
            .timeout(options.timeout)
            .user_agent(concat!("nessus-export/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(RemoteError::Client)?;

        Ok(NessusClient {
            http,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            api_keys: api_keys_header(&options.access_key, &options.secret_key),
            poll_interval: options.poll_interval,
            export_wait: options.export_wait,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("X-ApiKeys", &self.api_keys)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    fn send(&self, method: &'static str, url: &str, request: RequestBuilder) -> Result<Response, RemoteError> {
        debug!("{} {}", method, url);
        let response = self
            .authorized(request)
            .send()
            .map_err(|source| RemoteError::Transport {
                method,
                url: url.to_string(),
                source,
            })?;
        check_status(method, url, response)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        let url = self.url(path);
        let response = self.send("GET", &url, self.http.get(&url))?;
        decode_json(&url, response)
    }

    fn read_bytes(url: &str, response: Response) -> Result<Vec<u8>, RemoteError> {
        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|source| RemoteError::Transport {
                method: "GET",
                url: url.to_string(),
                source,
            })
    }

    /// Ask the service to prepare an export and return its file id
    fn request_export(&self, scan_id: u64, history_id: u64, format: ExportFormat) -> Result<u64, RemoteError> {
        let url = self.url(&format!("/scans/{}/export", scan_id));
        let request = self
            .http
            .post(&url)
            .query(&[("history_id", history_id)])
            .json(&ExportRequest { format });
        let response = self.send("POST", &url, request)?;
        let ticket: ExportTicket = decode_json(&url, response)?;
        Ok(ticket.file)
    }

    fn wait_for_export(&self, scan_id: u64, file: u64) -> Result<(), RemoteError> {
        let started = Instant::now();
        loop {
            let status: ExportStatus =
                self.get_json(&format!("/scans/{}/export/{}/status", scan_id, file))?;
            if status.is_ready() {
                debug!("Export {} ready after {:.1}s", file, started.elapsed().as_secs_f64());
                return Ok(());
            }
            if status.is_failed() {
                return Err(RemoteError::ExportFailed { scan_id, file });
            }
            trace!("Export {} status: {}", file, status.status);

            if started.elapsed() >= self.export_wait {
                return Err(RemoteError::ExportTimeout {
                    scan_id,
                    file,
                    waited_secs: self.export_wait.as_secs(),
                });
            }
            thread::sleep(self.poll_interval);
        }
    }
}

impl ScannerApi for NessusClient {
    fn list_scans(&self) -> Result<Vec<ScanSummary>, RemoteError> {
        let list: ScanList = self.get_json("/scans")?;
        Ok(list.scans)
    }

    fn scan_history(&self, scan_id: u64) -> Result<Vec<HistoryEntry>, RemoteError> {
        let details: ScanDetails = self.get_json(&format!("/scans/{}", scan_id))?;
        Ok(details.history)
    }

    fn export_scan(
        &self,
        scan_id: u64,
        history_id: u64,
        format: ExportFormat,
    ) -> Result<Vec<u8>, RemoteError> {
        let file = self.request_export(scan_id, history_id, format)?;
        self.wait_for_export(scan_id, file)?;

        let url = self.url(&format!("/scans/{}/export/{}/download", scan_id, file));
        let response = self.send("GET", &url, self.http.get(&url))?;
        Self::read_bytes(&url, response)
    }
}

/// Value of the `X-ApiKeys` header
fn api_keys_header(access_key: &str, secret_key: &str) -> String {
    format!("accessKey={}; secretKey={}", access_key, secret_key)
}

fn check_status(method: &'static str, url: &str, response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(RemoteError::Unauthorized {
            method,
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().unwrap_or_default();
    Err(RemoteError::Status {
        method,
        url: url.to_string(),
        status: status.as_u16(),
        body: truncate_body(body.trim()),
    })
}

fn decode_json<T: DeserializeOwned>(url: &str, response: Response) -> Result<T, RemoteError> {
    let bytes = NessusClient::read_bytes(url, response)?;
    parse_body(url, &bytes)
}

fn parse_body<T: DeserializeOwned>(url: &str, bytes: &[u8]) -> Result<T, RemoteError> {
    serde_json::from_slice(bytes).map_err(|e| RemoteError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() > MAX_ERROR_BODY {
        let cut: String = body.chars().take(MAX_ERROR_BODY - 1).collect();
        format!("{}…", cut)
    } else {
        body.to_string()
    }
}
