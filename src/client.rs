use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;
use serde_json::Value;

use crate::cache::SnapshotCache;
use crate::models::SurveyRecord;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Envelope the sheet web app wraps every response in.
#[derive(Debug, Deserialize)]
struct SheetResponse {
    status: String,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Client for the spreadsheet-backed survey endpoint. One GET retrieves the
/// full record set; one POST appends a submission. No retries.
pub struct SheetClient {
    http: reqwest::Client,
    endpoint: String,
}

impl SheetClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        SheetClient {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub async fn fetch_all(&self) -> anyhow::Result<Vec<SurveyRecord>> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("action", "getAllData")])
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(classify_send_error)?;

        let payload: SheetResponse = response
            .error_for_status()
            .context("sheet endpoint returned an error status")?
            .json()
            .await
            .context("sheet endpoint returned malformed JSON")?;

        unpack(payload)
    }

    /// Sends one record the way the survey form does: form-encoded, with the
    /// whole record as a JSON string under a single `data` field.
    pub async fn submit(&self, record: &SurveyRecord) -> anyhow::Result<()> {
        let body = serde_json::to_string(record).context("failed to serialize record")?;
        self.http
            .post(&self.endpoint)
            .form(&[("data", body.as_str())])
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(classify_send_error)?
            .error_for_status()
            .context("sheet endpoint rejected the submission")?;
        Ok(())
    }
}

fn classify_send_error(err: reqwest::Error) -> anyhow::Error {
    if err.is_timeout() {
        anyhow::anyhow!(
            "timeout: sheet endpoint did not respond within {}s",
            FETCH_TIMEOUT.as_secs()
        )
    } else {
        anyhow::Error::new(err).context("failed to reach sheet endpoint")
    }
}

/// Accepts only a `success` envelope with an array payload; anything else is
/// an error carrying the server's message when it sent one. Entries that are
/// not record-shaped, or fail the identity check, are silently dropped.
fn unpack(payload: SheetResponse) -> anyhow::Result<Vec<SurveyRecord>> {
    if payload.status == "success" {
        if let Some(Value::Array(entries)) = payload.data {
            let records = entries
                .into_iter()
                .filter_map(|entry| serde_json::from_value::<SurveyRecord>(entry).ok())
                .filter(SurveyRecord::is_valid)
                .collect();
            return Ok(records);
        }
    }
    bail!(payload
        .message
        .unwrap_or_else(|| "sheet endpoint returned an unexpected payload".to_string()))
}

/// Cache-or-fetch load path: a fresh snapshot wins outright; otherwise fetch
/// and store, falling back to a stale snapshot when the network fails.
pub async fn load_records(
    client: &SheetClient,
    cache: &SnapshotCache,
) -> anyhow::Result<Vec<SurveyRecord>> {
    if let Some(records) = cache.load() {
        println!("Using cached survey data.");
        return Ok(records);
    }

    match client.fetch_all().await {
        Ok(records) => {
            if let Err(err) = cache.store(&records) {
                println!("Warning: failed to store snapshot: {err:#}");
            }
            Ok(records)
        }
        Err(err) => match cache.load_stale() {
            Some(records) if !records.is_empty() => {
                println!("Warning: fetch failed ({err:#}); using stale cached data.");
                Ok(records)
            }
            _ => Err(err),
        },
    }
}
