use crate::errors::ForwarderError;
use crate::exporters::store_writer::{BulkAction, DocumentStore};
use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use trainlog_common::{EventDocument, EventKind};
use url::Url;

const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";
const TYPELESS_DOC_ENDPOINT: &str = "_doc";
const BULK_ENDPOINT: &str = "_bulk";

#[derive(Serialize)]
struct BulkHeader<'a> {
    index: BulkTarget<'a>,
}

#[derive(Serialize)]
struct BulkTarget<'a> {
    #[serde(rename = "_index")]
    index: &'a str,
    #[serde(rename = "_type", skip_serializing_if = "Option::is_none")]
    doc_type: Option<&'a str>,
}

#[derive(Deserialize, Default)]
struct BulkSummary {
    #[serde(default)]
    errors: bool,
}

/// Elasticsearch client speaking the document index and bulk APIs.
///
/// The underlying HTTP client is blocking: calls from inside an async runtime
/// must go through `spawn_blocking` or a dedicated thread.
pub struct ElasticClient {
    base_url: Url,
    client: Client,
    legacy_doc_types: bool,
}

impl ElasticClient {
    /// Accepts `<host>[:<port>]` as well as full `http(s)://` URLs. Nothing is
    /// sent here, an unreachable host only shows up on the first request.
    pub fn try_new(
        url: &str,
        legacy_doc_types: bool,
    ) -> std::result::Result<Self, ForwarderError> {
        let base_url = parse_base_url(url)?;

        // no timeout: a slow store blocks the training loop
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| {
                ForwarderError::configuration(format!("failed to build http client: {e}"))
            })?;

        info!("Created elasticsearch client for {}", base_url);

        Ok(ElasticClient {
            base_url,
            client,
            legacy_doc_types,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("{} cannot be used as a base url", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn document_endpoint(&self, index: &str, kind: EventKind) -> Result<Url> {
        if self.legacy_doc_types {
            self.endpoint(&[index, kind.as_str()])
        } else {
            self.endpoint(&[index, TYPELESS_DOC_ENDPOINT])
        }
    }

    fn bulk_body(&self, actions: &[BulkAction]) -> Result<Vec<u8>> {
        let mut body = Vec::new();
        for action in actions {
            let header = BulkHeader {
                index: BulkTarget {
                    index: &action.index,
                    doc_type: self.legacy_doc_types.then(|| action.kind.as_str()),
                },
            };
            serde_json::to_writer(&mut body, &header)?;
            body.push(b'\n');
            serde_json::to_writer(&mut body, &action.document)?;
            body.push(b'\n');
        }
        Ok(body)
    }
}

fn parse_base_url(url: &str) -> std::result::Result<Url, ForwarderError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ForwarderError::configuration("elasticsearch url is empty"));
    }

    let with_scheme = if url.contains("://") {
        url.to_string()
    } else {
        format!("http://{url}")
    };

    let parsed = Url::parse(&with_scheme).map_err(|e| {
        ForwarderError::configuration(format!("invalid elasticsearch url `{url}`: {e}"))
    })?;

    match parsed.scheme() {
        "http" | "https" if !parsed.cannot_be_a_base() => Ok(parsed),
        scheme => Err(ForwarderError::configuration(format!(
            "unsupported elasticsearch url scheme `{scheme}` in `{url}`"
        ))),
    }
}

impl DocumentStore for ElasticClient {
    fn index_one(&self, index: &str, kind: EventKind, document: &EventDocument) -> Result<()> {
        let now = Instant::now();
        let url = self.document_endpoint(index, kind)?;

        let response = self
            .client
            .post(url.clone())
            .json(document)
            .send()
            .with_context(|| format!("failed to send {kind} event to {url}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            bail!("elasticsearch rejected {kind} event for index `{index}` with {status}: {body}");
        }

        debug!("Indexed {kind} event into `{index}`, elapsed: {:?}", now.elapsed());
        Ok(())
    }

    fn bulk_index(&self, actions: &[BulkAction]) -> Result<()> {
        if actions.is_empty() {
            debug!("No data to send");
            return Ok(());
        }

        let now = Instant::now();
        let url = self.endpoint(&[BULK_ENDPOINT])?;
        let body = self
            .bulk_body(actions)
            .context("failed to serialize bulk request")?;

        info!("Sending bulk request to {} with {} events", url, actions.len());

        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, NDJSON_CONTENT_TYPE)
            .body(body)
            .send()
            .with_context(|| format!("failed to send bulk request to {url}"))?;

        let status = response.status();
        let text = response.text().unwrap_or_default();
        if !status.is_success() {
            bail!(
                "elasticsearch rejected bulk request of {} events with {status}: {text}",
                actions.len()
            );
        }

        let summary: BulkSummary = serde_json::from_str(&text).unwrap_or_default();
        if summary.errors {
            warn!("Bulk request to {} reported item errors", url);
        }

        debug!(
            "Successfully sent {} events, elapsed: {:?}",
            actions.len(),
            now.elapsed()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn document(event: &str) -> EventDocument {
        serde_json::from_value(json!({"event": event, "run_name": "r"})).unwrap()
    }

    fn ndjson_lines(body: &[u8]) -> Vec<Value> {
        std::str::from_utf8(body)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_host_and_port_without_scheme() {
        let client = ElasticClient::try_new("localhost:9200", false).unwrap();
        let url = client.endpoint(&[BULK_ENDPOINT]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9200/_bulk");
    }

    #[test]
    fn test_rejects_unsupported_scheme() {
        let error = ElasticClient::try_new("ftp://localhost:9200", false)
            .err()
            .unwrap();
        assert!(error.is_configuration());
    }

    #[test]
    fn test_rejects_empty_url() {
        let error = ElasticClient::try_new("  ", false).err().unwrap();
        assert!(error.is_configuration());
    }

    #[test]
    fn test_typeless_document_endpoint() {
        let client = ElasticClient::try_new("http://localhost:9200", false).unwrap();
        let url = client
            .document_endpoint("keras", EventKind::EpochBegin)
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:9200/keras/_doc");
    }

    #[test]
    fn test_legacy_document_endpoint_uses_kind() {
        let client = ElasticClient::try_new("http://localhost:9200", true).unwrap();
        let url = client
            .document_endpoint("keras", EventKind::EpochBegin)
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:9200/keras/epoch_begin");
    }

    #[test]
    fn test_endpoint_keeps_path_prefix() {
        let client = ElasticClient::try_new("https://proxy.local/es/", false).unwrap();
        let url = client.endpoint(&[BULK_ENDPOINT]).unwrap();
        assert_eq!(url.as_str(), "https://proxy.local/es/_bulk");
    }

    #[test]
    fn test_bulk_body_is_ndjson() {
        let client = ElasticClient::try_new("localhost:9200", false).unwrap();
        let body = client
            .bulk_body(&[
                BulkAction::new("runs", EventKind::BatchBegin, document("batch_begin")),
                BulkAction::new("runs", EventKind::BatchEnd, document("batch_end")),
            ])
            .unwrap();

        assert!(body.ends_with(b"\n"));
        assert_eq!(
            ndjson_lines(&body),
            vec![
                json!({"index": {"_index": "runs"}}),
                json!({"event": "batch_begin", "run_name": "r"}),
                json!({"index": {"_index": "runs"}}),
                json!({"event": "batch_end", "run_name": "r"}),
            ]
        );
    }

    #[test]
    fn test_legacy_bulk_body_carries_type() {
        let client = ElasticClient::try_new("localhost:9200", true).unwrap();
        let body = client
            .bulk_body(&[BulkAction::new(
                "runs",
                EventKind::BatchEnd,
                document("batch_end"),
            )])
            .unwrap();

        assert_eq!(
            ndjson_lines(&body)[0],
            json!({"index": {"_index": "runs", "_type": "batch_end"}})
        );
    }

    #[test]
    fn test_empty_bulk_sends_nothing() {
        // port 1 is closed, any request would fail
        let client = ElasticClient::try_new("http://127.0.0.1:1", false).unwrap();
        assert!(client.bulk_index(&[]).is_ok());
    }
}
