use crate::exporters::store_writer::DocumentStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use trainlog_common::constants::{DEFAULT_BUFFER_CAPACITY, DEFAULT_INDEX_NAME};
use typed_builder::TypedBuilder;

/// What happens to buffered events when a bulk flush fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushFailure {
    /// Keep the batch; the next flush sends it again.
    #[default]
    Retain,
    /// Drop the batch as soon as the bulk call returns, successful or not.
    Discard,
}

/// Options for building an `EventForwarder`.
///
/// Either `url` or `es_client` must be supplied. When both are, the client
/// is used and the url ignored.
#[derive(TypedBuilder)]
pub struct ForwarderParams {
    /// Tag applied to every document so the run can be searched for.
    #[builder(setter(into))]
    pub run_name: String,

    /// Lowercase collection name without special characters.
    #[builder(default = DEFAULT_INDEX_NAME.to_string(), setter(into))]
    pub index_name: String,

    /// Merged into every document, overriding any other field.
    #[builder(default)]
    pub extra_data: Map<String, Value>,

    /// Elasticsearch url, `<host>[:<port>]` or a full http(s) url.
    #[builder(default, setter(strip_option, into))]
    pub url: Option<String>,

    #[builder(default, setter(strip_option))]
    pub es_client: Option<Box<dyn DocumentStore + Send>>,

    /// 0 flushes only at epoch end, 1 sends every batch event immediately,
    /// n > 1 flushes every n batch events.
    #[builder(default = DEFAULT_BUFFER_CAPACITY)]
    pub buffer_capacity: usize,

    /// Store each event kind as its own mapping type (Elasticsearch 6 and
    /// older). Only affects the built-in client.
    #[builder(default)]
    pub legacy_doc_types: bool,

    #[builder(default)]
    pub flush_failure: FlushFailure,
}
