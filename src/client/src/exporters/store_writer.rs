use crate::exporters::elastic::ElasticClient;
use anyhow::Result;
use mockall::automock;
use serde::Serialize;
use trainlog_common::{EventDocument, EventKind};

/// One document of a bulk request, tagged with its collection and event kind.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BulkAction {
    pub index: String,
    pub kind: EventKind,
    pub document: EventDocument,
}

impl BulkAction {
    pub fn new(index: impl Into<String>, kind: EventKind, document: EventDocument) -> Self {
        BulkAction {
            index: index.into(),
            kind,
            document,
        }
    }
}

/// Destination of forwarded events. Both calls block until the store
/// acknowledges and surface any failure to the caller.
#[automock]
pub trait DocumentStore {
    fn index_one(&self, index: &str, kind: EventKind, document: &EventDocument) -> Result<()>;

    /// Per-item outcomes of the bulk request are not inspected.
    fn bulk_index(&self, actions: &[BulkAction]) -> Result<()>;
}

pub enum StoreWriterEnum {
    Elastic(ElasticClient),
    Injected(Box<dyn DocumentStore + Send>),
}

impl DocumentStore for StoreWriterEnum {
    fn index_one(&self, index: &str, kind: EventKind, document: &EventDocument) -> Result<()> {
        match self {
            StoreWriterEnum::Elastic(client) => client.index_one(index, kind, document),
            StoreWriterEnum::Injected(client) => client.index_one(index, kind, document),
        }
    }

    fn bulk_index(&self, actions: &[BulkAction]) -> Result<()> {
        match self {
            StoreWriterEnum::Elastic(client) => client.bulk_index(actions),
            StoreWriterEnum::Injected(client) => client.bulk_index(actions),
        }
    }
}

impl StoreWriterEnum {
    pub fn variant_name(&self) -> &'static str {
        match self {
            StoreWriterEnum::Elastic(_) => "ElasticClient",
            StoreWriterEnum::Injected(_) => "Injected",
        }
    }
}
