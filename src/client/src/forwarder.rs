use crate::errors::{ForwarderError, Result};
use crate::exporters::elastic::ElasticClient;
use crate::exporters::store_writer::{BulkAction, DocumentStore, StoreWriterEnum};
use crate::params::{FlushFailure, ForwarderParams};
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info, warn};
use trainlog_common::{
    BufferPolicy, EventBuffer, EventDocument, EventFields, EventKind, Logs, RunContext,
};

/// Lifecycle hooks raised by a training loop, one call per event, in order.
pub trait TrainingCallback {
    fn on_train_begin(&mut self, logs: &Logs) -> Result<()>;
    fn on_epoch_begin(&mut self, epoch: u64, logs: &Logs) -> Result<()>;
    fn on_batch_begin(&mut self, batch: u64, logs: &Logs) -> Result<()>;
    fn on_batch_end(&mut self, batch: u64, logs: &Logs) -> Result<()>;
    fn on_epoch_end(&mut self, epoch: u64, logs: &Logs) -> Result<()>;
    fn on_train_end(&mut self, logs: &Logs) -> Result<()>;
}

/// Turns training lifecycle events into documents and forwards them to a
/// document store.
///
/// Train and epoch events are sent as they happen. Batch events go through
/// the buffer policy; every epoch end flushes whatever is still pending
/// before its own document is sent.
///
/// Begin times are single slots: a second begin before the matching end
/// replaces the first one.
pub struct EventForwarder {
    store: StoreWriterEnum,
    context: RunContext,
    policy: BufferPolicy,
    flush_failure: FlushFailure,
    buffer: EventBuffer,

    batch_start_time: Option<Instant>,
    epoch_start_time: Option<Instant>,
}

impl EventForwarder {
    pub fn new(params: ForwarderParams) -> Result<EventForwarder> {
        if params.index_name.trim().is_empty() {
            return Err(ForwarderError::configuration("index name must not be empty"));
        }

        let store = match (params.es_client, params.url) {
            (Some(client), url) => {
                if let Some(url) = url {
                    warn!("Both a client and url `{url}` were supplied, using the client");
                }
                StoreWriterEnum::Injected(client)
            }
            (None, Some(url)) => {
                StoreWriterEnum::Elastic(ElasticClient::try_new(&url, params.legacy_doc_types)?)
            }
            (None, None) => {
                return Err(ForwarderError::configuration(
                    "either an elasticsearch url or a client must be supplied",
                ))
            }
        };

        let policy = BufferPolicy::from_capacity(params.buffer_capacity);

        info!(
            "Initializing EventForwarder for run {} into `{}` using {}, buffer policy: {:?}",
            params.run_name,
            params.index_name,
            store.variant_name(),
            policy
        );

        Ok(EventForwarder {
            store,
            context: RunContext::new(params.run_name, params.index_name, params.extra_data),
            policy,
            flush_failure: params.flush_failure,
            buffer: EventBuffer::new(),
            batch_start_time: None,
            epoch_start_time: None,
        })
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    pub fn policy(&self) -> BufferPolicy {
        self.policy
    }

    pub fn store(&self) -> &StoreWriterEnum {
        &self.store
    }

    /// Number of batch events waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Sends every pending event in one bulk request. Does nothing when the
    /// buffer is empty.
    pub fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let index = self.context.index_name();
        let actions: Vec<BulkAction> = self
            .buffer
            .iter()
            .map(|(kind, document)| BulkAction::new(index, *kind, document.clone()))
            .collect();

        debug!("Flushing {} buffered events into `{}`", actions.len(), index);

        let result = self.store.bulk_index(&actions);
        match (&result, self.flush_failure) {
            (Ok(()), _) | (Err(_), FlushFailure::Discard) => self.buffer.clear(),
            (Err(_), FlushFailure::Retain) => {
                warn!(
                    "Bulk flush of {} events failed, keeping them for the next flush",
                    actions.len()
                );
            }
        }

        result.map_err(ForwarderError::Delivery)
    }

    /// Flushes what is still pending and releases the store.
    pub fn close(mut self) -> Result<()> {
        self.flush()?;
        info!("Closed EventForwarder for run {}", self.context.run_name());
        Ok(())
    }

    fn create_event_body(&self, kind: EventKind, logs: &Logs, fields: EventFields) -> EventDocument {
        EventDocument::new(kind, &self.context, Utc::now(), logs, fields)
    }

    fn index(&self, kind: EventKind, logs: &Logs, fields: EventFields) -> Result<()> {
        let document = self.create_event_body(kind, logs, fields);
        debug!("Sending {kind} event for run {}", self.context.run_name());
        self.store
            .index_one(self.context.index_name(), kind, &document)?;
        Ok(())
    }

    fn add_to_queue(&mut self, kind: EventKind, logs: &Logs, fields: EventFields) -> Result<()> {
        debug_assert!(kind.is_batch(), "{kind} does not go through the buffer");

        if self.policy == BufferPolicy::Immediate {
            return self.index(kind, logs, fields);
        }

        let document = self.create_event_body(kind, logs, fields);
        self.buffer.push(kind, document);
        debug!("Buffered {kind} event, {} pending", self.buffer.len());

        if self.policy.is_full(self.buffer.len()) {
            self.flush()?;
        }
        Ok(())
    }
}

fn elapsed_seconds(start: Option<Instant>, kind: EventKind) -> Option<u64> {
    match start {
        Some(start) => Some(start.elapsed().as_secs()),
        None => {
            warn!("{kind} raised without a matching begin event, duration left out");
            None
        }
    }
}

impl TrainingCallback for EventForwarder {
    fn on_train_begin(&mut self, logs: &Logs) -> Result<()> {
        self.index(EventKind::TrainBegin, logs, EventFields::default())
    }

    fn on_epoch_begin(&mut self, epoch: u64, logs: &Logs) -> Result<()> {
        self.epoch_start_time = Some(Instant::now());
        self.index(EventKind::EpochBegin, logs, EventFields::epoch(epoch))
    }

    fn on_batch_begin(&mut self, _batch: u64, logs: &Logs) -> Result<()> {
        self.batch_start_time = Some(Instant::now());
        self.add_to_queue(EventKind::BatchBegin, logs, EventFields::default())
    }

    fn on_batch_end(&mut self, _batch: u64, logs: &Logs) -> Result<()> {
        let fields = EventFields {
            epoch: None,
            duration: elapsed_seconds(self.batch_start_time, EventKind::BatchEnd),
        };
        self.add_to_queue(EventKind::BatchEnd, logs, fields)
    }

    fn on_epoch_end(&mut self, epoch: u64, logs: &Logs) -> Result<()> {
        self.flush()?;
        let fields = EventFields {
            epoch: Some(epoch),
            duration: elapsed_seconds(self.epoch_start_time, EventKind::EpochEnd),
        };
        self.index(EventKind::EpochEnd, logs, fields)
    }

    fn on_train_end(&mut self, logs: &Logs) -> Result<()> {
        self.index(EventKind::TrainEnd, logs, EventFields::default())
    }
}
