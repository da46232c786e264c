pub mod elastic;
pub mod store_writer;

pub use elastic::ElasticClient;
pub use store_writer::{BulkAction, DocumentStore, StoreWriterEnum};
