pub mod config_manager;
pub mod errors;
pub mod exporters;
pub mod forwarder;
pub mod logging;
pub mod params;

pub use errors::{ForwarderError, Result};
pub use forwarder::{EventForwarder, TrainingCallback};
pub use params::{FlushFailure, ForwarderParams};
