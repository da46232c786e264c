pub mod constants;
pub mod event;
pub mod recorder;
pub mod types;

pub use event::logs::{LogValue, Logs};
pub use event::{EventDocument, EventFields, EventKind};
pub use recorder::{BufferPolicy, EventBuffer};
pub use types::run_context::RunContext;
