//! Test doubles and fixtures shared by the daemon suites.

mod backend;
mod dispatcher;
mod events;
mod notifications;
mod reporter;
mod scripts;
mod topics;

pub use backend::{BackendCall, CallLog, StubQueueBackend, provision, queue_url_for};
pub use dispatcher::RecordingDispatcher;
pub use events::{CapturedEvent, EventCapture};
pub use notifications::notification_message;
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use scripts::{CountingScript, ScriptDir, exec_guard};
pub use topics::StubTopicLookup;
