//! Outbound networking: the consent log client and the detached tasks it runs on.

mod detached;
mod report;

pub use detached::DetachedTask;
pub use report::{ConsentLogPayload, ConsentReporter, HttpConsentReporter};
