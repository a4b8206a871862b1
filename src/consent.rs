//! Consent state: the record, its manager, integrations and notifications.

mod event;
mod integrations;
mod manager;
mod record;

pub use event::{ConsentEvent, ConsentSubscription};
pub use integrations::{
    ApplyReport, ConsentModeIntegration, ConsentModeUpdate, ConsentState, FnIntegration, Integration,
    IntegrationFailure,
};
pub use manager::{ConsentManager, ConsentUpdate, CONSENT_KEY, CONSENT_TTL_DAYS};
pub use record::{Category, ConsentCategories, ConsentRecord, UnknownCategory};

#[cfg(test)]
pub(crate) use manager::tests::RecordingReporter;
