use super::event::{ConsentBus, ConsentEvent, ConsentSubscription};
use super::integrations::{apply_guarded, ApplyReport, Integration};
use super::record::{ConsentCategories, ConsentRecord};
use crate::config::WidgetConfig;
use crate::identity::VisitorIdentity;
use crate::net::{ConsentLogPayload, ConsentReporter, DetachedTask};
use crate::storage::CookieStorage;
use std::sync::Arc;
use time::OffsetDateTime;

/// Storage key of the consent record.
pub const CONSENT_KEY: &str = "consenthub_preferences";

/// Lifetime of the stored consent record.
pub const CONSENT_TTL_DAYS: u32 = 365;

/// Result of [`ConsentManager::set_consent`].
#[derive(Debug)]
pub struct ConsentUpdate {
    /// The record that was persisted.
    pub record: ConsentRecord,
    /// The in-flight report. Dropping it does not cancel delivery.
    pub report: DetachedTask,
    /// What happened while applying the decision.
    pub applied: ApplyReport,
}

/// Owns the canonical consent record: reads, persists, reports and applies it.
pub struct ConsentManager {
    config: Arc<WidgetConfig>,
    storage: CookieStorage,
    identity: VisitorIdentity,
    reporter: Arc<dyn ConsentReporter>,
    integrations: Vec<Arc<dyn Integration>>,
    bus: ConsentBus,
}

impl std::fmt::Debug for ConsentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsentManager")
            .field("client_id", &self.config.client_id)
            .field("integrations", &self.integrations.len())
            .finish_non_exhaustive()
    }
}

impl ConsentManager {
    pub fn new(
        config: Arc<WidgetConfig>,
        storage: CookieStorage,
        reporter: Arc<dyn ConsentReporter>,
        integrations: Vec<Arc<dyn Integration>>,
    ) -> Self {
        Self {
            identity: VisitorIdentity::new(storage.clone()),
            config,
            storage,
            reporter,
            integrations,
            bus: ConsentBus::default(),
        }
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn identity(&self) -> &VisitorIdentity {
        &self.identity
    }

    /// Subscribes to [`ConsentEvent`]s.
    pub fn subscribe(&self) -> ConsentSubscription {
        self.bus.subscribe()
    }

    /// Returns the stored record, or `None` when no decision was made yet or
    /// the stored value is not a valid record.
    ///
    /// A record that denies `necessary` was not written by this crate and is
    /// treated like any other malformed value.
    pub fn get_consent(&self) -> Option<ConsentRecord> {
        let raw = self.storage.read(CONSENT_KEY)?;
        match serde_json::from_str::<ConsentRecord>(&raw) {
            Ok(record) if record.categories.necessary => Some(record),
            Ok(_) => {
                log::debug!("ignoring consent record with necessary denied");
                None
            }
            Err(e) => {
                log::debug!("ignoring unparseable consent record: {}", e);
                None
            }
        }
    }

    /// Records a new decision: persist, report, apply.
    ///
    /// `necessary` is forced on. The whole record is replaced. The report is
    /// started but not awaited; each call yields its own report.
    pub fn set_consent(&self, categories: ConsentCategories) -> ConsentUpdate {
        let record = ConsentRecord::new(self.config.client_id.clone(), categories, OffsetDateTime::now_utc());

        match serde_json::to_string(&record) {
            Ok(json) => self.storage.write(CONSENT_KEY, &json, Some(CONSENT_TTL_DAYS)),
            Err(e) => log::error!("cannot serialize consent record: {}", e),
        }

        let report = self.log_consent(&record);
        let applied = self.apply_consent(&record.categories);

        ConsentUpdate { record, report, applied }
    }

    /// Signals every integration and broadcasts a [`ConsentEvent`]. Never fails.
    pub fn apply_consent(&self, categories: &ConsentCategories) -> ApplyReport {
        let mut report = ApplyReport::default();

        for integration in &self.integrations {
            match apply_guarded(integration.as_ref(), categories) {
                Ok(()) => report.signaled.push(integration.name().to_string()),
                Err(failure) => report.failures.push(failure),
            }
        }

        report.listeners = self.bus.publish(ConsentEvent { categories: *categories });
        log::debug!(
            "{}: {} integrations signaled, {} failed, {} listeners",
            ConsentEvent::NAME,
            report.signaled.len(),
            report.failures.len(),
            report.listeners
        );
        report
    }

    /// Starts reporting `record` to the remote consent log.
    pub fn log_consent(&self, record: &ConsentRecord) -> DetachedTask {
        self.reporter.report(ConsentLogPayload {
            client_id: self.config.client_id.clone(),
            visitor_id: self.identity.get_or_create_visitor_id(),
            consent_data: record.clone(),
        })
    }
}
