//! The consent hub: initialization routine and runtime API.
//!
//! A [`ConsentHub`] is an explicit instance owned by whoever embeds the widget.
//! Its public methods are the runtime API the host page talks to; they forward
//! to the [`ConsentManager`] and the [`Presenter`].
//!
//! ```no_run
//! use consenthub::config::WidgetConfig;
//! use consenthub::hub::ConsentHub;
//!
//! # #[tokio::main] async fn main() -> Result<(), consenthub::ConsentError> {
//! let config = WidgetConfig::builder()
//!     .client_id("acme-shop")
//!     .api_endpoint("https://consent.example.com")
//!     .build()?;
//!
//! let hub = ConsentHub::builder(config).start()?;
//! if hub.get_consent().is_none() {
//!     hub.accept_all();
//! }
//! # Ok(()) }
//! ```

use crate::config::WidgetConfig;
use crate::consent::{
    Category, ConsentCategories, ConsentManager, ConsentRecord, ConsentSubscription, ConsentUpdate, Integration,
};
use crate::cookies::{CookieJarHandle, CookieStoreHandle, DefaultCookieJar};
use crate::errors::ConsentError;
use crate::net::{ConsentReporter, HttpConsentReporter};
use crate::presenter::{BannerView, NullPresenter, PreferenceForm, Presenter, PreferencesView};
use crate::storage::CookieStorage;
use std::sync::{Arc, RwLock};
use tokio::runtime::Handle;

/// What [`ConsentHubBuilder::start`] did on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A stored decision was found and re-applied; no UI shown.
    Reapplied,
    /// No decision yet; the banner was shown.
    BannerShown,
}

pub struct ConsentHub {
    config: Arc<WidgetConfig>,
    manager: ConsentManager,
    presenter: Arc<dyn Presenter>,
    load_outcome: LoadOutcome,
}

impl std::fmt::Debug for ConsentHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsentHub")
            .field("manager", &self.manager)
            .field("load_outcome", &self.load_outcome)
            .finish_non_exhaustive()
    }
}

impl ConsentHub {
    /// Entry point to start building a hub.
    pub fn builder(config: WidgetConfig) -> ConsentHubBuilder {
        ConsentHubBuilder {
            config,
            cookie_jar: None,
            cookie_store: None,
            reporter: None,
            presenter: None,
            integrations: Vec::new(),
            runtime: None,
        }
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn manager(&self) -> &ConsentManager {
        &self.manager
    }

    pub fn load_outcome(&self) -> LoadOutcome {
        self.load_outcome
    }

    /// Re-opens the preferences dialog, pre-filled with the stored decision.
    pub fn show_preferences(&self) {
        let current = self.manager.get_consent().map(|r| r.categories);
        self.presenter
            .show_preferences(&PreferencesView::from_config(&self.config, current));
    }

    /// Current decision, if any.
    pub fn get_consent(&self) -> Option<ConsentRecord> {
        self.manager.get_consent()
    }

    /// Grants every category the configuration offers.
    pub fn accept_all(&self) -> ConsentUpdate {
        let toggles = self.config.categories;
        let categories = Category::OPTIONAL
            .into_iter()
            .map(|c| (c, toggles.is_enabled(c)))
            .collect::<ConsentCategories>()
            .with_necessary();
        self.decide(categories)
    }

    /// Denies every optional category.
    pub fn reject_all(&self) -> ConsentUpdate {
        self.decide(ConsentCategories::necessary_only())
    }

    /// Stores the checkbox states of the preferences dialog.
    ///
    /// Unchecked or missing checkboxes, and categories the configuration does
    /// not offer, are denied.
    pub fn save_preferences(&self, form: &PreferenceForm) -> ConsentUpdate {
        let toggles = self.config.categories;
        let categories = Category::ALL
            .into_iter()
            .map(|c| (c, toggles.is_enabled(c) && form.is_checked(c)))
            .collect::<ConsentCategories>();
        self.decide(categories)
    }

    /// Subscribes to consent notifications.
    pub fn subscribe(&self) -> ConsentSubscription {
        self.manager.subscribe()
    }

    pub fn visitor_id(&self) -> String {
        self.manager.identity().get_or_create_visitor_id()
    }

    fn decide(&self, categories: ConsentCategories) -> ConsentUpdate {
        let update = self.manager.set_consent(categories);
        self.presenter.hide();
        update
    }
}

/// Builder for [`ConsentHub`].
pub struct ConsentHubBuilder {
    config: WidgetConfig,
    cookie_jar: Option<CookieJarHandle>,
    cookie_store: Option<CookieStoreHandle>,
    reporter: Option<Arc<dyn ConsentReporter>>,
    presenter: Option<Arc<dyn Presenter>>,
    integrations: Vec<Arc<dyn Integration>>,
    runtime: Option<Handle>,
}

impl ConsentHubBuilder {
    /// Uses an existing jar. Takes precedence over [`cookie_store`](Self::cookie_store).
    pub fn cookie_jar(mut self, jar: CookieJarHandle) -> Self {
        self.cookie_jar = Some(jar);
        self
    }

    /// Mints the jar from a persistent store.
    pub fn cookie_store(mut self, store: CookieStoreHandle) -> Self {
        self.cookie_store = Some(store);
        self
    }

    /// Replaces the default HTTP reporter.
    pub fn reporter(mut self, reporter: Arc<dyn ConsentReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn presenter(mut self, presenter: Arc<dyn Presenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    /// Adds an integration. Integrations are signaled in the order they were added.
    pub fn integration(mut self, integration: Arc<dyn Integration>) -> Self {
        self.integrations.push(integration);
        self
    }

    /// Runtime the default reporter spawns on. Defaults to the current one.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Assembles the hub and runs the on-load flow: re-apply a stored decision
    /// or show the banner.
    pub fn start(self) -> Result<ConsentHub, ConsentError> {
        self.config.validate()?;
        let config = Arc::new(self.config);

        let jar: CookieJarHandle = match (self.cookie_jar, self.cookie_store) {
            (Some(jar), _) => jar,
            (None, Some(store)) => store.jar(),
            (None, None) => Arc::new(RwLock::new(DefaultCookieJar::new())),
        };

        let reporter: Arc<dyn ConsentReporter> = match self.reporter {
            Some(reporter) => reporter,
            None => {
                let runtime = match self.runtime {
                    Some(handle) => handle,
                    None => Handle::try_current().map_err(|_| ConsentError::NoRuntime)?,
                };
                Arc::new(HttpConsentReporter::new(&config, runtime)?)
            }
        };

        let presenter = self.presenter.unwrap_or_else(|| Arc::new(NullPresenter) as Arc<dyn Presenter>);
        let manager = ConsentManager::new(config.clone(), CookieStorage::new(jar), reporter, self.integrations);

        let load_outcome = match manager.get_consent() {
            Some(record) => {
                manager.apply_consent(&record.categories);
                LoadOutcome::Reapplied
            }
            None => {
                presenter.show_banner(&BannerView::from_config(&config));
                LoadOutcome::BannerShown
            }
        };
        log::debug!("consent hub for {} started: {:?}", config.client_id, load_outcome);

        Ok(ConsentHub {
            config,
            manager,
            presenter,
            load_outcome,
        })
    }
}
