//! Presentation layer seam.
//!
//! Rendering the banner and the preferences dialog is left to the host: the
//! hub only tells a [`Presenter`] what to show and receives the user's answer
//! through its own API ([`accept_all`](crate::hub::ConsentHub::accept_all),
//! [`reject_all`](crate::hub::ConsentHub::reject_all),
//! [`save_preferences`](crate::hub::ConsentHub::save_preferences)).

use crate::config::{BannerPosition, Branding, WidgetConfig};
use crate::consent::{Category, ConsentCategories};
use std::collections::HashMap;

/// What the first-visit banner needs to render.
#[derive(Debug, Clone, PartialEq)]
pub struct BannerView {
    pub position: BannerPosition,
    pub language: String,
    pub branding: Branding,
    /// Categories offered by the configuration, `necessary` first.
    pub categories: Vec<Category>,
}

impl BannerView {
    pub(crate) fn from_config(config: &WidgetConfig) -> Self {
        Self {
            position: config.position,
            language: config.language.clone(),
            branding: config.branding.clone(),
            categories: config.categories.enabled(),
        }
    }
}

/// What the preferences dialog needs to render.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferencesView {
    pub language: String,
    pub branding: Branding,
    /// Categories that get a toggle, `necessary` first (rendered locked on).
    pub categories: Vec<Category>,
    /// Initial toggle states: the stored decision, or everything optional off.
    pub current: ConsentCategories,
}

impl PreferencesView {
    pub(crate) fn from_config(config: &WidgetConfig, current: Option<ConsentCategories>) -> Self {
        Self {
            language: config.language.clone(),
            branding: config.branding.clone(),
            categories: config.categories.enabled(),
            current: current.unwrap_or_default(),
        }
    }
}

/// Renders the consent UI.
pub trait Presenter: Send + Sync {
    fn show_banner(&self, view: &BannerView);
    fn show_preferences(&self, view: &PreferencesView);
    /// Dismisses whatever is shown.
    fn hide(&self);
}

/// Presenter for headless use: renders nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn show_banner(&self, _view: &BannerView) {}
    fn show_preferences(&self, _view: &PreferencesView) {}
    fn hide(&self) {}
}

/// Checkbox states read back from the preferences dialog.
///
/// A checkbox that was not rendered is simply absent and counts as unchecked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceForm {
    checkboxes: HashMap<Category, bool>,
}

impl PreferenceForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the state of one checkbox.
    pub fn set(mut self, category: Category, checked: bool) -> Self {
        self.checkboxes.insert(category, checked);
        self
    }

    /// Marks one checkbox as checked.
    pub fn check(self, category: Category) -> Self {
        self.set(category, true)
    }

    pub fn is_checked(&self, category: Category) -> bool {
        self.checkboxes.get(&category).copied().unwrap_or(false)
    }
}

impl FromIterator<(Category, bool)> for PreferenceForm {
    fn from_iter<I: IntoIterator<Item = (Category, bool)>>(iter: I) -> Self {
        Self {
            checkboxes: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_checkbox_is_unchecked() {
        let form = PreferenceForm::new().check(Category::Analytics);
        assert!(form.is_checked(Category::Analytics));
        assert!(!form.is_checked(Category::Marketing));
        assert!(!form.is_checked(Category::Preferences));
    }

    #[test]
    fn explicit_uncheck_overrides() {
        let form = PreferenceForm::new().check(Category::Marketing).set(Category::Marketing, false);
        assert!(!form.is_checked(Category::Marketing));
    }

    #[test]
    fn views_follow_configuration() {
        let config = WidgetConfig::builder()
            .client_id("c")
            .marketing(false)
            .language("fr")
            .position(BannerPosition::Modal)
            .build()
            .unwrap();

        let banner = BannerView::from_config(&config);
        assert_eq!(banner.position, BannerPosition::Modal);
        assert_eq!(banner.language, "fr");
        assert_eq!(banner.categories, vec![Category::Necessary, Category::Analytics, Category::Preferences]);

        let prefs = PreferencesView::from_config(&config, None);
        assert_eq!(prefs.current, ConsentCategories::necessary_only());
    }
}
