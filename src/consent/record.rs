//! Consent categories and the persisted consent record.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use time::OffsetDateTime;

/// A class of cookie/tracking purpose the user can allow or deny.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Necessary,
    Analytics,
    Marketing,
    Preferences,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Necessary,
        Category::Analytics,
        Category::Marketing,
        Category::Preferences,
    ];

    /// The categories a user can toggle.
    pub const OPTIONAL: [Category; 3] = [Category::Analytics, Category::Marketing, Category::Preferences];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Necessary => "necessary",
            Category::Analytics => "analytics",
            Category::Marketing => "marketing",
            Category::Preferences => "preferences",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown consent category {0:?}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Allow/deny per category. All four keys are required when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentCategories {
    pub necessary: bool,
    pub analytics: bool,
    pub marketing: bool,
    pub preferences: bool,
}

impl Default for ConsentCategories {
    fn default() -> Self {
        Self::necessary_only()
    }
}

impl ConsentCategories {
    /// Everything optional denied.
    pub fn necessary_only() -> Self {
        Self {
            necessary: true,
            analytics: false,
            marketing: false,
            preferences: false,
        }
    }

    pub fn get(&self, category: Category) -> bool {
        match category {
            Category::Necessary => self.necessary,
            Category::Analytics => self.analytics,
            Category::Marketing => self.marketing,
            Category::Preferences => self.preferences,
        }
    }

    pub fn set(&mut self, category: Category, allowed: bool) {
        match category {
            Category::Necessary => self.necessary = allowed,
            Category::Analytics => self.analytics = allowed,
            Category::Marketing => self.marketing = allowed,
            Category::Preferences => self.preferences = allowed,
        }
    }

    /// Same choices with `necessary` forced on.
    pub fn with_necessary(mut self) -> Self {
        self.necessary = true;
        self
    }

    /// Iterates `(category, allowed)` in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, bool)> + '_ {
        Category::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

impl FromIterator<(Category, bool)> for ConsentCategories {
    /// Categories not mentioned are denied; `necessary` is not forced here.
    fn from_iter<I: IntoIterator<Item = (Category, bool)>>(iter: I) -> Self {
        let mut categories = ConsentCategories {
            necessary: false,
            analytics: false,
            marketing: false,
            preferences: false,
        };
        for (c, allowed) in iter {
            categories.set(c, allowed);
        }
        categories
    }
}

/// The persisted outcome of one consent decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentRecord {
    /// Creation time, fixed when the record is built.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub client_id: String,
    pub categories: ConsentCategories,
}

impl ConsentRecord {
    /// Builds a record stamped `now` (truncated to milliseconds), with `necessary` forced on.
    pub fn new(client_id: impl Into<String>, categories: ConsentCategories, now: OffsetDateTime) -> Self {
        let now = now.to_offset(time::UtcOffset::UTC);
        let timestamp = now
            .replace_nanosecond(u32::from(now.millisecond()) * 1_000_000)
            .unwrap_or(now);

        Self {
            timestamp,
            client_id: client_id.into(),
            categories: categories.with_necessary(),
        }
    }
}
