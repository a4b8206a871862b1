//! Embeddable cookie-consent component.
//!
//! The crate captures a visitor's per-category consent, keeps it in cookie
//! storage, reports it to a remote consent log and tells interested parties
//! about it. Rendering is left to a [`Presenter`](presenter::Presenter)
//! supplied by the host.
//!
//! Start with [`ConsentHub::builder`].

pub mod config;
pub mod consent;
pub mod cookies;
pub mod errors;
pub mod hub;
pub mod identity;
pub mod net;
pub mod presenter;
pub mod storage;

/// Capacity of the consent notification channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 128;

pub use config::{ConfigError, WidgetConfig};
pub use consent::{Category, ConsentCategories, ConsentRecord};
pub use errors::ConsentError;
pub use hub::ConsentHub;
