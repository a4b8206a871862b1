//! Runs the consent flow without a UI against a file-backed cookie store.
//!
//! ```text
//! RUST_LOG=debug cargo run --example headless -- accept https://consent.example.com
//! ```

use std::sync::Arc;

use consenthub::consent::ConsentModeIntegration;
use consenthub::cookies::JsonCookieStore;
use consenthub::presenter::{BannerView, Presenter, PreferencesView};
use consenthub::{ConsentHub, WidgetConfig};

struct TerminalPresenter;

impl Presenter for TerminalPresenter {
    fn show_banner(&self, view: &BannerView) {
        let names: Vec<_> = view.categories.iter().map(|c| c.as_str()).collect();
        println!("[banner @ {:?}] we use cookies for: {}", view.position, names.join(", "));
    }

    fn show_preferences(&self, view: &PreferencesView) {
        for c in &view.categories {
            println!("  [{}] {}", if view.current.get(*c) { "x" } else { " " }, c);
        }
    }

    fn hide(&self) {
        println!("[banner closed]");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let action = args.next().unwrap_or_else(|| "accept".to_string());
    let endpoint = args.next().unwrap_or_else(|| "http://127.0.0.1:8080".to_string());

    let config = WidgetConfig::builder()
        .client_id("demo-site")
        .api_endpoint(endpoint)
        .marketing(false)
        .build()?;

    let hub = ConsentHub::builder(config)
        .cookie_store(JsonCookieStore::new("consenthub-demo-cookies.json".into()))
        .presenter(Arc::new(TerminalPresenter))
        .integration(Arc::new(ConsentModeIntegration::new(|update| {
            println!("consent mode update: {}", serde_json::to_string(update)?);
            Ok(())
        })))
        .start()?;

    println!("visitor {}, load outcome {:?}", hub.visitor_id(), hub.load_outcome());

    let update = match action.as_str() {
        "reject" => hub.reject_all(),
        "prefs" => {
            hub.show_preferences();
            return Ok(());
        }
        _ => hub.accept_all(),
    };

    println!("stored: {}", serde_json::to_string(&update.record)?);
    update.report.wait().await;
    Ok(())
}
