//! Client side of the remote consent log.
//!
//! Every consent decision is reported once with a single `POST
//! {api_endpoint}/consent`. Delivery is fire-and-forget: the request runs as a
//! [`DetachedTask`], failures are logged and dropped, nothing is retried and
//! nothing is deduplicated. The consent is already persisted locally by the
//! time the report starts.

use crate::config::WidgetConfig;
use crate::consent::ConsentRecord;
use crate::errors::{ConsentError, ReportError};
use crate::net::DetachedTask;
use serde::Serialize;
use tokio::runtime::Handle;
use url::Url;

/// JSON body of the consent log request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentLogPayload {
    pub client_id: String,
    pub visitor_id: String,
    pub consent_data: ConsentRecord,
}

/// Delivers consent reports.
pub trait ConsentReporter: Send + Sync {
    /// Starts delivering `payload`. Must not block; the returned task may be dropped.
    fn report(&self, payload: ConsentLogPayload) -> DetachedTask;
}

/// Reports over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpConsentReporter {
    client: reqwest::Client,
    url: Url,
    runtime: Handle,
}

impl HttpConsentReporter {
    pub fn new(config: &WidgetConfig, runtime: Handle) -> Result<Self, ConsentError> {
        let client = reqwest::Client::builder()
            .timeout(config.report_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(ConsentError::HttpClient)?;

        Ok(Self {
            client,
            url: config.consent_url()?,
            runtime,
        })
    }

    /// Target of the report request.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl ConsentReporter for HttpConsentReporter {
    fn report(&self, payload: ConsentLogPayload) -> DetachedTask {
        let client = self.client.clone();
        let url = self.url.clone();

        DetachedTask::spawn(&self.runtime, async move {
            match post_consent(&client, url.clone(), &payload).await {
                Ok(()) => log::debug!("consent reported to {}", url),
                Err(e) => log::warn!("cannot report consent to {}: {}", url, e),
            }
        })
    }
}

// Sends one report. The response body is never read.
async fn post_consent(client: &reqwest::Client, url: Url, payload: &ConsentLogPayload) -> Result<(), ReportError> {
    let res = client.post(url).json(payload).send().await?;
    let status = res.status();
    if !status.is_success() {
        return Err(ReportError::Status(status.as_u16()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consent::ConsentCategories;
    use time::macros::datetime;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    fn payload() -> ConsentLogPayload {
        ConsentLogPayload {
            client_id: "tenant".into(),
            visitor_id: "v1".into(),
            consent_data: ConsentRecord::new(
                "tenant",
                ConsentCategories { analytics: true, ..ConsentCategories::necessary_only() },
                datetime!(2026-10-19 12:00:00 UTC),
            ),
        }
    }

    /// Accepts one connection, captures the raw request and answers with `status_line`.
    async fn one_shot_server(status_line: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                raw.extend_from_slice(&buf[..n]);
                if n == 0 || request_complete(&raw) {
                    break;
                }
            }
            let response = format!("HTTP/1.1 {}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n", status_line);
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = tx.send(String::from_utf8_lossy(&raw).into_owned());
        });

        (format!("http://{}", addr), rx)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let len = head
            .lines()
            .find_map(|l| {
                let (k, v) = l.split_once(':')?;
                k.eq_ignore_ascii_case("content-length").then(|| v.trim().parse::<usize>().ok())?
            })
            .unwrap_or(0);
        body.len() >= len
    }

    fn reporter(endpoint: &str) -> HttpConsentReporter {
        let config = WidgetConfig::builder().client_id("tenant").api_endpoint(endpoint).build().unwrap();
        HttpConsentReporter::new(&config, Handle::current()).unwrap()
    }

    #[tokio::test]
    async fn posts_json_to_consent_resource() {
        let (endpoint, captured) = one_shot_server("204 No Content").await;
        let reporter = reporter(&endpoint);

        reporter.report(payload()).wait().await;

        let raw = captured.await.unwrap();
        assert!(raw.starts_with("POST /consent HTTP/1.1"));
        assert!(raw.to_ascii_lowercase().contains("content-type: application/json"));

        let body = raw.split_once("\r\n\r\n").unwrap().1;
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["clientId"], "tenant");
        assert_eq!(json["visitorId"], "v1");
        assert_eq!(json["consentData"]["clientId"], "tenant");
        assert_eq!(json["consentData"]["timestamp"], "2026-10-19T12:00:00Z");
        assert_eq!(json["consentData"]["categories"]["analytics"], true);
        assert_eq!(json["consentData"]["categories"]["marketing"], false);
    }

    #[tokio::test]
    async fn error_status_is_swallowed() {
        let (endpoint, captured) = one_shot_server("500 Internal Server Error").await;
        let reporter = reporter(&endpoint);

        reporter.report(payload()).wait().await;
        assert!(captured.await.is_ok());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_swallowed() {
        // Grab a free port, then close it again
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let reporter = reporter(&format!("http://{}", addr));
        reporter.report(payload()).wait().await;
    }

    #[tokio::test]
    async fn post_consent_reports_status() {
        let (endpoint, _captured) = one_shot_server("404 Not Found").await;
        let client = reqwest::Client::new();
        let url = Url::parse(&format!("{}/consent", endpoint)).unwrap();

        let err = post_consent(&client, url, &payload()).await.unwrap_err();
        assert!(matches!(err, ReportError::Status(404)));
    }
}
