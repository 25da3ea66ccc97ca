//! The campus-card portal's transaction query endpoint.
//!
//!   POST {base}/Report/GetPersonTrjn
//!   form: sdate=YYYY-MM-DD&edate=YYYY-MM-DD&account=..&page=N&rows=M
//!   resp: {"total": 123, "rows": [ {...}, ... ]}

use anyhow::{Context, Result};
use campuscard_core::{CardTransaction, QueryRange};
use reqwest::header::{COOKIE, USER_AGENT};
use serde_json::Value;
use std::time::Duration;

use crate::credentials::Credentials;
use crate::error::{snippet, PortalError};

pub const DEFAULT_BASE_URL: &str = "https://card.pku.edu.cn";
pub const QUERY_PATH: &str = "/Report/GetPersonTrjn";

/// One page of the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub account: String,
    pub range: QueryRange,
    /// 1-based
    pub page: u32,
    pub rows: u32,
}

impl PageRequest {
    pub fn form(&self) -> Vec<(&'static str, String)> {
        vec![
            ("sdate", self.range.sdate()),
            ("edate", self.range.edate()),
            ("account", self.account.clone()),
            ("page", self.page.to_string()),
            ("rows", self.rows.to_string()),
        ]
    }
}

/// Decoded page: the server-side record count and this page's rows.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalPage {
    pub total: u64,
    pub rows: Vec<CardTransaction>,
}

impl PortalPage {
    /// Decode a response body. Anything that is not `{"total": n, "rows": [..]}`
    /// is reported with the start of the body attached.
    pub fn parse(body: &str) -> Result<Self, PortalError> {
        let trimmed = body.trim_start();
        if trimmed.starts_with('<') {
            return Err(PortalError::SessionExpired { snippet: snippet(body) });
        }

        let value: Value = serde_json::from_str(body).map_err(|source| PortalError::Decode {
            source,
            snippet: snippet(body),
        })?;

        let total = value.get("total").and_then(|t| match t {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });
        let Some(total) = total else {
            return Err(PortalError::UnexpectedFormat {
                reason: "no `total` field".to_string(),
                snippet: snippet(body),
            });
        };

        let rows = match value.get("rows") {
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    CardTransaction::from_value(v.clone()).ok_or_else(|| PortalError::UnexpectedFormat {
                        reason: format!("row {i} is not a JSON object"),
                        snippet: snippet(body),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            _ => Vec::new(),
        };

        Ok(Self { total, rows })
    }
}

/// Anything that can answer a page query: the live portal, or a fake in tests.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn fetch_page(&self, req: &PageRequest) -> Result<PortalPage, PortalError>;
}

/// reqwest-backed client for the live portal.
pub struct PortalClient {
    http: reqwest::Client,
    url: String,
    credentials: Credentials,
}

impl PortalClient {
    pub fn new(base_url: &str, credentials: Credentials, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;

        Ok(Self::with_http(base_url, credentials, http))
    }

    /// Use a caller-configured reqwest client (proxy settings, TLS, ...).
    pub fn with_http(base_url: &str, credentials: Credentials, http: reqwest::Client) -> Self {
        Self {
            http,
            url: format!("{}{}", base_url.trim_end_matches('/'), QUERY_PATH),
            credentials,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl PageSource for PortalClient {
    async fn fetch_page(&self, req: &PageRequest) -> Result<PortalPage, PortalError> {
        tracing::debug!(url = %self.url, page = req.page, rows = req.rows, "POST page");

        let resp = self
            .http
            .post(&self.url)
            .header(COOKIE, self.credentials.cookie_header())
            .header(USER_AGENT, concat!("campuscard/", env!("CARGO_PKG_VERSION")))
            .form(&req.form())
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(PortalError::Unauthorized { status: status.as_u16() });
        }
        if !status.is_success() {
            return Err(PortalError::Status {
                status: status.as_u16(),
                snippet: snippet(&body),
            });
        }

        PortalPage::parse(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_form_fields() {
        let req = PageRequest {
            account: "122579".to_string(),
            range: QueryRange::new(
                NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 11, 20).unwrap(),
            )
            .unwrap(),
            page: 3,
            rows: 50,
        };
        let form = req.form();
        assert_eq!(form[0], ("sdate", "2024-09-01".to_string()));
        assert_eq!(form[1], ("edate", "2024-11-20".to_string()));
        assert_eq!(form[3], ("page", "3".to_string()));
        assert_eq!(form[4], ("rows", "50".to_string()));
    }

    #[test]
    fn test_parse_page() {
        let page = PortalPage::parse(
            r#"{"total": 2, "rows": [{"TRANAMT": -1.5}, {"TRANAMT": -2}]}"#,
        )
        .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.rows[1].amount(), Some(-2.0));
    }

    #[test]
    fn test_parse_string_total_and_missing_rows() {
        let page = PortalPage::parse(r#"{"total": "0"}"#).unwrap();
        assert_eq!(page.total, 0);
        assert!(page.rows.is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            PortalPage::parse(r#"{"rows": []}"#),
            Err(PortalError::UnexpectedFormat { .. })
        ));
        assert!(matches!(
            PortalPage::parse("<!DOCTYPE html><html>login</html>"),
            Err(PortalError::SessionExpired { .. })
        ));
        assert!(matches!(
            PortalPage::parse("{\"total\": 1, "),
            Err(PortalError::Decode { .. })
        ));
    }

    #[test]
    fn test_non_object_row_rejected() {
        let err = PortalPage::parse(r#"{"total": 2, "rows": [{"TRANAMT": -1.5}, "oops"]}"#).unwrap_err();
        assert!(!err.is_retryable());
        let msg = err.to_string();
        assert!(msg.contains("row 1 is not a JSON object"), "{msg}");
        assert!(msg.contains("oops"));
    }

    #[test]
    fn test_client_url_joins_path() {
        let creds = Credentials::new("1", "a", "b").unwrap();
        let c = PortalClient::new("http://127.0.0.1:9/", creds, Duration::from_secs(5)).unwrap();
        assert_eq!(c.url(), "http://127.0.0.1:9/Report/GetPersonTrjn");
    }
}
