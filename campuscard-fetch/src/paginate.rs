//! Sequential pagination over the portal query with per-page retry.

use anyhow::{Context, Result};
use campuscard_core::{CardTransaction, QueryRange};
use std::time::Duration;

use crate::error::PortalError;
use crate::portal::{PageRequest, PageSource};

pub const DEFAULT_ROWS: u32 = 50;
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchOptions {
    /// Page size sent as `rows`.
    pub rows: u32,
    /// Pause before every page after the first; also the retry backoff unit.
    pub delay: Duration,
    /// Attempts per page (at least one is always made).
    pub max_retries: u32,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            delay: DEFAULT_DELAY,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Everything one fetch run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub transactions: Vec<CardTransaction>,
    /// Record count the portal claimed on page 1.
    pub reported_total: u64,
    pub pages: u32,
}

/// Number of pages needed for `total` records at `rows` per page.
pub fn page_count(total: u64, rows: u32) -> u32 {
    let rows = u64::from(rows.max(1));
    total.div_ceil(rows).try_into().unwrap_or(u32::MAX)
}

/// Backoff before retry `attempt` (0-based): `delay * (attempt + 2)`.
pub fn retry_delay(delay: Duration, attempt: u32) -> Duration {
    delay * (attempt + 2)
}

/// Fetch every page of `range` for `account`, one request at a time, and
/// concatenate the rows in page order. Any page that still fails after its
/// retries aborts the whole run.
pub async fn fetch_all<S: PageSource>(
    source: &S,
    account: &str,
    range: QueryRange,
    opts: FetchOptions,
) -> Result<FetchOutcome> {
    let mut req = PageRequest {
        account: account.to_string(),
        range,
        page: 1,
        rows: opts.rows.max(1),
    };

    let first = fetch_with_retry(source, &req, opts)
        .await
        .context("fetching first page; check that your session cookies are valid and not expired")?;

    let total_pages = page_count(first.total, req.rows);
    tracing::info!(
        total = first.total,
        pages = total_pages,
        rows = req.rows,
        "found {} transactions across {} pages",
        first.total,
        total_pages
    );

    let mut transactions = first.rows;
    let mut pages = 1;

    for page in 2..=total_pages {
        tokio::time::sleep(opts.delay).await;
        req.page = page;
        tracing::info!(page, total_pages, "fetching page {page}/{total_pages}");

        let next = fetch_with_retry(source, &req, opts)
            .await
            .with_context(|| format!("fetching page {page}/{total_pages}"))?;
        pages = page;

        if next.rows.is_empty() {
            tracing::warn!(page, "portal returned an empty page; stopping early");
            break;
        }
        transactions.extend(next.rows);
    }

    Ok(FetchOutcome {
        transactions,
        reported_total: first.total,
        pages,
    })
}

async fn fetch_with_retry<S: PageSource>(
    source: &S,
    req: &PageRequest,
    opts: FetchOptions,
) -> Result<crate::portal::PortalPage, PortalError> {
    let attempts = opts.max_retries.max(1);
    let mut attempt = 0;
    loop {
        match source.fetch_page(req).await {
            Ok(page) => return Ok(page),
            Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                let wait = retry_delay(opts.delay, attempt);
                tracing::warn!(
                    page = req.page,
                    attempt = attempt + 1,
                    attempts,
                    error = %e,
                    "page request failed; retrying in {:.1}s",
                    wait.as_secs_f64()
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::PortalPage;
    use campuscard_core::parse_batch;
    use chrono::NaiveDate;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Scripted source: answers requests in order, records what it was asked.
    struct Scripted {
        answers: RefCell<VecDeque<Result<PortalPage, PortalError>>>,
        seen: RefCell<Vec<u32>>,
    }

    impl Scripted {
        fn new(answers: Vec<Result<PortalPage, PortalError>>) -> Self {
            Self {
                answers: RefCell::new(answers.into()),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl PageSource for Scripted {
        async fn fetch_page(&self, req: &PageRequest) -> Result<PortalPage, PortalError> {
            self.seen.borrow_mut().push(req.page);
            self.answers
                .borrow_mut()
                .pop_front()
                .expect("unexpected extra request")
        }
    }

    fn page(total: u64, rows: &str) -> Result<PortalPage, PortalError> {
        Ok(PortalPage {
            total,
            rows: parse_batch(rows).unwrap(),
        })
    }

    fn range() -> QueryRange {
        QueryRange::new(
            NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
        )
        .unwrap()
    }

    fn fast(rows: u32) -> FetchOptions {
        FetchOptions {
            rows,
            delay: Duration::ZERO,
            max_retries: 3,
        }
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 50), 0);
        assert_eq!(page_count(1, 50), 1);
        assert_eq!(page_count(50, 50), 1);
        assert_eq!(page_count(101, 50), 3);
        assert_eq!(page_count(3, 0), 3);
    }

    #[test]
    fn test_retry_delay_grows_linearly() {
        let d = Duration::from_millis(500);
        assert_eq!(retry_delay(d, 0), Duration::from_millis(1000));
        assert_eq!(retry_delay(d, 1), Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_concatenates_pages_in_order() {
        let src = Scripted::new(vec![
            page(5, r#"[{"id":1},{"id":2}]"#),
            page(5, r#"[{"id":3},{"id":4}]"#),
            page(5, r#"[{"id":5}]"#),
        ]);
        let out = fetch_all(&src, "122579", range(), fast(2)).await.unwrap();
        let ids: Vec<_> = out.transactions.iter().map(|t| t.get("id").unwrap().as_i64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(out.pages, 3);
        assert_eq!(out.reported_total, 5);
        assert_eq!(*src.seen.borrow(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_empty_result_single_request() {
        let src = Scripted::new(vec![page(0, "[]")]);
        let out = fetch_all(&src, "1", range(), fast(50)).await.unwrap();
        assert!(out.transactions.is_empty());
        assert_eq!(*src.seen.borrow(), vec![1]);
    }

    #[tokio::test]
    async fn test_stops_on_empty_page() {
        let src = Scripted::new(vec![page(6, r#"[{"id":1},{"id":2}]"#), page(6, "[]")]);
        let out = fetch_all(&src, "1", range(), fast(2)).await.unwrap();
        assert_eq!(out.transactions.len(), 2);
        assert_eq!(*src.seen.borrow(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let src = Scripted::new(vec![
            Err(PortalError::Status { status: 502, snippet: "bad gateway".into() }),
            page(1, r#"[{"id":1}]"#),
        ]);
        let out = fetch_all(&src, "1", range(), fast(50)).await.unwrap();
        assert_eq!(out.transactions.len(), 1);
        assert_eq!(*src.seen.borrow(), vec![1, 1]);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let src = Scripted::new(vec![
            page(4, r#"[{"id":1},{"id":2}]"#),
            Err(PortalError::Status { status: 500, snippet: String::new() }),
            Err(PortalError::Status { status: 500, snippet: String::new() }),
            Err(PortalError::Status { status: 500, snippet: String::new() }),
        ]);
        let err = fetch_all(&src, "1", range(), fast(2)).await.unwrap_err();
        assert!(format!("{err:#}").contains("page 2/2"));
        assert!(format!("{err:#}").contains("HTTP 500"));
        assert_eq!(*src.seen.borrow(), vec![1, 2, 2, 2]);
    }

    #[tokio::test]
    async fn test_unauthorized_is_not_retried() {
        let src = Scripted::new(vec![Err(PortalError::Unauthorized { status: 403 })]);
        let err = fetch_all(&src, "1", range(), fast(50)).await.unwrap_err();
        assert!(format!("{err:#}").contains("credentials rejected"));
        assert_eq!(*src.seen.borrow(), vec![1]);
    }
}
