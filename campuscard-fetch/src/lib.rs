//! campuscard-fetch: download a campus-card transaction history from the
//! portal using browser-copied session cookies.

pub mod credentials;
pub mod error;
pub mod paginate;
pub mod portal;

pub use credentials::Credentials;
pub use error::PortalError;
pub use paginate::{fetch_all, FetchOptions, FetchOutcome};
pub use portal::{PageRequest, PageSource, PortalClient, PortalPage, DEFAULT_BASE_URL};

use anyhow::{Context, Result};
use campuscard_core::{output_file_name, save_batch, QueryRange};
use std::path::{Path, PathBuf};

/// Fetch all pages and write them to
/// `<out_dir>/card_transactions_<account>_<range>.json`.
///
/// Nothing is written unless every page succeeded.
pub async fn fetch_to_file<S: PageSource>(
    source: &S,
    account: &str,
    range: QueryRange,
    opts: FetchOptions,
    out_dir: &Path,
) -> Result<(PathBuf, FetchOutcome)> {
    let outcome = fetch_all(source, account, range, opts).await?;

    if outcome.transactions.is_empty() {
        tracing::warn!(account, "no transactions returned for {} to {}", range.sdate(), range.edate());
    }

    std::fs::create_dir_all(out_dir).with_context(|| format!("create {}", out_dir.display()))?;
    let path = out_dir.join(output_file_name(account, &range));
    save_batch(&path, &outcome.transactions)?;
    tracing::info!(path = %path.display(), records = outcome.transactions.len(), "transactions saved");

    Ok((path, outcome))
}
