use anyhow::{bail, Result};
use std::fmt;

/// Cookie names the portal issues after a browser login.
pub const SESSION_COOKIE: &str = "ASP.NETSessionId";
pub const HALLTICKET_COOKIE: &str = "hallticket";

/// Account number plus the two browser-copied session cookies.
///
/// Held in memory for one run; never written anywhere.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub account: String,
    session_id: String,
    hall_ticket: String,
}

impl Credentials {
    pub fn new(account: &str, session_id: &str, hall_ticket: &str) -> Result<Self> {
        let account = account.trim();
        let session_id = session_id.trim();
        let hall_ticket = hall_ticket.trim();

        if account.is_empty() {
            bail!("account number is required");
        }
        if session_id.is_empty() || hall_ticket.is_empty() {
            bail!("both {SESSION_COOKIE} and {HALLTICKET_COOKIE} are required");
        }

        Ok(Self {
            account: account.to_string(),
            session_id: session_id.to_string(),
            hall_ticket: hall_ticket.to_string(),
        })
    }

    /// Value for the `Cookie` request header.
    pub fn cookie_header(&self) -> String {
        format!(
            "{SESSION_COOKIE}={}; {HALLTICKET_COOKIE}={}",
            self.session_id, self.hall_ticket
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account", &self.account)
            .field("session_id", &"<redacted>")
            .field("hall_ticket", &"<redacted>")
            .finish()
    }
}
