//! Roster download link discovery
//!
//! Scans the post-login page for anchors whose visible text starts with the
//! configured roster prefix. The portal lists the newest file first, so the
//! first match in document order is the latest roster; no date parsing is
//! performed and no independent recency sort is applied.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::session::PortalSession;

static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());

#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// No anchor on the page matched the roster prefix. This conflates a
    /// rejected login with portal-layout drift and an empty roster listing;
    /// the portal gives no way to tell them apart, so the presentation layer
    /// treats it as a login failure.
    #[error("no roster download links found on the portal page")]
    NoRosterLinks,
}

/// Reference to the most recent roster archive on the portal.
#[derive(Debug, Clone)]
pub struct DownloadLink {
    /// Visible anchor text (the roster filename)
    pub text: String,
    /// Absolute download URL
    pub url: Url,
}

/// Find the newest roster download link on the session's current page.
pub fn find_latest(session: &PortalSession, prefix: &str) -> Result<DownloadLink, DiscoveryError> {
    let document = Html::parse_document(&session.page_html);

    for anchor in document.select(&ANCHOR_SELECTOR) {
        let text = anchor.text().collect::<String>();
        let text = text.trim();
        if !text.starts_with(prefix) {
            continue;
        }
        let Some(href) = anchor.value().attr("href") else {
            debug!("Roster anchor '{text}' has no href, skipping");
            continue;
        };
        let Ok(url) = session.page_url.join(href) else {
            debug!("Roster anchor '{text}' has unusable href '{href}', skipping");
            continue;
        };
        // Newest-first listing: take the first match in document order.
        info!("Latest roster link: {text}");
        return Ok(DownloadLink {
            text: text.to_string(),
            url,
        });
    }

    Err(DiscoveryError::NoRosterLinks)
}
