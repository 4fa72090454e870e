//! Portal login session
//!
//! Authenticates against the partner portal by locating the login form on the
//! entry page, filling in the credential fields alongside any preset hidden
//! inputs, and submitting a standard form post on a cookie-carrying client.
//!
//! Authentication success is NOT verified here: the portal answers a rejected
//! login with a normal page that simply lacks roster links, so failure only
//! becomes visible during link discovery. That upstream ambiguity is a known
//! property of the portal, not something this module can detect.

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::config::AppConfig;

static INPUT_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("input[name]").unwrap());

/// Portal credentials, held only for the duration of the login call.
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Authenticated browsing handle plus the page the login submission landed on.
/// The cookie store on `client` carries the portal session for all subsequent
/// requests of the run.
pub struct PortalSession {
    pub client: Client,
    pub page_url: Url,
    pub page_html: String,
}

/// Open the portal entry page, submit the login form, and return the session
/// positioned on the post-login page.
pub async fn authenticate(config: &AppConfig, credentials: Credentials) -> Result<PortalSession> {
    let client = Client::builder()
        .cookie_store(true)
        .timeout(Duration::from_secs(config.http.timeout_secs))
        .user_agent(&config.http.user_agent)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .context("Failed to build HTTP client")?;

    debug!("Opening portal entry page: {}", config.portal.url);
    let response = client
        .get(&config.portal.url)
        .send()
        .await
        .context("Failed to open portal entry page")?;
    let entry_url = response.url().clone();
    let entry_html = response
        .text()
        .await
        .context("Failed to read portal entry page")?;

    let form = LoginForm::locate(&entry_html, &config.portal.login_form_class, &entry_url)?;
    let fields = form.fill(&credentials.username, &credentials.password);

    info!("Submitting login form to {}", form.action);
    let response = client
        .post(form.action.clone())
        .form(&fields)
        .send()
        .await
        .context("Login form submission failed")?;
    let page_url = response.url().clone();
    let page_html = response
        .text()
        .await
        .context("Failed to read post-login page")?;

    Ok(PortalSession {
        client,
        page_url,
        page_html,
    })
}

/// The portal login form: resolved action URL plus every named input's preset
/// value (hidden fields included).
#[derive(Debug)]
struct LoginForm {
    action: Url,
    inputs: Vec<(String, String)>,
}

impl LoginForm {
    fn locate(html: &str, form_class: &str, base: &Url) -> Result<Self> {
        let document = Html::parse_document(html);
        let selector = Selector::parse(&format!("form.{form_class}"))
            .map_err(|e| anyhow!("Invalid login form selector for class '{form_class}': {e}"))?;
        let form = document.select(&selector).next().ok_or_else(|| {
            anyhow!("No login form with class '{form_class}' on the portal entry page")
        })?;

        let action = match form.value().attr("action") {
            Some(action) => base
                .join(action)
                .with_context(|| format!("Invalid login form action '{action}'"))?,
            None => base.clone(),
        };

        let inputs = form
            .select(&INPUT_SELECTOR)
            .filter_map(|input| {
                let name = input.value().attr("name")?;
                let value = input.value().attr("value").unwrap_or_default();
                Some((name.to_string(), value.to_string()))
            })
            .collect();

        Ok(LoginForm { action, inputs })
    }

    /// Preset field values with `username`/`password` overridden, appending
    /// either field if the form did not declare it.
    fn fill(&self, username: &str, password: &str) -> Vec<(String, String)> {
        let mut fields = self.inputs.clone();
        for (name, value) in &mut fields {
            if name == "username" {
                *value = username.to_string();
            } else if name == "password" {
                *value = password.to_string();
            }
        }
        if !fields.iter().any(|(name, _)| name == "username") {
            fields.push(("username".to_string(), username.to_string()));
        }
        if !fields.iter().any(|(name, _)| name == "password") {
            fields.push(("password".to_string(), password.to_string()));
        }
        fields
    }
}
