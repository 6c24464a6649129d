//! Platform definition types and structures.
//!
//! This module defines the data structures for platform definitions loaded
//! from TOML files. A definition carries everything site-specific: base
//! URLs, search URL templates, CSS selectors, and the apply method. The
//! adapters stay generic; the definitions are data.

use crate::error::{PlatformError, Result};
use jobsweep_core::PlatformId;
use serde::{Deserialize, Serialize};

/// Complete platform definition loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformDefinition {
    /// Core platform metadata
    pub platform: PlatformMetadata,

    /// Search configuration
    pub search: SearchMethod,

    /// Application submission configuration
    pub apply: ApplyMethod,

    /// Login flow, for platforms that require an authenticated session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<LoginFlow>,
}

impl PlatformDefinition {
    /// Get the platform ID.
    #[must_use]
    pub fn id(&self) -> &PlatformId {
        &self.platform.id
    }

    /// Get the human-readable platform name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.platform.name
    }

    /// Whether this definition supports automated application submission.
    #[must_use]
    pub fn supports_apply(&self) -> bool {
        matches!(self.apply, ApplyMethod::EasyApply { .. })
    }

    /// Validate the platform definition for completeness and correctness.
    pub fn validate(&self) -> Result<()> {
        if self.platform.name.is_empty() {
            return Err(self.invalid("platform name cannot be empty"));
        }

        if self.platform.base_url.is_empty() {
            return Err(self.invalid("platform base_url cannot be empty"));
        }

        self.search.validate(&self.platform.id)?;
        self.apply.validate(&self.platform.id)?;

        if let Some(login) = &self.login {
            login.validate(&self.platform.id)?;
        }

        // A browser login flow is meaningless for a plain-document platform.
        if self.login.is_some() && matches!(self.search, SearchMethod::UrlTemplate { .. }) {
            return Err(self.invalid("url-template platforms cannot carry a login flow"));
        }

        // Easy-apply needs a browser session to drive the form.
        if self.supports_apply() && matches!(self.search, SearchMethod::UrlTemplate { .. }) {
            return Err(self.invalid("easy-apply requires a browser-flow search method"));
        }

        Ok(())
    }

    fn invalid(&self, reason: &str) -> PlatformError {
        PlatformError::Definition {
            platform: self.platform.id.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Core platform metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformMetadata {
    /// Unique platform identifier (e.g., "linkedin", "indeed")
    pub id: PlatformId,

    /// Human-readable platform name
    pub name: String,

    /// Platform website URL
    pub base_url: String,

    /// Page-content markers that indicate a detection challenge.
    /// Matched case-insensitively against the page HTML.
    #[serde(default)]
    pub detection_markers: Vec<String>,
}

/// Methods for searching a platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum SearchMethod {
    /// Browser-driven search: navigate a templated URL in a full browser
    /// session and extract listings card by card. Needed for sites that
    /// render results with JavaScript.
    BrowserFlow {
        /// Search URL template with `{keywords}`, `{location}`,
        /// `{job_type}`, `{date_posted}` and `{limit}` placeholders
        url_template: String,
        /// Selectors for the results list and per-card fields
        selectors: CardSelectors,
    },

    /// Stateless request/parse: fetch a templated URL over plain HTTP and
    /// extract listings from the served document.
    #[serde(rename = "url-template")]
    UrlTemplate {
        /// Search URL template, same placeholders as `BrowserFlow`
        template: String,
        /// Selectors for the results list and per-card fields
        selectors: CardSelectors,
    },
}

impl SearchMethod {
    /// Selectors used to extract listings, whichever the method.
    #[must_use]
    pub fn selectors(&self) -> &CardSelectors {
        match self {
            Self::BrowserFlow { selectors, .. } | Self::UrlTemplate { selectors, .. } => selectors,
        }
    }

    /// The raw search URL template.
    #[must_use]
    pub fn template(&self) -> &str {
        match self {
            Self::BrowserFlow { url_template, .. } => url_template,
            Self::UrlTemplate { template, .. } => template,
        }
    }

    /// Validate the search method configuration.
    fn validate(&self, platform_id: &PlatformId) -> Result<()> {
        let (template, selectors) = match self {
            Self::BrowserFlow {
                url_template,
                selectors,
            } => (url_template, selectors),
            Self::UrlTemplate {
                template,
                selectors,
            } => (template, selectors),
        };

        if template.is_empty() {
            return Err(PlatformError::Definition {
                platform: platform_id.to_string(),
                reason: "search URL template cannot be empty".to_string(),
            });
        }

        if !template.contains("{keywords}") {
            return Err(PlatformError::Definition {
                platform: platform_id.to_string(),
                reason: "search URL template must contain a {keywords} placeholder".to_string(),
            });
        }

        selectors.validate(platform_id)
    }
}

/// CSS selectors for extracting job listings from a results page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardSelectors {
    /// Selector that confirms the results page has loaded
    pub results_list: String,

    /// Selector matching one listing card
    pub job_card: String,

    /// Selector for the job title within a card
    pub title: String,

    /// Selector for the company name within a card
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    /// Selector for the location within a card
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Selector for the listing anchor within a card (href is the link)
    pub link: String,
}

impl CardSelectors {
    fn validate(&self, platform_id: &PlatformId) -> Result<()> {
        for (field, value) in [
            ("results_list", &self.results_list),
            ("job_card", &self.job_card),
            ("title", &self.title),
            ("link", &self.link),
        ] {
            if value.is_empty() {
                return Err(PlatformError::Definition {
                    platform: platform_id.to_string(),
                    reason: format!("search.selectors.{field} cannot be empty"),
                });
            }
        }
        Ok(())
    }
}

/// Browser login flow for platforms requiring an authenticated session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginFlow {
    /// URL of the sign-in page
    pub url: String,

    /// Selector for the username/email input
    pub username_input: String,

    /// Selector for the password input
    pub password_input: String,

    /// Selector for the submit button
    pub submit_button: String,

    /// Selector that appears only when logged in; also used to probe for
    /// an already-authenticated session before running the login flow
    pub logged_in_marker: String,

    /// Selector for a cookie consent button to dismiss before logging in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_consent_button: Option<String>,
}

impl LoginFlow {
    fn validate(&self, platform_id: &PlatformId) -> Result<()> {
        for (field, value) in [
            ("url", &self.url),
            ("username_input", &self.username_input),
            ("password_input", &self.password_input),
            ("submit_button", &self.submit_button),
            ("logged_in_marker", &self.logged_in_marker),
        ] {
            if value.is_empty() {
                return Err(PlatformError::Definition {
                    platform: platform_id.to_string(),
                    reason: format!("login.{field} cannot be empty"),
                });
            }
        }
        Ok(())
    }
}

/// Methods for submitting an application on a platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum ApplyMethod {
    /// In-page multi-step application form (e.g. LinkedIn Easy Apply)
    EasyApply {
        /// Selectors driving the apply flow
        selectors: ApplySelectors,
    },

    /// No automated application; listings redirect to employer sites
    Manual {
        /// Why automation is not possible, surfaced in skip reasons
        #[serde(default)]
        reason: String,
    },
}

impl ApplyMethod {
    fn validate(&self, platform_id: &PlatformId) -> Result<()> {
        match self {
            Self::EasyApply { selectors } => selectors.validate(platform_id),
            Self::Manual { .. } => Ok(()),
        }
    }
}

/// CSS selectors for the multi-step apply flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplySelectors {
    /// Selector for the apply control on a listing page. When absent from
    /// the page, the listing does not support automated application.
    pub apply_button: String,

    /// Selector for the "continue to next step" button
    pub next_button: String,

    /// Selector for the final submit button
    pub submit_button: String,

    /// Selector confirming the application was received
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_indicator: Option<String>,
}

impl ApplySelectors {
    fn validate(&self, platform_id: &PlatformId) -> Result<()> {
        for (field, value) in [
            ("apply_button", &self.apply_button),
            ("next_button", &self.next_button),
            ("submit_button", &self.submit_button),
        ] {
            if value.is_empty() {
                return Err(PlatformError::Definition {
                    platform: platform_id.to_string(),
                    reason: format!("apply.selectors.{field} cannot be empty"),
                });
            }
        }
        Ok(())
    }
}
