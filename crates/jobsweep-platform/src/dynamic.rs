//! Browser-driven platform adapter.
//!
//! Drives platforms that render listings with JavaScript and require an
//! authenticated session: login flow, card-by-card search extraction, and
//! the bounded multi-step apply loop.

use crate::adapter::{
    render_search_url, ApplyOutcome, CandidateStream, DocumentSet, PlatformAdapter, RotationHint,
    SearchQuery,
};
use crate::definition::{ApplyMethod, CardSelectors, PlatformDefinition, SearchMethod};
use crate::error::{PlatformError, Result};
use async_trait::async_trait;
use jobsweep_browser::{BrowserEngine, Element};
use jobsweep_core::{DelayConfig, Job, JobCandidate, PlatformId};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Short wait for optional elements (cookie banners, already-logged-in
/// probes, step buttons) that may legitimately be absent.
const SHORT_WAIT: Duration = Duration::from_secs(5);

/// Upper bound on multi-step apply form pages before giving up.
const MAX_APPLY_STEPS: usize = 8;

/// Detection markers checked on every page regardless of definition.
const BUILTIN_DETECTION_MARKERS: &[&str] = &["captcha", "g-recaptcha", "security check"];

/// Stateful adapter for JavaScript-driven platforms.
///
/// Owns its browser session exclusively; the session is launched lazily on
/// the first `authenticate` call and replaced wholesale when a rotation
/// hint is pending.
pub struct DynamicAdapter {
    definition: PlatformDefinition,
    delays: DelayConfig,
    headless: bool,
    engine: Option<BrowserEngine>,
    pending_rotation: Option<RotationHint>,
    authenticated: bool,
}

impl DynamicAdapter {
    /// Create an adapter for a browser-flow platform definition.
    ///
    /// # Errors
    /// Returns error if the definition is not a browser-flow platform.
    pub fn new(definition: PlatformDefinition, delays: DelayConfig, headless: bool) -> Result<Self> {
        if !matches!(definition.search, SearchMethod::BrowserFlow { .. }) {
            return Err(PlatformError::Definition {
                platform: definition.id().to_string(),
                reason: "dynamic adapter requires a browser-flow search method".to_string(),
            });
        }

        Ok(Self {
            definition,
            delays,
            headless,
            engine: None,
            pending_rotation: None,
            authenticated: false,
        })
    }

    /// Environment variable prefix for this platform's credentials.
    fn env_prefix(&self) -> String {
        self.definition
            .id()
            .as_str()
            .replace('-', "_")
            .to_uppercase()
    }

    async fn ensure_engine(&mut self) -> Result<&BrowserEngine> {
        if self.pending_rotation.take().is_some() {
            if let Some(engine) = self.engine.take() {
                info!(platform = %self.definition.id(), "rotating browser identity");
                if let Err(e) = engine.shutdown().await {
                    warn!(platform = %self.definition.id(), error = %e, "error closing browser during rotation");
                }
            }
            self.authenticated = false;
        }

        if self.engine.is_none() {
            let engine =
                BrowserEngine::launch(self.headless, self.delays.page_load_timeout()).await?;
            self.engine = Some(engine);
        }

        Ok(self.engine.as_ref().expect("engine just ensured"))
    }

    fn engine(&self) -> Result<&BrowserEngine> {
        self.engine.as_ref().ok_or_else(|| PlatformError::AuthFailed {
            platform: self.definition.id().to_string(),
            reason: "no active session; authenticate first".to_string(),
        })
    }

    /// Scan the current page for detection challenge markers.
    async fn check_for_detection(&self) -> Result<()> {
        let html = self.engine()?.page_content().await?.to_lowercase();

        let definition_hit = self
            .definition
            .platform
            .detection_markers
            .iter()
            .any(|m| html.contains(&m.to_lowercase()));
        let builtin_hit = BUILTIN_DETECTION_MARKERS.iter().any(|m| html.contains(m));

        if definition_hit || builtin_hit {
            return Err(PlatformError::Blocked {
                platform: self.definition.id().to_string(),
            });
        }
        Ok(())
    }

    /// Probe whether the session is already authenticated.
    async fn already_logged_in(&self, marker: &str) -> bool {
        let Ok(engine) = self.engine() else {
            return false;
        };
        engine
            .wait_for_selector(marker, Some(SHORT_WAIT))
            .await
            .is_ok()
    }

    async fn run_login_flow(&mut self) -> Result<()> {
        let Some(login) = self.definition.login.clone() else {
            // No login flow configured; the session is usable as-is.
            self.authenticated = true;
            return Ok(());
        };

        self.ensure_engine().await?;

        // Probe the base URL for an existing session before logging in.
        let base_url = self.definition.platform.base_url.clone();
        self.engine()?.navigate(&base_url).await?;
        if self.already_logged_in(&login.logged_in_marker).await {
            info!(platform = %self.definition.id(), "already logged in");
            self.authenticated = true;
            return Ok(());
        }

        let prefix = self.env_prefix();
        let username = std::env::var(format!("{prefix}_USERNAME")).map_err(|_| {
            PlatformError::AuthFailed {
                platform: self.definition.id().to_string(),
                reason: format!("{prefix}_USERNAME not set in environment"),
            }
        })?;
        let password = std::env::var(format!("{prefix}_PASSWORD")).map_err(|_| {
            PlatformError::AuthFailed {
                platform: self.definition.id().to_string(),
                reason: format!("{prefix}_PASSWORD not set in environment"),
            }
        })?;

        info!(platform = %self.definition.id(), "logging in");
        let engine = self.engine()?;
        engine.navigate(&login.url).await?;

        if let Some(consent) = &login.cookie_consent_button {
            if engine.find(consent).await.is_ok() {
                debug!(platform = %self.definition.id(), "dismissing cookie consent");
                let _ = engine.click(consent).await;
            }
        }

        engine.fill_field(&login.username_input, &username).await?;
        engine.fill_field(&login.password_input, &password).await?;
        engine.click(&login.submit_button).await?;

        if self
            .engine()?
            .wait_for_selector(&login.logged_in_marker, None)
            .await
            .is_err()
        {
            // A challenge page and a credential failure look the same from
            // the marker's absence; the page content tells them apart.
            self.check_for_detection().await?;
            return Err(PlatformError::AuthFailed {
                platform: self.definition.id().to_string(),
                reason: "logged-in marker did not appear after submit".to_string(),
            });
        }

        info!(platform = %self.definition.id(), "login successful");
        self.authenticated = true;
        Ok(())
    }

    async fn extract_card(
        &self,
        card: &Element,
        selectors: &CardSelectors,
    ) -> Result<JobCandidate> {
        let invalid = |reason: String| PlatformError::InvalidListing { reason };

        let title_el = card
            .find_element(&selectors.title)
            .await
            .map_err(|_| invalid("listing card has no title element".to_string()))?;
        let title = title_el
            .inner_text()
            .await
            .map_err(|e| invalid(format!("cannot read title: {e}")))?
            .unwrap_or_default()
            .trim()
            .to_string();

        let link_el = card
            .find_element(&selectors.link)
            .await
            .map_err(|_| invalid("listing card has no link element".to_string()))?;
        let href = link_el
            .attribute("href")
            .await
            .map_err(|e| invalid(format!("cannot read link: {e}")))?
            .unwrap_or_default();
        let link = self.absolute_url(&href)?;

        let company = self
            .optional_text(card, selectors.company.as_deref())
            .await
            .unwrap_or_else(|| "Unknown Company".to_string());
        let location = self
            .optional_text(card, selectors.location.as_deref())
            .await
            .unwrap_or_else(|| "Not specified".to_string());

        Ok(JobCandidate {
            title,
            company,
            location,
            link,
            platform: self.definition.id().clone(),
        })
    }

    async fn optional_text(
        &self,
        card: &Element,
        selector: Option<&str>,
    ) -> Option<String> {
        let selector = selector?;
        let element = card.find_element(selector).await.ok()?;
        element
            .inner_text()
            .await
            .ok()
            .flatten()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Resolve a possibly-relative href against the platform base URL.
    fn absolute_url(&self, href: &str) -> Result<String> {
        if href.is_empty() {
            return Err(PlatformError::InvalidListing {
                reason: "listing link is empty".to_string(),
            });
        }
        let base = url::Url::parse(&self.definition.platform.base_url).map_err(|e| {
            PlatformError::Definition {
                platform: self.definition.id().to_string(),
                reason: format!("invalid base_url: {e}"),
            }
        })?;
        let joined = base
            .join(href)
            .map_err(|e| PlatformError::InvalidListing {
                reason: format!("unparseable listing link '{href}': {e}"),
            })?;
        Ok(joined.to_string())
    }

    async fn drive_apply_form(&self, job: &Job) -> Result<ApplyOutcome> {
        let ApplyMethod::EasyApply { selectors } = &self.definition.apply else {
            return Ok(ApplyOutcome::NotEligible {
                reason: "platform has no automated apply flow".to_string(),
            });
        };

        let engine = self.engine()?;

        // The apply control is legitimately absent on listings that route
        // to external sites.
        if engine.find(&selectors.apply_button).await.is_err() {
            debug!(platform = %self.definition.id(), job = %job.id, "no apply control on listing");
            return Ok(ApplyOutcome::NotEligible {
                reason: "listing has no in-platform apply control".to_string(),
            });
        }
        engine.click(&selectors.apply_button).await?;

        // Walk the multi-step form: advance while a next-step control is
        // present, then submit.
        for step in 0..MAX_APPLY_STEPS {
            if engine
                .wait_for_selector(&selectors.next_button, Some(SHORT_WAIT))
                .await
                .is_ok()
            {
                debug!(platform = %self.definition.id(), step, "advancing apply form");
                engine.click(&selectors.next_button).await?;
                continue;
            }

            let Ok(_) = engine
                .wait_for_selector(&selectors.submit_button, Some(SHORT_WAIT))
                .await
            else {
                self.check_for_detection().await?;
                return Err(PlatformError::NotFound {
                    what: "next or submit control in apply form".to_string(),
                });
            };
            engine.click(&selectors.submit_button).await?;

            if let Some(success) = &selectors.success_indicator {
                if engine
                    .wait_for_selector(success, Some(SHORT_WAIT))
                    .await
                    .is_err()
                {
                    self.check_for_detection().await?;
                    return Err(PlatformError::NotFound {
                        what: "application success confirmation".to_string(),
                    });
                }
            }
            return Ok(ApplyOutcome::Submitted);
        }

        Err(PlatformError::NotFound {
            what: format!("apply form did not terminate within {MAX_APPLY_STEPS} steps"),
        })
    }
}

#[async_trait]
impl PlatformAdapter for DynamicAdapter {
    fn platform(&self) -> &PlatformId {
        self.definition.id()
    }

    fn supports_apply(&self) -> bool {
        self.definition.supports_apply()
    }

    async fn authenticate(&mut self) -> Result<()> {
        self.ensure_engine().await?;
        self.run_login_flow().await
    }

    async fn search_jobs(&mut self, query: &SearchQuery) -> Result<CandidateStream> {
        if !self.authenticated {
            return Err(PlatformError::AuthFailed {
                platform: self.definition.id().to_string(),
                reason: "no active session; authenticate first".to_string(),
            });
        }

        let url = render_search_url(self.definition.search.template(), query);
        let selectors = self.definition.search.selectors().clone();

        debug!(platform = %self.definition.id(), url = %url, "navigating to search results");
        self.engine()?.navigate(&url).await?;

        if self
            .engine()?
            .wait_for_selector(&selectors.results_list, None)
            .await
            .is_err()
        {
            self.check_for_detection().await?;
            return Err(PlatformError::NotFound {
                what: format!("results list '{}'", selectors.results_list),
            });
        }

        let cards = self.engine()?.find_all(&selectors.job_card).await?;
        let mut items: Vec<Result<JobCandidate>> = Vec::new();
        for card in cards.iter().take(query.limit) {
            items.push(self.extract_card(card, &selectors).await);
        }

        info!(
            platform = %self.definition.id(),
            count = items.len(),
            "extracted search results"
        );
        Ok(Box::pin(futures::stream::iter(items)))
    }

    async fn apply_to_job(&mut self, job: &Job, documents: &DocumentSet) -> Result<ApplyOutcome> {
        if !self.authenticated {
            return Err(PlatformError::AuthFailed {
                platform: self.definition.id().to_string(),
                reason: "no active session; authenticate first".to_string(),
            });
        }

        if !documents.has_resume() {
            return Ok(ApplyOutcome::NotEligible {
                reason: "no resume document available".to_string(),
            });
        }

        info!(platform = %self.definition.id(), job = %job.id, title = %job.title, "opening application");
        self.engine()?.navigate(&job.link).await?;
        self.check_for_detection().await?;

        self.drive_apply_form(job).await
    }

    fn hint_rotation(&mut self, hint: RotationHint) {
        debug!(
            platform = %self.definition.id(),
            signals = hint.consecutive_signals,
            "rotation hint received"
        );
        self.pending_rotation = Some(hint);
    }
}
