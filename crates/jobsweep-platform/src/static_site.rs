//! Stateless request/parse platform adapter.
//!
//! For platforms that serve listings as plain documents: one HTTP GET per
//! search, parsed with CSS selectors. No session state beyond the client's
//! anti-detection headers.

use crate::adapter::{
    render_search_url, ApplyOutcome, CandidateStream, DocumentSet, PlatformAdapter, RotationHint,
    SearchQuery,
};
use crate::definition::{CardSelectors, PlatformDefinition, SearchMethod};
use crate::error::{PlatformError, Result};
use async_trait::async_trait;
use jobsweep_browser::FingerprintConfig;
use jobsweep_core::{Job, JobCandidate, PlatformId};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::StatusCode;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Detection markers checked in every response body.
const BUILTIN_DETECTION_MARKERS: &[&str] = &["captcha", "g-recaptcha", "security check"];

/// Stateless adapter for plain-document platforms.
pub struct StaticAdapter {
    definition: PlatformDefinition,
    client: reqwest::Client,
    fingerprint: FingerprintConfig,
    timeout: Duration,
    pending_rotation: Option<RotationHint>,
}

impl StaticAdapter {
    /// Create an adapter for a url-template platform definition.
    ///
    /// # Errors
    /// Returns error if the definition is not a url-template platform or
    /// the HTTP client cannot be constructed.
    pub fn new(definition: PlatformDefinition, timeout: Duration) -> Result<Self> {
        if !matches!(definition.search, SearchMethod::UrlTemplate { .. }) {
            return Err(PlatformError::Definition {
                platform: definition.id().to_string(),
                reason: "static adapter requires a url-template search method".to_string(),
            });
        }

        let fingerprint = FingerprintConfig::randomized();
        let client = Self::build_client(&definition, &fingerprint, timeout)?;

        Ok(Self {
            definition,
            client,
            fingerprint,
            timeout,
            pending_rotation: None,
        })
    }

    fn build_client(
        definition: &PlatformDefinition,
        fingerprint: &FingerprintConfig,
        timeout: Duration,
    ) -> Result<reqwest::Client> {
        let mut headers = HeaderMap::new();
        let header = |v: &str| {
            HeaderValue::from_str(v).map_err(|e| PlatformError::Definition {
                platform: definition.id().to_string(),
                reason: format!("invalid header value: {e}"),
            })
        };

        headers.insert(USER_AGENT, header(&fingerprint.user_agent)?);
        headers.insert(
            ACCEPT,
            header("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")?,
        );
        headers.insert(ACCEPT_LANGUAGE, header(&fingerprint.accept_language)?);
        headers.insert(REFERER, header(&definition.platform.base_url)?);
        headers.insert("DNT", HeaderValue::from_static("1"));

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(PlatformError::Http)
    }

    /// Parse a results document into candidates. Parsing stays synchronous;
    /// the parsed DOM is never held across an await.
    fn parse_listings(
        &self,
        html: &str,
        selectors: &CardSelectors,
        limit: usize,
    ) -> Result<Vec<Result<JobCandidate>>> {
        let parse_selector = |css: &str| {
            Selector::parse(css).map_err(|e| PlatformError::Definition {
                platform: self.definition.id().to_string(),
                reason: format!("invalid selector '{css}': {e}"),
            })
        };

        let card_sel = parse_selector(&selectors.job_card)?;
        let title_sel = parse_selector(&selectors.title)?;
        let link_sel = parse_selector(&selectors.link)?;
        let company_sel = selectors
            .company
            .as_deref()
            .map(parse_selector)
            .transpose()?;
        let location_sel = selectors
            .location
            .as_deref()
            .map(parse_selector)
            .transpose()?;

        let document = Html::parse_document(html);
        let mut items = Vec::new();

        for card in document.select(&card_sel).take(limit) {
            let title = card
                .select(&title_sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .unwrap_or_default();

            let href = card
                .select(&link_sel)
                .next()
                .and_then(|el| el.value().attr("href"))
                .unwrap_or_default();

            let link = match self.absolute_url(href) {
                Ok(link) => link,
                Err(e) => {
                    items.push(Err(e));
                    continue;
                }
            };

            let text_of = |sel: &Option<Selector>, fallback: &str| {
                sel.as_ref()
                    .and_then(|s| card.select(s).next())
                    .map(|el| el.text().collect::<String>().trim().to_string())
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| fallback.to_string())
            };

            items.push(Ok(JobCandidate {
                title,
                company: text_of(&company_sel, "Unknown Company"),
                location: text_of(&location_sel, "Not specified"),
                link,
                platform: self.definition.id().clone(),
            }));
        }

        Ok(items)
    }

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
        base.join(href)
            .map(|u| u.to_string())
            .map_err(|e| PlatformError::InvalidListing {
                reason: format!("unparseable listing link '{href}': {e}"),
            })
    }

    fn detect_challenge(&self, html: &str) -> bool {
        let lowered = html.to_lowercase();
        let definition_hit = self
            .definition
            .platform
            .detection_markers
            .iter()
            .any(|m| lowered.contains(&m.to_lowercase()));
        definition_hit || BUILTIN_DETECTION_MARKERS.iter().any(|m| lowered.contains(m))
    }
}

#[async_trait]
impl PlatformAdapter for StaticAdapter {
    fn platform(&self) -> &PlatformId {
        self.definition.id()
    }

    fn supports_apply(&self) -> bool {
        self.definition.supports_apply()
    }

    async fn authenticate(&mut self) -> Result<()> {
        if self.pending_rotation.take().is_some() {
            info!(platform = %self.definition.id(), "rotating client identity");
            self.fingerprint.rotate();
            self.client = Self::build_client(&self.definition, &self.fingerprint, self.timeout)?;
        }

        // Plain-document platforms need no login; an API key only unlocks
        // optional features.
        let key_var = format!(
            "{}_API_KEY",
            self.definition.id().as_str().replace('-', "_").to_uppercase()
        );
        if std::env::var(&key_var).is_err() {
            debug!(platform = %self.definition.id(), "no API key in environment; basic search only");
        }

        Ok(())
    }

    async fn search_jobs(&mut self, query: &SearchQuery) -> Result<CandidateStream> {
        let url = render_search_url(self.definition.search.template(), query);
        debug!(platform = %self.definition.id(), url = %url, "fetching search results");

        let response = self.client.get(&url).send().await?;
        match response.status() {
            StatusCode::FORBIDDEN => {
                return Err(PlatformError::Blocked {
                    platform: self.definition.id().to_string(),
                })
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(PlatformError::RateLimited {
                    platform: self.definition.id().to_string(),
                })
            }
            _ => {}
        }
        let response = response.error_for_status()?;
        let html = response.text().await?;

        if self.detect_challenge(&html) {
            return Err(PlatformError::Blocked {
                platform: self.definition.id().to_string(),
            });
        }

        let selectors = self.definition.search.selectors().clone();
        let items = self.parse_listings(&html, &selectors, query.limit)?;

        if items.is_empty() {
            warn!(platform = %self.definition.id(), "no listing cards in response");
        }
        info!(
            platform = %self.definition.id(),
            count = items.len(),
            "extracted search results"
        );
        Ok(Box::pin(futures::stream::iter(items)))
    }

    async fn apply_to_job(&mut self, job: &Job, _documents: &DocumentSet) -> Result<ApplyOutcome> {
        // Listings on plain-document platforms route to employer sites;
        // callers are expected to gate on supports_apply.
        warn!(platform = %self.definition.id(), job = %job.id, "apply requested on a listing-only platform");
        Err(PlatformError::Unsupported {
            what: format!(
                "automated application on {}",
                self.definition.id()
            ),
        })
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{ApplyMethod, PlatformMetadata};
    use futures::StreamExt;

    fn definition() -> PlatformDefinition {
        PlatformDefinition {
            platform: PlatformMetadata {
                id: PlatformId::new("staticboard").expect("valid id"),
                name: "Static Board".to_string(),
                base_url: "https://static.example".to_string(),
                detection_markers: vec!["unusual traffic".to_string()],
            },
            search: SearchMethod::UrlTemplate {
                template: "https://static.example/jobs?q={keywords}&limit={limit}".to_string(),
                selectors: CardSelectors {
                    results_list: "#results".to_string(),
                    job_card: "div.job-card".to_string(),
                    title: "h2.job-title".to_string(),
                    company: Some("span.company".to_string()),
                    location: Some("div.location".to_string()),
                    link: "h2.job-title a".to_string(),
                },
            },
            apply: ApplyMethod::Manual {
                reason: "listings redirect to employer sites".to_string(),
            },
            login: None,
        }
    }

    fn adapter() -> StaticAdapter {
        StaticAdapter::new(definition(), Duration::from_secs(10)).expect("adapter")
    }

    const RESULTS_PAGE: &str = r#"
        <html><body id="results">
          <div class="job-card">
            <h2 class="job-title"><a href="/rc/clk?jk=1">Rust Developer</a></h2>
            <span class="company">Acme</span>
            <div class="location">Remote</div>
          </div>
          <div class="job-card">
            <h2 class="job-title"><a href="https://static.example/rc/clk?jk=2">Backend Engineer</a></h2>
            <span class="company">Initech</span>
          </div>
          <div class="job-card">
            <h2 class="job-title">No link here</h2>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_rejects_browser_definition() {
        let mut def = definition();
        def.search = SearchMethod::BrowserFlow {
            url_template: "https://static.example/jobs?q={keywords}".to_string(),
            selectors: def.search.selectors().clone(),
        };
        assert!(StaticAdapter::new(def, Duration::from_secs(10)).is_err());
    }

    #[test]
    fn test_parse_listings() {
        let a = adapter();
        let selectors = a.definition.search.selectors().clone();
        let items = a.parse_listings(RESULTS_PAGE, &selectors, 10).expect("parse");

        assert_eq!(items.len(), 3);

        let first = items[0].as_ref().expect("first card parses");
        assert_eq!(first.title, "Rust Developer");
        assert_eq!(first.company, "Acme");
        assert_eq!(first.location, "Remote");
        assert_eq!(first.link, "https://static.example/rc/clk?jk=1");

        let second = items[1].as_ref().expect("second card parses");
        assert_eq!(second.company, "Initech");
        assert_eq!(second.location, "Not specified");

        // Third card has no link element and is surfaced as a bad listing.
        assert!(items[2].is_err());
    }

    #[test]
    fn test_parse_respects_limit() {
        let a = adapter();
        let selectors = a.definition.search.selectors().clone();
        let items = a.parse_listings(RESULTS_PAGE, &selectors, 1).expect("parse");
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_detect_challenge_markers() {
        let a = adapter();
        assert!(a.detect_challenge("<div class=\"g-recaptcha\"></div>"));
        assert!(a.detect_challenge("We detected Unusual Traffic from your network"));
        assert!(!a.detect_challenge("<div class=\"search-results\"></div>"));
    }

    #[test]
    fn test_apply_is_not_supported() {
        let a = adapter();
        assert!(!a.supports_apply());
    }

    #[tokio::test]
    async fn test_apply_call_is_rejected() {
        let mut a = adapter();
        let job = Job {
            id: jobsweep_core::JobId::fingerprint("Rust Developer", "Acme", "https://x/1"),
            title: "Rust Developer".to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            link: "https://x/1".to_string(),
            platform: PlatformId::new("staticboard").expect("valid id"),
            status: jobsweep_core::JobStatus::Applying,
            discovered_at: chrono::Utc::now(),
            applied_at: None,
        };

        let err = a
            .apply_to_job(&job, &DocumentSet::default())
            .await
            .err()
            .expect("listing-only platform rejects apply");
        assert!(matches!(err, PlatformError::Unsupported { .. }));
    }

    #[tokio::test]
    async fn test_stream_is_finite_and_consumed_once() {
        let a = adapter();
        let selectors = a.definition.search.selectors().clone();
        let items = a.parse_listings(RESULTS_PAGE, &selectors, 10).expect("parse");
        let mut stream: CandidateStream = Box::pin(futures::stream::iter(items));

        let mut yielded = 0;
        while stream.next().await.is_some() {
            yielded += 1;
        }
        assert_eq!(yielded, 3);
        assert!(stream.next().await.is_none());
    }
}
