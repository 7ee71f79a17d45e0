//! robots.txt permission checks.
//!
//! Before any article page is requested, the site's `/robots.txt` is fetched
//! (once per origin) and evaluated for our user agent with `texting_robots`.
//!
//! # Status handling
//!
//! | robots.txt response | Policy |
//! |---------------------|--------|
//! | 2xx | Parse rules (unparseable file allows everything) |
//! | 4xx | Allow everything |
//! | 5xx / network error | Disallow everything |

use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use texting_robots::Robot;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Longest `Crawl-delay` honoured; larger declarations are clamped to this.
pub const MAX_CRAWL_DELAY: Duration = Duration::from_secs(60);

/// Crawl permission for one origin.
pub enum RobotsPolicy {
    AllowAll,
    DisallowAll,
    Rules(Robot),
}

impl std::fmt::Debug for RobotsPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RobotsPolicy::AllowAll => write!(f, "AllowAll"),
            RobotsPolicy::DisallowAll => write!(f, "DisallowAll"),
            RobotsPolicy::Rules(robot) => f
                .debug_struct("Rules")
                .field("delay", &robot.delay)
                .finish(),
        }
    }
}

impl RobotsPolicy {
    /// Build a policy from the robots.txt response for `agent`.
    pub fn from_response(status: StatusCode, body: &[u8], agent: &str) -> Self {
        if status.is_success() {
            match Robot::new(agent, body) {
                Ok(robot) => RobotsPolicy::Rules(robot),
                Err(e) => {
                    warn!(error = %e, "Unparseable robots.txt; treating as allow-all");
                    RobotsPolicy::AllowAll
                }
            }
        } else if status.is_client_error() {
            RobotsPolicy::AllowAll
        } else {
            RobotsPolicy::DisallowAll
        }
    }

    /// Whether `url` may be fetched under this policy.
    pub fn allowed(&self, url: &str) -> bool {
        match self {
            RobotsPolicy::AllowAll => true,
            RobotsPolicy::DisallowAll => false,
            RobotsPolicy::Rules(robot) => robot.allowed(url),
        }
    }

    /// `Crawl-delay` for our agent, if the site declares one.
    ///
    /// Non-positive or non-finite values are ignored; anything longer than
    /// [`MAX_CRAWL_DELAY`] (including values too large for a `Duration`) is
    /// clamped to it.
    pub fn crawl_delay(&self) -> Option<Duration> {
        let RobotsPolicy::Rules(robot) = self else {
            return None;
        };
        let secs = robot.delay.filter(|d| d.is_finite() && *d > 0.0)?;
        match Duration::try_from_secs_f32(secs) {
            Ok(delay) if delay <= MAX_CRAWL_DELAY => Some(delay),
            _ => {
                warn!(declared_secs = secs, max = ?MAX_CRAWL_DELAY, "Crawl-delay too long; clamping");
                Some(MAX_CRAWL_DELAY)
            }
        }
    }
}

/// Per-origin robots.txt cache for a single run.
#[derive(Debug)]
pub struct RobotsCache {
    client: Client,
    agent: String,
    policies: HashMap<String, RobotsPolicy>,
}

impl RobotsCache {
    /// Create an empty cache; `agent` is matched against `User-agent` groups.
    pub fn new(client: Client, agent: impl Into<String>) -> Self {
        Self {
            client,
            agent: agent.into(),
            policies: HashMap::new(),
        }
    }

    /// Seed the policy for an origin such as `https://www.example.com`.
    #[cfg(test)]
    pub fn insert(&mut self, origin: &str, policy: RobotsPolicy) {
        self.policies.insert(origin.trim_end_matches('/').to_string(), policy);
    }

    /// Whether `url` may be fetched. Unparseable URLs are never allowed.
    #[instrument(level = "debug", skip(self))]
    pub async fn paths_allowed(&mut self, url: &str) -> bool {
        match self.policy_for(url).await {
            Some(policy) => policy.allowed(url),
            None => false,
        }
    }

    /// `Crawl-delay` declared for `url`'s origin, if already known.
    pub fn crawl_delay(&self, url: &str) -> Option<Duration> {
        let origin = origin_of(url)?;
        self.policies.get(&origin).and_then(RobotsPolicy::crawl_delay)
    }

    async fn policy_for(&mut self, url: &str) -> Option<&RobotsPolicy> {
        let origin = origin_of(url)?;
        if !self.policies.contains_key(&origin) {
            let policy = self.fetch_policy(&origin).await;
            info!(%origin, ?policy, "Resolved robots.txt policy");
            self.policies.insert(origin.clone(), policy);
        }
        self.policies.get(&origin)
    }

    async fn fetch_policy(&self, origin: &str) -> RobotsPolicy {
        let robots_url = format!("{origin}/robots.txt");
        let resp = match self.client.get(&robots_url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(url = %robots_url, error = %e, "robots.txt fetch failed; disallowing origin");
                return RobotsPolicy::DisallowAll;
            }
        };

        let status = resp.status();
        match resp.bytes().await {
            Ok(body) => {
                debug!(url = %robots_url, %status, bytes = body.len(), "Fetched robots.txt");
                RobotsPolicy::from_response(status, &body, &self.agent)
            }
            Err(e) => {
                warn!(url = %robots_url, error = %e, "robots.txt body unreadable; disallowing origin");
                RobotsPolicy::DisallowAll
            }
        }
    }
}

/// `scheme://host[:port]` for an http(s) URL.
fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let origin = parsed.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}
