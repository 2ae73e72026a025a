//! The concurrent crawl driver.
//!
//! One `Crawler` runs one crawl: fetch a page under the gate, extract
//! candidate references, resolve/classify/validate them concurrently, then
//! recurse into unvisited internal links as independent tasks. Branch
//! failures never abort the run; only an unparsable seed, a failed startup
//! connectivity check, or an operator-declined trust negotiation do.

use crate::config::{CrawlConfig, FilterMode};
use crate::error::{CrawlError, Result};
use crate::extract::extract_candidates;
use crate::resolve::{ResolvedLink, resolve_candidate};
use crate::trust::{ClientKind, TrustManager, TrustPrompt, is_certificate_error};
use crate::validate::ValidationCache;
use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use reqwest::{Method, Response, StatusCode};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

/// Streamed discovery notification: the absolute address plus whether it
/// lies outside the seed authority.
pub type DiscoveryCallback = Arc<dyn Fn(&str, bool) + Send + Sync>;

pub struct Crawler {
    config: CrawlConfig,
    trust: TrustManager,
    gate: Arc<Semaphore>,
    visited: Mutex<HashSet<String>>,
    results: Mutex<Vec<String>>,
    cache: ValidationCache,
    branches: Mutex<Vec<JoinHandle<()>>>,
    run_error: Mutex<Option<CrawlError>>,
    discovery_callback: Option<DiscoveryCallback>,
}

impl Crawler {
    pub fn new(config: CrawlConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        Ok(Self {
            trust: TrustManager::new(timeout)?,
            gate: Arc::new(Semaphore::new(config.workers)),
            visited: Mutex::new(HashSet::new()),
            results: Mutex::new(Vec::new()),
            cache: ValidationCache::new(),
            branches: Mutex::new(Vec::new()),
            run_error: Mutex::new(None),
            discovery_callback: None,
            config,
        })
    }

    /// Install the operator prompt consulted on certificate failures.
    pub fn with_trust_prompt(mut self, prompt: TrustPrompt) -> Self {
        self.trust.set_prompt(prompt);
        self
    }

    /// Install a callback invoked once per recorded discovery.
    pub fn with_discovery_callback(mut self, callback: DiscoveryCallback) -> Self {
        self.discovery_callback = Some(callback);
        self
    }

    pub async fn visited_count(&self) -> usize {
        self.visited.lock().await.len()
    }

    /// Crawl from the configured seed until every spawned branch has
    /// completed, returning the discovered addresses in append order.
    pub async fn run(self: Arc<Self>) -> Result<Vec<String>> {
        let seed = Url::parse(&self.config.seed)
            .map_err(|e| CrawlError::InvalidUrl(format!("{}: {e}", self.config.seed)))?;
        let normalized = seed.to_string();
        info!(
            seed = %normalized,
            max_depth = self.config.max_depth,
            workers = self.config.workers,
            "starting crawl"
        );

        self.check_connection(&normalized).await?;

        self.visited.lock().await.insert(normalized);
        let seed = Arc::new(seed);
        Arc::clone(&self)
            .crawl((*seed).clone(), Arc::clone(&seed), 0)
            .await;

        // Run-scoped join barrier: a popped branch may push new handles
        // while it runs, so drain until the list stays empty.
        loop {
            let branch = self.branches.lock().await.pop();
            match branch {
                Some(handle) => handle.await?,
                None => break,
            }
        }

        if let Some(err) = self.run_error.lock().await.take() {
            return Err(err);
        }

        let results = self.results.lock().await.clone();
        info!(discovered = results.len(), "crawl complete");
        Ok(results)
    }

    /// One branch: fetch `page`, expand its candidates, recurse.
    fn crawl(self: Arc<Self>, page: Url, seed: Arc<Url>, depth: usize) -> BoxFuture<'static, ()> {
        async move {
            if depth >= self.config.max_depth {
                return;
            }

            let body = match self.fetch_page(page.as_str()).await {
                Ok(Some(body)) => body,
                Ok(None) => return,
                Err(err) => {
                    self.record_branch_failure(page.as_str(), err).await;
                    return;
                }
            };

            let candidates = extract_candidates(&body);
            debug!(page = %page, candidates = candidates.len(), "extracted candidates");

            let checks = candidates.into_iter().map(|candidate| {
                let crawler = Arc::clone(&self);
                let page = page.clone();
                let seed = Arc::clone(&seed);
                async move {
                    crawler
                        .resolve_and_validate(&page, &seed, &candidate)
                        .await
                }
            });
            let resolved: Vec<Option<ResolvedLink>> = join_all(checks).await;

            for link in resolved.into_iter().flatten() {
                let address = link.url.to_string();

                // Single atomic check-and-insert: two branches seeing the
                // same address concurrently cannot both pass.
                if !self.visited.lock().await.insert(address.clone()) {
                    continue;
                }

                if self.config.filter.admits(link.external) {
                    self.results.lock().await.push(address.clone());
                    if let Some(ref callback) = self.discovery_callback {
                        callback(&address, link.external);
                    }
                }

                if !link.external {
                    let branch = tokio::spawn(Arc::clone(&self).crawl(
                        link.url,
                        Arc::clone(&seed),
                        depth + 1,
                    ));
                    self.branches.lock().await.push(branch);
                }
            }
        }
        .boxed()
    }

    /// Resolve one candidate, apply the filter pre-check, then validate
    /// reachability. Unreachable or malformed candidates drop out silently.
    async fn resolve_and_validate(
        &self,
        page: &Url,
        seed: &Url,
        candidate: &str,
    ) -> Option<ResolvedLink> {
        let link = resolve_candidate(page, seed, candidate)?;

        // An external link under internal-only can never be recorded or
        // recursed into; skip it before spending a probe on it.
        if link.external && self.config.filter == FilterMode::InternalOnly {
            return None;
        }

        if self.is_reachable(link.url.as_str()).await {
            Some(link)
        } else {
            None
        }
    }

    /// Memoized reachability check. 2xx-3xx after redirects counts as
    /// reachable; transport failure counts as unreachable.
    async fn is_reachable(&self, address: &str) -> bool {
        if let Some(cached) = self.cache.cached(address).await {
            return cached;
        }

        let reachable = match self.probe(address).await {
            Ok(reachable) => reachable,
            Err(CrawlError::TrustDeclined) => {
                self.record_run_error(CrawlError::TrustDeclined).await;
                false
            }
            Err(err) => {
                debug!(address, error = %err, "validation probe failed");
                false
            }
        };
        self.cache.store(address, reachable).await;
        reachable
    }

    /// Lightweight probe under a gate permit: HEAD, falling back to GET
    /// when the server rejects the method or the status.
    async fn probe(&self, address: &str) -> Result<bool> {
        let _permit = self.gate.acquire().await.expect("gate semaphore closed");

        let head = self.send(Method::HEAD, address, ClientKind::Probe).await?;
        if reachable_status(head.status()) {
            return Ok(true);
        }
        let get = self.send(Method::GET, address, ClientKind::Probe).await?;
        Ok(reachable_status(get.status()))
    }

    /// Fetch one page body under a gate permit. `Ok(None)` means the
    /// branch ends without content (non-success status).
    async fn fetch_page(&self, address: &str) -> Result<Option<String>> {
        let _permit = self.gate.acquire().await.expect("gate semaphore closed");

        let response = self.send(Method::GET, address, ClientKind::Page).await?;
        let status = response.status();
        if !status.is_success() {
            debug!(address, %status, "skipping page body");
            return Ok(None);
        }
        Ok(Some(response.text().await?))
    }

    /// Issue one request, negotiating certificate trust on demand. A
    /// certificate failure against an already-downgraded client is genuine
    /// and is surfaced instead of re-prompted.
    async fn send(&self, method: Method, address: &str, kind: ClientKind) -> Result<Response> {
        loop {
            let (client, insecure) = self.trust.client(kind).await;
            match client.request(method.clone(), address).send().await {
                Ok(response) => return Ok(response),
                Err(err) if is_certificate_error(&err) => {
                    let host = Url::parse(address)
                        .ok()
                        .and_then(|u| u.host_str().map(str::to_owned))
                        .unwrap_or_else(|| address.to_string());
                    if insecure {
                        return Err(CrawlError::CertificateInvalid(host));
                    }
                    debug!(address, error = %err, "certificate failure, negotiating trust");
                    self.trust.negotiate(&host).await?;
                    // Consent obtained; retry with the downgraded client.
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Startup reachability check: HEAD first, GET as fallback. An
    /// operator decline during trust negotiation is final and skips the
    /// fallback; anything else failing on both methods aborts the run
    /// before any crawling begins.
    async fn check_connection(&self, address: &str) -> Result<()> {
        let head_err = match self.send(Method::HEAD, address, ClientKind::Probe).await {
            Ok(response) if acceptable_startup_status(response.status()) => return Ok(()),
            Ok(response) => format!("status {}", response.status()),
            Err(err @ CrawlError::TrustDeclined) => return Err(err),
            Err(err) => err.to_string(),
        };

        match self.send(Method::GET, address, ClientKind::Probe).await {
            Ok(response) if acceptable_startup_status(response.status()) => Ok(()),
            Ok(response) => Err(CrawlError::Unreachable {
                url: address.to_string(),
                reason: format!("HEAD: {head_err}; GET: status {}", response.status()),
            }),
            Err(err @ CrawlError::TrustDeclined) => Err(err),
            Err(err) => Err(CrawlError::Unreachable {
                url: address.to_string(),
                reason: format!("HEAD: {head_err}; GET: {err}"),
            }),
        }
    }

    async fn record_branch_failure(&self, address: &str, err: CrawlError) {
        match err {
            CrawlError::TrustDeclined => self.record_run_error(CrawlError::TrustDeclined).await,
            err => warn!(address, error = %err, "branch failed"),
        }
    }

    /// First recorded error wins; it is surfaced once the join barrier
    /// drains.
    async fn record_run_error(&self, err: CrawlError) {
        let mut slot = self.run_error.lock().await;
        if slot.is_none() {
            *slot = Some(err);
        }
    }
}

fn reachable_status(status: StatusCode) -> bool {
    status.is_success() || status.is_redirection()
}

/// The startup check tolerates anything below the client-error range;
/// 405 still fails HEAD so that the GET fallback gets its turn.
fn acceptable_startup_status(status: StatusCode) -> bool {
    status.as_u16() < 400
}
