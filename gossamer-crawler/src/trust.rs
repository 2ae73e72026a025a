//! Certificate trust negotiation.
//!
//! One state machine per run: clients start out verifying certificates,
//! and the first certificate-trust failure escalates to a single operator
//! prompt that either downgrades every subsequent connection to
//! trust-on-first-use or aborts the initiating request chain. The state
//! and both HTTP clients live behind one `RwLock` so that client checkout
//! (read) stays cheap while negotiation (write) stops all new dispatch for
//! as long as the prompt is outstanding.

use crate::error::{CrawlError, Result};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::warn;

/// Operator decision callback: given the offending host, return whether to
/// continue with certificate validation disabled.
pub type TrustPrompt = Arc<dyn Fn(&str) -> bool + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustState {
    Verifying,
    TrustOnFirstUse,
    Aborted,
}

/// Which client a request path wants.
#[derive(Debug, Clone, Copy)]
pub enum ClientKind {
    /// Full-timeout client used for page fetches.
    Page,
    /// Half-timeout client used for HEAD/GET reachability probes.
    Probe,
}

struct TrustInner {
    state: TrustState,
    page: Client,
    probe: Client,
}

pub struct TrustManager {
    inner: RwLock<TrustInner>,
    prompt: TrustPrompt,
    timeout: Duration,
}

impl TrustManager {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            inner: RwLock::new(TrustInner {
                state: TrustState::Verifying,
                page: build_client(timeout, false)?,
                probe: build_client(timeout / 2, false)?,
            }),
            // Without an operator wired in there is nobody to consent, so
            // an unattended run declines the downgrade.
            prompt: Arc::new(|_host: &str| false),
            timeout,
        })
    }

    pub fn set_prompt(&mut self, prompt: TrustPrompt) {
        self.prompt = prompt;
    }

    pub async fn state(&self) -> TrustState {
        self.inner.read().await.state
    }

    /// Check out a client for one request. The bool records whether the
    /// client already skips certificate validation, which the caller needs
    /// to tell a fresh failure from a post-downgrade one.
    pub async fn client(&self, kind: ClientKind) -> (Client, bool) {
        let inner = self.inner.read().await;
        let client = match kind {
            ClientKind::Page => inner.page.clone(),
            ClientKind::Probe => inner.probe.clone(),
        };
        (client, inner.state == TrustState::TrustOnFirstUse)
    }

    /// Drive the state machine after a certificate failure on a verifying
    /// client. Returns `Ok(())` when the caller should retry with the
    /// downgraded clients.
    ///
    /// The write lock is held across the prompt, which parks every other
    /// request path on client checkout until the decision lands; the
    /// operator is therefore asked at most once per run, and concurrent
    /// failures observe the resolved state instead of re-prompting.
    pub async fn negotiate(&self, host: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.state {
            // Another branch already obtained consent while we waited.
            TrustState::TrustOnFirstUse => Ok(()),
            TrustState::Aborted => Err(CrawlError::TrustDeclined),
            TrustState::Verifying => {
                if (self.prompt)(host) {
                    inner.page = build_client(self.timeout, true)?;
                    inner.probe = build_client(self.timeout / 2, true)?;
                    inner.state = TrustState::TrustOnFirstUse;
                    warn!("certificate verification disabled for the remainder of the run");
                    Ok(())
                } else {
                    inner.state = TrustState::Aborted;
                    Err(CrawlError::TrustDeclined)
                }
            }
        }
    }
}

/// Whether a reqwest failure is specifically a certificate-trust failure
/// rather than any other transport error. reqwest wraps the TLS backend's
/// error, so the chain is rendered and matched on its markers.
pub fn is_certificate_error(err: &reqwest::Error) -> bool {
    let mut message = err.to_string().to_lowercase();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(&cause.to_string().to_lowercase());
        source = cause.source();
    }
    message.contains("certificate")
        || message.contains("self-signed")
        || message.contains("self signed")
        || message.contains("unknownissuer")
        || message.contains("tls")
}

fn build_client(timeout: Duration, insecure: bool) -> Result<Client> {
    let client = Client::builder()
        .user_agent(concat!("gossamer/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .connect_timeout(timeout / 2)
        .pool_max_idle_per_host(10)
        .redirect(reqwest::redirect::Policy::limited(5))
        .danger_accept_invalid_certs(insecure)
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn manager_with_prompt(answer: bool, calls: Arc<AtomicUsize>) -> TrustManager {
        let mut manager = TrustManager::new(Duration::from_secs(5)).unwrap();
        manager.set_prompt(Arc::new(move |_host| {
            calls.fetch_add(1, Ordering::SeqCst);
            answer
        }));
        manager
    }

    #[tokio::test]
    async fn consent_transitions_to_trust_on_first_use() {
        let calls = Arc::new(AtomicUsize::new(0));
        let manager = manager_with_prompt(true, calls.clone());

        assert_eq!(manager.state().await, TrustState::Verifying);
        manager.negotiate("bad.test").await.unwrap();
        assert_eq!(manager.state().await, TrustState::TrustOnFirstUse);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Clients checked out afterwards are flagged insecure.
        let (_client, insecure) = manager.client(ClientKind::Page).await;
        assert!(insecure);
    }

    #[tokio::test]
    async fn decline_transitions_to_aborted() {
        let calls = Arc::new(AtomicUsize::new(0));
        let manager = manager_with_prompt(false, calls.clone());

        let err = manager.negotiate("bad.test").await.unwrap_err();
        assert!(matches!(err, CrawlError::TrustDeclined));
        assert_eq!(manager.state().await, TrustState::Aborted);

        // A later failure does not re-prompt; the abort is final.
        let err = manager.negotiate("bad.test").await.unwrap_err();
        assert!(matches!(err, CrawlError::TrustDeclined));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_failures_prompt_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let manager = Arc::new(manager_with_prompt(true, calls.clone()));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let manager = manager.clone();
            tasks.push(tokio::spawn(async move {
                manager.negotiate("bad.test").await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(manager.state().await, TrustState::TrustOnFirstUse);
    }

    #[tokio::test]
    async fn fresh_clients_start_verifying() {
        let manager = TrustManager::new(Duration::from_secs(5)).unwrap();
        let (_client, insecure) = manager.client(ClientKind::Probe).await;
        assert!(!insecure);
    }
}
