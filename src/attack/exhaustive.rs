//! Exhaustive private-key search
//!
//! Walks candidate moduli U upward. For each U a blocking worker tries every
//! multiplier V in [1, U) and reports each (U, V) whose decryption of the
//! ciphertext reproduces the expected plaintext. Such a key need not be the
//! one that generated the public key; it only has to decrypt correctly.
//!
//! # Tasks
//!
//! - **Producer**: hands out U in increasing order, one per semaphore permit,
//!   so at most `workers` moduli are in flight
//! - **Workers**: `spawn_blocking`, one modulus each
//! - **Collector**: receives matches and cancels the search at `max_keys`
//! - **Progress**: logs the current U and throughput every interval
//!
//! All of them observe one `CancelToken`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Notify, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{KnapsackError, Result};
use crate::knapsack::{decode, decrypt, Ciphertext, PrivateKey, PublicKey};
use crate::params::SearchConfig;

/// Shared cancellation flag
///
/// Blocking workers poll `is_cancelled`; async tasks await `cancelled`.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    flag: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        if !self.inner.flag.swap(true, Ordering::AcqRel) {
            self.inner.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::Acquire)
    }

    /// Resolves once `cancel` has been called
    pub async fn cancelled(&self) {
        // registered before the flag check so a concurrent cancel is not missed
        let notified = self.inner.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

/// Why a search stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    MaxKeysFound,
    SearchSpaceExhausted,
    Cancelled,
}

/// Final state of a search
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Matching keys in the order the collector received them
    pub keys: Vec<PrivateKey>,

    pub termination: Termination,

    /// Last modulus handed to a worker
    pub last_modulus: u64,

    pub elapsed: Duration,
}

impl SearchOutcome {
    pub fn found(&self) -> u64 {
        self.keys.len() as u64
    }

    /// The keys when `max_keys` was reached, otherwise the reason it was not
    pub fn into_result(self) -> Result<Vec<PrivateKey>> {
        match self.termination {
            Termination::MaxKeysFound => Ok(self.keys),
            Termination::SearchSpaceExhausted => Err(KnapsackError::SearchSpaceExhausted {
                found: self.keys.len() as u64,
            }),
            Termination::Cancelled => Err(KnapsackError::Cancelled),
        }
    }
}

struct SearchContext {
    cipher: Ciphertext,
    public: PublicKey,
    expected: Vec<u8>,
}

impl SearchContext {
    /// The full decoded message must equal the expected bytes. Decryption
    /// failures (no inverse, zero modulus) count as a miss.
    fn matches(&self, key: &PrivateKey) -> bool {
        match decrypt(&self.cipher, key, &self.public) {
            Ok(plain) => decode(&plain) == self.expected,
            Err(_) => false,
        }
    }
}

/// Exhaustive search over (U, V) for one ciphertext
pub struct ExhaustiveSearch {
    context: Arc<SearchContext>,
    config: SearchConfig,
    permits: u32,
}

impl ExhaustiveSearch {
    pub fn new(
        cipher: Ciphertext,
        public: PublicKey,
        expected: Vec<u8>,
        config: SearchConfig,
    ) -> Result<Self> {
        config.validate()?;
        public.block_size()?;
        if expected.is_empty() {
            return Err(KnapsackError::InvalidParameters(
                "expected plaintext must be non-empty".into(),
            ));
        }
        let permits = u32::try_from(config.workers).map_err(|_| {
            KnapsackError::InvalidParameters(format!("too many workers: {}", config.workers))
        })?;

        Ok(Self {
            context: Arc::new(SearchContext {
                cipher,
                public,
                expected,
            }),
            config,
            permits,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Start the search on the current tokio runtime.
    ///
    /// Matches stream through the returned handle as they are found.
    pub fn spawn(self) -> SearchHandle {
        let cancel = CancelToken::new();
        let (stream_tx, stream_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(drive(self, cancel.clone(), stream_tx));

        SearchHandle {
            matches: stream_rx,
            cancel,
            task,
        }
    }

    /// Run to completion
    pub async fn run(self) -> Result<SearchOutcome> {
        self.spawn().finish().await
    }
}

/// Handle to a running search
pub struct SearchHandle {
    matches: mpsc::UnboundedReceiver<PrivateKey>,
    cancel: CancelToken,
    task: JoinHandle<Result<SearchOutcome>>,
}

impl SearchHandle {
    /// Next matching key, or `None` once the collector has stopped
    pub async fn next_match(&mut self) -> Option<PrivateKey> {
        self.matches.recv().await
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Wait for every task to stop and return the outcome
    pub async fn finish(self) -> Result<SearchOutcome> {
        self.task.await?
    }
}

async fn drive(
    search: ExhaustiveSearch,
    cancel: CancelToken,
    stream: mpsc::UnboundedSender<PrivateKey>,
) -> Result<SearchOutcome> {
    let ExhaustiveSearch {
        context,
        config,
        permits,
    } = search;
    let started = Instant::now();
    let current = Arc::new(AtomicU64::new(config.start_modulus));
    let semaphore = Arc::new(Semaphore::new(config.workers));
    let (found_tx, found_rx) = mpsc::channel(config.workers.saturating_mul(4));

    info!(
        "Exhaustive search: U in [{}, {}], workers={}, max_keys={}",
        config.start_modulus, config.max_modulus, config.workers, config.max_keys
    );

    let collector = tokio::spawn(collect_matches(
        found_rx,
        config.max_keys,
        cancel.clone(),
        stream,
        started,
    ));
    let progress = tokio::spawn(report_progress(
        Arc::clone(&current),
        config.progress_interval,
        cancel.clone(),
        started,
    ));

    let mut u = config.start_modulus;
    loop {
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            break;
        };
        if cancel.is_cancelled() {
            break;
        }

        current.store(u, Ordering::Relaxed);
        let context = Arc::clone(&context);
        let found = found_tx.clone();
        let worker_cancel = cancel.clone();
        tokio::task::spawn_blocking(move || {
            search_modulus(u, &context, &found, &worker_cancel);
            drop(permit);
        });

        if u == config.max_modulus {
            break;
        }
        u += 1;
    }
    drop(found_tx);

    // every worker holds a permit until it returns
    let drained = semaphore.acquire_many(permits).await;
    drop(drained);

    let keys = collector.await?;
    progress.abort();

    let termination = if keys.len() as u64 >= config.max_keys {
        Termination::MaxKeysFound
    } else if cancel.is_cancelled() {
        Termination::Cancelled
    } else {
        Termination::SearchSpaceExhausted
    };

    let outcome = SearchOutcome {
        keys,
        termination,
        last_modulus: current.load(Ordering::Relaxed),
        elapsed: started.elapsed(),
    };
    info!(
        "Exhaustive search stopped ({:?}): {} key(s), last U={}, {:.2?}",
        outcome.termination,
        outcome.found(),
        outcome.last_modulus,
        outcome.elapsed
    );
    Ok(outcome)
}

/// Try every V in [1, U) for one modulus
fn search_modulus(
    u: u64,
    context: &SearchContext,
    found: &mpsc::Sender<PrivateKey>,
    cancel: &CancelToken,
) {
    let modulus = BigUint::from(u);
    for v in 1..u {
        if cancel.is_cancelled() {
            return;
        }

        let key = PrivateKey::candidate(modulus.clone(), BigUint::from(v));
        if !context.matches(&key) {
            continue;
        }

        debug!("U={} V={} decrypts the ciphertext", u, v);
        if found.blocking_send(key).is_err() {
            // collector stopped
            return;
        }
    }
}

async fn collect_matches(
    mut found: mpsc::Receiver<PrivateKey>,
    max_keys: u64,
    cancel: CancelToken,
    stream: mpsc::UnboundedSender<PrivateKey>,
    started: Instant,
) -> Vec<PrivateKey> {
    let mut keys = Vec::new();

    loop {
        let key = tokio::select! {
            biased;
            key = found.recv() => key,
            _ = cancel.cancelled() => None,
        };
        let Some(key) = key else {
            break;
        };

        info!(
            "Found key #{}: {} after {:.2?}",
            keys.len() + 1,
            key,
            started.elapsed()
        );
        // the handle may already be gone
        let _ = stream.send(key.clone());
        keys.push(key);

        if keys.len() as u64 >= max_keys {
            cancel.cancel();
            break;
        }
    }

    keys
}

/// Number of (U, V) candidates in moduli [from, to)
fn candidates_between(from: u64, to: u64) -> u128 {
    (from..to).map(|u| u128::from(u.saturating_sub(1))).sum()
}

async fn report_progress(
    current: Arc<AtomicU64>,
    period: Duration,
    cancel: CancelToken,
    started: Instant,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.tick().await;
    let mut last = current.load(Ordering::Relaxed);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {
                let now = current.load(Ordering::Relaxed);
                let secs = period.as_secs_f64();
                let moduli_rate = now.saturating_sub(last) as f64 / secs;
                let key_rate = candidates_between(last, now) as f64 / secs;

                info!(
                    "Searching U={} elapsed={:.0?} rate={:.1} U/s (~{:.0} keys/s)",
                    now,
                    started.elapsed(),
                    moduli_rate,
                    key_rate
                );
                last = now;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::BlockSize;

    fn bat_search(config: SearchConfig) -> ExhaustiveSearch {
        let public = PublicKey::from_u64(&[39, 65, 117, 234, 494, 303, 671, 670]).unwrap();
        let cipher = Ciphertext::from_u64(&[736, 852, 719], BlockSize::new(1).unwrap());
        ExhaustiveSearch::new(cipher, public, b"Bat".to_vec(), config).unwrap()
    }

    fn config(start: u64, max: u64, max_keys: u64, workers: usize) -> SearchConfig {
        SearchConfig {
            workers,
            progress_interval: Duration::from_millis(20),
            ..SearchConfig::bounded(start, max, max_keys)
        }
    }

    fn pairs(keys: &[PrivateKey]) -> Vec<(BigUint, BigUint)> {
        let mut pairs: Vec<_> = keys.iter().map(|k| (k.u().clone(), k.v().clone())).collect();
        pairs.sort();
        pairs
    }

    #[tokio::test]
    async fn test_finds_every_key_in_range() {
        let outcome = bat_search(config(2, 130, 5, 2)).run().await.unwrap();

        assert_eq!(outcome.termination, Termination::SearchSpaceExhausted);
        assert_eq!(outcome.last_modulus, 130);
        assert_eq!(
            pairs(&outcome.keys),
            vec![
                (BigUint::from(113u32), BigUint::from(13u32)),
                (BigUint::from(126u32), BigUint::from(13u32)),
            ]
        );
        assert_eq!(
            outcome.into_result().unwrap_err(),
            KnapsackError::SearchSpaceExhausted { found: 2 }
        );
    }

    #[tokio::test]
    async fn test_no_key_below_113() {
        let outcome = bat_search(config(2, 112, 5, 3)).run().await.unwrap();

        assert_eq!(outcome.termination, Termination::SearchSpaceExhausted);
        assert!(outcome.keys.is_empty());
    }

    #[tokio::test]
    async fn test_stops_at_max_keys() {
        let outcome = bat_search(config(2, 400, 1, 4)).run().await.unwrap();

        assert_eq!(outcome.termination, Termination::MaxKeysFound);
        assert_eq!(outcome.keys.len(), 1);

        let cipher = Ciphertext::from_u64(&[736, 852, 719], BlockSize::new(1).unwrap());
        let public = PublicKey::from_u64(&[39, 65, 117, 234, 494, 303, 671, 670]).unwrap();
        let plain = decrypt(&cipher, &outcome.keys[0], &public).unwrap();
        assert_eq!(decode(&plain), b"Bat");

        assert_eq!(outcome.into_result().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_prefix_of_plaintext_is_not_a_match() {
        let public = PublicKey::from_u64(&[39, 65, 117, 234, 494, 303, 671, 670]).unwrap();
        let cipher = Ciphertext::from_u64(&[736, 852, 719], BlockSize::new(1).unwrap());
        let search =
            ExhaustiveSearch::new(cipher.clone(), public.clone(), b"B".to_vec(), config(1, 120, 100, 2))
                .unwrap();

        let outcome = search.run().await.unwrap();
        for key in &outcome.keys {
            let plain = decrypt(&cipher, key, &public).unwrap();
            assert_eq!(decode(&plain), b"B", "key {}", key);
        }
        assert!(outcome.keys.is_empty());
        assert_eq!(outcome.termination, Termination::SearchSpaceExhausted);
    }

    #[tokio::test]
    async fn test_streams_matches_in_modulus_order() {
        let mut handle = bat_search(config(100, 130, 2, 1)).spawn();

        let first = handle.next_match().await.unwrap();
        assert_eq!(first, PrivateKey::from_u64(113, 13).unwrap());
        let second = handle.next_match().await.unwrap();
        assert_eq!(second, PrivateKey::from_u64(126, 13).unwrap());
        assert!(handle.next_match().await.is_none());

        let outcome = handle.finish().await.unwrap();
        assert_eq!(outcome.termination, Termination::MaxKeysFound);
    }

    #[tokio::test]
    async fn test_cancel_stops_search() {
        let handle = bat_search(config(1, u64::MAX, 1_000_000, 2)).spawn();
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.cancel();

        let outcome = handle.finish().await.unwrap();
        assert_eq!(outcome.termination, Termination::Cancelled);
        assert!(outcome.last_modulus < u64::MAX);
        assert_eq!(outcome.into_result().unwrap_err(), KnapsackError::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_token_wakes_waiters() {
        let token = CancelToken::new();
        let waiter = {
            let token = token.clone();
            tokio::spawn(async move { token.cancelled().await })
        };

        token.cancel();
        waiter.await.unwrap();
        assert!(token.is_cancelled());
        // already cancelled resolves immediately
        token.cancelled().await;
    }

    #[test]
    fn test_rejects_bad_input() {
        let public = PublicKey::from_u64(&[39, 65, 117, 234, 494, 303, 671, 670]).unwrap();
        let cipher = Ciphertext::from_u64(&[736], BlockSize::new(1).unwrap());

        assert!(ExhaustiveSearch::new(
            cipher.clone(),
            public.clone(),
            Vec::new(),
            SearchConfig::default()
        )
        .is_err());
        assert!(ExhaustiveSearch::new(cipher, public, b"B".to_vec(), config(10, 5, 1, 1)).is_err());
    }

    #[test]
    fn test_candidates_between() {
        // U = 3 and U = 4 contribute 2 + 3 multipliers
        assert_eq!(candidates_between(3, 5), 5);
        assert_eq!(candidates_between(5, 5), 0);
        assert_eq!(candidates_between(0, 2), 0);
    }
}
