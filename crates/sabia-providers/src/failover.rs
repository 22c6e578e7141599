//! Speech failover: try the preferred producer, fall back to the next.
//!
//! Lightweight chain with per-producer health tracking. A producer that
//! fails 3 times in a row is skipped for a 60 s cool-down; one success
//! resets it. Every call is bounded by the chain's timeout.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sabia_core::error::{Result, SabiaError};
use sabia_core::traits::SpeechProducer;
use sabia_core::types::AudioClip;

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Per-producer health tracking.
struct ProducerSlot {
    producer: Box<dyn SpeechProducer>,
    /// Consecutive failure count.
    failures: AtomicU32,
    /// Unix secs of the last failure, 0 = never.
    last_failure: AtomicU64,
    max_failures: u32,
    cooldown_secs: u64,
}

impl ProducerSlot {
    fn new(producer: Box<dyn SpeechProducer>) -> Self {
        Self {
            producer,
            failures: AtomicU32::new(0),
            last_failure: AtomicU64::new(0),
            max_failures: 3,
            cooldown_secs: 60,
        }
    }

    fn is_healthy(&self) -> bool {
        if self.failures.load(Ordering::Relaxed) < self.max_failures {
            return true;
        }
        let last = self.last_failure.load(Ordering::Relaxed);
        now_secs().saturating_sub(last) > self.cooldown_secs
    }

    fn record_success(&self) {
        self.failures.store(0, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        self.last_failure.store(now_secs(), Ordering::Relaxed);
    }
}

/// Ordered speech producers; the first non-empty clip wins.
pub struct SpeechChain {
    slots: Vec<ProducerSlot>,
    timeout: Duration,
}

impl SpeechChain {
    /// First producer is preferred, the rest are fallbacks. An empty chain never produces audio.
    pub fn new(producers: Vec<Box<dyn SpeechProducer>>, timeout: Duration) -> Self {
        Self {
            slots: producers.into_iter().map(ProducerSlot::new).collect(),
            timeout,
        }
    }

    /// Override the skip policy (consecutive failures, cool-down seconds).
    pub fn with_health_policy(mut self, max_failures: u32, cooldown_secs: u64) -> Self {
        for slot in &mut self.slots {
            slot.max_failures = max_failures;
            slot.cooldown_secs = cooldown_secs;
        }
        self
    }

    pub fn chain_len(&self) -> usize {
        self.slots.len()
    }

    pub fn producer_names(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.producer.name()).collect()
    }

    /// `(name, healthy, consecutive failures)` per producer.
    pub fn health_status(&self) -> Vec<(&str, bool, u32)> {
        self.slots
            .iter()
            .map(|s| (s.producer.name(), s.is_healthy(), s.failures.load(Ordering::Relaxed)))
            .collect()
    }

    /// Best-effort synthesis. `None` means no audio, never an error.
    pub async fn synthesize(&self, text: &str, language: &str) -> Option<AudioClip> {
        if text.trim().is_empty() {
            return None;
        }
        for (idx, slot) in self.slots.iter().enumerate() {
            let name = slot.producer.name();
            if !slot.is_healthy() {
                tracing::debug!(
                    "⏭️ Skipping unhealthy speech producer: {} ({} failures)",
                    name,
                    slot.failures.load(Ordering::Relaxed)
                );
                continue;
            }

            let outcome = match tokio::time::timeout(self.timeout, slot.producer.synthesize(text, language)).await {
                Ok(Ok(clip)) if !clip.is_empty() => Ok(clip),
                Ok(Ok(_)) => Err(SabiaError::Synthesis(format!("{name} returned empty audio"))),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(SabiaError::Synthesis(format!("{name} timed out after {:?}", self.timeout))),
            };

            match outcome {
                Ok(clip) => {
                    if idx > 0 {
                        tracing::info!("🔄 Speech failover: {} → {} (success)", self.slots[0].producer.name(), name);
                    }
                    slot.record_success();
                    return Some(clip);
                }
                Err(e) => {
                    slot.record_failure();
                    tracing::warn!(
                        "⚠️ Speech producer {} failed (attempt {}): {}",
                        name,
                        slot.failures.load(Ordering::Relaxed),
                        e
                    );
                }
            }
        }
        tracing::debug!("No speech producer succeeded; replying without audio");
        None
    }
}

#[async_trait]
impl SpeechProducer for SpeechChain {
    fn name(&self) -> &str {
        self.slots.first().map(|s| s.producer.name()).unwrap_or("speech-chain")
    }

    async fn synthesize(&self, text: &str, language: &str) -> Result<AudioClip> {
        SpeechChain::synthesize(self, text, language)
            .await
            .ok_or_else(|| SabiaError::Synthesis("all speech producers failed".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[derive(Clone, Copy)]
    enum Script {
        Audio(&'static [u8]),
        Empty,
        Fail,
        Hang,
    }

    struct Scripted {
        name: &'static str,
        script: Script,
        calls: Arc<AtomicUsize>,
    }

    impl Scripted {
        fn boxed(name: &'static str, script: Script) -> (Box<dyn SpeechProducer>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let producer = Box::new(Self {
                name,
                script,
                calls: calls.clone(),
            });
            (producer, calls)
        }
    }

    #[async_trait]
    impl SpeechProducer for Scripted {
        fn name(&self) -> &str {
            self.name
        }
        async fn synthesize(&self, text: &str, _language: &str) -> Result<AudioClip> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script {
                Script::Audio(bytes) => Ok(AudioClip::mp3(bytes.to_vec(), text)),
                Script::Empty => Ok(AudioClip::mp3(Vec::new(), text)),
                Script::Fail => Err(SabiaError::Synthesis("quota exceeded".into())),
                Script::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(AudioClip::mp3(b"late".to_vec(), text))
                }
            }
        }
    }

    fn chain(producers: Vec<Box<dyn SpeechProducer>>) -> SpeechChain {
        SpeechChain::new(producers, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let (a, a_calls) = Scripted::boxed("a", Script::Audio(b"AAA"));
        let (b, b_calls) = Scripted::boxed("b", Script::Audio(b"BBB"));
        let clip = chain(vec![a, b]).synthesize("hello", "en").await.unwrap();
        assert_eq!(clip.bytes, b"AAA");
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_falls_back_on_failure_or_empty_audio() {
        for first in [Script::Fail, Script::Empty] {
            let (a, _) = Scripted::boxed("a", first);
            let (b, _) = Scripted::boxed("b", Script::Audio(b"BBB"));
            let clip = chain(vec![a, b]).synthesize("hello", "en").await.unwrap();
            assert_eq!(clip.bytes, b"BBB");
        }
    }

    #[tokio::test]
    async fn test_all_fail_is_none() {
        let (a, _) = Scripted::boxed("a", Script::Fail);
        let (b, _) = Scripted::boxed("b", Script::Empty);
        let chain = chain(vec![a, b]);
        assert!(chain.synthesize("hello", "en").await.is_none());
        assert!(SpeechProducer::synthesize(&chain, "hello", "en").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_producer_is_bounded() {
        let (a, _) = Scripted::boxed("slow", Script::Hang);
        let (b, _) = Scripted::boxed("b", Script::Audio(b"BBB"));
        let clip = chain(vec![a, b]).synthesize("hello", "en").await.unwrap();
        assert_eq!(clip.bytes, b"BBB");
    }

    #[tokio::test]
    async fn test_unhealthy_producer_is_skipped() {
        let (a, a_calls) = Scripted::boxed("a", Script::Fail);
        let (b, _) = Scripted::boxed("b", Script::Audio(b"BBB"));
        let chain = chain(vec![a, b]).with_health_policy(2, 3600);
        for _ in 0..4 {
            assert!(chain.synthesize("hello", "en").await.is_some());
        }
        assert_eq!(a_calls.load(Ordering::SeqCst), 2);
        let status = chain.health_status();
        assert_eq!(status[0], ("a", false, 2));
        assert_eq!(status[1], ("b", true, 0));
    }

    #[tokio::test]
    async fn test_blank_text_skips_producers() {
        let (a, a_calls) = Scripted::boxed("a", Script::Audio(b"AAA"));
        assert!(chain(vec![a]).synthesize("  ", "en").await.is_none());
        assert_eq!(a_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_health_tracking() {
        let (a, _) = Scripted::boxed("a", Script::Fail);
        let slot = ProducerSlot::new(a);
        assert!(slot.is_healthy());
        slot.record_failure();
        slot.record_failure();
        assert!(slot.is_healthy());
        slot.record_failure();
        assert!(!slot.is_healthy());
        slot.record_success();
        assert!(slot.is_healthy());
    }
}
