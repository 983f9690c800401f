//! VIBE Engine
//!
//! Owns every piece of runtime state: the blender, the amplifier, the slow
//! coordinator and the collaborators. Constructed once at startup and shared
//! through an `Arc` by the tick loop, the ingestion path and slow-update tasks.
//!
//! Blender state sits behind one mutex that is never held across an `.await`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::amplifier::{CinematicAmplifier, ExemplarLibrary};
use crate::blender::TemporalBlender;
use crate::config::EngineConfig;
use crate::coordinator::{SlowCoordinator, SlowFlags, SlowTicket, TicketKind};
use crate::errors::{Result, VibeError};
use crate::estimator::{NullEstimator, OllamaEstimator, SlowEstimator};
use crate::extract::text::split_sentences;
use crate::extract::{FastExtractor, LexiconExtractor};
use crate::ingest::{IngestReport, TranscriptPayload};
use crate::sink::{DryRunSink, VibeSink, WriterSink};
use crate::types::{NamedVibe, Vibe};

/// Longest transcript excerpt echoed in logs
const LOG_EXCERPT_CHARS: usize = 80;

/// Outcome of one tick
#[derive(Debug)]
pub struct Tick {
    /// Rendered value for this tick
    pub vibe: Vibe,
    pub settled: bool,
    /// Slow update started by this tick, if any
    pub slow_update: Option<JoinHandle<Option<Vibe>>>,
}

/// Engine status for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub context_words: usize,
    pub transcript_count: u64,
    pub slow_pending: bool,
    pub slow_in_flight: bool,
    pub current: NamedVibe,
    pub baseline: NamedVibe,
    pub hold_remaining_secs: f64,
    pub secs_since_baseline_update: f64,
    pub estimator: &'static str,
}

/// Builder for [`VibeEngine`]; unset collaborators get reference defaults
pub struct EngineBuilder {
    config: EngineConfig,
    amplifier: Option<CinematicAmplifier>,
    extractor: Option<Arc<dyn FastExtractor>>,
    estimator: Option<Arc<dyn SlowEstimator>>,
    sink: Option<Arc<dyn VibeSink>>,
}

impl EngineBuilder {
    pub fn with_amplifier(mut self, amplifier: CinematicAmplifier) -> Self {
        self.amplifier = Some(amplifier);
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn FastExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn with_estimator(mut self, estimator: Arc<dyn SlowEstimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn VibeSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> Result<Arc<VibeEngine>> {
        let config = self.config;
        config.validate()?;

        let amplifier = match self.amplifier {
            Some(a) => a,
            None => {
                let library = match &config.amplifier.exemplars_path {
                    Some(path) => ExemplarLibrary::load(path)?,
                    None => ExemplarLibrary::builtin(),
                };
                CinematicAmplifier::new(library)
            }
        }
        .with_max_passion(config.amplifier.max_passion);

        let extractor: Arc<dyn FastExtractor> = match self.extractor {
            Some(e) => e,
            None => match &config.extractor.lexicon_path {
                Some(path) => Arc::new(LexiconExtractor::load(path)?),
                None => {
                    warn!("No lexicon configured; valence/arousal/dominance stay neutral");
                    Arc::new(LexiconExtractor::default())
                }
            },
        };

        let estimator: Arc<dyn SlowEstimator> = match self.estimator {
            Some(e) => e,
            None if config.estimator.enabled => Arc::new(OllamaEstimator::new(&config.estimator)?),
            None => {
                warn!("Slow estimator disabled - fast-only mode");
                Arc::new(NullEstimator)
            }
        };

        let sink: Arc<dyn VibeSink> = match self.sink {
            Some(s) => s,
            None => match &config.sink.device_path {
                Some(path) => Arc::new(WriterSink::open(path)?),
                None => {
                    info!("No output device configured - dry run");
                    Arc::new(DryRunSink)
                }
            },
        };

        Ok(Arc::new(VibeEngine {
            blender: Mutex::new(TemporalBlender::new(config.blender.clone())),
            coordinator: SlowCoordinator::new(&config.coordinator),
            transcript_count: AtomicU64::new(0),
            amplifier,
            extractor,
            estimator,
            sink,
            config,
        }))
    }
}

/// The blending engine
pub struct VibeEngine {
    config: EngineConfig,
    blender: Mutex<TemporalBlender>,
    amplifier: CinematicAmplifier,
    coordinator: SlowCoordinator,
    extractor: Arc<dyn FastExtractor>,
    estimator: Arc<dyn SlowEstimator>,
    sink: Arc<dyn VibeSink>,
    transcript_count: AtomicU64,
}

impl VibeEngine {
    pub fn builder(config: EngineConfig) -> EngineBuilder {
        EngineBuilder {
            config,
            amplifier: None,
            extractor: None,
            estimator: None,
            sink: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn amplifier(&self) -> &CinematicAmplifier {
        &self.amplifier
    }

    pub fn coordinator(&self) -> &SlowCoordinator {
        &self.coordinator
    }

    pub fn current(&self) -> Result<Vibe> {
        Ok(self.blender.lock()?.current())
    }

    pub fn baseline(&self) -> Result<Vibe> {
        Ok(self.blender.lock()?.baseline())
    }

    /// Applies one transcript: every sentence becomes a burst, in order.
    ///
    /// Marks the slow estimator pending once per payload.
    pub fn ingest(&self, payload: &TranscriptPayload) -> Result<IngestReport> {
        let text = payload.validate()?;
        let influence = payload
            .influence
            .unwrap_or(self.config.blender.default_influence);

        let context_words = self.coordinator.record_context(text)?;
        let transcript_count = self.transcript_count.fetch_add(1, Ordering::SeqCst) + 1;

        info!(
            "Transcript #{}: \"{}{}\"",
            transcript_count,
            excerpt(text),
            if text.chars().count() > LOG_EXCERPT_CHARS { "..." } else { "" }
        );

        let sentences = split_sentences(text);
        let mut vibe = self.current()?;
        for sentence in &sentences {
            vibe = self.apply_sentence(sentence, influence)?;
        }

        self.coordinator.mark_pending()?;

        Ok(IngestReport {
            vibe,
            influence_used: influence,
            sentences_processed: sentences.len(),
            transcript_count,
            context_words,
        })
    }

    fn apply_sentence(&self, sentence: &str, influence: f64) -> Result<Vibe> {
        let natural = self.extractor.extract(sentence);
        let knobs = &self.config.amplifier;
        let reading = self
            .amplifier
            .amplify(&natural, knobs.passion, knobs.drama, knobs.k);

        // Frames go out under the blender lock so the device sees them in state order
        let (current, baseline) = {
            let mut blender = self.blender.lock()?;
            blender.apply_burst(reading.post_drama, Some(influence));
            self.send_frame(&blender.current());
            (blender.current(), blender.baseline())
        };

        info!("TEXT     : \"{}\"", sentence);
        info!("NATURAL  : {:.3}", reading.natural);
        info!("PASSION  : {:.3}", reading.post_passion);
        match &reading.cinema {
            Some(cinema) => info!(
                "DRAMA    : {:.3} -> {} (src: {}, dist:{:.3})",
                reading.post_drama, cinema.name, cinema.source, cinema.distance
            ),
            None => info!("DRAMA    : {:.3}", reading.post_drama),
        }
        info!("BASELINE : {:.3}", baseline);

        Ok(current)
    }

    pub fn tick(self: &Arc<Self>) -> Result<Tick> {
        self.tick_at(Instant::now())
    }

    /// Decays the blender, emits the frame, then considers a slow update.
    ///
    /// A dispatched slow update is spawned on the current Tokio runtime and
    /// never awaited here. Outside a runtime this fails with
    /// [`VibeError::Runtime`] before touching any state.
    pub fn tick_at(self: &Arc<Self>, now: Instant) -> Result<Tick> {
        let runtime =
            Handle::try_current().map_err(|e| VibeError::Runtime(e.to_string()))?;

        let (vibe, distance) = {
            let mut blender = self.blender.lock()?;
            let vibe = blender.tick_at(now);
            self.send_frame(&vibe);
            (vibe, blender.settle_distance())
        };

        let settled = self.coordinator.is_settled(&distance);
        let slow_update = self.coordinator.try_dispatch(settled)?.map(|ticket| {
            info!("Request new baseline (window_words={})", ticket.window_words());
            let engine = Arc::clone(self);
            runtime.spawn(async move { engine.run_slow_update(ticket).await })
        });

        Ok(Tick {
            vibe,
            settled,
            slow_update,
        })
    }

    /// Fixed-rate tick loop; returns once `shutdown` flips to true or closes.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.config.coordinator.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Tick loop started at {} Hz",
            self.config.coordinator.tick_hz
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick() {
                        warn!("Tick failed: {}", e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Tick loop stopped");
    }

    /// Startup baseline from the configured warm-up text.
    ///
    /// Shares the single slow slot, so it never overlaps a settle-triggered
    /// request. `None` when skipped or when the estimator gave nothing.
    pub async fn warm_baseline(self: &Arc<Self>) -> Option<Vibe> {
        let text = self.config.coordinator.warmup_text.as_deref()?;
        info!("Startup baseline warmup triggered");

        let ticket = match self.coordinator.try_reserve_warmup(text) {
            Ok(Some(ticket)) => ticket,
            Ok(None) => {
                debug!("Slow slot busy; skipping warmup");
                return None;
            }
            Err(e) => {
                warn!("Startup warmup failed: {}", e);
                return None;
            }
        };

        let applied = self.run_slow_update(ticket).await;
        if applied.is_none() {
            warn!("Startup warmup got no baseline");
        }
        info!("Startup baseline warmup complete");
        applied
    }

    /// Runs one slow request and applies its result; the ticket is released
    /// on return, clearing the coordinator flags.
    async fn run_slow_update(&self, ticket: SlowTicket) -> Option<Vibe> {
        let timeout = self.config.estimator.timeout();
        let result = match tokio::time::timeout(
            timeout,
            self.estimator.extract_baseline(ticket.context()),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(VibeError::EstimatorTimeout {
                timeout_secs: timeout.as_secs_f64(),
            }),
        };

        let applied = match result {
            Ok(vibe) => match self.apply_baseline(vibe) {
                Ok(current) => Some(current),
                Err(e) => {
                    warn!("Failed to apply baseline: {}", e);
                    None
                }
            },
            Err(e) if e.is_estimator_failure() => {
                warn!("Baseline update skipped: {}", e);
                None
            }
            Err(e) => {
                warn!("Baseline update error: {}", e);
                None
            }
        };

        if ticket.kind() == TicketKind::Settled && applied.is_none() {
            debug!("Pending cleared without correction; next transcript re-arms");
        }
        drop(ticket);
        applied
    }

    fn apply_baseline(&self, vibe: Vibe) -> Result<Vibe> {
        let current = {
            let mut blender = self.blender.lock()?;
            blender.apply_baseline_correction(vibe);
            self.send_frame(&blender.current());
            blender.current()
        };
        info!("NEW baseline -> {:.2}", current);
        Ok(current)
    }

    fn send_frame(&self, vibe: &Vibe) {
        if let Err(e) = self.sink.send(vibe) {
            warn!("Device send failed: {}", e);
        }
    }

    pub fn status(&self) -> Result<EngineStatus> {
        let snapshot = self.blender.lock()?.snapshot();
        let SlowFlags { pending, in_flight } = self.coordinator.flags()?;

        Ok(EngineStatus {
            context_words: self.coordinator.context_words()?,
            transcript_count: self.transcript_count.load(Ordering::SeqCst),
            slow_pending: pending,
            slow_in_flight: in_flight,
            current: snapshot.current.named(),
            baseline: snapshot.baseline.named(),
            hold_remaining_secs: snapshot.hold_remaining_secs,
            secs_since_baseline_update: snapshot.secs_since_baseline_update,
            estimator: self.estimator.name(),
        })
    }
}

fn excerpt(text: &str) -> String {
    text.chars().take(LOG_EXCERPT_CHARS).collect()
}
