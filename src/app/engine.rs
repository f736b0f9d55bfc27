//! Emotion engine: triggers → animation + motion cycles.
//!
//! ## One cycle
//!
//! ```text
//!  trigger ─▶ resolve ─▶ cycle lock ─▶ cooldown ─▶ load frames
//!                                                     │
//!              ┌──────────── spawn motion thread ◀────┤
//!              │                                      ▼
//!              │                          play frames at `fps` (caller thread)
//!              ▼                                      │
//!        move_to(profile) ──── done channel ────▶ join (deadline) ─▶ state + journal
//! ```
//!
//! - The display is owned by the cycle lock; a trigger arriving while a
//!   cycle holds it is rejected as busy rather than queued.
//! - The cooldown is measured from the end of the last successful cycle.
//!   Self-chained transitions, the consumer's return to neutral and the
//!   startup/shutdown sequences bypass it.
//! - Motion starts only once the frames have loaded, so a missing
//!   animation never moves the servos; decode time delays the first pose.
//! - A motion thread that misses its join deadline is detached; playback
//!   and the state update proceed without it.  Until it finishes, later
//!   servo work (motion, centring, parking) is skipped rather than queued.
//! - An invalid [`EngineConfig`] is replaced by the defaults, keeping only
//!   its asset root.
//! - Nothing crosses the trigger boundary except `bool` / [`TriggerOutcome`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use log::{debug, error, info, warn};

use super::outcome::{FailReason, Origin, RejectReason, StateRecord, TriggerOutcome};
use super::ports::{Clock, DisplayPort, PersistencePort, ServoBus};
use crate::config::EngineConfig;
use crate::drivers::actuators::{ActuatorCoordinator, MotionOutcome, MotionTiming};
use crate::emotion::transitions::TransitionGraph;
use crate::emotion::triggers::{self, TriggerKind};
use crate::emotion::{EmotionCatalog, EmotionProfile, IDLE_EMOTION};
use crate::error::ActuatorError;
use crate::events::SensorEvent;
use crate::frames::{FramePipeline, text};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mutable engine bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineState {
    pub current_emotion: &'static str,
    /// End of the last successful cycle; `None` until the first one.
    pub last_trigger: Option<Instant>,
    pub cycles: u64,
}

/// Snapshot for the host: which components are degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStatus {
    pub current_emotion: &'static str,
    pub display_ready: bool,
    pub actuators_ready: bool,
    pub running: bool,
    pub cycles: u64,
}

/// Whether a play request honours the cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    Cooldown,
    Bypass,
}

pub struct EmotionEngine<D, S> {
    config: EngineConfig,
    catalog: EmotionCatalog,
    graph: TransitionGraph,
    pipeline: FramePipeline,
    /// Cycle lock; also owns the display.
    stage: Mutex<Option<D>>,
    display_ready: bool,
    actuators: Arc<Mutex<ActuatorCoordinator<S>>>,
    actuators_ready: bool,
    state: Mutex<EngineState>,
    persistence: Mutex<Box<dyn PersistencePort + Send>>,
    clock: Arc<dyn Clock>,
    running: Arc<AtomicBool>,
}

impl<D, S> EmotionEngine<D, S>
where
    D: DisplayPort + Send,
    S: ServoBus + Send + 'static,
{
    /// Build an engine.  `display` / `servos` are `None` when the device
    /// failed to open; the engine then runs degraded.
    pub fn new(
        config: EngineConfig,
        display: Option<D>,
        servos: Option<S>,
        persistence: Box<dyn PersistencePort + Send>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                warn!("ENGINE | {}, using default settings", e);
                EngineConfig {
                    asset_root: config.asset_root,
                    ..EngineConfig::default()
                }
            }
        };
        let catalog = EmotionCatalog::builtin();
        let graph = TransitionGraph::from_catalog(&catalog);
        let pipeline = FramePipeline::from_config(&config);
        let display_ready = display.is_some();
        let actuators_ready = servos.is_some();
        if !display_ready {
            warn!("ENGINE | display unavailable, animations disabled");
        }
        let actuators = ActuatorCoordinator::new(
            servos,
            Arc::clone(&clock),
            MotionTiming::from_config(&config),
        );

        Self {
            config,
            catalog,
            graph,
            pipeline,
            stage: Mutex::new(display),
            display_ready,
            actuators: Arc::new(Mutex::new(actuators)),
            actuators_ready,
            state: Mutex::new(EngineState {
                current_emotion: IDLE_EMOTION,
                last_trigger: None,
                cycles: 0,
            }),
            persistence: Mutex::new(persistence),
            clock,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Replace the emotion set (and the transition graph derived from it).
    pub fn with_catalog(mut self, catalog: EmotionCatalog) -> Self {
        self.graph = TransitionGraph::from_catalog(&catalog);
        self.catalog = catalog;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &EmotionCatalog {
        &self.catalog
    }

    pub fn graph(&self) -> &TransitionGraph {
        &self.graph
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stop background loops (consumer, idle continuation) at their next
    /// boundary.  Does not interrupt a cycle in progress.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn state(&self) -> EngineState {
        *lock(&self.state)
    }

    pub fn status(&self) -> EngineStatus {
        let state = self.state();
        EngineStatus {
            current_emotion: state.current_emotion,
            display_ready: self.display_ready,
            actuators_ready: self.actuators_ready,
            running: self.is_running(),
            cycles: state.cycles,
        }
    }

    // ── Trigger ingress ───────────────────────────────────────

    /// Play the emotion mapped to `kind`.  `true` iff it played.
    pub fn trigger(&self, kind: TriggerKind, context: Option<&str>) -> bool {
        self.trigger_outcome(kind, context).is_played()
    }

    pub fn trigger_outcome(&self, kind: TriggerKind, context: Option<&str>) -> TriggerOutcome {
        let emotion = triggers::resolve(kind, context);
        self.play(emotion, Origin::Trigger(kind), Gate::Cooldown)
    }

    /// Trigger, then follow the transition graph up to `depth` more steps.
    /// Chain links bypass the cooldown; the chain stops at the first link
    /// that does not play.
    pub fn trigger_chained(&self, kind: TriggerKind, context: Option<&str>, depth: usize) -> bool {
        let Some(mut current) = self.trigger_outcome(kind, context).emotion() else {
            return false;
        };
        for _ in 0..depth {
            if !self.is_running() {
                break;
            }
            let next = self.graph.next(current);
            let outcome = self.play(next, Origin::Transition, Gate::Bypass);
            if !outcome.is_played() {
                debug!("ENGINE | chain stopped at {}: {:?}", next, outcome);
                break;
            }
            current = next;
        }
        true
    }

    /// Play a queued sensor event's emotion, subject to the cooldown.
    pub fn handle_sensor_event(&self, event: &SensorEvent) -> TriggerOutcome {
        debug!(
            "ENGINE | {} event waited {:?}",
            event.source,
            event.enqueued_at.elapsed()
        );
        self.play(event.emotion, Origin::Sensor(event.source), Gate::Cooldown)
    }

    /// Play `emotion` regardless of the cooldown.
    pub fn force_emotion(&self, emotion: &str) -> bool {
        let Some(name) = self.catalog.intern(emotion) else {
            warn!("ENGINE | unknown emotion '{}'", emotion);
            return false;
        };
        self.play(name, Origin::Recovery, Gate::Bypass).is_played()
    }

    /// Play a transition-graph successor of the current emotion.
    pub fn continue_idle(&self) -> bool {
        let next = self.graph.next(self.state().current_emotion);
        self.play(next, Origin::Transition, Gate::Cooldown).is_played()
    }

    // ── Text and sequences ────────────────────────────────────

    /// Show centred text for `hold`.  Waits for any running cycle.
    pub fn show_text(&self, message: &str, hold: Duration) -> bool {
        if !self.display_ready {
            warn!("ENGINE | display unavailable, cannot show text {:?}", message);
            return false;
        }
        let mut stage = lock(&self.stage);
        let Some(display) = stage.as_mut() else {
            return false;
        };
        let (width, height) = display.size();
        let frame = text::render(message, width, height);
        if let Err(e) = display.show(&frame) {
            warn!("ENGINE | text {:?} not shown: {}", message, e);
            return false;
        }
        info!("ENGINE | text {:?}", message);
        self.clock.sleep(hold);
        true
    }

    /// Boot banner, boot animation, ready banner, idle pose.
    pub fn startup_sequence(&self) -> bool {
        info!("ENGINE | startup sequence");
        self.with_idle_actuators("centring", ActuatorCoordinator::neutral);
        let hold = self.config.text_hold();
        self.show_text("BEEMO", hold);
        self.show_text("BEEMO\nStarting up...", hold);
        let boot = self.play(
            triggers::resolve(TriggerKind::Startup, None),
            Origin::Trigger(TriggerKind::Startup),
            Gate::Bypass,
        );
        self.show_text("Ready!", hold);
        let idle = self.play(IDLE_EMOTION, Origin::Sequence, Gate::Bypass);
        info!("ENGINE | startup complete");
        boot.is_played() && idle.is_played()
    }

    /// Stop loops, play the shutdown emotion, blank the panel and park the
    /// servos.
    pub fn shutdown(&self) {
        info!("ENGINE | shutting down");
        self.stop();
        self.play(
            triggers::resolve(TriggerKind::Shutdown, None),
            Origin::Trigger(TriggerKind::Shutdown),
            Gate::Bypass,
        );
        if let Some(display) = lock(&self.stage).as_mut() {
            if let Err(e) = display.clear() {
                warn!("ENGINE | display clear failed: {}", e);
            }
        }
        self.with_idle_actuators("park", ActuatorCoordinator::park);
        info!("ENGINE | shutdown complete");
    }

    // ── Cycle ─────────────────────────────────────────────────

    fn play(&self, emotion: &'static str, origin: Origin, gate: Gate) -> TriggerOutcome {
        if !self.display_ready {
            error!("ENGINE | display not initialised, cannot show {}", emotion);
            return TriggerOutcome::Failed(FailReason::DisplayUnavailable);
        }

        let mut stage = match self.stage.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(p)) => p.into_inner(),
            Err(TryLockError::WouldBlock) => {
                info!("ENGINE | busy, {} ({}) rejected", emotion, origin.label());
                return TriggerOutcome::Rejected(RejectReason::Busy);
            }
        };
        let Some(display) = stage.as_mut() else {
            return TriggerOutcome::Failed(FailReason::DisplayUnavailable);
        };

        if gate == Gate::Cooldown {
            if let Some(remaining) = self.cooldown_remaining() {
                info!(
                    "ENGINE | cooldown, {} ({}) rejected, {:?} left",
                    emotion,
                    origin.label(),
                    remaining
                );
                return TriggerOutcome::Rejected(RejectReason::Cooldown { remaining });
            }
        }

        info!("ENGINE | trigger={} emotion={}", origin.label(), emotion);
        if let Some(outcome) = self.run_cycle(display, emotion, origin) {
            return outcome;
        }

        error!("ENGINE | no frames for {}", emotion);
        if self.config.fallback_to_idle && emotion != IDLE_EMOTION {
            info!("ENGINE | falling back to {}", IDLE_EMOTION);
            if self.run_cycle(display, IDLE_EMOTION, Origin::Recovery).is_none() {
                error!("ENGINE | no frames for {} either", IDLE_EMOTION);
            }
        }
        TriggerOutcome::Failed(FailReason::NoFrames { emotion })
    }

    fn cooldown_remaining(&self) -> Option<Duration> {
        let last = self.state().last_trigger?;
        let since = self.clock.now().saturating_duration_since(last);
        self.config.cooldown().checked_sub(since).filter(|d| !d.is_zero())
    }

    /// Load, play and join.  `None` if the emotion has no frames.
    fn run_cycle(&self, display: &mut D, emotion: &'static str, origin: Origin) -> Option<TriggerOutcome> {
        let started = self.clock.now();
        let profile = self.catalog.profile_or_still(emotion);

        let frames = self.pipeline.load(emotion);
        if frames.is_empty() {
            return None;
        }
        if profile.frame_count != 0 && frames.len() != usize::from(profile.frame_count) {
            warn!(
                "ENGINE | {} has {} frames, expected {}",
                emotion,
                frames.len(),
                profile.frame_count
            );
        }

        let motion = self.spawn_motion(profile);

        let delay = self.config.frame_delay();
        for frame in &frames {
            if let Err(e) = display.show(frame) {
                warn!("ENGINE | {} frame {} skipped: {}", emotion, frame.index, e);
            }
            self.clock.sleep(delay);
        }

        let motion = match motion {
            Ok(rx) => match rx.recv_timeout(self.config.actuator_join_timeout()) {
                Ok(outcome) => Some(outcome),
                Err(_) => {
                    warn!("ENGINE | {} motion missed its deadline, detaching", emotion);
                    None
                }
            },
            Err(outcome) => Some(outcome),
        };

        let duration = self.clock.now().saturating_duration_since(started);
        {
            let mut state = lock(&self.state);
            state.current_emotion = emotion;
            state.last_trigger = Some(self.clock.now());
            state.cycles += 1;
        }
        self.report(emotion, origin, duration);

        info!(
            "ENGINE | played emotion={} frames={} duration={}ms",
            emotion,
            frames.len(),
            duration.as_millis()
        );
        Some(TriggerOutcome::Played {
            emotion,
            frames: frames.len(),
            duration,
            motion,
        })
    }

    /// Start the motion thread.  `Err` carries the outcome when no thread
    /// was needed (or could be started).
    fn spawn_motion(&self, profile: EmotionProfile) -> Result<Receiver<MotionOutcome>, MotionOutcome> {
        if !self.actuators_ready {
            return Err(MotionOutcome::Disabled);
        }
        if profile.motion.is_none() {
            return Err(MotionOutcome::Skipped);
        }

        let (tx, rx) = crossbeam_channel::bounded(1);
        let actuators = Arc::clone(&self.actuators);
        let spawned = thread::Builder::new()
            .name("motion".into())
            .spawn(move || {
                let outcome = match actuators.try_lock() {
                    Ok(mut coordinator) => coordinator.move_to(&profile),
                    Err(TryLockError::Poisoned(p)) => p.into_inner().move_to(&profile),
                    Err(TryLockError::WouldBlock) => {
                        warn!("ACT | previous motion still running, {} skipped", profile.name);
                        MotionOutcome::Busy
                    }
                };
                let _ = tx.send(outcome);
            });

        match spawned {
            Ok(_) => Ok(rx),
            Err(e) => {
                error!("ENGINE | motion thread spawn failed: {}", e);
                Err(MotionOutcome::Disabled)
            }
        }
    }

    /// Run `op` on the coordinator unless a detached motion thread still
    /// holds it.
    fn with_idle_actuators(
        &self,
        what: &str,
        op: fn(&mut ActuatorCoordinator<S>) -> Result<(), ActuatorError>,
    ) {
        if !self.actuators_ready {
            return;
        }
        let result = match self.actuators.try_lock() {
            Ok(mut coordinator) => op(&mut *coordinator),
            Err(TryLockError::Poisoned(p)) => op(&mut *p.into_inner()),
            Err(TryLockError::WouldBlock) => {
                warn!("ENGINE | servo {} skipped, motion still running", what);
                return;
            }
        };
        if let Err(e) = result {
            warn!("ENGINE | servo {} failed: {}", what, e);
        }
    }

    fn report(&self, emotion: &str, origin: Origin, duration: Duration) {
        let record = StateRecord::new(emotion, origin, duration);
        let mut sink = lock(&self.persistence);
        if let Err(e) = sink.record_state(&record) {
            warn!("ENGINE | history not saved: {}", e);
        }
        if let Err(e) = sink.increment_stat(emotion) {
            warn!("ENGINE | stats not saved: {}", e);
        }
    }
}
