//! Sensor event consumer: the single thread that drains the event queue.
//!
//! For each event, in enqueue order:
//!
//! 1. vibration only: show the vibration banner
//! 2. play the event's emotion (cooldown applies)
//! 3. pause, then force the idle emotion (cooldown bypassed)
//!
//! With `idle_interval_secs` set, a quiet queue also triggers a
//! transition-graph continuation once per interval.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info, warn};

use super::engine::EmotionEngine;
use super::outcome::TriggerOutcome;
use super::ports::{DisplayPort, ServoBus};
use crate::emotion::IDLE_EMOTION;
use crate::events::{EventQueue, SensorEvent, SensorSource};

pub const VIBRATION_BANNER: &str = "Vibration\ndetected!";

/// Handle one dequeued event end to end.
pub fn process_event<D, S>(engine: &EmotionEngine<D, S>, event: &SensorEvent) -> TriggerOutcome
where
    D: DisplayPort + Send,
    S: ServoBus + Send + 'static,
{
    info!("CONSUMER | source={} emotion={}", event.source, event.emotion);
    let config = engine.config();

    if event.source == SensorSource::Vibration {
        engine.show_text(VIBRATION_BANNER, config.text_hold());
    }
    let outcome = engine.handle_sensor_event(event);
    if !outcome.is_played() {
        debug!("CONSUMER | {} not played: {:?}", event.emotion, outcome);
    }

    engine
        .clock()
        .sleep(Duration::from_millis(config.return_to_neutral_delay_ms));
    engine.force_emotion(IDLE_EMOTION);
    outcome
}

/// Spawn the consumer thread.  It exits at the first queue wait after
/// [`EmotionEngine::stop`].
pub fn spawn<D, S>(engine: Arc<EmotionEngine<D, S>>, queue: EventQueue) -> std::io::Result<JoinHandle<()>>
where
    D: DisplayPort + Send + 'static,
    S: ServoBus + Send + 'static,
{
    thread::Builder::new()
        .name("consumer".into())
        .spawn(move || run(&engine, &queue))
}

fn run<D, S>(engine: &EmotionEngine<D, S>, queue: &EventQueue)
where
    D: DisplayPort + Send,
    S: ServoBus + Send + 'static,
{
    let wait = Duration::from_millis(engine.config().consumer_wait_ms);
    let idle_interval = engine
        .config()
        .idle_interval_secs
        .map(|s| Duration::from_secs(u64::from(s)));
    let clock = Arc::clone(engine.clock());
    let mut quiet_since = clock.now();

    info!("CONSUMER | started");
    while engine.is_running() {
        match queue.pop_timeout(wait) {
            Some(event) => {
                process_event(engine, &event);
                quiet_since = clock.now();
            }
            None => {
                let Some(interval) = idle_interval else {
                    continue;
                };
                if clock.now().saturating_duration_since(quiet_since) >= interval {
                    if !engine.continue_idle() {
                        debug!("CONSUMER | idle continuation skipped");
                    }
                    quiet_since = clock.now();
                }
            }
        }
    }
    if queue.dropped() > 0 {
        warn!("CONSUMER | {} sensor events dropped while busy", queue.dropped());
    }
    info!("CONSUMER | stopped");
}
