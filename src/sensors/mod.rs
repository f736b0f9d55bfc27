//! Sensor monitor: touch and vibration inputs → queued emotion events.
//!
//! ## Detection strategies
//!
//! | Mode      | Mechanism                                     | Debounce |
//! |-----------|-----------------------------------------------|----------|
//! | Interrupt | Falling-edge callbacks via [`EdgeDetector`]   | per-channel timestamp window |
//! | Polling   | One thread samples every pin each `poll_interval` | same window, against previous sample |
//!
//! Interrupts are preferred.  If any channel fails to register, the
//! partial registrations are removed and the monitor falls back to polling
//! for every channel.  Both paths converge on one operation: pick a random
//! emotion from the channel's candidate set and push a [`SensorEvent`]
//! without blocking.
//!
//! ```text
//! Unconfigured ──start()──▶ InterruptActive ──stop()──▶ Stopped
//!              └─────────▶ PollingActive   ─────────┘
//! ```

pub mod debounce;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use embedded_hal::digital::InputPin;
use log::{debug, error, info, warn};
use rand::seq::SliceRandom;

use crate::app::ports::{Clock, EdgeCallback, EdgeDetector};
use crate::emotion::transitions::{Candidates, MAX_CANDIDATES};
use crate::emotion::{TOUCH_EMOTIONS, VIBRATION_EMOTIONS};
use crate::error::SensorError;
use crate::events::{EventQueue, SensorEvent, SensorSource};
use crate::pins;
use debounce::Debouncer;

/// One digital input and the emotions it may produce.
pub struct InputChannel<P> {
    pub source: SensorSource,
    pub gpio: u8,
    pub pin: P,
    pub debounce: Duration,
    pub candidates: Candidates,
}

impl<P> InputChannel<P> {
    pub fn new(
        source: SensorSource,
        gpio: u8,
        pin: P,
        debounce: Duration,
        emotions: &[&'static str],
    ) -> Self {
        let candidates = emotions.iter().copied().take(MAX_CANDIDATES).collect();
        Self {
            source,
            gpio,
            pin,
            debounce,
            candidates,
        }
    }

    /// Touch pad producing one of the happy emotions.
    pub fn touch(gpio: u8, pin: P, debounce: Duration) -> Self {
        Self::new(SensorSource::Touch, gpio, pin, debounce, &TOUCH_EMOTIONS)
    }

    /// Vibration switch producing one of the startled emotions.
    pub fn vibration(gpio: u8, pin: P, debounce: Duration) -> Self {
        Self::new(SensorSource::Vibration, gpio, pin, debounce, &VIBRATION_EMOTIONS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Unconfigured,
    InterruptActive,
    PollingActive,
    Stopped,
}

/// Pick a random candidate and enqueue it.  Shared by both detection paths.
fn raise(queue: &EventQueue, source: SensorSource, candidates: &[&'static str]) -> bool {
    let Some(&emotion) = candidates.choose(&mut rand::thread_rng()) else {
        warn!("SENSOR | source={} has no candidate emotions", source);
        return false;
    };
    let queued = queue.push(SensorEvent::new(source, emotion));
    if queued {
        info!("SENSOR | source={} emotion={}", source, emotion);
    } else {
        warn!("SENSOR | source={} emotion={} dropped, queue full", source, emotion);
    }
    queued
}

pub struct SensorMonitor<P, E> {
    queue: EventQueue,
    detector: Option<E>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    channels: Vec<InputChannel<P>>,
    initial_levels: Vec<bool>,
    watched: Vec<u8>,
    state: MonitorState,
    running: Arc<AtomicBool>,
    poller: Option<JoinHandle<Vec<InputChannel<P>>>>,
}

impl<P, E> SensorMonitor<P, E>
where
    P: InputPin + Send + 'static,
    E: EdgeDetector,
{
    /// `detector = None` means the platform has no edge detection; the
    /// monitor will always poll.
    pub fn new(
        queue: EventQueue,
        detector: Option<E>,
        clock: Arc<dyn Clock>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            queue,
            detector,
            clock,
            poll_interval,
            channels: Vec::new(),
            initial_levels: Vec::new(),
            watched: Vec::new(),
            state: MonitorState::Unconfigured,
            running: Arc::new(AtomicBool::new(false)),
            poller: None,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// Validate and take ownership of the input channels.  `false` (and
    /// nothing stored) on any failure; see [`try_configure`](Self::try_configure).
    pub fn configure(&mut self, channels: Vec<InputChannel<P>>) -> bool {
        if self.state != MonitorState::Unconfigured {
            warn!("SENSOR | configure ignored in state {:?}", self.state);
            return false;
        }
        match self.try_configure(channels) {
            Ok(()) => true,
            Err(e) => {
                error!("SENSOR | {}", e);
                false
            }
        }
    }

    /// Rejects pins claimed by the display or I²C bus, pins used by two
    /// channels, and pins that cannot be read.
    pub fn try_configure(&mut self, mut channels: Vec<InputChannel<P>>) -> Result<(), SensorError> {
        let mut levels = Vec::with_capacity(channels.len());
        for ch in &mut channels {
            if pins::is_reserved(ch.gpio) {
                return Err(SensorError::PinReserved(ch.gpio));
            }
            let high = ch
                .pin
                .is_high()
                .map_err(|_| SensorError::GpioReadFailed(ch.gpio))?;
            levels.push(high);
        }
        let mut gpios: Vec<u8> = channels.iter().map(|c| c.gpio).collect();
        gpios.sort_unstable();
        if let Some(w) = gpios.windows(2).find(|w| w[0] == w[1]) {
            return Err(SensorError::DuplicatePin(w[0]));
        }

        info!("SENSOR | configured {} channel(s)", channels.len());
        self.channels = channels;
        self.initial_levels = levels;
        Ok(())
    }

    /// Begin detection.  Prefers interrupts, falls back to polling.
    pub fn start(&mut self) -> MonitorState {
        if self.state != MonitorState::Unconfigured {
            return self.state;
        }
        if self.channels.is_empty() {
            warn!("SENSOR | start called before configure");
            return self.state;
        }
        self.running.store(true, Ordering::Release);

        if self.register_interrupts() {
            self.state = MonitorState::InterruptActive;
            info!("SENSOR | mode=interrupt channels={}", self.watched.len());
        } else {
            self.spawn_poller();
        }
        self.state
    }

    /// Remove edge registrations and join the polling thread.
    pub fn stop(&mut self) {
        if self.state == MonitorState::Stopped {
            return;
        }
        self.running.store(false, Ordering::Release);
        self.unwatch_all();
        if let Some(handle) = self.poller.take() {
            match handle.join() {
                Ok(channels) => self.channels = channels,
                Err(_) => error!("SENSOR | polling thread panicked"),
            }
        }
        self.state = MonitorState::Stopped;
        info!("SENSOR | stopped");
    }

    /// Try to register every channel.  All or nothing.
    fn register_interrupts(&mut self) -> bool {
        let Some(detector) = self.detector.as_mut() else {
            info!("SENSOR | no edge detector, polling");
            return false;
        };

        for ch in &self.channels {
            let queue = self.queue.clone();
            let clock = Arc::clone(&self.clock);
            let source = ch.source;
            let candidates = ch.candidates.clone();
            let mut debouncer = Debouncer::new(ch.debounce, true);
            let callback: EdgeCallback = Box::new(move || {
                if debouncer.accept(clock.now()) {
                    raise(&queue, source, &candidates);
                }
            });

            match detector.watch_falling(ch.gpio, ch.debounce, callback) {
                Ok(()) => self.watched.push(ch.gpio),
                Err(e) => {
                    warn!("SENSOR | {}, falling back to polling", e);
                    for gpio in self.watched.drain(..) {
                        detector.unwatch(gpio);
                    }
                    return false;
                }
            }
        }
        true
    }

    fn unwatch_all(&mut self) {
        if let Some(detector) = self.detector.as_mut() {
            for gpio in self.watched.drain(..) {
                detector.unwatch(gpio);
            }
        }
    }

    fn spawn_poller(&mut self) {
        let mut channels = std::mem::take(&mut self.channels);
        let mut debouncers: Vec<Debouncer> = channels
            .iter()
            .zip(&self.initial_levels)
            .map(|(ch, &high)| Debouncer::new(ch.debounce, high))
            .collect();
        let queue = self.queue.clone();
        let clock = Arc::clone(&self.clock);
        let running = Arc::clone(&self.running);
        let interval = self.poll_interval;

        let spawned = thread::Builder::new()
            .name("sensor-poll".into())
            .spawn(move || {
                while running.load(Ordering::Acquire) {
                    let now = clock.now();
                    for (ch, debouncer) in channels.iter_mut().zip(debouncers.iter_mut()) {
                        match ch.pin.is_high() {
                            Ok(high) => {
                                if debouncer.sample(high, now) {
                                    raise(&queue, ch.source, &ch.candidates);
                                }
                            }
                            Err(_) => debug!("SENSOR | gpio={} read failed", ch.gpio),
                        }
                    }
                    clock.sleep(interval);
                }
                channels
            });

        match spawned {
            Ok(handle) => {
                self.poller = Some(handle);
                self.state = MonitorState::PollingActive;
                info!("SENSOR | mode=polling interval={:?}", interval);
            }
            Err(e) => {
                error!("SENSOR | polling thread spawn failed: {}", e);
                self.running.store(false, Ordering::Release);
                self.state = MonitorState::Stopped;
            }
        }
    }
}

impl<P, E> Drop for SensorMonitor<P, E> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.poller.take() {
            let _ = handle.join();
        }
    }
}
