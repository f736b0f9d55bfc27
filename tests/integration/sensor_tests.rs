//! Integration tests for sensor detection → event queue.

use std::sync::Arc;
use std::time::{Duration, Instant};

use beemo::adapters::sim::{SimGpio, SimInputPin};
use beemo::adapters::time::MonotonicClock;
use beemo::emotion::{TOUCH_EMOTIONS, VIBRATION_EMOTIONS};
use beemo::events::{EventQueue, SensorEvent, SensorSource};
use beemo::sensors::{InputChannel, MonitorState, SensorMonitor};

const TOUCH: u8 = 4;
const VIBRATION: u8 = 22;

fn monitor(gpio: &SimGpio, queue: &EventQueue) -> SensorMonitor<SimInputPin, SimGpio> {
    SensorMonitor::new(
        queue.clone(),
        Some(gpio.clone()),
        Arc::new(MonotonicClock),
        Duration::from_millis(5),
    )
}

fn channels(gpio: &SimGpio, debounce: Duration) -> Vec<InputChannel<SimInputPin>> {
    vec![
        InputChannel::touch(TOUCH, gpio.input(TOUCH), debounce),
        InputChannel::vibration(VIBRATION, gpio.input(VIBRATION), debounce),
    ]
}

fn wait_for_event(queue: &EventQueue) -> Option<SensorEvent> {
    queue.pop_timeout(Duration::from_secs(2))
}

// ── Interrupt mode ────────────────────────────────────────────

#[test]
fn touch_edge_enqueues_a_touch_emotion() {
    let gpio = SimGpio::new();
    let queue = EventQueue::new(8);
    let mut m = monitor(&gpio, &queue);
    assert!(m.configure(channels(&gpio, Duration::ZERO)));
    assert_eq!(m.start(), MonitorState::InterruptActive);

    gpio.pulse(TOUCH);
    let ev = queue.try_pop().unwrap();
    assert_eq!(ev.source, SensorSource::Touch);
    assert!(TOUCH_EMOTIONS.contains(&ev.emotion));
    m.stop();
}

#[test]
fn bounce_inside_the_window_is_ignored() {
    let gpio = SimGpio::new();
    let queue = EventQueue::new(8);
    let mut m = monitor(&gpio, &queue);
    assert!(m.configure(channels(&gpio, Duration::from_secs(10))));
    m.start();

    gpio.pulse(VIBRATION);
    gpio.pulse(VIBRATION);
    gpio.pulse(VIBRATION);
    assert_eq!(queue.len(), 1);
    assert!(VIBRATION_EMOTIONS.contains(&queue.try_pop().unwrap().emotion));
    m.stop();
}

#[test]
fn full_queue_drops_without_blocking() {
    let gpio = SimGpio::new();
    let queue = EventQueue::new(1);
    let mut m = monitor(&gpio, &queue);
    assert!(m.configure(channels(&gpio, Duration::ZERO)));
    m.start();

    gpio.pulse(TOUCH);
    gpio.pulse(VIBRATION);
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.dropped(), 1);
    assert_eq!(queue.try_pop().unwrap().source, SensorSource::Touch);
    m.stop();
}

// ── Polling fallback ──────────────────────────────────────────

#[test]
fn no_interrupt_support_falls_back_to_polling() {
    let gpio = SimGpio::without_interrupts();
    let queue = EventQueue::new(8);
    let mut m = monitor(&gpio, &queue);
    assert!(m.configure(channels(&gpio, Duration::ZERO)));
    assert_eq!(m.start(), MonitorState::PollingActive);

    gpio.set_level(VIBRATION, false);
    let ev = wait_for_event(&queue).expect("polling thread never saw the edge");
    assert_eq!(ev.source, SensorSource::Vibration);
    gpio.set_level(VIBRATION, true);

    m.stop();
    assert_eq!(m.state(), MonitorState::Stopped);
}

#[test]
fn held_low_input_fires_once_while_polling() {
    let gpio = SimGpio::without_interrupts();
    let queue = EventQueue::new(8);
    let mut m = monitor(&gpio, &queue);
    assert!(m.configure(channels(&gpio, Duration::ZERO)));
    m.start();

    gpio.set_level(TOUCH, false);
    assert!(wait_for_event(&queue).is_some());
    // Several more polling intervals with the pin still low.
    let until = Instant::now() + Duration::from_millis(50);
    while Instant::now() < until {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(queue.is_empty());
    m.stop();
}

#[test]
fn partial_registration_is_rolled_back_before_polling() {
    let gpio = SimGpio::new();
    gpio.refuse_interrupts_on(VIBRATION);
    let queue = EventQueue::new(8);
    let mut m = monitor(&gpio, &queue);
    assert!(m.configure(channels(&gpio, Duration::ZERO)));

    assert_eq!(m.start(), MonitorState::PollingActive);
    assert!(!gpio.is_watched(TOUCH));
    assert!(!gpio.is_watched(VIBRATION));

    // Touch still works, through the poller.
    gpio.set_level(TOUCH, false);
    assert_eq!(wait_for_event(&queue).unwrap().source, SensorSource::Touch);
    m.stop();
}

#[test]
fn stop_removes_edge_registrations() {
    let gpio = SimGpio::new();
    let queue = EventQueue::new(8);
    let mut m = monitor(&gpio, &queue);
    assert!(m.configure(channels(&gpio, Duration::ZERO)));
    m.start();
    assert!(gpio.is_watched(TOUCH));

    m.stop();
    assert!(!gpio.is_watched(TOUCH));
    gpio.pulse(TOUCH);
    assert!(queue.is_empty());
}
