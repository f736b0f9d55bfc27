//! Beemo composition root.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  SimGpio / SimPwmChannel   SimDisplay / Ssd1309Framebuffer   │
//! │  (EdgeDetector, InputPin,  (DisplayPort)                     │
//! │   SetDutyCycle)            LogJournal / JsonLinesJournal     │
//! │  MonotonicClock (Clock)    (PersistencePort)                 │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  SensorMonitor ─▶ EventQueue ─▶ consumer ─▶ EmotionEngine    │
//! │                                   trigger ─┘   │   │         │
//! │                         FramePipeline ◀────────┘   └─▶ ActuatorCoordinator │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Runs the core on simulation adapters.  Stdin drives it: `touch`,
//! `vibration`, `status`, or `<trigger> [context]`; EOF shuts down.

use std::fs::File;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use beemo::adapters::journal::{BackgroundJournal, JsonLinesJournal};
use beemo::adapters::log_sink::LogJournal;
use beemo::adapters::sim::{SimDisplay, SimGpio, SimPwmChannel};
use beemo::adapters::time::MonotonicClock;
use beemo::app::consumer;
use beemo::app::ports::{Clock, DisplayPort, PersistencePort};
use beemo::config::EngineConfig;
use beemo::drivers::display::Ssd1309Framebuffer;
use beemo::drivers::servo::PwmServoBus;
use beemo::emotion::IDLE_EMOTION;
use beemo::events::EventQueue;
use beemo::frames::FramePipeline;
use beemo::pins;
use beemo::sensors::{InputChannel, SensorMonitor};
use beemo::{EmotionEngine, TriggerKind};

/// Journal channel depth.
const JOURNAL_QUEUE_DEPTH: usize = 64;

#[derive(Parser, Debug)]
#[command(name = "beemo", version, about = "Beemo emotion and servo coordinator")]
struct Cli {
    /// JSON config file (missing fields take defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the animation asset root
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Refuse edge interrupts so the sensor monitor polls
    #[arg(long)]
    polling: bool,

    /// Run without a display
    #[arg(long)]
    no_display: bool,

    /// Run without servos
    #[arg(long)]
    no_servos: bool,

    /// Write SSD1309 page buffers to this file instead of the sim panel
    #[arg(long)]
    framebuffer: Option<PathBuf>,

    /// Append emotion history as JSON lines to this file
    #[arg(long)]
    journal: Option<PathBuf>,

    /// Skip the boot banner and animation
    #[arg(long)]
    skip_startup: bool,

    /// Fire one trigger after startup
    #[arg(long)]
    trigger: Option<TriggerKind>,

    /// Free text for a `command` trigger
    #[arg(long, requires = "trigger")]
    context: Option<String>,

    /// Follow the transition graph this many steps after the trigger
    #[arg(long, default_value_t = 0)]
    chain: usize,
}

fn open_display(cli: &Cli, config: &EngineConfig) -> Option<Box<dyn DisplayPort + Send>> {
    if cli.no_display {
        return None;
    }
    let (w, h) = (config.display_width, config.display_height);
    match &cli.framebuffer {
        Some(path) => match File::create(path) {
            Ok(file) => Some(Box::new(Ssd1309Framebuffer::new(file, w, h))),
            Err(e) => {
                warn!("display {} failed to open: {}", path.display(), e);
                None
            }
        },
        None => Some(Box::new(SimDisplay::new(w, h))),
    }
}

fn open_journal(cli: &Cli) -> Result<Box<dyn PersistencePort + Send>> {
    Ok(match &cli.journal {
        Some(path) => Box::new(BackgroundJournal::spawn(
            JsonLinesJournal::open(path)?,
            JOURNAL_QUEUE_DEPTH,
        )?),
        None => Box::new(LogJournal::new()),
    })
}

/// Settings and the idle animation must be usable before anything runs.
fn preflight(config: &EngineConfig) -> beemo::Result<usize> {
    config.validate()?;
    let frames = FramePipeline::from_config(config).try_load(IDLE_EMOTION)?;
    Ok(frames.len())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    info!("╔══════════════════════════════════════╗");
    info!("║  Beemo v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── Configuration ─────────────────────────────────────────
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(assets) = &cli.assets {
        config.asset_root = assets.clone();
    }
    match preflight(&config) {
        Ok(frames) => info!(
            "assets: {} idle frames in {}",
            frames,
            config.asset_root.display()
        ),
        Err(beemo::Error::Asset(e)) => warn!(
            "assets: {} in {}, idle animation disabled",
            e,
            config.asset_root.display()
        ),
        Err(e) => return Err(e).context("invalid configuration"),
    }

    // ── Adapters ──────────────────────────────────────────────
    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock);
    let display = open_display(&cli, &config);
    let servos = (!cli.no_servos).then(|| {
        PwmServoBus::new(
            SimPwmChannel::new(),
            SimPwmChannel::new(),
            SimPwmChannel::new(),
            config.servo_pwm_freq_hz,
        )
    });
    if servos.is_some() {
        info!(
            "servos: continuous=ch{} left=ch{} right=ch{} at {} Hz",
            pins::SERVO_CONTINUOUS_CHANNEL,
            pins::SERVO_LEFT_CHANNEL,
            pins::SERVO_RIGHT_CHANNEL,
            config.servo_pwm_freq_hz
        );
    }
    let journal = open_journal(&cli)?;

    let engine = Arc::new(EmotionEngine::new(
        config.clone(),
        display,
        servos,
        journal,
        Arc::clone(&clock),
    ));
    info!("status: {:?}", engine.status());

    if !cli.skip_startup {
        engine.startup_sequence();
    }

    // ── Sensors + consumer ────────────────────────────────────
    let queue = EventQueue::new(config.queue_capacity);
    let gpio = if cli.polling {
        SimGpio::without_interrupts()
    } else {
        SimGpio::new()
    };
    let mut monitor = SensorMonitor::new(
        queue.clone(),
        Some(gpio.clone()),
        Arc::clone(&clock),
        Duration::from_millis(config.poll_interval_ms),
    );
    let channels = vec![
        InputChannel::touch(
            config.touch_gpio,
            gpio.input(config.touch_gpio),
            Duration::from_millis(config.touch_debounce_ms),
        ),
        InputChannel::vibration(
            config.vibration_gpio,
            gpio.input(config.vibration_gpio),
            Duration::from_millis(config.vibration_debounce_ms),
        ),
    ];
    if monitor.configure(channels) {
        info!("sensors: {:?}", monitor.start());
    } else {
        warn!("sensors disabled");
    }
    let consumer = consumer::spawn(Arc::clone(&engine), queue).context("spawning consumer")?;

    if let Some(kind) = cli.trigger {
        let context = cli.context.as_deref();
        let played = if cli.chain > 0 {
            engine.trigger_chained(kind, context, cli.chain)
        } else {
            engine.trigger(kind, context)
        };
        info!("trigger {} -> played={}", kind, played);
    }

    // ── Stdin loop ────────────────────────────────────────────
    for line in std::io::stdin().lock().lines() {
        let line = line.context("reading stdin")?;
        let line = line.trim();
        match line {
            "" => {}
            "touch" => gpio.pulse(config.touch_gpio),
            "vibration" => gpio.pulse(config.vibration_gpio),
            "status" => info!("status: {:?}", engine.status()),
            _ => {
                let (name, context) = match line.split_once(' ') {
                    Some((name, rest)) => (name, Some(rest)),
                    None => (line, None),
                };
                match name.parse::<TriggerKind>() {
                    Ok(kind) => {
                        let outcome = engine.trigger_outcome(kind, context);
                        info!("trigger {} -> {:?}", kind, outcome);
                    }
                    Err(e) => warn!("{}: {:?}", e, name),
                }
            }
        }
    }

    // ── Shutdown ──────────────────────────────────────────────
    monitor.stop();
    engine.stop();
    if consumer.join().is_err() {
        warn!("consumer thread panicked");
    }
    engine.shutdown();
    Ok(())
}
