//! PWM light daemon: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                   │
//! │                                                          │
//! │  SysfsAttributes   ReactorDelay   LogEventSink           │
//! │  MemoryAttributes  (StepDelay)    (EventSink)            │
//! │  (PwmAttributes)                                         │
//! │                                                          │
//! │  ─────────────── Port Trait Boundary ──────────────      │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │   BrightnessController (pure logic) · Fade         │  │
//! │  └────────────────────────────────────────────────────┘  │
//! │                                                          │
//! │  LightAccessory · bridge io_task (one LocalExecutor)     │
//! └──────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use pwmlight::adapters::log_sink::LogEventSink;
use pwmlight::adapters::memory::MemoryAttributes;
use pwmlight::adapters::sysfs::SysfsAttributes;
use pwmlight::adapters::timer::ReactorDelay;
use pwmlight::app::controller::BrightnessController;
use pwmlight::app::ports::PwmAttributes;
use pwmlight::bridge::accessory::LightAccessory;
use pwmlight::bridge::{Executor, io_task};
use pwmlight::config::SystemConfig;
use pwmlight::drivers::pwm::PwmChannel;

#[derive(Debug, Parser)]
#[command(name = "pwmlightd", version, about = "Sysfs PWM light with smooth fades")]
struct Cli {
    /// TOML configuration file
    #[arg(long, short, env = "PWMLIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// Bridge listen address, overrides `accessory.bind`
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Drive an in-memory PWM channel instead of sysfs
    #[arg(long)]
    simulate: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    check_config: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = SystemConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(bind) = cli.bind {
        config.accessory.bind = bind;
    }

    if cli.check_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    info!("╔══════════════════════════════════════╗");
    info!("║  pwmlightd v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    if cli.simulate {
        warn!("Simulation mode: no hardware is touched");
        run(MemoryAttributes::new(), &config)
    } else {
        info!(
            "PWM chip {} channel {}",
            config.channel.chip.display(),
            config.channel.index
        );
        run(SysfsAttributes::from_config(&config.channel), &config)
    }
}

fn run<A: PwmAttributes + 'static>(attrs: A, config: &SystemConfig) -> Result<()> {
    let channel = PwmChannel::new(attrs, config.channel.period)
        .with_export_value(config.channel.export_value.clone())
        .with_startup_brightness(config.fade.startup_brightness);

    let controller = BrightnessController::new(
        channel,
        ReactorDelay::new(),
        LogEventSink::new(),
        config.fade_config(),
    );
    controller.start().context("enabling the PWM channel")?;

    let accessory = Rc::new(LightAccessory::new(controller, config.accessory.clone()));
    accessory.publish();

    let listener = TcpListener::bind(config.accessory.bind)
        .with_context(|| format!("binding bridge to {}", config.accessory.bind))?;

    info!("System ready. Entering event loop.");
    let executor = Executor::new();
    futures_lite::future::block_on(executor.run(io_task::serve(listener, accessory, &executor)))
        .context("bridge listener failed")
}
