//! servoarm - six-axis servo arm controller
//!
//! Drives a six-servo arm through a PCA9685 PWM expander on a Linux I2C
//! adapter. Brings the arm up, homes it, runs the pick-and-place
//! demonstration, homes it again and releases the bus.
//!
//! Usage: `servoarm [CONFIG.toml]`. Without an argument the arm.toml
//! compiled into the binary is used.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use log::{error, info};
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};

use servoarm_core::motion::DEMO_SEQUENCE;
use servoarm_hal_linux::Delay;

use crate::config::CtlConfig;
use crate::controller::Controller;

mod config;
mod controller;

fn main() -> ExitCode {
    let path = env::args_os().nth(1).map(PathBuf::from);

    let (config, source) = match config::load(path.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("servoarm: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config);
    info!("servoarm starting (config: {})", source);

    match run(&config) {
        Ok(()) => {
            info!("done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &CtlConfig) {
    // parse_config has already checked the level
    let level = config.level().unwrap_or(LevelFilter::Info);
    let log_config = ConfigBuilder::new()
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Debug)
        .build();

    if let Err(e) = TermLogger::init(level, log_config, TerminalMode::Mixed, ColorChoice::Auto) {
        eprintln!("servoarm: logger init failed: {}", e);
    }
}

fn run(config: &CtlConfig) -> Result<(), String> {
    let bus = servoarm_hal_linux::open(&config.bus.device).map_err(|e| e.to_string())?;

    let mut controller = Controller::bring_up(bus, &config.arm, Delay).map_err(|e| e.to_string())?;
    info!(
        "arm homed, {} servos ready",
        controller.registry().initialized_slots().count()
    );

    let demo = controller.run(DEMO_SEQUENCE).map_err(|e| e.to_string());

    // home and release the bus even if the demo failed
    let shutdown = controller.shutdown().map(drop).map_err(|e| e.to_string());
    demo.and(shutdown)
}
