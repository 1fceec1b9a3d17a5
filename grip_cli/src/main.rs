mod cli;
mod error_fmt;
mod rig;
mod run;

use std::path::Path;

use clap::Parser;
use eyre::WrapErr;
use grip_core::GripError;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = real_main(cli) {
        let json = JSON_MODE.get().copied().unwrap_or(false);
        if json {
            eprintln!("{}", error_fmt::format_error_json(&e));
        } else {
            eprintln!("{}", error_fmt::humanize(&e));
        }
        std::process::exit(error_fmt::exit_code_for_error(&e));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(&cli.config)?;
    init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging);
    tracing::debug!(config = %cli.config.display(), "config loaded");

    let fit = match cli.calibration.as_deref() {
        Some(path) => {
            let fit = grip_config::load_calibration_csv(path)
                .map_err(|e| GripError::Config(e.to_string()))?;
            tracing::info!(a = fit.a, b = fit.b, "calibration fitted");
            Some(fit)
        }
        None => None,
    };

    match cli.cmd {
        Commands::Run {
            start_off,
            ticks,
            period_ms,
            sampled,
        } => run::run(
            cfg,
            fit,
            run::RunOpts {
                start_off,
                ticks,
                period_ms,
                sampled,
            },
            cli.json,
        ),
        Commands::Probe { samples } => run::probe(&cfg, fit, samples, cli.json),
        Commands::SelfCheck => run::self_check(&cfg, fit, cli.json),
    }
}

fn load_config(path: &Path) -> eyre::Result<grip_config::Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| GripError::Config(format!("read {}: {e}", path.display())))
        .wrap_err("load config")?;
    let cfg: grip_config::Config = toml::from_str(&text)
        .map_err(|e| GripError::Config(format!("parse {}: {e}", path.display())))?;
    cfg.validate()
        .map_err(|e| GripError::Config(e.to_string()))?;
    Ok(cfg)
}

/// Console logs go to stderr so stdout carries only command output.
/// `RUST_LOG` wins over `--log-level`, which wins over `[logging] level`.
fn init_tracing(json: bool, cli_level: Option<&str>, logging: &grip_config::Logging) {
    let level = cli_level
        .or(logging.level.as_deref())
        .unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if json {
        layers.push(fmt::layer().json().with_writer(std::io::stderr).boxed());
    } else {
        layers.push(fmt::layer().with_target(false).with_writer(std::io::stderr).boxed());
    }

    if let Some(file) = logging.file.as_deref() {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let name = path
            .file_name()
            .map_or_else(|| "grip.log".into(), |n| n.to_string_lossy().into_owned());
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .boxed(),
        );
    }

    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init();
}
