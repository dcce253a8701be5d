use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use fbd_config::{AppConfig, ConfigError};
use fbd_core::convert::convert;
use fbd_io::{DxfFacade, FbdEmitter, IoError, RecordLoader};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

mod cli;
mod errors;

use cli::{Cli, normalize_directive};
use errors::AppError;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let (config, config_error) = load_configuration(cli.config.clone());
    init_logging(&cli, &config);
    if let Some(err) = config_error {
        match &err {
            ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                warn!(path = %path.display(), error = %err, "加载配置失败，使用内建默认值");
            }
            ConfigError::Context { .. } => {
                warn!(error = %err, "加载配置失败，使用内建默认值");
            }
        }
    }

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: &Cli, config: &AppConfig) -> Result<(), AppError> {
    let mut options = config.conversion.convert_options();
    if let Some(tolerance) = cli.tolerance {
        options.tolerance = tolerance;
    }
    if let Some(layer) = &cli.layer {
        options.layer = layer.clone();
    }
    let scale = cli.scale.unwrap_or(config.conversion.scale);
    debug!(?options, scale, "转换参数");

    let records = DxfFacade::new()
        .load(&cli.infile)
        .map_err(|err| match err {
            IoError::ReadError { .. } => AppError::Open {
                path: cli.infile.clone(),
                source: err,
            },
            other => AppError::Document(other),
        })?;
    let conversion = convert(&records, &options)?;
    if conversion.model.is_empty() {
        return Err(AppError::NoPoints);
    }

    let emitter = FbdEmitter::new(scale).with_source(cli.infile.display().to_string());
    match &cli.outfile {
        Some(path) => {
            emitter.save(path, &conversion).map_err(AppError::Write)?;
            info!(path = %path.display(), "FBD 文件已生成");
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            emitter
                .write_to(&mut handle, &conversion)
                .and_then(|()| handle.flush())
                .map_err(AppError::Stdout)?;
        }
    }
    Ok(())
}

fn load_configuration(override_path: Option<PathBuf>) -> (AppConfig, Option<ConfigError>) {
    let loaded = match override_path {
        Some(path) => AppConfig::from_file(&path),
        None => AppConfig::discover(),
    };
    match loaded {
        Ok(cfg) => (cfg, None),
        Err(err) => (AppConfig::default(), Some(err)),
    }
}

/// 日志写到标准错误，避免与标准输出上的 FBD 内容混在一起。
fn init_logging(cli: &Cli, config: &AppConfig) {
    let directive = match cli.log {
        Some(level) => level.directive().to_string(),
        None => normalize_directive(&config.logging.level),
    };
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time();
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
