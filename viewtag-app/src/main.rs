use std::path::PathBuf;

use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use viewtag_config::{AppConfig, ConfigError};

mod cli;
mod errors;
mod loader;

fn main() {
    let mut args = std::env::args().skip(1);
    let mut config_override: Option<PathBuf> = None;
    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut view: Option<String> = None;
    let mut mode = cli::RunMode::Tag;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                config_override = Some(PathBuf::from(require_value(&mut args, "--config")))
            }
            "--input" => input = Some(PathBuf::from(require_value(&mut args, "--input"))),
            "--output" => output = Some(PathBuf::from(require_value(&mut args, "--output"))),
            "--view" => view = Some(require_value(&mut args, "--view")),
            "--status" => mode = cli::RunMode::StatusOnly,
            other => {
                eprintln!("未知参数：{other}");
                std::process::exit(1);
            }
        }
    }

    let mut config = load_configuration(config_override);
    init_logging(&config);
    info!("启动 viewtag");

    if input.is_some() {
        config.project.input = input;
    }
    if output.is_some() {
        config.project.output = output;
    }
    if view.is_some() {
        config.project.view = view;
    }

    if let Err(err) = cli::run(&config, mode) {
        error!(error = %err, "自动标记失败");
        std::process::exit(1);
    }
}

fn require_value(args: &mut impl Iterator<Item = String>, flag: &str) -> String {
    let Some(value) = args.next() else {
        eprintln!("`{flag}` 需要提供参数值");
        std::process::exit(1);
    };
    value
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(
                path = %path.display(),
                error = %err,
                "加载指定配置失败，使用默认配置"
            );
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(
                            path = %path.display(),
                            error = %err,
                            "加载默认配置失败，使用内建默认值"
                        );
                    }
                    ConfigError::Context { .. } | ConfigError::UnknownCategory(_) => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
