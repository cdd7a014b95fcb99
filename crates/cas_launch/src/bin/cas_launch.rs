//! CAS Launch CLI
//!
//! Usage:
//!   cas_launch -e staging
//!   cas_launch -e all -s build.mjs
//!   cas_launch -e prod -p web --dry-run

use cas_launch::cli::{parse_env_arguments, LaunchArgs, ParseOutcome, ParsedArguments};
use cas_launch::runtime::setup_shutdown;
use cas_launch::{logging, Launcher, LoadedConfig, ResolvedOptions};

#[tokio::main]
async fn main() {
    logging::init();

    let parsed: ParsedArguments = match parse_env_arguments::<LaunchArgs>() {
        Ok(ParseOutcome::Parsed(args)) => args.into(),
        Ok(ParseOutcome::Help(usage)) => {
            println!("{}", usage);
            return;
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    // Load config file
    let root = parsed.project_root();
    let config_path = parsed.config_path(&root);
    let config = match LoadedConfig::from_file(&config_path) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };
    log::info!("Configuration loaded from {}", config.path().display());
    if config.is_empty() {
        log::warn!("Config file defines no keys, using defaults");
    }
    if let Some(name) = config.app_name() {
        log::info!("App name: {}", name);
    }
    if let Some(version) = config.app_version() {
        log::info!("Version: {}", version);
    }

    let options = ResolvedOptions::resolve(&parsed, &config);
    logging::set_verbose(options.verbose());
    match serde_json::to_string_pretty(&parsed) {
        Ok(json) => log::debug!("Full parsed arguments:\n{}", json),
        Err(e) => log::debug!("Cannot serialize parsed arguments: {}", e),
    }

    log::info!("Dir: {}", root.display());
    log::info!("Platform: {}", std::env::consts::OS);
    for line in options.to_string().lines() {
        log::info!("{}", line);
    }

    let launcher = match Launcher::for_project(&root, &config, &options) {
        Ok(launcher) => launcher,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    // Dry run mode
    if parsed.dry_run {
        match launcher.plan(&options).await {
            Ok(plan) => println!("{}", plan),
            Err(e) => {
                log::error!("Failed to generate launch plan: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let (_shutdown_tx, shutdown_rx) = match setup_shutdown() {
        Ok(channel) => channel,
        Err(e) => {
            log::error!("Error setting Ctrl+C handler: {}", e);
            std::process::exit(1);
        }
    };

    match launcher.run(&options, shutdown_rx).await {
        Ok(report) if report.is_clean() => log::info!("{}", report),
        Ok(report) => log::warn!("{}", report),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}
