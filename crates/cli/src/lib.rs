pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use quotecraft_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "quotecraft",
    about = "Quotecraft pricing engine CLI",
    long_about = "Price furniture components, replay cabinet partition plans, and price onsite work against rate catalog snapshots.",
    after_help = "Examples:\n  quotecraft price --request unit.json\n  quotecraft allocate --plan base-run.json --catalog rates.json\n  quotecraft doctor"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Config file to load instead of quotecraft.toml")]
    config: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        value_parser = ["compact", "pretty", "json"],
        help = "Override logging.format"
    )]
    log_format: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Price one component configuration and its accessories")]
    Price {
        #[arg(long, help = "JSON file with configuration, measurement and accessories")]
        request: PathBuf,
        #[arg(long, help = "Rate catalog JSON overriding catalog.path")]
        catalog: Option<PathBuf>,
    },
    #[command(about = "Build a cabinet section and replay partition add/update/remove operations")]
    Allocate {
        #[arg(long, help = "JSON file with the section and its operations")]
        plan: PathBuf,
        #[arg(long, help = "Rate catalog JSON overriding catalog.path")]
        catalog: Option<PathBuf>,
    },
    #[command(about = "Price onsite work items and their total")]
    Onsite {
        #[arg(long, help = "JSON file with the onsite work items")]
        request: PathBuf,
        #[arg(long, help = "Onsite service table JSON overriding catalog.onsite_path")]
        services: Option<PathBuf>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config and check that the rate catalog and onsite table load")]
    Doctor,
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        let mut overrides = ConfigOverrides {
            log_format: self.log_format.as_deref().and_then(|value| value.parse::<LogFormat>().ok()),
            ..ConfigOverrides::default()
        };
        match &self.command {
            Command::Price { catalog, .. } | Command::Allocate { catalog, .. } => {
                overrides.catalog_path = catalog.clone();
            }
            Command::Onsite { services, .. } => {
                overrides.onsite_path = services.clone();
            }
            Command::Config | Command::Doctor => {}
        }

        LoadOptions {
            require_file: self.config.is_some(),
            config_path: self.config.clone(),
            overrides,
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    // commands report config failures themselves; logging falls back to defaults
    let logging = AppConfig::load(options.clone()).map(|config| config.logging).ok();
    logging::init(logging.as_ref());

    let result = match cli.command {
        Command::Price { request, .. } => commands::price::run(options, &request),
        Command::Allocate { plan, .. } => commands::allocate::run(options, &plan),
        Command::Onsite { request, .. } => commands::onsite::run(options, &request),
        Command::Config => commands::config::run(options),
        Command::Doctor => commands::doctor::run(options),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
