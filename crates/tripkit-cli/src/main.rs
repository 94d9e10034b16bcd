// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tripkit_core::present::render_cards;
use tripkit_core::settings::API_KEY_ENV;
use tripkit_core::{
    ApiKey, GeocodeResult, Geocoder, NominatimGeocoder, OpenAiClient, Settings, SettingsError,
    TripPlanner,
};
use tripkit_extract::{
    build_prompt, parse_response, DestinationRequest, TimeBudget, AGE_RANGE, TIME_PRESETS,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true, env = "TRIPKIT_CONFIG")]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TripArgs {
    /// Starting city or town
    origin: String,

    #[arg(short, long, default_value = "1h", help = time_help())]
    time: TimeBudget,

    #[arg(short, long, help = age_help())]
    age: Option<u32>,
}

impl TripArgs {
    fn request(&self) -> Result<DestinationRequest> {
        Ok(DestinationRequest::new(&self.origin, self.time, self.age)?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the language model for destinations and show them
    Plan {
        #[command(flatten)]
        trip: TripArgs,

        #[arg(long, help = api_key_help())]
        api_key: Option<String>,

        /// Override the configured model
        #[arg(long)]
        model: Option<String>,

        /// Override the completion API base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Override the completion request timeout
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        timeout_secs: Option<u64>,

        /// Write the map layers as GeoJSON
        #[arg(long)]
        geojson: Option<PathBuf>,

        /// Print the whole plan as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the prompt that would be sent, without calling any service
    Prompt {
        #[command(flatten)]
        trip: TripArgs,
    },
    /// Extract destinations from a saved model reply (stdin when no file is given)
    Parse { file: Option<PathBuf> },
    /// Look up a place with the geocoder
    Geocode { place: String },
    /// Show the effective settings
    Config {
        /// Write the effective settings to the settings file
        #[arg(long)]
        write: bool,
    },
}

fn main() -> Result<()> {
    // Before parsing, so TRIPKIT_CONFIG can come from the file too.
    let env_file = load_env_file(None);
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    if let Some(path) = env_file? {
        log::debug!("Loaded environment file — path={}", path.display());
    }

    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Plan {
            trip,
            api_key,
            model,
            base_url,
            timeout_secs,
            geojson,
            json,
        } => {
            let request = trip.request()?;
            let api_key = resolve_api_key(api_key)?;

            let mut settings = settings;
            if let Some(model) = model {
                settings.completion.model = model;
            }
            if let Some(base_url) = base_url {
                settings.completion.base_url = base_url;
            }
            if let Some(secs) = timeout_secs {
                settings.completion.timeout_secs = secs;
            }
            settings.validate()?;

            let completion = OpenAiClient::new(settings.completion.clone(), api_key)?;
            let geocoder = NominatimGeocoder::new(&settings.geocoding)?;
            let planner = TripPlanner::new(completion, geocoder, settings.map.clone());

            let plan = planner.plan(&request);

            if let Some(path) = &geojson {
                write_json(path, &plan.layers.to_geojson())?;
                log::info!("Wrote map layers — path={}", path.display());
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
                return Ok(());
            }

            println!("{}\n", plan.title);
            print!("{}", render_cards(&plan.cards));
            if let Some(failure) = &plan.failure {
                eprintln!("\nNo results: {}", failure);
            }
            for skipped in &plan.skipped {
                eprintln!(
                    "Skipped destination #{} ({}): {}",
                    skipped.index,
                    skipped.name.as_deref().unwrap_or("unnamed"),
                    skipped.reason
                );
            }
            if !plan.origin.is_resolved() && !plan.is_empty() {
                eprintln!("Could not place {} on the map; route lines omitted.", request.origin);
            }
        }
        Commands::Prompt { trip } => {
            println!("{}", build_prompt(&trip.request()?));
        }
        Commands::Parse { file } => {
            let raw = read_input(file.as_deref())?;
            let extraction = parse_response(&raw)?;
            println!("{}", serde_json::to_string_pretty(&extraction)?);
        }
        Commands::Geocode { place } => {
            let geocoder = NominatimGeocoder::new(&settings.geocoding)?;
            match geocoder.resolve(&place) {
                GeocodeResult::Resolved(c) => println!("{} {}", c.longitude, c.latitude),
                GeocodeResult::Unresolved => println!("unresolved"),
            }
        }
        Commands::Config { write } => {
            let path = cli.config.clone().unwrap_or_else(Settings::default_path);
            if write {
                settings.save(Some(&path))?;
                println!("Wrote {}", path.display());
            } else {
                println!("# {}", path.display());
                println!("{}", serde_json::to_string_pretty(&settings)?);
            }
        }
    }

    Ok(())
}

fn time_help() -> String {
    format!(
        "Travel-time budget, e.g. {} or 45m",
        TIME_PRESETS.join(", ")
    )
}

fn age_help() -> String {
    format!(
        "Child's age in years (usually {}-{})",
        AGE_RANGE.start(),
        AGE_RANGE.end()
    )
}

fn api_key_help() -> String {
    format!("Completion service API key [default: ${}]", API_KEY_ENV)
}

/// The flag wins over the environment.
fn resolve_api_key(flag: Option<String>) -> Result<ApiKey, SettingsError> {
    match flag {
        Some(key) => ApiKey::new(key),
        None => ApiKey::from_env(),
    }
}

/// Loads `KEY=value` lines from `path`, or from the first `.env` found walking up
/// from the working directory. Variables already set in the process are kept.
fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path).map(|()| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };
    match loaded {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e).context("Failed to read .env file"),
    }
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let config = ConfigBuilder::new()
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Error)
        .set_location_level(LevelFilter::Debug)
        .set_time_level(LevelFilter::Off)
        .build();
    TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto)
        .context("failed to initialise logging")
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read stdin")?;
            Ok(raw)
        }
    }
}

fn write_json(path: &Path, value: &serde_json::Value) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_trip_args() {
        let cli = Cli::try_parse_from(["tripkit", "prompt", "Amsterdam", "--time", "1.5h", "--age", "8"])
            .unwrap();
        match cli.command {
            Commands::Prompt { trip } => {
                assert_eq!(trip.time.as_minutes(), 90.0);
                assert_eq!(trip.age, Some(8));
                assert_eq!(trip.request().unwrap().origin, "Amsterdam");
            }
            _ => panic!("expected prompt command"),
        }
    }

    #[test]
    fn test_bad_budget_is_rejected() {
        assert!(Cli::try_parse_from(["tripkit", "prompt", "Amsterdam", "--time", "soon"]).is_err());
    }

    #[test]
    fn test_zero_timeout_flag_is_rejected() {
        assert!(Cli::try_parse_from(["tripkit", "plan", "Amsterdam", "--timeout-secs", "0"]).is_err());
        assert!(Cli::try_parse_from(["tripkit", "plan", "Amsterdam", "--timeout-secs", "5"]).is_ok());
    }

    #[test]
    fn test_help_lists_presets() {
        let help = time_help();
        for preset in TIME_PRESETS {
            assert!(help.contains(preset), "{} missing from {:?}", preset, help);
        }
        assert_eq!(age_help(), "Child's age in years (usually 0-18)");
        assert!(api_key_help().contains("$OPENAI_API_KEY"));
    }

    #[test]
    fn test_api_key_flag() {
        assert_eq!(resolve_api_key(Some(" sk-test ".to_string())).unwrap().expose(), "sk-test");
        assert_eq!(
            resolve_api_key(Some("  ".to_string())).unwrap_err(),
            SettingsError::MissingApiKey
        );
    }

    #[test]
    fn test_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "TRIPKIT_TEST_ENV_FILE_KEY=from-file\n").unwrap();

        assert_eq!(load_env_file(Some(&path)).unwrap(), Some(path.clone()));
        assert_eq!(
            std::env::var("TRIPKIT_TEST_ENV_FILE_KEY").as_deref(),
            Ok("from-file")
        );
        assert_eq!(load_env_file(Some(&dir.path().join("missing.env"))).unwrap(), None);
    }
}
