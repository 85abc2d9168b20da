use clap::Parser;
use limiter_rms::app::{write_csv, LimiterSession};
use limiter_rms::config::{CliConfig, Command, Settings, TomlConfig};
use limiter_rms::core::gain::measure_gain;
use limiter_rms::core::EquipmentRepository;
use limiter_rms::utils::error::{ErrorSeverity, LimiterError};
use limiter_rms::utils::logger;
use limiter_rms::utils::validation::{validate_path, Validate};
use limiter_rms::EquipmentCatalog;
use serde_json::json;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    let verbose = cli.verbose || matches!(config.log_level(), Some("debug" | "trace"));
    if cli.log_json || config.json_logs() {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    if let Err(e) = run(&cli, &config) {
        tracing::error!(
            "{} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

/// A missing default file is fine (empty catalog); anything explicit must load.
fn load_config(path: &str) -> Result<TomlConfig, LimiterError> {
    if path == "limiter.toml" && !Path::new(path).exists() {
        return Ok(TomlConfig::default());
    }
    TomlConfig::from_file(path)
}

fn run(cli: &CliConfig, config: &TomlConfig) -> Result<(), LimiterError> {
    let settings =
        Settings::from_toml(config).with_overrides(cli.sensitivity, cli.smart, cli.device);
    settings.validate()?;

    let catalog = config.catalog()?;
    tracing::info!(
        "Loaded {} amplifiers and {} speakers from {}",
        catalog.amplifier_count(),
        catalog.speaker_count(),
        cli.config
    );

    let session = LimiterSession::new(catalog, settings);

    match &cli.command {
        Command::Compute {
            speaker,
            amplifier,
            tap,
        } => {
            let outcome = session.compute(speaker, amplifier, *tap)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("{}", outcome);
            }
        }
        Command::Custom {
            impedance,
            baffle,
            speaker_power,
            gain,
            ampli_power,
        } => {
            let input =
                session.custom_input(*impedance, *baffle, *speaker_power, *gain, *ampli_power);
            let outcome = session.custom(input)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("{}", outcome);
            }
        }
        Command::Gain {
            voltage_in,
            voltage_out,
        } => {
            let gain = measure_gain(*voltage_in, *voltage_out)?;
            if cli.json {
                println!("{}", json!({ "gain_db": gain }));
            } else {
                println!("Amplifier gain: {} dB", gain);
            }
        }
        Command::List => print_catalog(session.repository(), cli.json)?,
        Command::Matrix { output } => {
            let rows = session.matrix()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if let Some(path) = output {
                validate_path("output", path)?;
                write_csv(&rows, std::fs::File::create(path)?)?;
                tracing::info!("📁 Threshold table saved to: {}", path);
            } else {
                write_csv(&rows, std::io::stdout().lock())?;
            }
        }
    }

    Ok(())
}

fn print_catalog(catalog: &EquipmentCatalog, as_json: bool) -> Result<(), LimiterError> {
    if as_json {
        let amplifiers: Vec<_> = catalog.amplifiers().collect();
        let speakers: Vec<_> = catalog.speakers().collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "amplifiers": amplifiers,
                "speakers": speakers,
            }))?
        );
        return Ok(());
    }

    println!("Amplifiers");
    for ampli in catalog.amplifiers() {
        println!("{}\n", ampli);
    }
    println!("Speakers");
    for speaker in catalog.speakers() {
        println!("{}\n", speaker);
    }
    Ok(())
}
