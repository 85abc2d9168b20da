use crate::core::device::LimiterDevice;
use crate::domain::model::{Baffle, Tap};
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "limiter-rms")]
#[command(about = "Safe RMS limiter thresholds for speaker/amplifier pairings")]
pub struct CliConfig {
    /// TOML file with calculation settings and the equipment catalog
    #[arg(short, long, default_value = "limiter.toml")]
    pub config: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    /// Emit log lines as JSON
    #[arg(long)]
    pub log_json: bool,

    /// Override the 0 dBu reference voltage
    #[arg(long)]
    pub sensitivity: Option<f64>,

    /// Override smart-limiter derating (true/false)
    #[arg(long)]
    pub smart: Option<bool>,

    /// Override the limiter scale: dbu, tracks-ds24, dcx2496-sub, dcx2496-top
    #[arg(long)]
    pub device: Option<LimiterDevice>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Threshold for a catalog speaker on a catalog amplifier
    Compute {
        #[arg(short, long)]
        speaker: String,
        #[arg(short, long)]
        amplifier: String,
        /// 8, 4, 2, "8 (bridge)", "4 (bridge)"
        #[arg(short, long)]
        tap: Tap,
    },
    /// Threshold from hand-entered values, no compatibility checks
    Custom {
        #[arg(long)]
        impedance: f64,
        #[arg(long, default_value = "CLOSED")]
        baffle: Baffle,
        /// Speaker AES power at `impedance`, watts
        #[arg(long)]
        speaker_power: f64,
        /// Amplifier gain, dB
        #[arg(long)]
        gain: f64,
        /// Amplifier RMS power at `impedance`, watts
        #[arg(long)]
        ampli_power: f64,
    },
    /// Amplifier gain from measured input and output voltages
    Gain {
        #[arg(long)]
        voltage_in: f64,
        #[arg(long)]
        voltage_out: f64,
    },
    /// Show the catalog
    List,
    /// Threshold table for every catalog combination, as CSV
    Matrix {
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<String>,
    },
}
