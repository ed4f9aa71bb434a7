//! Configuration and CLI argument handling

use clap::Parser;

use crate::{alerts::OutputKind, state::Settings};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "multi-timer")]
#[command(about = "Multiple countdown timers with a metronome and completion alerts")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Where clicks and alerts are delivered
    #[arg(long, value_enum, default_value_t = OutputKind::Events)]
    pub alert_output: OutputKind,

    /// Timers to create at startup, in seconds (e.g. 300,600)
    #[arg(long, value_delimiter = ',')]
    pub preset: Vec<i64>,

    /// Start timers as soon as they are created
    #[arg(long)]
    pub auto_start: bool,

    /// Disable the completion sound
    #[arg(long)]
    pub no_audio: bool,

    /// Disable the completion flash
    #[arg(long)]
    pub no_flash: bool,

    /// Disable the metronome
    #[arg(long)]
    pub no_metronome: bool,

    /// Click every second regardless of timers
    #[arg(long)]
    pub audio_testing: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Initial settings derived from the feature flags
    pub fn settings(&self) -> Settings {
        Settings {
            audio_enabled: !self.no_audio,
            flash_enabled: !self.no_flash,
            metronome_enabled: !self.no_metronome,
            audio_testing_enabled: self.audio_testing,
            auto_start_new_timers: self.auto_start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["multi-timer"]).unwrap();
        assert_eq!(config.address(), "0.0.0.0:20554");
        assert_eq!(config.log_level(), "info");
        assert_eq!(config.alert_output, OutputKind::Events);
        assert!(config.preset.is_empty());
        assert_eq!(config.settings(), Settings::new());
    }

    #[test]
    fn flags_map_to_settings() {
        let config = Config::try_parse_from([
            "multi-timer",
            "--verbose",
            "--alert-output",
            "silent",
            "--preset",
            "300,600,90",
            "--auto-start",
            "--no-metronome",
            "--audio-testing",
        ])
        .unwrap();

        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.alert_output, OutputKind::Silent);
        assert_eq!(config.preset, vec![300, 600, 90]);

        let settings = config.settings();
        assert!(settings.audio_enabled);
        assert!(settings.flash_enabled);
        assert!(!settings.metronome_enabled);
        assert!(settings.audio_testing_enabled);
        assert!(settings.auto_start_new_timers);
    }
}
