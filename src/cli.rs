use crate::config::{CliOverrides, Config};
use crate::error::Result;
use crate::extractor::RaggedRowPolicy;
use crate::ui::OutputMode;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "witsml2csv.toml";

#[derive(Parser, Debug)]
#[command(name = "witsml2csv")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Convert WITSML log documents into CSV tables and JSON unit headers")]
#[command(
    long_about = "witsml2csv reads WITSML well-log XML documents and writes, for every log, \
                  a JSON header mapping each mnemonic to its unit and a gzip-compressed CSV \
                  table of the log data."
)]
#[command(after_help = "EXAMPLES:\n  \
    witsml2csv well.xml\n  \
    witsml2csv exports/ --output converted --verbose\n  \
    witsml2csv exports/ --extensions xml,witsml --exclude archive\n  \
    witsml2csv well.xml --ragged-rows pad --report report.json")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// WITSML files or directories to convert
    #[arg(required_unless_present = "generate_config")]
    pub inputs: Vec<PathBuf>,

    /// Destination directory for the JSON and CSV outputs
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// File extensions to pick up when walking directories (comma-separated)
    #[arg(short, long, help = "File extensions to convert (e.g., xml,witsml)")]
    pub extensions: Option<String>,

    /// Directories to skip when walking
    #[arg(long, value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,

    /// Maximum file size in MB
    #[arg(long, help = "Maximum input file size to process (in MB)")]
    pub max_size: Option<u64>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// How to treat data rows whose field count differs from the mnemonic count
    #[arg(long, value_enum)]
    pub ragged_rows: Option<RaggedRowPolicy>,

    /// Write a JSON conversion report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Dry run (show what would be converted without writing anything)
    #[arg(long, help = "List the documents that would be converted")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl From<OutputFormat> for OutputMode {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        }
    }
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        let max_file_size = self.max_size.map(|size| size * 1024 * 1024); // Convert MB to bytes

        CliOverrides::new()
            .with_extensions(self.extensions.clone())
            .with_exclude(self.exclude.clone())
            .with_max_file_size(max_file_size)
            .with_destination(self.output.clone())
            .with_ragged_rows(self.ragged_rows)
    }

    pub fn config_output_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Directive for `tracing_subscriber::EnvFilter` when `RUST_LOG` is unset.
    pub fn log_directive(&self) -> &'static str {
        match self.verbosity_level() {
            0 => "witsml2csv=warn",
            1 => "witsml2csv=info",
            2 => "witsml2csv=debug",
            _ => "witsml2csv=trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inputs_and_flags() {
        let cli = Cli::try_parse_from([
            "witsml2csv",
            "a.xml",
            "logs",
            "-o",
            "out",
            "--exclude",
            "archive,old",
            "--ragged-rows",
            "pad",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.inputs, vec![PathBuf::from("a.xml"), PathBuf::from("logs")]);
        assert_eq!(cli.output, Some(PathBuf::from("out")));
        assert_eq!(
            cli.exclude,
            Some(vec!["archive".to_string(), "old".to_string()])
        );
        assert_eq!(cli.ragged_rows, Some(RaggedRowPolicy::Pad));
        assert_eq!(cli.verbosity_level(), 2);
        assert_eq!(cli.log_directive(), "witsml2csv=debug");
    }

    #[test]
    fn test_inputs_required_unless_generating_config() {
        assert!(Cli::try_parse_from(["witsml2csv", "-o", "out"]).is_err());

        let cli = Cli::try_parse_from(["witsml2csv", "--generate-config"]).unwrap();
        assert!(cli.inputs.is_empty());
        assert_eq!(cli.config_output_path(), PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["witsml2csv", "a.xml", "-q", "-v"]).is_err());

        let cli = Cli::try_parse_from(["witsml2csv", "a.xml", "-q"]).unwrap();
        assert_eq!(cli.verbosity_level(), 0);
        assert_eq!(cli.log_directive(), "witsml2csv=warn");
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from([
            "witsml2csv",
            "a.xml",
            "--max-size",
            "5",
            "-e",
            "xml,witsml",
        ])
        .unwrap();

        let overrides = cli.create_cli_overrides();
        assert_eq!(overrides.max_file_size, Some(5 * 1024 * 1024));
        assert_eq!(overrides.extensions.as_deref(), Some("xml,witsml"));
        assert!(overrides.destination.is_none());
        assert!(overrides.ragged_rows.is_none());
    }

    #[test]
    fn test_output_format_mapping() {
        let cli =
            Cli::try_parse_from(["witsml2csv", "a.xml", "--output-format", "json"]).unwrap();
        assert_eq!(OutputMode::from(cli.output_format), OutputMode::Json);
    }
}
