pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod scanner;
pub mod ui;
pub mod witsml;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, ExtractionConfig, InputConfig, OutputConfig};
pub use error::{Result, UserFriendlyError, Witsml2CsvError};

// Core functionality re-exports
pub use extractor::{
    ConversionReport, ExtractedLog, ExtractionOutcome, FileResult, FileStatus, LogExtractor,
    LogTable, OutputManager, RaggedRowPolicy, SavedLog,
};
pub use scanner::{FileFilter, InputFile, InputScanner};
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};
pub use witsml::{read_xml, CellValue, LogDocument, MnemonicMap};

use extractor::ConversionProgress;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Batch driver: expands inputs, converts every document and collects a
/// [`ConversionReport`].
pub struct Witsml2Csv {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
}

impl Witsml2Csv {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet);
        let shutdown = GracefulShutdown::new()?;

        Ok(Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
        })
    }

    /// No Ctrl+C handler and no progress bars.
    pub fn new_for_test(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        Self {
            config,
            output_formatter: OutputFormatter::new(output_mode, verbose, quiet),
            progress_manager: ProgressManager::new(false),
            shutdown: GracefulShutdown::new_for_test(),
        }
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        Self::new(
            config,
            cli_args.output_format.into(),
            cli_args.verbose,
            cli_args.quiet,
        )
    }

    pub fn extractor(&self) -> LogExtractor {
        LogExtractor::new().with_ragged_rows(self.config.extraction.ragged_rows)
    }

    /// Converts every document found under `inputs`.
    ///
    /// Failures of individual documents are recorded in the report and do not
    /// stop the batch. Scanning errors, an unusable destination and Ctrl+C do.
    pub fn convert<P: AsRef<Path>>(&self, inputs: &[P]) -> Result<ConversionReport> {
        let started_at = chrono::Utc::now();
        let start_time = Instant::now();

        self.shutdown.check_shutdown()?;

        let files = self.scan_inputs(inputs)?;
        self.output_formatter
            .info(&format!("Found {} WITSML document(s)", files.len()));

        let output_manager = self.prepare_destination()?;
        self.shutdown.check_shutdown()?;

        let results = self.convert_files(&files, output_manager.destination())?;

        let report = ConversionReport::new(
            started_at,
            output_manager.destination().to_path_buf(),
            results,
            start_time.elapsed(),
        );
        tracing::info!(
            converted = report.summary.converted,
            empty = report.summary.empty,
            failed = report.summary.failed,
            "conversion finished"
        );

        Ok(report)
    }

    pub fn scan_inputs<P: AsRef<Path>>(&self, inputs: &[P]) -> Result<Vec<InputFile>> {
        self.output_formatter
            .start_operation("Scanning for WITSML documents");

        let spinner = self.progress_manager.create_spinner("Scanning inputs...");
        let result = InputScanner::new(&self.config.input).scan(inputs);
        spinner.finish_and_clear();

        result
    }

    fn prepare_destination(&self) -> Result<OutputManager> {
        let output_manager = OutputManager::new(self.config.output.destination.clone())
            .with_create_destination(self.config.output.create_destination);

        output_manager.initialize()?;
        self.output_formatter.info(&format!(
            "Writing to {}",
            output_manager.destination().display()
        ));

        Ok(output_manager)
    }

    fn convert_files(&self, files: &[InputFile], destination: &Path) -> Result<Vec<FileResult>> {
        self.output_formatter.start_operation("Converting logs");

        let extractor = self.extractor();
        let file_progress = self.progress_manager.create_file_progress(files.len() as u64);
        let mut progress = ConversionProgress::new(files.len());
        let mut results = Vec::with_capacity(files.len());

        for file in files {
            if let Err(e) = self.shutdown.check_shutdown() {
                file_progress.abandon_with_message("Cancelled");
                return Err(e);
            }

            progress.start_file(file.display_path());
            ui::progress::update_file_progress(&file_progress, &progress);

            let outcome = if file.size > self.config.input.max_file_size {
                Err(Witsml2CsvError::FileTooLarge {
                    size: file.size,
                    max_size: self.config.input.max_file_size,
                })
            } else {
                extractor.convert_file(&file.path, destination)
            };

            match &outcome {
                Err(e) if e.is_document_error() => {
                    tracing::warn!(source = %file.path.display(), error = %e, "document rejected")
                }
                Err(e) => tracing::error!(source = %file.path.display(), error = %e, "conversion failed"),
                Ok(_) => tracing::debug!(source = %file.path.display(), "conversion done"),
            }

            let result = FileResult::from_outcome(file.path.clone(), outcome);
            if let FileStatus::Failed { reason } = &result.status {
                self.progress_manager.suspend(|| {
                    self.output_formatter
                        .warning(&format!("{}: {}", file.display_path(), reason))
                });
            }

            progress.finish_file(result.is_failure());
            ui::progress::update_file_progress(&file_progress, &progress);
            results.push(result);
        }

        ui::progress::finish_progress_with_summary(
            &file_progress,
            &format!("Processed {} document(s)", progress.files_processed),
            progress.elapsed(),
        );

        Ok(results)
    }

    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.is_running()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.request_shutdown();
    }

    pub fn handle_error(&self, error: &Witsml2CsvError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Converts a single WITSML file into `destination` with default settings.
pub fn convert_file_simple<S: AsRef<Path>, D: Into<PathBuf>>(
    source: S,
    destination: D,
) -> Result<ExtractionOutcome> {
    let output_manager = OutputManager::new(destination).with_create_destination(true);
    output_manager.initialize()?;
    LogExtractor::new().convert_file(source, output_manager.destination())
}

pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
