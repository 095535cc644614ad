use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;
use witsml2csv::{
    Cli, ConversionReport, InputScanner, OutputFormatter, OutputMode, UserFriendlyError,
    Witsml2Csv, Witsml2CsvError,
};

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    let cli = Cli::parse();
    setup_logging(&cli);

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let app = match Witsml2Csv::from_cli(&cli) {
        Ok(app) => app,
        Err(e) => {
            print_startup_error(&e, cli.output_format.into());
            return exit_code_for(&e);
        }
    };

    if cli.dry_run {
        return handle_dry_run(&cli, &app);
    }

    match app.convert(&cli.inputs) {
        Ok(report) => {
            app.output_formatter().print_conversion_report(&report);

            if let Some(ref path) = cli.report {
                if let Err(e) = report.save_json(path) {
                    app.handle_error(&e);
                    return exit_code_for(&e);
                }
            }

            report_exit_code(&report)
        }
        Err(e) => {
            app.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn report_exit_code(report: &ConversionReport) -> i32 {
    if report.has_failures() {
        2
    } else {
        0
    }
}

fn exit_code_for(error: &Witsml2CsvError) -> i32 {
    match error {
        Witsml2CsvError::Cancelled => 130, // Interrupted (SIGINT)
        Witsml2CsvError::NoInputsFound { .. } => 3,
        Witsml2CsvError::InvalidPath { .. } => 4,
        Witsml2CsvError::Config { .. } => 5,
        _ => 1,
    }
}

fn setup_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_directive()));

    // A global subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli.config_output_path();

    match Witsml2Csv::generate_sample_config(&config_path) {
        Ok(()) => {
            println!(
                "Generated sample configuration file: {}",
                config_path.display()
            );
            println!("\nTo use this configuration:");
            println!(
                "  witsml2csv <inputs>... --config {}",
                config_path.display()
            );
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!(
                "Failed to generate configuration file: {}",
                e.user_message()
            );
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_dry_run(cli: &Cli, app: &Witsml2Csv) -> i32 {
    let formatter = app.output_formatter();
    let config = app.config();

    formatter.info("DRY RUN MODE - No files will be written");
    formatter.print_separator();

    let inputs = match InputScanner::new(&config.input).scan(&cli.inputs) {
        Ok(inputs) => inputs,
        Err(e) => {
            app.handle_error(&e);
            return exit_code_for(&e);
        }
    };

    formatter.info("Configuration that would be used:");
    formatter.info(&format!("  Extensions: {}", config.input.extensions.join(", ")));
    formatter.info(&format!("  Destination: {}", config.output.destination.display()));
    formatter.info(&format!(
        "  Ragged rows: {:?}",
        config.extraction.ragged_rows
    ));

    formatter.print_planned_inputs(&inputs);
    formatter.print_separator();
    formatter.success("Dry run completed successfully");

    0
}

fn print_startup_error(error: &Witsml2CsvError, mode: OutputMode) {
    let formatter = OutputFormatter::new(mode, 0, false);
    formatter.print_user_friendly_error(error);
}
