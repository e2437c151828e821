use anyhow::{Context, Result};
use clap::Parser;
use quality_gate::cli::{Cli, OutputFormat};
use quality_gate::config::RunConfig;
use quality_gate::quality_gate::QualityGate;
use quality_gate::report::QualityReport;
use quality_gate::source::{JsonFileSource, LogSink, StderrSink, TemplateLinkBuilder};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Exit code for a build marked unstable
const EXIT_UNSTABLE: u8 = 2;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Print the report in the requested format
fn print_report(report: &QualityReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", report.to_report_string()),
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(report).context("Failed to serialize report")?;
            println!("{}", json);
        }
    }
    Ok(())
}

/// Load configuration, fetch and evaluate; returns the report and the mark-unstable policy
fn run(cli: &Cli) -> Result<(QualityReport, bool)> {
    let config = RunConfig::from_cli(cli)?;
    let gates = config.gate_config()?;

    let partitions_file = config
        .service
        .partitions_file
        .clone()
        .context("No regression partitions given: pass --input FILE or set service.partitions_file")?;

    let sink = StderrSink;
    let links = TemplateLinkBuilder::new(config.report.link_template.clone().unwrap_or_default());
    let source = JsonFileSource::new(partitions_file);

    if config.report.server_wait > 0 {
        if config.report.verbose {
            sink.line(&format!(
                "Waiting {} seconds for the analytics service to process build data",
                config.report.server_wait
            ));
        }
        std::thread::sleep(Duration::from_secs(config.report.server_wait));
    }

    let mut gate = QualityGate::new(&source).with_links(&links);
    if config.report.verbose {
        gate = gate.with_sink(&sink);
    }

    let report = gate
        .evaluate(
            config.regression_input(),
            &gates,
            config.report.top_events,
            config.regex_filter(),
        )
        .context("Quality gate evaluation failed")?;

    Ok((report, config.report.mark_unstable))
}

fn main() -> Result<ExitCode> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let (report, mark_unstable) = run(&args)?;
    print_report(&report, args.format)?;

    if report.unstable() && mark_unstable {
        return Ok(ExitCode::from(EXIT_UNSTABLE));
    }

    Ok(ExitCode::SUCCESS)
}
