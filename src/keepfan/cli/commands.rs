use super::print::print_report;
use super::setup::Cli;
use clap::Parser;
use keepfan::config::ExportConfig;
use keepfan::error::Result;
use keepfan::export::run_export;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Exit code for a run that finished but collected sink failures.
pub const EXIT_SINK_FAILURES: i32 = 2;

pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    let config = apply_flags(config, cli);
    config.validate()?;

    let report = run_export(&config)?;
    print_report(&report);

    Ok(if report.is_clean() {
        0
    } else {
        EXIT_SINK_FAILURES
    })
}

/// Logs go to stderr so a console dump on stdout stays clean. `RUST_LOG` wins
/// over `-v`.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // a second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .try_init();
}

fn load_config(cli: &Cli) -> Result<ExportConfig> {
    match (&cli.config, ExportConfig::default_path()) {
        (Some(path), _) => ExportConfig::load(path),
        (None, Some(path)) => ExportConfig::load(path),
        (None, None) => Ok(ExportConfig::default()),
    }
}

/// Command-line flags override whatever the config file says.
fn apply_flags(mut config: ExportConfig, cli: Cli) -> ExportConfig {
    if let Some(archive) = cli.archive {
        config.archive = Some(archive);
    }
    if let Some(sub_folder) = cli.sub_folder {
        config.sub_folder = sub_folder;
    }
    if !cli.tags.is_empty() {
        config.default_tags = cli.tags;
    }
    config.console |= cli.console;
    if cli.text_dir.is_some() {
        config.text_dir = cli.text_dir;
    }
    if cli.markdown_dir.is_some() {
        config.markdown_dir = cli.markdown_dir;
    }
    if cli.outline_file.is_some() {
        config.outline_file = cli.outline_file;
    }
    if cli.paged_dir.is_some() {
        config.paged_dir = cli.paged_dir;
    }
    if let Some(strategy) = cli.name_strategy {
        config.name_strategy = strategy;
    }
    config.year_folders |= cli.year_folders;
    config.month_folders |= cli.month_folders;
    if cli.no_create_dirs {
        config.create_dirs = false;
    }
    if let Some(limit) = cli.word_limit {
        config.word_limit = limit;
    }
    if cli.workers.is_some() {
        config.workers = cli.workers;
    }
    config
}
