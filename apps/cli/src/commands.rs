//! CLI definition, tracing setup, and the input/output boundary.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use clap::builder::FalseyValueParser;
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use itemenrich_core::{EnrichStats, EnrichmentObserver, FetchFailure, pipeline};
use itemenrich_fetch::JsonFetcher;
use itemenrich_shared::{
    AppConfig, ConfigOverrides, EnrichFlags, EnrichStep, ItemEnrichError, NamespaceFailurePolicy,
    load_config, load_config_from, parse_records, render_records,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// itemenrich — attach namespace, metadata, and settings data to JSON records.
#[derive(Parser)]
#[command(
    name = "itemenrich",
    version,
    about = "Enrich a JSON array of records with namespace, metadata, and settings lookups.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Input file holding a JSON array of objects (defaults to stdin).
    #[arg(long = "in", value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Output file for the enriched array (defaults to stdout).
    #[arg(long = "out", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Config file (defaults to ~/.itemenrich/itemenrich.toml when present).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL of the namespace service.
    #[arg(long, env = "NAMESPACES_URL", value_name = "URL")]
    pub namespaces_url: Option<String>,

    /// Base URL of the items service.
    #[arg(long, env = "ITEMS_URL", value_name = "URL")]
    pub items_url: Option<String>,

    /// Replace each record's `namespace` with the namespace object.
    #[arg(long, env = "ENRICH_NAMESPACE", value_parser = FalseyValueParser::new())]
    pub enrich_namespace: bool,

    /// Attach the namespace's settings to the fetched namespace.
    #[arg(long, env = "ENRICH_NAMESPACE_SETTINGS", value_parser = FalseyValueParser::new())]
    pub enrich_namespace_settings: bool,

    /// Attach each record's metadata list.
    #[arg(long, env = "ENRICH_METADATA", value_parser = FalseyValueParser::new())]
    pub enrich_metadata: bool,

    /// Attach each record's settings list.
    #[arg(long, env = "ENRICH_SETTINGS", value_parser = FalseyValueParser::new())]
    pub enrich_settings: bool,

    /// What a failed namespace lookup does to the record's `namespace`.
    #[arg(long, value_name = "POLICY")]
    pub on_namespace_failure: Option<NamespaceFailureArg>,

    /// Pretty-print the output array.
    #[arg(long)]
    pub pretty: bool,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Namespace failure policy as spelled on the command line.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum NamespaceFailureArg {
    /// Keep the original `namespace` value.
    Preserve,
    /// Overwrite `namespace` with null.
    Legacy,
}

impl From<NamespaceFailureArg> for NamespaceFailurePolicy {
    fn from(arg: NamespaceFailureArg) -> Self {
        match arg {
            NamespaceFailureArg::Preserve => Self::Preserve,
            NamespaceFailureArg::Legacy => Self::Legacy,
        }
    }
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            namespaces_url: self.namespaces_url.clone(),
            items_url: self.items_url.clone(),
            flags: EnrichFlags {
                namespace: self.enrich_namespace,
                namespace_settings: self.enrich_namespace_settings,
                metadata: self.enrich_metadata,
                settings: self.enrich_settings,
            },
            on_namespace_failure: self.on_namespace_failure.map(Into::into),
        }
    }
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout carries
/// the JSON output.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "itemenrich=info",
        1 => "itemenrich=debug",
        _ => "itemenrich=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Load config, read records, enrich them, write the result.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let file_config = load_file_config(cli.config.as_deref())?;
    let config = file_config
        .resolve(&cli.overrides())
        .wrap_err("invalid configuration")?;
    let pretty = cli.pretty || file_config.output.pretty;

    let input = read_input(cli.input.as_deref())?;
    let records = parse_records(&input)?;

    info!(
        records = records.len(),
        flags = ?config.flags(),
        namespaces_url = config.namespaces_url(),
        items_url = config.items_url(),
        "starting enrichment"
    );

    let fetcher = JsonFetcher::new()?;
    let observer = CliObserver::new(records.len());
    let result = pipeline::run(records, &config, &fetcher, &observer).await;
    observer.finish();

    log_summary(&result.stats);

    let rendered = render_records(&result.records, pretty)?;
    write_output(cli.output.as_deref(), &rendered)?;

    Ok(())
}

fn load_file_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    let content = match path {
        Some(path) => std::fs::read_to_string(path).map_err(|e| ItemEnrichError::io(path, e))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| ItemEnrichError::io("<stdin>", e))?;
            buf
        }
    };
    Ok(content)
}

/// Write the rendered array once, newline-terminated.
fn write_output(path: Option<&Path>, rendered: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, format!("{rendered}\n"))
                .map_err(|e| ItemEnrichError::io(path, e))?;
            debug!(path = %path.display(), "wrote output file");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{rendered}").map_err(|e| ItemEnrichError::io("<stdout>", e))?;
            stdout
                .flush()
                .map_err(|e| ItemEnrichError::io("<stdout>", e))?;
        }
    }
    Ok(())
}

fn log_summary(stats: &EnrichStats) {
    for step in EnrichStep::ALL {
        let tally = stats.step(step);
        if tally.attempted > 0 {
            info!(
                %step,
                attempted = tally.attempted,
                succeeded = tally.succeeded,
                failed = tally.failed,
                "lookup summary"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// CLI observer
// ---------------------------------------------------------------------------

/// Progress bar on stderr plus debug logs for absorbed lookup failures.
struct CliObserver {
    bar: ProgressBar,
}

impl CliObserver {
    fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.set_message("enriching records");
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl EnrichmentObserver for CliObserver {
    fn fetch_failed(&self, failure: &FetchFailure<'_>) {
        debug!(
            record = failure.record_index,
            step = %failure.step,
            error = %failure.error,
            "lookup failed, field left unenriched"
        );
    }

    fn record_finished(&self, _index: usize, _total: usize) {
        self.bar.inc(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Variables the CLI binds; cleared around every env-sensitive test.
    const BOUND_ENV: [&str; 6] = [
        "NAMESPACES_URL",
        "ITEMS_URL",
        "ENRICH_NAMESPACE",
        "ENRICH_NAMESPACE_SETTINGS",
        "ENRICH_METADATA",
        "ENRICH_SETTINGS",
    ];

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Run `f` with only `vars` set among the bound variables, then restore
    /// the previous environment.
    fn with_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let saved: Vec<(&str, Option<String>)> = BOUND_ENV
            .iter()
            .map(|name| (*name, std::env::var(name).ok()))
            .collect();

        // SAFETY: env mutation is serialized by ENV_LOCK.
        unsafe {
            for name in BOUND_ENV {
                std::env::remove_var(name);
            }
            for (name, value) in vars {
                std::env::set_var(name, value);
            }
        }

        let out = f();

        // SAFETY: as above.
        unsafe {
            for (name, value) in saved {
                match value {
                    Some(value) => std::env::set_var(name, value),
                    None => std::env::remove_var(name),
                }
            }
        }
        out
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_map_to_overrides() {
        let cli = with_env(&[], || Cli::try_parse_from([
            "itemenrich",
            "--in",
            "records.json",
            "--namespaces-url",
            "http://ns.local",
            "--items-url",
            "http://items.local",
            "--enrich-namespace",
            "--enrich-settings",
            "--on-namespace-failure",
            "legacy",
        ]))
        .expect("parse");

        assert_eq!(cli.input, Some(PathBuf::from("records.json")));
        assert!(cli.output.is_none());

        let overrides = cli.overrides();
        assert_eq!(overrides.namespaces_url.as_deref(), Some("http://ns.local"));
        assert_eq!(overrides.items_url.as_deref(), Some("http://items.local"));
        assert!(overrides.flags.namespace);
        assert!(overrides.flags.settings);
        assert!(!overrides.flags.metadata);
        assert_eq!(
            overrides.on_namespace_failure,
            Some(NamespaceFailurePolicy::Legacy)
        );
    }

    #[test]
    fn env_vars_bind_urls_and_flags() {
        let cli = with_env(
            &[
                ("NAMESPACES_URL", "http://ns.local"),
                ("ITEMS_URL", "http://items.local"),
                ("ENRICH_METADATA", "false"),
                ("ENRICH_SETTINGS", "1"),
                ("ENRICH_NAMESPACE", "off"),
            ],
            || Cli::try_parse_from(["itemenrich"]),
        )
        .expect("parse");

        let overrides = cli.overrides();
        assert_eq!(overrides.namespaces_url.as_deref(), Some("http://ns.local"));
        assert_eq!(overrides.items_url.as_deref(), Some("http://items.local"));
        assert!(!overrides.flags.metadata);
        assert!(overrides.flags.settings);
        assert!(!overrides.flags.namespace);
        assert!(!overrides.flags.namespace_settings);
    }

    #[test]
    fn command_line_beats_env() {
        let cli = with_env(&[("ITEMS_URL", "http://env-items.local")], || {
            Cli::try_parse_from(["itemenrich", "--items-url", "http://cli-items.local"])
        })
        .expect("parse");

        assert_eq!(
            cli.overrides().items_url.as_deref(),
            Some("http://cli-items.local")
        );
        assert!(cli.overrides().namespaces_url.is_none());
    }

    #[test]
    fn file_input_and_output_roundtrip() {
        let dir = std::env::temp_dir().join(format!("itemenrich-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("in.json");
        let output = dir.join("out.json");
        std::fs::write(&input, r#"[{"id":"1"}]"#).unwrap();

        let content = read_input(Some(&input)).unwrap();
        let records = parse_records(&content).unwrap();
        write_output(Some(&output), &render_records(&records, false).unwrap()).unwrap();

        assert_eq!(std::fs::read_to_string(&output).unwrap(), "[{\"id\":\"1\"}]\n");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_input_file_is_an_error() {
        let path = std::env::temp_dir().join("itemenrich-missing-input.json");
        let err = read_input(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("itemenrich-missing-input.json"));
    }
}
