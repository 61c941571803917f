// snippet entry point.
//
// Startup sequence:
// 1. Parse CLI arguments
// 2. Initialize tracing (stderr, so stdout carries only command output)
// 3. Load config (built-in defaults when no config file exists)
// 4. Dispatch the subcommand and print its result to stdout

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{info, warn};

use snippet_kit::config::{self, Config, ConfigError};
use snippet_kit::{calculate_sum, checked_sum, DataProcessor, Fetcher};

// ---------------------------------------------------------------------------
// CLI types
// ---------------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(name = "snippet", version, about = "Sum numbers, fetch JSON, and double record values.")]
struct Cli {
    /// Directory holding `config/snippet.toml` (defaults to the current directory).
    #[arg(long, value_name = "DIR", global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add two numbers.
    #[command(allow_negative_numbers = true)]
    Sum { a: String, b: String },

    /// GET a URL and print its JSON body.
    Fetch {
        url: String,
        /// Print on one line instead of pretty-printing.
        #[arg(long)]
        compact: bool,
    },

    /// Double one field of every record in a JSON list.
    ///
    /// Reads from --input, --url, or stdin when neither is given.
    Process {
        #[arg(long, value_name = "FILE", conflicts_with = "url")]
        input: Option<PathBuf>,
        #[arg(long, value_name = "URL")]
        url: Option<String>,
        /// Field to double (overrides `processor.field`).
        #[arg(long, value_name = "NAME")]
        field: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    let config = load_config(cli.config_dir.as_deref())?;
    let output = run(cli.command, &config).await?;
    println!("{output}");

    Ok(())
}

/// Execute one subcommand and return the text to print on stdout.
async fn run(command: Command, config: &Config) -> anyhow::Result<String> {
    match command {
        Command::Sum { a, b } => sum_operands(&a, &b),
        Command::Fetch { url, compact } => {
            let fetcher = Fetcher::new(&config.http).context("failed to create HTTP client")?;
            let data = fetcher.fetch_data(&url).await?;
            let rendered = if compact {
                serde_json::to_string(&data)?
            } else {
                serde_json::to_string_pretty(&data)?
            };
            Ok(rendered)
        }
        Command::Process { input, url, field } => {
            let data = read_records(config, input.as_deref(), url.as_deref()).await?;
            let mut processor_config = config.processor.clone();
            if let Some(field) = field {
                processor_config.field = field;
            }
            let processor = DataProcessor::new(processor_config);
            let out = processor.process(&data)?;
            info!(records = out.len(), "process complete");
            Ok(serde_json::to_string(&out)?)
        }
    }
}

/// Load config from `dir` (or the cwd), falling back to built-in defaults
/// when no config file exists. Parse and validation errors are fatal.
fn load_config(dir: Option<&Path>) -> anyhow::Result<Config> {
    let loaded = match dir {
        Some(dir) => config::load_config_in(dir),
        None => config::load_config(),
    };
    match loaded {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound { path }) => {
            warn!(path = %path.display(), "no config file, using built-in defaults");
            Ok(Config::default())
        }
        Err(e) => Err(e).context("failed to load configuration"),
    }
}

/// Add two CLI operands. Integer pairs use checked addition; anything else
/// is added as `f64`.
fn sum_operands(a: &str, b: &str) -> anyhow::Result<String> {
    if let (Ok(x), Ok(y)) = (a.parse::<i64>(), b.parse::<i64>()) {
        return match checked_sum(x, y) {
            Some(total) => Ok(total.to_string()),
            None => bail!("integer overflow adding {a} and {b}"),
        };
    }
    let x: f64 = a.parse().with_context(|| format!("`{a}` is not a number"))?;
    let y: f64 = b.parse().with_context(|| format!("`{b}` is not a number"))?;
    Ok(calculate_sum(x, y).to_string())
}

async fn read_records(
    config: &Config,
    input: Option<&Path>,
    url: Option<&str>,
) -> anyhow::Result<Value> {
    if let Some(url) = url {
        let fetcher = Fetcher::new(&config.http).context("failed to create HTTP client")?;
        return Ok(fetcher.fetch_data(url).await?);
    }

    match input {
        Some(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            parse_records(file).with_context(|| format!("failed to read {}", path.display()))
        }
        None => parse_records(std::io::stdin().lock()).context("failed to read stdin"),
    }
}

/// Read all of `reader` and parse it as JSON.
fn parse_records(mut reader: impl Read) -> anyhow::Result<Value> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    serde_json::from_str(&text).context("input is not valid JSON")
}

/// Initialize tracing to stderr. `RUST_LOG` overrides the default filter.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("snippet_kit=info,snippet=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::fs;

    /// Fresh scratch directory under the system temp dir.
    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("snippet_cli_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn parse(args: &[&str]) -> Command {
        let mut argv = vec!["snippet"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().command
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sum_of_integers_stays_integer() {
        assert_eq!(sum_operands("2", "3").unwrap(), "5");
        assert_eq!(sum_operands("-4", "1").unwrap(), "-3");
    }

    #[test]
    fn sum_with_a_float_operand_is_float() {
        assert_eq!(sum_operands("1.5", "2").unwrap(), "3.5");
    }

    #[test]
    fn sum_rejects_non_numbers() {
        let err = sum_operands("two", "3").unwrap_err();
        assert!(err.to_string().contains("`two` is not a number"));
    }

    #[test]
    fn sum_reports_integer_overflow() {
        assert!(sum_operands(&i64::MAX.to_string(), "1").is_err());
    }

    #[test]
    fn negative_operands_parse_as_values() {
        let cli = Cli::try_parse_from(["snippet", "sum", "-1", "-2"]).unwrap();
        match cli.command {
            Command::Sum { a, b } => assert_eq!((a.as_str(), b.as_str()), ("-1", "-2")),
            other => panic!("expected Sum, got {other:?}"),
        }
    }

    #[test]
    fn process_input_and_url_conflict() {
        let result = Cli::try_parse_from([
            "snippet",
            "process",
            "--input",
            "a.json",
            "--url",
            "http://localhost/",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn missing_config_dir_falls_back_to_defaults() {
        let dir = scratch_dir("no_config");
        let config = load_config(Some(&dir)).unwrap();
        assert_eq!(config, Config::default());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn unreadable_config_file_is_fatal() {
        let dir = scratch_dir("bad_utf8");
        fs::create_dir_all(dir.join("config")).unwrap();
        fs::write(dir.join("config/snippet.toml"), b"[http]\ntimeout_secs = \xff\n").unwrap();
        assert!(load_config(Some(&dir)).is_err());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn config_dir_file_is_used() {
        let dir = scratch_dir("with_config");
        fs::create_dir_all(dir.join("config")).unwrap();
        fs::write(dir.join("config/snippet.toml"), "[processor]\nfield = \"qty\"\n").unwrap();
        let config = load_config(Some(&dir)).unwrap();
        assert_eq!(config.processor.field, "qty");
        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn sum_command_prints_total() {
        let out = run(parse(&["sum", "2", "40"]), &Config::default()).await.unwrap();
        assert_eq!(out, "42");
    }

    #[tokio::test]
    async fn process_reads_input_file() {
        let dir = scratch_dir("input");
        let input = dir.join("records.json");
        fs::write(&input, r#"[{"value":1},{"value":2.5}]"#).unwrap();

        let command = parse(&["process", "--input", input.to_str().unwrap()]);
        let out = run(command, &Config::default()).await.unwrap();
        assert_eq!(out, "[2,5.0]");
        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn field_flag_overrides_configured_field() {
        let dir = scratch_dir("field");
        let input = dir.join("records.json");
        fs::write(&input, r#"[{"amount":10,"value":1}]"#).unwrap();

        let command = parse(&[
            "process",
            "--input",
            input.to_str().unwrap(),
            "--field",
            "amount",
        ]);
        let out = run(command, &Config::default()).await.unwrap();
        assert_eq!(out, "[20]");
        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn process_reports_invalid_records() {
        let dir = scratch_dir("invalid");
        let input = dir.join("records.json");
        fs::write(&input, r#"{"value":1}"#).unwrap();

        let command = parse(&["process", "--input", input.to_str().unwrap()]);
        let err = run(command, &Config::default()).await.unwrap_err();
        assert!(err.to_string().contains("expected a list of records"), "{err}");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn records_parse_from_any_reader() {
        let data = parse_records(&b"[{\"value\": 3}]"[..]).unwrap();
        assert_eq!(data, serde_json::json!([{ "value": 3 }]));
    }

    #[test]
    fn non_json_reader_input_is_rejected() {
        let err = parse_records(&b"value=3"[..]).unwrap_err();
        assert!(err.to_string().contains("not valid JSON"), "{err}");
    }
}
