//! pfrule - packet-filter rule endpoint parser
//!
//! Command-line front end for the endpoint parsers.
//!
//! # Usage
//!
//! ```bash
//! pfrule port '1:1024'                 # Parse a port expression
//! pfrule address 10.0.0.0/8 --negate   # Parse an address
//! pfrule check rules.json              # Build and check a rules file
//! pfrule check rules.json --format json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use pfrule::check::check_rules;
use pfrule::config::{CheckConfig, load_config};
use pfrule::rules_file::load_rules;
use pfrule::{parse_address, parse_port};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

shadow_rs::shadow!(build);

#[derive(Parser)]
#[command(name = "pfrule")]
#[command(about = "Parse and check packet-filter rule endpoints", long_about = None)]
#[command(version = build::PKG_VERSION, long_version = build::CLAP_LONG_VERSION)]
struct Cli {
    /// Checker configuration file (default: ~/.config/pfrule/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a port expression such as 80, !=22, 1:1024 or 10<>20
    Port {
        /// Port expression (empty string means any port)
        expr: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Parse an IP address or CIDR network
    Address {
        /// Address literal, optionally with /PREFIX
        addr: String,
        /// Mark the address as negated
        #[arg(short, long)]
        negate: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build every rule of a rules file and report problems
    Check {
        /// Path to the JSON rules file
        file: PathBuf,
        /// Report format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config, cli.verbose);

    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    match run(cli.command, &config, &mut stdout.lock(), &mut stderr.lock()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &CheckConfig, verbose: u8) {
    let level = match verbose {
        0 => config.level().unwrap_or(Level::WARN),
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
}

/// Runs a subcommand, printing results to `out` and rejected input to
/// `err`. `Ok(false)` means the input was rejected.
fn run(
    command: Commands,
    config: &CheckConfig,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<bool, Box<dyn std::error::Error>> {
    match command {
        Commands::Port { expr, json } => match parse_port(&expr) {
            Ok(spec) if json => writeln!(out, "{}", serde_json::to_string_pretty(&spec)?)?,
            Ok(spec) => {
                writeln!(out, "operator: {}", spec.operator())?;
                for port in spec.network_ports() {
                    writeln!(out, "port:     {} (network order 0x{:04x})", port, port.to_network())?;
                }
            }
            Err(e) => return report_parse_error(&e, err),
        },
        Commands::Address { addr, negate, json } => match parse_address(&addr, negate) {
            Ok(parsed) if json => writeln!(out, "{}", serde_json::to_string_pretty(&parsed)?)?,
            Ok(parsed) => {
                writeln!(out, "family:  {}", parsed.family())?;
                writeln!(out, "address: {}", parsed.address())?;
                writeln!(out, "mask:    {}", parsed.mask())?;
                writeln!(out, "negate:  {}", parsed.is_negated())?;
            }
            Err(e) => return report_parse_error(&e, err),
        },
        Commands::Check { file, format } => {
            let rules = load_rules(&file)?;
            let report = check_rules(&rules, config);
            match format {
                Format::Text => write!(out, "{}", report.render_text())?,
                Format::Json => writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?,
            }
            return Ok(report.is_ok());
        }
    }
    Ok(true)
}

fn report_parse_error(
    error: &pfrule::ParseError,
    err: &mut impl Write,
) -> Result<bool, Box<dyn std::error::Error>> {
    let translation = error.translate();
    writeln!(err, "✗ {}", translation.user_message)?;
    for suggestion in &translation.suggestions {
        writeln!(err, "    - {suggestion}")?;
    }
    if let Some(url) = &translation.help_url {
        writeln!(err, "    see {url}")?;
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Parses `args` like the shell would and runs the subcommand.
    fn run_args(args: &[&str]) -> (bool, String, String) {
        let cli = Cli::try_parse_from(std::iter::once("pfrule").chain(args.iter().copied()))
            .unwrap();
        let mut out = Vec::new();
        let mut err = Vec::new();
        let ok = run(cli.command, &CheckConfig::default(), &mut out, &mut err).unwrap();
        (
            ok,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_port_command() {
        let (ok, out, err) = run_args(&["port", "1:1024"]);
        assert!(ok);
        assert!(out.contains("operator: range_inclusive"));
        assert!(out.contains(&format!("port:     1024 (network order 0x{:04x})", 1024u16.to_be())));
        assert!(err.is_empty());
    }

    #[test]
    fn test_port_command_rejects_bad_expression() {
        let (ok, out, err) = run_args(&["port", "!22"]);
        assert!(!ok);
        assert!(out.is_empty());
        assert!(err.starts_with("✗ Cannot read port expression '!22'"));
    }

    #[test]
    fn test_port_command_json() {
        let (ok, out, _) = run_args(&["port", "--json", "10<>20"]);
        assert!(ok);
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["operator"], "range_except");
        assert_eq!(json["ports"][1], 20);
    }

    #[test]
    fn test_address_command() {
        let (ok, out, _) = run_args(&["address", "--negate", "10.1.2.3/8"]);
        assert!(ok);
        assert!(out.contains("family:  inet\n"));
        assert!(out.contains("address: 10.0.0.0\n"));
        assert!(out.contains("mask:    255.0.0.0\n"));
        assert!(out.contains("negate:  true\n"));

        let (ok, _, err) = run_args(&["address", "10.0.0.0/33"]);
        assert!(!ok);
        assert!(err.contains("not a valid network"));
    }

    #[test]
    fn test_check_command_exit_status() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"rules": [{{"label": "dns", "to": {{"address": "8.8.8.8", "port": "53"}}}}]}}"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        let (ok, out, _) = run_args(&["check", path]);
        assert!(ok);
        assert!(out.contains("✓ #1 dns"));

        let (ok, out, _) = run_args(&["check", "--format", "json", path]);
        assert!(ok);
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["entries"][0]["label"], "dns");

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, r#"{{"rules": [{{"to": {{"address": "8.8.8.8", "port": ":53"}}}}]}}"#).unwrap();
        let (ok, out, _) = run_args(&["check", bad.path().to_str().unwrap()]);
        assert!(!ok);
        assert!(out.contains("1 error(s)"));
    }

    #[test]
    fn test_check_command_missing_file_is_error() {
        let cli = Cli::try_parse_from(["pfrule", "check", "/nonexistent/rules.json"]).unwrap();
        let result = run(cli.command, &CheckConfig::default(), &mut Vec::<u8>::new(), &mut Vec::<u8>::new());
        assert!(result.is_err());
    }
}
