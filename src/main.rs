use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use portsweep::output;
use portsweep::ports::PortSet;
use portsweep::scanner::{self, ScanError};
use portsweep::services::ServiceLookup;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// portsweep — polite bounded-concurrency TCP connect port scanner.
///
/// Only scan hosts you own or have permission to scan.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "portsweep",
    version,
    about = "Polite bounded-concurrency TCP connect port scanner.",
    long_about = None
)]
struct Cli {
    /// Target hostname or IP.
    #[arg(long)]
    host: String,

    /// Ports to scan: single (22), comma list (22,80,443) or range (1-1024).
    #[arg(long, default_value = PortSet::default_spec())]
    ports: String,

    /// Per-connect timeout in seconds.
    #[arg(long, default_value = "0.5", value_parser = parse_timeout)]
    timeout: Duration,

    /// Max concurrent TCP connect attempts.
    #[arg(long, default_value_t = 200, value_parser = parse_workers)]
    workers: usize,

    /// Save JSON results here.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Save CSV results here.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ports = match PortSet::resolve(&cli.ports).and_then(PortSet::require_tcp_ports) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error parsing ports: {e}");
            return Ok(ExitCode::from(2));
        }
    };

    println!(
        "Scanning {} : {} ports (timeout={}, workers={})...",
        cli.host,
        ports.len(),
        cli.timeout.as_secs_f64(),
        cli.workers
    );

    // Ctrl-C cancels the scan.
    let cancel = CancellationToken::new();
    let cancel_ctrlc = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_ctrlc.cancel();
        }
    });

    let services = ServiceLookup::common();
    let report = match scanner::scan_host_with_cancel(
        &cli.host,
        &ports,
        cli.timeout,
        cli.workers,
        &services,
        cancel,
    )
    .await
    {
        Ok(r) => r,
        Err(e @ ScanError::Cancelled { .. }) => {
            eprintln!("{e}");
            return Ok(ExitCode::from(130));
        }
    };

    output::write_text(io::stdout().lock(), &report)?;

    let mut failed = false;
    if let Some(path) = cli.json.as_deref() {
        match output::save_json(path, &report) {
            Ok(()) => println!("Saved JSON -> {}", path.display()),
            Err(e) => {
                eprintln!("Failed to write JSON to {}: {e:#}", path.display());
                failed = true;
            }
        }
    }
    if let Some(path) = cli.csv.as_deref() {
        match output::save_csv(path, &report) {
            Ok(()) => println!("Saved CSV -> {}", path.display()),
            Err(e) => {
                eprintln!("Failed to write CSV to {}: {e:#}", path.display());
                failed = true;
            }
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
    {
        eprintln!("Warning: logging not initialised: {e}");
    }
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|e| format!("invalid seconds {s:?}: {e}"))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("timeout must be a positive number of seconds, got {s}"));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
}

fn parse_workers(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("workers must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("invalid worker count {s:?}: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_cli() {
        let cli = Cli::try_parse_from(["portsweep", "--host", "example.com"]).unwrap();
        assert_eq!(cli.ports, "1-1024");
        assert_eq!(cli.timeout, Duration::from_millis(500));
        assert_eq!(cli.workers, 200);
        assert!(cli.json.is_none() && cli.csv.is_none());
    }

    #[test]
    fn logging_init_twice_does_not_panic() {
        init_logging(0);
        init_logging(3);
    }

    #[test]
    fn host_is_required() {
        assert!(Cli::try_parse_from(["portsweep"]).is_err());
    }

    #[test]
    fn rejects_bad_timeout_and_workers() {
        for args in [
            ["portsweep", "--host", "h", "--timeout", "0"],
            ["portsweep", "--host", "h", "--timeout", "-1"],
            ["portsweep", "--host", "h", "--timeout", "nan"],
            ["portsweep", "--host", "h", "--workers", "0"],
        ] {
            assert!(Cli::try_parse_from(args).is_err(), "{args:?}");
        }
    }

    #[test]
    fn parses_outputs_and_fractional_timeout() {
        let cli = Cli::try_parse_from([
            "portsweep", "--host", "10.0.0.1", "--ports", "22,80", "--timeout", "1.25",
            "--workers", "8", "--json", "out.json", "--csv", "out.csv", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.timeout, Duration::from_millis(1250));
        assert_eq!(cli.workers, 8);
        assert_eq!(cli.json, Some(PathBuf::from("out.json")));
        assert_eq!(cli.csv, Some(PathBuf::from("out.csv")));
        assert_eq!(cli.verbose, 2);
    }
}
