use std::str::FromStr;

use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use metrics::counter;
use orka_kubehub::KubeAccessor;
use orka_label::{label_batch, parse_command, resolve_targets, LabelError, LabelOptions};
use tracing::{error, info};

mod printer;

use printer::Printer;

#[derive(Parser, Debug)]
#[command(name = "orkactl", version, about = "Orka CLI")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    /// Kubernetes namespace (default: current context)
    #[arg(long = "ns", global = true, env = "ORKA_NAMESPACE")]
    namespace: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Output { Human, Json, Yaml }

#[derive(Subcommand, Debug)]
enum Commands {
    /// Update labels on one or more objects
    ///
    /// Examples: `orkactl label pods foo unhealthy=true`,
    /// `orkactl label pods/foo status=unhealthy --overwrite`,
    /// `orkactl label pods --all status=ok`, `orkactl label pods foo bar-`
    Label {
        /// `<type> <name>...` or `<type>/<name>...`, followed by `key=value` and `key-` updates
        #[arg(required = false)]
        args: Vec<String>,
        /// Replace existing labels with differing values
        #[arg(long = "overwrite", action = ArgAction::SetTrue)]
        overwrite: bool,
        /// Only update if the object's current resource version matches; stamps it on the result
        #[arg(long = "resource-version")]
        resource_version: Option<String>,
        /// Select every object of the given type in the namespace
        #[arg(long = "all", action = ArgAction::SetTrue)]
        all: bool,
        /// Print the result without persisting it
        #[arg(long = "dry-run", action = ArgAction::SetTrue)]
        dry_run: bool,
    },
}

fn init_tracing() {
    let env = std::env::var("ORKA_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // stdout carries printer output; logs go to stderr
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("ORKA_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid ORKA_METRICS_ADDR; expected host:port");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();

    match cli.command {
        Commands::Label { args, overwrite, resource_version, all, dry_run } => {
            let opts = LabelOptions { overwrite, resource_version, dry_run };
            run_label(cli.output, cli.namespace.as_deref(), &args, all, opts).await?;
        }
    }

    Ok(())
}

async fn run_label(output: Output, ns: Option<&str>, args: &[String], all: bool, opts: LabelOptions) -> Result<()> {
    // Usage errors surface here, before any cluster round-trip
    let (selection, spec) = parse_command(args, ns, all).map_err(|e| {
        counter!("label_usage_err", 1u64);
        e
    })?;
    info!(ns = ?ns, all, overwrite = opts.overwrite, dry_run = opts.dry_run, "label invoked");

    let client = orka_kubehub::get_kube_client().await?;
    let accessor = KubeAccessor::connect(client).await?;
    let targets = resolve_targets(&accessor, selection).await?;

    let stdout = std::io::stdout();
    let mut printer = Printer::new(output, stdout.lock(), opts.dry_run);
    match label_batch(&accessor, &mut printer, &targets, &spec, &opts).await {
        Ok(report) => {
            for f in &report.failures {
                eprintln!("error: {}", f);
            }
            if report.is_partial() {
                return Err(anyhow!("{} of {} objects failed to label", report.failures.len(), targets.len()));
            }
            Ok(())
        }
        Err(LabelError::AllFailed(failures)) => {
            for f in &failures {
                eprintln!("error: {}", f);
            }
            error!(count = failures.len(), "no objects were labeled");
            Err(anyhow!("no objects were labeled"))
        }
        Err(e) => Err(e.into()),
    }
}
