mod console;

use std::{future::Future, io, process::ExitCode, sync::Arc};

use clap::{ArgAction, Parser, ValueEnum};
use http::{
    directory::{CwdWithFallback, DirectoryStrategy, ScriptRelative},
    error::ServerError,
    feature::{CrossOriginIsolation, StaticFiles, preflight},
    server::HttpServer,
};
use tracing::debug;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

/// Serve a directory over HTTP with the headers browsers require for
/// cross-origin isolation (SharedArrayBuffer, threaded WebAssembly).
#[derive(Parser, Debug)]
#[command(name = "coi-serve", version, about, long_about = None)]
struct Args {
    /// TCP port to listen on
    #[arg(short, long, default_value_t = 8000)]
    port: u16,

    /// Interface to bind, all of them by default
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// How the serving directory is chosen
    #[arg(long, value_enum, default_value_t = Policy::Script)]
    policy: Policy,

    /// Increase diagnostic output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Policy {
    /// Directory containing this executable; `GET /lib/` requests are not logged
    Script,
    /// Working directory, home if it is not listable; no GET is logged
    Cwd,
}

impl Policy {
    fn strategy(self) -> Box<dyn DirectoryStrategy> {
        match self {
            Policy::Script => Box::new(ScriptRelative),
            Policy::Cwd => Box::new(CwdWithFallback),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{}", console::failure(&e));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

async fn run(args: Args) -> Result<(), ServerError> {
    let strategy = args.policy.strategy();
    let serving = strategy.resolve()?;
    if let Some(warning) = serving.warning() {
        println!("{}", console::fallback_warning(warning));
    }
    serving.prepare()?;
    debug!(directory = %serving.path().display(), policy = ?args.policy, "serving directory resolved");

    let mut server = HttpServer::new();
    server
        .set_host(&args.host)
        .set_port(args.port)
        .set_handler(preflight(StaticFiles::new(serving.path()).into_handler()))
        .set_hook(Arc::new(CrossOriginIsolation::with_quiet_prefix(
            strategy.quiet_prefix(),
        )));

    let bound = server.bind().await?;
    let interrupted = interrupt()?;

    println!("{}", console::banner(bound.local_addr().port(), serving.path()));

    bound.serve_until(interrupted).await?;
    println!("{}", console::STOPPED);
    Ok(())
}

#[cfg(unix)]
fn interrupt() -> io::Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    Ok(async move {
        sigint.recv().await;
    })
}

#[cfg(not(unix))]
fn interrupt() -> io::Result<impl Future<Output = ()>> {
    Ok(async {
        let _ = tokio::signal::ctrl_c().await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_fixed_contract() {
        let args = Args::parse_from(["coi-serve"]);
        assert_eq!(args.port, 8000);
        assert_eq!(args.host, "0.0.0.0");
        assert_eq!(args.policy, Policy::Script);
    }

    #[test]
    fn test_policy_prefixes() {
        assert_eq!(Policy::Script.strategy().quiet_prefix(), "GET /lib/");
        assert_eq!(Policy::Cwd.strategy().quiet_prefix(), "GET /");
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::parse_from(["coi-serve", "-p", "9000", "--policy", "cwd", "-vv"]);
        assert_eq!(args.port, 9000);
        assert_eq!(args.policy, Policy::Cwd);
        assert_eq!(args.verbose, 2);
    }
}
