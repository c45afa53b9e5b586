use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use owners_gate::broker::{Broker, BrokerError};
use owners_gate::config::BrokerConfig;
use owners_gate::context::{Invocation, InvocationArgs};
use owners_gate::github::{OctocrabClient, RetryConfig};
use owners_gate::owners::FsOwnersStore;

/// Gate pull request merges on OWNERS approvals.
#[derive(Debug, Parser)]
#[command(name = "owners-gate", version, about)]
struct Cli {
    #[command(flatten)]
    invocation: InvocationArgs,

    /// Emit logs as JSON lines.
    #[arg(long, env = "OWNERS_GATE_LOG_JSON")]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json);

    let invocation = match cli.invocation.into_invocation(|key| std::env::var(key).ok()) {
        Ok(invocation) => invocation,
        Err(e) => {
            error!(error = %e, "invalid invocation");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to start runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(invocation)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "owners_gate=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(invocation: Invocation) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = BrokerConfig::load(&invocation.workspace).map_err(BrokerError::from)?;
    let github = OctocrabClient::from_token(invocation.token.expose(), invocation.repo.clone())?
        .with_retry(RetryConfig::BACKOFF);
    info!(
        repo = %invocation.repo,
        workspace = %invocation.workspace.display(),
        required_labels = ?config.required_labels,
        "starting"
    );

    let cancel = CancellationToken::new();
    let broker = Broker::new(github, FsOwnersStore, config, invocation)
        .with_cancellation(cancel.clone());

    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling");
            cancel.cancel();
        }
    };

    let run = broker.run();
    tokio::pin!(run);
    let result = tokio::select! {
        result = &mut run => result,
        _ = interrupt => run.await,
    };
    result.map_err(Into::into)
}
