//! photoboard-client binary entry point.
//!
//! Keeps a session identifier fresh with the photoboard server and runs the
//! picture pipeline after each handshake.

use clap::Parser;
use tracing::{error, info, warn};

use photoboard_client::{Cli, CombineArgs, Commands, RunArgs, SessionArgs, UploadArgs};
use photoboard_core::action::{ExternalAction, UploadAction};
use photoboard_core::combine::combine_files;
use photoboard_core::constants::DEFAULT_ACTION_TIMEOUT;
use photoboard_core::store::{FileStore, IdentifierStore};
use photoboard_core::{HandshakeClient, SessionId};

/// Identifier sent with a manual upload when no handshake has happened yet.
const MANUAL_SESSION: &str = "manual";

fn main() {
    let cli = Cli::parse();

    let log_format = cli.log_format.into();
    if let Err(e) = photoboard_core::init_logging(cli.verbose, cli.log_file.as_deref(), log_format) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!(version = env!("CARGO_PKG_VERSION"), "photoboard-client starting");

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("photoboard-client: failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    let result = rt.block_on(async {
        match &cli.command {
            Commands::Run(args) => run(&cli, args).await,
            Commands::Combine(args) => combine(args).await,
            Commands::Upload(args) => upload(&cli, args).await,
            Commands::Session(args) => session(&cli, args),
        }
    });

    if let Err(e) = result {
        error!(error = %e, "photoboard-client failed");
        eprintln!("photoboard-client: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli, args: &RunArgs) -> photoboard_core::Result<()> {
    let config = cli.run_config(args)?;
    info!(
        host = %config.host,
        port = config.port,
        session_file = %config.session_file.display(),
        actions = config.actions.len(),
        "starting handshake loop"
    );

    let mut client = HandshakeClient::from_config(&config)?;

    let finished = tokio::select! {
        result = client.run_for(args.cycles) => Some(result?),
        _ = tokio::signal::ctrl_c() => None,
    };

    match finished {
        Some(summary) => {
            info!(completed = summary.completed, failed = summary.failed, "done");
        }
        None => {
            let summary = client.summary();
            info!(
                completed = summary.completed,
                failed = summary.failed,
                "interrupted, shutting down"
            );
        }
    }
    Ok(())
}

async fn combine(args: &CombineArgs) -> photoboard_core::Result<()> {
    let (left, right, output) = (args.left.clone(), args.right.clone(), args.output.clone());
    let (width, height) =
        tokio::task::spawn_blocking(move || combine_files(&left, &right, &output))
            .await
            .map_err(|e| photoboard_core::Error::Image {
                message: format!("combine task failed: {}", e),
            })??;

    println!("{} ({}x{})", args.output.display(), width, height);
    Ok(())
}

async fn upload(cli: &Cli, args: &UploadArgs) -> photoboard_core::Result<()> {
    let config = cli.base_config()?;
    let store = FileStore::new(config.session_file);
    let session_id = match store.load() {
        Ok(Some(id)) => id,
        Ok(None) => SessionId::try_from(MANUAL_SESSION)?,
        Err(e) => {
            warn!(error = %e, "could not read stored identifier, uploading without it");
            SessionId::try_from(MANUAL_SESSION)?
        }
    };

    let action = UploadAction::new(args.url.clone(), args.files(), DEFAULT_ACTION_TIMEOUT)?;
    let report = action.run(&session_id).await?;
    println!("{}", report.detail);
    Ok(())
}

fn session(cli: &Cli, args: &SessionArgs) -> photoboard_core::Result<()> {
    let path = match &args.session_file {
        Some(path) => path.clone(),
        None => cli.base_config()?.session_file,
    };

    match FileStore::new(&path).load()? {
        Some(id) => println!("{}", id),
        None => {
            eprintln!("no session identifier stored in {}", path.display());
            std::process::exit(2);
        }
    }
    Ok(())
}
