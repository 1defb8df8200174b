//! `photoboard run` wiring against a loopback handshake server.

use clap::Parser;
use photoboard_client::cli::{Cli, Commands};
use photoboard_core::HandshakeClient;
use photoboard_core::store::{FileStore, IdentifierStore};
use photoboard_test_utils::{HandshakeServer, ServerReply};

#[tokio::test]
async fn run_command_persists_latest_identifier() {
    photoboard_core::logging::init_test_logging();
    let server = HandshakeServer::start(vec![
        ServerReply::identifier("from-cli-1"),
        ServerReply::Silent,
        ServerReply::identifier("from-cli-2"),
    ])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let session_file = dir.path().join("session-id");
    let port = server.port().to_string();

    let cli = Cli::try_parse_from([
        "photoboard",
        "run",
        "--host",
        "127.0.0.1",
        "--port",
        port.as_str(),
        "--session-file",
        session_file.to_str().unwrap(),
        "--retry-delay-ms",
        "10",
        "--recv-timeout-ms",
        "200",
        "--cycles",
        "2",
    ])
    .unwrap();
    let Commands::Run(args) = &cli.command else {
        panic!("expected run");
    };

    let config = cli.run_config(args).unwrap();
    let mut client = HandshakeClient::from_config(&config).unwrap();
    let summary = client.run_for(args.cycles).await.unwrap();

    assert_eq!(summary.completed, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(
        FileStore::new(&session_file).load().unwrap().unwrap().to_string(),
        "from-cli-2"
    );
    assert_eq!(
        server.finished().await,
        vec![b"CONNOK".to_vec(), b"CONN".to_vec(), b"CONNOK".to_vec()]
    );
}
