//! Post-handshake actions against local files and a mock HTTP server.

use std::sync::Arc;
use std::time::Duration;

use mockito::Matcher;
use photoboard_core::action::{ExternalAction, UploadAction, build_action};
use photoboard_core::combine::combine_files;
use photoboard_core::store::MemoryStore;
use photoboard_core::{
    ActionConfig, ActionOutcome, ClientConfig, CycleOutcome, HandshakeClient, SessionId,
    UploadFile,
};
use photoboard_test_utils::{
    BLUE, ConnectStep, FakeClock, RED, ScriptedConnector, scripted_peer, write_solid_png,
};

fn session() -> SessionId {
    SessionId::try_from("c0ffee-0001").unwrap()
}

fn multipart() -> Matcher {
    Matcher::Regex("^multipart/form-data; boundary=".into())
}

#[tokio::test]
async fn upload_sends_picture_and_depth_parts() {
    let dir = tempfile::tempdir().unwrap();
    let picture = dir.path().join("photoboard-image-COLOR.png");
    let depth = dir.path().join("photoboard-image-DEPTH.png");
    write_solid_png(&picture, 4, 4, RED);
    write_solid_png(&depth, 4, 4, BLUE);

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/upload")
        .match_header("content-type", multipart())
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="picture"; filename="photoboard-image-COLOR.png""#.into()),
            Matcher::Regex(r#"name="depth"; filename="photoboard-image-DEPTH.png""#.into()),
            Matcher::Regex("image/png".into()),
        ]))
        .with_status(200)
        .create_async()
        .await;

    let upload = UploadAction::new(
        format!("{}/upload", server.url()),
        vec![UploadFile::new("picture", &picture), UploadFile::new("depth", &depth)],
        Duration::from_secs(10),
    )
    .unwrap();

    let report = upload.run(&session()).await.unwrap();
    assert_eq!(report.action, "upload");
    assert!(report.detail.starts_with("2 file(s) accepted"));
    mock.assert_async().await;
}

#[tokio::test]
async fn upload_rejected_by_server_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let picture = dir.path().join("picture.png");
    write_solid_png(&picture, 2, 2, RED);

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/upload")
        .match_header("content-type", multipart())
        .match_body(Matcher::Regex(r#"name="picture""#.into()))
        .with_status(500)
        .create_async()
        .await;

    let upload = UploadAction::new(
        format!("{}/upload", server.url()),
        vec![UploadFile::new("picture", &picture)],
        Duration::from_secs(10),
    )
    .unwrap();

    let err = upload.run(&session()).await.unwrap_err();
    assert!(err.to_string().contains("500"), "unexpected error: {}", err);
    mock.assert_async().await;
}

#[test]
fn combine_two_captures() {
    let dir = tempfile::tempdir().unwrap();
    let left = dir.path().join("photoboard-image-COLOR1.png");
    let right = dir.path().join("photoboard-image-COLOR2.png");
    let output = dir.path().join("photoboard-image-COLOR.png");
    write_solid_png(&left, 800, 600, RED);
    write_solid_png(&right, 800, 600, BLUE);

    assert_eq!(combine_files(&left, &right, &output).unwrap(), (800, 600));

    let combined = image::open(&output).unwrap().to_rgb8();
    assert_eq!(combined.dimensions(), (800, 600));
    assert_eq!(*combined.get_pixel(0, 0), RED);
    assert_eq!(*combined.get_pixel(399, 599), RED);
    assert_eq!(*combined.get_pixel(400, 0), BLUE);
    assert_eq!(*combined.get_pixel(799, 599), BLUE);
}

#[tokio::test]
async fn combine_then_upload_after_handshake() {
    let dir = tempfile::tempdir().unwrap();
    let left = dir.path().join("left.png");
    let right = dir.path().join("right.png");
    let output = dir.path().join("combined.png");
    write_solid_png(&left, 6, 4, RED);
    write_solid_png(&right, 6, 4, BLUE);

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_header("content-type", multipart())
        .match_body(Matcher::Regex(r#"name="picture"; filename="combined.png""#.into()))
        .with_status(201)
        .create_async()
        .await;
    let actions = vec![
        ActionConfig::Combine {
            left,
            right,
            output: output.clone(),
        },
        ActionConfig::Upload {
            url: format!("{}/", server.url()),
            files: vec![UploadFile::new("picture", &output)],
            timeout_ms: 10_000,
        },
    ];
    let action = build_action(&actions).unwrap().unwrap();
    assert_eq!(action.name(), "sequence");

    let (stream, peer) = scripted_peer(Some(b"pipeline-1"));
    let connector = Arc::new(ScriptedConnector::new([ConnectStep::Accept(stream)]));
    let mut client = HandshakeClient::new(
        &ClientConfig::new(),
        connector,
        Arc::new(FakeClock::new()),
        Arc::new(MemoryStore::new()),
    )
    .with_action(action);

    match client.run_cycle().await {
        CycleOutcome::Completed {
            session_id,
            action: ActionOutcome::Succeeded(report),
        } => {
            assert_eq!(session_id.to_string(), "pipeline-1");
            assert!(report.detail.starts_with("combine: "));
            assert!(report.detail.contains("upload: 1 file(s) accepted"));
        }
        other => panic!("expected a successful action, got {:?}", other),
    }

    // The handshake finished before the action ran.
    assert_eq!(peer.received().await, b"CONNOK");
    assert!(output.exists());
    mock.assert_async().await;
}

#[cfg(unix)]
#[tokio::test]
async fn command_sees_session_identifier() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("seen");

    let actions = vec![ActionConfig::Command {
        program: "sh".into(),
        args: vec![
            "-c".into(),
            format!("printf %s \"$PHOTOBOARD_SESSION_ID\" > '{}'", marker.display()),
        ],
        timeout_ms: 10_000,
    }];
    let action = build_action(&actions).unwrap().unwrap();

    action.run(&session()).await.unwrap();
    assert_eq!(std::fs::read_to_string(&marker).unwrap(), "c0ffee-0001");
}

#[test]
fn no_actions_configured_means_none() {
    assert!(build_action(&[]).unwrap().is_none());
}
