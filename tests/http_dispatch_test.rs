use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use speechlab::{
    build_payload, dispatch, AudioBlob, HttpTransport, InputKind, ModelConfig, OutputType, RunError,
    RunState, Workbench,
};

const WAIT: Duration = Duration::from_secs(10);

/// Echo the raw multipart body back as plain text, with the request content type on the first line.
async fn echo(headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let mut out = content_type.into_bytes();
    out.push(b'\n');
    out.extend_from_slice(&body);
    ([(CONTENT_TYPE, "text/plain")], out)
}

async fn transcript() -> impl IntoResponse {
    Json(json!({ "text": "hello", "language": "en" }))
}

async fn speech() -> impl IntoResponse {
    ([(CONTENT_TYPE, "audio/wav")], vec![42u8; 2048])
}

async fn broken() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "model crashed")
}

async fn garbled() -> impl IntoResponse {
    ([(CONTENT_TYPE, "application/json")], "{\"text\": ")
}

/// Runs the stub on its own thread and runtime so the blocking client stays outside tokio.
fn spawn_stub() -> String {
    let (tx, rx) = std::sync::mpsc::channel::<SocketAddr>();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().expect("runtime");
        runtime.block_on(async move {
            let app = Router::new()
                .route("/echo", post(echo))
                .route("/transcribe", post(transcript))
                .route("/speak", post(speech))
                .route("/broken", post(broken))
                .route("/garbled", post(garbled));
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
            tx.send(listener.local_addr().expect("addr")).expect("send addr");
            axum::serve(listener, app).await.expect("serve");
        });
    });
    format!("http://{}", rx.recv().expect("stub address"))
}

fn filled_config(endpoint: &str) -> ModelConfig {
    let mut config = ModelConfig::new("TTS", endpoint, "prompt");
    config.inputs[0].set_text("read this aloud").unwrap();

    let voice = config.add_input();
    let field = config.input_mut(&voice).unwrap();
    field.name = "voice".to_string();
    field.set_kind(InputKind::Audio);
    field
        .set_audio(AudioBlob::new("voice.wav", "audio/wav", b"RIFFfakeWAVE".to_vec()))
        .unwrap();

    config.output_type = OutputType::Audio;
    config
}

#[test]
fn test_multipart_body_on_the_wire() {
    let base = spawn_stub();
    let transport = HttpTransport::new(None).unwrap();
    let config = filled_config(&format!("{}/echo", base));

    let output = dispatch(&transport, &config.endpoint, build_payload(&config).unwrap()).unwrap();
    let echoed = output.as_text().expect("echo returns text");

    assert!(echoed.starts_with("multipart/form-data; boundary="));
    assert!(echoed.contains("name=\"prompt\""));
    assert!(echoed.contains("read this aloud"));
    assert!(echoed.contains("name=\"voice\"; filename=\"voice.wav\""));
    assert!(echoed.contains("Content-Type: audio/wav"));
    assert!(echoed.contains("RIFFfakeWAVE"));
    assert!(echoed.contains("name=\"output_type\""));
    assert!(echoed.contains("\r\n\r\naudio\r\n"));
}

#[test]
fn test_json_transcript() {
    let base = spawn_stub();
    let transport = HttpTransport::new(Some(Duration::from_secs(5))).unwrap();
    let config = filled_config(&format!("{}/transcribe", base));

    let output = dispatch(&transport, &config.endpoint, build_payload(&config).unwrap()).unwrap();
    assert_eq!(output.as_text(), Some("hello"));
}

#[test]
fn test_audio_reply_is_playable_clip() {
    let base = spawn_stub();
    let transport = HttpTransport::new(None).unwrap();
    let config = filled_config(&format!("{}/speak", base));

    let output = dispatch(&transport, &config.endpoint, build_payload(&config).unwrap()).unwrap();
    let clip = output.as_audio().expect("audio output");
    assert_eq!(clip.len(), 2048);
    assert_eq!(std::fs::metadata(clip.path()).unwrap().len(), 2048);
}

#[test]
fn test_server_error_status() {
    let base = spawn_stub();
    let transport = HttpTransport::new(None).unwrap();
    let config = filled_config(&format!("{}/broken", base));

    let err = dispatch(&transport, &config.endpoint, build_payload(&config).unwrap()).unwrap_err();
    assert_eq!(
        err,
        RunError::HttpError { status: 500, reason: "Internal Server Error".to_string() }
    );
}

#[test]
fn test_malformed_json_reply() {
    let base = spawn_stub();
    let transport = HttpTransport::new(None).unwrap();
    let config = filled_config(&format!("{}/garbled", base));

    let err = dispatch(&transport, &config.endpoint, build_payload(&config).unwrap()).unwrap_err();
    assert!(matches!(err, RunError::ParseError(_)));
}

#[test]
fn test_connection_refused_is_network_error() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let transport = HttpTransport::new(Some(Duration::from_secs(2))).unwrap();
    let config = filled_config(&format!("http://127.0.0.1:{}/nothing", port));

    let err = dispatch(&transport, &config.endpoint, build_payload(&config).unwrap()).unwrap_err();
    assert!(matches!(err, RunError::NetworkError(_)));
}

#[test]
fn test_invalid_url_is_network_error() {
    let transport = HttpTransport::new(None).unwrap();
    let config = filled_config("not a url");

    let err = dispatch(&transport, &config.endpoint, build_payload(&config).unwrap()).unwrap_err();
    assert!(matches!(err, RunError::NetworkError(_)));
}

#[test]
fn test_workbench_against_live_endpoint() {
    let base = spawn_stub();
    let transport = Arc::new(HttpTransport::new(None).unwrap());
    let mut bench = Workbench::new(transport, &format!("{}/transcribe", base));

    let id = bench.models()[0].id.clone();
    let input_id = bench.models()[0].inputs[0].id.clone();
    bench.set_input_text(&id, &input_id, "hello there").unwrap();

    for _ in 0..3 {
        bench.run_model(&id).unwrap();
        assert!(bench.wait_idle(WAIT));
        assert_eq!(bench.state(&id), RunState::Succeeded);
        let output = bench.slot(&id).unwrap().result().unwrap().output().unwrap();
        assert_eq!(output.as_text(), Some("hello"));
    }

    bench.set_endpoint(&id, &format!("{}/broken", base)).unwrap();
    bench.run_model(&id).unwrap();
    assert!(bench.wait_idle(WAIT));
    assert_eq!(bench.state(&id), RunState::Failed);
    let message = bench.slot(&id).unwrap().result().unwrap().error().unwrap().to_string();
    assert!(message.contains("500"));
}
