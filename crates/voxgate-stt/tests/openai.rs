use std::io::Write;

use wiremock::matchers::{body_string_contains, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use voxgate_stt::openai::OpenAiAdapter;
use voxgate_stt::{
    AudioPayload, NormalizedTranscript, ResponseDetail, SpeechToText, TranscriptionRequest,
};

fn request(bytes: &[u8], mime: Option<&str>, detail: ResponseDetail) -> TranscriptionRequest {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    let payload = AudioPayload::new(
        file.into_temp_path(),
        bytes.len() as u64,
        mime.map(ToOwned::to_owned),
        "audio",
    );
    TranscriptionRequest::new("fr", detail, payload)
}

fn adapter(server: &MockServer) -> OpenAiAdapter {
    OpenAiAdapter::new(
        reqwest::Client::new(),
        "sk-test",
        server.uri(),
        "whisper-1",
    )
}

#[tokio::test]
async fn plain_transcription_normalizes_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .and(header_exists("authorization"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"text": "  Bonjour le monde \n"})),
        )
        .mount(&server)
        .await;

    let req = request(b"ascii-audio-bytes", Some("audio/webm"), ResponseDetail::Text);
    let transcript = adapter(&server).transcribe(&req).await.unwrap();
    assert_eq!(transcript, NormalizedTranscript::plain("Bonjour le monde"));
}

#[tokio::test]
async fn outgoing_form_pins_language_and_temperature() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .and(body_string_contains("whisper-1"))
        .and(body_string_contains("name=\"language\""))
        .and(body_string_contains("name=\"temperature\""))
        .and(body_string_contains("filename=\"audio.webm\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"text": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let req = request(b"ascii-audio-bytes", None, ResponseDetail::Text);
    adapter(&server).transcribe(&req).await.unwrap();
}

#[tokio::test]
async fn generic_mime_falls_back_to_webm() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        // The declared octet-stream must not be forwarded; the fallback
        // container shows up both as part content type and filename.
        .and(body_string_contains("audio/webm"))
        .and(body_string_contains("filename=\"audio.webm\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"text": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let req = request(
        b"ascii-audio-bytes",
        Some("application/octet-stream"),
        ResponseDetail::Text,
    );
    adapter(&server).transcribe(&req).await.unwrap();
}

#[tokio::test]
async fn verbose_transcription_reports_language_and_confidence() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "text": "Bonjour le monde",
            "language": "french",
            "segments": [{"avg_logprob": 0.0}, {"avg_logprob": -0.69314718}]
        })))
        .mount(&server)
        .await;

    let req = request(b"ascii-audio-bytes", Some("audio/webm"), ResponseDetail::Verbose);
    let transcript = adapter(&server).transcribe(&req).await.unwrap();
    assert_eq!(transcript.text, "Bonjour le monde");
    assert_eq!(transcript.language.as_deref(), Some("french"));
    let confidence = transcript.confidence.unwrap();
    assert_eq!(confidence.len(), 2);
    assert!((confidence[0] - 1.0).abs() < 1e-6);
    assert!((confidence[1] - 0.5).abs() < 1e-3);
}

#[tokio::test]
async fn rejection_preserves_status_and_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {"message": "Unsupported file format", "code": "invalid_file"}
        })))
        .mount(&server)
        .await;

    let req = request(b"ascii-audio-bytes", Some("audio/webm"), ResponseDetail::Text);
    let err = adapter(&server).transcribe(&req).await.unwrap_err();
    assert_eq!(err.kind(), "provider_rejected");
    let detail = err.detail().unwrap();
    assert_eq!(detail["error"]["code"], "invalid_file");
}

#[tokio::test]
async fn unparseable_success_body_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let req = request(b"ascii-audio-bytes", Some("audio/webm"), ResponseDetail::Text);
    let err = adapter(&server).transcribe(&req).await.unwrap_err();
    assert_eq!(err.kind(), "provider_rejected");
}

#[tokio::test]
async fn unreachable_endpoint_is_unavailable() {
    let adapter = OpenAiAdapter::new(
        reqwest::Client::new(),
        "sk-test",
        "http://127.0.0.1:1",
        "whisper-1",
    );
    let req = request(b"ascii-audio-bytes", Some("audio/webm"), ResponseDetail::Text);
    let err = adapter.transcribe(&req).await.unwrap_err();
    assert_eq!(err.kind(), "provider_unavailable");
}

#[tokio::test]
#[ignore = "requires OPENAI_API_KEY env var and a real clip"]
async fn integration_whisper_roundtrip() {
    let api_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set");
    let clip = std::fs::read("testdata/bonjour.webm").expect("clip present");
    let adapter = OpenAiAdapter::new(
        reqwest::Client::new(),
        api_key,
        "https://api.openai.com/v1",
        "whisper-1",
    );
    let req = request(&clip, Some("audio/webm"), ResponseDetail::Text);
    let transcript = adapter.transcribe(&req).await.unwrap();
    assert!(!transcript.text.is_empty());
}
