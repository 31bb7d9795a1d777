use std::io::Write;

use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use voxgate_stt::watson::WatsonAdapter;
use voxgate_stt::{AudioPayload, ResponseDetail, SpeechToText, TranscriptionRequest};

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

fn adapter(server: &MockServer) -> WatsonAdapter {
    WatsonAdapter::new(
        reqwest::Client::new(),
        "watson-key",
        server.uri(),
        "fr-FR_BroadbandModel",
    )
}

#[tokio::test]
async fn recognize_joins_alternatives() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/recognize"))
        .and(query_param("model", "fr-FR_BroadbandModel"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result_index": 0,
            "results": [
                {"final": true, "alternatives": [{"transcript": "bonjour ", "confidence": 0.94}]},
                {"final": true, "alternatives": [{"transcript": "le monde ", "confidence": 0.87}]}
            ]
        })))
        .mount(&server)
        .await;

    let req = request(b"ascii-audio-bytes", Some("audio/webm"), ResponseDetail::Verbose);
    let transcript = adapter(&server).transcribe(&req).await.unwrap();
    assert_eq!(transcript.text, "bonjour le monde");
    assert_eq!(transcript.confidence.as_deref(), Some(&[0.94, 0.87][..]));
    assert!(transcript.language.is_none());
}

#[tokio::test]
async fn plain_detail_omits_confidence() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/recognize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [{"alternatives": [{"transcript": "bonjour", "confidence": 0.9}]}]
        })))
        .mount(&server)
        .await;

    let req = request(b"ascii-audio-bytes", Some("audio/webm"), ResponseDetail::Text);
    let transcript = adapter(&server).transcribe(&req).await.unwrap();
    assert_eq!(transcript.text, "bonjour");
    assert!(transcript.confidence.is_none());
}

#[tokio::test]
async fn tuning_parameters_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/recognize"))
        .and(query_param("background_audio_suppression", "0.7"))
        .and(query_param("max_alternatives", "3"))
        .and(query_param("smart_formatting", "true"))
        .and(header("content-type", "audio/ogg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter(&server)
        .with_background_audio_suppression(0.7)
        .with_max_alternatives(3);
    let req = request(b"ascii-audio-bytes", Some("audio/ogg"), ResponseDetail::Text);
    adapter.transcribe(&req).await.unwrap();
}

#[tokio::test]
async fn empty_results_yield_empty_transcript() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/recognize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})))
        .mount(&server)
        .await;

    let req = request(b"ascii-audio-bytes", Some("audio/webm"), ResponseDetail::Text);
    let transcript = adapter(&server).transcribe(&req).await.unwrap();
    assert!(transcript.text.is_empty());
}

#[tokio::test]
async fn rejection_preserves_status_and_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/recognize"))
        .respond_with(ResponseTemplate::new(415).set_body_json(serde_json::json!({
            "error": "unable to transcode data stream audio/webm -> audio/l16",
            "code": 415,
            "code_description": "Unsupported Media Type"
        })))
        .mount(&server)
        .await;

    let req = request(b"ascii-audio-bytes", Some("audio/webm"), ResponseDetail::Text);
    let err = adapter(&server).transcribe(&req).await.unwrap_err();
    assert_eq!(err.kind(), "provider_rejected");
    assert_eq!(err.detail().unwrap()["code"], 415);
    assert!(err.to_string().contains("415"));
}

#[tokio::test]
async fn unreachable_endpoint_is_unavailable() {
    let adapter = WatsonAdapter::new(
        reqwest::Client::new(),
        "watson-key",
        "http://127.0.0.1:1",
        "fr-FR_BroadbandModel",
    );
    let req = request(b"ascii-audio-bytes", Some("audio/webm"), ResponseDetail::Text);
    let err = adapter.transcribe(&req).await.unwrap_err();
    assert_eq!(err.kind(), "provider_unavailable");
}
