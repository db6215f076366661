//! # Recognition Client Tests
//!
//! Exercises `CloudmersiveClient` against a local mock of the describe endpoint.

use std::io::Write;

use mockito::{Matcher, Server};
use photo_describer::config::RecognitionConfig;
use photo_describer::credentials::Credential;
use photo_describer::errors::RecognitionError;
use photo_describer::recognition::{CloudmersiveClient, ImageDescriber};
use tempfile::NamedTempFile;

fn client_for(server: &Server) -> CloudmersiveClient {
    let config = RecognitionConfig {
        base_url: server.url(),
        timeout_secs: 5,
    };
    CloudmersiveClient::new(Credential::new("test-api-key"), &config).unwrap()
}

fn fake_image() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"not really a jpeg").unwrap();
    file
}

#[tokio::test]
async fn test_describe_sends_key_and_multipart_image() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/image/recognize/describe")
        .match_header("apikey", "test-api-key")
        .match_header("content-type", Matcher::Regex("^multipart/form-data".to_string()))
        .match_body(Matcher::Regex(r#"name="imageFile""#.to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"Successful":true,"Highconfidence":true,
                "BestOutcome":{"ConfidenceScore":0.93,"Description":"a dog running"}}"#,
        )
        .create_async()
        .await;

    let image = fake_image();
    let description = client_for(&server).describe(image.path()).await.unwrap();

    mock.assert_async().await;
    assert!(description.successful);
    assert!(description.high_confidence);
    assert_eq!(description.best_description, "a dog running");
    assert_eq!(description.confidence_score, Some(0.93));
}

#[tokio::test]
async fn test_unsuccessful_response_is_not_an_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/image/recognize/describe")
        .with_status(200)
        .with_body(r#"{"Successful":false,"Highconfidence":false}"#)
        .create_async()
        .await;

    let image = fake_image();
    let description = client_for(&server).describe(image.path()).await.unwrap();

    assert!(!description.successful);
    assert!(description.best_description.is_empty());
}

#[tokio::test]
async fn test_api_error_status_is_typed() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/image/recognize/describe")
        .with_status(401)
        .with_body("Invalid API key")
        .create_async()
        .await;

    let image = fake_image();
    let err = client_for(&server).describe(image.path()).await.unwrap_err();

    match err {
        RecognitionError::Api { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid API key");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_typed() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/image/recognize/describe")
        .with_status(200)
        .with_body("<html>gateway</html>")
        .create_async()
        .await;

    let image = fake_image();
    let err = client_for(&server).describe(image.path()).await.unwrap_err();

    assert!(matches!(err, RecognitionError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_missing_image_file_fails_before_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/image/recognize/describe")
        .expect(0)
        .create_async()
        .await;

    let err = client_for(&server)
        .describe(std::path::Path::new("/non/existent/photo.jpg"))
        .await
        .unwrap_err();

    assert!(matches!(err, RecognitionError::Io(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_api_is_transport_error() {
    let config = RecognitionConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        timeout_secs: 2,
    };
    let client = CloudmersiveClient::new(Credential::new("key"), &config).unwrap();
    let image = fake_image();

    let err = client.describe(image.path()).await.unwrap_err();

    assert!(matches!(
        err,
        RecognitionError::Transport(_) | RecognitionError::Timeout(_)
    ));
}
