use std::sync::Mutex;

use selfup_fetch::{Error, NoProgress, ReqwestClient, discover};
use selfup_verify::{AlgorithmMask, SecretKey, SignatureAlgorithm, SignatureError, TrustedSigner};
use selfup_version::Version;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MANIFEST: &str = r#"{
    "arguments": "/quiet",
    "uri": ["Setup.exe", "https://mirror.example.org/Setup.exe"],
    "version": "2.0.0",
    "changelog_uri": "changes.html",
    "hash-sha256": "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
}"#;

fn key() -> SecretKey { SecretKey::from_seed([7; 32], *b"selfup01") }

fn other_key() -> SecretKey { SecretKey::from_seed([9; 32], *b"selfup02") }

async fn serve(server: &MockServer, route: &str, status: u16, body: impl Into<Vec<u8>>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(body.into()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_discover_unsigned_resolves_relative_uris() {
    let server = MockServer::start().await;
    serve(&server, "/win/product.json", 200, MANIFEST).await;

    let client = ReqwestClient::new().unwrap();
    let url = format!("{}/win/product.json", server.uri());
    let package = discover(&client, &url, &[], &CancellationToken::new(), &NoProgress)
        .await
        .unwrap();

    assert_eq!(package.version(), Version::new(2, 0, 0, 0));
    assert_eq!(package.arguments(), "/quiet");
    assert_eq!(
        package.uris()[0].as_str(),
        format!("{}/win/Setup.exe", server.uri())
    );
    assert_eq!(package.uris()[1].as_str(), "https://mirror.example.org/Setup.exe");
    assert_eq!(
        package.changelog_uri().unwrap().as_str(),
        format!("{}/win/changes.html", server.uri())
    );
}

#[tokio::test]
async fn test_discover_reports_progress_checkpoints() {
    let server = MockServer::start().await;
    let signer = key();
    let sig = signer.sign(MANIFEST.as_bytes(), SignatureAlgorithm::Prehashed, "timestamp:1");
    serve(&server, "/product.json", 200, MANIFEST).await;
    serve(&server, "/product.json.minisig", 200, sig).await;

    let seen = Mutex::new(Vec::new());
    let sink = |v: f32| seen.lock().unwrap().push(v);
    let trusted = [TrustedSigner::new(signer.public_key(), AlgorithmMask::ANY)];

    let client = ReqwestClient::new().unwrap();
    discover(
        &client,
        &format!("{}/product.json", server.uri()),
        &trusted,
        &CancellationToken::new(),
        &sink,
    )
    .await
    .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![0.0, 0.4, 0.8, 1.0]);
}

#[tokio::test]
async fn test_discover_signed_by_trusted_key() {
    let server = MockServer::start().await;
    let signer = key();
    for (route, algorithm) in [
        ("/legacy.json", SignatureAlgorithm::Legacy),
        ("/prehashed.json", SignatureAlgorithm::Prehashed),
    ] {
        serve(&server, route, 200, MANIFEST).await;
        let sig = signer.sign(MANIFEST.as_bytes(), algorithm, "file:product.json");
        serve(&server, &format!("{route}.minisig"), 200, sig).await;
    }

    let client = ReqwestClient::new().unwrap();
    let trusted = [
        TrustedSigner::new(other_key().public_key(), AlgorithmMask::ANY),
        TrustedSigner::new(signer.public_key(), AlgorithmMask::ANY),
    ];
    for route in ["/legacy.json", "/prehashed.json"] {
        let url = format!("{}{route}", server.uri());
        let package = discover(&client, &url, &trusted, &CancellationToken::new(), &NoProgress)
            .await
            .unwrap();
        assert_eq!(package.version(), Version::new(2, 0, 0, 0));
    }
}

#[tokio::test]
async fn test_discover_rejects_algorithm_outside_mask() {
    let server = MockServer::start().await;
    let signer = key();
    serve(&server, "/product.json", 200, MANIFEST).await;
    let sig = signer.sign(MANIFEST.as_bytes(), SignatureAlgorithm::Legacy, "legacy");
    serve(&server, "/product.json.minisig", 200, sig).await;

    let client = ReqwestClient::new().unwrap();
    let trusted = [TrustedSigner::new(signer.public_key(), AlgorithmMask::PREHASHED)];
    let err = discover(
        &client,
        &format!("{}/product.json", server.uri()),
        &trusted,
        &CancellationToken::new(),
        &NoProgress,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        Error::Signature {
            source: SignatureError::AlgorithmNotTrusted { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_discover_rejects_untrusted_and_tampered() {
    let server = MockServer::start().await;
    let signer = key();
    let stranger = other_key();

    serve(&server, "/untrusted.json", 200, MANIFEST).await;
    let sig = stranger.sign(MANIFEST.as_bytes(), SignatureAlgorithm::Prehashed, "x");
    serve(&server, "/untrusted.json.minisig", 200, sig).await;

    let tampered = MANIFEST.replace("2.0.0", "9.0.0");
    serve(&server, "/tampered.json", 200, tampered).await;
    let sig = signer.sign(MANIFEST.as_bytes(), SignatureAlgorithm::Prehashed, "x");
    serve(&server, "/tampered.json.minisig", 200, sig).await;

    let client = ReqwestClient::new().unwrap();
    let trusted = [TrustedSigner::new(signer.public_key(), AlgorithmMask::ANY)];
    let cancel = CancellationToken::new();

    let err = discover(&client, &format!("{}/untrusted.json", server.uri()), &trusted, &cancel, &NoProgress)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Signature {
            source: SignatureError::UntrustedSigner { .. },
            ..
        }
    ));

    let err = discover(&client, &format!("{}/tampered.json", server.uri()), &trusted, &cancel, &NoProgress)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Signature {
            source: SignatureError::Invalid { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_discover_http_and_parse_failures() {
    let server = MockServer::start().await;
    serve(&server, "/missing-sig.json", 200, MANIFEST).await;
    serve(&server, "/broken.json", 200, "{ not json").await;

    let client = ReqwestClient::new().unwrap();
    let cancel = CancellationToken::new();

    let err = discover(&client, &format!("{}/nothing.json", server.uri()), &[], &cancel, &NoProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));

    let trusted = [TrustedSigner::new(key().public_key(), AlgorithmMask::ANY)];
    let err = discover(&client, &format!("{}/missing-sig.json", server.uri()), &trusted, &cancel, &NoProgress)
        .await
        .unwrap_err();
    match err {
        Error::HttpStatus { url, status } => {
            assert_eq!(status, 404);
            assert!(url.ends_with("/missing-sig.json.minisig"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = discover(&client, &format!("{}/broken.json", server.uri()), &[], &cancel, &NoProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Manifest { .. }));

    let err = discover(&client, "not a url", &[], &cancel, &NoProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidUrl { .. }));
}

#[tokio::test]
async fn test_discover_network_failure() {
    // Nothing listens on the discard port.
    let client = ReqwestClient::new().unwrap();
    let err = discover(&client, "http://127.0.0.1:9/product.json", &[], &CancellationToken::new(), &NoProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Network { .. }));
}

#[tokio::test]
async fn test_discover_cancelled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(MANIFEST)
                .set_delay(std::time::Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let client = ReqwestClient::new().unwrap();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let err = discover(&client, &format!("{}/slow.json", server.uri()), &[], &cancel, &NoProgress)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_discover_from_file_url() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("product.json"), MANIFEST).unwrap();
    let url = url::Url::from_file_path(dir.path().join("product.json")).unwrap();

    let client = ReqwestClient::new().unwrap();
    let cancel = CancellationToken::new();
    let package = discover(&client, url.as_str(), &[], &cancel, &NoProgress)
        .await
        .unwrap();
    assert_eq!(package.version(), Version::new(2, 0, 0, 0));
    assert!(package.uris()[0].as_str().starts_with("file://"));

    let missing = url::Url::from_file_path(dir.path().join("absent.json")).unwrap();
    let err = discover(&client, missing.as_str(), &[], &cancel, &NoProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
}
