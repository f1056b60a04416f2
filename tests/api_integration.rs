use imagify_api::{Client, Error, Level, OptimizeOptions, PartnerHook, ProbeCache, Resize};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::{
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

fn client_for(server: &ServerGuard) -> Client {
    Client::builder()
        .api_key("stored-key")
        .base_url(server.url())
        .build()
        .expect("client should build against the mock server")
}

#[test]
fn test_plan_prices_returns_body_unchanged() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/pricing/plan")
        .match_header("authorization", "token stored-key")
        .match_header("accept", "application/json")
        .with_status(200)
        .with_body(r#"{"basic":9.99,"premium":19.99}"#)
        .create();

    let prices = client_for(&server).plan_prices().unwrap();

    mock.assert();
    assert_eq!(prices, json!({"basic": 9.99, "premium": 19.99}));
}

#[test]
fn test_key_status_authenticates_with_candidate_key() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/status")
        .match_header("authorization", "token candidate-key")
        .with_status(200)
        .with_body(r#"{"unconsumed_quota":42}"#)
        .create();

    // The configured key differs from the candidate on purpose.
    let status = client_for(&server).key_status("candidate-key").unwrap();

    mock.assert();
    assert_eq!(status["unconsumed_quota"], 42);
}

#[test]
fn test_user_authenticates_with_stored_key() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/users/me")
        .match_header("authorization", "token stored-key")
        .with_status(200)
        .with_body(r#"{"id":7,"plan":"free"}"#)
        .create();

    let user = client_for(&server).user().unwrap();

    mock.assert();
    assert_eq!(user["id"], 7);
}

#[test]
fn test_fetch_image_sends_a_single_json_body() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/fetch")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "url": "https://example.com/cat.png",
            "aggressive": true,
            "ultra": false,
            "resize": {},
            "keep_exif": false,
        })))
        .with_status(200)
        .with_body(r#"{"success":true}"#)
        .create();

    let result = client_for(&server)
        .fetch_image("https://example.com/cat.png", &OptimizeOptions::default())
        .unwrap();

    mock.assert();
    assert_eq!(result["success"], true);
}

#[test]
fn test_upload_image_sends_multipart_with_json_data_part() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/upload")
        .match_header("authorization", "token stored-key")
        .match_header("content-type", Matcher::Regex("^multipart/form-data".to_owned()))
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="image"; filename="cat\.png""#.to_owned()),
            Matcher::Regex(r#"name="data""#.to_owned()),
            // Everything that is not the file rides in one JSON-encoded part.
            Matcher::Regex(
                r#"\{"aggressive":false,"keep_exif":true,"resize":\{"width":800\},"ultra":true\}"#
                    .to_owned(),
            ),
        ]))
        .with_status(200)
        .with_body(r#"{"success":true,"image":"https://storage.imagify.io/cat.png"}"#)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("cat.png");
    std::fs::write(&image, b"pretend this is a png").unwrap();

    let options = OptimizeOptions {
        level: Level::Ultra,
        keep_exif: true,
        resize: Some(Resize {
            width: Some(800),
            ..Default::default()
        }),
        ..Default::default()
    };
    let result = client_for(&server).upload_image(&image, &options).unwrap();

    mock.assert();
    assert_eq!(result["success"], true);
}

#[test]
fn test_upload_with_missing_file_never_hits_the_network() {
    let mut server = Server::new();
    let mock = server.mock("POST", "/upload").expect(0).create();

    let err = client_for(&server)
        .upload_image(Path::new("/definitely/not/here.png"), &OptimizeOptions::default())
        .unwrap_err();

    mock.assert();
    assert!(matches!(err, Error::ImageFile(_)));
}

#[test]
fn test_structured_server_error_is_surfaced_verbatim() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/users/me")
        .with_status(401)
        .with_body(r#"{"code":401,"detail":"Invalid API key"}"#)
        .create();

    let err = client_for(&server).user().unwrap_err();
    match err {
        Error::Api { code, detail } => {
            assert_eq!(code, 401);
            assert_eq!(detail, "Invalid API key");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[test]
fn test_oversized_upload_maps_to_fixed_message() {
    let mut server = Server::new();
    let _mock = server
        .mock("POST", "/upload")
        .with_status(413)
        .with_body("")
        .create();

    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("huge.png");
    std::fs::write(&image, vec![0u8; 1024]).unwrap();

    let err = client_for(&server)
        .upload_image(&image, &OptimizeOptions::default())
        .unwrap_err();

    assert!(matches!(err, Error::PayloadTooLarge));
    assert_eq!(err.code(), Some(413));
}

#[test]
fn test_update_user_puts_json_to_users_me() {
    let mut server = Server::new();
    let mock = server
        .mock("PUT", "/users/me")
        .match_body(Matcher::Json(json!({"plan_id": 3})))
        .with_status(200)
        .with_body(r#"{"plan_id":3}"#)
        .create();

    let updated = client_for(&server).update_user(&json!({"plan_id": 3})).unwrap();

    mock.assert();
    assert_eq!(updated["plan_id"], 3);
}

#[test]
fn test_coupon_code_lands_in_the_path() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/coupons/IMAGIFY20")
        .with_status(200)
        .with_body(r#"{"valid":true,"discount":20}"#)
        .create();

    let coupon = client_for(&server).check_coupon("IMAGIFY20").unwrap();

    mock.assert();
    assert_eq!(coupon["valid"], true);
}

#[derive(Clone)]
struct StoredPartner {
    cleared: Arc<AtomicBool>,
}

impl PartnerHook for StoredPartner {
    fn code(&self) -> Option<String> {
        Some("wprocket".to_owned())
    }

    fn clear(&self) {
        self.cleared.store(true, Ordering::SeqCst);
    }
}

#[test]
fn test_create_user_merges_plugin_fields_and_clears_partner() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/users")
        .match_body(Matcher::Json(json!({
            "email": "user@example.com",
            "from_plugin": true,
            "partner": "wprocket",
        })))
        .with_status(200)
        .with_body(r#"{"id":1,"email":"user@example.com"}"#)
        .create();

    let cleared = Arc::new(AtomicBool::new(false));
    let client = Client::builder()
        .api_key("stored-key")
        .base_url(server.url())
        .partner(StoredPartner {
            cleared: cleared.clone(),
        })
        .build()
        .unwrap();

    let user = client.create_user(&json!({"email": "user@example.com"})).unwrap();

    mock.assert();
    assert_eq!(user["id"], 1);
    assert!(cleared.load(Ordering::SeqCst));
}

#[test]
fn test_failed_create_user_keeps_the_partner_code() {
    let mut server = Server::new();
    let _mock = server
        .mock("POST", "/users")
        .with_status(400)
        .with_body(r#"{"code":400,"detail":"email already registered"}"#)
        .create();

    let cleared = Arc::new(AtomicBool::new(false));
    let client = Client::builder()
        .api_key("stored-key")
        .base_url(server.url())
        .partner(StoredPartner {
            cleared: cleared.clone(),
        })
        .build()
        .unwrap();

    let err = client.create_user(&json!({"email": "user@example.com"})).unwrap_err();

    assert!(matches!(err, Error::Api { code: 400, .. }));
    assert!(!cleared.load(Ordering::SeqCst));
}

#[test]
fn test_probe_cache_requests_each_probe_once() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/version")
        .with_status(200)
        .with_body(r#"{"version":"1.1.9"}"#)
        .expect(1)
        .create();

    let client = client_for(&server);
    let mut cache = ProbeCache::new();

    let first = cache.api_version(&client).unwrap();
    let second = cache.api_version(&client).unwrap();

    mock.assert();
    assert_eq!(first, second);
}

#[test]
fn test_probe_cache_keys_statuses_by_candidate() {
    let mut server = Server::new();
    let good = server
        .mock("GET", "/status")
        .match_header("authorization", "token good-key")
        .with_status(200)
        .with_body(r#"{"valid":true}"#)
        .expect(1)
        .create();
    let better = server
        .mock("GET", "/status")
        .match_header("authorization", "token better-key")
        .with_status(200)
        .with_body(r#"{"valid":true,"plan":"growth"}"#)
        .expect(1)
        .create();

    let client = client_for(&server);
    let mut cache = ProbeCache::new();

    cache.key_status(&client, "good-key").unwrap();
    cache.key_status(&client, "better-key").unwrap();
    // Both served from memory now.
    cache.key_status(&client, "good-key").unwrap();
    cache.key_status(&client, "better-key").unwrap();

    good.assert();
    better.assert();
}

#[test]
fn test_probe_cache_does_not_remember_failures() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/version")
        .with_status(500)
        .with_body("")
        .expect(2)
        .create();

    let client = client_for(&server);
    let mut cache = ProbeCache::new();

    assert!(cache.api_version(&client).is_err());
    assert!(cache.api_version(&client).is_err());

    mock.assert();
}
