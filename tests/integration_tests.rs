//! Integration tests using mock HTTP server
//!
//! Tests the full flow: config → token exchange → API requests with
//! pagination, refresh and rate-limit recovery

use serde_json::json;
use spotify_web_api::{
    AuthorizeOptions, ClientConfig, Error, Host, Outcome, RequestDescriptor, SpotifyClient,
};
use std::io::Write;
use std::time::{Duration, Instant};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::builder()
        .client("client-id", "client-secret")
        .base_url(server.uri())
        .build()
}

// ============================================================================
// Token Flow Integration Tests
// ============================================================================

#[tokio::test]
async fn test_authorization_code_flow_end_to_end() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=the-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "user-token",
            "token_type": "Bearer",
            "scope": "user-read-private",
            "expires_in": 3600,
            "refresh_token": "user-refresh"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("Authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "wizzler",
            "display_name": "JM Wizzler"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = SpotifyClient::new(config_for(&mock_server)).unwrap();

    let url = client
        .authorize_url(
            "http://localhost/cb",
            None,
            &AuthorizeOptions::new().scope(["user-read-private"]).state("s1"),
        )
        .await
        .unwrap();
    assert!(url.as_str().starts_with(&format!("{}/authorize?", mock_server.uri())));
    assert!(url.as_str().contains("state=s1"));

    let tokens = client
        .access_token_with_code("the-code", "http://localhost/cb")
        .await
        .unwrap();
    client.set_access_token(tokens.access_token.value).await;
    client
        .set_refresh_token(tokens.refresh_token.unwrap())
        .await;

    #[derive(serde::Deserialize)]
    struct Profile {
        id: String,
        display_name: String,
    }

    let profile: Profile = client
        .get_json(RequestDescriptor::get("/v1/me"))
        .await
        .unwrap();
    assert_eq!(profile.id, "wizzler");
    assert_eq!(profile.display_name, "JM Wizzler");
}

#[tokio::test]
async fn test_client_credentials_then_public_catalog() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "app-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/albums/4aawyAB9vmqN3uQ7FjRGTy"))
        .and(header("Authorization", "Bearer app-token"))
        .and(query_param("market", "SE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Global Warming"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = SpotifyClient::new(config_for(&mock_server)).unwrap();
    let token = client
        .access_token_with_credentials(None, None)
        .await
        .unwrap();
    client.set_access_token(token.value).await;

    let outcome = client
        .send(RequestDescriptor::get("/v1/albums/4aawyAB9vmqN3uQ7FjRGTy").query("market", "SE"))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Body(json!({"name": "Global Warming"})));
}

// ============================================================================
// Pagination Integration Tests
// ============================================================================

#[tokio::test]
async fn test_walk_all_pages() {
    let mock_server = MockServer::start().await;

    for (offset, ids) in [("0", vec!["a", "b"]), ("2", vec!["c", "d"]), ("4", vec!["e"])] {
        let items: Vec<_> = ids.iter().map(|id| json!({"id": id})).collect();
        Mock::given(method("GET"))
            .and(path("/v1/me/playlists"))
            .and(query_param("limit", "2"))
            .and(query_param("offset", offset))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": items,
                "limit": 2,
                "offset": offset.parse::<u32>().unwrap(),
                "total": 5
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let config = ClientConfig::builder()
        .access_token("token")
        .base_url(mock_server.uri())
        .build();
    let client = SpotifyClient::new(config).unwrap();
    client.set_pagination_limit(2);

    let mut collected = Vec::new();
    loop {
        let body = client
            .send(RequestDescriptor::get("/v1/me/playlists").paginated(true))
            .await
            .unwrap()
            .into_body()
            .unwrap();
        for item in body["items"].as_array().unwrap() {
            collected.push(item["id"].as_str().unwrap().to_string());
        }

        let next = u64::from(client.pagination().offset() + client.pagination().limit());
        if next >= client.pagination_total().unwrap() {
            break;
        }
        client.set_pagination_offset(next as i64);
    }

    assert_eq!(collected, vec!["a", "b", "c", "d", "e"]);
    assert_eq!(client.pagination_total(), Some(5));
}

#[tokio::test]
async fn test_clients_keep_separate_pagination() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/me/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [],
            "limit": 50,
            "offset": 0,
            "total": 300
        })))
        .mount(&mock_server)
        .await;

    let first = SpotifyClient::new(config_for(&mock_server)).unwrap();
    let second = SpotifyClient::new(config_for(&mock_server)).unwrap();

    first
        .send(RequestDescriptor::get("/v1/me/tracks").paginated(true))
        .await
        .unwrap();

    assert_eq!(first.pagination_total(), Some(300));
    assert_eq!(first.pagination().limit(), 50);
    assert_eq!(second.pagination_total(), None);
    assert_eq!(second.pagination().limit(), 20);
}

// ============================================================================
// Recovery Integration Tests
// ============================================================================

#[tokio::test]
async fn test_rate_limit_then_expiry_then_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/me/player"))
        .and(header("Authorization", "Bearer OLD"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/me/player"))
        .and(header("Authorization", "Bearer OLD"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"status": 401, "message": "The access token expired"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("refresh_token=RT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "NEW",
            "refresh_token": "RT2",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/me/player"))
        .and(header("Authorization", "Bearer NEW"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"is_playing": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ClientConfig::builder()
        .client("client-id", "client-secret")
        .access_token("OLD")
        .refresh_token("RT")
        .base_url(mock_server.uri())
        .build();
    let client = SpotifyClient::new(config).unwrap();

    let started = Instant::now();
    let outcome = client
        .send(RequestDescriptor::get("/v1/me/player"))
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(outcome.body(), Some(&json!({"is_playing": true})));
    assert_eq!(client.access_token().await.as_deref(), Some("NEW"));
    assert_eq!(client.refresh_token().await.as_deref(), Some("RT2"));
}

#[tokio::test]
async fn test_invalid_client_surfaces_hint() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "Invalid client secret"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = SpotifyClient::new(config_for(&mock_server)).unwrap();
    let err = client
        .access_token_with_credentials(None, Some("wrong"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidClient { .. }));
    assert!(err
        .to_string()
        .contains("Probably missing header Content-Type: application/x-www-form-urlencoded"));
}

#[tokio::test]
async fn test_return_new_token_mode() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"status": 401, "message": "The access token expired"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "NEW"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ClientConfig::builder()
        .client("client-id", "client-secret")
        .access_token("OLD")
        .refresh_token("RT")
        .base_url(mock_server.uri())
        .return_new_token_if_expired(true)
        .build();
    let client = SpotifyClient::new(config).unwrap();

    match client.send(RequestDescriptor::get("/v1/me")).await.unwrap() {
        Outcome::TokenRefreshed(token) => assert_eq!(token.value, "NEW"),
        other => panic!("Expected TokenRefreshed, got {other:?}"),
    }
}

// ============================================================================
// Config Integration Tests
// ============================================================================

#[tokio::test]
async fn test_client_from_config_file() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "from-file"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(file, "client_id: file-id").unwrap();
    writeln!(file, "client_secret: file-secret").unwrap();
    writeln!(file, "accounts_url: {}", mock_server.uri()).unwrap();
    writeln!(file, "max_rate_limit_retries: 1").unwrap();

    let config = ClientConfig::from_file(file.path()).unwrap();
    assert_eq!(config.executor_config().base_url(Host::Accounts), mock_server.uri());

    let client = SpotifyClient::new(config).unwrap();
    let token = client
        .access_token_with_credentials(None, None)
        .await
        .unwrap();
    assert_eq!(token.value, "from-file");
}
