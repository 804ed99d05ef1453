mod common;

use std::io::Write;

use common::*;
use proteuscmd::ProteusError;
use proteuscmd::config::ProteusConfig;
use proteuscmd::mapping::map_v4_to_v6;
use proteuscmd::proteus::ProteusClient;
use serde_json::json;
use wiremock::MockServer;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn load_reads_every_key() {
    let file = write_config(
        r#"{
            "user": "api",
            "password": "secret",
            "url": "https://proteus.example.com",
            "replace": {"uos.de": "uni-osnabrueck.de"},
            "v4_v6_map": [{"cidr": "192.0.2.0/24", "prefix": "2001:db8:0:2::"}]
        }"#,
    );

    let config = ProteusConfig::load(file.path()).unwrap();
    assert_eq!(config.user, "api");
    assert_eq!(config.url, "https://proteus.example.com");
    assert_eq!(
        config.replacements(),
        [("uos.de".to_string(), "uni-osnabrueck.de".to_string())]
    );
    assert_eq!(
        map_v4_to_v6("192.0.2.1".parse().unwrap(), &config.v4_v6_map),
        Some("2001:db8:0:2::1".parse().unwrap())
    );
}

#[test]
fn missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ProteusConfig::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ProteusError::Config(_)));
}

#[test]
fn invalid_json_is_config_error() {
    let file = write_config("{ not json");
    let err = ProteusConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ProteusError::Config(_)));
}

#[tokio::test]
async fn client_from_config_logs_in_with_command_password() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let config = ProteusConfig::from_json(
        &json!({
            "user": "api",
            "password_cmd": ["printf", "secret"],
            "url": server.uri(),
        })
        .to_string(),
    )
    .unwrap();

    let client = ProteusClient::from_config(&config).await.unwrap();
    let session = client.login().await.unwrap();
    assert_eq!(session.token(), TOKEN);
}

#[tokio::test]
async fn replacements_from_config_reach_the_zone_walk() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_by_name(&server, "de", EXTERN_ID, "Zone", json!([])).await;

    let config = ProteusConfig::from_json(
        &json!({
            "user": "api",
            "password": "secret",
            "url": server.uri(),
            "replace": {"example.org": "example.de"},
        })
        .to_string(),
    )
    .unwrap();
    let session = ProteusClient::from_config(&config)
        .await
        .unwrap()
        .login()
        .await
        .unwrap();

    let err = session.get_record(EXTERN_ID, "app.example.org").await.unwrap_err();
    match err {
        ProteusError::NotFound(msg) => assert!(msg.contains("de → example"), "{msg}"),
        other => panic!("expected not found, got {other:?}"),
    }
}
