//! Shared wiremock fixtures for the Proteus REST API.

#![allow(dead_code)]

use proteuscmd::{ProteusClient, Session};
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const TOKEN: &str = "BAMAuthToken: 3jYCMTU2MDY5Mjc";
pub const CONF_ID: i64 = 100;
pub const INTERN_ID: i64 = 201;
pub const EXTERN_ID: i64 = 202;

pub fn api(p: &str) -> String {
    format!("/Services/REST/v1/{p}")
}

pub fn entity(id: i64, name: &str, entity_type: &str, properties: &str) -> Value {
    json!({ "id": id, "name": name, "type": entity_type, "properties": properties })
}

pub async fn mount_login(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(api("login")))
        .and(query_param("username", "api"))
        .and(query_param("password", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(format!(
            "Session Token-> {TOKEN} <- for User : api"
        ))))
        .mount(server)
        .await;
}

pub async fn mount_logout(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(api("logout")))
        .and(header("Authorization", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("User api has been logged out")))
        .mount(server)
        .await;
}

/// `getEntitiesByName` answering `body` for (name, parentId, type).
pub async fn mount_by_name(server: &MockServer, name: &str, parent: i64, entity_type: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(api("getEntitiesByName")))
        .and(header("Authorization", TOKEN))
        .and(query_param("name", name))
        .and(query_param("parentId", parent.to_string()))
        .and(query_param("type", entity_type))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Configuration `default` plus both views.
pub async fn mount_views(server: &MockServer) {
    mount_by_name(server, "default", 0, "Configuration", json!([entity(CONF_ID, "default", "Configuration", "")])).await;
    mount_by_name(server, "intern", CONF_ID, "View", json!([entity(INTERN_ID, "intern", "View", "")])).await;
    mount_by_name(server, "extern", CONF_ID, "View", json!([entity(EXTERN_ID, "extern", "View", "")])).await;
}

pub fn client(server: &MockServer) -> ProteusClient {
    ProteusClient::new(server.uri(), "api", "secret", Vec::new()).unwrap()
}

pub async fn session(server: &MockServer) -> Session {
    mount_login(server).await;
    client(server).login().await.unwrap()
}

/// Requests the server saw for one API path, in arrival order.
pub async fn requests_to(server: &MockServer, p: &str) -> Vec<Request> {
    let wanted = api(p);
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == wanted)
        .collect()
}

pub fn query(request: &Request, key: &str) -> Option<String> {
    request
        .url
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
