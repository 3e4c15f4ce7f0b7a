//! Host bridge tests
//!
//! These drive `HostServer` with JSON-RPC messages, the way a plugin host
//! would, against a mocked Gmail API.

mod common;

use std::sync::Arc;

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use terraform_provider_gmail::host::HostServer;
use terraform_provider_gmail::GmailProvider;

const FILTERS_PATH: &str = "/gmail/v1/users/me/settings/filters";

/// Helper to create a JSON-RPC request
fn make_request(id: i64, method: &str, params: Option<Value>) -> String {
    let mut request = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
    });
    if let Some(p) = params {
        request["params"] = p;
    }
    request.to_string()
}

/// Send one request and return the response as JSON
async fn call(server: &HostServer, id: i64, method: &str, params: Option<Value>) -> Value {
    let response = server
        .handle_message(&make_request(id, method, params))
        .await
        .expect("request should get a response");
    serde_json::to_value(response).unwrap()
}

fn host_for(mock: &MockServer) -> HostServer {
    let provider = GmailProvider::new().with_api_base_url(format!("{}/gmail/v1", mock.uri()));
    HostServer::new(Arc::new(provider))
}

async fn configured_host(mock: &MockServer) -> HostServer {
    let host = host_for(mock);
    let response = call(
        &host,
        1,
        "provider/configure",
        Some(json!({
            "client": common::client_json(&format!("{}/token", mock.uri())),
            "token": common::valid_token_json("test-access"),
        })),
    )
    .await;
    assert!(response["error"].is_null(), "configure failed: {}", response);
    host
}

fn remote_filter(id: &str) -> Value {
    json!({
        "id": id,
        "criteria": {"from": "foo@example.com"},
        "action": {"removeLabelIds": ["INBOX"]}
    })
}

fn filter_config() -> Value {
    json!({
        "criteria": {"from": "foo@example.com"},
        "action": {"remove_label_ids": ["INBOX"]}
    })
}

mod provider_method_tests {
    use super::*;

    #[tokio::test]
    async fn test_schema() {
        let host = HostServer::new(Arc::new(GmailProvider::new()));
        let response = call(&host, 1, "provider/schema", None).await;

        let result = &response["result"];
        assert!(result["resources"]["gmail_filter"].is_object());
        assert!(result["provider"].is_object());
    }

    #[tokio::test]
    async fn test_configure_with_malformed_token() {
        let mock = MockServer::start().await;
        let host = host_for(&mock);

        let response = call(
            &host,
            1,
            "provider/configure",
            Some(json!({
                "client": common::client_json("https://oauth2.googleapis.com/token"),
                "token": "{ not json",
            })),
        )
        .await;

        assert_eq!(response["error"]["data"]["kind"], "configuration");
    }

    #[tokio::test]
    async fn test_plan_reports_replacement() {
        let host = HostServer::new(Arc::new(GmailProvider::new()));
        let response = call(
            &host,
            1,
            "resource/plan",
            Some(json!({
                "type_name": "gmail_filter",
                "prior_state": {
                    "id": "ANe1Bm0",
                    "criteria": {"from": "foo@example.com", "exclude_chats": true},
                    "action": {"remove_label_ids": ["INBOX"]}
                },
                "config": {
                    "criteria": {"from": "bar@example.com"},
                    "action": {"remove_label_ids": ["INBOX"]}
                }
            })),
        )
        .await;

        let result = &response["result"];
        assert_eq!(result["requires_replace"], json!(["criteria.0.from"]));
        assert_eq!(result["planned_state"]["criteria"]["exclude_chats"], true);
    }

    #[tokio::test]
    async fn test_plan_rejects_empty_string() {
        let host = HostServer::new(Arc::new(GmailProvider::new()));
        let response = call(
            &host,
            1,
            "resource/plan",
            Some(json!({
                "type_name": "gmail_filter",
                "config": {"criteria": {"subject": ""}, "action": {}}
            })),
        )
        .await;

        assert_eq!(response["error"]["data"]["kind"], "validation");
    }
}

mod resource_method_tests {
    use super::*;

    #[tokio::test]
    async fn test_create() {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(FILTERS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(remote_filter("ANe1Bm0")))
            .expect(1)
            .mount(&mock)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{}/ANe1Bm0", FILTERS_PATH)))
            .respond_with(ResponseTemplate::new(200).set_body_json(remote_filter("ANe1Bm0")))
            .mount(&mock)
            .await;

        let host = configured_host(&mock).await;
        let response = call(
            &host,
            2,
            "resource/create",
            Some(json!({
                "type_name": "gmail_filter",
                "config": filter_config(),
                "timeout_secs": 30
            })),
        )
        .await;

        let state = &response["result"]["new_state"];
        assert_eq!(state["id"], "ANe1Bm0");
        assert_eq!(state["criteria"]["from"], "foo@example.com");
        assert_eq!(state["action"]["remove_label_ids"], json!(["INBOX"]));
    }

    #[tokio::test]
    async fn test_read_gone_filter() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/ANe1Bm0", FILTERS_PATH)))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock)
            .await;

        let host = configured_host(&mock).await;
        let response = call(
            &host,
            2,
            "resource/read",
            Some(json!({"type_name": "gmail_filter", "id": "ANe1Bm0"})),
        )
        .await;

        assert!(response["error"].is_null());
        assert!(response["result"]["new_state"].is_null());
    }

    #[tokio::test]
    async fn test_delete_and_import() {
        let mock = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(format!("{}/ANe1Bm0", FILTERS_PATH)))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{}/ANe1Bm1", FILTERS_PATH)))
            .respond_with(ResponseTemplate::new(200).set_body_json(remote_filter("ANe1Bm1")))
            .mount(&mock)
            .await;

        let host = configured_host(&mock).await;

        let deleted = call(
            &host,
            2,
            "resource/delete",
            Some(json!({"type_name": "gmail_filter", "id": "ANe1Bm0"})),
        )
        .await;
        assert_eq!(deleted["result"], json!({}));

        let imported = call(
            &host,
            3,
            "resource/import",
            Some(json!({"type_name": "gmail_filter", "id": "ANe1Bm1"})),
        )
        .await;
        assert_eq!(imported["result"]["imported_state"]["id"], "ANe1Bm1");
    }

    #[tokio::test]
    async fn test_remote_error_kind() {
        let mock = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(format!("{}/gone", FILTERS_PATH)))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock)
            .await;

        let host = configured_host(&mock).await;
        let response = call(
            &host,
            2,
            "resource/delete",
            Some(json!({"type_name": "gmail_filter", "id": "gone"})),
        )
        .await;

        assert_eq!(response["error"]["code"], -32000);
        assert_eq!(response["error"]["data"]["kind"], "remote");
    }
}

mod stream_tests {
    use super::*;

    #[tokio::test]
    async fn test_serve_session() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/ANe1Bm0", FILTERS_PATH)))
            .respond_with(ResponseTemplate::new(200).set_body_json(remote_filter("ANe1Bm0")))
            .mount(&mock)
            .await;

        let configure = make_request(
            1,
            "provider/configure",
            Some(json!({
                "client": common::client_json(&format!("{}/token", mock.uri())),
                "token": common::valid_token_json("test-access"),
            })),
        );
        let read = make_request(
            2,
            "resource/read",
            Some(json!({"type_name": "gmail_filter", "id": "ANe1Bm0"})),
        );
        let input = format!("{}\n{}\n", configure, read);

        let mut output = Vec::new();
        host_for(&mock)
            .serve(input.as_bytes(), &mut output)
            .await
            .unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["result"]["new_state"]["criteria"]["from"], "foo@example.com");
    }
}
