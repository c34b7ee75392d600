
use egress_types::prelude::{AuditReceipt, FragmentList, UsageOverlay};
use harness::ProxyProcess;
use reqwest::Client;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn seeded_config(gateway_url: Option<&str>) -> String {
    let upstream = match gateway_url {
        Some(url) => format!("[upstream]\ngateway_url = \"{url}\"\n"),
        None => String::new(),
    };
    format!(
        r#"
{upstream}
[[orgs]]
id = "org-1"
org_key = "ORG_A"
name = "Org A"
"#
    )
}

async fn mount_happy_upstream(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/consent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "consent-e2e"})))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/llm/chat"))
        .and(header("X-Org-Key", "ORG_A"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"final_output": "proxied answer"})),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn chat_round_trip_through_upstream_gateway() {
    let upstream = MockServer::start().await;
    mount_happy_upstream(&upstream).await;
    let proxy = ProxyProcess::spawn_with_config(&seeded_config(Some(&upstream.uri()))).await;

    let response = Client::new()
        .post(format!("{}/osdk/chat", proxy.base_url))
        .header("X-Org-Key", "ORG_A")
        .json(&json!({
            "policyKey": "health_pii_phi",
            "messages": [{"role": "user", "content": "summarize my intake"}],
        }))
        .send()
        .await
        .expect("chat response");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["content"], "proxied answer");
    assert_eq!(body["meta"]["purpose"], "health.intake");
    assert_eq!(body["meta"]["consent_id"], "consent-e2e");
    assert!(body["meta"]["session"]
        .as_str()
        .unwrap()
        .starts_with("sess-"));
}

#[tokio::test]
async fn chat_rejects_unknown_org_key() {
    let upstream = MockServer::start().await;
    let proxy = ProxyProcess::spawn_with_config(&seeded_config(Some(&upstream.uri()))).await;

    let response = Client::new()
        .post(format!("{}/osdk/chat", proxy.base_url))
        .header("X-Org-Key", "NOT_A_KEY")
        .json(&json!({
            "policyKey": "health_pii_phi",
            "messages": [{"role": "user", "content": "hi"}],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "invalid_org_key");
    assert!(upstream.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_chat_body_is_a_bad_request() {
    let proxy = ProxyProcess::spawn_with_config(&seeded_config(None)).await;

    let response = Client::new()
        .post(format!("{}/osdk/chat", proxy.base_url))
        .header("X-Org-Key", "ORG_A")
        .json(&json!({"messages": "not-an-array"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn stub_mode_answers_without_gateway() {
    let proxy = ProxyProcess::spawn_with_config(&seeded_config(None)).await;

    let response = Client::new()
        .post(format!("{}/osdk/chat", proxy.base_url))
        .header("X-Org-Key", "ORG_A")
        .json(&json!({
            "policyKey": "mystery",
            "messages": [{"role": "user", "content": "hi"}],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body["content"]
        .as_str()
        .unwrap()
        .starts_with("Stubbed response"));
    assert_eq!(body["meta"]["stub"], true);
    assert_eq!(body["meta"]["purpose"], "notes.summarization");
}

#[tokio::test]
async fn missing_fragments_read_as_empty_list() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/audit/fragments"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&upstream)
        .await;
    let proxy = ProxyProcess::spawn_with_config(&seeded_config(Some(&upstream.uri()))).await;

    let response = Client::new()
        .get(format!(
            "{}/osdk/fragments?session_id=sess-x",
            proxy.base_url
        ))
        .header("X-Org-Key", "ORG_A")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: FragmentList = response.json().await.unwrap();
    assert!(body.fragments.is_empty());
}

#[tokio::test]
async fn audit_routes_require_session_id() {
    let upstream = MockServer::start().await;
    // The 400 fires whether or not a gateway upstream is configured.
    for config in [
        seeded_config(Some(&upstream.uri())),
        seeded_config(None),
    ] {
        let proxy = ProxyProcess::spawn_with_config(&config).await;

        let response = Client::new()
            .get(format!("{}/osdk/overlay", proxy.base_url))
            .header("X-Org-Key", "ORG_A")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "bad_request");
    }
}

#[tokio::test]
async fn overlay_passes_upstream_body_through() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/demo/overlay"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"tokens_in": 42, "cost_usd": 0.002})),
        )
        .mount(&upstream)
        .await;
    let proxy = ProxyProcess::spawn_with_config(&seeded_config(Some(&upstream.uri()))).await;

    let response = Client::new()
        .get(format!(
            "{}/osdk/overlay?session_id=sess-x",
            proxy.base_url
        ))
        .header("X-Org-Key", "ORG_A")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: UsageOverlay = response.json().await.unwrap();
    assert_eq!(body.tokens_in, 42);
    assert!(body.cost_usd > 0.0);
}

#[tokio::test]
async fn receipt_parses_into_the_published_model() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/audit/report"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"purpose": "health.intake", "consent_id": "consent-9", "org_key": "ORG_A"},
            "prefilter": {"sanitized": {"messages": [{"role": "user", "content": "[REDACTED]"}]}},
        })))
        .mount(&upstream)
        .await;
    let proxy = ProxyProcess::spawn_with_config(&seeded_config(Some(&upstream.uri()))).await;

    let receipt: AuditReceipt = Client::new()
        .get(format!(
            "{}/osdk/receipt?session_id=sess-x",
            proxy.base_url
        ))
        .header("X-Org-Key", "ORG_A")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(receipt.meta.purpose, "health.intake");
    assert_eq!(receipt.prefilter.sanitized.messages.len(), 1);
}

#[tokio::test]
async fn consent_api_requires_explicit_header() {
    let proxy = ProxyProcess::spawn_with_config(&seeded_config(None)).await;

    let response = Client::new()
        .post(format!("{}/api/consents", proxy.base_url))
        .json(&json!({"subject_id": "alice", "purpose": "health.intake"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "missing_org_key");
}

#[tokio::test]
async fn consent_revocation_is_idempotent() {
    let proxy = ProxyProcess::spawn_with_config(&seeded_config(None)).await;
    let client = Client::new();

    let created: Value = client
        .post(format!("{}/api/consents", proxy.base_url))
        .header("X-Org-Key", "ORG_A")
        .json(&json!({"subject_id": "alice", "purpose": "health.intake"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().expect("consent id");

    for _ in 0..2 {
        let response = client
            .post(format!("{}/api/consents/{id}/revoke", proxy.base_url))
            .header("X-Org-Key", "ORG_A")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }
}

#[tokio::test]
async fn context_crud_round_trip() {
    let proxy = ProxyProcess::spawn_with_config(&seeded_config(None)).await;
    let client = Client::new();

    let created: Value = client
        .post(format!("{}/api/contexts", proxy.base_url))
        .header("X-Org-Key", "ORG_A")
        .json(&json!({
            "subject_id": "alice",
            "label": "intake",
            "json": {"notes": "allergy history"},
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().expect("context id");

    let fetched: Value = client
        .get(format!("{}/api/contexts/{id}", proxy.base_url))
        .header("X-Org-Key", "ORG_A")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["json"]["notes"], "allergy history");

    let latest: Value = client
        .get(format!(
            "{}/api/contexts/by-subject/alice/latest",
            proxy.base_url
        ))
        .header("X-Org-Key", "ORG_A")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(latest["id"].as_str(), Some(id));

    // A subject with no contexts answers 200 null, not an error.
    let none = client
        .get(format!(
            "{}/api/contexts/by-subject/carol/latest",
            proxy.base_url
        ))
        .header("X-Org-Key", "ORG_A")
        .send()
        .await
        .unwrap();
    assert_eq!(none.status(), 200);
    let none: Value = none.json().await.unwrap();
    assert!(none.is_null());

    let missing = client
        .get(format!("{}/api/contexts/no-such-id", proxy.base_url))
        .header("X-Org-Key", "ORG_A")
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn ping_echoes_the_payload() {
    let proxy = ProxyProcess::spawn_with_config(&seeded_config(None)).await;

    let body: Value = Client::new()
        .post(format!("{}/osdk/ping", proxy.base_url))
        .json(&json!({"hello": "world"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["echo"]["hello"], "world");
}

#[tokio::test]
async fn metrics_count_served_requests() {
    let proxy = ProxyProcess::spawn_with_config(&seeded_config(None)).await;
    let client = Client::new();

    client
        .get(format!("{}/version", proxy.base_url))
        .send()
        .await
        .unwrap();

    let snapshot: Value = client
        .get(format!("{}/metrics", proxy.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(snapshot["total_requests"].as_u64().unwrap() >= 1);
}
