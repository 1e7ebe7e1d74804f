#![allow(clippy::unwrap_used)]
// Integration tests for `LoadBalancerHandler` using wiremock.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use vultr_api::{
    Client, Error, FirewallRule, ForwardingRule, IpType, ListOptions, LoadBalancerRequest,
    LoadBalancerService, TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Client) {
    let server = MockServer::start().await;
    let key: SecretString = "test-key".to_string().into();
    let client =
        Client::with_base_url(&server.uri(), &key, &TransportConfig::default()).unwrap();
    (server, client)
}

fn lb_json(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "date_created": "2024-05-01T12:00:00+00:00",
        "region": "ewr",
        "label": "web-lb",
        "status": "active",
        "ipv4": "192.0.2.10",
        "ipv6": "2001:db8::10",
        "instances": ["inst-a"],
        "nodes": 1,
        "has_ssl": false,
        "http2": false,
        "http3": false,
        "forwarding_rules": [{
            "id": "fr-1",
            "frontend_protocol": "http",
            "frontend_port": 80,
            "backend_protocol": "http",
            "backend_port": 80
        }],
        "firewall_rules": []
    })
}

// ── Load balancers ──────────────────────────────────────────────────

#[tokio::test]
async fn test_create_load_balancer() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v2/load-balancers"))
        .and(header("authorization", "Bearer test-key"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "region": "ewr",
            "label": "web-lb",
            "forwarding_rules": [{
                "frontend_protocol": "http",
                "frontend_port": 80,
                "backend_protocol": "http",
                "backend_port": 80
            }]
        })))
        .respond_with(
            ResponseTemplate::new(202).set_body_json(json!({ "load_balancer": lb_json("lb-1") })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let req = LoadBalancerRequest {
        region: Some("ewr".into()),
        label: Some("web-lb".into()),
        forwarding_rules: vec![ForwardingRule::new("http", 80, "http", 80)],
        ..LoadBalancerRequest::default()
    };
    let resp = client.load_balancers().create(&req).await.unwrap();

    assert_eq!(resp.status().as_u16(), 202);
    assert_eq!(resp.data.id, "lb-1");
    assert_eq!(resp.data.label, "web-lb");
    assert_eq!(resp.data.forwarding_rules.len(), 1);
}

#[tokio::test]
async fn test_get_load_balancer() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/load-balancers/abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-request-id", "req-42")
                .set_body_json(json!({ "load_balancer": lb_json("abc") })),
        )
        .mount(&server)
        .await;

    let resp = client.load_balancers().get("abc").await.unwrap();

    assert_eq!(resp.data.id, "abc");
    assert_eq!(resp.data.ipv4, "192.0.2.10");
    assert_eq!(resp.data.instances, vec!["inst-a"]);
    assert_eq!(resp.response.header("x-request-id"), Some("req-42"));
    assert!(resp.response.url.path().ends_with("/v2/load-balancers/abc"));
}

#[tokio::test]
async fn test_get_not_found_keeps_raw_response() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/load-balancers/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "Invalid load balancer ID",
            "status": 404
        })))
        .mount(&server)
        .await;

    let err = client.load_balancers().get("missing").await.unwrap_err();

    assert!(err.is_not_found(), "expected 404, got: {err:?}");
    match &err {
        Error::Api { status, message, .. } => {
            assert_eq!(*status, 404);
            assert_eq!(message, "Invalid load balancer ID");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
    let raw = err.response().unwrap();
    assert_eq!(raw.status.as_u16(), 404);
    assert!(raw.body.contains("Invalid load balancer ID"));
}

#[tokio::test]
async fn test_update_sends_only_set_fields() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/v2/load-balancers/abc"))
        .and(body_json(json!({ "label": "renamed", "ssl_redirect": true })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let req = LoadBalancerRequest {
        label: Some("renamed".into()),
        ssl_redirect: Some(true),
        ..LoadBalancerRequest::default()
    };
    client.load_balancers().update("abc", &req).await.unwrap();
}

#[tokio::test]
async fn test_update_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/v2/load-balancers/abc"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "Invalid balancing algorithm",
            "status": 400
        })))
        .mount(&server)
        .await;

    let req = LoadBalancerRequest {
        balancing_algorithm: Some("random".into()),
        ..LoadBalancerRequest::default()
    };
    let err = client.load_balancers().update("abc", &req).await.unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("Invalid balancing algorithm"));
}

#[tokio::test]
async fn test_delete_endpoints() {
    let (server, client) = setup().await;

    for suffix in ["/v2/load-balancers/abc", "/v2/load-balancers/abc/ssl", "/v2/load-balancers/abc/auto_ssl"] {
        Mock::given(method("DELETE"))
            .and(path(suffix))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
    }

    let lbs = client.load_balancers();
    lbs.delete("abc").await.unwrap();
    lbs.delete_ssl("abc").await.unwrap();
    lbs.delete_auto_ssl("abc").await.unwrap();
}

#[tokio::test]
async fn test_list_with_cursor_only() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/load-balancers"))
        .and(|req: &Request| req.url.query() == Some("cursor=next123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "load_balancers": [lb_json("a"), lb_json("b")],
            "meta": { "total": 3, "links": { "next": "page3", "prev": "page1" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let opts = ListOptions::default().with_cursor("next123");
    let resp = client.load_balancers().list(Some(&opts)).await.unwrap();
    let page = resp.data;

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[1].id, "b");
    assert_eq!(page.meta.as_ref().map(|m| m.total), Some(3));
    assert_eq!(page.next_cursor(), Some("page3"));
    assert_eq!(
        page.next_options(&opts).and_then(|o| o.cursor),
        Some("page3".to_string())
    );
}

#[tokio::test]
async fn test_list_without_options_sends_no_query() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/load-balancers"))
        .and(|req: &Request| req.url.query().is_none())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "load_balancers": [],
            "meta": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client.load_balancers().list(None).await.unwrap().into_data();

    assert!(page.items.is_empty());
    assert!(page.meta.is_none());
    assert_eq!(page.next_cursor(), None);
}

#[tokio::test]
async fn test_missing_envelope_key_is_decode_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/load-balancers/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lb_json("abc")))
        .mount(&server)
        .await;

    let err = client.load_balancers().get("abc").await.unwrap_err();

    match err {
        Error::Deserialization { message, body } => {
            assert!(message.contains("load_balancer"), "message: {message}");
            assert!(body.contains("\"id\":\"abc\""));
        }
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_list_missing_envelope_key_is_decode_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/load-balancers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "meta": { "total": 0 } })))
        .mount(&server)
        .await;

    let result = client.load_balancers().list(None).await;

    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_empty_id_never_reaches_server() {
    let (server, client) = setup().await;

    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let lbs = client.load_balancers();
    assert!(matches!(lbs.get("").await, Err(Error::InvalidArgument(_))));
    assert!(matches!(lbs.delete("").await, Err(Error::InvalidArgument(_))));
    assert!(matches!(
        lbs.get_forwarding_rule("abc", "").await,
        Err(Error::InvalidArgument("forwarding rule ID"))
    ));
    assert!(matches!(
        lbs.list_firewall_rules(" ", None).await,
        Err(Error::InvalidArgument("load balancer ID"))
    ));
}

#[tokio::test]
async fn test_path_altering_id_never_reaches_server() {
    let (server, client) = setup().await;

    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let lbs = client.load_balancers();
    assert!(matches!(
        lbs.delete_forwarding_rule("abc", "..").await,
        Err(Error::InvalidArgument("forwarding rule ID"))
    ));
    assert!(matches!(
        lbs.get("abc/forwarding-rules").await,
        Err(Error::InvalidArgument("load balancer ID"))
    ));
    assert!(matches!(
        lbs.delete("abc?force=true").await,
        Err(Error::InvalidArgument("load balancer ID"))
    ));
    assert!(matches!(
        lbs.get_firewall_rule("abc", "fw#1").await,
        Err(Error::InvalidArgument("firewall rule ID"))
    ));
    assert!(matches!(
        lbs.delete_ssl("%2e%2e").await,
        Err(Error::InvalidArgument("load balancer ID"))
    ));
}

// ── Forwarding rules ────────────────────────────────────────────────

#[tokio::test]
async fn test_create_forwarding_rule_ignores_caller_id() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v2/load-balancers/abc/forwarding-rules"))
        .and(body_json(json!({
            "frontend_protocol": "https",
            "frontend_port": 443,
            "backend_protocol": "http",
            "backend_port": 8080
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "forwarding_rule": {
                "id": "server-assigned",
                "frontend_protocol": "https",
                "frontend_port": 443,
                "backend_protocol": "http",
                "backend_port": 8080
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let rule = ForwardingRule {
        id: Some("caller-made-up".into()),
        ..ForwardingRule::new("https", 443, "http", 8080)
    };
    let created = client
        .load_balancers()
        .create_forwarding_rule("abc", &rule)
        .await
        .unwrap()
        .into_data();

    assert_eq!(created.id.as_deref(), Some("server-assigned"));
    assert_eq!(created.backend_port, 8080);
}

#[tokio::test]
async fn test_get_and_delete_forwarding_rule() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/load-balancers/abc/forwarding-rules/fr-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "forwarding_rule": {
                "id": "fr-1",
                "frontend_protocol": "tcp",
                "frontend_port": 22,
                "backend_protocol": "tcp",
                "backend_port": 2222
            }
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v2/load-balancers/abc/forwarding-rules/fr-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let lbs = client.load_balancers();
    let rule = lbs.get_forwarding_rule("abc", "fr-1").await.unwrap().data;
    assert_eq!(rule.frontend_protocol, "tcp");
    assert_eq!(rule.backend_port, 2222);

    lbs.delete_forwarding_rule("abc", "fr-1").await.unwrap();
}

#[tokio::test]
async fn test_list_forwarding_rules_with_page_size() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/load-balancers/abc/forwarding-rules"))
        .and(query_param("per_page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "forwarding_rules": [{
                "id": "fr-1",
                "frontend_protocol": "http",
                "frontend_port": 80,
                "backend_protocol": "http",
                "backend_port": 80
            }],
            "meta": { "total": 2, "links": { "next": "c2", "prev": "" } }
        })))
        .mount(&server)
        .await;

    let opts = ListOptions::default().with_per_page(1);
    let page = client
        .load_balancers()
        .list_forwarding_rules("abc", Some(&opts))
        .await
        .unwrap()
        .data;

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.next_cursor(), Some("c2"));
    assert_eq!(page.meta.and_then(|m| m.prev_cursor().map(str::to_owned)), None);
}

// ── Firewall rules ──────────────────────────────────────────────────

#[tokio::test]
async fn test_firewall_rules() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/load-balancers/abc/firewall-rules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "firewall_rules": [
                { "id": "fw-1", "port": 80, "ip_type": "v4", "source": "0.0.0.0/0" },
                { "id": "fw-2", "port": 443, "ip_type": "v6", "source": "cloudflare" }
            ],
            "meta": { "total": 2, "links": { "next": "", "prev": "" } }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/load-balancers/abc/firewall-rules/fw-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "firewall_rule": { "id": "fw-2", "port": 443, "ip_type": "v6", "source": "cloudflare" }
        })))
        .mount(&server)
        .await;

    let lbs = client.load_balancers();

    let page = lbs.list_firewall_rules("abc", None).await.unwrap().data;
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.next_cursor(), None);

    let rule = lbs.get_firewall_rule("abc", "fw-2").await.unwrap().data;
    let expected = FirewallRule {
        id: Some("fw-2".into()),
        ..FirewallRule::new(443, IpType::V6, "cloudflare")
    };
    assert_eq!(rule, expected);
}

// ── Trait object / cancellation ─────────────────────────────────────

#[tokio::test]
async fn test_service_as_trait_object() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/load-balancers/abc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "load_balancer": lb_json("abc") })),
        )
        .mount(&server)
        .await;

    let svc: Box<dyn LoadBalancerService> = Box::new(client.load_balancers());
    let lb = svc.get("abc").await.unwrap().into_data();
    assert_eq!(lb.id, "abc");
}

#[tokio::test]
async fn test_dropping_future_cancels_request() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/load-balancers/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "load_balancer": lb_json("slow") }))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let lbs = client.load_balancers();
    let result = tokio::time::timeout(Duration::from_millis(200), lbs.get("slow")).await;
    assert!(result.is_err(), "request should have been abandoned");
}

#[tokio::test]
async fn test_transport_failure() {
    let key: SecretString = "k".to_string().into();
    // Port 9 (discard) on localhost is expected to refuse connections.
    let client =
        Client::with_base_url("http://127.0.0.1:9", &key, &TransportConfig::default()).unwrap();

    let err = client.load_balancers().get("abc").await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got: {err:?}");
    assert!(err.response().is_none());
}
