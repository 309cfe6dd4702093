//! End-to-end tests: a real hyper server on a loopback port, driven by reqwest.

use std::net::SocketAddr;
use std::sync::Arc;

use dwr_server::http_server::HttpServer;
use dwr_server::registry::MethodRegistry;
use dwr_server::UrlProcessor;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED, LOCATION, SET_COOKIE};
use reqwest::StatusCode;
use serde_json::json;
use tokio::net::TcpListener;

fn registry() -> MethodRegistry {
    let mut registry = MethodRegistry::new();
    registry
        .register("Demo", "sayHello", 1, |params| {
            Ok(json!(format!("Hello, {}", params[0].as_str().unwrap_or("?"))))
        })
        .register("Demo", "sum", 1, |params| {
            let total: i64 = params[0]
                .as_array()
                .ok_or("expected an array")?
                .iter()
                .filter_map(|v| v.as_i64())
                .sum();
            Ok(json!(total))
        });
    registry
}

async fn start_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(Arc::new(UrlProcessor::from_registry(registry())), "/dwr");
    tokio::spawn(server.serve(listener));
    addr
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_plainjs_call() {
    let addr = start_server().await;
    let body = "callCount=2\n\
                c0-scriptName=Demo\nc0-methodName=sayHello\nc0-id=1\nc0-param0=string:Joe\n\
                c1-scriptName=Demo\nc1-methodName=sum\nc1-id=2\n\
                c1-e1=number:3\nc1-param0=Array:[reference:c1-e1,number:4]\n";

    let response = client()
        .post(format!("http://{}/dwr/plainjs", addr))
        .body(body)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "text/plain");
    assert_eq!(
        response.text().await.unwrap(),
        "DWREngine._handleResponse(\"1\", \"Hello, Joe\");\nDWREngine._handleResponse(\"2\", 7);\n"
    );
}

#[tokio::test]
async fn test_htmljs_call() {
    let addr = start_server().await;
    let response = client()
        .post(format!("http://{}/dwr/htmljs?callCount=1", addr))
        .body("c0-scriptName=Demo&c0-methodName=sayHello&c0-id=9&c0-param0=string%3A%3C%2Fscript%3E")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "text/html");
    let text = response.text().await.unwrap();
    assert!(text.contains("var DWREngine = window.parent.DWREngine;"));
    assert!(text.contains("DWREngine._handleResponse(\"9\", \"Hello, \\u003C/script\\u003E\");"));
    assert_eq!(text.matches("</script>").count(), 1);
}

#[tokio::test]
async fn test_bad_batch_returns_alert_script() {
    let addr = start_server().await;
    let response = client()
        .post(format!("http://{}/dwr/plainjs", addr))
        .body("nonsense")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.text().await.unwrap().contains("alert('Error."));
}

#[tokio::test]
async fn test_redirect_and_not_found() {
    let addr = start_server().await;
    let client = client();

    let response = client.get(format!("http://{}/dwr/", addr)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers().get(LOCATION).unwrap(), "/dwr/index.html");

    let response = client.get(format!("http://{}/dwr/missing", addr)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client.get(format!("http://{}/elsewhere", addr)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_engine_sets_session_cookie() {
    let addr = start_server().await;
    let response = client()
        .get(format!("http://{}/dwr/engine.js", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "text/javascript");
    assert_eq!(response.headers().get(CACHE_CONTROL).unwrap(), "no-cache");

    let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap().to_string();
    let session_id = cookie
        .strip_prefix("DWRSESSIONID=")
        .and_then(|rest| rest.split(';').next())
        .unwrap()
        .to_string();

    let text = response.text().await.unwrap();
    assert!(text.contains(&format!("DWREngine._httpSessionId = '{}';", session_id)));
}

#[tokio::test]
async fn test_util_conditional_get() {
    let addr = start_server().await;
    let client = client();
    let url = format!("http://{}/dwr/util.js", addr);

    let first = client.get(&url).send().await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let etag = first.headers().get(ETAG).unwrap().clone();
    let last_modified = first.headers().get(LAST_MODIFIED).unwrap().clone();
    let first_body = first.text().await.unwrap();
    assert!(first_body.contains("DWRUtil.setValue"));

    let revalidated = client
        .get(&url)
        .header(IF_NONE_MATCH, etag)
        .header(IF_MODIFIED_SINCE, last_modified)
        .send()
        .await
        .unwrap();
    assert_eq!(revalidated.status(), StatusCode::NOT_MODIFIED);

    let second_body = client.get(&url).send().await.unwrap().text().await.unwrap();
    assert_eq!(first_body, second_body);
}
