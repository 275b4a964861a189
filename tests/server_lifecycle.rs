//! Serving over a real listener and shutting down cleanly.

use std::time::Duration;

use route_tree::Shutdown;
use tokio::net::TcpListener;

mod common;

use common::{site_config, site_server};

#[tokio::test]
async fn test_serves_and_shuts_down_gracefully() {
    let server = site_server(site_config());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.wait()));

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap();

    let response = client.get(format!("http://{addr}/target")).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::FOUND);
    assert_eq!(response.headers()["location"], "/de/target");

    let response = client.get(format!("http://{addr}/en/contact")).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["view"], "contact");
    assert_eq!(body["alternates"]["de"], "/de/kontakt");

    drop(client);
    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}
