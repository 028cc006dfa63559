//! HTTP tests for the query server.
//!
//! Each test starts a real server on a free port over a temporary data
//! root and talks to it with `reqwest`.

use dataset_query::config::Config;
use dataset_query::server::run_server;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

fn write_fixtures(tmp: &TempDir) {
    let data = tmp.path().join("data");
    fs::create_dir_all(data.join("kpi")).unwrap();
    fs::create_dir_all(data.join("reports")).unwrap();
    fs::write(
        data.join("kpi").join("may.json"),
        r#"[
  {"store": "Cửa Hàng Kim Khí Kim Phương (Phù Cát)", "month": "Tháng 5", "kpi": 92},
  {"store": "Đại lý Hoà Bình", "month": "Tháng 5", "kpi": 75}
]"#,
    )
    .unwrap();
    fs::write(
        data.join("product.json"),
        r#"[{"name": "Táo xanh"}, {"name": "Cam"}]"#,
    )
    .unwrap();
    fs::write(
        data.join("reports").join("q2.json"),
        r#"[{"title": "Báo cáo quý 2", "owner": "Phòng Kế Toán"}]"#,
    )
    .unwrap();
}

fn test_config(tmp: &TempDir, port: u16) -> Config {
    let config_content = format!(
        r#"
[data]
root = "{}"

[server]
bind = "127.0.0.1:{}"

[[categories]]
name = "product"
storage = "product.json"
keywords = ["product", "sanpham", "sản phẩm"]

[[categories]]
name = "kpi"
keywords = ["kpi"]

[[categories]]
name = "sale"
keywords = ["sale", "doanh thu"]
"#,
        tmp.path().join("data").display(),
        port
    );
    toml::from_str(&config_content).unwrap()
}

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

async fn start(tmp: &TempDir) -> (u16, tokio::task::JoinHandle<()>) {
    write_fixtures(tmp);
    let port = find_free_port();
    let cfg = test_config(tmp, port);
    let handle = tokio::spawn(async move {
        run_server(&cfg).await.ok();
    });
    wait_for_server(port).await;
    (port, handle)
}

async fn get(port: u16, path_and_query: &str) -> (u16, Value) {
    let url = format!("http://127.0.0.1:{}{}", port, path_and_query);
    let resp = reqwest::get(&url).await.unwrap();
    let status = resp.status().as_u16();
    let body: Value = resp.json().await.unwrap();
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let tmp = TempDir::new().unwrap();
    let (port, handle) = start(&tmp).await;
    let (status, body) = get(port, "/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    handle.abort();
}

#[tokio::test]
async fn test_keyword_route() {
    let tmp = TempDir::new().unwrap();
    let (port, handle) = start(&tmp).await;

    let (status, body) = get(port, "/sanpham").await;
    assert_eq!(status, 200);
    assert_eq!(body["keyword"], "sanpham");
    assert_eq!(body["category"], "product");
    assert_eq!(body["results"].as_array().unwrap().len(), 2);

    // percent-encoded "sản phẩm"
    let (status, body) = get(port, "/s%E1%BA%A3n%20ph%E1%BA%A9m?filter=cam").await;
    assert_eq!(status, 200);
    assert_eq!(body["filter"], "cam");
    assert_eq!(body["results"].as_array().unwrap().len(), 1);

    // whitespace-only matching: unaccented term does not match "Táo"
    let (status, body) = get(port, "/product?filter_keyword=tao").await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "no_results");

    handle.abort();
}

#[tokio::test]
async fn test_error_codes() {
    let tmp = TempDir::new().unwrap();
    let (port, handle) = start(&tmp).await;

    let (status, body) = get(port, "/xyz").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "unresolvable_category");

    // "sale" resolves, but there is no data/sale storage
    let (status, body) = get(port, "/sale").await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "category_not_found");

    let (status, body) = get(port, "/api/query").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "bad_request");

    let (status, body) = get(port, "/api/..%2Fetc").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "bad_request");

    handle.abort();
}

#[tokio::test]
async fn test_question_route() {
    let tmp = TempDir::new().unwrap();
    let (port, handle) = start(&tmp).await;

    let url = format!("http://127.0.0.1:{}/api/query", port);
    let resp = reqwest::Client::new()
        .get(&url)
        .query(&[(
            "question",
            "KPI của Cửa Hàng Kim Khí Kim Phương (Phù Cát) tháng 5",
        )])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["category"], "kpi");
    assert_eq!(body["filters"][0], "thang5");
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["results"][0]["kpi"], 92);

    handle.abort();
}

#[tokio::test]
async fn test_folder_and_global_search() {
    let tmp = TempDir::new().unwrap();
    let (port, handle) = start(&tmp).await;

    let (status, body) = get(port, "/api/reports?filter=ke%20toan").await;
    assert_eq!(status, 200);
    assert_eq!(body["folder"], "reports");
    assert_eq!(body["results"].as_array().unwrap().len(), 1);

    let (status, body) = get(port, "/search?filter_keyword=tao").await;
    assert_eq!(status, 200);
    assert_eq!(body["results"][0]["name"], "Táo xanh");

    let (status, _) = get(port, "/search").await;
    assert_eq!(status, 400);

    handle.abort();
}

#[tokio::test]
async fn test_filter_and_filter_keyword_together() {
    let tmp = TempDir::new().unwrap();
    let (port, handle) = start(&tmp).await;

    // keyword and folder routes prefer `filter`
    let (status, body) = get(port, "/product?filter=cam&filter_keyword=zzz").await;
    assert_eq!(status, 200);
    assert_eq!(body["filter"], "cam");
    assert_eq!(body["results"].as_array().unwrap().len(), 1);

    // an empty `filter` falls back to `filter_keyword`
    let (status, body) = get(port, "/product?filter=&filter_keyword=cam").await;
    assert_eq!(status, 200);
    assert_eq!(body["filter"], "cam");

    // global search prefers `filter_keyword`
    let (status, body) = get(port, "/search?filter=zzz&filter_keyword=tao").await;
    assert_eq!(status, 200);
    assert_eq!(body["filter_keyword"], "tao");

    handle.abort();
}

#[tokio::test]
async fn test_malformed_query_string_uses_json_error_body() {
    let tmp = TempDir::new().unwrap();
    let (port, handle) = start(&tmp).await;

    for path in [
        "/product?filter=a&filter=b",
        "/api/reports?filter_keyword=a&filter_keyword=b",
        "/api/query?question=kpi&question=sale",
        "/search?filter_keyword=a&filter_keyword=b",
    ] {
        let (status, body) = get(port, path).await;
        assert_eq!(status, 400, "{}", path);
        assert_eq!(body["error"]["code"], "bad_request", "{}", path);
        assert!(body["error"]["message"].as_str().unwrap().contains("duplicate"), "{}", path);
    }

    handle.abort();
}
