//! HTTP API tests.
//!
//! Each test imports a small catalog into a temporary database, starts the
//! server on a free port, and talks to it with `reqwest`.

use chara_db::config::Config;
use chara_db::ingest::import_details;
use chara_db::migrate;
use chara_db::models::{CharacterDetail, NamePart};
use chara_db::server::{run_server, REVALIDATE_SECRET_HEADER};
use chara_db::store::sqlite::SqliteStore;
use serde_json::{json, Value};
use tempfile::TempDir;

fn test_config_with_port(tmp: &TempDir, port: u16, secret: Option<&str>) -> Config {
    let db_path = tmp.path().join("chara.sqlite");
    let secret_line = secret
        .map(|s| format!("revalidate_secret = \"{}\"", s))
        .unwrap_or_default();
    let config_content = format!(
        r#"
[db]
path = "{}"

[search]
page_size = 2

[server]
bind = "127.0.0.1:{}"
{}
"#,
        db_path.display(),
        port,
        secret_line
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

fn detail(no: &str, name: &str, ruby: &str, kick: &str, agility: &str) -> CharacterDetail {
    CharacterDetail {
        detail_url: format!("https://zukan.example/chara/{}", no),
        character_no: no.to_string(),
        full_name: vec![NamePart {
            name: name.to_string(),
            ruby: ruby.to_string(),
        }],
        kick: kick.to_string(),
        control: "50".to_string(),
        technique: "50".to_string(),
        pressure: "50".to_string(),
        physical: "50".to_string(),
        agility: agility.to_string(),
        intelligence: "50".to_string(),
        ..Default::default()
    }
}

async fn import(cfg: &Config, details: Vec<CharacterDetail>) {
    let store = SqliteStore::open(&cfg.db).await.unwrap();
    import_details(&store, details).await.unwrap();
    store.close().await;
}

async fn start(cfg: &Config, port: u16) -> tokio::task::JoinHandle<()> {
    let cfg_clone = cfg.clone();
    let handle = tokio::spawn(async move {
        run_server(&cfg_clone).await.ok();
    });
    wait_for_server(port).await;
    handle
}

async fn setup(secret: Option<&str>) -> (TempDir, Config, u16, tokio::task::JoinHandle<()>) {
    let port = find_free_port();
    let tmp = TempDir::new().unwrap();
    let cfg = test_config_with_port(&tmp, port, secret);
    migrate::run_migrations(&cfg).await.unwrap();
    import(
        &cfg,
        vec![
            detail("5", "イナズマ", "いなずま", "90", "70"),
            detail("3", "マイレブン", "まいれぶん", "80", "70"),
            detail("8", "円堂", "えんどう", "", "40"),
        ],
    )
    .await;
    let handle = start(&cfg, port).await;
    (tmp, cfg, port, handle)
}

async fn post_search(port: u16, body: Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("http://127.0.0.1:{}/search", port))
        .json(&body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_search_filters_and_pages() {
    let (_tmp, _cfg, port, handle) = setup(None).await;

    let resp = post_search(port, json!({"query": "マ"})).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["total_match_count"], 2);
    assert_eq!(body["total_pages"], 1);
    assert_eq!(body["current_page"], 1);
    let numbers: Vec<i64> = body["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["character_no"].as_i64().unwrap())
        .collect();
    // catalog order is by number
    assert_eq!(numbers, vec![3, 5]);

    let resp = post_search(port, json!({"page": "99"})).await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["total_match_count"], 3);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["current_page"], 2);
    assert_eq!(body["records"].as_array().unwrap().len(), 1);

    let resp = post_search(port, json!({"page": "not a number"})).await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["current_page"], 1);

    handle.abort();
}

#[tokio::test]
async fn test_search_sorted_by_metric() {
    let (_tmp, _cfg, port, handle) = setup(None).await;

    // KP ties at 70*4 + 50*3 + 50*2 for #3 and #5; tie goes to #3
    let resp = post_search(port, json!({"query": "マ", "sort": "KP"})).await;
    let body: Value = resp.json().await.unwrap();
    let numbers: Vec<i64> = body["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["character_no"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![3, 5]);

    // shootAT: #5 = 140, #3 = 130
    let resp = post_search(port, json!({"query": "マ", "sort": "shootAT"})).await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["records"][0]["character_no"], 5);

    let resp = post_search(port, json!({"sort": "speed"})).await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    handle.abort();
}

#[tokio::test]
async fn test_get_character_and_metric_keys() {
    let (_tmp, _cfg, port, handle) = setup(None).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("http://127.0.0.1:{}/characters/8", port))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["full_name"][0]["name"], "円堂");
    assert!(body["kick"].is_null());
    assert!(body["metrics"]["shootAT"].is_null());
    assert_eq!(body["metrics"]["wallDF"], 100);

    let resp = client
        .get(format!("http://127.0.0.1:{}/characters/404", port))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .get(format!("http://127.0.0.1:{}/characters/abc", port))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .get(format!("http://127.0.0.1:{}/metrics/keys", port))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["keys"],
        json!(["totalStatus", "shootAT", "focusAT", "focusDF", "scrambleAT", "scrambleDF", "wallDF", "KP"])
    );

    handle.abort();
}

#[tokio::test]
async fn test_cache_serves_stale_until_revalidated() {
    let (_tmp, cfg, port, handle) = setup(Some("s3cret")).await;
    let client = reqwest::Client::new();
    let revalidate_url = format!("http://127.0.0.1:{}/cache/revalidate", port);

    let body: Value = post_search(port, json!({})).await.json().await.unwrap();
    assert_eq!(body["total_match_count"], 3);

    import(&cfg, vec![detail("9", "新人", "しんじん", "10", "10")]).await;

    let body: Value = post_search(port, json!({})).await.json().await.unwrap();
    assert_eq!(body["total_match_count"], 3, "cached read expected");

    let resp = client.post(&revalidate_url).send().await.unwrap();
    assert_eq!(resp.status(), 401);

    let resp = client
        .post(&revalidate_url)
        .header(REVALIDATE_SECRET_HEADER, "wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = client
        .post(&revalidate_url)
        .header(REVALIDATE_SECRET_HEADER, "s3cret")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["tag"], "characters");

    let body: Value = post_search(port, json!({})).await.json().await.unwrap();
    assert_eq!(body["total_match_count"], 4);

    handle.abort();
}
