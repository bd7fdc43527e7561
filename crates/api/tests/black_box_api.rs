use clap::Parser;
use reqwest::StatusCode;
use serde_json::{Value, json};

use printmaps_api::config::Config;

const MEDIA_TYPE: &str = "application/vnd.api+json";

struct TestServer {
    base_url: String,
    orders_dir: tempfile::TempDir,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let orders_dir = tempfile::tempdir().expect("failed to create orders dir");
        let config = Config::try_parse_from([
            "printmaps-api",
            "--store",
            "memory",
            "--orders-dir",
            orders_dir.path().to_str().unwrap(),
        ])
        .expect("invalid test config");

        // Same router as prod, bound to an ephemeral port.
        let app = printmaps_api::app::build_app(&config).expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}/api/beta2/maps", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            orders_dir,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn complete_metadata() -> Value {
    json!({
        "data": {
            "type": "maps",
            "attributes": {
                "fileformat": "png",
                "scale": 25000,
                "printWidth": 420.0,
                "printHeight": 594.0,
                "latitude": 51.9607,
                "longitude": 7.6261,
                "style": "osm-carto",
                "projection": "3857"
            }
        }
    })
}

fn order(id: &str) -> Value {
    json!({ "data": { "type": "maps", "id": id } })
}

async fn send(req: reqwest::RequestBuilder, body: &Value) -> reqwest::Response {
    req.header("content-type", MEDIA_TYPE)
        .header("accept", MEDIA_TYPE)
        .body(serde_json::to_vec(body).unwrap())
        .send()
        .await
        .unwrap()
}

async fn create_job(client: &reqwest::Client, srv: &TestServer, body: &Value) -> String {
    let res = send(client.post(srv.url("/metadata")), body).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let doc: Value = res.json().await.unwrap();
    doc["data"]["id"].as_str().unwrap().to_string()
}

fn codes(doc: &Value) -> Vec<String> {
    doc["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["code"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn health_is_ok() {
    let srv = TestServer::spawn().await;
    let url = srv.base_url.replace("/api/beta2/maps", "/health");
    let res = reqwest::get(url).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_returns_document_with_fresh_id() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = send(client.post(srv.url("/metadata")), &complete_metadata()).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert!(
        res.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with(MEDIA_TYPE)
    );

    let doc: Value = res.json().await.unwrap();
    assert_eq!(doc["data"]["type"], "maps");
    let id = doc["data"]["id"].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
    assert_eq!(doc["data"]["attributes"]["style"], "osm-carto");

    let state = client
        .get(srv.url(&format!("/mapstate/{id}")))
        .header("accept", MEDIA_TYPE)
        .send()
        .await
        .unwrap();
    assert_eq!(state.status(), StatusCode::OK);
    let state: Value = state.json().await.unwrap();
    assert!(state["data"]["attributes"]["metadataWrittenAt"].is_string());
    assert!(state["data"]["attributes"]["orderSubmittedAt"].is_null());
}

#[tokio::test]
async fn submit_build_order_accepts_and_spools_order() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let id = create_job(&client, &srv, &complete_metadata()).await;

    let res = send(client.post(srv.url("/mapfile")), &order(&id)).await;
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let doc: Value = res.json().await.unwrap();
    assert_eq!(doc["data"]["id"], id.as_str());
    assert_eq!(doc["data"]["attributes"]["scale"], 25000);

    let state: Value = client
        .get(srv.url(&format!("/mapstate/{id}")))
        .header("accept", MEDIA_TYPE)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let attrs = &state["data"]["attributes"];
    assert!(attrs["orderSubmittedAt"].is_string());
    assert!(attrs["buildStartedAt"].is_null());
    assert!(attrs["buildSuccessful"].is_null());

    let spooled = srv.orders_dir.path().join(format!("{id}.json"));
    assert!(spooled.exists(), "order file missing: {}", spooled.display());
}

#[tokio::test]
async fn submit_with_malformed_id_reports_single_error() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = send(client.post(srv.url("/mapfile")), &order("not-a-uuid")).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let doc: Value = res.json().await.unwrap();
    assert_eq!(codes(&doc), vec!["4001"]);
}

#[tokio::test]
async fn submit_for_unknown_job_reports_not_found_with_id() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let id = uuid::Uuid::new_v4().to_string();

    let res = send(client.post(srv.url("/mapfile")), &order(&id)).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let doc: Value = res.json().await.unwrap();
    assert_eq!(codes(&doc), vec!["4002"]);
    assert_eq!(doc["errors"][0]["id"], id.as_str());
}

#[tokio::test]
async fn submit_incomplete_metadata_lists_missing_fields() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let mut body = complete_metadata();
    let attrs = body["data"]["attributes"].as_object_mut().unwrap();
    attrs.remove("style");
    attrs.remove("projection");
    let id = create_job(&client, &srv, &body).await;

    let res = send(client.post(srv.url("/mapfile")), &order(&id)).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let doc: Value = res.json().await.unwrap();
    assert_eq!(codes(&doc), vec!["3002", "3002"]);
    assert!(!srv.orders_dir.path().join(format!("{id}.json")).exists());
}

#[tokio::test]
async fn wrong_headers_are_all_reported() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/metadata"))
        .header("accept", "text/html")
        .body(serde_json::to_vec(&complete_metadata()).unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let doc: Value = res.json().await.unwrap();
    assert_eq!(codes(&doc), vec!["1001", "1002"]);
}

#[tokio::test]
async fn undecodable_body_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/metadata"))
        .header("content-type", MEDIA_TYPE)
        .header("accept", MEDIA_TYPE)
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let doc: Value = res.json().await.unwrap();
    assert_eq!(codes(&doc), vec!["2001"]);
}

#[tokio::test]
async fn metadata_is_locked_after_build_order() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let id = create_job(&client, &srv, &complete_metadata()).await;

    let mut update = complete_metadata();
    update["data"]["id"] = json!(id);
    update["data"]["attributes"]["scale"] = json!(10000);
    let res = send(client.patch(srv.url("/metadata")), &update).await;
    assert_eq!(res.status(), StatusCode::OK);
    let doc: Value = res.json().await.unwrap();
    assert_eq!(doc["data"]["attributes"]["scale"], 10000);

    let res = send(client.post(srv.url("/mapfile")), &order(&id)).await;
    assert_eq!(res.status(), StatusCode::ACCEPTED);

    let res = send(client.patch(srv.url("/metadata")), &update).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let doc: Value = res.json().await.unwrap();
    assert_eq!(codes(&doc), vec!["4003"]);
}

#[tokio::test]
async fn read_metadata_round_trips_and_unknown_is_not_found() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let id = create_job(&client, &srv, &complete_metadata()).await;

    let res = client
        .get(srv.url(&format!("/metadata/{id}")))
        .header("accept", MEDIA_TYPE)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let doc: Value = res.json().await.unwrap();
    assert_eq!(doc["data"]["id"], id.as_str());
    assert_eq!(doc["data"]["attributes"]["latitude"], 51.9607);

    let unknown = uuid::Uuid::new_v4();
    let res = client
        .get(srv.url(&format!("/mapstate/{unknown}")))
        .header("accept", MEDIA_TYPE)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let doc: Value = res.json().await.unwrap();
    assert_eq!(codes(&doc), vec!["4002"]);
}
