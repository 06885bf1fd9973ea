//! HTTP round trips against a samples directory on disk.

use std::path::Path;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use gw_samples::archive::parquet::save_archive;
use gw_samples::archive::{MemoryArchive, MemoryGroup, MemoryTable};
use gw_samples::catalog::Catalog;
use gw_samples::server::{router, AppState, ServerConfig};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

fn populate(root: &Path) {
    let posterior = MemoryTable::from_columns([
        ("mass_1", (0..500).map(|i| i as f64).collect::<Vec<f64>>()),
        ("chi_eff", (0..500).map(|i| -0.01 * i as f64).collect()),
    ])
    .unwrap();
    let event = MemoryArchive::new("unused")
        .with_group(MemoryGroup::new("C01:IMRPhenomXPHM").with_table("posterior_samples", posterior))
        .with_group(MemoryGroup::new("C01:Mixed").with_subgroup(MemoryGroup::new("approximant")));
    save_archive(
        &event,
        &root.join("events/gwtc2p1/IGWN-GWTC2p1-GW150914_095045_mixed.samples"),
    )
    .unwrap();

    let injections = MemoryTable::from_columns([
        ("mass1_source", vec![10.0, 20.0, 30.0, 40.0]),
        ("ifar_pycbc", vec![0.1, 5.0, 0.2, 0.3]),
        ("ifar_gstlal", vec![0.0, 0.0, 3.0, 0.5]),
    ])
    .unwrap();
    let set = MemoryArchive::new("unused").with_group(
        MemoryGroup::new("injections")
            .with_attribute("analysis_time_s", 31_557_600.0)
            .with_attribute("total_generated", 100.0)
            .with_table("events", injections),
    );
    save_archive(&set, &root.join("injections/o3/o3-mixture.samples")).unwrap();
}

fn app(root: &Path) -> Router {
    let catalog = Catalog::scan(root).unwrap();
    router(Arc::new(AppState::new(catalog, ServerConfig::default())))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_listing_endpoints() {
    let dir = TempDir::new().unwrap();
    populate(dir.path());
    let app = app(dir.path());

    let (status, body) = get(&app, "/events").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!(["GW150914_095045"]));

    let (status, body) = get(&app, "/injections").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!(["o3"]));

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["events"], 1);
}

#[tokio::test]
async fn test_event_discovery_and_sampling() {
    let dir = TempDir::new().unwrap();
    populate(dir.path());
    let app = app(dir.path());

    let (status, body) = get(&app, "/events/GW150914_095045/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!(["mass_1", "chi_eff"]));

    let (_, body) = get(&app, "/events/GW150914_095045?model=C01%3AMixed").await;
    assert_eq!(body, serde_json::json!(["approximant"]));

    let uri = "/events/GW150914_095045/?variable=mass_1&variable=chi_eff&n_samples=5&seed=42";
    let (status, first) = get(&app, uri).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = get(&app, uri).await;
    assert_eq!(first, second);

    assert_eq!(first["model"], "C01:IMRPhenomXPHM");
    assert_eq!(
        first["metadata"],
        serde_json::json!({ "filename": "IGWN-GWTC2p1-GW150914_095045_mixed.samples" })
    );
    let idxs = first["idxs"].as_array().unwrap();
    let masses = first["samples"]["mass_1"].as_array().unwrap();
    assert_eq!(idxs.len(), 5);
    assert_eq!(masses.len(), 5);
    for (idx, mass) in idxs.iter().zip(masses) {
        assert_eq!(idx.as_f64().unwrap(), mass.as_f64().unwrap());
    }
}

#[tokio::test]
async fn test_injection_sampling() {
    let dir = TempDir::new().unwrap();
    populate(dir.path());
    let app = app(dir.path());

    let (status, body) = get(&app, "/injections/o3/?variable=mass1_source").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"], "injections");
    assert_eq!(body["idxs"], serde_json::json!([1, 2]));
    assert_eq!(body["samples"]["mass1_source"], serde_json::json!([20.0, 30.0]));
    assert_eq!(body["metadata"]["n_found"], 2);
    assert_eq!(body["metadata"]["total_generated"], 100.0);

    let (_, body) = get(&app, "/injections/o3/?variable=mass1_source&ifar_threshold=0.25").await;
    assert_eq!(body["idxs"], serde_json::json!([1, 2, 3]));

    let (_, body) = get(&app, "/injections/o3").await;
    assert_eq!(
        body,
        serde_json::json!(["mass1_source", "ifar_pycbc", "ifar_gstlal"])
    );
}

#[tokio::test]
async fn test_error_statuses() {
    let dir = TempDir::new().unwrap();
    populate(dir.path());
    let app = app(dir.path());

    let (status, body) = get(&app, "/events/GW170817_124104/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("GW150914_095045"));

    let (status, body) = get(&app, "/events/GW150914_095045/?variable=mass_1&model=C01%3ANRSur").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("C01:IMRPhenomXPHM"));

    let (status, _) = get(&app, "/events/GW150914_095045/?variable=spin_1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = get(&app, "/injections/o3/?variable=mass1_source&n_samples=3").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("3 requested and 2 available"));

    let (status, _) = get(&app, "/injections/o4/?variable=mass1_source").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&app, "/events/GW150914_095045/?variable=mass_1&n_samples=-5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, "/events/GW150914_095045/?variable=mass_1&seed=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_large_responses_are_gzipped() {
    let dir = TempDir::new().unwrap();
    populate(dir.path());
    let app = app(dir.path());

    let request = |encoding: Option<&str>| {
        let mut builder =
            Request::builder().uri("/events/GW150914_095045/?variable=mass_1&variable=chi_eff");
        if let Some(encoding) = encoding {
            builder = builder.header(header::ACCEPT_ENCODING, encoding);
        }
        builder.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request(Some("gzip"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");

    let response = app.clone().oneshot(request(None)).await.unwrap();
    assert!(response.headers().get(header::CONTENT_ENCODING).is_none());
}
