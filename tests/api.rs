mod common;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;

use certificate_generator::api::{configure_routes, ApiState, AppConfig};
use certificate_generator::storage::InMemoryDataService;
use certificate_generator::templates::TemplateRegistry;
use common::{five_jobs, StubRasterizer};

fn state(failing: &[&str]) -> ApiState {
    state_with(AppConfig::default(), failing)
}

fn state_with(config: AppConfig, failing: &[&str]) -> ApiState {
    ApiState::with_parts(
        config,
        Arc::new(TemplateRegistry::new()),
        Arc::new(InMemoryDataService::new()),
        Arc::new(StubRasterizer::failing(failing)),
    )
    .unwrap()
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(App::new().app_data(web::Data::new($state)).configure(configure_routes)).await
    };
}

fn header<'a>(resp: &'a actix_web::dev::ServiceResponse, name: &str) -> &'a str {
    resp.headers().get(name).unwrap().to_str().unwrap()
}

#[actix_web::test]
async fn health_and_templates() {
    let app = app!(state(&[]));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/v1/templates").to_request(),
    )
    .await;
    let ids: Vec<&str> = body["templates"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["classic", "luxury", "modern", "custom"]);
}

#[actix_web::test]
async fn preview_returns_svg() {
    let app = app!(state(&[]));
    let req = test::TestRequest::post()
        .uri("/api/v1/certificates/preview")
        .set_json(json!({
            "templateId": "custom",
            "data": common::render_data("Nguyễn Văn A"),
            "config": { "paperSize": "A4", "orientation": "portrait" }
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, "X-Canvas-Width"), "794");
    assert_eq!(header(&resp, "X-Canvas-Height"), "1123");
    let body = test::read_body(resp).await;
    let svg = String::from_utf8(body.to_vec()).unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("Nguyễn Văn A"));
}

#[actix_web::test]
async fn layout_updates_are_applied() {
    let app = app!(state(&[]));
    let req = test::TestRequest::post()
        .uri("/api/v1/layout/apply")
        .set_json(json!({
            "config": {},
            "updates": [{ "kind": "visibility", "element": "qr", "visible": true }],
            "changes": { "pos_title": { "x": 140.0, "y": 12.5 }, "presentedTo": "Trao tặng" }
        }))
        .to_request();

    let config: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(config["visibility"]["qr"], json!(true));
    assert_eq!(config["positions"]["title"], json!({ "x": 100.0, "y": 12.5 }));
    assert_eq!(config["labels"]["presentedTo"], json!("Trao tặng"));

    let req = test::TestRequest::post()
        .uri("/api/v1/layout/apply")
        .set_json(json!({ "changes": { "nonsense": 1 } }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn zip_export_reports_counts() {
    let app = app!(state(&["c2", "c4"]));
    let req = test::TestRequest::post()
        .uri("/api/v1/certificates/export/zip")
        .set_json(json!({ "label": "Lop 10A1", "jobs": five_jobs() }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, "Content-Type"), "application/zip");
    assert_eq!(header(&resp, "X-Generated-Count"), "3");
    assert_eq!(header(&resp, "X-Attempted-Count"), "5");
    assert!(header(&resp, "Content-Disposition").contains("Lop_10A1_"));

    let body = test::read_body(resp).await;
    let archive = zip::ZipArchive::new(std::io::Cursor::new(body.to_vec())).unwrap();
    assert_eq!(archive.len(), 3);
}

#[actix_web::test]
async fn export_without_output_is_unprocessable() {
    let app = app!(state(&["c1", "c2", "c3", "c4", "c5"]));
    let req = test::TestRequest::post()
        .uri("/api/v1/certificates/export/pdf")
        .set_json(json!({ "label": "x", "jobs": five_jobs() }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], json!("No certificate could be generated (5 attempted)"));
}

#[actix_web::test]
async fn issue_then_export_event() {
    let app = app!(state(&[]));
    let req = test::TestRequest::post()
        .uri("/api/v1/certificates/issue")
        .set_json(json!({
            "eventId": "ev-1",
            "title": "Giấy khen {full_name}",
            "type": "completion",
            "templateId": "classic",
            "issueDate": "2024-11-20",
            "recipients": [
                { "id": "u1", "user": { "id": "u1", "fullName": "Nguyễn Văn A" } },
                { "id": "p2", "participant": { "id": "p2", "eventId": "ev-1", "name": "Khách mời" } }
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let issued: Value = test::read_body_json(resp).await;
    assert_eq!(issued["certificates"].as_array().unwrap().len(), 2);
    assert_eq!(issued["certificates"][0]["title"], json!("Giấy khen Nguyễn Văn A"));
    assert_eq!(issued["preset"]["autoSaved"], json!(true));

    let req = test::TestRequest::post()
        .uri("/api/v1/events/ev-1/certificates/export")
        .set_json(json!({ "format": "pdf" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, "X-Generated-Count"), "2");
    assert_eq!(header(&resp, "Content-Type"), "application/pdf");

    // Guests without a user record keep the name they were issued under
    let req = test::TestRequest::post()
        .uri("/api/v1/events/ev-1/certificates/export")
        .set_json(json!({ "format": "zip" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(body.to_vec())).unwrap();
    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names[0].starts_with("Nguyễn_Văn_A_"));
    assert!(names[1].starts_with("Khách_mời_"));
}

#[actix_web::test]
async fn oversized_assets_are_rejected() {
    let config = AppConfig {
        max_asset_bytes: 1024,
        ..Default::default()
    };
    let app = app!(state_with(config, &[]));
    let huge = format!("data:image/png;base64,{}", "A".repeat(4096));
    let req = test::TestRequest::post()
        .uri("/api/v1/presets")
        .set_json(json!({
            "name": "Nền lớn",
            "templateId": "custom",
            "config": { "bgImage": huge }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("bgImage"));
}

#[actix_web::test]
async fn preset_lifecycle() {
    let app = app!(state(&[]));
    let req = test::TestRequest::post()
        .uri("/api/v1/presets")
        .set_json(json!({ "name": "Mẫu xanh", "templateId": "modern", "config": { "textColor": "#0f766e" } }))
        .to_request();
    let saved: Value = test::call_and_read_body_json(&app, req).await;
    let id = saved["id"].as_str().unwrap().to_string();
    assert_eq!(saved["autoSaved"], json!(false));

    let listed: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/v1/presets").to_request(),
    )
    .await;
    assert_eq!(listed["presets"].as_array().unwrap().len(), 1);

    for _ in 0..2 {
        let req = test::TestRequest::delete()
            .uri(&format!("/api/v1/presets/{}", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    let listed: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/v1/presets").to_request(),
    )
    .await;
    assert!(listed["presets"].as_array().unwrap().is_empty());
}
