use std::io::Read;
use std::time::Duration;

use actix_web::{App, http::StatusCode, test, web};
use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::GzDecoder;
use serde_json::{Value, json};

use mandelbulb_backend::app_state::AppState;
use mandelbulb_backend::config::ServerConfig;
use mandelbulb_backend::{GridParams, compute_field, routes};

fn state() -> web::Data<AppState> {
    web::Data::new(AppState::new(ServerConfig {
        max_resolution: 32,
        ..ServerConfig::default()
    }))
}

fn decode(bytes: &[u8]) -> Vec<u32> {
    let mut cursor = bytes;
    let mut values = Vec::new();
    while let Ok(v) = cursor.read_u32::<LittleEndian>() {
        values.push(v);
    }
    values
}

#[actix_web::test]
async fn test_index_lists_defaults() {
    let app = test::init_service(App::new().app_data(state()).configure(routes::configure)).await;
    let req = test::TestRequest::get().uri("/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["defaults"]["resolution"], 16);
    assert_eq!(body["defaults"]["x_bounds"], json!([-1.5, 1.5]));
    assert_eq!(body["max_resolution"], 32);
}

#[actix_web::test]
async fn test_compute_and_download_chunks() {
    let app = test::init_service(App::new().app_data(state()).configure(routes::configure)).await;

    let req = test::TestRequest::post()
        .uri("/field")
        .set_json(json!({
            "resolution": 4,
            "power": 8,
            "max_iterations": 10,
            "bailout_radius": 2.0,
            "chunk_size": 40,
        }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let task_id = created["task_id"].as_str().expect("缺少 task_id").to_string();
    assert_eq!(created["shape"], json!([4, 4, 4]));
    assert_eq!(created["data_length"], 64);
    assert_eq!(created["chunks"].as_array().map(|c| c.len()), Some(2));
    assert_eq!(created["geometry"]["origin"], json!([-1.5, -1.5, -1.5]));

    let mut completed = false;
    for _ in 0..200 {
        let req = test::TestRequest::get()
            .uri(&format!("/field/status?task_id={}", task_id))
            .to_request();
        let status: Value = test::call_and_read_body_json(&app, req).await;
        if status["status"] == "completed" {
            assert_eq!(status["progress"], 1.0);
            completed = true;
            break;
        }
        actix_web::rt::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(completed, "任务没有在预期时间内完成");

    let req = test::TestRequest::get()
        .uri(&format!("/field/chunk?task_id={}&chunk_index=0", task_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("X-Chunk-Length").unwrap(), "40");
    let first = decode(&test::read_body(resp).await);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/field/chunk?task_id={}&chunk_index=1&encoding=gzip",
            task_id
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("Content-Encoding").unwrap(), "gzip");
    let mut raw = Vec::new();
    GzDecoder::new(&test::read_body(resp).await[..])
        .read_to_end(&mut raw)
        .unwrap();
    let second = decode(&raw);

    let mut all = first;
    all.extend(second);
    let expected = compute_field(&GridParams {
        resolution: 4,
        max_iterations: 10,
        ..GridParams::default()
    })
    .unwrap();
    assert_eq!(all, expected.as_slice());

    // chunk 只能被请求一次
    let req = test::TestRequest::get()
        .uri(&format!("/field/chunk?task_id={}&chunk_index=0", task_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri(&format!("/performance?task_id={}", task_id))
        .to_request();
    let perf: Value = test::call_and_read_body_json(&app, req).await;
    let stages: Vec<&str> = perf["records"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["stage"].as_str())
        .collect();
    assert!(stages.contains(&"validate"));
    assert!(stages.contains(&"compute"));
    assert!(stages.contains(&"chunk"));
}

#[actix_web::test]
async fn test_invalid_parameters_are_rejected() {
    let app = test::init_service(App::new().app_data(state()).configure(routes::configure)).await;

    let req = test::TestRequest::post()
        .uri("/field")
        .set_json(json!({ "power": -1.0 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/field")
        .set_json(json!({ "z_bounds": [1.0, 1.0] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/field")
        .set_json(json!({ "resolution": 64 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[actix_web::test]
async fn test_unknown_task_ids() {
    let app = test::init_service(App::new().app_data(state()).configure(routes::configure)).await;

    let req = test::TestRequest::get()
        .uri("/field/status?task_id=missing")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::delete()
        .uri("/field?task_id=missing")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri("/field/chunk?task_id=missing&chunk_index=0")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

/// 轮询任务状态直到进入指定状态，返回最后一次的状态 JSON
macro_rules! poll_status {
    ($app:expr, $task_id:expr, $wanted:expr) => {{
        let mut last = Value::Null;
        for _ in 0..500 {
            let req = test::TestRequest::get()
                .uri(&format!("/field/status?task_id={}", $task_id))
                .to_request();
            last = test::call_and_read_body_json($app, req).await;
            if last["status"] == $wanted {
                break;
            }
            actix_web::rt::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(last["status"], $wanted, "任务 {} 没有进入预期状态", $task_id);
        last
    }};
}

#[actix_web::test]
async fn test_cancel_running_task() {
    let data = web::Data::new(AppState::new(ServerConfig {
        max_resolution: 256,
        ..ServerConfig::default()
    }));
    let app = test::init_service(App::new().app_data(data).configure(routes::configure)).await;

    let req = test::TestRequest::post()
        .uri("/field")
        .set_json(json!({ "resolution": 200, "max_iterations": 200 }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let task_id = created["task_id"].as_str().expect("缺少 task_id").to_string();

    // 计算尚未完成时 chunk 返回 202
    let req = test::TestRequest::get()
        .uri(&format!("/field/chunk?task_id={}&chunk_index=0", task_id))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::ACCEPTED);

    let req = test::TestRequest::delete()
        .uri(&format!("/field?task_id={}", task_id))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::ACCEPTED);

    let status = poll_status!(&app, &task_id, "cancelled");
    assert_eq!(status["remaining_chunks"], 8);

    // 已取消的任务没有数据可取
    let req = test::TestRequest::get()
        .uri(&format!("/field/chunk?task_id={}&chunk_index=0", task_id))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    // 再次取消已结束的任务
    let req = test::TestRequest::delete()
        .uri(&format!("/field?task_id={}", task_id))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_cancel_completed_task_is_conflict() {
    let app = test::init_service(App::new().app_data(state()).configure(routes::configure)).await;

    let req = test::TestRequest::post()
        .uri("/field")
        .set_json(json!({ "resolution": 3 }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let task_id = created["task_id"].as_str().expect("缺少 task_id").to_string();
    poll_status!(&app, &task_id, "completed");

    let req = test::TestRequest::delete()
        .uri(&format!("/field?task_id={}", task_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["state"]["status"], "completed");
}
