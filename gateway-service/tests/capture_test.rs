mod common;

use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::make_state;
use gateway_service::capture::{CaptureChannel, ModifyTask};
use gateway_service::routes;
use kv_store::KvStore;

#[tokio::test]
async fn pushed_tasks_reach_the_capture_client_intact() {
    let kv = KvStore::in_memory();
    let capture = CaptureChannel::new(kv);
    let task = ModifyTask::new(123, 7, true, false);

    capture.push("CODE", &task, None).await.unwrap();

    let raw = capture
        .next_task("CODE", Duration::from_millis(10))
        .await
        .unwrap();
    let decoded: ModifyTask = serde_json::from_str(&raw).unwrap();
    assert_eq!(decoded, task);
}

#[tokio::test]
async fn ack_is_delivered_exactly_once() {
    let kv = KvStore::in_memory();
    let capture = CaptureChannel::new(kv);
    let task = ModifyTask::new(123, 7, true, false);

    let subscription = capture.subscribe_completion(&task.task_id).await.unwrap();
    capture.push("CODE", &task, None).await.unwrap();

    let publisher = capture.clone();
    let task_id = task.task_id.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        publisher.publish_status(&task_id, true).await.unwrap();
    });

    assert!(
        capture
            .wait_for_ack(subscription, Duration::from_millis(200))
            .await
    );

    // A fresh subscription after the ack only ever times out.
    let late = capture.subscribe_completion(&task.task_id).await.unwrap();
    assert!(!capture.wait_for_ack(late, Duration::from_millis(50)).await);
}

#[tokio::test]
async fn capture_task_endpoint_long_polls_and_hands_out_tasks() {
    let kv = KvStore::in_memory();
    let state = make_state(&kv);

    let response = routes::tasks::get_capture_task(
        State(state.clone()),
        Path("CODE".to_string()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let task = ModifyTask::new(123, 7, false, true);
    state.capture.push("CODE", &task, None).await.unwrap();

    let response = routes::tasks::get_capture_task(
        State(state.clone()),
        Path("CODE".to_string()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let decoded: ModifyTask = serde_json::from_slice(&body).unwrap();
    assert_eq!(decoded, task);
}

#[tokio::test]
async fn capture_status_endpoint_acks_the_waiting_dispatcher() {
    let kv = KvStore::in_memory();
    let state = make_state(&kv);
    let task = ModifyTask::new(123, 7, true, true);

    let subscription = state
        .capture
        .subscribe_completion(&task.task_id)
        .await
        .unwrap();

    let status = routes::tasks::set_capture_task_status(
        State(state.clone()),
        Path(task.task_id.clone()),
        "true".to_string(),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::OK);

    assert!(
        state
            .capture
            .wait_for_ack(subscription, Duration::from_millis(100))
            .await
    );
}

#[tokio::test]
async fn capture_status_endpoint_rejects_garbage() {
    let kv = KvStore::in_memory();
    let state = make_state(&kv);

    let err = routes::tasks::set_capture_task_status(
        State(state),
        Path("t1".to_string()),
        "maybe".to_string(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
}
