mod common;

use axum::extract::State;
use axum::http::StatusCode;
use common::make_state;
use gateway_service::guild_index::GuildIndex;
use gateway_service::hashing::hash_token;
use gateway_service::ingress::EventIngress;
use gateway_service::jobs::{self, Job, JobKind};
use gateway_service::keys;
use gateway_service::platform::{EventHandler, GatewayEvent, VoiceState};
use gateway_service::routes;
use kv_store::KvStore;

fn voice_state() -> VoiceState {
    VoiceState {
        guild_id: "123".into(),
        channel_id: Some("456".into()),
        user_id: "7".into(),
        session_id: "s1".into(),
        mute: false,
        deaf: false,
        self_mute: false,
        self_deaf: false,
    }
}

#[tokio::test]
async fn empty_queue_long_poll_returns_202() {
    let kv = KvStore::in_memory();
    let state = make_state(&kv);

    let response = routes::jobs::request_job(State(state)).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["status"], "No jobs available");
}

#[tokio::test]
async fn queued_event_round_trips_through_the_long_poll() {
    let kv = KvStore::in_memory();
    let state = make_state(&kv);
    let ingress = EventIngress::new(
        kv.clone(),
        GuildIndex::new(kv.clone()),
        hash_token("primary-token"),
        1,
    );

    // A live game gates voice-state ingress on.
    kv.sadd(&keys::guild_games("123"), "CODE").await.unwrap();
    kv.set(&keys::game_heartbeat("CODE"), "1").await.unwrap();

    let event = voice_state();
    ingress
        .on_event(GatewayEvent::VoiceStateUpdate(event.clone()))
        .await;

    let response = routes::jobs::request_job(State(state)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let job: Job = serde_json::from_slice(&body).unwrap();
    assert_eq!(job.kind, JobKind::VoiceStateUpdate);
    assert_eq!(job.payload, serde_json::to_string(&event).unwrap());

    let decoded: VoiceState = serde_json::from_str(&job.payload).unwrap();
    assert_eq!(decoded, event);
}

#[tokio::test]
async fn job_count_is_zero_on_a_fresh_instance() {
    let kv = KvStore::in_memory();
    let state = make_state(&kv);

    let axum::Json(counts) = routes::jobs::job_count(State(state)).await.unwrap();
    assert_eq!(counts.jobs, 0);
}

#[tokio::test]
async fn job_count_tracks_pushes_and_pops() {
    let kv = KvStore::in_memory();
    let state = make_state(&kv);

    jobs::push_job(&kv, JobKind::GuildDelete, "{}".into())
        .await
        .unwrap();
    jobs::push_job(&kv, JobKind::GuildCreate, "{}".into())
        .await
        .unwrap();

    let axum::Json(counts) = routes::jobs::job_count(State(state.clone())).await.unwrap();
    assert_eq!(counts.jobs, 2);

    let response = routes::jobs::request_job(State(state.clone())).await;
    assert_eq!(response.status(), StatusCode::OK);

    let axum::Json(counts) = routes::jobs::job_count(State(state)).await.unwrap();
    assert_eq!(counts.jobs, 1);
}

#[tokio::test]
async fn jobs_are_popped_in_push_order() {
    let kv = KvStore::in_memory();
    let state = make_state(&kv);

    jobs::push_job(&kv, JobKind::GuildCreate, "first".into())
        .await
        .unwrap();
    jobs::push_job(&kv, JobKind::GuildCreate, "second".into())
        .await
        .unwrap();

    for expected in ["first", "second"] {
        let response = routes::jobs::request_job(State(state.clone())).await;
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let job: Job = serde_json::from_slice(&body).unwrap();
        assert_eq!(job.payload, expected);
    }
}
