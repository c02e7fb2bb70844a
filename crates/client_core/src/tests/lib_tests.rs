use super::*;
use std::{sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use shared::{
    domain::{Table, TableName, TableStatus, TeamId},
    protocol::{ActionResponse, Correction, CorrectionFilter, CorrectionsQuery, TableAction},
};
use tokio::{
    net::TcpListener,
    sync::{Mutex, Notify},
};

#[derive(Default)]
struct StoreState {
    tables: Vec<Table>,
    last_update: i64,
    actions: Vec<(String, String, Option<Value>)>,
    table_fetches: usize,
    reject_with: Option<String>,
    reject_endpoint: Option<(String, String)>,
    ignore_filters: bool,
    serve_watermark: Option<i64>,
    hold: Option<Arc<Notify>>,
    corrections: Vec<Correction>,
}

#[derive(Clone, Default)]
struct MockStore {
    state: Arc<Mutex<StoreState>>,
}

#[derive(Deserialize)]
struct WatermarkQuery {
    last_update: i64,
}

fn encode_tables(tables: &[Table]) -> String {
    let map: serde_json::Map<String, Value> = tables
        .iter()
        .map(|table| {
            (
                table.name.to_string(),
                serde_json::to_value(table).expect("encode table"),
            )
        })
        .collect();
    Value::Object(map).to_string()
}

fn decode_action(endpoint: &str, body: Option<&Value>) -> Option<TableAction> {
    let team = |key: &str| {
        body.and_then(|body| body.get(key))
            .and_then(Value::as_str)
            .map(TeamId::from)
    };
    Some(match endpoint {
        "start_coordination" => TableAction::StartCoordination { team: team("team")? },
        "finish_coordination" => TableAction::FinishCoordination,
        "pause_coordination" => TableAction::PauseCoordination,
        "switch_to_calling" => TableAction::SwitchToCalling,
        "switch_to_busy" => TableAction::SwitchToBusy,
        "call_team" => TableAction::CallTeam { team: team("team")? },
        "skip_to_next" => TableAction::SkipToNext,
        "add_to_queue" => TableAction::AddToQueue {
            team: team("team")?,
            pos: body
                .and_then(|body| body.get("pos"))
                .and_then(Value::as_u64)
                .map(|pos| pos as usize),
        },
        "remove_from_queue" => TableAction::RemoveFromQueue { team: team("team")? },
        "swap_teams_in_queue" => {
            let teams = body?.get("teams")?.as_array()?;
            TableAction::SwapTeamsInQueue {
                first: TeamId::from(teams.first()?.as_str()?),
                second: TeamId::from(teams.get(1)?.as_str()?),
            }
        }
        _ => return None,
    })
}

async fn get_all_tables(
    State(store): State<MockStore>,
    Query(query): Query<WatermarkQuery>,
) -> Json<Value> {
    let state = store.state.lock().await;
    let last_update = state.serve_watermark.unwrap_or(state.last_update);
    if query.last_update == last_update {
        return Json(json!({ "ok": true, "changed": false }));
    }
    Json(json!({
        "ok": true,
        "changed": true,
        "last_update": last_update,
        "tables": encode_tables(&state.tables),
    }))
}

async fn get_table(State(store): State<MockStore>, Path(name): Path<String>) -> Json<Value> {
    let mut state = store.state.lock().await;
    state.table_fetches += 1;
    match state.tables.iter().find(|table| table.name.as_str() == name) {
        Some(table) => Json(json!({
            "ok": true,
            "table_data": serde_json::to_string(table).expect("encode table"),
        })),
        None => Json(json!({ "ok": false, "message": format!("Table {name} does not exist.") })),
    }
}

async fn table_action(
    State(store): State<MockStore>,
    Path((name, endpoint)): Path<(String, String)>,
    body: Bytes,
) -> Json<ActionResponse> {
    let body: Option<Value> = serde_json::from_slice(&body).ok();
    let hold = {
        let mut state = store.state.lock().await;
        state
            .actions
            .push((name.clone(), endpoint.clone(), body.clone()));
        state.hold.clone()
    };
    if let Some(hold) = hold {
        hold.notified().await;
    }

    let mut state = store.state.lock().await;
    if let Some(message) = state.reject_with.clone() {
        return Json(ActionResponse::rejected(message));
    }
    if let Some((rejected, message)) = &state.reject_endpoint {
        if *rejected == endpoint {
            return Json(ActionResponse::rejected(message.clone()));
        }
    }
    let Some(action) = decode_action(&endpoint, body.as_ref()) else {
        return Json(ActionResponse::rejected("unknown action"));
    };
    let Some(table) = state
        .tables
        .iter_mut()
        .find(|table| table.name.as_str() == name)
    else {
        return Json(ActionResponse::rejected(format!(
            "Table {name} does not exist."
        )));
    };
    match table.apply(&action, 1_000) {
        Ok(()) => {
            state.last_update += 1;
            Json(ActionResponse::accepted())
        }
        Err(err) => Json(ActionResponse::rejected(err.to_string())),
    }
}

async fn history_corrections(
    State(store): State<MockStore>,
    Json(query): Json<CorrectionsQuery>,
) -> Json<Value> {
    let state = store.state.lock().await;
    let matched: Vec<_> = state
        .corrections
        .iter()
        .filter(|correction| state.ignore_filters || query.filters.matches(correction))
        .cloned()
        .collect();
    Json(json!({ "ok": true, "corrections": matched }))
}

async fn history_add(State(store): State<MockStore>, Json(body): Json<Value>) -> Json<ActionResponse> {
    let mut state = store.state.lock().await;
    let id = format!("ID{}", state.corrections.len() + 1);
    let correction = Correction {
        team: TeamId::from(body["team"].as_str().unwrap_or_default()),
        table: body["table"].as_str().unwrap_or_default().to_string(),
        start_time: body["start_time"].as_i64().unwrap_or_default(),
        end_time: body["end_time"].as_i64().unwrap_or_default(),
        id,
    };
    state.corrections.push(correction);
    Json(ActionResponse::accepted())
}

async fn history_delete(
    State(store): State<MockStore>,
    Json(body): Json<Value>,
) -> Json<ActionResponse> {
    let mut state = store.state.lock().await;
    let id = body["correction_id"].as_str().unwrap_or_default();
    let before = state.corrections.len();
    state.corrections.retain(|correction| correction.id != id);
    if state.corrections.len() == before {
        Json(ActionResponse::rejected(format!("Correction {id} does not exist.")))
    } else {
        Json(ActionResponse::accepted())
    }
}

fn sample_tables() -> Vec<Table> {
    let idle = Table::new("T2", TableStatus::Busy, 1_200).with_queue(["ITA", "ENG", "IND"]);
    let calling = Table::new("T5", TableStatus::Calling, 1_200).with_queue(["IND", "KOR", "ENG", "USA"]);
    let mut correcting = Table::new("T8", TableStatus::Correcting, 1_200).with_queue(["KOR", "ENG", "FRA"]);
    correcting.current_coordination_team = Some(TeamId::from("USA"));
    correcting.current_coordination_start_time = Some(10);
    vec![idle, calling, correcting]
}

async fn spawn_store(tables: Vec<Table>) -> Result<(String, MockStore)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let store = MockStore::default();
    {
        let mut state = store.state.lock().await;
        state.tables = tables;
        state.last_update = 1;
    }
    let app = Router::new()
        .route("/tables/get_all", get(get_all_tables))
        .route("/table/:name/get_all", get(get_table))
        .route("/table/:name/:action", post(table_action))
        .route("/history/get_corrections", get(history_corrections))
        .route("/history/add", post(history_add))
        .route("/history/delete", post(history_delete))
        .with_state(store.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), store))
}

async fn connect(server_url: &str) -> (Arc<SyncClient>, CoordinationController) {
    let transport: Arc<dyn StoreTransport> =
        Arc::new(HttpStore::new(server_url).expect("store url"));
    let sync = SyncClient::new(transport);
    let controller = CoordinationController::new(Arc::clone(&sync));
    (sync, controller)
}

fn name(table: &str) -> TableName {
    TableName::from(table)
}

#[tokio::test]
async fn first_refresh_loads_all_tables() {
    let (server_url, _store) = spawn_store(sample_tables()).await.expect("spawn store");
    let (sync, _controller) = connect(&server_url).await;

    let outcome = sync.refresh().await.expect("refresh");
    assert_eq!(outcome, RefreshOutcome::Applied { last_update: 1 });

    let snapshot = sync.snapshot().await;
    assert_eq!(snapshot.tables().len(), 3);
    assert_eq!(
        snapshot.table(&name("T5")).map(|table| table.status),
        Some(TableStatus::Calling)
    );
}

#[tokio::test]
async fn unchanged_refresh_keeps_snapshot_and_watermark() {
    let (server_url, _store) = spawn_store(sample_tables()).await.expect("spawn store");
    let (sync, _controller) = connect(&server_url).await;

    sync.refresh().await.expect("first refresh");
    let before = sync.snapshot().await;

    let outcome = sync.refresh().await.expect("second refresh");
    assert_eq!(outcome, RefreshOutcome::Unchanged);
    assert_eq!(sync.snapshot().await, before);
}

#[tokio::test]
async fn out_of_order_response_is_discarded() {
    let (server_url, store) = spawn_store(sample_tables()).await.expect("spawn store");
    let (sync, _controller) = connect(&server_url).await;

    store.state.lock().await.last_update = 10;
    sync.refresh().await.expect("refresh");
    let before = sync.snapshot().await;

    {
        let mut state = store.state.lock().await;
        state.serve_watermark = Some(4);
        state.tables.clear();
    }
    let outcome = sync.refresh().await.expect("stale refresh");
    assert_eq!(
        outcome,
        RefreshOutcome::Stale {
            received: 4,
            current: 10
        }
    );
    assert_eq!(sync.snapshot().await, before);
}

#[tokio::test]
async fn transport_failure_leaves_last_known_state() {
    let (server_url, _store) = spawn_store(sample_tables()).await.expect("spawn store");
    let (sync, _controller) = connect(&server_url).await;
    sync.refresh().await.expect("refresh");
    let before = sync.snapshot().await;

    let dead: Arc<dyn StoreTransport> =
        Arc::new(HttpStore::new("http://127.0.0.1:9").expect("store url"));
    let detached = SyncClient::with_snapshot(dead, sync.snapshot_handle());
    let err = detached.refresh().await.expect_err("must fail");
    assert!(err.is_transport(), "unexpected error: {err}");
    assert_eq!(sync.snapshot().await, before);
}

#[tokio::test]
async fn refresh_table_merges_single_table() {
    let (server_url, store) = spawn_store(sample_tables()).await.expect("spawn store");
    let (sync, _controller) = connect(&server_url).await;
    sync.refresh().await.expect("refresh");

    store.state.lock().await.tables[0].status = TableStatus::Calling;
    let table = sync.refresh_table(&name("T2")).await.expect("table");

    assert_eq!(table.status, TableStatus::Calling);
    let snapshot = sync.snapshot().await;
    assert_eq!(
        snapshot.table(&name("T2")).map(|table| table.status),
        Some(TableStatus::Calling)
    );
    assert_eq!(snapshot.last_update(), 1);
    assert_eq!(store.state.lock().await.table_fetches, 1);
}

#[tokio::test]
async fn start_coordination_posts_team_and_refreshes() {
    let (server_url, store) = spawn_store(sample_tables()).await.expect("spawn store");
    let (sync, controller) = connect(&server_url).await;
    sync.refresh().await.expect("refresh");

    controller
        .start_coordination(&name("T5"), TeamId::from("IND"))
        .await
        .expect("start");

    let actions = store.state.lock().await.actions.clone();
    assert_eq!(
        actions,
        vec![(
            "T5".to_string(),
            "start_coordination".to_string(),
            Some(json!({ "team": "IND" }))
        )]
    );

    let snapshot = sync.snapshot().await;
    assert_eq!(snapshot.last_update(), 2);
    let table = snapshot.table(&name("T5")).expect("T5");
    assert_eq!(table.status, TableStatus::Correcting);
    assert_eq!(table.current_coordination_team, Some(TeamId::from("IND")));
    assert!(!controller.is_pending(&name("T5")));
}

#[tokio::test]
async fn finish_with_call_next_switches_to_calling() {
    let (server_url, store) = spawn_store(sample_tables()).await.expect("spawn store");
    let (sync, controller) = connect(&server_url).await;
    sync.refresh().await.expect("refresh");

    controller
        .finish_coordination(&name("T8"), true)
        .await
        .expect("finish");

    let endpoints: Vec<_> = store
        .state
        .lock()
        .await
        .actions
        .iter()
        .map(|(_, endpoint, _)| endpoint.clone())
        .collect();
    assert_eq!(endpoints, vec!["finish_coordination", "switch_to_calling"]);
    assert_eq!(
        sync.snapshot()
            .await
            .table(&name("T8"))
            .map(|table| table.status),
        Some(TableStatus::Calling)
    );
}

#[tokio::test]
async fn failed_call_next_still_refreshes_finished_table() {
    let (server_url, store) = spawn_store(sample_tables()).await.expect("spawn store");
    let (sync, controller) = connect(&server_url).await;
    sync.refresh().await.expect("refresh");

    store.state.lock().await.reject_endpoint =
        Some(("switch_to_calling".into(), "calling disabled".into()));
    let err = controller
        .finish_coordination(&name("T8"), true)
        .await
        .expect_err("switch rejected");
    assert_eq!(err.to_string(), "calling disabled");

    let snapshot = sync.snapshot().await;
    assert_eq!(snapshot.last_update(), 2);
    let table = snapshot.table(&name("T8")).expect("T8");
    assert_eq!(table.status, TableStatus::Busy);
    assert_eq!(table.current_coordination_team, None);
    assert!(!controller.is_pending(&name("T8")));

    store.state.lock().await.reject_endpoint = None;
    controller
        .start_coordination(&name("T8"), TeamId::from("KOR"))
        .await
        .expect("table is free again");
}

#[tokio::test]
async fn finish_without_call_next_leaves_table_busy() {
    let (server_url, _store) = spawn_store(sample_tables()).await.expect("spawn store");
    let (sync, controller) = connect(&server_url).await;
    sync.refresh().await.expect("refresh");

    controller
        .finish_coordination(&name("T8"), false)
        .await
        .expect("finish");
    assert_eq!(
        sync.snapshot()
            .await
            .table(&name("T8"))
            .map(|table| table.status),
        Some(TableStatus::Busy)
    );
}

#[tokio::test]
async fn locally_invalid_action_never_reaches_store() {
    let (server_url, store) = spawn_store(sample_tables()).await.expect("spawn store");
    let (sync, controller) = connect(&server_url).await;
    sync.refresh().await.expect("refresh");

    let err = controller
        .finish_coordination(&name("T2"), true)
        .await
        .expect_err("T2 is not correcting");
    assert!(matches!(err, BoardError::Precondition { .. }), "{err}");

    let err = controller
        .add_to_queue(&name("T2"), TeamId::from("ITA"), None)
        .await
        .expect_err("ITA already queued");
    assert!(err.is_rejection());

    assert!(store.state.lock().await.actions.is_empty());
    assert!(!controller.is_pending(&name("T2")));
}

#[tokio::test]
async fn store_rejection_message_is_surfaced_verbatim() {
    let (server_url, store) = spawn_store(sample_tables()).await.expect("spawn store");
    let (sync, controller) = connect(&server_url).await;
    sync.refresh().await.expect("refresh");
    let mut events = sync.subscribe_events();

    store.state.lock().await.reject_with = Some("Team KOR is not in queue at table T5.".into());
    let err = controller
        .remove_from_queue(&name("T5"), TeamId::from("KOR"))
        .await
        .expect_err("rejected");

    assert_eq!(err.to_string(), "Team KOR is not in queue at table T5.");
    assert_eq!(
        events.recv().await.expect("event"),
        BoardEvent::ActionRejected {
            table: name("T5"),
            message: "Team KOR is not in queue at table T5.".into(),
        }
    );
    assert_eq!(sync.snapshot().await.last_update(), 1);
    assert!(!controller.is_pending(&name("T5")));
}

#[tokio::test]
async fn unknown_table_is_left_to_the_store() {
    let (server_url, store) = spawn_store(sample_tables()).await.expect("spawn store");
    let (_sync, controller) = connect(&server_url).await;

    let err = controller
        .switch_to_busy(&name("T99"))
        .await
        .expect_err("rejected by store");
    assert_eq!(err.to_string(), "Table T99 does not exist.");
    assert_eq!(store.state.lock().await.actions.len(), 1);
}

#[tokio::test]
async fn second_mutation_on_same_table_is_refused_while_in_flight() {
    let (server_url, store) = spawn_store(sample_tables()).await.expect("spawn store");
    let (sync, controller) = connect(&server_url).await;
    sync.refresh().await.expect("refresh");

    let hold = Arc::new(Notify::new());
    store.state.lock().await.hold = Some(Arc::clone(&hold));
    let controller = Arc::new(controller);

    let first = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.skip_to_next(&name("T5")).await })
    };
    while store.state.lock().await.actions.is_empty() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(controller.is_pending(&name("T5")));

    let err = controller
        .skip_to_next(&name("T5"))
        .await
        .expect_err("in flight");
    assert!(matches!(err, BoardError::InFlight { .. }), "{err}");

    store.state.lock().await.hold = None;
    hold.notify_one();
    first.await.expect("join").expect("first skip");

    assert_eq!(store.state.lock().await.actions.len(), 1);
    assert!(!controller.is_pending(&name("T5")));
    assert_eq!(
        sync.snapshot().await.table(&name("T5")).expect("T5").queue[0],
        TeamId::from("KOR")
    );
}

#[tokio::test]
async fn other_tables_are_not_blocked_by_in_flight_mutation() {
    let (server_url, store) = spawn_store(sample_tables()).await.expect("spawn store");
    let (sync, controller) = connect(&server_url).await;
    sync.refresh().await.expect("refresh");

    let hold = Arc::new(Notify::new());
    store.state.lock().await.hold = Some(Arc::clone(&hold));
    let controller = Arc::new(controller);

    let first = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.switch_to_busy(&name("T5")).await })
    };
    while store.state.lock().await.actions.is_empty() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    store.state.lock().await.hold = None;

    controller
        .switch_to_calling(&name("T2"))
        .await
        .expect("other table");

    hold.notify_one();
    first.await.expect("join").expect("first switch");
}

#[tokio::test]
async fn queue_edits_round_trip_through_store() {
    let (server_url, store) = spawn_store(sample_tables()).await.expect("spawn store");
    let (sync, controller) = connect(&server_url).await;
    sync.refresh().await.expect("refresh");
    let original = sync.snapshot().await.table(&name("T2")).expect("T2").queue.clone();

    controller
        .add_to_queue(&name("T2"), TeamId::from("KOR"), Some(1))
        .await
        .expect("add");
    assert_eq!(
        sync.snapshot().await.table(&name("T2")).expect("T2").queue[1],
        TeamId::from("KOR")
    );

    controller
        .swap_teams_in_queue(&name("T2"), TeamId::from("ITA"), TeamId::from("IND"))
        .await
        .expect("swap");
    controller
        .swap_teams_in_queue(&name("T2"), TeamId::from("ITA"), TeamId::from("IND"))
        .await
        .expect("swap back");
    controller
        .remove_from_queue(&name("T2"), TeamId::from("KOR"))
        .await
        .expect("remove");

    assert_eq!(
        sync.snapshot().await.table(&name("T2")).expect("T2").queue,
        original
    );
    let bodies: Vec<_> = store
        .state
        .lock()
        .await
        .actions
        .iter()
        .map(|(_, _, body)| body.clone())
        .collect();
    assert_eq!(bodies[0], Some(json!({ "team": "KOR", "pos": 1 })));
    assert_eq!(bodies[1], Some(json!({ "teams": ["ITA", "IND"] })));
}

#[tokio::test]
async fn pause_and_call_team_follow_state_machine() {
    let (server_url, _store) = spawn_store(sample_tables()).await.expect("spawn store");
    let (sync, controller) = connect(&server_url).await;
    sync.refresh().await.expect("refresh");

    controller.pause_coordination(&name("T8")).await.expect("pause");
    let table = sync.snapshot().await.table(&name("T8")).cloned().expect("T8");
    assert_eq!(table.status, TableStatus::Busy);
    assert_eq!(table.queue[0], TeamId::from("USA"));

    let err = controller
        .call_team(&name("T8"), TeamId::from("USA"))
        .await
        .expect_err("not calling");
    assert!(matches!(err, BoardError::Precondition { .. }));

    controller.switch_to_calling(&name("T8")).await.expect("calling");
    controller
        .call_team(&name("T8"), TeamId::from("USA"))
        .await
        .expect("call");
}

#[tokio::test]
async fn polling_picks_up_store_changes() {
    let (server_url, store) = spawn_store(sample_tables()).await.expect("spawn store");
    let (sync, _controller) = connect(&server_url).await;
    let mut events = sync.subscribe_events();

    let poller = sync.spawn_polling(Duration::from_millis(20));
    assert_eq!(
        events.recv().await.expect("first event"),
        BoardEvent::SnapshotUpdated { last_update: 1 }
    );

    {
        let mut state = store.state.lock().await;
        state.tables[0].queue.clear();
        state.last_update = 2;
    }
    assert_eq!(
        events.recv().await.expect("second event"),
        BoardEvent::SnapshotUpdated { last_update: 2 }
    );
    poller.abort();

    assert!(sync
        .snapshot()
        .await
        .table(&name("T2"))
        .expect("T2")
        .queue
        .is_empty());
}

#[tokio::test]
async fn try_refresh_drops_tick_while_refresh_is_running() {
    let (server_url, _store) = spawn_store(sample_tables()).await.expect("spawn store");
    let (sync, _controller) = connect(&server_url).await;

    let _gate = sync.refresh_gate.lock().await;
    assert_eq!(
        sync.try_refresh().await.expect("try refresh"),
        RefreshOutcome::Skipped
    );
}

#[tokio::test]
async fn history_round_trip() {
    let (server_url, _store) = spawn_store(sample_tables()).await.expect("spawn store");
    let (sync, _controller) = connect(&server_url).await;
    let history = HistoryClient::new(sync.transport());

    history
        .add(TeamId::from("USA"), &name("T2"), 5, 605)
        .await
        .expect("add");
    history
        .add(TeamId::from("ENG"), &name("T5"), 8, 12)
        .await
        .expect("add");
    let err = history
        .add(TeamId::from("ENG"), &name("T5"), 20, 10)
        .await
        .expect_err("negative duration");
    assert!(matches!(err, BoardError::InvalidCorrection { .. }));

    let t2 = history.corrections_for_table(&name("T2")).await.expect("list");
    assert_eq!(t2.len(), 1);
    assert_eq!(t2[0].team, TeamId::from("USA"));

    // (600 + 4 * 1200) / 5
    assert_eq!(
        history
            .expected_duration(&name("T2"), 5, 1_200)
            .await
            .expect("expected"),
        1_080
    );

    history.delete("ID1").await.expect("delete");
    let err = history.delete("ID1").await.expect_err("already gone");
    assert_eq!(err.to_string(), "Correction ID1 does not exist.");
    assert!(history
        .corrections(&CorrectionFilter::default())
        .await
        .expect("list")
        .iter()
        .all(|correction| correction.id != "ID1"));
}

#[tokio::test]
async fn history_is_narrowed_when_store_ignores_filters() {
    let (server_url, store) = spawn_store(sample_tables()).await.expect("spawn store");
    let (sync, _controller) = connect(&server_url).await;
    let history = HistoryClient::new(sync.transport());

    history
        .add(TeamId::from("USA"), &name("T2"), 100, 700)
        .await
        .expect("add");
    history
        .add(TeamId::from("ENG"), &name("T5"), 200, 900)
        .await
        .expect("add");
    history
        .add(TeamId::from("ENG"), &name("T2"), 1_000, 1_300)
        .await
        .expect("add");
    store.state.lock().await.ignore_filters = true;

    let eng_at_t2 = history
        .corrections(&CorrectionFilter {
            table: Some("T2".into()),
            team: Some(TeamId::from("ENG")),
            ..CorrectionFilter::default()
        })
        .await
        .expect("list");
    assert_eq!(eng_at_t2.len(), 1);
    assert_eq!(eng_at_t2[0].start_time, 1_000);

    let early = history
        .corrections(&CorrectionFilter {
            start_time: Some((0, 150)),
            ..CorrectionFilter::default()
        })
        .await
        .expect("list");
    assert_eq!(early.len(), 1);
    assert_eq!(early[0].team, TeamId::from("USA"));
}
