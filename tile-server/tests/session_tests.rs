//! Session lifecycle tests against an in-memory coordinator.
//!
//! Each client is a `ClientConnection` wired to a plain mpsc channel, so the
//! exact outbound frame sequence can be inspected without a socket.

use serde_json::Value;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tileworld_core::{generate_world, PixelPos, Tile};
use tileworld_server::{ClientConnection, Frame, ServerMetrics, SessionCoordinator};
use tokio::sync::mpsc;

fn coordinator() -> Arc<SessionCoordinator> {
    let world = generate_world(120, 100, 42).unwrap();
    Arc::new(SessionCoordinator::new(world, ServerMetrics::new()))
}

async fn connect(
    coordinator: &Arc<SessionCoordinator>,
    capacity: usize,
) -> (ClientConnection, mpsc::Receiver<Frame>) {
    let (tx, rx) = mpsc::channel(capacity);
    let conn = ClientConnection::open(coordinator.clone(), tx).await.unwrap();
    (conn, rx)
}

fn drain(rx: &mut mpsc::Receiver<Frame>) -> Vec<Value> {
    let mut out = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        out.push(serde_json::from_str(&frame).unwrap());
    }
    out
}

fn types(frames: &[Value]) -> Vec<String> {
    frames
        .iter()
        .map(|f| f["type"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Connect sequence
// ============================================================================

#[tokio::test]
async fn test_world_data_is_first_message() {
    let c = coordinator();
    let (conn, mut rx) = connect(&c, 64).await;
    let frames = drain(&mut rx);

    assert_eq!(types(&frames), vec!["world_data_", "chunk", "biome"]);
    assert_eq!(frames[0]["localId"], conn.id());
    assert_eq!(frames[0]["size"]["x"], 120);
    assert_eq!(frames[0]["size"]["y"], 100);

    let spawn = c.read_world(|w| w.spawn_position());
    assert_eq!(frames[0]["spawnPosition"]["x"], spawn.x);
    assert_eq!(frames[1]["position"]["y"], spawn.y);
    assert_eq!(frames[2]["biome"], c.biome_at(spawn));
    assert!(conn.discovered_chunks() > 0);
}

#[tokio::test]
async fn test_others_see_join_then_position() {
    let c = coordinator();
    let (_a, mut rx_a) = connect(&c, 64).await;
    drain(&mut rx_a);

    let (b, mut rx_b) = connect(&c, 64).await;
    let seen_by_a = drain(&mut rx_a);
    assert_eq!(types(&seen_by_a), vec!["player_joined", "set_player_position"]);
    assert_eq!(seen_by_a[0]["playerId"], b.id());
    assert_eq!(seen_by_a[1]["playerId"], b.id());

    let world_data = &drain(&mut rx_b)[0];
    let players = world_data["players"].as_array().unwrap();
    assert_eq!(players.len(), 2);
}

#[tokio::test]
async fn test_ids_are_not_reused() {
    let c = coordinator();
    let (a, _rx_a) = connect(&c, 64).await;
    let (b, _rx_b) = connect(&c, 64).await;
    assert_eq!((a.id(), b.id()), (0, 1));

    drop(b);
    let (d, _rx_d) = connect(&c, 64).await;
    assert_eq!(d.id(), 2);
    assert_eq!(c.player_count(), 2);
}

// ============================================================================
// Position updates
// ============================================================================

#[tokio::test]
async fn test_same_position_only_resends_biome() {
    let c = coordinator();
    let (mut a, mut rx) = connect(&c, 64).await;
    drain(&mut rx);

    let pos = a.position();
    let msg = format!(r#"{{"type":"SetPosition","position":[{},{}]}}"#, pos.x, pos.y);
    a.on_message(&msg).await.unwrap();
    assert_eq!(types(&drain(&mut rx)), vec!["biome"]);
}

#[tokio::test]
async fn test_moving_reveals_then_settles() {
    let world = generate_world(400, 100, 42).unwrap();
    let c = Arc::new(SessionCoordinator::new(world, ServerMetrics::new()));
    let (mut a, mut rx) = connect(&c, 64).await;
    drain(&mut rx);
    let before = a.discovered_chunks();

    // Spawn is at tile x=200 (chunk 4); chunk 0 is out of view
    a.on_message(r#"{"type":"SetPosition","position":[0,0]}"#).await.unwrap();
    let frames = drain(&mut rx);
    assert_eq!(types(&frames), vec!["chunk", "biome"]);
    assert!(a.discovered_chunks() > before);
    assert_eq!(a.position(), PixelPos::new(0.0, 0.0));
    assert_eq!(c.player_position(a.id()), Some(PixelPos::new(0.0, 0.0)));

    a.on_message(r#"{"type":"SetPosition","position":[10,10]}"#).await.unwrap();
    assert_eq!(types(&drain(&mut rx)), vec!["biome"]);
}

#[tokio::test]
async fn test_position_broadcast_excludes_sender() {
    let c = coordinator();
    let (mut a, mut rx_a) = connect(&c, 64).await;
    let (_b, mut rx_b) = connect(&c, 64).await;
    drain(&mut rx_a);
    drain(&mut rx_b);

    a.on_message(r#"{"type":"SetPosition","position":[80,120]}"#).await.unwrap();
    assert!(!types(&drain(&mut rx_a)).contains(&"set_player_position".to_string()));
    let seen_by_b = drain(&mut rx_b);
    assert_eq!(types(&seen_by_b), vec!["set_player_position"]);
    assert_eq!(seen_by_b[0]["position"]["x"], 80.0);
    assert_eq!(seen_by_b[0]["playerId"], a.id());
}

// ============================================================================
// Tile edits
// ============================================================================

#[tokio::test]
async fn test_tile_edit_relayed_verbatim() {
    let c = coordinator();
    let (mut a, mut rx_a) = connect(&c, 64).await;
    let (_b, mut rx_b) = connect(&c, 64).await;
    drain(&mut rx_a);
    drain(&mut rx_b);

    let raw = r#"{"type":"SetTile","position":[3,4],"tile":{"tile_index":7,"item_drop":3}}"#;
    a.on_message(raw).await.unwrap();

    assert!(drain(&mut rx_a).is_empty());
    let frame = rx_b.try_recv().unwrap();
    assert_eq!(&*frame, raw);
    assert_eq!(c.read_world(|w| w.tile(3, 4)), Some(Tile::new(7, 3, 3, 4)));
    assert_eq!(c.metrics().tile_edits.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_tile_removal() {
    let c = coordinator();
    let (mut a, _rx) = connect(&c, 64).await;
    let column_bottom = c.read_world(|w| w.height() - 1);
    let raw = format!(r#"{{"type":"SetTile","position":[10,{}],"tile":null}}"#, column_bottom);
    a.on_message(&raw).await.unwrap();
    assert_eq!(c.read_world(|w| w.tile(10, column_bottom)), None);
}

#[tokio::test]
async fn test_out_of_bounds_edit_not_relayed() {
    let c = coordinator();
    let (mut a, _rx_a) = connect(&c, 64).await;
    let (_b, mut rx_b) = connect(&c, 64).await;
    drain(&mut rx_b);

    let before = c.read_world(|w| w.digest());
    a.on_message(r#"{"type":"SetTile","position":[5000,4],"tile":null}"#).await.unwrap();
    a.on_message(r#"{"type":"SetTile","position":[-1,4],"tile":null}"#).await.unwrap();

    assert!(drain(&mut rx_b).is_empty());
    assert_eq!(c.read_world(|w| w.digest()), before);
    assert_eq!(c.metrics().tile_edits.load(Ordering::Relaxed), 0);
}

// ============================================================================
// Bad input
// ============================================================================

#[tokio::test]
async fn test_malformed_messages_keep_connection() {
    let c = coordinator();
    let (mut a, mut rx) = connect(&c, 64).await;
    drain(&mut rx);

    a.on_message("{{{").await.unwrap();
    a.on_message(r#"{"type":"SetPosition"}"#).await.unwrap();
    a.on_message(r#"{"type":"Teleport","position":[1,1]}"#).await.unwrap();

    assert!(drain(&mut rx).is_empty());
    let m = c.metrics();
    assert_eq!(m.decode_failures.load(Ordering::Relaxed), 2);
    assert_eq!(m.messages_received.load(Ordering::Relaxed), 3);
    assert_eq!(c.player_count(), 1);
}

// ============================================================================
// Teardown & backpressure
// ============================================================================

#[tokio::test]
async fn test_disconnect_broadcasts_player_left_once() {
    let c = coordinator();
    let (_a, mut rx_a) = connect(&c, 64).await;
    let (b, _rx_b) = connect(&c, 64).await;
    let b_id = b.id();
    drain(&mut rx_a);

    b.close();
    let seen = drain(&mut rx_a);
    assert_eq!(types(&seen), vec!["player_left"]);
    assert_eq!(seen[0]["playerId"], b_id);
    assert_eq!(c.player_count(), 1);
    assert_eq!(c.metrics().connections_closed.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_slow_client_does_not_stall_others() {
    let c = coordinator();
    let (mut a, mut rx_a) = connect(&c, 256).await;
    let (_slow, mut rx_slow) = connect(&c, 8).await;
    // world_data_, chunk, biome; leaves all 8 slots free
    assert_eq!(drain(&mut rx_slow).len(), 3);
    drain(&mut rx_a);

    for step in 0..20 {
        let msg = format!(r#"{{"type":"SetPosition","position":[{},0]}}"#, step);
        a.on_message(&msg).await.unwrap();
    }

    assert_eq!(drain(&mut rx_slow).len(), 8);
    assert_eq!(c.metrics().frames_dropped.load(Ordering::Relaxed), 12);
    assert_eq!(c.player_count(), 2);
}

#[tokio::test]
async fn test_closed_outbound_ends_session() {
    let c = coordinator();
    let (mut a, rx) = connect(&c, 64).await;
    drop(rx);
    assert!(a.on_message(r#"{"type":"SetPosition","position":[0,0]}"#).await.is_err());
}
