use super::*;

fn presence(id: &str) -> Presence {
    Presence { id: id.to_owned(), x: 0.0, y: 0.0, color: "#123456".to_owned() }
}

#[test]
fn registry_new_is_empty() {
    let registry = Registry::new();
    assert!(registry.is_empty());
    assert!(registry.roster().is_empty());
}

#[test]
fn roster_keeps_registration_order() {
    let mut registry = Registry::new();
    for id in ["c", "a", "b"] {
        let (tx, _rx) = outbox(1);
        registry.insert(presence(id), tx);
    }
    let ids: Vec<String> = registry.roster().into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
}

#[test]
fn set_cursor_updates_in_place() {
    let mut registry = Registry::new();
    let (tx, _rx) = outbox(1);
    registry.insert(presence("a"), tx);

    let moved = registry.set_cursor("a", 12.5, -4.0).expect("known connection");
    assert!((moved.x - 12.5).abs() < f64::EPSILON);
    assert!((moved.y + 4.0).abs() < f64::EPSILON);
    assert_eq!(registry.get("a"), Some(&moved));
    assert_eq!(moved.color, "#123456");
}

#[test]
fn set_cursor_for_unknown_connection_is_none() {
    let mut registry = Registry::new();
    assert!(registry.set_cursor("ghost", 1.0, 1.0).is_none());
}

#[test]
fn remove_returns_presence_and_shrinks_roster() {
    let mut registry = Registry::new();
    let (tx_a, _rx_a) = outbox(1);
    let (tx_b, _rx_b) = outbox(1);
    registry.insert(presence("a"), tx_a);
    registry.insert(presence("b"), tx_b);

    assert_eq!(registry.remove("a").map(|p| p.id), Some("a".to_owned()));
    assert!(registry.remove("a").is_none());
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.roster()[0].id, "b");
}

// =============================================================================
// OUTBOX
// =============================================================================

fn cursor(id: &str) -> ServerFrame {
    ServerFrame::CursorUpdate(presence(id))
}

#[test]
fn full_cursor_lane_sheds_cursor_frames_only() {
    let (outbox, mut inbox) = outbox(2);
    assert_eq!(outbox.deliver(cursor("a")), Ok(()));
    assert_eq!(outbox.deliver(cursor("a")), Ok(()));
    assert_eq!(outbox.deliver(cursor("a")), Err(DeliveryError::CursorShed));

    for i in 0..500 {
        let frame = ServerFrame::RemoteObjectDelete(format!("s{i}"));
        assert_eq!(outbox.deliver(frame), Ok(()));
    }

    let mut deletes = 0;
    let mut cursors = 0;
    while let Ok(frame) = inbox.try_recv() {
        match frame {
            ServerFrame::RemoteObjectDelete(id) => {
                assert_eq!(id, format!("s{deletes}"));
                deletes += 1;
            }
            ServerFrame::CursorUpdate(_) => cursors += 1,
            other => panic!("unexpected {}", other.event()),
        }
    }
    assert_eq!(deletes, 500);
    assert_eq!(cursors, 2);
}

#[tokio::test]
async fn inbox_prefers_object_frames_over_cursors() {
    let (outbox, mut inbox) = outbox(4);
    outbox.deliver(cursor("a")).expect("cursor queued");
    outbox.deliver(ServerFrame::RemoteObjectDelete("s1".into())).expect("delete queued");

    assert_eq!(inbox.recv().await, Some(ServerFrame::RemoteObjectDelete("s1".into())));
    assert_eq!(inbox.recv().await, Some(cursor("a")));
}

#[test]
fn deliver_to_dropped_inbox_is_closed() {
    let (outbox, inbox) = outbox(1);
    drop(inbox);
    assert_eq!(outbox.deliver(ServerFrame::RemoteObjectDelete("s1".into())), Err(DeliveryError::Closed));
    assert_eq!(outbox.deliver(cursor("a")), Err(DeliveryError::Closed));
}
