use super::*;

fn peer(id: &str, x: f64, y: f64) -> Presence {
    Presence { id: id.to_owned(), x, y, color: "#8a8178".to_owned() }
}

#[test]
fn roster_excludes_self() {
    let mut view = PresenceView::new();
    view.set_self_id("me");
    view.apply_roster(vec![peer("a", 0.0, 0.0), peer("me", 0.0, 0.0), peer("b", 0.0, 0.0)]);

    let ids: Vec<_> = view.others().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn roster_before_identity_is_filtered_once_identity_arrives() {
    let mut view = PresenceView::new();
    view.apply_roster(vec![peer("me", 0.0, 0.0), peer("a", 0.0, 0.0)]);
    assert_eq!(view.others().len(), 2);

    view.set_self_id("me");
    assert_eq!(view.others().len(), 1);
    assert_eq!(view.self_id(), Some("me"));
}

#[test]
fn roster_replaces_previous_peers() {
    let mut view = PresenceView::new();
    view.set_self_id("me");
    view.apply_roster(vec![peer("a", 0.0, 0.0), peer("b", 0.0, 0.0)]);
    view.apply_roster(vec![peer("b", 0.0, 0.0)]);

    assert!(view.get("a").is_none());
    assert!(view.get("b").is_some());
}

#[test]
fn cursor_moves_known_peer() {
    let mut view = PresenceView::new();
    view.set_self_id("me");
    view.apply_roster(vec![peer("a", 0.0, 0.0)]);

    assert!(view.apply_cursor(&peer("a", 12.0, 34.0)));
    let a = view.get("a").cloned().unwrap_or_else(|| peer("missing", 0.0, 0.0));
    assert!((a.x - 12.0).abs() < f64::EPSILON);
    assert!((a.y - 34.0).abs() < f64::EPSILON);
}

#[test]
fn cursor_update_replaces_whole_peer_record() {
    let mut view = PresenceView::new();
    view.set_self_id("me");
    view.apply_roster(vec![peer("a", 0.0, 0.0), peer("b", 5.0, 5.0)]);

    let recolored = Presence { id: "a".to_owned(), x: 3.0, y: 4.0, color: "#123abc".to_owned() };
    assert!(view.apply_cursor(&recolored));

    assert_eq!(view.get("a"), Some(&recolored));
    assert_eq!(view.get("b"), Some(&peer("b", 5.0, 5.0)));
    let ids: Vec<_> = view.others().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn cursor_for_unknown_or_self_is_ignored() {
    let mut view = PresenceView::new();
    view.set_self_id("me");
    view.apply_roster(vec![peer("a", 0.0, 0.0)]);

    assert!(!view.apply_cursor(&peer("ghost", 1.0, 1.0)));
    assert!(!view.apply_cursor(&peer("me", 1.0, 1.0)));
    assert_eq!(view.others().len(), 1);
}

#[test]
fn clear_forgets_everything() {
    let mut view = PresenceView::new();
    view.set_self_id("me");
    view.apply_roster(vec![peer("a", 0.0, 0.0)]);

    view.clear();
    assert!(view.others().is_empty());
    assert_eq!(view.self_id(), None);
}
