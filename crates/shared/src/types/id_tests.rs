use super::*;

#[test]
fn test_user_id_from_telegram_id() {
    let id = UserId::from(123_456_789_i64);
    assert_eq!(id.as_str(), "123456789");
}

#[test]
fn test_user_id_display() {
    let id = UserId::new("42");
    assert_eq!(format!("{id}"), "42");
    assert_eq!(id.into_inner(), "42");
}

#[test]
fn test_user_id_serializes_transparently() {
    let id = UserId::new("777");
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"777\"");
}
