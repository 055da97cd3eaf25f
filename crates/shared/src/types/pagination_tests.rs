use super::*;

#[test]
fn test_page_request_default() {
    let request = PageRequest::default();
    assert_eq!(request.limit(), 50);
    assert_eq!(request.offset(), 0);
}

#[test]
fn test_page_request_limit_is_clamped() {
    let request = PageRequest {
        limit: 10_000,
        offset: 0,
    };
    assert_eq!(request.limit(), MAX_PAGE_SIZE);

    let request = PageRequest {
        limit: 0,
        offset: 0,
    };
    assert_eq!(request.limit(), 1);
}

#[test]
fn test_page_request_deserializes_with_defaults() {
    let request: PageRequest = serde_json::from_str(r#"{"offset": 100}"#).unwrap();
    assert_eq!(request.limit(), 50);
    assert_eq!(request.offset(), 100);
}
