use super::*;

#[test]
fn parses_repeated_keys_in_order() {
    let fields = FieldSet::from_urlencoded(b"q1=a&q2=x&q1=b&other=y");
    assert_eq!(fields.get_many("q1"), vec!["a", "b"]);
    assert_eq!(fields.get_one("q1"), Some("a"));
    assert_eq!(fields.get_one("other"), Some("y"));
    assert_eq!(fields.get_one("missing"), None);
    assert_eq!(fields.len(), 4);
}

#[test]
fn decodes_plus_and_percent_escapes() {
    let fields = FieldSet::from_urlencoded("q1=dobr%C3%BD+den&page=".as_bytes());
    assert_eq!(fields.get_one("q1"), Some("dobrý den"));
    assert!(fields.has("page"));
    assert_eq!(fields.get_one("page"), Some(""));
    assert_eq!(fields.get_non_empty("page"), None);
}

#[test]
fn keys_with_prefix_are_distinct_and_ordered() {
    let fields: FieldSet = [("q2", "x"), ("next", "p"), ("q1", "a"), ("q2", "y")]
        .into_iter()
        .collect();
    assert_eq!(fields.keys_with_prefix("q"), vec!["q2", "q1"]);
}

#[test]
fn garbage_body_never_fails() {
    let fields = FieldSet::from_urlencoded(b"&&=&q1&%zz=1");
    assert!(fields.has("q1"));
    assert_eq!(fields.get_one("q1"), Some(""));
}
