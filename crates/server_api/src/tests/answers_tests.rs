use super::*;

fn fields(pairs: &[(&str, &str)]) -> FieldSet {
    pairs.iter().copied().collect()
}

#[test]
fn keeps_only_question_keys_and_collapses_single_values() {
    let answers = extract_answers(
        &fields(&[("q1", "a"), ("q1", "b"), ("q2", "x"), ("other", "y")]),
        QUESTION_PREFIX,
    );

    assert_eq!(answers.len(), 2);
    assert_eq!(answers.get("q1"), Some(&AnswerValue::from(vec!["a", "b"])));
    assert_eq!(answers.get("q2"), Some(&AnswerValue::from("x")));
    assert_eq!(answers.get("other"), None);
    assert_eq!(
        answers.to_json().expect("json"),
        r#"{"q1":["a","b"],"q2":"x"}"#
    );
}

#[test]
fn no_question_keys_gives_empty_mapping() {
    let answers = extract_answers(
        &fields(&[("page", "p.html"), ("next", "n.html")]),
        QUESTION_PREFIX,
    );
    assert!(answers.is_empty());
}

#[test]
fn empty_and_duplicate_values_are_preserved() {
    let answers = extract_answers(
        &fields(&[("q_note", ""), ("q3", "ano"), ("q3", "ano")]),
        QUESTION_PREFIX,
    );
    assert_eq!(answers.get("q_note"), Some(&AnswerValue::from("")));
    assert_eq!(answers.get("q3"), Some(&AnswerValue::from(vec!["ano", "ano"])));
}

#[test]
fn routing_hints_starting_with_q_still_count() {
    // the prefix match is literal, same as the form authors rely on
    let answers = extract_answers(&fields(&[("quiz", "1")]), QUESTION_PREFIX);
    assert_eq!(answers.keys().collect::<Vec<_>>(), vec!["quiz"]);
}
