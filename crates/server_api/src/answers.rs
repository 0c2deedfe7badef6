use shared::{
    form::FieldSet,
    protocol::{AnswerValue, Answers},
};

pub const QUESTION_PREFIX: &str = "q";

/// Collects the fields whose names start with `prefix`.
///
/// One value stays a plain string, repeated values become a list in
/// submission order, and a key with no value maps to `""`.
pub fn extract_answers(fields: &FieldSet, prefix: &str) -> Answers {
    let mut answers = Answers::new();
    for key in fields.keys_with_prefix(prefix) {
        let value = match fields.get_many(key).as_slice() {
            [] => AnswerValue::from(""),
            [single] => AnswerValue::from(*single),
            many => AnswerValue::from(many.to_vec()),
        };
        answers.insert(key, value);
    }
    answers
}

#[cfg(test)]
#[path = "tests/answers_tests.rs"]
mod tests;
