use super::*;
use chrono::{TimeZone, Utc};
use std::path::Path;
use shared::{
    domain::{PageId, VisitorId},
    protocol::{AnswerValue, Answers},
};

fn record(visitor: &str, page: &str, answers: Answers) -> SubmissionRecord {
    SubmissionRecord {
        timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
        visitor_id: VisitorId::from(visitor.to_string()),
        page: PageId::new(page),
        answers,
    }
}

fn read_rows(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("read log")
        .split_terminator("\r\n")
        .map(str::to_string)
        .collect()
}

fn encoded(fields: &[&str]) -> String {
    String::from_utf8(encode_row(fields).expect("encode")).expect("utf8")
}

#[test]
fn quotes_only_fields_that_need_it() {
    assert_eq!(encoded(&["a", "b c", ""]), "a,b c,\r\n");
    assert_eq!(
        encoded(&[r#"{"q1":"x"}"#, "one,two", "line\nbreak"]),
        "\"{\"\"q1\"\":\"\"x\"\"}\",\"one,two\",\"line\nbreak\"\r\n"
    );
}

/// In-memory target that accepts only `capacity` bytes per write.
struct ShortTarget {
    bytes: Vec<u8>,
    capacity: usize,
    truncated_to: Option<u64>,
}

#[async_trait]
impl AppendTarget for ShortTarget {
    async fn len(&mut self) -> io::Result<u64> {
        Ok(self.bytes.len() as u64)
    }

    async fn write_row(&mut self, row: &[u8]) -> io::Result<()> {
        let accepted = row.len().min(self.capacity);
        self.bytes.extend_from_slice(&row[..accepted]);
        if accepted < row.len() {
            return Err(io::Error::new(io::ErrorKind::Other, "no space left on device"));
        }
        Ok(())
    }

    async fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.bytes.truncate(len as usize);
        self.truncated_to = Some(len);
        Ok(())
    }
}

#[tokio::test]
async fn failed_write_leaves_no_partial_row() {
    let mut target = ShortTarget {
        bytes: b"earlier,row,,{}\r\n".to_vec(),
        capacity: 10,
        truncated_to: None,
    };

    let row = encoded(&["2024-05-01T09:30:00.000000Z", "v-1", "p.html", "{}"]);
    let err = append_row(&mut target, row.as_bytes())
        .await
        .expect_err("short write must fail");
    assert_eq!(err.to_string(), "no space left on device");
    assert_eq!(target.truncated_to, Some(17));
    assert_eq!(target.bytes, b"earlier,row,,{}\r\n");

    target.capacity = usize::MAX;
    append_row(&mut target, row.as_bytes())
        .await
        .expect("append after rollback");
    assert_eq!(
        String::from_utf8(target.bytes).expect("utf8"),
        format!("earlier,row,,{{}}\r\n{row}")
    );
}

#[tokio::test]
async fn file_target_rolls_back_to_prior_length() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("data.csv");
    std::fs::write(&path, "earlier,row,,{}\r\npartial").expect("seed");

    let mut file = fs::OpenOptions::new()
        .append(true)
        .open(&path)
        .await
        .expect("open");
    file.truncate(17).await.expect("truncate");
    drop(file);

    assert_eq!(read_rows(&path), vec!["earlier,row,,{}".to_string()]);
}

#[tokio::test]
async fn creates_missing_directories_and_appends_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("data.csv");
    let log = SubmissionLog::new(&path);

    let mut answers = Answers::new();
    answers.insert("q1", AnswerValue::from("Odpověď"));
    log.append(&record("v-1", "stranky/dotaznik.html", answers))
        .await
        .expect("first append");
    log.append(&record("v-2", "", Answers::new()))
        .await
        .expect("second append");

    let rows = read_rows(&path);
    assert_eq!(
        rows,
        vec![
            r#"2024-05-01T09:30:00.000000Z,v-1,stranky/dotaznik.html,"{""q1"":""Odpověď""}""#
                .to_string(),
            "2024-05-01T09:30:00.000000Z,v-2,,{}".to_string(),
        ]
    );
}

#[tokio::test]
async fn never_truncates_existing_content() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("data.csv");
    std::fs::write(&path, "earlier,row,,{}\r\n").expect("seed");

    let log = SubmissionLog::new(&path);
    log.append(&record("v-1", "p.html", Answers::new()))
        .await
        .expect("append");

    let rows = read_rows(&path);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], "earlier,row,,{}");
}

#[tokio::test]
async fn concurrent_appends_produce_whole_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("data.csv");
    let log = SubmissionLog::new(&path);

    let tasks = (0..50).map(|i| {
        let log = log.clone();
        tokio::spawn(async move {
            let mut answers = Answers::new();
            answers.insert("q1", AnswerValue::from("x".repeat(4096).as_str()));
            log.append(&record(&format!("visitor-{i}"), "p.html", answers))
                .await
        })
    });
    for result in futures::future::join_all(tasks).await {
        result.expect("join").expect("append");
    }

    let rows = read_rows(&path);
    assert_eq!(rows.len(), 50);
    for row in &rows {
        assert!(row.starts_with("2024-05-01T09:30:00.000000Z,visitor-"));
        assert!(row.ends_with(&format!("\"{{\"\"q1\"\":\"\"{}\"\"}}\"", "x".repeat(4096))));
    }
}

#[tokio::test]
async fn unwritable_location_fails_without_writing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").expect("blocker");
    let log = SubmissionLog::new(blocker.join("data.csv"));

    let error = log
        .append(&record("v-1", "p.html", Answers::new()))
        .await
        .expect_err("append must fail");
    assert!(matches!(error, PersistenceError::CreateDir { .. }));
    assert_eq!(
        std::fs::read_to_string(&blocker).expect("blocker intact"),
        "not a directory"
    );
}

#[tokio::test]
async fn directory_in_place_of_file_is_a_write_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("data.csv");
    std::fs::create_dir(&path).expect("dir");

    let error = SubmissionLog::new(&path)
        .append(&record("v-1", "p.html", Answers::new()))
        .await
        .expect_err("append must fail");
    assert!(matches!(error, PersistenceError::Write { .. }));
}
