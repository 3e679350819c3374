//! One submitted command and its outcome.

use std::path::Path;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use siridb_grammar::Grammar;
use tracing::debug;

use crate::client::{ClientError, DatabaseClient};

const EXIT_COMMAND: &str = "exit";
const IMPORT_COMMAND: &str = "import";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPhase {
    Created,
    Parsing,
    Dispatched,
    Succeeded,
    Failed,
    TimedOut,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Succeeded(Value),
    Failed(String),
    TimedOut(Duration),
}

#[derive(Debug, Clone)]
pub struct Query {
    raw: String,
    parse_position: usize,
    phase: QueryPhase,
    outcome: Option<QueryOutcome>,
    elapsed: Option<Duration>,
}

/// True for `exit` with any surrounding whitespace.
pub fn is_exit(line: &str) -> bool {
    line.trim() == EXIT_COMMAND
}

/// Parses and dispatches one command, blocking for at most `timeout`.
pub fn run(
    raw: &str,
    grammar: &dyn Grammar,
    client: &dyn DatabaseClient,
    timeout: Duration,
) -> Query {
    let mut query = Query::new(raw);
    query.parse(grammar);
    match import_path(query.raw()) {
        Some(Ok(path)) => query.import(client, Path::new(&path), timeout),
        Some(Err(message)) => query.fail(message),
        None => query.dispatch(client, timeout),
    }
    query
}

/// `Some` when the command is an import; the error names a missing path.
fn import_path(raw: &str) -> Option<Result<String, String>> {
    let rest = raw.trim().strip_prefix(IMPORT_COMMAND)?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    match rest.trim() {
        "" => Some(Err("import expects a path to a JSON file".to_string())),
        path => Some(Ok(path.to_string())),
    }
}

impl Query {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            parse_position: 0,
            phase: QueryPhase::Created,
            outcome: None,
            elapsed: None,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn parse_position(&self) -> usize {
        self.parse_position
    }

    pub fn phase(&self) -> QueryPhase {
        self.phase
    }

    pub fn outcome(&self) -> Option<&QueryOutcome> {
        self.outcome.as_ref()
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }

    /// Records how far the grammar accepted the command. Parse failures do
    /// not stop dispatch; the server has the final word.
    pub fn parse(&mut self, grammar: &dyn Grammar) {
        self.phase = QueryPhase::Parsing;
        self.parse_position = match grammar.parse(&self.raw) {
            Ok(result) => result.pos(),
            Err(err) => {
                debug!(query = %self.raw, error = %err, "command does not parse");
                0
            }
        };
    }

    pub fn dispatch(&mut self, client: &dyn DatabaseClient, timeout: Duration) {
        self.phase = QueryPhase::Dispatched;
        let started = Instant::now();
        let result = client.query(&self.raw, timeout);
        self.finish(result, started);
    }

    /// Reads a JSON document from `path` and inserts it.
    pub fn import(&mut self, client: &dyn DatabaseClient, path: &Path, timeout: Duration) {
        let data = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => return self.fail(format!("cannot read {}: {err}", path.display())),
        };
        let data: Value = match serde_json::from_str(&data) {
            Ok(data) => data,
            Err(err) => return self.fail(format!("invalid JSON in {}: {err}", path.display())),
        };
        self.phase = QueryPhase::Dispatched;
        let started = Instant::now();
        let result = client.insert(&data, timeout);
        self.finish(result, started);
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.phase = QueryPhase::Failed;
        self.outcome = Some(QueryOutcome::Failed(message.into()));
    }

    fn finish(&mut self, result: Result<Value, ClientError>, started: Instant) {
        self.elapsed = Some(started.elapsed());
        match result {
            Ok(value) => {
                self.phase = QueryPhase::Succeeded;
                self.outcome = Some(QueryOutcome::Succeeded(value));
            }
            Err(ClientError::Timeout(after)) => {
                self.phase = QueryPhase::TimedOut;
                self.outcome = Some(QueryOutcome::TimedOut(after));
            }
            Err(err) => self.fail(err.to_string()),
        }
    }

    /// Compact JSON of the outcome; failures become `{"error_msg": ..}`.
    pub fn to_json(&self) -> String {
        match &self.outcome {
            Some(QueryOutcome::Succeeded(value)) => value.to_string(),
            Some(QueryOutcome::Failed(message)) => json!({ "error_msg": message }).to_string(),
            Some(QueryOutcome::TimedOut(after)) => {
                json!({ "error_msg": timeout_message(*after) }).to_string()
            }
            None => Value::Null.to_string(),
        }
    }
}

pub(crate) fn timeout_message(after: Duration) -> String {
    format!("query timed out after {}s", after.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeClient;
    use siridb_grammar::SiriGrammar;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn exit_ignores_surrounding_whitespace() {
        assert!(is_exit("  exit \t"));
        assert!(!is_exit("exit now"));
        assert!(!is_exit("EXIT"));
    }

    #[test]
    fn successful_query_keeps_result_and_parse_position() {
        let client = FakeClient::connected();
        client.respond("list series", Ok(json!({"columns": ["name"], "series": []})));
        let query = run("list series", &SiriGrammar::new(), &client, TIMEOUT);
        assert_eq!(query.phase(), QueryPhase::Succeeded);
        assert_eq!(query.parse_position(), 11);
        assert!(query.elapsed().is_some());
        assert_eq!(query.to_json(), r#"{"columns":["name"],"series":[]}"#);
    }

    #[test]
    fn unparseable_query_is_still_sent() {
        let client = FakeClient::connected();
        client.respond("create user 'x", Err(ClientError::Rejected("syntax error".into())));
        let query = run("create user 'x", &SiriGrammar::new(), &client, TIMEOUT);
        assert_eq!(query.parse_position(), 0);
        assert_eq!(query.phase(), QueryPhase::Failed);
        assert_eq!(query.to_json(), r#"{"error_msg":"syntax error"}"#);
        assert_eq!(client.queries(), vec!["create user 'x"]);
    }

    #[test]
    fn timeout_becomes_timed_out_outcome() {
        let client = FakeClient::connected();
        client.respond("select * from 'cpu'", Err(ClientError::Timeout(TIMEOUT)));
        let query = run("select * from 'cpu'", &SiriGrammar::new(), &client, TIMEOUT);
        assert_eq!(query.phase(), QueryPhase::TimedOut);
        assert_eq!(query.outcome(), Some(&QueryOutcome::TimedOut(TIMEOUT)));
        assert_eq!(query.to_json(), r#"{"error_msg":"query timed out after 5s"}"#);
    }

    #[test]
    fn import_reads_file_and_inserts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("points.json");
        std::fs::write(&path, r#"{"cpu": [[1, 0.5]]}"#).expect("write");
        let client = FakeClient::connected();
        let query = run(
            &format!("import {}", path.display()),
            &SiriGrammar::new(),
            &client,
            TIMEOUT,
        );
        assert_eq!(query.phase(), QueryPhase::Succeeded);
        assert_eq!(client.inserts(), vec![json!({"cpu": [[1, 0.5]]})]);
        assert!(client.queries().is_empty());
    }

    #[test]
    fn import_failures_are_reported_inline() {
        let client = FakeClient::connected();
        let missing = run("import /no/such/file.json", &SiriGrammar::new(), &client, TIMEOUT);
        assert_eq!(missing.phase(), QueryPhase::Failed);
        assert!(missing.to_json().contains("cannot read /no/such/file.json"));

        let bare = run("import", &SiriGrammar::new(), &client, TIMEOUT);
        assert!(bare.to_json().contains("import expects a path"));
        assert!(client.inserts().is_empty());
    }

    #[test]
    fn words_starting_with_import_are_plain_queries() {
        assert_eq!(import_path("importance"), None);
        assert_eq!(
            import_path(" import  a.json "),
            Some(Ok("a.json".to_string()))
        );
    }
}
