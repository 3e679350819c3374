//! Scripted collaborators for unit tests.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::client::{ClientError, Connector, DatabaseClient};
use crate::clipboard::{Clipboard, ClipboardError};
use crate::completion::DirLister;

/// Answers queries from a script; unscripted queries return `{}`.
#[derive(Default)]
pub(crate) struct FakeClient {
    connected: AtomicBool,
    closes: AtomicUsize,
    responses: Mutex<HashMap<String, VecDeque<Result<Value, ClientError>>>>,
    queries: Mutex<Vec<String>>,
    inserts: Mutex<Vec<Value>>,
}

impl FakeClient {
    pub(crate) fn connected() -> Self {
        let client = Self::default();
        client.connected.store(true, Ordering::SeqCst);
        client
    }

    pub(crate) fn disconnected() -> Self {
        Self::default()
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub(crate) fn respond(&self, query: &str, response: Result<Value, ClientError>) {
        self.responses
            .lock()
            .entry(query.to_string())
            .or_default()
            .push_back(response);
    }

    pub(crate) fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }

    pub(crate) fn inserts(&self) -> Vec<Value> {
        self.inserts.lock().clone()
    }

    pub(crate) fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl DatabaseClient for FakeClient {
    fn connect(&self) {}

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn is_available(&self) -> bool {
        self.is_connected()
    }

    fn query(&self, text: &str, _timeout: Duration) -> Result<Value, ClientError> {
        self.queries.lock().push(text.to_string());
        self.responses
            .lock()
            .get_mut(text)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(json!({})))
    }

    fn insert(&self, data: &Value, _timeout: Duration) -> Result<Value, ClientError> {
        self.inserts.lock().push(data.clone());
        Ok(json!({"success_msg": "Successfully inserted points."}))
    }
}

/// Hands out one shared client and remembers the passwords it was given.
pub(crate) struct FakeConnector {
    pub(crate) client: Arc<FakeClient>,
    pub(crate) passwords: Arc<Mutex<Vec<String>>>,
}

impl FakeConnector {
    pub(crate) fn new(client: Arc<FakeClient>) -> Self {
        Self {
            client,
            passwords: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Connector for FakeConnector {
    fn open(&mut self, password: &str) -> Arc<dyn DatabaseClient> {
        self.passwords.lock().push(password.to_string());
        self.client.clone()
    }
}

#[derive(Clone, Default)]
pub(crate) struct RecordingClipboard {
    pub(crate) copied: Arc<Mutex<Vec<String>>>,
}

impl Clipboard for RecordingClipboard {
    fn write_all(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.copied.lock().push(text.to_string());
        Ok(())
    }
}

pub(crate) struct EmptyLister;

impl DirLister for EmptyLister {
    fn list(&self, _path: &Path) -> io::Result<Vec<String>> {
        Ok(Vec::new())
    }
}
