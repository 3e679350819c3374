//! Line delimited JSON client over TCP.
//!
//! Every request is one JSON object terminated by a newline and answered by
//! exactly one response line. A connection that fails mid request is dropped
//! and re-established in the background.

use std::io::{self, BufRead, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{ClientError, Connector, DatabaseClient};
use crate::server::Server;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const AUTH_TIMEOUT: Duration = Duration::from_secs(10);
const RETRY_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
    pub dbname: String,
}

#[derive(Clone)]
pub struct TcpClient {
    inner: Arc<Inner>,
}

struct Inner {
    servers: Vec<Server>,
    credentials: Credentials,
    conn: Mutex<Option<Connection>>,
    connected: AtomicBool,
    closed: AtomicBool,
    connecting: AtomicBool,
    next_id: AtomicU64,
    log: Sender<String>,
    retry_interval: Duration,
}

struct Connection {
    server: Server,
    reader: io::BufReader<TcpStream>,
}

impl TcpClient {
    pub fn new(servers: Vec<Server>, credentials: Credentials, log: Sender<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                servers,
                credentials,
                conn: Mutex::new(None),
                connected: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                connecting: AtomicBool::new(false),
                next_id: AtomicU64::new(1),
                log,
                retry_interval: RETRY_INTERVAL,
            }),
        }
    }

    /// Overrides the delay between reconnect attempts.
    pub fn with_retry_interval(
        servers: Vec<Server>,
        credentials: Credentials,
        log: Sender<String>,
        retry_interval: Duration,
    ) -> Self {
        let mut client = Self::new(servers, credentials, log);
        if let Some(inner) = Arc::get_mut(&mut client.inner) {
            inner.retry_interval = retry_interval;
        }
        client
    }
}

impl DatabaseClient for TcpClient {
    /// Connects in the background: every server is tried right away, then
    /// again after each retry interval until one answers.
    fn connect(&self) {
        self.inner.closed.store(false, Ordering::SeqCst);
        if self.inner.servers.is_empty() {
            self.inner.log("no servers to connect to");
            return;
        }
        Inner::spawn_connect(&self.inner, Duration::ZERO);
    }

    fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        let dropped = self.inner.conn.lock().take();
        self.inner.connected.store(false, Ordering::SeqCst);
        if let Some(conn) = dropped {
            self.inner.log(format!("closed connection to {}", conn.server));
        }
    }

    fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    fn is_available(&self) -> bool {
        self.is_connected() && !self.inner.closed.load(Ordering::SeqCst)
    }

    fn query(&self, text: &str, timeout: Duration) -> Result<Value, ClientError> {
        debug!(query = text, "dispatching query");
        Inner::call(&self.inner, "query", json!({ "query": text }), timeout)
    }

    fn insert(&self, data: &Value, timeout: Duration) -> Result<Value, ClientError> {
        debug!("dispatching insert");
        Inner::call(&self.inner, "insert", json!({ "data": data }), timeout)
    }
}

impl Inner {
    fn log(&self, message: impl Into<String>) {
        let message = message.into();
        info!(target: "siridb_prompt::client", "{message}");
        let _ = self.log.send(message);
    }

    fn call(
        this: &Arc<Self>,
        kind: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, ClientError> {
        let mut guard = this.conn.lock();
        let Some(conn) = guard.as_mut() else {
            return Err(ClientError::NotConnected);
        };
        let id = this.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({ "id": id, "type": kind, "params": params });
        match request(conn, &payload, timeout) {
            Ok(result) => Ok(result),
            Err(err @ ClientError::Rejected(_)) => Err(err),
            Err(err) => {
                let server = conn.server.clone();
                *guard = None;
                drop(guard);
                this.connected.store(false, Ordering::SeqCst);
                this.log(format!("lost connection to {server}: {err}"));
                Self::spawn_connect(this, this.retry_interval);
                Err(err)
            }
        }
    }

    fn try_connect_any(&self) -> bool {
        for server in &self.servers {
            self.log(format!("connecting to {server}"));
            match self.open(server) {
                Ok(_) if self.closed.load(Ordering::SeqCst) => return true,
                Ok(conn) => {
                    *self.conn.lock() = Some(conn);
                    self.connected.store(true, Ordering::SeqCst);
                    self.log(format!("connected to {server}"));
                    return true;
                }
                Err(err) => self.log(format!("cannot connect to {server}: {err}")),
            }
        }
        false
    }

    fn open(&self, server: &Server) -> Result<Connection, ClientError> {
        let addr = (server.host.as_str(), server.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| ClientError::Protocol(format!("cannot resolve {server}")))?;
        let stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)?;
        stream.set_nodelay(true)?;
        let mut conn = Connection {
            server: server.clone(),
            reader: io::BufReader::new(stream),
        };
        let auth = json!({
            "id": 0,
            "type": "auth",
            "params": {
                "user": self.credentials.user,
                "password": self.credentials.password,
                "database": self.credentials.dbname,
            }
        });
        request(&mut conn, &auth, AUTH_TIMEOUT)?;
        Ok(conn)
    }

    /// At most one connect thread runs at a time.
    fn spawn_connect(this: &Arc<Self>, first_delay: Duration) {
        if this.closed.load(Ordering::SeqCst) || this.connecting.swap(true, Ordering::SeqCst) {
            return;
        }
        let inner = Arc::clone(this);
        let spawned = thread::Builder::new()
            .name("siridb-connect".into())
            .spawn(move || {
                let mut delay = first_delay;
                while !inner.closed.load(Ordering::SeqCst) && !inner.connected.load(Ordering::SeqCst)
                {
                    thread::sleep(delay);
                    delay = inner.retry_interval;
                    if inner.closed.load(Ordering::SeqCst) || inner.try_connect_any() {
                        break;
                    }
                }
                inner.connecting.store(false, Ordering::SeqCst);
            });
        if let Err(err) = spawned {
            this.connecting.store(false, Ordering::SeqCst);
            this.log(format!("cannot start connect thread: {err}"));
        }
    }
}

/// Sends one request and waits for its response line.
///
/// `timeout` bounds the whole exchange, not each socket call.
fn request(
    conn: &mut Connection,
    payload: &Value,
    timeout: Duration,
) -> Result<Value, ClientError> {
    let deadline = Instant::now() + timeout;
    let mut line =
        serde_json::to_string(payload).map_err(|err| ClientError::Protocol(err.to_string()))?;
    line.push('\n');
    {
        let stream = conn.reader.get_mut();
        stream.set_write_timeout(Some(remaining(deadline, timeout)?))?;
        stream
            .write_all(line.as_bytes())
            .and_then(|()| stream.flush())
            .map_err(|err| io_error(err, timeout))?;
    }
    let response = read_line_until(&mut conn.reader, deadline, timeout)?;
    parse_response(&String::from_utf8_lossy(&response))
}

/// Reads up to and including the next newline, giving up at `deadline`.
fn read_line_until(
    reader: &mut io::BufReader<TcpStream>,
    deadline: Instant,
    timeout: Duration,
) -> Result<Vec<u8>, ClientError> {
    let mut line = Vec::new();
    loop {
        reader
            .get_ref()
            .set_read_timeout(Some(remaining(deadline, timeout)?))?;
        let available = match reader.fill_buf() {
            Ok(available) => available,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(io_error(err, timeout)),
        };
        if available.is_empty() {
            return Err(ClientError::ConnectionLost);
        }
        match available.iter().position(|&byte| byte == b'\n') {
            Some(end) => {
                line.extend_from_slice(&available[..=end]);
                reader.consume(end + 1);
                return Ok(line);
            }
            None => {
                let used = available.len();
                line.extend_from_slice(available);
                reader.consume(used);
            }
        }
    }
}

/// Time left before `deadline`; an elapsed deadline is a timeout.
fn remaining(deadline: Instant, timeout: Duration) -> Result<Duration, ClientError> {
    let left = deadline.saturating_duration_since(Instant::now());
    if left.is_zero() {
        Err(ClientError::Timeout(timeout))
    } else {
        Ok(left)
    }
}

fn io_error(err: io::Error, timeout: Duration) -> ClientError {
    match err.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => ClientError::Timeout(timeout),
        _ => ClientError::Io(err),
    }
}

fn parse_response(line: &str) -> Result<Value, ClientError> {
    let value: Value = serde_json::from_str(line.trim())
        .map_err(|err| ClientError::Protocol(format!("invalid response: {err}")))?;
    if value.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(value.get("result").cloned().unwrap_or(Value::Null));
    }
    let message = value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("request rejected");
    Err(ClientError::Rejected(message.to_string()))
}

/// Produces [`TcpClient`]s for a fixed server list and user.
pub struct TcpConnector {
    servers: Vec<Server>,
    user: String,
    dbname: String,
    log: Sender<String>,
}

impl TcpConnector {
    pub fn new(
        servers: Vec<Server>,
        user: impl Into<String>,
        dbname: impl Into<String>,
        log: Sender<String>,
    ) -> Self {
        Self {
            servers,
            user: user.into(),
            dbname: dbname.into(),
            log,
        }
    }
}

impl Connector for TcpConnector {
    fn open(&mut self, password: &str) -> Arc<dyn DatabaseClient> {
        let credentials = Credentials {
            user: self.user.clone(),
            password: password.to_string(),
            dbname: self.dbname.clone(),
        };
        Arc::new(TcpClient::new(self.servers.clone(), credentials, self.log.clone()))
    }
}
