use super::*;

use serde_json::Value;

const TIME_PRECISION_QUERY: &str = "show time_precision";
const TIME_PRECISION_TIMEOUT: Duration = Duration::from_secs(10);

/// Waits for the first connection, announces it, then reads the server time
/// precision.
pub(super) fn spawn(
    client: Arc<dyn DatabaseClient>,
    events: Sender<ConsoleEvent>,
    poll: Duration,
) {
    let spawned = thread::Builder::new()
        .name("siridb-startup".into())
        .spawn(move || {
            while !client.is_connected() {
                thread::sleep(poll);
            }
            if events.send(ConsoleEvent::Connected).is_err() {
                return;
            }
            let event = match read_time_precision(client.as_ref()) {
                Ok(precision) => ConsoleEvent::TimePrecision(precision),
                Err(message) => {
                    ConsoleEvent::Log(format!("error reading time precision: {message}"))
                }
            };
            let _ = events.send(event);
        });
    if let Err(err) = spawned {
        warn!(error = %err, "startup task not started");
    }
}

pub(super) fn read_time_precision(client: &dyn DatabaseClient) -> Result<TimePrecision, String> {
    let value = client
        .query(TIME_PRECISION_QUERY, TIME_PRECISION_TIMEOUT)
        .map_err(|err| err.to_string())?;
    let data = value
        .get("data")
        .and_then(Value::as_array)
        .filter(|data| data.len() == 1)
        .ok_or("expected a 'data' array with one entry")?;
    let text = data[0]
        .get("value")
        .and_then(Value::as_str)
        .ok_or("missing time precision value")?;
    TimePrecision::parse(text).ok_or_else(|| format!("unknown time precision '{text}'"))
}
