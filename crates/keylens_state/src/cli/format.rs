//! redis-cli style rendering of raw command replies.

use keylens_core::CommandExecutionStatus;
use serde_json::Value;

pub const SELECT_COMMAND: &str = "select";
pub const MONITOR_COMMAND: &str = "monitor";

pub const CONNECTION_CLOSED: &str =
    "Client connection previously closed. Run the command after the connection is re-created.";
pub const CONNECTION_RECREATED: &str = "Connected.";
pub const REPEAT_COUNT_INVALID: &str = "Invalid repeat command option value.";

pub fn unsupported_command(command: &str, supported_list: &str) -> String {
    format!(
        "\"{command}\" is not supported by the CLI. The list of all unsupported commands: {supported_list}"
    )
}

/// Echo of a submitted command, prefixed with the logical database when it
/// is not the default one.
pub fn command_echo(command: &str, db: u32) -> String {
    if db > 0 {
        format!("[db{db}] > {command}")
    } else {
        format!("> {command}")
    }
}

/// Renders a reply as one scrollback entry.
pub fn reply(response: &Value, status: CommandExecutionStatus) -> String {
    match status {
        CommandExecutionStatus::Success => render(response),
        CommandExecutionStatus::Fail => match response {
            Value::String(message) => format!("(error) {message}"),
            other => format!("(error) {}", render(other)),
        },
    }
}

pub fn error_line(message: &str) -> String {
    reply(&Value::String(message.to_string()), CommandExecutionStatus::Fail)
}

/// Database index targeted by a `SELECT n` command.
pub fn select_db_index(command: &str) -> Option<u32> {
    let mut parts = command.split_whitespace();
    let name = parts.next()?;
    if !name.eq_ignore_ascii_case(SELECT_COMMAND) {
        return None;
    }
    parts.next()?.parse().ok()
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => "(nil)".to_string(),
        Value::Bool(flag) => format!("(integer) {}", u8::from(*flag)),
        Value::Number(number) if number.is_i64() || number.is_u64() => {
            format!("(integer) {number}")
        }
        Value::Number(number) => format!("(double) {number}"),
        Value::String(text) => format!("{text:?}"),
        Value::Array(items) => render_items(items),
        Value::Object(map) => {
            let flattened: Vec<Value> = map
                .iter()
                .flat_map(|(key, value)| [Value::String(key.clone()), value.clone()])
                .collect();
            render_items(&flattened)
        }
    }
}

fn render_items(items: &[Value]) -> String {
    if items.is_empty() {
        return "(empty array)".to_string();
    }

    let width = items.len().to_string().len();
    let mut lines = Vec::new();
    for (position, item) in items.iter().enumerate() {
        let prefix = format!("{:>width$}) ", position + 1);
        let padding = " ".repeat(prefix.len());
        for (line_no, line) in render(item).lines().enumerate() {
            if line_no == 0 {
                lines.push(format!("{prefix}{line}"));
            } else {
                lines.push(format!("{padding}{line}"));
            }
        }
    }
    lines.join("\n")
}
