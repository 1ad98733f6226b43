use crate::cli::format::{self, MONITOR_COMMAND};
use crate::cli::settings::update_cli_client;
use crate::store::Store;
use keylens_core::{
    ApiError, BrowserStorage, CLIENT_NOT_FOUND, CommandExecutionStatus, Method, SendCommandRequest,
    SendCommandResponse, StorageItem, TelemetryEvent, endpoints, read_item,
};
use log::{debug, warn};
use serde_json::json;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOutputState {
    /// Scrollback, one rendered entry per echo, reply or notice.
    pub data: Vec<String>,
    pub loading: bool,
    pub error: String,
    pub db: u32,
    /// Submitted commands, newest first.
    pub command_history: Vec<String>,
}

impl CliOutputState {
    pub fn restored(local_storage: &dyn BrowserStorage) -> Self {
        Self {
            command_history: read_item(local_storage, StorageItem::CliInputHistory)
                .unwrap_or_default(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CliOutputAction {
    SetOutputInitialState,
    ConcatToOutput(Vec<String>),
    UpdateCliCommandHistory(Vec<String>),
    SendCliCommand,
    SendCliCommandSuccess,
    SendCliCommandFailure(String),
    ResetOutput,
    ResetOutputLoading,
    SetCliDbIndex(u32),
}

pub fn reduce(state: &mut CliOutputState, action: CliOutputAction) {
    match action {
        CliOutputAction::SetOutputInitialState => {
            *state = CliOutputState {
                command_history: std::mem::take(&mut state.command_history),
                ..Default::default()
            }
        }
        CliOutputAction::ConcatToOutput(lines) => state.data.extend(lines),
        CliOutputAction::UpdateCliCommandHistory(history) => state.command_history = history,
        CliOutputAction::SendCliCommand => {
            state.loading = true;
            state.error.clear();
        }
        CliOutputAction::SendCliCommandSuccess => {
            state.loading = false;
            state.error.clear();
        }
        CliOutputAction::SendCliCommandFailure(message) => {
            state.loading = false;
            state.error = message;
        }
        CliOutputAction::ResetOutput => {
            state.data.clear();
            state.loading = false;
        }
        CliOutputAction::ResetOutputLoading => state.loading = false,
        CliOutputAction::SetCliDbIndex(db) => state.db = db,
    }
}

fn append(store: &Store, line: String) {
    store.dispatch(CliOutputAction::ConcatToOutput(vec![line]));
}

/// Records `command` at the head of the history, dropping the oldest entries
/// past the configured limit. Repeating the latest command is a no-op.
pub fn update_cli_history(store: &Store, command: &str) {
    let command = command.trim();
    if command.is_empty() {
        return;
    }

    let mut history = store.select(|state| state.cli.output.command_history.clone());
    if history.first().is_some_and(|latest| latest == command) {
        return;
    }

    history.insert(0, command.to_string());
    history.truncate(store.config().cli_history_limit);
    store.dispatch(CliOutputAction::UpdateCliCommandHistory(history));
}

/// Runs `command` on the session's connection.
///
/// The echo goes to the scrollback before the request; the reply or the
/// error follows it. Returns `None` for an empty command.
pub async fn send_cli_command(
    store: &Store,
    command: &str,
) -> Result<Option<SendCommandResponse>, ApiError> {
    send(store, command, endpoints::SEND_COMMAND).await
}

/// Same as [`send_cli_command`], fanned out to every shard of a cluster.
pub async fn send_cli_cluster_command(
    store: &Store,
    command: &str,
) -> Result<Option<SendCommandResponse>, ApiError> {
    send(store, command, endpoints::SEND_CLUSTER_COMMAND).await
}

async fn send(
    store: &Store,
    command: &str,
    endpoint: &str,
) -> Result<Option<SendCommandResponse>, ApiError> {
    if command.trim().is_empty() {
        return Ok(None);
    }

    let (uuid, db) = store.select(|state| {
        (
            state.cli.settings.cli_client_uuid.clone(),
            state.cli.output.db,
        )
    });
    append(store, format::command_echo(command, db));
    store.dispatch(CliOutputAction::SendCliCommand);
    store.send_telemetry(
        TelemetryEvent::CliCommandSubmitted,
        json!({
            "databaseId": store.instance_id(),
            "command": command.split_whitespace().next().unwrap_or_default().to_uppercase(),
        }),
    );

    let request = store
        .db_request(Method::Post, &endpoints::cli_command_url(&uuid, endpoint))
        .json(&SendCommandRequest::raw(command));

    match store.fetch::<SendCommandResponse>(request).await {
        Ok(response) => {
            store.dispatch(CliOutputAction::SendCliCommandSuccess);
            append(store, format::reply(&response.response, response.status));

            if endpoint == endpoints::SEND_COMMAND && response.status == CommandExecutionStatus::Success {
                if let Some(db) = format::select_db_index(command) {
                    store.dispatch(CliOutputAction::SetCliDbIndex(db));
                }
            }
            Ok(Some(response))
        }
        Err(e) => {
            let message = e.message();
            store.dispatch(CliOutputAction::SendCliCommandFailure(message.clone()));

            if e.name() == Some(CLIENT_NOT_FOUND) && !uuid.is_empty() {
                recreate_client(store).await;
            } else {
                append(store, format::error_line(&message));
            }
            Err(e)
        }
    }
}

async fn recreate_client(store: &Store) {
    let uuid = store.select(|state| state.cli.settings.cli_client_uuid.clone());
    if uuid.is_empty() {
        return;
    }

    warn!("CLI client {} is gone, re-creating it", uuid);
    append(store, format::error_line(format::CONNECTION_CLOSED));
    match update_cli_client(store, &uuid).await {
        Ok(_) => append(store, format::CONNECTION_RECREATED.to_string()),
        Err(e) => append(store, format::error_line(&e.message())),
    }
}

/// Answers a command the CLI refuses to run with the list of such commands.
/// `MONITOR` is left out of the list since the profiler covers it.
pub fn process_unsupported_command(store: &Store, command: &str, unsupported_command: &str) {
    let unsupported = store.select(|state| {
        state
            .cli
            .settings
            .unsupported_commands
            .iter()
            .filter(|name| name.as_str() != MONITOR_COMMAND)
            .cloned()
            .collect::<Vec<_>>()
    });
    let typed = command.get(..unsupported_command.len()).unwrap_or(command);

    debug!("Refusing unsupported command {}", unsupported_command);
    append(
        store,
        format::error_line(&format::unsupported_command(typed, &unsupported.join(", "))),
    );
}

pub fn process_unrepeatable_number(store: &Store, command: &str) {
    debug!("Invalid repeat count in {}", command);
    append(store, format::error_line(format::REPEAT_COUNT_INVALID));
}
