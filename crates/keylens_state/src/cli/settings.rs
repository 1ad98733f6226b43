use crate::cli::output::CliOutputAction;
use crate::store::Store;
use keylens_core::{
    ApiError, ApiRequest, CliClientResponse, Method, StorageItem, endpoints, read_item,
    write_item,
};
use log::{debug, error};

/// Helper panel and client session flags.
///
/// `is_searching` and `is_entering_command` are never both set: the helper
/// either follows the typed command or shows a search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliSettingsState {
    pub is_show_cli: bool,
    pub is_show_helper: bool,
    pub is_minimized_helper: bool,
    pub loading: bool,
    pub error_client: String,
    pub cli_client_uuid: String,
    pub matched_command: String,
    pub searched_command: String,
    pub searching_command: String,
    pub searching_command_filter: String,
    pub is_entering_command: bool,
    pub is_searching: bool,
    pub unsupported_commands: Vec<String>,
    pub blocking_commands: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CliSettingsAction {
    SetCliSettingsInitialState,
    OpenCli,
    ToggleCli,
    OpenCliHelper,
    ToggleCliHelper,
    ToggleHideCliHelper,
    SetMatchedCommand(String),
    SetSearchedCommand(String),
    SetSearchingCommand(String),
    SetSearchingCommandFilter(String),
    SetCliEnteringCommand,
    ClearSearchingCommand,
    ProcessCliClient,
    ProcessCliClientSuccess(String),
    ProcessCliClientFailure(String),
    DeleteCliClientSuccess,
    ResetCliClientUuid,
    ResetCliSettings,
    ResetCliHelperSettings,
    GetUnsupportedCommandsSuccess(Vec<String>),
    GetBlockingCommandsSuccess(Vec<String>),
    GoBackFromCommand,
}

fn lowercased(commands: Vec<String>) -> Vec<String> {
    commands.into_iter().map(|command| command.to_lowercase()).collect()
}

pub fn reduce(state: &mut CliSettingsState, action: CliSettingsAction) {
    match action {
        CliSettingsAction::SetCliSettingsInitialState => *state = CliSettingsState::default(),
        CliSettingsAction::OpenCli => state.is_show_cli = true,
        CliSettingsAction::ToggleCli => state.is_show_cli = !state.is_show_cli,
        CliSettingsAction::OpenCliHelper => state.is_show_helper = true,
        CliSettingsAction::ToggleCliHelper => {
            state.is_show_helper = !state.is_show_helper;
            state.is_minimized_helper = !state.is_minimized_helper;
        }
        CliSettingsAction::ToggleHideCliHelper => {
            state.is_minimized_helper = !state.is_minimized_helper
        }
        CliSettingsAction::SetMatchedCommand(command) => {
            state.matched_command = command;
            state.is_searching = false;
        }
        CliSettingsAction::SetSearchedCommand(command) => {
            state.searched_command = command;
            state.is_searching = false;
        }
        CliSettingsAction::SetSearchingCommand(command) => {
            state.searching_command = command;
            state.is_searching = true;
            state.is_entering_command = false;
        }
        CliSettingsAction::SetSearchingCommandFilter(filter) => {
            state.searching_command_filter = filter;
            state.is_searching = true;
            state.is_entering_command = false;
        }
        CliSettingsAction::SetCliEnteringCommand => {
            state.is_entering_command = true;
            state.is_searching = false;
        }
        CliSettingsAction::ClearSearchingCommand => {
            state.searching_command.clear();
            state.searched_command.clear();
            state.searching_command_filter.clear();
            state.is_searching = false;
        }
        CliSettingsAction::ProcessCliClient => state.loading = true,
        CliSettingsAction::ProcessCliClientSuccess(uuid) => {
            state.loading = false;
            state.cli_client_uuid = uuid;
            state.error_client.clear();
        }
        CliSettingsAction::ProcessCliClientFailure(message) => {
            state.loading = false;
            state.error_client = message;
        }
        CliSettingsAction::DeleteCliClientSuccess => {
            state.loading = false;
            state.cli_client_uuid.clear();
        }
        CliSettingsAction::ResetCliClientUuid => state.cli_client_uuid.clear(),
        CliSettingsAction::ResetCliSettings => {
            state.is_show_cli = false;
            state.cli_client_uuid.clear();
            state.loading = false;
        }
        CliSettingsAction::ResetCliHelperSettings => {
            state.is_show_helper = false;
            state.is_searching = false;
            state.is_entering_command = false;
            state.is_minimized_helper = false;
            state.matched_command.clear();
            state.searching_command.clear();
            state.searched_command.clear();
            state.searching_command_filter.clear();
        }
        CliSettingsAction::GetUnsupportedCommandsSuccess(commands) => {
            state.loading = false;
            state.unsupported_commands = lowercased(commands);
        }
        CliSettingsAction::GetBlockingCommandsSuccess(commands) => {
            state.loading = false;
            state.blocking_commands = lowercased(commands);
        }
        CliSettingsAction::GoBackFromCommand => {
            state.matched_command.clear();
            state.searched_command.clear();
            state.is_searching = true;
        }
    }
}

fn connected_db(store: &Store) -> u32 {
    store.select(|state| state.app.connected_instance.db)
}

/// Opens a CLI session on the connected database. The uuid is kept in session
/// storage so the session can be closed on the next reset.
pub async fn create_cli_client(store: &Store) -> Result<String, ApiError> {
    store.dispatch(CliSettingsAction::ProcessCliClient);

    let request = store.db_request(Method::Post, endpoints::CLI);
    let response = match store.fetch::<CliClientResponse>(request).await {
        Ok(response) => response,
        Err(e) => {
            store.dispatch(CliSettingsAction::ProcessCliClientFailure(e.message()));
            return Err(e);
        }
    };

    if let Err(e) = write_item(store.session_storage(), StorageItem::CliClientUuid, &response.uuid) {
        error!("Failed to keep CLI client uuid: {:?}", e);
    }
    store.dispatch(CliSettingsAction::ProcessCliClientSuccess(response.uuid.clone()));
    store.dispatch(CliOutputAction::SetCliDbIndex(connected_db(store)));
    Ok(response.uuid)
}

/// Re-creates the backend connection behind an existing session.
pub async fn update_cli_client(store: &Store, uuid: &str) -> Result<String, ApiError> {
    store.dispatch(CliSettingsAction::ProcessCliClient);

    let request = store.db_request(Method::Patch, &endpoints::cli_client_url(uuid));
    match store.fetch::<CliClientResponse>(request).await {
        Ok(response) => {
            store.dispatch(CliSettingsAction::ProcessCliClientSuccess(response.uuid.clone()));
            store.dispatch(CliOutputAction::SetCliDbIndex(connected_db(store)));
            Ok(response.uuid)
        }
        Err(e) => {
            store.dispatch(CliSettingsAction::ProcessCliClientFailure(e.message()));
            Err(e)
        }
    }
}

pub async fn delete_cli_client(store: &Store, uuid: &str) -> Result<(), ApiError> {
    store.dispatch(CliSettingsAction::ProcessCliClient);

    let request = store.db_request(Method::Delete, &endpoints::cli_client_url(uuid));
    match store.send(request).await {
        Ok(_) => {
            store.dispatch(CliSettingsAction::DeleteCliClientSuccess);
            Ok(())
        }
        Err(e) => {
            store.dispatch(CliSettingsAction::ProcessCliClientFailure(e.message()));
            Err(e)
        }
    }
}

/// Collapses the pane and closes the session remembered in session storage.
pub async fn reset_cli_settings(store: &Store) -> Result<(), ApiError> {
    let uuid: String = read_item(store.session_storage(), StorageItem::CliClientUuid).unwrap_or_default();

    store.dispatch(CliSettingsAction::ResetCliSettings);
    if uuid.is_empty() {
        debug!("No CLI client to close");
        return Ok(());
    }

    delete_cli_client(store, &uuid).await
}

async fn fetch_command_list(store: &Store, endpoint: &str) -> Result<Vec<String>, ApiError> {
    store.dispatch(CliSettingsAction::ProcessCliClient);

    match store.fetch::<Vec<String>>(ApiRequest::new(Method::Get, endpoint)).await {
        Ok(commands) => Ok(commands),
        Err(e) => {
            store.dispatch(CliSettingsAction::ProcessCliClientFailure(e.message()));
            Err(e)
        }
    }
}

pub async fn fetch_blocking_cli_commands(store: &Store) -> Result<Vec<String>, ApiError> {
    let commands = fetch_command_list(store, endpoints::CLI_BLOCKING_COMMANDS).await?;
    store.dispatch(CliSettingsAction::GetBlockingCommandsSuccess(commands.clone()));
    Ok(commands)
}

pub async fn fetch_unsupported_cli_commands(store: &Store) -> Result<Vec<String>, ApiError> {
    let commands = fetch_command_list(store, endpoints::CLI_UNSUPPORTED_COMMANDS).await?;
    store.dispatch(CliSettingsAction::GetUnsupportedCommandsSuccess(commands.clone()));
    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn searching_and_entering_are_exclusive() {
        let mut state = CliSettingsState::default();

        reduce(&mut state, CliSettingsAction::SetCliEnteringCommand);
        assert!(state.is_entering_command);

        reduce(&mut state, CliSettingsAction::SetSearchingCommand("get".into()));
        assert!(state.is_searching);
        assert!(!state.is_entering_command);

        reduce(&mut state, CliSettingsAction::SetCliEnteringCommand);
        assert!(state.is_entering_command);
        assert!(!state.is_searching);
    }

    #[test]
    fn toggle_helper_flips_visibility_and_minimized() {
        let mut state = CliSettingsState::default();
        reduce(&mut state, CliSettingsAction::ToggleCliHelper);

        assert!(state.is_show_helper);
        assert!(state.is_minimized_helper);
    }

    #[test]
    fn go_back_resumes_search() {
        let mut state = CliSettingsState {
            matched_command: "GET".into(),
            searched_command: "GET".into(),
            ..Default::default()
        };
        reduce(&mut state, CliSettingsAction::GoBackFromCommand);

        assert!(state.matched_command.is_empty());
        assert!(state.searched_command.is_empty());
        assert!(state.is_searching);
    }

    #[test]
    fn command_lists_are_lowercased() {
        let mut state = CliSettingsState {
            loading: true,
            ..Default::default()
        };
        reduce(
            &mut state,
            CliSettingsAction::GetBlockingCommandsSuccess(vec!["BLPOP".into(), "Monitor".into()]),
        );

        assert!(!state.loading);
        assert_eq!(state.blocking_commands, vec!["blpop", "monitor"]);
    }

    #[test]
    fn client_success_clears_previous_error() {
        let mut state = CliSettingsState::default();
        reduce(&mut state, CliSettingsAction::ProcessCliClient);
        reduce(&mut state, CliSettingsAction::ProcessCliClientFailure("nope".into()));
        reduce(&mut state, CliSettingsAction::ProcessCliClientSuccess("u-1".into()));

        assert!(!state.loading);
        assert!(state.error_client.is_empty());
        assert_eq!(state.cli_client_uuid, "u-1");
    }
}
