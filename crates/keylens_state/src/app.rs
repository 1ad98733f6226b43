use crate::state::AppState;
use keylens_core::Encoding;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppInfo {
    pub encoding: Encoding,
}

/// Database the browser and CLI talk to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectedInstance {
    pub id: String,
    pub name: String,
    pub db: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    SetEncoding(Encoding),
    SetConnectedInstance(ConnectedInstance),
    ResetConnectedInstance,
}

pub fn reduce(state: &mut AppState, action: AppAction) {
    match action {
        AppAction::SetEncoding(encoding) => state.info.encoding = encoding,
        AppAction::SetConnectedInstance(instance) => state.connected_instance = instance,
        AppAction::ResetConnectedInstance => state.connected_instance = ConnectedInstance::default(),
    }
}
