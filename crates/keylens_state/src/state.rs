use crate::action::Action;
use crate::app::{self, AppInfo, ConnectedInstance};
use crate::browser::hash::{self, HashState};
use crate::browser::keys::{self, KeysState};
use crate::browser::list::{self, ListState};
use crate::browser::redisearch::{self, RedisearchState};
use crate::browser::rejson::{self, JsonState};
use crate::browser::set::{self, SetState};
use crate::browser::stream::{self, StreamState};
use crate::browser::string::{self, StringState};
use crate::browser::tree::{self, TreeState};
use crate::browser::zset::{self, ZSetState};
use crate::cli::output::{self, CliOutputState};
use crate::cli::settings::{self, CliSettingsState};
use crate::connections::azure::{self, AzureState};
use crate::connections::cloud::{self, CloudState};
use crate::connections::microsoft_auth::{self, MicrosoftAuthState};
use crate::notifications::{self, NotificationsState};
use keylens_core::{AppConfig, BrowserStorage};

/// `{ loading, error }` envelope shared by every request a slice tracks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestStatus {
    pub loading: bool,
    pub error: String,
}

impl RequestStatus {
    pub fn start(&mut self) {
        self.loading = true;
        self.error.clear();
    }

    pub fn succeed(&mut self) {
        self.loading = false;
    }

    pub fn fail(&mut self, message: String) {
        self.loading = false;
        self.error = message;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub notifications: NotificationsState,
    pub info: AppInfo,
    pub connected_instance: ConnectedInstance,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrowserState {
    pub keys: KeysState,
    pub redisearch: RedisearchState,
    pub tree: TreeState,
    pub string: StringState,
    pub hash: HashState,
    pub list: ListState,
    pub set: SetState,
    pub zset: ZSetState,
    pub stream: StreamState,
    pub rejson: JsonState,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliState {
    pub settings: CliSettingsState,
    pub output: CliOutputState,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionsState {
    pub cloud: CloudState,
    pub azure: AzureState,
    pub microsoft_auth: MicrosoftAuthState,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RootState {
    pub app: AppState,
    pub browser: BrowserState,
    pub cli: CliState,
    pub connections: ConnectionsState,
}

impl RootState {
    /// Initial tree, with the persisted UI preferences already applied.
    pub fn initial(local_storage: &dyn BrowserStorage, config: &AppConfig) -> Self {
        let mut state = Self::default();
        state.app.info.encoding = config.encoding;
        state.browser.keys = KeysState::restored(local_storage);
        state.cli.output = CliOutputState::restored(local_storage);
        state
    }
}

pub fn reduce(state: &mut RootState, action: Action) {
    match action {
        Action::App(action) => app::reduce(&mut state.app, action),
        Action::Notifications(action) => {
            notifications::reduce(&mut state.app.notifications, action)
        }
        Action::Keys(action) => keys::reduce(&mut state.browser.keys, action),
        Action::Redisearch(action) => redisearch::reduce(&mut state.browser.redisearch, action),
        Action::Tree(action) => tree::reduce(&mut state.browser.tree, action),
        Action::String(action) => string::reduce(&mut state.browser.string, action),
        Action::Hash(action) => hash::reduce(&mut state.browser.hash, action),
        Action::List(action) => list::reduce(&mut state.browser.list, action),
        Action::Set(action) => set::reduce(&mut state.browser.set, action),
        Action::ZSet(action) => zset::reduce(&mut state.browser.zset, action),
        Action::Stream(action) => stream::reduce(&mut state.browser.stream, action),
        Action::Json(action) => rejson::reduce(&mut state.browser.rejson, action),
        Action::CliSettings(action) => settings::reduce(&mut state.cli.settings, action),
        Action::CliOutput(action) => output::reduce(&mut state.cli.output, action),
        Action::Cloud(action) => cloud::reduce(&mut state.connections.cloud, action),
        Action::Azure(action) => azure::reduce(&mut state.connections.azure, action),
        Action::MicrosoftAuth(action) => {
            microsoft_auth::reduce(&mut state.connections.microsoft_auth, action)
        }
    }
}
