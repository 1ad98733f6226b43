use crate::app::AppAction;
use crate::browser::hash::HashAction;
use crate::browser::keys::KeysAction;
use crate::browser::list::ListAction;
use crate::browser::redisearch::RedisearchAction;
use crate::browser::rejson::JsonAction;
use crate::browser::set::SetAction;
use crate::browser::stream::StreamAction;
use crate::browser::string::StringAction;
use crate::browser::tree::TreeAction;
use crate::browser::zset::ZSetAction;
use crate::cli::output::CliOutputAction;
use crate::cli::settings::CliSettingsAction;
use crate::connections::azure::AzureAction;
use crate::connections::cloud::CloudAction;
use crate::connections::microsoft_auth::MicrosoftAuthAction;
use crate::notifications::NotificationsAction;

/// Everything that can be dispatched, tagged by the slice that handles it.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    App(AppAction),
    Notifications(NotificationsAction),
    Keys(KeysAction),
    Redisearch(RedisearchAction),
    Tree(TreeAction),
    String(StringAction),
    Hash(HashAction),
    List(ListAction),
    Set(SetAction),
    ZSet(ZSetAction),
    Stream(StreamAction),
    Json(JsonAction),
    CliSettings(CliSettingsAction),
    CliOutput(CliOutputAction),
    Cloud(CloudAction),
    Azure(AzureAction),
    MicrosoftAuth(MicrosoftAuthAction),
}

macro_rules! impl_from_slice_action {
    ($($slice:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$slice> for Action {
                fn from(action: $slice) -> Self {
                    Action::$variant(action)
                }
            }
        )*
    };
}

impl_from_slice_action! {
    AppAction => App,
    NotificationsAction => Notifications,
    KeysAction => Keys,
    RedisearchAction => Redisearch,
    TreeAction => Tree,
    StringAction => String,
    HashAction => Hash,
    ListAction => List,
    SetAction => Set,
    ZSetAction => ZSet,
    StreamAction => Stream,
    JsonAction => Json,
    CliSettingsAction => CliSettings,
    CliOutputAction => CliOutput,
    CloudAction => Cloud,
    AzureAction => Azure,
    MicrosoftAuthAction => MicrosoftAuth,
}
