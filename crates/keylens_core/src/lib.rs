mod api;
mod app_config;
mod buffer;
mod cli;
mod clock;
mod cloud;
mod error;
mod key_value;
mod notification;
mod storage;
mod stream;
mod task;
mod telemetry;

pub mod endpoints;

pub use api::{ApiRequest, ApiResponse, ApiService, Method, is_status_successful};
pub use app_config::{AppConfig, AppConfigStore, DEFAULT_API_BASE_URL};
pub use buffer::{RedisBuffer, format_name_short};
pub use cli::{
    CliClientResponse, CliOutputFormat, CommandExecutionStatus, SendCommandRequest,
    SendCommandResponse,
};
pub use clock::{Clock, SystemClock};
pub use cloud::{
    AzureDatabase, AzureDatabaseAdded, AzureDatabaseRef, AzureImportResult, AzureSubscription,
    CloudAccount, CloudCredentials, CloudDatabaseRef, CloudImportResult, CloudInstance,
    CloudInstanceAdded, CloudSubscription, CloudSubscriptionRef, GetCloudInstancesRequest,
    ImportAzureDatabasesRequest, ImportCloudDatabasesRequest, ImportStatus, MicrosoftAccount,
    MicrosoftAuthStatus, MicrosoftAuthStatusResponse, MicrosoftLoginResponse,
    CLOUD_API_KEY_HEADER, CLOUD_API_SECRET_HEADER,
};
pub use error::{ApiError, StorageError, CLIENT_NOT_FOUND, DEFAULT_ERROR_MESSAGE};
pub use key_value::{
    AppendJsonArrayRequest, CreateHashKey, CreateJsonKey,
    CreateListKey, CreateSearchIndexRequest, CreateSetKey, CreateStreamKey, CreateStringKey,
    CreateZSetKey, DeleteHashFieldsRequest, DeleteHistoryRequest, DeleteKeysRequest,
    DeleteListElementsRequest, DeleteListElementsResponse, DeleteResponse,
    DeleteZSetMembersRequest, Encoding, GetHashFieldsRequest, GetJsonRequest,
    GetKeysMetadataRequest, GetKeysRequest, GetListElementsRequest, GetSetMembersRequest,
    GetStringValueRequest, GetZSetMembersRequest, HashField, HashFieldTtl, HashFieldsPage,
    HashFieldsRequest, JsonBranch, KeyInfo, KeyListItem, KeyNameRequest, KeyType, KeysPage,
    ListDestination, ListElementValue, ListElementsPage, NewKey, PushListElementsRequest,
    RemoveJsonRequest, RenameKeyRequest, ScanNodeResponse, SearchHistoryFilter,
    SearchHistoryItem, SearchIndexField, SearchIndexKeysRequest, SearchIndexKeysResponse,
    SearchIndexListResponse, SearchIndexSource, SearchMode, SearchZSetMembersRequest,
    SetJsonRequest, SetListElementRequest, SetMembersPage, SetMembersRequest, SetStringRequest,
    ShardMeta, SortOrder, StringValue, UpdateHashFieldsTtlRequest, UpdateKeyTtlRequest,
    ZSetMember, ZSetMembersPage, ZSetMembersRequest, JSON_LENGTH_TO_FORCE_RETRIEVE,
    JSON_ROOT_PATH, parse_keys_list_response,
};
pub use notification::{NotificationItem, NotificationType, NotificationsResponse};
pub use storage::{
    BrowserStorage, JsonFileStorage, MemoryStorage, StorageItem, read_item, write_item,
};
pub use stream::{
    AckPendingEntriesRequest, AddStreamEntriesRequest, ClaimPendingEntriesRequest,
    ClaimPendingEntriesResponse, Consumer, ConsumerGroup, CreateConsumerGroupsRequest,
    DeleteConsumerGroupsRequest, DeleteConsumersRequest, DeleteStreamEntriesRequest,
    GetConsumersRequest, GetPendingMessagesRequest, GetStreamEntriesRequest, NewConsumerGroup,
    NewStreamEntry, PendingMessage, StreamEntriesPage, StreamEntry, StreamEntryField,
    UpdateConsumerGroupRequest, STREAM_RANGE_END, STREAM_RANGE_START,
};
pub use task::{CancelToken, RequestKind, RequestRegistry};
pub use telemetry::{LogTelemetry, TelemetryEvent, TelemetrySink};
