//! Backend routes, relative to the API base URL.
//!
//! Database-scoped routes are joined with [`database_url`].

pub const KEYS: &str = "keys";
pub const KEY_INFO: &str = "keys/get-info";
pub const KEY_NAME: &str = "keys/name";
pub const KEY_TTL: &str = "keys/ttl";
pub const KEYS_METADATA: &str = "keys/get-metadata";

pub const STRING: &str = "string";
pub const STRING_VALUE: &str = "string/get-value";
pub const STRING_VALUE_DOWNLOAD: &str = "string/download-value";

pub const HASH: &str = "hash";
pub const HASH_FIELDS: &str = "hash/fields";
pub const HASH_GET_FIELDS: &str = "hash/get-fields";
pub const HASH_TTL: &str = "hash/ttl";

pub const LIST: &str = "list";
pub const LIST_GET_ELEMENTS: &str = "list/get-elements";
pub const LIST_DELETE_ELEMENTS: &str = "list/elements";

pub const SET: &str = "set";
pub const SET_GET_MEMBERS: &str = "set/get-members";
pub const SET_MEMBERS: &str = "set/members";

pub const ZSET: &str = "zSet";
pub const ZSET_MEMBERS: &str = "zSet/members";
pub const ZSET_GET_MEMBERS: &str = "zSet/get-members";
pub const ZSET_MEMBERS_SEARCH: &str = "zSet/search";

pub const REJSON: &str = "rejson-rl";
pub const REJSON_GET: &str = "rejson-rl/get";
pub const REJSON_SET: &str = "rejson-rl/set";
pub const REJSON_ARRAPPEND: &str = "rejson-rl/arrappend";

pub const STREAMS: &str = "streams";
pub const STREAMS_ENTRIES: &str = "streams/entries";
pub const STREAMS_ENTRIES_GET: &str = "streams/entries/get";
pub const STREAMS_CONSUMER_GROUPS: &str = "streams/consumer-groups";
pub const STREAMS_CONSUMER_GROUPS_GET: &str = "streams/consumer-groups/get";
pub const STREAMS_CONSUMERS: &str = "streams/consumer-groups/consumers";
pub const STREAMS_CONSUMERS_GET: &str = "streams/consumer-groups/consumers/get";
pub const STREAMS_CONSUMERS_MESSAGES_GET: &str =
    "streams/consumer-groups/consumers/pending-messages/get";
pub const STREAM_CLAIM_PENDING_MESSAGES: &str =
    "streams/consumer-groups/consumers/pending-messages/claim";
pub const STREAM_ACK_PENDING_ENTRIES: &str =
    "streams/consumer-groups/consumers/pending-messages/ack";

pub const REDISEARCH: &str = "redisearch";
pub const REDISEARCH_SEARCH: &str = "redisearch/search";
pub const HISTORY: &str = "history";

pub const CLI: &str = "cli";
pub const SEND_COMMAND: &str = "send-command";
pub const SEND_CLUSTER_COMMAND: &str = "send-cluster-command";
pub const CLI_BLOCKING_COMMANDS: &str = "info/cli-blocking-commands";
pub const CLI_UNSUPPORTED_COMMANDS: &str = "info/cli-unsupported-commands";

pub const NOTIFICATIONS: &str = "notifications";
pub const NOTIFICATIONS_READ: &str = "notifications/read";

pub const REDIS_CLOUD_ACCOUNT: &str = "redis-enterprise/cloud/get-account";
pub const REDIS_CLOUD_SUBSCRIPTIONS: &str = "redis-enterprise/cloud/get-subscriptions";
pub const REDIS_CLOUD_GET_DATABASES: &str = "redis-enterprise/cloud/get-databases";
pub const REDIS_CLOUD_DATABASES: &str = "redis-enterprise/cloud/databases";

pub const CLOUD_ME_AUTODISCOVERY_ACCOUNT: &str = "cloud/autodiscovery/account";
pub const CLOUD_ME_AUTODISCOVERY_SUBSCRIPTIONS: &str = "cloud/autodiscovery/subscriptions";
pub const CLOUD_ME_AUTODISCOVERY_GET_DATABASES: &str = "cloud/autodiscovery/get-databases";
pub const CLOUD_ME_AUTODISCOVERY_DATABASES: &str = "cloud/autodiscovery/databases";

pub const AZURE_SUBSCRIPTIONS: &str = "azure/autodiscovery/subscriptions";
pub const AZURE_DATABASES: &str = "azure/autodiscovery/databases";

pub const MICROSOFT_AUTH_STATUS: &str = "azure/auth/status";
pub const MICROSOFT_AUTH_LOGIN: &str = "azure/auth/login";
pub const MICROSOFT_AUTH_LOGOUT: &str = "azure/auth/logout";

/// `databases/{id}/{endpoint}`, with the instance id percent-encoded.
pub fn database_url(instance_id: &str, endpoint: &str) -> String {
    format!("databases/{}/{}", urlencoding::encode(instance_id), endpoint)
}

pub fn list_element_url(index: u64) -> String {
    format!("{LIST_GET_ELEMENTS}/{index}")
}

pub fn cli_client_url(uuid: &str) -> String {
    format!("{CLI}/{}", urlencoding::encode(uuid))
}

pub fn cli_command_url(uuid: &str, endpoint: &str) -> String {
    format!("{}/{endpoint}", cli_client_url(uuid))
}

pub fn azure_subscription_databases_url(subscription_id: &str) -> String {
    format!(
        "{AZURE_SUBSCRIPTIONS}/{}/databases",
        urlencoding::encode(subscription_id)
    )
}
