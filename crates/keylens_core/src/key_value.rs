use crate::RedisBuffer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Redis data type of a key as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "hash")]
    Hash,
    #[serde(rename = "list")]
    List,
    #[serde(rename = "set")]
    Set,
    #[serde(rename = "zset")]
    ZSet,
    #[serde(rename = "ReJSON-RL")]
    Json,
    #[serde(rename = "stream")]
    Stream,
    #[serde(rename = "graphdata")]
    Graph,
    #[serde(rename = "TSDB-TYPE")]
    TimeSeries,
    #[serde(other)]
    Unknown,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::String => "string",
            KeyType::Hash => "hash",
            KeyType::List => "list",
            KeyType::Set => "set",
            KeyType::ZSet => "zset",
            KeyType::Json => "ReJSON-RL",
            KeyType::Stream => "stream",
            KeyType::Graph => "graphdata",
            KeyType::TimeSeries => "TSDB-TYPE",
            KeyType::Unknown => "unknown",
        }
    }

    /// Module types are browsable in the list but have no dedicated value view.
    pub fn is_module(&self) -> bool {
        matches!(
            self,
            KeyType::Graph | KeyType::TimeSeries | KeyType::Unknown
        )
    }
}

/// How the backend should encode key names and values in responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Buffer,
    Utf8,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Buffer => "buffer",
            Encoding::Utf8 => "utf8",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

/// Metadata of the selected key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInfo {
    pub name: RedisBuffer,
    #[serde(rename = "type")]
    pub key_type: KeyType,
    pub ttl: i64,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub length: Option<i64>,
    #[serde(default, skip_serializing)]
    pub name_string: String,
}

/// A key row in the key list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyListItem {
    pub name: RedisBuffer,
    #[serde(rename = "type", default)]
    pub key_type: Option<KeyType>,
    #[serde(default)]
    pub ttl: Option<i64>,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default, skip_serializing)]
    pub name_string: Option<String>,
}

impl KeyListItem {
    pub fn new(name: impl Into<RedisBuffer>) -> Self {
        Self {
            name: name.into(),
            key_type: None,
            ttl: None,
            size: None,
            name_string: None,
        }
    }

    pub fn with_type(mut self, key_type: KeyType) -> Self {
        self.key_type = Some(key_type);
        self
    }

    pub fn with_ttl(mut self, ttl: i64) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// Scan result of a single node; standalone databases return exactly one.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanNodeResponse {
    pub cursor: u64,
    pub total: i64,
    pub scanned: i64,
    #[serde(default)]
    pub keys: Vec<KeyListItem>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

impl ScanNodeResponse {
    pub fn shard_id(&self) -> String {
        match (&self.host, self.port) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            _ => "standalone".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardMeta {
    pub cursor: u64,
    pub total: i64,
    pub scanned: i64,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// A page of the key list, normalized across shards.
#[derive(Debug, Clone, PartialEq)]
pub struct KeysPage {
    pub total: i64,
    pub scanned: i64,
    pub next_cursor: String,
    pub keys: Vec<KeyListItem>,
    pub shards_meta: BTreeMap<String, ShardMeta>,
    pub previous_result_count: usize,
    pub last_refresh_time: Option<i64>,
}

impl Default for KeysPage {
    fn default() -> Self {
        Self {
            total: 0,
            scanned: 0,
            next_cursor: "0".to_string(),
            keys: Vec::new(),
            shards_meta: BTreeMap::new(),
            previous_result_count: 0,
            last_refresh_time: None,
        }
    }
}

/// Merges per-node scan replies into one page.
///
/// `scanned` accumulates on top of the previous shard state so that "load more"
/// keeps counting; `total` is whatever the node reports now. The next cursor is
/// the single node cursor for standalone databases and a `host:port@cursor` list
/// for clusters, or `"0"` once every shard is exhausted.
pub fn parse_keys_list_response(
    previous_shards: &BTreeMap<String, ShardMeta>,
    nodes: Vec<ScanNodeResponse>,
) -> KeysPage {
    let mut shards = previous_shards.clone();
    let mut keys = Vec::new();

    for node in nodes {
        let id = node.shard_id();
        let shard = shards.entry(id).or_default();
        shard.cursor = node.cursor;
        shard.total = node.total;
        shard.scanned += node.scanned;
        shard.host = node.host.clone();
        shard.port = node.port;
        keys.extend(node.keys);
    }

    let total = shards.values().map(|shard| shard.total).sum();
    let scanned = shards.values().map(|shard| shard.scanned).sum();

    let next_cursor = if shards.values().all(|shard| shard.cursor == 0) {
        "0".to_string()
    } else if shards.len() == 1 {
        shards
            .values()
            .next()
            .map(|shard| shard.cursor.to_string())
            .unwrap_or_else(|| "0".to_string())
    } else {
        shards
            .iter()
            .filter(|(_, shard)| shard.cursor != 0)
            .map(|(id, shard)| format!("{id}@{}", shard.cursor))
            .collect::<Vec<_>>()
            .join(",")
    };

    let previous_result_count = keys.len();

    KeysPage {
        total,
        scanned,
        next_cursor,
        keys,
        shards_meta: shards,
        previous_result_count,
        last_refresh_time: None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetKeysRequest {
    pub cursor: String,
    pub count: u32,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub key_type: Option<KeyType>,
    #[serde(rename = "match")]
    pub pattern: String,
    pub keys_info: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyNameRequest {
    pub key_name: RedisBuffer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteKeysRequest {
    pub key_names: Vec<RedisBuffer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameKeyRequest {
    pub key_name: RedisBuffer,
    pub new_key_name: RedisBuffer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateKeyTtlRequest {
    pub key_name: RedisBuffer,
    pub ttl: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetKeysMetadataRequest {
    pub keys: Vec<RedisBuffer>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub key_type: Option<KeyType>,
}

/// Reply of delete endpoints that report how many items were removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DeleteResponse {
    pub affected: i64,
}

// String

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetStringValueRequest {
    pub key_name: RedisBuffer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringValue {
    pub key_name: RedisBuffer,
    pub value: RedisBuffer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStringRequest {
    pub key_name: RedisBuffer,
    pub value: RedisBuffer,
}

// Hash

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashField {
    pub field: RedisBuffer,
    pub value: RedisBuffer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire: Option<i64>,
}

impl HashField {
    pub fn new(field: impl Into<RedisBuffer>, value: impl Into<RedisBuffer>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            expire: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashFieldTtl {
    pub field: RedisBuffer,
    pub expire: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetHashFieldsRequest {
    pub key_name: RedisBuffer,
    pub cursor: u64,
    pub count: u32,
    #[serde(rename = "match")]
    pub pattern: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashFieldsPage {
    pub key_name: RedisBuffer,
    pub total: i64,
    pub next_cursor: u64,
    pub fields: Vec<HashField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HashFieldsRequest {
    pub key_name: RedisBuffer,
    pub fields: Vec<HashField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteHashFieldsRequest {
    pub key_name: RedisBuffer,
    pub fields: Vec<RedisBuffer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHashFieldsTtlRequest {
    pub key_name: RedisBuffer,
    pub fields: Vec<HashFieldTtl>,
}

// List

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetListElementsRequest {
    pub key_name: RedisBuffer,
    pub offset: u64,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListElementsPage {
    pub key_name: RedisBuffer,
    pub total: i64,
    pub elements: Vec<RedisBuffer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListElementValue {
    pub key_name: RedisBuffer,
    pub value: RedisBuffer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetListElementRequest {
    pub key_name: RedisBuffer,
    pub element: RedisBuffer,
    pub index: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ListDestination {
    Head,
    #[default]
    Tail,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushListElementsRequest {
    pub key_name: RedisBuffer,
    pub destination: ListDestination,
    pub elements: Vec<RedisBuffer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteListElementsRequest {
    pub key_name: RedisBuffer,
    pub destination: ListDestination,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeleteListElementsResponse {
    pub elements: Vec<RedisBuffer>,
}

// Set

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSetMembersRequest {
    pub key_name: RedisBuffer,
    pub cursor: u64,
    pub count: u32,
    #[serde(rename = "match")]
    pub pattern: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetMembersPage {
    pub key_name: RedisBuffer,
    pub total: i64,
    pub next_cursor: u64,
    pub members: Vec<RedisBuffer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetMembersRequest {
    pub key_name: RedisBuffer,
    pub members: Vec<RedisBuffer>,
}

// Sorted set

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZSetMember {
    pub name: RedisBuffer,
    pub score: f64,
}

impl ZSetMember {
    pub fn new(name: impl Into<RedisBuffer>, score: f64) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetZSetMembersRequest {
    pub key_name: RedisBuffer,
    pub offset: u64,
    pub count: u32,
    pub sort_order: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchZSetMembersRequest {
    pub key_name: RedisBuffer,
    pub cursor: u64,
    pub count: u32,
    #[serde(rename = "match")]
    pub pattern: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZSetMembersPage {
    pub key_name: RedisBuffer,
    pub total: i64,
    pub members: Vec<ZSetMember>,
    #[serde(default)]
    pub next_cursor: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZSetMembersRequest {
    pub key_name: RedisBuffer,
    pub members: Vec<ZSetMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteZSetMembersRequest {
    pub key_name: RedisBuffer,
    pub members: Vec<RedisBuffer>,
}

// JSON documents

/// Root path used when (re)loading a whole document.
pub const JSON_ROOT_PATH: &str = "$";

/// Documents at or below this length are fetched in full instead of lazily.
pub const JSON_LENGTH_TO_FORCE_RETRIEVE: u64 = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetJsonRequest {
    pub key_name: RedisBuffer,
    pub path: String,
    pub force_retrieve: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonBranch {
    pub downloaded: bool,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(rename = "type", default)]
    pub data_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetJsonRequest {
    pub key_name: RedisBuffer,
    pub path: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendJsonArrayRequest {
    pub key_name: RedisBuffer,
    pub path: String,
    pub data: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveJsonRequest {
    pub key_name: RedisBuffer,
    pub path: String,
}

// Search index

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchIndexKeysRequest {
    pub offset: u64,
    pub limit: u32,
    pub query: String,
    pub index: RedisBuffer,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchIndexKeysResponse {
    pub cursor: u64,
    pub total: i64,
    #[serde(default)]
    pub scanned: i64,
    pub keys: Vec<KeyListItem>,
    #[serde(default)]
    pub max_results: Option<i64>,
}

impl SearchIndexKeysResponse {
    pub fn into_page(self) -> KeysPage {
        let previous_result_count = self.keys.len();
        KeysPage {
            total: self.total,
            scanned: self.scanned,
            next_cursor: self.cursor.to_string(),
            keys: self.keys,
            shards_meta: BTreeMap::new(),
            previous_result_count,
            last_refresh_time: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchIndexListResponse {
    pub indexes: Vec<RedisBuffer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchIndexSource {
    Hash,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchIndexField {
    pub name: RedisBuffer,
    #[serde(rename = "type")]
    pub field_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSearchIndexRequest {
    pub index: RedisBuffer,
    #[serde(rename = "type")]
    pub source: SearchIndexSource,
    pub prefixes: Vec<RedisBuffer>,
    pub fields: Vec<SearchIndexField>,
}

// Search history

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Pattern,
    Redisearch,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Pattern => "pattern",
            SearchMode::Redisearch => "redisearch",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryFilter {
    #[serde(rename = "type", default)]
    pub key_type: Option<KeyType>,
    #[serde(rename = "match", default)]
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryItem {
    pub id: String,
    pub mode: SearchMode,
    #[serde(default)]
    pub filter: SearchHistoryFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteHistoryRequest {
    pub ids: Vec<String>,
}

// New keys

/// Body of a "create key" call; each type posts to its own endpoint.
pub trait NewKey: Serialize + Send + Sync {
    const KEY_TYPE: KeyType;

    fn key_name(&self) -> &RedisBuffer;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHashKey {
    pub key_name: RedisBuffer,
    pub fields: Vec<HashField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateZSetKey {
    pub key_name: RedisBuffer,
    pub members: Vec<ZSetMember>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSetKey {
    pub key_name: RedisBuffer,
    pub members: Vec<RedisBuffer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStringKey {
    pub key_name: RedisBuffer,
    pub value: RedisBuffer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListKey {
    pub key_name: RedisBuffer,
    pub elements: Vec<RedisBuffer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJsonKey {
    pub key_name: RedisBuffer,
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStreamKey {
    pub key_name: RedisBuffer,
    pub entries: Vec<crate::stream::NewStreamEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire: Option<i64>,
}

macro_rules! impl_new_key {
    ($($ty:ty => $key_type:expr),* $(,)?) => {
        $(
            impl NewKey for $ty {
                const KEY_TYPE: KeyType = $key_type;

                fn key_name(&self) -> &RedisBuffer {
                    &self.key_name
                }
            }
        )*
    };
}

impl_new_key! {
    CreateHashKey => KeyType::Hash,
    CreateZSetKey => KeyType::ZSet,
    CreateSetKey => KeyType::Set,
    CreateStringKey => KeyType::String,
    CreateListKey => KeyType::List,
    CreateJsonKey => KeyType::Json,
    CreateStreamKey => KeyType::Stream,
}
