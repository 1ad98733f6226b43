use crate::{RedisBuffer, SortOrder};
use serde::{Deserialize, Serialize};

/// Smallest and largest possible stream ids, used when no range filter is set.
pub const STREAM_RANGE_START: &str = "-";
pub const STREAM_RANGE_END: &str = "+";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEntryField {
    pub name: RedisBuffer,
    pub value: RedisBuffer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEntry {
    pub id: String,
    pub fields: Vec<StreamEntryField>,
}

/// Entry to append; `id` is usually `*`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStreamEntry {
    pub id: String,
    pub fields: Vec<StreamEntryField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetStreamEntriesRequest {
    pub key_name: RedisBuffer,
    pub start: String,
    pub end: String,
    pub count: u32,
    pub sort_order: SortOrder,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamEntriesPage {
    pub key_name: RedisBuffer,
    pub total: i64,
    #[serde(default)]
    pub last_generated_id: String,
    #[serde(default)]
    pub first_entry: Option<StreamEntry>,
    #[serde(default)]
    pub last_entry: Option<StreamEntry>,
    pub entries: Vec<StreamEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddStreamEntriesRequest {
    pub key_name: RedisBuffer,
    pub entries: Vec<NewStreamEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteStreamEntriesRequest {
    pub key_name: RedisBuffer,
    pub entries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerGroup {
    pub name: RedisBuffer,
    pub consumers: i64,
    pub pending: i64,
    pub last_delivered_id: String,
    #[serde(default)]
    pub smallest_pending_id: Option<String>,
    #[serde(default)]
    pub greatest_pending_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consumer {
    pub name: RedisBuffer,
    pub pending: i64,
    pub idle: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingMessage {
    pub id: String,
    pub consumer_name: RedisBuffer,
    pub idle: i64,
    pub delivered: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConsumerGroup {
    pub name: RedisBuffer,
    pub last_delivered_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConsumerGroupsRequest {
    pub key_name: RedisBuffer,
    pub consumer_groups: Vec<NewConsumerGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConsumerGroupRequest {
    pub key_name: RedisBuffer,
    pub name: RedisBuffer,
    pub last_delivered_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteConsumerGroupsRequest {
    pub key_name: RedisBuffer,
    pub consumer_groups: Vec<RedisBuffer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetConsumersRequest {
    pub key_name: RedisBuffer,
    pub group_name: RedisBuffer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteConsumersRequest {
    pub key_name: RedisBuffer,
    pub group_name: RedisBuffer,
    pub consumer_names: Vec<RedisBuffer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPendingMessagesRequest {
    pub key_name: RedisBuffer,
    pub group_name: RedisBuffer,
    pub consumer_name: RedisBuffer,
    pub start: String,
    pub end: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AckPendingEntriesRequest {
    pub key_name: RedisBuffer,
    pub group_name: RedisBuffer,
    pub entries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimPendingEntriesRequest {
    pub key_name: RedisBuffer,
    pub group_name: RedisBuffer,
    pub consumer_name: RedisBuffer,
    pub min_idle_time: i64,
    pub entries: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<i64>,
    pub force: bool,
}

impl ClaimPendingEntriesRequest {
    pub fn new(
        key_name: RedisBuffer,
        group_name: RedisBuffer,
        consumer_name: RedisBuffer,
        min_idle_time: i64,
        entries: Vec<String>,
    ) -> Self {
        Self {
            key_name,
            group_name,
            consumer_name,
            min_idle_time,
            entries,
            idle: None,
            time: None,
            retry_count: None,
            force: false,
        }
    }

    /// `idle` and `time` are mutually exclusive; setting one clears the other.
    pub fn with_idle(mut self, idle: i64) -> Self {
        self.idle = Some(idle);
        self.time = None;
        self
    }

    pub fn with_time(mut self, time: i64) -> Self {
        self.time = Some(time);
        self.idle = None;
        self
    }

    pub fn with_retry_count(mut self, retry_count: i64) -> Self {
        self.retry_count = Some(retry_count);
        self
    }

    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClaimPendingEntriesResponse {
    pub affected: Vec<String>,
}
