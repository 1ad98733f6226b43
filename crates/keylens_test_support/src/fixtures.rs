use keylens_core::endpoints::database_url;
use keylens_core::{KeyInfo, KeyListItem, KeyType, RedisBuffer};
use serde_json::{Value, json};

pub const MOCK_TIMESTAMP: i64 = 1_629_128_049_027;

pub const DATABASE_ID: &str = "instanceId";

/// Database-scoped path for the fixture instance.
pub fn db(endpoint: &str) -> String {
    database_url(DATABASE_ID, endpoint)
}

pub fn buffer(value: &str) -> RedisBuffer {
    RedisBuffer::from(value)
}

/// `{ "type": "Buffer", "data": [..] }`, the wire form of a binary-safe value.
pub fn buffer_json(value: &str) -> Value {
    json!({ "type": "Buffer", "data": value.as_bytes() })
}

pub fn key_info(name: &str, key_type: KeyType, ttl: i64, size: i64) -> KeyInfo {
    KeyInfo {
        name: buffer(name),
        key_type,
        ttl,
        size: Some(size),
        length: Some(1),
        name_string: name.to_string(),
    }
}

pub fn key_info_json(name: &str, key_type: KeyType, ttl: i64, size: i64, length: i64) -> Value {
    json!({
        "name": buffer_json(name),
        "type": key_type.as_str(),
        "ttl": ttl,
        "size": size,
        "length": length,
    })
}

pub fn key_item(name: &str, key_type: KeyType) -> KeyListItem {
    KeyListItem::new(name).with_type(key_type).with_ttl(-1)
}

pub fn scan_node_json(cursor: u64, total: i64, scanned: i64, keys: &[&str]) -> Value {
    json!({
        "cursor": cursor,
        "total": total,
        "scanned": scanned,
        "keys": keys
            .iter()
            .map(|key| json!({ "name": buffer_json(key), "type": "string", "ttl": -1, "size": 10 }))
            .collect::<Vec<_>>(),
    })
}

pub fn hash_page_json(key: &str, total: i64, next_cursor: u64, fields: &[(&str, &str)]) -> Value {
    json!({
        "keyName": buffer_json(key),
        "total": total,
        "nextCursor": next_cursor,
        "fields": fields
            .iter()
            .map(|(field, value)| json!({ "field": buffer_json(field), "value": buffer_json(value) }))
            .collect::<Vec<_>>(),
    })
}

pub fn set_page_json(key: &str, total: i64, next_cursor: u64, members: &[&str]) -> Value {
    json!({
        "keyName": buffer_json(key),
        "total": total,
        "nextCursor": next_cursor,
        "members": members.iter().map(|member| buffer_json(member)).collect::<Vec<_>>(),
    })
}

pub fn zset_page_json(key: &str, total: i64, members: &[(&str, f64)]) -> Value {
    json!({
        "keyName": buffer_json(key),
        "total": total,
        "members": members
            .iter()
            .map(|(name, score)| json!({ "name": buffer_json(name), "score": score }))
            .collect::<Vec<_>>(),
    })
}

pub fn list_page_json(key: &str, total: i64, elements: &[&str]) -> Value {
    json!({
        "keyName": buffer_json(key),
        "total": total,
        "elements": elements.iter().map(|element| buffer_json(element)).collect::<Vec<_>>(),
    })
}

pub fn stream_page_json(key: &str, total: i64, ids: &[&str]) -> Value {
    let entries: Vec<Value> = ids
        .iter()
        .map(|id| json!({ "id": id, "fields": [{ "name": buffer_json("1"), "value": buffer_json("2") }] }))
        .collect();

    json!({
        "keyName": buffer_json(key),
        "total": total,
        "lastGeneratedId": ids.last().copied().unwrap_or_default(),
        "firstEntry": entries.first().cloned(),
        "lastEntry": entries.last().cloned(),
        "entries": entries,
    })
}
