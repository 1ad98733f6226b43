//! Success toasts raised by browser and import flows.

use crate::notifications::MessagePayload;
use keylens_core::{RedisBuffer, format_name_short};

fn short(name: &RedisBuffer) -> String {
    format_name_short(&name.to_display_string())
}

pub fn added_new_key(key: &RedisBuffer) -> MessagePayload {
    MessagePayload::new("Key has been added", format!("{} has been added.", short(key)))
}

pub fn deleted_key(key: &RedisBuffer) -> MessagePayload {
    MessagePayload::new("Key has been deleted", format!("{} has been deleted.", short(key)))
}

/// `value_type` names what was removed, e.g. `Field`, `Member` or `JSON key`.
pub fn removed_key_value(key: &RedisBuffer, value: &str, value_type: &str) -> MessagePayload {
    MessagePayload::new(
        format!("{value_type} has been removed"),
        format!(
            "{} has been removed from {}",
            format_name_short(value),
            short(key)
        ),
    )
}

pub fn removed_list_elements(key: &RedisBuffer, count: i64, elements: &[RedisBuffer]) -> MessagePayload {
    let removed = elements
        .iter()
        .map(RedisBuffer::to_display_string)
        .collect::<Vec<_>>()
        .join(", ");

    MessagePayload::new(
        "Elements have been removed",
        format!(
            "{count} Element(s) removed from {}: {}",
            short(key),
            format_name_short(&removed)
        ),
    )
}

pub fn create_index() -> MessagePayload {
    MessagePayload::new("Index has been created", "Open the list of indexes to see it.")
}

pub fn added_new_instances(names: &[String]) -> MessagePayload {
    let message = match names {
        [name] => format!("{} has been added.", format_name_short(name)),
        _ => format!("{} databases have been added.", names.len()),
    };

    MessagePayload::new("Database(s) added", message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_key_names_are_shortened() {
        let key = RedisBuffer::from("k".repeat(150));
        let message = deleted_key(&key);

        assert_eq!(message.title, "Key has been deleted");
        assert!(message.message.starts_with(&"k".repeat(100)));
        assert!(message.message.contains("... has been deleted."));
    }

    #[test]
    fn instance_toast_counts_many_databases() {
        let one = added_new_instances(&["cache".to_string()]);
        let many = added_new_instances(&["a".to_string(), "b".to_string()]);

        assert_eq!(one.message, "cache has been added.");
        assert_eq!(many.message, "2 databases have been added.");
    }
}
