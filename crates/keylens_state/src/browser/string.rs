use crate::browser::keys::refresh_key_info_action;
use crate::browser::settle;
use crate::store::Store;
use keylens_core::{
    ApiError, GetStringValueRequest, KeyNameRequest, Method, RedisBuffer, SetStringRequest,
    StringValue, endpoints,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringData {
    pub key: RedisBuffer,
    pub value: Option<RedisBuffer>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringState {
    pub loading: bool,
    pub error: String,
    pub is_compressed: bool,
    pub is_full_string_loaded: bool,
    pub data: StringData,
}

impl Default for StringState {
    fn default() -> Self {
        Self {
            loading: false,
            error: String::new(),
            is_compressed: false,
            is_full_string_loaded: true,
            data: StringData::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StringAction {
    GetString { reset: bool },
    GetStringSuccess { value: StringValue, is_full_string_loaded: bool },
    GetStringFailure(String),
    UpdateValue,
    UpdateValueSuccess(RedisBuffer),
    UpdateValueFailure(String),
    DownloadString,
    DownloadStringSuccess,
    DownloadStringFailure(String),
    SetIsStringCompressed(bool),
    ResetStringValue,
}

pub fn reduce(state: &mut StringState, action: StringAction) {
    match action {
        StringAction::GetString { reset } => {
            if reset {
                state.data = StringData::default();
            }
            state.loading = true;
            state.error.clear();
        }
        StringAction::GetStringSuccess {
            value,
            is_full_string_loaded,
        } => {
            state.loading = false;
            state.is_full_string_loaded = is_full_string_loaded;
            state.data = StringData {
                key: value.key_name,
                value: Some(value.value),
            };
        }
        StringAction::UpdateValue | StringAction::DownloadString => {
            state.loading = true;
            state.error.clear();
        }
        StringAction::UpdateValueSuccess(value) => {
            state.loading = false;
            state.data.value = Some(value);
        }
        StringAction::DownloadStringSuccess => state.loading = false,
        StringAction::GetStringFailure(message)
        | StringAction::UpdateValueFailure(message)
        | StringAction::DownloadStringFailure(message) => {
            state.loading = false;
            state.error = message;
        }
        StringAction::SetIsStringCompressed(compressed) => state.is_compressed = compressed,
        StringAction::ResetStringValue => *state = StringState::default(),
    }
}

/// Loads the whole value of a string key.
pub async fn fetch_string(store: &Store, key: &RedisBuffer, reset: bool) -> Result<StringValue, ApiError> {
    fetch_string_range(store, key, None, reset).await
}

/// Loads a string value up to byte `end` when given; large values stay partial
/// until requested in full.
pub async fn fetch_string_range(
    store: &Store,
    key: &RedisBuffer,
    end: Option<u64>,
    reset: bool,
) -> Result<StringValue, ApiError> {
    store.dispatch(StringAction::GetString { reset });

    let request = store
        .db_request(Method::Post, endpoints::STRING_VALUE)
        .json(&GetStringValueRequest {
            key_name: key.clone(),
            start: end.map(|_| 0),
            end,
        });

    match store.fetch::<StringValue>(request).await {
        Ok(value) => {
            let length = store.select(|state| {
                state
                    .browser
                    .keys
                    .selected_key
                    .data
                    .as_ref()
                    .and_then(|data| data.length)
            });
            let is_full_string_loaded = match (end, length) {
                (None, _) => true,
                (Some(_), Some(length)) => value.value.len() as i64 >= length,
                (Some(end), None) => (value.value.len() as u64) < end,
            };

            store.dispatch(StringAction::GetStringSuccess {
                value: value.clone(),
                is_full_string_loaded,
            });
            Ok(value)
        }
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(StringAction::GetStringFailure(message));
            Err(e)
        }
    }
}

pub async fn update_string_value(store: &Store, key: &RedisBuffer, value: RedisBuffer) -> Result<(), ApiError> {
    store.dispatch(StringAction::UpdateValue);

    let request = store.db_request(Method::Put, endpoints::STRING).json(&SetStringRequest {
        key_name: key.clone(),
        value: value.clone(),
    });
    if let Err(e) = store.send(request).await {
        let message = store.notify_error(&e);
        store.dispatch(StringAction::UpdateValueFailure(message));
        return Err(e);
    }

    store.dispatch(StringAction::UpdateValueSuccess(value));
    settle(refresh_key_info_action(store, key).await, "Key info refresh");
    Ok(())
}

/// Downloads the complete raw value, regardless of what is loaded in the view.
pub async fn download_string_value(store: &Store, key: &RedisBuffer) -> Result<RedisBuffer, ApiError> {
    store.dispatch(StringAction::DownloadString);

    let request = store
        .db_request(Method::Post, endpoints::STRING_VALUE_DOWNLOAD)
        .json(&KeyNameRequest {
            key_name: key.clone(),
        });

    match store.fetch::<RedisBuffer>(request).await {
        Ok(bytes) => {
            store.dispatch(StringAction::DownloadStringSuccess);
            Ok(bytes)
        }
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(StringAction::DownloadStringFailure(message));
            Err(e)
        }
    }
}
