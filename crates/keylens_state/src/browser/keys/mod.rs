mod history;
mod listing;
mod thunks;

pub use history::{
    SearchHistoryState, delete_pattern_history, delete_search_history, fetch_pattern_history,
    fetch_search_history,
};
pub use listing::{KeyListing, PatternListing, SearchIndexListing, active_listing, listing};
pub use thunks::{
    add_hash_key, add_list_key, add_rejson_key, add_set_key, add_stream_key, add_string_key,
    add_typed_key, add_zset_key, delete_key_action, delete_key_from_list,
    delete_selected_key_action, delete_selected_key_cascade, edit_key, edit_key_from_list,
    edit_key_ttl, edit_key_ttl_from_list, fetch_key_info, fetch_keys, fetch_keys_metadata,
    fetch_more_keys, fetch_more_pattern_keys, fetch_pattern_keys, refresh_key,
    refresh_key_info_action, set_initial_state_by_type,
};
pub(crate) use thunks::await_key_info_refresh;

use crate::state::RequestStatus;
use keylens_core::{
    BrowserStorage, KeyInfo, KeyListItem, KeyType, KeysPage, RedisBuffer, SearchHistoryItem,
    SearchMode, StorageItem, read_item,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeyViewType {
    #[default]
    Browser,
    Tree,
}

/// How the value of the selected key is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewFormat {
    #[default]
    Unicode,
    #[serde(rename = "ASCII")]
    Ascii,
    #[serde(rename = "JSON")]
    Json,
    Msgpack,
    #[serde(rename = "PHP serialized")]
    Php,
    #[serde(rename = "Java serialized")]
    Java,
    Pickle,
    #[serde(rename = "Vector 32-bit")]
    Vector32Bit,
    #[serde(rename = "Vector 64-bit")]
    Vector64Bit,
    #[serde(rename = "HEX")]
    Hex,
    Binary,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectedKey {
    pub loading: bool,
    pub refreshing: bool,
    pub last_refresh_time: Option<i64>,
    pub error: String,
    pub data: Option<KeyInfo>,
    pub view_format: ViewFormat,
}

impl SelectedKey {
    fn with_view_format(view_format: ViewFormat) -> Self {
        Self {
            view_format,
            ..Self::default()
        }
    }

    pub fn name(&self) -> Option<&RedisBuffer> {
        self.data.as_ref().map(|data| &data.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeysState {
    pub loading: bool,
    pub error: String,
    pub filter: Option<KeyType>,
    pub search: String,
    pub is_searched: bool,
    pub is_filtered: bool,
    pub is_browser_full_screen: bool,
    pub search_mode: SearchMode,
    pub view_type: KeyViewType,
    pub data: KeysPage,
    pub selected_key: SelectedKey,
    pub add_key: RequestStatus,
    pub search_history: SearchHistoryState,
}

impl KeysState {
    pub(crate) fn restored(local_storage: &dyn BrowserStorage) -> Self {
        Self {
            search_mode: read_item(local_storage, StorageItem::BrowserSearchMode).unwrap_or_default(),
            view_type: read_item(local_storage, StorageItem::BrowserViewType).unwrap_or_default(),
            selected_key: SelectedKey::with_view_format(
                read_item(local_storage, StorageItem::ViewFormat).unwrap_or_default(),
            ),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeysAction {
    LoadKeys,
    LoadKeysSuccess {
        data: KeysPage,
        is_searched: bool,
        is_filtered: bool,
    },
    LoadKeysFailure(String),
    LoadMoreKeys,
    LoadMoreKeysSuccess(KeysPage),
    LoadMoreKeysFailure(String),
    SetLastBatchPatternKeys(Vec<KeyListItem>),
    LoadKeyInfoSuccess(KeyInfo),
    RefreshKeyInfo,
    RefreshKeyInfoSuccess(KeyInfo),
    RefreshKeyInfoFail,
    UpdateSelectedKeyRefreshTime(i64),
    DeleteSelectedKey,
    DeleteSelectedKeySuccess,
    DeleteSelectedKeyFailure(String),
    DefaultSelectedKeyAction,
    DefaultSelectedKeyActionSuccess,
    DefaultSelectedKeyActionFailure(String),
    DeletePatternKeyFromList(RedisBuffer),
    EditPatternKeyFromList {
        key: RedisBuffer,
        new_key: RedisBuffer,
    },
    EditPatternKeyTtlFromList {
        key: RedisBuffer,
        ttl: i64,
    },
    UpdateKeySizeFromList {
        key: RedisBuffer,
        size: Option<i64>,
    },
    UpdateSelectedKeyLength(i64),
    AddKey,
    AddKeySuccess,
    AddKeyFailure(String),
    ResetAddKey,
    SetSearchMatch(String),
    SetFilter(Option<KeyType>),
    ChangeKeyViewType(KeyViewType),
    ChangeSearchMode(SearchMode),
    ResetKeyInfo,
    ResetKeys,
    ResetKeysData,
    /// `None` toggles.
    ToggleBrowserFullScreen(Option<bool>),
    SetViewFormat(ViewFormat),
    LoadSearchHistory,
    LoadSearchHistorySuccess(Vec<SearchHistoryItem>),
    LoadSearchHistoryFailure,
    DeleteSearchHistorySuccess(Vec<String>),
}

fn patch_keys(keys: &mut [KeyListItem], name: &RedisBuffer, patch: impl Fn(&mut KeyListItem)) {
    keys.iter_mut().filter(|item| &item.name == name).for_each(patch);
}

pub fn reduce(state: &mut KeysState, action: KeysAction) {
    match action {
        KeysAction::LoadKeys | KeysAction::LoadMoreKeys => {
            state.loading = true;
            state.error.clear();
        }
        KeysAction::LoadKeysSuccess {
            data,
            is_searched,
            is_filtered,
        } => {
            state.data = KeysPage {
                previous_result_count: data.keys.len(),
                ..data
            };
            state.loading = false;
            state.is_searched = is_searched;
            state.is_filtered = is_filtered;
        }
        KeysAction::LoadKeysFailure(message) | KeysAction::LoadMoreKeysFailure(message) => {
            state.loading = false;
            state.error = message;
        }
        KeysAction::LoadMoreKeysSuccess(page) => {
            state.data.previous_result_count = page.keys.len();
            state.data.keys = page.keys;
            state.data.total = page.total;
            state.data.scanned = page.scanned;
            state.data.next_cursor = page.next_cursor;
            state.data.shards_meta = page.shards_meta;
            state.loading = false;
        }
        KeysAction::SetLastBatchPatternKeys(batch) => {
            let keys = &mut state.data.keys;
            keys.truncate(keys.len().saturating_sub(batch.len()));
            keys.extend(batch);
        }
        KeysAction::LoadKeyInfoSuccess(mut info) => {
            info.name_string = info.name.to_display_string();
            state.selected_key.loading = false;
            state.selected_key.data = Some(info);
        }
        KeysAction::RefreshKeyInfo => state.selected_key.refreshing = true,
        KeysAction::RefreshKeyInfoSuccess(mut info) => {
            info.name_string = info.name.to_display_string();
            state.selected_key.data = Some(info);
            state.selected_key.refreshing = false;
        }
        KeysAction::RefreshKeyInfoFail => state.selected_key.refreshing = false,
        KeysAction::UpdateSelectedKeyRefreshTime(time) => {
            state.selected_key.last_refresh_time = Some(time);
        }
        KeysAction::DeleteSelectedKey | KeysAction::DefaultSelectedKeyAction => {
            state.selected_key.loading = true;
            state.selected_key.error.clear();
        }
        KeysAction::DeleteSelectedKeySuccess => {
            state.selected_key.loading = false;
            state.selected_key.data = None;
        }
        KeysAction::DefaultSelectedKeyActionSuccess => state.selected_key.loading = false,
        KeysAction::DeleteSelectedKeyFailure(message)
        | KeysAction::DefaultSelectedKeyActionFailure(message) => {
            state.selected_key.loading = false;
            state.selected_key.error = message;
        }
        KeysAction::DeletePatternKeyFromList(key) => {
            state.data.keys.retain(|item| item.name != key);
            state.data.total -= 1;
            state.data.scanned -= 1;
        }
        KeysAction::EditPatternKeyFromList { key, new_key } => {
            patch_keys(&mut state.data.keys, &key, |item| {
                item.name = new_key.clone();
                item.name_string = Some(new_key.to_display_string());
            });
        }
        KeysAction::EditPatternKeyTtlFromList { key, ttl } => {
            patch_keys(&mut state.data.keys, &key, |item| item.ttl = Some(ttl));
        }
        KeysAction::UpdateKeySizeFromList { key, size } => {
            patch_keys(&mut state.data.keys, &key, |item| item.size = size);
        }
        KeysAction::UpdateSelectedKeyLength(length) => {
            if let Some(data) = state.selected_key.data.as_mut() {
                data.length = Some(length);
            }
        }
        KeysAction::AddKey => state.add_key.start(),
        KeysAction::AddKeySuccess => state.add_key.succeed(),
        KeysAction::AddKeyFailure(message) => state.add_key.fail(message),
        KeysAction::ResetAddKey => state.add_key = RequestStatus::default(),
        KeysAction::SetSearchMatch(pattern) => state.search = pattern,
        KeysAction::SetFilter(filter) => state.filter = filter,
        KeysAction::ChangeKeyViewType(view_type) => state.view_type = view_type,
        KeysAction::ChangeSearchMode(mode) => state.search_mode = mode,
        KeysAction::ResetKeyInfo => {
            state.selected_key = SelectedKey::with_view_format(state.selected_key.view_format);
        }
        KeysAction::ResetKeys => {
            *state = KeysState {
                view_type: state.view_type,
                search_mode: state.search_mode,
                selected_key: SelectedKey::with_view_format(state.selected_key.view_format),
                ..KeysState::default()
            };
        }
        KeysAction::ResetKeysData => state.data.keys.clear(),
        KeysAction::ToggleBrowserFullScreen(value) => {
            state.is_browser_full_screen = value.unwrap_or(!state.is_browser_full_screen);
        }
        KeysAction::SetViewFormat(format) => state.selected_key.view_format = format,
        KeysAction::LoadSearchHistory => state.search_history.loading = true,
        KeysAction::LoadSearchHistorySuccess(items) => {
            state.search_history.loading = false;
            state.search_history.data = Some(items);
        }
        KeysAction::LoadSearchHistoryFailure => state.search_history.loading = false,
        KeysAction::DeleteSearchHistorySuccess(ids) => state.search_history.remove(&ids),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keylens_core::MemoryStorage;

    fn page(keys: &[&str]) -> KeysPage {
        KeysPage {
            total: 10,
            scanned: 10,
            next_cursor: "0".into(),
            keys: keys.iter().map(|key| KeyListItem::new(*key)).collect(),
            last_refresh_time: Some(1),
            ..KeysPage::default()
        }
    }

    fn info(name: &str) -> KeyInfo {
        KeyInfo {
            name: RedisBuffer::from(name),
            key_type: KeyType::Hash,
            ttl: -1,
            size: Some(10),
            length: Some(3),
            name_string: String::new(),
        }
    }

    #[test]
    fn load_start_sets_loading_and_clears_error() {
        let mut state = KeysState {
            error: "previous".into(),
            ..KeysState::default()
        };

        reduce(&mut state, KeysAction::LoadKeys);

        assert!(state.loading);
        assert!(state.error.is_empty());
    }

    #[test]
    fn load_success_replaces_keys_and_counts_them() {
        let mut state = KeysState::default();
        reduce(
            &mut state,
            KeysAction::LoadKeysSuccess {
                data: page(&["a", "b"]),
                is_searched: true,
                is_filtered: false,
            },
        );
        reduce(
            &mut state,
            KeysAction::LoadKeysSuccess {
                data: page(&["c"]),
                is_searched: false,
                is_filtered: true,
            },
        );

        assert_eq!(state.data.keys, vec![KeyListItem::new("c")]);
        assert_eq!(state.data.previous_result_count, 1);
        assert_eq!(state.data.last_refresh_time, Some(1));
        assert!(!state.is_searched);
        assert!(state.is_filtered);
    }

    #[test]
    fn last_batch_replaces_the_tail() {
        let mut state = KeysState {
            data: page(&["a", "b", "c"]),
            ..KeysState::default()
        };

        reduce(
            &mut state,
            KeysAction::SetLastBatchPatternKeys(vec![
                KeyListItem::new("b").with_ttl(5),
                KeyListItem::new("c").with_ttl(7),
            ]),
        );

        assert_eq!(state.data.keys[0], KeyListItem::new("a"));
        assert_eq!(state.data.keys[1].ttl, Some(5));
        assert_eq!(state.data.keys[2].ttl, Some(7));
    }

    #[test]
    fn delete_from_list_matches_bytes() {
        let mut state = KeysState {
            data: page(&["hash field", "other"]),
            ..KeysState::default()
        };

        reduce(
            &mut state,
            KeysAction::DeletePatternKeyFromList(RedisBuffer::new(b"hash field".to_vec())),
        );

        assert_eq!(state.data.keys, vec![KeyListItem::new("other")]);
        assert_eq!(state.data.total, 9);
        assert_eq!(state.data.scanned, 9);
    }

    #[test]
    fn edit_from_list_renames_and_sets_ttl() {
        let mut state = KeysState {
            data: page(&["old"]),
            ..KeysState::default()
        };

        reduce(
            &mut state,
            KeysAction::EditPatternKeyFromList {
                key: "old".into(),
                new_key: "new".into(),
            },
        );
        reduce(
            &mut state,
            KeysAction::EditPatternKeyTtlFromList {
                key: "new".into(),
                ttl: 300,
            },
        );

        assert_eq!(state.data.keys[0].name, RedisBuffer::from("new"));
        assert_eq!(state.data.keys[0].name_string.as_deref(), Some("new"));
        assert_eq!(state.data.keys[0].ttl, Some(300));
    }

    #[test]
    fn selected_key_lifecycle() {
        let mut state = KeysState::default();

        reduce(&mut state, KeysAction::DefaultSelectedKeyAction);
        assert!(state.selected_key.loading);

        reduce(&mut state, KeysAction::LoadKeyInfoSuccess(info("user:1")));
        assert!(!state.selected_key.loading);
        assert_eq!(
            state.selected_key.data.as_ref().map(|data| data.name_string.as_str()),
            Some("user:1")
        );

        reduce(&mut state, KeysAction::RefreshKeyInfo);
        assert!(state.selected_key.refreshing);
        reduce(
            &mut state,
            KeysAction::RefreshKeyInfoSuccess(KeyInfo {
                ttl: 100,
                ..info("user:1")
            }),
        );
        assert!(!state.selected_key.refreshing);
        assert_eq!(state.selected_key.data.as_ref().map(|data| data.ttl), Some(100));

        reduce(&mut state, KeysAction::DeleteSelectedKeySuccess);
        assert!(state.selected_key.data.is_none());
    }

    #[test]
    fn resets_keep_view_preferences() {
        let mut state = KeysState {
            view_type: KeyViewType::Tree,
            search: "user:*".into(),
            data: page(&["a"]),
            ..KeysState::default()
        };
        reduce(&mut state, KeysAction::SetViewFormat(ViewFormat::Hex));
        reduce(&mut state, KeysAction::LoadKeyInfoSuccess(info("a")));

        reduce(&mut state, KeysAction::ResetKeyInfo);
        assert!(state.selected_key.data.is_none());
        assert_eq!(state.selected_key.view_format, ViewFormat::Hex);

        reduce(&mut state, KeysAction::ResetKeys);
        assert_eq!(state.view_type, KeyViewType::Tree);
        assert_eq!(state.selected_key.view_format, ViewFormat::Hex);
        assert!(state.search.is_empty());
        assert!(state.data.keys.is_empty());
    }

    #[test]
    fn full_screen_toggles_or_sets() {
        let mut state = KeysState::default();

        reduce(&mut state, KeysAction::ToggleBrowserFullScreen(None));
        assert!(state.is_browser_full_screen);

        reduce(&mut state, KeysAction::ToggleBrowserFullScreen(Some(true)));
        assert!(state.is_browser_full_screen);

        reduce(&mut state, KeysAction::ToggleBrowserFullScreen(None));
        assert!(!state.is_browser_full_screen);
    }

    #[test]
    fn restored_state_falls_back_on_bad_preferences() {
        let storage = MemoryStorage::new();
        storage
            .set(StorageItem::BrowserViewType, serde_json::json!("Sideways"))
            .unwrap();
        storage
            .set(StorageItem::BrowserSearchMode, serde_json::json!("redisearch"))
            .unwrap();

        let state = KeysState::restored(&storage);
        assert_eq!(state.view_type, KeyViewType::Browser);
        assert_eq!(state.search_mode, SearchMode::Redisearch);
    }
}
