use super::KeysAction;
use super::thunks::{fetch_more_pattern_keys, fetch_pattern_keys};
use crate::action::Action;
use crate::browser::redisearch::{
    RedisearchAction, fetch_more_redisearch_keys, fetch_redisearch_keys,
};
use crate::store::Store;
use async_trait::async_trait;
use keylens_core::{ApiError, KeyListItem, KeysPage, RedisBuffer, SearchMode};

/// One way of producing the browser key list.
///
/// The pattern scan and the search-index query keep their pages in different
/// slices; everything that mutates "the list" goes through this trait so call
/// sites never branch on the search mode themselves.
#[async_trait]
pub trait KeyListing: Send + Sync {
    fn mode(&self) -> SearchMode;

    async fn fetch_keys(&self, store: &Store, cursor: &str, count: u32) -> Result<KeysPage, ApiError>;

    async fn fetch_more_keys(
        &self,
        store: &Store,
        old_keys: Vec<KeyListItem>,
        cursor: &str,
        count: u32,
    ) -> Result<KeysPage, ApiError>;

    fn delete_key_from_list(&self, key: RedisBuffer) -> Action;

    fn edit_key_from_list(&self, key: RedisBuffer, new_key: RedisBuffer) -> Action;

    fn edit_key_ttl_from_list(&self, key: RedisBuffer, ttl: i64) -> Action;

    fn set_last_batch_keys(&self, keys: Vec<KeyListItem>) -> Action;
}

pub struct PatternListing;

#[async_trait]
impl KeyListing for PatternListing {
    fn mode(&self) -> SearchMode {
        SearchMode::Pattern
    }

    async fn fetch_keys(&self, store: &Store, cursor: &str, count: u32) -> Result<KeysPage, ApiError> {
        fetch_pattern_keys(store, cursor, count).await
    }

    async fn fetch_more_keys(
        &self,
        store: &Store,
        old_keys: Vec<KeyListItem>,
        cursor: &str,
        count: u32,
    ) -> Result<KeysPage, ApiError> {
        fetch_more_pattern_keys(store, old_keys, cursor, count).await
    }

    fn delete_key_from_list(&self, key: RedisBuffer) -> Action {
        KeysAction::DeletePatternKeyFromList(key).into()
    }

    fn edit_key_from_list(&self, key: RedisBuffer, new_key: RedisBuffer) -> Action {
        KeysAction::EditPatternKeyFromList { key, new_key }.into()
    }

    fn edit_key_ttl_from_list(&self, key: RedisBuffer, ttl: i64) -> Action {
        KeysAction::EditPatternKeyTtlFromList { key, ttl }.into()
    }

    fn set_last_batch_keys(&self, keys: Vec<KeyListItem>) -> Action {
        KeysAction::SetLastBatchPatternKeys(keys).into()
    }
}

pub struct SearchIndexListing;

#[async_trait]
impl KeyListing for SearchIndexListing {
    fn mode(&self) -> SearchMode {
        SearchMode::Redisearch
    }

    async fn fetch_keys(&self, store: &Store, cursor: &str, count: u32) -> Result<KeysPage, ApiError> {
        fetch_redisearch_keys(store, cursor, count).await
    }

    async fn fetch_more_keys(
        &self,
        store: &Store,
        old_keys: Vec<KeyListItem>,
        cursor: &str,
        count: u32,
    ) -> Result<KeysPage, ApiError> {
        fetch_more_redisearch_keys(store, old_keys, cursor, count).await
    }

    fn delete_key_from_list(&self, key: RedisBuffer) -> Action {
        RedisearchAction::DeleteRedisearchKeyFromList(key).into()
    }

    fn edit_key_from_list(&self, key: RedisBuffer, new_key: RedisBuffer) -> Action {
        RedisearchAction::EditRedisearchKeyFromList { key, new_key }.into()
    }

    fn edit_key_ttl_from_list(&self, key: RedisBuffer, ttl: i64) -> Action {
        RedisearchAction::EditRedisearchKeyTtlFromList { key, ttl }.into()
    }

    fn set_last_batch_keys(&self, keys: Vec<KeyListItem>) -> Action {
        RedisearchAction::SetLastBatchRedisearchKeys(keys).into()
    }
}

static PATTERN: PatternListing = PatternListing;
static SEARCH_INDEX: SearchIndexListing = SearchIndexListing;

pub fn listing(mode: SearchMode) -> &'static dyn KeyListing {
    match mode {
        SearchMode::Pattern => &PATTERN,
        SearchMode::Redisearch => &SEARCH_INDEX,
    }
}

/// Listing for the search mode currently selected in the browser.
pub fn active_listing(store: &Store) -> &'static dyn KeyListing {
    listing(store.select(|state| state.browser.keys.search_mode))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_mutations_target_the_mode_slice() {
        let key = RedisBuffer::from("user:1");

        assert_eq!(
            listing(SearchMode::Pattern).delete_key_from_list(key.clone()),
            Action::Keys(KeysAction::DeletePatternKeyFromList(key.clone()))
        );
        assert_eq!(
            listing(SearchMode::Redisearch).edit_key_ttl_from_list(key.clone(), 30),
            Action::Redisearch(RedisearchAction::EditRedisearchKeyTtlFromList { key, ttl: 30 })
        );
        assert_eq!(listing(SearchMode::Redisearch).mode(), SearchMode::Redisearch);
    }
}
