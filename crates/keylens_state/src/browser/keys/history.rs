use super::KeysAction;
use crate::action::Action;
use crate::browser::redisearch::RedisearchAction;
use crate::store::Store;
use keylens_core::{
    ApiError, DeleteHistoryRequest, Method, SearchHistoryItem, SearchMode, endpoints,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHistoryState {
    pub loading: bool,
    pub data: Option<Vec<SearchHistoryItem>>,
}

impl SearchHistoryState {
    pub(crate) fn remove(&mut self, ids: &[String]) {
        if let Some(items) = self.data.as_mut() {
            items.retain(|item| !ids.contains(&item.id));
        }
    }
}

enum HistoryEvent {
    Load,
    Loaded(Vec<SearchHistoryItem>),
    Failed,
    Deleted(Vec<String>),
}

/// Both listing modes keep an identical history, each in its own slice.
fn history_action(mode: SearchMode, event: HistoryEvent) -> Action {
    match mode {
        SearchMode::Pattern => match event {
            HistoryEvent::Load => KeysAction::LoadSearchHistory,
            HistoryEvent::Loaded(items) => KeysAction::LoadSearchHistorySuccess(items),
            HistoryEvent::Failed => KeysAction::LoadSearchHistoryFailure,
            HistoryEvent::Deleted(ids) => KeysAction::DeleteSearchHistorySuccess(ids),
        }
        .into(),
        SearchMode::Redisearch => match event {
            HistoryEvent::Load => RedisearchAction::LoadSearchHistory,
            HistoryEvent::Loaded(items) => RedisearchAction::LoadSearchHistorySuccess(items),
            HistoryEvent::Failed => RedisearchAction::LoadSearchHistoryFailure,
            HistoryEvent::Deleted(ids) => RedisearchAction::DeleteSearchHistorySuccess(ids),
        }
        .into(),
    }
}

async fn fetch_history(store: &Store, mode: SearchMode) -> Result<Vec<SearchHistoryItem>, ApiError> {
    store.dispatch(history_action(mode, HistoryEvent::Load));

    let request = store
        .db_request(Method::Get, endpoints::HISTORY)
        .with_query("mode", mode.as_str());

    match store.fetch::<Vec<SearchHistoryItem>>(request).await {
        Ok(items) => {
            store.dispatch(history_action(mode, HistoryEvent::Loaded(items.clone())));
            Ok(items)
        }
        Err(e) => {
            store.dispatch(history_action(mode, HistoryEvent::Failed));
            Err(e)
        }
    }
}

async fn delete_history(store: &Store, mode: SearchMode, ids: Vec<String>) -> Result<(), ApiError> {
    let request = store
        .db_request(Method::Delete, endpoints::HISTORY)
        .with_query("mode", mode.as_str())
        .json(&DeleteHistoryRequest { ids: ids.clone() });

    store.send(request).await?;
    store.dispatch(history_action(mode, HistoryEvent::Deleted(ids)));
    Ok(())
}

pub async fn fetch_pattern_history(store: &Store) -> Result<Vec<SearchHistoryItem>, ApiError> {
    fetch_history(store, SearchMode::Pattern).await
}

pub async fn delete_pattern_history(store: &Store, ids: Vec<String>) -> Result<(), ApiError> {
    delete_history(store, SearchMode::Pattern, ids).await
}

pub async fn fetch_search_history(store: &Store) -> Result<Vec<SearchHistoryItem>, ApiError> {
    fetch_history(store, SearchMode::Redisearch).await
}

pub async fn delete_search_history(store: &Store, ids: Vec<String>) -> Result<(), ApiError> {
    delete_history(store, SearchMode::Redisearch, ids).await
}
