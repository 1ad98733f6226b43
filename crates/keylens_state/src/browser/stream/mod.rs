//! Stream entries and the consumer-group drill-down
//! (groups, then consumers, then pending messages).

mod entries;
mod groups;

pub use entries::{
    add_new_entries, delete_stream_entries, fetch_more_stream_entries, fetch_stream_entries,
    refresh_stream, refresh_stream_entries,
};
pub use groups::{
    ack_pending_entries, add_new_group, claim_pending_messages, delete_consumer_groups,
    delete_consumers, fetch_consumer_groups, fetch_consumer_messages, fetch_consumers,
    modify_last_delivered_id,
};

use crate::state::RequestStatus;
use keylens_core::{
    Consumer, ConsumerGroup, PendingMessage, RedisBuffer, SortOrder, StreamEntriesPage,
    StreamEntry,
};

/// Which level of the stream drill-down is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamViewType {
    #[default]
    Data,
    Groups,
    Consumers,
    Messages,
}

/// Entry id range filter. Empty bounds mean the whole stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamData {
    pub total: i64,
    pub key: Option<RedisBuffer>,
    pub key_name: RedisBuffer,
    pub last_generated_id: String,
    pub first_entry: Option<StreamEntry>,
    pub last_entry: Option<StreamEntry>,
    pub entries: Vec<StreamEntry>,
}

impl StreamData {
    fn merge(&mut self, page: StreamEntriesPage) {
        self.key = Some(page.key_name.clone());
        self.key_name = page.key_name;
        self.total = page.total;
        self.last_generated_id = page.last_generated_id;
        self.first_entry = page.first_entry;
        self.last_entry = page.last_entry;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingMessagesState {
    pub loading: bool,
    pub error: String,
    pub data: Vec<PendingMessage>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsumersState {
    pub loading: bool,
    pub error: String,
    pub data: Vec<Consumer>,
    pub selected_consumer: Option<RedisBuffer>,
    pub messages: PendingMessagesState,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsumerGroupsState {
    pub loading: bool,
    pub error: String,
    pub data: Vec<ConsumerGroup>,
    pub selected_group: Option<RedisBuffer>,
    pub last_refresh_time: Option<i64>,
    pub consumers: ConsumersState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamState {
    pub loading: bool,
    pub error: String,
    pub sort_order: SortOrder,
    pub range: StreamRange,
    pub view_type: StreamViewType,
    pub data: StreamData,
    pub groups: ConsumerGroupsState,
    /// Tracks group, consumer and message mutations.
    pub mutation: RequestStatus,
}

impl Default for StreamState {
    fn default() -> Self {
        Self {
            loading: false,
            error: String::new(),
            sort_order: SortOrder::Desc,
            range: StreamRange::default(),
            view_type: StreamViewType::Data,
            data: StreamData::default(),
            groups: ConsumerGroupsState::default(),
            mutation: RequestStatus::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamAction {
    SetStreamInitialState,
    LoadEntries { reset: bool },
    LoadEntriesSuccess { data: StreamEntriesPage, sort_order: SortOrder },
    LoadEntriesFailure(String),
    LoadMoreEntries,
    LoadMoreEntriesSuccess(StreamEntriesPage),
    LoadMoreEntriesFailure(String),
    AddNewEntries,
    AddNewEntriesSuccess,
    AddNewEntriesFailure(String),
    RemoveStreamEntries,
    RemoveStreamEntriesSuccess,
    RemoveStreamEntriesFailure(String),
    RemoveEntriesFromList(Vec<String>),
    UpdateStart(String),
    UpdateEnd(String),
    CleanRangeFilter,
    SetStreamViewType(StreamViewType),

    LoadConsumerGroups { reset: bool },
    LoadConsumerGroupsSuccess(Vec<ConsumerGroup>),
    LoadConsumerGroupsFailure(String),
    SetSelectedGroup(Option<RedisBuffer>),
    LoadConsumers { reset: bool },
    LoadConsumersSuccess(Vec<Consumer>),
    LoadConsumersFailure(String),
    SetSelectedConsumer(Option<RedisBuffer>),
    LoadConsumerMessages { reset: bool },
    LoadConsumerMessagesSuccess(Vec<PendingMessage>),
    LoadConsumerMessagesFailure(String),
    UpdateGroupsRefreshTime(i64),

    AddNewGroup,
    AddNewGroupSuccess,
    AddNewGroupFailure(String),
    ModifyLastDeliveredId,
    ModifyLastDeliveredIdSuccess,
    ModifyLastDeliveredIdFailure(String),
    DeleteConsumerGroups,
    DeleteConsumerGroupsSuccess,
    DeleteConsumerGroupsFailure(String),
    DeleteConsumers,
    DeleteConsumersSuccess,
    DeleteConsumersFailure(String),
    ClaimConsumerMessages,
    ClaimConsumerMessagesSuccess,
    ClaimConsumerMessagesFailure(String),
    AckPendingEntries,
    AckPendingEntriesSuccess,
    AckPendingEntriesFailure(String),
}

pub fn reduce(state: &mut StreamState, action: StreamAction) {
    match action {
        StreamAction::SetStreamInitialState => *state = StreamState::default(),
        StreamAction::LoadEntries { reset } => {
            state.loading = true;
            state.error.clear();
            if reset {
                state.data = StreamData::default();
            }
        }
        StreamAction::LoadEntriesSuccess { data, sort_order } => {
            state.loading = false;
            state.sort_order = sort_order;
            let entries = data.entries.clone();
            state.data.merge(data);
            state.data.entries = entries;
        }
        StreamAction::LoadMoreEntriesSuccess(mut data) => {
            state.loading = false;
            let mut entries = std::mem::take(&mut data.entries);
            state.data.merge(data);
            state.data.entries.append(&mut entries);
        }
        StreamAction::LoadMoreEntries
        | StreamAction::AddNewEntries
        | StreamAction::RemoveStreamEntries => {
            state.loading = true;
            state.error.clear();
        }
        StreamAction::AddNewEntriesSuccess | StreamAction::RemoveStreamEntriesSuccess => {
            state.loading = false;
        }
        StreamAction::LoadEntriesFailure(message)
        | StreamAction::LoadMoreEntriesFailure(message)
        | StreamAction::AddNewEntriesFailure(message)
        | StreamAction::RemoveStreamEntriesFailure(message) => {
            state.loading = false;
            state.error = message;
        }
        StreamAction::RemoveEntriesFromList(ids) => {
            state.data.entries.retain(|entry| !ids.contains(&entry.id));
            state.data.total -= ids.len() as i64;
        }
        StreamAction::UpdateStart(start) => state.range.start = start,
        StreamAction::UpdateEnd(end) => state.range.end = end,
        StreamAction::CleanRangeFilter => state.range = StreamRange::default(),
        StreamAction::SetStreamViewType(view_type) => state.view_type = view_type,

        StreamAction::LoadConsumerGroups { reset } => {
            state.groups.loading = true;
            state.groups.error.clear();
            if reset {
                state.groups.data.clear();
            }
        }
        StreamAction::LoadConsumerGroupsSuccess(groups) => {
            state.groups.loading = false;
            state.groups.data = groups;
        }
        StreamAction::LoadConsumerGroupsFailure(message) => {
            state.groups.loading = false;
            state.groups.error = message;
        }
        StreamAction::SetSelectedGroup(group) => {
            if state.groups.selected_group != group {
                state.groups.consumers = ConsumersState::default();
            }
            state.groups.selected_group = group;
        }
        StreamAction::LoadConsumers { reset } => {
            state.groups.consumers.loading = true;
            state.groups.consumers.error.clear();
            if reset {
                state.groups.consumers.data.clear();
            }
        }
        StreamAction::LoadConsumersSuccess(consumers) => {
            state.groups.consumers.loading = false;
            state.groups.consumers.data = consumers;
        }
        StreamAction::LoadConsumersFailure(message) => {
            state.groups.consumers.loading = false;
            state.groups.consumers.error = message;
        }
        StreamAction::SetSelectedConsumer(consumer) => {
            let consumers = &mut state.groups.consumers;
            if consumers.selected_consumer != consumer {
                consumers.messages = PendingMessagesState::default();
            }
            consumers.selected_consumer = consumer;
        }
        StreamAction::LoadConsumerMessages { reset } => {
            let messages = &mut state.groups.consumers.messages;
            messages.loading = true;
            messages.error.clear();
            if reset {
                messages.data.clear();
            }
        }
        StreamAction::LoadConsumerMessagesSuccess(data) => {
            let messages = &mut state.groups.consumers.messages;
            messages.loading = false;
            messages.data = data;
        }
        StreamAction::LoadConsumerMessagesFailure(message) => {
            let messages = &mut state.groups.consumers.messages;
            messages.loading = false;
            messages.error = message;
        }
        StreamAction::UpdateGroupsRefreshTime(time) => state.groups.last_refresh_time = Some(time),

        StreamAction::AddNewGroup
        | StreamAction::ModifyLastDeliveredId
        | StreamAction::DeleteConsumerGroups
        | StreamAction::DeleteConsumers
        | StreamAction::ClaimConsumerMessages
        | StreamAction::AckPendingEntries => state.mutation.start(),
        StreamAction::AddNewGroupSuccess
        | StreamAction::ModifyLastDeliveredIdSuccess
        | StreamAction::DeleteConsumerGroupsSuccess
        | StreamAction::DeleteConsumersSuccess
        | StreamAction::ClaimConsumerMessagesSuccess
        | StreamAction::AckPendingEntriesSuccess => state.mutation.succeed(),
        StreamAction::AddNewGroupFailure(message)
        | StreamAction::ModifyLastDeliveredIdFailure(message)
        | StreamAction::DeleteConsumerGroupsFailure(message)
        | StreamAction::DeleteConsumersFailure(message)
        | StreamAction::ClaimConsumerMessagesFailure(message)
        | StreamAction::AckPendingEntriesFailure(message) => state.mutation.fail(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keylens_core::StreamEntryField;

    fn entry(id: &str) -> StreamEntry {
        StreamEntry {
            id: id.to_string(),
            fields: vec![StreamEntryField {
                name: "1".into(),
                value: "2".into(),
            }],
        }
    }

    fn page(ids: &[&str]) -> StreamEntriesPage {
        let entries: Vec<_> = ids.iter().map(|id| entry(id)).collect();
        StreamEntriesPage {
            key_name: "stream_example".into(),
            total: ids.len() as i64,
            last_generated_id: ids.last().map(|id| id.to_string()).unwrap_or_default(),
            first_entry: entries.first().cloned(),
            last_entry: entries.last().cloned(),
            entries,
        }
    }

    #[test]
    fn initial_state_sorts_descending_on_data_view() {
        let state = StreamState::default();
        assert_eq!(state.sort_order, SortOrder::Desc);
        assert_eq!(state.view_type, StreamViewType::Data);
        assert_eq!(state.range, StreamRange::default());
    }

    #[test]
    fn load_success_replaces_and_load_more_appends() {
        let mut state = StreamState::default();
        reduce(&mut state, StreamAction::LoadEntries { reset: true });
        assert!(state.loading);

        reduce(
            &mut state,
            StreamAction::LoadEntriesSuccess {
                data: page(&["1652942518810-0"]),
                sort_order: SortOrder::Asc,
            },
        );
        assert_eq!(state.sort_order, SortOrder::Asc);
        assert_eq!(state.data.key, Some("stream_example".into()));
        assert_eq!(state.data.last_generated_id, "1652942518810-0");

        reduce(
            &mut state,
            StreamAction::LoadMoreEntriesSuccess(page(&["1652942518810-0", "1652942518811-0"])),
        );
        let ids: Vec<_> = state.data.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1652942518810-0", "1652942518810-0", "1652942518811-0"]);
        assert_eq!(state.data.total, 2);
    }

    #[test]
    fn remove_entries_decrements_per_id() {
        let mut state = StreamState::default();
        reduce(
            &mut state,
            StreamAction::LoadEntriesSuccess {
                data: page(&["1-0", "2-0", "3-0"]),
                sort_order: SortOrder::Desc,
            },
        );

        reduce(
            &mut state,
            StreamAction::RemoveEntriesFromList(vec!["1-0".into(), "3-0".into()]),
        );

        assert_eq!(state.data.entries, vec![entry("2-0")]);
        assert_eq!(state.data.total, 1);
    }

    #[test]
    fn range_filter_updates_and_cleans() {
        let mut state = StreamState::default();
        reduce(&mut state, StreamAction::UpdateStart("100".into()));
        reduce(&mut state, StreamAction::UpdateEnd("200".into()));
        assert_eq!(
            state.range,
            StreamRange {
                start: "100".into(),
                end: "200".into()
            }
        );

        reduce(&mut state, StreamAction::CleanRangeFilter);
        assert_eq!(state.range, StreamRange::default());
    }

    #[test]
    fn selecting_another_group_drops_nested_consumers() {
        let mut state = StreamState::default();
        reduce(&mut state, StreamAction::SetSelectedGroup(Some("g1".into())));
        reduce(
            &mut state,
            StreamAction::LoadConsumersSuccess(vec![Consumer {
                name: "alice".into(),
                pending: 1,
                idle: 10,
            }]),
        );
        reduce(&mut state, StreamAction::SetSelectedConsumer(Some("alice".into())));

        reduce(&mut state, StreamAction::SetSelectedGroup(Some("g1".into())));
        assert_eq!(state.groups.consumers.data.len(), 1);

        reduce(&mut state, StreamAction::SetSelectedGroup(Some("g2".into())));
        assert!(state.groups.consumers.data.is_empty());
        assert_eq!(state.groups.consumers.selected_consumer, None);
    }
}
