use keylens_core::RedisBuffer;

/// Selection and expanded folders of the tree view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeState {
    pub selected_leaf: Option<RedisBuffer>,
    pub open_nodes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TreeAction {
    SetBrowserSelectedKey(Option<RedisBuffer>),
    SetBrowserTreeNodesOpen(Vec<String>),
    ResetBrowserTree,
}

pub fn reduce(state: &mut TreeState, action: TreeAction) {
    match action {
        TreeAction::SetBrowserSelectedKey(key) => state.selected_leaf = key,
        TreeAction::SetBrowserTreeNodesOpen(nodes) => state.open_nodes = nodes,
        TreeAction::ResetBrowserTree => *state = TreeState::default(),
    }
}
