//! Per-root vote state.

/// Votes published by one root.
///
/// `vote_matrix` is row-major `[target frame - offset][validator index]`,
/// each cell the voter's weight signed by its yes/no opinion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RootVoteContext {
    /// `frame_to_deliver` when the root was registered.
    pub frame_to_deliver_offset: u32,
    pub vote_matrix: Vec<i32>,
}

impl RootVoteContext {
    pub fn new(frame_to_deliver_offset: u32) -> Self {
        Self {
            frame_to_deliver_offset,
            vote_matrix: Vec::new(),
        }
    }
}
