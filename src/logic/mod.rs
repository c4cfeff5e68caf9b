//! Tournament business logic: setup, scoring, advancement, navigation, history.

mod advancement;
mod history;
mod navigation;
mod scoring;
mod setup;

pub use advancement::{advance_phase, ranked, standings, Standing};
pub use history::{
    archive, clear_history, dedup_history, history_id, load_from_history, load_history,
    load_state, reset_tournament,
};
pub use navigation::{can_view_next, can_view_previous, view_next_round, view_previous_round};
pub use scoring::{autocomplete_round, next_unscored, round_complete, set_current_player, submit_score};
pub use setup::{parse_roster, start_tournament};
