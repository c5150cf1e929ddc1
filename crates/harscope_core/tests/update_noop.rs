use harscope_core::{update, AppState, Msg};

#[test]
fn noop_and_tick_leave_state_untouched() {
    let state = AppState::new();
    let (state, effects) = update(state, Msg::NoOp);
    assert!(effects.is_empty());
    let (mut state, effects) = update(state, Msg::Tick);
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
}
