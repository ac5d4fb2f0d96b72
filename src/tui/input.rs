use crossterm::event::{KeyCode, KeyEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleHelp,
    OpenSettings,
    CycleView,
    SpeedUp,
    SpeedDown,
    ToggleTransitions,
    ToggleCollapse,
    NextNode,
    PrevNode,
    ClearAll,
    Cancel,
    Noop,
}

pub fn action_for_key(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('?') => Action::ToggleHelp,
        KeyCode::Char('s') => Action::OpenSettings,
        KeyCode::Char('v') => Action::CycleView,
        KeyCode::Char('+') | KeyCode::Char('=') => Action::SpeedUp,
        KeyCode::Char('-') => Action::SpeedDown,
        KeyCode::Char('t') => Action::ToggleTransitions,
        KeyCode::Char('z') | KeyCode::Enter => Action::ToggleCollapse,
        KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => Action::NextNode,
        KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => Action::PrevNode,
        KeyCode::Char('x') => Action::ClearAll,
        KeyCode::Esc => Action::Cancel,
        _ => Action::Noop,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn quit_and_help() {
        assert_eq!(action_for_key(key(KeyCode::Char('q'))), Action::Quit);
        assert_eq!(action_for_key(key(KeyCode::Char('?'))), Action::ToggleHelp);
    }

    #[test]
    fn unmapped_keys_are_noop() {
        assert_eq!(action_for_key(key(KeyCode::Char('!'))), Action::Noop);
        assert_eq!(action_for_key(key(KeyCode::F(5))), Action::Noop);
    }
}
