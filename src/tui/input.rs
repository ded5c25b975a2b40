use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::session::EditOp;

use super::editor::PromptKind;

/// Gain applied by the quick reduce/amplify keys
pub const REDUCE_FACTOR: f32 = 0.5;
pub const AMPLIFY_FACTOR: f32 = 1.5;

/// Everything a key can ask the editor to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    TogglePlay,
    Stop,
    SeekBack,
    SeekForward,
    VolumeUp,
    VolumeDown,
    Edit(EditOp),
    ClearSelection,
    Reset,
    /// Start typing a time
    Prompt(PromptKind),
    /// Export in the configured format
    Export,
    ExportWav,
    Quit,
}

/// Key binding table
pub fn action_for(key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            _ => None,
        };
    }

    let action = match key.code {
        KeyCode::Char(' ') => Action::TogglePlay,
        KeyCode::Char('s') => Action::Stop,
        KeyCode::Left => Action::SeekBack,
        KeyCode::Right => Action::SeekForward,
        KeyCode::Char('+') | KeyCode::Char('=') => Action::VolumeUp,
        KeyCode::Char('-') => Action::VolumeDown,
        KeyCode::Char('t') => Action::Edit(EditOp::Trim),
        KeyCode::Char('x') | KeyCode::Delete => Action::Edit(EditOp::Delete),
        KeyCode::Char('i') => Action::Edit(EditOp::FadeIn),
        KeyCode::Char('o') => Action::Edit(EditOp::FadeOut),
        KeyCode::Char('[') => Action::Edit(EditOp::Gain(REDUCE_FACTOR)),
        KeyCode::Char(']') => Action::Edit(EditOp::Gain(AMPLIFY_FACTOR)),
        KeyCode::Char('G') => Action::Prompt(PromptKind::Gain),
        KeyCode::Char('n') => Action::Edit(EditOp::Normalize),
        KeyCode::Char('r') => Action::Edit(EditOp::Reverse),
        KeyCode::Char('c') => Action::ClearSelection,
        KeyCode::Char('R') => Action::Reset,
        KeyCode::Char('g') => Action::Prompt(PromptKind::GoTo),
        KeyCode::Char('a') => Action::Prompt(PromptKind::SelectionStart),
        KeyCode::Char('b') => Action::Prompt(PromptKind::SelectionEnd),
        KeyCode::Char('e') => Action::Export,
        KeyCode::Char('w') => Action::ExportWav,
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_transport_keys() {
        assert_eq!(action_for(key(KeyCode::Char(' '))), Some(Action::TogglePlay));
        assert_eq!(action_for(key(KeyCode::Left)), Some(Action::SeekBack));
        assert_eq!(action_for(key(KeyCode::Char('='))), Some(Action::VolumeUp));
    }

    #[test]
    fn test_edit_keys() {
        assert_eq!(action_for(key(KeyCode::Char('t'))), Some(Action::Edit(EditOp::Trim)));
        assert_eq!(
            action_for(key(KeyCode::Char(']'))),
            Some(Action::Edit(EditOp::Gain(AMPLIFY_FACTOR)))
        );
        // Shift-R arrives as an uppercase char
        let reset = KeyEvent::new(KeyCode::Char('R'), KeyModifiers::SHIFT);
        assert_eq!(action_for(reset), Some(Action::Reset));
        assert_eq!(action_for(key(KeyCode::Char('r'))), Some(Action::Edit(EditOp::Reverse)));
        assert_eq!(action_for(key(KeyCode::Char('g'))), Some(Action::Prompt(PromptKind::GoTo)));
        assert_eq!(action_for(key(KeyCode::Char('G'))), Some(Action::Prompt(PromptKind::Gain)));
    }

    #[test]
    fn test_ctrl_c_quits_but_c_clears() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(action_for(ctrl_c), Some(Action::Quit));
        assert_eq!(action_for(key(KeyCode::Char('c'))), Some(Action::ClearSelection));
        assert_eq!(action_for(key(KeyCode::Char('z'))), None);
    }
}
