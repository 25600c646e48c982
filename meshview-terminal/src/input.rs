/// Keyboard handling: crossterm key events become viewer commands
/// (edge-triggered) and a held-key snapshot (level-triggered)
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use meshview_core::{AxisKey, HeldKeys, TransformKind, ViewerCommand};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// What a key does in the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Command(ViewerCommand),
    Axis(AxisKey),
}

/// Map a key to its viewer action, if it has one.
pub fn map_key(code: KeyCode, modifiers: KeyModifiers) -> Option<KeyAction> {
    use KeyAction::{Axis, Command};

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(Command(ViewerCommand::Quit)),
            _ => None,
        };
    }

    let action = match code {
        KeyCode::Esc => Command(ViewerCommand::Quit),
        KeyCode::Tab => Command(ViewerCommand::NextObject),
        KeyCode::Up => Axis(AxisKey::Up),
        KeyCode::Down => Axis(AxisKey::Down),
        KeyCode::Left => Axis(AxisKey::Left),
        KeyCode::Right => Axis(AxisKey::Right),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'h' => Command(ViewerCommand::Help),
            '1' => Command(ViewerCommand::SetMode(TransformKind::Rotate)),
            '2' => Command(ViewerCommand::SetMode(TransformKind::Translate)),
            '3' => Command(ViewerCommand::SetMode(TransformKind::Scale)),
            '4' => Command(ViewerCommand::ToggleWireframe),
            'w' => Axis(AxisKey::W),
            's' => Axis(AxisKey::S),
            'a' => Axis(AxisKey::A),
            'd' => Axis(AxisKey::D),
            'q' => Axis(AxisKey::Q),
            'e' => Axis(AxisKey::E),
            _ => return None,
        },
        _ => return None,
    };
    Some(action)
}

/// How key releases are detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldDetection {
    /// The terminal reports press, repeat and release events.
    ReleaseEvents,
    /// Only presses arrive (autorepeat included); a key stays held for
    /// this long after its last press.
    Window(Duration),
}

/// Collects key events between frames.
#[derive(Debug)]
pub struct InputTracker {
    detection: HoldDetection,
    commands: Vec<ViewerCommand>,
    held: HeldKeys,
    last_pressed: HashMap<AxisKey, Instant>,
    last_command: HashMap<ViewerCommand, Instant>,
}

impl InputTracker {
    pub fn new(detection: HoldDetection) -> Self {
        Self {
            detection,
            commands: Vec::new(),
            held: HeldKeys::new(),
            last_pressed: HashMap::new(),
            last_command: HashMap::new(),
        }
    }

    pub fn detection(&self) -> HoldDetection {
        self.detection
    }

    pub fn handle_key(&mut self, event: KeyEvent, now: Instant) {
        // A release ends a hold whatever modifiers are down by then.
        let modifiers = match event.kind {
            KeyEventKind::Release => KeyModifiers::NONE,
            _ => event.modifiers,
        };
        let Some(action) = map_key(event.code, modifiers) else {
            return;
        };

        match (action, event.kind) {
            // Commands fire on the press edge only.
            (KeyAction::Command(command), KeyEventKind::Press) => {
                if !self.is_autorepeat(command, now) {
                    self.commands.push(command);
                }
            }
            (KeyAction::Command(_), _) => {}
            (KeyAction::Axis(key), KeyEventKind::Release) => {
                self.held.release(key);
                self.last_pressed.remove(&key);
            }
            (KeyAction::Axis(key), _) => match self.detection {
                HoldDetection::ReleaseEvents => self.held.press(key),
                HoldDetection::Window(_) => {
                    self.last_pressed.insert(key, now);
                }
            },
        }
    }

    /// Without release events, autorepeat arrives as fresh presses. A
    /// press of the same command within the hold window of the previous
    /// one continues that hold.
    fn is_autorepeat(&mut self, command: ViewerCommand, now: Instant) -> bool {
        let HoldDetection::Window(window) = self.detection else {
            return false;
        };
        self.last_command
            .insert(command, now)
            .is_some_and(|previous| now.saturating_duration_since(previous) <= window)
    }

    /// Forget every held key, e.g. when the terminal loses focus.
    pub fn release_all(&mut self) {
        self.held.clear();
        self.last_pressed.clear();
        self.last_command.clear();
    }

    /// Commands received since the last call, in arrival order.
    pub fn take_commands(&mut self) -> Vec<ViewerCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Keys held at `now`.
    pub fn held(&mut self, now: Instant) -> HeldKeys {
        match self.detection {
            HoldDetection::ReleaseEvents => self.held.clone(),
            HoldDetection::Window(window) => {
                self.last_pressed
                    .retain(|_, pressed| now.saturating_duration_since(*pressed) <= window);
                self.last_pressed.keys().copied().collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_default_bindings() {
        assert_eq!(
            map_key(KeyCode::Tab, KeyModifiers::NONE),
            Some(KeyAction::Command(ViewerCommand::NextObject))
        );
        assert_eq!(
            map_key(KeyCode::Char('1'), KeyModifiers::NONE),
            Some(KeyAction::Command(ViewerCommand::SetMode(TransformKind::Rotate)))
        );
        assert_eq!(
            map_key(KeyCode::Char('W'), KeyModifiers::SHIFT),
            Some(KeyAction::Axis(AxisKey::W))
        );
        assert_eq!(
            map_key(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Some(KeyAction::Command(ViewerCommand::Quit))
        );
        assert_eq!(map_key(KeyCode::Char('z'), KeyModifiers::NONE), None);
    }

    #[test]
    fn test_commands_fire_on_press_edge_only() {
        let mut input = InputTracker::new(HoldDetection::ReleaseEvents);
        let now = Instant::now();
        input.handle_key(key(KeyCode::Char('4'), KeyEventKind::Press), now);
        input.handle_key(key(KeyCode::Char('4'), KeyEventKind::Repeat), now);
        input.handle_key(key(KeyCode::Char('4'), KeyEventKind::Release), now);

        assert_eq!(input.take_commands(), vec![ViewerCommand::ToggleWireframe]);
        assert!(input.take_commands().is_empty());
    }

    #[test]
    fn test_release_events_end_a_hold() {
        let mut input = InputTracker::new(HoldDetection::ReleaseEvents);
        let now = Instant::now();
        input.handle_key(key(KeyCode::Char('a'), KeyEventKind::Press), now);
        assert!(input.held(now + Duration::from_secs(5)).is_held(AxisKey::A));

        input.handle_key(key(KeyCode::Char('a'), KeyEventKind::Release), now);
        assert!(input.held(now).is_empty());
    }

    #[test]
    fn test_release_with_modifier_still_ends_a_hold() {
        let mut input = InputTracker::new(HoldDetection::ReleaseEvents);
        let now = Instant::now();
        input.handle_key(key(KeyCode::Char('a'), KeyEventKind::Press), now);

        let mut release = key(KeyCode::Char('a'), KeyEventKind::Release);
        release.modifiers = KeyModifiers::CONTROL;
        input.handle_key(release, now);

        assert!(!input.held(now + Duration::from_secs(10)).is_held(AxisKey::A));
    }

    #[test]
    fn test_autorepeat_does_not_repeat_commands() {
        let window = Duration::from_millis(200);
        let mut input = InputTracker::new(HoldDetection::Window(window));
        let now = Instant::now();

        // Held Tab: a press followed by autorepeat presses 30 ms apart.
        for step in 0..10 {
            let at = now + Duration::from_millis(30 * step);
            input.handle_key(key(KeyCode::Tab, KeyEventKind::Press), at);
        }
        assert_eq!(input.take_commands(), vec![ViewerCommand::NextObject]);

        // A fresh press once the window has passed.
        let later = now + Duration::from_millis(30 * 9) + window * 2;
        input.handle_key(key(KeyCode::Tab, KeyEventKind::Press), later);
        assert_eq!(input.take_commands(), vec![ViewerCommand::NextObject]);
    }

    #[test]
    fn test_hold_window_expires() {
        let window = Duration::from_millis(200);
        let mut input = InputTracker::new(HoldDetection::Window(window));
        let now = Instant::now();
        input.handle_key(key(KeyCode::Left, KeyEventKind::Press), now);

        assert!(input.held(now + Duration::from_millis(100)).is_held(AxisKey::Left));
        assert!(input.held(now + Duration::from_millis(300)).is_empty());
    }

    #[test]
    fn test_release_all_clears_holds() {
        let mut input = InputTracker::new(HoldDetection::ReleaseEvents);
        let now = Instant::now();
        input.handle_key(key(KeyCode::Char('q'), KeyEventKind::Press), now);
        input.release_all();
        assert!(input.held(now).is_empty());
    }
}
