/// Input vocabulary for the transform controller
///
/// Input arrives on two channels: [`ViewerCommand`]s fire once per key
/// press, while [`HeldKeys`] is a snapshot of the axis keys held down
/// during the current frame.
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Which transform the axis keys edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransformKind {
    Rotate,
    #[default]
    Translate,
    Scale,
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransformKind::Rotate => "Rotation",
            TransformKind::Translate => "Translation",
            TransformKind::Scale => "Scale",
        })
    }
}

/// Edge-triggered actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerCommand {
    Quit,
    Help,
    NextObject,
    SetMode(TransformKind),
    ToggleWireframe,
}

/// Level-triggered keys that edit the selected object's transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisKey {
    W,
    S,
    A,
    D,
    Q,
    E,
    Up,
    Down,
    Left,
    Right,
}

/// Axis keys held during one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeldKeys {
    keys: HashSet<AxisKey>,
}

impl HeldKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: AxisKey) {
        self.keys.insert(key);
    }

    pub fn release(&mut self, key: AxisKey) {
        self.keys.remove(&key);
    }

    pub fn is_held(&self, key: AxisKey) -> bool {
        self.keys.contains(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

impl FromIterator<AxisKey> for HeldKeys {
    fn from_iter<I: IntoIterator<Item = AxisKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

/// Rates applied per second of held input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSpeeds {
    /// Degrees per second
    pub rotation: f32,
    /// Units per second
    pub translation: f32,
    /// Scale factor per second
    pub scale: f32,
}

impl Default for TransformSpeeds {
    fn default() -> Self {
        Self {
            rotation: 50.0,
            translation: 2.0,
            scale: 1.0,
        }
    }
}

impl TransformSpeeds {
    pub fn for_kind(&self, kind: TransformKind) -> f32 {
        match kind {
            TransformKind::Rotate => self.rotation,
            TransformKind::Translate => self.translation,
            TransformKind::Scale => self.scale,
        }
    }
}

/// A group of keys that moves one axis in one direction. Any key of the
/// group being held applies the step once.
struct AxisBinding {
    keys: &'static [AxisKey],
    direction: [f32; 3],
}

const fn bind(keys: &'static [AxisKey], direction: [f32; 3]) -> AxisBinding {
    AxisBinding { keys, direction }
}

static ROTATE_BINDINGS: [AxisBinding; 6] = [
    bind(&[AxisKey::W], [1.0, 0.0, 0.0]),
    bind(&[AxisKey::S], [-1.0, 0.0, 0.0]),
    bind(&[AxisKey::A], [0.0, 1.0, 0.0]),
    bind(&[AxisKey::D], [0.0, -1.0, 0.0]),
    bind(&[AxisKey::Q], [0.0, 0.0, 1.0]),
    bind(&[AxisKey::E], [0.0, 0.0, -1.0]),
];

static TRANSLATE_BINDINGS: [AxisBinding; 6] = [
    bind(&[AxisKey::W, AxisKey::Up], [0.0, 1.0, 0.0]),
    bind(&[AxisKey::S, AxisKey::Down], [0.0, -1.0, 0.0]),
    bind(&[AxisKey::A, AxisKey::Left], [-1.0, 0.0, 0.0]),
    bind(&[AxisKey::D, AxisKey::Right], [1.0, 0.0, 0.0]),
    bind(&[AxisKey::Q], [0.0, 0.0, -1.0]),
    bind(&[AxisKey::E], [0.0, 0.0, 1.0]),
];

static SCALE_BINDINGS: [AxisBinding; 6] = [
    bind(&[AxisKey::W], [0.0, 1.0, 0.0]),
    bind(&[AxisKey::S], [0.0, -1.0, 0.0]),
    bind(&[AxisKey::A], [-1.0, 0.0, 0.0]),
    bind(&[AxisKey::D], [1.0, 0.0, 0.0]),
    bind(&[AxisKey::Q], [0.0, 0.0, 1.0]),
    bind(&[AxisKey::E], [0.0, 0.0, -1.0]),
];

/// Sum of the unit directions requested by `held` under `kind`.
pub fn held_direction(kind: TransformKind, held: &HeldKeys) -> Vector3<f32> {
    let bindings = match kind {
        TransformKind::Rotate => &ROTATE_BINDINGS,
        TransformKind::Translate => &TRANSLATE_BINDINGS,
        TransformKind::Scale => &SCALE_BINDINGS,
    };

    bindings
        .iter()
        .filter(|binding| binding.keys.iter().any(|key| held.is_held(*key)))
        .fold(Vector3::zeros(), |sum, binding| {
            sum + Vector3::from(binding.direction)
        })
}

/// Usage block shown by the help command.
pub const HELP_TEXT: &str = "\
==== 3D Object Viewer Controls ====
ESC - Exit application
TAB - Switch between objects

== Transformation Modes ==
1 - Rotation mode
2 - Translation mode
3 - Scale mode
4 - Toggle wireframe mode

== Controls (in respective modes) ==
W/S or Up/Down - Y-axis movement/rotation/scale
A/D or Left/Right - X-axis movement/rotation/scale
Q/E - Z-axis movement/rotation/scale
H - Show this help
===============================";

#[cfg(test)]
mod tests {
    use super::*;

    fn held(keys: &[AxisKey]) -> HeldKeys {
        keys.iter().copied().collect()
    }

    #[test]
    fn test_default_mode_is_translate() {
        assert_eq!(TransformKind::default(), TransformKind::Translate);
        assert_eq!(TransformKind::Rotate.to_string(), "Rotation");
    }

    #[test]
    fn test_arrow_aliases_only_move_in_translate_mode() {
        let arrows = held(&[AxisKey::Up, AxisKey::Right]);
        assert_eq!(
            held_direction(TransformKind::Translate, &arrows),
            Vector3::new(1.0, 1.0, 0.0)
        );
        assert_eq!(held_direction(TransformKind::Rotate, &arrows), Vector3::zeros());
        assert_eq!(held_direction(TransformKind::Scale, &arrows), Vector3::zeros());
    }

    #[test]
    fn test_key_and_alias_apply_once() {
        let both = held(&[AxisKey::W, AxisKey::Up]);
        assert_eq!(
            held_direction(TransformKind::Translate, &both),
            Vector3::new(0.0, 1.0, 0.0)
        );
    }

    #[test]
    fn test_sign_conventions_differ_per_mode() {
        let q = held(&[AxisKey::Q]);
        assert_eq!(held_direction(TransformKind::Rotate, &q).z, 1.0);
        assert_eq!(held_direction(TransformKind::Translate, &q).z, -1.0);
        assert_eq!(held_direction(TransformKind::Scale, &q).z, 1.0);

        let a = held(&[AxisKey::A]);
        assert_eq!(held_direction(TransformKind::Rotate, &a), Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(held_direction(TransformKind::Translate, &a), Vector3::new(-1.0, 0.0, 0.0));
        assert_eq!(held_direction(TransformKind::Scale, &a), Vector3::new(-1.0, 0.0, 0.0));

        let d = held(&[AxisKey::D]);
        assert_eq!(held_direction(TransformKind::Rotate, &d).y, -1.0);
    }

    #[test]
    fn test_every_binding_direction() {
        use AxisKey::*;
        use TransformKind::*;

        let table: [(TransformKind, AxisKey, [f32; 3]); 22] = [
            (Rotate, W, [1.0, 0.0, 0.0]),
            (Rotate, S, [-1.0, 0.0, 0.0]),
            (Rotate, A, [0.0, 1.0, 0.0]),
            (Rotate, D, [0.0, -1.0, 0.0]),
            (Rotate, Q, [0.0, 0.0, 1.0]),
            (Rotate, E, [0.0, 0.0, -1.0]),
            (Translate, W, [0.0, 1.0, 0.0]),
            (Translate, S, [0.0, -1.0, 0.0]),
            (Translate, A, [-1.0, 0.0, 0.0]),
            (Translate, D, [1.0, 0.0, 0.0]),
            (Translate, Q, [0.0, 0.0, -1.0]),
            (Translate, E, [0.0, 0.0, 1.0]),
            (Translate, Up, [0.0, 1.0, 0.0]),
            (Translate, Down, [0.0, -1.0, 0.0]),
            (Translate, Left, [-1.0, 0.0, 0.0]),
            (Translate, Right, [1.0, 0.0, 0.0]),
            (Scale, W, [0.0, 1.0, 0.0]),
            (Scale, S, [0.0, -1.0, 0.0]),
            (Scale, A, [-1.0, 0.0, 0.0]),
            (Scale, D, [1.0, 0.0, 0.0]),
            (Scale, Q, [0.0, 0.0, 1.0]),
            (Scale, E, [0.0, 0.0, -1.0]),
        ];

        for (kind, key, expected) in table {
            assert_eq!(
                held_direction(kind, &held(&[key])),
                Vector3::from(expected),
                "{:?} in {:?} mode",
                key,
                kind
            );
        }
    }

    #[test]
    fn test_opposing_keys_cancel() {
        let both = held(&[AxisKey::W, AxisKey::S]);
        assert_eq!(held_direction(TransformKind::Scale, &both), Vector3::zeros());
    }

    #[test]
    fn test_speed_per_kind() {
        let speeds = TransformSpeeds::default();
        assert_eq!(speeds.for_kind(TransformKind::Rotate), 50.0);
        assert_eq!(speeds.for_kind(TransformKind::Translate), 2.0);
        assert_eq!(speeds.for_kind(TransformKind::Scale), 1.0);
    }
}
