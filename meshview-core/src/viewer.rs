/// Viewer state shared by the input handler and the render loop
use nalgebra::Vector3;
use std::fmt;
use tracing::info;

use crate::controller::{
    held_direction, HeldKeys, TransformKind, TransformSpeeds, ViewerCommand, HELP_TEXT,
};
use crate::error::GraphicsError;
use crate::gfx::{GraphicsContext, Uniform};
use crate::object::MeshObject;
use crate::projection::Camera;

/// Feedback produced by a command, for the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Selected {
        /// 0-based
        index: usize,
        count: usize,
        name: String,
    },
    Mode(TransformKind),
    Wireframe(bool),
    Help,
    Quit,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Selected { index, count, name } => {
                write!(f, "Selected object: {}/{} ({})", index + 1, count, name)
            }
            Notice::Mode(kind) => write!(f, "Mode: {}", kind),
            Notice::Wireframe(on) => {
                write!(f, "Wireframe mode: {}", if *on { "ON" } else { "OFF" })
            }
            Notice::Help => f.write_str(HELP_TEXT),
            Notice::Quit => f.write_str("Exiting"),
        }
    }
}

/// Everything that lives for one run of the viewer.
#[derive(Debug, Default)]
pub struct ViewerState {
    objects: Vec<MeshObject>,
    selected: usize,
    mode: TransformKind,
    wireframe: bool,
    speeds: TransformSpeeds,
    quit_requested: bool,
}

impl ViewerState {
    pub fn new(objects: Vec<MeshObject>, speeds: TransformSpeeds) -> Self {
        Self {
            objects,
            speeds,
            ..Self::default()
        }
    }

    pub fn objects(&self) -> &[MeshObject] {
        &self.objects
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> Option<&MeshObject> {
        self.objects.get(self.selected)
    }

    pub fn mode(&self) -> TransformKind {
        self.mode
    }

    pub fn wireframe(&self) -> bool {
        self.wireframe
    }

    pub fn speeds(&self) -> &TransformSpeeds {
        &self.speeds
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Handle one key-press edge.
    pub fn apply_command(&mut self, command: ViewerCommand) -> Option<Notice> {
        let notice = match command {
            ViewerCommand::Quit => {
                self.quit_requested = true;
                Notice::Quit
            }
            ViewerCommand::Help => Notice::Help,
            ViewerCommand::NextObject => {
                if self.objects.is_empty() {
                    return None;
                }
                self.selected = (self.selected + 1) % self.objects.len();
                Notice::Selected {
                    index: self.selected,
                    count: self.objects.len(),
                    name: self.objects[self.selected].name().to_string(),
                }
            }
            ViewerCommand::SetMode(kind) => {
                self.mode = kind;
                Notice::Mode(kind)
            }
            ViewerCommand::ToggleWireframe => {
                self.wireframe = !self.wireframe;
                Notice::Wireframe(self.wireframe)
            }
        };

        if notice != Notice::Help {
            info!("{}", notice);
        }
        Some(notice)
    }

    /// Apply `dt` seconds of held axis keys to the selected object.
    pub fn apply_held(&mut self, held: &HeldKeys, dt: f32) {
        let mode = self.mode;
        let step = self.speeds.for_kind(mode) * dt;
        let Some(object) = self.objects.get_mut(self.selected) else {
            return;
        };

        let direction = held_direction(mode, held);
        if direction == Vector3::zeros() {
            return;
        }

        let delta = direction * step;
        match mode {
            TransformKind::Rotate => object.transform.rotate(delta),
            TransformKind::Translate => object.transform.translate(delta),
            TransformKind::Scale => object.transform.rescale(delta),
        }
    }

    /// One frame of input: the commands in arrival order, then the held keys.
    pub fn update(
        &mut self,
        commands: &[ViewerCommand],
        held: &HeldKeys,
        dt: f32,
    ) -> Vec<Notice> {
        let notices = commands
            .iter()
            .filter_map(|command| self.apply_command(*command))
            .collect();
        self.apply_held(held, dt);
        notices
    }

    /// Upload the camera and draw every object.
    pub fn draw<G: GraphicsContext + ?Sized>(
        &self,
        gfx: &mut G,
        camera: &Camera,
    ) -> Result<(), GraphicsError> {
        gfx.set_uniform(Uniform::View(camera.view_matrix()));
        gfx.set_uniform(Uniform::Projection(camera.projection_matrix()));

        for (index, object) in self.objects.iter().enumerate() {
            object.draw(gfx, index == self.selected, self.wireframe)?;
        }
        Ok(())
    }

    /// Release every object's GPU resources.
    pub fn destroy<G: GraphicsContext + ?Sized>(self, gfx: &mut G) {
        for object in self.objects {
            object.destroy(gfx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::AxisKey;
    use crate::gfx::recording::{Call, RecordingContext};
    use crate::gfx::PolygonMode;
    use crate::obj::parse_obj;

    fn viewer(gfx: &mut RecordingContext, count: usize) -> ViewerState {
        let mesh = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        let objects = (0..count)
            .map(|i| MeshObject::new(gfx, format!("model-{}.obj", i), &mesh).unwrap())
            .collect();
        ViewerState::new(objects, TransformSpeeds::default())
    }

    fn held(keys: &[AxisKey]) -> HeldKeys {
        keys.iter().copied().collect()
    }

    #[test]
    fn test_next_object_wraps() {
        let mut gfx = RecordingContext::new();
        let mut state = viewer(&mut gfx, 2);
        state.apply_command(ViewerCommand::NextObject);
        assert_eq!(state.selected_index(), 1);

        let notice = state.apply_command(ViewerCommand::NextObject);
        assert_eq!(state.selected_index(), 0);
        assert_eq!(
            notice.unwrap().to_string(),
            "Selected object: 1/2 (model-0.obj)"
        );
    }

    #[test]
    fn test_cycling_count_times_returns_to_start() {
        let mut gfx = RecordingContext::new();
        let mut state = viewer(&mut gfx, 5);
        state.apply_command(ViewerCommand::NextObject);
        let start = state.selected_index();

        for _ in 0..5 {
            state.apply_command(ViewerCommand::NextObject);
        }
        assert_eq!(state.selected_index(), start);
    }

    #[test]
    fn test_next_object_on_empty_list_is_ignored() {
        let mut state = ViewerState::default();
        assert_eq!(state.apply_command(ViewerCommand::NextObject), None);
        assert_eq!(state.selected_index(), 0);
    }

    #[test]
    fn test_wireframe_toggle_is_an_involution() {
        let mut state = ViewerState::default();
        assert_eq!(
            state.apply_command(ViewerCommand::ToggleWireframe),
            Some(Notice::Wireframe(true))
        );
        state.apply_command(ViewerCommand::ToggleWireframe);
        assert!(!state.wireframe());
    }

    #[test]
    fn test_hold_a_in_rotate_mode() {
        let mut gfx = RecordingContext::new();
        let mut state = viewer(&mut gfx, 1);

        let notices = state.update(
            &[ViewerCommand::SetMode(TransformKind::Rotate)],
            &held(&[AxisKey::A]),
            1.0,
        );

        assert_eq!(notices, vec![Notice::Mode(TransformKind::Rotate)]);
        assert_eq!(state.selected().unwrap().transform.rotation.y, 50.0);
    }

    #[test]
    fn test_hold_a_in_scale_mode_clamps() {
        let mut gfx = RecordingContext::new();
        let mut state = viewer(&mut gfx, 1);
        state.objects[0].transform.scale = Vector3::new(0.15, 1.0, 1.0);

        state.update(
            &[ViewerCommand::SetMode(TransformKind::Scale)],
            &held(&[AxisKey::A]),
            1.0,
        );

        assert_eq!(state.selected().unwrap().transform.scale, Vector3::new(0.1, 1.0, 1.0));
    }

    #[test]
    fn test_translate_is_default_and_moves_selected_only() {
        let mut gfx = RecordingContext::new();
        let mut state = viewer(&mut gfx, 2);
        state.apply_command(ViewerCommand::NextObject);

        state.apply_held(&held(&[AxisKey::Left, AxisKey::E]), 0.5);

        assert_eq!(state.objects[1].transform.position, Vector3::new(-1.0, 0.0, 1.0));
        assert_eq!(state.objects[0].transform.position, Vector3::zeros());
    }

    #[test]
    fn test_rotation_stays_within_a_turn() {
        let mut gfx = RecordingContext::new();
        let mut state = viewer(&mut gfx, 1);
        state.apply_command(ViewerCommand::SetMode(TransformKind::Rotate));

        for _ in 0..500 {
            state.apply_held(&held(&[AxisKey::W, AxisKey::D, AxisKey::Q]), 0.37);
        }
        for angle in state.selected().unwrap().transform.rotation.iter() {
            assert!(*angle > -360.0 && *angle < 360.0);
        }
    }

    #[test]
    fn test_continuous_edits_need_a_selection() {
        let mut state = ViewerState::default();
        state.apply_command(ViewerCommand::SetMode(TransformKind::Scale));
        state.apply_held(&held(&[AxisKey::W]), 1.0);
        assert_eq!(state.mode(), TransformKind::Scale);
    }

    #[test]
    fn test_quit_sets_flag() {
        let mut state = ViewerState::default();
        state.apply_command(ViewerCommand::Quit);
        assert!(state.quit_requested());
    }

    #[test]
    fn test_draw_outlines_only_the_selected_object() {
        let mut gfx = RecordingContext::new();
        let mut state = viewer(&mut gfx, 3);
        state.apply_command(ViewerCommand::NextObject);
        state.apply_command(ViewerCommand::ToggleWireframe);

        gfx.calls.clear();
        state.draw(&mut gfx, &Camera::default()).unwrap();

        let sequence: Vec<String> = gfx
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::SetPolygonMode(PolygonMode::Line) => Some("line".to_string()),
                Call::SetPolygonMode(PolygonMode::Fill) => Some("fill".to_string()),
                Call::DrawIndexed { vertex_array, .. } => Some(format!("draw {}", vertex_array)),
                _ => None,
            })
            .collect();

        // Each object owns ids 4k+1..4k+4; the vertex array is the last.
        assert_eq!(sequence, vec!["draw 4", "line", "draw 8", "fill", "draw 12"]);
        assert!(matches!(gfx.calls[0], Call::SetUniform(Uniform::View(_))));
        assert!(matches!(gfx.calls[1], Call::SetUniform(Uniform::Projection(_))));
    }

    #[test]
    fn test_destroy_releases_all_objects() {
        let mut gfx = RecordingContext::new();
        let state = viewer(&mut gfx, 2);
        assert_eq!(gfx.live_resources(), 8);

        state.destroy(&mut gfx);
        assert_eq!(gfx.live_resources(), 0);
    }
}
