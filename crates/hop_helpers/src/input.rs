use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

/// Screen position of a touch or left click that started this frame.
///
/// Touches win over the mouse. Of several new touches the one with the lowest id is
/// reported, so a caller never sees more than one tap per frame.
pub fn just_pressed_screen_position(
    button_input: &ButtonInput<MouseButton>,
    touch_input: &Touches,
    windows: &Query<&Window, With<PrimaryWindow>>,
) -> Option<Vec2> {
    if let Some(touch) = touch_input.iter_just_pressed().min_by_key(|touch| touch.id()) {
        return Some(touch.position());
    }
    if button_input.just_pressed(MouseButton::Left) {
        windows.get_single().ok()?.cursor_position()
    } else {
        None
    }
}

/// True while the pointer hovers or presses any UI node.
pub fn pointer_over_ui(interactions: &Query<&Interaction>) -> bool {
    interactions
        .iter()
        .any(|interaction| *interaction != Interaction::None)
}

/// World-space ray through a viewport position of the single camera.
pub fn screen_ray(
    cameras: &Query<(&Camera, &GlobalTransform)>,
    position: Vec2,
) -> Option<Ray3d> {
    let Ok((camera, camera_transform)) = cameras.get_single() else {
        warn!("No single camera to cast a ray from");
        return None;
    };
    camera.viewport_to_world(camera_transform, position).ok()
}

/// Everything needed to turn raw pointer input into at most one world-space tap per frame.
#[derive(SystemParam)]
pub struct TapInput<'w, 's> {
    mouse: Res<'w, ButtonInput<MouseButton>>,
    touches: Res<'w, Touches>,
    windows: Query<'w, 's, &'static Window, With<PrimaryWindow>>,
    interactions: Query<'w, 's, &'static Interaction>,
    cameras: Query<'w, 's, (&'static Camera, &'static GlobalTransform)>,
}

impl TapInput<'_, '_> {
    /// Screen position of this frame's tap, ignoring taps consumed by the UI.
    pub fn screen_position(&self) -> Option<Vec2> {
        let position = just_pressed_screen_position(&self.mouse, &self.touches, &self.windows)?;
        if pointer_over_ui(&self.interactions) {
            debug!("Tap at {position} consumed by the UI");
            return None;
        }
        Some(position)
    }

    /// This frame's tap as a camera ray.
    pub fn ray(&self) -> Option<Ray3d> {
        let position = self.screen_position()?;
        screen_ray(&self.cameras, position)
    }

    /// Forward direction of the camera, used when a tap ray is unusable.
    pub fn camera_forward(&self) -> Option<Dir3> {
        self.cameras
            .get_single()
            .ok()
            .map(|(_, transform)| transform.forward())
    }
}
