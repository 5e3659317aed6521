//! Camera placement, drag-to-rotate and wheel zoom.

use glam::{Mat4, Vec3};

pub const CAMERA_NEAR: f32 = 1.0;
pub const CAMERA_FAR: f32 = 500_000.0;
pub const FIELD_OF_VIEW: f32 = 60.0 * std::f32::consts::PI / 180.0;

/// A single node of radius 1 fills the screen at about 3.1. Pull back
/// further than that so the neighbourhood stays visible.
pub const MINIMUM_CAMERA_DISTANCE: f32 = 6.0;

/// Pixels of mouse travel per radian of rotation.
const DRAG_PIXELS_PER_RADIAN: f32 = 500.0;

/// How far the camera must be from the centre of a bounding sphere of
/// `scene_radius` for all of it to be visible.
pub fn camera_distance(aspect: f32, scene_radius: f32) -> f32 {
    let d = scene_radius * (1.0 / (FIELD_OF_VIEW / 2.0).tan()) * aspect;
    d.max(CAMERA_NEAR).max(MINIMUM_CAMERA_DISTANCE)
}

/// Direction, in camera space, from the eye through a pixel of the canvas.
pub fn zoom_point_direction(width: f32, height: f32, x: f32, y: f32) -> Vec3 {
    Vec3::new(
        width / 2.0 - x,
        y - height / 2.0,
        height / (2.0 * (FIELD_OF_VIEW / 2.0).tan()),
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl Camera {
    /// Look at the origin from far enough along +z to see a scene of
    /// `scene_radius`.
    pub fn framing(aspect: f32, scene_radius: f32) -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, camera_distance(aspect, scene_radius)),
            target: Vec3::ZERO,
            up: Vec3::Y,
        }
    }

    /// Move eye and target together towards the point under the cursor.
    ///
    /// `direction` comes from [`zoom_point_direction`]. A negative `delta_y`
    /// (wheel away from the user) zooms in. `fine` takes much smaller steps.
    pub fn zoom(&mut self, direction: Vec3, delta_y: f32, fine: bool) {
        if delta_y == 0.0 || direction == Vec3::ZERO {
            return;
        }

        let step = -delta_y.signum() / if fine { 512.0 } else { 32.0 };
        let norm = direction.normalize() * step;

        let focus = self.target - self.eye;
        let len = focus.length();
        let back = self.eye - self.target;

        let mut shift = back * norm.z;
        shift += self.up * norm.y * len;
        shift += self.up.cross(back) * norm.x;

        self.eye -= shift;
        self.target -= shift;
    }

    /// Circle the eye around the y axis, `distance` from it.
    pub fn spin(&mut self, seconds: f32, distance: f32) {
        self.eye.x = seconds.sin() * distance;
        self.eye.z = seconds.cos() * distance;
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }
}

/// Mouse-drag rotation of the model.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Orbit {
    dragging: bool,
    last_x: f32,
    last_y: f32,
    pub x_rot: f32,
    pub y_rot: f32,
}

impl Orbit {
    pub fn press(&mut self, x: f32, y: f32) {
        self.dragging = true;
        self.last_x = x;
        self.last_y = y;
    }

    /// Returns true when the rotation changed and the scene needs redrawing.
    pub fn drag(&mut self, x: f32, y: f32) -> bool {
        if !self.dragging {
            return false;
        }
        self.x_rot += (x - self.last_x) / DRAG_PIXELS_PER_RADIAN;
        self.y_rot += (y - self.last_y) / DRAG_PIXELS_PER_RADIAN;
        self.last_x = x;
        self.last_y = y;
        true
    }

    pub fn release(&mut self) {
        self.dragging = false;
    }

    /// Vertical drag tilts about x, horizontal drag turns about y.
    pub fn model(&self) -> Mat4 {
        Mat4::from_rotation_x(self.y_rot) * Mat4::from_rotation_y(self.x_rot)
    }
}

/// The three matrices every program takes as uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrices {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
}

impl Matrices {
    pub fn new(camera: &Camera, orbit: &Orbit, aspect: f32) -> Self {
        Self {
            model: orbit.model(),
            view: camera.view(),
            projection: Mat4::perspective_rh_gl(FIELD_OF_VIEW, aspect, CAMERA_NEAR, CAMERA_FAR),
        }
    }

    /// Camera position in the coordinates the graph was built in.
    pub fn eye_in_model_space(&self) -> Vec3 {
        (self.view * self.model).inverse().transform_point3(Vec3::ZERO)
    }

    /// Camera right, up and out (towards the viewer) in world space, read
    /// from the rows of the view rotation.
    pub fn camera_basis(&self) -> [Vec3; 3] {
        let v = &self.view;
        [
            Vec3::new(v.x_axis.x, v.y_axis.x, v.z_axis.x),
            Vec3::new(v.x_axis.y, v.y_axis.y, v.z_axis.y),
            Vec3::new(v.x_axis.z, v.y_axis.z, v.z_axis.z),
        ]
    }
}
