use glam::{Mat4, Vec2, Vec3};

/// Camera orbiting the origin, driven by mouse drags.
pub struct Camera {
    /// Degrees around the vertical axis.
    pub heading: f32,
    /// Degrees above the horizontal plane.
    pub pitch: f32,
    pub zoom: f32,

    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    /// Degrees per unit of mouse motion.
    pub orbit_sensitivity: f32,
    /// Zoom units per unit of vertical mouse motion.
    pub zoom_sensitivity: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            heading: 0.0,
            pitch: 0.0,
            zoom: 5.0,

            fov: 60.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,

            orbit_sensitivity: 0.3,
            zoom_sensitivity: 0.03,
        }
    }
}

impl Camera {
    pub const MIN_ZOOM: f32 = 0.5;
    pub const MAX_ZOOM: f32 = 50.0;

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -self.zoom))
            * Mat4::from_rotation_x(-self.pitch.to_radians())
            * Mat4::from_rotation_y(-self.heading.to_radians())
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Eye position in world space.
    pub fn position(&self) -> Vec3 {
        self.view_matrix().inverse().transform_point3(Vec3::ZERO)
    }

    pub fn process_orbit(&mut self, delta: Vec2) {
        self.heading -= delta.x * self.orbit_sensitivity;
        self.pitch -= delta.y * self.orbit_sensitivity;
    }

    pub fn process_zoom(&mut self, delta_y: f32) {
        self.zoom = (self.zoom - delta_y * self.zoom_sensitivity).clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
    }

    pub fn set_aspect(&mut self, width: f32, height: f32) {
        if height > 0.0 {
            self.aspect = width / height;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_eye_sits_on_positive_z() {
        let camera = Camera::default();
        assert!(camera.position().abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), 1e-5));
        let origin = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(0.0, 0.0, -5.0), 1e-5));
    }

    #[test]
    fn heading_orbits_around_vertical_axis() {
        let mut camera = Camera::default();
        camera.process_orbit(Vec2::new(-300.0, 0.0));
        assert!((camera.heading - 90.0).abs() < 1e-4);
        assert!(camera.position().abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-4));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = Camera::default();
        camera.process_zoom(10_000.0);
        assert_eq!(camera.zoom, Camera::MIN_ZOOM);
        camera.process_zoom(-10_000.0);
        assert_eq!(camera.zoom, Camera::MAX_ZOOM);
    }

    #[test]
    fn zero_height_keeps_aspect() {
        let mut camera = Camera::default();
        camera.set_aspect(800.0, 0.0);
        assert_eq!(camera.aspect, 16.0 / 9.0);
        camera.set_aspect(800.0, 400.0);
        assert_eq!(camera.aspect, 2.0);
    }
}
