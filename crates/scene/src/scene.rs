/// Everything the renderer needs to draw one frame of the ballpit.
#[derive(Debug, Clone)]
pub struct Scene {
    pub spheres: crate::InstancedSpheres,
    pub ambient: crate::AmbientLight,
    pub accent: crate::AccentLight,
    pub material: crate::SphereMaterial,
    gradient: crate::ColorGradient,
}

impl Scene {
    pub fn new(
        count: usize,
        follow_cursor: bool,
        gradient: crate::ColorGradient,
        lighting: &crate::LightingConfig,
        material: crate::SphereMaterial,
    ) -> Self {
        let mut scene = Self {
            spheres: crate::InstancedSpheres::new(count, follow_cursor),
            ambient: lighting.ambient(),
            accent: lighting.accent(),
            material,
            gradient,
        };
        scene.apply_gradient();
        scene
    }

    pub fn gradient(&self) -> &crate::ColorGradient {
        &self.gradient
    }

    pub fn sync_frame(&mut self, physics: &physics::Physics) {
        if let Some(lead_position) = self.spheres.sync_frame(physics) {
            self.accent.position = lead_position;
        }
    }

    pub fn set_colors(&mut self, gradient: crate::ColorGradient) {
        self.gradient = gradient;
        self.apply_gradient();
    }

    pub fn rebuild(&mut self, count: usize) {
        self.spheres.rebuild(count);
        self.apply_gradient();
    }

    pub fn dispose(&mut self) {
        self.spheres.dispose();
    }

    fn apply_gradient(&mut self) {
        if let Some(lead_color) = self.spheres.set_colors(&self.gradient) {
            self.accent.color = lead_color;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_stop_scene(count: usize) -> Scene {
        Scene::new(
            count,
            true,
            crate::ColorGradient::from_hex(&[0xff0000, 0x0000ff]).unwrap(),
            &crate::LightingConfig::default(),
            crate::SphereMaterial::default(),
        )
    }

    #[test]
    fn accent_light_takes_lead_color() {
        let scene = two_stop_scene(3);
        assert_eq!(scene.accent.color, nalgebra_glm::vec3(1.0, 0.0, 0.0));
        assert_eq!(scene.accent.intensity, 200.0);
    }

    #[test]
    fn accent_light_follows_lead_body() {
        let mut scene = two_stop_scene(1);
        let config = physics::SimulationConfig {
            count: 1,
            ..Default::default()
        };
        let bodies = [physics::Body::new(
            nalgebra_glm::vec3(2.0, -1.0, 0.5),
            nalgebra_glm::Vec3::zeros(),
            1.0,
        )];
        let physics = physics::Physics::from_bodies(config, &bodies).unwrap();

        scene.sync_frame(&physics);

        assert_eq!(scene.accent.position, nalgebra_glm::vec3(2.0, -1.0, 0.5));
    }

    #[test]
    fn rebuild_recolors_new_instances() {
        let mut scene = two_stop_scene(2);
        scene.rebuild(4);

        assert_eq!(scene.spheres.len(), 4);
        assert_eq!(
            scene.spheres.instances()[0].color,
            nalgebra_glm::vec4(1.0, 0.0, 0.0, 1.0)
        );
        assert_eq!(
            scene.spheres.instances()[2].color,
            nalgebra_glm::vec4(0.5, 0.0, 0.5, 1.0)
        );
    }

    #[test]
    fn recolor_updates_accent() {
        let mut scene = two_stop_scene(2);
        scene.set_colors(crate::ColorGradient::from_hex(&[0x00ff00]).unwrap());
        assert_eq!(scene.accent.color, nalgebra_glm::vec3(0.0, 1.0, 0.0));
    }
}
