#[derive(Debug, Copy, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AmbientLight {
    pub color: nalgebra_glm::Vec3,
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: nalgebra_glm::vec3(1.0, 1.0, 1.0),
            intensity: 1.0,
        }
    }
}

/// Point light that belongs to the lead body: it takes its color and follows its position.
#[derive(Debug, Copy, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AccentLight {
    pub position: nalgebra_glm::Vec3,
    pub color: nalgebra_glm::Vec3,
    pub intensity: f32,
}

impl Default for AccentLight {
    fn default() -> Self {
        Self {
            position: nalgebra_glm::Vec3::zeros(),
            color: nalgebra_glm::vec3(1.0, 1.0, 1.0),
            intensity: 200.0,
        }
    }
}

/// Declarative description of the sphere surface. Shading is up to the renderer.
#[derive(Debug, Copy, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SphereMaterial {
    pub metalness: f32,
    pub roughness: f32,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
    pub subsurface_glow: bool,
}

impl Default for SphereMaterial {
    fn default() -> Self {
        Self {
            metalness: 0.5,
            roughness: 0.5,
            clearcoat: 1.0,
            clearcoat_roughness: 0.15,
            subsurface_glow: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub ambient_color: u32,
    pub ambient_intensity: f32,
    pub light_intensity: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_color: 0xffffff,
            ambient_intensity: 1.0,
            light_intensity: 200.0,
        }
    }
}

impl LightingConfig {
    pub fn ambient(&self) -> AmbientLight {
        AmbientLight {
            color: crate::color_from_hex(self.ambient_color),
            intensity: self.ambient_intensity,
        }
    }

    pub fn accent(&self) -> AccentLight {
        AccentLight {
            intensity: self.light_intensity,
            ..Default::default()
        }
    }
}
