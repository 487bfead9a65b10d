#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("A color gradient needs at least one stop!")]
    EmptyGradient,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Converts a `0xRRGGBB` sRGB color to linear RGB.
pub fn color_from_hex(hex: u32) -> nalgebra_glm::Vec3 {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
    nalgebra_glm::vec3(channel(16), channel(8), channel(0))
}

fn srgb_to_linear(value: f32) -> f32 {
    if value < 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

/// Ordered color stops sampled by a normalized ratio.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Vec<nalgebra_glm::Vec3>", into = "Vec<nalgebra_glm::Vec3>")]
pub struct ColorGradient {
    stops: Vec<nalgebra_glm::Vec3>,
}

impl ColorGradient {
    pub fn new(stops: Vec<nalgebra_glm::Vec3>) -> Result<Self> {
        if stops.is_empty() {
            return Err(Error::EmptyGradient);
        }
        Ok(Self { stops })
    }

    pub fn from_hex(colors: &[u32]) -> Result<Self> {
        Self::new(colors.iter().copied().map(color_from_hex).collect())
    }

    pub fn stops(&self) -> &[nalgebra_glm::Vec3] {
        &self.stops
    }

    /// Linearly interpolates between the two stops around `ratio`, clamped to `[0, 1]`.
    pub fn color_at(&self, ratio: f32) -> nalgebra_glm::Vec3 {
        let last = self.stops.len() - 1;
        let ratio = if ratio.is_finite() {
            ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let scaled = ratio * last as f32;
        let index = scaled.floor() as usize;

        if index >= last {
            return self.stops[last];
        }

        let alpha = scaled - index as f32;
        nalgebra_glm::lerp(&self.stops[index], &self.stops[index + 1], alpha)
    }
}

impl TryFrom<Vec<nalgebra_glm::Vec3>> for ColorGradient {
    type Error = Error;

    fn try_from(stops: Vec<nalgebra_glm::Vec3>) -> Result<Self> {
        Self::new(stops)
    }
}

impl From<ColorGradient> for Vec<nalgebra_glm::Vec3> {
    fn from(gradient: ColorGradient) -> Self {
        gradient.stops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_channels() {
        assert_eq!(color_from_hex(0xffffff), nalgebra_glm::vec3(1.0, 1.0, 1.0));
        assert_eq!(color_from_hex(0x000000), nalgebra_glm::vec3(0.0, 0.0, 0.0));

        let red = color_from_hex(0xff0000);
        assert_eq!(red.x, 1.0);
        assert_eq!(red.y, 0.0);
    }

    #[test]
    fn empty_gradient_is_rejected() {
        assert_eq!(ColorGradient::new(Vec::new()), Err(Error::EmptyGradient));
    }

    #[test]
    fn deserializing_empty_stops_fails() {
        let deserializer = serde::de::value::SeqDeserializer::<_, serde::de::value::Error>::new(
            std::iter::empty::<f32>(),
        );
        let error = <ColorGradient as serde::Deserialize>::deserialize(deserializer).unwrap_err();
        assert!(error.to_string().contains("at least one stop"));
    }

    #[test]
    fn samples_between_stops() {
        let gradient = ColorGradient::new(vec![
            nalgebra_glm::vec3(0.0, 0.0, 0.0),
            nalgebra_glm::vec3(1.0, 0.0, 0.0),
            nalgebra_glm::vec3(1.0, 1.0, 0.0),
        ])
        .unwrap();

        assert_eq!(gradient.color_at(0.0), nalgebra_glm::vec3(0.0, 0.0, 0.0));
        assert_eq!(gradient.color_at(0.25), nalgebra_glm::vec3(0.5, 0.0, 0.0));
        assert_eq!(gradient.color_at(0.75), nalgebra_glm::vec3(1.0, 0.5, 0.0));
        assert_eq!(gradient.color_at(1.0), nalgebra_glm::vec3(1.0, 1.0, 0.0));
        assert_eq!(gradient.color_at(4.0), nalgebra_glm::vec3(1.0, 1.0, 0.0));
        assert_eq!(gradient.color_at(-1.0), nalgebra_glm::vec3(0.0, 0.0, 0.0));
    }

    #[test]
    fn single_stop_is_constant() {
        let gradient = ColorGradient::from_hex(&[0xffffff]).unwrap();
        assert_eq!(gradient.color_at(0.5), nalgebra_glm::vec3(1.0, 1.0, 1.0));
    }
}
