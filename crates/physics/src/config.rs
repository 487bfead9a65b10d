#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Body count must be greater than zero!")]
    EmptyEnsemble,

    #[error("Simulation bounds must be finite and positive, got ({0}, {1}, {2})")]
    InvalidBounds(f32, f32, f32),

    #[error("Body sizes must satisfy 0 < min_size <= max_size and size0 > 0 (min {min}, max {max}, size0 {size0})")]
    InvalidSizes { min: f32, max: f32, size0: f32 },

    #[error("Simulation parameter '{0}' must be finite and non-negative")]
    InvalidParameter(&'static str),

    #[error("Body layout has {actual} bodies but the configuration expects {expected}")]
    LayoutMismatch { expected: usize, actual: usize },

    #[error("Body {0} has a non-positive radius")]
    NonPositiveRadius(usize),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Parameters for one run of the ensemble.
///
/// Array sizes and per-body sizes are derived from this at construction,
/// so changing `count` means building a new [`crate::Physics`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub count: usize,
    pub max_x: f32,
    pub max_y: f32,
    pub max_z: f32,
    pub gravity: f32,
    pub friction: f32,
    pub wall_bounce: f32,
    pub max_velocity: f32,
    pub min_size: f32,
    pub max_size: f32,
    pub size0: f32,
    pub control_sphere0: bool,
    pub follow_cursor: bool,

    /// Share of the overlap each body of a colliding pair is pushed by.
    pub collision_split: f32,
    /// Minimum velocity scale applied to the correction of a regular collision.
    pub collision_push_scale: f32,
    /// Minimum velocity scale applied when a body is displaced by the controlled body.
    pub controller_push_scale: f32,
    /// Interpolation factor for the controlled body chasing its target.
    pub follow_lerp: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            count: 200,
            max_x: 5.0,
            max_y: 5.0,
            max_z: 2.0,
            gravity: 0.5,
            friction: 0.9975,
            wall_bounce: 0.95,
            max_velocity: 0.15,
            min_size: 0.5,
            max_size: 1.0,
            size0: 1.0,
            control_sphere0: false,
            follow_cursor: true,
            collision_split: 0.5,
            collision_push_scale: 1.0,
            controller_push_scale: 2.0,
            follow_lerp: 0.1,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(Error::EmptyEnsemble);
        }

        if ![self.max_x, self.max_y, self.max_z]
            .iter()
            .all(|bound| bound.is_finite() && *bound > 0.0)
        {
            return Err(Error::InvalidBounds(self.max_x, self.max_y, self.max_z));
        }

        let sizes_valid = self.min_size.is_finite()
            && self.max_size.is_finite()
            && self.size0.is_finite()
            && self.min_size > 0.0
            && self.min_size <= self.max_size
            && self.size0 > 0.0;
        if !sizes_valid {
            return Err(Error::InvalidSizes {
                min: self.min_size,
                max: self.max_size,
                size0: self.size0,
            });
        }

        if !self.gravity.is_finite() {
            return Err(Error::InvalidParameter("gravity"));
        }

        [
            ("friction", self.friction),
            ("wall_bounce", self.wall_bounce),
            ("max_velocity", self.max_velocity),
            ("collision_split", self.collision_split),
            ("collision_push_scale", self.collision_push_scale),
            ("controller_push_scale", self.controller_push_scale),
            ("follow_lerp", self.follow_lerp),
        ]
        .into_iter()
        .try_for_each(|(name, value)| {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(Error::InvalidParameter(name))
            }
        })
    }

    /// Half-extent of the depth axis. Never thinner than the largest body.
    pub fn depth_boundary(&self) -> f32 {
        self.max_z.max(self.max_size).max(self.size0)
    }

    pub fn with_count(&self, count: usize) -> Self {
        Self {
            count,
            ..self.clone()
        }
    }
}
