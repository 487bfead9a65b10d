use crate::{Error, Result, SimulationConfig, Vec3Buffer};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Snapshot of a single simulated sphere.
#[derive(Default, Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Body {
    pub position: nalgebra_glm::Vec3,
    pub velocity: nalgebra_glm::Vec3,
    pub radius: f32,
}

impl Body {
    pub fn new(position: nalgebra_glm::Vec3, velocity: nalgebra_glm::Vec3, radius: f32) -> Self {
        Self {
            position,
            velocity,
            radius,
        }
    }
}

/// A fixed-size ensemble of spheres advanced by one integrate, collide, bound pass per tick.
#[derive(Debug, Clone)]
pub struct Physics {
    config: SimulationConfig,
    positions: Vec3Buffer,
    velocities: Vec3Buffer,
    sizes: Vec<f32>,
    target: nalgebra_glm::Vec3,
    controlled: bool,
}

impl Physics {
    /// Scatters `config.count` bodies uniformly inside the bounds.
    pub fn new(config: SimulationConfig, seed: u64) -> Result<Self> {
        config.validate()?;

        let mut rng = StdRng::seed_from_u64(seed);
        let mut positions = Vec3Buffer::zeroed(config.count);
        let mut sizes = Vec::with_capacity(config.count);

        for index in 0..config.count {
            let position = nalgebra_glm::vec3(
                rng.gen_range(-config.max_x..=config.max_x),
                rng.gen_range(-config.max_y..=config.max_y),
                rng.gen_range(-config.max_z..=config.max_z),
            );
            positions.set(index, &position);

            let size = if index == 0 {
                config.size0
            } else {
                rng.gen_range(config.min_size..=config.max_size)
            };
            sizes.push(size);
        }

        log::debug!("Created ensemble of {} bodies (seed {seed})", config.count);

        Ok(Self {
            velocities: Vec3Buffer::zeroed(config.count),
            controlled: config.control_sphere0,
            target: nalgebra_glm::Vec3::zeros(),
            config,
            positions,
            sizes,
        })
    }

    /// Builds an ensemble from an explicit layout instead of random placement.
    pub fn from_bodies(config: SimulationConfig, bodies: &[Body]) -> Result<Self> {
        config.validate()?;

        if bodies.len() != config.count {
            return Err(Error::LayoutMismatch {
                expected: config.count,
                actual: bodies.len(),
            });
        }

        if let Some(index) = bodies
            .iter()
            .position(|body| !(body.radius.is_finite() && body.radius > 0.0))
        {
            return Err(Error::NonPositiveRadius(index));
        }

        let positions: Vec<_> = bodies.iter().map(|body| body.position).collect();
        let velocities: Vec<_> = bodies.iter().map(|body| body.velocity).collect();

        Ok(Self {
            positions: Vec3Buffer::from_vectors(&positions),
            velocities: Vec3Buffer::from_vectors(&velocities),
            sizes: bodies.iter().map(|body| body.radius).collect(),
            controlled: config.control_sphere0,
            target: nalgebra_glm::Vec3::zeros(),
            config,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn count(&self) -> usize {
        self.sizes.len()
    }

    pub fn positions(&self) -> &Vec3Buffer {
        &self.positions
    }

    pub fn velocities(&self) -> &Vec3Buffer {
        &self.velocities
    }

    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    pub fn radius(&self, index: usize) -> f32 {
        self.sizes[index]
    }

    pub fn body(&self, index: usize) -> Body {
        Body::new(
            self.positions.get(index),
            self.velocities.get(index),
            self.sizes[index],
        )
    }

    pub fn is_controlled(&self) -> bool {
        self.controlled
    }

    /// Whether body 0 is driven by the target instead of by gravity and friction.
    pub fn set_controlled(&mut self, controlled: bool) {
        self.controlled = controlled;
    }

    pub fn target(&self) -> nalgebra_glm::Vec3 {
        self.target
    }

    pub fn set_target(&mut self, target: nalgebra_glm::Vec3) {
        self.target = target;
    }

    /// Tracks the visible area. Non-finite or non-positive extents are ignored,
    /// and the box never shrinks below the largest body.
    pub fn set_bounds(&mut self, max_x: f32, max_y: f32) {
        if !(max_x.is_finite() && max_y.is_finite() && max_x > 0.0 && max_y > 0.0) {
            log::debug!("Ignoring degenerate simulation bounds ({max_x}, {max_y})");
            return;
        }
        let largest = self.largest_radius();
        self.config.max_x = max_x.max(largest);
        self.config.max_y = max_y.max(largest);
    }

    fn largest_radius(&self) -> f32 {
        self.sizes.iter().copied().fold(0.0, f32::max)
    }

    pub fn kinetic_energy(&self) -> f32 {
        self.velocities
            .iter()
            .map(|velocity| 0.5 * nalgebra_glm::length2(&velocity))
            .sum()
    }

    pub fn step(&mut self, delta_time: f32) {
        let delta_time = if delta_time.is_finite() && delta_time > 0.0 {
            delta_time
        } else {
            0.0
        };

        let first_free = if self.controlled { 1 } else { 0 };

        if self.controlled {
            self.follow_target();
        }

        self.integrate(first_free, delta_time);
        self.resolve_collisions(first_free);
        if self.controlled {
            self.resolve_controller_collisions();
        }
        self.reflect_from_boundaries(first_free);
    }

    fn follow_target(&mut self) {
        let position = self.positions.get(0);
        let eased = nalgebra_glm::lerp(&position, &self.target, self.config.follow_lerp);
        self.positions.set(0, &eased);
        self.velocities.set(0, &nalgebra_glm::Vec3::zeros());
    }

    fn integrate(&mut self, first_free: usize, delta_time: f32) {
        for index in first_free..self.count() {
            let mut velocity = self.velocities.get(index);
            velocity.y -= delta_time * self.config.gravity * self.sizes[index];
            velocity *= self.config.friction;

            let speed = nalgebra_glm::length(&velocity);
            if speed > self.config.max_velocity {
                velocity *= self.config.max_velocity / speed;
            }

            let position = self.positions.get(index) + velocity;
            self.velocities.set(index, &velocity);
            self.positions.set(index, &position);
        }
    }

    // Pairs are visited in ascending (i, j) order with i < j.
    fn resolve_collisions(&mut self, first_free: usize) {
        let count = self.count();
        for index_a in first_free..count {
            for index_b in (index_a + 1)..count {
                let position_a = self.positions.get(index_a);
                let position_b = self.positions.get(index_b);
                let offset = position_b - position_a;
                let distance = nalgebra_glm::length(&offset);
                let sum_of_radii = self.sizes[index_a] + self.sizes[index_b];

                if distance >= sum_of_radii {
                    continue;
                }

                let overlap = sum_of_radii - distance;
                let correction =
                    contact_normal(&offset, distance) * (self.config.collision_split * overlap);

                let velocity_a = self.velocities.get(index_a);
                let velocity_b = self.velocities.get(index_b);
                let scale_a = nalgebra_glm::length(&velocity_a).max(self.config.collision_push_scale);
                let scale_b = nalgebra_glm::length(&velocity_b).max(self.config.collision_push_scale);

                self.positions.set(index_a, &(position_a - correction));
                self.velocities
                    .set(index_a, &(velocity_a - correction * scale_a));
                self.positions.set(index_b, &(position_b + correction));
                self.velocities
                    .set(index_b, &(velocity_b + correction * scale_b));
            }
        }
    }

    fn resolve_controller_collisions(&mut self) {
        let controller_position = self.positions.get(0);
        let controller_radius = self.sizes[0];

        for index in 1..self.count() {
            let position = self.positions.get(index);
            let offset = controller_position - position;
            let distance = nalgebra_glm::length(&offset);
            let sum_of_radii = self.sizes[index] + controller_radius;

            if distance >= sum_of_radii {
                continue;
            }

            let correction = contact_normal(&offset, distance) * (sum_of_radii - distance);
            let velocity = self.velocities.get(index);
            let scale = nalgebra_glm::length(&velocity).max(self.config.controller_push_scale);

            self.positions.set(index, &(position - correction));
            self.velocities.set(index, &(velocity - correction * scale));
        }
    }

    fn reflect_from_boundaries(&mut self, first_free: usize) {
        let wall_bounce = self.config.wall_bounce;
        let depth_boundary = self.config.depth_boundary();

        for index in first_free..self.count() {
            let radius = self.sizes[index];
            let mut position = self.positions.get(index);
            let mut velocity = self.velocities.get(index);

            // a body wider than the box rests on its center plane instead of crossing it
            let max_x = self.config.max_x.max(radius);
            let max_y = self.config.max_y.max(radius);
            let max_z = depth_boundary.max(radius);

            if position.x.abs() + radius > max_x {
                position.x = position.x.signum() * (max_x - radius);
                velocity.x = -velocity.x * wall_bounce;
            }

            if self.config.gravity == 0.0 {
                if position.y.abs() + radius > max_y {
                    position.y = position.y.signum() * (max_y - radius);
                    velocity.y = -velocity.y * wall_bounce;
                }
            } else if position.y - radius < -max_y {
                position.y = -max_y + radius;
                velocity.y = -velocity.y * wall_bounce;
            }

            if position.z.abs() + radius > max_z {
                position.z = position.z.signum() * (max_z - radius);
                velocity.z = -velocity.z * wall_bounce;
            }

            self.positions.set(index, &position);
            self.velocities.set(index, &velocity);
        }
    }
}

// Coincident centers get a fixed axis so the pair still separates.
fn contact_normal(offset: &nalgebra_glm::Vec3, distance: f32) -> nalgebra_glm::Vec3 {
    if distance > f32::EPSILON {
        offset / distance
    } else {
        nalgebra_glm::vec3(1.0, 0.0, 0.0)
    }
}
