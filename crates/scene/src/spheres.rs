/// Per-instance record uploaded to the GPU as-is.
#[repr(C)]
#[derive(Default, Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceBinding {
    pub model: nalgebra_glm::Mat4,
    pub color: nalgebra_glm::Vec4,
}

/// Instanced draw list mirroring the physics ensemble.
///
/// Capacity is fixed at allocation. A different body count needs [`InstancedSpheres::rebuild`].
#[derive(Debug, Clone)]
pub struct InstancedSpheres {
    instances: Vec<InstanceBinding>,
    follow_cursor: bool,
    dirty: bool,
    generation: u64,
    disposed: bool,
}

impl InstancedSpheres {
    pub fn new(count: usize, follow_cursor: bool) -> Self {
        Self {
            instances: vec![
                InstanceBinding {
                    model: nalgebra_glm::Mat4::identity(),
                    color: nalgebra_glm::vec4(1.0, 1.0, 1.0, 1.0),
                };
                count
            ],
            follow_cursor,
            dirty: true,
            generation: 0,
            disposed: false,
        }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn instances(&self) -> &[InstanceBinding] {
        &self.instances
    }

    pub fn follow_cursor(&self) -> bool {
        self.follow_cursor
    }

    /// Bumped every rebuild so a renderer knows to reallocate its instance buffer.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns whether an upload is pending and clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Copies body positions and radii into the instance transforms.
    ///
    /// Returns the lead body position so lights can follow it.
    pub fn sync_frame(&mut self, physics: &physics::Physics) -> Option<nalgebra_glm::Vec3> {
        if self.disposed {
            return None;
        }

        let count = self.instances.len().min(physics.count());
        for index in 0..count {
            let position = physics.positions().get(index);
            let scale = if index == 0 && !self.follow_cursor {
                0.0
            } else {
                physics.radius(index)
            };
            self.instances[index].model = nalgebra_glm::translation(&position)
                * nalgebra_glm::scaling(&nalgebra_glm::vec3(scale, scale, scale));
        }
        self.dirty = true;

        (count > 0).then(|| physics.positions().get(0))
    }

    /// Assigns instance `i` the gradient color at `i / count` and returns the lead color.
    pub fn set_colors(&mut self, gradient: &crate::ColorGradient) -> Option<nalgebra_glm::Vec3> {
        if self.disposed || self.instances.is_empty() {
            return None;
        }

        let count = self.instances.len() as f32;
        self.instances
            .iter_mut()
            .enumerate()
            .for_each(|(index, instance)| {
                let color = gradient.color_at(index as f32 / count);
                instance.color = nalgebra_glm::vec3_to_vec4(&color);
                instance.color.w = 1.0;
            });
        self.dirty = true;

        Some(self.instances[0].color.xyz())
    }

    /// Discards every instance and allocates `count` fresh ones.
    pub fn rebuild(&mut self, count: usize) {
        if self.disposed {
            return;
        }
        let generation = self.generation + 1;
        *self = Self::new(count, self.follow_cursor);
        self.generation = generation;
        log::debug!("Rebuilt instanced spheres with {count} instances");
    }

    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.instances = Vec::new();
        self.dirty = false;
        self.disposed = true;
    }
}
