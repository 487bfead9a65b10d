#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: nalgebra_glm::Vec3,
    pub direction: nalgebra_glm::Vec3,
}

/// Points `p` with `dot(normal, p) + constant == 0`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Plane {
    pub normal: nalgebra_glm::Vec3,
    pub constant: f32,
}

impl Ray {
    pub fn at(&self, distance: f32) -> nalgebra_glm::Vec3 {
        self.origin + self.direction * distance
    }

    /// `None` when the plane is parallel to or behind the ray.
    pub fn intersect_plane(&self, plane: &Plane) -> Option<nalgebra_glm::Vec3> {
        let origin_distance = nalgebra_glm::dot(&plane.normal, &self.origin) + plane.constant;
        let denominator = nalgebra_glm::dot(&plane.normal, &self.direction);

        if denominator.abs() <= f32::EPSILON {
            return (origin_distance == 0.0).then_some(self.origin);
        }

        let distance = -origin_distance / denominator;
        (distance >= 0.0).then(|| self.at(distance))
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Camera {
    pub position: nalgebra_glm::Vec3,
    pub target: nalgebra_glm::Vec3,
    pub up: nalgebra_glm::Vec3,
    /// Vertical field of view in degrees, as configured.
    pub base_fov: f32,
    /// Vertical field of view in degrees after aspect correction.
    pub fov: f32,
    pub aspect_ratio: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: nalgebra_glm::vec3(0.0, 0.0, 20.0),
            target: nalgebra_glm::Vec3::zeros(),
            up: nalgebra_glm::Vec3::y(),
            base_fov: 50.0,
            fov: 50.0,
            aspect_ratio: 1.0,
            z_near: 0.1,
            z_far: 100.0,
        }
    }
}

impl Camera {
    pub fn view_matrix(&self) -> nalgebra_glm::Mat4 {
        nalgebra_glm::look_at(&self.position, &self.target, &self.up)
    }

    pub fn projection_matrix(&self) -> nalgebra_glm::Mat4 {
        nalgebra_glm::perspective_zo(
            self.aspect_ratio,
            self.fov.to_radians(),
            self.z_near,
            self.z_far,
        )
    }

    pub fn direction(&self) -> nalgebra_glm::Vec3 {
        nalgebra_glm::normalize(&(self.target - self.position))
    }

    /// Sets the aspect ratio and narrows the field of view outside `[min_aspect, max_aspect]`.
    pub fn set_aspect_ratio(
        &mut self,
        aspect_ratio: f32,
        min_aspect: Option<f32>,
        max_aspect: Option<f32>,
    ) {
        self.aspect_ratio = aspect_ratio;
        self.fov = match (min_aspect, max_aspect) {
            (Some(min_aspect), _) if aspect_ratio < min_aspect => self.fov_for(min_aspect),
            (_, Some(max_aspect)) if aspect_ratio > max_aspect => self.fov_for(max_aspect),
            _ => self.base_fov,
        };
    }

    fn fov_for(&self, limit_aspect: f32) -> f32 {
        let tan_fov = (self.base_fov.to_radians() / 2.0).tan();
        let adjusted = tan_fov / (self.aspect_ratio / limit_aspect);
        2.0 * adjusted.atan().to_degrees()
    }

    /// Visible `(width, height)` in world units at the camera's distance from the origin.
    pub fn world_size(&self) -> (f32, f32) {
        let height = 2.0 * (self.fov.to_radians() / 2.0).tan() * nalgebra_glm::length(&self.position);
        (height * self.aspect_ratio, height)
    }

    /// Ray from the camera through a point in normalized device coordinates.
    pub fn ray(&self, ndc: &nalgebra_glm::Vec2) -> Ray {
        let inverse = nalgebra_glm::inverse(&(self.projection_matrix() * self.view_matrix()));
        let point = inverse * nalgebra_glm::vec4(ndc.x, ndc.y, 0.5, 1.0);
        let point = point.xyz() / point.w;
        Ray {
            origin: self.position,
            direction: nalgebra_glm::normalize(&(point - self.position)),
        }
    }

    pub fn frame_camera(&self) -> render::FrameCamera {
        render::FrameCamera {
            view: self.view_matrix(),
            projection: self.projection_matrix(),
            position: self.position,
        }
    }
}
