use glam::{Mat4, Vec2, Vec3};

/// Fixed perspective camera looking down -Z.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::with_fov_degrees(75.0)
    }
}

impl Camera {
    pub fn with_fov_degrees(fov_degrees: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::new(0.0, 0.0, 0.0),
            fov_y: fov_degrees.to_radians(),
            near: 0.1,
            far: 1000.0,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect.max(f32::EPSILON), self.near, self.far)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// World-space ray through a cursor position given in physical pixels
    /// with a top-left origin.
    pub fn ray_through(&self, cursor: Vec2, viewport: (u32, u32)) -> Ray {
        let width = viewport.0.max(1) as f32;
        let height = viewport.1.max(1) as f32;
        let ndc_x = 2.0 * cursor.x / width - 1.0;
        let ndc_y = 1.0 - 2.0 * cursor.y / height;
        let inverse = self.view_projection(width / height).inverse();
        let near = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 0.0));
        let far = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
        Ray {
            origin: near,
            direction: (far - near).normalize_or_zero(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Placement of the unit cube mesh in the world.
#[derive(Debug, Clone, Copy)]
pub struct CubeTransform {
    pub position: Vec3,
    pub size: f32,
    pub scale: f32,
    pub rotation_y: f32,
}

impl CubeTransform {
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_y(self.rotation_y)
            * Mat4::from_scale(Vec3::splat(self.size * self.scale))
    }

    /// Distance along `ray` to the first hit on the cube, if any.
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        let to_local = self.model_matrix().inverse();
        let origin = to_local.transform_point3(ray.origin);
        let direction = to_local.transform_vector3(ray.direction);

        // Slab test against the unit cube [-0.5, 0.5]^3.
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;
        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];
            if d.abs() < f32::EPSILON {
                if !(-0.5..=0.5).contains(&o) {
                    return None;
                }
                continue;
            }
            let t1 = (-0.5 - o) / d;
            let t2 = (0.5 - o) / d;
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
        }
        if t_max < t_min.max(0.0) {
            return None;
        }
        // Local and world parameters agree because the direction was
        // transformed rather than renormalised.
        Some(t_min.max(0.0))
    }
}
