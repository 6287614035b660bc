use cgmath::{InnerSpace, Matrix4 as Mat4, Point3, Vector3 as Vec3};

#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    aspect: f32,
    fovy: f32,
    mat: Mat4<f32>,
}

impl Frustum {
    /// fovy 为弧度
    #[rustfmt::skip]
    pub fn new(near: f32, aspect: f32, far: f32, fovy: f32) -> Self {
        let tan_half_fovy = (fovy / 2.0).tan();
        let a = 1.0 / (aspect * tan_half_fovy);
        let b = 1.0 / tan_half_fovy;
        let c = -(far + near) / (far - near);
        let d = -2.0 * far * near / (far - near);

        // 列主序
        let mat = Mat4::new(
            a,    0.0,   0.0,   0.0,
            0.0,  b,     0.0,   0.0,
            0.0,  0.0,   c,    -1.0,
            0.0,  0.0,   d,     0.0,
        );

        Self { aspect, fovy, mat }
    }

    pub fn get_mat(&self) -> &Mat4<f32> {
        &self.mat
    }
}

/// 透视相机。修改参数后需调用 `update_projection_matrix` 才会生效。
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    /// 垂直视角，单位为度
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3<f32>,
    pub target: Vec3<f32>,
    pub up: Vec3<f32>,
    frustum: Frustum,
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov,
            aspect,
            near,
            far,
            position: Vec3::new(0.0, 0.0, 0.0),
            target: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::new(0.0, 1.0, 0.0),
            frustum: Frustum::new(near, aspect, far, fov.to_radians()),
        }
    }

    pub fn set_position(&mut self, position: Vec3<f32>) {
        self.position = position;
    }

    pub fn look_at(&mut self, target: Vec3<f32>) {
        self.target = target;
    }

    pub fn update_projection_matrix(&mut self) {
        self.frustum = Frustum::new(self.near, self.aspect, self.far, self.fov.to_radians());
    }

    /// 参数已变但投影矩阵尚未重算
    #[cfg(test)]
    pub fn needs_projection_update(&self) -> bool {
        let current = Frustum::new(self.near, self.aspect, self.far, self.fov.to_radians());
        current.mat != self.frustum.mat
    }

    pub fn get_view_mat(&self) -> Mat4<f32> {
        let eye = Point3::new(self.position.x, self.position.y, self.position.z);
        let at = Point3::new(self.target.x, self.target.y, self.target.z);
        Mat4::look_at_rh(eye, at, self.up)
    }

    pub fn get_view_proj_mat(&self) -> Mat4<f32> {
        self.frustum.get_mat() * self.get_view_mat()
    }

    /// 相机的 (right, up, forward) 正交基，用于生成逐像素视线
    pub fn basis(&self) -> (Vec3<f32>, Vec3<f32>, Vec3<f32>) {
        let forward = (self.target - self.position).normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward);
        (right, up, forward)
    }

    /// NDC 坐标 (x, y ∈ [-1, 1]) 对应的世界空间视线方向，使用当前生效的投影
    pub fn ray_direction(&self, ndc_x: f32, ndc_y: f32) -> Vec3<f32> {
        let (right, up, forward) = self.basis();
        let tan_half = (self.frustum.fovy / 2.0).tan();
        let x = ndc_x * tan_half * self.frustum.aspect;
        let y = ndc_y * tan_half;
        (right * x + up * y + forward).normalize()
    }
}
