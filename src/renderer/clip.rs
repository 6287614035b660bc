use crate::vertex::ClipSpaceVertex;

pub trait Clipper {
    // 接收一个裁剪空间的三角形
    // 返回裁剪后剩下的零个或多个三角形
    fn clip_triangle(&self, triangle: &[ClipSpaceVertex; 3]) -> Vec<[ClipSpaceVertex; 3]>;
}

/// 只做整体取舍的近平面裁剪器：任一顶点越过近平面就丢弃整个三角形
pub struct NearPlaneClipper {
    pub near: f32,
}

impl Clipper for NearPlaneClipper {
    fn clip_triangle(&self, triangle: &[ClipSpaceVertex; 3]) -> Vec<[ClipSpaceVertex; 3]> {
        if triangle.iter().any(|v| v.position.w < self.near) {
            vec![]
        } else {
            vec![*triangle]
        }
    }
}
