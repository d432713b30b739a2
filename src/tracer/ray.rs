use crate::util::Vec3;

/// 자기 자신과 다시 부딪히지 않도록 표면에서 띄우는 거리
pub const SURFACE_BIAS: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    // 전반사일 땐 0 벡터일 수도 있음
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// 표면 위의 `point`에서 `direction`으로 나가는 광선.
    /// 시작점은 광선이 나가는 쪽으로 법선을 따라 `SURFACE_BIAS`만큼 옮겨짐
    pub fn leaving_surface(point: Vec3, normal: Vec3, direction: Vec3) -> Self {
        let origin = if direction.dot(&normal) < 0.0 {
            point - normal * SURFACE_BIAS
        } else {
            point + normal * SURFACE_BIAS
        };

        Self { origin, direction }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bias_follows_direction_side() {
        let point = Vec3::new(0.0, 1.0, 0.0);
        let normal = Vec3::y();

        let outward = Ray::leaving_surface(point, normal, Vec3::new(0.0, 1.0, 0.0));
        assert!((outward.origin.y - (1.0 + SURFACE_BIAS)).abs() < 1e-6);

        let inward = Ray::leaving_surface(point, normal, Vec3::new(0.3, -1.0, 0.0));
        assert!((inward.origin.y - (1.0 - SURFACE_BIAS)).abs() < 1e-6);
    }

    #[test]
    fn test_at() {
        let ray = Ray::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(ray.at(2.0), Vec3::new(1.0, 2.0, 1.0));
    }
}
