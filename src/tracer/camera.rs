use crate::tracer::framebuffer::RenderError;
use crate::tracer::ray::Ray;
use crate::tracer::scene::Scene;
use crate::util::{normalize, Vec3};

/// scale이 1일 때의 센서 크기
pub const BASE_WIDTH: u32 = 32;
pub const BASE_HEIGHT: u32 = 24;

/// 한 프레임 동안 고정되는 카메라.
/// 렌더링을 나눠서 돌리기 전에 장면에서 값으로 복사해옴
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub field_of_view: f32,
    pub width: u32,
    pub height: u32,
}

impl Camera {
    /// 센서 크기가 u32를 넘어가는 scale이면 `RenderError::Overflow`
    pub fn from_scene(scene: &Scene) -> Result<Self, RenderError> {
        let scale = scene.scale.max(1);
        let (Some(width), Some(height)) = (
            BASE_WIDTH.checked_mul(scale),
            BASE_HEIGHT.checked_mul(scale),
        ) else {
            return Err(RenderError::Overflow {
                width: BASE_WIDTH.saturating_mul(scale),
                height: BASE_HEIGHT.saturating_mul(scale),
            });
        };

        Ok(Self {
            position: scene.camera_position,
            field_of_view: scene.field_of_view,
            width,
            height,
        })
    }

    // 카메라는 언제나 -z 방향을 바라봄
    pub fn primary_ray(&self, x: u32, y: u32) -> Ray {
        let width = f64::from(self.width);
        let height = f64::from(self.height);
        let half_extent = (f64::from(self.field_of_view) / 2.0).tan();

        let sensor_x = (2.0 * (f64::from(x) + 0.5) / width - 1.0) * half_extent * width / height;
        let sensor_y = -(2.0 * (f64::from(y) + 0.5) / height - 1.0) * half_extent;

        let direction = normalize(Vec3::new(sensor_x as f32, sensor_y as f32, -1.0));
        Ray::new(self.position, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_follows_scale() {
        let mut scene = Scene::default();
        scene.scale = 3;
        let camera = Camera::from_scene(&scene).unwrap();
        assert_eq!((camera.width, camera.height), (96, 72));

        scene.scale = 0;
        let camera = Camera::from_scene(&scene).unwrap();
        assert_eq!((camera.width, camera.height), (32, 24));
    }

    #[test]
    fn test_oversized_scale_is_an_error() {
        let scene = Scene {
            scale: 200_000_000,
            ..Scene::empty()
        };
        assert!(matches!(
            Camera::from_scene(&scene),
            Err(RenderError::Overflow { .. })
        ));

        // 가로만 넘치는 경계
        let scene = Scene {
            scale: u32::MAX / BASE_WIDTH + 1,
            ..Scene::empty()
        };
        assert!(Camera::from_scene(&scene).is_err());
    }

    #[test]
    fn test_primary_rays_are_unit_and_look_forward() {
        let mut scene = Scene::default();
        scene.scale = 1;
        let camera = Camera::from_scene(&scene).unwrap();

        for (x, y) in [(0, 0), (31, 0), (0, 23), (31, 23), (16, 12)] {
            let ray = camera.primary_ray(x, y);
            assert_eq!(ray.origin, scene.camera_position);
            assert!((ray.direction.norm() - 1.0).abs() < 1e-6);
            assert!(ray.direction.z < 0.0);
        }
    }

    #[test]
    fn test_primary_rays_are_symmetric() {
        let mut scene = Scene::default();
        scene.scale = 1;
        let camera = Camera::from_scene(&scene).unwrap();

        let top_left = camera.primary_ray(0, 0).direction;
        let bottom_right = camera.primary_ray(31, 23).direction;
        assert!(top_left.x < 0.0 && top_left.y > 0.0);
        assert!((top_left.x + bottom_right.x).abs() < 1e-6);
        assert!((top_left.y + bottom_right.y).abs() < 1e-6);
    }

    #[test]
    fn test_field_of_view_spans_sensor() {
        let scene = Scene {
            scale: 1,
            field_of_view: std::f32::consts::FRAC_PI_2,
            ..Scene::empty()
        };
        let camera = Camera::from_scene(&scene).unwrap();

        // 90도 시야각이면 맨 위 픽셀 중심은 tan(45도) = 1 에 거의 닿음
        let top = camera.primary_ray(16, 0).direction;
        let expected = 1.0 - 1.0 / 24.0;
        assert!((top.y / -top.z - expected).abs() < 1e-5);
    }
}
