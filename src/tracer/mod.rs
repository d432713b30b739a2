use log::debug;
use rayon::prelude::*;
use web_time::Instant;

use crate::tracer::camera::Camera;
use crate::tracer::framebuffer::{Framebuffer, RenderError};
use crate::tracer::ray::Ray;
use crate::tracer::scene::{Hit, Material, Scene};
use crate::util::{normalize, reflect, refract, Vec3};

pub mod camera;
pub mod framebuffer;
pub mod ray;
pub mod scene;

/// 아무것도 안 맞았을 때의 색
pub const BACKGROUND: Vec3 = Vec3::new(0.2, 0.7, 0.8);

/// 이 깊이를 넘는 광선은 추적하지 않고 배경색을 돌려줌. 0~4까지 다섯 단계
pub const MAX_DEPTH: usize = 4;

#[derive(Default)]
pub struct Settings {
    // 반사/굴절 가중치가 정확히 0인 재질은 그쪽 광선을 안 쏨
    pub skip_dead_bounces: bool,
}

#[derive(Default)]
pub struct Tracer {
    pub settings: Settings,
}

impl Tracer {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// 장면 전체를 새 프레임버퍼에 그림.
    /// 렌더링하는 동안 장면은 읽기만 하고, 카메라 값은 시작할 때 한 번 복사해둠
    pub fn render(&self, scene: &Scene) -> Result<Framebuffer, RenderError> {
        let started = Instant::now();
        let camera = Camera::from_scene(scene)?;
        let mut framebuffer = Framebuffer::new(camera.width, camera.height)?;

        // 픽셀끼리 공유하는 상태가 없으니 줄 단위로 그냥 나눠서 돌림
        framebuffer
            .par_rows_mut()
            .enumerate()
            .for_each(|(y, row)| {
                for (x, pixel) in row.iter_mut().enumerate() {
                    let ray = camera.primary_ray(x as u32, y as u32);
                    *pixel = self.cast_ray(scene, &ray, 0);
                }
            });

        debug!(
            "{}x{} 프레임 렌더링 {:?} (구 {}개, 조명 {}개)",
            camera.width,
            camera.height,
            started.elapsed(),
            scene.spheres.len(),
            scene.lights.len()
        );

        Ok(framebuffer)
    }

    // DirectX의 ClosestHit + Miss 쉐이더를 합친 것과 같음
    pub fn cast_ray(&self, scene: &Scene, ray: &Ray, depth: usize) -> Vec3 {
        if depth > MAX_DEPTH {
            return BACKGROUND;
        }
        let Some(hit) = scene.intersect(ray) else {
            return BACKGROUND;
        };

        let material = hit.surface.material();
        let reflect_color = self.bounce(scene, &hit, material.albedo[2], depth, || {
            normalize(reflect(ray.direction, hit.normal))
        });
        let refract_color = self.bounce(scene, &hit, material.albedo[3], depth, || {
            normalize(refract(ray.direction, hit.normal, material.refractive_index))
        });

        let (diffuse, specular) = direct_lighting(scene, ray, &hit, &material);

        material.diffuse_color * diffuse * material.albedo[0]
            + Vec3::repeat(1.0) * specular * material.albedo[1]
            + reflect_color * material.albedo[2]
            + refract_color * material.albedo[3]
    }

    // 반사나 굴절 광선 하나를 다음 깊이로 추적
    fn bounce<F>(&self, scene: &Scene, hit: &Hit, weight: f32, depth: usize, direction: F) -> Vec3
    where
        F: FnOnce() -> Vec3,
    {
        if self.settings.skip_dead_bounces && weight == 0.0 {
            return Vec3::zeros();
        }

        let ray = Ray::leaving_surface(hit.point, hit.normal, direction());
        self.cast_ray(scene, &ray, depth + 1)
    }
}

/// 모든 조명에서 받는 (확산, 정반사) 세기. 그림자 안에 있는 조명은 통째로 빠짐
pub fn direct_lighting(scene: &Scene, ray: &Ray, hit: &Hit, material: &Material) -> (f32, f32) {
    let mut diffuse = 0.0;
    let mut specular = 0.0;

    for light in &scene.lights {
        let to_light = light.position - hit.point;
        let light_direction = normalize(to_light);
        let light_distance = to_light.norm();

        let shadow_ray = Ray::leaving_surface(hit.point, hit.normal, light_direction);
        if let Some(blocker) = scene.intersect(&shadow_ray) {
            if (blocker.point - shadow_ray.origin).norm() < light_distance {
                continue;
            }
        }

        diffuse += light.intensity * light_direction.dot(&hit.normal).max(0.0);

        let highlight = -reflect(-light_direction, hit.normal);
        specular += highlight
            .dot(&ray.direction)
            .max(0.0)
            .powf(material.specular_exponent)
            * light.intensity;
    }

    (diffuse, specular)
}
