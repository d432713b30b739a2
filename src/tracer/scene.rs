use std::f32::consts::PI;

use crate::tracer::ray::Ray;
use crate::util::{normalize, Vec3, Vec4, NO_REFRACTION};

/// 이 거리 이상에서 만난 건 안 만난 걸로 침
pub const MAX_SCENE_DISTANCE: f32 = 1000.0;

/// 체커보드 바닥의 높이. 바닥은 y = -4 평면
pub const CHECKERBOARD_Y: f32 = -4.0;

// 이보다 수평에 가까운 광선은 바닥과 평행하다고 봄
const PARALLEL_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub refractive_index: f32,
    pub albedo: Vec4,
    pub diffuse_color: Vec3,
    pub specular_exponent: f32,
}

impl Material {
    pub fn new(refractive_index: f32, albedo: Vec4, diffuse_color: Vec3, specular_exponent: f32) -> Self {
        Self {
            refractive_index,
            albedo,
            diffuse_color,
            specular_exponent,
        }
    }

    pub fn ivory() -> Self {
        Self::new(1.0, Vec4::new(0.6, 0.3, 0.1, 0.0), Vec3::new(0.4, 0.4, 0.3), 50.0)
    }

    pub fn glass() -> Self {
        Self::new(1.5, Vec4::new(0.0, 0.5, 0.1, 0.8), Vec3::new(0.6, 0.7, 0.8), 125.0)
    }

    pub fn red_rubber() -> Self {
        Self::new(1.0, Vec4::new(0.9, 0.1, 0.0, 0.0), Vec3::new(0.3, 0.1, 0.1), 10.0)
    }

    pub fn mirror() -> Self {
        Self::new(1.0, Vec4::new(0.0, 10.0, 0.8, 0.0), Vec3::new(1.0, 1.0, 1.0), 1425.0)
    }
}

// 색이 없는 순수 확산 재질. 체커보드가 색만 바꿔서 씀
impl Default for Material {
    fn default() -> Self {
        Self::new(1.0, Vec4::new(1.0, 0.0, 0.0, 0.0), Vec3::zeros(), 0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    pub material: Material,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32, material: Material) -> Self {
        Self {
            center,
            radius,
            material,
        }
    }

    /// 광선이 구와 처음 만나는 거리. 시작점이 구 안이면 나가는 쪽 거리를 돌려줌.
    /// 접하는 광선도 만난 걸로 침
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        let to_center = self.center - ray.origin;
        let tca = to_center.dot(&ray.direction);
        let d2 = to_center.dot(&to_center) - tca * tca;
        let radius2 = self.radius * self.radius;
        if d2 > radius2 {
            return None;
        }

        let thc = (radius2 - d2).sqrt();
        let mut t0 = tca - thc;
        let t1 = tca + thc;
        if t0 < 0.0 {
            t0 = t1;
        }

        if t0 < 0.0 {
            None
        } else {
            Some(t0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Vec3,
    pub intensity: f32,
}

impl Light {
    pub fn new(position: Vec3, intensity: f32) -> Self {
        Self {
            position,
            intensity,
        }
    }
}

/// 광선이 부딪힌 표면.
/// 구는 자기 재질을 빌려주고 체커보드는 맞은 위치로 색을 그때그때 만듦
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitSurface<'a> {
    Sphere(&'a Material),
    Checkerboard { diffuse_color: Vec3 },
}

impl HitSurface<'_> {
    /// 셰이딩에 쓸 재질
    pub fn material(&self) -> Material {
        match self {
            HitSurface::Sphere(material) => **material,
            HitSurface::Checkerboard { diffuse_color } => Material {
                diffuse_color: *diffuse_color,
                ..Material::default()
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit<'a> {
    pub distance: f32,
    pub point: Vec3,
    pub normal: Vec3,
    pub surface: HitSurface<'a>,
}

/// 체커보드 칸의 홀짝. 1이면 흰 칸
pub fn checkerboard_parity(x: f32, z: f32) -> i64 {
    let column = (0.5 * f64::from(x) + 1000.0).floor() as i64;
    let row = (0.5 * f64::from(z)).floor() as i64;
    (column + row) & 1
}

/// 체커보드 위 한 점의 색. 두 색 모두 0.3배로 어둡게 칠함
pub fn checkerboard_color(point: &Vec3) -> Vec3 {
    let base = if checkerboard_parity(point.x, point.z) == 1 {
        Vec3::new(1.0, 1.0, 1.0)
    } else {
        Vec3::new(1.0, 0.7, 0.3)
    };
    base * 0.3
}

/// 한 프레임 동안 렌더러가 읽기 전용으로 빌려가는 장면.
/// 구, 조명, 렌더링 설정값은 프레임 사이에 UI가 고침
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub spheres: Vec<Sphere>,
    pub lights: Vec<Light>,
    // 내부 해상도 = 32*scale x 24*scale
    pub scale: u32,
    // 세로 시야각, 라디안
    pub field_of_view: f32,
    pub camera_position: Vec3,
}

impl Default for Scene {
    fn default() -> Self {
        let spheres = vec![
            Sphere::new(Vec3::new(-3.0, 0.0, -16.0), 2.0, Material::ivory()),
            Sphere::new(Vec3::new(-1.0, -1.5, -12.0), 2.0, Material::glass()),
            Sphere::new(Vec3::new(1.5, -0.5, -18.0), 3.0, Material::red_rubber()),
            Sphere::new(Vec3::new(7.0, 5.0, -18.0), 4.0, Material::mirror()),
        ];

        let lights = vec![
            Light::new(Vec3::new(-20.0, 20.0, 20.0), 1.5),
            Light::new(Vec3::new(30.0, 50.0, -25.0), 1.8),
            Light::new(Vec3::new(30.0, 20.0, 30.0), 1.7),
        ];

        Self {
            spheres,
            lights,
            scale: 15,
            field_of_view: PI / 3.0,
            camera_position: Vec3::new(0.0, 2.0, 0.0),
        }
    }
}

impl Scene {
    /// 구도 조명도 없는 장면. 바닥은 언제나 있음
    pub fn empty() -> Self {
        Self {
            spheres: vec![],
            lights: vec![],
            ..Default::default()
        }
    }

    /// 광선과 가장 가까이서 만나는 표면
    pub fn intersect(&self, ray: &Ray) -> Option<Hit<'_>> {
        // 굴절 못 한 광선은 어디에도 안 닿음
        if ray.direction == NO_REFRACTION {
            return None;
        }

        let mut nearest: Option<Hit> = None;
        let mut spheres_distance = f32::MAX;
        for sphere in &self.spheres {
            let Some(distance) = sphere.intersect(ray) else {
                continue;
            };
            if distance >= spheres_distance {
                continue;
            }

            spheres_distance = distance;
            let point = ray.at(distance);
            nearest = Some(Hit {
                distance,
                point,
                normal: normalize(point - sphere.center),
                surface: HitSurface::Sphere(&sphere.material),
            });
        }

        let mut checkerboard_distance = f32::MAX;
        if ray.direction.y.abs() > PARALLEL_EPSILON {
            let distance = -(ray.origin.y - CHECKERBOARD_Y) / ray.direction.y;
            let point = ray.at(distance);

            // 바닥은 카메라 앞쪽의 유한한 판: |x| < 10, -30 < z < -10
            if distance > 0.0
                && point.x.abs() < 10.0
                && point.z < -10.0
                && point.z > -30.0
                && distance < spheres_distance
            {
                checkerboard_distance = distance;
                nearest = Some(Hit {
                    distance,
                    point,
                    normal: Vec3::y(),
                    surface: HitSurface::Checkerboard {
                        diffuse_color: checkerboard_color(&point),
                    },
                });
            }
        }

        if spheres_distance.min(checkerboard_distance) < MAX_SCENE_DISTANCE {
            nearest
        } else {
            None
        }
    }
}
