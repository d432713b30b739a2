use nalgebra::{Vector3, Vector4};

pub type Vec3 = Vector3<f32>;

// [diffuse, specular, reflect, refract] 가중치 전용. 합이 1일 필요 없음
pub type Vec4 = Vector4<f32>;

/// 굴절이 불가능할 때(전반사) `refract`가 돌려주는 방향.
/// 이 방향으로 쏜 광선은 아무것과도 만나지 않으니 그대로 배경색이 나옴
pub const NO_REFRACTION: Vec3 = Vec3::new(0.0, 0.0, 0.0);

// 이보다 짧은 벡터는 제곱 길이가 비정규화 수로 떨어짐
const DEGENERATE_LENGTH: f32 = 1e-19;

/// 길이가 거의 0인 벡터는 0 벡터로, 나머지는 단위 벡터로 만듦
pub fn normalize(v: Vec3) -> Vec3 {
    v.try_normalize(DEGENERATE_LENGTH).unwrap_or_else(Vec3::zeros)
}

/// 거울 반사. `normal`은 단위 벡터여야 함
pub fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - normal * 2.0 * incident.dot(&normal)
}

/// 스넬의 법칙. `incident`는 표면을 향해 들어가는 방향이고 바깥 매질은 진공(1.0)으로 봄
pub fn refract(incident: Vec3, normal: Vec3, refractive_index: f32) -> Vec3 {
    let mut cos_i = -incident.dot(&normal).clamp(-1.0, 1.0);
    let mut eta_i = 1.0;
    let mut eta_t = refractive_index;
    let mut n = normal;

    // 물체 안에서 밖으로 나가는 중이면 굴절률을 바꾸고 법선을 뒤집음
    if cos_i < 0.0 {
        cos_i = -cos_i;
        std::mem::swap(&mut eta_i, &mut eta_t);
        n = -normal;
    }

    let eta = eta_i / eta_t;
    let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
    if k < 0.0 {
        NO_REFRACTION
    } else {
        incident * eta + n * (eta * cos_i - k.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_vec(rng: &mut StdRng) -> Vec3 {
        Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        )
    }

    #[test]
    fn test_normalize_unit_length() {
        let v = normalize(Vec3::new(3.0, 4.0, 0.0));
        assert!((v.norm() - 1.0).abs() < 1e-6);
        assert!((v.x - 0.6).abs() < 1e-6);
        assert!((v.y - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_degenerate_is_zero() {
        assert_eq!(normalize(Vec3::zeros()), Vec3::zeros());
        assert_eq!(normalize(Vec3::new(1e-30, 0.0, 0.0)), Vec3::zeros());
    }

    #[test]
    fn test_reflect_negates_normal_component() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let normal = normalize(random_vec(&mut rng));
            if normal == Vec3::zeros() {
                continue;
            }
            let incident = random_vec(&mut rng);
            let reflected = reflect(incident, normal);

            assert!((reflected.dot(&normal) + incident.dot(&normal)).abs() < 1e-5);

            // 접선 성분은 그대로
            let tangent_in = incident - normal * incident.dot(&normal);
            let tangent_out = reflected - normal * reflected.dot(&normal);
            assert!((tangent_in - tangent_out).norm() < 1e-5);
        }
    }

    #[test]
    fn test_reflect_axis_aligned() {
        let reflected = reflect(Vec3::new(1.0, -1.0, 0.0), Vec3::y());
        assert_eq!(reflected, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_refract_same_index_does_not_bend() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let incident = normalize(random_vec(&mut rng));
            let normal = normalize(random_vec(&mut rng));
            if incident == Vec3::zeros() || normal == Vec3::zeros() {
                continue;
            }
            let refracted = refract(incident, normal, 1.0);
            assert!(
                (refracted - incident).norm() < 1e-5,
                "incident={incident:?} refracted={refracted:?}"
            );
        }
    }

    #[test]
    fn test_refract_bends_toward_normal_entering_glass() {
        let incident = normalize(Vec3::new(1.0, -1.0, 0.0));
        let refracted = normalize(refract(incident, Vec3::y(), 1.5));

        // 들어갈 때는 법선 쪽으로 꺾임: sin(t) = sin(i) / 1.5
        let sin_t = refracted.x;
        assert!((sin_t - incident.x / 1.5).abs() < 1e-5);
        assert!(refracted.y < 0.0);
    }

    #[test]
    fn test_refract_total_internal_reflection() {
        // 유리 안에서 표면을 거의 스치듯 나가는 광선
        let incident = normalize(Vec3::new(1.0, 0.1, 0.0));
        let refracted = refract(incident, Vec3::y(), 1.5);
        assert_eq!(refracted, NO_REFRACTION);
        assert_eq!(normalize(refracted), Vec3::zeros());
    }
}
