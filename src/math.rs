use nalgebra_glm::{Mat4, Vec3};

pub fn deg_to_rad(deg: f32) -> f32 {
    deg / (180.0 / std::f32::consts::PI)
}

pub fn rad_to_deg(rad: f32) -> f32 {
    rad * (180.0 / std::f32::consts::PI)
}

/// Rotation from XYZ euler angles in degrees, applied X first, then Y, then Z.
pub fn euler_rotation(rotation: &Vec3) -> Mat4 {
    let rx = nalgebra_glm::rotation(deg_to_rad(rotation.x), &Vec3::new(1.0, 0.0, 0.0));
    let ry = nalgebra_glm::rotation(deg_to_rad(rotation.y), &Vec3::new(0.0, 1.0, 0.0));
    let rz = nalgebra_glm::rotation(deg_to_rad(rotation.z), &Vec3::new(0.0, 0.0, 1.0));

    rz * ry * rx
}

pub fn compose_trs(position: &Vec3, rotation: &Vec3, scale: &Vec3) -> Mat4 {
    nalgebra_glm::translation(position) * euler_rotation(rotation) * nalgebra_glm::scaling(scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra_glm::{vec3, vec4};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn degrees_round_trip() {
        assert!(approx(deg_to_rad(180.0), std::f32::consts::PI));
        assert!(approx(rad_to_deg(std::f32::consts::FRAC_PI_2), 90.0));
    }

    #[test]
    fn rotation_applies_x_before_z() {
        // +Y rotated 90 deg around X lands on +Z, which a Z rotation leaves alone.
        let m = euler_rotation(&vec3(90.0, 0.0, 90.0));
        let v = m * vec4(0.0, 1.0, 0.0, 0.0);

        assert!(approx(v.x, 0.0));
        assert!(approx(v.y, 0.0));
        assert!(approx(v.z, 1.0));
    }

    #[test]
    fn trs_scales_before_translating() {
        let m = compose_trs(&vec3(1.0, 2.0, 3.0), &Vec3::zeros(), &vec3(2.0, 2.0, 2.0));
        let p = m * vec4(1.0, 1.0, 1.0, 1.0);

        assert!(approx(p.x, 3.0));
        assert!(approx(p.y, 4.0));
        assert!(approx(p.z, 5.0));
    }
}
