use nalgebra::{Point3, Rotation3, Unit, Vector3};

const TETRAHEDRAL_ANGLE_DEG: f64 = 109.5;

pub fn rotation_to_align(from: &Vector3<f64>, to: &Vector3<f64>) -> Rotation3<f64> {
    Rotation3::rotation_between(from, to).unwrap_or_else(|| {
        // Antiparallel vectors: turn half a revolution about any perpendicular axis.
        Rotation3::from_axis_angle(&Unit::new_normalize(perpendicular(from)), std::f64::consts::PI)
    })
}

/// A unit vector orthogonal to `v`.
pub fn perpendicular(v: &Vector3<f64>) -> Vector3<f64> {
    let trial = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    (trial - v * v.dot(&trial) / v.norm_squared().max(f64::EPSILON)).normalize()
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

/// Positions for `count` new substituents bonded to `base`, arranged roughly
/// tetrahedrally around the bonds to `neighbors` that already exist.
pub fn place_substituents(
    base: &Point3<f64>,
    neighbors: &[Point3<f64>],
    count: usize,
    bond_length: f64,
) -> Vec<Point3<f64>> {
    let mut placed: Vec<Point3<f64>> = Vec::with_capacity(count);
    while placed.len() < count {
        let occupied: Vec<Point3<f64>> = neighbors.iter().chain(placed.iter()).copied().collect();
        let batch = substituent_slots(base, &occupied, bond_length);
        let remaining = count - placed.len();
        placed.extend(batch.into_iter().take(remaining));
    }
    placed
}

fn substituent_slots(
    base: &Point3<f64>,
    neighbors: &[Point3<f64>],
    bond_length: f64,
) -> Vec<Point3<f64>> {
    let dirs: Vec<Vector3<f64>> = neighbors
        .iter()
        .map(|p| p - base)
        .filter(|v| v.norm_squared() > f64::EPSILON)
        .map(|v| v.normalize())
        .collect();
    let tetrahedral = TETRAHEDRAL_ANGLE_DEG.to_radians();

    match dirs.as_slice() {
        [] => {
            let first = Vector3::x();
            let mut slots = vec![base + first * bond_length];
            slots.extend(substituent_slots(base, &slots.clone(), bond_length));
            slots
        }
        [n1] => {
            let axis = Unit::new_normalize(n1.cross(&perpendicular(n1)));
            let h1_dir = Rotation3::from_axis_angle(&axis, tetrahedral) * n1;
            let spin = Rotation3::from_axis_angle(&Unit::new_normalize(*n1), 120.0f64.to_radians());
            let h2_dir = spin * h1_dir;
            let h3_dir = spin * h2_dir;
            [h1_dir, h2_dir, h3_dir]
                .iter()
                .map(|d| base + d.normalize() * bond_length)
                .collect()
        }
        [n1, n2] => {
            let sum = n1 + n2;
            if sum.norm_squared() < 1e-8 {
                // Linear arrangement: fill the equatorial plane.
                let p = perpendicular(n1);
                return vec![base + p * bond_length, base - p * bond_length];
            }
            let bisector = -sum.normalize();
            let normal = n1.cross(n2).normalize();
            let half = tetrahedral / 2.0;
            [half, -half]
                .iter()
                .map(|angle| {
                    let dir = bisector * angle.cos() + normal * angle.sin();
                    base + dir.normalize() * bond_length
                })
                .collect()
        }
        _ => {
            let sum: Vector3<f64> = dirs.iter().sum();
            let dir = if sum.norm_squared() < 1e-8 {
                perpendicular(&dirs[0])
            } else {
                -sum.normalize()
            };
            vec![base + dir * bond_length]
        }
    }
}
