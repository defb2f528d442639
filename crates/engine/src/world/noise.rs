//! Stateless lattice noise used by chunk generation.
//!
//! Both samplers hash integer lattice points with [`frand`] and interpolate
//! between them, so the same `(x, y)` always yields the same value. Chunks
//! rely on this to be regenerated byte-identically after eviction.

/// Largest value strictly below 1.0 in `f64`.
const BELOW_ONE: f64 = 1.0 - f64::EPSILON;

const HASH_X: f64 = 12.9898;
const HASH_Y: f64 = 78.233;
const HASH_SCALE: f64 = 43_758.545_3;

/// Hashed-sine pseudo-random value in `[0, 1)` for an integer lattice point.
pub fn frand(ix: i64, iy: i64) -> f64 {
    let seed = (ix as f64 * HASH_X + iy as f64 * HASH_Y).sin() * HASH_SCALE;
    clamp_unit(seed - seed.floor())
}

/// Bilinear interpolation of the four lattice corners around `(x, y)`.
pub fn value_noise(x: f64, y: f64) -> f64 {
    let (ix, fx) = split_lattice(x);
    let (iy, fy) = split_lattice(y);

    let top = lerp(frand(ix, iy), frand(ix + 1, iy), fx);
    let bottom = lerp(frand(ix, iy + 1), frand(ix + 1, iy + 1), fx);
    clamp_unit(lerp(top, bottom, fy))
}

/// Catmull-Rom interpolation across the 4x4 lattice neighborhood of `(x, y)`.
pub fn cubic_noise(x: f64, y: f64) -> f64 {
    let (ix, fx) = split_lattice(x);
    let (iy, fy) = split_lattice(y);

    let mut rows = [0.0f64; 4];
    for (row, dy) in rows.iter_mut().zip(-1i64..=2) {
        let ly = iy + dy;
        *row = catmull_rom(
            frand(ix - 1, ly),
            frand(ix, ly),
            frand(ix + 1, ly),
            frand(ix + 2, ly),
            fx,
        );
    }
    clamp_unit(catmull_rom(rows[0], rows[1], rows[2], rows[3], fy))
}

fn split_lattice(value: f64) -> (i64, f64) {
    let floor = value.floor();
    (floor as i64, value - floor)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn catmull_rom(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * (2.0 * p1
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

// Catmull-Rom overshoots its control points, and `fract` can round up to 1.0.
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, BELOW_ONE)
}
