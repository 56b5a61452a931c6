// Simple particle struct to keep track of individual position, velocity, size and fade

use rand::Rng;
use vecmath::Vector2;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Particle {
    pub pos: Vector2<f64>,
    pub vel: Vector2<f64>,
    pub radius: f64,
    pub base_radius: f64,
    pub opacity: f64,
    pub base_opacity: f64,
}

impl Particle {
    pub const MIN_RADIUS: f64 = 0.5;
    pub const MAX_RADIUS: f64 = 2.0;
    pub const MIN_OPACITY: f64 = 0.1;
    pub const MAX_OPACITY: f64 = 0.45;

    pub fn new(pos: Vector2<f64>, vel: Vector2<f64>, radius: f64, opacity: f64) -> Particle {
        Particle {
            pos,
            vel,
            radius,
            base_radius: radius,
            opacity,
            base_opacity: opacity,
        }
    }

    // Uniform position on the surface, velocity per axis in [-speed/2, speed/2]
    pub fn random<R: Rng + ?Sized>(rng: &mut R, width: f64, height: f64, speed: f64) -> Particle {
        let pos = [rng.gen::<f64>() * width, rng.gen::<f64>() * height];
        let vel = [
            (rng.gen::<f64>() - 0.5) * speed,
            (rng.gen::<f64>() - 0.5) * speed,
        ];
        let radius = rng.gen::<f64>() * (Self::MAX_RADIUS - Self::MIN_RADIUS) + Self::MIN_RADIUS;
        let opacity =
            rng.gen::<f64>() * (Self::MAX_OPACITY - Self::MIN_OPACITY) + Self::MIN_OPACITY;
        Particle::new(pos, vel, radius, opacity)
    }
}
