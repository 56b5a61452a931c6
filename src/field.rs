// The particle simulation itself: a fixed set of particles bouncing inside a
// surface, nudged away from the pointer, linked by lines when close together.
// Nothing here touches the browser.

use crate::config::Settings;
use crate::particle::Particle;
use rand::Rng;
use vecmath::Vector2;

// Line between two particles closer than the connection distance.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Connection {
    pub from: Vector2<f64>,
    pub to: Vector2<f64>,
    pub opacity: f64,
}

#[derive(Clone, Debug, Default)]
pub struct ParticleField {
    width: f64,
    height: f64,
    particles: Vec<Particle>,
    pointer: Option<Vector2<f64>>,
}

impl ParticleField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[cfg(test)]
    pub(crate) fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn pointer(&self) -> Option<Vector2<f64>> {
        self.pointer
    }

    pub fn set_pointer(&mut self, x: f64, y: f64) {
        if x.is_finite() && y.is_finite() {
            self.pointer = Some([x, y]);
        }
    }

    pub fn clear_pointer(&mut self) {
        self.pointer = None;
    }

    // Discards every particle and spawns `settings.particle_count` new ones
    // scattered over a `width` x `height` surface.
    pub fn reset<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        width: f64,
        height: f64,
        settings: &Settings,
    ) {
        self.width = width;
        self.height = height;
        self.particles.clear();
        self.particles.reserve(settings.particle_count);
        for _ in 0..settings.particle_count {
            self.particles
                .push(Particle::random(rng, width, height, settings.speed));
        }
    }

    // Advances every particle by one frame.
    pub fn update(&mut self, settings: &Settings) {
        let (width, height) = (self.width, self.height);
        let pointer = if settings.pointer_repulsion {
            self.pointer
        } else {
            None
        };

        for particle in &mut self.particles {
            particle.pos = vecmath::vec2_add(particle.pos, particle.vel);

            // Elastic bounce: flip the axis that left the surface, then pull back in
            if particle.pos[0] < 0.0 || particle.pos[0] > width {
                particle.vel[0] *= -1.0;
            }
            if particle.pos[1] < 0.0 || particle.pos[1] > height {
                particle.vel[1] *= -1.0;
            }
            clamp_to_surface(particle, width, height);

            if let Some(pointer) = pointer {
                repel(particle, pointer, settings.mouse_radius);
                clamp_to_surface(particle, width, height);
            }
        }
    }

    // Every unordered pair closer than the connection distance, faded by distance.
    pub fn connections(&self, connection_distance: f64) -> Vec<Connection> {
        let mut connections = Vec::new();
        for (i, a) in self.particles.iter().enumerate() {
            for b in &self.particles[i + 1..] {
                let distance = vecmath::vec2_len(vecmath::vec2_sub(a.pos, b.pos));
                if let Some(opacity) = connection_opacity(distance, connection_distance) {
                    connections.push(Connection {
                        from: a.pos,
                        to: b.pos,
                        opacity,
                    });
                }
            }
        }
        connections
    }
}

// Line opacity for two particles `distance` apart, `None` at or past the threshold.
pub fn connection_opacity(distance: f64, connection_distance: f64) -> Option<f64> {
    if distance < connection_distance {
        Some((1.0 - distance / connection_distance) * Settings::LINE_DIMMING)
    } else {
        None
    }
}

fn clamp_to_surface(particle: &mut Particle, width: f64, height: f64) {
    particle.pos[0] = particle.pos[0].max(0.0).min(width);
    particle.pos[1] = particle.pos[1].max(0.0).min(height);
}

// Positional nudge rather than a velocity change, so it stops with the pointer
fn repel(particle: &mut Particle, pointer: Vector2<f64>, mouse_radius: f64) {
    let away = vecmath::vec2_sub(particle.pos, pointer);
    let distance = vecmath::vec2_len(away);
    if distance > 0.0 && distance < mouse_radius {
        let force = (mouse_radius - distance) / mouse_radius;
        let push = vecmath::vec2_scale(away, force * Settings::PUSH_FACTOR / distance);
        particle.pos = vecmath::vec2_add(particle.pos, push);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceProfile;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn settings(count: usize, connection_distance: f64) -> Settings {
        let mut settings = Settings::for_device(&DeviceProfile::desktop());
        settings.particle_count = count;
        settings.connection_distance = connection_distance;
        settings
    }

    fn field_with(particles: Vec<Particle>, width: f64, height: f64) -> ParticleField {
        ParticleField {
            width,
            height,
            particles,
            pointer: None,
        }
    }

    fn still(x: f64, y: f64) -> Particle {
        Particle::new([x, y], [0.0, 0.0], 1.0, 0.3)
    }

    fn distance(a: Vector2<f64>, b: Vector2<f64>) -> f64 {
        vecmath::vec2_len(vecmath::vec2_sub(a, b))
    }

    fn in_bounds(field: &ParticleField) -> bool {
        field.particles().iter().all(|p| {
            p.pos[0] >= 0.0 && p.pos[0] <= field.width() && p.pos[1] >= 0.0 && p.pos[1] <= field.height()
        })
    }

    #[test]
    fn reset_spawns_exactly_the_configured_count() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut field = ParticleField::new();
        field.reset(&mut rng, 300.0, 300.0, &settings(10, 90.0));
        assert_eq!(field.particles().len(), 10);
        assert!(in_bounds(&field));

        field.reset(&mut rng, 200.0, 100.0, &settings(4, 90.0));
        assert_eq!(field.particles().len(), 4);
        assert_eq!((field.width(), field.height()), (200.0, 100.0));
        assert!(in_bounds(&field));
    }

    #[test]
    fn particles_stay_in_bounds_over_many_steps() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut config = settings(10, 90.0);
        config.speed = 25.0;
        let mut field = ParticleField::new();
        field.reset(&mut rng, 300.0, 300.0, &config);

        for _ in 0..100 {
            field.update(&config);
            assert!(in_bounds(&field));
        }
        assert_eq!(field.particles().len(), 10);
    }

    #[test]
    fn bounces_off_each_edge() {
        let cases = vec![
            ([0.1, 50.0], [-0.5, 0.0]),
            ([99.9, 50.0], [0.5, 0.0]),
            ([50.0, 0.1], [0.0, -0.5]),
            ([50.0, 99.9], [0.0, 0.5]),
        ];
        for (pos, vel) in cases {
            let mut field = field_with(vec![Particle::new(pos, vel, 1.0, 0.3)], 100.0, 100.0);
            field.update(&settings(1, 90.0));
            let p = field.particles()[0];
            assert_eq!(p.vel, [-vel[0], -vel[1]]);
            assert!(in_bounds(&field));
        }
    }

    #[test]
    fn particle_sitting_on_the_wall_turns_around_next_step() {
        let mut field = field_with(vec![Particle::new([0.0, 10.0], [-0.2, 0.0], 1.0, 0.3)], 50.0, 50.0);
        field.update(&settings(1, 90.0));
        assert!(field.particles()[0].vel[0] > 0.0);
        assert_eq!(field.particles()[0].pos[0], 0.0);
    }

    #[test]
    fn connection_drawn_only_below_threshold() {
        assert!(connection_opacity(89.9, 90.0).is_some());
        assert_eq!(connection_opacity(90.0, 90.0), None);
        assert_eq!(connection_opacity(120.0, 90.0), None);
        assert_eq!(connection_opacity(0.0, 90.0), Some(Settings::LINE_DIMMING));
    }

    #[test]
    fn connection_fades_with_distance() {
        let mut previous = connection_opacity(0.0, 90.0).unwrap();
        for step in 1..90 {
            let opacity = connection_opacity(step as f64, 90.0).unwrap();
            assert!(opacity < previous);
            previous = opacity;
        }
    }

    #[test]
    fn connections_cover_unordered_pairs_once() {
        let field = field_with(
            vec![still(0.0, 0.0), still(30.0, 0.0), still(60.0, 0.0), still(250.0, 250.0)],
            300.0,
            300.0,
        );
        let connections = field.connections(90.0);
        // (0,1) at 30, (0,2) at 60, (1,2) at 30; the far particle links nothing
        assert_eq!(connections.len(), 3);
        assert!(connections.iter().all(|c| c.to != [250.0, 250.0] && c.from != [250.0, 250.0]));
    }

    #[test]
    fn pointer_pushes_nearby_particles_away() {
        let mut field = field_with(vec![still(150.0, 150.0)], 300.0, 300.0);
        field.set_pointer(130.0, 150.0);
        let before = distance(field.particles()[0].pos, [130.0, 150.0]);

        field.update(&settings(1, 90.0));

        let after = distance(field.particles()[0].pos, [130.0, 150.0]);
        assert!(after > before);
        // Straight along the pointer-particle axis
        assert_eq!(field.particles()[0].pos[1], 150.0);
        // Velocity untouched
        assert_eq!(field.particles()[0].vel, [0.0, 0.0]);
    }

    #[test]
    fn pointer_ignored_when_absent_distant_or_disabled() {
        let config = settings(1, 90.0);

        let mut field = field_with(vec![still(150.0, 150.0)], 300.0, 300.0);
        field.update(&config);
        assert_eq!(field.particles()[0].pos, [150.0, 150.0]);

        field.set_pointer(10.0, 10.0);
        field.update(&config);
        assert_eq!(field.particles()[0].pos, [150.0, 150.0]);

        let mut touch = Settings::for_device(&DeviceProfile::mobile());
        touch.particle_count = 1;
        field.set_pointer(140.0, 150.0);
        field.update(&touch);
        assert_eq!(field.particles()[0].pos, [150.0, 150.0]);
    }

    #[test]
    fn pointer_on_top_of_particle_does_nothing() {
        let mut field = field_with(vec![still(40.0, 40.0)], 100.0, 100.0);
        field.set_pointer(40.0, 40.0);
        field.update(&settings(1, 90.0));
        assert_eq!(field.particles()[0].pos, [40.0, 40.0]);
    }

    #[test]
    fn push_cannot_escape_the_surface() {
        let mut field = field_with(vec![still(0.5, 50.0)], 100.0, 100.0);
        field.set_pointer(5.0, 50.0);
        field.update(&settings(1, 90.0));
        assert!(in_bounds(&field));
        assert_eq!(field.particles()[0].pos[0], 0.0);
    }

    #[test]
    fn clearing_pointer_stops_repulsion() {
        let mut field = field_with(vec![still(50.0, 50.0)], 100.0, 100.0);
        field.set_pointer(45.0, 50.0);
        field.clear_pointer();
        assert_eq!(field.pointer(), None);
        field.update(&settings(1, 90.0));
        assert_eq!(field.particles()[0].pos, [50.0, 50.0]);
    }

    #[test]
    fn non_finite_pointer_is_rejected() {
        let mut field = ParticleField::new();
        field.set_pointer(f64::NAN, 3.0);
        assert_eq!(field.pointer(), None);
    }
}
