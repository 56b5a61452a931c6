// Device capabilities and the animation settings derived from them.
//
// Platform detection happens in the web glue; everything here only sees the
// resulting `DeviceProfile`, so profiles can be injected directly in tests.

pub const MAX_PIXEL_RATIO: f64 = 2.0;
pub const RESIZE_DEBOUNCE_MS: i32 = 150;

const MOBILE_USER_AGENTS: [&str; 8] = [
    "android",
    "webos",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

const MAX_PARTICLE_COUNT: usize = 400;
const MAX_DISTANCE: f64 = 1000.0;
const MAX_SPEED: f64 = 10.0;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DeviceProfile {
    // Phones and tablets: fewer, slower particles and no pointer repulsion.
    pub is_small_or_touch: bool,
    pub prefers_reduced_motion: bool,
    pub pixel_ratio: f64,
}

impl DeviceProfile {
    pub fn desktop() -> Self {
        DeviceProfile {
            is_small_or_touch: false,
            prefers_reduced_motion: false,
            pixel_ratio: 1.0,
        }
    }

    pub fn mobile() -> Self {
        DeviceProfile {
            is_small_or_touch: true,
            ..Self::desktop()
        }
    }

    pub fn from_signals(user_agent: &str, prefers_reduced_motion: bool, pixel_ratio: f64) -> Self {
        DeviceProfile {
            is_small_or_touch: is_mobile_user_agent(user_agent),
            prefers_reduced_motion,
            pixel_ratio,
        }
    }

    // Backing store scale factor, capped so high density screens don't pay 3x-4x fill cost.
    pub fn effective_pixel_ratio(&self) -> f64 {
        if self.pixel_ratio.is_finite() && self.pixel_ratio > 0.0 {
            self.pixel_ratio.min(MAX_PIXEL_RATIO)
        } else {
            1.0
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Settings {
    pub particle_count: usize,
    pub connection_distance: f64,
    pub mouse_radius: f64,
    // Upper bound of the per-axis velocity range at creation, centred on zero.
    pub speed: f64,
    pub pointer_repulsion: bool,
}

impl Settings {
    pub const PUSH_FACTOR: f64 = 1.2;
    pub const LINE_DIMMING: f64 = 0.08;
    pub const LINE_WIDTH: f64 = 0.5;

    pub fn for_device(profile: &DeviceProfile) -> Self {
        if profile.is_small_or_touch {
            Settings {
                particle_count: 25,
                connection_distance: 70.0,
                mouse_radius: 100.0,
                speed: 0.15,
                pointer_repulsion: false,
            }
        } else {
            Settings {
                particle_count: 45,
                connection_distance: 90.0,
                mouse_radius: 100.0,
                speed: 0.25,
                pointer_repulsion: true,
            }
        }
    }

    pub fn set_particle_count(&mut self, count: usize) {
        self.particle_count = count.min(MAX_PARTICLE_COUNT);
    }

    pub fn set_connection_distance(&mut self, distance: f64) {
        self.connection_distance = clamp_or_zero(distance, MAX_DISTANCE);
    }

    pub fn set_mouse_radius(&mut self, radius: f64) {
        self.mouse_radius = clamp_or_zero(radius, MAX_DISTANCE);
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = clamp_or_zero(speed, MAX_SPEED);
    }
}

pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    let user_agent = user_agent.to_lowercase();
    MOBILE_USER_AGENTS
        .iter()
        .any(|needle| user_agent.contains(needle))
}

fn clamp_or_zero(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.max(0.0).min(max)
    }
}
