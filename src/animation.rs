// Lifecycle of the animated background: mounting, the frame loop, pausing while
// the page is hidden, debounced resizes, pointer tracking and teardown.
//
// Everything the browser provides goes through `Host`, and drawing goes
// through `DrawTarget`, so the whole state machine runs in native tests.

use crate::config::{DeviceProfile, Settings, RESIZE_DEBOUNCE_MS};
use crate::field::ParticleField;
use crate::log;
use crate::renderer::{DrawTarget, Renderer};
use rand::Rng;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameHandle(pub i32);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimeoutHandle(pub i32);

// Logical (css pixel) size of the area the animation should fill.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SurfaceSize {
    pub width: f64,
    pub height: f64,
}

impl SurfaceSize {
    fn is_drawable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

pub trait Host {
    // Current size of the container, `None` when it can't be measured.
    fn measure(&self) -> Option<SurfaceSize>;
    // Asks for `Animation::on_frame` to be called before the next repaint.
    fn request_frame(&mut self) -> Option<FrameHandle>;
    fn cancel_frame(&mut self, handle: FrameHandle);
    // Asks for `Animation::on_resize_timeout` to be called after `delay_ms`.
    fn set_timeout(&mut self, delay_ms: i32) -> Option<TimeoutHandle>;
    fn clear_timeout(&mut self, handle: TimeoutHandle);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Phase {
    // Not mounted yet, or mounted without a usable surface
    Idle,
    Active,
    TornDown,
}

pub struct Animation<R> {
    profile: DeviceProfile,
    settings: Settings,
    field: ParticleField,
    renderer: Renderer,
    rng: R,
    phase: Phase,
    hidden: bool,
    pending_frame: Option<FrameHandle>,
    pending_resize: Option<TimeoutHandle>,
    resets: u64,
}

impl<R: Rng> Animation<R> {
    pub fn new(profile: DeviceProfile, rng: R) -> Self {
        Animation {
            settings: Settings::for_device(&profile),
            profile,
            field: ParticleField::new(),
            renderer: Renderer::default(),
            rng,
            phase: Phase::Idle,
            hidden: false,
            pending_frame: None,
            pending_resize: None,
            resets: 0,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // Changes apply at the next re-initialization.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn is_running(&self) -> bool {
        self.pending_frame.is_some()
    }

    pub fn is_torn_down(&self) -> bool {
        self.phase == Phase::TornDown
    }

    // How many times the particle set has been rebuilt
    #[cfg(test)]
    pub(crate) fn resets(&self) -> u64 {
        self.resets
    }

    pub fn mount<H, T>(&mut self, host: &mut H, target: &mut T)
    where
        H: Host + ?Sized,
        T: DrawTarget + ?Sized,
    {
        if self.phase != Phase::Idle {
            return;
        }
        if !self.reinitialize(host, target) {
            log!("particle network: no drawable surface, staying idle");
            return;
        }
        self.phase = Phase::Active;
        log!(
            "particle network: mounted {} particles on {}x{}",
            self.field.particles().len(),
            self.field.width(),
            self.field.height()
        );
        self.start(host, target);
    }

    pub fn on_frame<H, T>(&mut self, host: &mut H, target: &mut T)
    where
        H: Host + ?Sized,
        T: DrawTarget + ?Sized,
    {
        self.pending_frame = None;
        if !self.animates() {
            return;
        }
        self.tick(target);
        self.schedule(host);
    }

    // Pauses the loop while the page is hidden; particle positions survive.
    pub fn on_visibility_change<H: Host + ?Sized>(&mut self, hidden: bool, host: &mut H) {
        self.hidden = hidden;
        if hidden {
            if let Some(frame) = self.pending_frame.take() {
                host.cancel_frame(frame);
            }
        } else if self.animates() {
            self.schedule(host);
        }
    }

    // Restarts the debounce window; only the last resize in a burst re-initializes.
    pub fn on_resize<H: Host + ?Sized>(&mut self, host: &mut H) {
        if self.phase == Phase::TornDown {
            return;
        }
        if let Some(timeout) = self.pending_resize.take() {
            host.clear_timeout(timeout);
        }
        self.pending_resize = host.set_timeout(RESIZE_DEBOUNCE_MS);
    }

    pub fn on_resize_timeout<H, T>(&mut self, host: &mut H, target: &mut T)
    where
        H: Host + ?Sized,
        T: DrawTarget + ?Sized,
    {
        self.pending_resize = None;
        if self.phase == Phase::TornDown {
            return;
        }
        if !self.reinitialize(host, target) {
            return;
        }
        log!(
            "particle network: resized to {}x{}",
            self.field.width(),
            self.field.height()
        );
        // A surface that was unusable at mount can come alive on resize
        self.phase = Phase::Active;
        self.start(host, target);
    }

    pub fn on_pointer_move(&mut self, x: f64, y: f64) {
        if self.phase != Phase::TornDown {
            self.field.set_pointer(x, y);
        }
    }

    pub fn on_pointer_leave(&mut self) {
        self.field.clear_pointer();
    }

    // Cancels any pending frame and resize; every later event is ignored.
    pub fn teardown<H: Host + ?Sized>(&mut self, host: &mut H) {
        if self.phase == Phase::TornDown {
            return;
        }
        if let Some(frame) = self.pending_frame.take() {
            host.cancel_frame(frame);
        }
        if let Some(timeout) = self.pending_resize.take() {
            host.clear_timeout(timeout);
        }
        self.field.clear_pointer();
        self.phase = Phase::TornDown;
        log!("particle network: torn down");
    }

    fn animates(&self) -> bool {
        self.phase == Phase::Active && !self.hidden && !self.profile.prefers_reduced_motion
    }

    // Reduced motion gets a single still frame, everyone else a running loop.
    // A loop that is already running draws the new particles on its next frame.
    fn start<H, T>(&mut self, host: &mut H, target: &mut T)
    where
        H: Host + ?Sized,
        T: DrawTarget + ?Sized,
    {
        if self.profile.prefers_reduced_motion {
            self.tick(target);
        } else if !self.hidden && self.pending_frame.is_none() {
            self.tick(target);
            self.schedule(host);
        }
    }

    fn schedule<H: Host + ?Sized>(&mut self, host: &mut H) {
        if self.pending_frame.is_none() {
            self.pending_frame = host.request_frame();
        }
    }

    fn tick<T: DrawTarget + ?Sized>(&mut self, target: &mut T) {
        self.field.update(&self.settings);
        if let Err(err) = self.renderer.render(&self.field, &self.settings, target) {
            log!("particle network: render failed: {:?}", err);
        }
    }

    fn reinitialize<H, T>(&mut self, host: &mut H, target: &mut T) -> bool
    where
        H: Host + ?Sized,
        T: DrawTarget + ?Sized,
    {
        let size = match host.measure() {
            Some(size) if size.is_drawable() => size,
            _ => return false,
        };
        if let Err(err) = target.resize(
            size.width,
            size.height,
            self.profile.effective_pixel_ratio(),
        ) {
            log!("particle network: could not size canvas: {:?}", err);
            return false;
        }
        self.field
            .reset(&mut self.rng, size.width, size.height, &self.settings);
        self.resets += 1;
        true
    }
}
