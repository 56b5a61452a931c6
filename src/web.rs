// Browser glue: wires window, document and canvas events into an `Animation`
// and exposes the handle the page holds on to.

use crate::animation::{Animation, FrameHandle, Host, SurfaceSize, TimeoutHandle};
use crate::config::DeviceProfile;
use crate::log;
use crate::renderer::CanvasTarget;
#[cfg(feature = "frame-timing")]
use crate::utils::Timer;
use js_sys::Function;
use rand::rngs::ThreadRng;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget, HtmlCanvasElement, MouseEvent, TouchEvent, Window};

const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

struct WebHost {
    window: Window,
    canvas: HtmlCanvasElement,
    frame_callback: Option<Closure<dyn FnMut(f64)>>,
    resize_callback: Option<Closure<dyn FnMut()>>,
}

impl Host for WebHost {
    fn measure(&self) -> Option<SurfaceSize> {
        let rect = self.canvas.parent_element()?.get_bounding_client_rect();
        Some(SurfaceSize {
            width: rect.width(),
            height: rect.height(),
        })
    }

    fn request_frame(&mut self) -> Option<FrameHandle> {
        let callback = self.frame_callback.as_ref()?;
        self.window
            .request_animation_frame(callback.as_ref().unchecked_ref::<Function>())
            .ok()
            .map(FrameHandle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let _ = self.window.cancel_animation_frame(handle.0);
    }

    fn set_timeout(&mut self, delay_ms: i32) -> Option<TimeoutHandle> {
        let callback = self.resize_callback.as_ref()?;
        self.window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref::<Function>(),
                delay_ms,
            )
            .ok()
            .map(TimeoutHandle)
    }

    fn clear_timeout(&mut self, handle: TimeoutHandle) {
        self.window.clear_timeout_with_handle(handle.0);
    }
}

struct Runtime {
    animation: Animation<ThreadRng>,
    host: WebHost,
    target: CanvasTarget,
}

impl Runtime {
    fn mount(&mut self, hidden: bool) {
        let Runtime {
            animation,
            host,
            target,
        } = self;
        animation.mount(host, target);
        if hidden {
            animation.on_visibility_change(true, host);
        }
    }

    fn frame(&mut self) {
        #[cfg(feature = "frame-timing")]
        let _timer = Timer::new("ParticleNetwork::frame");
        let Runtime {
            animation,
            host,
            target,
        } = self;
        animation.on_frame(host, target);
    }

    fn resize_elapsed(&mut self) {
        let Runtime {
            animation,
            host,
            target,
        } = self;
        animation.on_resize_timeout(host, target);
    }

    // Client (viewport) coordinates into canvas-local ones
    fn pointer_at(&mut self, client_x: i32, client_y: i32) {
        let rect = self.target.canvas().get_bounding_client_rect();
        self.animation
            .on_pointer_move(client_x as f64 - rect.left(), client_y as f64 - rect.top());
    }

    fn teardown(&mut self) {
        self.animation.teardown(&mut self.host);
        self.host.frame_callback = None;
        self.host.resize_callback = None;
    }
}

// Event listener that unsubscribes itself when dropped
struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn attach(
        target: &EventTarget,
        event: &'static str,
        callback: Closure<dyn FnMut(Event)>,
    ) -> Result<Listener, JsValue> {
        target.add_event_listener_with_callback(
            event,
            callback.as_ref().unchecked_ref::<Function>(),
        )?;
        Ok(Listener {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self.target.remove_event_listener_with_callback(
            self.event,
            self.callback.as_ref().unchecked_ref::<Function>(),
        );
    }
}

fn handler<F>(runtime: &Rc<RefCell<Runtime>>, mut on_event: F) -> Closure<dyn FnMut(Event)>
where
    F: FnMut(&mut Runtime, &Event) + 'static,
{
    let runtime = Rc::downgrade(runtime);
    Closure::wrap(Box::new(move |event: Event| {
        if let Some(runtime) = runtime.upgrade() {
            on_event(&mut runtime.borrow_mut(), &event);
        }
    }) as Box<dyn FnMut(Event)>)
}

fn detect_profile(window: &Window) -> DeviceProfile {
    let user_agent = window.navigator().user_agent().unwrap_or_default();
    let prefers_reduced_motion = window
        .match_media(REDUCED_MOTION_QUERY)
        .ok()
        .flatten()
        .map(|query| query.matches())
        .unwrap_or(false);
    DeviceProfile::from_signals(
        &user_agent,
        prefers_reduced_motion,
        window.device_pixel_ratio(),
    )
}

/// Animated particle background drawn on a canvas that fills its parent element.
///
/// Dropping the handle (or calling `free()` from JS) stops the animation and
/// removes every listener it installed.
#[wasm_bindgen]
pub struct ParticleNetwork {
    runtime: Option<Rc<RefCell<Runtime>>>,
    listeners: Vec<Listener>,
}

#[wasm_bindgen]
impl ParticleNetwork {
    /// Starts the background on `canvas`. Never throws: if the canvas can't be
    /// used the returned handle is inert and nothing is drawn.
    pub fn mount(canvas: HtmlCanvasElement) -> ParticleNetwork {
        match Self::try_mount(canvas) {
            Ok(network) => network,
            Err(err) => {
                log!("particle network: disabled: {:?}", err);
                ParticleNetwork {
                    runtime: None,
                    listeners: Vec::new(),
                }
            }
        }
    }

    pub fn set_particle_count(&mut self, count: u32) {
        self.with_runtime(|runtime| {
            runtime
                .animation
                .settings_mut()
                .set_particle_count(count as usize)
        });
    }

    pub fn set_connection_distance(&mut self, distance: f64) {
        self.with_runtime(|runtime| {
            runtime
                .animation
                .settings_mut()
                .set_connection_distance(distance)
        });
    }

    pub fn set_mouse_radius(&mut self, radius: f64) {
        self.with_runtime(|runtime| runtime.animation.settings_mut().set_mouse_radius(radius));
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.with_runtime(|runtime| runtime.animation.settings_mut().set_speed(speed));
    }

    /// Rebuilds the particles (after the usual resize debounce) so new settings take effect.
    pub fn refresh(&mut self) {
        self.with_runtime(|runtime| runtime.animation.on_resize(&mut runtime.host));
    }

    pub fn particle_count(&self) -> u32 {
        self.runtime
            .as_ref()
            .and_then(|runtime| runtime.try_borrow().ok())
            .map(|runtime| runtime.animation.field().particles().len() as u32)
            .unwrap_or(0)
    }

    // Last pointer position in canvas coordinates, while a pointer is over the canvas
    pub fn pointer_x(&self) -> Option<f64> {
        self.pointer().map(|pointer| pointer[0])
    }

    pub fn pointer_y(&self) -> Option<f64> {
        self.pointer().map(|pointer| pointer[1])
    }

    pub fn is_running(&self) -> bool {
        self.runtime
            .as_ref()
            .and_then(|runtime| runtime.try_borrow().ok())
            .map(|runtime| runtime.animation.is_running())
            .unwrap_or(false)
    }

    /// Stops the loop and releases every listener and timer. Safe to call twice.
    pub fn destroy(&mut self) {
        self.listeners.clear();
        if let Some(runtime) = self.runtime.take() {
            let borrowed = runtime.try_borrow_mut();
            if let Ok(mut runtime) = borrowed {
                runtime.teardown();
            }
        }
    }
}

impl ParticleNetwork {
    fn try_mount(canvas: HtmlCanvasElement) -> Result<ParticleNetwork, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("window has no document"))?;
        let profile = detect_profile(&window);
        let target = CanvasTarget::new(canvas.clone())?;

        let runtime = Rc::new(RefCell::new(Runtime {
            animation: Animation::new(profile, rand::thread_rng()),
            host: WebHost {
                window: window.clone(),
                canvas: canvas.clone(),
                frame_callback: None,
                resize_callback: None,
            },
            target,
        }));

        let frame = {
            let runtime = Rc::downgrade(&runtime);
            Closure::wrap(Box::new(move |_timestamp: f64| {
                if let Some(runtime) = runtime.upgrade() {
                    runtime.borrow_mut().frame();
                }
            }) as Box<dyn FnMut(f64)>)
        };
        let resize_elapsed = {
            let runtime = Rc::downgrade(&runtime);
            Closure::wrap(Box::new(move || {
                if let Some(runtime) = runtime.upgrade() {
                    runtime.borrow_mut().resize_elapsed();
                }
            }) as Box<dyn FnMut()>)
        };
        {
            let mut runtime = runtime.borrow_mut();
            runtime.host.frame_callback = Some(frame);
            runtime.host.resize_callback = Some(resize_elapsed);
        }

        let visibility_document = document.clone();
        let listeners = vec![
            Listener::attach(
                &canvas,
                "mousemove",
                handler(&runtime, |runtime, event| {
                    if let Some(event) = event.dyn_ref::<MouseEvent>() {
                        runtime.pointer_at(event.client_x(), event.client_y());
                    }
                }),
            )?,
            Listener::attach(
                &canvas,
                "touchmove",
                handler(&runtime, |runtime, event| {
                    let touch = event
                        .dyn_ref::<TouchEvent>()
                        .and_then(|event| event.touches().get(0));
                    if let Some(touch) = touch {
                        runtime.pointer_at(touch.client_x(), touch.client_y());
                    }
                }),
            )?,
            Listener::attach(
                &canvas,
                "mouseleave",
                handler(&runtime, |runtime, _| runtime.animation.on_pointer_leave()),
            )?,
            Listener::attach(
                &canvas,
                "touchend",
                handler(&runtime, |runtime, _| runtime.animation.on_pointer_leave()),
            )?,
            Listener::attach(
                &window,
                "resize",
                handler(&runtime, |runtime, _| {
                    runtime.animation.on_resize(&mut runtime.host)
                }),
            )?,
            Listener::attach(
                &document,
                "visibilitychange",
                handler(&runtime, move |runtime, _| {
                    let hidden = visibility_document.hidden();
                    runtime
                        .animation
                        .on_visibility_change(hidden, &mut runtime.host);
                }),
            )?,
        ];

        runtime.borrow_mut().mount(document.hidden());

        Ok(ParticleNetwork {
            runtime: Some(runtime),
            listeners,
        })
    }

    fn pointer(&self) -> Option<[f64; 2]> {
        self.runtime
            .as_ref()
            .and_then(|runtime| runtime.try_borrow().ok())
            .and_then(|runtime| runtime.animation.field().pointer())
    }

    fn with_runtime<F: FnOnce(&mut Runtime)>(&mut self, f: F) {
        if let Some(runtime) = &self.runtime {
            if let Ok(mut runtime) = runtime.try_borrow_mut() {
                f(&mut runtime);
            }
        }
    }
}

impl Drop for ParticleNetwork {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use std::cell::Cell;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn dropped_listener_stops_receiving_events() {
        let document = web_sys::window().unwrap().document().unwrap();
        let target: EventTarget = document.create_element("div").unwrap().into();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let callback = Closure::wrap(Box::new(move |_event: Event| {
            counter.set(counter.get() + 1);
        }) as Box<dyn FnMut(Event)>);

        let listener = Listener::attach(&target, "ping", callback).unwrap();
        target.dispatch_event(&Event::new("ping").unwrap()).unwrap();
        assert_eq!(hits.get(), 1);

        drop(listener);
        target.dispatch_event(&Event::new("ping").unwrap()).unwrap();
        assert_eq!(hits.get(), 1);
    }
}
