// Animated particle-network background for a canvas: drifting points linked
// by faint lines, nudged away from the pointer.

mod utils;

pub mod animation;
pub mod color;
pub mod config;
pub mod field;
pub mod particle;
pub mod renderer;
mod web;

use wasm_bindgen::prelude::*;

pub use animation::{Animation, Host};
pub use config::{DeviceProfile, Settings};
pub use field::ParticleField;
pub use web::ParticleNetwork;

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen]
pub fn initialize() {
    utils::set_panic_hook();
}
