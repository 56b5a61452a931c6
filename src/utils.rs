// Console helpers: panic hook, a formatting log macro and a time-span guard

pub fn set_panic_hook() {
    // Panics otherwise surface as an opaque "unreachable" trap in the browser
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

#[macro_export]
macro_rules! log {
    ( $( $t:tt )* ) => {
        $crate::utils::log(&format!( $( $t )* ))
    };
}

#[cfg(target_arch = "wasm32")]
pub fn log(message: &str) {
    web_sys::console::log_1(&message.into());
}

// Imported JS functions can't be called natively, so tests run with logging off
#[cfg(not(target_arch = "wasm32"))]
pub fn log(_message: &str) {}

// Prints the elapsed time between creation and drop under `name` in the console
#[cfg(feature = "frame-timing")]
pub struct Timer<'a> {
    name: &'a str,
}

#[cfg(feature = "frame-timing")]
impl<'a> Timer<'a> {
    pub fn new(name: &'a str) -> Timer<'a> {
        web_sys::console::time_with_label(name);
        Timer { name }
    }
}

#[cfg(feature = "frame-timing")]
impl<'a> Drop for Timer<'a> {
    fn drop(&mut self) {
        web_sys::console::time_end_with_label(self.name);
    }
}
