use gridglow_render::{FrameClock, FrameRequest};
use web_sys::Window;

use crate::canvas::report;

/// [`FrameClock`] backed by `requestAnimationFrame`.
///
/// The callback is bound after construction because it usually captures the
/// state that owns this clock. Until then every request is refused.
pub struct RafClock {
    window: Window,
    callback: Option<js_sys::Function>,
}

impl RafClock {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            callback: None,
        }
    }

    pub fn bind(&mut self, callback: js_sys::Function) {
        self.callback = Some(callback);
    }
}

impl FrameClock for RafClock {
    fn request_frame(&mut self) -> Option<FrameRequest> {
        let callback = self.callback.as_ref()?;
        match self.window.request_animation_frame(callback) {
            Ok(handle) => Some(FrameRequest(handle as u32 as u64)),
            Err(err) => {
                report("requestAnimationFrame", &err);
                None
            }
        }
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if let Err(err) = self.window.cancel_animation_frame(request.0 as u32 as i32) {
            report("cancelAnimationFrame", &err);
        }
    }
}
