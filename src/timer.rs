use crate::error::AcademyError;
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::window;

/// `setTimeout` takes a signed delay; anything past `i32::MAX` would wrap.
pub fn checked_delay(delay_ms: u32) -> Result<i32, AcademyError> {
    i32::try_from(delay_ms)
        .map_err(|_| AcademyError::validation("delay_ms", "timeout delay out of range"))
}

/// A one-shot `setTimeout`. Dropping the handle clears the timeout, so the
/// callback can never outlive whoever armed it.
pub struct Timeout {
    id: i32,
    fired: Rc<Cell<bool>>,
    _callback: Closure<dyn FnMut()>,
}

impl Timeout {
    pub fn arm(delay_ms: u32, f: impl FnOnce() + 'static) -> Result<Timeout, JsValue> {
        let delay = checked_delay(delay_ms)?;
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        let mut f = Some(f);
        let callback = Closure::wrap(Box::new(move || {
            flag.set(true);
            if let Some(f) = f.take() {
                f();
            }
        }) as Box<dyn FnMut()>);
        let id = window()
            .ok_or("no window")?
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                delay,
            )?;
        Ok(Timeout {
            id,
            fired,
            _callback: callback,
        })
    }

    /// True once the callback has run; the handle can then be dropped.
    pub fn fired(&self) -> bool {
        self.fired.get()
    }

    pub fn cancel(&self) {
        if let Some(w) = window() {
            w.clear_timeout_with_handle(self.id);
        }
    }
}

impl Drop for Timeout {
    fn drop(&mut self) {
        if !self.fired() {
            self.cancel();
        }
    }
}
