//! Turning errors and panic payloads into text.

use std::{
    any::Any,
    cell::Cell,
    panic,
    sync::OnceLock,
};

pub(super) const PANIC_NAME: &str = "panic";

thread_local! {
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: OnceLock<()> = OnceLock::new();

/// Wrap the current panic hook once so that panics raised while a
/// [`QuietPanics`] guard is alive on the same thread print nothing.
fn install_quiet_hook() {
    QUIET_HOOK.get_or_init(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !CAPTURING.with(Cell::get) {
                previous(info);
            }
        }));
    });
}

/// Silences the panic hook on this thread until dropped.
pub(super) struct QuietPanics {
    was_capturing: bool,
}

impl QuietPanics {
    pub(super) fn enter() -> Self {
        install_quiet_hook();
        Self {
            was_capturing: CAPTURING.with(|c| c.replace(true)),
        }
    }
}

impl Drop for QuietPanics {
    fn drop(&mut self) {
        CAPTURING.with(|c| c.set(self.was_capturing));
    }
}

/// `message`, or `"<name> (no message)"` when it is blank.
pub(super) fn describe(name: &str, message: String) -> String {
    if message.trim().is_empty() {
        format!("{name} (no message)")
    } else {
        message
    }
}

pub(super) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}

/// `std::num::error::ParseIntError` -> `ParseIntError`,
/// `my::Wrapper<alloc::string::String>` -> `Wrapper`.
pub(super) fn short_type_name<E: ?Sized>() -> String {
    let full = std::any::type_name::<E>();
    let base = full.split('<').next().unwrap_or(full);
    let base = base.trim_start_matches('&');
    base.rsplit("::").next().unwrap_or(base).to_string()
}
