//! Notification-level display machinery shared by the library and the CLI.
//!
//! Levels follow the usual convention of the command-line tools:
//! 0 = silent, 1 = errors, 2 = progress + summaries (default), 3 = details,
//! 4 = debug.

use std::sync::atomic::{AtomicI32, Ordering};

static DISPLAY_LEVEL: AtomicI32 = AtomicI32::new(2);

/// Current notification level.
pub fn display_level() -> i32 {
    DISPLAY_LEVEL.load(Ordering::Relaxed)
}

/// Set the notification level (clamped to 0..=4).
pub fn set_display_level(level: i32) {
    DISPLAY_LEVEL.store(level.clamp(0, 4), Ordering::Relaxed);
}

/// Print to stderr when the current display level is at least `$level`.
#[macro_export]
macro_rules! displaylevel {
    ($level:expr, $($arg:tt)*) => {
        if $crate::display::display_level() >= $level {
            eprint!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_is_clamped() {
        let prev = display_level();
        set_display_level(99);
        assert_eq!(display_level(), 4);
        set_display_level(-3);
        assert_eq!(display_level(), 0);
        set_display_level(prev);
    }
}
