#![no_main]
use libfuzzer_sys::fuzz_target;
use std::time::{Duration, Instant};

use grip_core::GripController;
use grip_traits::ButtonLevel;

// Any sensor stream and button pattern keeps the commanded duty inside the
// servo range.
fuzz_target!(|input: (Vec<f32>, Vec<bool>)| {
    let (fractions, presses) = input;
    let Ok(mut controller) = GripController::builder().build() else {
        return;
    };
    let range = controller.duty_range();
    let start = Instant::now();
    for (i, f) in fractions.into_iter().enumerate() {
        let pressed = presses.get(i).copied().unwrap_or(false);
        let level = if pressed {
            ButtonLevel::Pressed
        } else {
            ButtonLevel::Released
        };
        let now = start + Duration::from_millis(10 * i as u64);
        let cmd = controller.step(now, level, Ok(f));
        let duty = cmd.duty.get();
        assert!(duty >= range.min().get() && duty <= range.max().get());
    }
});
