#![no_main]
use libfuzzer_sys::fuzz_target;

// Arbitrary TOML must either be rejected or yield a config that validates
// and builds a controller without panicking.
fuzz_target!(|data: &str| {
    let Ok(cfg) = toml::from_str::<grip_config::Config>(data) else {
        return;
    };
    if cfg.validate().is_ok() {
        let _ = grip_core::GripController::from_config(&cfg, None);
    }
});
