use std::env;

// Targets where flock(2) is missing or not exposed by nix.
const NO_FLOCK_TARGETS: &[&str] = &["solaris", "illumos", "aix", "redox"];

fn main() {
    // We have a custom cfg for the lock strategy that Rust warns about since 1.80.
    println!("cargo::rustc-check-cfg=cfg(advlock_record_lock)");
    println!("cargo::rerun-if-changed=build.rs");

    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let forced = env::var_os("CARGO_FEATURE_RECORD_LOCK").is_some();
    if forced || NO_FLOCK_TARGETS.contains(&target_os.as_str()) {
        println!("cargo::rustc-cfg=advlock_record_lock");
    }
}
