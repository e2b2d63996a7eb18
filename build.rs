//! Build script for the optional `python` extension module.

fn main() {
    let building_extension = std::env::var_os("CARGO_FEATURE_PYTHON").is_some();
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();

    // macOS extension modules resolve libpython symbols at import time.
    if building_extension && target_os == "macos" {
        println!("cargo:rustc-link-arg=-Wl,-undefined,dynamic_lookup");
    }
}
