use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let sdkconfig_defaults = PathBuf::from(&manifest_dir).join("sdkconfig.defaults");

    println!("cargo:rerun-if-changed=sdkconfig.defaults");
    println!("cargo:rerun-if-changed=cards.txt");

    if env::var("ESP_IDF_SDKCONFIG_DEFAULTS").is_err() {
        eprintln!("WARNING: ESP_IDF_SDKCONFIG_DEFAULTS not set! NVS and stack settings may be wrong.");
        eprintln!("Build with: export ESP_IDF_SDKCONFIG_DEFAULTS=crates/flashcard-firmware/sdkconfig.defaults");
    }

    // A cached sdkconfig older than sdkconfig.defaults is never regenerated by esp-idf-sys.
    let target_dir = PathBuf::from(&manifest_dir).join("target");
    for sdkconfig in cached_sdkconfigs(&target_dir) {
        if newer_than(&sdkconfig_defaults, &sdkconfig) {
            eprintln!("sdkconfig.defaults changed! Forcing regeneration...");
            let _ = fs::remove_file(&sdkconfig);
            if let Some(dir) = sdkconfig.parent() {
                let _ = fs::remove_dir_all(dir.join("sdkconfig.d"));
            }
        }
    }

    embuild::espidf::sysenv::output();
}

fn cached_sdkconfigs(target_dir: &Path) -> Vec<PathBuf> {
    let Ok(profiles) = fs::read_dir(target_dir) else {
        return Vec::new();
    };
    profiles
        .flatten()
        .filter_map(|profile| fs::read_dir(profile.path().join("build")).ok())
        .flat_map(|builds| builds.flatten())
        .map(|build| build.path())
        .filter(|path| path.to_string_lossy().contains("esp-idf-sys"))
        .map(|path| path.join("out/esp-idf/sdkconfig"))
        .filter(|path| path.exists())
        .collect()
}

fn newer_than(a: &Path, b: &Path) -> bool {
    let modified = |path: &Path| fs::metadata(path).and_then(|m| m.modified()).ok();
    matches!((modified(a), modified(b)), (Some(a), Some(b)) if a > b)
}
