//! Check directories and configuration.

use std::path::Path;

use shutter_common::config::AppConfig;

pub fn run(config: &AppConfig, config_path: &Path) -> anyhow::Result<()> {
    println!("Shutter Setup Check");
    println!("{}", "=".repeat(50));

    if config_path.exists() {
        println!("[OK] Config: {}", config_path.display());
    } else {
        println!(
            "[WARN] Config: {} (not found, using defaults; run `shutter config --init`)",
            config_path.display()
        );
    }

    let gallery_ok = check_writable("Gallery directory", &config.gallery.dir);
    let capture_ok = check_writable("Capture directory", &config.capture.capture_dir);

    match config.capture.operation_timeout_ms {
        Some(ms) => println!("[OK] Device call timeout: {ms}ms"),
        None => println!("[WARN] Device call timeout: disabled"),
    }
    println!(
        "[OK] Initial camera: lens {}, flash {}",
        config.capture.initial_lens, config.capture.initial_flash
    );

    println!();
    if gallery_ok && capture_ok {
        println!("All directories are writable. Shutter is ready.");
    } else {
        println!("Some directories are not writable. See above.");
    }

    Ok(())
}

fn check_writable(label: &str, dir: &Path) -> bool {
    let marker = dir.join(".shutter-marker");
    let result = std::fs::create_dir_all(dir)
        .and_then(|_| std::fs::write(&marker, b""))
        .and_then(|_| std::fs::remove_file(&marker));
    match result {
        Ok(()) => {
            println!("[OK] {label}: {}", dir.display());
            true
        }
        Err(e) => {
            println!("[FAIL] {label}: {} ({e})", dir.display());
            false
        }
    }
}
