use std::env;
use std::process::Command;

/// Capture the version of the toolchain building this crate, so that the
/// reserved "rustc" package name can be dispatched on at runtime. If probing
/// fails, the env var is left empty and the lookup reports the package as
/// absent.
fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=RUSTC");

    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let version = Command::new(rustc)
        .arg("--version")
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok())
        // "rustc 1.85.0 (4d91de4e4 2025-02-17)" -> "1.85.0"
        .and_then(|s| s.split_whitespace().nth(1).map(str::to_string))
        .unwrap_or_default();
    println!("cargo:rustc-env=VERSIONDISPATCH_RUSTC_VERSION={version}");
}
