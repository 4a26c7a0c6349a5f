//! Build script: embeds the version string for `dotman version`.

use std::process::Command;

/// Version string for `dotman version`: an explicit `DOTMAN_VERSION` wins,
/// a checkout falls back to `git describe`.
fn describe() -> Option<String> {
    if let Ok(version) = std::env::var("DOTMAN_VERSION") {
        return Some(version);
    }
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|v| !v.is_empty())
}

fn main() {
    if let Some(version) = describe() {
        println!("cargo:rustc-env=DOTMAN_VERSION={version}");
    }

    println!("cargo:rerun-if-env-changed=DOTMAN_VERSION");
    for watched in [".git/HEAD", ".git/refs/"] {
        println!("cargo:rerun-if-changed={watched}");
    }
}
