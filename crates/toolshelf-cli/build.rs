//! Embeds the version reported by `toolshelf --version`.
//!
//! Packagers can pin it with `TOOLSHELF_BUILD_VERSION`; otherwise it comes
//! from `git describe`, falling back to the crate version outside a checkout.

use std::env;
use std::process::Command;

const OVERRIDE_VAR: &str = "TOOLSHELF_BUILD_VERSION";

fn main() {
    println!("cargo:rerun-if-env-changed={OVERRIDE_VAR}");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");

    let version = env::var(OVERRIDE_VAR)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(describe)
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=TOOLSHELF_VERSION={version}");
}

/// `git describe` output without a leading `v`, e.g. `0.1.0-3-gabc123-dirty`.
fn describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|output| output.status.success())?;

    let described = String::from_utf8(output.stdout).ok()?;
    match described.trim() {
        "" => None,
        version => Some(version.trim_start_matches('v').to_string()),
    }
}
