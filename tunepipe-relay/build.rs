//! Stamps the relay binary with where it came from
//!
//! The values end up in the startup banner and in `GET /build_info`, so an
//! operator can tell which commit a running relay was built from.

use std::process::Command;

/// Short commit id of the checkout, or "unknown" outside a git work tree
fn commit_id() -> String {
    Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|id| id.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn main() {
    let built_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", commit_id());
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", built_at);
    println!("cargo:rustc-env=BUILD_PROFILE={}", profile);

    // Timestamp is refreshed when HEAD moves, not on every build
    println!("cargo:rerun-if-changed=../.git/HEAD");
}
