//! Build script that captures build metadata for the JSON log sink.
//!
//! Both values are best-effort: a missing `git` binary or a source tree
//! without `.git` yields an empty string rather than a build failure.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs");

    let revision = command_output("git", &["rev-parse", "HEAD"]).unwrap_or_default();
    println!("cargo:rustc-env=GIT_REVISION={}", revision);

    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let rustc_version = command_output(&rustc, &["--version"])
        .and_then(|v| v.split_whitespace().nth(1).map(str::to_string))
        .unwrap_or_default();
    println!("cargo:rustc-env=RUSTC_VERSION={}", rustc_version);
}

fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}
