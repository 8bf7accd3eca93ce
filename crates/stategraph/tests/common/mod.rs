//! Common test utilities shared across integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Path of the compiled stategraph binary.
pub fn stategraph_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_stategraph"))
}

/// Run the stategraph binary with `args` in `dir`.
pub fn run_stategraph_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(stategraph_binary())
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute stategraph binary")
}

/// Write `content` to `dir/name`, returning the file name for use as an
/// argument.
pub fn write_input<'a>(dir: &Path, name: &'a str, content: &str) -> &'a str {
    fs::write(dir.join(name), content).expect("Failed to write input file");
    name
}

/// Stdout of a finished run as a string.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Stderr of a finished run as a string.
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
