//! The parts of the contract that only show up through the real process
//! boundary: argv handling, exit codes, and reading a script from disk.

use std::io::Write;

use assert_cmd::Command;

#[test]
fn two_or_more_arguments_prints_usage_and_exits_64() {
    Command::cargo_bin("flint")
        .unwrap()
        .arg("one")
        .arg("two")
        .assert()
        .failure()
        .code(64)
        .stderr("Usage golox [script]\n");
}

#[test]
fn running_a_script_file_exits_zero_on_success() {
    let mut file = tempfile_with(b"print 1 + 1;");
    Command::cargo_bin("flint")
        .unwrap()
        .arg(file.path())
        .assert()
        .success()
        .stdout("2\n");
    file.keep_alive();
}

#[test]
fn a_runtime_error_in_a_script_file_exits_70() {
    let mut file = tempfile_with(b"print 1 + \"a\";");
    Command::cargo_bin("flint")
        .unwrap()
        .arg(file.path())
        .assert()
        .code(70)
        .stdout("Error (line 1): operands must be two numbers or two strings\n");
    file.keep_alive();
}

#[test]
fn a_parse_error_in_a_script_file_exits_65() {
    let mut file = tempfile_with(b"var ;");
    Command::cargo_bin("flint")
        .unwrap()
        .arg(file.path())
        .assert()
        .code(65);
    file.keep_alive();
}

/// A minimal scratch-file helper: writes `contents` to a process-unique
/// path under the system temp directory and removes it on drop, keeping
/// these tests independent of any crate the rest of the workspace carries
/// for scratch files.
struct ScratchFile {
    path: std::path::PathBuf,
}

impl ScratchFile {
    fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn keep_alive(&mut self) {}
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn tempfile_with(contents: &[u8]) -> ScratchFile {
    let path = std::env::temp_dir().join(format!("flint-cli-test-{}.flint", std::process::id()));
    let mut file = std::fs::File::create(&path).expect("should be able to create a scratch file");
    file.write_all(contents).expect("should be able to write the scratch file");
    ScratchFile { path }
}
