use assert_cmd::Command;
use std::path::Path;

/// Command for the jotter binary with its home directory pinned to `home`
pub fn jotter_cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("jotter").unwrap();
    cmd.env("JOTTER_HOME", home);
    cmd.env_remove("JOTTER_LOG");
    cmd
}

/// Run `jotter new` and return the short id it printed
#[allow(dead_code)]
pub fn create_entry(home: &Path, args: &[&str]) -> String {
    let output = jotter_cmd(home).arg("new").args(args).output().unwrap();
    assert!(output.status.success(), "new failed: {:?}", output);
    let stdout = String::from_utf8(output.stdout).unwrap();
    stdout
        .trim()
        .strip_prefix("Created ")
        .expect("new prints the created id")
        .to_string()
}
