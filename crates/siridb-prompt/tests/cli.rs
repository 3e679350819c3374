use std::process::{Command, Output};

fn run_prompt(args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_siridb-prompt"));
    command.args(args);
    command.env_remove("SIRIDB_PROMPT_LOG");
    command.output().expect("run siridb-prompt")
}

fn describe(output: &Output) -> String {
    format!(
        "stdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

#[test]
fn version_flag_prints_version_and_exits_zero() {
    for flag in ["-v", "--version"] {
        let output = run_prompt(&[flag]);
        assert_eq!(output.status.code(), Some(0), "{}", describe(&output));
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert_eq!(
            stdout.trim(),
            format!("Version: {}", env!("CARGO_PKG_VERSION"))
        );
    }
}

#[test]
fn help_exits_zero() {
    let output = run_prompt(&["--help"]);
    assert_eq!(output.status.code(), Some(0), "{}", describe(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("--servers"));
}

#[test]
fn missing_required_flag_exits_one() {
    let output = run_prompt(&["--dbname", "dbtest", "--user", "iris"]);
    assert_eq!(output.status.code(), Some(1), "{}", describe(&output));
    assert!(String::from_utf8_lossy(&output.stderr).contains("--servers"));
}

#[test]
fn unreadable_config_fails_before_terminal_setup() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("absent.toml");
    let output = run_prompt(&[
        "-d",
        "dbtest",
        "-s",
        "localhost",
        "-u",
        "iris",
        "--config",
        missing.to_str().expect("utf-8 temp path"),
    ]);
    assert_eq!(output.status.code(), Some(1), "{}", describe(&output));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: cannot read config file"), "{stderr}");
}

#[test]
fn invalid_config_value_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[console]\ntimeout = 0\n").expect("write config");
    let output = run_prompt(&[
        "-d",
        "dbtest",
        "-s",
        "localhost",
        "-u",
        "iris",
        "--config",
        path.to_str().expect("utf-8 temp path"),
    ]);
    assert_eq!(output.status.code(), Some(1), "{}", describe(&output));
    assert!(String::from_utf8_lossy(&output.stderr).contains("console.timeout must be >= 1"));
}
