use std::process::{Command, Output};

use test_support::{ConfigFile, console_properties};

fn hierlog(args: &[&str], config_env: Option<&str>) -> Output {
    let path = env!("CARGO_BIN_EXE_hierlog");
    let mut command = Command::new(path);
    command.args(args);
    match config_env {
        Some(value) => command.env("HIERLOG_CONFIG", value),
        None => command.env_remove("HIERLOG_CONFIG"),
    };
    command
        .output()
        .unwrap_or_else(|error| panic!("failed to run {path}: {error}"))
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("stdout is UTF-8")
}

#[test]
fn help_lists_options() {
    let output = hierlog(&["--help"], None);
    assert!(output.status.success());
    assert!(output.stderr.is_empty(), "help output should not write to stderr");
    let text = stdout(&output);
    assert!(text.contains("Usage:"));
    assert!(text.contains("--context"));
}

#[test]
fn basic_configuration_prints_to_stdout() {
    let output = hierlog(&["hello", "world"], None);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("INFO  root - hello world"), "{text}");
}

#[test]
fn properties_text_selects_layout_and_level() {
    let properties = console_properties("WARN");
    let quiet = hierlog(&["--properties", &properties, "ignored"], None);
    assert!(quiet.status.success());
    assert!(quiet.stdout.is_empty());

    let loud = hierlog(&["--properties", &properties, "--level", "error", "shown"], None);
    assert_eq!(stdout(&loud), "ERROR - shown\n");
}

#[test]
fn environment_file_is_used() {
    let file = ConfigFile::new("log.properties", &console_properties("INFO"));
    let output = hierlog(
        &["-C", "job", "--describe", "started"],
        Some(file.path().to_str().expect("utf-8 temp path")),
    );
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "logger=job effective=INFO level=INFO enabled=true\nINFO - started\n"
    );
}

#[test]
fn unreadable_environment_file_falls_back_to_basic() {
    let output = hierlog(&["fallback"], Some("/nonexistent/hierlog.properties"));
    assert!(output.status.success());
    assert!(stdout(&output).contains("root - fallback"));
}

#[test]
fn exit_codes_distinguish_failures() {
    let usage = hierlog(&["--no-such-flag", "m"], None);
    assert_eq!(usage.status.code(), Some(1));

    let config = hierlog(&["--config", "/nonexistent/log.xml", "m"], None);
    assert_eq!(config.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&config.stderr).starts_with("hierlog: "));

    let context = hierlog(&["--properties", "", "-C", "bad.segment", "m"], None);
    assert_eq!(context.status.code(), Some(3));
}

#[test]
fn file_appender_receives_detailed_layout() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("out.log");
    let xml = format!(
        r#"<configuration>
  <appender name="F" class="org.apache.log4j.FileAppender">
    <param name="File" value="{}"/>
    <param name="Append" value="false"/>
    <layout class="DetailedLayout"/>
  </appender>
  <root><level value="DEBUG"/><appender-ref ref="F"/></root>
</configuration>
"#,
        log.display()
    );
    let config = test_support::write_config(dir.path(), "log.xml", &xml);
    let output = hierlog(
        &[
            "--config",
            config.to_str().expect("utf-8 temp path"),
            "--logger",
            "svc.db",
            "--mdc",
            "req=7",
            "pool",
            "ready",
        ],
        None,
    );
    assert!(output.status.success(), "{output:?}");
    let written = std::fs::read_to_string(&log).expect("log file");
    assert!(written.starts_with("INFO  svc.db hierlog ("), "{written}");
    assert!(written.contains(" - pool ready - {{req,7}}"), "{written}");
}
