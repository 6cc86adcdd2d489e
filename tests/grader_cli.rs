use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

struct Workspace {
    root: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("students")).unwrap();
        std::fs::write(root.path().join("input.txt"), "3 4\n").unwrap();
        std::fs::write(root.path().join("expected.txt"), "Sum: 7\n").unwrap();
        std::fs::write(
            root.path().join("settings.toml"),
            r#"
timeout_secs = 2
compile_command = ["sh", "-c", "cp {source} {binary} && chmod +x {binary}"]
"#,
        )
        .unwrap();
        Self { root }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    fn submission(&self, name: &str, source: &str) {
        let dir = self.path("students").join(name);
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("main.c"), source).unwrap();
    }

    fn write_config(&self, lines: &[&Path]) -> PathBuf {
        let config = self.path("conf.txt");
        let content: Vec<String> = lines.iter().map(|p| p.display().to_string()).collect();
        std::fs::write(&config, content.join("\n")).unwrap();
        config
    }

    fn grader(&self, config: &Path) -> Output {
        Command::new(env!("CARGO_BIN_EXE_grader"))
            .arg(config)
            .current_dir(self.root.path())
            .env("GRADER_SETTINGS", self.path("settings.toml"))
            .env("GRADER_REPORT", self.path("results.csv"))
            .env("GRADER_ERROR_LOG", self.path("errors.txt"))
            .env_remove("GRADER_COMPARATOR")
            .output()
            .unwrap()
    }
}

#[test]
fn grades_batch_through_external_comparator() {
    let ws = Workspace::new();
    ws.submission(
        "alice",
        "#!/bin/sh\nread a b\necho \"Sum: $((a + b))\"\n",
    );
    ws.submission(
        "bob",
        "#!/bin/sh\nread a b\necho \"sum:\"\necho \"  $((a + b))\"\n",
    );
    ws.submission("carol", "#!/bin/sh\nread a b\necho \"Sum: $((a * b))\"\n");
    std::fs::create_dir(ws.path("students").join("dave")).unwrap();

    let config = ws.write_config(&[
        &ws.path("students"),
        &ws.path("input.txt"),
        &ws.path("expected.txt"),
    ]);
    let output = ws.grader(&config);

    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(
        std::fs::read_to_string(ws.path("results.csv")).unwrap(),
        "alice,100,excellent\n\
         bob,75,similar\n\
         carol,50,wrong\n\
         dave,0,no source\n"
    );
}

#[test]
fn missing_target_directory_is_fatal() {
    let ws = Workspace::new();
    let config = ws.write_config(&[
        &ws.path("nowhere"),
        &ws.path("input.txt"),
        &ws.path("expected.txt"),
    ]);

    let output = ws.grader(&config);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Not a valid directory"));
}

#[test]
fn incomplete_config_is_fatal() {
    let ws = Workspace::new();
    let config = ws.write_config(&[&ws.path("students")]);

    let output = ws.grader(&config);
    assert!(!output.status.success());
}

#[test]
fn missing_config_argument_is_fatal() {
    let status = Command::new(env!("CARGO_BIN_EXE_grader"))
        .env_remove("GRADER_SETTINGS")
        .status()
        .unwrap();
    assert!(!status.success());
}
