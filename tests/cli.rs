//! Exit codes of the binary.

use std::path::Path;
use std::process::Command;

const BIN: &str = env!("CARGO_BIN_EXE_manifest-notes");

fn run(args: &[&str], path: Option<&Path>) -> Option<i32> {
    let mut command = Command::new(BIN);
    command.args(args).env_remove("MANIFEST_NOTES_CONFIG");
    if let Some(path) = path {
        command.env("PATH", path);
    }
    command.output().expect("binary runs").status.code()
}

/// A directory with `git` and `gh` stand-ins that only answer `--version`.
#[cfg(unix)]
fn fake_tools() -> anyhow::Result<tempfile::TempDir> {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir()?;
    for tool in ["git", "gh"] {
        let path = dir.path().join(tool);
        std::fs::write(&path, "#!/bin/sh\nexit 0\n")?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(dir)
}

fn write_config(dir: &Path) -> anyhow::Result<String> {
    let path = dir.join("manifest-notes.toml");
    std::fs::write(
        &path,
        "organization = \"acme\"\nmanifest_repository = \"manifest\"\n",
    )?;
    Ok(path.display().to_string())
}

#[test]
fn wrong_argument_count_is_a_usage_error() {
    assert_eq!(run(&[], None), Some(2));
    assert_eq!(run(&["v1", "v2"], None), Some(2));
}

#[test]
fn help_exits_cleanly() {
    assert_eq!(run(&["--help"], None), Some(0));
}

#[test]
fn missing_tools_exit_with_one() -> anyhow::Result<()> {
    let empty = tempfile::tempdir()?;
    let config = write_config(empty.path())?;
    assert_eq!(run(&["--config", &config, "v1"], Some(empty.path())), Some(1));
    Ok(())
}

#[cfg(unix)]
#[test]
fn missing_config_exits_with_one() -> anyhow::Result<()> {
    let tools = fake_tools()?;
    assert_eq!(
        run(&["--config", "/nonexistent/manifest-notes.toml", "v1"], Some(tools.path())),
        Some(1)
    );
    Ok(())
}

#[cfg(unix)]
#[test]
fn invalid_tag_exits_with_three() -> anyhow::Result<()> {
    let tools = fake_tools()?;
    let config = write_config(tools.path())?;
    assert_eq!(run(&["--config", &config, "v1;id"], Some(tools.path())), Some(3));
    assert_eq!(run(&["--config", &config, "--", "--draft"], Some(tools.path())), Some(3));
    Ok(())
}
