//! Test fixture helpers.
//!
//! A [`TestEnv`] is a scratch directory holding a settings file, a
//! destination root and stand-ins for the external tools. The fake tools
//! are small shell scripts that append their arguments to a `.calls` file
//! so tests can assert exactly what was run and in which order.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A loaded DVD in `/dev/sr0`.
pub const DVD_ROW: &str = r#"DRV:0,2,999,1,"MATSHITA","DVD-RAM","/dev/sr0","","""#;

/// An empty slot; must never produce an entry.
pub const EMPTY_SLOT_ROW: &str = r#"DRV:1,256,999,0,"","","""#;

/// Status row for `device` with the given state and subtype codes.
#[must_use]
pub fn drive_row(index: u32, state: u32, subtype: u32, device: &str) -> String {
    format!(r#"DRV:{index},{state},999,{subtype},"TEST DRIVE","LABEL","{device}""#)
}

/// Scratch environment with automatic cleanup.
pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    #[must_use]
    pub fn destination(&self) -> PathBuf {
        self.path().join("rips")
    }

    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.path().join("settings.toml")
    }

    fn write_script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}"))
            .unwrap_or_else(|e| panic!("Failed to write {name}: {e}"));
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .unwrap_or_else(|e| panic!("Failed to chmod {name}: {e}"));
        path
    }

    /// Fake `makemkvcon`: prints `rows` for status queries, records rips.
    #[must_use]
    pub fn fake_makemkvcon(&self, rows: &[&str]) -> PathBuf {
        let calls = self.calls_path("makemkvcon");
        let body = format!(
            "echo \"$@\" >> '{calls}'\n\
             if [ \"$2\" = \"mkv\" ]; then\n\
             echo 'MSG:5036,0,1,\"Copy complete.\"'\n\
             exit 0\n\
             fi\n\
             cat <<'ROWS'\n{rows}\nROWS\n",
            calls = calls.display(),
            rows = rows.join("\n"),
        );
        self.write_script("makemkvcon", &body)
    }

    /// Fake `whipper` that records its arguments and exits with `code`.
    #[must_use]
    pub fn fake_whipper(&self, code: i32) -> PathBuf {
        let calls = self.calls_path("whipper");
        let body = format!("echo \"$@\" >> '{}'\nexit {code}\n", calls.display());
        self.write_script("whipper", &body)
    }

    /// Where a fake tool appends its invocations.
    #[must_use]
    pub fn calls_path(&self, tool: &str) -> PathBuf {
        self.path().join(format!("{tool}.calls"))
    }

    /// Recorded invocations of a fake tool, one per line.
    #[must_use]
    pub fn calls(&self, tool: &str) -> Vec<String> {
        fs::read_to_string(self.calls_path(tool))
            .map(|s| s.lines().map(String::from).collect())
            .unwrap_or_default()
    }

    /// Create `<root>/<name>/device/{vendor,model,rev}` like sysfs does.
    #[must_use]
    pub fn sysfs_drive(&self, name: &str, vendor: &str, model: &str, rev: &str) -> PathBuf {
        let root = self.path().join("sys");
        let dev = root.join(name).join("device");
        fs::create_dir_all(&dev).expect("Failed to create sysfs tree");
        // sysfs pads these attributes
        fs::write(dev.join("vendor"), format!("{vendor:<8}\n")).expect("vendor");
        fs::write(dev.join("model"), format!("{model:<16}\n")).expect("model");
        fs::write(dev.join("rev"), format!("{rev}\n")).expect("rev");
        root
    }

    /// Write a TOML settings file using the given tool programs.
    #[must_use]
    pub fn write_settings(&self, makemkvcon: &Path, whipper: &str, eject: &str) -> PathBuf {
        let content = format!(
            "destination_dir = \"{dest}\"\n\n\
             [tools]\n\
             makemkvcon = \"{makemkvcon}\"\n\
             whipper = \"{whipper}\"\n\
             eject = \"{eject}\"\n\
             whipper_config = \"{whipper_config}\"\n",
            dest = self.destination().display(),
            makemkvcon = makemkvcon.display(),
            whipper_config = self.path().join("whipper.conf").display(),
        );
        let path = self.settings_path();
        fs::write(&path, content).expect("Failed to write settings");
        path
    }

    /// Write a legacy `key=value` settings file.
    #[must_use]
    pub fn write_legacy_settings(&self) -> PathBuf {
        let path = self.path().join("settings.conf");
        fs::write(
            &path,
            format!(
                "# ripper settings\napp_DestinationDir=\"{}\"\n",
                self.destination().display()
            ),
        )
        .expect("Failed to write legacy settings");
        path
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
