//! Audio calibration gates run through the whipper toolkit.

use std::fs;
use std::path::Path;

use autoripper::dispatch::mock::MockEjector;
use autoripper::dispatch::{Dispatcher, RipDispatcher, VideoRipper, WhipperToolkit, rip_audio};
use autoripper::drive::SysfsIdentityReader;
use autoripper::error::RipError;

use crate::common::fixtures::TestEnv;
use crate::common::init_test_logging;

const CALIBRATED: &str = "\
[drive:PIONEER%3ABD-RW%20%20%20BDR-209D%3A1.10]
vendor = PIONEER
model = BD-RW   BDR-209D
release = 1.10
defeats_cache = True
read_offset = 667
";

const PROFILE_ONLY: &str = "\
[drive:PIONEER%3ABD-RW%20%20%20BDR-209D%3A1.10]
vendor = PIONEER
model = BD-RW   BDR-209D
release = 1.10
defeats_cache = True
";

fn toolkit(env: &TestEnv, exit_code: i32, whipper_conf: Option<&str>) -> WhipperToolkit {
    let sys_root = env.sysfs_drive("sr0", "PIONEER", "BD-RW   BDR-209D", "1.10");
    let config = env.path().join("whipper.conf");
    if let Some(content) = whipper_conf {
        fs::write(&config, content).unwrap();
    }
    WhipperToolkit::new(env.fake_whipper(exit_code).display().to_string())
        .with_config_path(config)
        .with_identity_reader(SysfsIdentityReader::new(sys_root))
}

#[test]
fn uncalibrated_drive_runs_analysis_then_offset_then_rip() {
    init_test_logging();
    let env = TestEnv::new();
    let toolkit = toolkit(&env, 0, None);
    let output = env.destination().join("audio");

    rip_audio(&toolkit, Path::new("/dev/sr0"), &output).unwrap();

    assert_eq!(
        env.calls("whipper"),
        vec![
            "drive analyze -d /dev/sr0".to_string(),
            "offset find -d /dev/sr0".to_string(),
            format!(
                "cd -d /dev/sr0 rip -O {} -W {}",
                output.display(),
                env.destination().display()
            ),
        ]
    );
}

#[test]
fn calibrated_drive_rips_directly() {
    let env = TestEnv::new();
    let toolkit = toolkit(&env, 0, Some(CALIBRATED));

    rip_audio(&toolkit, Path::new("/dev/sr0"), &env.destination().join("audio")).unwrap();

    let calls = env.calls("whipper");
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("cd -d /dev/sr0 rip"));
}

#[test]
fn missing_offset_only_runs_offset_detection() {
    let env = TestEnv::new();
    let toolkit = toolkit(&env, 0, Some(PROFILE_ONLY));

    rip_audio(&toolkit, Path::new("/dev/sr0"), &env.destination().join("audio")).unwrap();

    let calls = env.calls("whipper");
    assert_eq!(calls[0], "offset find -d /dev/sr0");
    assert_eq!(calls.len(), 2);
}

#[test]
fn failed_analysis_stops_the_chain() {
    let env = TestEnv::new();
    let toolkit = toolkit(&env, 3, None);

    let err = rip_audio(&toolkit, Path::new("/dev/sr0"), &env.destination().join("audio"))
        .unwrap_err();

    assert!(matches!(err, RipError::AudioStep { step: "analyze", .. }));
    assert!(!err.is_fatal());
    assert_eq!(env.calls("whipper"), vec!["drive analyze -d /dev/sr0"]);
}

#[test]
fn unidentifiable_drive_runs_nothing() {
    let env = TestEnv::new();
    let toolkit = WhipperToolkit::new(env.fake_whipper(0).display().to_string())
        .with_identity_reader(SysfsIdentityReader::new(env.path().join("no-sysfs")));

    let err = rip_audio(&toolkit, Path::new("/dev/sr0"), &env.destination()).unwrap_err();

    assert!(matches!(err, RipError::DriveIdentity { .. }));
    assert!(env.calls("whipper").is_empty());
}

#[test]
fn dispatcher_creates_audio_output_dir() {
    let env = TestEnv::new();
    let dispatcher = RipDispatcher::new(
        VideoRipper::new("true"),
        toolkit(&env, 0, Some(CALIBRATED)),
        MockEjector::new(),
    );
    let output = env.destination().join("audio");

    let report = dispatcher.dispatch_audio(Path::new("/dev/sr0"), &output).unwrap();

    assert!(output.is_dir());
    assert_eq!(report.output_path, output);
    assert!(dispatcher.ejector().ejected().is_empty());
}
