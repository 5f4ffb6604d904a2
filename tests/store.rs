// tests/store.rs

use std::error::Error;

use hivewatch::{MonitorError, WatchTarget};

mod common;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn key_dir_mirrors_root_and_segments() -> TestResult {
    let (tmp, hive) = common::test_hive();
    let target = WatchTarget::parse("HKCU\\SOFTWARE\\Test")?;

    let expected = tmp
        .path()
        .join("HKEY_CURRENT_USER")
        .join("SOFTWARE")
        .join("Test");
    assert_eq!(hive.key_dir(&target), expected);

    Ok(())
}

#[test]
fn directories_outside_the_hive_base_cannot_be_addressed() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let base = tmp.path().join("hive");
    std::fs::create_dir(&base)?;
    let hive = hivewatch::Hive::new(&base);

    // A directory next to the hive base, reachable only via `..` segments.
    std::fs::create_dir(tmp.path().join("outside"))?;

    match WatchTarget::parse("HKCU\\..\\..\\outside") {
        Err(MonitorError::InvalidAddress { token }) => assert_eq!(token, ".."),
        other => panic!("expected InvalidAddress, got {other:?}"),
    }

    // Any target that does construct resolves under the base.
    let inside = WatchTarget::parse("HKCU\\outside")?;
    assert!(hive.key_dir(&inside).starts_with(&base));

    Ok(())
}

#[test]
fn open_missing_key_fails_with_open_failed() -> TestResult {
    let (_tmp, hive) = common::test_hive();
    let target = WatchTarget::parse("HKCU\\SOFTWARE\\Missing")?;

    match hive.open_key(&target) {
        Err(MonitorError::OpenFailed { target: t, .. }) => assert_eq!(t, target),
        other => panic!("expected OpenFailed, got {other:?}"),
    }

    Ok(())
}

#[test]
fn values_round_trip_as_raw_bytes() -> TestResult {
    let (_tmp, hive) = common::test_hive();
    let target = WatchTarget::parse("HKCU\\SOFTWARE\\Test\\Path")?;

    let key = hive.create_key(&target)?;
    let palette: Vec<u8> = (0..=15).collect();
    key.set_value("AccentPalette", &palette)?;

    let reopened = hive.open_key(&target)?;
    assert_eq!(reopened.value("AccentPalette")?, Some(palette));
    assert_eq!(reopened.value("NoSuchValue")?, None);
    assert_eq!(reopened.value_names()?, ["AccentPalette"]);

    Ok(())
}

#[test]
fn subkeys_and_values_enumerate_separately() -> TestResult {
    let (_tmp, hive) = common::test_hive();
    let parent = WatchTarget::parse("HKLM\\SOFTWARE\\Vendor")?;
    let child = WatchTarget::parse("HKLM\\SOFTWARE\\Vendor\\Device")?;

    let key = hive.create_key(&parent)?;
    hive.create_key(&child)?;
    key.set_value("Serial", b"0042")?;

    assert_eq!(key.subkey_names()?, ["Device"]);
    assert_eq!(key.value_names()?, ["Serial"]);

    Ok(())
}
