//! Configuration loaded from disk, as the `irpatch` binary does with
//! `--config` and `--override NAME=PATH`

use irpatch::{Dialect, PatchError, PatchStatus, Patcher, PatcherConfig};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_load_config_file_and_patch() {
    let temp = tempdir().unwrap();
    let config_path = temp.path().join("patcher.toml");
    fs::write(
        &config_path,
        r#"
calling_convention = "cc76"

[extensions]
ir-tagged = "spv.ll"
"#,
    )
    .unwrap();

    // Extensions may not contain '.'
    let err = PatcherConfig::load(&config_path).unwrap_err();
    assert!(matches!(err, PatchError::Config(_)), "got {:?}", err);

    fs::write(
        &config_path,
        r#"
calling_convention = "cc76"

[extensions]
ir-tagged = "spvll"

[overrides]
foo = "define void @foo() {}\n"
"#,
    )
    .unwrap();
    let config = PatcherConfig::load(&config_path).unwrap();
    assert_eq!(config.calling_convention, "cc76");
    assert_eq!(config.overrides.get("foo"), Some("define void @foo() {}\n"));

    let target = temp.path().join("k.spvll");
    fs::write(&target, "declare cc76 i16 @magic_h_id(i16)\n").unwrap();
    let report = Patcher::new(config)
        .patch(Dialect::IrTagged, &temp.path().join("k"))
        .unwrap();

    assert_eq!(report.status, PatchStatus::Rewritten);
    assert_eq!(
        fs::read_to_string(&target).unwrap(),
        "define cc76 i16 @magic_h_id(i16 %name) {\n  ret i16 %name\n}\n"
    );
}

#[test]
fn test_load_missing_config_is_io_error() {
    let temp = tempdir().unwrap();
    let err = PatcherConfig::load(&temp.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, PatchError::Io { .. }), "got {:?}", err);
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_override_file_applied_to_module() {
    let temp = tempdir().unwrap();
    let body = temp.path().join("ldg.ll");
    fs::write(
        &body,
        "define i32 @ldg(i32* %p) {\n  %v = load i32, i32* %p\n  ret i32 %v\n}\n",
    )
    .unwrap();
    let target = temp.path().join("k.nvvm");
    fs::write(&target, "declare i32 @ldg(i32*)\n; tail\n").unwrap();

    let spec = format!("ldg={}", body.display());
    let config = PatcherConfig::new().with_override_file(&spec).unwrap();
    let report = Patcher::new(config)
        .patch(Dialect::IrPlain, &temp.path().join("k"))
        .unwrap();

    assert_eq!(report.overrides_applied, vec!["ldg"]);
    assert_eq!(
        fs::read_to_string(&target).unwrap(),
        "define i32 @ldg(i32* %p) {\n  %v = load i32, i32* %p\n  ret i32 %v\n}\n; tail\n"
    );
}

#[test]
fn test_override_spec_errors() {
    let temp = tempdir().unwrap();

    let err = PatcherConfig::new().with_override_file("ldg").unwrap_err();
    assert!(matches!(err, PatchError::Config(_)), "got {:?}", err);
    assert_eq!(err.exit_code(), 1);

    let spec = format!("ldg={}", temp.path().join("missing.ll").display());
    let err = PatcherConfig::new().with_override_file(&spec).unwrap_err();
    assert!(matches!(err, PatchError::Io { .. }), "got {:?}", err);
}
