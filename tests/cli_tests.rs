use std::fs;

use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn runs_countdown_program() {
    let mut cmd = Command::cargo_bin("kim").unwrap();
    cmd.arg("run").arg("tests/files/countdown.asm");

    cmd.assert()
        .success()
        .stdout(contains("Running"))
        .stdout(contains("X  0x03"))
        .stdout(contains("Completed"));
}

#[test]
fn checks_clean_program() {
    let mut cmd = Command::cargo_bin("kim").unwrap();
    cmd.arg("check").arg("tests/files/store.asm");

    cmd.assert().success().stdout(contains("with 0 errors"));
}

#[test]
fn reports_undefined_label() {
    let mut cmd = Command::cargo_bin("kim").unwrap();
    cmd.arg("check").arg("tests/files/broken.asm");

    cmd.assert()
        .failure()
        .stderr(contains("asm::undefined_label"));
}

#[test]
fn compiles_and_disassembles() {
    let out = std::env::temp_dir().join(format!("kim-cli-{}.prg", std::process::id()));

    let mut compile = Command::cargo_bin("kim").unwrap();
    compile
        .arg("compile")
        .arg("tests/files/store.asm")
        .arg(&out);
    compile.assert().success().stdout(contains("Saved to"));

    let mut dis = Command::cargo_bin("kim").unwrap();
    dis.arg("dis").arg(&out);
    dis.assert()
        .success()
        .stdout(contains("LDA #$01"))
        .stdout(contains("STA $0200"))
        .stdout(contains("BRK"));

    fs::remove_file(out).unwrap();
}
