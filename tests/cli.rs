use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn lzpress(args: &[&Path]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lzpress"))
        .args(args)
        .output()
        .expect("could not run lzpress")
}

fn arg(s: &str) -> &Path {
    Path::new(s)
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Fixture { dir: tempfile::tempdir().expect("Error creating temporary directory") }
    }

    fn file(&self, name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).expect("Error writing fixture");
        path
    }

    fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }
}

#[test]
fn compress_then_decompress() {
    let fx = Fixture::new();
    let data = b"the quick brown fox jumps over the lazy dog. ".repeat(500);
    let raw = fx.file("input.txt", &data);
    let packed = fx.path("input.lzp");
    let unpacked = fx.path("output.txt");

    let out = lzpress(&[arg("compress"), &raw, &packed]);
    assert!(out.status.success(), "{:?}", out);
    let frame = fs::read(&packed).unwrap();
    assert_eq!(&frame[..4], b"LZP1");
    assert!(frame.len() < data.len());

    let out = lzpress(&[arg("decompress"), &packed, &unpacked]);
    assert!(out.status.success(), "{:?}", out);
    assert_eq!(fs::read(&unpacked).unwrap(), data);

    let out = lzpress(&[arg("verify"), &packed, &raw]);
    assert!(out.status.success(), "{:?}", out);
}

#[test]
fn compress_with_tuning_flags() {
    let fx = Fixture::new();
    let data = b"0123456789".repeat(300);
    let raw = fx.file("input", &data);
    let packed = fx.path("packed");

    let out = lzpress(&[
        arg("compress"), &raw, &packed,
        arg("--window-size"), arg("512"),
        arg("--min-match"), arg("8"),
        arg("--search-depth"), arg("2"),
    ]);
    assert!(out.status.success(), "{:?}", out);
    assert_eq!(lz_press::decompress(&fs::read(&packed).unwrap()).unwrap(), data);
}

#[test]
fn invalid_settings_fail_without_output() {
    let fx = Fixture::new();
    let raw = fx.file("input", b"abc");
    let packed = fx.path("packed");

    let out = lzpress(&[arg("compress"), &raw, &packed, arg("--min-match"), arg("2")]);
    assert_eq!(out.status.code(), Some(1));
    assert!(!packed.exists());
}

#[test]
fn verify_detects_mismatch() {
    let fx = Fixture::new();
    let packed = fx.file("packed", &lz_press::compress(b"expected contents"));
    let other = fx.file("other", b"expected c0ntents");

    let out = lzpress(&[arg("verify"), &packed, &other]);
    assert_eq!(out.status.code(), Some(6));
    assert!(String::from_utf8_lossy(&out.stderr).contains("byte 10"));
}

#[test]
fn corrupt_inputs_map_to_exit_codes_and_leave_no_output() {
    let fx = Fixture::new();
    let good = lz_press::compress(b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    let target = fx.path("target");

    let not_a_frame = fx.file("not_a_frame", b"plain text, no magic here");
    let out = lzpress(&[arg("decompress"), &not_a_frame, &target]);
    assert_eq!(out.status.code(), Some(3));

    let truncated = fx.file("truncated", &good[..good.len() - 1]);
    let out = lzpress(&[arg("decompress"), &truncated, &target]);
    assert_eq!(out.status.code(), Some(4));

    let mut wrong_len = good.clone();
    wrong_len[4] ^= 0x01;
    let corrupt = fx.file("corrupt", &wrong_len);
    let out = lzpress(&[arg("decompress"), &corrupt, &target]);
    assert_eq!(out.status.code(), Some(5));

    assert!(!target.exists());
}

#[test]
fn failed_decompression_keeps_existing_output() {
    let fx = Fixture::new();
    let target = fx.file("target", b"previous contents");
    let garbage = fx.file("garbage", b"LZP1");

    let out = lzpress(&[arg("decompress"), &garbage, &target]);
    assert!(!out.status.success());
    assert_eq!(fs::read(&target).unwrap(), b"previous contents");
}

#[test]
fn stats_reports_tokens() {
    let fx = Fixture::new();
    let packed = fx.file("packed", &lz_press::compress(b"aaaaaaaaaa"));

    let out = lzpress(&[arg("stats"), &packed]);
    assert!(out.status.success(), "{:?}", out);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Uncompressed size: 10 bytes"), "{}", stdout);
    assert!(stdout.contains("2 (1 literals, 1 copies)"), "{}", stdout);
    assert!(stdout.contains("Longest copy:      9"), "{}", stdout);
}

#[test]
fn missing_input_is_an_io_error() {
    let fx = Fixture::new();
    let out = lzpress(&[arg("compress"), &fx.path("does-not-exist"), &fx.path("out")]);
    assert_eq!(out.status.code(), Some(1));
}
