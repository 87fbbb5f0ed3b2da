use std::fs;
use std::path::PathBuf;

use h12_transform::TransformOptions;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn out_dir(tag: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../target/h12-cli-tests")
        .join(format!("{}-{tag}", std::process::id()))
}

#[test]
fn build_rewrites_directory_tree() {
    let out = out_dir("tree");
    let written = h12_cli::build_cmd(&fixture("app"), Some(out.as_path()), TransformOptions::default())
        .expect("build fixture tree");
    assert_eq!(written, vec![out.join("main.rs"), out.join("widgets/plain.rs")]);

    let main = fs::read_to_string(out.join("main.rs")).expect("read main.rs");
    assert!(main.contains(r#"Ok(this.node("main", vec![this.node("h1""#));
    assert!(!main.contains("<>"));
    assert!(main.contains("pub const H12_TRANSFORM_VERSION: &str = \"2.2.0\";"));

    let plain = fs::read_to_string(out.join("widgets/plain.rs")).expect("read plain.rs");
    assert_eq!(plain, fs::read_to_string(fixture("app/widgets/plain.rs")).unwrap());
}

#[test]
fn build_single_file() {
    let out = out_dir("single");
    let written = h12_cli::build_cmd(&fixture("app/main.rs"), Some(out.as_path()), TransformOptions::default())
        .expect("build one file");
    assert_eq!(written, vec![out.join("main.rs")]);
}

#[test]
fn build_reports_bad_templates() {
    let out = out_dir("broken");
    let err = h12_cli::build_cmd(&fixture("broken.rs"), Some(out.as_path()), TransformOptions::default())
        .unwrap_err();
    assert!(format!("{err:#}").contains("exactly one root element"));
}

#[test]
fn check_validates_without_writing() {
    assert_eq!(h12_cli::check_cmd(&fixture("app"), TransformOptions::default()).unwrap(), 2);
    assert!(h12_cli::check_cmd(&fixture("broken.rs"), TransformOptions::default()).is_err());
}
