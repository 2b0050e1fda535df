#![cfg(feature = "cli")]

use std::fs;
use std::path::Path;

use clap::Parser;
use mermaid_drawio::ConvertError;
use mermaid_drawio::cli::{Args, run_with};

fn args(argv: &[&str]) -> Args {
    Args::try_parse_from(std::iter::once("mmd2drawio").chain(argv.iter().copied()))
        .expect("arguments should parse")
}

fn write_fixture(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn converts_to_the_explicit_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "pets.mmd", "pie title Pets\n\"Dogs\" : 3\n\"Cats\" : 1\n");
    let output = dir.path().join("pets.drawio");
    let output_str = output.to_string_lossy().into_owned();

    run_with(&args(&["-i", &input, "-o", &output_str])).unwrap();

    let xml = fs::read_to_string(&output).unwrap();
    let doc = roxmltree::Document::parse(&xml).unwrap();
    let diagram = doc
        .descendants()
        .find(|n| n.has_tag_name("diagram"))
        .unwrap();
    assert_eq!(diagram.attribute("name"), Some("Pie Chart"));
}

#[test]
fn sequence_default_output_sits_next_to_the_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "login.mmd", "sequenceDiagram\nA->>B: hi\n");

    run_with(&args(&["-i", &input])).unwrap();

    assert!(dir.path().join("login_diagram.drawio.xml").exists());
}

#[test]
fn kind_argument_overrides_detection() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "team.mmd", "graph TD\nboss[Boss] --> dev[Dev]\n");
    let output = dir.path().join("team.drawio").to_string_lossy().into_owned();

    run_with(&args(&["org", "-i", &input, "-o", &output])).unwrap();

    let xml = fs::read_to_string(&output).unwrap();
    assert!(xml.contains("name=\"Org Chart\""));
}

#[test]
fn missing_input_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("nope.mmd").to_string_lossy().into_owned();
    let output = dir.path().join("out.drawio");
    let output_str = output.to_string_lossy().into_owned();

    let err = run_with(&args(&["-i", &input, "-o", &output_str])).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ConvertError>(),
        Some(ConvertError::InputNotFound(_))
    ));
    assert!(!output.exists());
}

#[test]
fn parse_errors_leave_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "bad.mmd", "gantt\nTask : after ghost, 2d\n");
    let output = dir.path().join("bad.drawio");
    let output_str = output.to_string_lossy().into_owned();

    let err = run_with(&args(&["-i", &input, "-o", &output_str])).unwrap_err();

    assert!(err.to_string().contains("line 2"));
    assert!(!output.exists());
}

#[test]
fn markdown_blocks_get_numbered_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(
        dir.path(),
        "notes.md",
        "# Notes\n```mermaid\npie\n\"a\" : 1\n```\n\n```mermaid\ntimeline\n2020 : start\n```\n",
    );
    let output = dir.path().join("notes.drawio").to_string_lossy().into_owned();
    let dump = dir.path().join("notes.json").to_string_lossy().into_owned();

    run_with(&args(&["-i", &input, "-o", &output, "--dump-layout", &dump])).unwrap();

    assert!(dir.path().join("notes-1.drawio").exists());
    assert!(dir.path().join("notes-2.drawio").exists());
    let layout = fs::read_to_string(dir.path().join("notes-2.json")).unwrap();
    assert!(layout.contains("\"kind\": \"Timeline\""));
}

#[test]
fn config_file_changes_the_palette() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "flow.mmd", "flowchart LR\nA --> B\n");
    let config = write_fixture(
        dir.path(),
        "config.json",
        r##"{ "themeVariables": { "lineColor": "#123456" } }"##,
    );
    let output = dir.path().join("flow.drawio").to_string_lossy().into_owned();

    run_with(&args(&["-i", &input, "-o", &output, "-c", &config])).unwrap();

    let xml = fs::read_to_string(&output).unwrap();
    assert!(xml.contains("strokeColor=#123456"));
}
