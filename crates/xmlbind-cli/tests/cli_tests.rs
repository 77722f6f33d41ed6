use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

const MENU: &str = r#"<Menu><Dish id="1">Soup</Dish><Dish id="2">Steak</Dish></Menu>"#;

fn xmlbind() -> Result<Command, Box<dyn std::error::Error>> {
    Ok(Command::cargo_bin("xmlbind")?)
}

#[test]
fn test_fmt_from_stdin() -> Result<(), Box<dyn std::error::Error>> {
    xmlbind()?
        .arg("fmt")
        .write_stdin(MENU)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Menu>\n  <Dish id=\"1\">Soup</Dish>",
        ));
    Ok(())
}

#[test]
fn test_fmt_file_to_file_without_declaration() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("menu.xml");
    let output = dir.path().join("out.xml");
    fs::write(&input, MENU)?;

    xmlbind()?
        .arg("fmt")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .args(["--no-declaration", "--indent", "4"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = fs::read_to_string(&output)?;
    assert_eq!(
        written,
        "<Menu>\n    <Dish id=\"1\">Soup</Dish>\n    <Dish id=\"2\">Steak</Dish>\n</Menu>\n"
    );
    Ok(())
}

#[test]
fn test_find_prints_matches() -> Result<(), Box<dyn std::error::Error>> {
    xmlbind()?
        .args(["find", "dish[id=2]"])
        .write_stdin(MENU)
        .assert()
        .success()
        .stdout("<Dish id=\"2\">Steak</Dish>\n");

    xmlbind()?
        .args(["find", "Dish", "--values"])
        .write_stdin(MENU)
        .assert()
        .success()
        .stdout("Soup\nSteak\n");
    Ok(())
}

#[test]
fn test_get_path() -> Result<(), Box<dyn std::error::Error>> {
    xmlbind()?
        .args(["get", "Dish"])
        .write_stdin(MENU)
        .assert()
        .success()
        .stdout("Soup\n");

    xmlbind()?
        .args(["get", "Dish", "--all"])
        .write_stdin(MENU)
        .assert()
        .success()
        .stdout("Soup\nSteak\n");
    Ok(())
}

#[test]
fn test_get_missing_path_fails() -> Result<(), Box<dyn std::error::Error>> {
    xmlbind()?
        .args(["get", "Drink"])
        .write_stdin(MENU)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no element at path 'Drink'"));
    Ok(())
}

#[test]
fn test_invalid_selector_fails() -> Result<(), Box<dyn std::error::Error>> {
    xmlbind()?
        .args(["find", "Dish[id=1"])
        .write_stdin(MENU)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to search for 'Dish[id=1'"));
    Ok(())
}

#[test]
fn test_malformed_input_fails() -> Result<(), Box<dyn std::error::Error>> {
    xmlbind()?
        .arg("tree")
        .write_stdin("<a><b></a>")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse stdin"));
    Ok(())
}

#[test]
fn test_tree_outline() -> Result<(), Box<dyn std::error::Error>> {
    xmlbind()?
        .arg("tree")
        .write_stdin(MENU)
        .assert()
        .success()
        .stdout("Menu :  (0)\n Dish : Soup (1)\n Dish : Steak (1)\n");
    Ok(())
}

#[test]
fn test_empty_stdin_fails() -> Result<(), Box<dyn std::error::Error>> {
    xmlbind()?
        .arg("tree")
        .write_stdin("  \n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no input provided on stdin"));
    Ok(())
}
