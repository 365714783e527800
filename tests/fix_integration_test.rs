//! Integration tests for the fix command.

use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn ora2mssql() -> Command {
    Command::new(env!("CARGO_BIN_EXE_ora2mssql"))
}

#[test]
fn test_fix_clean_file_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("export.sql");
    fs::write(
        &input,
        "CREATE TABLE \"ADMIN\".\"CLIENTS\" (\"ID\" NUMBER(10,0) NOT NULL ENABLE, \"NAME\" VARCHAR2(100));\n",
    )
    .unwrap();
    let base = dir.path().join("out").to_string_lossy().into_owned();

    let output = ora2mssql()
        .args(["convert", input.to_str().unwrap(), "-o", &base])
        .output()
        .unwrap();
    assert!(output.status.success(), "Command failed: {:?}", output);

    let definitions = format!("{}_definitions.sql", base);
    let fixed = dir.path().join("fixed.sql");
    let output = ora2mssql()
        .args([
            "fix",
            &definitions,
            "-o",
            fixed.to_str().unwrap(),
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "Command failed: {:?}", output);

    let before = fs::read_to_string(&definitions).unwrap();
    let after = fs::read_to_string(&fixed).unwrap();
    assert_eq!(before, after, "clean definitions must pass through unchanged");
}

#[test]
fn test_fix_repairs_dropped_comma() {
    let dir = TempDir::new().unwrap();
    let damaged = dir.path().join("damaged_definitions.sql");
    fs::write(
        &damaged,
        "-- Table: CLIENT_ENTITIES\n\
         IF EXISTS(SELECT name FROM sys.sysobjects WHERE Name = N'CLIENT_ENTITIES' AND xtype = N'U')\n\
         BEGIN\n\
         \x20\x20\x20\x20DROP TABLE [ADMIN].[CLIENT_ENTITIES]\n\
         END\n\
         GO\n\
         \n\
         CREATE TABLE [ADMIN].[CLIENT_ENTITIES] (\n\
         \x20\x20\x20\x20[NAME] NVARCHAR(100)\n\
         \x20\x20\x20\x20[DESCRIPTION] NVARCHAR(200)\n\
         );\n\
         GO\n",
    )
    .unwrap();
    let fixed = dir.path().join("fixed.sql");

    let output = ora2mssql()
        .args(["fix", damaged.to_str().unwrap(), "-o", fixed.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success(), "Command failed: {:?}", output);

    let text = fs::read_to_string(&fixed).unwrap();
    assert!(text.contains("[NAME] NVARCHAR(100),"));
    assert!(text.contains("[DESCRIPTION] NVARCHAR(200)"));
    assert!(text.contains("-- Table: CLIENT_ENTITIES"));
    assert!(text.trim_end().ends_with("GO"));
}

#[test]
fn test_fix_default_output_name() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("defs.sql");
    fs::write(&input, "CREATE TABLE [A].[T] (\n    [ID] INT\n);\nGO\n").unwrap();

    let output = ora2mssql()
        .args(["fix", input.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(dir.path().join("defs_fixed.sql").exists());
}
