use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const LOOPS: &str = "\
data = [1, 2, 3]
for i in range(len(data)):
    data[i] = data[i] + 1
for i in range(5000):
    for j in range(3):
        total = i * j
";

#[test]
fn test_optimize_writes_code_and_report() -> Result<()> {
    let temp = TempDir::new()?;
    let script = temp.path().join("loops.py");
    fs::write(&script, LOOPS)?;
    let out_dir = temp.path().join("out");
    let report = temp.path().join("report.html");

    let mut cmd = Command::cargo_bin("loopscope-bin")?;
    cmd.arg(&script)
        .arg("--no-profile")
        .arg("--output-dir")
        .arg(&out_dir)
        .arg("--report")
        .arg(&report)
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::contains("Optimization complete. Report saved as '"))
        .stdout(predicate::str::contains("Optimized code saved to '"))
        .stdout(predicate::str::contains("loops_optimized.py'."));

    let optimized = fs::read_to_string(out_dir.join("loops_optimized.py"))?;
    assert!(optimized.starts_with("import numpy as np\nimport itertools\n"));
    assert!(optimized.contains("data = data + 1"));
    assert!(optimized.contains("for i, j in itertools.product(range(5000), range(3)):"));

    let html = fs::read_to_string(&report)?;
    assert!(html.contains("Code Optimization Report"));
    assert!(html.contains("Consider optimizing loop with range(5000)."));
    assert!(html.contains("Profiling was not run."));
    Ok(())
}

#[test]
fn test_analyze_json() -> Result<()> {
    let temp = TempDir::new()?;
    let script = temp.path().join("loops.py");
    fs::write(&script, LOOPS)?;

    let output = Command::cargo_bin("loopscope-bin")?
        .arg("analyze")
        .arg(&script)
        .arg("--json")
        .output()?;
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let findings = &json[0]["findings"];
    assert_eq!(findings["highIterations"][0]["bound"], "5000");
    assert_eq!(findings["nestedLoops"][0]["line"], 5);
    assert_eq!(findings["repeatedComputations"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[test]
fn test_analyze_reports_parse_errors_without_failing() -> Result<()> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join("good.py"), "for i in range(5000):\n    pass\n")?;
    fs::write(temp.path().join("bad.py"), "for i in :\n")?;

    let mut cmd = Command::cargo_bin("loopscope-bin")?;
    cmd.arg("analyze")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Parse Errors"))
        .stdout(predicate::str::contains("Files: 2"));
    Ok(())
}

#[test]
fn test_rewrite_prints_to_stdout() -> Result<()> {
    let temp = TempDir::new()?;
    let script = temp.path().join("nested.py");
    fs::write(
        &script,
        "for i in range(3):\n    for j in range(4):\n        print(i, j)\n",
    )?;

    let mut cmd = Command::cargo_bin("loopscope-bin")?;
    cmd.arg("rewrite").arg(&script).assert().success().stdout(
        "import itertools\nfor i, j in itertools.product(range(3), range(4)):\n    print(i, j)\n",
    );
    Ok(())
}

#[test]
fn test_no_flatten_flag() -> Result<()> {
    let temp = TempDir::new()?;
    let script = temp.path().join("nested.py");
    let source = "for i in range(3):\n    for j in range(4):\n        print(i, j)\n";
    fs::write(&script, source)?;

    let mut cmd = Command::cargo_bin("loopscope-bin")?;
    cmd.arg("rewrite")
        .arg(&script)
        .arg("--no-flatten")
        .assert()
        .success()
        .stdout(source);
    Ok(())
}

#[test]
fn test_config_file_sets_threshold() -> Result<()> {
    let temp = TempDir::new()?;
    fs::write(
        temp.path().join(".loopscope.toml"),
        "[loopscope]\nhigh_iteration_threshold = 10\n",
    )?;
    let script = temp.path().join("small.py");
    fs::write(&script, "for i in range(50):\n    pass\n")?;

    let output = Command::cargo_bin("loopscope-bin")?
        .arg("analyze")
        .arg(&script)
        .arg("--json")
        .output()?;
    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json[0]["findings"]["highIterations"][0]["bound"], "50");

    // The flag wins over the file.
    let output = Command::cargo_bin("loopscope-bin")?
        .arg("analyze")
        .arg(&script)
        .arg("--json")
        .arg("--threshold")
        .arg("100")
        .output()?;
    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json[0]["findings"]["highIterations"], serde_json::json!([]));
    Ok(())
}

#[test]
fn test_missing_path_fails() -> Result<()> {
    let mut cmd = Command::cargo_bin("loopscope-bin")?;
    cmd.arg("analyze")
        .arg("definitely/not/here.py")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));
    Ok(())
}

#[test]
fn test_no_paths_is_usage_error() -> Result<()> {
    let mut cmd = Command::cargo_bin("loopscope-bin")?;
    cmd.assert().code(1);
    Ok(())
}
