use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

const INPUT: &str = "10\n5\n2\nAcme\nyes\nabc\n3\n4\n5\nBeta\nno\n";

const EXPECTED_STORE: &str = r"
Client,energy_kwh,transport_km,waste_kg,total_footprint
Acme,10.0,5.0,2.0,3.93
";

fn normalize_csv(content: &str) -> Vec<String> {
    content.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect()
}

fn run_binary(workdir: &std::path::Path, input: &str) -> std::process::Output {
    let bin_path = env!("CARGO_BIN_EXE_carbon_footprint");

    let mut child = Command::new(bin_path)
        .current_dir(workdir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute binary");

    child.stdin
        .take()
        .expect("Failed to open stdin")
        .write_all(input.as_bytes())
        .expect("Failed to write to stdin");

    child.wait_with_output().expect("Failed to wait for binary")
}

#[test]
fn test_carbon_footprint_binary() {
    let workdir = tempfile::tempdir().expect("Failed to create temporary directory");

    let output = run_binary(workdir.path(), INPUT);

    assert!(output.status.success(),
        "Binary failed with stderr: {}",
        String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Data for Acme added to CSV."));
    assert!(stdout.contains("Invalid input. Please enter numeric values."));
    assert!(stdout.contains("Data for Beta added to CSV."));
    assert!(stdout.contains("Graph saved as 'carbon_trends.png'."));
    assert!(stdout.contains("Added carbon_trends.png to Reports/Acme_report.pdf"));
    assert!(stdout.contains("Added carbon_trends.png to Reports/Beta_report.pdf"));
    assert!(stdout.contains("All reports generated successfully."));

    let store = fs::read_to_string(workdir.path().join("client_data.csv"))
        .expect("Store was not written");
    let lines = normalize_csv(&store);
    let expected = normalize_csv(EXPECTED_STORE);
    assert_eq!(lines.len(), 3, "Unexpected store contents:\n{}", store);
    assert_eq!(lines[..2], expected[..]);
    assert!(lines[2].starts_with("Beta,3.0,4.0,5.0,"));

    assert!(workdir.path().join("carbon_trends.png").is_file());
    for client in ["Acme", "Beta"] {
        let report = workdir.path().join("Reports").join(format!("{}_report.pdf", client));
        let bytes = fs::read(&report).expect("Report was not written");
        assert!(bytes.starts_with(b"%PDF"), "{} is not a PDF", report.display());
    }
}

#[test]
fn test_second_run_appends_without_new_header() {
    let workdir = tempfile::tempdir().expect("Failed to create temporary directory");

    assert!(run_binary(workdir.path(), "1\n1\n1\nFirst\nno\n").status.success());
    assert!(run_binary(workdir.path(), "2\n2\n2\nSecond\nno\n").status.success());

    let store = fs::read_to_string(workdir.path().join("client_data.csv")).unwrap();
    let lines = normalize_csv(&store);
    assert_eq!(lines.len(), 3);
    assert_eq!(store.matches("Client,energy_kwh").count(), 1);
    assert!(lines[1].starts_with("First,"));
    assert!(lines[2].starts_with("Second,"));
}

#[test]
fn test_empty_input_reports_no_data() {
    let workdir = tempfile::tempdir().expect("Failed to create temporary directory");

    let output = run_binary(workdir.path(), "");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No data found! Run the program and add client data first."));
    assert!(!workdir.path().join("carbon_trends.png").exists());
    assert!(!workdir.path().join("client_data.csv").exists());
}
