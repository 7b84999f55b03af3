use std::time::Duration;

use portsweep::output::{save_csv, save_json, write_csv, write_json, write_text};
use portsweep::types::{PortRecord, ResultSet, ScanReport};

fn rec(open: bool, svc: &str) -> PortRecord {
    PortRecord {
        open,
        service_guess: svc.to_string(),
    }
}

fn sample() -> ScanReport {
    let mut ports = ResultSet::new();
    ports.insert(443, rec(true, "HTTPS"));
    ports.insert(22, rec(true, "SSH"));
    ports.insert(23, rec(false, "Telnet"));
    ports.insert(9000, rec(true, ""));
    ScanReport {
        host: "10.0.0.5".into(),
        elapsed: Duration::from_millis(1234),
        ports,
    }
}

#[test]
fn text_lists_open_ports_ascending() {
    let mut buf = Vec::new();
    write_text(&mut buf, &sample()).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
    assert_eq!(
        lines,
        vec![
            "Scan results for 10.0.0.5 (elapsed 1.23s):",
            "  Open ports:",
            "   - 22 (SSH)",
            "   - 443 (HTTPS)",
            "   - 9000",
        ]
    );
}

#[test]
fn text_reports_no_open_ports() {
    let mut report = sample();
    report.ports.values_mut().for_each(|r| r.open = false);
    let mut buf = Vec::new();
    write_text(&mut buf, &report).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.contains("No open ports found"));
    assert!(!text.contains("Open ports:"));
}

#[test]
fn json_shape() {
    let mut buf = Vec::new();
    write_json(&mut buf, &sample()).unwrap();
    let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();
    assert_eq!(v["host"], "10.0.0.5");
    assert!((v["elapsed"].as_f64().unwrap() - 1.234).abs() < 1e-9);
    assert_eq!(v["ports"]["22"]["open"], true);
    assert_eq!(v["ports"]["23"]["open"], false);
    assert_eq!(v["ports"]["23"]["service_guess"], "Telnet");
    assert_eq!(v["ports"]["9000"]["service_guess"], "");
    assert_eq!(v["ports"].as_object().unwrap().len(), 4);

    let back: ScanReport = serde_json::from_slice(&buf).unwrap();
    assert_eq!(back.ports, sample().ports);
    assert!((back.elapsed.as_secs_f64() - 1.234).abs() < 1e-6);
}

#[test]
fn csv_layout() {
    let mut buf = Vec::new();
    write_csv(&mut buf, &sample()).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(
        text,
        "host,10.0.0.5\r\n\
         elapsed_seconds,1.2340\r\n\
         \r\n\
         port,open,service_guess\r\n\
         22,True,SSH\r\n\
         23,False,Telnet\r\n\
         443,True,HTTPS\r\n\
         9000,True,\r\n"
    );
}

#[test]
fn save_to_files() {
    let dir = std::env::temp_dir().join(format!("portsweep-out-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let json = dir.join("r.json");
    let csv = dir.join("r.csv");

    save_json(&json, &sample()).unwrap();
    save_csv(&csv, &sample()).unwrap();
    assert!(std::fs::read_to_string(&json).unwrap().contains("\"host\": \"10.0.0.5\""));
    assert!(std::fs::read_to_string(&csv).unwrap().starts_with("host,10.0.0.5\r\n"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn save_to_missing_dir_fails_with_path() {
    let path = std::env::temp_dir()
        .join("portsweep-missing-dir-for-test")
        .join("nested")
        .join("r.json");
    let err = save_json(&path, &sample()).unwrap_err();
    assert!(format!("{err:#}").contains("r.json"));
}
