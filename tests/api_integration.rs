#![cfg(feature = "api")]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::Value;

const RESULT_KEYS: &[&str] = &[
    "date_time",
    "P_load_kW",
    "P_pv_kW",
    "electricity_price_customer_EUR_kWh",
    "CO2_emissions_g_kWh",
    "P_charge_kW",
    "P_discharge_kW",
    "P_feed_in_kW",
    "P_purchase_kW",
    "W_batt_kWh",
    "SoC_%",
    "E_purchase_kWh",
    "E_feed_in_kWh",
    "CO2_generated_g",
];

struct ChildGuard {
    child: Child,
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[test]
fn served_run_exposes_summary_results_and_strategy() {
    let port = allocate_port();
    let addr = format!("127.0.0.1:{port}");
    let _child = spawn_server(port);

    wait_for_server(&addr, Duration::from_secs(8));

    let (status, body) = http_get(&addr, "/summary").expect("/summary request should succeed");
    assert_eq!(status, 200);
    let summary: Value = serde_json::from_str(&body).expect("summary should be JSON");
    assert_eq!(summary["strategy"], "Reference");
    assert_eq!(summary["status"], "valid");

    let (status, body) =
        http_get(&addr, "/results?from=2&to=4").expect("/results request should succeed");
    assert_eq!(status, 200);
    let rows: Value = serde_json::from_str(&body).expect("results should be JSON");
    let rows = rows.as_array().expect("results should be an array");
    assert_eq!(rows.len(), 3);
    for row in rows {
        let row = row.as_object().expect("row should be an object");
        for key in RESULT_KEYS {
            assert!(row.contains_key(*key), "missing key: {key}");
        }
    }
    assert_eq!(rows[0]["date_time"], "2015-01-01 02:00:00");

    let (status, _) = http_get(&addr, "/results?from=4&to=2").expect("request should succeed");
    assert_eq!(status, 400);

    let (status, body) = http_get(&addr, "/strategy").expect("/strategy request should succeed");
    assert_eq!(status, 200);
    let rules: Value = serde_json::from_str(&body).expect("strategy should be JSON");
    assert_eq!(rules.as_array().map(Vec::len), Some(6));
}

fn allocate_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("ephemeral port bind should succeed");
    let port = listener.local_addr().expect("local_addr should be available").port();
    drop(listener);
    port
}

fn spawn_server(port: u16) -> ChildGuard {
    let child = Command::new(env!("CARGO_BIN_EXE_pv-battery-sim"))
        .args(["run", "--serve", "--port", &port.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("pv-battery-sim process should spawn");

    ChildGuard { child }
}

fn wait_for_server(addr: &str, timeout: Duration) {
    let start = Instant::now();
    loop {
        if let Ok((200, _)) = http_get(addr, "/summary") {
            return;
        }

        if start.elapsed() >= timeout {
            panic!("timed out waiting for API server on {addr}");
        }

        thread::sleep(Duration::from_millis(50));
    }
}

fn http_get(addr: &str, path: &str) -> Result<(u16, String), String> {
    let mut stream = TcpStream::connect(addr).map_err(|err| format!("connect: {err}"))?;
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).map_err(|err| format!("write: {err}"))?;

    let mut raw = String::new();
    stream.read_to_string(&mut raw).map_err(|err| format!("read: {err}"))?;

    let (head, body) = raw
        .split_once("\r\n\r\n")
        .ok_or_else(|| "invalid HTTP response".to_string())?;
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .ok_or_else(|| "missing status code".to_string())?
        .parse::<u16>()
        .map_err(|err| format!("invalid status code: {err}"))?;

    Ok((status, body.to_string()))
}
