//! FILENAME: tests/test_binning.rs
//! Integration tests for `runBinning`.

mod common;

use common::send;
use serde_json::json;
use worker::BINNING_PARAMETERS_MISSING;

#[test]
fn test_binning_labels_numeric_values() {
    let reply = send(
        "runBinning",
        json!({
            "records": [{ "Age": 23 }, { "Age": 30 }, { "Age": "41" }, { "Age": -1 }],
            "measure": "Age",
            "binSize": 10,
            "binName": "Age Band"
        }),
    );
    let bands: Vec<&serde_json::Value> = reply["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| &r["Age Band"])
        .collect();
    assert_eq!(bands, vec![&json!("20-30"), &json!("30-40"), &json!(null), &json!("-10-0")]);
    assert_eq!(reply["records"][0]["Age"], 23.0);
}

#[test]
fn test_binning_accepts_a_numeric_string_size() {
    let reply = send(
        "runBinning",
        json!({ "records": [{ "v": 7 }], "measure": "v", "binSize": "5", "binName": "b" }),
    );
    assert_eq!(reply["records"][0]["b"], "5-10");
}

#[test]
fn test_binning_is_idempotent() {
    let first = send(
        "runBinning",
        json!({ "records": [{ "v": 12.5 }], "measure": "v", "binSize": 5, "binName": "b" }),
    );
    let second = send(
        "runBinning",
        json!({ "records": first["records"].clone(), "measure": "v", "binSize": 5, "binName": "b" }),
    );
    assert_eq!(first, second);
}

#[test]
fn test_binning_without_parameters() {
    for payload in [
        json!({ "records": [], "binSize": 10, "binName": "b" }),
        json!({ "records": [], "measure": "v", "binName": "b" }),
        json!({ "records": [], "measure": "v", "binSize": 0, "binName": "b" }),
        json!({ "records": [], "measure": "v", "binSize": 10, "binName": "" }),
    ] {
        let reply = send("runBinning", payload);
        assert_eq!(reply, json!({ "error": BINNING_PARAMETERS_MISSING }));
    }
}
