//! FILENAME: tests/common/mod.rs
//! Fixtures and request helpers for worker integration tests.

#![allow(dead_code)]

use serde_json::{json, Value as JsonValue};
use worker::handle_message;

/// Sends one request through the dispatcher and returns the reply.
pub fn send(kind: &str, payload: JsonValue) -> JsonValue {
    let line = json!({ "type": kind, "payload": payload }).to_string();
    handle_message(&line)
}

pub fn dimension(name: &str) -> JsonValue {
    json!({ "name": name, "type": "dimension" })
}

pub fn measure(name: &str) -> JsonValue {
    json!({ "name": name, "type": "measure" })
}

pub fn date(name: &str, level: &str) -> JsonValue {
    json!({ "name": name, "type": "dimension", "isDate": true, "drillLevel": level })
}

pub fn calculated(name: &str, formula: &str) -> JsonValue {
    json!({ "name": name, "type": "measure", "isCalculated": true, "formula": formula })
}

/// Three rows over two regions: A sums to 30, B to 5.
pub fn region_sales() -> JsonValue {
    json!([
        { "Region": "A", "Sales": 10 },
        { "Region": "A", "Sales": 20 },
        { "Region": "B", "Sales": 5 }
    ])
}

/// Twelve orders across regions, segments and months of 2024.
pub fn orders() -> JsonValue {
    json!([
        { "Region": "East",  "Segment": "Consumer",  "Order Date": "2024-01-05", "Sales": 120, "Profit": 30, "Review": "fast delivery, great price" },
        { "Region": "West",  "Segment": "Corporate", "Order Date": "2024-01-17", "Sales": 80,  "Profit": -5, "Review": "late delivery" },
        { "Region": "East",  "Segment": "Corporate", "Order Date": "2024-02-02", "Sales": 200, "Profit": 50, "Review": "great service" },
        { "Region": "South", "Segment": "Consumer",  "Order Date": "2024-02-20", "Sales": 40,  "Profit": 4,  "Review": "ok" },
        { "Region": "West",  "Segment": "Consumer",  "Order Date": "2024-03-11", "Sales": 60,  "Profit": 12, "Review": "great" },
        { "Region": "East",  "Segment": "Consumer",  "Order Date": "2024-04-08", "Sales": 90,  "Profit": 18, "Review": "delivery was fast" },
        { "Region": "South", "Segment": "Corporate", "Order Date": "2024-04-30", "Sales": 150, "Profit": 45, "Review": "great value" },
        { "Region": "West",  "Segment": "Corporate", "Order Date": "2024-05-14", "Sales": 70,  "Profit": 7,  "Review": "fine" },
        { "Region": "East",  "Segment": "Corporate", "Order Date": "2024-06-01", "Sales": 30,  "Profit": -2, "Review": "damaged" },
        { "Region": "South", "Segment": "Consumer",  "Order Date": "2024-07-19", "Sales": 110, "Profit": 22, "Review": "fast" },
        { "Region": "West",  "Segment": "Consumer",  "Order Date": "2024-08-23", "Sales": 95,  "Profit": 19, "Review": "great delivery" },
        { "Region": "East",  "Segment": "Consumer",  "Order Date": "bad date",   "Sales": 10,  "Profit": 1,  "Review": "meh" }
    ])
}

/// Builds a `processDataForChart` payload.
pub fn chart_payload(
    records: JsonValue,
    chart_type: &str,
    shelves: JsonValue,
    measures: JsonValue,
) -> JsonValue {
    json!({
        "records": records,
        "config": { "id": 1, "activeChartType": chart_type, "shelves": shelves },
        "measures": measures
    })
}

pub fn sales_measures() -> JsonValue {
    json!([measure("Sales"), measure("Profit")])
}
