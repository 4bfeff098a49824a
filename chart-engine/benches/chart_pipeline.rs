use chart_engine::{process_chart, ChartKind, ChartRequest};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use engine::{Aggregation, DrillLevel, FieldDescriptor, Filter, Record, Value};
use std::time::Duration;

fn bench_rows() -> usize {
    std::env::var("CHART_PIPELINE_BENCH_ROWS")
        .ok()
        .and_then(|v| v.replace('_', "").parse::<usize>().ok())
        .filter(|&v| (1_000..=2_000_000).contains(&v))
        .unwrap_or(100_000)
}

fn build_records(rows: usize) -> Vec<Record> {
    const REGIONS: [&str; 5] = ["North", "South", "East", "West", "Central"];
    const SEGMENTS: [&str; 3] = ["Consumer", "Corporate", "Home Office"];

    (0..rows)
        .map(|i| {
            let month = i % 12 + 1;
            let day = i % 28 + 1;
            let mut record = Record::new();
            record.insert("Region", Value::from(REGIONS[i % REGIONS.len()]));
            record.insert("Segment", Value::from(SEGMENTS[i % SEGMENTS.len()]));
            record.insert("Order Date", Value::from(format!("2023-{:02}-{:02}", month, day)));
            record.insert("Sales", Value::from((i % 100) as f64));
            record.insert("Profit", Value::from((i % 17) as f64 - 4.0));
            record
        })
        .collect()
}

fn bar_request(records: &[Record]) -> ChartRequest {
    let mut request = ChartRequest {
        records: Some(records.to_vec()),
        measures: vec![
            FieldDescriptor::measure("Sales"),
            FieldDescriptor::measure("Profit").with_aggregation(Aggregation::Avg),
            FieldDescriptor::calculated("Margin", "SUM([Profit]) / SUM([Sales])"),
        ],
        ..Default::default()
    };
    request.config.active_chart_type = ChartKind::Bar;
    request.config.shelves.columns = vec![FieldDescriptor::dimension("Region")];
    request.config.shelves.rows = vec![
        FieldDescriptor::measure("Sales"),
        FieldDescriptor::measure("Profit"),
        FieldDescriptor::measure("Margin"),
    ];
    request.config.shelves.color = vec![FieldDescriptor::dimension("Segment")];
    request
}

fn pivot_request(records: &[Record]) -> ChartRequest {
    let mut request = ChartRequest {
        records: Some(records.to_vec()),
        measures: vec![FieldDescriptor::measure("Sales")],
        ..Default::default()
    };
    request.config.active_chart_type = ChartKind::Pivot;
    request.config.shelves.pivot_rows = vec![FieldDescriptor::dimension("Region")];
    request.config.shelves.pivot_columns = vec![FieldDescriptor::date("Order Date", DrillLevel::Quarter)];
    request.config.shelves.pivot_values = vec![FieldDescriptor::measure("Sales")];
    request
}

fn bench_chart_pipeline(c: &mut Criterion) {
    let rows = bench_rows();
    let records = build_records(rows);

    let mut group = c.benchmark_group("chart_pipeline");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(10));
    group.throughput(Throughput::Elements(rows as u64));

    group.bench_with_input(BenchmarkId::new("bar_two_keys", rows), &rows, |b, _| {
        b.iter(|| black_box(process_chart(bar_request(&records))))
    });

    group.bench_with_input(BenchmarkId::new("bar_top_n", rows), &rows, |b, _| {
        b.iter(|| {
            let mut request = bar_request(&records);
            request.config.shelves.filters = vec![
                Filter::range("Profit", 0.0, 10.0),
                Filter::top_n("Sales", 3, "Sales"),
            ];
            black_box(process_chart(request))
        })
    });

    group.bench_with_input(BenchmarkId::new("pivot_by_quarter", rows), &rows, |b, _| {
        b.iter(|| black_box(process_chart(pivot_request(&records))))
    });

    group.finish();
}

criterion_group!(benches, bench_chart_pipeline);
criterion_main!(benches);
