use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use mermaid_drawio::config::LayoutConfig;
use mermaid_drawio::layout::compute_layout;
use mermaid_drawio::parser::parse_mermaid;
use mermaid_drawio::render::render_drawio;
use mermaid_drawio::theme::Theme;
use std::hint::black_box;

fn dense_flowchart_source(nodes: usize, extra_edges: usize) -> String {
    let mut out = String::from("flowchart LR\n");
    if nodes == 0 {
        return out;
    }
    for i in 0..nodes {
        out.push_str(&format!("  N{}[Node {}]\n", i, i));
    }
    for i in 0..nodes.saturating_sub(1) {
        out.push_str(&format!("  N{} --> N{}\n", i, i + 1));
    }
    let mut count = 0usize;
    for i in 0..nodes {
        for j in (i + 2)..nodes {
            if count >= extra_edges {
                break;
            }
            out.push_str(&format!("  N{} --> N{}\n", i, j));
            count += 1;
        }
        if count >= extra_edges {
            break;
        }
    }
    out
}

fn long_sequence_source(messages: usize) -> String {
    let mut out = String::from("sequenceDiagram\n  participant A\n  participant B\n  participant C\n");
    for i in 0..messages {
        let (from, to) = match i % 3 {
            0 => ("A", "B"),
            1 => ("B", "C"),
            _ => ("C", "A"),
        };
        out.push_str(&format!("  {from}->>{to}: step {i}\n"));
        if i % 10 == 9 {
            out.push_str(&format!("  Note over A,C: checkpoint {i}\n"));
        }
    }
    out
}

macro_rules! fixture {
    ($name:literal) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/", $name, ".mmd"))
    };
}

const FIXTURES: &[(&str, &str)] = &[
    ("barchart", fixture!("barchart")),
    ("flowchart", fixture!("flowchart")),
    ("gantt", fixture!("gantt")),
    ("journey", fixture!("journey")),
    ("kanban", fixture!("kanban")),
    ("orgchart", fixture!("orgchart")),
    ("pie", fixture!("pie")),
    ("sequence", fixture!("sequence")),
    ("swot", fixture!("swot")),
    ("timeline", fixture!("timeline")),
];

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for (name, input) in FIXTURES {
        group.bench_with_input(BenchmarkId::from_parameter(name), input, |b, data| {
            b.iter(|| {
                let parsed = parse_mermaid(black_box(data), None).expect("parse failed");
                black_box(parsed.diagram.kind());
            });
        });
    }
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let theme = Theme::default();
    let config = LayoutConfig::default();
    for (name, input) in FIXTURES {
        let parsed = parse_mermaid(input, None).expect("parse failed");
        group.bench_with_input(
            BenchmarkId::from_parameter(name),
            &parsed.diagram,
            |b, diagram| {
                b.iter(|| {
                    let layout = compute_layout(black_box(diagram), &theme, &config);
                    black_box(layout.cells.len());
                });
            },
        );
    }
    group.finish();
}

fn bench_large_inputs(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_large");
    let theme = Theme::default();
    let config = LayoutConfig::default();
    let sources = [
        ("dense_40_80".to_string(), dense_flowchart_source(40, 80)),
        ("dense_80_320".to_string(), dense_flowchart_source(80, 320)),
        ("sequence_300".to_string(), long_sequence_source(300)),
    ];
    for (name, input) in sources {
        let parsed = parse_mermaid(&input, None).expect("parse failed");
        group.bench_with_input(
            BenchmarkId::from_parameter(name),
            &parsed.diagram,
            |b, diagram| {
                b.iter(|| {
                    let layout = compute_layout(black_box(diagram), &theme, &config);
                    black_box(layout.width);
                });
            },
        );
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");
    let theme = Theme::default();
    let config = LayoutConfig::default();
    for (name, input) in FIXTURES {
        group.bench_with_input(BenchmarkId::from_parameter(name), input, |b, data| {
            b.iter(|| {
                let parsed = parse_mermaid(black_box(data), None).expect("parse failed");
                let layout = compute_layout(&parsed.diagram, &theme, &config);
                let xml = render_drawio(&layout).expect("render failed");
                black_box(xml.len());
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_parse,
    bench_layout,
    bench_large_inputs,
    bench_end_to_end
);
criterion_main!(benches);
