//! Rule evaluation throughput
//!
//! Run with: cargo bench -p chatward-rules

use chatward_core::{Actor, Category, EventKind};
use chatward_rules::{
    parse_rules, EngineSettings, HandlerSet, ManualScheduler, RecordingHost, RuleEngine, RuleSet,
};
use chatward_telemetry::MemoryAuditSink;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use std::sync::Arc;

const GLOBAL_RULES: &str = r#"
match \b(f+(\W|\d|_)*u+(\W|\d|_)*c+(\W|\d|_)*k+|s+(\W|\d|_)*h+(\W|\d|_)*i+(\W|\d|_)*t+)
id swear
then replace ****

match [0-9]{1,3}(\.|dot|\(dot\)|-|;|:|,|(\W|\d|_)*\s)+(\W|\d|_)*[0-9]{1,3}(\.|dot|\(dot\)|-|;|:|,|(\W|\d|_)*\s)+(\W|\d|_)*[0-9]{1,3}(\.|dot|\(dot\)|-|;|:|,|(\W|\d|_)*\s)+(\W|\d|_)*[0-9]{1,3}
id ip-ads
then deny

match (.)\1{5,}
id repeated
then replace $1
"#;

const CHAT_RULES: &str = r#"
match ^(hi|hello|hey)$
then rewrite Hello everyone!

match \blag(gy|ging)?\b
then warn Tell staff instead
"#;

const PACKET_RULES: &str = r#"
match unknown command
then rewrite Unknown command.
dont verbose

match spoiler
then deny
dont verbose
"#;

fn engine() -> RuleEngine {
    let handlers = HandlerSet::new();
    let mut rules = RuleSet::new();
    for (category, source) in [
        (Category::Global, GLOBAL_RULES),
        (Category::Chat, CHAT_RULES),
        (Category::Packet, PACKET_RULES),
    ] {
        rules
            .insert(category, parse_rules(category, source, &handlers).unwrap())
            .unwrap();
    }

    let settings = EngineSettings {
        verbose_rules: false,
        ..EngineSettings::default()
    };

    RuleEngine::builder(
        settings,
        Arc::new(RecordingHost::new()),
        Arc::new(ManualScheduler::new()),
    )
    .audit(Arc::new(MemoryAuditSink::new()))
    .build(rules)
}

fn benchmark_evaluate(c: &mut Criterion) {
    let engine = engine();
    let actor = Actor::new("steve", "world");

    let test_cases = vec![
        ("clean_short", "hello there"),
        ("clean_long", "The quick brown fox jumps over the lazy dog and keeps running across the field."),
        ("swear", "what the fuuuck is this"),
        ("advertising", "join 192.168.0.1 now"),
        ("repeated", "nooooooooooo"),
    ];

    let mut group = c.benchmark_group("RuleEngine_Evaluate");
    group.sample_size(100);

    for (name, text) in test_cases {
        group.bench_with_input(BenchmarkId::new("chat", name), &text, |b, text| {
            b.iter(|| engine.evaluate(EventKind::Chat, &actor, black_box(text)));
        });
    }

    group.finish();
}

fn benchmark_packets(c: &mut Criterion) {
    let engine = engine();
    let actor = Actor::new("steve", "world");
    let tree = json!({
        "text": "",
        "extra": [
            {"text": "Unknown command", "color": "red"},
            {"text": ". Type \"/help\" for help.", "color": "gray"},
            ["nested", {"text": "components"}]
        ]
    });

    let mut group = c.benchmark_group("PacketTextRewriter");
    group.bench_function("rewrite_tree", |b| {
        b.iter(|| engine.rewrite_packet(&actor, black_box(tree.clone())));
    });
    group.finish();
}

criterion_group!(benches, benchmark_evaluate, benchmark_packets);
criterion_main!(benches);
