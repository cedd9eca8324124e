use quarry_engine::{
    BuildStage, EngineBuilder, EngineError, IndexBuildOptions, QueryOptions, SearchEngine,
};
use pretty_assertions::assert_eq;
use quarry_protocol::{CallGraphInput, ParsedSymbol, SourceFile, SymbolKind};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn file(path: &str, content: &str) -> SourceFile {
    SourceFile {
        path: path.to_string(),
        content: content.to_string(),
        language: "c".to_string(),
    }
}

fn symbol(name: &str, line: u32, signature: &str) -> ParsedSymbol {
    ParsedSymbol {
        name: name.to_string(),
        kind: SymbolKind::Function,
        line,
        signature: signature.to_string(),
    }
}

fn corpus() -> (Vec<SourceFile>, HashMap<String, Vec<ParsedSymbol>>, CallGraphInput) {
    let files = vec![
        file(
            "heap.c",
            "/* binary heap */\nint heap_insert(Heap *h, int v) {\n    rebalance(h);\n    return 0;\n}\n\nvoid rebalance(Heap *h) {\n    /* sift down */\n}\n",
        ),
        file(
            "main.c",
            "int main(void) {\n    Heap *h = heap_new();\n    heap_insert(h, 7);\n    return 0;\n}\n",
        ),
        file(
            "log.c",
            "void log_line(const char *msg) {\n    puts(msg);\n}\n",
        ),
    ];

    let mut symbols = HashMap::new();
    symbols.insert(
        "heap.c".to_string(),
        vec![
            symbol("heap_insert", 2, "int heap_insert(Heap *h, int v)"),
            symbol("rebalance", 7, "void rebalance(Heap *h)"),
        ],
    );
    symbols.insert(
        "main.c".to_string(),
        vec![symbol("main", 1, "int main(void)")],
    );
    symbols.insert(
        "log.c".to_string(),
        vec![symbol("log_line", 1, "void log_line(const char *msg)")],
    );

    let mut calls = CallGraphInput::new();
    calls.insert(
        "main".to_string(),
        vec!["heap_new".to_string(), "heap_insert".to_string()],
    );
    calls.insert("heap_insert".to_string(), vec!["rebalance".to_string()]);
    calls.insert("log_line".to_string(), vec!["puts".to_string()]);

    (files, symbols, calls)
}

async fn built_engine() -> SearchEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    let (files, symbols, calls) = corpus();
    EngineBuilder::new()
        .build(files, symbols, calls)
        .await
        .expect("build")
}

#[tokio::test]
async fn build_reports_stages_in_order() {
    let seen: Arc<Mutex<Vec<BuildStage>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let (files, symbols, calls) = corpus();

    EngineBuilder::new()
        .on_progress(Arc::new(move |p| sink.lock().unwrap().push(p.stage)))
        .build(files, symbols, calls)
        .await
        .expect("build");

    let mut order: Vec<BuildStage> = Vec::new();
    for stage in seen.lock().unwrap().iter() {
        if order.last() != Some(stage) {
            order.push(*stage);
        }
    }
    assert_eq!(
        order,
        vec![
            BuildStage::Vocabulary,
            BuildStage::Keyword,
            BuildStage::Literal,
            BuildStage::Similarity,
            BuildStage::Graph,
        ]
    );
}

#[tokio::test]
async fn who_calls_query_end_to_end() {
    let engine = built_engine().await;
    let opts = QueryOptions::default();
    let response = engine.query("who calls heap_insert", &opts).await;

    let callers = response.enrichments.callers.expect("callers enrichment");
    assert!(callers.contains(&"main".to_string()));
    let sites = response.enrichments.call_sites.expect("call sites");
    assert!(sites.iter().any(|s| s.file == "main.c"));
    assert!(sites.iter().all(|s| s.file != "heap.c"), "definition leaked in as a call site");

    assert!(!response.files.is_empty());
    assert!(response.symbols.iter().any(|s| s.name == "heap_insert"));
    assert!(response.context.chars().count() <= opts.budget_chars);
    assert!(response.stats.empty_reason.is_none());
}

#[tokio::test]
async fn context_respects_small_budgets() {
    let engine = built_engine().await;
    for budget in [50, 200, 1000] {
        let opts = QueryOptions {
            budget_chars: budget,
            ..QueryOptions::default()
        };
        let response = engine.query("heap insert", &opts).await;
        assert!(
            response.context.chars().count() <= budget,
            "budget {budget} exceeded"
        );
    }
}

#[tokio::test]
async fn empty_engine_explains_itself() {
    let engine = EngineBuilder::new()
        .build(Vec::new(), HashMap::new(), CallGraphInput::new())
        .await
        .expect("build");
    let response = engine.query("anything", &QueryOptions::default()).await;
    assert_eq!(response.stats.empty_reason.as_deref(), Some("index not built"));
    assert!(response.files.is_empty());
}

#[tokio::test]
async fn blank_query_is_rejected_gently() {
    let engine = built_engine().await;
    let response = engine.query("   ", &QueryOptions::default()).await;
    assert_eq!(response.stats.empty_reason.as_deref(), Some("empty query"));
}

#[tokio::test]
async fn add_then_remove_file_round_trips() {
    let mut engine = built_engine().await;
    engine
        .add_file(
            file("socket.c", "int socket_open(int port) {\n    return bind_port(port);\n}\n"),
            vec![symbol("socket_open", 1, "int socket_open(int port)")],
            vec![("socket_open".to_string(), "bind_port".to_string())],
        )
        .expect("add");

    let response = engine.query("socket_open", &QueryOptions::default()).await;
    assert!(response.files.contains(&"socket.c".to_string()));

    engine.remove_file("socket.c").expect("remove");
    let response = engine.query("socket_open", &QueryOptions::default()).await;
    assert!(!response.files.contains(&"socket.c".to_string()));
    assert!(engine.remove_file("socket.c").is_err());
}

#[tokio::test]
async fn remove_file_handles_duplicate_symbol_names() {
    let mut engine = built_engine().await;
    // Same function name twice, as under opposing #ifdef branches.
    engine
        .add_file(
            file(
                "over.c",
                "#ifdef SYNC\nvoid flush(Buf *b) { sync_flush(b); }\n#else\nvoid flush(Buf *b) { async_flush(b); }\n#endif\n",
            ),
            vec![
                symbol("flush", 2, "void flush(Buf *b)"),
                symbol("flush", 4, "void flush(Buf *b)"),
            ],
            Vec::new(),
        )
        .expect("add");

    engine.remove_file("over.c").expect("remove");
    let response = engine.query("flush", &QueryOptions::default()).await;
    assert!(!response.files.contains(&"over.c".to_string()));
    assert!(engine.remove_file("over.c").is_err());
}

#[tokio::test]
async fn snapshot_round_trip_preserves_engine() {
    let engine = built_engine().await;
    let before = engine.stats();

    let json = serde_json::to_string(&engine.export()).expect("serialize");
    let snapshot = serde_json::from_str(&json).expect("deserialize");
    let imported = EngineBuilder::new().import(snapshot).expect("import");
    let after = imported.stats();

    assert_eq!(after.files, before.files);
    assert_eq!(after.documents, before.documents);
    assert_eq!(after.terms, before.terms);
    assert_eq!(after.symbols, before.symbols);
    assert_eq!(after.edges, before.edges);

    let response = imported.query("who calls heap_insert", &QueryOptions::default()).await;
    assert_eq!(
        response.enrichments.callers,
        Some(vec!["main".to_string()])
    );
}

#[tokio::test]
async fn snapshot_survives_a_disk_round_trip() {
    let engine = built_engine().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("engine.json");

    let json = serde_json::to_vec(&engine.export()).expect("serialize");
    std::fs::write(&path, json).expect("write");
    let bytes = std::fs::read(&path).expect("read");
    let snapshot = serde_json::from_slice(&bytes).expect("deserialize");

    let imported = EngineBuilder::new().import(snapshot).expect("import");
    assert_eq!(imported.stats().files, engine.stats().files);
}

#[tokio::test]
async fn import_rejects_version_mismatch() {
    let engine = built_engine().await;
    let mut snapshot = engine.export();
    snapshot.version += 1;
    let Err(err) = EngineBuilder::new().import(snapshot) else {
        panic!("import accepted a mismatched snapshot version");
    };
    assert!(matches!(err, EngineError::VersionMismatch { .. }));
}

#[tokio::test]
async fn rebuild_yields_equivalent_engine() {
    let engine = built_engine().await;
    let rebuilt = engine.rebuild().await.expect("rebuild");
    assert_eq!(rebuilt.stats().files, engine.stats().files);
    assert_eq!(rebuilt.stats().symbols, engine.stats().symbols);
}

#[tokio::test]
async fn zero_deadline_aborts_build() {
    let (files, symbols, calls) = corpus();
    let result = EngineBuilder::new()
        .with_options(IndexBuildOptions {
            deadline: Some(Duration::ZERO),
            ..IndexBuildOptions::default()
        })
        .build(files, symbols, calls)
        .await;
    let Err(err) = result else {
        panic!("build ignored a zero deadline");
    };
    assert!(matches!(err, EngineError::DeadlineExceeded));
}

#[tokio::test]
async fn exclude_patterns_filter_the_corpus() {
    let (mut files, symbols, calls) = corpus();
    files.push(file("heap_test.c", "void test_heap(void) {}\n"));

    let engine = EngineBuilder::new()
        .with_options(IndexBuildOptions {
            exclude_patterns: vec!["_test".to_string()],
            ..IndexBuildOptions::default()
        })
        .build(files, symbols, calls)
        .await
        .expect("build");
    assert_eq!(engine.stats().files, 3);
}
