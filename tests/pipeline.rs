use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use chispa_backend::core::config::{AppPaths, ConfigService, RagSettings};
use chispa_backend::llm::Generator;
use chispa_backend::rag::{
    ArtifactStore, Chunk, ChunkMetadata, DocStore, HashingEmbedder, IndexBuilder, IngestOptions,
    Ingestor, KeywordClassifier, RagError, Retriever, Section, VectorIndex,
};
use chispa_backend::server::router::router;
use chispa_backend::state::AppState;

const HEADER: &str = "The Startup & The Opportunity,Go-to-Market Strategy,Results & Key Learnings\n";
const DIM: usize = 64;

fn write_corpus(dir: &Path, rows: &[&str]) -> std::path::PathBuf {
    let path = dir.join("corpus.csv");
    let mut data = HEADER.to_string();
    for row in rows {
        data.push_str(row);
        data.push('\n');
    }
    fs::write(&path, data).unwrap();
    path
}

fn ingestor() -> Ingestor {
    Ingestor::new(
        Arc::new(HashingEmbedder::new(DIM)),
        Arc::new(KeywordClassifier::default()),
        IngestOptions::default(),
    )
}

fn chunk(id: &str, text: &str) -> Chunk {
    Chunk {
        id: id.to_string(),
        section: Section::Strategy,
        text: text.to_string(),
        metadata: ChunkMetadata {
            id: id.to_string(),
            section: Section::Strategy,
            startup_name: "Acme".to_string(),
            industry: "General".to_string(),
            source: "corpus.csv".to_string(),
        },
    }
}

#[tokio::test]
async fn duplicate_texts_collapse_in_published_docstore() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_corpus(dir.path(), &["A,B,A"]);
    let store = ArtifactStore::new(dir.path().join("processed"));

    let report = ingestor().run(&source, &store).await.unwrap();
    assert_eq!(report.chunks, 2);
    assert_eq!(report.duplicates_dropped, 1);

    let loaded = store.load().unwrap();
    assert_eq!(loaded.docstore.texts(), ["A".to_string(), "B".to_string()]);
    assert_eq!(loaded.index.len(), 2);
}

#[tokio::test]
async fn empty_corpus_retrieves_nothing() {
    let retriever = Retriever::new(
        Arc::new(HashingEmbedder::new(DIM)),
        VectorIndex::empty(DIM),
        DocStore::default(),
        Duration::from_secs(1),
    )
    .unwrap();

    let results = retriever.retrieve("anything", 5, None).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn top_k_beyond_corpus_returns_all_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_corpus(
        dir.path(),
        &["Foodly sells meal kits.,Partner with gyms.,Gyms renewed yearly."],
    );
    let store = ArtifactStore::new(dir.path().join("processed"));
    ingestor().run(&source, &store).await.unwrap();

    let retriever = Retriever::from_artifacts(
        Arc::new(HashingEmbedder::new(DIM)),
        store.load().unwrap(),
        Duration::from_secs(1),
    )
    .unwrap();

    let results = retriever.retrieve("meal kits for gyms", 10, None).await.unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn mismatched_embeddings_write_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("processed");
    let chunks: Vec<Chunk> = (0..5).map(|i| chunk(&format!("c{}", i), &format!("text {}", i))).collect();
    let embeddings: Vec<Vec<f32>> = (0..4).map(|_| vec![1.0, 0.0]).collect();

    let err = IndexBuilder::build(chunks, embeddings).unwrap_err();
    assert!(matches!(err, RagError::ShapeMismatch { .. }));
    assert!(!root.exists());
    assert!(ArtifactStore::new(&root).current_generation().unwrap().is_none());
}

#[test]
fn missing_index_refuses_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let err = ArtifactStore::new(dir.path()).load().unwrap_err();
    assert!(matches!(err, RagError::MissingFile(_)));
}

struct EchoGenerator;

#[async_trait]
impl Generator for EchoGenerator {
    fn name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, prompt: &str) -> Result<String, RagError> {
        let task = prompt.rsplit("Task: ").next().unwrap_or_default();
        Ok(format!("generated: {}", task))
    }
}

async fn spawn_app(dir: &Path) -> String {
    let source = write_corpus(
        dir,
        &[
            "Foodly sells food kits to offices.,Sampling days at office lobbies.,Office managers became champions.",
            "Routely optimizes delivery routes.,Cold outreach to courier fleets.,Pilots converted when savings were shown.",
        ],
    );
    let store = ArtifactStore::new(dir.join("processed"));
    ingestor().run(&source, &store).await.unwrap();
    let artifacts = store.load().unwrap();
    let generation = artifacts.generation.clone();

    let retriever = Retriever::from_artifacts(
        Arc::new(HashingEmbedder::new(DIM)),
        artifacts,
        Duration::from_secs(1),
    )
    .unwrap();

    let paths = Arc::new(AppPaths::with_dirs(dir.to_path_buf(), dir.join("data")));
    let config = ConfigService::new(paths.clone());
    let state = AppState::from_parts(
        paths,
        config,
        RagSettings::default(),
        generation,
        Arc::new(retriever),
        Arc::new(EchoGenerator),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router(state)).await;
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn http_routes_serve_retrieval_and_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let base = spawn_app(dir.path()).await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["chunks"], 6);
    assert_eq!(health["dimension"], DIM);

    let retrieved: Value = client
        .post(format!("{}/api/retrieve", base))
        .json(&json!({ "query": "delivery routes for couriers", "top_k": 2, "sections": ["opportunity"] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let results = retrieved["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r["metadata"]["section"] == "opportunity"));
    assert_eq!(results[0]["metadata"]["startup_name"], "Routely");

    let dashboard: Value = client
        .post(format!("{}/api/generate_strategy", base))
        .json(&json!({
            "business_idea": "Healthy food kits",
            "target_audience": "Office managers",
            "value_proposition": "Lunch without the hassle"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        dashboard["channels"],
        "generated: Rank channels with 1-2 line justifications."
    );
    assert!(dashboard["budget_kpis"].as_str().unwrap().starts_with("generated: "));

    let regenerated: Value = client
        .post(format!("{}/api/regenerate", base))
        .json(&json!({ "tab": "messaging", "prompt": "Task: punchier tweets" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(regenerated["tab"], "messaging");
    assert_eq!(regenerated["content"], "generated: punchier tweets");
}

#[tokio::test]
async fn http_errors_carry_kind() {
    let dir = tempfile::tempdir().unwrap();
    let base = spawn_app(dir.path()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/regenerate", base))
        .json(&json!({ "tab": "pricing", "prompt": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["kind"], "bad_input");

    let res = client
        .post(format!("{}/api/retrieve", base))
        .json(&json!({ "query": "food", "top_k": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);

    for body in [
        json!({ "query": "food", "top_k": -1 }),
        json!({ "top_k": 2 }),
    ] {
        let res = client
            .post(format!("{}/api/retrieve", base))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 400);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["kind"], "bad_input");
        assert!(body["error"].as_str().unwrap().contains("deserialize"));
    }

    let res = client
        .post(format!("{}/api/generate_strategy", base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["kind"], "bad_input");

    let res = client.get(format!("{}/api/missing", base)).send().await.unwrap();
    assert_eq!(res.status().as_u16(), 404);
}
