pub const SOURCE_CSV: &str = "data/raw/corpus.csv";
pub const ARTIFACTS_DIR: &str = "data/processed";
pub const SOURCE_LABEL: &str = "corpus.csv";

pub const RAG_TOP_K: usize = 3;
pub const QUERY_TIMEOUT_MS: u64 = 5_000;

pub const EMBEDDING_BASE_URL: &str = "http://127.0.0.1:1234";
pub const EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";
pub const EMBEDDING_BATCH_SIZE: usize = 64;
pub const EMBEDDING_TIMEOUT_SECS: u64 = 30;
pub const HASHING_DIMENSION: usize = 384;

pub const GENERATION_BASE_URL: &str = "http://127.0.0.1:1234";
pub const GENERATION_MODEL: &str = "marketing-strategy-bart";
pub const GENERATION_MAX_TOKENS: u32 = 512;
pub const GENERATION_TIMEOUT_SECS: u64 = 120;

pub const SERVER_HOST: &str = "127.0.0.1";

pub fn local_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://localhost:3000".to_string(),
        "http://127.0.0.1".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}
