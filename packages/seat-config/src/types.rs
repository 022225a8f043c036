use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	pub grouping: Grouping,
	pub recommendation: Recommendation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub recommendation: RecommendationProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	/// Empty means the provider is reached without an `Authorization` header.
	#[serde(default)]
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	pub path: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Defaults applied when a request omits a constraint.
#[derive(Debug, Clone, Deserialize)]
pub struct Grouping {
	pub min_size: u32,
	pub max_size: u32,
	/// Cosine-distance neighborhood radius for density clustering.
	pub cluster_eps: f32,
	pub cluster_min_samples: u32,
	/// Minimum centroid similarity for an arrival to join an existing group.
	pub similarity_threshold: f32,
	#[serde(default = "default_max_balance_iterations")]
	pub max_balance_iterations: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Recommendation {
	pub top_k: u32,
	pub candidate_pool_size: u32,
	pub semantic_weight: f32,
	pub popularity_weight: f32,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_max_balance_iterations() -> u32 {
	1_000
}
