//! Deterministic collaborators and configuration for integration tests.

use std::sync::{
	Arc, Mutex,
	atomic::{AtomicUsize, Ordering},
};

use serde_json::Map;

use seat_config::{
	Config, EmbeddingProviderConfig, Grouping, Providers as ProviderSettings, Recommendation,
	RecommendationProviderConfig, Service,
};
use seat_providers::recommend::{RankedGame, RecommendationQuery};
use seat_service::{BoxFuture, EmbeddingProvider, Providers, RecommendationProvider, SeatService};

pub const TEST_DIMENSIONS: u32 = 4;

pub fn sample_config() -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		providers: ProviderSettings {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: String::new(),
				path: "/v1/embeddings".to_string(),
				model: "keyword".to_string(),
				dimensions: TEST_DIMENSIONS,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			recommendation: RecommendationProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: String::new(),
				path: "/recommend".to_string(),
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		grouping: Grouping {
			min_size: 2,
			max_size: 3,
			cluster_eps: 0.3,
			cluster_min_samples: 2,
			similarity_threshold: 0.6,
			max_balance_iterations: 100,
		},
		recommendation: Recommendation {
			top_k: 2,
			candidate_pool_size: 20,
			semantic_weight: 0.6,
			popularity_weight: 0.4,
		},
	}
}

pub fn service(
	embedding: Arc<dyn EmbeddingProvider>,
	recommendation: Arc<dyn RecommendationProvider>,
) -> SeatService {
	SeatService::with_providers(sample_config(), Providers::new(embedding, recommendation))
}

/// Embeds a text as the sum of the vectors of every keyword it contains.
///
/// Keywords are matched as substrings, so a participant's mechanics or themes
/// pick the direction of their profile. Texts without a keyword embed to zero.
pub struct KeywordEmbedding {
	keywords: Vec<(String, Vec<f32>)>,
	calls: AtomicUsize,
	inputs: Mutex<Vec<Vec<String>>>,
}
impl KeywordEmbedding {
	pub fn new<K>(keywords: impl IntoIterator<Item = (K, Vec<f32>)>) -> Self
	where
		K: Into<String>,
	{
		Self {
			keywords: keywords.into_iter().map(|(keyword, vec)| (keyword.into(), vec)).collect(),
			calls: AtomicUsize::new(0),
			inputs: Mutex::new(Vec::new()),
		}
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	/// Texts of every call, in call order.
	pub fn inputs(&self) -> Vec<Vec<String>> {
		self.inputs.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	fn vector_for(&self, text: &str, dim: usize) -> Vec<f32> {
		let mut vec = vec![0.0; dim];

		for (keyword, direction) in &self.keywords {
			if text.contains(keyword.as_str()) {
				for (slot, value) in vec.iter_mut().zip(direction) {
					*slot += value;
				}
			}
		}

		vec
	}
}
impl EmbeddingProvider for KeywordEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, seat_providers::Result<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.inputs.lock().unwrap_or_else(|err| err.into_inner()).push(texts.to_vec());

		let dim = cfg.dimensions as usize;
		let vectors: Vec<Vec<f32>> = texts.iter().map(|text| self.vector_for(text, dim)).collect();

		Box::pin(async move { Ok(vectors) })
	}
}

/// Returns the same ranked games for every query and records the queries.
pub struct StaticRecommendation {
	games: Vec<RankedGame>,
	queries: Mutex<Vec<RecommendationQuery>>,
}
impl StaticRecommendation {
	pub fn new(games: Vec<RankedGame>) -> Self {
		Self { games, queries: Mutex::new(Vec::new()) }
	}

	/// Three games, one more than the sample config keeps.
	pub fn with_sample_games() -> Self {
		Self::new(
			[("13", "Catan", 0.91), ("822", "Carcassonne", 0.84), ("30549", "Pandemic", 0.8)]
				.into_iter()
				.map(|(game_id, name, score)| RankedGame {
					game_id: game_id.to_string(),
					name: name.to_string(),
					score,
					thumbnail: None,
				})
				.collect(),
		)
	}

	pub fn calls(&self) -> usize {
		self.queries().len()
	}

	pub fn queries(&self) -> Vec<RecommendationQuery> {
		self.queries.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl RecommendationProvider for StaticRecommendation {
	fn recommend<'a>(
		&'a self,
		_cfg: &'a RecommendationProviderConfig,
		query: &'a RecommendationQuery,
	) -> BoxFuture<'a, seat_providers::Result<Vec<RankedGame>>> {
		self.queries.lock().unwrap_or_else(|err| err.into_inner()).push(query.clone());

		let games = self.games.clone();

		Box::pin(async move { Ok(games) })
	}
}

pub struct FailingEmbedding;
impl EmbeddingProvider for FailingEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		_texts: &'a [String],
	) -> BoxFuture<'a, seat_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(async move {
			Err(seat_providers::Error::InvalidResponse {
				message: "Embedding provider is unavailable.".to_string(),
			})
		})
	}
}

pub struct FailingRecommendation;
impl RecommendationProvider for FailingRecommendation {
	fn recommend<'a>(
		&'a self,
		_cfg: &'a RecommendationProviderConfig,
		_query: &'a RecommendationQuery,
	) -> BoxFuture<'a, seat_providers::Result<Vec<RankedGame>>> {
		Box::pin(async move {
			Err(seat_providers::Error::InvalidResponse {
				message: "Recommendation provider is unavailable.".to_string(),
			})
		})
	}
}
