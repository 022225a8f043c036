pub mod assign;
pub mod group;

mod error;

pub use assign::{AssignConstraints, AssignParticipantRequest, ExistingGroup};
pub use error::{Error, Result};
pub use group::{CreateGroupsRequest, GroupConstraints, GroupView, GroupsResponse, RecommendedGame};

use std::{collections::HashSet, future::Future, pin::Pin, sync::Arc};

use seat_config::{Config, EmbeddingProviderConfig, RecommendationProviderConfig};
use seat_domain::{Participant, profile, similarity};
use seat_providers::{
	embedding,
	recommend::{self, RankedGame, RecommendationQuery},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, seat_providers::Result<Vec<Vec<f32>>>>;
}

pub trait RecommendationProvider
where
	Self: Send + Sync,
{
	fn recommend<'a>(
		&'a self,
		cfg: &'a RecommendationProviderConfig,
		query: &'a RecommendationQuery,
	) -> BoxFuture<'a, seat_providers::Result<Vec<RankedGame>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub recommendation: Arc<dyn RecommendationProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		recommendation: Arc<dyn RecommendationProvider>,
	) -> Self {
		Self { embedding, recommendation }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), recommendation: provider }
	}
}

/// Stateless grouping service. Holds only configuration and provider handles,
/// so concurrent requests share nothing mutable.
pub struct SeatService {
	pub cfg: Config,
	pub providers: Providers,
}
impl SeatService {
	pub fn new(cfg: Config) -> Self {
		Self { cfg, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Self {
		Self { cfg, providers }
	}

	/// Embeds participant profiles and returns them L2-normalized.
	///
	/// A count or dimension mismatch, or any non-finite value, fails the whole call.
	pub(crate) async fn embed_profiles(&self, participants: &[&Participant]) -> Result<Vec<Vec<f32>>> {
		let cfg = &self.cfg.providers.embedding;
		let texts: Vec<String> = participants.iter().map(|participant| participant.profile_text()).collect();
		let vectors = self.providers.embedding.embed(cfg, &texts).await?;

		if vectors.len() != texts.len() {
			return Err(Error::Provider {
				message: format!(
					"Embedding provider returned {} vectors for {} profiles.",
					vectors.len(),
					texts.len()
				),
			});
		}

		let dim = cfg.dimensions as usize;

		if vectors.iter().any(|vec| vec.len() != dim) {
			return Err(Error::Provider {
				message: format!("Embedding vector dimension mismatch, expected {dim}."),
			});
		}
		if vectors.iter().flatten().any(|value| !value.is_finite()) {
			return Err(Error::Provider {
				message: "Embedding vector contains a non-finite value.".to_string(),
			});
		}

		tracing::debug!(profiles = texts.len(), dim, "Embedded participant profiles.");

		Ok(vectors.iter().map(|vec| similarity::normalize(vec)).collect())
	}

	/// Summarizes a group and attaches fresh recommendations for it.
	pub(crate) async fn describe(
		&self,
		group_id: u32,
		participants: Vec<Participant>,
	) -> Result<GroupView> {
		let summary = profile::summarize(&participants);
		let settings = &self.cfg.recommendation;
		let query = RecommendationQuery {
			query: summary.query_text(),
			top_k: settings.top_k,
			candidate_pool_size: settings.candidate_pool_size,
			semantic_weight: settings.semantic_weight,
			popularity_weight: settings.popularity_weight,
		};
		let mut games =
			self.providers.recommendation.recommend(&self.cfg.providers.recommendation, &query).await?;

		games.truncate(settings.top_k as usize);

		tracing::debug!(group_id, members = participants.len(), games = games.len(), "Described group.");

		Ok(GroupView {
			group_id,
			participants,
			profile: summary,
			recommended_games: games.into_iter().map(RecommendedGame::from).collect(),
		})
	}
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, seat_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl RecommendationProvider for DefaultProviders {
	fn recommend<'a>(
		&'a self,
		cfg: &'a RecommendationProviderConfig,
		query: &'a RecommendationQuery,
	) -> BoxFuture<'a, seat_providers::Result<Vec<RankedGame>>> {
		Box::pin(recommend::recommend(cfg, query))
	}
}

/// Fails on the first participant id seen twice across `participants`.
pub(crate) fn ensure_unique_ids<'a, I>(participants: I, context: &str) -> Result<()>
where
	I: IntoIterator<Item = &'a Participant>,
{
	let mut seen = HashSet::new();

	for participant in participants {
		if !seen.insert(participant.id) {
			return Err(Error::InvalidRequest {
				message: format!("participant id {} appears more than once in {context}.", participant.id),
			});
		}
	}

	Ok(())
}
