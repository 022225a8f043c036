use serde::{Deserialize, Serialize};

use crate::{Error, Result, SeatService};
use seat_config::Grouping;
use seat_domain::{
	GroupProfile, Participant,
	balance::BalanceLimits,
	dbscan::DbscanParams,
	partition::{self, PartitionParams},
};
use seat_providers::recommend::RankedGame;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupsRequest {
	#[serde(default)]
	pub constraints: Option<GroupConstraints>,
	pub participants: Vec<Participant>,
}

/// Per-request overrides. Missing fields fall back to the `[grouping]` config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupConstraints {
	#[serde(default)]
	pub min_size: Option<u32>,
	#[serde(default)]
	pub max_size: Option<u32>,
	#[serde(default)]
	pub cluster_eps: Option<f32>,
	#[serde(default)]
	pub cluster_min_samples: Option<u32>,
}
impl GroupConstraints {
	pub fn resolve(&self, defaults: &Grouping) -> PartitionParams {
		let mut limits = BalanceLimits::new(
			self.min_size.unwrap_or(defaults.min_size) as usize,
			self.max_size.unwrap_or(defaults.max_size) as usize,
		);

		limits.max_iterations = defaults.max_balance_iterations as usize;

		PartitionParams {
			dbscan: DbscanParams {
				eps: self.cluster_eps.unwrap_or(defaults.cluster_eps),
				min_samples: self.cluster_min_samples.unwrap_or(defaults.cluster_min_samples)
					as usize,
			},
			limits,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupsResponse {
	pub groups: Vec<GroupView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupView {
	pub group_id: u32,
	pub participants: Vec<Participant>,
	pub profile: GroupProfile,
	pub recommended_games: Vec<RecommendedGame>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedGame {
	pub game_id: String,
	pub name: String,
	pub similarity: f32,
	pub thumbnail: Option<String>,
}
impl From<RankedGame> for RecommendedGame {
	fn from(game: RankedGame) -> Self {
		Self { game_id: game.game_id, name: game.name, similarity: game.score, thumbnail: game.thumbnail }
	}
}

impl SeatService {
	/// Partitions every participant into groups within the size bounds, then
	/// profiles each group and fetches recommendations for it.
	pub async fn create_groups(&self, req: CreateGroupsRequest) -> Result<GroupsResponse> {
		let params = req.constraints.unwrap_or_default().resolve(&self.cfg.grouping);

		params.validate()?;

		if req.participants.is_empty() {
			return Err(Error::InvalidRequest {
				message: "participants must contain at least one participant.".to_string(),
			});
		}
		if req.participants.len() < params.limits.min_size {
			return Err(Error::InvalidRequest {
				message: format!(
					"{} participants cannot fill a group of at least {}.",
					req.participants.len(),
					params.limits.min_size
				),
			});
		}

		crate::ensure_unique_ids(&req.participants, "participants")?;

		tracing::info!(
			participants = req.participants.len(),
			min_size = params.limits.min_size,
			max_size = params.limits.max_size,
			"Creating groups."
		);

		let members: Vec<&Participant> = req.participants.iter().collect();
		let embeddings = self.embed_profiles(&members).await?;
		let partitioned = partition::partition(&embeddings, &params)?;
		let mut groups = Vec::with_capacity(partitioned.groups.len());

		for group in &partitioned.groups {
			let participants =
				group.members().iter().map(|&member| req.participants[member].clone()).collect();

			groups.push(self.describe(group.id(), participants).await?);
		}

		tracing::info!(
			groups = groups.len(),
			clusters = partitioned.clusters,
			outliers = partitioned.outliers,
			balance_steps = partitioned.steps.len(),
			"Groups created."
		);

		Ok(GroupsResponse { groups })
	}
}
