use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{Error, GroupsResponse, Result, SeatService};
use seat_domain::{
	Participant,
	incremental::{self, Candidate, Placement},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignParticipantRequest {
	pub new_participant: Participant,
	#[serde(default)]
	pub existing_groups: Vec<ExistingGroup>,
	#[serde(default)]
	pub constraints: Option<AssignConstraints>,
}

/// A group as the caller currently sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingGroup {
	pub group_id: u32,
	#[serde(default)]
	pub participants: Vec<Participant>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignConstraints {
	#[serde(default)]
	pub max_size: Option<u32>,
	#[serde(default)]
	pub similarity_threshold: Option<f32>,
}

impl SeatService {
	/// Places one participant into the caller's snapshot.
	///
	/// Only non-empty groups below the maximum size compete. The participant
	/// joins the most similar one when the similarity reaches the threshold and
	/// otherwise opens a new group after the snapshot. Every group of the
	/// updated snapshot is profiled with fresh recommendations.
	pub async fn assign_participant(&self, req: AssignParticipantRequest) -> Result<GroupsResponse> {
		let constraints = req.constraints.unwrap_or_default();
		let max_size = constraints.max_size.unwrap_or(self.cfg.grouping.max_size) as usize;
		let threshold =
			constraints.similarity_threshold.unwrap_or(self.cfg.grouping.similarity_threshold);

		if max_size == 0 {
			return Err(Error::InvalidRequest {
				message: "maxSize must be greater than zero.".to_string(),
			});
		}

		incremental::validate_threshold(threshold)?;
		validate_snapshot(&req.new_participant, &req.existing_groups)?;

		let eligible: Vec<&ExistingGroup> = req
			.existing_groups
			.iter()
			.filter(|group| incremental::accepts_member(group.participants.len(), max_size))
			.collect();

		tracing::info!(
			participant_id = req.new_participant.id,
			groups = req.existing_groups.len(),
			eligible = eligible.len(),
			"Assigning participant."
		);

		let mut profiles = vec![&req.new_participant];

		for group in &eligible {
			profiles.extend(group.participants.iter());
		}

		let embeddings = self.embed_profiles(&profiles).await?;
		let mut offset = 1;
		let mut candidates = Vec::with_capacity(eligible.len());

		for group in &eligible {
			let members: Vec<usize> = (offset..offset + group.participants.len()).collect();

			candidates.push(Candidate::new(group.group_id, &members, &embeddings));

			offset += group.participants.len();
		}

		let next_id =
			incremental::next_group_id(req.existing_groups.iter().map(|group| group.group_id))?;
		let placement = incremental::place(&embeddings[0], &candidates, next_id, threshold);
		let mut snapshot = req.existing_groups;

		match placement {
			Placement::Join { group_id, .. } => {
				let Some(group) = snapshot.iter_mut().find(|group| group.group_id == group_id) else {
					return Err(Error::InvalidRequest {
						message: format!("group {group_id} is missing from the snapshot."),
					});
				};

				group.participants.push(req.new_participant);
			},
			Placement::Create { group_id, .. } => {
				snapshot.push(ExistingGroup { group_id, participants: vec![req.new_participant] });
			},
		}

		tracing::info!(
			group_id = placement.group_id(),
			new_group = placement.is_new_group(),
			"Participant assigned."
		);

		let mut groups = Vec::with_capacity(snapshot.len());

		for group in snapshot {
			groups.push(self.describe(group.group_id, group.participants).await?);
		}

		Ok(GroupsResponse { groups })
	}
}

/// Group ids and participant ids must be unique across the snapshot, and the
/// arriving participant must not already be seated.
fn validate_snapshot(new_participant: &Participant, groups: &[ExistingGroup]) -> Result<()> {
	let mut group_ids = HashSet::new();

	for group in groups {
		if !group_ids.insert(group.group_id) {
			return Err(Error::InvalidRequest {
				message: format!("group id {} appears more than once in existingGroups.", group.group_id),
			});
		}
	}

	let mut seated = groups.iter().flat_map(|group| group.participants.iter());

	crate::ensure_unique_ids(seated.clone(), "existingGroups")?;

	if seated.any(|participant| participant.id == new_participant.id) {
		return Err(Error::InvalidRequest {
			message: format!("participant id {} is already seated.", new_participant.id),
		});
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn participant(id: u64) -> Participant {
		Participant { id, name: format!("P{id}"), experience_level: None, preferences: None }
	}

	fn group(group_id: u32, ids: &[u64]) -> ExistingGroup {
		ExistingGroup { group_id, participants: ids.iter().copied().map(participant).collect() }
	}

	#[test]
	fn duplicate_group_ids_are_rejected() {
		let err = validate_snapshot(&participant(9), &[group(1, &[1]), group(1, &[2])])
			.expect_err("expected invalid request");

		assert!(matches!(err, Error::InvalidRequest { .. }));
	}

	#[test]
	fn participant_seated_twice_is_rejected() {
		assert!(validate_snapshot(&participant(9), &[group(1, &[1]), group(2, &[1])]).is_err());
	}

	#[test]
	fn already_seated_newcomer_is_rejected() {
		assert!(validate_snapshot(&participant(2), &[group(1, &[1, 2])]).is_err());
	}

	#[test]
	fn clean_snapshot_passes() {
		assert!(validate_snapshot(&participant(3), &[group(1, &[1]), group(2, &[2])]).is_ok());
		assert!(validate_snapshot(&participant(3), &[]).is_ok());
	}

	#[test]
	fn request_parses_camel_case() {
		let req: AssignParticipantRequest = serde_json::from_value(serde_json::json!({
			"newParticipant": { "id": 6, "name": "F" },
			"existingGroups": [{ "groupId": 1, "participants": [{ "id": 1, "name": "A" }] }],
			"constraints": { "similarityThreshold": 0.6 }
		}))
		.expect("parse failed");

		assert_eq!(req.existing_groups[0].group_id, 1);
		assert_eq!(req.constraints.and_then(|c| c.similarity_threshold), Some(0.6));
	}
}
