use proptest::prelude::*;

use seat_domain::{
	Error, Group, Participant, Preferences,
	balance::{self, BalanceLimits, BalanceStep},
	dbscan::{self, DbscanParams},
	incremental::{self, Candidate, Placement},
	partition::{self, PartitionParams},
	profile, similarity,
};

fn normalized(vectors: Vec<Vec<f32>>) -> Vec<Vec<f32>> {
	vectors.iter().map(|vector| similarity::normalize(vector)).collect()
}

fn params(min_size: usize, max_size: usize, eps: f32, min_samples: usize) -> PartitionParams {
	PartitionParams {
		dbscan: DbscanParams { eps, min_samples },
		limits: BalanceLimits::new(min_size, max_size),
	}
}

fn sorted_members(groups: &[Group]) -> Vec<usize> {
	let mut members: Vec<usize> = groups.iter().flat_map(|group| group.members().to_vec()).collect();

	members.sort_unstable();

	members
}

fn participant(id: u64, level: &str, mechanics: &[&str], themes: &[&str]) -> Participant {
	Participant {
		id,
		name: format!("Player {id}"),
		experience_level: Some(level.to_string()),
		preferences: Some(Preferences {
			mechanics: mechanics.iter().map(|value| value.to_string()).collect(),
			themes: themes.iter().map(|value| value.to_string()).collect(),
		}),
	}
}

#[test]
fn two_tight_clusters_need_no_balancing() {
	let embeddings = normalized(vec![
		vec![1.0, 0.0, 0.0],
		vec![0.99, 0.1, 0.0],
		vec![0.0, 1.0, 0.0],
		vec![0.0, 0.98, 0.1],
		vec![0.05, 1.0, 0.0],
	]);
	let result = partition::partition(&embeddings, &params(2, 3, 0.3, 2)).expect("partition failed");

	assert_eq!(result.clusters, 2);
	assert_eq!(result.outliers, 0);
	assert!(result.steps.is_empty());
	assert_eq!(result.groups.len(), 2);
	assert_eq!(result.groups[0].id(), 1);
	assert_eq!(result.groups[0].members(), &[0, 1]);
	assert_eq!(result.groups[1].id(), 2);
	assert_eq!(result.groups[1].members(), &[2, 3, 4]);
}

#[test]
fn single_cluster_of_four_cannot_fit_groups_of_three() {
	let embeddings = normalized(vec![
		vec![1.0, 0.0],
		vec![1.0, 0.05],
		vec![1.0, 0.1],
		vec![1.0, 0.15],
	]);
	let err = partition::partition(&embeddings, &params(3, 3, 0.3, 2))
		.expect_err("expected unsatisfiable constraints");

	assert!(matches!(err, Error::Unsatisfiable { .. }));
}

#[test]
fn first_donor_in_list_order_donates() {
	// Group 3 members are closer to group 1 than group 2 members are.
	let embeddings = vec![
		vec![1.0, 0.0],
		vec![0.0, 1.0],
		vec![0.05, 1.0],
		vec![0.1, 1.0],
		vec![0.9, 0.1],
		vec![0.95, 0.1],
		vec![1.0, 0.1],
	];
	let groups = vec![
		Group::new(1, vec![0], &embeddings),
		Group::new(2, vec![1, 2, 3], &embeddings),
		Group::new(3, vec![4, 5, 6], &embeddings),
	];
	let balanced = balance::balance(groups, &embeddings, &BalanceLimits::new(2, 3))
		.expect("balance failed");

	assert!(matches!(balanced.steps[0], BalanceStep::Donated { from: 2, to: 1, .. }));
	assert_eq!(balanced.groups[2].members(), &[4, 5, 6]);
}

#[test]
fn incremental_join_and_create() {
	// F sits at 0.7 from group 1 and 0.3 from the other side.
	let new_participant = vec![1.0, 0.0];
	let near = Candidate { group_id: 1, centroid: vec![0.7, (1.0_f32 - 0.49).sqrt()] };
	let far = Candidate { group_id: 1, centroid: vec![0.3, (1.0_f32 - 0.09).sqrt()] };
	let next_id = incremental::next_group_id([1, 2]).expect("no free group id");

	assert_eq!(incremental::place(&new_participant, &[near], next_id, 0.6).group_id(), 1);
	assert!(matches!(
		incremental::place(&new_participant, &[far], next_id, 0.6),
		Placement::Create { group_id: 3, .. }
	));
}

#[test]
fn profile_summarizes_members() {
	let members = [
		participant(1, "beginner", &["drafting", "trading"], &["space"]),
		participant(2, "advanced", &["trading", "bluffing"], &["space", "fantasy"]),
		participant(3, "Beginner", &["bluffing", "trading", "trading"], &["  "]),
	];
	let summary = profile::summarize(&members);

	assert_eq!(summary.predominant_level.as_str(), "beginner");
	assert_eq!(summary.top_mechanics, vec!["trading", "bluffing", "drafting"]);
	assert_eq!(summary.top_themes, vec!["space", "fantasy"]);
}

fn embedding_strategy() -> impl Strategy<Value = Vec<Vec<f32>>> {
	(3_usize..16).prop_flat_map(|count| {
		prop::collection::vec(prop::collection::vec(-1.0_f32..1.0, 3), count)
	})
}

proptest! {
	#[test]
	fn partition_covers_every_point_within_bounds(
		raw in embedding_strategy(),
		min_size in 1_usize..=3,
		extra in 0_usize..=3,
		eps in 0.05_f32..0.8,
		min_samples in 1_usize..=4,
	) {
		let embeddings = normalized(raw);
		let max_size = min_size + extra;

		match partition::partition(&embeddings, &params(min_size, max_size, eps, min_samples)) {
			Ok(result) => {
				prop_assert_eq!(sorted_members(&result.groups), (0..embeddings.len()).collect::<Vec<_>>());

				for (pos, group) in result.groups.iter().enumerate() {
					let expected = similarity::centroid(group.members(), &embeddings);

					prop_assert!(group.len() >= min_size && group.len() <= max_size);
					prop_assert_eq!(group.id(), pos as u32 + 1);
					prop_assert_eq!(group.centroid(), expected.as_slice());
				}
			},
			Err(err) => prop_assert!(matches!(err, Error::Unsatisfiable { .. }), "expected Error::Unsatisfiable"),
		}
	}

	#[test]
	fn clustering_is_deterministic(
		raw in embedding_strategy(),
		eps in 0.05_f32..0.8,
		min_samples in 1_usize..=4,
	) {
		let embeddings = normalized(raw);
		let params = DbscanParams { eps, min_samples };
		let first = dbscan::cluster(&embeddings, &params).expect("cluster failed");
		let second = dbscan::cluster(&embeddings, &params).expect("cluster failed");

		prop_assert_eq!(first.labels, second.labels);
		prop_assert_eq!(first.outliers, second.outliers);
	}

	#[test]
	fn balancing_keeps_members_and_never_overfills(
		raw in embedding_strategy(),
		min_size in 1_usize..=3,
		extra in 0_usize..=3,
	) {
		let embeddings = normalized(raw);
		let max_size = min_size + extra;
		// Start from one group per point so every repair path gets exercised.
		let groups: Vec<Group> = (0..embeddings.len())
			.map(|point| Group::new(point as u32 + 1, vec![point], &embeddings))
			.collect();

		match balance::balance(groups, &embeddings, &BalanceLimits::new(min_size, max_size)) {
			Ok(balanced) => {
				prop_assert_eq!(
					sorted_members(&balanced.groups),
					(0..embeddings.len()).collect::<Vec<_>>()
				);

				for group in &balanced.groups {
					prop_assert!(group.len() <= max_size);
				}
			},
			Err(err) => prop_assert!(matches!(err, Error::Unsatisfiable { .. }), "expected Error::Unsatisfiable"),
		}
	}
}
