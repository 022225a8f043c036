use crate::{
	Result,
	group::{self, Group},
};

/// Folds noise points into the groups produced by density clustering.
///
/// Outliers are handled in input order. Each one joins the most similar group
/// that is still below `max_size`, and that group's centroid is refreshed before
/// the next outlier is considered. With no eligible group the outlier opens a
/// singleton group instead, so every point belongs somewhere afterwards.
pub fn assign_outliers(
	mut groups: Vec<Group>,
	outliers: &[usize],
	embeddings: &[Vec<f32>],
	max_size: usize,
) -> Result<Vec<Group>> {
	for &outlier in outliers {
		match most_similar_open_group(&groups, outlier, embeddings, max_size) {
			Some((pos, similarity)) => {
				groups[pos].push(outlier, embeddings);

				tracing::debug!(
					member = outlier,
					group_id = groups[pos].id(),
					similarity,
					"Outlier joined group."
				);
			},
			None => {
				let id = group::next_id(&groups)?;

				groups.push(Group::new(id, vec![outlier], embeddings));

				tracing::debug!(member = outlier, group_id = id, "Outlier opened a singleton group.");
			},
		}
	}

	Ok(groups)
}

fn most_similar_open_group(
	groups: &[Group],
	member: usize,
	embeddings: &[Vec<f32>],
	max_size: usize,
) -> Option<(usize, f32)> {
	let mut best: Option<(usize, f32)> = None;

	for (pos, group) in groups.iter().enumerate() {
		if group.len() >= max_size {
			continue;
		}

		let similarity = group.affinity(member, embeddings);

		if best.map(|(_, score)| similarity > score).unwrap_or(true) {
			best = Some((pos, similarity));
		}
	}

	best
}
