//! Density clustering over a precomputed cosine-distance matrix.
//!
//! Points are visited in index order and clusters are grown depth-first from
//! core points, so labels are fully determined by the input order. A border
//! point reachable from two clusters belongs to the first one that reaches it.

use crate::{Error, Result, group::Group, similarity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterLabel {
	Noise,
	Cluster(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbscanParams {
	/// Neighborhood radius in cosine distance.
	pub eps: f32,
	/// Neighborhood size (the point itself included) that makes a core point.
	pub min_samples: usize,
}
impl DbscanParams {
	pub fn validate(&self) -> Result<()> {
		if !self.eps.is_finite() || self.eps <= 0.0 {
			return Err(Error::InvalidInput {
				message: "cluster eps must be a finite number above zero.".to_string(),
			});
		}
		if self.min_samples == 0 {
			return Err(Error::InvalidInput {
				message: "cluster min samples must be greater than zero.".to_string(),
			});
		}

		Ok(())
	}
}

/// Initial partition: dense groups plus the points no cluster claimed.
#[derive(Debug, Clone)]
pub struct Clustering {
	pub labels: Vec<ClusterLabel>,
	pub groups: Vec<Group>,
	pub outliers: Vec<usize>,
}

pub fn pairwise_distances(embeddings: &[Vec<f32>]) -> Vec<Vec<f32>> {
	let n = embeddings.len();
	let mut distances = vec![vec![0.0_f32; n]; n];

	for i in 0..n {
		for j in (i + 1)..n {
			let distance = similarity::cosine_distance(&embeddings[i], &embeddings[j]);

			distances[i][j] = distance;
			distances[j][i] = distance;
		}
	}

	distances
}

pub fn dbscan(distances: &[Vec<f32>], params: &DbscanParams) -> Vec<ClusterLabel> {
	let n = distances.len();
	let neighborhoods: Vec<Vec<usize>> = (0..n)
		.map(|i| (0..n).filter(|&j| i == j || distances[i][j] <= params.eps).collect())
		.collect();
	let is_core: Vec<bool> =
		neighborhoods.iter().map(|neighbors| neighbors.len() >= params.min_samples).collect();
	let mut labels = vec![ClusterLabel::Noise; n];
	let mut next_label = 0;
	let mut stack = Vec::new();

	for seed in 0..n {
		if labels[seed] != ClusterLabel::Noise || !is_core[seed] {
			continue;
		}

		stack.push(seed);

		while let Some(point) = stack.pop() {
			if labels[point] != ClusterLabel::Noise {
				continue;
			}

			labels[point] = ClusterLabel::Cluster(next_label);

			if is_core[point] {
				stack.extend(
					neighborhoods[point]
						.iter()
						.copied()
						.filter(|&neighbor| labels[neighbor] == ClusterLabel::Noise),
				);
			}
		}

		next_label += 1;
	}

	labels
}

/// Runs the density pass over normalized embeddings and forms groups.
///
/// Groups come out ordered by label with ids `1..=k`; noise points are returned
/// as outliers in input order.
pub fn cluster(embeddings: &[Vec<f32>], params: &DbscanParams) -> Result<Clustering> {
	params.validate()?;

	let distances = pairwise_distances(embeddings);
	let labels = dbscan(&distances, params);
	let cluster_count = labels
		.iter()
		.filter_map(|label| match label {
			ClusterLabel::Cluster(id) => Some(id + 1),
			ClusterLabel::Noise => None,
		})
		.max()
		.unwrap_or(0);
	let mut members: Vec<Vec<usize>> = vec![Vec::new(); cluster_count];
	let mut outliers = Vec::new();

	for (point, label) in labels.iter().enumerate() {
		match label {
			ClusterLabel::Cluster(id) => members[*id].push(point),
			ClusterLabel::Noise => outliers.push(point),
		}
	}

	let groups: Vec<Group> = members
		.into_iter()
		.enumerate()
		.map(|(label, members)| Group::new(label as u32 + 1, members, embeddings))
		.collect();

	tracing::debug!(
		points = embeddings.len(),
		clusters = groups.len(),
		outliers = outliers.len(),
		eps = params.eps,
		min_samples = params.min_samples,
		"Density clustering finished."
	);

	Ok(Clustering { labels, groups, outliers })
}
