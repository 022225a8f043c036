//! Batch partitioning: density clustering, outlier assignment, then capacity
//! balancing.

use crate::{
	Error, Result,
	balance::{self, BalanceLimits, BalanceStep},
	dbscan::{self, DbscanParams},
	group::Group,
	outliers,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartitionParams {
	pub dbscan: DbscanParams,
	pub limits: BalanceLimits,
}
impl PartitionParams {
	pub fn validate(&self) -> Result<()> {
		self.limits.validate()?;
		self.dbscan.validate()?;

		Ok(())
	}
}

#[derive(Debug, Clone)]
pub struct Partition {
	/// Final groups, numbered `1..=n` in output order.
	pub groups: Vec<Group>,
	pub clusters: usize,
	pub outliers: usize,
	pub steps: Vec<BalanceStep>,
	pub iterations: usize,
}

/// Splits `embeddings` into groups whose sizes all lie in the configured bounds.
///
/// Embeddings are expected to be L2-normalized. Either every point ends up in
/// exactly one group within bounds or the whole call fails.
pub fn partition(embeddings: &[Vec<f32>], params: &PartitionParams) -> Result<Partition> {
	params.validate()?;

	if embeddings.is_empty() {
		return Err(Error::InvalidInput { message: "at least one participant is required.".to_string() });
	}
	if embeddings.len() < params.limits.min_size {
		return Err(Error::InvalidInput {
			message: format!(
				"{} participants cannot fill a group of at least {}.",
				embeddings.len(),
				params.limits.min_size
			),
		});
	}

	let clustering = dbscan::cluster(embeddings, &params.dbscan)?;
	let clusters = clustering.groups.len();
	let outlier_count = clustering.outliers.len();
	let groups = outliers::assign_outliers(
		clustering.groups,
		&clustering.outliers,
		embeddings,
		params.limits.max_size,
	)?;
	let balanced = balance::balance(groups, embeddings, &params.limits)?;
	let mut groups = balanced.groups;

	for (pos, group) in groups.iter_mut().enumerate() {
		group.renumber(pos as u32 + 1);
	}

	tracing::debug!(
		points = embeddings.len(),
		clusters,
		outliers = outlier_count,
		groups = groups.len(),
		steps = balanced.steps.len(),
		"Partition finished."
	);

	Ok(Partition {
		groups,
		clusters,
		outliers: outlier_count,
		steps: balanced.steps,
		iterations: balanced.iterations,
	})
}
