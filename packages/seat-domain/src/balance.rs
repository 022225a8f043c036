//! Capacity balancing: repairs an arbitrary partition until every group size
//! lies in `[min_size, max_size]`, or reports that it cannot.
//!
//! Each iteration drops empty groups, shrinks oversized groups, then fills
//! undersized ones. The loop stops at the first iteration that changes nothing
//! or when the iteration ceiling is reached; the result is validated once more
//! afterwards.

use crate::{
	Error, Result,
	group::{self, Group},
	similarity,
};

pub const DEFAULT_MAX_ITERATIONS: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceLimits {
	pub min_size: usize,
	pub max_size: usize,
	pub max_iterations: usize,
}
impl BalanceLimits {
	pub fn new(min_size: usize, max_size: usize) -> Self {
		Self { min_size, max_size, max_iterations: DEFAULT_MAX_ITERATIONS }
	}

	pub fn validate(&self) -> Result<()> {
		if self.min_size == 0 || self.max_size == 0 {
			return Err(Error::InvalidInput {
				message: "group size bounds must be greater than zero.".to_string(),
			});
		}
		if self.max_size < self.min_size {
			return Err(Error::InvalidInput {
				message: format!(
					"max size {} must be at least min size {}.",
					self.max_size, self.min_size
				),
			});
		}
		if self.max_iterations == 0 {
			return Err(Error::InvalidInput {
				message: "balance iterations must be greater than zero.".to_string(),
			});
		}

		Ok(())
	}

	pub fn contains(&self, size: usize) -> bool {
		(self.min_size..=self.max_size).contains(&size)
	}
}

/// A single mutation applied by the balancer, in application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceStep {
	DroppedEmpty { group_id: u32 },
	/// An oversized group's weakest member moved to a group with spare capacity.
	Evicted { member: usize, from: u32, to: u32 },
	/// An oversized group's weakest member had nowhere to go and opened a group.
	Opened { member: usize, from: u32, group_id: u32 },
	Donated { member: usize, from: u32, to: u32 },
	Merged { from: u32, into: u32 },
}

#[derive(Debug, Clone)]
pub struct Balanced {
	pub groups: Vec<Group>,
	pub steps: Vec<BalanceStep>,
	pub iterations: usize,
}

pub fn balance(
	groups: Vec<Group>,
	embeddings: &[Vec<f32>],
	limits: &BalanceLimits,
) -> Result<Balanced> {
	limits.validate()?;

	let mut balancer = Balancer { groups, embeddings, limits: *limits, steps: Vec::new() };
	let mut iterations = 0;
	let mut converged = false;

	while iterations < limits.max_iterations {
		iterations += 1;

		let mut changed = balancer.drop_empty();

		changed |= balancer.shrink_oversized()?;
		changed |= balancer.fill_undersized()?;

		if !changed {
			converged = true;

			break;
		}
	}

	let Balancer { groups, steps, .. } = balancer;

	if let Some(group) = groups.iter().find(|group| !limits.contains(group.len())) {
		let reason = if converged { "after balancing" } else { "when the iteration limit ran out" };

		return Err(Error::Unsatisfiable {
			message: format!(
				"group {} has {} members {reason}, outside {}..={}.",
				group.id(),
				group.len(),
				limits.min_size,
				limits.max_size
			),
		});
	}

	tracing::debug!(
		groups = groups.len(),
		steps = steps.len(),
		iterations,
		converged,
		"Balancing finished."
	);

	Ok(Balanced { groups, steps, iterations })
}

struct Balancer<'a> {
	groups: Vec<Group>,
	embeddings: &'a [Vec<f32>],
	limits: BalanceLimits,
	steps: Vec<BalanceStep>,
}
impl Balancer<'_> {
	fn record(&mut self, step: BalanceStep) {
		tracing::debug!(?step, "Balance step.");

		self.steps.push(step);
	}

	fn drop_empty(&mut self) -> bool {
		let empty: Vec<u32> =
			self.groups.iter().filter(|group| group.is_empty()).map(Group::id).collect();

		if empty.is_empty() {
			return false;
		}

		self.groups.retain(|group| !group.is_empty());

		for group_id in empty {
			self.record(BalanceStep::DroppedEmpty { group_id });
		}

		true
	}

	fn shrink_oversized(&mut self) -> Result<bool> {
		let embeddings = self.embeddings;
		let max_size = self.limits.max_size;
		let mut changed = false;
		let mut pos = 0;

		// Groups opened here are appended and visited too.
		while pos < self.groups.len() {
			while self.groups[pos].len() > max_size {
				let Some(member) = self.weakest_member(pos) else { break };
				let from = self.groups[pos].id();

				self.groups[pos].remove(member, embeddings);

				match self.best_open_group(pos, member) {
					Some(target) => {
						self.groups[target].push(member, embeddings);

						let to = self.groups[target].id();

						self.record(BalanceStep::Evicted { member, from, to });
					},
					None => {
						let group_id = group::next_id(&self.groups)?;

						self.groups.push(Group::new(group_id, vec![member], embeddings));
						self.record(BalanceStep::Opened { member, from, group_id });
					},
				}

				changed = true;
			}

			pos += 1;
		}

		Ok(changed)
	}

	fn fill_undersized(&mut self) -> Result<bool> {
		let embeddings = self.embeddings;
		let min_size = self.limits.min_size;
		let mut changed = false;
		let mut pos = 0;

		while pos < self.groups.len() {
			let mut merged = false;

			while self.groups[pos].len() < min_size {
				if let Some(donor) = self.first_donor(pos) {
					let Some(member) = self.best_donation(donor, pos) else { break };
					let from = self.groups[donor].id();
					let to = self.groups[pos].id();

					self.groups[donor].remove(member, embeddings);
					self.groups[pos].push(member, embeddings);
					self.record(BalanceStep::Donated { member, from, to });

					changed = true;

					continue;
				}

				let Some(target) = self.merge_target(pos) else {
					let group = &self.groups[pos];

					return Err(Error::Unsatisfiable {
						message: format!(
							"group {} has {} members and no group can donate or absorb it within max size {}.",
							group.id(),
							group.len(),
							self.limits.max_size
						),
					});
				};
				let into = self.groups[target].id();
				let absorbed = self.groups.remove(pos);
				let from = absorbed.id();
				let target = if target > pos { target - 1 } else { target };

				self.groups[target].absorb(absorbed, embeddings);
				self.record(BalanceStep::Merged { from, into });

				changed = true;
				merged = true;

				break;
			}

			// A merge removed the group at `pos`, so the next group already sits there.
			if !merged {
				pos += 1;
			}
		}

		Ok(changed)
	}

	/// Member least similar to its own group's centroid; first one wins on ties.
	fn weakest_member(&self, pos: usize) -> Option<usize> {
		let group = &self.groups[pos];
		let mut weakest: Option<(usize, f32)> = None;

		for &member in group.members() {
			let similarity = group.affinity(member, self.embeddings);

			if weakest.map(|(_, score)| similarity < score).unwrap_or(true) {
				weakest = Some((member, similarity));
			}
		}

		weakest.map(|(member, _)| member)
	}

	/// Most similar group, other than `exclude`, that still has room for `member`.
	fn best_open_group(&self, exclude: usize, member: usize) -> Option<usize> {
		let mut best: Option<(usize, f32)> = None;

		for (pos, group) in self.groups.iter().enumerate() {
			if pos == exclude || group.len() >= self.limits.max_size {
				continue;
			}

			let similarity = group.affinity(member, self.embeddings);

			if best.map(|(_, score)| similarity > score).unwrap_or(true) {
				best = Some((pos, similarity));
			}
		}

		best.map(|(pos, _)| pos)
	}

	/// First group in list order that can give up a member and stay at or above
	/// the minimum.
	fn first_donor(&self, destination: usize) -> Option<usize> {
		(0..self.groups.len())
			.find(|&pos| pos != destination && self.groups[pos].len() > self.limits.min_size)
	}

	/// Donor member with the largest gain in centroid similarity from moving.
	fn best_donation(&self, donor: usize, destination: usize) -> Option<usize> {
		let donor_group = &self.groups[donor];
		let destination_group = &self.groups[destination];
		let mut best: Option<(usize, f32)> = None;

		for &member in donor_group.members() {
			let gain = destination_group.affinity(member, self.embeddings)
				- donor_group.affinity(member, self.embeddings);

			if best.map(|(_, score)| gain > score).unwrap_or(true) {
				best = Some((member, gain));
			}
		}

		best.map(|(member, _)| member)
	}

	/// Most similar group whose combined size with `pos` stays within the maximum.
	fn merge_target(&self, pos: usize) -> Option<usize> {
		let source = &self.groups[pos];
		let mut best: Option<(usize, f32)> = None;

		for (candidate, group) in self.groups.iter().enumerate() {
			if candidate == pos || source.len() + group.len() > self.limits.max_size {
				continue;
			}

			let similarity = similarity::cosine_similarity(source.centroid(), group.centroid());

			if best.map(|(_, score)| similarity > score).unwrap_or(true) {
				best = Some((candidate, similarity));
			}
		}

		best.map(|(candidate, _)| candidate)
	}
}
