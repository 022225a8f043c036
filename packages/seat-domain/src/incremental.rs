//! Online placement of a single participant against an existing snapshot.

use crate::{Error, Result, group, similarity};

/// A snapshot group that can still take a member.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
	pub group_id: u32,
	pub centroid: Vec<f32>,
}
impl Candidate {
	/// Builds the candidate with a centroid computed from scratch over `members`.
	pub fn new(group_id: u32, members: &[usize], embeddings: &[Vec<f32>]) -> Self {
		Self { group_id, centroid: similarity::centroid(members, embeddings) }
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
	Join { group_id: u32, similarity: f32 },
	/// No candidate reached the threshold. `best_similarity` is `None` when
	/// there were no candidates at all.
	Create { group_id: u32, best_similarity: Option<f32> },
}
impl Placement {
	pub fn group_id(&self) -> u32 {
		match self {
			Self::Join { group_id, .. } | Self::Create { group_id, .. } => *group_id,
		}
	}

	pub fn is_new_group(&self) -> bool {
		matches!(self, Self::Create { .. })
	}
}

/// Empty and full groups never take the new participant.
pub fn accepts_member(size: usize, max_size: usize) -> bool {
	size > 0 && size < max_size
}

/// One past the highest snapshot id, counting empty and full groups too.
pub fn next_group_id(ids: impl IntoIterator<Item = u32>) -> Result<u32> {
	group::id_after(ids)
}

pub fn validate_threshold(threshold: f32) -> Result<()> {
	if !threshold.is_finite() || !(-1.0..=1.0).contains(&threshold) {
		return Err(Error::InvalidInput {
			message: format!("similarity threshold {threshold} must lie within -1..=1."),
		});
	}

	Ok(())
}

/// Picks the most similar candidate (first wins on ties) and joins it when the
/// similarity reaches `threshold`; otherwise a new group `next_id` is created.
pub fn place(
	embedding: &[f32],
	candidates: &[Candidate],
	next_id: u32,
	threshold: f32,
) -> Placement {
	let mut best: Option<(u32, f32)> = None;

	for candidate in candidates {
		let similarity = similarity::cosine_similarity(embedding, &candidate.centroid);

		if best.map(|(_, score)| similarity > score).unwrap_or(true) {
			best = Some((candidate.group_id, similarity));
		}
	}

	let placement = match best {
		Some((group_id, similarity)) if similarity >= threshold =>
			Placement::Join { group_id, similarity },
		_ => Placement::Create { group_id: next_id, best_similarity: best.map(|(_, score)| score) },
	};

	tracing::debug!(
		candidates = candidates.len(),
		threshold,
		?placement,
		"Incremental placement decided."
	);

	placement
}
