use crate::{Error, Result, similarity};

/// A table under construction.
///
/// Members are request-local indices into the embedding matrix. The member list
/// is only mutated through methods that recompute the centroid, so the centroid
/// always reflects the current members.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
	id: u32,
	members: Vec<usize>,
	centroid: Vec<f32>,
}
impl Group {
	pub fn new(id: u32, members: Vec<usize>, embeddings: &[Vec<f32>]) -> Self {
		let centroid = similarity::centroid(&members, embeddings);

		Self { id, members, centroid }
	}

	pub fn id(&self) -> u32 {
		self.id
	}

	pub fn members(&self) -> &[usize] {
		&self.members
	}

	pub fn centroid(&self) -> &[f32] {
		&self.centroid
	}

	pub fn len(&self) -> usize {
		self.members.len()
	}

	pub fn is_empty(&self) -> bool {
		self.members.is_empty()
	}

	pub fn contains(&self, member: usize) -> bool {
		self.members.contains(&member)
	}

	/// Similarity between this group's centroid and the embedding of `member`.
	pub fn affinity(&self, member: usize, embeddings: &[Vec<f32>]) -> f32 {
		similarity::cosine_similarity(&embeddings[member], &self.centroid)
	}

	pub fn push(&mut self, member: usize, embeddings: &[Vec<f32>]) {
		self.members.push(member);
		self.refresh(embeddings);
	}

	/// Returns false when `member` was not part of the group.
	pub fn remove(&mut self, member: usize, embeddings: &[Vec<f32>]) -> bool {
		let Some(pos) = self.members.iter().position(|&current| current == member) else {
			return false;
		};

		self.members.remove(pos);
		self.refresh(embeddings);

		true
	}

	/// Moves every member of `other` into this group.
	pub fn absorb(&mut self, other: Group, embeddings: &[Vec<f32>]) {
		self.members.extend(other.members);
		self.refresh(embeddings);
	}

	pub fn renumber(&mut self, id: u32) {
		self.id = id;
	}

	pub fn into_members(self) -> Vec<usize> {
		self.members
	}

	fn refresh(&mut self, embeddings: &[Vec<f32>]) {
		self.centroid = similarity::centroid(&self.members, embeddings);
	}
}

/// One past the highest id in `groups`, or 1 for no groups.
pub fn next_id(groups: &[Group]) -> Result<u32> {
	id_after(groups.iter().map(Group::id))
}

/// One past the highest of `ids`, or 1 when there are none. Fails once `u32::MAX` is taken.
pub fn id_after(ids: impl IntoIterator<Item = u32>) -> Result<u32> {
	match ids.into_iter().max() {
		None => Ok(1),
		Some(id) => id.checked_add(1).ok_or_else(|| Error::InvalidInput {
			message: format!("group id {id} leaves no room for a new group id."),
		}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn embeddings() -> Vec<Vec<f32>> {
		vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.6, 0.8]]
	}

	#[test]
	fn centroid_follows_every_mutation() {
		let embeddings = embeddings();
		let mut group = Group::new(1, vec![0], &embeddings);

		assert_eq!(group.centroid(), embeddings[0].as_slice());

		group.push(1, &embeddings);

		assert_eq!(group.centroid(), similarity::centroid(&[0, 1], &embeddings).as_slice());
		assert!(group.remove(0, &embeddings));
		assert_eq!(group.centroid(), embeddings[1].as_slice());
		assert!(!group.remove(0, &embeddings));
	}

	#[test]
	fn emptied_group_has_zero_centroid() {
		let embeddings = embeddings();
		let mut group = Group::new(4, vec![2], &embeddings);

		group.remove(2, &embeddings);

		assert!(group.is_empty());
		assert_eq!(group.centroid(), &[0.0, 0.0]);
	}

	#[test]
	fn absorb_merges_members_and_refreshes_centroid() {
		let embeddings = embeddings();
		let mut target = Group::new(1, vec![0], &embeddings);
		let other = Group::new(2, vec![1, 2], &embeddings);

		target.absorb(other, &embeddings);

		assert_eq!(target.members(), &[0, 1, 2]);
		assert_eq!(target.centroid(), similarity::centroid(&[0, 1, 2], &embeddings).as_slice());
	}

	#[test]
	fn next_id_starts_at_one() {
		let embeddings = embeddings();

		assert_eq!(next_id(&[]), Ok(1));
		assert_eq!(
			next_id(&[Group::new(3, vec![0], &embeddings), Group::new(9, vec![1], &embeddings)]),
			Ok(10)
		);
	}

	#[test]
	fn exhausted_id_space_is_rejected() {
		let embeddings = embeddings();
		let err = next_id(&[Group::new(u32::MAX, vec![0], &embeddings)])
			.expect_err("expected no free id");

		assert!(matches!(err, Error::InvalidInput { .. }));
	}
}
