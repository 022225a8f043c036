//! Cosine math over embedding vectors.
//!
//! Every similarity in the grouping pipeline goes through this module, so the
//! epsilon guard and the zero-vector conventions hold everywhere.

/// Added to the norm product so zero vectors score 0.0 instead of NaN.
pub const SIMILARITY_EPSILON: f32 = 1e-10;

pub fn l2_norm(vector: &[f32]) -> f32 {
	vector.iter().map(|value| value * value).sum::<f32>().sqrt()
}

/// Scale `vector` to unit length. A zero vector is returned unchanged.
pub fn normalize(vector: &[f32]) -> Vec<f32> {
	let norm = l2_norm(vector);

	if norm <= 0.0 || !norm.is_finite() {
		return vector.to_vec();
	}

	vector.iter().map(|value| value / norm).collect()
}

pub fn cosine_similarity(lhs: &[f32], rhs: &[f32]) -> f32 {
	let dot: f32 = lhs.iter().zip(rhs.iter()).map(|(l, r)| l * r).sum();

	dot / (l2_norm(lhs) * l2_norm(rhs) + SIMILARITY_EPSILON)
}

pub fn cosine_distance(lhs: &[f32], rhs: &[f32]) -> f32 {
	1.0 - cosine_similarity(lhs, rhs)
}

/// Normalized mean of the embeddings at `members`.
///
/// An empty member set yields a zero vector with the matrix dimension.
pub fn centroid(members: &[usize], embeddings: &[Vec<f32>]) -> Vec<f32> {
	let dim = embeddings.first().map(Vec::len).unwrap_or(0);
	let mut acc = vec![0.0_f32; dim];

	if members.is_empty() {
		return acc;
	}

	for &member in members {
		for (slot, value) in acc.iter_mut().zip(embeddings[member].iter()) {
			*slot += value;
		}
	}

	let count = members.len() as f32;

	for slot in &mut acc {
		*slot /= count;
	}

	normalize(&acc)
}
