use serde_json::Value;

use crate::{Error, Result};
use seat_config::EmbeddingProviderConfig;

/// Embeds `texts` in one request. The output is aligned with the input order.
pub async fn embed(cfg: &EmbeddingProviderConfig, texts: &[String]) -> Result<Vec<Vec<f32>>> {
	if texts.is_empty() {
		return Ok(Vec::new());
	}

	let client = crate::client(cfg.timeout_ms)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});

	tracing::debug!(provider_id = %cfg.provider_id, inputs = texts.len(), "Requesting embeddings.");

	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_embedding_response(json, texts.len())
}

pub fn parse_embedding_response(json: Value, expected: usize) -> Result<Vec<Vec<f32>>> {
	let data = json
		.get("data")
		.and_then(|v| v.as_array())
		.ok_or_else(|| Error::response("Embedding response is missing data array."))?;
	let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());

	for (fallback_index, item) in data.iter().enumerate() {
		let index = item
			.get("index")
			.and_then(|v| v.as_u64())
			.map(|v| v as usize)
			.unwrap_or(fallback_index);
		let embedding = item
			.get("embedding")
			.and_then(|v| v.as_array())
			.ok_or_else(|| Error::response("Embedding item missing embedding array."))?;
		let mut vec = Vec::with_capacity(embedding.len());

		for value in embedding {
			let number =
				value.as_f64().ok_or_else(|| Error::response("Embedding value must be numeric."))?;

			vec.push(number as f32);
		}

		indexed.push((index, vec));
	}

	if indexed.len() != expected {
		return Err(Error::response(format!(
			"Embedding response has {} vectors for {expected} inputs.",
			indexed.len()
		)));
	}

	indexed.sort_by_key(|(index, _)| *index);

	if indexed.iter().enumerate().any(|(pos, (index, _))| pos != *index) {
		return Err(Error::response("Embedding response indices do not cover every input."));
	}

	Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_embeddings_in_index_order() {
		let json = serde_json::json!({
			"data": [
				{ "index": 1, "embedding": [2.0, 3.0] },
				{ "index": 0, "embedding": [0.5, 1.5] }
			]
		});
		let parsed = parse_embedding_response(json, 2).expect("parse failed");

		assert_eq!(parsed.len(), 2);
		assert_eq!(parsed[0], vec![0.5, 1.5]);
		assert_eq!(parsed[1], vec![2.0, 3.0]);
	}

	#[test]
	fn missing_index_falls_back_to_position() {
		let json = serde_json::json!({
			"data": [{ "embedding": [1.0] }, { "embedding": [2.0] }]
		});
		let parsed = parse_embedding_response(json, 2).expect("parse failed");

		assert_eq!(parsed, vec![vec![1.0], vec![2.0]]);
	}

	#[test]
	fn rejects_count_mismatch() {
		let json = serde_json::json!({ "data": [{ "index": 0, "embedding": [1.0] }] });
		let err = parse_embedding_response(json, 2).expect_err("expected count mismatch");

		assert!(matches!(err, Error::InvalidResponse { .. }));
	}

	#[test]
	fn rejects_duplicate_indices() {
		let json = serde_json::json!({
			"data": [
				{ "index": 0, "embedding": [1.0] },
				{ "index": 0, "embedding": [2.0] }
			]
		});

		assert!(parse_embedding_response(json, 2).is_err());
	}

	#[test]
	fn rejects_non_numeric_values() {
		let json = serde_json::json!({ "data": [{ "index": 0, "embedding": ["x"] }] });

		assert!(parse_embedding_response(json, 1).is_err());
	}
}
