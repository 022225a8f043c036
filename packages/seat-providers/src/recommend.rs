use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};
use seat_config::RecommendationProviderConfig;

/// Body of a recommendation lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationQuery {
	pub query: String,
	pub top_k: u32,
	pub candidate_pool_size: u32,
	pub semantic_weight: f32,
	pub popularity_weight: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedGame {
	pub game_id: String,
	pub name: String,
	pub score: f32,
	pub thumbnail: Option<String>,
}

/// Fetches games for `query`, ranked best first.
pub async fn recommend(
	cfg: &RecommendationProviderConfig,
	query: &RecommendationQuery,
) -> Result<Vec<RankedGame>> {
	let client = crate::client(cfg.timeout_ms)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);

	tracing::debug!(provider_id = %cfg.provider_id, top_k = query.top_k, "Requesting recommendations.");

	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(query)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_recommendation_response(json)
}

pub fn parse_recommendation_response(json: Value) -> Result<Vec<RankedGame>> {
	let items = json
		.get("recommendations")
		.or_else(|| json.get("results"))
		.and_then(|v| v.as_array())
		.ok_or_else(|| Error::response("Recommendation response is missing recommendations array."))?;
	let mut games = Vec::with_capacity(items.len());

	for item in items {
		let game_id = ["game_id", "id", "id_mysql", "id_chroma"]
			.into_iter()
			.find_map(|key| item.get(key).and_then(id_text))
			.ok_or_else(|| Error::response("Recommendation item missing game id."))?;
		let name = item
			.get("name")
			.or_else(|| item.get("nmJogo"))
			.and_then(|v| v.as_str())
			.unwrap_or_default()
			.to_string();
		// Unscored items rank as zero rather than failing the lookup.
		let score = ["final_score", "score"]
			.into_iter()
			.find_map(|key| item.get(key).and_then(|v| v.as_f64()))
			.unwrap_or(0.0) as f32;
		let thumbnail = item
			.get("thumbnail")
			.or_else(|| item.get("thumb"))
			.and_then(|v| v.as_str())
			.map(str::to_string);

		games.push(RankedGame { game_id, name, score, thumbnail });
	}

	Ok(games)
}

fn id_text(value: &Value) -> Option<String> {
	match value {
		Value::String(text) => Some(text.clone()),
		Value::Number(number) => Some(number.to_string()),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_ranked_games_in_provider_order() {
		let json = serde_json::json!({
			"recommendations": [
				{ "game_id": 13, "name": "Catan", "final_score": 0.9, "thumbnail": "https://img/13" },
				{ "id": "822", "name": "Carcassonne", "score": 0.7 }
			]
		});
		let games = parse_recommendation_response(json).expect("parse failed");

		assert_eq!(games.len(), 2);
		assert_eq!(games[0].game_id, "13");
		assert_eq!(games[0].thumbnail.as_deref(), Some("https://img/13"));
		assert_eq!(games[1].game_id, "822");
		assert!((games[1].score - 0.7).abs() < 1e-6);
		assert_eq!(games[1].thumbnail, None);
	}

	#[test]
	fn parses_hybrid_catalog_items() {
		let json = serde_json::json!({
			"recommendations": [
				{
					"id_mysql": 13,
					"id_chroma": "doc-13",
					"nmJogo": "Catan",
					"thumb": "https://img/13",
					"semantic_score": 0.8,
					"final_score": 0.9
				},
				{ "id_mysql": null, "id_chroma": "doc-822", "nmJogo": null, "final_score": null }
			]
		});
		let games = parse_recommendation_response(json).expect("parse failed");

		assert_eq!(games[0].game_id, "13");
		assert_eq!(games[0].name, "Catan");
		assert_eq!(games[0].thumbnail.as_deref(), Some("https://img/13"));
		assert!((games[0].score - 0.9).abs() < 1e-6);
		assert_eq!(games[1].game_id, "doc-822");
		assert_eq!(games[1].name, "");
		assert_eq!(games[1].score, 0.0);
	}

	#[test]
	fn rejects_items_without_any_id() {
		let json = serde_json::json!({ "recommendations": [{ "nmJogo": "Azul", "final_score": 0.5 }] });
		let err = parse_recommendation_response(json).expect_err("expected invalid response");

		assert!(matches!(err, Error::InvalidResponse { .. }));
	}

	#[test]
	fn rejects_missing_array() {
		let err = parse_recommendation_response(serde_json::json!({}))
			.expect_err("expected invalid response");

		assert!(matches!(err, Error::InvalidResponse { .. }));
	}

	#[test]
	fn query_serializes_with_snake_case_fields() {
		let query = RecommendationQuery {
			query: "A group of beginner board game players.".to_string(),
			top_k: 5,
			candidate_pool_size: 50,
			semantic_weight: 0.5,
			popularity_weight: 0.5,
		};
		let json = serde_json::to_value(&query).expect("serialize failed");

		assert_eq!(json["top_k"], 5);
		assert_eq!(json["candidate_pool_size"], 50);
		assert_eq!(json["semantic_weight"], 0.5);
	}
}
