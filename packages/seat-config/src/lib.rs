mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Grouping, Providers, Recommendation,
	RecommendationProviderConfig, Service,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::invalid("service.http_bind", "must be non-empty"));
	}

	validate_providers(&cfg.providers)?;
	validate_grouping(&cfg.grouping)?;
	validate_recommendation(&cfg.recommendation)?;

	Ok(())
}

fn validate_providers(providers: &Providers) -> Result<()> {
	let embedding = &providers.embedding;
	let recommendation = &providers.recommendation;

	for (field, value) in [
		("providers.embedding.api_base", &embedding.api_base),
		("providers.embedding.path", &embedding.path),
		("providers.embedding.model", &embedding.model),
		("providers.recommendation.api_base", &recommendation.api_base),
		("providers.recommendation.path", &recommendation.path),
	] {
		if value.trim().is_empty() {
			return Err(Error::invalid(field, "must be non-empty"));
		}
	}

	if embedding.dimensions == 0 {
		return Err(Error::invalid("providers.embedding.dimensions", "must be greater than zero"));
	}
	if embedding.timeout_ms == 0 {
		return Err(Error::invalid("providers.embedding.timeout_ms", "must be greater than zero"));
	}
	if recommendation.timeout_ms == 0 {
		return Err(Error::invalid(
			"providers.recommendation.timeout_ms",
			"must be greater than zero",
		));
	}

	for (field, headers) in [
		("providers.embedding.default_headers", &embedding.default_headers),
		("providers.recommendation.default_headers", &recommendation.default_headers),
	] {
		if headers.values().any(|value| !value.is_string()) {
			return Err(Error::invalid(field, "values must be strings"));
		}
	}

	Ok(())
}

fn validate_grouping(grouping: &Grouping) -> Result<()> {
	if grouping.min_size == 0 {
		return Err(Error::invalid("grouping.min_size", "must be greater than zero"));
	}
	if grouping.max_size < grouping.min_size {
		return Err(Error::invalid("grouping.max_size", "must be at least grouping.min_size"));
	}
	if !grouping.cluster_eps.is_finite() || grouping.cluster_eps <= 0.0 {
		return Err(Error::invalid("grouping.cluster_eps", "must be a finite number above zero"));
	}
	if grouping.cluster_min_samples == 0 {
		return Err(Error::invalid("grouping.cluster_min_samples", "must be greater than zero"));
	}
	if !grouping.similarity_threshold.is_finite()
		|| !(-1.0..=1.0).contains(&grouping.similarity_threshold)
	{
		return Err(Error::invalid(
			"grouping.similarity_threshold",
			"must be in the range -1.0-1.0",
		));
	}
	if grouping.max_balance_iterations == 0 {
		return Err(Error::invalid(
			"grouping.max_balance_iterations",
			"must be greater than zero",
		));
	}

	Ok(())
}

fn validate_recommendation(recommendation: &Recommendation) -> Result<()> {
	if recommendation.top_k == 0 {
		return Err(Error::invalid("recommendation.top_k", "must be greater than zero"));
	}
	if recommendation.candidate_pool_size < recommendation.top_k {
		return Err(Error::invalid(
			"recommendation.candidate_pool_size",
			"must be at least recommendation.top_k",
		));
	}

	for (field, weight) in [
		("recommendation.semantic_weight", recommendation.semantic_weight),
		("recommendation.popularity_weight", recommendation.popularity_weight),
	] {
		if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
			return Err(Error::invalid(field, "must be in the range 0.0-1.0"));
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.service.log_level = cfg.service.log_level.trim().to_string();

	if cfg.service.log_level.is_empty() {
		cfg.service.log_level = "info".to_string();
	}

	cfg.providers.embedding.api_key = cfg.providers.embedding.api_key.trim().to_string();
	cfg.providers.recommendation.api_key = cfg.providers.recommendation.api_key.trim().to_string();
}
