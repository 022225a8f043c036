use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
	Beginner,
	#[default]
	Intermediate,
	Advanced,
}
impl ExperienceLevel {
	/// Maps free-form labels onto the closed set. Anything unrecognized is
	/// treated as intermediate.
	pub fn from_label(label: &str) -> Self {
		let label = label.trim().to_lowercase();

		if label.contains("begin") || label.contains("novice") {
			return Self::Beginner;
		}
		if label.contains("adv") || label.contains("expert") {
			return Self::Advanced;
		}

		Self::Intermediate
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Beginner => "beginner",
			Self::Intermediate => "intermediate",
			Self::Advanced => "advanced",
		}
	}
}

impl std::fmt::Display for ExperienceLevel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
	#[serde(default)]
	pub mechanics: Vec<String>,
	#[serde(default)]
	pub themes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
	pub id: u64,
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub experience_level: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub preferences: Option<Preferences>,
}
impl Participant {
	/// `None` when the participant declared no level at all.
	pub fn level(&self) -> Option<ExperienceLevel> {
		self.experience_level
			.as_deref()
			.filter(|label| !label.trim().is_empty())
			.map(ExperienceLevel::from_label)
	}

	/// Declared mechanics with duplicates and blanks removed, first occurrence kept.
	pub fn mechanics(&self) -> Vec<&str> {
		distinct(self.preferences.as_ref().map(|prefs| prefs.mechanics.as_slice()))
	}

	pub fn themes(&self) -> Vec<&str> {
		distinct(self.preferences.as_ref().map(|prefs| prefs.themes.as_slice()))
	}

	/// Text sent to the embedding provider for this participant.
	pub fn profile_text(&self) -> String {
		let level = self.level().unwrap_or_default();
		let mut parts = vec![format!("Player has {level} experience.")];
		let mechanics = self.mechanics();
		let themes = self.themes();

		if !mechanics.is_empty() {
			parts.push(format!("Enjoys mechanics like {}.", mechanics.join(", ")));
		}
		if !themes.is_empty() {
			parts.push(format!("Prefers themes such as {}.", themes.join(", ")));
		}

		parts.join(" ")
	}
}

fn distinct(values: Option<&[String]>) -> Vec<&str> {
	let mut out: Vec<&str> = Vec::new();

	for value in values.unwrap_or_default() {
		let value = value.trim();

		if !value.is_empty() && !out.contains(&value) {
			out.push(value);
		}
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	fn participant(level: Option<&str>, mechanics: &[&str], themes: &[&str]) -> Participant {
		Participant {
			id: 7,
			name: "Ana".to_string(),
			experience_level: level.map(str::to_string),
			preferences: Some(Preferences {
				mechanics: mechanics.iter().map(|value| value.to_string()).collect(),
				themes: themes.iter().map(|value| value.to_string()).collect(),
			}),
		}
	}

	#[test]
	fn levels_are_normalized_leniently() {
		assert_eq!(ExperienceLevel::from_label(" Beginner "), ExperienceLevel::Beginner);
		assert_eq!(ExperienceLevel::from_label("novice player"), ExperienceLevel::Beginner);
		assert_eq!(ExperienceLevel::from_label("ADVANCED"), ExperienceLevel::Advanced);
		assert_eq!(ExperienceLevel::from_label("expert"), ExperienceLevel::Advanced);
		assert_eq!(ExperienceLevel::from_label("casual"), ExperienceLevel::Intermediate);
	}

	#[test]
	fn blank_level_counts_as_missing() {
		assert_eq!(participant(Some("  "), &[], &[]).level(), None);
		assert_eq!(participant(None, &[], &[]).level(), None);
	}

	#[test]
	fn profile_text_lists_distinct_preferences() {
		let text = participant(
			Some("advanced"),
			&["worker placement", "worker placement", "deck building"],
			&["fantasy", " "],
		)
		.profile_text();

		assert_eq!(
			text,
			"Player has advanced experience. Enjoys mechanics like worker placement, deck building. Prefers themes such as fantasy."
		);
	}

	#[test]
	fn profile_text_defaults_to_intermediate() {
		let text = participant(None, &[], &[]).profile_text();

		assert_eq!(text, "Player has intermediate experience.");
	}

	#[test]
	fn deserializes_camel_case_payload() {
		let payload = serde_json::json!({
			"id": 3,
			"name": "Bo",
			"experienceLevel": "beginner",
			"preferences": { "mechanics": ["trading"], "themes": [] }
		});
		let parsed: Participant = serde_json::from_value(payload).expect("parse failed");

		assert_eq!(parsed.level(), Some(ExperienceLevel::Beginner));
		assert_eq!(parsed.mechanics(), vec!["trading"]);
	}
}
