use serde::{Deserialize, Serialize};

use crate::participant::{ExperienceLevel, Participant};

pub const TOP_PREFERENCES: usize = 3;

/// Representative summary of a group's members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupProfile {
	pub predominant_level: ExperienceLevel,
	pub top_mechanics: Vec<String>,
	pub top_themes: Vec<String>,
}
impl GroupProfile {
	/// Natural-language query sent to the recommendation provider.
	pub fn query_text(&self) -> String {
		let mut parts = vec![format!("A group of {} board game players.", self.predominant_level)];

		if !self.top_mechanics.is_empty() {
			parts.push(format!("They enjoy mechanics such as {}.", self.top_mechanics.join(", ")));
		}
		if !self.top_themes.is_empty() {
			parts.push(format!("They prefer themes like {}.", self.top_themes.join(", ")));
		}

		parts.join(" ")
	}
}

pub fn summarize<'a, I>(members: I) -> GroupProfile
where
	I: IntoIterator<Item = &'a Participant>,
{
	let mut levels = Vec::new();
	let mut mechanics = Vec::new();
	let mut themes = Vec::new();

	for member in members {
		if let Some(level) = member.level() {
			levels.push(level);
		}

		mechanics.extend(member.mechanics());
		themes.extend(member.themes());
	}

	GroupProfile {
		predominant_level: most_common(levels).unwrap_or_default(),
		top_mechanics: top_n(mechanics, TOP_PREFERENCES).into_iter().map(str::to_string).collect(),
		top_themes: top_n(themes, TOP_PREFERENCES).into_iter().map(str::to_string).collect(),
	}
}

/// The `limit` most frequent values. Equal counts keep first-encountered order.
pub fn top_n<T>(values: impl IntoIterator<Item = T>, limit: usize) -> Vec<T>
where
	T: PartialEq,
{
	let mut counts = tally(values);

	// Stable sort, so first-seen order survives among equal counts.
	counts.sort_by(|(_, lhs), (_, rhs)| rhs.cmp(lhs));
	counts.truncate(limit);

	counts.into_iter().map(|(value, _)| value).collect()
}

pub fn most_common<T>(values: impl IntoIterator<Item = T>) -> Option<T>
where
	T: PartialEq,
{
	top_n(values, 1).into_iter().next()
}

fn tally<T>(values: impl IntoIterator<Item = T>) -> Vec<(T, usize)>
where
	T: PartialEq,
{
	let mut counts: Vec<(T, usize)> = Vec::new();

	for value in values {
		match counts.iter_mut().find(|(seen, _)| *seen == value) {
			Some((_, count)) => *count += 1,
			None => counts.push((value, 1)),
		}
	}

	counts
}
