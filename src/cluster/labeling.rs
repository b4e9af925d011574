//! Cluster naming via the text-generation collaborator.
//!
//! Labeling failures never abort a run: a placeholder name unique within
//! the run stands in when the collaborator fails or returns something
//! unparseable.

use rand::rngs::StdRng;
use rand::Rng;
use serde::Deserialize;

use crate::label::TextGenerator;

/// Name length cap (fits the cluster chip in the host UI).
pub(super) const MAX_NAME_LEN: usize = 30;

/// Description length cap (one line of the cluster card).
pub(super) const MAX_DESCRIPTION_LEN: usize = 100;

/// How many representative member texts go into the prompt.
pub(super) const MAX_SAMPLE_TEXTS: usize = 5;

pub(super) struct ClusterLabel {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct LabelPayload {
    name: String,
    description: String,
}

/// Ask the collaborator to name one cluster from its most central texts.
/// `index` is the cluster's position within the run.
pub(super) fn label_cluster(
    generator: &dyn TextGenerator,
    sample_texts: &[&str],
    index: usize,
    member_count: usize,
    rng: &mut StdRng,
) -> ClusterLabel {
    match request_label(generator, sample_texts) {
        Ok(label) => label,
        Err(reason) => {
            log::warn!("cluster labeling failed ({reason}), using placeholder");
            placeholder_label(index, member_count, rng)
        }
    }
}

fn request_label(
    generator: &dyn TextGenerator,
    sample_texts: &[&str],
) -> Result<ClusterLabel, String> {
    let prompt = build_prompt(sample_texts);
    let raw = generator.generate(&prompt).map_err(|err| err.to_string())?;
    let payload = parse_payload(&raw).ok_or_else(|| format!("unparseable response: {raw:.80}"))?;

    let name = truncate_chars(payload.name.trim(), MAX_NAME_LEN);
    if name.is_empty() {
        return Err("empty name".to_string());
    }
    let description = truncate_chars(payload.description.trim(), MAX_DESCRIPTION_LEN);

    Ok(ClusterLabel { name, description })
}

fn build_prompt(sample_texts: &[&str]) -> String {
    let mut prompt = String::from(
        "These user experiences were grouped together by semantic similarity.\n\
         Reply with a JSON object {\"name\": \"...\", \"description\": \"...\"}\n\
         where name is at most 30 characters and description at most 100.\n\n\
         Experiences:\n",
    );
    for (i, text) in sample_texts.iter().take(MAX_SAMPLE_TEXTS).enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, text));
    }
    prompt
}

/// Extract the JSON object from a response that may wrap it in prose.
fn parse_payload(raw: &str) -> Option<LabelPayload> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}

/// Placeholder for a cluster the collaborator could not name. The index
/// keeps names unique within a run.
fn placeholder_label(index: usize, member_count: usize, rng: &mut StdRng) -> ClusterLabel {
    ClusterLabel {
        name: format!("Theme {}-{}", index + 1, rng.random_range(100..1000)),
        description: format!("A group of {member_count} related experiences."),
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}
