//! Response normalizer.
//!
//! Reduces an upstream body to an ordered list of candidate texts and joins
//! them into a single reply. Missing or `null` fields are not faults; only
//! bytes that are not JSON at all are.

use parley_types::completion::CompletionResponse;
use parley_types::error::RelayError;
use tracing::{debug, warn};

/// Separator placed between candidates when several choices come back.
pub const CANDIDATE_SEPARATOR: &str = "\n\n";

/// Reply used when the upstream returned no usable choices.
pub const EMPTY_CHOICES_REPLY: &str = "Something went wrong, please retry later";

/// Reply used when the upstream could not be reached or understood.
pub const UPSTREAM_FAILURE_REPLY: &str = "OPS ! Bot busy, please try again";

/// Reply used when the user sent blank text.
pub const EMPTY_QUERY_REPLY: &str = "Can I help you, give me some question !";

/// Deserialize the upstream body. A top-level `null` reads as an empty
/// response.
pub fn parse_response(bytes: &[u8]) -> Result<CompletionResponse, RelayError> {
    serde_json::from_slice::<Option<CompletionResponse>>(bytes)
        .map(Option::unwrap_or_default)
        .map_err(|e| RelayError::MalformedResponse(e.to_string()))
}

/// Candidate text of every choice, in choice order.
pub fn parse(bytes: &[u8]) -> Result<Vec<String>, RelayError> {
    let response = parse_response(bytes)?;

    if let Some(message) = response.error_message() {
        warn!(%message, "upstream body carried an error member");
    }
    debug!(
        id = %response.id,
        model = %response.model,
        choices = response.choices.len(),
        total_tokens = response.usage.total_tokens,
        "parsed completion response"
    );

    Ok(response.candidate_texts())
}

/// Join candidates into one reply, or `None` when there were no choices.
///
/// Blank candidates still count as choices and are joined as they are.
pub fn join_candidates(candidates: &[String]) -> Option<String> {
    if candidates.is_empty() {
        None
    } else {
        Some(candidates.join(CANDIDATE_SEPARATOR))
    }
}
