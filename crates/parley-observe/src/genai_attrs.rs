//! OpenTelemetry GenAI Semantic Convention attribute constants.
//!
//! Field names recorded on the upstream completion span. The span is opened
//! in `parley-core` by `info_span!`, which takes field names as literals, so
//! the request-side constants here mirror the names written out in that
//! span. The HTTP client fills in the response-side values with
//! `Span::record` using the constants directly.
//!
//! Span naming convention: `"gen_ai.complete"`.

// --- Required attributes ---

/// The name of the operation being performed ("chat" or "legacy").
pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// The name of the GenAI provider (e.g., "openai").
pub const GEN_AI_SYSTEM: &str = "gen_ai.system";

// --- Recommended attributes ---

/// The model ID requested (e.g., "gpt-3.5-turbo").
pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";

/// The sampling temperature for the request.
pub const GEN_AI_REQUEST_TEMPERATURE: &str = "gen_ai.request.temperature";

/// The maximum number of output tokens requested.
pub const GEN_AI_REQUEST_MAX_TOKENS: &str = "gen_ai.request.max_tokens";

/// The number of input tokens consumed.
pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

/// The number of output tokens generated.
pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// The unique response ID from the provider.
pub const GEN_AI_RESPONSE_ID: &str = "gen_ai.response.id";
