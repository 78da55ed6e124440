use serde::{Deserialize, Serialize};

use super::{CompletionError, CompletionResponse, TokenUsage};

const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<AnthropicMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    usage: AnthropicUsage,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}

#[derive(Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

#[derive(Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

fn from_wire_response(resp: AnthropicResponse) -> CompletionResponse {
    let text = resp
        .content
        .into_iter()
        .filter_map(|block| match block {
            AnthropicContentBlock::Text { text } => Some(text),
            AnthropicContentBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join("");

    CompletionResponse {
        text,
        usage: TokenUsage {
            input_tokens: resp.usage.input_tokens,
            output_tokens: resp.usage.output_tokens,
        },
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Send a single-turn completion request to the Anthropic Messages API.
pub async fn send_completion(
    http: &reqwest::Client,
    api_key: &str,
    model: &str,
    max_tokens: u32,
    temperature: Option<f64>,
    prompt: &str,
) -> Result<CompletionResponse, CompletionError> {
    let start = std::time::Instant::now();

    let request = AnthropicRequest {
        model,
        max_tokens,
        messages: vec![AnthropicMessage {
            role: "user",
            content: prompt,
        }],
        temperature,
    };

    let response = http
        .post(ANTHROPIC_MESSAGES_URL)
        .header("x-api-key", api_key)
        .header("anthropic-version", ANTHROPIC_VERSION)
        .header("content-type", "application/json")
        .json(&request)
        .send()
        .await
        .map_err(|e| CompletionError::Http(e.to_string()))?;

    let status = response.status();
    metrics::histogram!("completion.api.latency", "provider" => "anthropic")
        .record(start.elapsed().as_secs_f64());

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        let body = response.text().await.unwrap_or_default();
        return Err(CompletionError::Auth(format!("{}: {}", status, body)));
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        return Err(CompletionError::RateLimited { retry_after });
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let msg = match serde_json::from_str::<AnthropicError>(&body) {
            Ok(e) => e.error.message,
            Err(_) => body,
        };
        return Err(CompletionError::Api(format!("{}: {}", status, msg)));
    }

    let body: AnthropicResponse = response
        .json()
        .await
        .map_err(|e| CompletionError::Parse(format!("Failed to parse Anthropic response: {}", e)))?;

    Ok(from_wire_response(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_anthropic_completion_response() {
        let json = r#"{
            "content": [{"type": "text", "text": "[]"}],
            "usage": {"input_tokens": 42, "output_tokens": 2}
        }"#;

        let resp: AnthropicResponse = serde_json::from_str(json).unwrap();
        let parsed = from_wire_response(resp);

        assert_eq!(parsed.text, "[]");
        assert_eq!(parsed.usage.input_tokens, 42);
        assert_eq!(parsed.usage.output_tokens, 2);
    }

    #[test]
    fn test_multiple_text_blocks_concatenate() {
        let json = r#"{
            "content": [
                {"type": "text", "text": "part one "},
                {"type": "text", "text": "part two"}
            ],
            "usage": {"input_tokens": 1, "output_tokens": 1}
        }"#;

        let resp: AnthropicResponse = serde_json::from_str(json).unwrap();
        assert_eq!(from_wire_response(resp).text, "part one part two");
    }
}
