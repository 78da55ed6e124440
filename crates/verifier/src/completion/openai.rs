use serde::{Deserialize, Serialize};

use super::{CompletionError, CompletionResponse, TokenUsage};

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<OpenAiMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    usage: OpenAiUsage,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Deserialize)]
struct OpenAiError {
    error: OpenAiErrorDetail,
}

#[derive(Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

fn from_wire_response(resp: OpenAiResponse) -> Result<CompletionResponse, CompletionError> {
    let text = resp
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| CompletionError::Parse("Empty choices in OpenAI response".to_string()))?;

    Ok(CompletionResponse {
        text,
        usage: TokenUsage {
            input_tokens: resp.usage.prompt_tokens,
            output_tokens: resp.usage.completion_tokens,
        },
    })
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Send a single-turn completion request to the OpenAI chat completions API.
pub async fn send_completion(
    http: &reqwest::Client,
    api_key: &str,
    model: &str,
    max_tokens: u32,
    temperature: Option<f64>,
    prompt: &str,
) -> Result<CompletionResponse, CompletionError> {
    let start = std::time::Instant::now();

    let request = OpenAiRequest {
        model,
        max_tokens,
        messages: vec![OpenAiMessage {
            role: "user",
            content: prompt,
        }],
        temperature,
    };

    let response = http
        .post(OPENAI_CHAT_URL)
        .bearer_auth(api_key)
        .header("content-type", "application/json")
        .json(&request)
        .send()
        .await
        .map_err(|e| CompletionError::Http(e.to_string()))?;

    let status = response.status();
    metrics::histogram!("completion.api.latency", "provider" => "openai")
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
        let msg = match serde_json::from_str::<OpenAiError>(&body) {
            Ok(e) => e.error.message,
            Err(_) => body,
        };
        return Err(CompletionError::Api(format!("{}: {}", status, msg)));
    }

    let body: OpenAiResponse = response
        .json()
        .await
        .map_err(|e| CompletionError::Parse(format!("Failed to parse OpenAI response: {}", e)))?;

    from_wire_response(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_openai_completion_response() {
        let json = r#"{
            "choices": [{"message": {"role": "assistant", "content": "hello"}}],
            "usage": {"prompt_tokens": 7, "completion_tokens": 3}
        }"#;

        let resp: OpenAiResponse = serde_json::from_str(json).unwrap();
        let parsed = from_wire_response(resp).unwrap();

        assert_eq!(parsed.text, "hello");
        assert_eq!(parsed.usage.input_tokens, 7);
        assert_eq!(parsed.usage.output_tokens, 3);
    }

    #[test]
    fn test_empty_choices_is_parse_error() {
        let json = r#"{"choices": [], "usage": {"prompt_tokens": 1, "completion_tokens": 0}}"#;
        let resp: OpenAiResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            from_wire_response(resp),
            Err(CompletionError::Parse(_))
        ));
    }
}
