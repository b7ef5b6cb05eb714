use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// File bytes sent inline alongside the prompt.
#[derive(Debug, Clone)]
pub struct InlineFile {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Returns the model's text answer for the prompt and attached file.
    async fn generate(&self, prompt: &str, file: InlineFile) -> Result<String, String>;
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        GeminiClient {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", API_BASE, self.model)
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, prompt: &str, file: InlineFile) -> Result<String, String> {
        log::info!("Requesting generation from {} ({} bytes attached)", self.model, file.data.len());

        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&build_request(prompt, &file))
            .send()
            .await
            .map_err(|err| format!("request failed: {}", err))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("API returned {}: {}", status, body));
        }

        let parsed: GenerateContentResponse = resp
            .json()
            .await
            .map_err(|err| format!("invalid response body: {}", err))?;
        response_text(parsed)
    }
}

#[derive(Serialize, Debug)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

fn build_request(prompt: &str, file: &InlineFile) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![
                Part {
                    text: Some(prompt.to_string()),
                    inline_data: None,
                },
                Part {
                    text: None,
                    inline_data: Some(InlineData {
                        mime_type: file.mime_type.clone(),
                        data: STANDARD.encode(&file.data),
                    }),
                },
            ],
        }],
    }
}

fn response_text(resp: GenerateContentResponse) -> Result<String, String> {
    let Some(candidate) = resp.candidates.into_iter().next() else {
        let reason = resp
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(format!("response blocked: {}", reason));
    };

    let text: String = candidate
        .content
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    // SAFETY and RECITATION stops come back with no usable text
    match candidate.finish_reason.as_deref() {
        Some(reason) if text.is_empty() && reason != "STOP" => {
            Err(format!("candidate finished with {}", reason))
        }
        _ => Ok(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_puts_prompt_before_encoded_file() {
        let file = InlineFile {
            mime_type: "image/png".to_string(),
            data: b"hello".to_vec(),
        };
        let body = serde_json::to_value(build_request("describe", &file)).unwrap();

        assert_eq!(
            body,
            json!({
                "contents": [{ "parts": [
                    { "text": "describe" },
                    { "inlineData": { "mimeType": "image/png", "data": "aGVsbG8=" } }
                ]}]
            })
        );
    }

    #[test]
    fn joins_text_parts_of_first_candidate() {
        let resp: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "A cat " }, { "text": "on a mat." }] }, "finishReason": "STOP" },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .unwrap();

        assert_eq!(response_text(resp).unwrap(), "A cat on a mat.");
    }

    #[test]
    fn blocked_prompt_is_an_error() {
        let resp: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .unwrap();

        assert_eq!(response_text(resp).unwrap_err(), "response blocked: SAFETY");
    }

    #[test]
    fn empty_candidate_with_safety_stop_is_an_error() {
        let resp: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        }))
        .unwrap();

        assert_eq!(response_text(resp).unwrap_err(), "candidate finished with SAFETY");
    }

    #[test]
    fn endpoint_names_the_model() {
        let client = GeminiClient::new("key", "gemini-1.5-flash");
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }
}
