/// Gemini `generateContent` adapter
///
/// Sends the user's photo (and, for custom costumes, the reference image)
/// as inline base64 parts next to a text prompt, and expects an inline
/// image part back.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use super::{TransformError, TransformationService};
use crate::state::data::{Costume, ImageData};
use crate::state::settings::Settings;

#[derive(Debug, Clone)]
pub struct GeminiService {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl GeminiService {
    pub fn new(client: reqwest::Client, settings: &Settings, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            model: settings.model.clone(),
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl TransformationService for GeminiService {
    #[tracing::instrument(skip_all, fields(costume = %costume.name))]
    async fn transform(&self, photo: &ImageData, costume: &Costume) -> Result<ImageData, TransformError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TransformError::new("Missing Gemini API key (set GEMINI_API_KEY)"))?;

        let request = build_request(photo, costume);
        tracing::info!("🚀 Sending transformation request ({} KB photo)", photo.len() / 1024);

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!("Transformation rejected with status {}", status);
            return Err(match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) => TransformError::new(envelope.error.message),
                Err(_) => TransformError::unexplained(),
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| TransformError::new(format!("Unexpected response from transformation service: {}", e)))?;

        extract_image(parsed)
    }
}

fn prompt_for(costume: &Costume) -> String {
    if costume.is_custom() {
        "Redraw the person in the first image wearing the costume shown in the second image. \
         Keep their face, pose, body shape and the background unchanged. Photorealistic result."
            .to_string()
    } else {
        format!(
            "Redraw the person in this photo wearing a detailed, screen-accurate {} costume ({} cosplay). \
             Keep their face, pose, body shape and the background unchanged. Photorealistic result.",
            costume.name, costume.category
        )
    }
}

fn inline_part(image: &ImageData) -> Part {
    Part {
        text: None,
        inline_data: Some(InlineData {
            mime_type: image.media_type().to_string(),
            data: image.to_base64(),
        }),
    }
}

fn build_request(photo: &ImageData, costume: &Costume) -> GenerateRequest {
    let mut parts = vec![inline_part(photo)];
    if let Some(reference) = costume.reference_image() {
        parts.push(inline_part(reference));
    }
    parts.push(Part {
        text: Some(prompt_for(costume)),
        inline_data: None,
    });

    GenerateRequest {
        contents: vec![Content { parts }],
        generation_config: GenerationConfig {
            response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
        },
    }
}

/// Pull the first inline image out of a successful response
fn extract_image(response: GenerateResponse) -> Result<ImageData, TransformError> {
    if let Some(reason) = response.prompt_feedback.and_then(|feedback| feedback.block_reason) {
        return Err(TransformError::new(format!("Request blocked by content policy ({})", reason)));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| TransformError::new("The transformation service returned no result"))?;

    let parts = candidate.content.map(|content| content.parts).unwrap_or_default();

    let mut refusal = None;
    for part in parts {
        if let Some(inline) = part.inline_data {
            let bytes = STANDARD
                .decode(inline.data.as_bytes())
                .map_err(|e| TransformError::new(format!("Result image is not valid base64: {}", e)))?;
            return ImageData::from_encoded(inline.mime_type, bytes)
                .map_err(|e| TransformError::new(format!("Result image could not be decoded: {}", e)));
        }
        if refusal.is_none() {
            refusal = part.text;
        }
    }

    let message = match (refusal, candidate.finish_reason) {
        (Some(text), _) => format!("No image was generated: {}", text.trim()),
        (None, Some(reason)) => format!("No image was generated (finish reason: {})", reason),
        (None, None) => "No image was generated".to_string(),
    };
    Err(TransformError::new(message))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::catalog;
    use crate::state::data::fixtures;
    use crate::state::ids::SessionIds;

    #[test]
    fn test_request_for_catalog_costume() {
        let photo = fixtures::image(1);
        let costume = catalog::find("c1").unwrap();

        let json = serde_json::to_value(build_request(&photo, &costume)).unwrap();
        let parts = json["contents"][0]["parts"].as_array().unwrap();

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], photo.to_base64());
        assert!(parts[1]["text"].as_str().unwrap().contains("Naruto Ninja"));
        assert!(parts[1].get("inlineData").is_none());
        assert_eq!(json["generationConfig"]["responseModalities"][0], "IMAGE");
    }

    #[test]
    fn test_request_for_custom_costume_includes_reference() {
        let photo = fixtures::image(1);
        let reference = fixtures::image(2);
        let costume = catalog::custom_costume("armor.png", reference.clone(), &mut SessionIds::default());

        let json = serde_json::to_value(build_request(&photo, &costume)).unwrap();
        let parts = json["contents"][0]["parts"].as_array().unwrap();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1]["inlineData"]["data"], reference.to_base64());
    }

    #[test]
    fn test_extract_image() {
        let result = fixtures::image(77);
        let body = serde_json::json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "Here you go" },
                    { "inlineData": { "mimeType": "image/png", "data": result.to_base64() } }
                ]},
                "finishReason": "STOP"
            }]
        });

        let response: GenerateResponse = serde_json::from_value(body).unwrap();
        assert_eq!(extract_image(response).unwrap(), result);
    }

    #[test]
    fn test_extract_blocked_prompt() {
        let body = serde_json::json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let response: GenerateResponse = serde_json::from_value(body).unwrap();

        let error = extract_image(response).unwrap_err();
        assert_eq!(error.user_message(), "Request blocked by content policy (SAFETY)");
    }

    #[test]
    fn test_extract_text_only_answer() {
        let body = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "I can't do that." }] } }]
        });
        let response: GenerateResponse = serde_json::from_value(body).unwrap();

        let error = extract_image(response).unwrap_err();
        assert_eq!(error.user_message(), "No image was generated: I can't do that.");
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_network() {
        let service = GeminiService::new(reqwest::Client::new(), &Settings::default(), None);
        let costume = catalog::find("c2").unwrap();

        let error = service.transform(&fixtures::image(3), &costume).await.unwrap_err();
        assert_eq!(error.user_message(), "Missing Gemini API key (set GEMINI_API_KEY)");
    }
}
