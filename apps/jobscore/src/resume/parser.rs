//! Résumé parsing: PDF bytes in, normalised text out, via the hosted model.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::llm_client::prompts::RESUME_PARSE_INSTRUCTION;
use crate::llm_client::{candidate_text, EndpointClient, GeminiClient, LlmError, Part};

const RESUME_PARSE_TASK: &str = "resume-parse";
const PDF_MIME: &str = "application/pdf";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to parse resume: {0}")]
    Llm(#[from] LlmError),

    #[error("No content generated by AI")]
    Empty,
}

#[async_trait]
pub trait ResumeParser: Send + Sync {
    async fn parse_pdf(&self, pdf: &[u8]) -> Result<String, ParseError>;
}

/// Sends `{ "type": "resume-parse", "payload": { "base64Data" } }` to the hosted endpoint.
pub struct EndpointResumeParser(pub EndpointClient);

#[async_trait]
impl ResumeParser for EndpointResumeParser {
    async fn parse_pdf(&self, pdf: &[u8]) -> Result<String, ParseError> {
        info!("Parsing resume via hosted endpoint ({} bytes)", pdf.len());
        let payload = json!({ "base64Data": STANDARD.encode(pdf) });
        let response = self.0.call_task(RESUME_PARSE_TASK, payload).await?;
        response_text(&response).ok_or(ParseError::Empty)
    }
}

/// Sends the PDF inline to Gemini's generateContent together with the parse instruction.
pub struct GeminiResumeParser(pub GeminiClient);

#[async_trait]
impl ResumeParser for GeminiResumeParser {
    async fn parse_pdf(&self, pdf: &[u8]) -> Result<String, ParseError> {
        info!("Parsing resume via Gemini ({} bytes)", pdf.len());
        let parts = vec![
            Part::inline(PDF_MIME, STANDARD.encode(pdf)),
            Part::text(RESUME_PARSE_INSTRUCTION),
        ];
        match self.0.generate_text(parts).await {
            Ok(text) => Ok(text),
            Err(LlmError::EmptyContent) => Err(ParseError::Empty),
            Err(e) => Err(e.into()),
        }
    }
}

/// The parse task answers with a single text blob; accept the shapes it comes in.
fn response_text(response: &Value) -> Option<String> {
    let text = match response {
        Value::String(text) => Some(text.as_str()),
        other => candidate_text(other).or_else(|| {
            ["text", "content", "data"]
                .iter()
                .find_map(|key| other.get(key).and_then(Value::as_str))
        }),
    };
    let text = text.map(str::trim).filter(|t| !t.is_empty())?;
    debug!("Parsed resume text: {} chars", text.chars().count());
    Some(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::build_http_client;
    use std::time::Duration;
    use url::Url;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn http() -> reqwest::Client {
        build_http_client(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_response_text_shapes() {
        assert_eq!(response_text(&json!(" # Jane ")).as_deref(), Some("# Jane"));
        assert_eq!(
            response_text(&json!({"text": "# Jane"})).as_deref(),
            Some("# Jane")
        );
        assert_eq!(
            response_text(&json!({"candidates": [{"content": {"parts": [{"text": "# Jane"}]}}]}))
                .as_deref(),
            Some("# Jane")
        );
        assert!(response_text(&json!({"text": ""})).is_none());
        assert!(response_text(&json!({"other": 1})).is_none());
    }

    #[tokio::test]
    async fn test_endpoint_parser_sends_base64_pdf() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "type": "resume-parse",
                "payload": {"base64Data": "JVBERi0xLjQ="}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("# Jane Doe\n## Experience")))
            .expect(1)
            .mount(&server)
            .await;

        let parser = EndpointResumeParser(EndpointClient::new(
            http(),
            Url::parse(&server.uri()).unwrap(),
        ));
        let text = parser.parse_pdf(b"%PDF-1.4").await.unwrap();
        assert_eq!(text, "# Jane Doe\n## Experience");
    }

    #[tokio::test]
    async fn test_endpoint_parser_empty_reply_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let parser = EndpointResumeParser(EndpointClient::new(
            http(),
            Url::parse(&server.uri()).unwrap(),
        ));
        assert!(matches!(
            parser.parse_pdf(b"%PDF-1.4").await,
            Err(ParseError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_gemini_parser_sends_inline_pdf_and_instruction() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "contents": [{"parts": [
                    {"inline_data": {"mime_type": "application/pdf", "data": "JVBERi0xLjQ="}},
                    {"text": RESUME_PARSE_INSTRUCTION}
                ]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "# Jane"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::with_base_url(
            http(),
            "key".to_string(),
            "gemini-2.5-flash".to_string(),
            server.uri(),
        );
        let text = GeminiResumeParser(client).parse_pdf(b"%PDF-1.4").await.unwrap();
        assert_eq!(text, "# Jane");
    }
}
