use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::completion::CompletionRequest;
use crate::config::Config;
use crate::providers::http_errors::chat_api_request_error;

#[derive(Debug, Serialize)]
struct ChatCompletionBody {
    model: String,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionReply {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorReply {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

fn completions_url(base_url: &str) -> String {
    format!("{}/v1/chat/completions", base_url.trim_end_matches('/'))
}

fn to_chat_body(request: &CompletionRequest) -> ChatCompletionBody {
    ChatCompletionBody {
        model: request.model.clone(),
        temperature: request.temperature,
        max_tokens: request.max_tokens,
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        }],
    }
}

fn first_choice_text(reply: ChatCompletionReply) -> Result<String> {
    let choice = reply
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Chat completion response contained no choices"))?;
    Ok(choice.message.content.unwrap_or_default())
}

fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ApiErrorReply>(body) {
        Ok(reply) => reply.error.message,
        Err(_) => body.to_string(),
    }
}

pub async fn complete(client: &Client, cfg: &Config, request: &CompletionRequest) -> Result<String> {
    let api_url = completions_url(&cfg.base_url);
    let body = to_chat_body(request);
    debug!(
        api_url = %api_url,
        model = %request.model,
        prompt_len = request.prompt.len(),
        "sending chat completion request"
    );

    let response = client
        .post(&api_url)
        .bearer_auth(&cfg.api_key)
        .json(&body)
        .send()
        .await
        .map_err(|err| {
            warn!(
                api_url = %api_url,
                model = %request.model,
                error = %err,
                "chat completion request failed"
            );
            chat_api_request_error(err, &api_url)
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let response_body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read response body>".to_string());
        warn!(
            api_url = %api_url,
            model = %request.model,
            status = %status,
            response_body_len = response_body.len(),
            "chat completion API returned non-success status"
        );
        return Err(anyhow!(
            "Chat completion request failed with status {}: {}",
            status,
            error_detail(&response_body)
        ));
    }

    let parsed: ChatCompletionReply = response
        .json()
        .await
        .context("Failed to parse chat completion response")?;
    let text = first_choice_text(parsed)?;
    debug!(
        model = %request.model,
        response_len = text.len(),
        "received chat completion response"
    );
    Ok(text)
}
