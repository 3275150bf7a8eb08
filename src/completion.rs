use anyhow::Result;
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;

use crate::config::Config;
use crate::providers;

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    pub text: String,
}

pub type CompletionFuture<'a> = Pin<Box<dyn Future<Output = Result<CompletionResponse>> + 'a>>;

pub trait CompletionGateway {
    fn complete<'a>(&'a self, request: CompletionRequest) -> CompletionFuture<'a>;
}

type BackendFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + 'a>>;

trait CompletionBackend {
    fn complete<'a>(
        &'a self,
        client: &'a Client,
        cfg: &'a Config,
        request: &'a CompletionRequest,
    ) -> BackendFuture<'a>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAIBackend;

impl CompletionBackend for OpenAIBackend {
    fn complete<'a>(
        &'a self,
        client: &'a Client,
        cfg: &'a Config,
        request: &'a CompletionRequest,
    ) -> BackendFuture<'a> {
        Box::pin(async move { providers::openai::complete(client, cfg, request).await })
    }
}

pub struct HttpCompletionGateway<'a, B = OpenAIBackend> {
    client: &'a Client,
    cfg: &'a Config,
    backend: B,
}

impl<'a> HttpCompletionGateway<'a, OpenAIBackend> {
    pub fn new(client: &'a Client, cfg: &'a Config) -> Self {
        Self {
            client,
            cfg,
            backend: OpenAIBackend,
        }
    }
}

impl<'a, B> HttpCompletionGateway<'a, B> {
    pub fn with_backend(client: &'a Client, cfg: &'a Config, backend: B) -> Self {
        Self {
            client,
            cfg,
            backend,
        }
    }
}

impl<'a, B> CompletionGateway for HttpCompletionGateway<'a, B>
where
    B: CompletionBackend,
{
    fn complete<'b>(&'b self, request: CompletionRequest) -> CompletionFuture<'b> {
        Box::pin(async move {
            let text = self
                .backend
                .complete(self.client, self.cfg, &request)
                .await?;
            Ok(CompletionResponse { text })
        })
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use std::cell::RefCell;

    use super::{
        BackendFuture, CompletionBackend, CompletionGateway, CompletionRequest,
        HttpCompletionGateway,
    };
    use crate::config::Config;

    #[derive(Debug)]
    enum StubOutcome {
        Ok(String),
        Err(String),
    }

    #[derive(Debug)]
    struct StubBackend {
        calls: RefCell<Vec<CompletionRequest>>,
        outcome: StubOutcome,
    }

    impl StubBackend {
        fn ok(text: impl Into<String>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                outcome: StubOutcome::Ok(text.into()),
            }
        }

        fn err(message: impl Into<String>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                outcome: StubOutcome::Err(message.into()),
            }
        }
    }

    impl CompletionBackend for StubBackend {
        fn complete<'a>(
            &'a self,
            _client: &'a reqwest::Client,
            _cfg: &'a Config,
            request: &'a CompletionRequest,
        ) -> BackendFuture<'a> {
            self.calls.borrow_mut().push(request.clone());
            let result = match &self.outcome {
                StubOutcome::Ok(text) => Ok(text.clone()),
                StubOutcome::Err(message) => Err(anyhow!(message.clone())),
            };
            Box::pin(async move { result })
        }
    }

    fn test_config() -> Config {
        Config {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.5,
            max_tokens: 100,
            api_key: "sk-testkey".to_string(),
            base_url: "https://api.openai.com".to_string(),
            prompt: "Say hi".to_string(),
        }
    }

    fn request(model: &str, temperature: f32, max_tokens: u32, prompt: &str) -> CompletionRequest {
        CompletionRequest {
            model: model.to_string(),
            temperature,
            max_tokens,
            prompt: prompt.to_string(),
        }
    }

    #[tokio::test]
    async fn gateway_returns_stub_text_regardless_of_request() {
        let client = reqwest::Client::new();
        let cfg = test_config();
        let gateway =
            HttpCompletionGateway::with_backend(&client, &cfg, StubBackend::ok("Hello, world!"));

        let first = gateway
            .complete(request("gpt-3.5-turbo", 0.5, 100, "Say hi"))
            .await
            .expect("dispatch should succeed");
        let second = gateway
            .complete(request("gpt-4", 1.0, 200, "Another prompt"))
            .await
            .expect("dispatch should succeed");

        assert_eq!(first.text, "Hello, world!");
        assert_eq!(second.text, "Hello, world!");

        let calls = gateway.backend.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], request("gpt-3.5-turbo", 0.5, 100, "Say hi"));
        assert_eq!(calls[1], request("gpt-4", 1.0, 200, "Another prompt"));
    }

    #[tokio::test]
    async fn gateway_accepts_empty_prompts() {
        let client = reqwest::Client::new();
        let cfg = test_config();
        let gateway =
            HttpCompletionGateway::with_backend(&client, &cfg, StubBackend::ok("No prompt"));

        let response = gateway
            .complete(request("gpt-3.5-turbo", 0.5, 100, ""))
            .await
            .expect("dispatch should succeed");

        assert_eq!(response.text, "No prompt");
    }

    #[tokio::test]
    async fn gateway_preserves_backend_errors() {
        let client = reqwest::Client::new();
        let cfg = test_config();
        let gateway =
            HttpCompletionGateway::with_backend(&client, &cfg, StubBackend::err("API error"));

        let err = gateway
            .complete(request("gpt-3.5-turbo", 0.5, 100, "Say hi"))
            .await
            .expect_err("dispatch should fail");

        assert_eq!(err.to_string(), "API error");
        assert_eq!(gateway.backend.calls.borrow().len(), 1);
    }
}
