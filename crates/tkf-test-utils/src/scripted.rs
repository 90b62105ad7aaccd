//! Scripted generative service

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tkf_llm::{GenerationRequest, LlmError, TextGenerator};

type Handler = Arc<dyn Fn(&GenerationRequest) -> Result<String, LlmError> + Send + Sync>;

enum Script {
    Handler(Handler),
    Queue(VecDeque<String>),
}

/// [`TextGenerator`] answering by request name
///
/// Every request is recorded before it is answered. A request whose name has
/// no script fails with `LlmError::Config`, so unexpected calls surface in
/// tests.
#[derive(Default)]
pub struct ScriptedGenerator {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<GenerationRequest>>,
    latency: Option<Duration>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer `name` with `text`
    #[must_use]
    pub fn reply(self, name: &str, text: impl Into<String>) -> Self {
        let text = text.into();
        self.on(name, move |_| Ok(text.clone()))
    }

    /// Answer `name` with `texts` in order, then fail
    #[must_use]
    pub fn replies<I, S>(self, name: &str, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queue = texts.into_iter().map(Into::into).collect();
        self.scripts.lock().insert(name.to_string(), Script::Queue(queue));
        self
    }

    /// Answer `name` by inspecting the request
    #[must_use]
    pub fn on<F>(self, name: &str, handler: F) -> Self
    where
        F: Fn(&GenerationRequest) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        self.scripts
            .lock()
            .insert(name.to_string(), Script::Handler(Arc::new(handler)));
        self
    }

    /// Fail every `name` request
    #[must_use]
    pub fn fail<F>(self, name: &str, error: F) -> Self
    where
        F: Fn() -> LlmError + Send + Sync + 'static,
    {
        self.on(name, move |_| Err(error()))
    }

    /// Delay every answer
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Every recorded request, in call order
    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls_named(&self, name: &str) -> Vec<GenerationRequest> {
        self.calls
            .lock()
            .iter()
            .filter(|request| request.name == name)
            .cloned()
            .collect()
    }

    fn answer(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let handler = {
            let mut scripts = self.scripts.lock();
            match scripts.get_mut(&request.name) {
                Some(Script::Handler(handler)) => handler.clone(),
                Some(Script::Queue(queue)) => {
                    return queue.pop_front().ok_or_else(|| {
                        LlmError::Config(format!("script for `{}` exhausted", request.name))
                    });
                }
                None => {
                    return Err(LlmError::Config(format!(
                        "no script for `{}`",
                        request.name
                    )))
                }
            }
        };
        handler(request)
    }
}

impl std::fmt::Debug for ScriptedGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedGenerator")
            .field("calls", &self.call_count())
            .field("latency", &self.latency)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError> {
        self.calls.lock().push(request.clone());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.answer(&request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str) -> GenerationRequest {
        GenerationRequest::new(name, "", "prompt")
    }

    #[tokio::test]
    async fn answers_by_name_and_records() {
        let generator = ScriptedGenerator::new().reply("a", "one").replies("b", ["x", "y"]);

        assert_eq!(generator.generate(request("a")).await.unwrap(), "one");
        assert_eq!(generator.generate(request("b")).await.unwrap(), "x");
        assert_eq!(generator.generate(request("b")).await.unwrap(), "y");
        assert!(generator.generate(request("b")).await.is_err());
        assert!(matches!(
            generator.generate(request("c")).await,
            Err(LlmError::Config(_))
        ));

        assert_eq!(generator.call_count(), 5);
        assert_eq!(generator.calls_named("b").len(), 3);
    }

    #[tokio::test]
    async fn injected_failure() {
        let generator = ScriptedGenerator::new().fail("a", || LlmError::EmptyResponse);
        assert!(matches!(
            generator.generate(request("a")).await,
            Err(LlmError::EmptyResponse)
        ));
    }
}
