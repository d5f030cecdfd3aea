//! Scripted completion client for pipeline tests.

use folio_core::{AppError, AppResult};
use folio_llm::{Completion, CompletionRequest, TextCompleter, Usage};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

type Transform = Box<dyn Fn(&str) -> String + Send + Sync>;
type Predicate = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Replies from a queue first, then by transforming the user prompt.
pub struct ScriptedCompleter {
    queue: Mutex<VecDeque<String>>,
    transform: Transform,
    fail_when: Option<Predicate>,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompleter {
    /// Returns the user prompt unchanged.
    pub fn echo() -> Self {
        Self::mapping(str::to_string)
    }

    pub fn mapping(transform: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            transform: Box::new(transform),
            fail_when: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queued(responses: Vec<String>) -> Self {
        let completer = Self::echo();
        *completer.queue.lock().unwrap() = responses.into();
        completer
    }

    /// Fail with an `AppError::Llm` whenever the prompt matches.
    pub fn failing_when(mut self, predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.fail_when = Some(Box::new(predicate));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TextCompleter for ScriptedCompleter {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> AppResult<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if self.fail_when.as_ref().is_some_and(|f| f(&request.prompt)) {
            return Err(AppError::Llm("connection reset by peer".to_string()));
        }

        let content = self
            .queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| (self.transform)(&request.prompt));

        Ok(Completion {
            content,
            model: request.model.clone(),
            usage: Usage::new(10, 20),
        })
    }
}

/// `n` numbered lines joined by newlines.
pub fn numbered_lines(n: usize) -> String {
    (1..=n)
        .map(|i| format!("<p>Line {i}</p>"))
        .collect::<Vec<_>>()
        .join("\n")
}
