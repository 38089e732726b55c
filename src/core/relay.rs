//! The AI-to-AI relay loop.
//!
//! A [`RelayEngine`] owns two participants and a [`RelayPolicy`]. Running it
//! for one user utterance produces every intermediate exchange (for display)
//! and the single [`Turn`] that gets persisted.

use tracing::{debug, warn};

use crate::core::conversation::Turn;
use crate::core::formatter::format_text;
use crate::core::providers::Provider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayPolicy {
    /// A answers the input, B answers A, and B's answer seeds the next round.
    Chained { iterations: usize },
    /// A and B both answer the user input once.
    Independent,
}

impl RelayPolicy {
    /// Chained policy with at least one iteration.
    pub fn chained(iterations: usize) -> Self {
        RelayPolicy::Chained {
            iterations: iterations.max(1),
        }
    }

    pub fn iterations(&self) -> usize {
        match self {
            RelayPolicy::Chained { iterations } => (*iterations).max(1),
            RelayPolicy::Independent => 1,
        }
    }
}

/// A provider plus how its output is post-processed.
pub struct Participant {
    provider: Box<dyn Provider>,
    format_markdown: bool,
}

impl Participant {
    pub fn new(provider: Box<dyn Provider>, format_markdown: bool) -> Self {
        Self {
            provider,
            format_markdown,
        }
    }

    pub fn name(&self) -> &str {
        self.provider.name()
    }

    /// Ask the provider for a reply. Failures come back as `Error: ...` text
    /// and are never formatted.
    async fn respond(&self, prompt: &str) -> String {
        match self.provider.generate(prompt).await {
            Ok(text) if self.format_markdown => format_text(&text),
            Ok(text) => text,
            Err(err) => {
                warn!(provider = self.name(), error = %err, "provider call failed");
                format!("Error: {err}")
            }
        }
    }
}

/// One A→B round as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// 1-based round number.
    pub iteration: usize,
    pub prompt_a: String,
    pub response_a: String,
    pub prompt_b: String,
    pub response_b: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    pub exchanges: Vec<Exchange>,
    /// The last exchange, keyed by the original user input.
    pub turn: Turn,
}

pub struct RelayEngine {
    a: Participant,
    b: Participant,
    policy: RelayPolicy,
}

impl RelayEngine {
    pub fn new(a: Participant, b: Participant, policy: RelayPolicy) -> Self {
        Self { a, b, policy }
    }

    pub fn label_a(&self) -> &str {
        self.a.name()
    }

    pub fn label_b(&self) -> &str {
        self.b.name()
    }

    pub fn policy(&self) -> RelayPolicy {
        self.policy
    }

    /// Run the relay for `user_input`. `on_exchange` is called as soon as
    /// each round completes, before the next one starts.
    pub async fn run<F>(&self, user_input: &str, mut on_exchange: F) -> RelayOutcome
    where
        F: FnMut(&Exchange),
    {
        let iterations = self.policy.iterations();
        let mut exchanges = Vec::with_capacity(iterations);
        let mut current_input = user_input.to_string();

        for iteration in 1..=iterations {
            debug!(iteration, iterations, "relay round");
            let response_a = self.a.respond(&current_input).await;
            let prompt_b = match self.policy {
                RelayPolicy::Chained { .. } => response_a.clone(),
                RelayPolicy::Independent => user_input.to_string(),
            };
            let response_b = self.b.respond(&prompt_b).await;

            let exchange = Exchange {
                iteration,
                prompt_a: std::mem::take(&mut current_input),
                response_a,
                prompt_b,
                response_b,
            };
            on_exchange(&exchange);
            current_input = exchange.response_b.clone();
            exchanges.push(exchange);
        }

        let turn = match exchanges.last() {
            Some(last) => Turn::new(user_input, &last.response_a, &last.response_b),
            None => Turn::new(user_input, "", ""),
        };

        RelayOutcome { exchanges, turn }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::providers::ProviderError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Scripted provider that records every prompt it receives.
    pub(crate) struct FakeProvider {
        name: &'static str,
        replies: Mutex<VecDeque<Result<String, String>>>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl FakeProvider {
        pub(crate) fn new(
            name: &'static str,
            replies: Vec<Result<&str, &str>>,
        ) -> (Self, Arc<Mutex<Vec<String>>>) {
            let prompts = Arc::new(Mutex::new(Vec::new()));
            let provider = Self {
                name,
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|reply| reply.map(str::to_string).map_err(str::to_string))
                        .collect(),
                ),
                prompts: Arc::clone(&prompts),
            };
            (provider, prompts)
        }

        /// Provider that answers every prompt with `prefix: <prompt>`.
        pub(crate) fn echo(name: &'static str) -> Self {
            Self {
                name,
                replies: Mutex::new(VecDeque::new()),
                prompts: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl Provider for FakeProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(message)) => Err(ProviderError::Api {
                    status: reqwest::StatusCode::GATEWAY_TIMEOUT,
                    message,
                }),
                None => Ok(format!("{}: {prompt}", self.name)),
            }
        }
    }

    fn engine(a: FakeProvider, b: FakeProvider, policy: RelayPolicy) -> RelayEngine {
        RelayEngine::new(
            Participant::new(Box::new(a), false),
            Participant::new(Box::new(b), false),
            policy,
        )
    }

    #[tokio::test]
    async fn chained_mode_yields_n_pairs_and_feeds_b_into_a() {
        let (a, a_prompts) = FakeProvider::new("A", vec![Ok("a1"), Ok("a2"), Ok("a3")]);
        let (b, b_prompts) = FakeProvider::new("B", vec![Ok("b1"), Ok("b2"), Ok("b3")]);
        let engine = engine(a, b, RelayPolicy::chained(3));

        let mut seen = Vec::new();
        let outcome = engine.run("seed", |exchange| seen.push(exchange.iteration)).await;

        assert_eq!(outcome.exchanges.len(), 3);
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(*a_prompts.lock().unwrap(), vec!["seed", "b1", "b2"]);
        assert_eq!(*b_prompts.lock().unwrap(), vec!["a1", "a2", "a3"]);
        for pair in outcome.exchanges.windows(2) {
            assert_eq!(pair[1].prompt_a, pair[0].response_b);
        }
        assert_eq!(outcome.turn, Turn::new("seed", "a3", "b3"));
    }

    #[tokio::test]
    async fn single_iteration_persists_the_only_pair() {
        let (a, _) = FakeProvider::new("A", vec![Ok("hi there")]);
        let (b, _) = FakeProvider::new("B", vec![Ok("greetings")]);
        let engine = engine(a, b, RelayPolicy::chained(1));

        let outcome = engine.run("hello", |_| {}).await;

        assert_eq!(outcome.turn, Turn::new("hello", "hi there", "greetings"));
    }

    #[tokio::test]
    async fn failed_call_becomes_text_and_is_chained() {
        let (a, _) = FakeProvider::new("A", vec![Err("operation timed out")]);
        let (b, b_prompts) = FakeProvider::new("B", vec![Ok("fine")]);
        let engine = engine(a, b, RelayPolicy::chained(1));

        let outcome = engine.run("hello", |_| {}).await;

        let expected = "Error: API request failed with status 504 Gateway Timeout: operation timed out";
        assert_eq!(outcome.turn.response_a, expected);
        assert_eq!(*b_prompts.lock().unwrap(), vec![expected]);
        assert_eq!(outcome.turn.response_b, "fine");
    }

    #[tokio::test]
    async fn independent_mode_sends_user_input_to_both() {
        let (a, a_prompts) = FakeProvider::new("A", vec![Ok("from a")]);
        let (b, b_prompts) = FakeProvider::new("B", vec![Ok("from b")]);
        let engine = engine(a, b, RelayPolicy::Independent);

        let outcome = engine.run("question", |_| {}).await;

        assert_eq!(outcome.exchanges.len(), 1);
        assert_eq!(*a_prompts.lock().unwrap(), vec!["question"]);
        assert_eq!(*b_prompts.lock().unwrap(), vec!["question"]);
        assert_eq!(outcome.turn, Turn::new("question", "from a", "from b"));
    }

    #[tokio::test]
    async fn formatting_applies_only_to_flagged_successful_replies() {
        let (a, _) = FakeProvider::new("A", vec![Ok("**bold** move")]);
        let (b, _) = FakeProvider::new("B", vec![Err("*not* markdown")]);
        let engine = RelayEngine::new(
            Participant::new(Box::new(a), true),
            Participant::new(Box::new(b), true),
            RelayPolicy::chained(1),
        );

        let outcome = engine.run("go", |_| {}).await;

        assert_eq!(outcome.turn.response_a, "bold move");
        assert!(outcome.turn.response_b.ends_with("*not* markdown"));
    }

    #[test]
    fn zero_iterations_clamp_to_one() {
        assert_eq!(RelayPolicy::chained(0), RelayPolicy::Chained { iterations: 1 });
        assert_eq!(RelayPolicy::Chained { iterations: 0 }.iterations(), 1);
        assert_eq!(RelayPolicy::Independent.iterations(), 1);
    }

    #[test]
    fn labels_come_from_providers() {
        let engine = engine(
            FakeProvider::echo("Grok"),
            FakeProvider::echo("Gemini"),
            RelayPolicy::chained(2),
        );
        assert_eq!(engine.label_a(), "Grok");
        assert_eq!(engine.label_b(), "Gemini");
    }
}
