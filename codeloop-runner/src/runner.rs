//! The assistant runner: one round, start to finish.
//!
//! ```text
//! read inputs -> validate -> conversation -> complete -> explanation -> extract -> source -> marker
//! ```
//!
//! Credentials are resolved before a `Runner` exists, so a missing key fails
//! before any file is touched. Nothing is retried here.

use crate::bundle::{InputBundle, OutputBundle};
use crate::config::{Credentials, RunnerConfig};
use crate::conversation::Conversation;
use crate::error::{Error, Result};
use crate::markdown;
use crate::provider::{Completion, CompletionRequest, LlmProvider};
use tracing::{debug, info, warn};

/// Summary of a successful round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Turns sent with the request
    pub messages: usize,
    /// Fenced blocks that matched the target language
    pub blocks: usize,
    /// Bytes written to the source output
    pub source_bytes: usize,
    pub explanation_written: bool,
    pub next_written: bool,
}

/// Runs one assistant round against a provider
pub struct Runner<P: LlmProvider> {
    provider: P,
    credentials: Credentials,
    config: RunnerConfig,
}

impl<P: LlmProvider> Runner<P> {
    pub fn new(provider: P, credentials: Credentials, config: RunnerConfig) -> Self {
        Self {
            provider,
            credentials,
            config,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Read and validate the inputs and assemble the conversation.
    /// Touches no network.
    pub fn prepare(&self) -> Result<Conversation> {
        let paths = &self.config.paths;
        let bundle = InputBundle::read(paths)?;
        bundle.validate(paths)?;

        let conversation = Conversation::build(&bundle, &self.config.target);
        conversation.trace();
        Ok(conversation)
    }

    /// Run the whole round
    pub async fn run(&self) -> Result<RunOutcome> {
        let conversation = self.prepare()?;
        let messages = conversation.len();

        let request = CompletionRequest::new(self.credentials.project_id, conversation.into_messages())
            .with_system_prompt(self.config.target.system_prompt())
            .with_temperature(self.config.temperature)
            .with_model(self.config.model.clone());

        info!(provider = self.provider.name(), messages, "Generating code...");
        let completion = self
            .provider
            .complete(request)
            .await
            .map_err(|e| e.into_error(self.provider.name()).with_operation("runner::run"))?;

        let text = match completion {
            Completion::Success(text) => text,
            Completion::MalformedResponse(reason) => {
                return Err(Error::malformed_response(reason)
                    .with_operation("runner::run")
                    .with_context("provider", self.provider.name().to_string()));
            }
            Completion::NonTextContent => {
                return Err(Error::non_text_content()
                    .with_operation("runner::run")
                    .with_context("provider", self.provider.name().to_string()));
            }
        };
        debug!(response = %text, "completion text");

        let tree = markdown::parse(&text);
        let fences = markdown::code_fences(&tree, &self.config.target.language);
        let blocks = fences.len();
        let source = fences.concat();
        if blocks == 0 {
            warn!(
                language = %self.config.target.language,
                "response has no matching code blocks; writing an empty source file"
            );
        }

        let output = OutputBundle {
            source,
            explanation: Some(text),
            next: self.config.next_assistant.clone(),
        };
        let written = output.write(&self.config.paths)?;

        Ok(RunOutcome {
            messages,
            blocks,
            source_bytes: output.source.len(),
            explanation_written: written.explanation,
            next_written: written.next,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::AssistantName;
    use crate::config::{GenerationTarget, IoPaths};
    use crate::error::ErrorKind;
    use crate::provider::{ChatMessage, ProviderError, Role};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Replays one canned answer and records the request it was given
    struct ScriptedProvider {
        reply: Mutex<Option<std::result::Result<Completion, ProviderError>>>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn answering(reply: std::result::Result<Completion, ProviderError>) -> Self {
            Self {
                reply: Mutex::new(Some(reply)),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        fn last_messages(&self) -> Vec<ChatMessage> {
            self.seen.lock().unwrap().last().unwrap().messages.clone()
        }
    }

    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> std::result::Result<Completion, ProviderError> {
            self.seen.lock().unwrap().push(request);
            self.reply
                .lock()
                .unwrap()
                .take()
                .expect("provider called more than once")
        }
    }

    fn credentials() -> Credentials {
        Credentials {
            api_key: "sk-test".into(),
            project_id: 99,
        }
    }

    fn workspace() -> (TempDir, IoPaths) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("in")).unwrap();
        let paths = IoPaths::rooted(dir.path().join("in"), dir.path().join("out"), "__main__.py");
        (dir, paths)
    }

    fn runner(
        paths: IoPaths,
        reply: std::result::Result<Completion, ProviderError>,
    ) -> Runner<ScriptedProvider> {
        Runner::new(
            ScriptedProvider::answering(reply),
            credentials(),
            RunnerConfig::new(paths, GenerationTarget::python()),
        )
    }

    const ANSWER: &str = "Here is your app:\n\n```python\nfrom flask import Flask\n```\n\n```bash\npip install flask\n```\n\n```python\napp = Flask(__name__)\n```\n";

    #[tokio::test]
    async fn test_missing_spec_and_source_aborts_before_call() {
        let (_dir, paths) = workspace();
        let runner = runner(paths.clone(), Ok(Completion::Success(ANSWER.into())));

        let err = runner.run().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputMissing);
        assert!(err.message().contains(&paths.spec.display().to_string()));
        assert!(err.message().contains(&paths.prior_source.display().to_string()));
        assert_eq!(runner.provider().calls(), 0);
        assert!(!paths.source_out.exists());
    }

    #[tokio::test]
    async fn test_source_without_spec_or_fix_aborts_before_call() {
        let (_dir, paths) = workspace();
        std::fs::write(&paths.prior_source, "print(1)").unwrap();
        let runner = runner(paths.clone(), Ok(Completion::Success(ANSWER.into())));

        let err = runner.run().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputMissing);
        assert!(err.message().contains(&paths.fix.display().to_string()));
        assert_eq!(runner.provider().calls(), 0);
    }

    #[tokio::test]
    async fn test_spec_only_round() {
        let (_dir, paths) = workspace();
        std::fs::write(&paths.spec, "A flask hello world").unwrap();
        let runner = runner(paths.clone(), Ok(Completion::Success(ANSWER.into())));

        let outcome = runner.run().await.unwrap();
        assert_eq!(outcome.messages, 1);
        assert_eq!(outcome.blocks, 2);
        assert!(!outcome.explanation_written);
        assert!(!outcome.next_written);

        let sent = runner.provider().last_messages();
        assert_eq!(sent, vec![ChatMessage::user("A flask hello world")]);

        let written = std::fs::read_to_string(&paths.source_out).unwrap();
        assert_eq!(written, "from flask import Flask\napp = Flask(__name__)\n");
    }

    #[tokio::test]
    async fn test_request_carries_contract() {
        let (_dir, paths) = workspace();
        std::fs::write(&paths.spec, "An app").unwrap();
        let runner = runner(paths, Ok(Completion::Success(ANSWER.into())));

        runner.run().await.unwrap();
        let seen = runner.provider().seen.lock().unwrap();
        assert_eq!(seen[0].project_id, 99);
        assert_eq!(seen[0].temperature, 0.0);
        assert!(seen[0].system_prompt.contains("port 5000"));
    }

    #[tokio::test]
    async fn test_fix_round_sends_fenced_source() {
        let (_dir, paths) = workspace();
        std::fs::write(&paths.prior_source, "print(1)").unwrap();
        std::fs::write(&paths.fix, "Print two").unwrap();
        let runner = runner(paths, Ok(Completion::Success(ANSWER.into())));

        runner.run().await.unwrap();
        let sent = runner.provider().last_messages();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].role, Role::Assistant);
        assert_eq!(sent[0].content, "\n```python\nprint(1)\n```\n");
        assert_eq!(sent[1].content, "Print two\n");
    }

    #[tokio::test]
    async fn test_writes_explanation_and_marker_when_configured() {
        let (dir, paths) = workspace();
        std::fs::write(&paths.spec, "An app").unwrap();
        let paths = paths
            .with_explanation_out(dir.path().join("out").join("explanation"))
            .with_next_out(dir.path().join("out").join("next"));
        let config = RunnerConfig::new(paths.clone(), GenerationTarget::python())
            .with_next_assistant(AssistantName::builtin("python"));
        let runner = Runner::new(
            ScriptedProvider::answering(Ok(Completion::Success(ANSWER.into()))),
            credentials(),
            config,
        );

        let outcome = runner.run().await.unwrap();
        assert!(outcome.explanation_written);
        assert!(outcome.next_written);
        assert_eq!(
            std::fs::read_to_string(paths.explanation_out.unwrap()).unwrap(),
            ANSWER
        );
        assert_eq!(
            std::fs::read_to_string(paths.next_out.unwrap()).unwrap(),
            "builtin:python"
        );
    }

    #[tokio::test]
    async fn test_malformed_response_writes_nothing() {
        let (_dir, paths) = workspace();
        std::fs::write(&paths.spec, "An app").unwrap();
        let runner = runner(
            paths.clone(),
            Ok(Completion::MalformedResponse("response is not JSON".into())),
        );

        let err = runner.run().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
        assert_ne!(err.exit_code(), 0);
        assert!(!paths.source_out.exists());
    }

    #[tokio::test]
    async fn test_non_text_content_writes_nothing() {
        let (_dir, paths) = workspace();
        std::fs::write(&paths.spec, "An app").unwrap();
        let runner = runner(paths.clone(), Ok(Completion::NonTextContent));

        let err = runner.run().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NonTextContent);
        assert!(!paths.source_out.exists());
    }

    #[tokio::test]
    async fn test_provider_error_is_upstream() {
        let (_dir, paths) = workspace();
        std::fs::write(&paths.spec, "An app").unwrap();
        let runner = runner(paths.clone(), Err(ProviderError::Network("refused".into())));

        let err = runner.run().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkFailed);
        assert!(err.is_retryable());
        assert!(!paths.source_out.exists());
    }

    #[tokio::test]
    async fn test_answer_without_code_truncates_output() {
        let (_dir, paths) = workspace();
        std::fs::write(&paths.spec, "An app").unwrap();
        std::fs::create_dir_all(paths.source_out.parent().unwrap()).unwrap();
        std::fs::write(&paths.source_out, "stale").unwrap();
        let runner = runner(paths.clone(), Ok(Completion::Success("I need more detail.".into())));

        let outcome = runner.run().await.unwrap();
        assert_eq!(outcome.blocks, 0);
        assert_eq!(std::fs::read_to_string(&paths.source_out).unwrap(), "");
    }
}
