use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::PromptsConfig;
use crate::memory::{ChatTurn, MemoryProvider};
use crate::models::chat::ChatMessage;
use crate::utils::error::ApiError;

use super::traits::{LlmProvider, RetrievedChunk, Retriever};

/// Conversational retrieval: condense the follow-up question with the
/// session history, retrieve context for it, answer, then record the turn.
pub struct AnswerService {
    retriever: Arc<dyn Retriever>,
    llm: Arc<dyn LlmProvider>,
    memory: MemoryProvider,
    prompts: PromptsConfig,
}

impl AnswerService {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        llm: Arc<dyn LlmProvider>,
        memory: MemoryProvider,
        prompts: PromptsConfig,
    ) -> Self {
        Self {
            retriever,
            llm,
            memory,
            prompts,
        }
    }

    /// The read of the history and the final append are not atomic; two
    /// concurrent requests on one session can both answer from the same
    /// prior history.
    pub async fn answer(&self, question: &str, session_id: &str) -> Result<String, ApiError> {
        let start_time = Instant::now();

        let memory = self.memory.acquire(session_id).await?;
        let history = memory.messages().await?;
        debug!(
            "Session {} on {} memory with {} prior turns",
            session_id,
            memory.tier().as_str(),
            history.len()
        );

        let standalone_question = if history.is_empty() {
            question.to_string()
        } else {
            self.condense_question(&history, question).await?
        };

        let chunks = self
            .retriever
            .retrieve(&standalone_question)
            .await
            .map_err(|e| ApiError::RetrievalError(format!("{:#}", e)))?;
        debug!("Retrieved {} chunks for answer", chunks.len());

        let prompt = self.build_qa_prompt(&standalone_question, &chunks);
        let answer = self
            .llm
            .generate(&[ChatMessage::user(prompt)])
            .await
            .map_err(|e| ApiError::LlmError(format!("{:#}", e)))?;

        memory.append_exchange(question, &answer).await?;

        info!(
            "Answered session {} in {}ms ({} memory)",
            session_id,
            start_time.elapsed().as_millis(),
            memory.tier().as_str()
        );

        Ok(answer)
    }

    /// Full turn sequence of a session, in stored order
    pub async fn history(&self, session_id: &str) -> Result<Vec<ChatTurn>, ApiError> {
        let memory = self.memory.acquire(session_id).await?;
        Ok(memory.messages().await?)
    }

    async fn condense_question(
        &self,
        history: &[ChatTurn],
        question: &str,
    ) -> Result<String, ApiError> {
        let prompt = self
            .prompts
            .condense_question_prompt
            .replace("{chat_history}", &render_history(history))
            .replace("{question}", question);

        let condensed = self
            .llm
            .generate(&[ChatMessage::user(prompt)])
            .await
            .map_err(|e| ApiError::LlmError(format!("{:#}", e)))?;

        let condensed = condensed.trim();
        debug!("Standalone question: {}", condensed);

        if condensed.is_empty() {
            Ok(question.to_string())
        } else {
            Ok(condensed.to_string())
        }
    }

    fn build_qa_prompt(&self, question: &str, chunks: &[RetrievedChunk]) -> String {
        let context = chunks
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        self.prompts
            .qa_prompt
            .replace("{context}", &context)
            .replace("{question}", question)
    }
}

/// "Human: ...\nAssistant: ..." transcript
fn render_history(history: &[ChatTurn]) -> String {
    history
        .iter()
        .map(|turn| format!("{}: {}", turn.role().speaker(), turn.content()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ChatHistoryStore, HistoryBackend, MemoryError, VolatileChatHistory};
    use crate::services::traits::{MockLlmProvider, MockRetriever};
    use async_trait::async_trait;

    /// One shared in-process history standing in for the durable store
    struct SharedBackend {
        history: VolatileChatHistory,
    }

    #[async_trait]
    impl HistoryBackend for SharedBackend {
        async fn open(&self, _session_id: &str) -> Result<Box<dyn ChatHistoryStore>, MemoryError> {
            Ok(Box::new(self.history.clone()))
        }
    }

    struct DownBackend;

    #[async_trait]
    impl HistoryBackend for DownBackend {
        async fn open(&self, _session_id: &str) -> Result<Box<dyn ChatHistoryStore>, MemoryError> {
            Err(MemoryError::Unavailable("connection refused".into()))
        }
    }

    fn retrieved(content: &str) -> RetrievedChunk {
        RetrievedChunk {
            chunk_id: 0,
            page_number: 1,
            content: content.to_string(),
            similarity: 0.9,
        }
    }

    fn service(
        retriever: MockRetriever,
        llm: MockLlmProvider,
        backend: Arc<dyn HistoryBackend>,
    ) -> AnswerService {
        AnswerService::new(
            Arc::new(retriever),
            Arc::new(llm),
            MemoryProvider::new(backend),
            PromptsConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_first_question_skips_condense_and_records_turns() {
        let mut retriever = MockRetriever::new();
        retriever
            .expect_retrieve()
            .withf(|query| query == "What is X?")
            .times(1)
            .returning(|_| Ok(vec![retrieved("X is a zigzag stitch.")]));

        let mut llm = MockLlmProvider::new();
        llm.expect_generate()
            .times(1)
            .withf(|messages| {
                messages.len() == 1
                    && messages[0].content.contains("X is a zigzag stitch.")
                    && messages[0].content.contains("Question: What is X?")
            })
            .returning(|_| Ok("A zigzag stitch.".to_string()));

        let history = VolatileChatHistory::new();
        let backend = Arc::new(SharedBackend {
            history: history.clone(),
        });
        let svc = service(retriever, llm, backend);

        let answer = svc.answer("What is X?", "a").await.unwrap();
        assert_eq!(answer, "A zigzag stitch.");

        let turns = history.messages().await.unwrap();
        assert_eq!(
            turns,
            vec![ChatTurn::user("What is X?"), ChatTurn::assistant("A zigzag stitch.")]
        );
    }

    #[tokio::test]
    async fn test_follow_up_uses_condensed_question() {
        let history = VolatileChatHistory::new();
        history
            .append_all(vec![
                ChatTurn::user("What is X?"),
                ChatTurn::assistant("A zigzag stitch."),
            ])
            .await
            .unwrap();

        let mut llm = MockLlmProvider::new();
        let mut seq = mockall::Sequence::new();
        llm.expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|messages| {
                messages[0].content.contains("Human: What is X?\nAssistant: A zigzag stitch.")
                    && messages[0].content.contains("Follow Up Input: How wide can it be?")
            })
            .returning(|_| Ok("  How wide can a zigzag stitch be?\n".to_string()));
        llm.expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|messages| messages[0].content.contains("Maximum stitch width: 7 mm."))
            .returning(|_| Ok("Up to 7 mm.".to_string()));

        let mut retriever = MockRetriever::new();
        retriever
            .expect_retrieve()
            .withf(|query| query == "How wide can a zigzag stitch be?")
            .times(1)
            .returning(|_| Ok(vec![retrieved("Maximum stitch width: 7 mm.")]));

        let backend = Arc::new(SharedBackend {
            history: history.clone(),
        });
        let svc = service(retriever, llm, backend);
        let answer = svc.answer("How wide can it be?", "a").await.unwrap();
        assert_eq!(answer, "Up to 7 mm.");

        let turns = history.messages().await.unwrap();
        assert_eq!(turns.len(), 4);
        // The original question is recorded, not the condensed one
        assert_eq!(turns[2], ChatTurn::user("How wide can it be?"));
        assert_eq!(turns[3], ChatTurn::assistant("Up to 7 mm."));
    }

    #[tokio::test]
    async fn test_llm_failure_records_nothing() {
        let mut retriever = MockRetriever::new();
        retriever.expect_retrieve().returning(|_| Ok(Vec::new()));
        let mut llm = MockLlmProvider::new();
        llm.expect_generate()
            .returning(|_| Err(anyhow::anyhow!("model not loaded")));

        let history = VolatileChatHistory::new();
        let backend = Arc::new(SharedBackend {
            history: history.clone(),
        });
        let svc = service(retriever, llm, backend);

        let err = svc.answer("What is X?", "a").await.unwrap_err();
        assert!(matches!(err, ApiError::LlmError(_)));
        assert!(history.messages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retrieval_failure_propagates() {
        let mut retriever = MockRetriever::new();
        retriever
            .expect_retrieve()
            .returning(|_| Err(anyhow::anyhow!("embedding server down")));
        let llm = MockLlmProvider::new();

        let svc = service(
            retriever,
            llm,
            Arc::new(SharedBackend {
                history: VolatileChatHistory::new(),
            }),
        );
        let err = svc.answer("What is X?", "a").await.unwrap_err();
        assert!(matches!(err, ApiError::RetrievalError(_)));
    }

    #[tokio::test]
    async fn test_answers_in_degraded_mode() {
        let mut retriever = MockRetriever::new();
        retriever.expect_retrieve().returning(|_| Ok(Vec::new()));
        let mut llm = MockLlmProvider::new();
        llm.expect_generate()
            .times(1)
            .returning(|_| Ok("I don't know.".to_string()));

        let svc = service(retriever, llm, Arc::new(DownBackend));
        assert_eq!(svc.answer("What is X?", "a").await.unwrap(), "I don't know.");
        // Volatile memory is not kept across calls
        assert!(svc.history("a").await.unwrap().is_empty());
    }

    #[test]
    fn test_render_history() {
        let rendered = render_history(&[ChatTurn::user("hi"), ChatTurn::assistant("hello")]);
        assert_eq!(rendered, "Human: hi\nAssistant: hello");
    }
}
