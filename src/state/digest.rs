use super::AppState;
use crate::error::{AppError, AppResult};
use crate::similarity;
use crate::types::*;

impl AppState {
    /// Up to three threads whose keywords overlap the question, in default list order
    pub async fn similar_threads(&self, question: &str) -> AppResult<Vec<Thread>> {
        if question.trim().is_empty() {
            return Err(AppError::Validation(
                "Question parameter is required".to_string(),
            ));
        }

        let corpus = self.store.list_threads(&ThreadQuery::default()).await;
        let similar = similarity::find_similar(question, &corpus);
        tracing::debug!(
            corpus = corpus.len(),
            matches = similar.len(),
            "Similar thread lookup"
        );
        Ok(similar)
    }

    pub async fn thread_summary(&self, thread_id: &str) -> AppResult<String> {
        let thread = self.store.get_thread(thread_id).await?;
        Ok(similarity::summarize(&thread.replies))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_similar_threads_rejects_blank_question() {
        let state = AppState::new();
        assert!(matches!(
            state.similar_threads("   ").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_similar_threads_self_match() {
        let state = AppState::new();
        let thread = state
            .create_thread(NewThread {
                title: "How do I deploy Node.js on Cloud Run?".to_string(),
                body: "Deploying Node.js to Cloud Run fails".to_string(),
                author: None,
            })
            .await
            .unwrap();

        let found = state
            .similar_threads("How do I deploy Node.js on Cloud Run?")
            .await
            .unwrap();
        assert!(found.iter().any(|t| t.id == thread.id));
    }

    #[tokio::test]
    async fn test_thread_summary() {
        let state = AppState::new();
        let thread = state
            .create_thread(NewThread {
                title: "Title".to_string(),
                body: "Body".to_string(),
                author: None,
            })
            .await
            .unwrap();

        assert_eq!(
            state.thread_summary(&thread.id).await.unwrap(),
            "No replies yet."
        );

        state
            .add_reply(
                &thread.id,
                NewReply {
                    content: "Check your .dockerignore".to_string(),
                    author: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(
            state.thread_summary(&thread.id).await.unwrap(),
            "Discussion summary: Check your .dockerignore"
        );

        assert_eq!(
            state.thread_summary("missing").await,
            Err(AppError::NotFound("Thread"))
        );
    }
}
