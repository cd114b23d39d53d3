use std::path::Path;

use async_openai::types::{
    ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    ResponseFormat, ResponseFormatJsonSchema,
};
use common::error::AppError;
use serde::Deserialize;
use serde_json::json;

/// Upper bound on the characters of document context handed to the model.
const DOCUMENT_CONTEXT_CHAR_LIMIT: usize = 12_000;

pub static ANSWER_SYSTEM_MESSAGE: &str = "You answer a single question using only the supplied \
source documents. Be concise and factual. If the documents do not contain the answer, say so \
plainly instead of guessing.";

#[derive(Debug, Deserialize)]
struct LLMAnswerFormat {
    answer: String,
}

fn get_answer_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "answer": { "type": "string" }
        },
        "required": ["answer"],
        "additionalProperties": false
    })
}

/// Answer `question` against the plain-text documents under
/// `documents_dir`. One fully materialized completion per call; the
/// document set is small and transient, so no state outlives the call.
pub async fn answer_from_documents(
    client: &async_openai::Client<async_openai::config::OpenAIConfig>,
    model: &str,
    documents_dir: &Path,
    question: &str,
) -> Result<String, AppError> {
    let context = read_document_context(documents_dir, DOCUMENT_CONTEXT_CHAR_LIMIT).await?;
    let request = create_chat_request(model, &context, question)?;
    let response = client.chat().create(request).await?;
    process_llm_response(response)
}

fn create_chat_request(
    model: &str,
    context: &str,
    question: &str,
) -> Result<CreateChatCompletionRequest, AppError> {
    let user_message = format!(
        r"
        Source documents:
        ==================
        {context}

        Question:
        ==================
        {question}
        "
    );

    let response_format = ResponseFormat::JsonSchema {
        json_schema: ResponseFormatJsonSchema {
            description: Some("Answer grounded in the supplied documents".into()),
            name: "document_answer".into(),
            schema: Some(get_answer_schema()),
            strict: Some(true),
        },
    };

    Ok(CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages([
            ChatCompletionRequestSystemMessage::from(ANSWER_SYSTEM_MESSAGE).into(),
            ChatCompletionRequestUserMessage::from(user_message).into(),
        ])
        .response_format(response_format)
        .build()?)
}

fn process_llm_response(response: CreateChatCompletionResponse) -> Result<String, AppError> {
    response
        .choices
        .first()
        .and_then(|choice| choice.message.content.as_ref())
        .ok_or(AppError::LLMParsing(
            "No content found in LLM response".into(),
        ))
        .and_then(|content| {
            serde_json::from_str::<LLMAnswerFormat>(content)
                .map(|parsed| parsed.answer)
                .map_err(|e| AppError::LLMParsing(format!("Failed to parse LLM answer: {e}")))
        })
}

/// Concatenate the `.txt` documents in `dir` (sorted by name for
/// determinism) into one context block, capped at `char_limit`.
async fn read_document_context(dir: &Path, char_limit: usize) -> Result<String, AppError> {
    let mut paths = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "txt") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut context = String::new();
    for path in paths {
        if context.chars().count() >= char_limit {
            break;
        }
        let text = tokio::fs::read_to_string(&path).await?;
        if !context.is_empty() {
            context.push_str("\n\n---\n\n");
        }
        context.push_str(&text);
    }

    if context.chars().count() > char_limit {
        context = context.chars().take(char_limit).collect();
    }
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn concatenates_txt_documents_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc_1.txt"), "second").unwrap();
        std::fs::write(dir.path().join("doc_0.txt"), "first").unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let context = read_document_context(dir.path(), 1000).await.unwrap();
        assert_eq!(context, "first\n\n---\n\nsecond");
    }

    #[tokio::test]
    async fn caps_context_at_char_limit() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc_0.txt"), "a".repeat(500)).unwrap();
        std::fs::write(dir.path().join("doc_1.txt"), "b".repeat(500)).unwrap();

        let context = read_document_context(dir.path(), 100).await.unwrap();
        assert_eq!(context.chars().count(), 100);
    }

    #[test]
    fn parses_structured_answer_payload() {
        let parsed: LLMAnswerFormat =
            serde_json::from_str(r#"{"answer":"Heavy machinery"}"#).unwrap();
        assert_eq!(parsed.answer, "Heavy machinery");
    }
}
