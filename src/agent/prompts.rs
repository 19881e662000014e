//! Prompt set for routing, grounded generation and direct replies
//!
//! These prompts carry the anti-hallucination contract: the router only
//! allows "direct" for pleasantries, and the response prompt forbids
//! answering from anything but the supplied context.

use crate::types::ChatMessage;

/// Fixed refusal emitted when retrieval finds nothing. The generation
/// capability is never invoked on this path.
pub const NO_DOCUMENTS_REFUSAL: &str = "I couldn't find any relevant information in your \
documents. Please make sure you've uploaded documents related to your question.";

const ROUTER_SYSTEM: &str = r#"You are a routing assistant. Your ONLY job is to determine if a query is a simple greeting or requires document retrieval.

STRICT RULES:
- Reply "direct" ONLY for simple greetings like: "hello", "hi", "hey", "how are you", "good morning", "thanks", "thank you", "bye", "goodbye"
- Reply "retrieve" for EVERYTHING else - including ANY question about content, documents, information, facts, or knowledge

Examples:
- "hello" -> direct
- "hi there" -> direct
- "thank you" -> direct
- "What is X?" -> retrieve
- "Tell me about Y" -> retrieve
- "Who was the first Z?" -> retrieve
- "Explain this" -> retrieve
- "Summarize the document" -> retrieve

When in doubt, ALWAYS choose "retrieve". Never choose "direct" for any question that asks for information.

Answer with a JSON object of the form {"route": "retrieve"} or {"route": "direct"}."#;

const GREETING_SYSTEM: &str = r#"You are a friendly document assistant. You can ONLY respond to simple greetings.

ALLOWED responses:
- Greetings like "hello", "hi", "hey" -> Respond with a friendly greeting
- "how are you" -> Respond briefly and ask how you can help with their documents
- "thanks", "thank you" -> Respond with "You're welcome!"
- "bye", "goodbye" -> Respond with a friendly goodbye

For ANY other query (questions, requests for information, etc.):
Respond: "I'd be happy to help! Please ask me a question about your uploaded documents."

Keep responses brief and friendly."#;

/// Messages for the routing classification call
pub fn router_prompt(query: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::system(ROUTER_SYSTEM), ChatMessage::user(query)]
}

/// Messages for the greeting-only direct path
pub fn greeting_prompt(query: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(GREETING_SYSTEM),
        ChatMessage::user(query),
    ]
}

/// The grounding prompt for response generation: answer only from the
/// context block, say so explicitly when the answer is not present, and
/// never fill gaps from general knowledge.
pub fn response_prompt(question: &str, context: &str) -> String {
    format!(
        r#"You are a document assistant. Answer questions ONLY using the document context provided below.

CRITICAL GROUNDING RULES:
1. Base your answer EXCLUSIVELY on the document context below - never your training data
2. If the answer is NOT in the documents, say: "I don't know - the documents don't contain this information."
3. If documents mention a topic but lack specific details (dates, numbers, names, statistics), say: "The documents mention [topic] but don't specify [the specific detail]."
4. NEVER fill in specifics from your training knowledge - even if you "know" the answer

HOW TO ANSWER:
- Quote or closely paraphrase from the documents when possible
- For specific claims, indicate what the documents actually state
- Keep answers focused and concise (3-5 sentences unless more detail is needed)
- If only partial information exists, clearly state what IS and ISN'T covered

Question: {question}

Document Context:
{context}"#,
        question = question,
        context = context
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageRole;

    #[test]
    fn test_router_prompt_shape() {
        let messages = router_prompt("What is X?");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1].content, "What is X?");
        assert!(messages[0].content.contains("\"retrieve\""));
    }

    #[test]
    fn test_response_prompt_embeds_question_and_context() {
        let prompt = response_prompt("Who wrote it?", "<documents>...</documents>");
        assert!(prompt.contains("Who wrote it?"));
        assert!(prompt.contains("<documents>"));
        assert!(prompt.contains("EXCLUSIVELY"));
    }

    #[test]
    fn test_greeting_prompt_redirects() {
        let messages = greeting_prompt("hello");
        assert!(messages[0].content.contains("ONLY respond to simple greetings"));
    }
}
