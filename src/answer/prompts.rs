//! Prompt construction for grounded answers.

/// Fixed reply when retrieval produced nothing to answer from.
pub const NO_CONTEXT_APOLOGY: &str =
    "I'm sorry, I couldn't find relevant information in the PDF to answer your question.";

/// System prompt for grounded question answering.
pub const ANSWER_SYSTEM_PROMPT: &str = "\
You are an AI assistant that answers questions based on PDF content. \
Answer using ONLY the information provided in the context you are given.";

/// Build the user prompt for a grounded answer.
pub fn answer_prompt(question: &str, context: &str) -> String {
    format!(
        "\
Question: {question}

PDF Context:
{context}

Instructions:
1. Answer the question clearly and concisely
2. Use only information from the provided context
3. If the context doesn't contain enough information, say \"I don't have enough information from the PDF to answer this question completely\"
4. Provide specific details and examples from the context when possible
5. Keep your answer focused and relevant to the question
6. If the question is about features, benefits, or capabilities, highlight the key points from the context

Answer:"
    )
}
