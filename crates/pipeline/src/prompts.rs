//! Prompt templates sent to the model.
//!
//! Each builder is also used with empty inputs to measure the fixed
//! overhead of its template in tokens.

/// Questions containing this phrase (any casing) are answered without
/// touching the model.
pub const LOAD_TEST_PHRASE: &str = "this is a load test";

/// Canned answer for load-test questions.
pub const LOAD_TEST_RESPONSE: &str = "This is a load test response";

/// True when `question` is a load-test ping.
pub fn is_load_test(question: &str) -> bool {
    question.to_lowercase().contains(LOAD_TEST_PHRASE)
}

/// Question framing used when asking which sections matter.
pub fn selector_question(title: &str, question: &str) -> String {
    format!("Question on paper article {title}: {question}")
}

/// Ask for the `k` most relevant of `labels`, as a JSON array.
pub fn selector_prompt(k: usize, text: &str, labels: &[String]) -> String {
    let labels = serde_json::to_string(labels).unwrap_or_else(|_| format!("{labels:?}"));
    format!(
        "Give me a shortened list of the most relevant sections for the following text.\n\
         Text: {text}\n\
         Sections: {labels}\n\
         Most relevant {k} sections in JSON array format:"
    )
}

/// Answer `request` from one chunk of the paper only.
pub fn chunk_prompt(not_enough_info: &str, context: &str, request: &str) -> String {
    format!(
        "Please respond to the following request, denoted by \"Request\", in the best way possible with the \
         given paper context, bounded by the paper context markers (it can be the full paper or a part of it).\n\
         The context you are receiving may be only a part of the paper, so if it does not hold enough information \
         to confidently respond to the request, respond with \"{not_enough_info}\".\n\
         Your answer must only include information that is explicitly present in the paper context.\n\
         Your answer must not include ANY links that are not present in the paper context.\n\
         Your answer must not include ANY numbers that are not exactly present in the paper context.\n\
         Start paper context:\n\
         {context}\n\
         :End paper context.\n\
         Request: '{request}'\n\
         Response:"
    )
}

/// Numbered list of chunk answers, in chunk order.
pub fn numbered_responses(responses: &[String]) -> String {
    responses
        .iter()
        .enumerate()
        .map(|(i, r)| format!("\n Response {i}: \n{r}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Merge several chunk answers into one.
pub fn merge_prompt(responses: &str, question: &str) -> String {
    format!(
        "Please merge the following responses (denoted by 'Response N:').\n\
         All of these responses were generated from different parts of the paper only, hence they can be wrong.\n\
         Merge them into a single response, using only the ones that positively answer the initial question.\n\
         There are a few important caveats that you must follow:\n\
         - Duplicate any information that positively answers the initial question.\n\
         - Keep their sequentiality ('Response N+1' contents come after 'Response N').\n\
         - Keep the style of the original responses (if they are all markdown tables, your response must be a markdown table too).\n\
         - Web links you include must exactly match the link in their original response.\n\
         Your final answer must be a single response that answers the initial question, without revealing that it merges multiple responses.\n\
         {responses}\n\
         Initial Question:\n\
         {question}\n\
         Response:"
    )
}
