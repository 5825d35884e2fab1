//! Instruction templates for the three oracle tasks

/// Rewrite a user input into one neutral, self-contained question
pub fn query_rewriting(user_input: &str) -> String {
    format!(
        "You optimize search queries for a fact-checking system. Rewrite the user input \
into one clear, concise, self-contained question that is neutral and objective.\n\
\n\
- If the input is already a good query, return it unchanged.\n\
- If it is colloquial, uses pronouns, or is ambiguous, make it concrete and complete.\n\
- Output only the single rewritten question, nothing else.\n\
\n\
User input: \"{user_input}\"\n\
\n\
Rewritten query:"
    )
}

/// Decompose text into atomic, independently verifiable claims
pub fn claim_extraction(user_input: &str) -> String {
    format!(
        "You are an information analyst. Extract the core, checkable claims from the text \
below. A claim is a simple declarative statement that can be verified on its own; split \
compound sentences into several atomic claims.\n\
\n\
Example input: \"Yesterday a typhoon caused a major blackout in Taipei affecting thousands \
of households.\"\n\
Example claims:\n\
1. Taipei had a major blackout yesterday.\n\
2. The blackout was caused by a typhoon.\n\
3. Thousands of households were affected by the blackout.\n\
\n\
Respond with a JSON object with a single key \"claims\" whose value is a list of claim \
strings.\n\
\n\
Input text: {user_input}\n\
\n\
Your JSON response:"
    )
}

/// Judge one claim against one dated piece of evidence
pub fn fact_alignment(claim: &str, evidence: &str, publication_date: &str) -> String {
    format!(
        "You are a fact-checking expert. Using the evidence and its publication date, \
classify the claim as one of \"Support\", \"Contradiction\" or \"Neutral\".\n\
\n\
- \"Support\": the evidence directly supports or proves the claim.\n\
- \"Contradiction\": the evidence directly refutes or denies the claim.\n\
- \"Neutral\": the evidence is related but does not settle the claim either way.\n\
\n\
Take the timeliness of the evidence into account: an outdated article may not speak to \
recent events.\n\
\n\
Respond in JSON with three fields:\n\
- \"label\": one of \"Support\", \"Contradiction\", \"Neutral\".\n\
- \"reasoning\": one short sentence explaining the decision; mention the publication date \
if it was decisive.\n\
- \"confidence_score\": a number between 0.0 and 1.0.\n\
\n\
Claim: {claim}\n\
Evidence: {evidence}\n\
Evidence publication date: {publication_date}\n\
\n\
Your JSON response:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_embed_inputs() {
        assert!(query_rewriting("is the sky green?").contains("\"is the sky green?\""));
        assert!(claim_extraction("two facts").contains("Input text: two facts"));

        let prompt = fact_alignment("claim text", "evidence text", "2024-01-01");
        assert!(prompt.contains("Claim: claim text"));
        assert!(prompt.contains("Evidence: evidence text"));
        assert!(prompt.contains("Evidence publication date: 2024-01-01"));
    }
}
