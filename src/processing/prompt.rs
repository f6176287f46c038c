//! Summary prompt assembly.

/// Separator placed between retrieved chunk texts.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Join retrieved texts and wrap them in the summary instruction.
pub fn build_summary_prompt<'a, I>(topic: &str, texts: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let combined = texts.into_iter().collect::<Vec<_>>().join(CONTEXT_SEPARATOR);
    format!(
        "Summarize the following {topic} information clearly and concisely for an educational purpose:\n\n{combined}"
    )
}
