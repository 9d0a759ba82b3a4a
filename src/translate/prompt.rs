use crate::transcribe::prompt::{EXAMPLE_SRT, FORMAT_RULES};

/// Instructions for translating an existing subtitle file. The source blocks
/// are sent as a separate part ahead of these instructions.
pub fn build_translation_prompt(source_language: &str, target_language: &str) -> String {
    format!(
        "Translate the SRT subtitles above from {from} to {to}.\n\
         Keep every original sequence number and copy every timestamp exactly as it is.\n\
         Translate only the subtitle text. Do NOT add, remove, merge, split, or reorder blocks.\n\
         \n\
         {rules}\n\
         \n\
         Example of the expected layout:\n\
         \n\
         {example}\n\
         Now translate each block into {to} and output the complete SRT.",
        from = source_language,
        to = target_language,
        rules = FORMAT_RULES,
        example = EXAMPLE_SRT,
    )
}
