/// Worked example shared by the transcription and translation prompts.
pub const EXAMPLE_SRT: &str = "1
00:00:00,000 --> 00:00:07,000
This could be the most important minute of your day.

2
00:00:07,000 --> 00:00:11,000
We have been through difficult times and faced big problems ahead.
";

/// Output rules common to every subtitle-producing prompt.
pub const FORMAT_RULES: &str = "\
Output rules:
1) Each block begins with its sequence number on its own line.
2) The next line is the exact timestamp range in the form HH:MM:SS,mmm --> HH:MM:SS,mmm.
3) The subtitle text follows on the next line(s).
4) Blocks are separated by exactly one blank line.
Do NOT include any extra text, comments, code fences, or headings. Output only the SRT blocks.";

/// Instructions sent together with the inline audio.
pub fn build_transcription_prompt(target_language: &str) -> String {
    format!(
        "You must output a valid, strictly numbered SRT file for the attached audio.\n\
         Sequence numbers start at 1 and increase by one for every block.\n\
         The subtitle text must be written in {lang}.\n\
         \n\
         {rules}\n\
         \n\
         Example:\n\
         \n\
         {example}\n\
         Now detect the spoken language, transcribe the audio, translate it into {lang}, \
         and output the full SRT.",
        lang = target_language,
        rules = FORMAT_RULES,
        example = EXAMPLE_SRT,
    )
}
