//! SRT subtitle block model.
//!
//! Text produced by a generative model is untrusted. [`SrtParser`] turns it into
//! a [`ParseOutcome`]: either a validated [`SubtitleDocument`] together with the
//! cosmetic repairs that were applied, or the raw text and the reason it was
//! rejected. Numbering is never rewritten; a gap or a duplicate is always a
//! rejection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SubgenError};

/// Position in the media, millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// `None` when the total does not fit in a `u64` of milliseconds.
    pub fn from_hms_millis(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Option<Self> {
        hours
            .checked_mul(60)?
            .checked_add(minutes)?
            .checked_mul(60)?
            .checked_add(seconds)?
            .checked_mul(1000)?
            .checked_add(millis)
            .map(Self)
    }

    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Parse `HH:MM:SS,mmm`. With `allow_dot` the millisecond separator may
    /// also be `.`; the flag in the return value reports whether it was.
    fn parse_with(s: &str, allow_dot: bool, canonical_hours: bool) -> Option<(Self, bool)> {
        let (clock, millis, used_dot) = match s.split_once(',') {
            Some((clock, millis)) => (clock, millis, false),
            None if allow_dot => {
                let (clock, millis) = s.rsplit_once('.')?;
                (clock, millis, true)
            }
            None => return None,
        };

        let mut parts = clock.split(':');
        let hours = parts.next()?;
        let minutes = parts.next()?;
        let seconds = parts.next()?;
        if parts.next().is_some() {
            return None;
        }

        if hours.len() < 2 || minutes.len() != 2 || seconds.len() != 2 || millis.len() != 3 {
            return None;
        }
        let h = parse_digits(hours)?;
        let m = parse_digits(minutes)?;
        let sec = parse_digits(seconds)?;
        let ms = parse_digits(millis)?;
        if m > 59 || sec > 59 {
            return None;
        }
        if canonical_hours && format!("{:02}", h) != hours {
            return None;
        }

        Some((Self::from_hms_millis(h, m, sec, ms)?, used_dot))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.0 / 3_600_000;
        let minutes = (self.0 % 3_600_000) / 60_000;
        let seconds = (self.0 % 60_000) / 1_000;
        let millis = self.0 % 1_000;
        write!(f, "{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

impl FromStr for Timestamp {
    type Err = SubgenError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_with(s, false, true)
            .map(|(ts, _)| ts)
            .ok_or_else(|| SubgenError::Validation(format!("Invalid SRT timestamp: {:?}", s)))
    }
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// One timed caption unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleBlock {
    pub sequence_number: u32,
    pub start: Timestamp,
    pub end: Timestamp,
    pub lines: Vec<String>,
}

impl SubtitleBlock {
    pub fn new<S: Into<String>>(
        sequence_number: u32,
        start: Timestamp,
        end: Timestamp,
        lines: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();

        if sequence_number == 0 {
            return Err(SubgenError::Validation("Sequence numbers start at 1".to_string()));
        }
        if start >= end {
            return Err(SubgenError::Validation(format!(
                "Block {} ends ({}) before it starts ({})",
                sequence_number, end, start
            )));
        }
        if lines.iter().all(|line| line.trim().is_empty()) {
            return Err(SubgenError::Validation(format!(
                "Block {} has no text",
                sequence_number
            )));
        }
        if lines.iter().any(|line| line.contains('\n')) {
            return Err(SubgenError::Validation(format!(
                "Block {} has a text line containing a line break",
                sequence_number
            )));
        }

        Ok(Self {
            sequence_number,
            start,
            end,
            lines,
        })
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// `(sequence_number, start, end)`, the part of a block translation must keep.
    pub fn timing(&self) -> (u32, Timestamp, Timestamp) {
        (self.sequence_number, self.start, self.end)
    }
}

impl fmt::Display for SubtitleBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.sequence_number)?;
        writeln!(f, "{} --> {}", self.start, self.end)?;
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Ordered blocks; order is display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtitleDocument {
    blocks: Vec<SubtitleBlock>,
}

impl SubtitleDocument {
    pub fn new(blocks: Vec<SubtitleBlock>) -> Self {
        Self { blocks }
    }

    pub fn blocks(&self) -> &[SubtitleBlock] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<SubtitleBlock> {
        self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn timings(&self) -> Vec<(u32, Timestamp, Timestamp)> {
        self.blocks.iter().map(SubtitleBlock::timing).collect()
    }

    /// End of the last block.
    pub fn duration(&self) -> Timestamp {
        self.blocks.last().map(|b| b.end).unwrap_or_default()
    }

    /// Canonical SRT text.
    pub fn to_srt(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SubtitleDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, block) in self.blocks.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", block)?;
        }
        Ok(())
    }
}

/// How much deviation from canonical SRT the parser tolerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepairPolicy {
    /// Canonical block grammar only.
    Strict,
    /// Cosmetic repairs: code fences, commentary outside blocks, spacing,
    /// `.` millisecond separators. Never renumbers.
    #[default]
    Lenient,
}

impl FromStr for RepairPolicy {
    type Err = SubgenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            _ => Err(SubgenError::Config(format!(
                "Invalid repair policy '{}'. Valid policies: strict, lenient",
                s
            ))),
        }
    }
}

/// Numbering rule checked after parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numbering {
    /// 1, 2, 3, ... with no gap or duplicate.
    Sequential,
    /// Any strictly increasing positive numbers (user-supplied sources).
    Increasing,
}

/// A cosmetic fix applied while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repair {
    StrippedByteOrderMark,
    StrippedCodeFences,
    DroppedLeadingCommentary { lines: usize },
    DroppedTrailingCommentary { lines: usize },
    TrimmedTrailingWhitespace,
    RemovedBlankBeforeText { block: u32 },
    AcceptedDotMillis { block: u32 },
    CollapsedBlankLines,
    InsertedBlockSeparator { block: u32 },
}

impl fmt::Display for Repair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StrippedByteOrderMark => write!(f, "stripped byte order mark"),
            Self::StrippedCodeFences => write!(f, "stripped code fences"),
            Self::DroppedLeadingCommentary { lines } => {
                write!(f, "dropped {} commentary line(s) before the first block", lines)
            }
            Self::DroppedTrailingCommentary { lines } => {
                write!(f, "dropped {} commentary line(s) after the last block", lines)
            }
            Self::TrimmedTrailingWhitespace => write!(f, "trimmed trailing whitespace"),
            Self::RemovedBlankBeforeText { block } => {
                write!(f, "removed blank line between timestamp and text in block {}", block)
            }
            Self::AcceptedDotMillis { block } => {
                write!(f, "accepted '.' millisecond separator in block {}", block)
            }
            Self::CollapsedBlankLines => write!(f, "collapsed repeated blank lines"),
            Self::InsertedBlockSeparator { block } => {
                write!(f, "inserted missing blank line before block {}", block)
            }
        }
    }
}

/// Result of parsing untrusted subtitle text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Parsed {
        document: SubtitleDocument,
        repairs: Vec<Repair>,
    },
    Malformed {
        raw: String,
        reason: String,
    },
}

impl ParseOutcome {
    /// Malformed text becomes [`SubgenError::FormatViolation`] carrying the raw text.
    pub fn into_result(self) -> Result<(SubtitleDocument, Vec<Repair>)> {
        match self {
            Self::Parsed { document, repairs } => Ok((document, repairs)),
            Self::Malformed { raw, reason } => Err(SubgenError::format_violation(reason, raw)),
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed { .. })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SrtParser {
    policy: RepairPolicy,
    numbering: Numbering,
}

impl SrtParser {
    pub fn new(policy: RepairPolicy) -> Self {
        Self {
            policy,
            numbering: Numbering::Sequential,
        }
    }

    pub fn with_numbering(mut self, numbering: Numbering) -> Self {
        self.numbering = numbering;
        self
    }

    pub fn policy(&self) -> RepairPolicy {
        self.policy
    }

    pub fn parse(&self, raw: &str) -> ParseOutcome {
        match self.parse_blocks(raw) {
            Ok((document, repairs)) => ParseOutcome::Parsed { document, repairs },
            Err(reason) => ParseOutcome::Malformed {
                raw: raw.to_string(),
                reason,
            },
        }
    }

    fn lenient(&self) -> bool {
        self.policy == RepairPolicy::Lenient
    }

    fn parse_blocks(&self, raw: &str) -> std::result::Result<(SubtitleDocument, Vec<Repair>), String> {
        let mut repairs = Vec::new();
        let lines = self.prepare_lines(raw, &mut repairs)?;

        let mut blocks: Vec<SubtitleBlock> = Vec::new();
        let mut i = self.first_block_line(&lines, &mut repairs);
        let mut collapsed_reported = false;
        let mut separator_missing = false;

        loop {
            let mut blanks = 0;
            while i < lines.len() && lines[i].trim().is_empty() {
                i += 1;
                blanks += 1;
            }
            if i == lines.len() {
                break;
            }

            if blocks.is_empty() {
                if blanks > 0 && !self.lenient() {
                    return Err("unexpected blank line before the first block".to_string());
                }
            } else if blanks > 1 && !separator_missing {
                if !self.lenient() {
                    return Err(format!(
                        "blocks {} and the next one are separated by {} blank lines",
                        blocks.len(),
                        blanks
                    ));
                }
                if !collapsed_reported {
                    repairs.push(Repair::CollapsedBlankLines);
                    collapsed_reported = true;
                }
            }

            let Some(number) = self.sequence_number(&lines[i]) else {
                if self.lenient() && !blocks.is_empty() && !has_number_line(&lines[i..]) {
                    let dropped = lines[i..].iter().filter(|l| !l.trim().is_empty()).count();
                    repairs.push(Repair::DroppedTrailingCommentary { lines: dropped });
                    break;
                }
                return Err(format!(
                    "expected a sequence number on line {}, found {:?}",
                    i + 1,
                    lines[i]
                ));
            };
            if separator_missing {
                if !self.lenient() {
                    return Err(format!("block {} is not preceded by a blank line", number));
                }
                repairs.push(Repair::InsertedBlockSeparator { block: number });
                separator_missing = false;
            }
            i += 1;

            let Some(timing_line) = lines.get(i).filter(|l| !l.trim().is_empty()) else {
                return Err(format!("block {} is missing its timestamp line", number));
            };
            let Some((start, end, used_dot)) = self.timing(timing_line) else {
                return Err(if timing_line.contains("-->") {
                    format!("block {} has an invalid timestamp line {:?}", number, timing_line)
                } else {
                    format!("block {} is missing its timestamp line", number)
                });
            };
            if used_dot {
                repairs.push(Repair::AcceptedDotMillis { block: number });
            }
            if start >= end {
                return Err(format!(
                    "block {} ends ({}) before it starts ({})",
                    number, end, start
                ));
            }
            i += 1;

            let mut text_start = i;
            while text_start < lines.len() && lines[text_start].trim().is_empty() {
                text_start += 1;
            }
            let has_text = text_start < lines.len() && !self.is_block_start(&lines, text_start);
            if !has_text {
                return Err(format!("block {} has no text", number));
            }
            if text_start > i {
                if !self.lenient() {
                    return Err(format!(
                        "block {} has a blank line between its timestamp and its text",
                        number
                    ));
                }
                repairs.push(Repair::RemovedBlankBeforeText { block: number });
            }

            i = text_start;
            let mut text = Vec::new();
            while i < lines.len() && !lines[i].trim().is_empty() {
                if !text.is_empty() && self.is_block_start(&lines, i) {
                    separator_missing = true;
                    break;
                }
                text.push(lines[i].clone());
                i += 1;
            }

            blocks.push(SubtitleBlock {
                sequence_number: number,
                start,
                end,
                lines: text,
            });
        }

        if blocks.is_empty() {
            return Err("no subtitle blocks found".to_string());
        }
        self.check_numbering(&blocks)?;

        Ok((SubtitleDocument::new(blocks), repairs))
    }

    /// Normalizes line endings under both policies; the lenient policy also
    /// strips BOM, code fences and trailing whitespace.
    fn prepare_lines(&self, raw: &str, repairs: &mut Vec<Repair>) -> std::result::Result<Vec<String>, String> {
        let mut text = raw;
        if let Some(stripped) = text.strip_prefix('\u{feff}') {
            if !self.lenient() {
                return Err("text starts with a byte order mark".to_string());
            }
            repairs.push(Repair::StrippedByteOrderMark);
            text = stripped;
        }

        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        let mut lines: Vec<String> = normalized.lines().map(str::to_string).collect();

        if self.lenient() {
            let mut fenced = false;
            for line in lines.iter_mut() {
                if line.trim_start().starts_with("```") {
                    line.clear();
                    fenced = true;
                }
            }
            if fenced {
                repairs.push(Repair::StrippedCodeFences);
            }

            let mut trimmed_any = false;
            for line in lines.iter_mut() {
                let trimmed = line.trim_end();
                if trimmed.len() != line.len() {
                    *line = trimmed.to_string();
                    trimmed_any = true;
                }
            }
            if trimmed_any {
                repairs.push(Repair::TrimmedTrailingWhitespace);
            }
        }

        Ok(lines)
    }

    /// Index of the first line that may start a block. Under the lenient policy
    /// anything before the first bare number is commentary.
    fn first_block_line(&self, lines: &[String], repairs: &mut Vec<Repair>) -> usize {
        if !self.lenient() {
            return 0;
        }
        let first = lines
            .iter()
            .position(|line| self.sequence_number(line).is_some())
            .unwrap_or(lines.len());
        let dropped = lines[..first].iter().filter(|l| !l.trim().is_empty()).count();
        if dropped > 0 && first < lines.len() {
            repairs.push(Repair::DroppedLeadingCommentary { lines: dropped });
        }
        if first == lines.len() { 0 } else { first }
    }

    fn sequence_number(&self, line: &str) -> Option<u32> {
        let candidate = if self.lenient() { line.trim() } else { line };
        let value = parse_digits(candidate)?;
        u32::try_from(value).ok().filter(|n| *n > 0)
    }

    fn timing(&self, line: &str) -> Option<(Timestamp, Timestamp, bool)> {
        if self.lenient() {
            let (start, end) = line.split_once("-->")?;
            let (start, dot_start) = Timestamp::parse_with(start.trim(), true, false)?;
            let (end, dot_end) = Timestamp::parse_with(end.trim(), true, false)?;
            Some((start, end, dot_start || dot_end))
        } else {
            let (start, end) = line.split_once(" --> ")?;
            let (start, _) = Timestamp::parse_with(start, false, true)?;
            let (end, _) = Timestamp::parse_with(end, false, true)?;
            Some((start, end, false))
        }
    }

    fn is_block_start(&self, lines: &[String], idx: usize) -> bool {
        self.sequence_number(&lines[idx]).is_some()
            && lines.get(idx + 1).is_some_and(|next| self.timing(next).is_some())
    }

    fn check_numbering(&self, blocks: &[SubtitleBlock]) -> std::result::Result<(), String> {
        match self.numbering {
            Numbering::Sequential => {
                for (idx, block) in blocks.iter().enumerate() {
                    let expected = idx as u32 + 1;
                    if block.sequence_number != expected {
                        return Err(if block.sequence_number < expected {
                            format!(
                                "duplicate or out-of-order block number {} at position {}",
                                block.sequence_number, expected
                            )
                        } else {
                            format!(
                                "numbering gap: expected block {}, found {}",
                                expected, block.sequence_number
                            )
                        });
                    }
                }
            }
            Numbering::Increasing => {
                for pair in blocks.windows(2) {
                    if pair[1].sequence_number <= pair[0].sequence_number {
                        return Err(format!(
                            "block number {} follows {}; numbers must increase",
                            pair[1].sequence_number, pair[0].sequence_number
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

fn has_number_line(lines: &[String]) -> bool {
    lines
        .iter()
        .any(|line| parse_digits(line.trim()).is_some_and(|n| n > 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = "1\n00:00:00,000 --> 00:00:07,000\nThis could be the most important minute of your day.\n\n2\n00:00:07,000 --> 00:00:11,000\nWe have been through difficult times\nand faced big problems ahead.\n";

    fn lenient() -> SrtParser {
        SrtParser::new(RepairPolicy::Lenient)
    }

    fn strict() -> SrtParser {
        SrtParser::new(RepairPolicy::Strict)
    }

    fn reason(outcome: ParseOutcome) -> String {
        match outcome {
            ParseOutcome::Malformed { reason, .. } => reason,
            ParseOutcome::Parsed { document, .. } => panic!("expected malformed, parsed {:?}", document),
        }
    }

    #[test]
    fn test_timestamp_format() {
        assert_eq!(Timestamp::from_millis(0).to_string(), "00:00:00,000");
        assert_eq!(Timestamp::from_millis(65_123).to_string(), "00:01:05,123");
        assert_eq!(Timestamp::from_millis(3_661_500).to_string(), "01:01:01,500");
        assert_eq!(
            Timestamp::from_hms_millis(123, 0, 0, 1).unwrap().to_string(),
            "123:00:00,001"
        );
        assert!(Timestamp::from_hms_millis(u64::MAX / 1000, 0, 0, 0).is_none());
    }

    #[test]
    fn test_timestamp_parse() {
        assert_eq!("00:01:05,123".parse::<Timestamp>().unwrap().as_millis(), 65_123);
        assert!("00:01:05.123".parse::<Timestamp>().is_err());
        assert!("00:61:05,123".parse::<Timestamp>().is_err());
        assert!("0:01:05,123".parse::<Timestamp>().is_err());
        assert!("00:01:05,12".parse::<Timestamp>().is_err());
        assert!("000:01:05,120".parse::<Timestamp>().is_err());
        assert!("99999999999999999:00:00,000".parse::<Timestamp>().is_err());
    }

    #[test]
    fn test_overflowing_hours_are_rejected() {
        let raw = "1\n99999999999999999:00:00,000 --> 99999999999999999:00:01,000\nHi\n";
        for parser in [strict(), lenient()] {
            let outcome = parser.parse(raw);
            assert!(!outcome.is_parsed());
            assert!(reason(outcome).contains("invalid timestamp line"));
        }
    }

    #[test]
    fn test_canonical_round_trip_is_byte_identical() {
        for parser in [strict(), lenient()] {
            let (document, repairs) = parser.parse(CANONICAL).into_result().unwrap();
            assert!(repairs.is_empty());
            assert_eq!(document.len(), 2);
            assert_eq!(document.to_srt(), CANONICAL);
        }
    }

    #[test]
    fn test_single_block_round_trip() {
        let text = "1\n01:02:03,004 --> 01:02:05,000\nHola\n";
        let (document, _) = strict().parse(text).into_result().unwrap();
        assert_eq!(document.to_srt(), text);
    }

    #[test]
    fn test_crlf_is_accepted_by_both_policies() {
        let crlf = CANONICAL.replace('\n', "\r\n");
        for parser in [strict(), lenient()] {
            let (document, _) = parser.parse(&crlf).into_result().unwrap();
            assert_eq!(document.to_srt(), CANONICAL);
        }
    }

    #[test]
    fn test_missing_timestamp_line_is_rejected() {
        let raw = "1\nHello there\n\n2\n00:00:07,000 --> 00:00:11,000\nWorld\n";
        for parser in [strict(), lenient()] {
            let outcome = parser.parse(raw);
            match &outcome {
                ParseOutcome::Malformed { raw: kept, .. } => assert_eq!(kept, raw),
                other => panic!("unexpected {:?}", other),
            }
            assert!(reason(outcome).contains("block 1 is missing its timestamp line"));
        }
    }

    #[test]
    fn test_numbering_gap_is_rejected() {
        let raw = "1\n00:00:00,000 --> 00:00:01,000\nA\n\n3\n00:00:01,000 --> 00:00:02,000\nB\n";
        let r = reason(lenient().parse(raw));
        assert!(r.contains("gap"), "{}", r);
    }

    #[test]
    fn test_duplicate_number_is_rejected() {
        let raw = "1\n00:00:00,000 --> 00:00:01,000\nA\n\n1\n00:00:01,000 --> 00:00:02,000\nB\n";
        let r = reason(lenient().parse(raw));
        assert!(r.contains("duplicate"), "{}", r);
    }

    #[test]
    fn test_numbering_must_start_at_one() {
        let raw = "2\n00:00:00,000 --> 00:00:01,000\nA\n";
        assert!(!lenient().parse(raw).is_parsed());
        let increasing = lenient().with_numbering(Numbering::Increasing);
        assert!(increasing.parse(raw).is_parsed());
    }

    #[test]
    fn test_increasing_numbering_rejects_reordering() {
        let raw = "5\n00:00:00,000 --> 00:00:01,000\nA\n\n4\n00:00:01,000 --> 00:00:02,000\nB\n";
        let parser = lenient().with_numbering(Numbering::Increasing);
        assert!(reason(parser.parse(raw)).contains("must increase"));
    }

    #[test]
    fn test_inverted_timing_is_rejected() {
        let raw = "1\n00:00:05,000 --> 00:00:01,000\nA\n";
        assert!(reason(lenient().parse(raw)).contains("ends"));
        let raw = "1\n00:00:05,000 --> 00:00:05,000\nA\n";
        assert!(!lenient().parse(raw).is_parsed());
    }

    #[test]
    fn test_block_without_text_is_rejected() {
        let raw = "1\n00:00:00,000 --> 00:00:01,000\n\n2\n00:00:01,000 --> 00:00:02,000\nB\n";
        assert!(reason(lenient().parse(raw)).contains("no text"));
        let raw = "1\n00:00:00,000 --> 00:00:01,000\n";
        assert!(reason(strict().parse(raw)).contains("no text"));
    }

    #[test]
    fn test_empty_response_is_rejected() {
        assert!(reason(lenient().parse("")).contains("no subtitle blocks"));
        assert!(reason(lenient().parse("I could not hear any speech.")).contains("sequence number"));
    }

    #[test]
    fn test_lenient_repairs_model_chatter() {
        let raw = "Here is the SRT file you requested:\n```srt\n1\n00:00:00,000 --> 00:00:07,000\n\nHola a todos.  \n\n\n2\n00:00:07.000 --> 00:00:11,000\nAdiós.\n```\nLet me know if you need anything else!\n";
        let (document, repairs) = lenient().parse(raw).into_result().unwrap();

        assert_eq!(document.len(), 2);
        assert_eq!(document.blocks()[0].lines, vec!["Hola a todos."]);
        assert_eq!(document.blocks()[1].start, Timestamp::from_millis(7_000));
        assert!(repairs.contains(&Repair::StrippedCodeFences));
        assert!(repairs.contains(&Repair::DroppedLeadingCommentary { lines: 1 }));
        assert!(repairs.contains(&Repair::DroppedTrailingCommentary { lines: 1 }));
        assert!(repairs.contains(&Repair::RemovedBlankBeforeText { block: 1 }));
        assert!(repairs.contains(&Repair::AcceptedDotMillis { block: 2 }));
        assert!(repairs.contains(&Repair::CollapsedBlankLines));
        assert!(repairs.contains(&Repair::TrimmedTrailingWhitespace));
    }

    #[test]
    fn test_strict_rejects_what_lenient_repairs() {
        let fenced = format!("```\n{}```\n", CANONICAL);
        assert!(!strict().parse(&fenced).is_parsed());
        assert!(lenient().parse(&fenced).is_parsed());

        let spaced = "1\n00:00:00,000 --> 00:00:07,000\n\nHello\n";
        assert!(reason(strict().parse(spaced)).contains("blank line"));
        assert!(lenient().parse(spaced).is_parsed());
    }

    #[test]
    fn test_missing_separator_between_blocks() {
        let raw = "1\n00:00:00,000 --> 00:00:01,000\nA\n2\n00:00:01,000 --> 00:00:02,000\nB\n";
        assert!(reason(strict().parse(raw)).contains("blank line"));

        let (document, repairs) = lenient().parse(raw).into_result().unwrap();
        assert_eq!(document.len(), 2);
        assert_eq!(document.blocks()[0].lines, vec!["A"]);
        assert!(repairs.contains(&Repair::InsertedBlockSeparator { block: 2 }));
    }

    #[test]
    fn test_junk_between_blocks_is_rejected() {
        let raw = "1\n00:00:00,000 --> 00:00:01,000\nA\n\nNote: next part\n\n2\n00:00:01,000 --> 00:00:02,000\nB\n";
        assert!(reason(lenient().parse(raw)).contains("sequence number"));
    }

    #[test]
    fn test_block_constructor_invariants() {
        let start = Timestamp::from_millis(0);
        let end = Timestamp::from_millis(1_000);
        assert!(SubtitleBlock::new(1, start, end, ["Hi"]).is_ok());
        assert!(SubtitleBlock::new(0, start, end, ["Hi"]).is_err());
        assert!(SubtitleBlock::new(1, end, start, ["Hi"]).is_err());
        assert!(SubtitleBlock::new(1, start, end, ["  "]).is_err());
        assert!(SubtitleBlock::new(1, start, end, ["a\nb"]).is_err());
    }

    #[test]
    fn test_malformed_maps_to_format_violation() {
        let err = lenient().parse("garbage").into_result().unwrap_err();
        match err {
            SubgenError::FormatViolation { raw, .. } => assert_eq!(raw, "garbage"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
