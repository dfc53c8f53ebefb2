//! Automatic signature and footer removal.
//!
//! Six independent heuristics applied in fixed order:
//! 1. Legal-disclaimer patterns (confidentiality, virus, privacy notices)
//! 2. Office-location lines ("City | City | City")
//! 3. Social-media lines and inline link fragments
//! 4. Known footer taglines
//! 5. Cross-message repetition (tail text repeated across the thread)
//! 6. Position-based trailing-block removal
//!
//! Stage 5 is the only heuristic with cross-document dependence; every
//! other stage looks at a single message in isolation. Stages run on the
//! cumulative result, so each must be safe on already-stripped content.

use regex::Regex;
use tracing::trace;

use crate::pipeline::types::Message;

/// Platform names used by the social-media line heuristic.
const SOCIAL_PLATFORMS: &[&str] = &["instagram", "linkedin", "twitter", "facebook", "youtube"];

/// City names backing the comma-delimited office-location heuristic.
const KNOWN_CITIES: &[&str] = &[
    "new york",
    "boston",
    "san francisco",
    "dallas",
    "denver",
    "london",
    "luxembourg",
];

/// Words that mark a trailing block as legal boilerplate.
const LEGAL_VOCABULARY: &[&str] = &[
    "confidential",
    "privileged",
    "notice",
    "disclosure",
    "prohibited",
    "intended recipient",
    "virus",
    "responsibility",
    "privacy",
];

/// Fixed tagline substrings dropped wholesale when a line contains them.
const FOOTER_TAGLINES: &[&str] = &["well-run funds powered by", "powered by gen ii"];

/// Signature detector with all pattern tables compiled once.
pub struct SignatureStripper {
    disclaimer_patterns: Vec<Regex>,
    footer_patterns: Vec<Regex>,
    social_fragments: Vec<Regex>,
    location_line: Regex,
    signature_indicators: Vec<Regex>,
    separator_rule: Regex,
}

impl SignatureStripper {
    /// Compile the default pattern tables.
    pub fn new() -> Self {
        let disclaimer_patterns = vec![
            Regex::new(
                r"(?is)NOTICE:\s*Unless otherwise stated.*?(?:which can be found here|privacy policy|privacy notice)",
            )
            .unwrap(),
            Regex::new(
                r"(?is)(?:CONFIDENTIAL|LEGALLY PRIVILEGED|PRIVILEGED AND CONFIDENTIAL).*?(?:delete.*?material|return.*?immediately|notify.*?immediately)",
            )
            .unwrap(),
            Regex::new(r"(?is)Although.*?virus.*?free.*?no responsibility.*?accepted").unwrap(),
            Regex::new(r"(?is)Please note.*?personal data.*?privacy (?:notice|policy)").unwrap(),
            Regex::new(r"(?is)This (?:email|message|communication).*?confidential.*?intended recipient")
                .unwrap(),
            Regex::new(r"(?is)If you are not the intended recipient.*?strictly prohibited").unwrap(),
            Regex::new(r"(?is)This information is only for the use of.*?intended recipient").unwrap(),
        ];

        let footer_patterns = vec![
            Regex::new(r"(?is)Well-run funds.*?powered by[^\n]*").unwrap(),
            Regex::new(r"(?i)Powered by[^\n]*").unwrap(),
            Regex::new(r"(?i)This email was sent[^\n]*").unwrap(),
            Regex::new(r"(?i)You are receiving this email[^\n]*").unwrap(),
            Regex::new(r"(?i)To unsubscribe[^\n]*").unwrap(),
        ];

        let social_fragments = vec![
            // "LinkedIn <https://...>" / "Twitter [link]" style fragments
            Regex::new(r"(?i)(?:Instagram|LinkedIn|Twitter|Facebook|YouTube)\s*[<\[][^>\]]*[>\]]")
                .unwrap(),
            // "Instagram: https://..." style fragments
            Regex::new(r"(?i)(?:Instagram|LinkedIn|Twitter|Facebook|YouTube)\s*:\s*https?://\S+")
                .unwrap(),
        ];

        // "New York | Boston | Stamford" — three or more proper-noun-ish
        // tokens separated by pipes.
        let location_line =
            Regex::new(r"^[A-Z][a-zA-Z\s,]+(?:\s*\|\s*[A-Z][a-zA-Z\s,]+){2,}").unwrap();

        let signature_indicators = vec![
            Regex::new(r"^[-_=]{3,}").unwrap(),
            Regex::new(r"(?i)^NOTICE:").unwrap(),
            Regex::new(r"(?i)^CONFIDENTIAL").unwrap(),
            Regex::new(r"^\w+\s*\|\s*\w+").unwrap(),
            Regex::new(r"(?i)^(?:Instagram|LinkedIn|Twitter|Facebook)").unwrap(),
            Regex::new(r"(?i)^(?:Well-run funds|Powered by)").unwrap(),
        ];

        let separator_rule = Regex::new(r"^[-_=]{2,}").unwrap();

        Self {
            disclaimer_patterns,
            footer_patterns,
            social_fragments,
            location_line,
            signature_indicators,
            separator_rule,
        }
    }

    /// Detect and remove signatures from message content.
    ///
    /// `thread_context` enables the cross-message repetition stage when it
    /// holds at least two messages with content.
    pub fn strip(&self, content: &str, thread_context: Option<&[Message]>) -> String {
        if content.trim().is_empty() {
            return content.to_string();
        }

        let mut cleaned = self.strip_legal_disclaimers(content);
        cleaned = self.strip_location_lines(&cleaned);
        cleaned = self.strip_social_media(&cleaned);
        cleaned = self.strip_footers(&cleaned);
        if let Some(context) = thread_context {
            cleaned = self.strip_repeated_tail(&cleaned, context);
        }
        cleaned = self.strip_trailing_block(&cleaned);

        cleaned.trim().to_string()
    }

    // ── Stage 1: legal disclaimers ──────────────────────────────────

    fn strip_legal_disclaimers(&self, content: &str) -> String {
        let mut cleaned = content.to_string();
        for pattern in &self.disclaimer_patterns {
            if pattern.is_match(&cleaned) {
                trace!(pattern = %pattern.as_str(), "Removing legal disclaimer");
                cleaned = pattern.replace_all(&cleaned, "").into_owned();
            }
        }
        cleaned
    }

    // ── Stage 2: office-location lines ──────────────────────────────

    fn strip_location_lines(&self, content: &str) -> String {
        let kept: Vec<&str> = content
            .lines()
            .filter(|line| !self.is_location_line(line.trim()))
            .collect();
        kept.join("\n")
    }

    fn is_location_line(&self, line: &str) -> bool {
        if line.contains('|') && self.location_line.is_match(line) {
            return true;
        }
        // Comma-delimited variant, backed by the known-city table. Every
        // segment must look like a list entry so prose mentioning cities
        // survives.
        let segments: Vec<&str> = line.split(',').map(str::trim).collect();
        if segments.len() >= 3
            && segments
                .iter()
                .all(|s| s.chars().next().is_some_and(|c| c.is_uppercase()))
        {
            let lower = line.to_lowercase();
            let hits = KNOWN_CITIES.iter().filter(|c| lower.contains(*c)).count();
            return hits >= 2;
        }
        false
    }

    // ── Stage 3: social media ───────────────────────────────────────

    fn strip_social_media(&self, content: &str) -> String {
        let mut cleaned = content.to_string();
        for pattern in &self.social_fragments {
            cleaned = pattern.replace_all(&cleaned, "").into_owned();
        }

        // A line naming two or more platforms is a signature line.
        let kept: Vec<&str> = cleaned
            .lines()
            .filter(|line| {
                let lower = line.to_lowercase();
                let mentions = SOCIAL_PLATFORMS
                    .iter()
                    .filter(|p| lower.contains(*p))
                    .count();
                mentions < 2
            })
            .collect();
        kept.join("\n")
    }

    // ── Stage 4: footer taglines ────────────────────────────────────

    fn strip_footers(&self, content: &str) -> String {
        let mut cleaned = content.to_string();
        for pattern in &self.footer_patterns {
            cleaned = pattern.replace_all(&cleaned, "").into_owned();
        }

        let kept: Vec<&str> = cleaned
            .lines()
            .filter(|line| {
                let lower = line.trim().to_lowercase();
                !FOOTER_TAGLINES.iter().any(|t| lower.contains(t))
            })
            .collect();
        kept.join("\n")
    }

    // ── Stage 5: cross-message repetition ───────────────────────────

    /// Truncate a trailing block that repeats across the thread.
    ///
    /// The normalized last ~30% of the content, when substantial (>50
    /// normalized chars), is looked up in every other message; two or more
    /// matches mark it as a signature.
    fn strip_repeated_tail(&self, content: &str, thread_context: &[Message]) -> String {
        let others: Vec<&str> = thread_context
            .iter()
            .map(|m| m.content.as_str())
            .filter(|c| !c.is_empty())
            .collect();
        if others.len() < 2 {
            return content.to_string();
        }

        let char_count = content.chars().count();
        // Too short to carry a meaningful signature.
        if char_count < 100 {
            return content.to_string();
        }

        let cut = byte_index_at_char(content, char_count * 7 / 10);
        let tail = normalize_text(&content[cut..]);
        if tail.chars().count() <= 50 {
            return content.to_string();
        }

        let matches = others
            .iter()
            .filter(|other| **other != content)
            .filter(|other| normalize_text(other).contains(&tail))
            .count();

        if matches >= 2 {
            trace!(matches, "Truncating tail repeated across the thread");
            return content[..cut].trim_end().to_string();
        }
        content.to_string()
    }

    // ── Stage 6: position-based trailing block ──────────────────────

    /// Drop signature-like content near the end of the message.
    ///
    /// Scans the last ~40% of lines for a signature indicator; everything
    /// from the first hit onward goes, preferring a separator rule up to
    /// three lines earlier as a cleaner cut point. Without an indicator, a
    /// long legal-vocabulary tail is dropped as a last resort.
    fn strip_trailing_block(&self, content: &str) -> String {
        let char_count = content.chars().count();
        if char_count < 100 {
            return content.to_string();
        }
        let lines: Vec<&str> = content.split('\n').collect();
        if lines.len() < 3 {
            return content.to_string();
        }

        let start_check = lines.len() * 6 / 10;
        let mut cut_idx: Option<usize> = None;
        'scan: for (i, line) in lines[start_check..].iter().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            for pattern in &self.signature_indicators {
                if pattern.is_match(trimmed) {
                    cut_idx = Some(start_check + i);
                    break 'scan;
                }
            }
        }

        if let Some(idx) = cut_idx {
            // A separator shortly above the indicator is the real start
            // of the signature block.
            for i in idx.saturating_sub(3)..idx {
                if self.separator_rule.is_match(lines[i].trim()) {
                    return lines[..i].join("\n").trim_end().to_string();
                }
            }
            return lines[..idx].join("\n").trim_end().to_string();
        }

        // Fallback: a long tail dense with legal vocabulary.
        let cut = byte_index_at_char(content, char_count * 7 / 10);
        let tail = &content[cut..];
        if tail.chars().count() > 200 {
            let tail_lower = tail.to_lowercase();
            let hits = LEGAL_VOCABULARY
                .iter()
                .filter(|w| tail_lower.contains(*w))
                .count();
            if hits >= 3 {
                return content[..cut].trim_end().to_string();
            }
        }

        content.to_string()
    }
}

impl Default for SignatureStripper {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercase and collapse all whitespace runs to single spaces.
fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Byte offset of the nth character, clamped to the end of the string.
fn byte_index_at_char(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_message(content: &str) -> Message {
        Message {
            id: "1".into(),
            message_id: None,
            from: None,
            subject: "Test".into(),
            date: None,
            timestamp: None,
            flag_status: None,
            content: content.into(),
        }
    }

    fn stripper() -> SignatureStripper {
        SignatureStripper::new()
    }

    #[test]
    fn removes_confidentiality_disclaimer() {
        let content = "Let's sync on Friday.\n\nThis email is confidential and intended recipient only.";
        let cleaned = stripper().strip(content, None);
        assert!(cleaned.contains("sync on Friday"));
        assert!(!cleaned.contains("confidential"));
    }

    #[test]
    fn removes_virus_warning() {
        let content =
            "See attached.\n\nAlthough this email is believed virus free, no responsibility is accepted by the sender.";
        let cleaned = stripper().strip(content, None);
        assert!(cleaned.contains("See attached."));
        assert!(!cleaned.contains("virus"));
    }

    #[test]
    fn removes_office_location_line() {
        let content = "Thanks for the update.\n\nNew York | Boston | Stamford | Dallas";
        let cleaned = stripper().strip(content, None);
        assert!(cleaned.contains("Thanks for the update."));
        assert!(!cleaned.contains("Stamford"));
    }

    #[test]
    fn removes_comma_delimited_city_list() {
        let content = "Got it, will do.\n\nNew York, Boston, London";
        let cleaned = stripper().strip(content, None);
        assert!(!cleaned.contains("London"));
    }

    #[test]
    fn keeps_prose_mentioning_cities() {
        let content = "The team met in New York, then Boston, and wrapped up the roadshow.";
        let cleaned = stripper().strip(content, None);
        assert_eq!(cleaned, content);
    }

    #[test]
    fn keeps_prose_with_commas() {
        let content = "We reviewed the draft, the budget, and the timeline today.";
        let cleaned = stripper().strip(content, None);
        assert_eq!(cleaned, content);
    }

    #[test]
    fn removes_multi_platform_line() {
        let content = "See you there.\n\nInstagram | LinkedIn | Twitter";
        let cleaned = stripper().strip(content, None);
        assert!(cleaned.contains("See you there."));
        assert!(!cleaned.contains("LinkedIn"));
    }

    #[test]
    fn excises_inline_social_link() {
        let content = "Follow our page: LinkedIn <https://linkedin.com/company/x> for updates.";
        let cleaned = stripper().strip(content, None);
        assert!(!cleaned.contains("linkedin.com"));
        assert!(cleaned.contains("Follow our page:"));
    }

    #[test]
    fn keeps_single_platform_mention_in_prose() {
        let content = "Did you see the announcement on LinkedIn this morning?";
        let cleaned = stripper().strip(content, None);
        assert!(cleaned.contains("LinkedIn"));
    }

    #[test]
    fn removes_footer_tagline() {
        let content = "Final numbers attached.\n\nWell-run funds powered by Gen II";
        let cleaned = stripper().strip(content, None);
        assert!(cleaned.contains("Final numbers attached."));
        assert!(!cleaned.contains("Gen II"));
    }

    #[test]
    fn repeated_tail_truncated_with_thread_context() {
        let signature = "Best regards,\nJane Smith\nSenior Fund Accountant\nAcme Fund Services LLC\nDirect: 212-555-0100\njane.smith@acmefunds.com";
        let content = format!(
            "Hi team, the Q3 statements are ready for review, please take a look when you can.\n\n{signature}"
        );
        let other1 = format!("Earlier message about something else entirely.\n\n{signature}");
        let other2 = format!("Yet another earlier note in the thread.\n\n{signature}");

        let context = vec![
            make_message(&content),
            make_message(&other1),
            make_message(&other2),
        ];
        let cleaned = stripper().strip(&content, Some(&context));
        assert!(cleaned.contains("Q3 statements"));
        // The trailing ~30% repeated across the thread is gone.
        assert!(!cleaned.contains("acmefunds.com"));
        assert!(!cleaned.contains("212-555"));
    }

    #[test]
    fn repetition_needs_two_other_matches() {
        let signature = "Best regards,\nJane Smith\nSenior Fund Accountant\nAcme Fund Services LLC\nDirect: 212-555-0100\njane.smith@acmefunds.com";
        let content = format!(
            "Hi team, the Q3 statements are ready for review, please take a look when you can.\n\n{signature}"
        );
        let other = format!("Earlier message about something else entirely.\n\n{signature}");

        let context = vec![make_message(&content), make_message(&other)];
        let cleaned = stripper().strip(&content, Some(&context));
        // Only one other message repeats the tail, so it stays.
        assert!(cleaned.contains("acmefunds.com"));
    }

    #[test]
    fn position_based_cut_at_separator_rule() {
        let content = "\
We can close the books on Monday once the reconciliations land.
The auditors confirmed the remaining items are immaterial.
I'll circulate the final pack before the call.
Let me know if anything else is needed on our side.
----------
NOTICE: This message is intended only for the addressee.";
        let cleaned = stripper().strip(content, None);
        assert!(cleaned.contains("close the books"));
        assert!(!cleaned.contains("NOTICE"));
        assert!(!cleaned.contains("----------"));
    }

    #[test]
    fn legal_vocabulary_fallback_drops_long_tail() {
        let body_line = "The distribution schedule goes out on Thursday and the capital account statements follow on Friday.";
        let tail_line = "This transmission may contain privileged material, and any disclosure, copying, or distribution of it is prohibited; the sender accepts no responsibility for errors and handles personal data per its privacy obligations.";
        let content = format!(
            "{body_line}\n{body_line}\n{body_line}\n{body_line}\n{tail_line}\n{tail_line}\n{tail_line}"
        );
        let cleaned = stripper().strip(&content, None);
        assert!(cleaned.contains("distribution schedule"));
        assert!(cleaned.chars().count() < content.chars().count());
    }

    #[test]
    fn short_content_untouched() {
        let content = "Sounds good, thanks!";
        assert_eq!(stripper().strip(content, None), content);
    }

    #[test]
    fn empty_content_untouched() {
        assert_eq!(stripper().strip("", None), "");
        assert_eq!(stripper().strip("   ", None), "   ");
    }

    #[test]
    fn stripping_is_idempotent() {
        let samples = [
            "Let's sync on Friday.\n\nThis email is confidential and intended recipient only.",
            "Thanks for the update.\n\nNew York | Boston | Stamford | Dallas",
            "See you there.\n\nInstagram | LinkedIn | Twitter",
            "Final numbers attached.\n\nWell-run funds powered by Gen II",
            "Sounds good, thanks!",
            "\
We can close the books on Monday once the reconciliations land.
The auditors confirmed the remaining items are immaterial.
I'll circulate the final pack before the call.
Let me know if anything else is needed on our side.
----------
NOTICE: This message is intended only for the addressee.",
        ];
        let stripper = stripper();
        for sample in samples {
            let once = stripper.strip(sample, None);
            let twice = stripper.strip(&once, None);
            assert_eq!(once, twice, "stripping not idempotent for: {sample:?}");
        }
    }
}
