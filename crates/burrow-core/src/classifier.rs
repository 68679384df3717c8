//! Classification of wormhole console output.
//!
//! The wormhole executable has no structured output mode, so everything here
//! depends on its exact wording. All patterns live in this module.

use burrow_types::{StreamOrigin, TransferKind};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

/// `Wormhole code is: 7-crossword-firefly`
static CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"code is: (\d+-\w+-\w+)").expect("Invalid code regex"));

/// `45%`
static PERCENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)%").expect("Invalid percent regex"));

/// `1024/2048`
static RATIO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)/(\d+)").expect("Invalid ratio regex"));

/// Words that mark a stdout line as transfer lifecycle chatter.
const STATUS_KEYWORDS: [&str; 5] = ["Receiving", "Sending", "bytes", "Connection", "Key"];

/// Something learned from one line of output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Code(String),
    Progress(u8),
    Status { origin: StreamOrigin, message: String },
}

/// Extract every signal a line carries, in rule order: code, progress, status.
///
/// Stateless: a code is reported every time it appears. Never fails; a line
/// that matches nothing yields no signals.
pub fn classify(line: &str, origin: StreamOrigin, kind: TransferKind) -> Vec<Signal> {
    // Received text arrives on stdout and is not tool chatter.
    if kind == TransferKind::ReceiveText && origin == StreamOrigin::Stdout {
        return Vec::new();
    }

    let mut signals = Vec::new();

    if let Some(code) = extract_code(line) {
        signals.push(Signal::Code(code));
    }

    if let Some(percent) = extract_progress(line) {
        signals.push(Signal::Progress(percent));
    }

    let wants_status = match origin {
        StreamOrigin::Stderr => true,
        StreamOrigin::Stdout => STATUS_KEYWORDS.iter().any(|kw| line.contains(kw)),
    };
    if wants_status && is_human_readable(line) {
        signals.push(Signal::Status {
            origin,
            message: line.trim().to_string(),
        });
    }

    trace!(target: "burrow::classifier", "{:?} line {:?} -> {:?}", origin, line, signals);
    signals
}

/// Connection code announced by the sender, if the line carries one.
pub fn extract_code(line: &str) -> Option<String> {
    CODE_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Progress percentage: a `N%` figure first, else a `done/total` ratio.
pub fn extract_progress(line: &str) -> Option<u8> {
    if let Some(caps) = PERCENT_RE.captures(line) {
        let percent: u64 = caps[1].parse().ok()?;
        return Some(percent.min(100) as u8);
    }

    let caps = RATIO_RE.captures(line)?;
    let done: f64 = caps[1].parse().ok()?;
    let total: f64 = caps[2].parse().ok()?;
    if total == 0.0 {
        return None;
    }
    let percent = (done / total * 100.0).round().clamp(0.0, 100.0);
    Some(percent as u8)
}

fn is_human_readable(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }
    let total = trimmed.chars().count();
    let control = trimmed
        .chars()
        .filter(|c| c.is_control() && !c.is_whitespace())
        .count();
    control * 10 <= total
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_extract_code() {
        assert_eq!(
            extract_code("Wormhole code is: 7-crossword-firefly").as_deref(),
            Some("7-crossword-firefly")
        );
        assert_eq!(extract_code("On the other computer, please run:"), None);
        assert_eq!(extract_code("code is: seven-crossword-firefly"), None);
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(extract_progress("77%"), Some(77));
        assert_eq!(extract_progress(" 45%|#####     | 1.2M/2.4M"), Some(45));
        assert_eq!(extract_progress("250%"), Some(100));
    }

    #[test]
    fn test_progress_ratio() {
        assert_eq!(extract_progress("1024/2048"), Some(50));
        assert_eq!(extract_progress("1/3 bytes"), Some(33));
        assert_eq!(extract_progress("4096/2048"), Some(100));
        assert_eq!(extract_progress("5/0"), None);
    }

    #[test]
    fn test_progress_prefers_percent() {
        assert_eq!(extract_progress("50% ... 1024/4096"), Some(50));
    }

    #[test]
    fn test_progress_overflow_is_ignored() {
        assert_eq!(extract_progress("99999999999999999999999%"), None);
    }

    #[test]
    fn test_combined_line_yields_all_signals() {
        let signals = classify(
            "50% ... 1024/2048 ... Receiving file",
            StreamOrigin::Stdout,
            TransferKind::ReceiveFiles,
        );
        assert_eq!(
            signals,
            vec![
                Signal::Progress(50),
                Signal::Status {
                    origin: StreamOrigin::Stdout,
                    message: "50% ... 1024/2048 ... Receiving file".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_code_line_on_stdout() {
        let signals = classify(
            "Wormhole code is: 3-apple-banana",
            StreamOrigin::Stdout,
            TransferKind::SendFiles,
        );
        assert_eq!(signals, vec![Signal::Code("3-apple-banana".to_string())]);
    }

    #[test]
    fn test_code_line_on_stderr_is_also_status() {
        let signals = classify(
            "Wormhole code is: 3-apple-banana",
            StreamOrigin::Stderr,
            TransferKind::SendText,
        );
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0], Signal::Code("3-apple-banana".to_string()));
        assert!(matches!(signals[1], Signal::Status { origin: StreamOrigin::Stderr, .. }));
    }

    #[test]
    fn test_stdout_without_keywords_is_silent() {
        assert!(classify("hello there", StreamOrigin::Stdout, TransferKind::SendFiles).is_empty());
    }

    #[test]
    fn test_stderr_is_always_status() {
        let signals = classify("  connection refused \n", StreamOrigin::Stderr, TransferKind::SendFiles);
        assert_eq!(
            signals,
            vec![Signal::Status {
                origin: StreamOrigin::Stderr,
                message: "connection refused".to_string(),
            }]
        );
    }

    #[test]
    fn test_receive_text_stdout_is_payload() {
        let signals = classify("Sending 50% of my love", StreamOrigin::Stdout, TransferKind::ReceiveText);
        assert!(signals.is_empty());
        let signals = classify("Key established", StreamOrigin::Stderr, TransferKind::ReceiveText);
        assert_eq!(signals.len(), 1);
    }

    #[test]
    fn test_binary_noise_is_dropped() {
        let noise = "\u{1}\u{2}\u{3}\u{4}ab";
        assert!(classify(noise, StreamOrigin::Stderr, TransferKind::SendFiles).is_empty());
        assert!(classify("   ", StreamOrigin::Stderr, TransferKind::SendFiles).is_empty());
    }

    proptest! {
        #[test]
        fn classify_never_panics(line in ".*") {
            let _ = classify(&line, StreamOrigin::Stdout, TransferKind::ReceiveFiles);
            let _ = classify(&line, StreamOrigin::Stderr, TransferKind::SendFiles);
        }

        #[test]
        fn ratio_progress_is_bounded(done in 0u32..1_000_000, total in 1u32..1_000_000) {
            let percent = extract_progress(&format!("{}/{}", done, total)).unwrap();
            prop_assert!(percent <= 100);
        }
    }
}
