// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Post-processing of raw compiler diagnostics into a learner-facing transcript.
//!
//! The pipeline runs in a fixed order:
//! 1. trim the raw stream
//! 2. cut after the first caret marker and its label (unless every diagnostic is wanted)
//! 3. shorten file paths and spell out line/column locations
//! 4. restore the learner's own text hidden behind translator markers
//! 5. drop the compiler's closing summary notes
//! 6. apply the phrase rewrite table
//!
//! The rewrite table is plain data. Adding a rule means adding a row to
//! [`REWRITE_RULES`] or passing extra rows to [`DiagnosticRewriter::with_extra_rules`].

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Ordered `(pattern, replacement)` rows. Replacements use `${n}` group syntax.
///
/// Order matters: the generic type-mismatch rows would also match the
/// semicolon, statement and item rows, so they come last.
pub const REWRITE_RULES: &[(&str, &str)] = &[
    (
        r"expected `;`(?:, found [^\n]*)?",
        "a semicolon is expected (one may be missing, or a parenthesis may be wrong)",
    ),
    (
        r"expected one of [^\n]*",
        "the instruction (or the previous one) is truncated or badly written",
    ),
    (
        r"expected expression, found [^\n]*",
        "this is not a valid instruction (a variable it uses may not exist)",
    ),
    (
        r"expected item, found [^\n]*",
        "this instruction must be written inside a function",
    ),
    (
        r"cannot find (?:value|function|macro|type|struct|trait|crate|module) `([^`]+)` in this scope",
        "there is an undefined symbol on this line: «${1}»",
    ),
    (
        r"unexpected closing delimiter: `[^`]*`",
        "there is probably an error in the braces (maybe one '}' too many)",
    ),
    (
        r"this file contains an unclosed delimiter",
        "some braces or parentheses are missing to complete the instruction",
    ),
    (r"mismatched types", "type mismatch"),
    (
        r"expected (?:type )?`([^`]+)`, found (?:type )?`([^`]+)`",
        "you gave a value of type ${2} where a value of type ${1} is needed",
    ),
    (
        r"expected ([a-z][a-z ]*[a-z]), found `([^`]+)`",
        "you gave a value of type ${2} where a value of type ${1} is needed",
    ),
];

/// Closing notes the compiler prints after the last diagnostic.
const TRAILER_MARKERS: &[&str] = &[
    "error: aborting due to",
    "For more information about",
    "Some errors have detailed explanations",
];

static MARKER_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/\*(.*?) @<nocompile\*/.*?/\*@nocompile>\*/").expect("marker pattern is valid")
});

/// Annotation lines carry a gutter bar but no line number: `   |     ^^^ label`.
static ANNOTATION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\|").expect("annotation pattern is valid"));

static DEFAULT_RULES: LazyLock<Vec<RewriteRule>> = LazyLock::new(|| {
    REWRITE_RULES
        .iter()
        .map(|(pattern, replacement)| {
            RewriteRule::new(pattern, replacement).expect("built-in rewrite rules are valid")
        })
        .collect()
});

/// One compiled row of the rewrite table.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pattern: Regex,
    replacement: String,
}

impl RewriteRule {
    pub fn new(pattern: &str, replacement: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: replacement.to_string(),
        })
    }

    pub fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, self.replacement.as_str())
            .into_owned()
    }
}

/// Turns raw compiler output into the transcript shown to the learner.
#[derive(Debug, Clone)]
pub struct DiagnosticRewriter {
    rules: Vec<RewriteRule>,
}

impl Default for DiagnosticRewriter {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES.clone(),
        }
    }
}

impl DiagnosticRewriter {
    /// The built-in table followed by `extra` rows.
    pub fn with_extra_rules(extra: &[(&str, &str)]) -> Result<Self, regex::Error> {
        let mut rewriter = Self::default();
        for (pattern, replacement) in extra {
            rewriter.rules.push(RewriteRule::new(pattern, replacement)?);
        }
        Ok(rewriter)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn process(&self, raw: &str, files: &[PathBuf], all_errors: bool) -> String {
        let mut text = raw.trim().to_string();
        if !all_errors {
            text = truncate_at_first_caret(&text);
        }
        text = rewrite_locations(&text, files);
        text = MARKER_ESCAPE.replace_all(&text, "${1}").into_owned();
        text = elide_trailers(&text);
        for rule in &self.rules {
            text = rule.apply(&text);
        }
        text.trim().to_string()
    }
}

/// Keep everything up to the first caret run. On an annotation line the
/// label after the carets is kept too, up to the end of that line.
pub fn truncate_at_first_caret(text: &str) -> String {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if ANNOTATION_LINE.is_match(line) && line.contains('^') {
            let end = offset + line.trim_end_matches(['\n', '\r']).len();
            return text[..end].to_string();
        }
        offset += line.len();
    }
    let Some(start) = text.find('^') else {
        return text.to_string();
    };
    let run = text[start..].chars().take_while(|c| *c == '^').count();
    text[..start + run].to_string()
}

fn rewrite_locations(text: &str, files: &[PathBuf]) -> String {
    match files {
        [] => text.to_string(),
        [single] => rewrite_single_file(text, single),
        many => rewrite_many_files(text, many),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn rewrite_single_file(text: &str, path: &Path) -> String {
    let location = format!(
        r"-->\s*{}:(\d+):(\d+)",
        regex::escape(&path.to_string_lossy())
    );
    let mut text = match Regex::new(&location) {
        Ok(pattern) => pattern
            .replace_all(text, "--> line ${1}, column ${2}")
            .into_owned(),
        Err(_) => text.to_string(),
    };
    let name = file_name(path);
    if !name.is_empty() {
        text = text.replace(&name, "");
    }
    text
}

fn rewrite_many_files(text: &str, files: &[PathBuf]) -> String {
    let mut text = text.to_string();
    for path in files {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            let prefix = format!("{}{}", parent.to_string_lossy(), std::path::MAIN_SEPARATOR);
            text = text.replace(&prefix, "");
        }
    }
    for path in files {
        let name = file_name(path);
        if name.is_empty() {
            continue;
        }
        let location = format!(r"(?:-->\s*)?({}):(\d+):(\d+)", regex::escape(&name));
        if let Ok(pattern) = Regex::new(&location) {
            text = pattern
                .replace_all(&text, "--> ${1}, line ${2}, column ${3}")
                .into_owned();
        }
    }
    text
}

fn elide_trailers(text: &str) -> String {
    match TRAILER_MARKERS.iter().filter_map(|m| text.find(m)).min() {
        Some(cut) => text[..cut].trim_end().to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(index: usize) -> RewriteRule {
        let (pattern, replacement) = REWRITE_RULES[index];
        RewriteRule::new(pattern, replacement).unwrap()
    }

    fn rewrite(text: &str) -> String {
        DiagnosticRewriter::default().process(text, &[], true)
    }

    const TWO_ERRORS: &str = "error: expected `;`, found `}`
 --> /tmp/ws/snippet_1.rs:3:14
  |
3 |     let x = 5
  |              ^ help: add `;` here
4 | }
  | - unexpected token

error[E0425]: cannot find value `y` in this scope
 --> /tmp/ws/snippet_1.rs:5:5
  |
5 |     y
  |     ^ not found in this scope

error: aborting due to 2 previous errors

For more information about this error, try `rustc --explain E0425`.";

    #[test]
    fn test_rule_semicolon() {
        assert_eq!(
            rule(0).apply("error: expected `;`, found `}`"),
            "error: a semicolon is expected (one may be missing, or a parenthesis may be wrong)"
        );
    }

    #[test]
    fn test_rule_expected_one_of() {
        assert_eq!(
            rule(1).apply("error: expected one of `.`, `;`, `?`, `}`, or an operator, found `y`"),
            "error: the instruction (or the previous one) is truncated or badly written"
        );
    }

    #[test]
    fn test_rule_expected_expression() {
        assert_eq!(
            rule(2).apply("error: expected expression, found `)`"),
            "error: this is not a valid instruction (a variable it uses may not exist)"
        );
    }

    #[test]
    fn test_rule_expected_item() {
        assert_eq!(
            rule(3).apply("error: expected item, found keyword `let`"),
            "error: this instruction must be written inside a function"
        );
    }

    #[test]
    fn test_rule_undefined_symbol() {
        assert_eq!(
            rule(4).apply("error[E0425]: cannot find value `total` in this scope"),
            "error[E0425]: there is an undefined symbol on this line: «total»"
        );
        assert_eq!(
            rule(4).apply("error: cannot find macro `printn` in this scope"),
            "error: there is an undefined symbol on this line: «printn»"
        );
    }

    #[test]
    fn test_rule_unexpected_closing_delimiter() {
        assert_eq!(
            rule(5).apply("error: unexpected closing delimiter: `}`"),
            "error: there is probably an error in the braces (maybe one '}' too many)"
        );
    }

    #[test]
    fn test_rule_unclosed_delimiter() {
        assert_eq!(
            rule(6).apply("error: this file contains an unclosed delimiter"),
            "error: some braces or parentheses are missing to complete the instruction"
        );
    }

    #[test]
    fn test_rule_mismatched_types_header() {
        assert_eq!(
            rule(7).apply("error[E0308]: mismatched types"),
            "error[E0308]: type mismatch"
        );
    }

    #[test]
    fn test_rule_type_mismatch_label() {
        assert_eq!(
            rule(8).apply("  |                  ^^^^^ expected `i32`, found `&str`"),
            "  |                  ^^^^^ you gave a value of type &str where a value of type i32 is needed"
        );
    }

    #[test]
    fn test_rule_type_mismatch_named_kind() {
        assert_eq!(
            rule(9).apply("expected integer, found `&str`"),
            "you gave a value of type &str where a value of type integer is needed"
        );
    }

    #[test]
    fn test_semicolon_wins_over_type_mismatch() {
        assert_eq!(
            rewrite("expected `;`, found `}`"),
            "a semicolon is expected (one may be missing, or a parenthesis may be wrong)"
        );
    }

    #[test]
    fn test_truncation_stops_after_first_caret_run() {
        let truncated = truncate_at_first_caret(TWO_ERRORS);
        assert!(truncated.ends_with("  |              ^ help: add `;` here"));
        assert!(!truncated.contains("unexpected token"));
        assert!(!truncated.contains("cannot find value"));
    }

    #[test]
    fn test_truncation_ignores_carets_in_echoed_source() {
        let text = "error: oops\n  |\n3 |     a ^ b\n  |     ^^^^^ here\nerror: second";
        assert_eq!(
            truncate_at_first_caret(text),
            "error: oops\n  |\n3 |     a ^ b\n  |     ^^^^^ here"
        );
    }

    #[test]
    fn test_truncation_without_annotation_line_stops_at_carets() {
        assert_eq!(truncate_at_first_caret("note: ^^ then more"), "note: ^^");
    }

    #[test]
    fn test_first_error_keeps_its_explanation() {
        let raw = "error[E0308]: mismatched types
 --> /tmp/ws/snippet_1.rs:1:26
  |
1 | fn main() { let x: i32 = \"a\";
  |                    ---   ^^^ expected `i32`, found `&str`
  |                    |
  |                    expected due to this

error: aborting due to 1 previous error";
        let files = vec![PathBuf::from("/tmp/ws/snippet_1.rs")];
        let out = DiagnosticRewriter::default().process(raw, &files, false);
        assert!(out.starts_with("error[E0308]: type mismatch"));
        assert!(out.contains("--> line 1, column 26"));
        assert!(out.ends_with(
            "^^^ you gave a value of type &str where a value of type i32 is needed"
        ));
        assert!(!out.contains("expected due to this"));
        assert!(!out.contains("aborting"));
    }

    #[test]
    fn test_truncation_without_caret_is_identity() {
        assert_eq!(truncate_at_first_caret("error: linker"), "error: linker");
    }

    #[test]
    fn test_single_file_location_and_name_are_stripped() {
        let files = vec![PathBuf::from("/tmp/ws/snippet_1.rs")];
        let out = DiagnosticRewriter::default().process(TWO_ERRORS, &files, false);
        assert!(out.starts_with("error: a semicolon is expected"));
        assert!(out.contains("--> line 3, column 14"));
        assert!(!out.contains("snippet_1.rs"));
        assert!(!out.contains("/tmp/ws"));
    }

    #[test]
    fn test_multi_file_paths_are_shortened() {
        let files = vec![
            PathBuf::from("/tmp/ws/main.rs"),
            PathBuf::from("/tmp/ws/helpers.rs"),
        ];
        let raw = "error[E0425]: cannot find function `helper` in this scope\n --> /tmp/ws/helpers.rs:2:5";
        let out = DiagnosticRewriter::default().process(raw, &files, true);
        assert!(out.contains("--> helpers.rs, line 2, column 5"));
        assert!(!out.contains("/tmp/ws"));
        assert!(out.contains("«helper»"));
    }

    #[test]
    fn test_trailers_are_elided_with_all_errors() {
        let files = vec![PathBuf::from("/tmp/ws/snippet_1.rs")];
        let out = DiagnosticRewriter::default().process(TWO_ERRORS, &files, true);
        assert!(out.contains("«y»"));
        assert!(!out.contains("aborting"));
        assert!(!out.contains("rustc --explain"));
    }

    #[test]
    fn test_translator_markers_show_learner_text() {
        let raw = "1 | /*void main() @<nocompile*/fn main()/*@nocompile>*/ {";
        assert_eq!(rewrite(raw), "1 | void main() {");
    }

    #[test]
    fn test_empty_output_stays_empty() {
        assert_eq!(rewrite("  \n "), "");
    }

    #[test]
    fn test_extra_rules_are_appended() {
        let rewriter =
            DiagnosticRewriter::with_extra_rules(&[("type mismatch", "wrong kind of value")])
                .unwrap();
        assert_eq!(rewriter.rule_count(), REWRITE_RULES.len() + 1);
        assert_eq!(
            rewriter.process("error[E0308]: mismatched types", &[], true),
            "error[E0308]: wrong kind of value"
        );
    }

    #[test]
    fn test_invalid_extra_rule_is_rejected() {
        assert!(DiagnosticRewriter::with_extra_rules(&[("(", "x")]).is_err());
    }
}
