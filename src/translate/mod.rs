// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Source translation.
//!
//! Turns learner source into a compilable unit and picks the artifact name
//! it will be compiled under.

use crate::config::consts::DEFAULT_ARTIFACT_PREFIX;
use crate::errors::TranslateError;
use regex::Regex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;

/// Shared by every translator in the process so names never repeat.
static NEXT_ARTIFACT: AtomicU64 = AtomicU64::new(1);

static LEARNER_MAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(\s*)((?:public\s+)?(?:static\s+)?void\s+main\s*\(\s*\))")
        .expect("Invalid regex pattern for main header")
});

static RUST_MAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bfn\s+main\s*\(").expect("Invalid regex pattern for fn main"));

const RUN_SHIM: &str = "
#[no_mangle]
pub extern \"C\" fn run() {
    main();
    let _ = ::std::io::Write::flush(&mut ::std::io::stdout());
}
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    /// Text of the unit handed to the compiler.
    pub unit: String,
    /// File stem for the unit and its artifact.
    pub artifact_name: String,
}

pub trait Translator: Send + Sync {
    fn translate(&self, source: &str) -> Result<Translation, TranslateError>;
}

/// Default translator for learner programs.
///
/// Accepts either a bare sequence of statements or a program with its own
/// `fn main()`. A `void main()` header is accepted too and rewritten, with the
/// original text kept inside marker comments so diagnostics can show it.
#[derive(Debug, Clone)]
pub struct ScriptTranslator {
    prefix: String,
}

impl Default for ScriptTranslator {
    fn default() -> Self {
        Self::new(DEFAULT_ARTIFACT_PREFIX)
    }
}

impl ScriptTranslator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn next_name(&self) -> String {
        format!("{}{}", self.prefix, NEXT_ARTIFACT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Translator for ScriptTranslator {
    fn translate(&self, source: &str) -> Result<Translation, TranslateError> {
        if source.trim().is_empty() {
            return Err(TranslateError::EmptySource);
        }
        if source.contains("@<nocompile") || source.contains("@nocompile>") {
            return Err(TranslateError::Unsupported(
                "the program contains reserved marker text".to_string(),
            ));
        }

        let body = LEARNER_MAIN.replace_all(source, "${1}/*${2} @<nocompile*/fn main()/*@nocompile>*/");
        let mut unit = if RUST_MAIN.is_match(&body) {
            body.into_owned()
        } else {
            // Same first line so reported line numbers match the learner's.
            format!("fn main() {{ {}\n}}\n", body)
        };
        unit.push_str(RUN_SHIM);

        Ok(Translation {
            unit,
            artifact_name: self.next_name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source_is_rejected() {
        let translator = ScriptTranslator::default();
        assert_eq!(translator.translate("  \n\t"), Err(TranslateError::EmptySource));
    }

    #[test]
    fn test_statements_are_wrapped_without_shifting_lines() {
        let translation = ScriptTranslator::default()
            .translate("println!(\"hi\");\nlet x = 1;")
            .unwrap();
        assert!(translation.unit.starts_with("fn main() { println!(\"hi\");\nlet x = 1;\n}"));
        assert!(translation.unit.contains("pub extern \"C\" fn run()"));
    }

    #[test]
    fn test_existing_main_is_kept() {
        let source = "fn helper() {}\nfn main() {\n    helper();\n}\n";
        let translation = ScriptTranslator::default().translate(source).unwrap();
        assert!(translation.unit.starts_with(source));
        assert_eq!(translation.unit.matches("fn main").count(), 1);
    }

    #[test]
    fn test_void_main_is_rewritten_with_markers() {
        let source = "public static void main() {\n    println!(\"hi\");\n}";
        let translation = ScriptTranslator::default().translate(source).unwrap();
        assert!(translation
            .unit
            .starts_with("/*public static void main() @<nocompile*/fn main()/*@nocompile>*/ {"));
    }

    #[test]
    fn test_names_are_unique_and_prefixed() {
        let translator = ScriptTranslator::new("lesson_");
        let a = translator.translate("let a = 1;").unwrap();
        let b = translator.translate("let b = 2;").unwrap();
        assert!(a.artifact_name.starts_with("lesson_"));
        assert_ne!(a.artifact_name, b.artifact_name);
    }

    #[test]
    fn test_marker_text_is_reserved() {
        let result = ScriptTranslator::default().translate("/* @<nocompile */");
        assert!(matches!(result, Err(TranslateError::Unsupported(_))));
    }
}
