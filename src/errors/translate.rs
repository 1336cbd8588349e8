// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// The learner's source could not be turned into a compilable unit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("the program is empty")]
    EmptySource,

    #[error("the program cannot be translated: {0}")]
    Unsupported(String),
}
