// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Flat JSON records exchanged with a caller across the trust boundary.
//!
//! Requests are tagged by `op`:
//!
//! ```json
//! {"op": "compile", "code": "println!(\"hi\");"}
//! {"op": "compileFile", "location": "file:///home/me/prog.rs"}
//! {"op": "exec", "artifactPath": "/tmp/scriptgate-compile-x/snippet_1.wasm"}
//! {"op": "execInBackground", "artifactPath": "..."}
//! {"op": "popError"}
//! ```
//!
//! Responses are one-level objects. Dispatch never fails: a refused or
//! failed call still answers with a record, and the error itself waits in
//! the mailbox for `popError`.

use super::service::{CompileOutcome, ExecOutcome, Gateway};
use crate::errors::GatewayError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum BoundaryRequest {
    Compile {
        code: String,
    },
    CompileFile {
        location: String,
    },
    Exec {
        #[serde(rename = "artifactPath")]
        artifact_path: String,
    },
    ExecInBackground {
        #[serde(rename = "artifactPath")]
        artifact_path: String,
    },
    PopError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileRecord {
    pub success: bool,
    pub artifact_path: String,
    pub console: String,
}

impl From<CompileOutcome> for CompileRecord {
    fn from(outcome: CompileOutcome) -> Self {
        Self {
            success: outcome.success,
            artifact_path: outcome
                .artifact_path
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            console: outcome.console,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecRecord {
    pub success: bool,
    pub console: String,
    /// Empty on success.
    pub error: String,
}

impl From<ExecOutcome> for ExecRecord {
    fn from(outcome: ExecOutcome) -> Self {
        Self {
            success: outcome.success,
            error: outcome.error_text(),
            console: outcome.console,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartedRecord {
    pub started: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub kind: String,
    pub message: String,
}

impl From<&GatewayError> for ErrorRecord {
    fn from(error: &GatewayError) -> Self {
        Self {
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// Console text forwarded to the caller while a session capture runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintEvent {
    pub print: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BoundaryResponse {
    Compile(CompileRecord),
    Exec(ExecRecord),
    Started(StartedRecord),
    /// `null` when nothing was pending.
    PoppedError(Option<ErrorRecord>),
    /// The request itself could not be understood.
    Rejected(ErrorRecord),
}

pub fn dispatch(gateway: &Gateway, request: BoundaryRequest) -> BoundaryResponse {
    match request {
        BoundaryRequest::Compile { code } => BoundaryResponse::Compile(compile_record(
            gateway.compile(&code),
        )),
        BoundaryRequest::CompileFile { location } => {
            BoundaryResponse::Compile(compile_record(gateway.compile_file(&location)))
        }
        BoundaryRequest::Exec { artifact_path } => {
            let record = match gateway.exec(Path::new(&artifact_path)) {
                Ok(outcome) => outcome.into(),
                Err(error) => ExecRecord {
                    success: false,
                    console: String::new(),
                    error: error.to_string(),
                },
            };
            BoundaryResponse::Exec(record)
        }
        BoundaryRequest::ExecInBackground { artifact_path } => {
            let started = gateway
                .exec_in_background(Path::new(&artifact_path))
                .is_ok();
            BoundaryResponse::Started(StartedRecord { started })
        }
        BoundaryRequest::PopError => {
            BoundaryResponse::PoppedError(gateway.pop_error().as_ref().map(ErrorRecord::from))
        }
    }
}

fn compile_record(result: Result<CompileOutcome, GatewayError>) -> CompileRecord {
    match result {
        Ok(outcome) => outcome.into(),
        Err(_) => CompileRecord {
            success: false,
            artifact_path: String::new(),
            console: String::new(),
        },
    }
}

/// Decode one JSON request, dispatch it and encode the response.
pub fn dispatch_json(gateway: &Gateway, line: &str) -> String {
    let response = match serde_json::from_str::<BoundaryRequest>(line) {
        Ok(request) => dispatch(gateway, request),
        Err(error) => BoundaryResponse::Rejected(ErrorRecord {
            kind: "request".to_string(),
            message: error.to_string(),
        }),
    };
    encode(&response)
}

pub fn encode<T: Serialize>(record: &T) -> String {
    serde_json::to_string(record).unwrap_or_else(|error| {
        serde_json::json!({ "kind": "encoding", "message": error.to_string() }).to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_requests_decode_by_op() {
        let request: BoundaryRequest =
            serde_json::from_str(r#"{"op":"exec","artifactPath":"/ws/a.wasm"}"#).unwrap();
        assert_eq!(
            request,
            BoundaryRequest::Exec {
                artifact_path: "/ws/a.wasm".to_string()
            }
        );
        let request: BoundaryRequest = serde_json::from_str(r#"{"op":"popError"}"#).unwrap();
        assert_eq!(request, BoundaryRequest::PopError);
        let request: BoundaryRequest =
            serde_json::from_str(r#"{"op":"execInBackground","artifactPath":"b.wasm"}"#).unwrap();
        assert!(matches!(request, BoundaryRequest::ExecInBackground { .. }));
    }

    #[test]
    fn test_unknown_op_is_an_error() {
        assert!(serde_json::from_str::<BoundaryRequest>(r#"{"op":"format"}"#).is_err());
    }

    #[test]
    fn test_records_are_flat() {
        let record = BoundaryResponse::Compile(CompileRecord {
            success: true,
            artifact_path: "/ws/snippet_1.wasm".to_string(),
            console: String::new(),
        });
        let value: Value = serde_json::from_str(&encode(&record)).unwrap();
        assert_eq!(
            value,
            json!({"success": true, "artifactPath": "/ws/snippet_1.wasm", "console": ""})
        );
    }

    #[test]
    fn test_empty_mailbox_is_null() {
        assert_eq!(encode(&BoundaryResponse::PoppedError(None)), "null");
        let error = GatewayError::Security("refused".to_string());
        let value: Value =
            serde_json::from_str(&encode(&BoundaryResponse::PoppedError(Some((&error).into()))))
                .unwrap();
        assert_eq!(value["kind"], "security");
        assert_eq!(value["message"], "security violation: refused");
    }

    #[test]
    fn test_print_event_shape() {
        let event = PrintEvent {
            print: "hi\n".to_string(),
        };
        assert_eq!(encode(&event), r#"{"print":"hi\n"}"#);
    }
}
