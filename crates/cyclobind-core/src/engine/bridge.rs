//! Line-delimited JSON bridge to an engine running in a separate process.
//!
//! Each request is one JSON object tagged with `"op"`; the engine answers each request with
//! exactly one line, either `{"ok": true, "result": ...}` or `{"ok": false, "error": "..."}`.

use crate::core::offset::OffsetMatrix;
use crate::engine::backend::DesignBackend;
use crate::engine::config::{GdMethod, GdSettings, ModelConfig, RecycleMode};
use crate::engine::error::EngineError;
use crate::engine::protocol::{PrepRequest, PreparedInputs, Protocol};
use crate::engine::state::TrialLog;
use crate::engine::strategy::{DesignFlags, DesignStep};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use thiserror::Error;
use tracing::{debug, trace, warn};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Failed to start engine process '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while talking to the engine: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode request '{op}': {source}")]
    Encode {
        op: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Engine closed its output while '{op}' was pending")]
    Closed { op: &'static str },

    #[error("Malformed engine response to '{op}': {source} (line: {line})")]
    Malformed {
        op: &'static str,
        line: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Engine rejected '{op}': {message}")]
    Remote { op: &'static str, message: String },
}

/// Program and arguments that start the engine process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl BridgeCommand {
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request<'a> {
    ClearMem,
    MkModel {
        protocol: Protocol,
        use_multimer: bool,
        num_recycles: u32,
        recycle_mode: RecycleMode,
        data_dir: &'a Path,
    },
    PrepInputs {
        #[serde(flatten)]
        request: &'a PrepRequest,
        ignore_missing: bool,
    },
    SetOffset {
        offset: Vec<Vec<i64>>,
    },
    Restart {
        seq: Option<&'a str>,
    },
    SetOptimizer {
        optimizer: GdMethod,
        learning_rate: f64,
        norm_seq_grad: bool,
    },
    ModelNames,
    Design {
        #[serde(flatten)]
        step: &'a DesignStep,
        #[serde(flatten)]
        flags: &'a DesignFlags,
    },
    SavePdb {
        filename: &'a Path,
    },
    BestLog,
}

impl Request<'_> {
    fn op(&self) -> &'static str {
        match self {
            Request::ClearMem => "clear_mem",
            Request::MkModel { .. } => "mk_model",
            Request::PrepInputs { .. } => "prep_inputs",
            Request::SetOffset { .. } => "set_offset",
            Request::Restart { .. } => "restart",
            Request::SetOptimizer { .. } => "set_optimizer",
            Request::ModelNames => "model_names",
            Request::Design { .. } => "design",
            Request::SavePdb { .. } => "save_pdb",
            Request::BestLog => "best_log",
        }
    }
}

#[derive(Deserialize)]
struct Response {
    ok: bool,
    #[serde(default)]
    result: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct PreparedReply {
    protocol: Protocol,
    target_len: usize,
    binder_len: usize,
    residue_index: Vec<i64>,
}

/// [`DesignBackend`] speaking the bridge protocol over any reader/writer pair.
pub struct BridgeClient<R, W> {
    reader: R,
    writer: W,
    child: Option<Child>,
}

/// Bridge client attached to a spawned engine process.
pub type ProcessBackend = BridgeClient<BufReader<ChildStdout>, ChildStdin>;

impl ProcessBackend {
    pub fn spawn(command: &BridgeCommand) -> Result<Self, BridgeError> {
        debug!(command = %command.display(), "Spawning engine process.");
        let spawn_error = |source| BridgeError::Spawn {
            command: command.display(),
            source,
        };

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(spawn_error)?;

        let missing_pipe =
            || spawn_error(std::io::Error::other("engine process pipes are unavailable"));
        let stdin = child.stdin.take().ok_or_else(missing_pipe)?;
        let stdout = child.stdout.take().ok_or_else(missing_pipe)?;

        Ok(Self {
            reader: BufReader::new(stdout),
            writer: stdin,
            child: Some(child),
        })
    }
}

impl<R: BufRead, W: Write> BridgeClient<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            child: None,
        }
    }

    fn call<T: DeserializeOwned>(&mut self, request: &Request<'_>) -> Result<T, BridgeError> {
        let op = request.op();
        let mut line =
            serde_json::to_string(request).map_err(|source| BridgeError::Encode { op, source })?;
        trace!(op, "-> {}", line);
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;

        let mut reply = String::new();
        if self.reader.read_line(&mut reply)? == 0 {
            return Err(BridgeError::Closed { op });
        }
        let reply = reply.trim_end();
        trace!(op, "<- {}", reply);

        let malformed = |source| BridgeError::Malformed {
            op,
            line: reply.to_string(),
            source,
        };
        let response: Response = serde_json::from_str(reply).map_err(malformed)?;
        if !response.ok {
            return Err(BridgeError::Remote {
                op,
                message: response
                    .error
                    .unwrap_or_else(|| "no error message given".to_string()),
            });
        }
        serde_json::from_value(response.result).map_err(malformed)
    }

    fn call_unit(&mut self, request: &Request<'_>) -> Result<(), EngineError> {
        self.call::<serde_json::Value>(request)?;
        Ok(())
    }
}

impl<R: BufRead, W: Write> DesignBackend for BridgeClient<R, W> {
    fn clear_memory(&mut self) -> Result<(), EngineError> {
        self.call_unit(&Request::ClearMem)
    }

    fn build_model(&mut self, model: &ModelConfig) -> Result<(), EngineError> {
        self.call_unit(&Request::MkModel {
            protocol: Protocol::Binder,
            use_multimer: model.use_multimer,
            num_recycles: model.num_recycles,
            recycle_mode: model.recycle_mode,
            data_dir: &model.params_dir,
        })
    }

    fn prepare_inputs(&mut self, request: &PrepRequest) -> Result<PreparedInputs, EngineError> {
        let reply: PreparedReply = self.call(&Request::PrepInputs {
            request,
            ignore_missing: false,
        })?;
        PreparedInputs::new(
            reply.protocol,
            reply.target_len,
            reply.binder_len,
            reply.residue_index,
        )
    }

    fn set_offset(&mut self, offset: &OffsetMatrix) -> Result<(), EngineError> {
        let rows = offset
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect();
        self.call_unit(&Request::SetOffset { offset: rows })
    }

    fn restart(&mut self, seed: Option<&str>) -> Result<(), EngineError> {
        self.call_unit(&Request::Restart { seq: seed })
    }

    fn set_optimizer(&mut self, settings: &GdSettings) -> Result<(), EngineError> {
        self.call_unit(&Request::SetOptimizer {
            optimizer: settings.method,
            learning_rate: settings.learning_rate,
            norm_seq_grad: settings.norm_seq_grad,
        })
    }

    fn model_names(&mut self) -> Result<Vec<String>, EngineError> {
        Ok(self.call(&Request::ModelNames)?)
    }

    fn run_step(&mut self, step: &DesignStep, flags: &DesignFlags) -> Result<(), EngineError> {
        self.call_unit(&Request::Design { step, flags })
    }

    fn save_pdb(&mut self, path: &Path) -> Result<(), EngineError> {
        self.call_unit(&Request::SavePdb { filename: path })
    }

    fn best_log(&mut self) -> Result<Option<TrialLog>, EngineError> {
        Ok(self.call(&Request::BestLog)?)
    }
}

impl<R, W> Drop for BridgeClient<R, W> {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                debug!("Engine process already exited: {}", e);
            }
            match child.wait() {
                Ok(status) => debug!(%status, "Engine process reaped."),
                Err(e) => warn!("Failed to reap engine process: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hotspot::HotspotSpec;
    use std::io::Cursor;

    type TestClient<'a> = BridgeClient<Cursor<Vec<u8>>, &'a mut Vec<u8>>;

    /// Runs `f` against canned `replies` and returns the requests that were sent.
    fn exchange(replies: &str, f: impl FnOnce(&mut TestClient<'_>)) -> Vec<serde_json::Value> {
        let mut written = Vec::new();
        {
            let mut client = BridgeClient::new(Cursor::new(replies.as_bytes().to_vec()), &mut written);
            f(&mut client);
        }
        String::from_utf8(written)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn prepare_inputs_sends_flattened_request_and_builds_offset() {
        let replies = r#"{"ok": true, "result": {"protocol": "binder", "target_len": 2, "binder_len": 3, "residue_index": [1, 2, 53, 54, 55]}}
"#;
        let request = PrepRequest {
            pdb: "4ib5".to_string(),
            chain: "A".to_string(),
            binder_len: 3,
            hotspot: HotspotSpec::parse("36,39-42").unwrap(),
            use_multimer: true,
            rm_target_seq: false,
        };

        let sent = exchange(replies, |client| {
            let prepared = client.prepare_inputs(&request).unwrap();
            assert_eq!(prepared.target_len(), 2);
            assert_eq!(prepared.linear_offset()[(2, 1)], 51);
        });

        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["op"], "prep_inputs");
        assert_eq!(sent[0]["pdb"], "4ib5");
        assert_eq!(sent[0]["hotspot"], "36,39-42");
        assert_eq!(sent[0]["ignore_missing"], false);
    }

    #[test]
    fn build_model_always_requests_the_binder_protocol() {
        let model = ModelConfig {
            use_multimer: true,
            num_recycles: 6,
            recycle_mode: RecycleMode::Sample,
            num_models: 1,
            params_dir: "/opt/alphafold".into(),
        };
        let sent = exchange("{\"ok\": true}\n", |client| {
            client.build_model(&model).unwrap();
        });
        assert_eq!(sent[0]["op"], "mk_model");
        assert_eq!(sent[0]["protocol"], "binder");
        assert_eq!(sent[0]["recycle_mode"], "sample");
        assert_eq!(sent[0]["data_dir"], "/opt/alphafold");
    }

    #[test]
    fn run_step_merges_step_and_flags_into_one_request() {
        let flags = DesignFlags {
            num_recycles: 6,
            models: vec!["model_1".to_string()],
            dropout: true,
            save_best: false,
        };
        let sent = exchange("{\"ok\": true}\n", |client| {
            client.run_step(&DesignStep::Mcmc, &flags).unwrap();
        });

        assert_eq!(sent[0]["op"], "design");
        assert_eq!(sent[0]["strategy"], "design_mcmc");
        assert_eq!(sent[0]["num_recycles"], 6);
        assert_eq!(sent[0]["models"][0], "model_1");
    }

    #[test]
    fn set_offset_sends_row_major_matrix() {
        let offset = OffsetMatrix::from_row_slice(2, 2, &[0, -1, 1, 0]);
        let sent = exchange("{\"ok\": true, \"result\": null}\n", |client| {
            client.set_offset(&offset).unwrap();
        });
        assert_eq!(sent[0]["offset"], serde_json::json!([[0, -1], [1, 0]]));
    }

    #[test]
    fn remote_error_is_reported_with_operation_name() {
        exchange(
            "{\"ok\": false, \"error\": \"chain B not found\"}\n",
            |client| match client.restart(None).unwrap_err() {
                EngineError::Bridge {
                    source: BridgeError::Remote { op, message },
                } => {
                    assert_eq!(op, "restart");
                    assert_eq!(message, "chain B not found");
                }
                other => panic!("unexpected error: {other:?}"),
            },
        );
    }

    #[test]
    fn closed_stream_is_an_error() {
        exchange("", |client| {
            assert!(matches!(
                client.model_names().unwrap_err(),
                EngineError::Bridge {
                    source: BridgeError::Closed { op: "model_names" }
                }
            ));
        });
    }

    #[test]
    fn malformed_reply_is_an_error() {
        exchange("not json\n", |client| {
            assert!(matches!(
                client.clear_memory().unwrap_err(),
                EngineError::Bridge {
                    source: BridgeError::Malformed { .. }
                }
            ));
        });
    }

    #[test]
    fn best_log_accepts_null_result() {
        let replies = "{\"ok\": true, \"result\": null}\n{\"ok\": true, \"result\": {\"loss\": 0.5}}\n";
        exchange(replies, |client| {
            assert_eq!(client.best_log().unwrap(), None);
            assert_eq!(client.best_log().unwrap().unwrap().loss(), Some(0.5));
        });
    }
}
