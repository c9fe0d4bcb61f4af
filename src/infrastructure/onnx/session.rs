// SPDX-License-Identifier: MPL-2.0
//! Thin helpers around `ort` sessions shared by the engine adapters.

use std::path::Path;

use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};

use crate::application::port::EngineError;

/// A single output tensor copied out of a session run.
#[derive(Debug, Clone)]
pub(crate) struct OutputTensor {
    pub name: String,
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

/// Loads an ONNX model with full graph optimisation.
pub(crate) fn load_session(model_path: &Path) -> Result<Session, EngineError> {
    if !model_path.exists() {
        return Err(EngineError::ModelLoadFailed(format!(
            "model file not found: {}",
            model_path.display()
        )));
    }

    let session = Session::builder()
        .map_err(|e| EngineError::ModelLoadFailed(e.to_string()))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| EngineError::ModelLoadFailed(e.to_string()))?
        .commit_from_file(model_path)
        .map_err(|e| EngineError::ModelLoadFailed(e.to_string()))?;

    tracing::debug!(
        model = %model_path.display(),
        inputs = session.inputs().len(),
        outputs = session.outputs().len(),
        "ONNX session ready"
    );
    Ok(session)
}

/// Name of the model's first input, `"input"` if the model does not say.
pub(crate) fn first_input_name(session: &Session) -> String {
    session
        .inputs()
        .first()
        .map_or_else(|| "input".to_string(), |i| i.name().to_string())
}

/// Runs `session` on one NCHW tensor and returns every f32 output.
pub(crate) fn run(
    session: &mut Session,
    input_name: &str,
    input: &Array4<f32>,
) -> Result<Vec<OutputTensor>, EngineError> {
    // ONNX Runtime wants a contiguous buffer.
    let input = input.as_standard_layout().into_owned();
    let input_ref = ort::value::TensorRef::from_array_view(&input)
        .map_err(|e| EngineError::PreprocessingFailed(e.to_string()))?;

    let outputs = session
        .run(ort::inputs![input_name => input_ref])
        .map_err(|e| EngineError::InferenceFailed(e.to_string()))?;

    let mut tensors = Vec::new();
    for (name, value) in outputs.iter() {
        let (shape, data) = value
            .try_extract_tensor::<f32>()
            .map_err(|e: ort::Error| EngineError::PostprocessingFailed(e.to_string()))?;
        let shape = shape
            .iter()
            .map(|&d| usize::try_from(d))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| {
                EngineError::PostprocessingFailed(format!("negative dimension in output {name}"))
            })?;
        tensors.push(OutputTensor {
            name: name.to_string(),
            shape,
            data: data.to_vec(),
        });
    }
    Ok(tensors)
}

/// Runs `session` and returns its first output.
pub(crate) fn run_single(
    session: &mut Session,
    input_name: &str,
    input: &Array4<f32>,
) -> Result<OutputTensor, EngineError> {
    run(session, input_name, input)?
        .into_iter()
        .next()
        .ok_or_else(|| EngineError::PostprocessingFailed("No output tensor".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_is_a_load_failure() {
        let result = load_session(Path::new("/nonexistent/model.onnx"));
        match result {
            Err(EngineError::ModelLoadFailed(message)) => {
                assert!(message.contains("model.onnx"));
            }
            Err(other) => panic!("expected ModelLoadFailed, got {other}"),
            Ok(_) => panic!("loading a missing model should fail"),
        }
    }
}
