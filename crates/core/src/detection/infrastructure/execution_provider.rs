use std::path::Path;

use ort::execution_providers::ExecutionProviderDispatch;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;

/// Return the preferred ONNX execution providers for the current platform.
///
/// Empty on Linux, where ONNX Runtime uses its CPU provider.
pub fn preferred_execution_providers() -> Vec<ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

/// Loads a model for single-stream inference.
///
/// The pipeline runs one model call at a time, so inter-op parallelism is
/// pinned to 1 and every core goes to intra-op work.
pub fn load_session(model_path: &Path) -> Result<Session, Box<dyn std::error::Error>> {
    if !model_path.is_file() {
        return Err(format!("Model file not found: {}", model_path.display()).into());
    }

    let intra_threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_inter_threads(1)?
        .with_intra_threads(intra_threads)?
        .with_execution_providers(preferred_execution_providers())?
        .commit_from_file(model_path)?;

    log::debug!("Loaded ONNX model {}", model_path.display());
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_session_missing_file_errors() {
        let err = load_session(Path::new("/nonexistent/model.onnx")).unwrap_err();
        assert!(err.to_string().contains("Model file not found"));
    }
}
