//! Guardrail model, the external collaborator whose weights and runtime
//! live outside this crate. `GuardrailModel` is the extension point a real
//! model runtime plugs into; `HeuristicModel` is a weights-free stand-in
//! that implements the `predict_batch` contract well enough to run the
//! service end-to-end.

/// Formats one input the way a real generation-based guard model would see
/// it (`"[INPUT]: <t> [OUTPUT]:"`). `HeuristicModel` never tokenizes, but
/// runs its marker search over this framing so the keyword search sees the
/// same text a real model's prompt would wrap.
pub fn format_prompt(text: &str) -> String {
    format!("[INPUT]: {text} [OUTPUT]:")
}

/// Classifies a batch of texts as `"safe"` or `"unsafe"`, one result per
/// input, in input order.
pub trait GuardrailModel: Send + Sync {
    fn predict_batch(&self, texts: &[String]) -> Vec<String>;
}

/// A keyword-based stand-in for a loaded guard model. Flags a fixed set of
/// unsafe-signaling substrings (case-insensitive); everything else is safe.
/// Lets the guardrail service run without external model weights.
pub struct HeuristicModel {
    unsafe_markers: Vec<String>,
}

impl HeuristicModel {
    pub fn new() -> Self {
        Self {
            unsafe_markers: vec![
                "bomb".to_string(),
                "kill".to_string(),
                "weapon".to_string(),
                "danger".to_string(),
                "attack".to_string(),
            ],
        }
    }
}

impl Default for HeuristicModel {
    fn default() -> Self {
        Self::new()
    }
}

impl GuardrailModel for HeuristicModel {
    fn predict_batch(&self, texts: &[String]) -> Vec<String> {
        texts
            .iter()
            .map(|t| {
                let lower = format_prompt(t).to_lowercase();
                if self.unsafe_markers.iter().any(|m| lower.contains(m.as_str())) {
                    "unsafe".to_string()
                } else {
                    "safe".to_string()
                }
            })
            .collect()
    }
}
