use serde::{Deserialize, Serialize};

/// Etiqueta del clasificador binario de enfermedad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiseaseLabel {
    Healthy,
    Botrytis,
}

impl DiseaseLabel {
    /// Índice de salida del modelo entrenado: 1 = botrytis, 0 = sana.
    pub fn from_index(idx: usize) -> Self {
        if idx == 1 {
            Self::Botrytis
        } else {
            Self::Healthy
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: DiseaseLabel,
    pub confidence: f32,
}
