use super::classification::ClassificationResult;
use super::detection::Detection;

/// Desenlace del orquestador. Cada combinación de disponibilidad del
/// detector y resultado de la selección termina en exactamente uno de
/// estos estados.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStatus {
    /// Detector ausente: se clasifica la imagen completa y la presencia
    /// de flor queda como desconocida, no como negativa.
    FallbackWholeImage,
    /// El detector corrió y ninguna detección pasó la política de selección.
    NoFlowerDetected,
    /// La caja seleccionada no contiene ningún píxel.
    EmptyCrop,
    /// Flujo completo: recorte clasificado.
    FlowerClassified,
}

#[derive(Debug, Clone)]
pub struct FlowerAnalysis {
    pub status: AnalysisStatus,
    pub flower_confidence: Option<f32>,
    pub classification: Option<ClassificationResult>,
    pub detector_available: bool,
    /// Salida completa del detector, sólo poblada en modo depuración.
    pub raw_detections: Vec<Detection>,
}
