use crate::application::services::AnalysisService;
use std::sync::Arc;

/// Estado compartido para los manejadores HTTP de Axum.
/// Siguiendo la Arquitectura Hexagonal, el estado contiene los servicios (Casos de Uso).
#[derive(Clone)]
pub struct HttpState {
    /// Servicio que orquesta el pipeline de detección y clasificación.
    pub analysis: Arc<AnalysisService>,
}
