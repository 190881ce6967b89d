use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use image::RgbImage;
use tracing::{info, warn};

use crate::adapters::onnx::yolo_engine::OnnxYoloEngine;
use crate::application::ports::DetectorPort;
use crate::domain::{
    detection::Detection,
    errors::{DomainError, DomainResult},
    model::YoloParams,
};

/// Adaptador del detector de flores sobre ONNX Runtime. La carga es de
/// mejor esfuerzo: si los pesos no existen o la sesión no se puede crear,
/// el adaptador queda como no disponible y el proceso arranca igualmente.
pub struct FlowerDetector {
    engine: Option<Mutex<OnnxYoloEngine>>,
    params: YoloParams,
}

impl FlowerDetector {
    pub fn load(weights_path: &str, params: YoloParams) -> Self {
        if !Path::new(weights_path).exists() {
            warn!(
                "Pesos YOLO no encontrados en '{}': el detector queda deshabilitado",
                weights_path
            );
            return Self {
                engine: None,
                params,
            };
        }

        match OnnxYoloEngine::load(weights_path) {
            Ok(engine) => {
                info!("Detector YOLO cargado desde '{}'", weights_path);
                Self {
                    engine: Some(Mutex::new(engine)),
                    params,
                }
            }
            Err(e) => {
                warn!("Error cargando modelo YOLO '{}': {:?}", weights_path, e);
                Self {
                    engine: None,
                    params,
                }
            }
        }
    }

    fn run(&self, image: &RgbImage, conf_threshold: f32) -> DomainResult<Vec<Detection>> {
        let Some(engine) = &self.engine else {
            return Ok(Vec::new());
        };
        let mut engine = engine
            .lock()
            .map_err(|_| DomainError::InferenceFailed("sesión YOLO envenenada".into()))?;
        let params = YoloParams {
            conf_threshold,
            ..self.params.clone()
        };
        engine
            .infer(image, &params)
            .map_err(|e| DomainError::InferenceFailed(e.to_string()))
    }
}

#[async_trait]
impl DetectorPort for FlowerDetector {
    fn is_available(&self) -> bool {
        self.engine.is_some()
    }

    async fn detect(&self, image: &RgbImage) -> Vec<Detection> {
        self.run(image, self.params.conf_threshold)
            .unwrap_or_else(|e| {
                warn!("Inferencia YOLO fallida, se trata como sin detecciones: {}", e);
                Vec::new()
            })
    }

    async fn detect_with_conf(
        &self,
        image: &RgbImage,
        min_conf: f32,
    ) -> DomainResult<Vec<Detection>> {
        self.run(image, min_conf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_weights_degrade_to_unavailable() {
        let detector = FlowerDetector::load("no/such/model.onnx", YoloParams::default());
        assert!(!detector.is_available());

        let img = RgbImage::new(16, 16);
        assert!(detector.detect(&img).await.is_empty());
        assert!(detector.detect_with_conf(&img, 0.1).await.unwrap().is_empty());
    }
}
