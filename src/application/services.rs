use std::sync::Arc;

use image::{imageops, RgbImage};
use tracing::debug;

use crate::{
    application::ports::{ClassifierPort, DetectorPort},
    domain::{
        analysis::{AnalysisStatus, FlowerAnalysis},
        classification::ClassificationResult,
        detection::{select_flower, Detection, SelectorPolicy},
        errors::DomainResult,
    },
};

/// Orquestador del pipeline de dos etapas (detección + clasificación).
/// Su trabajo es seguir siendo correcto bajo cualquier combinación de
/// disponibilidad de los dos modelos: cada rama termina en un resultado
/// definido, nunca en un fallo sin manejar.
pub struct AnalysisService {
    detector: Arc<dyn DetectorPort>,
    classifier: Arc<dyn ClassifierPort>,
    policy: SelectorPolicy,
}

impl AnalysisService {
    pub fn new(
        detector: Arc<dyn DetectorPort>,
        classifier: Arc<dyn ClassifierPort>,
        policy: SelectorPolicy,
    ) -> Self {
        Self {
            detector,
            classifier,
            policy,
        }
    }

    pub fn detector_available(&self) -> bool {
        self.detector.is_available()
    }

    /// Flujo completo: detección, selección de caja, recorte y clasificación.
    pub async fn analyze(&self, image: &RgbImage, debug_mode: bool) -> FlowerAnalysis {
        if !self.detector.is_available() {
            // Sin detector no se puede afirmar ni negar que haya flor: se
            // clasifica la imagen completa y la presencia queda desconocida.
            let classification = self.classifier.classify(image).await;
            return FlowerAnalysis {
                status: AnalysisStatus::FallbackWholeImage,
                flower_confidence: None,
                classification: Some(classification),
                detector_available: false,
                raw_detections: Vec::new(),
            };
        }

        let detections = self.detector.detect(image).await;
        let raw_detections = if debug_mode {
            detections.clone()
        } else {
            Vec::new()
        };

        let Some(best) = select_flower(&detections, &self.policy) else {
            return FlowerAnalysis {
                status: AnalysisStatus::NoFlowerDetected,
                flower_confidence: None,
                classification: None,
                detector_available: true,
                raw_detections,
            };
        };

        if best.width() == 0 || best.height() == 0 {
            // Nunca se pasa un recorte vacío al clasificador.
            return FlowerAnalysis {
                status: AnalysisStatus::EmptyCrop,
                flower_confidence: Some(best.conf),
                classification: None,
                detector_available: true,
                raw_detections,
            };
        }

        let crop = imageops::crop_imm(image, best.x1, best.y1, best.width(), best.height())
            .to_image();
        debug!(
            "Recorte de flor {}x{} (conf {:.2})",
            crop.width(),
            crop.height(),
            best.conf
        );
        let classification = self.classifier.classify(&crop).await;

        FlowerAnalysis {
            status: AnalysisStatus::FlowerClassified,
            flower_confidence: Some(best.conf),
            classification: Some(classification),
            detector_available: true,
            raw_detections,
        }
    }

    /// Endpoint heredado: clasifica la imagen completa sin pasar por el detector.
    pub async fn predict(&self, image: &RgbImage) -> ClassificationResult {
        self.classifier.classify(image).await
    }

    /// Detección cruda con umbral ajustable, para inspección.
    pub async fn debug_detect(
        &self,
        image: &RgbImage,
        min_conf: f32,
    ) -> DomainResult<Vec<Detection>> {
        self.detector.detect_with_conf(image, min_conf).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::domain::classification::DiseaseLabel;

    struct StubDetector {
        available: bool,
        detections: Vec<Detection>,
    }

    #[async_trait]
    impl DetectorPort for StubDetector {
        fn is_available(&self) -> bool {
            self.available
        }

        async fn detect(&self, _image: &RgbImage) -> Vec<Detection> {
            self.detections.clone()
        }

        async fn detect_with_conf(
            &self,
            _image: &RgbImage,
            _min_conf: f32,
        ) -> DomainResult<Vec<Detection>> {
            Ok(self.detections.clone())
        }
    }

    /// Clasificador de prueba que registra el tamaño de cada imagen recibida.
    #[derive(Default)]
    struct RecordingClassifier {
        seen: Mutex<Vec<(u32, u32)>>,
    }

    #[async_trait]
    impl ClassifierPort for RecordingClassifier {
        fn is_available(&self) -> bool {
            false
        }

        async fn classify(&self, image: &RgbImage) -> ClassificationResult {
            self.seen
                .lock()
                .unwrap()
                .push((image.width(), image.height()));
            ClassificationResult {
                label: DiseaseLabel::Healthy,
                confidence: 0.9,
            }
        }
    }

    fn service(detector: StubDetector) -> (Arc<RecordingClassifier>, AnalysisService) {
        let classifier = Arc::new(RecordingClassifier::default());
        let svc = AnalysisService::new(
            Arc::new(detector),
            classifier.clone(),
            SelectorPolicy::default(),
        );
        (classifier, svc)
    }

    fn flower(x1: u32, y1: u32, x2: u32, y2: u32, conf: f32) -> Detection {
        Detection {
            x1,
            y1,
            x2,
            y2,
            conf,
            class_id: 0,
            class_name: "flower".into(),
        }
    }

    #[tokio::test]
    async fn test_fallback_whole_image_when_detector_missing() {
        let (classifier, svc) = service(StubDetector {
            available: false,
            detections: Vec::new(),
        });
        let img = RgbImage::new(32, 32);

        let result = svc.analyze(&img, false).await;

        assert_eq!(result.status, AnalysisStatus::FallbackWholeImage);
        assert!(!result.detector_available);
        assert!(result.flower_confidence.is_none());
        assert!(result.classification.is_some());
        // La clasificación corrió sobre la imagen completa.
        assert_eq!(*classifier.seen.lock().unwrap(), vec![(32, 32)]);
    }

    #[tokio::test]
    async fn test_no_flower_detected_skips_classifier() {
        let (classifier, svc) = service(StubDetector {
            available: true,
            detections: Vec::new(),
        });
        let img = RgbImage::new(32, 32);

        let result = svc.analyze(&img, false).await;

        assert_eq!(result.status, AnalysisStatus::NoFlowerDetected);
        assert!(result.classification.is_none());
        assert!(classifier.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_crop_never_reaches_classifier() {
        let (classifier, svc) = service(StubDetector {
            available: true,
            detections: vec![flower(40, 40, 40, 120, 0.9)],
        });
        let img = RgbImage::new(200, 200);

        let result = svc.analyze(&img, false).await;

        assert_eq!(result.status, AnalysisStatus::EmptyCrop);
        assert_eq!(result.flower_confidence, Some(0.9));
        assert!(result.classification.is_none());
        assert!(classifier.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_crop_and_classify() {
        let (classifier, svc) = service(StubDetector {
            available: true,
            detections: vec![flower(10, 10, 110, 110, 0.8)],
        });
        let img = RgbImage::new(200, 200);

        let result = svc.analyze(&img, false).await;

        assert_eq!(result.status, AnalysisStatus::FlowerClassified);
        assert_eq!(result.flower_confidence, Some(0.8));
        assert!(result.classification.is_some());
        // El clasificador recibió exactamente el recorte de 100x100.
        assert_eq!(*classifier.seen.lock().unwrap(), vec![(100, 100)]);
    }

    #[tokio::test]
    async fn test_debug_mode_returns_raw_detections() {
        let detections = vec![flower(0, 0, 10, 10, 0.6), flower(5, 5, 50, 50, 0.7)];
        let (_, svc) = service(StubDetector {
            available: true,
            detections: detections.clone(),
        });
        let img = RgbImage::new(64, 64);

        let with_debug = svc.analyze(&img, true).await;
        assert_eq!(with_debug.raw_detections, detections);

        let without_debug = svc.analyze(&img, false).await;
        assert!(without_debug.raw_detections.is_empty());
    }

    #[tokio::test]
    async fn test_predict_classifies_whole_image() {
        let (classifier, svc) = service(StubDetector {
            available: true,
            detections: vec![flower(10, 10, 110, 110, 0.8)],
        });
        let img = RgbImage::new(48, 48);

        let result = svc.predict(&img).await;

        assert_eq!(result.label, DiseaseLabel::Healthy);
        assert_eq!(*classifier.seen.lock().unwrap(), vec![(48, 48)]);
    }
}
