use serde::{Deserialize, Serialize};

use crate::domain::{
    analysis::{AnalysisStatus, FlowerAnalysis},
    classification::DiseaseLabel,
    detection::Detection,
};

/// Respuesta de POST /analyze. Reproduce el contrato JSON heredado del
/// servicio original, incluidas las claves que cada rama omite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub found_flower: Option<bool>,
    pub flower_confidence: Option<f32>,
    pub disease_label: Option<DiseaseLabel>,
    pub disease_confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yolo_available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yolo_detections: Option<Vec<Detection>>,
}

impl From<FlowerAnalysis> for AnalyzeResponse {
    fn from(a: FlowerAnalysis) -> Self {
        let (disease_label, disease_confidence) = match a.classification {
            Some(c) => (Some(c.label), Some(c.confidence)),
            None => (None, None),
        };

        match a.status {
            AnalysisStatus::FallbackWholeImage => Self {
                found_flower: None,
                flower_confidence: None,
                disease_label,
                disease_confidence,
                message: Some(
                    "YOLO not available or no flower detected; classification run on full image as fallback."
                        .into(),
                ),
                yolo_available: Some(a.detector_available),
                yolo_detections: Some(a.raw_detections),
            },
            AnalysisStatus::NoFlowerDetected => Self {
                found_flower: Some(false),
                flower_confidence: Some(0.0),
                disease_label: None,
                disease_confidence: None,
                message: Some("No flower detected in the image.".into()),
                yolo_available: Some(a.detector_available),
                yolo_detections: Some(a.raw_detections),
            },
            AnalysisStatus::EmptyCrop => Self {
                found_flower: Some(true),
                flower_confidence: a.flower_confidence,
                disease_label: None,
                disease_confidence: None,
                message: Some("Detected bbox produced empty crop.".into()),
                yolo_available: None,
                yolo_detections: None,
            },
            AnalysisStatus::FlowerClassified => Self {
                found_flower: Some(true),
                flower_confidence: a.flower_confidence,
                disease_label,
                disease_confidence,
                message: None,
                yolo_available: Some(a.detector_available),
                yolo_detections: Some(a.raw_detections),
            },
        }
    }
}

/// Respuesta del endpoint heredado POST /predict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub has_botrytis: bool,
    pub confidence: f32,
}

/// Respuesta de POST /debug_detect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugDetectResponse {
    pub yolo_available: bool,
    pub yolo_detections: Vec<Detection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_conf: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::classification::ClassificationResult;

    fn analysis(status: AnalysisStatus) -> FlowerAnalysis {
        FlowerAnalysis {
            status,
            flower_confidence: Some(0.8),
            classification: Some(ClassificationResult {
                label: DiseaseLabel::Botrytis,
                confidence: 0.6,
            }),
            detector_available: true,
            raw_detections: Vec::new(),
        }
    }

    #[test]
    fn test_classified_response_omits_message() {
        let value =
            serde_json::to_value(AnalyzeResponse::from(analysis(AnalysisStatus::FlowerClassified)))
                .unwrap();
        assert_eq!(value["found_flower"], true);
        assert_eq!(value["disease_label"], "botrytis");
        assert_eq!(value["yolo_available"], true);
        assert!(value.get("message").is_none());
    }

    #[test]
    fn test_empty_crop_response_omits_yolo_keys() {
        let value =
            serde_json::to_value(AnalyzeResponse::from(analysis(AnalysisStatus::EmptyCrop)))
                .unwrap();
        assert_eq!(value["found_flower"], true);
        assert_eq!(value["disease_label"], serde_json::Value::Null);
        assert_eq!(value["message"], "Detected bbox produced empty crop.");
        assert!(value.get("yolo_available").is_none());
        assert!(value.get("yolo_detections").is_none());
    }

    #[test]
    fn test_fallback_response_marks_flower_unknown() {
        let mut a = analysis(AnalysisStatus::FallbackWholeImage);
        a.flower_confidence = None;
        a.detector_available = false;
        let value = serde_json::to_value(AnalyzeResponse::from(a)).unwrap();
        assert_eq!(value["found_flower"], serde_json::Value::Null);
        assert_eq!(value["yolo_available"], false);
        assert_eq!(value["disease_label"], "botrytis");
    }

    #[test]
    fn test_no_flower_response_reports_zero_confidence() {
        let mut a = analysis(AnalysisStatus::NoFlowerDetected);
        a.classification = None;
        let value = serde_json::to_value(AnalyzeResponse::from(a)).unwrap();
        assert_eq!(value["found_flower"], false);
        assert_eq!(value["flower_confidence"], 0.0);
        assert_eq!(value["disease_label"], serde_json::Value::Null);
    }
}
