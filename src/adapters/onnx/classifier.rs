use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use image::{imageops::FilterType, RgbImage};
use ndarray::Array4;
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Value;
use std::fs;
use tracing::{info, warn};

use crate::application::ports::ClassifierPort;
use crate::domain::classification::{ClassificationResult, DiseaseLabel};

const INPUT_SIZE: u32 = 224;
const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

// Umbral y confianzas fijas de la heurística de brillo. No son una
// predicción: marcan un resultado de relleno cuando no hay modelo entrenado.
const BRIGHTNESS_THRESHOLD: f32 = 0.55;
const HEURISTIC_BOTRYTIS_CONF: f32 = 0.6;
const HEURISTIC_HEALTHY_CONF: f32 = 0.7;

struct OnnxClassifierEngine {
    session: Session,
}

impl OnnxClassifierEngine {
    fn load(path: &str) -> Result<Self> {
        let mut builder = Session::builder()?.with_intra_threads(4)?;

        let cuda = CUDAExecutionProvider::default().build();
        if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda]) {
            builder = builder_with_cuda;
        }

        let model_bytes = fs::read(path)?;
        let session = builder.commit_from_memory(&model_bytes)?;

        Ok(Self { session })
    }

    /// Preprocesado estilo torchvision: 224x224, normalización ImageNet,
    /// softmax sobre los logits y argmax como etiqueta.
    fn infer(&mut self, rgb: &RgbImage) -> Result<ClassificationResult> {
        let size = INPUT_SIZE as usize;
        let resized = image::imageops::resize(rgb, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

        let mut input = Array4::<f32>::zeros((1, 3, size, size));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..3 {
                let v = pixel[c] as f32 / 255.0;
                input[[0, c, y as usize, x as usize]] = (v - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
            }
        }

        let input_shape = vec![1, 3, size as i64, size as i64];
        let input_tensor = Value::from_array((input_shape, input.into_raw_vec()))?;

        let outputs = self.session.run(ort::inputs![input_tensor])?;
        let (_, logits) = outputs[0].try_extract_tensor::<f32>()?;

        let probs = softmax(logits);
        let (idx, confidence) = probs
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(i, &p)| (i, p))
            .ok_or_else(|| anyhow!("salida del clasificador vacía"))?;

        Ok(ClassificationResult {
            label: DiseaseLabel::from_index(idx),
            confidence,
        })
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|v| v / sum).collect()
}

/// Brillo medio normalizado sobre los tres canales, umbral fijo.
pub fn heuristic_classification(image: &RgbImage) -> ClassificationResult {
    let raw = image.as_raw();
    let total: u64 = raw.iter().map(|&b| b as u64).sum();
    let mean = total as f32 / (raw.len().max(1) as f32 * 255.0);

    if mean < BRIGHTNESS_THRESHOLD {
        ClassificationResult {
            label: DiseaseLabel::Botrytis,
            confidence: HEURISTIC_BOTRYTIS_CONF,
        }
    } else {
        ClassificationResult {
            label: DiseaseLabel::Healthy,
            confidence: HEURISTIC_HEALTHY_CONF,
        }
    }
}

/// Clasificador de enfermedad. Con pesos cargados usa el modelo ONNX; sin
/// ellos degrada a la heurística de brillo, de modo que el API nunca
/// devuelve un error interno sólo porque falte el fichero del modelo.
pub struct DiseaseClassifier {
    engine: Option<Mutex<OnnxClassifierEngine>>,
}

impl DiseaseClassifier {
    pub fn load(weights_path: &str) -> Self {
        if !Path::new(weights_path).exists() {
            warn!(
                "Pesos del clasificador no encontrados en '{}': se usará la heurística de brillo",
                weights_path
            );
            return Self { engine: None };
        }

        match OnnxClassifierEngine::load(weights_path) {
            Ok(engine) => {
                info!("Clasificador cargado desde '{}'", weights_path);
                Self {
                    engine: Some(Mutex::new(engine)),
                }
            }
            Err(e) => {
                warn!("Error cargando clasificador '{}': {:?}", weights_path, e);
                Self { engine: None }
            }
        }
    }
}

#[async_trait]
impl ClassifierPort for DiseaseClassifier {
    fn is_available(&self) -> bool {
        self.engine.is_some()
    }

    async fn classify(&self, image: &RgbImage) -> ClassificationResult {
        if let Some(engine) = &self.engine {
            if let Ok(mut engine) = engine.lock() {
                match engine.infer(image) {
                    Ok(result) => return result,
                    Err(e) => {
                        warn!("Inferencia del clasificador fallida, se usa la heurística: {}", e)
                    }
                }
            }
        }
        heuristic_classification(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_heuristic_black_image_is_botrytis() {
        let img = RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]));
        let result = heuristic_classification(&img);
        assert_eq!(result.label, DiseaseLabel::Botrytis);
        assert_eq!(result.confidence, 0.6);
    }

    #[test]
    fn test_heuristic_white_image_is_healthy() {
        let img = RgbImage::from_pixel(8, 8, Rgb([255, 255, 255]));
        let result = heuristic_classification(&img);
        assert_eq!(result.label, DiseaseLabel::Healthy);
        assert_eq!(result.confidence, 0.7);
    }

    #[test]
    fn test_softmax_normalizes_and_preserves_argmax() {
        let probs = softmax(&[1.0, 3.0]);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!(probs[1] > probs[0]);
    }

    #[tokio::test]
    async fn test_missing_weights_fall_back_to_heuristic() {
        let classifier = DiseaseClassifier::load("no/such/classifier.onnx");
        assert!(!classifier.is_available());

        let dark = RgbImage::from_pixel(8, 8, Rgb([10, 10, 10]));
        let result = classifier.classify(&dark).await;
        assert_eq!(result.label, DiseaseLabel::Botrytis);
        assert_eq!(result.confidence, 0.6);
    }
}
