use async_trait::async_trait;
use image::RgbImage;

use crate::domain::{
    classification::ClassificationResult, detection::Detection, errors::DomainResult,
};

#[async_trait]
pub trait DetectorPort: Send + Sync {
    /// Indica si hay pesos cargados. Se fija al arranque y no cambia.
    fn is_available(&self) -> bool;

    /// Detecciones sobre la imagen completa. Devuelve vacío si el modelo no
    /// está disponible, si no encuentra nada o si la inferencia falla: el
    /// fallo se registra y se traga en esta capa.
    async fn detect(&self, image: &RgbImage) -> Vec<Detection>;

    /// Variante de depuración con umbral de confianza ajustable. A
    /// diferencia de `detect`, los fallos de inferencia se propagan.
    async fn detect_with_conf(
        &self,
        image: &RgbImage,
        min_conf: f32,
    ) -> DomainResult<Vec<Detection>>;
}

#[async_trait]
pub trait ClassifierPort: Send + Sync {
    fn is_available(&self) -> bool;

    /// Clasifica la imagen. Nunca falla: sin modelo entrenado, o si éste
    /// falla en caliente, responde la heurística de brillo.
    async fn classify(&self, image: &RgbImage) -> ClassificationResult;
}
