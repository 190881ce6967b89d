mod domain;
mod application;
mod adapters;

use std::sync::Arc;

use crate::adapters::{
    http::{router, state::HttpState},
    onnx::{classifier::DiseaseClassifier, detector::FlowerDetector},
};
use crate::application::ports::{ClassifierPort, DetectorPort};
use crate::application::services::AnalysisService;
use crate::domain::{detection::SelectorPolicy, model::YoloParams};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Inicializar logs (RUST_LOG=info por defecto)
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    tracing::info!("🔧 Inicializando adaptadores de inferencia...");

    // 2. Instanciar Adaptadores (Capa de Infraestructura)
    // Carga de mejor esfuerzo: un fichero de pesos ausente o corrupto deja
    // el adaptador degradado, nunca impide el arranque.
    let yolo_weights =
        std::env::var("YOLO_WEIGHTS").unwrap_or_else(|_| "models/yolov8n.onnx".into());
    let cls_weights =
        std::env::var("CLASSIFIER_WEIGHTS").unwrap_or_else(|_| "models/botrytis_cls.onnx".into());

    let detector = Arc::new(FlowerDetector::load(&yolo_weights, YoloParams::default()));
    let classifier = Arc::new(DiseaseClassifier::load(&cls_weights));

    tracing::info!(
        "Detector disponible: {} | Clasificador entrenado: {}",
        detector.is_available(),
        classifier.is_available()
    );

    // 3. Instanciar Servicios (Capa de Aplicación - Casos de Uso)
    let analysis = Arc::new(AnalysisService::new(
        detector,
        classifier,
        SelectorPolicy::default(),
    ));

    // 4. Configurar el Estado de la API
    let state = HttpState { analysis };

    // 5. Configurar el Router de Axum (CORS abierto para el frontend local)
    let app = router(state);

    // 6. Lanzar el Servidor
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);
    let addr = format!("0.0.0.0:{}", port);

    tracing::info!("🚀 API de detección de botrytis iniciada en http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
