use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    Json,
};
use base64::{prelude::BASE64_STANDARD, Engine};
use image::{DynamicImage, ImageFormat, RgbImage};
use serde::Deserialize;
use serde_json::json;
use std::io::Cursor;

use crate::adapters::annotate;
use crate::adapters::http::state::HttpState;
use crate::application::dto::{AnalyzeResponse, DebugDetectResponse, PredictResponse};
use crate::domain::classification::DiseaseLabel;
use crate::domain::detection::Detection;
use crate::domain::errors::DomainError;

#[derive(Deserialize)]
pub struct AnalyzeQuery {
    #[serde(default)]
    pub debug: bool,
}

#[derive(Deserialize)]
pub struct DebugDetectQuery {
    pub min_conf: Option<f32>,
    pub draw: Option<bool>,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

/// Traduce la taxonomía del dominio al contrato HTTP heredado: imagen
/// inválida es culpa del cliente (400 con `detail`), un fallo de inferencia
/// que llegó hasta aquí es un 500 con el mensaje subyacente.
fn to_api_error(err: DomainError) -> ApiError {
    match err {
        DomainError::InvalidImage(detail) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "detail": detail })))
        }
        DomainError::InferenceFailed(detail) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": format!("YOLO run failed: {}", detail) })),
        ),
    }
}

/// Extrae el campo `file` del multipart y lo decodifica a RGB.
/// Un cuerpo sin campo `file` o con bytes no decodificables es un error
/// del cliente, nunca una degradación silenciosa.
async fn read_image(multipart: &mut Multipart) -> Result<RgbImage, DomainError> {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|_| DomainError::InvalidImage("Invalid image file".into()))?;
        return image::load_from_memory(&bytes)
            .map(|img| img.to_rgb8())
            .map_err(|_| DomainError::InvalidImage("Invalid image file".into()));
    }
    Err(DomainError::InvalidImage("Missing file field".into()))
}

pub async fn analyze(
    State(st): State<HttpState>,
    Query(q): Query<AnalyzeQuery>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let img = read_image(&mut multipart).await.map_err(to_api_error)?;
    let analysis = st.analysis.analyze(&img, q.debug).await;
    Ok(Json(AnalyzeResponse::from(analysis)))
}

pub async fn predict(
    State(st): State<HttpState>,
    mut multipart: Multipart,
) -> Result<Json<PredictResponse>, ApiError> {
    let img = read_image(&mut multipart).await.map_err(to_api_error)?;
    let result = st.analysis.predict(&img).await;
    Ok(Json(PredictResponse {
        has_botrytis: result.label == DiseaseLabel::Botrytis,
        confidence: result.confidence,
    }))
}

pub async fn debug_detect(
    State(st): State<HttpState>,
    Query(q): Query<DebugDetectQuery>,
    mut multipart: Multipart,
) -> Result<Json<DebugDetectResponse>, ApiError> {
    let img = read_image(&mut multipart).await.map_err(to_api_error)?;

    if !st.analysis.detector_available() {
        return Ok(Json(DebugDetectResponse {
            yolo_available: false,
            yolo_detections: Vec::new(),
            min_conf: None,
            message: Some("YOLO not available on server.".into()),
            image_base64: None,
        }));
    }

    let min_conf = q.min_conf.unwrap_or(0.1);
    let detections = st
        .analysis
        .debug_detect(&img, min_conf)
        .await
        .map_err(to_api_error)?;

    let image_base64 = if q.draw.unwrap_or(false) && !detections.is_empty() {
        // Si la codificación JPEG falla se omite la imagen, no la respuesta.
        encode_annotated(&img, &detections).ok()
    } else {
        None
    };

    Ok(Json(DebugDetectResponse {
        yolo_available: true,
        yolo_detections: detections,
        min_conf: Some(min_conf),
        message: None,
        image_base64,
    }))
}

fn encode_annotated(image: &RgbImage, detections: &[Detection]) -> anyhow::Result<String> {
    let drawn = annotate::draw_detections(image, detections);
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(drawn).write_to(&mut buf, ImageFormat::Jpeg)?;
    Ok(BASE64_STANDARD.encode(buf.into_inner()))
}
