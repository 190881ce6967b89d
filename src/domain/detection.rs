use serde::{Deserialize, Serialize};

/// Detección de un objeto sobre la imagen original. Las coordenadas se
/// validan en el límite del adaptador: enteras, ordenadas (x1<=x2, y1<=y2)
/// y recortadas a los bordes de la imagen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
    pub conf: f32,
    pub class_id: usize,
    pub class_name: String,
}

impl Detection {
    /// Normaliza una caja cruda del modelo: ordena las esquinas y recorta
    /// al tamaño de la imagen. La salida cruda puede venir invertida o
    /// fuera de rango.
    pub fn from_raw(
        raw: [f32; 4],
        conf: f32,
        class_id: usize,
        class_name: String,
        img_w: u32,
        img_h: u32,
    ) -> Self {
        let [a, b, c, d] = raw;
        let clamp = |v: f32, max: u32| v.round().clamp(0.0, max as f32) as u32;
        Self {
            x1: clamp(a.min(c), img_w),
            y1: clamp(b.min(d), img_h),
            x2: clamp(a.max(c), img_w),
            y2: clamp(b.max(d), img_h),
            conf,
            class_id,
            class_name,
        }
    }

    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }
}

/// Política de aceptación del selector de cajas. El vocabulario del detector
/// no está garantizado: un modelo afinado usa nombres del dominio y uno
/// genérico no, así que la política debe funcionar con ambos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorPolicy {
    pub keywords: Vec<String>,
    pub min_confidence: f32,
}

impl Default for SelectorPolicy {
    fn default() -> Self {
        Self {
            keywords: vec!["flower".into(), "plant".into()],
            min_confidence: 0.5,
        }
    }
}

/// Selecciona la detección más relevante en dos niveles, el primero que
/// acepte algo gana:
/// 1. Coincidencia semántica: el nombre de clase contiene alguna palabra
///    clave (sin distinguir mayúsculas), con cualquier confianza.
/// 2. Sin coincidencias: cualquier detección con confianza >= min_confidence.
/// Entre las aceptadas gana la de mayor área; a igualdad, la primera vista.
pub fn select_flower<'a>(
    detections: &'a [Detection],
    policy: &SelectorPolicy,
) -> Option<&'a Detection> {
    let keywords: Vec<String> = policy.keywords.iter().map(|k| k.to_lowercase()).collect();
    let matches_keyword = |d: &&Detection| {
        let name = d.class_name.to_lowercase();
        keywords.iter().any(|k| name.contains(k.as_str()))
    };

    let semantic: Vec<&Detection> = detections.iter().filter(matches_keyword).collect();
    let candidates = if semantic.is_empty() {
        detections
            .iter()
            .filter(|d| d.conf >= policy.min_confidence)
            .collect()
    } else {
        semantic
    };

    // max_by daría el último empate; aquí el empate lo gana la primera vista.
    candidates
        .into_iter()
        .fold(None::<&Detection>, |best, d| match best {
            Some(b) if b.area() >= d.area() => Some(b),
            _ => Some(d),
        })
}
