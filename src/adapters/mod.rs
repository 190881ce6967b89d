pub mod annotate;
pub mod http;
pub mod onnx;
