use qrcode::{QrCode, render::svg};

use crate::error::{AppError, AppResult};

const QR_MIN_SIZE: u32 = 400;

/// Renders `payload` as a standalone SVG document.
pub fn render_svg(payload: &str) -> AppResult<String> {
    let code = QrCode::new(payload.as_bytes()).map_err(|e| AppError::Qr(e.to_string()))?;

    Ok(code
        .render::<svg::Color>()
        .min_dimensions(QR_MIN_SIZE, QR_MIN_SIZE)
        .quiet_zone(true)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build())
}
