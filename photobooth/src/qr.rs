//! Scannable-code image generation for share links.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use qrcode::QrCode;

/// Target pixel size of the rendered code.
const IMAGE_SIZE: u32 = 400;

/// Render a link as a QR code PNG and return it as a data URL suitable
/// for an `<img src>` attribute.
pub fn data_url(link: &str) -> Result<String> {
    let code = QrCode::new(link.as_bytes()).context("Failed to encode QR code")?;
    let rendered = code
        .render::<image::Luma<u8>>()
        .min_dimensions(IMAGE_SIZE, IMAGE_SIZE)
        .build();

    let mut png = Vec::new();
    rendered
        .write_to(
            &mut std::io::Cursor::new(&mut png),
            image::ImageFormat::Png,
        )
        .context("Failed to render QR code image")?;

    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_shape() {
        let url = data_url("http://localhost:3000/0001").unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        // The payload decodes back to a PNG.
        let payload = url.strip_prefix("data:image/png;base64,").unwrap();
        let bytes = STANDARD.decode(payload).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
