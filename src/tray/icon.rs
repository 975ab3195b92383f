//! Tray icon loading

use crate::core::state::IconVariant;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use tray_icon::Icon;

/// Icons decoded from the assets directory, cached per variant
pub struct IconSet {
    assets_dir: PathBuf,
    loaded: HashMap<&'static str, Icon>,
}

impl IconSet {
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
            loaded: HashMap::new(),
        }
    }

    /// Icon for a variant, decoding it on first use
    pub fn get(&mut self, variant: IconVariant) -> Result<Icon> {
        let path = variant.path();
        if let Some(icon) = self.loaded.get(path) {
            return Ok(icon.clone());
        }

        let icon = match load_icon_file(&self.assets_dir.join(path)) {
            Ok(icon) => icon,
            Err(e) => {
                let data = crate::assets::bundled(path).ok_or(e)?;
                debug!("Using bundled icon {}", path);
                icon_from_png(data)?
            }
        };
        self.loaded.insert(path, icon.clone());
        Ok(icon)
    }
}

pub fn load_icon_file(path: &Path) -> Result<Icon> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read icon {:?}", path))?;
    icon_from_png(&data)
}

fn icon_from_png(data: &[u8]) -> Result<Icon> {
    let (rgba, width, height) = decode_png_rgba(data)?;
    Icon::from_rgba(rgba, width, height)
        .map_err(|e| anyhow::anyhow!("Failed to create icon: {}", e))
}

/// Decode PNG data into RGBA8 pixels
pub fn decode_png_rgba(data: &[u8]) -> Result<(Vec<u8>, u32, u32)> {
    let decoder = png::Decoder::new(std::io::Cursor::new(data));
    let mut reader = decoder.read_info()?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;

    // Truncate buffer to actual size
    buf.truncate(info.buffer_size());

    let rgba_data = match info.color_type {
        png::ColorType::Rgba => buf,
        png::ColorType::Rgb => {
            let mut rgba = Vec::with_capacity(buf.len() * 4 / 3);
            for chunk in buf.chunks(3) {
                rgba.extend_from_slice(chunk);
                rgba.push(255);
            }
            rgba
        }
        png::ColorType::GrayscaleAlpha => {
            let mut rgba = Vec::with_capacity(buf.len() * 2);
            for chunk in buf.chunks(2) {
                rgba.extend_from_slice(&[chunk[0], chunk[0], chunk[0], chunk[1]]);
            }
            rgba
        }
        png::ColorType::Grayscale => {
            let mut rgba = Vec::with_capacity(buf.len() * 4);
            for &gray in &buf {
                rgba.extend_from_slice(&[gray, gray, gray, 255]);
            }
            rgba
        }
        png::ColorType::Indexed => {
            anyhow::bail!("Indexed color not supported");
        }
    };

    Ok((rgba_data, info.width, info.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(width: u32, height: u32, color: png::ColorType, pixels: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, width, height);
            encoder.set_color(color);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(pixels).unwrap();
        }
        out
    }

    #[test]
    fn test_decode_rgb_adds_alpha() {
        let data = encode(1, 1, png::ColorType::Rgb, &[10, 20, 30]);
        let (rgba, width, height) = decode_png_rgba(&data).unwrap();
        assert_eq!((width, height), (1, 1));
        assert_eq!(rgba, vec![10, 20, 30, 255]);
    }

    #[test]
    fn test_decode_grayscale_alpha() {
        let data = encode(1, 1, png::ColorType::GrayscaleAlpha, &[7, 128]);
        let (rgba, _, _) = decode_png_rgba(&data).unwrap();
        assert_eq!(rgba, vec![7, 7, 7, 128]);
    }

    #[test]
    fn test_bundled_icons_decode() {
        for variant in [IconVariant::Inactive, IconVariant::Active] {
            let data = crate::assets::bundled(variant.path()).unwrap();
            let (rgba, width, height) = decode_png_rgba(data).unwrap();
            assert_eq!((width, height), (32, 32));
            assert_eq!(rgba.len(), 32 * 32 * 4);
        }
    }

    #[test]
    fn test_missing_icon_file_falls_back_to_bundled() {
        let mut icons = IconSet::new("/nonexistent/assets");
        assert!(icons.get(IconVariant::Active).is_ok());
        assert!(icons.get(IconVariant::Inactive).is_ok());
    }

    #[test]
    fn test_unreadable_icon_file() {
        assert!(load_icon_file(Path::new("/nonexistent/assets/images/icon32.png")).is_err());
    }
}
