use std::collections::HashMap;

use eframe::egui;

use crate::conversation::ImageRef;
use crate::error::Result;

enum Slot {
    Pending,
    Ready(egui::TextureHandle),
    Failed,
}

pub enum ImageLookup<'a> {
    Ready(&'a egui::TextureHandle),
    Loading,
    Unavailable,
}

/// Textures for image messages. Inline images decode on first sight;
/// remote ones are queued for download through the conversation.
#[derive(Default)]
pub struct ImageCache {
    slots: HashMap<String, Slot>,
    to_fetch: Vec<String>,
}

impl ImageCache {
    pub fn lookup(
        &mut self,
        ctx: &egui::Context,
        message_id: i64,
        image: &ImageRef,
    ) -> ImageLookup<'_> {
        let key = cache_key(message_id, image);
        if !self.slots.contains_key(&key) {
            let slot = match image {
                ImageRef::Inline { bytes, .. } => decode_slot(ctx, &key, bytes),
                ImageRef::Remote(url) => {
                    self.to_fetch.push(url.clone());
                    Slot::Pending
                }
            };
            self.slots.insert(key.clone(), slot);
        }

        match self.slots.get(&key) {
            Some(Slot::Ready(texture)) => ImageLookup::Ready(texture),
            Some(Slot::Pending) => ImageLookup::Loading,
            Some(Slot::Failed) | None => ImageLookup::Unavailable,
        }
    }

    /// URLs discovered since the last call that still need downloading.
    pub fn take_fetch_requests(&mut self) -> Vec<String> {
        std::mem::take(&mut self.to_fetch)
    }

    pub fn store_fetched(&mut self, ctx: &egui::Context, url: &str, bytes: &[u8]) {
        let slot = decode_slot(ctx, url, bytes);
        self.slots.insert(url.to_string(), slot);
    }

    pub fn mark_failed(&mut self, url: &str) {
        self.slots.insert(url.to_string(), Slot::Failed);
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.to_fetch.clear();
    }
}

fn cache_key(message_id: i64, image: &ImageRef) -> String {
    match image {
        ImageRef::Remote(url) => url.clone(),
        ImageRef::Inline { .. } => format!("inline://{message_id}"),
    }
}

fn decode_slot(ctx: &egui::Context, key: &str, bytes: &[u8]) -> Slot {
    match decode_color_image(bytes) {
        Ok(image) => Slot::Ready(ctx.load_texture(key, image, egui::TextureOptions::LINEAR)),
        Err(err) => {
            log::debug!("Unable to decode image {key}: {err}");
            Slot::Failed
        }
    }
}

pub fn decode_color_image(bytes: &[u8]) -> Result<egui::ColorImage> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn tiny_png() -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(2, 1, image::Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn decodes_png_bytes() {
        let decoded = decode_color_image(&tiny_png()).unwrap();
        assert_eq!(decoded.size, [2, 1]);
    }

    #[test]
    fn rejects_non_image_bytes() {
        assert!(decode_color_image(b"definitely not an image").is_err());
    }

    #[test]
    fn remote_images_are_requested_once() {
        let ctx = egui::Context::default();
        let mut cache = ImageCache::default();
        let image = ImageRef::Remote("https://x/y.png".to_string());

        assert!(matches!(cache.lookup(&ctx, 1, &image), ImageLookup::Loading));
        assert!(matches!(cache.lookup(&ctx, 1, &image), ImageLookup::Loading));
        assert_eq!(cache.take_fetch_requests(), ["https://x/y.png"]);
        assert!(cache.take_fetch_requests().is_empty());

        cache.mark_failed("https://x/y.png");
        assert!(matches!(cache.lookup(&ctx, 1, &image), ImageLookup::Unavailable));
    }

    #[test]
    fn inline_images_decode_immediately() {
        let ctx = egui::Context::default();
        let mut cache = ImageCache::default();
        let image = ImageRef::Inline {
            mime: "image/png".to_string(),
            bytes: tiny_png(),
        };

        assert!(matches!(cache.lookup(&ctx, 7, &image), ImageLookup::Ready(_)));
        assert!(cache.take_fetch_requests().is_empty());
    }
}
