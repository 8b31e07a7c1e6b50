use std::sync::Arc;

/// An already-captured screenshot shared read-only by every tier.
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Encoded image bytes (PNG, BMP, ...).
    data: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
    /// Screen position of the image's top-left pixel.
    pub origin: (i32, i32),
}

impl Screenshot {
    pub fn new(data: impl Into<Arc<[u8]>>, width: u32, height: u32) -> Self {
        Self {
            data: data.into(),
            width,
            height,
            origin: (0, 0),
        }
    }

    /// Place the image at a screen position (e.g. a window's top-left corner).
    pub fn with_origin(mut self, x: i32, y: i32) -> Self {
        self.origin = (x, y);
        self
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// True when there is nothing a tier could analyze.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() || self.width == 0 || self.height == 0
    }
}
