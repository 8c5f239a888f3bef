//! Page geometry.
//!
//! Every frame gets its own page. [`PageLayout::fit`] scales the image to
//! the largest size that fits the page on both axes without distortion
//! (a "contain" fit) and centres it.

use crate::error::FlipbookError;

/// PDF points per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Page dimensions in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    /// Page width in points.
    pub width: f64,
    /// Page height in points.
    pub height: f64,
}

impl PageSize {
    /// ISO A4, portrait.
    pub const A4: PageSize = PageSize {
        width: 595.28,
        height: 841.89,
    };

    /// US Letter, portrait.
    pub const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };

    /// A custom page size in points.
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// A custom page size in millimetres.
    pub fn from_millimetres(width: f64, height: f64) -> Self {
        let points_per_millimetre = POINTS_PER_INCH / 25.4;
        Self::new(width * points_per_millimetre, height * points_per_millimetre)
    }

    /// The same page with its longer side horizontal.
    pub fn landscape(self) -> Self {
        Self::new(self.width.max(self.height), self.width.min(self.height))
    }

    /// The same page with its longer side vertical.
    pub fn portrait(self) -> Self {
        Self::new(self.width.min(self.height), self.width.max(self.height))
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    /// Check that both sides are positive and finite.
    ///
    /// # Errors
    ///
    /// [`FlipbookError::InvalidConfig`] otherwise.
    pub fn validate(&self) -> Result<(), FlipbookError> {
        let valid = |side: f64| side.is_finite() && side > 0.0;
        if valid(self.width) && valid(self.height) {
            Ok(())
        } else {
            Err(FlipbookError::InvalidConfig(format!(
                "page size must be positive, got {}x{}",
                self.width, self.height
            )))
        }
    }
}

/// A4 landscape.
impl Default for PageSize {
    fn default() -> Self {
        PageSize::A4.landscape()
    }
}

/// Where an image sits on its page.
///
/// Coordinates are in points from the page's top-left corner. Because the
/// image is centred, `image_y` measured from the bottom edge is the same
/// value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    /// Page width in points.
    pub page_width: f64,
    /// Page height in points.
    pub page_height: f64,
    /// Left edge of the image.
    pub image_x: f64,
    /// Top edge of the image.
    pub image_y: f64,
    /// Rendered image width.
    pub render_width: f64,
    /// Rendered image height.
    pub render_height: f64,
}

impl PageLayout {
    /// Fit a `width × height` pixel image onto `page`.
    ///
    /// An image relatively wider than the page spans the full page width;
    /// otherwise it spans the full height. Either way the aspect ratio is
    /// preserved and the result is centred.
    ///
    /// ```
    /// use flipbook::{PageLayout, PageSize};
    ///
    /// let layout = PageLayout::fit(1000, 1000, PageSize::new(800.0, 400.0));
    /// assert_eq!((layout.render_width, layout.render_height), (400.0, 400.0));
    /// assert_eq!((layout.image_x, layout.image_y), (200.0, 0.0));
    /// ```
    pub fn fit(width: u32, height: u32, page: PageSize) -> Self {
        let image_aspect = width as f64 / height as f64;

        let (render_width, render_height) = if image_aspect >= page.aspect_ratio() {
            (page.width, page.width / image_aspect)
        } else {
            (page.height * image_aspect, page.height)
        };

        Self {
            page_width: page.width,
            page_height: page.height,
            image_x: (page.width - render_width) / 2.0,
            image_y: (page.height - render_height) / 2.0,
            render_width,
            render_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_aspect_fills_page() {
        let layout = PageLayout::fit(1600, 900, PageSize::new(1600.0, 900.0));
        assert_eq!(layout.render_width, 1600.0);
        assert_eq!(layout.render_height, 900.0);
        assert_eq!(layout.image_x, 0.0);
        assert_eq!(layout.image_y, 0.0);
    }

    #[test]
    fn tall_image_is_pillarboxed() {
        let layout = PageLayout::fit(100, 200, PageSize::new(300.0, 100.0));
        assert_eq!(layout.render_height, 100.0);
        assert_eq!(layout.render_width, 50.0);
        assert_eq!(layout.image_x, 125.0);
    }

    #[test]
    fn orientation_helpers() {
        assert_eq!(PageSize::A4.landscape(), PageSize::new(841.89, 595.28));
        assert_eq!(PageSize::A4.landscape().portrait(), PageSize::A4);
        assert_eq!(PageSize::default(), PageSize::A4.landscape());
    }

    #[test]
    fn millimetres_convert_to_points() {
        let page = PageSize::from_millimetres(25.4, 50.8);
        assert!((page.width - 72.0).abs() < 1e-9);
        assert!((page.height - 144.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_pages_are_rejected() {
        assert!(PageSize::new(0.0, 10.0).validate().is_err());
        assert!(PageSize::new(10.0, f64::NAN).validate().is_err());
        assert!(PageSize::LETTER.validate().is_ok());
    }
}
