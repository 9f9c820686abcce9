use super::pipeline::Transform;
use image::imageops::FilterType;

impl Transform {
    /// Resizes the image to exactly `new_w` x `new_h` using Lanczos3, the
    /// antialiasing filter used for all dataset preprocessing.
    ///
    /// Aspect ratio is not preserved: the image is stretched or squashed to
    /// fill the target box.
    pub fn resize_antialiased(self, new_w: u32, new_h: u32) -> Self {
        self.resize_with(new_w, new_h, FilterType::Lanczos3)
    }

    /// Resizes the image to exactly `new_w` x `new_h` with the given filter.
    ///
    /// # Notes
    ///
    /// - Resizing to the current size returns the image untouched.
    /// - Zero-sized targets are left to the caller to reject; the dataset
    ///   validates its dimensions at construction.
    pub fn resize_with(mut self, new_w: u32, new_h: u32, filter: FilterType) -> Self {
        if self.image.width() == new_w && self.image.height() == new_h {
            return self;
        }

        self.image = self.image.resize_exact(new_w, new_h, filter);
        self
    }
}
