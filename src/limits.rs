/// Resource limits for decode operations.
///
/// All fields default to `None` (no limit).
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Maximum pixel count (width * height) of the canvas or any frame.
    pub max_pixels: Option<u64>,
    /// Maximum number of frames a decode session will yield.
    pub max_frames: Option<u64>,
}

impl Limits {
    /// Check dimensions against limits. Returns Ok(()) or LimitExceeded error.
    pub(crate) fn check(&self, width: u32, height: u32) -> Result<(), crate::GifError> {
        if let Some(max_w) = self.max_width {
            if u64::from(width) > max_w {
                return Err(crate::GifError::LimitExceeded(alloc::format!(
                    "width {width} exceeds limit {max_w}"
                )));
            }
        }
        if let Some(max_h) = self.max_height {
            if u64::from(height) > max_h {
                return Err(crate::GifError::LimitExceeded(alloc::format!(
                    "height {height} exceeds limit {max_h}"
                )));
            }
        }
        if let Some(max_px) = self.max_pixels {
            let pixels = u64::from(width) * u64::from(height);
            if pixels > max_px {
                return Err(crate::GifError::LimitExceeded(alloc::format!(
                    "pixel count {pixels} exceeds limit {max_px}"
                )));
            }
        }
        Ok(())
    }

    /// Check the number of frames decoded so far.
    pub(crate) fn check_frames(&self, count: u64) -> Result<(), crate::GifError> {
        if let Some(max_frames) = self.max_frames {
            if count > max_frames {
                return Err(crate::GifError::LimitExceeded(alloc::format!(
                    "frame count {count} exceeds limit {max_frames}"
                )));
            }
        }
        Ok(())
    }
}

/// Byte budget for the buffers a decode session allocates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MemoryLimit {
    /// No budget.
    #[default]
    Unlimited,
    /// At most this many bytes for the buffers backing one decoded frame.
    Bytes(u64),
}

impl MemoryLimit {
    /// Interpret a signed byte count: negative means unlimited, zero is rejected.
    pub fn from_i64(value: i64) -> Result<Self, crate::GifError> {
        match value {
            v if v < 0 => Ok(MemoryLimit::Unlimited),
            0 => Err(crate::GifError::InvalidArgument(
                "memory limit must be a positive non-zero byte count, or negative for unlimited"
                    .into(),
            )),
            v => Ok(MemoryLimit::Bytes(v as u64)),
        }
    }

    /// Check that an allocation of `bytes` fits the budget.
    pub(crate) fn check(&self, bytes: u64) -> Result<(), crate::GifError> {
        match *self {
            MemoryLimit::Unlimited => Ok(()),
            MemoryLimit::Bytes(limit) if bytes > limit => {
                Err(crate::GifError::MemoryLimitExceeded {
                    needed: bytes,
                    limit,
                })
            }
            MemoryLimit::Bytes(_) => Ok(()),
        }
    }
}
