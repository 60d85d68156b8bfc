/// Model input resolution (width, height) used when none is configured.
pub const DEFAULT_INPUT_SIZE: (u32, u32) = (640, 640);

/// Upload size ceiling in MiB.
pub const DEFAULT_MAX_SIZE_MB: u32 = 10;

/// Inclusive bounds on each image axis, in pixels.
pub const MIN_DIMENSION: u32 = 100;
pub const MAX_DIMENSION: u32 = 4096;

/// Quality used when re-encoding JPEG during metadata stripping.
pub const JPEG_QUALITY: u8 = 95;
