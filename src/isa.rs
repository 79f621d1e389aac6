//! Runtime ISA level detection, cached per process.

use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum IsaLevel {
    Scalar,
    Avx2,
    Avx512,
    /// AVX-512 with native FP16 support (Sapphire Rapids+).
    Avx512Fp16,
    Neon,
}

impl IsaLevel {
    pub fn name(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Avx2 => "avx2",
            Self::Avx512 => "avx512",
            Self::Avx512Fp16 => "avx512fp16",
            Self::Neon => "neon",
        }
    }

    /// Rank within the x86 upgrade chain; Neon sits outside it.
    const fn x86_rank(self) -> Option<u8> {
        match self {
            Self::Scalar => Some(0),
            Self::Avx2 => Some(1),
            Self::Avx512 => Some(2),
            Self::Avx512Fp16 => Some(3),
            Self::Neon => None,
        }
    }

    /// Whether code compiled for `required` may run at this level.
    pub fn includes(self, required: IsaLevel) -> bool {
        match (self.x86_rank(), required.x86_rank()) {
            (Some(have), Some(need)) => have >= need,
            _ => self == required,
        }
    }
}

static ISA_LEVEL: OnceLock<IsaLevel> = OnceLock::new();

/// Detect the ISA level of the executing processor, once.
pub fn get_isa_level() -> IsaLevel {
    *ISA_LEVEL.get_or_init(detect_isa_features)
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn detect_isa_features() -> IsaLevel {
    if is_x86_feature_detected!("avx512fp16") {
        IsaLevel::Avx512Fp16
    } else if is_x86_feature_detected!("avx512f") {
        IsaLevel::Avx512
    } else if is_x86_feature_detected!("avx2") {
        IsaLevel::Avx2
    } else {
        IsaLevel::Scalar
    }
}

#[cfg(target_arch = "aarch64")]
fn detect_isa_features() -> IsaLevel {
    IsaLevel::Neon
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
fn detect_isa_features() -> IsaLevel {
    IsaLevel::Scalar
}
