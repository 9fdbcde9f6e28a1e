//! # Halftoning
//!
//! Thermal heads print only black or white. This module converts continuous
//! grayscale into black/white samples before encoding.
//!
//! ## Methods
//!
//! | Method | Kind | Error spread |
//! |--------|------|--------------|
//! | Jarvis-Judice-Ninke | Error diffusion | 12 neighbours, /48 |
//! | Floyd-Steinberg | Error diffusion | 4 neighbours, /16 |
//! | Simple 2D | Error diffusion | right 1/2, down 1/2 |
//! | Bayer | Ordered | none (8x8 threshold matrix) |
//! | None | Plain grayscale | none, the encoder thresholds at 0x80 |
//!
//! ## Error Diffusion
//!
//! Pixels are visited left to right, top to bottom. Each one snaps to 0 or
//! 255 and the quantisation error is pushed onto unvisited neighbours:
//!
//! ```text
//! Floyd-Steinberg:        Jarvis-Judice-Ninke:
//!        *   7                    *   7   5
//!    3   5   1            3   5   7   5   3
//!   (/16)                 1   3   5   3   1
//!                          (/48)
//! ```
//!
//! Output samples are always exactly 0 or 255 (except for [`DitherMethod::None`]).

use std::fmt;
use std::str::FromStr;

/// Bayer 8x8 dithering matrix (values 0-63).
pub const BAYER8: [[u8; 8]; 8] = [
    [0, 32, 8, 40, 2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44, 4, 36, 14, 46, 6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [3, 35, 11, 43, 1, 33, 9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47, 7, 39, 13, 45, 5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// `(dx, dy, weight)` taps of an error-diffusion kernel
type Kernel = &'static [(isize, isize, f32)];

const FLOYD_STEINBERG: Kernel = &[
    (1, 0, 7.0 / 16.0),
    (-1, 1, 3.0 / 16.0),
    (0, 1, 5.0 / 16.0),
    (1, 1, 1.0 / 16.0),
];

const JARVIS_JUDICE_NINKE: Kernel = &[
    (1, 0, 7.0 / 48.0),
    (2, 0, 5.0 / 48.0),
    (-2, 1, 3.0 / 48.0),
    (-1, 1, 5.0 / 48.0),
    (0, 1, 7.0 / 48.0),
    (1, 1, 5.0 / 48.0),
    (2, 1, 3.0 / 48.0),
    (-2, 2, 1.0 / 48.0),
    (-1, 2, 3.0 / 48.0),
    (0, 2, 5.0 / 48.0),
    (1, 2, 3.0 / 48.0),
    (2, 2, 1.0 / 48.0),
];

const SIMPLE_2D: Kernel = &[(1, 0, 0.5), (0, 1, 0.5)];

/// Halftoning algorithm applied before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DitherMethod {
    #[default]
    #[value(name = "jarvis-judice-ninke")]
    JarvisJudiceNinke,
    #[value(name = "floyd-steinberg")]
    FloydSteinberg,
    #[value(name = "simple2d")]
    Simple2D,
    #[value(name = "bayer")]
    Bayer,
    /// Keep plain grayscale; the encoder's threshold decides
    #[value(name = "none")]
    None,
}

impl DitherMethod {
    pub fn name(&self) -> &'static str {
        match self {
            Self::JarvisJudiceNinke => "jarvis-judice-ninke",
            Self::FloydSteinberg => "floyd-steinberg",
            Self::Simple2D => "simple2d",
            Self::Bayer => "bayer",
            Self::None => "none",
        }
    }
}

impl fmt::Display for DitherMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DitherMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jarvis-judice-ninke" | "jjn" => Ok(Self::JarvisJudiceNinke),
            "floyd-steinberg" | "fs" => Ok(Self::FloydSteinberg),
            "simple2d" => Ok(Self::Simple2D),
            "bayer" => Ok(Self::Bayer),
            "none" | "grayscale" => Ok(Self::None),
            other => Err(format!("Unknown dither method '{}'", other)),
        }
    }
}

/// Halftone a row-major grayscale buffer of `width * height` samples.
pub fn apply(method: DitherMethod, width: usize, height: usize, gray: &[u8]) -> Vec<u8> {
    debug_assert_eq!(gray.len(), width * height);
    match method {
        DitherMethod::JarvisJudiceNinke => diffuse(width, height, gray, JARVIS_JUDICE_NINKE),
        DitherMethod::FloydSteinberg => diffuse(width, height, gray, FLOYD_STEINBERG),
        DitherMethod::Simple2D => diffuse(width, height, gray, SIMPLE_2D),
        DitherMethod::Bayer => ordered(width, gray),
        DitherMethod::None => gray.to_vec(),
    }
}

fn diffuse(width: usize, height: usize, gray: &[u8], kernel: Kernel) -> Vec<u8> {
    let mut buf: Vec<f32> = gray.iter().map(|&v| v as f32).collect();
    let mut out = vec![0u8; gray.len()];

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let old = buf[idx];
            let new = if old < 128.0 { 0.0 } else { 255.0 };
            out[idx] = new as u8;
            let err = old - new;

            for &(dx, dy, weight) in kernel {
                let nx = x as isize + dx;
                let ny = y as isize + dy;
                if nx < 0 || nx >= width as isize || ny >= height as isize {
                    continue;
                }
                buf[ny as usize * width + nx as usize] += err * weight;
            }
        }
    }

    out
}

/// Ordered dithering threshold for position (x, y), in (0, 1).
#[inline]
pub fn threshold(x: usize, y: usize) -> f32 {
    (BAYER8[y & 7][x & 7] as f32 + 0.5) / 64.0
}

fn ordered(width: usize, gray: &[u8]) -> Vec<u8> {
    gray.iter()
        .enumerate()
        .map(|(i, &v)| {
            let intensity = 1.0 - v as f32 / 255.0;
            if intensity > threshold(i % width, i / width) {
                0
            } else {
                255
            }
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const METHODS: [DitherMethod; 4] = [
        DitherMethod::JarvisJudiceNinke,
        DitherMethod::FloydSteinberg,
        DitherMethod::Simple2D,
        DitherMethod::Bayer,
    ];

    #[test]
    fn test_bayer_matrix_values() {
        let mut seen = [false; 64];
        for row in &BAYER8 {
            for &val in row {
                assert!(!seen[val as usize], "Duplicate value {}", val);
                seen[val as usize] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_kernels_sum_to_one() {
        for kernel in [FLOYD_STEINBERG, JARVIS_JUDICE_NINKE, SIMPLE_2D] {
            let sum: f32 = kernel.iter().map(|(_, _, w)| w).sum();
            assert!((sum - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_output_is_binary() {
        let gray: Vec<u8> = (0..32 * 16).map(|i| (i * 7 % 256) as u8).collect();
        for method in METHODS {
            let out = apply(method, 32, 16, &gray);
            assert_eq!(out.len(), gray.len());
            assert!(out.iter().all(|&v| v == 0 || v == 255), "{}", method);
        }
    }

    #[test]
    fn test_solid_extremes_preserved() {
        for method in METHODS {
            assert!(apply(method, 16, 16, &[0; 256]).iter().all(|&v| v == 0));
            assert!(apply(method, 16, 16, &[255; 256]).iter().all(|&v| v == 255));
        }
    }

    #[test]
    fn test_mid_gray_is_roughly_half_ink() {
        for method in METHODS {
            let out = apply(method, 32, 32, &[128; 1024]);
            let ink = out.iter().filter(|&&v| v == 0).count();
            assert!(ink > 384 && ink < 640, "{}: {} ink pixels", method, ink);
        }
    }

    #[test]
    fn test_none_passes_through() {
        let gray = vec![10, 128, 129, 250];
        assert_eq!(apply(DitherMethod::None, 2, 2, &gray), gray);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("floyd-steinberg".parse(), Ok(DitherMethod::FloydSteinberg));
        assert_eq!("JJN".parse(), Ok(DitherMethod::JarvisJudiceNinke));
        assert_eq!("grayscale".parse(), Ok(DitherMethod::None));
        assert!("blur".parse::<DitherMethod>().is_err());
        for method in METHODS {
            assert_eq!(method.name().parse(), Ok(method));
        }
    }
}
