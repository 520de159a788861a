//! Identity, symmetry and reference checks for the SSIM scorer.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use simmatch::{
    ColorMode, NormalizeConfig, NormalizedImage, Normalizer, ResizeFilter, Scorer, SsimParams,
};
use std::io::Cursor;

const TOL: f64 = 1e-6;

fn noise(seed: u64, width: u32, height: u32) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    RgbImage::from_fn(width, height, |_, _| {
        Rgb([rng.random::<u8>(), rng.random::<u8>(), rng.random::<u8>()])
    })
}

fn blobs(seed: u64, width: u32, height: u32) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let cx = rng.random_range(0..width) as f32;
    let cy = rng.random_range(0..height) as f32;
    let tint = rng.random::<u8>();
    RgbImage::from_fn(width, height, |x, y| {
        let d = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)).sqrt();
        let v = (255.0 - d * 3.0).clamp(0.0, 255.0) as u8;
        Rgb([v, v / 2 + tint / 2, 255 - v])
    })
}

fn encode(img: RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, format)
        .unwrap();
    buf.into_inner()
}

fn reference_ssim(a: &NormalizedImage, b: &NormalizedImage, params: &SsimParams) -> f64 {
    let win = params.win_size;
    let n = (win * win) as f64;
    let c1 = (params.k1 * params.data_range).powi(2);
    let c2 = (params.k2 * params.data_range).powi(2);
    let mut channel_total = 0.0;
    for c in 0..a.channels() {
        let mut total = 0.0;
        let mut count = 0usize;
        for y in 0..=a.height() - win {
            for x in 0..=a.width() - win {
                let mut wa = Vec::with_capacity(win * win);
                let mut wb = Vec::with_capacity(win * win);
                for dy in 0..win {
                    for dx in 0..win {
                        wa.push(f64::from(a.get(x + dx, y + dy, c).unwrap()));
                        wb.push(f64::from(b.get(x + dx, y + dy, c).unwrap()));
                    }
                }
                let ma = wa.iter().sum::<f64>() / n;
                let mb = wb.iter().sum::<f64>() / n;
                let mut va = 0.0;
                let mut vb = 0.0;
                let mut cov = 0.0;
                for (p, q) in wa.iter().zip(&wb) {
                    va += (p - ma) * (p - ma);
                    vb += (q - mb) * (q - mb);
                    cov += (p - ma) * (q - mb);
                }
                va /= n - 1.0;
                vb /= n - 1.0;
                cov /= n - 1.0;
                total += ((2.0 * ma * mb + c1) * (2.0 * cov + c2))
                    / ((ma * ma + mb * mb + c1) * (va + vb + c2));
                count += 1;
            }
        }
        channel_total += total / count as f64;
    }
    channel_total / a.channels() as f64
}

#[test]
fn identity_holds_for_decoded_images() {
    let normalizer = Normalizer::new(NormalizeConfig::default()).unwrap();
    let scorer = Scorer::new(SsimParams::default()).unwrap();
    for seed in 0..4 {
        for format in [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Bmp] {
            let bytes = encode(blobs(seed, 80, 60), format);
            let x = normalizer.normalize(&bytes).unwrap();
            let again = normalizer.normalize(&bytes).unwrap();
            let score = scorer.score(&x, &again).unwrap();
            assert!((score - 1.0).abs() < TOL, "seed {seed}: {score}");
        }
    }
}

#[test]
fn symmetry_holds_for_random_pairs() {
    let normalizer = Normalizer::new(NormalizeConfig::default()).unwrap();
    let scorer = Scorer::new(SsimParams::default()).unwrap();
    for seed in 0..6 {
        let a = normalizer
            .normalize(&encode(noise(seed, 50, 70), ImageFormat::Png))
            .unwrap();
        let b = normalizer
            .normalize(&encode(blobs(seed + 100, 120, 90), ImageFormat::Png))
            .unwrap();
        let ab = scorer.score(&a, &b).unwrap();
        let ba = scorer.score(&b, &a).unwrap();
        assert!((ab - ba).abs() < TOL, "seed {seed}: {ab} vs {ba}");
        assert!((-1.0..=1.0).contains(&ab));
    }
}

#[test]
fn scorer_matches_two_pass_reference() {
    let normalizer = Normalizer::new(NormalizeConfig {
        width: 24,
        height: 18,
        ..NormalizeConfig::default()
    })
    .unwrap();
    let params = SsimParams::default();
    let scorer = Scorer::new(params).unwrap();
    let a = normalizer
        .normalize(&encode(blobs(7, 40, 40), ImageFormat::Png))
        .unwrap();
    let b = normalizer
        .normalize(&encode(noise(8, 40, 40), ImageFormat::Png))
        .unwrap();

    let got = scorer.score(&a, &b).unwrap();
    let expected = reference_ssim(&a, &b, &params);
    assert!((got - expected).abs() < 1e-9, "got {got}, expected {expected}");
}

#[test]
fn uniform_images_follow_luminance_term() {
    let normalizer = Normalizer::new(NormalizeConfig {
        filter: ResizeFilter::Nearest,
        ..NormalizeConfig::default()
    })
    .unwrap();
    let scorer = Scorer::new(SsimParams::default()).unwrap();
    let a = normalizer
        .normalize(&encode(
            RgbImage::from_pixel(30, 30, Rgb([100, 100, 100])),
            ImageFormat::Png,
        ))
        .unwrap();
    let b = normalizer
        .normalize(&encode(
            RgbImage::from_pixel(30, 30, Rgb([110, 110, 110])),
            ImageFormat::Png,
        ))
        .unwrap();

    // Zero variance leaves only the luminance term.
    let va = f64::from(a.get(50, 50, 0).unwrap());
    let vb = f64::from(b.get(50, 50, 0).unwrap());
    assert!(a.as_planar().iter().all(|&v| f64::from(v) == va));
    assert!(b.as_planar().iter().all(|&v| f64::from(v) == vb));
    let c1 = (0.01f64 * 255.0).powi(2);
    let expected = (2.0 * va * vb + c1) / (va * va + vb * vb + c1);
    let got = scorer.score(&a, &b).unwrap();
    assert!((got - expected).abs() < 1e-9, "got {got}, expected {expected}");
}

#[test]
fn color_difference_is_visible_per_channel() {
    // Same luminance structure, swapped color channels: grayscale SSIM would
    // be close to 1, per-channel SSIM is not.
    let normalizer = Normalizer::new(NormalizeConfig::default()).unwrap();
    let scorer = Scorer::new(SsimParams::default()).unwrap();
    let base = blobs(3, 64, 64);
    let swapped = RgbImage::from_fn(64, 64, |x, y| {
        let p = base.get_pixel(x, y).0;
        Rgb([p[2], p[1], p[0]])
    });
    let a = normalizer.normalize(&encode(base, ImageFormat::Png)).unwrap();
    let b = normalizer
        .normalize(&encode(swapped, ImageFormat::Png))
        .unwrap();
    assert!(scorer.score(&a, &b).unwrap() < 0.9);
}

#[test]
fn luma_mode_keeps_invariants() {
    let normalizer = Normalizer::new(NormalizeConfig {
        color: ColorMode::Luma,
        ..NormalizeConfig::default()
    })
    .unwrap();
    let scorer = Scorer::new(SsimParams::default()).unwrap();
    let a = normalizer
        .normalize(&encode(blobs(11, 90, 90), ImageFormat::Png))
        .unwrap();
    let b = normalizer
        .normalize(&encode(noise(12, 90, 90), ImageFormat::Png))
        .unwrap();
    assert_eq!(a.channels(), 1);
    assert_eq!(scorer.score(&a, &a).unwrap(), 1.0);
    assert_eq!(scorer.score(&a, &b).unwrap(), scorer.score(&b, &a).unwrap());
}
