use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use hog_detect::core::types::{InterpolationFlag, Scalar, Size, ThresholdType};
use hog_detect::core::{Mat, MatDepth};
use hog_detect::imgproc::*;
use hog_detect::objdetect::block::BlockSpec;
use hog_detect::objdetect::descriptor::compute_block_descriptor;
use hog_detect::objdetect::detection::RawDetection;
use hog_detect::objdetect::gradient::{compute_gradient_field, Preprocessor};
use hog_detect::objdetect::nms::{mean_shift_nms, NmsConfig};
use hog_detect::objdetect::normalizer::Normalizer;
use hog_detect::objdetect::pyramid::{Pyramid, PyramidConfig};

fn bench_mat_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Mat Creation");

    for size in [100, 500, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("new", size), size, |b, &size| {
            b.iter(|| {
                Mat::new(black_box(size), black_box(size), black_box(3), black_box(MatDepth::U8))
            })
        });

        group.bench_with_input(BenchmarkId::new("with_default", size), size, |b, &size| {
            b.iter(|| {
                Mat::new_with_default(
                    black_box(size),
                    black_box(size),
                    black_box(3),
                    black_box(MatDepth::U8),
                    black_box(Scalar::all(128.0)),
                )
            })
        });
    }

    group.finish();
}

fn bench_mat_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("Mat Access");
    let mat = Mat::new_with_default(500, 500, 3, MatDepth::U8, Scalar::all(128.0)).unwrap();

    group.bench_function("sequential_read", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for row in 0..mat.rows() {
                for col in 0..mat.cols() {
                    let pixel = mat.at(black_box(row), black_box(col)).unwrap();
                    sum += pixel[0] as u64;
                }
            }
            black_box(sum)
        })
    });

    group.finish();
}

fn bench_blur(c: &mut Criterion) {
    let mut group = c.benchmark_group("Gaussian Blur");
    let img = Mat::new_with_default(512, 512, 3, MatDepth::U8, Scalar::all(128.0)).unwrap();

    for ksize in [3, 5, 7, 11].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(ksize), ksize, |b, &ksize| {
            b.iter(|| {
                let mut dst = Mat::new(1, 1, 1, MatDepth::U8).unwrap();
                gaussian_blur(&img, &mut dst, Size::new(ksize, ksize), 1.5).unwrap();
                black_box(dst)
            })
        });
    }

    group.finish();
}

fn bench_box_blur(c: &mut Criterion) {
    let mut group = c.benchmark_group("Box Blur");
    let img = Mat::new_with_default(512, 512, 3, MatDepth::U8, Scalar::all(128.0)).unwrap();

    for ksize in [3, 5, 7, 11].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(ksize), ksize, |b, &ksize| {
            b.iter(|| {
                let mut dst = Mat::new(1, 1, 1, MatDepth::U8).unwrap();
                blur(&img, &mut dst, Size::new(ksize, ksize)).unwrap();
                black_box(dst)
            })
        });
    }

    group.finish();
}

fn bench_median_blur(c: &mut Criterion) {
    let mut group = c.benchmark_group("Median Blur");
    let img = Mat::new_with_default(512, 512, 1, MatDepth::U8, Scalar::all(128.0)).unwrap();

    for ksize in [3, 5, 7].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(ksize), ksize, |b, &ksize| {
            b.iter(|| {
                let mut dst = Mat::new(1, 1, 1, MatDepth::U8).unwrap();
                median_blur(&img, &mut dst, ksize).unwrap();
                black_box(dst)
            })
        });
    }

    group.finish();
}

fn bench_resize(c: &mut Criterion) {
    let mut group = c.benchmark_group("Resize");
    let img = Mat::new_with_default(640, 480, 3, MatDepth::U8, Scalar::all(128.0)).unwrap();

    let sizes = [
        ("downscale_2x", 320, 240),
        ("downscale_4x", 160, 120),
        ("upscale_2x", 1280, 960),
    ];

    for &(name, width, height) in sizes.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &(width, height), |b, (w, h)| {
            b.iter(|| {
                let mut dst = Mat::new(1, 1, 1, MatDepth::U8).unwrap();
                resize(&img, &mut dst, Size::new(*w, *h), InterpolationFlag::Linear).unwrap();
                black_box(dst)
            })
        });
    }

    group.finish();
}

fn bench_threshold(c: &mut Criterion) {
    let mut group = c.benchmark_group("Threshold");
    let img = Mat::new_with_default(512, 512, 1, MatDepth::U8, Scalar::all(128.0)).unwrap();

    for thresh_type in [ThresholdType::Binary, ThresholdType::BinaryInv, ThresholdType::Trunc].iter() {
        let name = format!("{:?}", thresh_type);
        group.bench_with_input(BenchmarkId::from_parameter(&name), thresh_type, |b, &ttype| {
            b.iter(|| {
                let mut dst = Mat::new(1, 1, 1, MatDepth::U8).unwrap();
                threshold(&img, &mut dst, 127.0, 255.0, ttype).unwrap();
                black_box(dst)
            })
        });
    }

    group.finish();
}

fn bench_rotate(c: &mut Criterion) {
    let mut group = c.benchmark_group("Rotate");
    let img = Mat::new_with_default(512, 512, 3, MatDepth::U8, Scalar::all(128.0)).unwrap();

    group.bench_function("90cw", |b| {
        b.iter(|| {
            let mut dst = Mat::new(1, 1, 1, MatDepth::U8).unwrap();
            rotate(&img, &mut dst, RotateCode::Rotate90Clockwise).unwrap();
            black_box(dst)
        })
    });

    group.finish();
}

fn bench_gradient_field(c: &mut Criterion) {
    let mut group = c.benchmark_group("HOG Gradient Field");
    let img = Mat::new_with_default(128, 64, 3, MatDepth::U8, Scalar::all(128.0)).unwrap();

    group.bench_function("rgb_grad_64x128", |b| {
        b.iter(|| {
            let field = compute_gradient_field(&img, Preprocessor::RgbGrad, 0.0, true).unwrap();
            black_box(field)
        })
    });

    group.finish();
}

fn bench_block_descriptor(c: &mut Criterion) {
    let mut group = c.benchmark_group("HOG Block Descriptor");
    let img = Mat::new_with_default(128, 64, 3, MatDepth::U8, Scalar::all(128.0)).unwrap();
    let field = compute_gradient_field(&img, Preprocessor::RgbGrad, 0.0, true).unwrap();
    let spec = BlockSpec::new(8, 8, 2, 2, 9, true, 0.0, Normalizer::L2Hys, Preprocessor::RgbGrad, 0.0)
        .unwrap();

    group.bench_function("16x16_block", |b| {
        b.iter(|| black_box(compute_block_descriptor(&field, &spec, 0, 0).unwrap()))
    });

    group.finish();
}

fn bench_pyramid_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("HOG Scale Pyramid");
    let img = Mat::new_with_default(480, 640, 3, MatDepth::U8, Scalar::all(128.0)).unwrap();
    let config = PyramidConfig::new(1.05, 64, 128, 0, 0, 0, 0).unwrap();

    group.bench_function("640x480_ratio1.05", |b| {
        b.iter(|| black_box(Pyramid::build(&img, &config).unwrap()))
    });

    group.finish();
}

fn bench_mean_shift_nms(c: &mut Criterion) {
    let mut group = c.benchmark_group("HOG Mean-Shift NMS");
    let cfg = NmsConfig::default();

    let mut raw = Vec::new();
    for i in 0..200 {
        let cx = (i % 20) as f32 * 10.0;
        let cy = (i / 20) as f32 * 10.0;
        raw.push(RawDetection::new(cx, cy, 64.0, 128.0, 1.0, 1.0 + (i % 3) as f32 * 0.1));
    }

    group.bench_function("200_raw_detections", |b| {
        b.iter(|| black_box(mean_shift_nms(&raw, &cfg).unwrap()))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_mat_creation,
    bench_mat_access,
    bench_blur,
    bench_box_blur,
    bench_median_blur,
    bench_resize,
    bench_threshold,
    bench_rotate,
    bench_gradient_field,
    bench_block_descriptor,
    bench_pyramid_build,
    bench_mean_shift_nms,
);

criterion_main!(benches);
