use criterion::{Criterion, black_box, criterion_group, criterion_main};
use scan_pipeline::PixelBuffer;
use scan_pipeline::config::FilterConfig;
use scan_pipeline::filters::FilterChain;
use scan_pipeline::filters::blur::box_blur;
use scan_pipeline::filters::equalize::equalize;
use scan_pipeline::filters::grayscale::grayscale;
use scan_pipeline::filters::threshold::otsu_threshold;

fn noise_frame(width: u32, height: u32) -> PixelBuffer {
    let mut seed = 0x2545_f491u32;
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for _ in 0..width * height {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        let [r, g, b, _] = seed.to_le_bytes();
        data.extend_from_slice(&[r, g, b, 255]);
    }
    PixelBuffer::from_raw(width, height, data).unwrap()
}

fn bench_grayscale_medium(c: &mut Criterion) {
    let frame = noise_frame(640, 480);
    c.bench_function("grayscale_640x480", |b| {
        b.iter(|| {
            let mut buf = frame.clone();
            grayscale(black_box(&mut buf));
            buf
        })
    });
}

fn bench_equalize_medium(c: &mut Criterion) {
    let frame = noise_frame(640, 480);
    c.bench_function("equalize_640x480", |b| {
        b.iter(|| {
            let mut buf = frame.clone();
            equalize(black_box(&mut buf));
            buf
        })
    });
}

fn bench_otsu_large(c: &mut Criterion) {
    let frame = noise_frame(1920, 1080);
    c.bench_function("otsu_1920x1080", |b| b.iter(|| otsu_threshold(black_box(&frame))));
}

fn bench_blur_radius(c: &mut Criterion) {
    let frame = noise_frame(640, 480);
    for radius in [2u32, 10] {
        c.bench_function(&format!("box_blur_r{radius}_640x480"), |b| {
            b.iter(|| {
                let mut buf = frame.clone();
                box_blur(black_box(&mut buf), radius, 1);
                buf
            })
        });
    }
}

fn bench_default_chain(c: &mut Criterion) {
    let frame = noise_frame(1920, 1080);
    let chain = FilterChain::from_config(&FilterConfig::default());
    c.bench_function("default_chain_1920x1080", |b| {
        b.iter(|| {
            let mut buf = frame.clone();
            chain.apply(black_box(&mut buf));
            buf
        })
    });
}

criterion_group!(
    benches,
    bench_grayscale_medium,
    bench_equalize_medium,
    bench_otsu_large,
    bench_blur_radius,
    bench_default_chain
);
criterion_main!(benches);
