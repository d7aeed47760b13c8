use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lighthouse_vision::{BrightnessScanner, ChannelLayout, PixelBuffer};

fn gradient_frame(width: u32, height: u32) -> Vec<u8> {
    let mut data = vec![255u8; (width * height * 4) as usize];
    for (i, pixel) in data.chunks_exact_mut(4).enumerate() {
        let v = (i % 251) as u8;
        pixel[..3].copy_from_slice(&[v, v / 2, 255 - v]);
    }
    data
}

fn bench_scan(c: &mut Criterion) {
    let (width, height) = (1080, 1920);
    let data = gradient_frame(width, height);
    let frame = PixelBuffer::packed(&data, width, height, ChannelLayout::RGBA8).unwrap();
    let scanner = BrightnessScanner::default();

    c.bench_function("scan_1080x1920_rgba", |b| {
        b.iter(|| scanner.scan(black_box(&frame)))
    });
}

criterion_group!(benches, bench_scan);
criterion_main!(benches);
