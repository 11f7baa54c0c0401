#[macro_use]
extern crate bencher;

extern crate giflzw;
use giflzw::prelude::*;

use bencher::Bencher;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;


fn noise(count: usize) -> Vec<u8> {
    let mut random = StdRng::seed_from_u64(0);
    (0 .. count).map(|_| random.random()).collect()
}

fn gradient(count: usize) -> Vec<u8> {
    (0 .. count).map(|index| (index / 1024 % 256) as u8).collect()
}

fn compress_with(bench: &mut Bencher, compression: Compression, pixels: &[u8]) {
    let min_code_size = MinCodeSize::MAX;
    let mut state = EncoderState::new();

    bench.iter(||{
        let compressed = state.compress(compression, min_code_size, pixels.iter().copied(), Vec::new()).unwrap();
        bencher::black_box(compressed);
    })
}

fn lzw_noise(bench: &mut Bencher) {
    compress_with(bench, Compression::LZW, &noise(1024 * 1024))
}

fn lzw_gradient(bench: &mut Bencher) {
    compress_with(bench, Compression::LZW, &gradient(1024 * 1024))
}

fn rle_gradient(bench: &mut Bencher) {
    compress_with(bench, Compression::RLE, &gradient(1024 * 1024))
}

fn uncompressed_noise(bench: &mut Bencher) {
    compress_with(bench, Compression::Uncompressed, &noise(1024 * 1024))
}

fn decompress_noise(bench: &mut Bencher) {
    let pixels = noise(1024 * 1024);
    let compressed = Compression::LZW.compress_to_vec(MinCodeSize::MAX, pixels.iter().copied()).unwrap();

    bench.iter(||{
        let decompressed = decompress(MinCodeSize::MAX, &compressed, pixels.len(), true).unwrap();
        bencher::black_box(decompressed);
    })
}

benchmark_group!(compress,
    lzw_noise,
    lzw_gradient,
    rle_gradient,
    uncompressed_noise,
    decompress_noise
);

benchmark_main!(compress);
