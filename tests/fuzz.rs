//! Fuzzy testing.
//! Tries to discover panics with random and damaged compressed data.

use std::panic::catch_unwind;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

extern crate giflzw;
use giflzw::prelude::*;


fn check_no_panic(min_code_size: MinCodeSize, bytes: &[u8], pixel_count: usize) -> bool {
    let result = catch_unwind(move || {
        decompress(min_code_size, bytes, pixel_count, true)
            .and_then(|_| decompress(min_code_size, bytes, pixel_count, false))
    });

    // this should not panic, only err:
    match result {
        Ok(Err(Error::Invalid(_))) | Ok(Ok(_)) => true,

        Ok(Err(error)) => {
            println!("✗ Unexpected Error: {:?}", error);
            false
        },

        Err(_) => {
            println!("✗ Panic: {:?}", bytes);
            false
        },
    }
}

#[test]
pub fn random_bytes(){
    let mut random = StdRng::seed_from_u64(42);

    for _ in 0 .. 2000 {
        let min_code_size = MinCodeSize::new(random.random_range(2 ..= 8)).unwrap();
        let len = random.random_range(0 .. 600);

        let mut bytes: Vec<u8> = (0 .. len).map(|_| random.random()).collect();

        // often make the framing plausible, so that the codes are reached
        if random.random::<bool>() && !bytes.is_empty() {
            for chunk_start in (0 .. bytes.len()).step_by(200) {
                bytes[chunk_start] = (bytes.len() - chunk_start - 1).min(199) as u8;
            }

            bytes.push(0);
        }

        assert!(check_no_panic(min_code_size, &bytes, random.random_range(0 .. 4000)));
    }
}

#[test]
pub fn damaged_streams(){
    let mut random = StdRng::seed_from_u64(7);

    for _ in 0 .. 300 {
        let min_code_size = MinCodeSize::new(random.random_range(2 ..= 8)).unwrap();
        let colors = 1_u16 << min_code_size.bits();

        let pixels: Vec<u8> = (0 .. random.random_range(1 .. 5000))
            .map(|_| random.random_range(0 .. colors) as u8)
            .collect();

        let mut compressed = Compression::LZW.compress_to_vec(min_code_size, pixels.iter().copied()).unwrap();

        // flip some bits but keep the sub-block lengths intact
        for _ in 0 .. random.random_range(1 .. 8) {
            let index = random.random_range(0 .. compressed.len());
            if index % 255 != 0 { compressed[index] ^= 1 << random.random_range(0 .. 8_u32); }
        }

        if random.random::<bool>() {
            let cut = random.random_range(0 .. compressed.len());
            compressed.truncate(cut);
        }

        assert!(check_no_panic(min_code_size, &compressed, pixels.len()));
    }
}
