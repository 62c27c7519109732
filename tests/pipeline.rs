//! Pipeline behaviour: ordering under concurrency, callbacks, error
//! propagation, and graceful shutdown.

mod common;

use std::sync::{Arc, Mutex};

use common::Rng;
use turbosqueeze::{Compressor, Decompressor, Input, Output, TsqError, BLOCK_SZ};

fn roundtrip_via_pipeline(data: &[u8], workers: usize, ext: bool, level: u8) {
    let comp = Compressor::with_workers(workers, false).unwrap();
    let packed = comp.compress_buffer(data, ext, level).unwrap();
    let dec = Decompressor::with_workers(workers, false).unwrap();
    let unpacked = dec.decompress_buffer(&packed).unwrap();
    assert_eq!(
        unpacked.len(),
        data.len(),
        "workers={} ext={} level={}",
        workers,
        ext,
        level
    );
    assert_eq!(unpacked, data, "workers={} ext={} level={}", workers, ext, level);
}

#[test]
fn block_boundaries_survive_two_workers() {
    // Three full blocks of distinct fill; any ordering mistake scrambles
    // the boundaries.
    let mut data = vec![b'A'; BLOCK_SZ];
    data.extend(std::iter::repeat(b'B').take(BLOCK_SZ));
    data.extend(std::iter::repeat(b'C').take(BLOCK_SZ));
    roundtrip_via_pipeline(&data, 2, false, 0);
    roundtrip_via_pipeline(&data, 2, true, 1);
}

#[test]
fn ordering_holds_across_worker_counts_and_block_counts() {
    let mut rng = Rng::new(0xABCD);
    // Tagged blocks: each 64 KiB stripe starts with its index so a swap is
    // loud, with compressible filler behind it.
    let mut data = Vec::new();
    for stripe in 0u32..64 {
        data.extend_from_slice(&stripe.to_le_bytes());
        data.extend(turbosqueeze::lorem::generate(stripe as u64, 65_532));
    }
    assert_eq!(data.len(), 16 * BLOCK_SZ);
    for workers in [1usize, 2, 3, 5, 8] {
        roundtrip_via_pipeline(&data, workers, true, 0);
    }
    // Partial final block.
    data.truncate(7 * BLOCK_SZ + 12_345);
    for workers in [2usize, 4] {
        roundtrip_via_pipeline(&data, workers, false, 0);
    }
    // Single partial block.
    roundtrip_via_pipeline(&rng.bytes(1000), 4, true, 0);
}

#[test]
fn back_to_back_jobs_on_one_context_stay_separate() {
    let comp = Compressor::with_workers(3, false).unwrap();
    let dec = Decompressor::with_workers(2, false).unwrap();
    let inputs: Vec<Vec<u8>> = (0..6u64)
        .map(|s| turbosqueeze::lorem::generate(s, 300_000 + s as usize * 77))
        .collect();
    let packed: Vec<Vec<u8>> = inputs
        .iter()
        .map(|d| comp.compress_buffer(d, true, 0).unwrap())
        .collect();
    for (d, p) in inputs.iter().zip(&packed) {
        assert_eq!(&dec.decompress_buffer(p).unwrap(), d);
    }
}

#[test]
fn async_progress_is_monotonic_and_completes() {
    let data = turbosqueeze::lorem::generate(1, 5 * BLOCK_SZ + 1000);
    let comp = Compressor::with_workers(2, false).unwrap();

    let seen: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));
    let done: Arc<Mutex<Option<(u32, bool)>>> = Arc::new(Mutex::new(None));
    let (tx, rx) = crossbeam_channel::bounded::<()>(1);

    let out = Arc::new(Mutex::new(Vec::new()));
    let seen2 = seen.clone();
    let done2 = done.clone();
    let jobid = comp
        .compress_async(
            Input::Memory(data.clone().into()),
            Output::Memory(out.clone()),
            true,
            0,
            Some(Box::new(move |id, ok| {
                *done2.lock().unwrap() = Some((id, ok));
                let _ = tx.send(());
            })),
            Some(Box::new(move |_, ratio| {
                seen2.lock().unwrap().push(ratio);
            })),
        )
        .unwrap();

    rx.recv().unwrap();
    let progress = seen.lock().unwrap();
    assert_eq!(progress.len(), 6, "one call per block");
    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "not monotonic: {:?}", progress);
    assert!(progress.iter().all(|r| (0.0..=1.0).contains(r)));
    assert_eq!(*progress.last().unwrap(), 1.0);
    assert_eq!(*done.lock().unwrap(), Some((jobid, true)));

    // The progress callback finished strictly before the completion fired.
    drop(progress);
    let packed = out.lock().unwrap().clone();
    let dec = Decompressor::with_workers(2, false).unwrap();
    assert_eq!(dec.decompress_buffer(&packed).unwrap(), data);
}

#[test]
fn job_ids_are_distinct_and_increasing() {
    let comp = Compressor::with_workers(1, false).unwrap();
    let out1 = Arc::new(Mutex::new(Vec::new()));
    let out2 = Arc::new(Mutex::new(Vec::new()));
    let id1 = comp
        .compress_async(
            Input::Memory(vec![1u8; 100].into()),
            Output::Memory(out1),
            false,
            0,
            None,
            None,
        )
        .unwrap();
    let id2 = comp
        .compress_async(
            Input::Memory(vec![2u8; 100].into()),
            Output::Memory(out2),
            false,
            0,
            None,
            None,
        )
        .unwrap();
    assert!(id2 > id1);
    // Dropping the context waits for both jobs.
}

#[test]
fn empty_input_is_rejected_at_submission() {
    let comp = Compressor::with_workers(1, false).unwrap();
    let err = comp
        .compress_buffer(&[], false, 0)
        .expect_err("empty input must not be admitted");
    assert!(matches!(err, TsqError::InvalidArgument(_)));
}

#[test]
fn unsupported_level_is_rejected_at_submission() {
    let comp = Compressor::with_workers(1, false).unwrap();
    let err = comp.compress_buffer(b"data", false, 11).unwrap_err();
    assert!(matches!(err, TsqError::InvalidArgument(_)));
}

#[test]
fn invalid_worker_counts_are_rejected() {
    assert!(matches!(
        Compressor::with_workers(0, false),
        Err(TsqError::InvalidArgument(_))
    ));
    assert!(matches!(
        Decompressor::with_workers(0, false),
        Err(TsqError::InvalidArgument(_))
    ));
}

#[test]
fn missing_input_file_fails_at_submission() {
    let comp = Compressor::with_workers(1, false).unwrap();
    let out = Arc::new(Mutex::new(Vec::new()));
    let err = comp
        .compress(
            Input::Path("/definitely/not/here.bin".into()),
            Output::Memory(out),
            false,
            0,
        )
        .unwrap_err();
    assert!(matches!(err, TsqError::Io(_)));
}

#[test]
fn corrupt_container_magic_is_rejected() {
    let dec = Decompressor::with_workers(1, false).unwrap();
    let mut bogus = b"NOPE".to_vec();
    bogus.extend_from_slice(&[0u8; 20]);
    assert!(matches!(
        dec.decompress_buffer(&bogus),
        Err(TsqError::MalformedHeader)
    ));
    assert!(matches!(
        dec.decompress_buffer(&[1, 2, 3]),
        Err(TsqError::TruncatedInput)
    ));
}

#[test]
fn truncated_container_body_fails_the_job() {
    let comp = Compressor::with_workers(2, false).unwrap();
    let data = turbosqueeze::lorem::generate(9, 3 * BLOCK_SZ);
    let packed = comp.compress_buffer(&data, true, 0).unwrap();
    let dec = Decompressor::with_workers(2, false).unwrap();
    // Cut inside a block body: the job must fail, not hang.
    let cut = packed.len() / 2;
    assert!(matches!(
        dec.decompress_buffer(&packed[..cut]),
        Err(TsqError::JobFailed)
    ));
    // The context is still usable afterwards.
    assert_eq!(dec.decompress_buffer(&packed).unwrap(), data);
}

#[test]
fn corrupt_block_length_fails_the_job() {
    let comp = Compressor::with_workers(1, false).unwrap();
    let data = vec![0x33u8; BLOCK_SZ + 100];
    let mut packed = comp.compress_buffer(&data, false, 0).unwrap();
    // First block prefix right after the 16-byte container header: declare
    // a zero-length block.
    packed[16] = 0;
    packed[17] = 0;
    packed[18] = 0;
    let dec = Decompressor::with_workers(1, false).unwrap();
    assert!(matches!(
        dec.decompress_buffer(&packed),
        Err(TsqError::JobFailed)
    ));
}

#[test]
fn contexts_shut_down_cleanly_after_heavy_use() {
    for _ in 0..3 {
        let comp = Compressor::with_workers(4, false).unwrap();
        let data = turbosqueeze::lorem::generate(2, 2 * BLOCK_SZ + 7);
        let _ = comp.compress_buffer(&data, true, 0).unwrap();
        // Drop joins reader, workers, and writer without a timeout.
    }
    // A context that never ran a job also tears down cleanly.
    let idle = Compressor::with_workers(3, false).unwrap();
    drop(idle);
    let idle = Decompressor::with_workers(3, false).unwrap();
    drop(idle);
}

#[test]
fn container_header_records_blocks_and_total() {
    let comp = Compressor::with_workers(2, false).unwrap();
    let data = vec![9u8; 2 * BLOCK_SZ + 5];
    let packed = comp.compress_buffer(&data, false, 0).unwrap();
    assert_eq!(&packed[0..4], b"TSQ1");
    assert_eq!(u32::from_le_bytes(packed[4..8].try_into().unwrap()), 3);
    assert_eq!(
        u64::from_le_bytes(packed[8..16].try_into().unwrap()),
        data.len() as u64
    );
}
