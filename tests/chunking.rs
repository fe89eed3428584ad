//! Chunk framing idempotence across the split-boundary sizes.

use factsave::chunk::{compress_chunks, decompress_chunks, MAX_CHUNK_SIZE, PACKAGE_MAGIC};

fn payload(len: usize) -> Vec<u8> {
    // Deterministic but non-repeating enough that deflate can't collapse it
    // to nothing.
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add((i >> 8) as u8))
        .collect()
}

/// Walk the chunk headers without inflating anything.
fn chunk_count(framed: &[u8]) -> usize {
    // magic + magic + reserved + max_chunk + format + two length pairs
    const HEADER_LEN: usize = 4 + 4 + 1 + 8 + 4 + 32;
    let mut pos = 0;
    let mut count = 0;
    while pos < framed.len() {
        assert_eq!(
            framed[pos..pos + 4],
            PACKAGE_MAGIC.to_le_bytes(),
            "chunk {count} does not start with the package magic"
        );
        let compressed =
            u64::from_le_bytes(framed[pos + 21..pos + 29].try_into().unwrap()) as usize;
        pos += HEADER_LEN + compressed;
        count += 1;
    }
    assert_eq!(pos, framed.len());
    count
}

#[test]
fn framing_is_idempotent_across_boundary_sizes() {
    let cap = MAX_CHUNK_SIZE as usize;
    for (len, expected_chunks) in [
        (0, 0),
        (1, 1),
        (cap - 1, 1),
        (cap, 1),
        (cap + 1, 2),
        (500_000, 4),
    ] {
        let data = payload(len);
        let framed = compress_chunks(&data).unwrap();
        assert_eq!(
            chunk_count(&framed),
            expected_chunks,
            "chunk count for payload of {len} bytes"
        );
        assert_eq!(
            decompress_chunks(&framed).unwrap(),
            data,
            "round trip for payload of {len} bytes"
        );
    }
}

#[test]
fn truncated_final_chunk_is_fatal() {
    let framed = compress_chunks(&payload(1000)).unwrap();
    assert!(decompress_chunks(&framed[..framed.len() - 1]).is_err());
}

#[test]
fn trailing_garbage_after_last_chunk_is_fatal() {
    let mut framed = compress_chunks(&payload(1000)).unwrap();
    framed.extend_from_slice(&[0u8; 4]);
    // Four zero bytes can't open a chunk header; the loop must reject them
    // rather than return the good chunks and drop the rest.
    assert!(decompress_chunks(&framed).is_err());
}
