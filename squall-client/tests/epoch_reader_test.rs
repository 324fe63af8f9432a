// Copyright 2025 OPPO.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use bytes::{Buf, BufMut, BytesMut};
use squall_client::compress::Lz4Compressor;
use squall_client::stream::{EpochReader, PartitionLocator, StaticPartitionLocator};
use squall_client::test::{EpochFile, EpochWorker, FaultPolicy, WorkerState};
use squall_client::ClientContext;
use squall_common::conf::ClientConf;
use squall_common::error::ShuffleError;
use squall_common::state::{CommittedPartitionInfo, ShuffleMode};
use squall_common::ShuffleResult;
use srpc::common::Utils;
use srpc::io::net::NetAddr;
use std::fs;
use std::sync::Arc;

const NUM_RECORDS: usize = 100;

// One partition file on local disk: length-prefixed records, chunk offsets
// at record boundaries.
struct TestFile {
    path: String,
    offsets: Vec<i64>,
    length: i64,
    records: Vec<String>,
}

// Write NUM_RECORDS random records, records_per_chunk records per chunk.
fn write_records(records_per_chunk: usize) -> TestFile {
    let mut buf = BytesMut::new();
    let mut offsets = vec![0i64];
    let mut records = Vec::with_capacity(NUM_RECORDS);

    for i in 0..NUM_RECORDS {
        let content = Utils::rand_str(1024 + (i * 37) % 1024);
        buf.put_i32_le(content.len() as i32);
        buf.put_slice(content.as_bytes());
        records.push(content);

        if (i + 1) % records_per_chunk == 0 || i + 1 == NUM_RECORDS {
            offsets.push(buf.len() as i64);
        }
    }

    let path = Utils::temp_file();
    fs::write(&path, &buf).unwrap();

    TestFile {
        path,
        length: buf.len() as i64,
        offsets,
        records,
    }
}

fn gen_records() -> Vec<String> {
    (0..NUM_RECORDS)
        .map(|i| Utils::rand_str(1024 + (i * 37) % 1024))
        .collect()
}

// The given records framed through the block codec, one frame per record and
// one chunk per frame.
fn write_framed_records(records: &[String], corrupt_from_frame: Option<usize>) -> TestFile {
    let mut compressor = Lz4Compressor::with_block_size(64 * 1024, false);
    let mut buf = BytesMut::new();
    let mut offsets = vec![0i64];

    for (i, content) in records.iter().enumerate() {
        let mut record = BytesMut::new();
        record.put_i32_le(content.len() as i32);
        record.put_slice(content.as_bytes());

        compressor.compress(&record);
        let frame_start = buf.len();
        buf.put_slice(compressor.compressed_data());

        if corrupt_from_frame.is_some_and(|from| i >= from) {
            // Zero the checksum field at offset 17 of the frame.
            for b in &mut buf[frame_start + 17..frame_start + 21] {
                *b = 0;
            }
        }

        offsets.push(buf.len() as i64);
    }

    let path = Utils::temp_file();
    fs::write(&path, &buf).unwrap();

    TestFile {
        path,
        length: buf.len() as i64,
        offsets,
        records: records.to_vec(),
    }
}

fn test_conf() -> ClientConf {
    let mut conf = ClientConf {
        chunk_fetch_retry_max_times: 3,
        chunk_fetch_retry_wait_str: "5ms".to_string(),
        compression_enabled: false,
        conn_retry_max_times: 1,
        conn_retry_wait_ms: 50,
        conn_timeout_ms: 5000,
        ..Default::default()
    };
    conf.init().unwrap();
    conf
}

fn start_worker() -> (NetAddr, Arc<WorkerState>) {
    let worker = EpochWorker::new();
    let addr = worker.bind_addr().clone();
    let state = worker.state();
    worker.start(0);
    (addr, state)
}

fn piece(addr: &NetAddr, file_path: &str, file_length: i64) -> CommittedPartitionInfo {
    CommittedPartitionInfo::new(
        0,
        0,
        addr.host.clone(),
        addr.port,
        ShuffleMode::Disk,
        file_path,
        file_length,
    )
}

// Drain the reader and pull the length-prefixed records out of the yielded
// buffers; chunk boundaries fall on record boundaries here.
async fn read_records(reader: &mut EpochReader) -> ShuffleResult<Vec<String>> {
    let mut records = Vec::new();
    let mut pending = BytesMut::new();

    while reader.has_next() {
        let chunk = reader.next().await?;
        pending.extend_from_slice(&chunk);

        while pending.len() >= 4 {
            let len = (&pending[..4]).get_i32_le() as usize;
            if pending.len() < 4 + len {
                break;
            }
            pending.advance(4);
            let content = pending.split_to(len);
            records.push(String::from_utf8_lossy(&content).to_string());
        }
    }

    Ok(records)
}

fn assert_drained(records: Vec<String>, origin: &[String]) {
    let mut origin_list: Vec<String> = origin.to_vec();
    for content in records {
        let pos = origin_list
            .iter()
            .position(|x| *x == content)
            .expect("record not written by the mapper side");
        origin_list.remove(pos);
    }
    assert_eq!(origin_list.len(), 0);
}

// Failover restarts the scan at chunk 0, so the caller may legitimately see
// the prefix delivered before the switch a second time. Everything delivered
// must have been written, and everything written must arrive.
fn assert_covers(records: Vec<String>, origin: &[String]) {
    for content in &records {
        assert!(
            origin.contains(content),
            "record not written by the mapper side"
        );
    }
    for content in origin {
        assert!(records.contains(content), "record lost");
    }
}

#[test]
fn happy_path_single_piece() {
    let (addr, state) = start_worker();
    let file = write_records(10);
    state.register_file(
        "HappyPath",
        "FILE-0",
        EpochFile::new(&file.path, file.offsets.clone(), file.length),
        FaultPolicy::default(),
    );

    let context = ClientContext::new(test_conf());
    let rt = context.clone_runtime();

    rt.block_on(async {
        let pieces = vec![piece(&addr, "FILE-0", file.length)];
        let mut reader = EpochReader::create(context.clone(), "HappyPath", pieces).unwrap();

        let records = read_records(&mut reader).await.unwrap();
        assert_drained(records, &file.records);
        assert!(!reader.has_next());
        // One call past the end is the typed drained error, not a failure.
        let err = reader.next().await.unwrap_err();
        assert!(matches!(err, ShuffleError::ReaderDrained));
        reader.close().await;
    });

    // 10 chunks, one fetch each, one open, no retries.
    assert_eq!(state.open_count("HappyPath", "FILE-0"), 1);
    for chunk in 0..10 {
        assert_eq!(state.fetch_count("HappyPath", "FILE-0", chunk), 1);
    }
}

#[test]
fn mid_stream_chunk_retry() {
    let (addr, state) = start_worker();
    let file = write_records(1);
    // Chunk 10 fails twice, the third attempt succeeds; N = 3 allows it.
    state.register_file(
        "RetryChunkFetcher",
        "FILE-0",
        EpochFile::new(&file.path, file.offsets.clone(), file.length),
        FaultPolicy::fail_chunk(10, 2),
    );

    let context = ClientContext::new(test_conf());
    let rt = context.clone_runtime();

    rt.block_on(async {
        let pieces = vec![piece(&addr, "FILE-0", file.length)];
        let mut reader =
            EpochReader::create(context.clone(), "RetryChunkFetcher", pieces).unwrap();

        let records = read_records(&mut reader).await.unwrap();
        assert_drained(records, &file.records);
        reader.close().await;
    });

    // open; fetch 0..=9; fetch 10 fails -> re-open at 10; fails -> re-open;
    // the third fetch succeeds and the scan continues to chunk 99.
    assert_eq!(state.open_count("RetryChunkFetcher", "FILE-0"), 3);
    assert_eq!(state.fetch_count("RetryChunkFetcher", "FILE-0", 10), 3);
    assert_eq!(state.fetch_count("RetryChunkFetcher", "FILE-0", 9), 1);
    assert_eq!(state.fetch_count("RetryChunkFetcher", "FILE-0", 11), 1);
}

#[test]
fn failover_on_stream_open() {
    let (addr, state) = start_worker();
    let file = write_records(1);
    state.register_file(
        "EpochFetch",
        "FILE-SLAVE",
        EpochFile::new(&file.path, file.offsets.clone(), file.length),
        FaultPolicy::default(),
    );

    let context = ClientContext::new(test_conf());
    let rt = context.clone_runtime();

    rt.block_on(async {
        // Piece 0 points at a dead port with a bogus file; piece 1 is valid.
        let dead = CommittedPartitionInfo::new(
            0,
            0,
            addr.host.clone(),
            54321,
            ShuffleMode::Disk,
            "NeverMind",
            100000,
        );
        let pieces = vec![dead, piece(&addr, "FILE-SLAVE", file.length)];
        let mut reader = EpochReader::create(context.clone(), "EpochFetch", pieces).unwrap();

        let records = read_records(&mut reader).await.unwrap();
        assert_drained(records, &file.records);
        reader.close().await;
    });

    assert_eq!(state.open_count("EpochFetch", "FILE-SLAVE"), 1);
}

#[test]
fn injected_open_failure_skips_the_piece() {
    let (addr, state) = start_worker();
    let file = write_records(1);
    // Piece 0 rejects the open once; opens are never retried against the
    // same piece, so one attempt is all it gets.
    state.register_file(
        "OpenFault",
        "FILE-MASTER",
        EpochFile::new(&file.path, file.offsets.clone(), file.length),
        FaultPolicy::fail_open(1),
    );
    state.register_file(
        "OpenFault",
        "FILE-SLAVE",
        EpochFile::new(&file.path, file.offsets.clone(), file.length),
        FaultPolicy::default(),
    );

    let context = ClientContext::new(test_conf());
    let rt = context.clone_runtime();

    rt.block_on(async {
        let pieces = vec![
            piece(&addr, "FILE-MASTER", file.length),
            piece(&addr, "FILE-SLAVE", file.length),
        ];
        let mut reader = EpochReader::create(context.clone(), "OpenFault", pieces).unwrap();

        let records = read_records(&mut reader).await.unwrap();
        // No chunk was delivered before the switch, the drain is exact.
        assert_drained(records, &file.records);
        reader.close().await;
    });

    assert_eq!(state.open_count("OpenFault", "FILE-MASTER"), 1);
    assert_eq!(state.fetch_count("OpenFault", "FILE-MASTER", 0), 0);
    assert_eq!(state.open_count("OpenFault", "FILE-SLAVE"), 1);
}

#[test]
fn failover_after_retry_budget() {
    let (addr, state) = start_worker();
    let file = write_records(1);
    // Piece 0 always fails at chunk 5; piece 1 serves cleanly.
    state.register_file(
        "BudgetFailover",
        "FILE-MASTER",
        EpochFile::new(&file.path, file.offsets.clone(), file.length),
        FaultPolicy::fail_chunk(5, u32::MAX),
    );
    state.register_file(
        "BudgetFailover",
        "FILE-SLAVE",
        EpochFile::new(&file.path, file.offsets.clone(), file.length),
        FaultPolicy::default(),
    );

    let context = ClientContext::new(test_conf());
    let rt = context.clone_runtime();

    rt.block_on(async {
        let pieces = vec![
            piece(&addr, "FILE-MASTER", file.length),
            piece(&addr, "FILE-SLAVE", file.length),
        ];
        let mut reader =
            EpochReader::create(context.clone(), "BudgetFailover", pieces).unwrap();

        let records = read_records(&mut reader).await.unwrap();
        // Chunks 0..=4 of piece 0 arrived before the switch; piece 1 then
        // serves its full content.
        assert_covers(records, &file.records);
        reader.close().await;
    });

    // Piece 0 consumed its whole budget: N fetches of chunk 5 across N opens.
    assert_eq!(state.fetch_count("BudgetFailover", "FILE-MASTER", 5), 3);
    assert_eq!(state.open_count("BudgetFailover", "FILE-MASTER"), 3);
    assert_eq!(state.open_count("BudgetFailover", "FILE-SLAVE"), 1);
}

#[test]
fn total_exhaustion() {
    let (addr, state) = start_worker();
    let file = write_records(1);
    for file_path in ["FILE-MASTER", "FILE-SLAVE"] {
        state.register_file(
            "Exhausted",
            file_path,
            EpochFile::new(&file.path, file.offsets.clone(), file.length),
            FaultPolicy::fail_chunk(5, u32::MAX),
        );
    }

    let context = ClientContext::new(test_conf());
    let rt = context.clone_runtime();

    rt.block_on(async {
        let pieces = vec![
            piece(&addr, "FILE-MASTER", file.length),
            piece(&addr, "FILE-SLAVE", file.length),
        ];
        let mut reader = EpochReader::create(context.clone(), "Exhausted", pieces).unwrap();

        // A partial prefix of chunks is delivered, then the epoch fails.
        let mut yielded = 0;
        let err = loop {
            match reader.next().await {
                Ok(_) => yielded += 1,
                Err(e) => break e,
            }
        };

        assert!(matches!(err, ShuffleError::EpochExhausted(_)));
        // Chunks 0..=4 from each piece.
        assert_eq!(yielded, 10);
        reader.close().await;
    });
}

#[test]
fn codec_corruption_drives_failover() {
    let (addr, state) = start_worker();
    // Piece 0 is persistently corrupt from frame 50 on; piece 1 holds the
    // same records uncorrupted.
    let records = gen_records();
    let corrupt = write_framed_records(&records, Some(50));
    let clean = write_framed_records(&records, None);
    state.register_file(
        "Corrupt",
        "FILE-MASTER",
        EpochFile::new(&corrupt.path, corrupt.offsets.clone(), corrupt.length),
        FaultPolicy::default(),
    );
    state.register_file(
        "Corrupt",
        "FILE-SLAVE",
        EpochFile::new(&clean.path, clean.offsets.clone(), clean.length),
        FaultPolicy::default(),
    );

    let mut conf = test_conf();
    conf.compression_enabled = true;
    let context = ClientContext::new(conf);
    let rt = context.clone_runtime();

    rt.block_on(async {
        let pieces = vec![
            piece(&addr, "FILE-MASTER", corrupt.length),
            piece(&addr, "FILE-SLAVE", clean.length),
        ];
        let mut reader = EpochReader::create(context.clone(), "Corrupt", pieces).unwrap();

        let records = read_records(&mut reader).await.unwrap();
        assert_covers(records, &clean.records);
        reader.close().await;
    });

    // The corrupt chunk burned the piece's whole budget before failover.
    assert_eq!(state.fetch_count("Corrupt", "FILE-MASTER", 50), 3);
    assert_eq!(state.open_count("Corrupt", "FILE-SLAVE"), 1);
}

#[test]
fn close_is_idempotent() {
    let (addr, state) = start_worker();
    let file = write_records(10);
    state.register_file(
        "CloseTwice",
        "FILE-0",
        EpochFile::new(&file.path, file.offsets.clone(), file.length),
        FaultPolicy::default(),
    );

    let context = ClientContext::new(test_conf());
    let rt = context.clone_runtime();

    rt.block_on(async {
        let pieces = vec![piece(&addr, "FILE-0", file.length)];
        let mut reader = EpochReader::create(context.clone(), "CloseTwice", pieces).unwrap();

        // Close mid-stream with a live server-side cursor.
        let _ = reader.next().await.unwrap();
        reader.close().await;
        assert!(!reader.has_next());

        reader.close().await;
        assert!(!reader.has_next());

        let err = reader.next().await.unwrap_err();
        assert!(matches!(err, ShuffleError::ReaderClosed));
    });

    // The worker-side stream state was released by close.
    assert_eq!(state.live_streams(), 0);
}

#[test]
fn born_empty_and_invalid_arguments() {
    let context = ClientContext::new(test_conf());
    let rt = context.clone_runtime();

    rt.block_on(async {
        // No pieces: born exhausted.
        let mut reader = EpochReader::create(context.clone(), "Empty", vec![]).unwrap();
        assert!(!reader.has_next());
        let err = reader.next().await.unwrap_err();
        assert!(matches!(err, ShuffleError::EpochExhausted(_)));
        reader.close().await;

        // Zero-length content: born drained, no io happens; next() past the
        // end is a typed misuse error.
        let addr = NetAddr::new("127.0.0.1", 54321);
        let empty = piece(&addr, "FILE-0", 0);
        let mut reader = EpochReader::create(context.clone(), "ZeroLen", vec![empty]).unwrap();
        assert!(!reader.has_next());
        let err = reader.next().await.unwrap_err();
        assert!(matches!(err, ShuffleError::ReaderDrained));

        // Empty shuffle key is a caller bug.
        let err = EpochReader::create(context.clone(), "", vec![]).unwrap_err();
        assert!(matches!(err, ShuffleError::InvalidArgument(_)));
    });
}

#[test]
fn local_fetch_is_unsupported() {
    let mut conf = test_conf();
    conf.local_chunk_fetch_enabled = true;
    let context = ClientContext::new(conf);

    let err = EpochReader::create(context, "Local", vec![]).unwrap_err();
    assert!(matches!(err, ShuffleError::Unsupported(_)));
}

#[test]
fn locator_feeds_the_reader() {
    let (addr, state) = start_worker();
    let file = write_records(10);
    state.register_file(
        "Located",
        "FILE-0",
        EpochFile::new(&file.path, file.offsets.clone(), file.length),
        FaultPolicy::default(),
    );

    let locator = StaticPartitionLocator::new();
    locator.register("Located", 7, vec![piece(&addr, "FILE-0", file.length)]);

    let context = ClientContext::new(test_conf());
    let rt = context.clone_runtime();

    rt.block_on(async {
        let pieces = locator.committed_partitions("Located", 7).unwrap();
        let mut reader = EpochReader::create(context.clone(), "Located", pieces).unwrap();
        let records = read_records(&mut reader).await.unwrap();
        assert_drained(records, &file.records);
        reader.close().await;

        assert!(locator.committed_partitions("Located", 8).is_err());
    });
}

#[test]
fn blocking_reader_api() {
    let (addr, state) = start_worker();
    let file = write_records(10);
    state.register_file(
        "Blocking",
        "FILE-0",
        EpochFile::new(&file.path, file.offsets.clone(), file.length),
        FaultPolicy::default(),
    );

    let context = ClientContext::new(test_conf());
    let rt = context.clone_runtime();

    let pieces = vec![piece(&addr, "FILE-0", file.length)];
    let mut reader = EpochReader::create(context.clone(), "Blocking", pieces).unwrap();

    let mut total = 0usize;
    while reader.has_next() {
        let chunk: BytesMut = reader.blocking_next(&rt).unwrap();
        total += chunk.len();
    }
    assert_eq!(total as i64, file.length);
    reader.blocking_close(&rt);
}
