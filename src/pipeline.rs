//! The streaming alignment pipeline.
//!
//! One reader thread walks the query FASTA and the mapping file in
//! lock-step and feeds work units onto a bounded queue; a pool of worker
//! threads runs the pairwise kernel; a writer thread appends formatted
//! records to the output stream. Termination follows the two-level flag
//! protocol: a worker leaves once the work queue is empty with
//! `reader_done` set, and the writer leaves once the output queue is empty
//! with every worker stopped. The work queue may still hold items after
//! the reader exits, so both levels are required.

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::cigar;
use crate::error::AlignError;
use crate::fasta::FastaReader;
use crate::kernel::{self, PairwiseAligner};
use crate::paf::{MappingRecord, Strand};
use crate::params::Params;
use crate::refindex::ReferenceIndex;
use crate::utils;

/// Capacity of the work and output queues. Producers block when full.
pub const QUEUE_CAPACITY: usize = 1 << 17;

/// Poll interval for consumers waiting on an empty queue.
const POLL_WAIT: Duration = Duration::from_micros(100);

/// One alignment task: a parsed mapping, its raw line, and an owned copy
/// of the full query sequence. Ownership moves through the queue to the
/// worker that dequeues it, so the reader can advance to the next query
/// without pinning FASTA buffers.
pub struct WorkUnit {
    pub record: MappingRecord,
    pub line: String,
    pub query: Vec<u8>,
}

/// Counters reported after a completed run.
#[derive(Debug, Default, Clone, Copy)]
pub struct PipelineStats {
    /// Work units handed to the worker pool.
    pub enqueued: u64,
    /// Alignment records written out.
    pub written: u64,
    /// Records the kernel rejected (bounded search exhausted).
    pub rejected: u64,
}

/// First fatal error captured by any pipeline thread.
struct ErrorSlot(Mutex<Option<AlignError>>);

impl ErrorSlot {
    fn new() -> Self {
        Self(Mutex::new(None))
    }

    fn record(&self, err: AlignError) {
        let mut slot = self.0.lock().unwrap();
        if slot.is_none() {
            *slot = Some(err);
        } else {
            log::debug!("suppressing subsequent error: {err}");
        }
    }

    fn take(&self) -> Option<AlignError> {
        self.0.lock().unwrap().take()
    }
}

fn next_mapping(
    lines: &mut Lines<BufReader<File>>,
    path: &Path,
) -> Result<Option<(MappingRecord, String)>, AlignError> {
    match lines.next() {
        None => Ok(None),
        Some(Err(e)) => Err(AlignError::InputOpen {
            path: path.to_path_buf(),
            source: e,
        }),
        Some(Ok(line)) => {
            let record = MappingRecord::parse(&line)?;
            Ok(Some((record, line)))
        }
    }
}

/// Two-pointer lock-step walk over the query FASTA(s) and the mapping
/// stream. Both are grouped and ordered by query id, so one sequential
/// pass over each suffices: a held mapping whose id does not match the
/// current query belongs to a later query, and a query with no matching
/// mapping simply has none.
fn read_all(
    params: &Params,
    tx: &Sender<WorkUnit>,
    enqueued: &mut u64,
) -> Result<(), AlignError> {
    let file = File::open(&params.mappings).map_err(|e| AlignError::InputOpen {
        path: params.mappings.clone(),
        source: e,
    })?;
    let mut mappings = BufReader::new(file).lines();
    let mut held: Option<(MappingRecord, String)> = None;
    let mut exhausted = false;

    'queries: for path in &params.query_files {
        log::debug!("parsing query sequences in {}", path.display());
        let mut reader = FastaReader::open(path)?;

        while let Some(query) = reader.next_record()? {
            if held.is_none() {
                if exhausted {
                    break 'queries;
                }
                match next_mapping(&mut mappings, &params.mappings)? {
                    Some(pair) => held = Some(pair),
                    None => break 'queries,
                }
            }

            // Enqueue every contiguous mapping for this query; the first
            // mismatching line is retained for a later query.
            while held
                .as_ref()
                .is_some_and(|(rec, _)| rec.query_id == query.id)
            {
                let (record, line) = held.take().unwrap();
                log::trace!("queueing mapping: {line}");
                let unit = WorkUnit {
                    record,
                    line,
                    query: query.seq.clone(),
                };
                if tx.send(unit).is_err() {
                    // Consumers went away; the fatal cause is already in
                    // the error slot.
                    return Ok(());
                }
                *enqueued += 1;
                match next_mapping(&mut mappings, &params.mappings)? {
                    Some(pair) => held = Some(pair),
                    None => exhausted = true,
                }
            }
        }
    }
    Ok(())
}

fn reader_loop(
    params: &Params,
    tx: Sender<WorkUnit>,
    reader_done: &AtomicBool,
    errors: &ErrorSlot,
) -> u64 {
    let mut enqueued = 0u64;
    let result = read_all(params, &tx, &mut enqueued);
    // Set the flag on every exit path; workers drain whatever is queued.
    reader_done.store(true, Ordering::Release);
    if let Err(e) = result {
        errors.record(e);
    }
    log::debug!("[reader] exiting after {enqueued} work units");
    enqueued
}

/// Render the divergence tag value the way downstream consumers of this
/// format have always seen it: six significant digits with trailing zeros
/// trimmed, switching to scientific notation below 1e-4 (stream-default
/// float formatting).
fn format_divergence(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let exponent = value.abs().log10().floor() as i32;
    if exponent < -4 {
        let s = format!("{:.5e}", value);
        let (mantissa, exp) = s.split_once('e').unwrap();
        let mantissa = mantissa.trim_end_matches('0').trim_end_matches('.');
        let exp: i32 = exp.parse().unwrap();
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", mantissa, sign, exp.abs());
    }
    let decimals = (5 - exponent).max(0) as usize;
    let mut s = format!("{:.*}", decimals, value);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    s
}

/// Align one work unit and format its output record. Returns an empty
/// string when the kernel rejects the record; the writer discards those.
fn align_unit(
    unit: &WorkUnit,
    index: &ReferenceIndex,
    aligner: &dyn PairwiseAligner,
    percentage_identity: f32,
    rejected: &mut u64,
) -> String {
    let record = &unit.record;
    let reference = index.get(&record.ref_id);
    assert!(
        record.r_end < reference.len(),
        "mapping window exceeds reference sequence {}",
        record.ref_id
    );
    assert!(
        record.q_end < unit.query.len(),
        "mapping window exceeds query sequence {}",
        record.query_id
    );

    let ref_region = &reference[record.r_start..=record.r_end];
    let query_region = &unit.query[record.q_start..=record.q_end];

    // The kernel expects a contiguous strand-oriented window.
    let oriented: Vec<u8> = match record.strand {
        Strand::Forward => query_region.to_vec(),
        Strand::Reverse => utils::reverse_complement(query_region),
    };

    let max_edits = if percentage_identity == 0.0 {
        None
    } else {
        let fraction = 1.0 - f64::from(percentage_identity) / 100.0;
        Some((fraction * record.query_span() as f64) as u32)
    };

    match aligner.align(&oriented, ref_region, max_edits) {
        Some(path) => {
            let alignment_length = path.alignment_length();
            let divergence = f64::from(path.edit_distance) / f64::from(alignment_length);
            format!(
                "{}\ted:i:{}\tal:i{}\tad:f:{}\tcg:Z:{}\n",
                unit.line,
                path.edit_distance,
                alignment_length,
                format_divergence(divergence),
                cigar::to_string(&path.ops),
            )
        }
        None => {
            *rejected += 1;
            String::new()
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn worker_loop(
    tid: usize,
    rx: &Receiver<WorkUnit>,
    tx: &Sender<String>,
    index: &ReferenceIndex,
    aligner: &dyn PairwiseAligner,
    percentage_identity: f32,
    reader_done: &AtomicBool,
    working: &AtomicBool,
) -> u64 {
    let mut rejected = 0u64;
    loop {
        match rx.try_recv() {
            Ok(unit) => {
                let out = align_unit(&unit, index, aligner, percentage_identity, &mut rejected);
                if tx.send(out).is_err() {
                    // Writer went away after a fatal output error.
                    break;
                }
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {
                if reader_done.load(Ordering::Acquire) {
                    break;
                }
                thread::sleep(POLL_WAIT);
            }
        }
    }
    log::debug!("[worker {tid}] exiting, {rejected} rejected alignments");
    working.store(false, Ordering::Release);
    rejected
}

fn writer_loop(
    rx: &Receiver<String>,
    out: &mut BufWriter<File>,
    working: &[AtomicBool],
    errors: &ErrorSlot,
) -> u64 {
    let all_stopped =
        |flags: &[AtomicBool]| flags.iter().all(|w| !w.load(Ordering::Acquire));

    let mut written = 0u64;
    loop {
        match rx.try_recv() {
            Ok(line) => {
                if line.is_empty() {
                    continue; // kernel-rejected record
                }
                if let Err(e) = out.write_all(line.as_bytes()) {
                    errors.record(AlignError::OutputWrite(e));
                    break;
                }
                written += 1;
            }
            Err(_) => {
                if all_stopped(working) {
                    break;
                }
                thread::sleep(POLL_WAIT);
            }
        }
    }
    if let Err(e) = out.flush() {
        errors.record(AlignError::OutputWrite(e));
    }
    written
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
    match handle.join() {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// Run the full pipeline: spawn reader, workers and writer, join them in
/// that order, and surface the first fatal error captured by any thread.
pub fn compute_alignments(
    params: &Params,
    index: &ReferenceIndex,
) -> Result<PipelineStats, AlignError> {
    let nthreads = params.threads.max(1);
    let aligner = kernel::build(params.kernel);
    let percentage_identity = params.percentage_identity;

    let output = File::create(&params.output).map_err(AlignError::OutputWrite)?;
    let mut out = BufWriter::new(output);

    let (work_tx, work_rx) = bounded::<WorkUnit>(QUEUE_CAPACITY);
    let (line_tx, line_rx) = bounded::<String>(QUEUE_CAPACITY);
    let reader_done = AtomicBool::new(false);
    let working: Vec<AtomicBool> = (0..nthreads).map(|_| AtomicBool::new(true)).collect();
    let errors = ErrorSlot::new();

    log::debug!(
        "starting pipeline: {} worker threads, queue capacity {}",
        nthreads,
        QUEUE_CAPACITY
    );

    let mut stats = PipelineStats::default();
    thread::scope(|scope| {
        let reader = {
            let reader_done = &reader_done;
            let errors = &errors;
            scope.spawn(move || reader_loop(params, work_tx, reader_done, errors))
        };

        let workers: Vec<_> = (0..nthreads)
            .map(|tid| {
                let rx = work_rx.clone();
                let tx = line_tx.clone();
                let aligner = aligner.as_ref();
                let reader_done = &reader_done;
                let working = &working[tid];
                scope.spawn(move || {
                    worker_loop(
                        tid,
                        &rx,
                        &tx,
                        index,
                        aligner,
                        percentage_identity,
                        reader_done,
                        working,
                    )
                })
            })
            .collect();

        // The threads own the only live queue endpoints from here on, so
        // channel disconnection tracks thread exit.
        drop(work_rx);
        drop(line_tx);

        let writer = {
            let working = &working;
            let errors = &errors;
            let out = &mut out;
            scope.spawn(move || writer_loop(&line_rx, out, working, errors))
        };

        stats.enqueued = join(reader);
        for worker in workers {
            stats.rejected += join(worker);
        }
        stats.written = join(writer);
    });

    match errors.take() {
        Some(err) => Err(err),
        None => Ok(stats),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_divergence_formatting_matches_stream_defaults() {
        assert_eq!(format_divergence(0.0), "0");
        assert_eq!(format_divergence(1.0 / 3.0), "0.333333");
        assert_eq!(format_divergence(1.0 / 7.0), "0.142857");
        assert_eq!(format_divergence(0.125), "0.125");
        assert_eq!(format_divergence(0.05), "0.05");
        assert_eq!(format_divergence(1.0), "1");
        assert_eq!(format_divergence(0.0001), "0.0001");
        assert_eq!(format_divergence(0.00001), "1e-05");
    }

    #[test]
    fn test_error_slot_keeps_first_error() {
        let slot = ErrorSlot::new();
        slot.record(AlignError::DuplicateRefId("first".to_string()));
        slot.record(AlignError::OutputWrite(io::Error::other("second")));
        match slot.take() {
            Some(AlignError::DuplicateRefId(id)) => assert_eq!(id, "first"),
            other => panic!("unexpected slot contents: {other:?}"),
        }
        assert!(slot.take().is_none());
    }
}
