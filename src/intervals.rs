//! A small interval engine over half-open `[start, end)` intervals:
//! overlap queries between two interval sets, sorting, and distance-tolerant merging.
//!
//! Sequence names are arbitrary, so the same functions serve genomic intervals
//! (keyed by chromosome) and transcript-local intervals (keyed by transcript).

use crate::options::{IntersectMode, MergeOptions};
use anyhow::bail;
use rust_lapper::{Interval, Lapper};
use std::collections::HashMap;
use tracing::debug;

/// Anything located on a named sequence by a half-open interval.
pub trait GenomicInterval {
    fn seqname(&self) -> &str;
    fn start(&self) -> i64;
    fn end(&self) -> i64;

    fn width(&self) -> i64 {
        self.end() - self.start()
    }
}

/// An interval carrying a name label, the unit of sorting and merging.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedInterval {
    pub seqname: String,
    pub start: i64,
    pub end: i64,
    pub name: String,
}

impl NamedInterval {
    pub fn new<S: Into<String>, N: Into<String>>(
        seqname: S,
        start: i64,
        end: i64,
        name: N,
    ) -> NamedInterval {
        NamedInterval {
            seqname: seqname.into(),
            start,
            end,
            name: name.into(),
        }
    }
}

impl GenomicInterval for NamedInterval {
    fn seqname(&self) -> &str {
        &self.seqname
    }

    fn start(&self) -> i64 {
        self.start
    }

    fn end(&self) -> i64 {
        self.end
    }
}

/// A pair of overlapping intervals, given by their indices in the query (`a`)
/// and the subject (`b`) sets, with the number of shared positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlapPair {
    pub a: usize,
    pub b: usize,
    pub overlap: i64,
}

type LapperType = Lapper<u64, usize>;

fn build_lappers<B: GenomicInterval>(subjects: &[B]) -> HashMap<String, LapperType> {
    // [start, stop) Inclusive start, exclusive of stop
    type Iv = Interval<u64, usize>;

    let mut lapper_tree_vec_hm: HashMap<String, Vec<Iv>> = HashMap::new();
    for (idx, s) in subjects.iter().enumerate() {
        // empty and negative intervals cannot overlap anything
        if s.start() < 0 || s.end() <= s.start() {
            continue;
        }
        lapper_tree_vec_hm
            .entry(s.seqname().to_string())
            .or_default()
            .push(Iv {
                start: s.start() as u64,
                stop: s.end() as u64,
                val: idx,
            });
    }

    lapper_tree_vec_hm
        .into_iter()
        .map(|(seqname, ivs)| (seqname, Lapper::new(ivs)))
        .collect()
}

/// Finds the overlapping pairs between `queries` and `subjects`.
///
/// Pairs are reported query by query, in query order, and for each query in subject order.
/// With [IntersectMode::Any] every pair sharing at least one position is reported; with
/// [IntersectMode::Fraction] only pairs whose overlap covers at least the given fraction of the
/// query are kept.
pub fn intersect<A: GenomicInterval, B: GenomicInterval>(
    queries: &[A],
    subjects: &[B],
    mode: IntersectMode,
) -> Vec<OverlapPair> {
    let start_time = std::time::Instant::now();
    let lappers = build_lappers(subjects);

    let mut pairs = Vec::new();
    for (a, q) in queries.iter().enumerate() {
        if q.start() < 0 || q.end() <= q.start() {
            continue;
        }
        let Some(lapper) = lappers.get(q.seqname()) else {
            continue;
        };

        let mut hits: Vec<usize> = lapper
            .find(q.start() as u64, q.end() as u64)
            .map(|iv| iv.val)
            .collect();
        hits.sort_unstable();

        for b in hits {
            let s = &subjects[b];
            let overlap = q.end().min(s.end()) - q.start().max(s.start());
            if overlap <= 0 {
                continue;
            }
            let keep = match mode {
                IntersectMode::Any => true,
                IntersectMode::Fraction(f) => overlap as f64 >= f * q.width() as f64,
            };
            if keep {
                pairs.push(OverlapPair { a, b, overlap });
            }
        }
    }

    debug!(
        "Found {} overlapping pairs in {:?}",
        pairs.len(),
        start_time.elapsed()
    );
    pairs
}

/// Returns the part of `query` shared with `subject`, keeping the name of `query`.
pub fn clip<B: GenomicInterval>(query: &NamedInterval, subject: &B) -> NamedInterval {
    NamedInterval::new(
        query.seqname.clone(),
        query.start.max(subject.start()),
        query.end.min(subject.end()),
        query.name.clone(),
    )
}

/// Sorts intervals by sequence name, then by start, then by end. Full ties keep their input order.
pub fn sort(intervals: &mut [NamedInterval]) {
    intervals.sort_by(|x, y| {
        x.seqname
            .cmp(&y.seqname)
            .then_with(|| x.start.cmp(&y.start))
            .then_with(|| x.end.cmp(&y.end))
    });
}

/// Merges sorted intervals.
///
/// Consecutive intervals on the same sequence are fused when the gap between the current
/// window and the next interval is at most `options.distance`. The fused interval carries
/// the names of its members joined by `options.delimiter`, in input order.
///
/// ### Errors
///
/// Returns an error if `intervals` is not sorted as by [sort].
pub fn merge(
    intervals: &[NamedInterval],
    options: &MergeOptions,
) -> anyhow::Result<Vec<NamedInterval>> {
    let mut out: Vec<NamedInterval> = Vec::with_capacity(intervals.len());
    let mut iter = intervals.iter();

    let Some(first) = iter.next() else {
        return Ok(out);
    };
    let mut window = first.clone();

    for (prev, curr) in intervals.iter().zip(iter) {
        if (curr.seqname.as_str(), curr.start) < (prev.seqname.as_str(), prev.start) {
            bail!(
                "The intervals must be sorted before merging, but {}:{} comes after {}:{}",
                curr.seqname,
                curr.start,
                prev.seqname,
                prev.start
            )
        }

        if curr.seqname == window.seqname && curr.start - window.end <= options.distance {
            // start is sorted so we only need to check end
            if curr.end > window.end {
                window.end = curr.end;
            }
            window.name.push_str(&options.delimiter);
            window.name.push_str(&curr.name);
        } else {
            out.push(std::mem::replace(&mut window, curr.clone()));
        }
    }

    // Dont forget the last group
    out.push(window);
    Ok(out)
}

/// Sorts a copy of the intervals and merges it.
pub fn sort_and_merge(
    mut intervals: Vec<NamedInterval>,
    options: &MergeOptions,
) -> anyhow::Result<Vec<NamedInterval>> {
    sort(&mut intervals);
    merge(&intervals, options)
}
