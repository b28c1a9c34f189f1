//! Accumulation of per base depth into window and whole contig means
//!
//! Depth records are streamed into a [SampleAccum] which keeps, for every contig,
//! the sum and count of depths, the maximum position seen and (for contigs in the
//! [ChromosomeSet]) the sum and count for each window.  Once all records have been
//! read the contigs are classified as short (max position < window size) or normal.
//! Short contigs give a single whole contig mean; normal contigs from the
//! [ChromosomeSet] give one mean per window.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use crate::{config::Contig, contig::ChromosomeSet, depth::DepthRecord};

/// Start of the window containing pos.  Windows are fixed multiples of window_size
/// starting from 0
#[inline]
pub fn window_start(pos: usize, window_size: usize) -> usize {
    (pos / window_size) * window_size
}

/// Running sum and count of depth values.  The sum is kept as u128 so that a
/// whole genome of maximal depths cannot overflow it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MeanAccum {
    n: usize,
    sum: u128,
}

impl MeanAccum {
    #[inline]
    pub fn add(&mut self, depth: u64) {
        self.n += 1;
        self.sum += depth as u128;
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Arithmetic mean.  NaN if nothing has been added
    pub fn mean(&self) -> f64 {
        if self.n == 0 {
            f64::NAN
        } else {
            (self.sum as f64) / (self.n as f64)
        }
    }
}

#[derive(Debug)]
struct ContigAccum {
    name: Contig,
    total: MeanAccum,
    max_pos: usize,
    // Only present for contigs in the chromosome set
    windows: Option<BTreeMap<usize, MeanAccum>>,
}

impl ContigAccum {
    fn new(name: Contig, in_set: bool) -> Self {
        Self {
            name,
            total: MeanAccum::default(),
            max_pos: 0,
            windows: if in_set { Some(BTreeMap::new()) } else { None },
        }
    }

    fn add(&mut self, pos: usize, depth: u64, window_size: usize) {
        self.total.add(depth);
        self.max_pos = self.max_pos.max(pos);
        if let Some(w) = self.windows.as_mut() {
            w.entry(window_start(pos, window_size))
                .or_default()
                .add(depth)
        }
    }

    fn in_set(&self) -> bool {
        self.windows.is_some()
    }
}

/// Mean depth for one window of a chromosome
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedMean {
    pub chromosome: Contig,
    pub window_start: usize,
    pub mean_depth: f64,
    pub n: usize,
}

/// Mean depth over all positions of a contig shorter than one window
#[derive(Debug, Clone, PartialEq)]
pub struct ShortContigMean {
    pub chromosome: Contig,
    pub mean_depth: f64,
    pub n: usize,
}

/// Result of aggregating the depth records of one sample
///
/// windowed - window means for chromosomes in the set that are not short (sorted by chromosome, window)
/// short_contigs - whole contig means for all short contigs (sorted by chromosome)
/// genome - accumulated depth over all records for chromosomes in the set
/// max_positions - maximum position seen for every chromosome
///
#[derive(Debug, Default)]
pub struct DepthSummary {
    pub windowed: Vec<WindowedMean>,
    pub short_contigs: Vec<ShortContigMean>,
    pub genome: MeanAccum,
    pub max_positions: HashMap<Contig, usize>,
}

/// Per sample accumulator for depth records
pub struct SampleAccum<'a> {
    chromosomes: &'a ChromosomeSet,
    window_size: usize,
    contigs: Vec<ContigAccum>,
    index: HashMap<Contig, usize>,
    // Input is sorted by chromosome, so we remember the last contig used
    current: Option<usize>,
    genome: MeanAccum,
}

impl<'a> SampleAccum<'a> {
    pub fn new(chromosomes: &'a ChromosomeSet, window_size: usize) -> Self {
        assert!(window_size > 0, "Window size must be positive");
        Self {
            chromosomes,
            window_size,
            contigs: Vec::new(),
            index: HashMap::new(),
            current: None,
            genome: MeanAccum::default(),
        }
    }

    fn contig_index(&mut self, name: &str) -> usize {
        if let Some(i) = self.index.get(name) {
            return *i;
        }
        let (ctg, in_set) = match self.chromosomes.get(name) {
            Some(c) => (Arc::clone(c), true),
            None => (Arc::from(name), false),
        };
        trace!("New contig {} (in chromosome set: {})", ctg, in_set);
        let ix = self.contigs.len();
        self.index.insert(Arc::clone(&ctg), ix);
        self.contigs.push(ContigAccum::new(ctg, in_set));
        ix
    }

    pub fn add(&mut self, rec: &DepthRecord) {
        let cur = self.current;
        let ix = match cur {
            Some(i) if self.contigs[i].name.as_ref() == rec.chromosome => i,
            _ => {
                let i = self.contig_index(rec.chromosome);
                self.current = Some(i);
                i
            }
        };
        let ca = &mut self.contigs[ix];
        ca.add(rec.position, rec.depth, self.window_size);
        if ca.in_set() {
            self.genome.add(rec.depth)
        }
    }

    /// Classify contigs as short or normal and calculate window and contig means
    pub fn finish(mut self) -> DepthSummary {
        let ws = self.window_size;
        self.contigs.sort_unstable_by(|a, b| a.name.cmp(&b.name));

        let mut summary = DepthSummary {
            genome: self.genome,
            ..Default::default()
        };

        for ca in self.contigs.drain(..) {
            summary.max_positions.insert(Arc::clone(&ca.name), ca.max_pos);
            if ca.max_pos < ws {
                trace!(
                    "Contig {} is short ({} < {}); mean depth over {} positions",
                    ca.name,
                    ca.max_pos,
                    ws,
                    ca.total.n()
                );
                summary.short_contigs.push(ShortContigMean {
                    mean_depth: ca.total.mean(),
                    n: ca.total.n(),
                    chromosome: ca.name,
                })
            } else if let Some(w) = ca.windows {
                for (window_start, m) in w.iter() {
                    summary.windowed.push(WindowedMean {
                        chromosome: Arc::clone(&ca.name),
                        window_start: *window_start,
                        mean_depth: m.mean(),
                        n: m.n(),
                    })
                }
            }
        }
        summary
    }
}
