use std::{collections::HashMap, fmt};

use crate::{
    config::Contig,
    window::{DepthSummary, ShortContigMean, WindowedMean},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Windowed,
    ShortContig,
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Windowed => f.write_str("window"),
            Self::ShortContig => f.write_str("contig"),
        }
    }
}

/// A window or short contig mean with the depth normalized by the genome average.
/// Short contigs have window_start 0.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub chromosome: Contig,
    pub window_start: usize,
    pub mean_depth: f64,
    pub normalized_depth: f64,
    pub n: usize,
    pub kind: RowKind,
}

impl NormalizedRow {
    fn from_window(w: WindowedMean, divisor: f64) -> Self {
        Self {
            normalized_depth: w.mean_depth / divisor,
            chromosome: w.chromosome,
            window_start: w.window_start,
            mean_depth: w.mean_depth,
            n: w.n,
            kind: RowKind::Windowed,
        }
    }

    fn from_short_contig(c: ShortContigMean, divisor: f64) -> Self {
        Self {
            normalized_depth: c.mean_depth / divisor,
            chromosome: c.chromosome,
            window_start: 0,
            mean_depth: c.mean_depth,
            n: c.n,
            kind: RowKind::ShortContig,
        }
    }
}

/// Normalized coverage for one sample
///
/// Windowed rows (sorted by chromosome and window) followed by short contig rows
/// (sorted by chromosome).  A chromosome only appears in one of the two groups.
///
#[derive(Debug, Default)]
pub struct PerSampleCoverageTable {
    genome_average: f64,
    rows: Vec<NormalizedRow>,
}

impl PerSampleCoverageTable {
    /// Normalize all window and short contig means by the genome average depth
    /// of the sample.  If no records were seen for the chromosome set then the
    /// genome average, and so all normalized depths, will be NaN.
    pub fn from_depth_summary(name: &str, summary: DepthSummary) -> Self {
        let DepthSummary {
            windowed,
            short_contigs,
            genome,
            ..
        } = summary;

        let genome_average = genome.mean();
        if genome_average.is_nan() {
            warn!(
                "Sample {}: no depth records found for the chromosome set; normalized depths will be NaN",
                name
            )
        } else {
            debug!(
                "Sample {}: genome average depth {:.4} from {} positions",
                name,
                genome_average,
                genome.n()
            )
        }

        let mut rows = Vec::with_capacity(windowed.len() + short_contigs.len());
        rows.extend(
            windowed
                .into_iter()
                .map(|w| NormalizedRow::from_window(w, genome_average)),
        );
        rows.extend(
            short_contigs
                .into_iter()
                .map(|c| NormalizedRow::from_short_contig(c, genome_average)),
        );
        Self {
            genome_average,
            rows,
        }
    }

    pub fn genome_average(&self) -> f64 {
        self.genome_average
    }

    pub fn rows(&self) -> &[NormalizedRow] {
        &self.rows
    }

    /// Mean normalized depth per chromosome, in order of first appearance
    pub fn chromosome_means(&self) -> Vec<(Contig, f64)> {
        let mut v: Vec<(Contig, f64, usize)> = Vec::new();
        let mut ix: HashMap<&str, usize> = HashMap::new();
        for r in self.rows.iter() {
            let i = *ix.entry(r.chromosome.as_ref()).or_insert_with(|| {
                v.push((Contig::clone(&r.chromosome), 0.0, 0));
                v.len() - 1
            });
            v[i].1 += r.normalized_depth;
            v[i].2 += 1;
        }
        v.into_iter()
            .map(|(c, s, n)| (c, s / (n as f64)))
            .collect()
    }
}
