use std::{collections::HashMap, fmt, io::Write};

use crate::{config::Contig, contig::ChromosomeSet};

pub const TICK_INTERVAL: usize = 10_000_000;
pub const LABEL_INTERVAL: usize = 50_000_000;
pub const Y_RANGE: (f64, f64) = (0.0, 3.0);
pub const REFERENCE_LINE: f64 = 1.0;
pub const MERGED_FIGURE: &str = "merged_depth_of_coverage";

/// Maximum raw position per chromosome of the chromosome set over all samples.
/// Chromosomes with no records in any sample are left out.
pub fn max_positions<'a, I>(cs: &ChromosomeSet, sample_max: I) -> Vec<(Contig, usize)>
where
    I: IntoIterator<Item = &'a HashMap<Contig, usize>>,
{
    let mut mx: HashMap<&str, usize> = HashMap::new();
    for h in sample_max {
        for ctg in cs.iter() {
            if let Some(x) = h.get(ctg) {
                let e = mx.entry(ctg.as_ref()).or_insert(0);
                *e = (*e).max(*x)
            }
        }
    }
    let mut v = Vec::with_capacity(cs.len());
    for ctg in cs.iter() {
        match mx.get(ctg.as_ref()) {
            Some(x) => v.push((Contig::clone(ctg), *x)),
            None => warn!("No depth records for chromosome {} in any sample; skipping plot", ctg),
        }
    }
    v
}

/// Data dependent layout of the coverage plot for one chromosome
#[derive(Debug, Clone, PartialEq)]
pub struct PlotLayout {
    pub chromosome: Contig,
    pub max_position: usize,
    pub x_ticks: Vec<usize>,
    pub x_labels: Vec<String>,
}

impl PlotLayout {
    /// Ticks every 10Mb from 0 to max_position, labelled (in Mb) every 50Mb
    pub fn new(chromosome: Contig, max_position: usize) -> Self {
        let x_ticks: Vec<usize> = (0..=max_position).step_by(TICK_INTERVAL).collect();
        let x_labels = x_ticks
            .iter()
            .map(|x| {
                if x % LABEL_INTERVAL == 0 {
                    format!("{:.1}", (*x as f64) / 1.0e6)
                } else {
                    String::new()
                }
            })
            .collect();
        Self {
            chromosome,
            max_position,
            x_ticks,
            x_labels,
        }
    }

    pub fn figure_name(&self) -> String {
        format!("depth_of_coverage_{}", self.chromosome)
    }

    pub fn title(&self) -> String {
        format!("Depth of Coverage for Chromosome {}", self.chromosome)
    }
}

impl fmt::Display for PlotLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t",
            self.chromosome,
            self.max_position,
            self.figure_name(),
            self.title()
        )?;
        for (i, x) in self.x_ticks.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?
            }
            write!(f, "{}", x)?
        }
        f.write_str("\t")?;
        f.write_str(&self.x_labels.join(","))?;
        write!(f, "\t{}\t{}\t{}", Y_RANGE.0, Y_RANGE.1, REFERENCE_LINE)
    }
}

/// Plot layouts in chromosome set order.  This is also the order in which the
/// figures should be merged.
pub fn plot_layouts(max_pos: Vec<(Contig, usize)>) -> Vec<PlotLayout> {
    max_pos
        .into_iter()
        .map(|(c, x)| PlotLayout::new(c, x))
        .collect()
}

pub fn write_plot_layouts<W: Write>(wrt: &mut W, layouts: &[PlotLayout]) -> anyhow::Result<()> {
    writeln!(
        wrt,
        "chr\tmax_position\tfigure\ttitle\tx_ticks\tx_labels\ty_min\ty_max\tref_line"
    )?;
    for l in layouts {
        writeln!(wrt, "{}", l)?
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn max_over_samples() {
        let cs: ChromosomeSet = ["chr2", "chr1", "chrY"].into_iter().collect();
        fn mk(v: &[(&str, usize)]) -> HashMap<Contig, usize> {
            v.iter().map(|(c, x)| (Arc::from(*c), *x)).collect()
        }
        let a = mk(&[("chr1", 1000), ("chr2", 500), ("chrM", 16569)]);
        let b = mk(&[("chr1", 1200), ("chr2", 400)]);
        let v = max_positions(&cs, [&a, &b]);
        let v: Vec<_> = v.iter().map(|(c, x)| (c.as_ref(), *x)).collect();
        assert_eq!(v, vec![("chr2", 500), ("chr1", 1200)]);
    }

    #[test]
    fn ticks_and_labels() {
        let l = PlotLayout::new(Arc::from("chr21"), 46_709_983);
        assert_eq!(l.x_ticks, vec![0, 10_000_000, 20_000_000, 30_000_000, 40_000_000]);
        assert_eq!(l.x_labels, vec!["0.0", "", "", "", ""]);

        let l = PlotLayout::new(Arc::from("chr1"), 100_000_000);
        assert_eq!(l.x_ticks.len(), 11);
        assert_eq!(l.x_labels[5], "50.0");
        assert_eq!(l.x_labels[10], "100.0");
        assert_eq!(l.figure_name(), "depth_of_coverage_chr1");
    }

    #[test]
    fn layout_line() {
        let l = PlotLayout::new(Arc::from("chrM"), 16_569);
        assert_eq!(
            format!("{}", l),
            "chrM\t16569\tdepth_of_coverage_chrM\tDepth of Coverage for Chromosome chrM\t0\t0.0\t0\t3\t1"
        );
    }
}
