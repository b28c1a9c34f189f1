use std::{collections::BTreeMap, io::Write};

use anyhow::Context;
use utils::OptDisplay;

use crate::{config::Contig, normalize::PerSampleCoverageTable};

/// SummaryTable
///
/// Mean normalized depth per chromosome (rows) and sample (columns).
/// Rows are the union of the chromosomes from all samples (a full outer join on
/// the chromosome), sorted by name.  Columns follow the order in which samples
/// were given.  A chromosome with no data for a sample has a missing (None) cell.
///
#[derive(Debug, Default)]
pub struct SummaryTable {
    columns: Vec<String>,
    rows: BTreeMap<Contig, Vec<Option<f64>>>,
}

impl SummaryTable {
    /// Column order is fixed here from the sample names
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: BTreeMap::new(),
        }
    }

    /// Build the joined table from per sample tables, in sample order
    pub fn from_tables<'a, I>(it: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a PerSampleCoverageTable)>,
    {
        let (names, tables): (Vec<_>, Vec<_>) = it.into_iter().unzip();
        let mut st = Self::new(names.iter().map(|s| s.to_string()).collect());
        for (ix, t) in tables.into_iter().enumerate() {
            st.add_column(ix, t.chromosome_means())
        }
        st
    }

    /// Fill in column ix with the per chromosome means for a sample.  Chromosomes not
    /// yet in the table get a new row with all other cells missing.
    pub fn add_column(&mut self, ix: usize, means: Vec<(Contig, f64)>) {
        assert!(ix < self.columns.len(), "Column index out of range");
        let nc = self.columns.len();
        for (ctg, m) in means {
            let row = self.rows.entry(ctg).or_insert_with(|| vec![None; nc]);
            row[ix] = Some(m)
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> impl Iterator<Item = (&Contig, &[Option<f64>])> {
        self.rows.iter().map(|(c, v)| (c, v.as_slice()))
    }

    /// Log chromosomes missing from some samples, and columns with no usable values.
    /// Neither stops the table from being written.
    pub fn report(&self) {
        for (ctg, v) in self.rows.iter() {
            let n_missing = v.iter().filter(|x| x.is_none()).count();
            if n_missing > 0 {
                debug!(
                    "Chromosome {} missing from {} of {} samples",
                    ctg,
                    n_missing,
                    v.len()
                )
            }
        }
        for (ix, name) in self.columns.iter().enumerate() {
            if self
                .rows
                .values()
                .all(|v| v[ix].map(|x| x.is_nan()).unwrap_or(true))
            {
                warn!("No valid normalized depths in summary for sample {}", name)
            }
        }
        if self.rows.is_empty() {
            warn!("Summary table is empty")
        }
    }

    /// Write as tab separated text with a header line.  Missing cells are written as NA
    pub fn write<W: Write>(&self, wrt: &mut W) -> anyhow::Result<()> {
        write!(wrt, "chr")?;
        for s in self.columns.iter() {
            write!(wrt, "\t{}", s)?;
        }
        writeln!(wrt)?;
        for (ctg, v) in self.rows.iter() {
            write!(wrt, "{}", ctg)?;
            for x in v.iter() {
                write!(wrt, "\t{}", OptDisplay::new(x.as_ref()))?;
            }
            writeln!(wrt).with_context(|| "Error writing summary table")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn get(st: &SummaryTable, ctg: &str, sample: &str) -> Option<f64> {
        let ix = st.columns().iter().position(|s| s == sample)?;
        st.rows().find(|(c, _)| c.as_ref() == ctg).and_then(|(_, v)| v[ix])
    }

    fn means(v: &[(&str, f64)]) -> Vec<(Contig, f64)> {
        v.iter().map(|(c, x)| (Arc::from(*c), *x)).collect()
    }

    #[test]
    fn outer_join_keeps_all_chromosomes() {
        let mut st = SummaryTable::new(vec!["A".to_owned(), "B".to_owned(), "C".to_owned()]);
        st.add_column(0, means(&[("chr1", 1.0), ("chr2", 0.5)]));
        st.add_column(1, means(&[("chr1", 1.25)]));
        st.add_column(2, means(&[("chrM", 40.0), ("chr1", 0.75)]));

        assert_eq!(st.n_rows(), 3);
        let keys: Vec<_> = st.rows().map(|(c, _)| c.as_ref()).collect();
        assert_eq!(keys, vec!["chr1", "chr2", "chrM"]);
        assert_eq!(get(&st, "chr2", "A"), Some(0.5));
        assert_eq!(get(&st, "chr2", "B"), None);
        assert_eq!(get(&st, "chr2", "C"), None);
        assert_eq!(get(&st, "chrM", "C"), Some(40.0));
        assert_eq!(get(&st, "chr1", "D"), None);
    }

    #[test]
    fn write_table() {
        let mut st = SummaryTable::new(vec!["A".to_owned(), "B".to_owned()]);
        st.add_column(0, means(&[("chr1", 1.0), ("chr2", 0.5)]));
        st.add_column(1, means(&[("chr1", f64::NAN)]));
        let mut out = Vec::new();
        st.write(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "chr\tA\tB\nchr1\t1\tNaN\nchr2\t0.5\tNA\n"
        );
    }

    #[test]
    fn low_values_keep_precision() {
        let mut st = SummaryTable::new(vec!["A".to_owned()]);
        st.add_column(0, means(&[("chr1", 2.5e-5)]));
        let mut out = Vec::new();
        st.write(&mut out).unwrap();
        let s = String::from_utf8(out).unwrap();
        let x: f64 = s.lines().nth(1).unwrap().split('\t').nth(1).unwrap().parse().unwrap();
        assert_eq!(x, 2.5e-5);
    }

    #[test]
    fn empty_table_has_header() {
        let st = SummaryTable::new(vec!["A".to_owned()]);
        let mut out = Vec::new();
        st.write(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "chr\tA\n");
    }
}
