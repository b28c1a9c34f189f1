use std::{collections::HashSet, path::Path, sync::Arc};

use anyhow::Context;
use compress_io::compress::CompressIo;

use utils::{check_name, get_next_line, is_blank};

use crate::config::Contig;

/// ChromosomeSet
///
/// The chromosomes used to calculate the genome average depth for each sample.
/// These are also the chromosomes that are split into windows and plotted.
///
/// The iteration order is the order in which the chromosomes were added, with
/// duplicates ignored.
///
#[derive(Debug, Default)]
pub struct ChromosomeSet {
    ctg_list: Vec<Contig>,
    ctg_hash: HashSet<Contig>,
}

impl ChromosomeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chromosome; returns false if it was already present
    pub fn add(&mut self, name: &str) -> anyhow::Result<bool> {
        check_name(name).with_context(|| "Invalid chromosome name")?;
        if self.contains(name) {
            trace!("Chromosome {} already present", name);
            Ok(false)
        } else {
            trace!("Adding chromosome {}", name);
            let ctg: Contig = Arc::from(name);
            self.ctg_hash.insert(Arc::clone(&ctg));
            self.ctg_list.push(ctg);
            Ok(true)
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ctg_hash.contains(name)
    }

    /// Get shared name if the chromosome is in the set
    pub fn get(&self, name: &str) -> Option<&Contig> {
        self.ctg_hash.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contig> {
        self.ctg_list.iter()
    }

    pub fn len(&self) -> usize {
        self.ctg_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ctg_list.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for ChromosomeSet {
    /// Invalid names are skipped with a warning
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut cs = Self::new();
        for s in iter {
            if let Err(e) = cs.add(s) {
                warn!("Skipping chromosome {:?}: {:#}", s, e)
            }
        }
        cs
    }
}

/// Read in chromosome list from file and add to cs
/// The first tab separated column of each line has the chromosome name;
/// other columns are ignored
pub fn read_chromosome_file<P: AsRef<Path>>(fname: P, cs: &mut ChromosomeSet) -> anyhow::Result<()> {
    debug!("Reading in chromosome list from {}", fname.as_ref().display());

    trace!("Opening chromosome file for reading");
    let mut rdr = CompressIo::new()
        .path(&fname)
        .bufreader()
        .with_context(|| format!("Error opening chromosome file {}", fname.as_ref().display()))?;

    let mut buf = String::new();
    let mut line = 0;

    while let Some(fields) = get_next_line(&mut rdr, &mut buf).with_context(|| {
        format!(
            "Error after reading {} lines from {}",
            line,
            fname.as_ref().display()
        )
    })? {
        line += 1;
        // Skip blank lines
        if !is_blank(&fields) {
            cs.add(fields[0])
                .with_context(|| format!("Error at {}:{}", fname.as_ref().display(), line))?;
        }
    }

    debug!(
        "Finished reading in {} lines; {} chromosomes in set",
        line,
        cs.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn keeps_first_occurrence_order() {
        let cs: ChromosomeSet = ["chr2", "chr1", "chr2", "chrX"].into_iter().collect();
        let v: Vec<&str> = cs.iter().map(|c| c.as_ref()).collect();
        assert_eq!(v, vec!["chr2", "chr1", "chrX"]);
        assert!(cs.contains("chr1"));
        assert!(!cs.contains("chrM"));
        assert_eq!(cs.len(), 3);
    }

    #[test]
    fn shared_names() {
        let mut cs = ChromosomeSet::new();
        assert!(cs.add("chr1").unwrap());
        assert!(!cs.add("chr1").unwrap());
        let a = cs.get("chr1").unwrap();
        let b = cs.iter().next().unwrap();
        assert!(Arc::ptr_eq(a, b));
        assert!(cs.add("").is_err());
    }

    #[test]
    fn from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "chr1\t248956422").unwrap();
        writeln!(f).unwrap();
        writeln!(f, "chr2").unwrap();
        f.flush().unwrap();
        let mut cs: ChromosomeSet = ["chr2", "chr3"].into_iter().collect();
        read_chromosome_file(f.path(), &mut cs).unwrap();
        let v: Vec<&str> = cs.iter().map(|c| c.as_ref()).collect();
        assert_eq!(v, vec!["chr2", "chr3", "chr1"]);
    }
}
