use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{contig::ChromosomeSet, sample::Sample};

pub const DEFAULT_WINDOW_SIZE: usize = 1_000_000;
pub const SUMMARY_FILE: &str = "normalized_coverage.csv";

/// Config
///
/// Configuration info for the program
/// This is generated from the command line arguments
/// Once set it is read only
///
/// sample_list - list of input samples with the paths to their depth tables
/// chromosomes - chromosomes used for normalization and plotting
/// window_size - size of coverage windows in base pairs
/// output_prefix - prefix for per sample and layout output files
/// output_dir - output directory
/// threads - number of worker threads
///
pub struct Config {
    sample_list: Vec<Sample>,
    chromosomes: ChromosomeSet,
    window_size: usize,
    output_prefix: String,
    output_dir: Option<PathBuf>,
    threads: usize,
}

impl Config {
    pub fn new(sample_list: Vec<Sample>, chromosomes: ChromosomeSet, output_prefix: String) -> Self {
        Self {
            sample_list,
            chromosomes,
            window_size: DEFAULT_WINDOW_SIZE,
            output_prefix,
            output_dir: None,
            threads: 1,
        }
    }

    pub fn set_output_dir<P: AsRef<Path>>(&mut self, dir: P) {
        self.output_dir = Some(dir.as_ref().to_owned())
    }

    pub fn set_window_size(&mut self, x: usize) -> anyhow::Result<()> {
        if x == 0 {
            Err(anyhow!("Window size must be greater than zero"))
        } else {
            self.window_size = x;
            Ok(())
        }
    }

    pub fn set_threads(&mut self, x: usize) {
        self.threads = x.max(1)
    }

    pub fn sample_list(&self) -> &[Sample] {
        &self.sample_list
    }

    pub fn chromosomes(&self) -> &ChromosomeSet {
        &self.chromosomes
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Path for a file in the output directory
    pub fn output_path(&self, name: &str) -> PathBuf {
        let mut p = self
            .output_dir
            .as_ref()
            .map(|d| d.to_owned())
            .unwrap_or_else(PathBuf::new);
        p.push(name);
        p
    }

    pub fn sample_output_path(&self, sample: &Sample) -> PathBuf {
        self.output_path(&format!("{}_{}.txt", self.output_prefix, sample.name()))
    }

    pub fn layout_output_path(&self) -> PathBuf {
        self.output_path(&format!("{}_plot_layout.txt", self.output_prefix))
    }

    pub fn summary_output_path(&self) -> PathBuf {
        self.output_path(SUMMARY_FILE)
    }

    /// Check that no per sample table would be overwritten by the plot layout or summary
    pub fn check_output_paths(&self) -> anyhow::Result<()> {
        let shared = [self.layout_output_path(), self.summary_output_path()];
        for s in self.sample_list.iter() {
            let opath = self.sample_output_path(s);
            if shared.contains(&opath) {
                return Err(anyhow!(
                    "Output file {} for sample {} clashes with a summary output file",
                    opath.display(),
                    s.name()
                ));
            }
        }
        Ok(())
    }
}

pub type Contig = Arc<str>;

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(names: &[&str]) -> Config {
        let samples = names
            .iter()
            .map(|s| Sample::new(s.to_string(), None))
            .collect();
        let cs: ChromosomeSet = ["chr1"].into_iter().collect();
        Config::new(samples, cs, "depth".to_owned())
    }

    #[test]
    fn output_paths() {
        let mut c = cfg(&["A"]);
        c.set_output_dir("out");
        assert_eq!(
            c.sample_output_path(&c.sample_list()[0]),
            Path::new("out/depth_A.txt")
        );
        assert_eq!(c.layout_output_path(), Path::new("out/depth_plot_layout.txt"));
        assert_eq!(c.summary_output_path(), Path::new("out/normalized_coverage.csv"));
        assert!(c.set_window_size(0).is_err());
    }

    #[test]
    fn sample_clashing_with_layout() {
        assert!(cfg(&["A", "B"]).check_output_paths().is_ok());
        assert!(cfg(&["A", "plot_layout"]).check_output_paths().is_err());
    }
}
