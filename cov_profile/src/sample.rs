use std::{
    collections::{hash_map::Entry, HashMap},
    path::{Path, PathBuf},
};

use anyhow::Context;
use compress_io::compress::CompressIo;
use regex::Regex;
use utils::{check_name, get_next_line, is_blank};

pub const DEFAULT_INPUT_SUFFIX: &str = "_coverage.txt";

/// Input sample
///
/// name - used for the summary column and to generate output file names
/// depth_path - path to per base depth table for this sample
///
#[derive(Debug)]
pub struct Sample {
    name: String,
    depth_path: Option<PathBuf>,
}

impl Sample {
    pub fn new(name: String, depth_path: Option<PathBuf>) -> Self {
        Self { name, depth_path }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Only None before [find_depth_files] has been run
    pub fn depth_path(&self) -> Option<&Path> {
        self.depth_path.as_deref()
    }
}

/// Read in sample list from file
/// Expects one or more tab separated columns.
/// The first column has the sample name (used for the output files and summary columns)
/// The second column, if present, has the path to the depth table for this sample.
/// Any further columns are ignored.
///
pub fn read_sample_list_from_file<P: AsRef<Path>>(fname: P) -> anyhow::Result<Vec<Sample>> {
    debug!("Reading in sample list from {}", fname.as_ref().display());

    trace!("Opening sample file for reading");
    let mut rdr = CompressIo::new()
        .path(&fname)
        .bufreader()
        .with_context(|| format!("Error opening sample file {}", fname.as_ref().display()))?;

    trace!("Reading from sample file");
    let mut buf = String::new();
    let mut line = 0;
    let mut sample_vec = Vec::new();
    let mut h = HashMap::new();

    while let Some(fields) = get_next_line(&mut rdr, &mut buf).with_context(|| {
        format!(
            "Error after reading {} lines from {}",
            line,
            fname.as_ref().display()
        )
    })? {
        line += 1;
        // Skip empty lines
        if is_blank(&fields) {
            continue;
        }
        let name = fields[0];
        check_name(name)
            .with_context(|| format!("{}:{} Bad sample name", fname.as_ref().display(), line))?;
        match h.entry(name.to_owned()) {
            Entry::Occupied(e) => {
                return Err(anyhow!(
                    "{}:{} Duplicate sample {} (first seen at line {})",
                    fname.as_ref().display(),
                    line,
                    name,
                    e.get()
                ))
            }
            Entry::Vacant(e) => {
                e.insert(line);
            }
        }
        let depth_path = fields
            .get(1)
            .filter(|s| !s.is_empty())
            .map(|s| PathBuf::from(*s));
        trace!("Read in sample {} path {:?}", name, depth_path);
        sample_vec.push(Sample::new(name.to_owned(), depth_path))
    }

    debug!(
        "Finished reading in {} lines; found {} samples",
        line,
        sample_vec.len()
    );
    if sample_vec.is_empty() {
        Err(anyhow!(
            "No samples found in {}",
            fname.as_ref().display()
        ))
    } else {
        Ok(sample_vec)
    }
}

/// Collect depth table paths for samples where no path was given in the sample list
/// Candidate files in the input directory are named <sample><suffix>, optionally followed
/// by a compression extension
pub fn find_depth_files(
    samples: &mut [Sample],
    dir: Option<&Path>,
    suffix: &str,
) -> anyhow::Result<()> {
    if samples.iter().all(|s| s.depth_path.is_some()) {
        return Ok(());
    }
    let in_dir = dir.map(|p| p.to_owned()).unwrap_or_else(|| PathBuf::from("."));
    let reg = Regex::new(
        format!(
            "^(.+){}(?:[.](?:gz|bz2|xz|zst))?$",
            regex::escape(suffix)
        )
        .as_str(),
    )?;

    // Collect candidate files, sorted so that uncompressed files come first
    let mut files: Vec<(String, PathBuf)> = Vec::new();
    for f in in_dir
        .read_dir()
        .with_context(|| format!("Error checking input directory {}", in_dir.display()))?
    {
        let entry =
            f.with_context(|| format!("Could not get directory entry from {}", in_dir.display()))?;
        let path = entry.path();
        if path.is_file() {
            if let Ok(name) = entry.file_name().into_string() {
                files.push((name, path))
            }
        }
    }
    files.sort_unstable();

    let mut found: HashMap<&str, &Path> = HashMap::new();
    for (name, path) in files.iter() {
        if let Some(c) = reg.captures(name) {
            let sname = c.get(1).map(|m| m.as_str()).unwrap_or_default();
            match found.entry(sname) {
                Entry::Occupied(e) => warn!(
                    "Multiple depth tables found for {}; using {} and ignoring {}",
                    sname,
                    e.get().display(),
                    path.display()
                ),
                Entry::Vacant(e) => {
                    e.insert(path);
                }
            }
        }
    }

    for s in samples.iter_mut().filter(|s| s.depth_path.is_none()) {
        match found.get(s.name.as_str()) {
            Some(p) => {
                debug!("Depth table {} found for sample {}", p.display(), s.name);
                s.depth_path = Some(p.to_path_buf())
            }
            None => {
                return Err(anyhow!(
                    "No depth table found for sample {} in {}",
                    s.name,
                    in_dir.display()
                ))
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, io::Write};

    fn write_list(s: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(s.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn sample_list_with_paths() {
        let f = write_list("A\t/data/A_coverage.txt\tA_R1.fq.gz\n\nB\n");
        let v = read_sample_list_from_file(f.path()).unwrap();
        assert_eq!(v.len(), 2);
        assert_eq!(v[0].name(), "A");
        assert_eq!(v[0].depth_path(), Some(Path::new("/data/A_coverage.txt")));
        assert_eq!(v[1].name(), "B");
        assert!(v[1].depth_path().is_none());
    }

    #[test]
    fn duplicate_samples_rejected() {
        let f = write_list("A\nB\nA\n");
        assert!(read_sample_list_from_file(f.path()).is_err());
    }

    #[test]
    fn empty_sample_list_rejected() {
        let f = write_list("\n\n");
        assert!(read_sample_list_from_file(f.path()).is_err());
    }

    #[test]
    fn depth_files_found_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("A_coverage.txt"), "chr1\t1\t0\n").unwrap();
        fs::write(dir.path().join("A_coverage.txt.gz"), "").unwrap();
        fs::write(dir.path().join("B_coverage.txt.gz"), "").unwrap();
        fs::write(dir.path().join("C_other.txt"), "").unwrap();

        let mut v = vec![
            Sample::new("A".to_owned(), None),
            Sample::new("B".to_owned(), None),
            Sample::new("C".to_owned(), Some(PathBuf::from("x.txt"))),
        ];
        find_depth_files(&mut v, Some(dir.path()), DEFAULT_INPUT_SUFFIX).unwrap();
        assert_eq!(v[0].depth_path(), Some(dir.path().join("A_coverage.txt").as_path()));
        assert_eq!(v[1].depth_path(), Some(dir.path().join("B_coverage.txt.gz").as_path()));
        assert_eq!(v[2].depth_path(), Some(Path::new("x.txt")));

        let mut v = vec![Sample::new("D".to_owned(), None)];
        assert!(find_depth_files(&mut v, Some(dir.path()), DEFAULT_INPUT_SUFFIX).is_err());
    }
}
