use std::{io::BufRead, path::Path};

use anyhow::Context;
use compress_io::compress::CompressIo;
use utils::{get_next_line, is_blank};

use crate::window::SampleAccum;

/// One line of a per base depth table (chromosome, position, depth)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthRecord<'a> {
    pub chromosome: &'a str,
    pub position: usize,
    pub depth: u64,
}

impl<'a> DepthRecord<'a> {
    /// Parse fields from a depth table line.  Positions are 1 based, so 0 is rejected.
    /// Depths are limited to the 32 bit range written by depth callers such as samtools.
    pub fn from_fields(fields: &[&'a str]) -> anyhow::Result<Self> {
        if fields.len() < 3 {
            return Err(anyhow!(
                "Expected 3 columns (chromosome, position, depth), found {}",
                fields.len()
            ));
        }
        let chromosome = fields[0];
        if chromosome.is_empty() {
            return Err(anyhow!("Empty chromosome name"));
        }
        let position = fields[1]
            .parse::<usize>()
            .with_context(|| format!("Error reading position {:?}", fields[1]))?;
        if position == 0 {
            return Err(anyhow!("Position must be at least 1"));
        }
        let depth = fields[2]
            .parse::<u32>()
            .map(u64::from)
            .with_context(|| format!("Error reading depth {:?}", fields[2]))?;
        Ok(Self {
            chromosome,
            position,
            depth,
        })
    }
}

/// Read depth records from rdr and add them to acc.  Records are not kept.
/// Returns the number of records read.
/// Any malformed line is an error; the caller should abandon the sample.
pub fn read_depth_records<R: BufRead>(
    rdr: &mut R,
    name: &str,
    acc: &mut SampleAccum,
) -> anyhow::Result<usize> {
    let mut buf = String::new();
    let mut line = 0;
    let mut n_rec = 0;

    while let Some(fields) = get_next_line(rdr, &mut buf)
        .with_context(|| format!("Error after reading {} lines from {}", line, name))?
    {
        line += 1;
        // Skip blank lines
        if is_blank(&fields) {
            continue;
        }
        let rec = DepthRecord::from_fields(&fields)
            .with_context(|| format!("{}:{} Invalid depth record", name, line))?;
        acc.add(&rec);
        n_rec += 1;
    }
    trace!("Read {} records from {} lines of {}", n_rec, line, name);
    Ok(n_rec)
}

/// Open a depth table (compressed or not) and read all records into acc
pub fn load_depth_table(p: &Path, acc: &mut SampleAccum) -> anyhow::Result<usize> {
    trace!("Opening depth table {} for reading", p.display());
    let mut rdr = CompressIo::new()
        .path(p)
        .bufreader()
        .with_context(|| format!("Could not open depth table {}", p.display()))?;
    let name = p.display().to_string();
    read_depth_records(&mut rdr, &name, acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contig::ChromosomeSet;
    use std::io::Cursor;

    #[test]
    fn parse_record() {
        let r = DepthRecord::from_fields(&["chr1", "100", "7"]).unwrap();
        assert_eq!(
            r,
            DepthRecord {
                chromosome: "chr1",
                position: 100,
                depth: 7
            }
        );
        // Extra columns are allowed
        assert!(DepthRecord::from_fields(&["chr1", "100", "7", "x"]).is_ok());
    }

    #[test]
    fn reject_malformed_records() {
        assert!(DepthRecord::from_fields(&["chr1", "100"]).is_err());
        assert!(DepthRecord::from_fields(&["chr1", "0", "3"]).is_err());
        assert!(DepthRecord::from_fields(&["chr1", "-5", "3"]).is_err());
        assert!(DepthRecord::from_fields(&["chr1", "5", "-3"]).is_err());
        assert!(DepthRecord::from_fields(&["chr1", "5", "3.5"]).is_err());
        assert!(DepthRecord::from_fields(&["chr1", "1e3", "3"]).is_err());
        assert!(DepthRecord::from_fields(&["", "5", "3"]).is_err());
    }

    #[test]
    fn depth_range() {
        let r = DepthRecord::from_fields(&["chr1", "5", "4294967295"]).unwrap();
        assert_eq!(r.depth, u32::MAX as u64);
        assert!(DepthRecord::from_fields(&["chr1", "5", "4294967296"]).is_err());
        assert!(DepthRecord::from_fields(&["chr1", "5", "18446744073709551615"]).is_err());
    }

    #[test]
    fn read_records() {
        let cs: ChromosomeSet = ["chr1"].into_iter().collect();
        let mut acc = SampleAccum::new(&cs, 10);
        let mut rdr = Cursor::new("chr1\t1\t4\nchr1\t2\t6\n\nchrM\t1\t5\n");
        let n = read_depth_records(&mut rdr, "test", &mut acc).unwrap();
        assert_eq!(n, 3);
        assert_eq!(acc.finish().genome.mean(), 5.0);
    }

    #[test]
    fn bad_line_reports_position() {
        let cs: ChromosomeSet = ["chr1"].into_iter().collect();
        let mut acc = SampleAccum::new(&cs, 10);
        let mut rdr = Cursor::new("chr1\t1\t4\nchr1\t2\tNA\n");
        let e = read_depth_records(&mut rdr, "test", &mut acc).unwrap_err();
        assert!(format!("{:#}", e).starts_with("test:2 Invalid depth record"));
    }
}
