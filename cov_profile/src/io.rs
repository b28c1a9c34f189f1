use std::{fs, io::Write, path::Path};

use anyhow::Context;
use compress_io::compress::CompressIo;

use crate::{
    axis::{write_plot_layouts, PlotLayout},
    config::Config,
    normalize::PerSampleCoverageTable,
    sample::Sample,
    summary::SummaryTable,
};

pub fn setup_output(cfg: &Config) -> anyhow::Result<()> {
    if let Some(d) = cfg.output_dir() {
        if !d.exists() {
            fs::create_dir_all(d)
                .with_context(|| format!("Error creating output directory {}", d.display()))?;
        }
    }
    Ok(())
}

pub fn write_coverage_table<W: Write>(
    wrt: &mut W,
    table: &PerSampleCoverageTable,
) -> anyhow::Result<()> {
    writeln!(wrt, "chr\twindow\tdepth\tnormalized_depth\tn_positions\ttype")?;
    for r in table.rows() {
        writeln!(
            wrt,
            "{}\t{}\t{}\t{}\t{}\t{}",
            r.chromosome, r.window_start, r.mean_depth, r.normalized_depth, r.n, r.kind
        )?
    }
    Ok(())
}

fn open_output(p: &Path) -> anyhow::Result<impl Write> {
    trace!("Opening {} for output", p.display());
    CompressIo::new()
        .path(p)
        .bufwriter()
        .with_context(|| format!("Could not open output file {}", p.display()))
}

pub fn output_sample_table(
    cfg: &Config,
    sample: &Sample,
    table: &PerSampleCoverageTable,
) -> anyhow::Result<()> {
    let opath = cfg.sample_output_path(sample);
    debug!(
        "Writing coverage table for sample {} to {}",
        sample.name(),
        opath.display()
    );
    let mut wrt = open_output(&opath)?;
    write_coverage_table(&mut wrt, table)
        .and_then(|_| wrt.flush().map_err(anyhow::Error::from))
        .with_context(|| format!("Error writing coverage table to {}", opath.display()))
}

pub fn output_summary(cfg: &Config, st: &SummaryTable) -> anyhow::Result<()> {
    let opath = cfg.summary_output_path();
    info!(
        "Writing summary for {} chromosomes and {} samples to {}",
        st.n_rows(),
        st.columns().len(),
        opath.display()
    );
    let mut wrt = open_output(&opath)?;
    st.write(&mut wrt)
        .and_then(|_| wrt.flush().map_err(anyhow::Error::from))
        .with_context(|| format!("Error writing summary table to {}", opath.display()))
}

pub fn output_plot_layouts(cfg: &Config, layouts: &[PlotLayout]) -> anyhow::Result<()> {
    let opath = cfg.layout_output_path();
    debug!("Writing plot layout to {}", opath.display());
    let mut wrt = open_output(&opath)?;
    write_plot_layouts(&mut wrt, layouts)
        .and_then(|_| wrt.flush().map_err(anyhow::Error::from))
        .with_context(|| format!("Error writing plot layout to {}", opath.display()))
}
