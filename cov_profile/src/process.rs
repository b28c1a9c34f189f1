use std::{collections::HashMap, thread};

use anyhow::Context;
use crossbeam_channel::{bounded, Receiver, Sender};

use crate::{
    axis::{max_positions, plot_layouts, MERGED_FIGURE},
    config::{Config, Contig},
    depth::load_depth_table,
    io,
    normalize::PerSampleCoverageTable,
    sample::Sample,
    summary::SummaryTable,
    window::SampleAccum,
};

/// Everything kept from the processing of one sample
pub struct SampleProfile {
    table: PerSampleCoverageTable,
    max_positions: HashMap<Contig, usize>,
}

impl SampleProfile {
    pub fn table(&self) -> &PerSampleCoverageTable {
        &self.table
    }

    pub fn max_positions(&self) -> &HashMap<Contig, usize> {
        &self.max_positions
    }
}

/// Complete pipeline for a single sample: read depth table, aggregate into
/// windows and short contigs, normalize and write out the coverage table
pub fn process_sample(cfg: &Config, sample: &Sample) -> anyhow::Result<SampleProfile> {
    let path = sample
        .depth_path()
        .ok_or_else(|| anyhow!("No depth table set for sample {}", sample.name()))?;

    debug!("Reading depth table for sample {}", sample.name());
    let mut acc = SampleAccum::new(cfg.chromosomes(), cfg.window_size());
    let n = load_depth_table(path, &mut acc)
        .with_context(|| format!("Error loading depth table for sample {}", sample.name()))?;
    if n == 0 {
        warn!("Depth table for sample {} is empty", sample.name())
    }

    let mut summary = acc.finish();
    debug!(
        "Sample {}: {} records, {} windows, {} short contigs",
        sample.name(),
        n,
        summary.windowed.len(),
        summary.short_contigs.len()
    );
    let max_positions = std::mem::take(&mut summary.max_positions);
    let table = PerSampleCoverageTable::from_depth_summary(sample.name(), summary);
    if table.rows().is_empty() {
        warn!("No coverage rows for sample {}", sample.name())
    }
    trace!(
        "Sample {}: genome average depth {}",
        sample.name(),
        table.genome_average()
    );
    io::output_sample_table(cfg, sample, &table)?;
    Ok(SampleProfile {
        table,
        max_positions,
    })
}

type SampleResult = (usize, anyhow::Result<SampleProfile>);

fn process_task(
    cfg: &Config,
    ix: usize,
    recv: Receiver<usize>,
    snd: Sender<SampleResult>,
) -> anyhow::Result<()> {
    debug!("Process task {} starting up", ix);
    for sample_idx in recv.iter() {
        let s = &cfg.sample_list()[sample_idx];
        trace!("Task {} processing sample {}", ix, s.name());
        let res = process_sample(cfg, s);
        snd.send((sample_idx, res))
            .map_err(|_| anyhow!("Task {}: result channel closed", ix))?;
    }
    debug!("Process task {} closing down", ix);
    Ok(())
}

/// Run the per sample pipelines in parallel and collect the results by sample index.
/// Samples that fail are logged and give None.
fn run_samples(cfg: &Config) -> anyhow::Result<Vec<Option<SampleProfile>>> {
    let ns = cfg.sample_list().len();
    let nt = cfg.threads().min(ns).max(1);
    debug!("Processing {} samples with {} tasks", ns, nt);

    let mut results: Vec<Option<SampleProfile>> = (0..ns).map(|_| None).collect();

    thread::scope(|sc| {
        // All jobs are queued up front so the job channel never blocks
        let (send_job, recv_job) = bounded(ns);
        let (send_res, recv_res) = bounded(nt * 2);

        let join_handles: Vec<_> = (0..nt)
            .map(|ix| {
                let r = recv_job.clone();
                let s = send_res.clone();
                sc.spawn(move || process_task(cfg, ix + 1, r, s))
            })
            .collect();
        drop(recv_job);
        drop(send_res);

        for i in 0..ns {
            send_job
                .send(i)
                .map_err(|_| anyhow!("Job channel closed unexpectedly"))?;
        }
        drop(send_job);

        // Wait for all samples (the channel closes when every task has finished)
        for (i, res) in recv_res.iter() {
            let name = cfg.sample_list()[i].name();
            match res {
                Ok(p) => {
                    info!("Finished processing sample {}", name);
                    results[i] = Some(p)
                }
                Err(e) => error!("Sample {} failed: {:?}", name, e),
            }
        }

        for jh in join_handles {
            jh.join()
                .map_err(|_| anyhow!("Error joining process task"))??
        }
        Ok::<(), anyhow::Error>(())
    })?;

    Ok(results)
}

/// Process all samples, then build and write the summary table and plot layout
pub fn process_samples(cfg: &Config) -> anyhow::Result<()> {
    debug!("Starting processing");
    io::setup_output(cfg)?;

    let results = run_samples(cfg)?;

    let good: Vec<(&Sample, &SampleProfile)> = cfg
        .sample_list()
        .iter()
        .zip(results.iter())
        .filter_map(|(s, r)| r.as_ref().map(|p| (s, p)))
        .collect();

    let n_failed = results.len() - good.len();
    if good.is_empty() {
        return Err(anyhow!("No samples were processed successfully"));
    } else if n_failed > 0 {
        warn!(
            "{} of {} samples failed and are left out of the summary",
            n_failed,
            results.len()
        )
    }

    let st = SummaryTable::from_tables(good.iter().map(|(s, p)| (s.name(), p.table())));
    st.report();
    io::output_summary(cfg, &st)?;

    let mx = max_positions(cfg.chromosomes(), good.iter().map(|(_, p)| p.max_positions()));
    let layouts = plot_layouts(mx);
    io::output_plot_layouts(cfg, &layouts)?;
    if log_enabled!(log::Level::Info) {
        let figs: Vec<_> = layouts.iter().map(|l| l.figure_name()).collect();
        info!(
            "{} chromosome plots; merge order for {}: {}",
            figs.len(),
            MERGED_FIGURE,
            figs.join(", ")
        )
    }
    Ok(())
}
