use std::{num::NonZeroUsize, path::PathBuf};

use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_parser, Arg, ArgAction,
    ArgGroup, Command,
};

use anyhow::Context;

use utils::{init_log, split_list, LogLevel};

use crate::{
    config::*,
    contig::{read_chromosome_file, ChromosomeSet},
    sample::*,
};

/// Set up definition of command options for clap
fn cli_model() -> Command {
    Command::new(crate_name!())
        .about(crate_description!())
        .version(crate_version!())
        .author(crate_authors!())
        .arg(
            Arg::new("timestamp")
                .short('X')
                .long("timestamp")
                .value_parser(value_parser!(stderrlog::Timestamp))
                .value_name("GRANULARITY")
                .default_value("none")
                .help("Prepend log entries with a timestamp"),
        )
        .arg(
            Arg::new("loglevel")
                .short('l')
                .long("loglevel")
                .value_name("LOGLEVEL")
                .value_parser(value_parser!(LogLevel))
                .ignore_case(true)
                .default_value("warn")
                .help("Set log level"),
        )
        .arg(
            Arg::new("quiet")
                .action(ArgAction::SetTrue)
                .long("quiet")
                .conflicts_with("loglevel")
                .help("Silence all output"),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .value_parser(value_parser!(NonZeroUsize))
                .value_name("INT")
                .help("Set number of calculation threads [default: available cores]"),
        )
        .arg(
            Arg::new("window_size")
                .short('w')
                .long("window-size")
                .value_parser(value_parser!(NonZeroUsize))
                .value_name("INT")
                .default_value("1000000")
                .help("Set window size in base pairs"),
        )
        .arg(
            Arg::new("chromosomes")
                .short('c')
                .long("chromosomes")
                .value_parser(value_parser!(String))
                .value_name("NAME")
                .action(ArgAction::Append)
                .help("Chromosomes used for normalization and plotting (comma separated or repeated)"),
        )
        .arg(
            Arg::new("chromosome_file")
                .short('C')
                .long("chromosome-file")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .help("File with list of chromosomes used for normalization and plotting"),
        )
        .group(
            ArgGroup::new("chromosome_set")
                .args(["chromosomes", "chromosome_file"])
                .required(true)
                .multiple(true),
        )
        .arg(
            Arg::new("input_suffix")
                .short('s')
                .long("input-suffix")
                .value_parser(value_parser!(String))
                .value_name("STRING")
                .default_value(DEFAULT_INPUT_SUFFIX)
                .help("Set suffix for depth table file names when not given in the sample list"),
        )
        .arg(
            Arg::new("input_dir")
                .short('D')
                .long("input-dir")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .help("Set input directory for depth tables [default: current directory]"),
        )
        .arg(
            Arg::new("output_prefix")
                .short('p')
                .long("output-prefix")
                .value_parser(value_parser!(String))
                .value_name("STRING")
                .default_value("depth")
                .help("Set prefix for output file names"),
        )
        .arg(
            Arg::new("output_dir")
                .short('d')
                .long("output-dir")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .help("Set output directory [default: current directory]"),
        )
        .arg(
            Arg::new("sample_list")
                .value_parser(value_parser!(PathBuf))
                .value_name("SAMPLE_FILE")
                .required(true)
                .help("Input file with list of sample names and (optionally) depth table paths"),
        )
}

/// Handle command line options.  Set up Config structure
pub fn handle_cli() -> anyhow::Result<Config> {
    // Get matches from command line
    let m = cli_model().get_matches();

    // Setup logging
    init_log(&m)?;

    debug!("Processing command line options");

    let nt = m
        .get_one::<NonZeroUsize>("threads")
        .map(|x| usize::from(*x))
        .unwrap_or_else(num_cpus::get);

    let window_size = m
        .get_one::<NonZeroUsize>("window_size")
        .map(|x| usize::from(*x))
        .unwrap_or(DEFAULT_WINDOW_SIZE);

    // Chromosomes from the command line come first, then those from the file
    let mut chromosomes: ChromosomeSet = m
        .get_many::<String>("chromosomes")
        .into_iter()
        .flatten()
        .flat_map(|s| split_list(s))
        .collect();
    if let Some(p) = m.get_one::<PathBuf>("chromosome_file") {
        read_chromosome_file(p, &mut chromosomes)
            .with_context(|| "Could not read chromosome list file")?;
    }
    if chromosomes.is_empty() {
        return Err(anyhow!("No chromosomes selected"));
    }
    debug!("Number of chromosomes selected: {}", chromosomes.len());

    // Read in sample list
    let mut samples = read_sample_list_from_file(
        m.get_one::<PathBuf>("sample_list")
            .expect("Missing sample list file"),
    )
    .with_context(|| "Could not read from sample list file")?;

    let input_suffix = m
        .get_one::<String>("input_suffix")
        .expect("Missing default input suffix");

    find_depth_files(
        &mut samples,
        m.get_one::<PathBuf>("input_dir").map(|p| p.as_path()),
        input_suffix,
    )
    .with_context(|| "Error collecting input files")?;

    let output_prefix = m
        .get_one::<String>("output_prefix")
        .expect("Missing default output prefix")
        .clone();

    let mut cfg = Config::new(samples, chromosomes, output_prefix);

    cfg.set_window_size(window_size)?;
    cfg.set_threads(nt);

    if let Some(p) = m.get_one::<PathBuf>("output_dir") {
        cfg.set_output_dir(p)
    }

    cfg.check_output_paths()?;

    // Make sure per sample output will not overwrite input
    for s in cfg.sample_list() {
        let opath = cfg.sample_output_path(s);
        if let (Some(p), true) = (s.depth_path(), opath.exists()) {
            if p.canonicalize().ok() == opath.canonicalize().ok() {
                return Err(anyhow!(
                    "Output file {} for sample {} is the same as the input",
                    opath.display(),
                    s.name()
                ));
            }
        }
    }

    Ok(cfg)
}
