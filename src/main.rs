use clap::{Parser, Subcommand};
use log::LevelFilter;
use sibprep::file::OutputFile;
use sibprep::prelude::*;
use std::io;
use std::io::Write;

const INFO: &str = "\
sibprep: prepare pedigrees and IBD segments for parental imputation
usage: sibprep [--help] <subcommand>

Subcommands:

  pedigree: build a pedigree from KING relationships and ages/sexes.
  ibd:      reconcile IBD segments of every sibling pair.

";

#[derive(Parser)]
#[clap(name = "sibprep")]
#[clap(about = INFO)]
struct Cli {
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a pedigree from KING relationship inference.
    ///
    /// Parent-offspring pairs are oriented by age: the parent must be at least
    /// 12 years older. Full siblings are grouped into families. The output is a
    /// TSV with columns FID, IID, FATHER_ID and MOTHER_ID.
    ///
    /// Example:
    ///
    ///  $ sibprep pedigree --king sample.kin0 --agesex sample.agesex --output sample.ped
    Pedigree {
        /// a tab-delimited KING relationship file (FID1, ID1, FID2, ID2, InfType)
        #[arg(long, required = true)]
        king: String,
        /// a whitespace-delimited file with IID, sex (M/F) and age columns
        #[arg(long, required = true)]
        agesex: String,
        /// add control families with parents withheld
        #[arg(long, default_value_t = false)]
        control: bool,
        /// the output file path (if not set, uses standard out)
        #[arg(long)]
        output: Option<String>,
    },
    /// Reconcile IBD segments of every sibling pair against the KING segments.
    ///
    /// This will output a TSV with the following columns:
    ///
    ///  - chromosome name
    ///  - first individual
    ///  - second individual
    ///  - start position
    ///  - end position
    ///  - IBD type (0, 1 or 2)
    Ibd {
        /// the PLINK bim file
        #[arg(long, required = true)]
        bim: String,
        /// the KING segments file defining the analyzable intervals
        #[arg(long, required = true)]
        segments: String,
        /// KING IBD segment calls (boundaries as SNP ids)
        #[arg(long, conflicts_with = "ibd")]
        king_ibd: Option<String>,
        /// IBD segment calls in physical coordinates
        #[arg(long)]
        ibd: Option<String>,
        /// a pedigree file (FID, IID, FATHER_ID, MOTHER_ID)
        #[arg(long, conflicts_with_all = ["king", "agesex"])]
        pedigree: Option<String>,
        /// a KING relationship file, used with --agesex instead of --pedigree
        #[arg(long, requires = "agesex")]
        king: Option<String>,
        /// an age/sex file, used with --king
        #[arg(long, requires = "king")]
        agesex: Option<String>,
        /// a JSON config file; the options below override its values
        #[arg(long)]
        config: Option<String>,
        /// the value of a missing parent in the pedigree file (default: 0)
        #[arg(long)]
        pedigree_nan: Option<String>,
        /// chromosomes to process (defaults to every chromosome in the bim file)
        #[arg(long = "chr")]
        chromosomes: Vec<String>,
        /// add control families with parents withheld
        #[arg(long, default_value_t = false)]
        control: bool,
        /// the output file path (if not set, uses standard out)
        #[arg(long)]
        output: Option<String>,
    },
}

fn open_writer(output: Option<&str>) -> Result<Box<dyn Write>, PrepError> {
    Ok(match output {
        Some(filepath) => OutputFile::new(filepath).writer()?,
        None => Box::new(io::stdout()),
    })
}

fn build_pedigree(
    king: &str,
    agesex: &str,
    control: bool,
    output: Option<&str>,
) -> Result<(), PrepError> {
    let pedigree = create_pedigree(king, agesex)?;
    let pedigree = if control {
        add_control(&pedigree)
    } else {
        pedigree
    };
    pedigree.write_tsv(output)
}

#[allow(clippy::too_many_arguments)]
fn reconcile_ibd(
    bim: &str,
    segments: &str,
    ibd: IbdInput<'_>,
    pedigree: Option<&str>,
    king: Option<&str>,
    agesex: Option<&str>,
    config: &PrepConfig,
    output: Option<&str>,
) -> Result<(), PrepError> {
    let pedigree = match (pedigree, king, agesex) {
        (Some(path), _, _) => Pedigree::from_file(path, &config.pedigree_nan)?,
        (None, Some(king), Some(agesex)) => create_pedigree(king, agesex)?,
        _ => {
            return Err(PrepError::ParseError(
                "either --pedigree or both --king and --agesex are required".to_string(),
            ))
        }
    };
    let snps = SnpTable::from_bim(bim)?;
    let prepared = prepare_data(&pedigree, snps, segments, ibd, config)?;

    let mut writer = open_writer(output)?;
    write_ibd_tsv(&mut writer, &prepared.ibd, &prepared.chromosomes)?;
    writer.flush()?;
    Ok(())
}

fn run() -> Result<(), PrepError> {
    let cli = Cli::parse();

    let filter_level = match cli.debug {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();

    match &cli.command {
        Some(Commands::Pedigree {
            king,
            agesex,
            control,
            output,
        }) => build_pedigree(king, agesex, *control, output.as_deref()),
        Some(Commands::Ibd {
            bim,
            segments,
            king_ibd,
            ibd,
            pedigree,
            king,
            agesex,
            config,
            pedigree_nan,
            chromosomes,
            control,
            output,
        }) => {
            let ibd = match (king_ibd, ibd) {
                (Some(path), _) => IbdInput::King(path.as_str()),
                (None, Some(path)) => IbdInput::Precomputed(path.as_str()),
                (None, None) => {
                    return Err(PrepError::ParseError(
                        "one of --king-ibd or --ibd is required".to_string(),
                    ))
                }
            };
            let mut config = match config {
                Some(path) => PrepConfig::from_json(path)?,
                None => PrepConfig::default(),
            };
            if let Some(nan) = pedigree_nan {
                config.pedigree_nan = nan.clone();
            }
            if !chromosomes.is_empty() {
                config.chromosomes = chromosomes.clone();
            }
            config.add_control |= *control;
            reconcile_ibd(
                bim,
                segments,
                ibd,
                pedigree.as_deref(),
                king.as_deref(),
                agesex.as_deref(),
                &config,
                output.as_deref(),
            )
        }
        None => {
            println!("{}\n", INFO);
            std::process::exit(1);
        }
    }
}

fn main() {
    match run() {
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
