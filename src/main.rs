use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::PathBuf,
    time::Instant,
};

use clap::{Parser, Subcommand};
use hmmtagger::{read_untagged, Corpus, HmmModel, Model, Result, Smoothing, Tagger, Trainer};

#[derive(Debug, Parser)]
#[command(version, about)]
#[command(propagate_version = true)]
struct Argv {
    /// increase logging verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Estimate a model from tagged corpora (one `word tag` per line, blank line between sentences)
    Train {
        /// write the model to a file (MODEL); `.bson` selects BSON, otherwise JSON
        #[arg(short, long, value_name = "MODEL")]
        model: PathBuf,
        /// additive smoothing discount (1.0 is Laplace smoothing)
        #[arg(short, long, required_unless_present = "no_smoothing")]
        discount: Option<f64>,
        /// estimate plain relative frequencies
        #[arg(long, conflicts_with = "discount")]
        no_smoothing: bool,
        /// set a training parameter (NAME=VALUE)
        #[arg(short, value_name = "NAME=VALUE")]
        parameters: Vec<String>,
        #[arg(required = true, value_name = "FILE")]
        datasets: Vec<PathBuf>,
    },
    /// Assign tags to untagged corpora (one word per line); reads STDIN without FILE
    Tag {
        /// read a model from a file (MODEL)
        #[arg(short, long, value_name = "MODEL")]
        model: PathBuf,
        #[arg(value_name = "FILE")]
        datasets: Vec<PathBuf>,
    },
    /// Output the model stored in the file (MODEL) in a plain-text format
    Dump {
        #[arg(short, long, value_name = "MODEL")]
        model: PathBuf,
    },
}

fn train(
    model: PathBuf,
    discount: Option<f64>,
    parameters: &[String],
    datasets: &[PathBuf],
) -> Result<()> {
    let smoothing = match discount {
        Some(d) => Smoothing::additive(d),
        None => Smoothing::disabled(),
    };
    let mut trainer = Trainer::new(smoothing);
    for s in parameters {
        match s.split_once('=') {
            Some((name, value)) => trainer.set(name, value)?,
            None => log::warn!("ignoring parameter without value: {s}"),
        }
    }
    let mut corpus = Corpus::default();
    for fpath in datasets {
        log::info!("reading dataset from: {}", fpath.display());
        let f = File::open(fpath)?;
        corpus.sentences.extend(Corpus::read_tagged(BufReader::new(f))?.sentences);
    }
    log::info!("read {} sentences, {} items", corpus.len(), corpus.total_items());
    trainer.train(&corpus)?.save(&model)
}

fn tag(model: PathBuf, datasets: &[PathBuf]) -> Result<()> {
    let model = HmmModel::from_path(&model)?;
    let tagger = model.tagger()?;
    let mut sentences = Vec::new();
    if datasets.is_empty() {
        sentences = read_untagged(io::stdin().lock())?;
    }
    for fpath in datasets {
        let f = File::open(fpath)?;
        sentences.extend(read_untagged(BufReader::new(f))?);
    }

    let begin = Instant::now();
    let mut out = BufWriter::new(io::stdout().lock());
    write_tagged(&tagger, &sentences, &mut out)?;
    out.flush()?;
    log::info!("tagged {} sentences in {:?}", sentences.len(), begin.elapsed());
    Ok(())
}

/// Writes one `word\ttag` line per token and a blank line after each sentence.
fn write_tagged<W: Write>(tagger: &Tagger, sentences: &[Vec<String>], out: &mut W) -> Result<()> {
    for words in sentences {
        let tags = tagger.tag(words)?;
        for (word, tag) in words.iter().zip(&tags) {
            writeln!(out, "{word}\t{tag}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn dump(model: PathBuf) -> Result<()> {
    let model = HmmModel::from_path(&model)?;
    let mut out = BufWriter::new(io::stdout().lock());
    model.dump(&mut out)?;
    out.flush()?;
    Ok(())
}

fn main() {
    let argv = Argv::parse();
    let level = match argv.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new().filter_level(level).parse_default_env().init();
    log::debug!("argv: {:?}", argv);

    let r = match argv.command {
        Command::Train { model, discount, parameters, datasets, .. } => {
            train(model, discount, &parameters, &datasets)
        }
        Command::Tag { model, datasets } => tag(model, &datasets),
        Command::Dump { model } => dump(model),
    };
    if let Err(e) = r {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
