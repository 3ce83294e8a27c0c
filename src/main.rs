use anyhow::Result;
use clap::Parser;
use linedup::{init_tracing_once, LineDedup, DEFAULT_BATCH_LIMIT};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "linedup", version)]
#[command(about = "Remove duplicate lines from a text file larger than memory")]
#[command(after_help = "Make sure the remaining storage is greater than the size of <INPUT>.")]
struct Args {
    #[arg(short, long, help = "The path of the input file")]
    input: PathBuf,

    #[arg(short, long, help = "The path of the output file [default: out.txt next to the input]")]
    output: Option<PathBuf>,

    #[arg(short = 'b', long = "batch", default_value_t = DEFAULT_BATCH_LIMIT,
          help = "The maximum number of lines read at once")]
    batch: usize,

    #[arg(short = 'g', long = "groups",
          help = "The number of partition files the input is split into [default: input size / 32MiB]")]
    groups: Option<usize>,

    #[arg(long, help = "Directory for partition files [default: temp next to the input]")]
    scratch_dir: Option<PathBuf>,

    #[arg(long, help = "Disable progress bars")]
    no_progress: bool,

    #[arg(long, help = "Skip the free-space check before partitioning")]
    skip_space_check: bool,

    #[arg(long, help = "Print the run report as JSON on stdout")]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing_once();
    let started = Instant::now();

    let mut job = LineDedup::new()
        .input(&args.input)
        .batch_limit(args.batch)
        .progress(!args.no_progress)
        .check_free_space(!args.skip_space_check);
    if let Some(out) = &args.output {
        job = job.output(out);
    }
    if let Some(g) = args.groups {
        job = job.group_count(g);
    }
    if let Some(dir) = &args.scratch_dir {
        job = job.scratch_dir(dir);
    }

    let report = job.run()?;
    tracing::info!("All done! Total time: {}ms", started.elapsed().as_millis());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
