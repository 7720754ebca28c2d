//! relayout CLI - rebuild PDF pages as editable HTML

use std::fs;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use crossbeam_channel::Receiver;
use indicatif::{ProgressBar, ProgressStyle};

use relayout::generate::{GenerateOptions, HtmlGenerator, NoOcr, OcrEngine};
use relayout::package::Package;
use relayout::source::{LopdfSource, PageRasterizer, RasterDir, WhiteCanvas};
use relayout::{
    AnalyzeOptions, Analyzer, Command, Document, EditorSession, PageSelection, Progress,
    RegionKind, Stage,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "relayout")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Rebuild PDF pages as editable HTML with cropped images", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output archive
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse, apply edits and write index.html + images/
    Convert {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output zip file, or directory with --dir
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Write a directory instead of a zip archive
        #[arg(long)]
        dir: bool,

        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Number of concurrent OCR calls
        #[arg(long, default_value = "1", env = "RELAYOUT_OCR_WORKERS")]
        ocr_workers: usize,

        /// Directory holding text-detection.rten and text-recognition.rten
        #[arg(long, value_name = "DIR", env = "RELAYOUT_OCR_MODELS")]
        ocr_models: Option<PathBuf>,
    },

    /// Export the detected region model as JSON
    #[command(alias = "analyze")]
    Regions {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Show document and region statistics
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Show version information
    Version,
}

#[derive(Args, Default)]
struct AnalysisArgs {
    /// Directory of pre-rendered page images (page-N.png)
    #[arg(long, value_name = "DIR", env = "RELAYOUT_RASTER_DIR")]
    raster_dir: Option<PathBuf>,

    /// Render scale (pixels per PDF point)
    #[arg(long, default_value = "1.5")]
    scale: f32,

    /// Page range (e.g., "1-10", "1,3,5")
    #[arg(long)]
    pages: Option<String>,

    /// JSON file with a list of editor commands to apply
    #[arg(long, value_name = "FILE")]
    edits: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Convert {
            input,
            output,
            dir,
            analysis,
            ocr_workers,
            ocr_models,
        }) => cmd_convert(
            &input,
            output.as_deref(),
            dir,
            &analysis,
            ocr_workers,
            ocr_models.as_deref(),
        ),
        Some(Commands::Regions {
            input,
            output,
            compact,
            analysis,
        }) => cmd_regions(&input, output.as_deref(), compact, &analysis),
        Some(Commands::Info { input, analysis }) => cmd_info(&input, &analysis),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            if let Some(input) = cli.input {
                let analysis = AnalysisArgs {
                    scale: relayout::analyze::DEFAULT_SCALE,
                    ..Default::default()
                };
                cmd_convert(&input, cli.output.as_deref(), false, &analysis, 1, None)
            } else {
                println!("{}", "Usage: relayout <FILE> [OUTPUT]".yellow());
                println!("       relayout --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    as_dir: bool,
    analysis: &AnalysisArgs,
    ocr_workers: usize,
    ocr_models: Option<&Path>,
) -> CliResult<()> {
    let doc = analyze(input, analysis)?;
    let engine = ocr_engine(ocr_models)?;

    let (tx, rx) = crossbeam_channel::unbounded();
    let bar = show_progress(rx, analysis.quiet);
    let result = HtmlGenerator::new(
        GenerateOptions::new().with_ocr_workers(ocr_workers),
        engine.as_ref(),
    )
    .with_progress(tx)
    .generate(&doc);
    finish_progress(bar);
    let result = result?;

    let package = Package::new(&result, &doc.name);
    let output = output.map(Path::to_path_buf).unwrap_or_else(|| {
        if as_dir {
            PathBuf::from(format!("{}_html", doc.name))
        } else {
            PathBuf::from(format!("{}.zip", doc.name))
        }
    });
    if as_dir {
        package.write_dir(&output)?;
    } else {
        package.write_zip(&output)?;
    }

    println!("{} {}", "Saved to".green(), output.display());
    println!(
        "  {} {} paragraphs, {} images",
        "├─".dimmed(),
        result.stats.paragraph_count,
        result.stats.image_count
    );
    println!(
        "  {} {} OCR regions ({} failed)",
        "└─".dimmed(),
        result.stats.ocr_count,
        result.stats.ocr_failures
    );
    Ok(())
}

fn cmd_regions(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    analysis: &AnalysisArgs,
) -> CliResult<()> {
    let doc = analyze(input, analysis)?;
    let json = doc.to_json(!compact)?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }
    Ok(())
}

fn cmd_info(input: &Path, analysis: &AnalysisArgs) -> CliResult<()> {
    let header = relayout::check_pdf_path(input)?;
    let doc = analyze(input, analysis)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), header);
    println!("{}: {}", "Pages analysed".bold(), doc.page_count());
    println!("{}: {}", "Text regions".bold(), doc.count(RegionKind::Text));
    println!("{}: {}", "Image regions".bold(), doc.count(RegionKind::Image));

    println!();
    println!("{}", "Pages".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for page in &doc.pages {
        let (width, height) = page.dimensions();
        let overlaps = page.overlapping_regions().len();
        let line = format!(
            "page {}: {}x{}px, {} text, {} image",
            page.number,
            width,
            height,
            page.count(RegionKind::Text),
            page.count(RegionKind::Image)
        );
        if overlaps > 0 {
            println!("{} {}", line, format!("({} overlaps)", overlaps).yellow());
        } else {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "relayout".cyan().bold(), relayout::VERSION);
    println!("PDF layout reconstruction tool");
    println!();
    println!(
        "OCR support: {}",
        if cfg!(feature = "ocr") { "ocrs" } else { "disabled" }
    );
    println!("License: MIT");
}

/// Analyse `input`, then replay `--edits` if given.
fn analyze(input: &Path, args: &AnalysisArgs) -> CliResult<Document> {
    let pages = match &args.pages {
        Some(p) => PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e))?,
        None => PageSelection::All,
    };
    let options = AnalyzeOptions::new().with_scale(args.scale).with_pages(pages);

    let rasterizer: Box<dyn PageRasterizer> = match &args.raster_dir {
        Some(dir) => Box::new(RasterDir::new(dir)),
        None => {
            log::info!("No --raster-dir given; image regions will not be detected");
            Box::new(WhiteCanvas)
        }
    };
    let source = LopdfSource::open(input, rasterizer)?;
    let name = input
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();

    let (tx, rx) = crossbeam_channel::unbounded();
    let bar = show_progress(rx, args.quiet);
    let doc = Analyzer::new(options).with_progress(tx).run(&source, name);
    finish_progress(bar);
    let doc = doc?;

    match &args.edits {
        Some(path) => {
            let commands = Command::parse_batch(&fs::read_to_string(path)?)?;
            let count = commands.len();
            let mut session = EditorSession::new(doc);
            session.apply_all(commands)?;
            log::info!("Applied {} edits from {}", count, path.display());
            Ok(session.into_document())
        }
        None => Ok(doc),
    }
}

fn ocr_engine(models: Option<&Path>) -> CliResult<Box<dyn OcrEngine>> {
    #[cfg(feature = "ocr")]
    if let Some(dir) = models {
        let models = relayout::generate::OcrModels::from_dir(dir);
        return Ok(Box::new(relayout::generate::OcrsEngine::new(&models)?));
    }

    #[cfg(not(feature = "ocr"))]
    if models.is_some() {
        eprintln!(
            "{}: built without the `ocr` feature; --ocr-models ignored",
            "Warning".yellow().bold()
        );
    }

    Ok(Box::new(NoOcr))
}

/// Drive a progress bar from progress events until the sender is dropped.
fn show_progress(rx: Receiver<Progress>, quiet: bool) -> Option<JoinHandle<()>> {
    if quiet {
        return None;
    }
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    Some(std::thread::spawn(move || {
        for event in rx {
            match event {
                Progress::Started { stage, total } => {
                    pb.set_length(total as u64);
                    pb.set_position(0);
                    pb.set_message(stage_label(stage));
                }
                Progress::PageStarted { stage, page } => {
                    pb.set_message(format!("{} page {}", stage_label(stage), page));
                }
                Progress::PageFinished { .. } => pb.inc(1),
                Progress::Finished { .. } => pb.finish_and_clear(),
            }
        }
        pb.finish_and_clear();
    }))
}

fn finish_progress(bar: Option<JoinHandle<()>>) {
    if let Some(handle) = bar {
        let _ = handle.join();
    }
}

fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Analyze => "Analysing",
        Stage::Generate => "Generating",
    }
}
