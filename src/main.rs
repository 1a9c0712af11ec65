//! Folio CLI: paginate a text file and print the page table

use clap::{Parser, ValueEnum};
use folio::layout::{Margins, Orientation, PageSetup};
use folio::{codec, FontLibrary, Footnote, FootnoteDirectory, LayoutConfig, PaginatedLayout};
use serde::Deserialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Paper {
    Letter,
    A4,
}

#[derive(Parser, Debug)]
#[command(name = "folio", about = "Paginate a manuscript with footnotes")]
struct Args {
    /// Plain text of the document (UTF-8)
    input: PathBuf,

    /// Serialized attribute runs for the text
    #[arg(long)]
    attributes: Option<PathBuf>,

    /// JSON array of footnotes: [{"anchor": 120, "number": 1, "text": "..."}]
    #[arg(long)]
    footnotes: Option<PathBuf>,

    /// Layout config JSON
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "letter")]
    paper: Paper,

    /// Uniform margin in points
    #[arg(long)]
    margin: Option<f32>,

    #[arg(long)]
    landscape: bool,

    /// Print the full layout result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Deserialize)]
struct FootnoteInput {
    anchor: usize,
    number: u32,
    text: String,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let plain = std::fs::read_to_string(&args.input)
        .map_err(|e| format!("Failed to read {}: {e}", args.input.display()))?;
    let attributes = match &args.attributes {
        Some(path) => std::fs::read(path)?,
        None => Vec::new(),
    };
    let text = codec::decode(&attributes, &plain);

    let mut setup = match args.paper {
        Paper::Letter => PageSetup::letter(),
        Paper::A4 => PageSetup::a4(),
    };
    if let Some(margin) = args.margin {
        setup = setup.with_margins(Margins::uniform(margin));
    }
    if args.landscape {
        setup.orientation = Orientation::Landscape;
    }

    let config = match &args.config {
        Some(path) => LayoutConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => LayoutConfig::default(),
    };

    let footnotes: Vec<Footnote> = match &args.footnotes {
        Some(path) => {
            let inputs: Vec<FootnoteInput> = serde_json::from_str(&std::fs::read_to_string(path)?)?;
            inputs
                .into_iter()
                .map(|note| Footnote::new(note.anchor, note.number, note.text))
                .collect()
        }
        None => Vec::new(),
    };

    let fonts = Arc::new(FontLibrary::default());
    let directory = FootnoteDirectory::new(footnotes, config.footnote.clone(), Arc::clone(&fonts));
    let mut layout = PaginatedLayout::new(text, setup, fonts).with_config(config);
    let result = layout.calculate_layout(Some(&directory))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&*result)?);
        return Ok(());
    }

    println!(
        "{} page(s), {} chars, {} pass(es){}{}",
        result.page_count(),
        result.text_length,
        result.iterations,
        if result.converged { "" } else { ", not converged" },
        if result.truncated { ", truncated" } else { "" }
    );
    for page in &result.pages {
        println!(
            "{:>4}  {:>7}..{:<7}  {:>7.1} / {:<7.1}  {} footnote(s){}",
            page.page_index + 1,
            page.character_range.start,
            page.character_range.end,
            page.used_height,
            page.container_height,
            page.footnote_ids.len(),
            if page.is_overfull() { "  OVERFULL" } else { "" }
        );
    }
    Ok(())
}
