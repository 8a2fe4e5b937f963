use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use color_schemes::SchemeSummary;
use pdf_core::PdfDocument;
use recolor::{
    clamp_preview_dpi, default_output_path, render_preview, Config, ConversionReport, Converter,
    NoProgress, ProgressEvent,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{ConvertArgs, PreviewArgs};

/// Fold command-line overrides into the loaded configuration
fn apply_convert_overrides(mut config: Config, args: &ConvertArgs) -> Config {
    if let Some(scheme) = &args.scheme {
        config.convert.scheme = scheme.clone();
    }
    if let Some(mode) = args.mode {
        config.convert.mode = mode.into();
    }
    if args.keep_page_fills {
        config.convert.replace_page_fills = false;
    }
    if args.no_compress {
        config.convert.compress = false;
    }
    config
}

pub async fn convert(args: ConvertArgs, config: Config) -> anyhow::Result<()> {
    let config = apply_convert_overrides(config, &args);
    let registry = config.registry()?;
    let options = config.convert_options(&registry)?;

    let input = args.input.clone();
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&input));
    debug!(?options, "resolved conversion options");

    let (tx, mut rx) = mpsc::unbounded_channel::<ProgressEvent>();
    let converter = Converter::new(options);
    let worker = {
        let (input, output) = (input.clone(), output.clone());
        tokio::task::spawn_blocking(move || {
            let mut sink = |event: ProgressEvent| {
                let _ = tx.send(event);
            };
            converter.convert(&input, &output, &mut sink)
        })
    };

    while let Some(event) = rx.recv().await {
        print_progress(event);
    }

    let report = worker
        .await
        .context("conversion worker stopped unexpectedly")?
        .with_context(|| format!("Conversion failed: {}", input.display()))?;

    if let Some(png_path) = &args.preview {
        let bytes = std::fs::read(&output)
            .with_context(|| format!("failed to read {}", output.display()))?;
        write_preview(&bytes, config.preview.page, config.preview.dpi, png_path)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &output);
    }
    Ok(())
}

fn print_progress(event: ProgressEvent) {
    match event {
        ProgressEvent::Started { pages } => eprintln!("Converting PDF colors... ({pages} pages)"),
        ProgressEvent::PageDone { page, pages } => {
            let percent = event.percent().unwrap_or(0);
            eprintln!("  page {page}/{pages} ({percent}%)");
        }
        ProgressEvent::Saving => eprintln!("Saving..."),
        ProgressEvent::Finished => {}
    }
}

fn print_report(report: &ConversionReport, output: &Path) {
    println!("Conversion completed successfully!");
    println!("  Output:  {}", output.display());
    println!("  Scheme:  {} ({} mode)", report.scheme, report.mode);
    println!("  Pages:   {}", report.pages);
    match report.mode {
        recolor::Mode::Remap => {
            println!(
                "  Text objects recolored: {}, page fills replaced: {}",
                report.text_objects, report.page_fills_replaced
            );
            if report.pages_skipped > 0 {
                println!("  Pages left unchanged (undecodable content): {}", report.pages_skipped);
            }
        }
        recolor::Mode::Rebuild => {
            println!("  Text spans redrawn: {}", report.spans);
            if report.substituted_chars > 0 {
                println!(
                    "  Characters substituted (not in Helvetica): {}",
                    report.substituted_chars
                );
            }
            if !report.dropped_non_text.is_empty() {
                println!(
                    "  Images/graphics not carried over on pages: {:?}",
                    report.dropped_non_text
                );
            }
        }
    }
}

pub fn schemes(config: &Config, json: bool) -> anyhow::Result<()> {
    let registry = config.registry()?;

    if json {
        let summaries: Vec<SchemeSummary> = registry.iter().map(|s| s.summary()).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    for (i, scheme) in registry.iter().enumerate() {
        if i > 0 {
            println!();
        }
        if scheme.name != scheme.key {
            println!("[{}]", scheme.key);
        }
        println!("{}", scheme.describe());
    }
    Ok(())
}

fn default_preview_path(input: &Path, page: usize) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    input.with_file_name(format!("{stem}_page{page}.png"))
}

/// Requested resolution, clamped to what the renderer supports
fn preview_dpi(args: &PreviewArgs, config: &Config) -> u32 {
    let requested = args.dpi.unwrap_or(config.preview.dpi);
    let dpi = clamp_preview_dpi(requested);
    if dpi != requested {
        warn!(requested, dpi, "preview dpi out of range; clamped");
    }
    dpi
}

pub fn preview(args: PreviewArgs, config: &Config) -> anyhow::Result<()> {
    let page = args.page.unwrap_or(config.preview.page);
    let dpi = preview_dpi(&args, config);
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_preview_path(&args.input, page));

    let source = std::fs::read(&args.input)
        .with_context(|| format!("Could not open PDF: {}", args.input.display()))?;

    let bytes = match &args.scheme {
        Some(name) => {
            let registry = config.registry()?;
            let mut config = config.clone();
            config.convert.scheme = name.clone();
            let converter = Converter::new(config.convert_options(&registry)?);
            let (converted, _) = converter.convert_bytes(&source, &mut NoProgress)?;
            converted
        }
        None => source,
    };

    write_preview(&bytes, page, dpi, &output)
}

fn write_preview(pdf: &[u8], page: usize, dpi: u32, output: &Path) -> anyhow::Result<()> {
    let image = render_preview(pdf, page, dpi).context("Could not generate preview")?;
    std::fs::write(output, &image.png)
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(
        path = %output.display(),
        width = image.width,
        height = image.height,
        "preview written"
    );
    Ok(())
}

pub fn info(input: &Path) -> anyhow::Result<()> {
    if !input.exists() {
        bail!("File not found: {}", input.display());
    }
    let doc = PdfDocument::open(input).with_context(|| format!("Could not open PDF: {}", input.display()))?;

    println!("{}", input.display());
    println!("  Valid PDF: yes");
    println!("  Pages:     {}", doc.page_count());
    if let Ok(first) = doc.page_box(1) {
        println!("  Page 1:    {:.0} x {:.0} pt", first.width(), first.height());
    }
    Ok(())
}
