//! Voter slip command line tool.
//!
//! Usage:
//!   voter_slip extract <tokens.json|roll.pdf> -o records.json
//!   voter_slip generate <records.json> -o slips.pdf [--template FILE] [--font FILE]
//!                       [--page A4|Legal] [--aspect 1:1|3:4] [--center TEXT] [--area TEXT]
//!                       [--config run.json]
//!   voter_slip template-info <template.pdf|image>
//!   voter_slip sample -o records.json
//!
//! Logging is controlled with `RUST_LOG` (default `info`).

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use voter_slip::compose::compose;
use voter_slip::config::{AspectRatio, GenerateConfig, PageSize};
use voter_slip::model::{records_from_json, records_to_json, sample_records, GlobalInfo};
use voter_slip::pipeline::{ExtractionPipeline, JsonTokenSource, PdfTextSource, TokenSource};
use voter_slip::template::{is_pdf, TemplateDescriptor};
use voter_slip::writer::FontResource;
use voter_slip::{Error, Result};

const USAGE: &str = "usage: voter_slip <extract|generate|template-info|sample> [options]
  extract <tokens.json|roll.pdf> -o <records.json>
  generate <records.json> -o <slips.pdf> [--template FILE] [--font FILE]
           [--page A4|Legal] [--aspect 1:1|3:4] [--center TEXT] [--area TEXT] [--config FILE]
  template-info <template>
  sample -o <records.json>";

#[derive(Debug, Default)]
struct CliArgs {
    command: String,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    template: Option<PathBuf>,
    font: Option<PathBuf>,
    page: Option<String>,
    aspect: Option<String>,
    center: Option<String>,
    area: Option<String>,
    config: Option<PathBuf>,
}

impl CliArgs {
    fn from_args() -> Result<Self> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut cli = CliArgs::default();

        let mut i = 0;
        while i < args.len() {
            let arg = args[i].as_str();
            let mut value = || {
                i += 1;
                args.get(i)
                    .cloned()
                    .ok_or_else(|| Error::Config(format!("{} needs a value", arg)))
            };
            match arg {
                "-o" | "--output" => cli.output = Some(PathBuf::from(value()?)),
                "--template" => cli.template = Some(PathBuf::from(value()?)),
                "--font" => cli.font = Some(PathBuf::from(value()?)),
                "--page" => cli.page = Some(value()?),
                "--aspect" => cli.aspect = Some(value()?),
                "--center" => cli.center = Some(value()?),
                "--area" => cli.area = Some(value()?),
                "--config" => cli.config = Some(PathBuf::from(value()?)),
                flag if flag.starts_with("--") => {
                    return Err(Error::Config(format!("unknown option {}", flag)));
                },
                positional if cli.command.is_empty() => cli.command = positional.to_string(),
                positional if cli.input.is_none() => cli.input = Some(PathBuf::from(positional)),
                positional => {
                    return Err(Error::Config(format!("unexpected argument {}", positional)));
                },
            }
            i += 1;
        }
        Ok(cli)
    }

    fn input(&self) -> Result<&Path> {
        self.input
            .as_deref()
            .ok_or_else(|| Error::Config("missing input file".to_string()))
    }

    fn output(&self) -> Result<&Path> {
        self.output
            .as_deref()
            .ok_or_else(|| Error::Config("missing -o <output>".to_string()))
    }
}

fn extract(cli: &CliArgs) -> Result<()> {
    let input = cli.input()?;
    let bytes = fs::read(input)?;
    let mut source: Box<dyn TokenSource> = if is_pdf(&bytes) {
        Box::new(PdfTextSource::from_bytes(&bytes)?)
    } else {
        Box::new(JsonTokenSource::from_json(&String::from_utf8_lossy(&bytes))?)
    };

    let report = ExtractionPipeline::new().run(source.as_mut())?;
    fs::write(cli.output()?, records_to_json(&report.records)?)?;
    println!(
        "{} records from {} pages ({} blocks, {} rejected)",
        report.records.len(),
        report.pages,
        report.clusters,
        report.rejected
    );
    Ok(())
}

fn generate(cli: &CliArgs) -> Result<()> {
    let mut run = match &cli.config {
        Some(path) => GenerateConfig::from_json(&fs::read_to_string(path)?)?,
        None => GenerateConfig::default(),
    };
    if let Some(page) = &cli.page {
        run.composition.page_size = page.parse::<PageSize>()?;
    }
    if let Some(aspect) = &cli.aspect {
        run.composition.aspect_ratio = aspect.parse::<AspectRatio>()?;
    }
    if let Some(center) = &cli.center {
        run.center = center.clone();
    }
    if let Some(area) = &cli.area {
        run.area = area.clone();
    }

    let records = records_from_json(&fs::read_to_string(cli.input()?)?)?;
    let font = cli.font.as_ref().map(FontResource::from_file).transpose()?;
    let descriptor = match &cli.template {
        Some(path) => {
            let descriptor = TemplateDescriptor::from_file(path, run.composition.aspect_ratio)?;
            if descriptor.mappings().is_empty() {
                log::warn!("{} has no {{{{KEY}}}} placeholders; slips will be background only", path.display());
            }
            descriptor
        },
        None => TemplateDescriptor::builtin(font.as_ref())?,
    };

    let info = GlobalInfo::new(run.center, run.area);
    let pdf = compose(&records, &descriptor, font.as_ref(), &run.composition, &info)?;
    let output = cli.output()?;
    fs::write(output, &pdf)?;
    println!("{} slips written to {} ({} bytes)", records.len(), output.display(), pdf.len());
    Ok(())
}

fn template_info(cli: &CliArgs) -> Result<()> {
    let aspect = match &cli.aspect {
        Some(aspect) => aspect.parse::<AspectRatio>()?,
        None => AspectRatio::default(),
    };
    let descriptor = TemplateDescriptor::from_file(cli.input()?, aspect)?;
    let info = serde_json::json!({
        "kind": descriptor.kind(),
        "canvasWidth": descriptor.canvas_width(),
        "canvasHeight": descriptor.canvas_height(),
        "mappings": descriptor.mappings().values().collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

fn sample(cli: &CliArgs) -> Result<()> {
    let records = sample_records();
    fs::write(cli.output()?, records_to_json(&records)?)?;
    println!("{} sample records written", records.len());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let result = CliArgs::from_args().and_then(|cli| match cli.command.as_str() {
        "extract" => extract(&cli),
        "generate" => generate(&cli),
        "template-info" => template_info(&cli),
        "sample" => sample(&cli),
        _ => {
            eprintln!("{}", USAGE);
            Err(Error::Config(format!("unknown command '{}'", cli.command)))
        },
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_soft() => {
            eprintln!("{}. Try a clearer scan or check the page layout.", e);
            ExitCode::from(2)
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}
