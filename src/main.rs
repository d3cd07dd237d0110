//! cvforge – command-line CV → PDF exporter.
//!
//! Usage:
//!   cvforge <cv.json> [output.pdf] [--template ID] [--plan free|premium]
//!           [--font FILE.ttf] [--config FILE.json] [--layout-json FILE]
//!   cvforge --list-templates
//!
//! If `output.pdf` is omitted the PDF is written next to the input, named
//! after the CV owner (e.g. `سارة أحمد.pdf`).

use std::{env, fs, path::PathBuf, process};

use cv_forge::catalog::TemplateRegistry;
use cv_forge::export::{pdf_filename, DocumentSink, FileSink};
use cv_forge::fonts::FontManager;
use cv_forge::gate::Plan;
use cv_forge::model::CvDocument;
use cv_forge::pipeline::{compose_cv_region, render_cv_pdf, PipelineConfig};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut input_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut template: Option<String> = None;
    let mut plan = Plan::Free;
    let mut font_paths: Vec<PathBuf> = Vec::new();
    let mut config_path: Option<PathBuf> = None;
    let mut layout_json: Option<PathBuf> = None;
    let mut list_templates = false;
    let mut positional = 0usize;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--template" | "-t" => template = Some(flag_value(&mut iter, arg, &args[0])),
            "--plan" | "-p" => {
                let v = flag_value(&mut iter, arg, &args[0]);
                plan = match v.parse() {
                    Ok(p) => p,
                    Err(e) => fail(&e),
                };
            }
            "--font" | "-f" => font_paths.push(PathBuf::from(flag_value(&mut iter, arg, &args[0]))),
            "--config" | "-c" => config_path = Some(PathBuf::from(flag_value(&mut iter, arg, &args[0]))),
            "--layout-json" => layout_json = Some(PathBuf::from(flag_value(&mut iter, arg, &args[0]))),
            "--list-templates" => list_templates = true,
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
            path => {
                if positional == 0 {
                    input_path = Some(PathBuf::from(path));
                } else if positional == 1 {
                    output_path = Some(PathBuf::from(path));
                } else {
                    eprintln!("Unexpected argument: {path}");
                    print_usage(&args[0]);
                    process::exit(1);
                }
                positional += 1;
            }
        }
    }

    let registry = TemplateRegistry::standard();
    if list_templates {
        println!("{}", registry.to_json());
        return;
    }

    let input = match input_path {
        Some(p) => p,
        None => {
            eprintln!("Error: no input file specified.");
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    let config = match &config_path {
        Some(path) => match fs::read_to_string(path) {
            Ok(json) => PipelineConfig::from_json(&json)
                .unwrap_or_else(|e| fail(&format!("{}: {e}", path.display()))),
            Err(e) => fail(&format!("Error reading '{}': {e}", path.display())),
        },
        None => PipelineConfig::default(),
    };

    let json = fs::read_to_string(&input)
        .unwrap_or_else(|e| fail(&format!("Error reading '{}': {e}", input.display())));
    let mut doc = CvDocument::from_json(&json).unwrap_or_else(|e| fail(&e.to_string()));
    if template.is_some() {
        doc.template_id = template;
    }
    let mut fonts = FontManager::new();
    for (i, path) in font_paths.iter().enumerate() {
        let bytes = fs::read(path)
            .unwrap_or_else(|e| fail(&format!("Error reading font '{}': {e}", path.display())));
        // First font is the regular face, a second one the bold face.
        if let Err(e) = fonts.load_font("Helvetica", i == 1, false, bytes) {
            fail(&format!("{}: {e}", path.display()));
        }
    }
    fonts.ensure_default();

    if let Some(path) = &layout_json {
        let region = compose_cv_region(&doc, &registry, &fonts);
        match serde_json::to_string_pretty(&region) {
            Ok(json) => {
                if let Err(e) = fs::write(path, json) {
                    fail(&format!("Error writing '{}': {e}", path.display()));
                }
            }
            Err(e) => fail(&e.to_string()),
        }
    }

    let (bytes, export) = match render_cv_pdf(&doc, &registry, plan, &config, &fonts) {
        Ok(v) => v,
        Err(e) => fail(&format!("Error generating PDF: {e}")),
    };

    let output = output_path.unwrap_or_else(|| {
        let dir = input.parent().map(PathBuf::from).unwrap_or_default();
        dir.join(doc.export_filename())
    });
    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    if let Err(e) = fs::create_dir_all(&dir) {
        fail(&format!("Error creating output directory: {e}"));
    }
    let name = output
        .file_name()
        .map(|n| pdf_filename(&n.to_string_lossy()))
        .unwrap_or_else(|| doc.export_filename());

    match FileSink::new(dir).save(&name, &bytes) {
        Ok(location) => eprintln!(
            "Wrote '{location}' ({} bytes, {})",
            bytes.len(),
            if export.has_watermark() {
                "watermarked"
            } else {
                "no watermark"
            }
        ),
        Err(e) => fail(&format!("Error writing '{name}': {e}")),
    }
}

fn flag_value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str, prog: &str) -> String {
    match iter.next() {
        Some(v) => v.clone(),
        None => {
            eprintln!("Missing value for {flag}");
            print_usage(prog);
            process::exit(1);
        }
    }
}

fn fail(msg: &str) -> ! {
    eprintln!("{msg}");
    process::exit(1);
}

fn print_usage(prog: &str) {
    eprintln!("cvforge – CV to PDF exporter (cv-forge)");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <cv.json> [output.pdf] [--template ID] [--plan free|premium]");
    eprintln!("  {prog} --list-templates");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <cv.json>        CV document as JSON");
    eprintln!("  [output.pdf]     Output path (default: owner's name next to the input)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --template, -t   Template id (default: the document's, else modern-arabic)");
    eprintln!("  --plan, -p       free (watermarked, free templates only) or premium");
    eprintln!("  --font, -f       TTF/OTF file; repeat once for a bold face");
    eprintln!("  --config, -c     Pipeline config JSON");
    eprintln!("  --layout-json    Also write the laid-out region as JSON");
    eprintln!("  --list-templates Print the template catalog as JSON");
    eprintln!("  --help           Print this message");
}
