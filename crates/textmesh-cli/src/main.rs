//! textmesh CLI - drives one offline compile per invocation

mod cli;
mod collab;

use std::fs;
use std::sync::Arc;

use clap::Parser;

use textmesh_core::cache::CACHE_FILE_NAME;
use textmesh_core::{CompileOutcome, Compiler, Result};
use textmesh_export::{ATLAS_FILE_NAME, DOCUMENT_FILE_NAME};
use textmesh_fontdb::DirectoryCatalog;

use crate::collab::{MsdfTool, ShapeTool};

fn main() {
    let args = match cli::Cli::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // Help and version land here too; only real usage errors
            // are failures.
            let _ = err.print();
            std::process::exit(if err.use_stderr() { 1 } else { 0 });
        }
    };

    let default_filter = if args.quiet { "error" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(err) = run(&args) {
        eprintln!("textmesh: {err}");
        std::process::exit(1);
    }
}

fn run(args: &cli::Cli) -> Result<()> {
    let model = textmesh_input::load(&args.styles, &args.strings)?;
    let catalog = Arc::new(DirectoryCatalog::scan(&args.fonts_dir)?);

    fs::create_dir_all(&args.out_dir)?;

    let compiler = Compiler::builder()
        .shaper(Arc::new(ShapeTool::new(&args.shape_tool)))
        .raster(Arc::new(MsdfTool::new(&args.msdf_tool)))
        .catalog(catalog)
        .cache_file(args.out_dir.join(CACHE_FILE_NAME))
        .build()?;

    let doc = match compiler.compile(&model, &args.language)? {
        CompileOutcome::UpToDate => return Ok(()),
        CompileOutcome::Built(doc) => doc,
    };

    textmesh_export::write_document(&doc, &args.out_dir.join(DOCUMENT_FILE_NAME))?;
    if let Some(atlas) = &doc.atlas {
        textmesh_export::write_atlas_png(atlas, &args.out_dir.join(ATLAS_FILE_NAME))?;
    }

    if args.debug_pages {
        for string in &doc.strings {
            for (number, page) in string.pages.iter().enumerate() {
                let path = args.out_dir.join(format!("{}.{number}.png", string.key));
                textmesh_export::debug::write_page_bounds(page, string.width, string.height, &path)?;
            }
        }
    }

    Ok(())
}
