//! The compile pipeline: tables in, packed document out
//!
//! One [`Compiler`] owns the three collaborator handles and drives the
//! whole run: markup expansion, shaping, glyph interning, the cache
//! gates, rasterization, and atlas baking. Control flows top to bottom
//! exactly once per invocation; the only branch is how early the cache
//! lets us stop.
//!
//! Two gates, checked in order:
//!
//! 1. The source-table hash. A hit means nothing relevant changed and
//!    the run ends before any shaping work.
//! 2. The used-glyph-set hash, known only after shaping. A hit reuses
//!    the persisted UV table and skips rasterization and packing.

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info};

use crate::arena::Arena;
use crate::atlas;
use crate::cache::{CacheRecord, CACHE_FILE_NAME};
use crate::error::{Result, TextmeshError};
use crate::markup;
use crate::registry::GlyphRegistry;
use crate::traits::{FontCatalog, PageInput, RasterClient, ResolvedRun, ShapingService};
use crate::types::{
    AtlasImage, CompiledDocument, CompiledString, ContentModel, LocalizedString, MarkupPage,
    TypesetGlyph, TypesetPage, UvRect,
};

/// What one invocation produced.
#[derive(Debug)]
pub enum CompileOutcome {
    /// Source-hash hit: the previous outputs are already current.
    UpToDate,
    /// A rebuild ran; the document is ready to serialize. `atlas` is
    /// `None` inside when the glyph-set gate reused the packed UVs.
    Built(CompiledDocument),
}

pub struct Compiler {
    shaper: Arc<dyn ShapingService>,
    raster: Arc<dyn RasterClient>,
    catalog: Arc<dyn FontCatalog>,
    cache_path: PathBuf,
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("cache_path", &self.cache_path)
            .finish_non_exhaustive()
    }
}

/// Assemble a [`Compiler`] piece by piece.
#[derive(Default)]
pub struct CompilerBuilder {
    shaper: Option<Arc<dyn ShapingService>>,
    raster: Option<Arc<dyn RasterClient>>,
    catalog: Option<Arc<dyn FontCatalog>>,
    cache_path: Option<PathBuf>,
}

impl CompilerBuilder {
    pub fn shaper(mut self, shaper: Arc<dyn ShapingService>) -> Self {
        self.shaper = Some(shaper);
        self
    }

    pub fn raster(mut self, raster: Arc<dyn RasterClient>) -> Self {
        self.raster = Some(raster);
        self
    }

    pub fn catalog(mut self, catalog: Arc<dyn FontCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Where the cache record lives. Defaults to [`CACHE_FILE_NAME`] in
    /// the working directory.
    pub fn cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<Compiler> {
        Ok(Compiler {
            shaper: self
                .shaper
                .ok_or_else(|| TextmeshError::Config("no shaping service configured".into()))?,
            raster: self
                .raster
                .ok_or_else(|| TextmeshError::Config("no raster client configured".into()))?,
            catalog: self
                .catalog
                .ok_or_else(|| TextmeshError::Config("no font catalog configured".into()))?,
            cache_path: self.cache_path.unwrap_or_else(|| CACHE_FILE_NAME.into()),
        })
    }
}

impl Compiler {
    pub fn builder() -> CompilerBuilder {
        CompilerBuilder::default()
    }

    /// Run the whole pipeline for one language.
    pub fn compile(&self, model: &ContentModel, language: &str) -> Result<CompileOutcome> {
        let cache = CacheRecord::load(&self.cache_path);

        if let Some(record) = &cache {
            if record.source_hash == model.source_hash {
                info!("source tables unchanged; nothing to do");
                return Ok(CompileOutcome::UpToDate);
            }
        }

        let lang = model
            .language_index(language)
            .ok_or_else(|| TextmeshError::UnknownLanguage(language.to_string()))?;
        if model.styles.is_empty() {
            return Err(TextmeshError::MalformedTable(
                "style table declares no styles".into(),
            ));
        }

        info!("shaping text with {}...", self.shaper.name());
        let mut registry = GlyphRegistry::new();
        let mut scratch = Arena::new();
        let mut strings = Vec::new();

        for entry in model.strings.iter().filter(|s| s.in_scope()) {
            let source = entry.texts.get(lang).ok_or_else(|| {
                TextmeshError::InternalConsistency(format!(
                    "string '{}' has no text for language index {lang}",
                    entry.key
                ))
            })?;

            let mut pages = Vec::new();
            for page in markup::expand(source, &model.styles) {
                pages.push(self.typeset_page(&page, entry, model, &mut registry, &mut scratch)?);
            }
            debug!("string '{}': {} page(s)", entry.key, pages.len());

            strings.push(CompiledString {
                key: entry.key.clone(),
                width: entry.target_width,
                height: entry.target_height,
                pages,
            });
        }

        registry.sort_for_output();
        let glyph_set_hash = registry.set_hash();
        debug!("{} unique glyph(s)", registry.len());

        let (uvs, atlas) = match &cache {
            Some(record)
                if record.glyph_set_hash == glyph_set_hash
                    && record.uvs.len() == registry.len() =>
            {
                info!("using cached atlas...");
                (record.uvs.clone(), None)
            }
            _ => {
                info!("baking atlas with {}...", self.raster.name());
                let (image, uvs) = self.bake_atlas(&registry)?;
                (uvs, Some(image))
            }
        };

        CacheRecord {
            source_hash: model.source_hash,
            glyph_set_hash,
            uvs: uvs.clone(),
        }
        .store(&self.cache_path)?;

        let uv_index = registry
            .keys()
            .iter()
            .enumerate()
            .map(|(pos, &key)| (key, pos))
            .collect();

        Ok(CompileOutcome::Built(CompiledDocument {
            strings,
            uvs,
            uv_index,
            atlas,
        }))
    }

    /// Shape one page and intern its glyphs.
    ///
    /// `scratch` is the per-page arena: cleared on entry, its contents
    /// copied out once the page's glyphs are final.
    fn typeset_page(
        &self,
        page: &MarkupPage,
        entry: &LocalizedString,
        model: &ContentModel,
        registry: &mut GlyphRegistry,
        scratch: &mut Arena<TypesetGlyph>,
    ) -> Result<TypesetPage> {
        scratch.clear();

        let mut runs = Vec::with_capacity(page.runs.len());
        for run in &page.runs {
            let style = model.styles.get(run.style).ok_or_else(|| {
                TextmeshError::InternalConsistency(format!(
                    "style run references style index {} of {}",
                    run.style,
                    model.styles.len()
                ))
            })?;
            runs.push(ResolvedRun {
                start: run.start,
                end: run.end,
                style,
            });
        }

        let input = PageInput {
            text: &page.text,
            runs,
            width: entry.target_width,
            height: entry.target_height,
        };
        let mut shaped = self.shaper.shape_page(&input)?;

        // Logical order, not the shaper's visual order.
        shaped.sort_by_key(|glyph| glyph.source_offset);

        for glyph in &shaped {
            let key = registry.intern(&glyph.face, glyph.glyph);
            scratch.push(TypesetGlyph {
                source_offset: glyph.source_offset,
                key,
                quad: glyph.quad,
            });
        }

        let glyphs = scratch.take();
        let map = markup::glyph_index_map(page.text.len(), &glyphs);
        let mut tags = page.tags.clone();
        markup::remap_tags(&mut tags, &map);

        Ok(TypesetPage { glyphs, tags })
    }

    fn bake_atlas(&self, registry: &GlyphRegistry) -> Result<(AtlasImage, Vec<UvRect>)> {
        let mut bitmaps = Vec::with_capacity(registry.len());
        for entry in registry.entries() {
            let face = self.catalog.by_key(&entry.face).ok_or_else(|| {
                TextmeshError::MissingResource(format!(
                    "font face '{}' not present in the catalog",
                    entry.face
                ))
            })?;
            debug!("rasterizing {}#{}", entry.face, entry.glyph);
            bitmaps.push(self.raster.rasterize(face, entry.glyph)?);
        }
        atlas::bake(&bitmaps)
    }
}
