use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use gt_ascii::sampler::{SampleOptions, sample};
use gt_core::charset::Alphabet;
use gt_core::config::{GlyphConfig, PreFilter};
use gt_core::frame::FrameBuffer;
use gt_core::theme::Theme;
use gt_export::face::{AbGlyphFace, GlyphFace};
use gt_export::font::FontDescriptor;
use gt_export::output::{write_png_atomic, write_text_atomic};
use gt_export::rasterizer::{CompositeOptions, composite};
use gt_source::filter::apply_pre_filter;
use gt_source::image::{load_image, to_rgb_image};
use gt_source::pixelate::pixelate;

/// What a batch produces.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderMode {
    /// One themed ASCII raster per (image, theme).
    Ascii { font: FontDescriptor },
    /// One pixelated copy per image.
    Pixelate { block: u32 },
}

/// Immutable snapshot shared by every job of a batch.
#[derive(Clone, Debug)]
pub struct RenderSettings {
    pub mode: RenderMode,
    /// Themes rendered for every image, in order. Unused when pixelating.
    pub themes: Vec<Theme>,
    pub columns: u32,
    pub alphabet: Alphabet,
    pub sample: SampleOptions,
    pub composite: CompositeOptions,
    pub pre_filter: Option<PreFilter>,
    /// Write the grid as text next to each PNG.
    pub emit_text: bool,
}

impl RenderSettings {
    /// Settings for an ASCII batch.
    ///
    /// # Errors
    /// Fails if the alphabet is empty.
    pub fn ascii(config: &GlyphConfig, themes: Vec<Theme>, font: FontDescriptor, emit_text: bool) -> Result<Self> {
        let s = &config.settings;
        Ok(Self {
            mode: RenderMode::Ascii { font },
            themes,
            columns: s.output_width_chars,
            alphabet: config.alphabet()?,
            sample: SampleOptions::from(s),
            composite: CompositeOptions {
                resize_output: s.resize_output,
            },
            pre_filter: config.pre_filter(),
            emit_text,
        })
    }

    /// Settings for a pixelate batch.
    #[must_use]
    pub fn pixelate(config: &GlyphConfig, block: u32) -> Self {
        Self {
            mode: RenderMode::Pixelate { block },
            themes: Vec::new(),
            columns: config.settings.output_width_chars,
            alphabet: Alphabet::default(),
            sample: SampleOptions::default(),
            composite: CompositeOptions::default(),
            pre_filter: None,
            emit_text: false,
        }
    }

    #[must_use]
    pub fn is_pixelate(&self) -> bool {
        matches!(self.mode, RenderMode::Pixelate { .. })
    }
}

/// Variant of one unit of work.
#[derive(Clone, Debug, PartialEq)]
pub enum JobVariant {
    Themed(Theme),
    Pixelate { block: u32 },
}

/// One (image, variant) pair, with its destination.
#[derive(Clone, Debug)]
pub struct RenderJob {
    /// Position of the source in the scanned image list.
    pub image_index: usize,
    pub source: PathBuf,
    pub variant: JobVariant,
    pub output: PathBuf,
}

impl RenderJob {
    /// Short human label, e.g. `cat.png [dark]`.
    #[must_use]
    pub fn label(&self) -> String {
        let name = self
            .source
            .file_name()
            .map_or_else(|| self.source.display().to_string(), |n| n.to_string_lossy().into_owned());
        match &self.variant {
            JobVariant::Themed(theme) => format!("{name} [{}]", theme.name),
            JobVariant::Pixelate { block } => format!("{name} [pixel {block}]"),
        }
    }
}

/// Executes one job. Implementations must be shareable across workers.
pub trait JobRunner: Send + Sync {
    /// Run `job` and return the path of the written image.
    ///
    /// # Errors
    /// Any failure aborts this job only.
    fn run(&self, job: &RenderJob) -> Result<PathBuf>;
}

/// Gives a job access to a glyph face for a font descriptor.
pub trait FaceSource: Send + Sync {
    /// Call `draw` with the face for `font`.
    ///
    /// # Errors
    /// Fails if the font cannot be loaded.
    fn with_face(&self, font: &FontDescriptor, draw: &mut dyn FnMut(&dyn GlyphFace)) -> Result<()>;
}

thread_local! {
    /// Police du worker courant, chargée au premier job.
    static WORKER_FACE: RefCell<Option<(FontDescriptor, AbGlyphFace)>> = const { RefCell::new(None) };
}

/// One ab_glyph face per worker thread, loaded on first use or when the
/// descriptor changes. Live faces never cross threads.
#[derive(Clone, Copy, Debug, Default)]
pub struct WorkerFaces;

impl FaceSource for WorkerFaces {
    fn with_face(&self, font: &FontDescriptor, draw: &mut dyn FnMut(&dyn GlyphFace)) -> Result<()> {
        WORKER_FACE.with(|slot| {
            let mut slot = slot.borrow_mut();
            if slot.as_ref().is_none_or(|(loaded, _)| loaded != font) {
                let face = font.load()?;
                log::debug!("Police chargée par le worker : {}", font.path.display());
                *slot = Some((font.clone(), face));
            }
            match slot.as_ref() {
                Some((_, face)) => {
                    draw(face);
                    Ok(())
                }
                None => bail!("Police indisponible : {}", font.path.display()),
            }
        })
    }
}

/// Production runner: decode, filter, sample, composite, write.
pub struct Renderer<F = WorkerFaces> {
    settings: Arc<RenderSettings>,
    faces: F,
}

impl Renderer {
    #[must_use]
    pub fn new(settings: Arc<RenderSettings>) -> Self {
        Self {
            settings,
            faces: WorkerFaces,
        }
    }
}

impl<F: FaceSource> Renderer<F> {
    /// Runner drawing with faces from `faces`.
    #[must_use]
    pub fn with_faces(settings: Arc<RenderSettings>, faces: F) -> Self {
        Self { settings, faces }
    }

    fn render_themed(&self, job: &RenderJob, theme: &Theme) -> Result<()> {
        let RenderMode::Ascii { font } = &self.settings.mode else {
            bail!("Job thématique dans un lot sans police : {}", job.label());
        };
        let source = load_image(&job.source)?;
        let original_size = (source.width, source.height);
        let frame = self.prefiltered(source, &job.source);

        let s = &self.settings;
        let grid = sample(&frame, s.columns, theme, &s.alphabet, &s.sample)
            .with_context(|| format!("Échantillonnage impossible pour {}", job.source.display()))?;
        log::debug!("{} : grille {}×{}", job.label(), grid.width, grid.height);

        let mut canvas = None;
        self.faces.with_face(font, &mut |face| {
            canvas = Some(composite(&grid, theme, face, Some(original_size), &s.composite));
        })?;
        let canvas = canvas.with_context(|| format!("Aucun rendu pour {}", job.label()))?;
        write_png_atomic(&canvas, &job.output)?;

        if s.emit_text {
            write_text_atomic(&grid.to_text(), &job.output.with_extension("txt"))?;
        }
        Ok(())
    }

    fn render_pixelated(job: &RenderJob, block: u32) -> Result<()> {
        let source = load_image(&job.source)?;
        let out = pixelate(&source, block)?;
        write_png_atomic(&to_rgb_image(&out)?, &job.output)?;
        Ok(())
    }

    /// Applies the configured pre-filter; a failure keeps the unfiltered frame.
    fn prefiltered(&self, frame: FrameBuffer, path: &Path) -> FrameBuffer {
        let Some(filter) = self.settings.pre_filter else {
            return frame;
        };
        match apply_pre_filter(&frame, filter) {
            Ok(filtered) => filtered,
            Err(e) => {
                log::warn!("Filtre {} ignoré pour {} : {e:#}", filter.tag(), path.display());
                frame
            }
        }
    }
}

impl<F: FaceSource> JobRunner for Renderer<F> {
    fn run(&self, job: &RenderJob) -> Result<PathBuf> {
        let started = Instant::now();
        match &job.variant {
            JobVariant::Themed(theme) => self.render_themed(job, theme)?,
            JobVariant::Pixelate { block } => Self::render_pixelated(job, *block)?,
        }
        log::debug!("{} terminé en {:.2?}", job.label(), started.elapsed());
        Ok(job.output.clone())
    }
}
