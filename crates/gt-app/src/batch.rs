use std::any::Any;
use std::fs;
use std::num::NonZeroUsize;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use gt_source::scan::{InputKind, ScannedInput, scan_inputs};

use crate::job::{JobRunner, JobVariant, RenderJob, RenderMode, RenderSettings};
use crate::layout;

/// Batch lifecycle, logged at each transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchState {
    Scanning,
    Dispatching,
    Collecting,
    Done,
}

/// Per-image job counts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageTally {
    pub path: PathBuf,
    pub succeeded: usize,
    pub failed: usize,
}

/// Result of a whole batch.
#[derive(Clone, Debug)]
pub struct BatchReport {
    pub input_kind: InputKind,
    pub output_root: PathBuf,
    pub images: Vec<ImageTally>,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl BatchReport {
    #[must_use]
    pub fn attempted_images(&self) -> usize {
        self.images.len()
    }

    #[must_use]
    pub fn attempted_jobs(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Images whose every job succeeded.
    #[must_use]
    pub fn fully_succeeded_images(&self) -> usize {
        self.images.iter().filter(|i| i.failed == 0).count()
    }

    #[must_use]
    pub fn images_with_failures(&self) -> usize {
        self.images.iter().filter(|i| i.failed > 0).count()
    }
}

/// Outcome of one job, sent from a worker to the collector.
#[derive(Debug)]
struct JobOutcome {
    image_index: usize,
    label: String,
    result: std::result::Result<PathBuf, String>,
    elapsed: Duration,
}

/// Jobs to submit plus the failures known before dispatch.
struct Plan {
    jobs: Vec<RenderJob>,
    /// (image index, jobs counted failed without submission)
    rejected: Vec<(usize, usize)>,
}

/// Pool size: `workers`, or the available parallelism when 0.
#[must_use]
pub fn effective_workers(workers: usize) -> usize {
    if workers > 0 {
        workers
    } else {
        std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
    }
}

/// Exécute un lot complet : scan, création des dossiers, exécution parallèle,
/// agrégation.
///
/// Per-job failures, panics included, are counted in the report and never
/// abort the batch.
///
/// # Errors
/// Fails on fatal preconditions only: unreadable input, output root not
/// creatable, worker pool not buildable.
pub fn run_batch(
    input: &Path,
    settings: &RenderSettings,
    runner: Arc<dyn JobRunner>,
    workers: usize,
) -> Result<BatchReport> {
    let started = Instant::now();

    enter(BatchState::Scanning);
    let scanned = scan_inputs(input)?;
    log::info!(
        "{} image(s) trouvée(s) ({} {})",
        scanned.images.len(),
        scanned.kind.label(),
        scanned.root.display()
    );
    if scanned.images.is_empty() {
        log::warn!("Aucune image supportée dans {}", scanned.root.display());
    }

    let root = match settings.mode {
        RenderMode::Ascii { .. } => layout::ascii_root(&scanned, settings.columns),
        RenderMode::Pixelate { .. } => layout::pixelate_root(&scanned),
    };
    fs::create_dir_all(&root)
        .with_context(|| format!("Impossible de créer le dossier de sortie {}", root.display()))?;
    let plan = plan_jobs(&scanned, settings, &root);

    enter(BatchState::Dispatching);
    let workers = effective_workers(workers);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("glyphtone-worker-{i}"))
        .panic_handler(|_| log::error!("Panique hors d'un job dans le pool"))
        .build()
        .context("Impossible de créer le pool de workers")?;
    log::info!("{} job(s) soumis à {workers} worker(s)", plan.jobs.len());

    let (tx, rx) = flume::unbounded::<JobOutcome>();
    for job in plan.jobs {
        let tx = tx.clone();
        let runner = Arc::clone(&runner);
        pool.spawn(move || {
            let job_started = Instant::now();
            log::debug!("Début : {}", job.label());
            let result = match catch_unwind(AssertUnwindSafe(|| runner.run(&job))) {
                Ok(Ok(path)) => Ok(path),
                Ok(Err(e)) => Err(format!("{e:#}")),
                Err(payload) => Err(format!("panique : {}", panic_message(payload.as_ref()))),
            };
            let _ = tx.send(JobOutcome {
                image_index: job.image_index,
                label: job.label(),
                result,
                elapsed: job_started.elapsed(),
            });
        });
    }
    drop(tx);

    enter(BatchState::Collecting);
    let mut images: Vec<ImageTally> = scanned
        .images
        .iter()
        .map(|path| ImageTally {
            path: path.clone(),
            succeeded: 0,
            failed: 0,
        })
        .collect();

    for (index, count) in plan.rejected {
        if let Some(tally) = images.get_mut(index) {
            tally.failed += count;
        }
    }
    for outcome in rx.iter() {
        let Some(tally) = images.get_mut(outcome.image_index) else {
            continue;
        };
        match outcome.result {
            Ok(path) => {
                tally.succeeded += 1;
                log::info!("✓ {} → {} ({:.2?})", outcome.label, path.display(), outcome.elapsed);
            }
            Err(reason) => {
                tally.failed += 1;
                log::error!("✗ {} : {reason}", outcome.label);
            }
        }
    }

    let report = BatchReport {
        input_kind: scanned.kind,
        output_root: root,
        succeeded: images.iter().map(|i| i.succeeded).sum(),
        failed: images.iter().map(|i| i.failed).sum(),
        images,
        elapsed: started.elapsed(),
    };
    enter(BatchState::Done);
    Ok(report)
}

/// Builds every job and creates per-image subdirectories. An image whose
/// subdirectory cannot be created has all its jobs rejected.
fn plan_jobs(scanned: &ScannedInput, settings: &RenderSettings, root: &Path) -> Plan {
    let mut plan = Plan {
        jobs: Vec::new(),
        rejected: Vec::new(),
    };

    for (index, source) in scanned.images.iter().enumerate() {
        let stem = layout::image_stem(source);
        match settings.mode {
            RenderMode::Pixelate { block } => plan.jobs.push(RenderJob {
                image_index: index,
                source: source.clone(),
                variant: JobVariant::Pixelate { block },
                output: root.join(layout::pixelated_file_name(&stem)),
            }),
            RenderMode::Ascii { .. } => {
                let subdir = root.join(&stem);
                if let Err(e) = fs::create_dir_all(&subdir) {
                    log::error!(
                        "Dossier {} impossible à créer ({e}) : {} thème(s) de {} en échec",
                        subdir.display(),
                        settings.themes.len(),
                        source.display()
                    );
                    plan.rejected.push((index, settings.themes.len()));
                    continue;
                }
                for theme in &settings.themes {
                    let name = layout::themed_file_name(
                        &stem,
                        &theme.name,
                        settings.columns,
                        settings.pre_filter.as_ref(),
                        settings.composite.resize_output,
                    );
                    plan.jobs.push(RenderJob {
                        image_index: index,
                        source: source.clone(),
                        variant: JobVariant::Themed(theme.clone()),
                        output: subdir.join(name),
                    });
                }
            }
        }
    }
    plan
}

fn enter(state: BatchState) {
    log::debug!("Lot : {state:?}");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "cause inconnue".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gt_core::config::GlyphConfig;
    use gt_core::theme::ThemeTable;
    use gt_export::font::FontDescriptor;
    use gt_source::image::load_image;

    /// Decodes the source like the real renderer, writes nothing.
    struct DecodingRunner;

    impl JobRunner for DecodingRunner {
        fn run(&self, job: &RenderJob) -> Result<PathBuf> {
            load_image(&job.source)?;
            Ok(job.output.clone())
        }
    }

    /// Panics on one theme, succeeds otherwise.
    struct PanickyRunner;

    impl JobRunner for PanickyRunner {
        fn run(&self, job: &RenderJob) -> Result<PathBuf> {
            if let JobVariant::Themed(theme) = &job.variant {
                assert!(theme.name != "light", "boom");
            }
            Ok(job.output.clone())
        }
    }

    fn ascii_settings(themes: &[&str]) -> RenderSettings {
        let table = ThemeTable::builtin();
        let themes = themes.iter().filter_map(|t| table.get(t).cloned()).collect();
        let font = FontDescriptor {
            path: PathBuf::from("unused.ttf"),
            size: 15.0,
        };
        RenderSettings::ascii(&GlyphConfig::default(), themes, font, false).unwrap()
    }

    fn write_png(path: &Path) {
        image::RgbImage::from_pixel(8, 6, image::Rgb([120, 60, 30])).save(path).unwrap();
    }

    #[test]
    fn corrupt_image_fails_only_its_own_jobs() {
        let base = tempfile::tempdir().unwrap();
        let input = base.path().join("photos");
        fs::create_dir(&input).unwrap();
        for name in ["a.png", "b.png", "c.png"] {
            write_png(&input.join(name));
        }
        fs::write(input.join("broken.png"), b"definitely not a png").unwrap();
        fs::write(input.join("notes.txt"), b"ignored").unwrap();

        let settings = ascii_settings(&["dark", "light"]);
        let report = run_batch(&input, &settings, Arc::new(DecodingRunner), 2).unwrap();

        assert_eq!(report.input_kind, InputKind::Directory);
        assert_eq!(report.attempted_images(), 4);
        assert_eq!(report.attempted_jobs(), 4 * 2);
        assert_eq!(report.failed, 2);
        assert_eq!(report.fully_succeeded_images(), 3);
        assert_eq!(report.images_with_failures(), 1);
        assert_eq!(report.output_root, base.path().join("photos_ascii_art_128"));
        assert!(report.output_root.join("a").is_dir());
    }

    #[test]
    fn panic_is_isolated_to_its_job() {
        let base = tempfile::tempdir().unwrap();
        let file = base.path().join("cat.png");
        write_png(&file);

        let settings = ascii_settings(&["dark", "light", "green_term"]);
        let report = run_batch(&file, &settings, Arc::new(PanickyRunner), 3).unwrap();

        assert_eq!(report.input_kind, InputKind::File);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.output_root, base.path().join("cat_ascii_art_128w"));
    }

    #[test]
    fn unwritable_subdirectory_rejects_all_themes() {
        let base = tempfile::tempdir().unwrap();
        let input = base.path().join("set");
        fs::create_dir(&input).unwrap();
        write_png(&input.join("a.png"));
        write_png(&input.join("b.png"));

        // Un fichier occupe la place du sous-dossier de "a".
        let root = base.path().join("set_ascii_art_128");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("a"), b"").unwrap();

        let settings = ascii_settings(&["dark", "light"]);
        let report = run_batch(&input, &settings, Arc::new(DecodingRunner), 1).unwrap();

        assert_eq!(report.succeeded + report.failed, 2 * 2);
        assert_eq!(report.images[0].failed, 2);
        assert_eq!(report.images[1].succeeded, 2);
    }

    #[test]
    fn pixelate_batch_writes_beside_directory() {
        let base = tempfile::tempdir().unwrap();
        let input = base.path().join("tiles");
        fs::create_dir(&input).unwrap();
        write_png(&input.join("t1.png"));
        write_png(&input.join("t2.PNG"));

        let settings = Arc::new(RenderSettings::pixelate(&GlyphConfig::default(), 3));
        let runner = Arc::new(crate::job::Renderer::new(Arc::clone(&settings)));
        let report = run_batch(&input, &settings, runner, 0).unwrap();

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 0);
        let root = base.path().join("tiles_pixelated");
        assert!(root.join("t1_pixelated.png").is_file());
        assert!(root.join("t2_pixelated.png").is_file());
    }

    #[test]
    fn empty_directory_is_not_fatal() {
        let base = tempfile::tempdir().unwrap();
        let input = base.path().join("empty");
        fs::create_dir(&input).unwrap();

        let report = run_batch(&input, &ascii_settings(&["dark"]), Arc::new(DecodingRunner), 1).unwrap();
        assert_eq!(report.attempted_images(), 0);
        assert_eq!(report.attempted_jobs(), 0);
    }

    #[test]
    fn missing_input_is_fatal() {
        let base = tempfile::tempdir().unwrap();
        let result = run_batch(
            &base.path().join("nope"),
            &ascii_settings(&["dark"]),
            Arc::new(DecodingRunner),
            1,
        );
        assert!(result.is_err());
    }

    #[test]
    fn zero_workers_means_available_parallelism() {
        assert!(effective_workers(0) >= 1);
        assert_eq!(effective_workers(5), 5);
    }
}
