use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Parser;
use gt_app::batch::{self, effective_workers};
use gt_app::cli::{self, Cli};
use gt_app::config::{resolve_config, write_provenance};
use gt_app::job::{RenderSettings, Renderer};
use gt_app::summary::print_summary;
use gt_export::font::{default_strategies, resolve_font};

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Info))
        .init();

    // 3. Résoudre l'entrée (invite si absente)
    let input = match cli.input.clone() {
        Some(path) => path,
        None => {
            let stdin = std::io::stdin();
            match cli::prompt_input(&mut stdin.lock(), &mut std::io::stdout())? {
                Some(path) => path,
                None => {
                    log::info!("Aucune entrée, abandon.");
                    return Ok(());
                }
            }
        }
    };

    // 4. Charger la config puis appliquer les overrides CLI
    let resolved = resolve_config(&cli.config);
    let mut config = resolved.config;
    cli.apply_overrides(&mut config);
    let workers = effective_workers(config.settings.workers);

    // 5. Construire le snapshot de rendu
    let settings = if let Some(block) = cli.pixelate {
        if block == 0 {
            bail!("--pixelate doit être > 0");
        }
        RenderSettings::pixelate(&config, block)
    } else {
        let themes = config.selected_themes();
        if themes.is_empty() {
            let known: Vec<String> = config.theme_table().names().map(String::from).collect();
            bail!("Aucun thème valide sélectionné. Thèmes disponibles : {}", known.join(", "));
        }
        let mut anchors: Vec<PathBuf> = Vec::new();
        if let Some(dir) = resolved.source.as_deref().and_then(|p| p.parent()) {
            anchors.push(dir.to_path_buf());
        }
        if let Some(dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(PathBuf::from)) {
            anchors.push(dir);
        }
        let font = resolve_font(
            &config.settings.font_filename,
            config.settings.font_size as f32,
            &default_strategies(&anchors),
        )?;
        RenderSettings::ascii(&config, themes, font, cli.emit_text)?
    };
    let settings = Arc::new(settings);

    // 6. Exécuter le lot
    let runner = Arc::new(Renderer::new(Arc::clone(&settings)));
    let report = batch::run_batch(&input, &settings, runner, workers)?;

    // 7. Provenance de la configuration
    if !settings.is_pixelate()
        && let Err(e) = write_provenance(&report.output_root, &config, resolved.source.as_deref())
    {
        log::warn!("Provenance de configuration non écrite : {e:#}");
    }

    // 8. Résumé
    print_summary(&report, &mut std::io::stdout().lock())?;
    Ok(())
}
