use std::io::{self, Write};

use crate::batch::BatchReport;

/// Résumé final du lot, écrit sur `out` (stdout en production).
///
/// # Errors
/// Returns an error if writing to `out` fails.
pub fn print_summary<W: Write>(report: &BatchReport, out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "=== Résumé ===")?;
    writeln!(out, "Entrée            : {}", report.input_kind.label())?;
    writeln!(out, "Images traitées   : {}", report.attempted_images())?;
    writeln!(out, "  complètes       : {}", report.fully_succeeded_images())?;
    writeln!(out, "  avec échecs     : {}", report.images_with_failures())?;
    writeln!(
        out,
        "Rendus            : {} réussi(s), {} échoué(s)",
        report.succeeded, report.failed
    )?;
    writeln!(out, "Sortie            : {}", report.output_root.display())?;
    writeln!(out, "Temps total       : {:.2} s", report.elapsed.as_secs_f64())?;
    out.flush()
}
