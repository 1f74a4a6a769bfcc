//! Terminal output formatting with colors.

use std::time::Duration;

use colored::Colorize;

/// Format the periodic progress line.
///
/// One line per clustering-cadence multiple, mirroring the state the nested
/// loop tracks: iteration, cluster count, population, cumulated prior mass,
/// remainder ratio, evidence and information gain.
pub fn format_progress(
    n_iterations: usize,
    n_clusters: usize,
    n_live: usize,
    cumulated_prior_mass: f64,
    remainder_ratio: f64,
    log_evidence: f64,
    information_gain: f64,
) -> String {
    format!(
        "Nit: {:<7} Ncl: {:<3} Nlive: {:<6} CPM: {:.6}   Ratio: {:.6}   log(E): {:.4}   IG: {:.4}",
        n_iterations,
        n_clusters,
        n_live,
        cumulated_prior_mass,
        remainder_ratio,
        log_evidence,
        information_gain
    )
}

/// Format the warning emitted when the constrained draw exhausts its
/// attempts and the run stops prematurely.
pub fn format_draw_failure(attempts: usize) -> String {
    format!(
        "{}\n  No live point replacement found after {} attempts.\n  Stopping the nested sampling loop prematurely; the partial posterior remains valid.",
        "⚠ Constrained draw exhausted".yellow().bold(),
        attempts
    )
}

/// Format the end-of-run summary block.
pub fn format_run_summary(
    n_iterations: usize,
    n_posterior: usize,
    log_evidence: f64,
    log_evidence_error: f64,
    information_gain: f64,
    elapsed: Duration,
) -> String {
    let mut output = String::new();
    let sep = "\u{2500}".repeat(62);

    output.push_str("nidus\n");
    output.push_str(&sep);
    output.push('\n');
    output.push_str(&format!(
        "  {}\n\n",
        "✓ Nested sampling complete".green().bold()
    ));
    output.push_str(&format!("    Iterations:        {}\n", n_iterations));
    output.push_str(&format!("    Posterior samples: {}\n", n_posterior));
    output.push_str(&format!(
        "    log(Evidence):     {:.6} ± {:.6}\n",
        log_evidence, log_evidence_error
    ));
    output.push_str(&format!("    Information gain:  {:.6}\n", information_gain));
    output.push_str(&format!("    Elapsed:           {}\n", format_elapsed(elapsed)));

    output
}

/// Render a duration in the largest sensible unit.
fn format_elapsed(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs_f64();
    if seconds < 60.0 {
        format!("{:.2} s", seconds)
    } else if seconds < 3600.0 {
        format!("{:.2} min", seconds / 60.0)
    } else {
        format!("{:.2} h", seconds / 3600.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_line_carries_all_fields() {
        let line = format_progress(150, 3, 500, 0.25, 1.5, -4.2, 2.1);
        assert!(line.contains("Nit: 150"));
        assert!(line.contains("Ncl: 3"));
        assert!(line.contains("Nlive: 500"));
        assert!(line.contains("log(E): -4.2000"));
    }

    #[test]
    fn elapsed_picks_sensible_units() {
        assert_eq!(format_elapsed(Duration::from_secs_f64(12.5)), "12.50 s");
        assert_eq!(format_elapsed(Duration::from_secs(120)), "2.00 min");
        assert_eq!(format_elapsed(Duration::from_secs(7200)), "2.00 h");
    }

    #[test]
    fn draw_failure_mentions_the_attempt_budget() {
        let warning = format_draw_failure(5000);
        assert!(warning.contains("5000"));
        assert!(warning.contains("prematurely"));
    }
}
