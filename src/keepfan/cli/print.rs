use colored::Colorize;
use keepfan::dispatch::RunReport;

/// Summary goes to stderr; stdout belongs to the console sink.
pub(super) fn print_report(report: &RunReport) {
    let notes = match report.records {
        1 => "1 note".to_string(),
        n => format!("{} notes", n),
    };

    if report.is_clean() {
        eprintln!("{}", format!("Exported {}.", notes).green());
        return;
    }

    eprintln!(
        "{}",
        format!(
            "Exported {} with {} failure(s):",
            notes,
            report.failures.len()
        )
        .yellow()
    );
    for failure in &report.failures {
        eprintln!("  {}", failure.to_string().red());
    }
}
