use colored::Colorize;
use shared_context::diagnostics::{DiagnosticBag, Severity};
use symbol_graph::Compilation;

/// Renders a diagnostic bag to stderr. The middle end never does I/O;
/// turning spans into carets and severities into colors happens here.
pub fn print_diagnostics(comp: &Compilation<'_>, diagnostics: &DiagnosticBag) {
    for diagnostic in diagnostics.clone().into_sorted() {
        let header = match diagnostic.get_severity() {
            Severity::Note => "note".blue().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Error => "error".red().bold(),
            Severity::Fatal => "fatal".red().bold(),
        };
        eprintln!("{header}: {}", diagnostic.get_message());
        eprint!(
            "{}",
            comp.source_map
                .format_message(diagnostic.get_message(), diagnostic.get_span())
        );
        for note in diagnostic.get_notes() {
            match note.get_span() {
                Some(span) => {
                    eprintln!("{}: {}", "note".blue().bold(), note.get_message());
                    eprint!("{}", comp.source_map.format_message(note.get_message(), span));
                }
                None => eprintln!("{}: {}", "note".blue().bold(), note.get_message()),
            }
        }
    }

    let errors = diagnostics
        .iter()
        .filter(|d| d.get_severity() >= Severity::Error)
        .count();
    let warnings = diagnostics
        .iter()
        .filter(|d| d.get_severity() == Severity::Warning)
        .count();
    if errors > 0 || warnings > 0 {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }
}
