//! Runbook rendering.
//!
//! A runbook is the reproducibility record uploaded next to an experiment's
//! results: which revision ran, how it was invoked, and where the setup
//! instructions live.

/// Placeholders are filled by [`render`]; the document is otherwise shipped
/// verbatim.
const TEMPLATE: &str = "\
# Runbook

Environment setup is described in `{setup_document}`, uploaded alongside
this file.

## Revision

    {revision}

## Invocation

    {invocation}
";

/// Render the runbook for one dispatch.
pub fn render(setup_document: &str, revision: &str, invocation: &str) -> String {
    TEMPLATE
        .replace("{setup_document}", setup_document)
        .replace("{revision}", revision)
        .replace("{invocation}", invocation)
}
