//! Colored diagnostic rendering, styled after the teacher's
//! `lumen_compiler::format_error`/`cmd_check` pairing: a red `error:`
//! label, the site, and the message, with no attempt at a source
//! snippet since scripts here are JSON rather than line-oriented text.

use crate::colors::{bold, red, yellow};
use weave_ast::Site;
use weave_engine::{InvocationError, ValidationError};

pub fn format_invocation_error(err: &InvocationError) -> String {
    format!("{} {}: {}\n", red("error:"), bold(&err.site.to_string()), err.source)
}

pub fn format_validation_errors(errors: &[ValidationError]) -> String {
    let mut out = String::new();
    for error in errors {
        out.push_str(&format!("{} {}: {}\n", yellow("error:"), bold(&error.site.to_string()), error.message));
    }
    out.push_str(&format!("{} {} error(s)\n", red("failed:"), errors.len()));
    out
}

pub fn format_site(site: &Site) -> String {
    bold(&site.to_string())
}
