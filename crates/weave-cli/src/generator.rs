//! The generator: weave-cli's implementation of the "consumer contract"
//! `spec.md` §6 leaves external to the core — a `Visitor` that records
//! `templates`/`files`/`template`/`file`/`transformation` events in
//! declaration order during invocation, then, once the `TemplateModel`
//! is final, renders/copies every recorded entry into an output
//! directory.
//!
//! Events are recorded rather than acted on immediately because
//! template rendering needs the *final* merged model (§4.7), which
//! isn't complete until the whole script tree has been walked.

use glob::Pattern;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use weave_ast::{Kind, Node};
use weave_context::{substitute, Context};
use weave_engine::{render, EngineError, TemplateModel, VisitResult, Visitor};

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("could not read source '{path}': {source}")]
    ReadSource { path: PathBuf, source: std::io::Error },
    #[error("could not write '{path}': {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error(transparent)]
    Render(#[from] EngineError),
    #[error("bad regex in transformation '{id}': {source}")]
    BadRegex { id: String, source: regex::Error },
    #[error("bad glob pattern '{pattern}': {source}")]
    BadPattern { pattern: String, source: glob::PatternError },
}

#[derive(Debug, Clone)]
struct Section {
    directory: String,
    is_templates: bool,
    transformations: Vec<String>,
}

enum Event {
    Entry {
        directory: String,
        source: String,
        target: String,
        is_templates: bool,
        transformations: Vec<String>,
        ctx: Context,
    },
    BulkCopy {
        directory: String,
        includes: Vec<String>,
        excludes: Vec<String>,
        is_templates: bool,
        transformations: Vec<String>,
        ctx: Context,
    },
}

/// Records generation events as they're visited, and applies them to an
/// output directory once the full model is known.
pub struct GeneratorVisitor {
    archive_root: PathBuf,
    events: Vec<Event>,
    transformations: HashMap<String, Vec<(Regex, String)>>,
    current_section: Option<Section>,
    /// The first error `visit` hit while recording a `<transformation>`.
    /// `Visitor::visit` returns a `VisitResult`, not a `Result`, so a
    /// malformed regex can't be propagated from inside the walk itself —
    /// it's stashed here instead and surfaced by `generate`.
    first_error: Option<GenerateError>,
}

impl GeneratorVisitor {
    pub fn new(archive_root: impl AsRef<Path>) -> Self {
        Self {
            archive_root: archive_root.as_ref().to_path_buf(),
            events: Vec::new(),
            transformations: HashMap::new(),
            current_section: None,
            first_error: None,
        }
    }

    fn transform_names(node: &Node) -> Vec<String> {
        node.attr_str("transformations")
            .map(|s| s.split(',').map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect())
            .unwrap_or_default()
    }

    fn glob_list(node: &Node, kind: Kind) -> Vec<String> {
        node.children_of_kind(kind)
            .filter_map(|n| n.attr_str("pattern").or_else(|| n.attr_str("value")))
            .map(str::to_string)
            .collect()
    }

    fn record_transformation(&mut self, node: &Node) -> Result<(), GenerateError> {
        let id = node.attr_str("id").unwrap_or_default().to_string();
        let mut rules = Vec::new();
        for replace in node.children_of_kind(Kind::Replace) {
            let pattern = replace.attr_str("regex").unwrap_or_default();
            let replacement = replace.attr_str("replacement").unwrap_or_default().to_string();
            let compiled = Regex::new(pattern).map_err(|e| GenerateError::BadRegex { id: id.clone(), source: e })?;
            rules.push((compiled, replacement));
        }
        self.transformations.insert(id, rules);
        Ok(())
    }

    fn apply_transformations(&self, names: &[String], input: &str) -> String {
        let mut out = input.to_string();
        for name in names {
            if let Some(rules) = self.transformations.get(name) {
                for (pattern, replacement) in rules {
                    out = pattern.replace_all(&out, replacement.as_str()).into_owned();
                }
            }
        }
        out
    }
}

impl Visitor for GeneratorVisitor {
    fn visit(&mut self, node: &Node, ctx: &Context) -> VisitResult {
        match node.kind {
            Kind::Transformation => {
                if let Err(e) = self.record_transformation(node) {
                    if self.first_error.is_none() {
                        self.first_error = Some(e);
                    }
                }
            }
            Kind::Templates | Kind::Files => {
                let section = Section {
                    directory: node.attr_str("directory").unwrap_or_default().to_string(),
                    is_templates: node.kind == Kind::Templates,
                    transformations: Self::transform_names(node),
                };
                let includes = Self::glob_list(node, Kind::Include);
                let excludes = Self::glob_list(node, Kind::Exclude);
                if !includes.is_empty() || !excludes.is_empty() {
                    self.events.push(Event::BulkCopy {
                        directory: section.directory.clone(),
                        includes,
                        excludes,
                        is_templates: section.is_templates,
                        transformations: section.transformations.clone(),
                        ctx: ctx.clone(),
                    });
                }
                self.current_section = Some(section);
            }
            Kind::Template | Kind::File => {
                let section = self.current_section.clone().unwrap_or(Section {
                    directory: String::new(),
                    is_templates: node.kind == Kind::Template,
                    transformations: Vec::new(),
                });
                self.events.push(Event::Entry {
                    directory: section.directory,
                    source: node.attr_str("source").unwrap_or_default().to_string(),
                    target: node.attr_str("target").unwrap_or_default().to_string(),
                    is_templates: section.is_templates,
                    transformations: section.transformations,
                    ctx: ctx.clone(),
                });
            }
            _ => {}
        }
        VisitResult::Continue
    }
}

/// Renders/copies every recorded event into `output_dir`, now that
/// `model` is the final merged model for the whole run. Fails immediately
/// on the first bad `<transformation>` regex the walk recorded, before
/// touching the filesystem.
pub fn generate(visitor: &mut GeneratorVisitor, model: &TemplateModel, output_dir: &Path) -> Result<Vec<PathBuf>, GenerateError> {
    if let Some(e) = visitor.first_error.take() {
        return Err(e);
    }
    let mut written = Vec::new();
    for event in &visitor.events {
        match event {
            Event::Entry { directory, source, target, is_templates, transformations, ctx } => {
                let source_path = visitor.archive_root.join(directory).join(source);
                let target_rel = visitor.apply_transformations(transformations, &substitute(ctx, target));
                let target_path = output_dir.join(&target_rel);
                if let Some(parent) = target_path.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| GenerateError::Write { path: parent.to_path_buf(), source: e })?;
                }
                if *is_templates {
                    let text = std::fs::read_to_string(&source_path)
                        .map_err(|e| GenerateError::ReadSource { path: source_path.clone(), source: e })?;
                    let rendered = render(&text, model, None, ctx)?;
                    std::fs::write(&target_path, rendered).map_err(|e| GenerateError::Write { path: target_path.clone(), source: e })?;
                } else {
                    std::fs::copy(&source_path, &target_path)
                        .map_err(|e| GenerateError::Write { path: target_path.clone(), source: e })?;
                }
                written.push(target_path);
            }
            Event::BulkCopy { directory, includes, excludes, is_templates, transformations, ctx } => {
                let base = visitor.archive_root.join(directory);
                let include_patterns = compile_patterns(includes)?;
                let exclude_patterns = compile_patterns(excludes)?;
                let mut files = Vec::new();
                walk(&base, &base, &mut files).map_err(|e| GenerateError::ReadSource { path: base.clone(), source: e })?;

                for rel in files {
                    let rel_str = rel.to_string_lossy().replace('\\', "/");
                    if !include_patterns.is_empty() && !include_patterns.iter().any(|p| p.matches(&rel_str)) {
                        continue;
                    }
                    if exclude_patterns.iter().any(|p| p.matches(&rel_str)) {
                        continue;
                    }

                    let source_path = base.join(&rel);
                    let target_rel = visitor.apply_transformations(transformations, &substitute(ctx, &rel_str));
                    let target_path = output_dir.join(&target_rel);
                    if let Some(parent) = target_path.parent() {
                        std::fs::create_dir_all(parent).map_err(|e| GenerateError::Write { path: parent.to_path_buf(), source: e })?;
                    }
                    if *is_templates {
                        let text = std::fs::read_to_string(&source_path)
                            .map_err(|e| GenerateError::ReadSource { path: source_path.clone(), source: e })?;
                        let rendered = render(&text, model, None, ctx)?;
                        std::fs::write(&target_path, rendered).map_err(|e| GenerateError::Write { path: target_path.clone(), source: e })?;
                    } else {
                        std::fs::copy(&source_path, &target_path)
                            .map_err(|e| GenerateError::Write { path: target_path.clone(), source: e })?;
                    }
                    written.push(target_path);
                }
            }
        }
    }
    Ok(written)
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>, GenerateError> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).map_err(|e| GenerateError::BadPattern { pattern: p.clone(), source: e }))
        .collect()
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            walk(root, &path, out)?;
        } else if let Ok(rel) = path.strip_prefix(root) {
            out.push(rel.to_path_buf());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_ast::Site;

    fn site() -> Site {
        Site::new("m.json", 1)
    }

    #[test]
    fn template_section_attaches_its_directory_to_child_entries() {
        let mut visitor = GeneratorVisitor::new(".");
        let templates = Node::new(Kind::Templates, site()).with_attr("directory", "files");
        let template = Node::new(Kind::Template, site()).with_attr("source", "a.mustache").with_attr("target", "a.txt");
        let ctx = Context::new();

        visitor.visit(&templates, &ctx);
        visitor.visit(&template, &ctx);

        assert_eq!(visitor.events.len(), 1);
        match &visitor.events[0] {
            Event::Entry { source, target, is_templates, .. } => {
                assert_eq!(source, "a.mustache");
                assert_eq!(target, "a.txt");
                assert!(is_templates);
            }
            _ => panic!("expected an Entry event"),
        }
    }

    #[test]
    fn transformation_replace_rules_rewrite_target_paths() {
        let mut visitor = GeneratorVisitor::new(".");
        let replace = Node::new(Kind::Replace, site()).with_attr("regex", "\\.tpl$").with_attr("replacement", "");
        let transformation = Node::new(Kind::Transformation, site()).with_attr("id", "strip-ext").with_child(replace);
        let ctx = Context::new();

        visitor.visit(&transformation, &ctx);
        let rewritten = visitor.apply_transformations(&["strip-ext".to_string()], "main.rs.tpl");
        assert_eq!(rewritten, "main.rs");
    }

    #[test]
    fn a_bad_transformation_regex_surfaces_through_generate_instead_of_vanishing() {
        let mut visitor = GeneratorVisitor::new(".");
        let replace = Node::new(Kind::Replace, site()).with_attr("regex", "(").with_attr("replacement", "");
        let transformation = Node::new(Kind::Transformation, site()).with_attr("id", "broken").with_child(replace);
        let ctx = Context::new();

        visitor.visit(&transformation, &ctx);
        assert!(visitor.transformations.is_empty());

        let model = TemplateModel::default();
        let err = generate(&mut visitor, &model, Path::new("/tmp/out")).unwrap_err();
        assert!(matches!(err, GenerateError::BadRegex { id, .. } if id == "broken"));
    }
}
