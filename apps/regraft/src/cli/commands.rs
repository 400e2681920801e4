//! # CLI Command Implementations

use regraft::config::EngineConfig;
use regraft::document::{graph_to_json, load_graph, load_pattern, load_rule, write_graph};
use regraft_core::{
    Activation, Graph, GraphRewriter, HierarchicalGraph, MatchResult, Matcher, Mode, RegraftError,
    RuleEngine,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Validate output path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, RegraftError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        RegraftError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(RegraftError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| RegraftError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

/// Parse repeated `name=value` arguments.
pub fn parse_params(raw: &[String]) -> Result<BTreeMap<String, String>, RegraftError> {
    let mut params = BTreeMap::new();
    for entry in raw {
        let (name, value) = entry.split_once('=').ok_or_else(|| {
            RegraftError::InvalidConfiguration(format!(
                "parameter '{}' is not of the form name=value",
                entry
            ))
        })?;
        if name.is_empty() {
            return Err(RegraftError::InvalidConfiguration(format!(
                "parameter '{}' has an empty name",
                entry
            )));
        }
        params.insert(name.to_string(), value.to_string());
    }
    Ok(params)
}

/// `pattern-path : host-path` pairs, sorted by pattern path.
fn describe_match(
    pattern: &Graph,
    host: &Graph,
    result: &MatchResult,
) -> Result<Vec<(String, String)>, RegraftError> {
    let mut pairs = result
        .iter()
        .map(|(p, h)| Ok((pattern.path(p)?, host.path(h)?)))
        .collect::<Result<Vec<_>, RegraftError>>()?;
    pairs.sort();
    Ok(pairs)
}

// =============================================================================
// MATCH COMMAND
// =============================================================================

/// Print matches of a pattern in a host graph.
pub fn cmd_match(
    pattern_path: &Path,
    host_path: &Path,
    all: bool,
    json_mode: bool,
) -> Result<(), RegraftError> {
    let pattern = load_pattern(pattern_path)?;
    let host = load_graph(host_path)?;
    let matcher = Matcher::new();

    let matches = if all {
        matcher.find_all(&pattern, &host)?
    } else {
        matcher.find_first(&pattern, &host)?.into_iter().collect()
    };
    info!(matches = matches.len(), "search finished");

    let described = matches
        .iter()
        .map(|m| describe_match(pattern.graph(), &host, m))
        .collect::<Result<Vec<_>, RegraftError>>()?;

    if json_mode {
        let output = serde_json::json!({
            "count": described.len(),
            "matches": described
                .iter()
                .map(|pairs| pairs
                    .iter()
                    .map(|(p, h)| (p.clone(), serde_json::Value::String(h.clone())))
                    .collect::<serde_json::Map<_, _>>())
                .collect::<Vec<_>>(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    if described.is_empty() {
        println!("No match");
        return Ok(());
    }
    for (index, pairs) in described.iter().enumerate() {
        println!("--- Match {} ---", index + 1);
        for (p, h) in pairs {
            println!("{} : {}", p, h);
        }
    }
    Ok(())
}

// =============================================================================
// APPLY COMMAND
// =============================================================================

/// Command-line overrides for `apply`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyFlags {
    pub seed: Option<u64>,
    pub mode: Option<Mode>,
    pub match_only: bool,
    pub repeat: Option<u32>,
    pub fixpoint: bool,
}

impl ApplyFlags {
    fn overlay(self) -> EngineConfig {
        EngineConfig {
            mode: self.mode,
            match_only: self.match_only.then_some(true),
            repeat_count: self.repeat,
            repeat_until_fixpoint: self.fixpoint.then_some(true),
            seed: self.seed,
            ..EngineConfig::default()
        }
    }
}

/// Apply a rule to a host graph and emit the result.
#[allow(clippy::too_many_arguments)]
pub fn cmd_apply(
    rule_path: &Path,
    host_path: &Path,
    config_path: Option<&Path>,
    raw_params: &[String],
    output: Option<&Path>,
    flags: ApplyFlags,
    json_mode: bool,
    quiet: bool,
) -> Result<(), RegraftError> {
    let mut rule = load_rule(rule_path)?;
    let host = load_graph(host_path)?;
    let overrides = parse_params(raw_params)?;

    let file_overlay = match config_path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let overlay = file_overlay.merge(flags.overlay());
    rule.config = overlay.apply_to(rule.config)?;
    let mode = rule.config.mode;
    let name = rule.name.clone();

    let mut engine = match overlay.seed {
        Some(seed) => RuleEngine::seeded(rule, GraphRewriter::new(), seed),
        None => RuleEngine::new(rule, GraphRewriter::new()),
    };

    let (rewritten, matched, replacements) = match engine.activate(&host, &overrides)? {
        Activation::MatchOnly { matched } => {
            if json_mode {
                let output = serde_json::json!({ "rule": name, "matched": matched });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output).unwrap_or_default()
                );
            } else {
                println!("{}", if matched { "match" } else { "no match" });
            }
            return Ok(());
        }
        Activation::Rewritten {
            host,
            matched,
            replacements,
        } => (host, matched, replacements),
        Activation::Stepped { remaining } => {
            let (host, applied) = drain_stepped(&mut engine, host)?;
            (host, remaining > 0, applied)
        }
    };

    info!(rule = %name, mode = mode.name(), matched, replacements, "rule applied");

    match output {
        Some(path) => {
            let validated = validate_output_path(path)?;
            write_graph(&rewritten, &validated)?;
            if !quiet {
                if json_mode {
                    let summary = serde_json::json!({
                        "rule": name,
                        "matched": matched,
                        "replacements": replacements,
                        "output": validated.to_string_lossy(),
                    });
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&summary).unwrap_or_default()
                    );
                } else {
                    println!(
                        "{}: {} replacement(s), written to {}",
                        name,
                        replacements,
                        validated.display()
                    );
                }
            }
        }
        None => println!("{}", graph_to_json(&rewritten)?),
    }
    Ok(())
}

/// Apply every queued stepped match in order. Matches invalidated by an
/// earlier rewrite are skipped.
fn drain_stepped(
    engine: &mut RuleEngine<GraphRewriter>,
    host: Graph,
) -> Result<(Graph, usize), RegraftError> {
    let mut current = host;
    let mut applied = 0usize;
    while let Some(result) = engine.advance()? {
        match engine.apply_match(&result) {
            Ok(next) => {
                current = next;
                applied += 1;
            }
            Err(RegraftError::UnresolvableHostNode(node)) => {
                warn!(%node, "skipping stale match");
            }
            Err(e) => return Err(e),
        }
    }
    Ok((current, applied))
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Validate a rule document.
pub fn cmd_check(rule_path: &Path, json_mode: bool) -> Result<(), RegraftError> {
    let rule = load_rule(rule_path)?;
    rule.validate()?;

    let graph = rule.pattern().graph();
    let operations: usize = rule.pattern().all_operations().values().map(Vec::len).sum();

    if json_mode {
        let output = serde_json::json!({
            "rule": rule.name,
            "valid": true,
            "mode": rule.config.mode.name(),
            "pattern_nodes": graph.node_count(),
            "operations": operations,
            "parameters": rule.parameters(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Rule '{}' is valid", rule.name);
    println!("  Mode:          {}", rule.config.mode.name());
    println!("  Pattern nodes: {}", graph.node_count());
    println!("  Operations:    {}", operations);
    println!("  Parameters:    {}", rule.parameters().len());
    Ok(())
}
