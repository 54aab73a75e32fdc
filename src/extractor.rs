//! Extraction orchestrator.
//!
//! Parses the script once, runs the three round passes and the message
//! locator over the shared tree, resolves and evaluates each pass's
//! expressions, then assembles the key table and the byte key.

use crate::errors::{SlotError, MAIN_ROUNDS};
use crate::expr::RoundKeyExpression;
use crate::key::{ByteKey, EncryptionKeyTable, Slot, DEFAULT_KEY_GROUPS};
use crate::parser::parse_script;
use crate::resolver::{resolve, BindingPolicy, Bindings};
use crate::rounds::{
    extract_first_round, extract_last_round, extract_main_rounds, locate_message,
    MessageDescriptor,
};
use crate::syntax::SyntaxTree;
use crate::utils::helpers::colors::{colorize, ENDC, FAIL, GRAY, HEADER, OKGREEN, WARNING};
use crate::utils::helpers::{abbreviate, word_hex};
use anyhow::{Context, Result};
use serde::Serialize;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Hex,
}

/// Configuration for an extraction run.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Number of leading table groups packed into the byte key.
    pub key_groups: usize,
    /// Main and last rounds keep the first declarator binding of a name.
    /// When false every pass lets later declarators overwrite.
    pub sticky_declarations: bool,
    pub format: OutputFormat,
    pub color: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            key_groups: DEFAULT_KEY_GROUPS,
            sticky_declarations: true,
            format: OutputFormat::Text,
            color: true,
        }
    }
}

impl ExtractorConfig {
    /// Binding policy for the main and last round passes.
    fn late_round_policy(&self) -> BindingPolicy {
        if self.sticky_declarations {
            BindingPolicy::StickyDeclarations
        } else {
            BindingPolicy::Overwrite
        }
    }
}

/// Which part of the key schedule a pass recovers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Round {
    First,
    Main,
    Last,
}

impl Round {
    pub fn as_str(self) -> &'static str {
        match self {
            Round::First => "first",
            Round::Main => "main",
            Round::Last => "last",
        }
    }
}

/// Everything one round pass produced.
#[derive(Debug, Clone, Serialize)]
pub struct RoundPass {
    pub round: Round,
    pub policy: BindingPolicy,
    pub expressions: Vec<Result<RoundKeyExpression, SlotError>>,
    pub bindings: Bindings,
    #[serde(skip)]
    pub slots: Vec<Slot>,
}

impl RoundPass {
    /// Resolve the variables `expressions` reference and evaluate each one.
    fn run(
        tree: &SyntaxTree,
        round: Round,
        expressions: Vec<Result<RoundKeyExpression, SlotError>>,
        policy: BindingPolicy,
    ) -> Self {
        let mut names: Vec<String> = expressions
            .iter()
            .flatten()
            .flat_map(RoundKeyExpression::variable_names)
            .collect();
        names.sort();
        names.dedup();

        let bindings = resolve(tree, &names, policy);
        let slots: Vec<Slot> = expressions
            .iter()
            .map(|e| e.clone().and_then(|e| e.evaluate(&bindings)))
            .collect();

        for (i, (expr, slot)) in expressions.iter().zip(&slots).enumerate() {
            match (expr, slot) {
                (Ok(e), Ok(w)) => log::debug!("{} round word {i}: {e} = {}", round.as_str(), word_hex(*w)),
                (_, Err(err)) => log::warn!("{} round word {i}: {err}", round.as_str()),
                (Err(_), Ok(_)) => {}
            }
        }
        log::info!(
            "{} round: {} expressions, {} bindings",
            round.as_str(),
            expressions.len(),
            bindings.len()
        );

        Self {
            round,
            policy,
            expressions,
            bindings,
            slots,
        }
    }
}

/// Result of an extraction run.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub message: Option<MessageDescriptor>,
    pub passes: [RoundPass; 3],
    pub table: EncryptionKeyTable,
    pub key: ByteKey,
    pub text: String,
}

impl Extraction {
    pub fn pass(&self, round: Round) -> &RoundPass {
        match round {
            Round::First => &self.passes[0],
            Round::Main => &self.passes[1],
            Round::Last => &self.passes[2],
        }
    }

    /// Symbolic expressions of one pass, in slot order.
    pub fn expressions(&self, round: Round) -> &[Result<RoundKeyExpression, SlotError>] {
        &self.pass(round).expressions
    }

    /// `(location, message)` for every degraded part of the run.
    pub fn problems(&self) -> Vec<(String, String)> {
        let mut problems = Vec::new();
        if self.message.is_none() {
            problems.push(("message".to_string(), "no encryption entry point".to_string()));
        }
        let main = self.table.main_rounds();
        if main < MAIN_ROUNDS {
            problems.push((
                "main".to_string(),
                format!("only {main} of {MAIN_ROUNDS} main round groups"),
            ));
        }
        for (g, w, err) in self.table.invalid_slots() {
            problems.push((format!("word {g}.{w}"), err.to_string()));
        }
        problems
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "message": self.message,
            "rounds": self.passes,
            "table": self.table.to_json(),
            "complete": self.table.is_complete(),
            "key": self.key,
            "key_hex": self.key.to_hex(),
            "problems": self.problems(),
        })
    }
}

/// Recover the round-key table and byte key from script text.
pub fn extract_key(script: &str, config: &ExtractorConfig) -> Result<Extraction> {
    let tree = parse_script(script).context("failed to parse script")?;

    let message = locate_message(&tree);

    let first = RoundPass::run(
        &tree,
        Round::First,
        extract_first_round(&tree).into_iter().map(Ok).collect(),
        BindingPolicy::Overwrite,
    );
    let main = RoundPass::run(
        &tree,
        Round::Main,
        extract_main_rounds(&tree).into_iter().map(Ok).collect(),
        config.late_round_policy(),
    );
    let last = RoundPass::run(
        &tree,
        Round::Last,
        extract_last_round(&tree),
        config.late_round_policy(),
    );

    let table = EncryptionKeyTable::assemble(
        first.slots.clone(),
        main.slots.clone(),
        last.slots.clone(),
    );
    let key = table.pack(config.key_groups);
    log::info!("packed {} groups into a {}-byte key", config.key_groups.min(table.len()), key.len());

    let mut extraction = Extraction {
        message,
        passes: [first, main, last],
        table,
        key,
        text: String::new(),
    };

    extraction.text = match config.format {
        OutputFormat::Json => serde_json::to_string_pretty(&extraction.to_json())
            .context("serialise to JSON")?,
        OutputFormat::Hex => extraction.key.to_hex(),
        OutputFormat::Text => render_text(&extraction, &tree, config.color),
    };

    Ok(extraction)
}

fn render_text(extraction: &Extraction, tree: &SyntaxTree, color: bool) -> String {
    let mut lines = Vec::new();

    let problems = extraction.problems();
    if !problems.is_empty() {
        lines.push(colorize("# Problems", WARNING, color));
        for (at, msg) in &problems {
            lines.push(colorize(&format!("#   {at}: {msg}"), GRAY, color));
        }
        lines.push(String::new());
    }

    lines.push(colorize("message:", HEADER, color));
    match &extraction.message {
        Some(m) => {
            let name = m.name.as_deref().unwrap_or("?");
            let excerpt = abbreviate(tree.slice(crate::syntax::Span::new(m.start, m.end)), 60);
            lines.push(format!("  {name} at {}..{}", m.start, m.end));
            lines.push(colorize(&format!("  {excerpt}"), GRAY, color));
        }
        None => lines.push(colorize("  not found", FAIL, color)),
    }
    lines.push(String::new());

    for pass in &extraction.passes {
        lines.push(colorize(
            &format!("{} round ({:?}):", pass.round.as_str(), pass.policy),
            HEADER,
            color,
        ));
        for (i, (expr, slot)) in pass.expressions.iter().zip(&pass.slots).enumerate() {
            let expr = match expr {
                Ok(e) => e.to_string(),
                Err(_) => "?".to_string(),
            };
            let value = match slot {
                Ok(w) => colorize(&word_hex(*w), OKGREEN, color),
                Err(e) => colorize(&e.to_string(), FAIL, color),
            };
            lines.push(format!("  {i:>2}  {:<24} {value}", abbreviate(&expr, 24)));
        }
    }
    lines.push(String::new());

    lines.push(colorize("table:", HEADER, color));
    lines.push(extraction.table.to_string().trim_end().to_string());
    lines.push(String::new());

    let key = if color {
        format!("{OKGREEN}{}{ENDC}", extraction.key.to_hex())
    } else {
        extraction.key.to_hex()
    };
    lines.push(format!("key: {key}"));

    lines.join("\n")
}
