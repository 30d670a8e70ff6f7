//! Math and chemistry notation to Unicode.
//!
//! [`normalize`] runs [`PIPELINE`] in order; every stage is a plain `&str -> String`
//! transform and later stages see the output of earlier ones. Escape stripping in the
//! last stage can expose tokens an earlier stage would have rewritten, so the whole
//! pipeline is repeated until the text stops changing.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

pub type Stage = fn(&str) -> String;

pub const PIPELINE: &[(&str, Stage)] = &[
    ("operators", replace_operators),
    ("commands", replace_commands),
    ("keywords", replace_keywords),
    ("radicals", collapse_radicals),
    ("constructs", expand_constructs),
    ("scripts", convert_scripts),
    ("chemistry", subscript_chemical_formulas),
    ("cleanup", cleanup),
];

const SUPERSCRIPT_FROM: &str = "0123456789+-=()n";
const SUPERSCRIPT_TO: &str = "⁰¹²³⁴⁵⁶⁷⁸⁹⁺⁻⁼⁽⁾ⁿ";
const SUBSCRIPT_FROM: &str = "0123456789+-=()aehijklmnoprstuvx";
const SUBSCRIPT_TO: &str = "₀₁₂₃₄₅₆₇₈₉₊₋₌₍₎ₐₑₕᵢⱼₖₗₘₙₒₚᵣₛₜᵤᵥₓ";

// Longest tokens first.
const OPERATORS: &[(&str, &str)] = &[
    ("<=>", "⇔"),
    ("<->", "↔"),
    (">=", "≥"),
    ("<=", "≤"),
    ("!=", "≠"),
    ("->", "→"),
    ("<-", "←"),
];

static COMMANDS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("alpha", "α"), ("beta", "β"), ("gamma", "γ"), ("delta", "δ"), ("epsilon", "ε"),
        ("varepsilon", "ε"), ("zeta", "ζ"), ("eta", "η"), ("theta", "θ"), ("iota", "ι"),
        ("kappa", "κ"), ("lambda", "λ"), ("mu", "μ"), ("nu", "ν"), ("xi", "ξ"),
        ("omicron", "ο"), ("pi", "π"), ("rho", "ρ"), ("sigma", "σ"), ("tau", "τ"),
        ("upsilon", "υ"), ("phi", "φ"), ("varphi", "φ"), ("chi", "χ"), ("psi", "ψ"),
        ("omega", "ω"),
        ("Gamma", "Γ"), ("Delta", "Δ"), ("Theta", "Θ"), ("Lambda", "Λ"), ("Xi", "Ξ"),
        ("Pi", "Π"), ("Sigma", "Σ"), ("Upsilon", "Υ"), ("Phi", "Φ"), ("Psi", "Ψ"),
        ("Omega", "Ω"),
        ("pm", "±"), ("mp", "∓"), ("times", "×"), ("div", "÷"), ("cdot", "⋅"),
        ("neq", "≠"), ("ne", "≠"), ("leq", "≤"), ("le", "≤"), ("geq", "≥"), ("ge", "≥"),
        ("approx", "≈"), ("equiv", "≡"), ("sim", "∼"), ("propto", "∝"),
        ("in", "∈"), ("notin", "∉"), ("subset", "⊂"), ("supset", "⊃"),
        ("subseteq", "⊆"), ("supseteq", "⊇"), ("cup", "∪"), ("cap", "∩"),
        ("emptyset", "∅"), ("sum", "∑"), ("prod", "∏"), ("int", "∫"),
        ("partial", "∂"), ("nabla", "∇"), ("infty", "∞"), ("forall", "∀"),
        ("exists", "∃"), ("angle", "∠"), ("perp", "⊥"), ("parallel", "∥"),
        ("rightarrow", "→"), ("to", "→"), ("leftarrow", "←"), ("leftrightarrow", "↔"),
        ("Rightarrow", "⇒"), ("Leftarrow", "⇐"), ("Leftrightarrow", "⇔"),
        ("uparrow", "↑"), ("downarrow", "↓"),
        ("ldots", "…"), ("cdots", "⋯"), ("vdots", "⋮"), ("ddots", "⋱"),
        ("circ", "°"), ("degree", "°"),
    ])
});

static COMMAND_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\([A-Za-z]+)").expect("COMMAND_TOKEN is a valid regex pattern"));
static KEYWORD_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(sqrt|inf)\b").expect("KEYWORD_TOKEN is a valid regex pattern"));
static PI_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bpi\b").expect("PI_TOKEN is a valid regex pattern"));
static DEGREE_MARK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\^o\b").expect("DEGREE_MARK is a valid regex pattern"));
static RADICAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"√\s*[{<(]([^})>]+)[})>]").expect("RADICAL is a valid regex pattern")
});
static FRACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\[dt]?frac\{([^}]+)\}\{([^}]+)\}").expect("FRACTION is a valid regex pattern")
});
static VECTOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\vec\{([^}]+)\}").expect("VECTOR is a valid regex pattern"));
static HAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\hat\{([A-Za-z])\}").expect("HAT is a valid regex pattern"));
static BRACED_SUPERSCRIPT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\^\{([^}]+)\}").expect("BRACED_SUPERSCRIPT is a valid regex pattern")
});
static BARE_SUPERSCRIPT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\^([0-9n()+\-]+)").expect("BARE_SUPERSCRIPT is a valid regex pattern")
});
static BRACED_SUBSCRIPT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"_\{([^}]+)\}").expect("BRACED_SUBSCRIPT is a valid regex pattern")
});
static BARE_SUBSCRIPT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"_([0-9aehijklmnoprstuvx]+)").expect("BARE_SUBSCRIPT is a valid regex pattern")
});
static FORMULA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:[A-Z][a-z]?[0-9]*)+").expect("FORMULA is a valid regex pattern")
});
static ELEMENT_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z])([0-9]+)").expect("ELEMENT_COUNT is a valid regex pattern")
});
static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("WHITESPACE is a valid regex pattern"));

/// Rewrite math/chemistry notation into Unicode. Empty input is returned unchanged.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut current = text.to_string();
    for _ in 0..=rewrite_budget(text) {
        let next = run_pipeline(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Upper bound on the passes that can still change `text`. Every rewrite either shortens
/// the text or turns a bracket, ASCII digit or non-space whitespace into something else,
/// and no stage introduces those characters.
fn rewrite_budget(text: &str) -> usize {
    text.chars()
        .map(|c| match c {
            '{' | '}' | '<' | '>' => 2,
            c if c.is_ascii_digit() => 2,
            c if c.is_whitespace() && c != ' ' => 2,
            _ => 1,
        })
        .sum()
}

fn run_pipeline(text: &str) -> String {
    PIPELINE
        .iter()
        .fold(text.to_string(), |acc, (_, stage)| stage(&acc))
}

pub fn replace_operators(text: &str) -> String {
    OPERATORS
        .iter()
        .fold(text.to_string(), |acc, (op, glyph)| acc.replace(op, glyph))
}

/// A command ends at its last letter; commands glued to a digit are left alone.
pub fn replace_commands(text: &str) -> String {
    COMMAND_TOKEN
        .replace_all(text, |caps: &Captures| {
            let end = caps.get(0).map_or(text.len(), |m| m.end());
            let glued_to_digit = text[end..].starts_with(|c: char| c.is_ascii_digit());
            match COMMANDS.get(&caps[1]) {
                Some(glyph) if !glued_to_digit => glyph.to_string(),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

pub fn replace_keywords(text: &str) -> String {
    let text = KEYWORD_TOKEN.replace_all(text, |caps: &Captures| {
        if caps[1].eq_ignore_ascii_case("sqrt") {
            "√"
        } else {
            "∞"
        }
    });
    let text = PI_TOKEN.replace_all(&text, "π");
    DEGREE_MARK.replace_all(&text, "°").into_owned()
}

pub fn collapse_radicals(text: &str) -> String {
    RADICAL.replace_all(text, "√(${1})").into_owned()
}

pub fn expand_constructs(text: &str) -> String {
    let text = FRACTION.replace_all(text, "(${1}/${2})");
    let text = VECTOR.replace_all(&text, "${1}\u{20D7}");
    HAT.replace_all(&text, "${1}\u{0302}").into_owned()
}

pub fn convert_scripts(text: &str) -> String {
    let text = BRACED_SUPERSCRIPT.replace_all(text, to_superscript);
    let text = BARE_SUPERSCRIPT.replace_all(&text, to_superscript);
    let text = BRACED_SUBSCRIPT.replace_all(&text, to_subscript);
    BARE_SUBSCRIPT.replace_all(&text, to_subscript).into_owned()
}

fn to_superscript(caps: &Captures) -> String {
    translate(&caps[1], SUPERSCRIPT_FROM, SUPERSCRIPT_TO)
}

fn to_subscript(caps: &Captures) -> String {
    translate(&caps[1], SUBSCRIPT_FROM, SUBSCRIPT_TO)
}

pub fn subscript_chemical_formulas(text: &str) -> String {
    FORMULA
        .replace_all(text, |caps: &Captures| {
            ELEMENT_COUNT
                .replace_all(&caps[0], |inner: &Captures| {
                    format!(
                        "{}{}",
                        &inner[1],
                        translate(&inner[2], SUBSCRIPT_FROM, SUBSCRIPT_TO)
                    )
                })
                .into_owned()
        })
        .into_owned()
}

pub fn cleanup(text: &str) -> String {
    let unescaped = text.replace('\\', "");
    WHITESPACE.replace_all(&unescaped, " ").trim().to_string()
}

/// Character-wise table translation; characters outside `from` pass through.
fn translate(text: &str, from: &str, to: &str) -> String {
    text.chars()
        .map(|c| {
            from.chars()
                .position(|f| f == c)
                .and_then(|idx| to.chars().nth(idx))
                .unwrap_or(c)
        })
        .collect()
}
