//! Label editing: key-to-text handling, LaTeX-style escapes and
//! superscript/subscript digits.

use super::events::Key;

/// Escape sequences replaced by their glyph as soon as they are typed.
///
/// No sequence is a prefix of another, so replacing on every keystroke never
/// fires early.
const ESCAPES: &[(&str, &str)] = &[
    ("\\alpha", "α"),
    ("\\beta", "β"),
    ("\\gamma", "γ"),
    ("\\delta", "δ"),
    ("\\epsilon", "ε"),
    ("\\zeta", "ζ"),
    ("\\eta", "η"),
    ("\\theta", "θ"),
    ("\\iota", "ι"),
    ("\\kappa", "κ"),
    ("\\lambda", "λ"),
    ("\\mu", "μ"),
    ("\\nu", "ν"),
    ("\\xi", "ξ"),
    ("\\omicron", "ο"),
    ("\\pi", "π"),
    ("\\rho", "ρ"),
    ("\\sigma", "σ"),
    ("\\tau", "τ"),
    ("\\upsilon", "υ"),
    ("\\phi", "φ"),
    ("\\chi", "χ"),
    ("\\psi", "ψ"),
    ("\\omega", "ω"),
    ("\\Alpha", "Α"),
    ("\\Beta", "Β"),
    ("\\Gamma", "Γ"),
    ("\\Delta", "Δ"),
    ("\\Epsilon", "Ε"),
    ("\\Zeta", "Ζ"),
    ("\\Eta", "Η"),
    ("\\Theta", "Θ"),
    ("\\Iota", "Ι"),
    ("\\Kappa", "Κ"),
    ("\\Lambda", "Λ"),
    ("\\Mu", "Μ"),
    ("\\Nu", "Ν"),
    ("\\Xi", "Ξ"),
    ("\\Omicron", "Ο"),
    ("\\Pi", "Π"),
    ("\\Rho", "Ρ"),
    ("\\Sigma", "Σ"),
    ("\\Tau", "Τ"),
    ("\\Upsilon", "Υ"),
    ("\\Phi", "Φ"),
    ("\\Chi", "Χ"),
    ("\\Psi", "Ψ"),
    ("\\Omega", "Ω"),
    ("\\emptyset", "∅"),
    ("\\rightarrow", "→"),
    ("\\leftarrow", "←"),
];

const SUPERSCRIPT_DIGITS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];
const SUBSCRIPT_DIGITS: [char; 10] = ['₀', '₁', '₂', '₃', '₄', '₅', '₆', '₇', '₈', '₉'];

/// How typed digits are written into a label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScriptMode {
    #[default]
    Normal,
    Superscript,
    Subscript,
}

impl ScriptMode {
    /// Switches to `target`, or back to normal if `target` is already active.
    pub fn toggled(self, target: ScriptMode) -> ScriptMode {
        if self == target {
            ScriptMode::Normal
        } else {
            target
        }
    }

    /// Maps a typed character through this mode. Only ASCII digits change.
    pub fn map_char(self, c: char) -> char {
        let Some(digit) = c.to_digit(10) else {
            return c;
        };
        match self {
            ScriptMode::Normal => c,
            ScriptMode::Superscript => SUPERSCRIPT_DIGITS[digit as usize],
            ScriptMode::Subscript => SUBSCRIPT_DIGITS[digit as usize],
        }
    }
}

/// Replaces every complete escape sequence in `text` with its glyph.
pub fn substitute_escapes(text: &mut String) {
    if !text.contains('\\') {
        return;
    }
    for (escape, glyph) in ESCAPES {
        if text.contains(escape) {
            *text = text.replace(escape, glyph);
        }
    }
}

/// Applies an editing key to a label. Returns `true` if the label changed.
pub fn apply_key(text: &mut String, key: Key, mode: ScriptMode) -> bool {
    match key {
        Key::Char(c) => {
            text.push(mode.map_char(c));
            substitute_escapes(text);
            true
        }
        Key::Space => {
            text.push(' ');
            true
        }
        Key::Return => {
            text.push('\n');
            true
        }
        Key::Backspace => text.pop().is_some(),
        _ => false,
    }
}
