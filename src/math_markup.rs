//! Math-markup rendering for model replies
//!
//! Replies carry LaTeX between `$…$` (inline) and `$$…$$` (block) delimiters.
//! Text is split into plain and math segments, and each math segment goes
//! through a [`Typesetter`] on its own. A segment that fails to typeset is
//! shown exactly as it arrived, delimiters included. Until a typesetter is
//! ready, text passes through unchanged.

use crate::config::MathOutputMode;
use crate::error::{MathGeniusError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};
use tokio::task::JoinHandle;

/// Block math first so `$$x$$` is never read as two empty inline spans
const MATH_PATTERN: &str = r"\$\$[\s\S]*?\$\$|\$[^$\n]*?\$";

fn math_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(MATH_PATTERN).expect("math delimiter pattern is valid"))
}

/// Inline or block typesetting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// `$…$`
    Inline,
    /// `$$…$$`
    Block,
}

/// A piece of reply text, keeping its raw form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Plain text between math spans
    Text(String),
    /// `$…$`, delimiters included
    InlineMath(String),
    /// `$$…$$`, delimiters included
    BlockMath(String),
}

impl Segment {
    /// The segment exactly as it appeared in the input
    pub fn raw(&self) -> &str {
        match self {
            Segment::Text(s) | Segment::InlineMath(s) | Segment::BlockMath(s) => s,
        }
    }

    /// LaTeX source between the delimiters, for math segments
    pub fn latex(&self) -> Option<&str> {
        match self {
            Segment::Text(_) => None,
            Segment::InlineMath(s) => Some(&s[1..s.len() - 1]),
            Segment::BlockMath(s) => Some(&s[2..s.len() - 2]),
        }
    }

    /// Display mode, for math segments
    pub fn display_mode(&self) -> Option<DisplayMode> {
        match self {
            Segment::Text(_) => None,
            Segment::InlineMath(_) => Some(DisplayMode::Inline),
            Segment::BlockMath(_) => Some(DisplayMode::Block),
        }
    }
}

/// Splits text into plain and math segments
///
/// Splitting is lossless: joining the raw segments gives back the input.
///
/// # Examples
///
/// ```
/// use mathgenius::math_markup::{split_segments, Segment};
///
/// let segments = split_segments("$a$ and $$b$$");
/// assert_eq!(
///     segments,
///     vec![
///         Segment::InlineMath("$a$".to_string()),
///         Segment::Text(" and ".to_string()),
///         Segment::BlockMath("$$b$$".to_string()),
///     ]
/// );
/// ```
pub fn split_segments(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for m in math_regex().find_iter(text) {
        if m.start() > cursor {
            segments.push(Segment::Text(text[cursor..m.start()].to_string()));
        }
        let token = m.as_str().to_string();
        if token.len() >= 4 && token.starts_with("$$") && token.ends_with("$$") {
            segments.push(Segment::BlockMath(token));
        } else {
            segments.push(Segment::InlineMath(token));
        }
        cursor = m.end();
    }

    if cursor < text.len() {
        segments.push(Segment::Text(text[cursor..].to_string()));
    }
    segments
}

/// Turns one LaTeX source into display text
pub trait Typesetter: Send + Sync {
    /// Typesets `source` (delimiters already removed)
    ///
    /// # Errors
    ///
    /// Returns error if the source cannot be typeset
    fn render(&self, source: &str, mode: DisplayMode) -> Result<String>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// LaTeX to MathML through `latex2mathml`
#[derive(Debug, Default, Clone, Copy)]
pub struct MathMlTypesetter;

impl Typesetter for MathMlTypesetter {
    fn render(&self, source: &str, mode: DisplayMode) -> Result<String> {
        let style = match mode {
            DisplayMode::Inline => latex2mathml::DisplayStyle::Inline,
            DisplayMode::Block => latex2mathml::DisplayStyle::Block,
        };
        latex2mathml::latex_to_mathml(source, style)
            .map_err(|e| MathGeniusError::Typesetting(e.to_string()).into())
    }

    fn name(&self) -> &'static str {
        "mathml"
    }
}

const SYMBOLS: &[(&str, &str)] = &[
    // operators
    ("cdot", "·"),
    ("times", "×"),
    ("div", "÷"),
    ("pm", "±"),
    ("mp", "∓"),
    ("ast", "∗"),
    ("circ", "∘"),
    ("degree", "°"),
    // relations
    ("le", "≤"),
    ("leq", "≤"),
    ("ge", "≥"),
    ("geq", "≥"),
    ("neq", "≠"),
    ("ne", "≠"),
    ("approx", "≈"),
    ("equiv", "≡"),
    ("sim", "∼"),
    ("cong", "≅"),
    ("in", "∈"),
    ("notin", "∉"),
    ("subset", "⊂"),
    ("subseteq", "⊆"),
    ("cup", "∪"),
    ("cap", "∩"),
    ("emptyset", "∅"),
    ("varnothing", "∅"),
    ("perp", "⊥"),
    ("parallel", "∥"),
    ("angle", "∠"),
    ("triangle", "△"),
    ("Rightarrow", "⇒"),
    ("Leftarrow", "⇐"),
    ("Leftrightarrow", "⇔"),
    ("rightarrow", "→"),
    ("to", "→"),
    ("leftarrow", "←"),
    ("infty", "∞"),
    ("ldots", "…"),
    ("dots", "…"),
    ("cdots", "⋯"),
    ("forall", "∀"),
    ("exists", "∃"),
    // Greek
    ("alpha", "α"),
    ("beta", "β"),
    ("gamma", "γ"),
    ("delta", "δ"),
    ("epsilon", "ε"),
    ("varepsilon", "ε"),
    ("zeta", "ζ"),
    ("eta", "η"),
    ("theta", "θ"),
    ("lambda", "λ"),
    ("mu", "μ"),
    ("nu", "ν"),
    ("xi", "ξ"),
    ("pi", "π"),
    ("rho", "ρ"),
    ("sigma", "σ"),
    ("tau", "τ"),
    ("phi", "φ"),
    ("varphi", "φ"),
    ("chi", "χ"),
    ("psi", "ψ"),
    ("omega", "ω"),
    ("Gamma", "Γ"),
    ("Delta", "Δ"),
    ("Theta", "Θ"),
    ("Lambda", "Λ"),
    ("Pi", "Π"),
    ("Sigma", "Σ"),
    ("Phi", "Φ"),
    ("Omega", "Ω"),
];

/// LaTeX mapped onto plain Unicode for terminals
///
/// Covers the notation of a lower-secondary curriculum. Unknown commands and
/// unbalanced braces are errors, so the caller shows the raw LaTeX instead
/// of a half-converted string.
pub struct UnicodeTypesetter {
    symbols: HashMap<&'static str, &'static str>,
}

impl UnicodeTypesetter {
    /// Builds the symbol table
    pub fn new() -> Self {
        Self {
            symbols: SYMBOLS.iter().copied().collect(),
        }
    }
}

impl Default for UnicodeTypesetter {
    fn default() -> Self {
        Self::new()
    }
}

impl Typesetter for UnicodeTypesetter {
    fn render(&self, source: &str, _mode: DisplayMode) -> Result<String> {
        let mut parser = UnicodeParser {
            chars: source.chars().collect(),
            pos: 0,
            symbols: &self.symbols,
        };
        let out = parser.parse_sequence(false)?;
        Ok(out.trim().to_string())
    }

    fn name(&self) -> &'static str {
        "unicode"
    }
}

fn typesetting_error(message: impl Into<String>) -> anyhow::Error {
    MathGeniusError::Typesetting(message.into()).into()
}

struct UnicodeParser<'a> {
    chars: Vec<char>,
    pos: usize,
    symbols: &'a HashMap<&'static str, &'static str>,
}

impl UnicodeParser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_spaces(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn parse_sequence(&mut self, in_group: bool) -> Result<String> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '}' if in_group => return Ok(out),
                '}' => return Err(typesetting_error("unbalanced '}'")),
                '{' => out.push_str(&self.parse_sequence(true)?),
                '\\' => out.push_str(&self.parse_command()?),
                '^' => {
                    let arg = self.parse_argument()?;
                    out.push_str(&superscript(&arg));
                }
                '_' => {
                    let arg = self.parse_argument()?;
                    out.push_str(&subscript(&arg));
                }
                '~' => out.push(' '),
                _ => out.push(c),
            }
        }
        if in_group {
            Err(typesetting_error("unbalanced '{'"))
        } else {
            Ok(out)
        }
    }

    fn parse_argument(&mut self) -> Result<String> {
        self.skip_spaces();
        match self.peek() {
            None => Err(typesetting_error("missing argument")),
            Some('}') => Err(typesetting_error("unbalanced '}'")),
            Some(c) => {
                self.pos += 1;
                match c {
                    '{' => self.parse_sequence(true),
                    '\\' => self.parse_command(),
                    _ => Ok(c.to_string()),
                }
            }
        }
    }

    fn read_command_name(&mut self) -> Result<String> {
        let first = self
            .peek()
            .ok_or_else(|| typesetting_error("dangling backslash"))?;
        self.pos += 1;
        if !first.is_ascii_alphabetic() {
            return Ok(first.to_string());
        }
        let mut name = first.to_string();
        while let Some(c) = self.peek().filter(char::is_ascii_alphabetic) {
            name.push(c);
            self.pos += 1;
        }
        Ok(name)
    }

    fn parse_optional_index(&mut self) -> Result<Option<String>> {
        self.skip_spaces();
        if self.peek() != Some('[') {
            return Ok(None);
        }
        self.pos += 1;
        let start = self.pos;
        while self.peek().is_some_and(|c| c != ']') {
            self.pos += 1;
        }
        if self.peek().is_none() {
            return Err(typesetting_error("unclosed '['"));
        }
        let raw: String = self.chars[start..self.pos].iter().collect();
        self.pos += 1;
        let mut inner = UnicodeParser {
            chars: raw.chars().collect(),
            pos: 0,
            symbols: self.symbols,
        };
        Ok(Some(inner.parse_sequence(false)?))
    }

    fn parse_command(&mut self) -> Result<String> {
        let name = self.read_command_name()?;
        match name.as_str() {
            "frac" | "dfrac" | "tfrac" => {
                let numerator = self.parse_argument()?;
                let denominator = self.parse_argument()?;
                Ok(format!("{}/{}", wrap(&numerator), wrap(&denominator)))
            }
            "sqrt" => {
                let index = self.parse_optional_index()?;
                let radicand = self.parse_argument()?;
                let prefix = index.map(|i| superscript(&i)).unwrap_or_default();
                Ok(format!("{}√({})", prefix, radicand.trim()))
            }
            "text" | "textrm" | "mathrm" | "mathbf" | "mathit" | "operatorname" => {
                self.parse_argument()
            }
            "mathbb" => {
                let arg = self.parse_argument()?;
                match arg.trim() {
                    "N" => Ok("ℕ".to_string()),
                    "Z" => Ok("ℤ".to_string()),
                    "Q" => Ok("ℚ".to_string()),
                    "R" => Ok("ℝ".to_string()),
                    "C" => Ok("ℂ".to_string()),
                    other => Err(typesetting_error(format!("unsupported \\mathbb{{{}}}", other))),
                }
            }
            "overline" | "bar" => Ok(combine(&self.parse_argument()?, '\u{0305}')),
            "hat" => Ok(combine(&self.parse_argument()?, '\u{0302}')),
            "vec" | "overrightarrow" => Ok(format!("{}\u{20D7}", self.parse_argument()?)),
            "widehat" => Ok(format!("∠{}", self.parse_argument()?)),
            "left" | "right" => {
                self.skip_spaces();
                match self.peek() {
                    Some('.') => {
                        self.pos += 1;
                        Ok(String::new())
                    }
                    Some('\\') => {
                        self.pos += 1;
                        self.parse_command()
                    }
                    Some(c) => {
                        self.pos += 1;
                        Ok(c.to_string())
                    }
                    None => Err(typesetting_error("missing delimiter")),
                }
            }
            "," | ";" | ":" | " " | "quad" | "qquad" => Ok(" ".to_string()),
            "!" => Ok(String::new()),
            "\\" => Ok("\n".to_string()),
            "{" | "}" | "%" | "$" | "&" | "#" | "_" => Ok(name),
            other => self
                .symbols
                .get(other)
                .map(|s| s.to_string())
                .ok_or_else(|| typesetting_error(format!("unknown command \\{}", other))),
        }
    }
}

/// Parenthesizes anything that is not a single number or name
fn wrap(part: &str) -> String {
    let part = part.trim();
    if part.chars().count() <= 1 || part.chars().all(char::is_alphanumeric) {
        part.to_string()
    } else {
        format!("({})", part)
    }
}

fn combine(base: &str, mark: char) -> String {
    base.chars().flat_map(|c| [c, mark]).collect()
}

fn superscript(arg: &str) -> String {
    let arg = arg.trim();
    if arg == "∘" {
        return "°".to_string();
    }
    let mapped: Option<String> = arg
        .chars()
        .map(|c| match c {
            '0' => Some('⁰'),
            '1' => Some('¹'),
            '2' => Some('²'),
            '3' => Some('³'),
            '4' => Some('⁴'),
            '5' => Some('⁵'),
            '6' => Some('⁶'),
            '7' => Some('⁷'),
            '8' => Some('⁸'),
            '9' => Some('⁹'),
            '+' => Some('⁺'),
            '-' => Some('⁻'),
            '=' => Some('⁼'),
            '(' => Some('⁽'),
            ')' => Some('⁾'),
            'n' => Some('ⁿ'),
            'i' => Some('ⁱ'),
            'x' => Some('ˣ'),
            _ => None,
        })
        .collect();
    mapped.unwrap_or_else(|| scripted('^', arg))
}

fn subscript(arg: &str) -> String {
    let arg = arg.trim();
    let mapped: Option<String> = arg
        .chars()
        .map(|c| match c {
            '0' => Some('₀'),
            '1' => Some('₁'),
            '2' => Some('₂'),
            '3' => Some('₃'),
            '4' => Some('₄'),
            '5' => Some('₅'),
            '6' => Some('₆'),
            '7' => Some('₇'),
            '8' => Some('₈'),
            '9' => Some('₉'),
            '+' => Some('₊'),
            '-' => Some('₋'),
            '=' => Some('₌'),
            '(' => Some('₍'),
            ')' => Some('₎'),
            'a' => Some('ₐ'),
            'e' => Some('ₑ'),
            'o' => Some('ₒ'),
            'x' => Some('ₓ'),
            'i' => Some('ᵢ'),
            'n' => Some('ₙ'),
            'm' => Some('ₘ'),
            'k' => Some('ₖ'),
            _ => None,
        })
        .collect();
    mapped.unwrap_or_else(|| scripted('_', arg))
}

fn scripted(marker: char, arg: &str) -> String {
    if arg.chars().count() == 1 {
        format!("{}{}", marker, arg)
    } else {
        format!("{}({})", marker, arg)
    }
}

/// Typesetter availability
pub enum TypesetterState {
    /// Not ready yet; text is shown verbatim
    Loading,
    /// Math segments are typeset
    Ready(Box<dyn Typesetter>),
    /// Typesetting switched off; text is shown verbatim
    Disabled,
}

/// One rendered piece of a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedSegment {
    /// Text passed through unchanged
    Plain(String),
    /// A math span turned into display text
    Math {
        /// Inline or block
        display: DisplayMode,
        /// Typesetter output
        output: String,
    },
    /// A math span that failed to typeset, shown as it arrived
    Raw(String),
}

impl RenderedSegment {
    /// Display text of this segment
    pub fn as_str(&self) -> &str {
        match self {
            RenderedSegment::Plain(s) | RenderedSegment::Raw(s) => s,
            RenderedSegment::Math { output, .. } => output,
        }
    }
}

/// Renders reply text through a typesetter that may still be loading
///
/// Clones share the same state, so a loader task can flip every handle to
/// ready at once.
#[derive(Clone)]
pub struct MathRenderer {
    state: Arc<RwLock<TypesetterState>>,
}

impl MathRenderer {
    /// A renderer whose typesetter has not loaded yet
    pub fn loading() -> Self {
        Self::with_state(TypesetterState::Loading)
    }

    /// A renderer ready to typeset immediately
    pub fn ready(typesetter: Box<dyn Typesetter>) -> Self {
        Self::with_state(TypesetterState::Ready(typesetter))
    }

    /// A renderer that never typesets
    pub fn disabled() -> Self {
        Self::with_state(TypesetterState::Disabled)
    }

    /// A ready renderer for the configured output mode
    pub fn for_mode(mode: MathOutputMode) -> Self {
        match load_typesetter(mode) {
            Some(typesetter) => Self::ready(typesetter),
            None => Self::disabled(),
        }
    }

    fn with_state(state: TypesetterState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Loads the typesetter for `mode` on a background task
    ///
    /// Until the task finishes, rendering is the identity.
    pub fn spawn_load(mode: MathOutputMode) -> (Self, JoinHandle<()>) {
        let renderer = Self::loading();
        let state = Arc::clone(&renderer.state);
        let handle = tokio::spawn(async move {
            let next = match load_typesetter(mode) {
                Some(typesetter) => {
                    tracing::debug!("Typesetter ready: {}", typesetter.name());
                    TypesetterState::Ready(typesetter)
                }
                None => TypesetterState::Disabled,
            };
            match state.write() {
                Ok(mut guard) => *guard = next,
                Err(_) => tracing::warn!("Typesetter state lock poisoned; math stays raw"),
            }
        });
        (renderer, handle)
    }

    /// Returns true once a typesetter is available
    pub fn is_ready(&self) -> bool {
        matches!(
            self.state.read().as_deref(),
            Ok(TypesetterState::Ready(_))
        )
    }

    /// Renders text segment by segment, preserving order
    pub fn render(&self, text: &str) -> Vec<RenderedSegment> {
        let guard = match self.state.read() {
            Ok(guard) => guard,
            Err(_) => return vec![RenderedSegment::Plain(text.to_string())],
        };
        let typesetter = match &*guard {
            TypesetterState::Ready(t) if text.contains('$') => t,
            _ => return vec![RenderedSegment::Plain(text.to_string())],
        };

        split_segments(text)
            .into_iter()
            .map(|segment| match (segment.latex(), segment.display_mode()) {
                (Some(source), Some(display)) => match typesetter.render(source, display) {
                    Ok(output) => RenderedSegment::Math { display, output },
                    Err(e) => {
                        tracing::debug!("Showing raw math for {:?}: {}", segment.raw(), e);
                        RenderedSegment::Raw(segment.raw().to_string())
                    }
                },
                _ => RenderedSegment::Plain(segment.raw().to_string()),
            })
            .collect()
    }

    /// Renders text into a single string
    ///
    /// # Examples
    ///
    /// ```
    /// use mathgenius::math_markup::{MathRenderer, UnicodeTypesetter};
    ///
    /// let renderer = MathRenderer::ready(Box::new(UnicodeTypesetter::new()));
    /// assert_eq!(renderer.render_to_string("Tính $x^2 + 1$"), "Tính x² + 1");
    /// ```
    pub fn render_to_string(&self, text: &str) -> String {
        self.render(text)
            .iter()
            .map(RenderedSegment::as_str)
            .collect()
    }
}

fn load_typesetter(mode: MathOutputMode) -> Option<Box<dyn Typesetter>> {
    match mode {
        MathOutputMode::Unicode => Some(Box::new(UnicodeTypesetter::new())),
        MathOutputMode::MathMl => Some(Box::new(MathMlTypesetter)),
        MathOutputMode::Raw => None,
    }
}
