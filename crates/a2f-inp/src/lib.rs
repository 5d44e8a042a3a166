//! Streaming tokenizer for Abaqus-style `.inp` keyword decks.
//!
//! The deck is read one physical line at a time. Header lines (`*KEYWORD,
//! KEY=value, FLAG`) are folded into a [`Header`]; every other non-comment
//! line is handed out as a [`DataLine`] tagged with its 1-based line number.
//! Consumers drive the stream themselves so that a section can pull in a
//! continuation line with [`LineStream::take_continuation`].

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Closed set of section keywords understood by the converter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Keyword {
    Node,
    System,
    Element,
    Nset,
    Elset,
    SolidSection,
    Surface,
    Material,
    Density,
    Elastic,
    Expansion,
    Hyperelastic,
    Plastic,
    Viscoelastic,
    Trs,
    DruckerPrager,
    Creep,
    SurfaceInteraction,
    SurfaceBehavior,
    Friction,
    ContactPair,
    Tie,
    Amplitude,
    Boundary,
    Cload,
    Dsload,
    Dload,
    Temperature,
    BaseMotion,
    InitialConditions,
    Step,
    Static,
    Visco,
    Frequency,
    SteadyStateDynamics,
    ModalDamping,
    Spring,
    Orientation,
    Mpc,
    Output,
    NodeOutput,
    ContactOutput,
    ElementOutput,
    Part,
    Unknown(String),
}

impl Keyword {
    /// Maps a normalized section name (whitespace removed, upper case).
    pub fn from_name(name: &str) -> Self {
        match name {
            "NODE" => Keyword::Node,
            "SYSTEM" => Keyword::System,
            "ELEMENT" => Keyword::Element,
            "NSET" => Keyword::Nset,
            "ELSET" => Keyword::Elset,
            "SOLIDSECTION" => Keyword::SolidSection,
            "SURFACE" => Keyword::Surface,
            "MATERIAL" => Keyword::Material,
            "DENSITY" => Keyword::Density,
            "ELASTIC" => Keyword::Elastic,
            "EXPANSION" => Keyword::Expansion,
            "HYPERELASTIC" => Keyword::Hyperelastic,
            "PLASTIC" => Keyword::Plastic,
            "VISCOELASTIC" => Keyword::Viscoelastic,
            "TRS" => Keyword::Trs,
            "DRUCKERPRAGER" => Keyword::DruckerPrager,
            "CREEP" => Keyword::Creep,
            "SURFACEINTERACTION" => Keyword::SurfaceInteraction,
            "SURFACEBEHAVIOR" => Keyword::SurfaceBehavior,
            "FRICTION" => Keyword::Friction,
            "CONTACTPAIR" => Keyword::ContactPair,
            "TIE" => Keyword::Tie,
            "AMPLITUDE" => Keyword::Amplitude,
            "BOUNDARY" => Keyword::Boundary,
            "CLOAD" => Keyword::Cload,
            "DSLOAD" => Keyword::Dsload,
            "DLOAD" => Keyword::Dload,
            "TEMPERATURE" => Keyword::Temperature,
            "BASEMOTION" => Keyword::BaseMotion,
            "INITIALCONDITION" | "INITIALCONDITIONS" => Keyword::InitialConditions,
            "STEP" => Keyword::Step,
            "STATIC" => Keyword::Static,
            "VISCO" => Keyword::Visco,
            "FREQUENCY" => Keyword::Frequency,
            "STEADYSTATEDYNAMICS" => Keyword::SteadyStateDynamics,
            "MODALDAMPING" => Keyword::ModalDamping,
            "SPRING" => Keyword::Spring,
            "ORIENTATION" => Keyword::Orientation,
            "MPC" => Keyword::Mpc,
            "OUTPUT" => Keyword::Output,
            "NODEOUTPUT" => Keyword::NodeOutput,
            "CONTACTOUTPUT" => Keyword::ContactOutput,
            "ELEMENTOUTPUT" => Keyword::ElementOutput,
            "PART" => Keyword::Part,
            other => Keyword::Unknown(other.to_string()),
        }
    }

    /// Material property sections that attach to the open `*MATERIAL`.
    pub fn is_material_property(&self) -> bool {
        matches!(
            self,
            Keyword::Density
                | Keyword::Elastic
                | Keyword::Expansion
                | Keyword::Hyperelastic
                | Keyword::Plastic
                | Keyword::Viscoelastic
                | Keyword::Trs
                | Keyword::DruckerPrager
                | Keyword::Creep
        )
    }
}

/// A parsed `*KEYWORD, KEY=value, FLAG` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub keyword: Keyword,
    /// Section name as written, whitespace removed and upper-cased.
    pub name: String,
    /// Keyed options; keys upper-cased, values verbatim.
    pub options: BTreeMap<String, String>,
    /// Options without `=`, upper-cased.
    pub flags: Vec<String>,
    pub line: usize,
}

impl Header {
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn has_option(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }
}

/// A non-header, non-comment line of the deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLine {
    pub line: usize,
    pub text: String,
}

impl DataLine {
    /// Comma-separated fields with all blanks removed.
    pub fn fields(&self) -> Vec<String> {
        split_fields(&self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Header(Header),
    Data(DataLine),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Line-by-line reader over deck text with one line of lookahead.
pub struct LineStream<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> LineStream<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self {
            lines: raw.lines().collect(),
            pos: 0,
        }
    }

    /// Line number of the most recently consumed line.
    pub fn line_number(&self) -> usize {
        self.pos
    }

    /// Consumes the next physical line unless it starts a new card.
    ///
    /// Used to join a data line that ends in a comma with its successor.
    pub fn take_continuation(&mut self) -> Option<DataLine> {
        let text = self.lines.get(self.pos)?;
        if text.trim_start().starts_with('*') {
            return None;
        }
        self.pos += 1;
        Some(DataLine {
            line: self.pos,
            text: text.trim_end_matches('\r').to_string(),
        })
    }

    /// Returns the next header or data line, skipping blanks and comments.
    pub fn next_line(&mut self) -> Result<Option<Line>, ParseError> {
        while self.pos < self.lines.len() {
            let raw = self.lines[self.pos].trim_end_matches('\r');
            self.pos += 1;
            let trimmed = raw.trim_start();

            if trimmed.trim().is_empty() || is_comment(trimmed) {
                continue;
            }

            if !trimmed.starts_with('*') {
                return Ok(Some(Line::Data(DataLine {
                    line: self.pos,
                    text: raw.to_string(),
                })));
            }

            let line = self.pos;
            let mut joined = strip_blanks(trimmed);
            while joined.ends_with(',') {
                match self.lines.get(self.pos) {
                    Some(next) => {
                        joined.push_str(&strip_blanks(next));
                        self.pos += 1;
                    }
                    None => break,
                }
            }
            return parse_header(&joined[1..], line).map(|h| Some(Line::Header(h)));
        }
        Ok(None)
    }
}

fn is_comment(line: &str) -> bool {
    line.starts_with("**")
}

fn strip_blanks(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Splits a data line on commas after removing every blank.
pub fn split_fields(text: &str) -> Vec<String> {
    strip_blanks(text).split(',').map(str::to_string).collect()
}

fn parse_header(header: &str, line: usize) -> Result<Header, ParseError> {
    let mut parts = header.split(',');
    let name = parts.next().unwrap_or_default().to_ascii_uppercase();
    if name.is_empty() {
        return Err(ParseError {
            line,
            message: "empty card keyword".to_string(),
        });
    }

    let mut options = BTreeMap::new();
    let mut flags = Vec::new();
    for item in parts {
        if item.is_empty() {
            continue;
        }
        if let Some((k, v)) = item.split_once('=') {
            options.insert(k.to_ascii_uppercase(), v.to_string());
        } else {
            flags.push(item.to_ascii_uppercase());
        }
    }

    Ok(Header {
        keyword: Keyword::from_name(&name),
        name,
        options,
        flags,
        line,
    })
}
