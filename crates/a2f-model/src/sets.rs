//! Node sets and element sets as written in the deck.
//!
//! A named set is a list of blocks, one per `*NSET`/`*ELSET` header that
//! used the name. A block either lists IDs explicitly or holds
//! `start, end, stride` ranges (`GENERATE`). Both forms describe the same
//! kind of unordered ID set and are kept as written so they can be emitted
//! in the same compact form.

use std::collections::BTreeSet;

use crate::error::{ConvertError, Result};

/// Inclusive ID range with a positive stride.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRange {
    pub start: u64,
    pub end: u64,
    pub stride: u64,
}

impl IdRange {
    /// Parses `start, end[, stride]`; stride defaults to 1.
    pub fn parse(fields: &[String], line: usize) -> Result<Self> {
        let values: Vec<&str> = fields.iter().map(String::as_str).filter(|f| !f.is_empty()).collect();
        if values.len() < 2 {
            return Err(ConvertError::parse(line, "GENERATE line needs start and end"));
        }
        let start = parse_id(values[0], line)?;
        let end = parse_id(values[1], line)?;
        let stride = match values.get(2) {
            Some(v) => parse_id(v, line)?,
            None => 1,
        };
        if stride == 0 {
            return Err(ConvertError::parse(line, "GENERATE stride must be positive"));
        }
        Ok(Self { start, end, stride })
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        let stride = usize::try_from(self.stride).unwrap_or(usize::MAX);
        (self.start..=self.end).step_by(stride)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetBlock {
    Generate(Vec<IdRange>),
    Explicit(Vec<u64>),
}

impl SetBlock {
    pub fn is_generate(&self) -> bool {
        matches!(self, SetBlock::Generate(_))
    }
}

/// A named node or element set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdSet {
    pub blocks: Vec<SetBlock>,
}

impl IdSet {
    pub fn explicit(ids: Vec<u64>) -> Self {
        Self {
            blocks: vec![SetBlock::Explicit(ids)],
        }
    }

    /// Members in declaration order; duplicates are kept.
    pub fn members(&self) -> Vec<u64> {
        let mut out = Vec::new();
        for block in &self.blocks {
            match block {
                SetBlock::Generate(ranges) => {
                    for range in ranges {
                        out.extend(range.iter());
                    }
                }
                SetBlock::Explicit(ids) => out.extend_from_slice(ids),
            }
        }
        out
    }

    pub fn member_set(&self) -> BTreeSet<u64> {
        self.members().into_iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|b| match b {
            SetBlock::Generate(ranges) => ranges.iter().all(|r| r.iter().next().is_none()),
            SetBlock::Explicit(ids) => ids.is_empty(),
        })
    }

    /// Appends one data line to the last block.
    pub fn push_line(&mut self, fields: &[String], line: usize) -> Result<()> {
        match self.blocks.last_mut() {
            Some(SetBlock::Generate(ranges)) => ranges.push(IdRange::parse(fields, line)?),
            Some(SetBlock::Explicit(ids)) => {
                for field in fields.iter().filter(|f| !f.is_empty()) {
                    ids.push(parse_id(field, line)?);
                }
            }
            None => return Err(ConvertError::parse(line, "set data without a set header")),
        }
        Ok(())
    }
}

pub fn parse_id(field: &str, line: usize) -> Result<u64> {
    field
        .parse::<u64>()
        .map_err(|_| ConvertError::parse(line, format!("expected a positive integer ID, found '{field}'")))
}
