use std::ops::Range;

use fxhash::FxHashMap;
use miette::SourceSpan;

/// Byte offset from the start of a source file.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct SrcOffset(pub usize);

/// Location within the source str.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Span {
    offs: SrcOffset,
    len: usize,
}

impl Span {
    pub fn new(offs: SrcOffset, len: usize) -> Self {
        Span { offs, len }
    }

    /// Returns a range that can be used to index the source.
    pub fn as_range(&self) -> Range<usize> {
        self.offs()..self.end()
    }

    pub fn offs(&self) -> usize {
        self.offs.0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn end(&self) -> usize {
        self.offs.0 + self.len
    }
}

// Used for miette conversion
impl From<Span> for SourceSpan {
    fn from(value: Span) -> Self {
        SourceSpan::new(value.offs().into(), value.len())
    }
}

/// Label definitions collected during a single assembly pass.
///
/// Keys are the full identifier text. The map hashes with fxhash, so the
/// hash is an acceleration only and can never alias two distinct labels.
#[derive(Default, Debug)]
pub struct SymbolTable {
    map: FxHashMap<String, u16>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a label definition. Errors if the label already exists.
    pub fn insert(&mut self, label: &str, addr: u16) -> Result<(), ()> {
        if self.map.insert(label.to_string(), addr).is_some() {
            Err(())
        } else {
            Ok(())
        }
    }

    pub fn get(&self, label: &str) -> Option<u16> {
        self.map.get(label).copied()
    }
}
