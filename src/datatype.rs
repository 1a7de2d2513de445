//! Typed payload shapes for variable records.
//!
//! Each variable carries a datatype fixed at creation time. The grammar
//! is a closed set of tagged variants rather than free-form strings:
//!
//! - `Scalar`: one value per time step
//! - `Pos1D` / `Pos2D`: a position on a 1-D or 2-D map (1 or 2 values)
//! - `Map1D<E>=n`: a map of `n` elements of kind `E`
//! - `Map2D<E>=s`: a square grid of side `s` (`s²` elements of kind `E`)
//!
//! All elements are `f64`; kinds differ in arity, not in scalar width.
//! The canonical string rendering (via `Display`) is what the file
//! header stores, and `FromStr` parses it back.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Kind of the individual elements of a map datatype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// A plain scalar value.
    Scalar,
    /// A position on a 1-D map (one value).
    Pos1D,
    /// A position on a 2-D map (two values).
    Pos2D,
}

impl ElementKind {
    /// Number of `f64` values one element of this kind occupies.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Scalar | Self::Pos1D => 1,
            Self::Pos2D => 2,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "Scalar",
            Self::Pos1D => "Pos1D",
            Self::Pos2D => "Pos2D",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "Scalar" => Some(Self::Scalar),
            "Pos1D" => Some(Self::Pos1D),
            "Pos2D" => Some(Self::Pos2D),
            _ => None,
        }
    }
}

/// Shape of one record of a variable.
///
/// Immutable once a variable file exists; opening an existing file with
/// an incompatible descriptor fails with
/// [`Error::SchemaMismatch`](crate::Error::SchemaMismatch) rather than
/// silently coercing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDescriptor {
    /// A single scalar per time step.
    Scalar,
    /// A 1-D map position per time step.
    Pos1D,
    /// A 2-D map position per time step.
    Pos2D,
    /// A flat map of `size` elements.
    Map1D {
        /// Kind of each map element.
        element: ElementKind,
        /// Number of elements in the map.
        size: usize,
    },
    /// A square grid of `side * side` elements.
    Map2D {
        /// Kind of each grid element.
        element: ElementKind,
        /// Side length of the square grid.
        side: usize,
    },
}

impl TypeDescriptor {
    /// Number of `f64` values in one record of this datatype.
    #[must_use]
    pub const fn record_len(&self) -> usize {
        match self {
            Self::Scalar | Self::Pos1D => 1,
            Self::Pos2D => 2,
            Self::Map1D { element, size } => element.width() * *size,
            Self::Map2D { element, side } => element.width() * *side * *side,
        }
    }

    /// Fixed byte width of one record on disk.
    #[must_use]
    pub const fn record_bytes(&self) -> usize {
        self.record_len() * std::mem::size_of::<f64>()
    }

    /// Side length of a map datatype.
    ///
    /// For `Map1D` this is the declared element count; for `Map2D` the
    /// declared side of the square grid.
    ///
    /// # Errors
    ///
    /// Fails with `UnsupportedQuery` for non-map datatypes, which have
    /// no notion of a side.
    pub fn side(&self) -> Result<usize> {
        match self {
            Self::Map1D { size, .. } => Ok(*size),
            Self::Map2D { side, .. } => Ok(*side),
            _ => Err(Error::UnsupportedQuery {
                datatype: self.to_string(),
                query: "side",
            }),
        }
    }

    /// Kind of the elements making up one record.
    #[must_use]
    pub const fn element_kind(&self) -> ElementKind {
        match self {
            Self::Scalar => ElementKind::Scalar,
            Self::Pos1D => ElementKind::Pos1D,
            Self::Pos2D => ElementKind::Pos2D,
            Self::Map1D { element, .. } | Self::Map2D { element, .. } => *element,
        }
    }

    /// Whether two descriptors may address the same file.
    ///
    /// Compatibility is structural: same element kind and same total
    /// element count. `Map1D<Scalar>=4` and `Map2D<Scalar>=2` are
    /// compatible, as are `Scalar` and `Map1D<Scalar>=1`.
    #[must_use]
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.element_kind() == other.element_kind() && self.record_len() == other.record_len()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => write!(f, "Scalar"),
            Self::Pos1D => write!(f, "Pos1D"),
            Self::Pos2D => write!(f, "Pos2D"),
            Self::Map1D { element, size } => write!(f, "Map1D<{}>={size}", element.as_str()),
            Self::Map2D { element, side } => write!(f, "Map2D<{}>={side}", element.as_str()),
        }
    }
}

impl FromStr for TypeDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(kind) = ElementKind::parse(s) {
            return Ok(match kind {
                ElementKind::Scalar => Self::Scalar,
                ElementKind::Pos1D => Self::Pos1D,
                ElementKind::Pos2D => Self::Pos2D,
            });
        }
        parse_map(s).ok_or_else(|| Error::BadTypeSpec(s.to_string()))
    }
}

/// Parses `Map1D<E>=n` / `Map2D<E>=s`. Returns `None` on any deviation
/// from the grammar, including a zero size.
fn parse_map(s: &str) -> Option<TypeDescriptor> {
    let rest = s.strip_prefix("Map")?;
    let dim = rest.get(..2)?;
    let rest = rest.get(2..)?.strip_prefix('<')?;
    let (element, rest) = rest.split_once('>')?;
    let element = ElementKind::parse(element)?;
    let size: usize = rest.strip_prefix('=')?.parse().ok()?;
    if size == 0 {
        return None;
    }
    match dim {
        "1D" => Some(TypeDescriptor::Map1D { element, size }),
        "2D" => Some(TypeDescriptor::Map2D { element, side: size }),
        _ => None,
    }
}
