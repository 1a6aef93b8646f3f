//! Stock-system records: rack locations, robot IDs and FlyStore orders.
//!
//! # Invariants
//! - A stock has up to two physical copies: copy A in `A.` trays, copy B in `B.` trays.
//! - Racks hold 96 cells split into four 24-cell quadrants.

use chrono::NaiveDate;
use std::fmt::{Display, Formatter};

/// Which physical copy of a stock a rack location belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RackCopy {
    A,
    B,
}

impl RackCopy {
    pub const ALL: [RackCopy; 2] = [RackCopy::A, RackCopy::B];

    /// Column holding this copy's rack ID.
    pub fn rack_column(self) -> &'static str {
        match self {
            Self::A => "rack",
            Self::B => "rack_b",
        }
    }

    /// Prefix every tray of this copy starts with.
    pub fn location_prefix(self) -> &'static str {
        match self {
            Self::A => "A.",
            Self::B => "B.",
        }
    }
}

impl Display for RackCopy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// Quarter of a 96-cell rack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Quadrant {
    A,
    B,
    C,
    D,
}

impl Quadrant {
    /// Maps a 1-based cell number to its quadrant; out-of-range cells have none.
    pub fn from_cell(cell: i64) -> Option<Self> {
        match cell {
            1..=24 => Some(Self::A),
            25..=48 => Some(Self::B),
            49..=72 => Some(Self::C),
            73..=96 => Some(Self::D),
            _ => None,
        }
    }
}

impl Display for Quadrant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        };
        write!(f, "{letter}")
    }
}

/// Tray part of a rack location: everything before the second `.`.
///
/// `A.GR59.3.1` becomes `A.GR59`; locations with fewer dots are returned whole.
pub fn copy_tray(location: &str) -> &str {
    match location.match_indices('.').nth(1) {
        Some((index, _)) => &location[..index],
        None => location,
    }
}

/// Rack state of one stock as stored in the flipper table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockRackRecord {
    pub stock_id: i64,
    pub genotype: Option<String>,
    pub rack_location_a: Option<String>,
    pub rack_location_b: Option<String>,
    pub cell_a: Option<i64>,
    pub cell_b: Option<i64>,
    pub last_flipped_a: Option<NaiveDate>,
    pub last_flipped_b: Option<NaiveDate>,
    pub rack_id_a: Option<String>,
    pub rack_id_b: Option<String>,
}

/// Borrowed view of one copy of a stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockCopy<'a> {
    pub copy: RackCopy,
    pub location: Option<&'a str>,
    pub cell: Option<i64>,
    pub last_flipped: Option<NaiveDate>,
    pub rack_id: Option<&'a str>,
}

impl StockCopy<'_> {
    /// Tray of this copy, if its location belongs to the copy's tray family.
    pub fn tray(&self) -> Option<&str> {
        let location = self.location?.trim();
        if location.is_empty() || !location.starts_with(self.copy.location_prefix()) {
            return None;
        }
        Some(copy_tray(location))
    }

    pub fn quadrant(&self) -> Option<Quadrant> {
        self.cell.and_then(Quadrant::from_cell)
    }
}

impl StockRackRecord {
    pub fn copy(&self, copy: RackCopy) -> StockCopy<'_> {
        match copy {
            RackCopy::A => StockCopy {
                copy,
                location: self.rack_location_a.as_deref(),
                cell: self.cell_a,
                last_flipped: self.last_flipped_a,
                rack_id: self.rack_id_a.as_deref(),
            },
            RackCopy::B => StockCopy {
                copy,
                location: self.rack_location_b.as_deref(),
                cell: self.cell_b,
                last_flipped: self.last_flipped_b,
                rack_id: self.rack_id_b.as_deref(),
            },
        }
    }
}

/// One `StockFinder` row sharing a robot ID with others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RobotIdRow {
    pub robot_id: i64,
    pub kp_id: i64,
    pub stock_name: Option<String>,
}

/// Yearly FlyStore order count for one stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRow {
    pub stock_name: Option<String>,
    pub project: Option<String>,
    pub subcat: Option<String>,
    pub robot_id: Option<i64>,
    pub genotype: Option<String>,
    pub lab_id: Option<String>,
    pub year: i32,
    pub count: i64,
}
