//! Ride result trees: company → line → ride → stations.

use super::{Company, Line, Ride, Station, sort_by_name};
use serde::{Deserialize, Serialize};

/// A ride together with the stations it serves, in travel order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(Ride, Vec<Station>)", into = "(Ride, Vec<Station>)")]
pub struct RideNode {
    ride: Ride,
    stations: Vec<Station>,
}

impl RideNode {
    /// Creates a ride node.
    #[must_use]
    pub const fn new(ride: Ride, stations: Vec<Station>) -> Self {
        Self { ride, stations }
    }

    /// Returns the ride.
    #[must_use]
    pub const fn ride(&self) -> &Ride {
        &self.ride
    }

    /// Returns the served stations.
    #[must_use]
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Returns whether both the ride and its station list are empty.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.ride.is_null() && self.stations.is_empty()
    }

    /// Returns the node with its stations ordered by name.
    #[must_use]
    pub fn sorted(mut self) -> Self {
        sort_by_name(&mut self.stations);
        self
    }
}

impl From<(Ride, Vec<Station>)> for RideNode {
    fn from((ride, stations): (Ride, Vec<Station>)) -> Self {
        Self::new(ride, stations)
    }
}

impl From<RideNode> for (Ride, Vec<Station>) {
    fn from(node: RideNode) -> Self {
        (node.ride, node.stations)
    }
}

/// A line together with its rides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(Line, Vec<RideNode>)", into = "(Line, Vec<RideNode>)")]
pub struct LineNode {
    line: Line,
    rides: Vec<RideNode>,
}

impl LineNode {
    /// Creates a line node.
    #[must_use]
    pub const fn new(line: Line, rides: Vec<RideNode>) -> Self {
        Self { line, rides }
    }

    /// Returns the line.
    #[must_use]
    pub const fn line(&self) -> &Line {
        &self.line
    }

    /// Returns the ride nodes.
    #[must_use]
    pub fn rides(&self) -> &[RideNode] {
        &self.rides
    }

    /// Returns whether both the line and its rides are empty.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.line.is_null() && self.rides.is_empty()
    }

    /// Returns the node with rides ordered by ride name, each ride's
    /// stations sorted as well.
    #[must_use]
    pub fn sorted(self) -> Self {
        let mut rides: Vec<RideNode> = self.rides.into_iter().map(RideNode::sorted).collect();
        rides.sort_by(|left, right| left.ride.compare_by_name(&right.ride));
        Self {
            line: self.line,
            rides,
        }
    }
}

impl From<(Line, Vec<RideNode>)> for LineNode {
    fn from((line, rides): (Line, Vec<RideNode>)) -> Self {
        Self::new(line, rides)
    }
}

impl From<LineNode> for (Line, Vec<RideNode>) {
    fn from(node: LineNode) -> Self {
        (node.line, node.rides)
    }
}

/// A company together with the lines it operates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(Company, Vec<LineNode>)", into = "(Company, Vec<LineNode>)")]
pub struct CompanyNode {
    company: Company,
    lines: Vec<LineNode>,
}

impl CompanyNode {
    /// Creates a company node.
    #[must_use]
    pub const fn new(company: Company, lines: Vec<LineNode>) -> Self {
        Self { company, lines }
    }

    /// Returns the company.
    #[must_use]
    pub const fn company(&self) -> &Company {
        &self.company
    }

    /// Returns the line nodes.
    #[must_use]
    pub fn lines(&self) -> &[LineNode] {
        &self.lines
    }

    /// Returns whether both the company and its lines are empty.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.company.is_null() && self.lines.is_empty()
    }

    /// Returns the tree with every level ordered by name.
    #[must_use]
    pub fn sorted(self) -> Self {
        let mut lines: Vec<LineNode> = self.lines.into_iter().map(LineNode::sorted).collect();
        lines.sort_by(|left, right| left.line.compare_by_name(&right.line));
        Self {
            company: self.company,
            lines,
        }
    }
}

impl From<(Company, Vec<LineNode>)> for CompanyNode {
    fn from((company, lines): (Company, Vec<LineNode>)) -> Self {
        Self::new(company, lines)
    }
}

impl From<CompanyNode> for (Company, Vec<LineNode>) {
    fn from(node: CompanyNode) -> Self {
        (node.company, node.lines)
    }
}
