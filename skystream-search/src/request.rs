//! Search request parameters and their validation.

use std::str::FromStr;

use skystream_constraint::ConstraintNode;

use crate::error::{Result, SearchError};

/// How a candidate footprint must relate to the search region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Intersect {
    #[default]
    Overlaps,
    Covers,
    Enclosed,
    Center,
}

impl Intersect {
    pub fn as_str(self) -> &'static str {
        match self {
            Intersect::Overlaps => "OVERLAPS",
            Intersect::Covers => "COVERS",
            Intersect::Enclosed => "ENCLOSED",
            Intersect::Center => "CENTER",
        }
    }
}

impl FromStr for Intersect {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Intersect> {
        match s {
            "OVERLAPS" => Ok(Intersect::Overlaps),
            "COVERS" => Ok(Intersect::Covers),
            "ENCLOSED" => Ok(Intersect::Enclosed),
            "CENTER" => Ok(Intersect::Center),
            _ => Err(SearchError::InvalidIntersect),
        }
    }
}

/// Parses a `POS` parameter of the form `RA,Dec` in decimal degrees.
pub fn parse_pos(arg: &str) -> Result<(f64, f64)> {
    if arg.contains(' ') {
        return Err(SearchError::InvalidPos(
            "POS contains embedded whitespace".to_owned(),
        ));
    }
    let values: Vec<&str> = arg.split(',').collect();
    if values.len() != 2 {
        return Err(SearchError::InvalidPos(format!(
            "Invalid POS ({arg}): expecting RA,Dec"
        )));
    }
    let (Ok(ra), Ok(dec)) = (values[0].parse::<f64>(), values[1].parse::<f64>()) else {
        return Err(SearchError::InvalidPos(format!(
            "Invalid POS ({arg}): RA and/or Dec are not valid floating point numbers"
        )));
    };
    if !(0.0..=360.0).contains(&ra) {
        return Err(SearchError::InvalidPos(format!(
            "RA value {ra:?} is out of range [0,360]"
        )));
    }
    if !(-90.0..=90.0).contains(&dec) {
        return Err(SearchError::InvalidPos(format!(
            "Dec value {dec:?} is out of range [-90,90]"
        )));
    }
    Ok((ra, dec))
}

/// Parses a `SIZE` parameter: one or two comma separated axis sizes in
/// decimal degrees. A single value applies to both axes; absence means
/// a point search.
pub fn parse_size(arg: Option<&str>) -> Result<(f64, f64)> {
    let Some(arg) = arg else {
        return Ok((0.0, 0.0));
    };
    if arg.contains(' ') {
        return Err(SearchError::InvalidSize(
            "SIZE parameter contains embedded whitespace".to_owned(),
        ));
    }
    let values: Vec<&str> = arg.split(',').collect();
    if values.is_empty() || values.len() > 2 {
        return Err(SearchError::InvalidSize(format!(
            "Invalid SIZE ({arg}): expecting one or two (comma separated) axis sizes in decimal degrees"
        )));
    }
    let (Ok(s1), Ok(s2)) = (
        values[0].parse::<f64>(),
        values[values.len() - 1].parse::<f64>(),
    ) else {
        return Err(SearchError::InvalidSize(format!(
            "Invalid SIZE ({arg}): SIZE contains an invalid floating point number"
        )));
    };
    if s1 < 0.0 || s2 < 0.0 {
        return Err(SearchError::InvalidSize(format!(
            "Invalid SIZE ({arg}): negative size"
        )));
    }
    if (s1 == 0.0) != (s2 == 0.0) {
        return Err(SearchError::InvalidSize(format!(
            "Invalid SIZE ({arg}): degenerate region"
        )));
    }
    Ok((s1, s2))
}

/// A spatial and/or relational query against one table.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    /// Search center in degrees.
    pub pos: Option<(f64, f64)>,
    /// Search extents in degrees; `(0, 0)` searches a point.
    pub size: (f64, f64),
    pub intersect: Intersect,
    /// Return only the most centered row per image set.
    pub most_centered: bool,
    /// Columns to return; `None` selects the principal columns.
    pub columns: Option<Vec<String>>,
    /// Relational constraint in WHERE clause syntax.
    pub where_clause: Option<String>,
    /// Extra constraint built from a row reference, merged with the
    /// WHERE clause.
    pub refby: Option<ConstraintNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pos_happy_path() {
        assert_eq!(parse_pos("10.5,-20.25").unwrap(), (10.5, -20.25));
        assert_eq!(parse_pos("0,90").unwrap(), (0.0, 90.0));
    }

    #[test]
    fn pos_rejects_whitespace_and_shape() {
        let err = parse_pos("10, 20").unwrap_err();
        assert_eq!(err.to_string(), "POS contains embedded whitespace");
        let err = parse_pos("10").unwrap_err();
        assert!(err.to_string().contains("expecting RA,Dec"));
        let err = parse_pos("10,x").unwrap_err();
        assert!(err.to_string().contains("not valid floating point"));
    }

    #[test]
    fn pos_range_checks() {
        assert!(parse_pos("361,0")
            .unwrap_err()
            .to_string()
            .contains("out of range [0,360]"));
        assert!(parse_pos("0,-91")
            .unwrap_err()
            .to_string()
            .contains("out of range [-90,90]"));
    }

    #[test]
    fn size_single_value_applies_to_both_axes() {
        assert_eq!(parse_size(None).unwrap(), (0.0, 0.0));
        assert_eq!(parse_size(Some("0.5")).unwrap(), (0.5, 0.5));
        assert_eq!(parse_size(Some("0.5,0.25")).unwrap(), (0.5, 0.25));
    }

    #[test]
    fn size_rejects_bad_shapes() {
        assert!(parse_size(Some("1, 2")).unwrap_err().to_string().contains("whitespace"));
        assert!(parse_size(Some("1,2,3")).unwrap_err().to_string().contains("one or two"));
        assert!(parse_size(Some("-1")).unwrap_err().to_string().contains("negative size"));
        assert!(parse_size(Some("0,1")).unwrap_err().to_string().contains("degenerate region"));
    }

    #[test]
    fn intersect_parsing() {
        assert_eq!("CENTER".parse::<Intersect>().unwrap(), Intersect::Center);
        assert!("overlaps".parse::<Intersect>().is_err());
    }
}
