//! Region and availability-zone name handling
//!
//! AWS region names look like `us-west-1`; zones add a trailing letter
//! (`us-west-1a`). Everything here is pure string handling; looking up
//! which zones actually exist goes through the CLI in the coordinator.

use crate::error::ZoneError;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

static ZONE_OR_REGION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]{2}-[a-z]+-[0-9][a-z]?$").expect("zone pattern is valid")
});

/// Returns whether `zone_or_region` is a region (as opposed to a zone).
///
/// Names that are neither are rejected.
pub fn is_region(zone_or_region: &str) -> Result<bool, ZoneError> {
    if !ZONE_OR_REGION.is_match(zone_or_region) {
        return Err(ZoneError::InvalidName(zone_or_region.to_string()));
    }
    Ok(zone_or_region.ends_with(|c: char| c.is_ascii_digit()))
}

/// Returns the region a zone is in, or the input if it is already a region.
pub fn region_from_zone(zone_or_region: &str) -> Result<String, ZoneError> {
    if is_region(zone_or_region)? {
        return Ok(zone_or_region.to_string());
    }
    let mut region = zone_or_region.to_string();
    region.pop();
    Ok(region)
}

/// Returns the single region a set of zones is in.
///
/// Returns `None` for an empty input and an error if the zones span regions.
pub fn region_from_zones<I, S>(zones: I) -> Result<Option<String>, ZoneError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let zones: Vec<S> = zones.into_iter().collect();
    let mut region: Option<String> = None;

    for zone in &zones {
        let current = region_from_zone(zone.as_ref())?;
        match &region {
            None => region = Some(current),
            Some(first) if *first != current => {
                return Err(ZoneError::RegionMismatch {
                    expected: first.clone(),
                    found: current,
                    zones: zones.iter().map(|z| z.as_ref().to_string()).collect(),
                });
            }
            Some(_) => {}
        }
    }

    Ok(region)
}

/// Groups zones by the region they belong to
pub fn group_zones_into_regions<I, S>(zones: I) -> Result<BTreeMap<String, BTreeSet<String>>, ZoneError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut regions: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for zone in zones {
        let zone = zone.as_ref();
        regions
            .entry(region_from_zone(zone)?)
            .or_default()
            .insert(zone.to_string());
    }
    Ok(regions)
}

/// Geography prefix of a region, e.g. `us` for `us-west-1`
pub fn geo_from_region(region: &str) -> &str {
    region.split('-').next().unwrap_or(region)
}

/// Validates a zone list for cluster placement.
///
/// Accepts an empty list, a single region, or several zones (no regions)
/// that all belong to the same region.
pub fn validate_eks_zones<S: AsRef<str>>(values: &[S]) -> Result<bool, ZoneError> {
    match values {
        [] => Ok(true),
        [single] => is_region(single.as_ref()),
        [first, ..] => {
            for value in values {
                if is_region(value.as_ref())? {
                    return Ok(false);
                }
            }
            let region = region_from_zone(first.as_ref())?;
            for value in values {
                if region_from_zone(value.as_ref())? != region {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_from_zone_strips_trailing_letter() {
        assert_eq!(region_from_zone("us-west-1a").unwrap(), "us-west-1");
        assert_eq!(region_from_zone("eu-central-1").unwrap(), "eu-central-1");
    }

    #[test]
    fn is_region_distinguishes_zones() {
        assert!(is_region("us-west-1").unwrap());
        assert!(!is_region("us-west-1a").unwrap());
    }

    #[test]
    fn invalid_names_are_rejected() {
        for name in ["", "us-west", "US-west-1", "us-west-1ab", "usa-west-1", "us-west-1-a"] {
            assert!(
                matches!(is_region(name), Err(ZoneError::InvalidName(_))),
                "expected {name:?} to be rejected"
            );
        }
        assert!(region_from_zone("not-a-zone").is_err());
    }

    #[test]
    fn region_from_zones_agrees() {
        assert_eq!(
            region_from_zones(["us-west-1a", "us-west-1b"]).unwrap(),
            Some("us-west-1".to_string())
        );
        assert_eq!(region_from_zones(Vec::<String>::new()).unwrap(), None);
    }

    #[test]
    fn region_from_zones_mismatch() {
        let err = region_from_zones(["us-west-1a", "us-east-1a"]).unwrap_err();
        match err {
            ZoneError::RegionMismatch {
                expected, found, ..
            } => {
                assert_eq!(expected, "us-west-1");
                assert_eq!(found, "us-east-1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn groups_zones() {
        let grouped =
            group_zones_into_regions(["us-west-1a", "us-east-1b", "us-west-1c"]).unwrap();
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["us-west-1"].len(), 2);
        assert!(grouped["us-east-1"].contains("us-east-1b"));
    }

    #[test]
    fn geo_prefix() {
        assert_eq!(geo_from_region("us-west-1"), "us");
        assert_eq!(geo_from_region("ap-southeast-2"), "ap");
    }

    #[test]
    fn eks_zone_validation() {
        assert!(validate_eks_zones::<&str>(&[]).unwrap());
        assert!(validate_eks_zones(&["us-east-1"]).unwrap());
        assert!(!validate_eks_zones(&["us-east-1a"]).unwrap());
        assert!(validate_eks_zones(&["us-east-1a", "us-east-1b"]).unwrap());
        assert!(!validate_eks_zones(&["us-east-1a", "us-west-1b"]).unwrap());
        assert!(!validate_eks_zones(&["us-east-1", "us-east-1b"]).unwrap());
    }
}
