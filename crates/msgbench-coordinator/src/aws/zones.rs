//! Availability zone and region discovery

use super::AwsCli;
use crate::command::CommandExecutor;
use anyhow::Result;
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Opt-in states of regions the account can use
const ENABLED_OPT_IN_STATUSES: [&str; 2] = ["opt-in-not-required", "opted-in"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeAvailabilityZones {
    availability_zones: Vec<AvailabilityZone>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AvailabilityZone {
    zone_name: String,
    state: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeRegions {
    regions: Vec<RegionInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RegionInfo {
    region_name: String,
    #[serde(default)]
    opt_in_status: Option<String>,
}

impl<E: CommandExecutor> AwsCli<E> {
    /// Zones in `region` whose state is `available`
    pub async fn get_zones_in_region(&self, region: &str) -> Result<BTreeSet<String>> {
        let spec = self.command([
            "ec2".to_string(),
            "describe-availability-zones".to_string(),
            format!("--region={region}"),
        ]);
        let response: DescribeAvailabilityZones = self.query(&spec).await?;

        let zones: BTreeSet<String> = response
            .availability_zones
            .into_iter()
            .filter(|zone| zone.state == "available")
            .map(|zone| zone.zone_name)
            .collect();
        debug!(region, count = zones.len(), "Found available zones");
        Ok(zones)
    }

    /// Regions enabled for the account
    pub async fn get_all_regions(&self) -> Result<BTreeSet<String>> {
        let spec = self.command(["ec2", "describe-regions"]);
        let response: DescribeRegions = self.query(&spec).await?;

        Ok(response
            .regions
            .into_iter()
            .filter(|region| {
                region
                    .opt_in_status
                    .as_deref()
                    .is_some_and(|status| ENABLED_OPT_IN_STATUSES.contains(&status))
            })
            .map(|region| region.region_name)
            .collect())
    }

    /// Enabled regions whose name starts with `geo` (e.g. `us`, `eu`)
    pub async fn get_regions_in_geo(&self, geo: &str) -> Result<BTreeSet<String>> {
        let regions = self.get_all_regions().await?;
        Ok(regions
            .into_iter()
            .filter(|region| region.starts_with(geo))
            .collect())
    }

    /// Available zones across every enabled region
    pub async fn get_all_zones(&self) -> Result<BTreeSet<String>> {
        let regions = self.get_all_regions().await?;
        info!(regions = regions.len(), "Listing zones in all enabled regions");

        let mut zones = BTreeSet::new();
        for region in &regions {
            zones.extend(self.get_zones_in_region(region).await?);
        }
        Ok(zones)
    }
}
